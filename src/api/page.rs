//! Server-rendered page host
//!
//! [`PageUi`] answers the bridge's drawing calls for one request and records
//! the drawn blocks; [`render_html`] turns them into the page.

use crate::assistant::Role;
use crate::bridge::HostUi;
use pulldown_cmark::{html, Event, Options, Parser};
use pulldown_cmark_escape::escape_html;
use std::fmt::{self, Write as _};

/// A block drawn during the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Chat { role: Role, text: String },
    Caption(String),
    Button(String),
    Input { placeholder: String },
}

/// Host for one request: replays the submitted form and records the output
#[derive(Debug, Default)]
pub struct PageUi {
    blocks: Vec<Block>,
    clicked: Option<String>,
    prompt: Option<String>,
    rerun_requested: bool,
}

impl PageUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host for a submitted form
    pub fn submitted(clicked: Option<String>, prompt: Option<String>) -> Self {
        Self {
            clicked,
            prompt,
            ..Self::default()
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn rerun_requested(&self) -> bool {
        self.rerun_requested
    }
}

impl HostUi for PageUi {
    fn chat_message(&mut self, role: Role, text: &str) {
        self.blocks.push(Block::Chat {
            role,
            text: text.to_string(),
        });
    }

    fn caption(&mut self, text: &str) {
        self.blocks.push(Block::Caption(text.to_string()));
    }

    fn button(&mut self, label: &str) -> bool {
        self.blocks.push(Block::Button(label.to_string()));
        self.clicked.as_deref() == Some(label)
    }

    fn chat_input(&mut self, placeholder: &str) -> Option<String> {
        self.blocks.push(Block::Input {
            placeholder: placeholder.to_string(),
        });
        self.prompt.take()
    }

    fn rerun(&mut self) {
        self.rerun_requested = true;
    }
}

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
.chat{border-radius:.5rem;padding:.5rem 1rem;margin:.5rem 0}\
.chat-user{background:#eef3ff}.chat-assistant{background:#f4f4f4}.chat-system{background:#fff7e0}\
.role{font-size:.75rem;color:#666;text-transform:uppercase}\
.caption{color:#888;font-size:.8rem}\
form{display:inline-block;margin:.25rem .25rem .25rem 0}\
form.prompt{display:flex;margin-top:1rem}form.prompt input{flex:1;padding:.5rem}\
.error{background:#fde8e8;border:1px solid #e0a0a0;padding:1rem;border-radius:.5rem}";

/// Render the drawn blocks as a full page
pub fn render_html(title: &str, blocks: &[Block]) -> Result<String, fmt::Error> {
    let mut body = String::new();
    for block in blocks {
        match block {
            Block::Chat { role, text } => {
                let role = role.as_str();
                write!(
                    body,
                    "<div class=\"chat chat-{role}\"><div class=\"role\">{role}</div>"
                )?;
                body.push_str(&render_markdown(text));
                body.push_str("</div>\n");
            }
            Block::Caption(text) => {
                body.push_str("<p class=\"caption\">");
                escape_html(&mut body, text)?;
                body.push_str("</p>\n");
            }
            Block::Button(label) => {
                body.push_str(
                    "<form method=\"post\" action=\"/\"><button type=\"submit\" name=\"button\" value=\"",
                );
                escape_html(&mut body, label)?;
                body.push_str("\">");
                escape_html(&mut body, label)?;
                body.push_str("</button></form>\n");
            }
            Block::Input { placeholder } => {
                body.push_str(
                    "<form class=\"prompt\" method=\"post\" action=\"/\"><input type=\"text\" name=\"prompt\" placeholder=\"",
                );
                escape_html(&mut body, placeholder)?;
                body.push_str(
                    "\" autocomplete=\"off\" autofocus><button type=\"submit\">Send</button></form>\n",
                );
            }
        }
    }
    page(title, &body)
}

/// Error page shown when a pass fails
pub fn render_error(title: &str, message: &str) -> Result<String, fmt::Error> {
    let mut body = String::from("<div class=\"error\"><strong>Something went wrong</strong><p>");
    escape_html(&mut body, message)?;
    body.push_str("</p></div>\n<p><a href=\"/\">Back to the conversation</a></p>\n");
    page(title, &body)
}

fn page(title: &str, body: &str) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(body.len() + STYLE.len() + 256);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>");
    escape_html(&mut out, title)?;
    write!(out, "</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n")?;
    Ok(out)
}

/// Markdown to HTML; raw HTML in the source is shown as text
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
