//! Environment configuration

use crate::assistant::DEFAULT_BASE_URL;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLLS: u32 = 300;
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(3600);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// A quick-reply button: the label shown and the text sent when clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReply {
    pub label: String,
    pub payload: String,
}

impl QuickReply {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// How a run is waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the run reports completion
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: Some(DEFAULT_MAX_POLLS),
        }
    }
}

/// Everything the bridge needs besides the service itself
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub assistant_id: String,
    pub prompt_text: String,
    pub buttons: Vec<QuickReply>,
    pub poll: PollPolicy,
}

impl BridgeConfig {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            prompt_text: String::new(),
            buttons: Vec::new(),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_prompt_text(mut self, prompt_text: impl Into<String>) -> Self {
        self.prompt_text = prompt_text.into();
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<QuickReply>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub api_key: String,
    pub base_url: String,
    pub port: u16,
    /// Sessions idle this long are dropped
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let assistant_id = required("OPENAI_ASSISTANT_ID")?;
        let api_key = required("OPENAI_API_KEY")?;
        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let prompt_text = lookup("BRIDGE_PROMPT_TEXT").unwrap_or_default();

        let interval = match lookup("BRIDGE_POLL_INTERVAL_SECS") {
            Some(value) => value
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or(ConfigError::Invalid {
                    var: "BRIDGE_POLL_INTERVAL_SECS",
                    value,
                })?,
            None => DEFAULT_POLL_INTERVAL,
        };

        let max_polls = match lookup("BRIDGE_MAX_POLLS") {
            Some(value) => match value.parse::<u32>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: "BRIDGE_MAX_POLLS",
                        value,
                    })
                }
            },
            None => Some(DEFAULT_MAX_POLLS),
        };

        let port = match lookup("BRIDGE_PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "BRIDGE_PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let session_idle = match lookup("BRIDGE_SESSION_IDLE_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "BRIDGE_SESSION_IDLE_SECS",
                        value,
                    })
                }
            },
            None => DEFAULT_SESSION_IDLE,
        };

        Ok(Self {
            bridge: BridgeConfig::new(assistant_id)
                .with_prompt_text(prompt_text)
                .with_poll(PollPolicy {
                    interval,
                    max_polls,
                }),
            api_key,
            base_url,
            port,
            session_idle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "asst_123"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.bridge.assistant_id, "asst_123");
        assert_eq!(config.bridge.prompt_text, "");
        assert!(config.bridge.buttons.is_empty());
        assert_eq!(config.bridge.poll, PollPolicy::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_idle, DEFAULT_SESSION_IDLE);
    }

    #[test]
    fn missing_assistant_id() {
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_ASSISTANT_ID"));

        let err = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "  "),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_ASSISTANT_ID"));
    }

    #[test]
    fn poll_settings() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "asst_123"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BRIDGE_POLL_INTERVAL_SECS", "0.5"),
            ("BRIDGE_MAX_POLLS", "0"),
            ("BRIDGE_SESSION_IDLE_SECS", "600"),
        ]))
        .unwrap();
        assert_eq!(config.session_idle, Duration::from_secs(600));

        assert_eq!(config.bridge.poll.interval, Duration::from_millis(500));
        assert_eq!(config.bridge.poll.max_polls, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "asst_123"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BRIDGE_POLL_INTERVAL_SECS", "-1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BRIDGE_POLL_INTERVAL_SECS", .. }));

        let err = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "asst_123"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BRIDGE_POLL_INTERVAL_SECS", "1e30"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "BRIDGE_POLL_INTERVAL_SECS",
                value: "1e30".to_string()
            }
        );

        let err = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "asst_123"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BRIDGE_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BRIDGE_PORT", .. }));

        let err = Config::from_lookup(lookup(&[
            ("OPENAI_ASSISTANT_ID", "asst_123"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BRIDGE_SESSION_IDLE_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BRIDGE_SESSION_IDLE_SECS", .. }));
    }
}
