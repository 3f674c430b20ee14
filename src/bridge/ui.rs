//! Host UI primitives consumed by the bridge

use crate::assistant::Role;

/// Drawing and input primitives of the page host.
///
/// Every call draws an element for the current pass; the interactive ones
/// report what the user did with that element in this pass.
pub trait HostUi {
    /// Chat-style block tagged by its author
    fn chat_message(&mut self, role: Role, text: &str);

    fn caption(&mut self, text: &str);

    /// Clickable control; `true` when clicked this pass
    fn button(&mut self, label: &str) -> bool;

    /// Free-text prompt; the submitted text, if any
    fn chat_input(&mut self, placeholder: &str) -> Option<String>;

    /// Re-execute the page from the top
    fn rerun(&mut self);
}

/// What the controls reported for this pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    None,
    Reset,
    /// Payload of the clicked quick-reply button, submitted during capture
    Staged(String),
}
