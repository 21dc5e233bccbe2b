//! Capabilities the session needs from a front end.
//!
//! The session never renders anything itself; it drives a [`ViewPort`] and
//! calls out to a [`MarkdownRenderer`] and a [`Clipboard`].

use std::fmt;

use crate::activity::LogEntry;
use crate::error::ClientError;
use crate::progress::StageDisplay;

/// Top-level sections of the UI. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiSection {
    #[default]
    Form,
    Progress,
    Article,
    Error,
}

impl fmt::Display for UiSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UiSection::Form => "form",
            UiSection::Progress => "progress",
            UiSection::Article => "article",
            UiSection::Error => "error",
        };
        f.write_str(name)
    }
}

pub trait ViewPort {
    /// Make `section` the only visible section.
    fn show_section(&mut self, section: UiSection);

    fn set_progress(&mut self, display: &StageDisplay);

    fn append_log_entry(&mut self, entry: &LogEntry);

    fn clear_log(&mut self);

    /// Enable or disable topic input and the submit control.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Display rendered article markup.
    fn show_article(&mut self, rendered: &str);

    fn show_error(&mut self, message: &str);

    /// Transient, non-blocking notice (download/clipboard results).
    fn notify(&mut self, message: &str);

    fn focus_input(&mut self) {}
}

/// Turns markdown source into sanitized display markup.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

/// Best-effort text clipboard.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClientError>;
}
