//! Terminal front end: a line-oriented [`ViewPort`] plus the markdown and
//! clipboard collaborators used by the CLI.

use std::io::Write;

use base64::Engine;

use crate::activity::LogEntry;
use crate::error::ClientError;
use crate::progress::StageDisplay;
use crate::view::{Clipboard, MarkdownRenderer, UiSection, ViewPort};

const BAR_WIDTH: usize = 20;

/// Draw a fixed-width progress bar, e.g. `[######--------------]  30%`.
pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Writes UI updates as plain lines to `out` (stdout by default).
pub struct TerminalView<W: Write = std::io::Stdout> {
    out: W,
    section: UiSection,
    input_enabled: bool,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            section: UiSection::Form,
            input_enabled: true,
        }
    }

    pub fn section(&self) -> UiSection {
        self.section
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::debug!("Terminal write failed: {}", e);
        }
    }
}

impl<W: Write> ViewPort for TerminalView<W> {
    fn show_section(&mut self, section: UiSection) {
        if self.section == section {
            return;
        }
        self.section = section;
        match section {
            UiSection::Progress => self.line("── Generating ──"),
            UiSection::Article => self.line("── Article ──"),
            UiSection::Error => self.line("── Error ──"),
            UiSection::Form => {}
        }
    }

    fn set_progress(&mut self, display: &StageDisplay) {
        let text = format!(
            "{} {} {}: {}",
            progress_bar(display.percent),
            display.icon,
            display.stage,
            display.status
        );
        self.line(&text);
    }

    fn append_log_entry(&mut self, entry: &LogEntry) {
        let text = format!("  {}", entry.render());
        self.line(&text);
    }

    fn clear_log(&mut self) {}

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn show_article(&mut self, rendered: &str) {
        self.line(rendered);
    }

    fn show_error(&mut self, message: &str) {
        let text = format!("❌ {}", message);
        self.line(&text);
    }

    fn notify(&mut self, message: &str) {
        let text = format!("» {}", message);
        self.line(&text);
    }
}

/// Passes markdown through as text, stripping control characters so a
/// server-supplied article cannot inject terminal escape sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalMarkdown;

impl MarkdownRenderer for TerminalMarkdown {
    fn render(&self, source: &str) -> String {
        source
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect()
    }
}

/// Copies text through the terminal with an OSC 52 escape sequence.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    pub fn sequence(text: &str) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        format!("\x1b]52;c;{}\x07", payload)
    }
}

impl Clipboard for Osc52Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ClientError> {
        let mut out = std::io::stdout();
        out.write_all(Self::sequence(text).as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| ClientError::Clipboard(e.to_string()))
    }
}
