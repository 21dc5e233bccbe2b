//! Stage names reported by the generation backend.
//!
//! Each known stage maps to a fixed icon and progress-bar percentage. Unknown
//! names are kept verbatim and fall back to the default icon and 0%.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Icon shown for stages we do not recognise.
pub const DEFAULT_ICON: &str = "🤖";

/// A named phase of a task's execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageName {
    Initializing,
    Researcher,
    Creator,
    Reviewer,
    Publisher,
    Completed,
    Error,
    /// Any stage name the client does not know about.
    Other(String),
}

impl StageName {
    /// Parse a stage name as sent on the wire. Never fails.
    pub fn parse(name: &str) -> Self {
        match name {
            "Initializing" => StageName::Initializing,
            "Researcher" => StageName::Researcher,
            "Creator" => StageName::Creator,
            "Reviewer" => StageName::Reviewer,
            "Publisher" => StageName::Publisher,
            "Completed" => StageName::Completed,
            "Error" => StageName::Error,
            other => StageName::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StageName::Initializing => "Initializing",
            StageName::Researcher => "Researcher",
            StageName::Creator => "Creator",
            StageName::Reviewer => "Reviewer",
            StageName::Publisher => "Publisher",
            StageName::Completed => "Completed",
            StageName::Error => "Error",
            StageName::Other(name) => name,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            StageName::Initializing => "⚙️",
            StageName::Researcher => "🔍",
            StageName::Creator => "✍️",
            StageName::Reviewer => "📋",
            StageName::Publisher => "📤",
            StageName::Completed => "✅",
            StageName::Error => "❌",
            StageName::Other(_) => DEFAULT_ICON,
        }
    }

    /// Completion percentage for this stage, if it has one.
    ///
    /// `Error` has no defined percentage; neither do unknown stages.
    pub fn percent(&self) -> Option<u8> {
        match self {
            StageName::Initializing => Some(10),
            StageName::Researcher => Some(30),
            StageName::Creator => Some(60),
            StageName::Reviewer => Some(85),
            StageName::Publisher => Some(95),
            StageName::Completed => Some(100),
            StageName::Error | StageName::Other(_) => None,
        }
    }

    /// Percentage to draw on the progress bar (undefined renders as 0).
    pub fn display_percent(&self) -> u8 {
        self.percent().unwrap_or(0)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StageName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(StageName::parse(&raw))
    }
}
