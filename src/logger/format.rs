//! Log line format module
//!
//! Every line reads `<local time> - <target> - <LEVEL> - <message>`, the
//! layout log shippers for the monitoring stack already parse.

use chrono::{DateTime, Local};
use std::fmt;

/// Name written in the target column
pub const TARGET: &str = env!("CARGO_PKG_NAME");

/// Log severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warning,
    Info,
    Debug,
}

impl Level {
    /// Parse a configured level name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            "debug" | "trace" => Some(Self::Debug),
            _ => None,
        }
    }

    /// Warnings and errors go to the error target
    pub const fn is_error_stream(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
            Self::Debug => write!(f, "DEBUG"),
        }
    }
}

/// Render one log line
pub fn format_line(time: &DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "{} - {TARGET} - {level} - {message}",
        time.format("%Y-%m-%d %H:%M:%S,%3f")
    )
}
