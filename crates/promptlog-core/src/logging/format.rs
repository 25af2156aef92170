//! Record formatting

use std::panic::Location;
use std::path::Path;

use chrono::{DateTime, Local};

use super::level::LogLevel;
use crate::config::LogFormat;

/// Timestamp layout, e.g. `2024-09-18 18:38:44,185`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Widest asterisk rule drawn around a pretty message
pub const MAX_RULE_WIDTH: usize = 100;

/// Section markers of a prompt record
pub const PROMPT_MARKER: &str = "----- PROMPT -----";
pub const RESPONSE_MARKER: &str = "----- RESPONSE -----";
pub const END_MARKER: &str = "----- END -----";

/// A single log call, alive only while it is formatted and written
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub logger_name: &'a str,
    pub message: &'a str,
    pub timestamp: DateTime<Local>,
    /// Where the logging call was made
    pub location: &'static Location<'static>,
}

impl<'a> LogRecord<'a> {
    /// Create a record stamped with the current local time and the caller's location
    #[track_caller]
    pub fn new(level: LogLevel, logger_name: &'a str, message: &'a str) -> Self {
        Self {
            level,
            logger_name,
            message,
            timestamp: Local::now(),
            location: Location::caller(),
        }
    }

    fn header(&self) -> String {
        format!(
            "{} - {} - {} - {}: {} -",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.logger_name,
            self.level,
            source_file_name(self.location.file()),
            self.location.line()
        )
    }

    /// Render the record, trailing newline included.
    ///
    /// Plain: `<timestamp> - <name> - <LEVEL> - <file>: <line> - <message>`.
    /// Pretty: the same header, then the message framed by asterisk rules.
    pub fn render(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Plain => format!("{} {}\n", self.header(), self.message),
            LogFormat::Pretty => format!("{}\n{}", self.header(), frame(self.message)),
        }
    }

    /// Render a prompt/response pair under this record's header
    pub fn render_prompt(&self, prompt: &str, response: &str) -> String {
        let mut out = format!("{} {}\n", self.header(), self.message);
        for (marker, body) in [(PROMPT_MARKER, prompt), (RESPONSE_MARKER, response)] {
            out.push_str(marker);
            out.push('\n');
            out.push_str(body);
            if !body.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push_str(END_MARKER);
        out.push('\n');
        out
    }
}

/// Last component of a source path, e.g. `main.rs` for `src/bin/main.rs`
fn source_file_name(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

/// Frame `message` with lines of asterisks as wide as its longest line,
/// capped at [`MAX_RULE_WIDTH`]. One trailing newline is dropped so the
/// closing rule sits directly under the text.
pub fn frame(message: &str) -> String {
    let message = message.strip_suffix('\n').unwrap_or(message);
    let width = message
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(1, MAX_RULE_WIDTH);
    let rule = "*".repeat(width);
    format!("{rule}\n{message}\n{rule}\n")
}
