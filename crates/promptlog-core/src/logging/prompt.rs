//! Prompt logger for LLM prompt/response pairs

use std::path::Path;

use super::format::LogRecord;
use super::level::LogLevel;
use super::logger::{FileNaming, Logger, LoggerBuilder};
use super::traits::Destination;
use crate::config::{Config, ConfigResult};
use crate::paths::make_id;

/// Prompt name used when none is given
pub const DEFAULT_PROMPT_NAME: &str = "prompt_log";

/// Builder for [`PromptLogger`]
pub struct PromptLoggerBuilder {
    inner: LoggerBuilder,
    prompt_name: String,
    batch_id: Option<String>,
    prompt_level: Option<LogLevel>,
}

impl PromptLoggerBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Logger::builder(name),
            prompt_name: DEFAULT_PROMPT_NAME.to_string(),
            batch_id: None,
            prompt_level: None,
        }
    }

    /// Name written in each record header and used for the file name
    pub fn prompt_name(mut self, prompt_name: impl Into<String>) -> Self {
        self.prompt_name = prompt_name.into();
        self
    }

    /// Batch folder; a fresh UUID when not set
    pub fn batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Level of the wrapped logger (plain messages and prompt gating)
    pub fn level(mut self, level: LogLevel) -> Self {
        self.inner = self.inner.level(level);
        self
    }

    /// Level of the wrapped logger by name
    pub fn level_str(mut self, level: impl Into<String>) -> Self {
        self.inner = self.inner.level_str(level);
        self
    }

    /// Gate prompt records at this level. Without one they are always written.
    pub fn prompt_level(mut self, level: Option<LogLevel>) -> Self {
        self.prompt_level = level;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.inner = self.inner.config(config);
        self
    }

    pub fn destination(mut self, destination: impl Destination + 'static) -> Self {
        self.inner = self.inner.destination(destination);
        self
    }

    pub fn build(self) -> ConfigResult<PromptLogger> {
        let batch_id = self.batch_id.unwrap_or_else(make_id);
        let logger = self
            .inner
            .batch_id(batch_id)
            .naming(FileNaming::Prompt(self.prompt_name.clone()))
            .build()?;

        Ok(PromptLogger {
            logger,
            prompt_name: self.prompt_name,
            prompt_level: self.prompt_level,
        })
    }
}

/// Records prompt/response pairs through a wrapped [`Logger`].
///
/// Routing, destinations and failure handling are the wrapped logger's. The
/// log file follows the prompt naming convention
/// `<log_dir>/<name>/<batch_id>/<prompt_name>_<timestamp>_<id>.log`.
///
/// # Example
///
/// ```no_run
/// use promptlog_core::PromptLogger;
///
/// let prompts = PromptLogger::new("llm");
/// prompts.log_prompt("Summarize this text", "Here is a summary");
/// ```
#[derive(Debug)]
pub struct PromptLogger {
    logger: Logger,
    prompt_name: String,
    prompt_level: Option<LogLevel>,
}

impl PromptLogger {
    /// Create a prompt logger using the process-wide configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, Config::global().clone())
    }

    /// Create a prompt logger from an explicit configuration
    pub fn with_config(name: impl Into<String>, config: Config) -> Self {
        let logger = Logger::builder(name)
            .config(config)
            .batch_id(make_id())
            .naming(FileNaming::Prompt(DEFAULT_PROMPT_NAME.to_string()))
            .build_infallible();

        Self {
            logger,
            prompt_name: DEFAULT_PROMPT_NAME.to_string(),
            prompt_level: None,
        }
    }

    pub fn builder(name: impl Into<String>) -> PromptLoggerBuilder {
        PromptLoggerBuilder::new(name)
    }

    /// The wrapped logger, for plain messages
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn prompt_name(&self) -> &str {
        &self.prompt_name
    }

    pub fn prompt_level(&self) -> Option<LogLevel> {
        self.prompt_level
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.logger.file_path()
    }

    /// Write one record holding both the prompt and the response.
    ///
    /// Gated by the prompt level against the logger's level when one is
    /// assigned; otherwise always written. The header names the caller's
    /// file and line.
    #[track_caller]
    pub fn log_prompt(&self, prompt: &str, response: &str) {
        if let Some(level) = self.prompt_level {
            if !self.logger.is_enabled(level) {
                return;
            }
        }
        let header = format!("PROMPT {}", self.prompt_name);
        let level = self.prompt_level.unwrap_or(LogLevel::Info);
        let record = LogRecord::new(level, self.logger.name(), &header).render_prompt(prompt, response);
        self.logger.dispatch(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::format::{END_MARKER, PROMPT_MARKER, RESPONSE_MARKER};
    use crate::logging::MemoryDestination;
    use std::fs;
    use tempfile::tempdir;

    fn quiet_config() -> Config {
        Config {
            console_enabled: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_log_prompt_single_delimited_record() {
        let memory = MemoryDestination::new();
        let prompts = PromptLogger::builder("llm")
            .config(quiet_config())
            .destination(memory.clone())
            .build()
            .unwrap();

        let line = line!() + 1;
        prompts.log_prompt("hi", "hello there");

        let records = memory.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let prompt_at = record.find(PROMPT_MARKER).unwrap();
        let response_at = record.find(RESPONSE_MARKER).unwrap();
        let end_at = record.find(END_MARKER).unwrap();
        assert!(prompt_at < response_at && response_at < end_at);
        assert_eq!(&record[prompt_at + PROMPT_MARKER.len()..response_at], "\nhi\n");
        assert!(record[response_at..end_at].contains("hello there"));
        assert!(record.contains(&format!("llm - INFO - prompt.rs: {} - PROMPT prompt_log", line)));
    }

    #[test]
    fn test_ungated_prompts_ignore_level() {
        let memory = MemoryDestination::new();
        let prompts = PromptLogger::builder("llm")
            .config(quiet_config())
            .level(LogLevel::Critical)
            .destination(memory.clone())
            .build()
            .unwrap();

        prompts.logger().info("dropped");
        prompts.log_prompt("p", "r");
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_prompt_level_gates() {
        let memory = MemoryDestination::new();
        let prompts = PromptLogger::builder("llm")
            .config(quiet_config())
            .level(LogLevel::Warning)
            .prompt_level(Some(LogLevel::Info))
            .destination(memory.clone())
            .build()
            .unwrap();

        prompts.log_prompt("p", "r");
        assert!(memory.is_empty());

        let memory = MemoryDestination::new();
        let prompts = PromptLogger::builder("llm")
            .config(quiet_config())
            .level(LogLevel::Warning)
            .prompt_level(Some(LogLevel::Error))
            .destination(memory.clone())
            .build()
            .unwrap();
        prompts.log_prompt("p", "r");
        assert!(memory.contents().contains("llm - ERROR - prompt.rs: "));
        assert!(memory.contents().contains(" - PROMPT prompt_log\n"));
    }

    #[test]
    fn test_prompt_file_routing() {
        let dir = tempdir().unwrap();
        let config = Config {
            log_dir: dir.path().to_path_buf(),
            file_enabled: true,
            ..quiet_config()
        };
        let prompts = PromptLogger::builder("llm")
            .config(config)
            .prompt_name("summarize")
            .batch_id("run-1")
            .build()
            .unwrap();

        let path = prompts.file_path().unwrap().to_path_buf();
        assert_eq!(path.parent().unwrap(), dir.path().join("llm").join("run-1"));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("summarize_"));

        prompts.log_prompt("What is 2+2?", "4");
        drop(prompts);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("PROMPT summarize"));
        assert!(content.contains("What is 2+2?"));
    }

    #[test]
    fn test_default_batch_is_generated() {
        let dir = tempdir().unwrap();
        let config = Config {
            log_dir: dir.path().to_path_buf(),
            file_enabled: true,
            ..quiet_config()
        };
        let a = PromptLogger::with_config("llm", config.clone());
        let b = PromptLogger::with_config("llm", config);

        assert_eq!(a.prompt_name(), DEFAULT_PROMPT_NAME);
        assert!(a.logger().batch_id().is_some());
        assert_ne!(a.logger().batch_id(), b.logger().batch_id());
        assert_ne!(a.file_path(), b.file_path());
        let file_name = a.file_path().unwrap().file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("prompt_log_"));
    }

    #[test]
    fn test_invalid_level_fails() {
        let result = PromptLogger::builder("llm").config(quiet_config()).level_str("loudest").build();
        assert!(result.is_err());
    }
}
