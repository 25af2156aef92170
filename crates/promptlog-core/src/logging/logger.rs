//! Named logger with config-driven routing

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::console::{ConsoleDestination, ConsoleStream};
use super::diag;
use super::file::FileDestination;
use super::format::LogRecord;
use super::level::LogLevel;
use super::traits::{BoxedDestination, Destination};
use crate::config::{Config, ConfigResult, LogFormat};
use crate::paths::PathGenerator;

/// Per-call switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Force pretty (`Some(true)`) or plain (`Some(false)`) layout for this call
    pub pretty: Option<bool>,
    /// Drop this call entirely
    pub off: bool,
}

impl LogOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: Some(true),
            off: false,
        }
    }

    pub fn plain() -> Self {
        Self {
            pretty: Some(false),
            off: false,
        }
    }

    pub fn off() -> Self {
        Self {
            pretty: None,
            off: true,
        }
    }
}

/// How the log file for a logger is named
#[derive(Debug, Clone)]
pub(crate) enum FileNaming {
    /// `<name>_debug_log_<timestamp>_<id>.log`
    Standard,
    /// `<prompt_name>_<timestamp>_<id>.log`
    Prompt(String),
}

/// Builder for [`Logger`]
///
/// # Example
///
/// ```no_run
/// use promptlog_core::{Logger, LogLevel};
///
/// let logger = Logger::builder("ingest")
///     .batch_id("2024-09-18")
///     .level(LogLevel::Debug)
///     .build()
///     .unwrap();
/// logger.debug("starting");
/// ```
pub struct LoggerBuilder {
    name: String,
    batch_id: Option<String>,
    level: Option<LogLevel>,
    level_str: Option<String>,
    config: Option<Config>,
    console_stream: ConsoleStream,
    extra: Vec<BoxedDestination>,
    naming: FileNaming,
}

impl LoggerBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_id: None,
            level: None,
            level_str: None,
            config: None,
            console_stream: ConsoleStream::default(),
            extra: Vec::new(),
            naming: FileNaming::Standard,
        }
    }

    /// Group this logger's file under a batch folder
    pub fn batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Explicit level; wins over file and environment
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self.level_str = None;
        self
    }

    /// Explicit level by name; `build` fails if it is not a known level
    pub fn level_str(mut self, level: impl Into<String>) -> Self {
        self.level_str = Some(level.into());
        self.level = None;
        self
    }

    /// Use this configuration instead of [`Config::global`]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Console stream used when console output is enabled
    pub fn console_stream(mut self, stream: ConsoleStream) -> Self {
        self.console_stream = stream;
        self
    }

    /// Add a destination on top of the configured ones
    pub fn destination(mut self, destination: impl Destination + 'static) -> Self {
        self.extra.push(Box::new(destination));
        self
    }

    pub(crate) fn naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Resolve the level, generate the file path and open destinations.
    ///
    /// Only an invalid explicit level fails. A log file that cannot be
    /// created is reported once and the logger carries on without it.
    pub fn build(self) -> ConfigResult<Logger> {
        let explicit = match &self.level_str {
            Some(raw) => Some(raw.parse::<LogLevel>()?),
            None => self.level,
        };
        Ok(self.assemble(explicit))
    }

    /// Build without a level string to parse
    pub(crate) fn build_infallible(self) -> Logger {
        let explicit = self.level;
        self.assemble(explicit)
    }

    fn assemble(self, explicit: Option<LogLevel>) -> Logger {
        let config = self.config.unwrap_or_else(|| Config::global().clone());
        let level = explicit.unwrap_or(config.log_level);

        let mut destinations: Vec<Mutex<BoxedDestination>> = Vec::new();
        if config.console_enabled {
            let console: BoxedDestination = Box::new(ConsoleDestination::with_stream(self.console_stream));
            destinations.push(Mutex::new(console));
        }

        let mut file_path = None;
        if config.file_enabled {
            match open_log_file(&config, &self.name, self.batch_id.as_deref(), &self.naming) {
                Ok(file) => {
                    file_path = Some(file.path().to_path_buf());
                    let file: BoxedDestination = Box::new(file);
                    destinations.push(Mutex::new(file));
                }
                Err(e) => diag::warn(
                    "logger",
                    &format!("logger '{}' will not write a log file: {}", self.name, e),
                ),
            }
        }

        destinations.extend(self.extra.into_iter().map(Mutex::new));

        Logger {
            name: self.name,
            batch_id: self.batch_id,
            level,
            format: config.format,
            file_path,
            destinations,
            failure_reported: AtomicBool::new(false),
        }
    }
}

fn open_log_file(
    config: &Config,
    name: &str,
    batch_id: Option<&str>,
    naming: &FileNaming,
) -> std::io::Result<FileDestination> {
    let generator = PathGenerator::from_config(config);
    let path = match naming {
        FileNaming::Standard => generator.generate_path(name, batch_id)?,
        FileNaming::Prompt(prompt_name) => generator.generate_prompt_path(name, prompt_name, batch_id)?,
    };
    FileDestination::open(path)
}

/// A named logger.
///
/// The level is fixed at construction; calls below it return before any
/// formatting. Each record goes to every destination, and a destination
/// that fails never stops the others. Write failures are reported once per
/// logger and never reach the caller.
pub struct Logger {
    name: String,
    batch_id: Option<String>,
    level: LogLevel,
    format: LogFormat,
    file_path: Option<PathBuf>,
    destinations: Vec<Mutex<BoxedDestination>>,
    failure_reported: AtomicBool,
}

impl Logger {
    /// Create a logger using the process-wide configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, Config::global().clone())
    }

    /// Create a logger from an explicit configuration
    pub fn with_config(name: impl Into<String>, config: Config) -> Self {
        LoggerBuilder::new(name).config(config).build_infallible()
    }

    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch_id(&self) -> Option<&str> {
        self.batch_id.as_deref()
    }

    /// Effective minimum level
    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Path of this logger's log file, if file output is active
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Number of active destinations
    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    /// Whether a call at `level` would be written
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    /// Log a message at `level`.
    ///
    /// The record names the source file and line of the call.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str) {
        self.log_with(level, message, LogOptions::default());
    }

    /// Log a message at `level` with per-call options
    #[track_caller]
    pub fn log_with(&self, level: LogLevel, message: &str, options: LogOptions) {
        if options.off || !self.is_enabled(level) {
            return;
        }
        let format = match options.pretty {
            Some(true) => LogFormat::Pretty,
            Some(false) => LogFormat::Plain,
            None => self.format,
        };
        let record = LogRecord::new(level, &self.name, message).render(format);
        self.dispatch(&record);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }

    /// Log at ERROR with the error and its chain of sources appended
    #[track_caller]
    pub fn exception(&self, message: &str, error: &(dyn Error + 'static)) {
        if !self.is_enabled(LogLevel::Error) {
            return;
        }
        let mut text = format!("{}: {}", message, error);
        let mut source = error.source();
        while let Some(cause) = source {
            text.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        self.log(LogLevel::Error, &text);
    }

    /// Write an already rendered record to every destination
    pub(crate) fn dispatch(&self, record: &str) {
        for slot in &self.destinations {
            let mut destination = slot.lock();
            if let Err(e) = destination.write_record(record) {
                self.report_failure(destination.name(), &e);
            }
        }
    }

    /// Flush every destination
    pub fn flush(&self) {
        for slot in &self.destinations {
            let mut destination = slot.lock();
            if let Err(e) = destination.flush() {
                self.report_failure(destination.name(), &e);
            }
        }
    }

    fn report_failure(&self, destination: &str, error: &std::io::Error) {
        if !self.failure_reported.swap(true, Ordering::Relaxed) {
            diag::error(
                "logger",
                &format!(
                    "logger '{}' failed to write to {}: {} (further failures are not reported)",
                    self.name, destination, error
                ),
            );
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        for slot in &self.destinations {
            let _ = slot.lock().flush();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("batch_id", &self.batch_id)
            .field("level", &self.level)
            .field("format", &self.format)
            .field("file_path", &self.file_path)
            .field("destinations", &self.destinations.len())
            .finish()
    }
}

/// Convenience macros for logging with format arguments.
///
/// The arguments are only formatted when the level is enabled.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::LogLevel::Debug) {
            logger.log($crate::LogLevel::Debug, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::LogLevel::Info) {
            logger.log($crate::LogLevel::Info, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::LogLevel::Warning) {
            logger.log($crate::LogLevel::Warning, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::LogLevel::Error) {
            logger.log($crate::LogLevel::Error, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::LogLevel::Critical) {
            logger.log($crate::LogLevel::Critical, &format!($($arg)*));
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::logging::MemoryDestination;
    use std::cell::Cell;
    use std::fs;
    use std::io;
    use tempfile::tempdir;

    fn quiet_config() -> Config {
        Config {
            console_enabled: false,
            ..Config::default()
        }
    }

    fn memory_logger(name: &str, config: Config) -> (Logger, MemoryDestination) {
        let memory = MemoryDestination::new();
        let logger = Logger::builder(name)
            .config(config)
            .destination(memory.clone())
            .build()
            .unwrap();
        (logger, memory)
    }

    struct BrokenDestination;

    impl Destination for BrokenDestination {
        fn name(&self) -> &str {
            "broken"
        }

        fn write_record(&mut self, _record: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_level_gate_for_every_pair() {
        for resolved in LogLevel::ALL {
            let (logger, memory) = memory_logger(
                "gate",
                Config {
                    log_level: resolved,
                    ..quiet_config()
                },
            );
            for call in LogLevel::ALL {
                logger.log(call, "m");
            }
            let expected = LogLevel::ALL.iter().filter(|l| **l >= resolved).count();
            assert_eq!(memory.len(), expected, "resolved at {}", resolved);
            assert!(memory.records().iter().all(|r| {
                LogLevel::ALL
                    .iter()
                    .filter(|l| **l < resolved)
                    .all(|l| !r.contains(&format!(" - {} - ", l)))
            }));
        }
    }

    #[test]
    fn test_default_level_drops_debug() {
        let (logger, memory) = memory_logger("svc", quiet_config());
        logger.debug("hello");
        assert!(memory.is_empty());
        logger.info("hello");
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_warning_config_scenario() {
        let (logger, memory) = memory_logger(
            "svc",
            Config {
                log_level: LogLevel::Warning,
                ..quiet_config()
            },
        );
        logger.info("x");
        assert!(memory.is_empty());

        logger.error("y");
        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("ERROR"));
        assert!(records[0].contains("y"));
        assert!(records[0].contains("svc"));
        assert_eq!(records[0].lines().count(), 1);
    }

    #[test]
    fn test_explicit_level_wins() {
        let config = Config {
            log_level: LogLevel::Critical,
            ..quiet_config()
        };
        let memory = MemoryDestination::new();
        let logger = Logger::builder("svc")
            .config(config.clone())
            .level(LogLevel::Debug)
            .destination(memory.clone())
            .build()
            .unwrap();
        assert_eq!(logger.level(), LogLevel::Debug);
        logger.debug("visible");
        assert_eq!(memory.len(), 1);

        let by_name = Logger::builder("svc").config(config).level_str("warning").build().unwrap();
        assert_eq!(by_name.level(), LogLevel::Warning);
    }

    #[test]
    fn test_invalid_explicit_level_fails() {
        let result = Logger::builder("svc").config(quiet_config()).level_str("LOUD").build();
        assert!(matches!(result, Err(ConfigError::InvalidLevel(_))));
    }

    #[test]
    fn test_file_output() {
        let dir = tempdir().unwrap();
        let config = Config {
            log_dir: dir.path().to_path_buf(),
            file_enabled: true,
            ..quiet_config()
        };
        let logger = Logger::builder("worker").config(config).batch_id("b1").build().unwrap();

        let path = logger.file_path().unwrap().to_path_buf();
        assert!(path.starts_with(dir.path().join("worker").join("b1")));
        assert_eq!(logger.destination_count(), 1);

        logger.warning("written to disk");
        drop(logger);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("worker - WARNING - logger.rs: "));
        assert!(content.contains(" - written to disk\n"));
    }

    #[test]
    fn test_file_disabled_has_no_path() {
        let logger = Logger::with_config("svc", quiet_config());
        assert!(logger.file_path().is_none());
        assert_eq!(logger.destination_count(), 0);
    }

    #[test]
    fn test_unwritable_log_dir_degrades() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let memory = MemoryDestination::new();
        let logger = Logger::builder("svc")
            .config(Config {
                log_dir: blocker,
                file_enabled: true,
                ..quiet_config()
            })
            .destination(memory.clone())
            .build()
            .unwrap();

        assert!(logger.file_path().is_none());
        logger.info("still logged");
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_failing_destination_does_not_block_others() {
        let memory = MemoryDestination::new();
        let logger = Logger::builder("svc")
            .config(quiet_config())
            .destination(BrokenDestination)
            .destination(memory.clone())
            .build()
            .unwrap();

        let before = diag::reported_on_this_thread();
        logger.info("one");
        logger.info("two");
        logger.flush();
        assert_eq!(memory.len(), 2);
        assert!(logger.failure_reported.load(Ordering::Relaxed));
        assert_eq!(diag::reported_on_this_thread(), before + 1);
    }

    #[test]
    fn test_per_call_options() {
        let (logger, memory) = memory_logger("svc", quiet_config());

        logger.log_with(LogLevel::Info, "boxed", LogOptions::pretty());
        logger.log_with(LogLevel::Critical, "muted", LogOptions::off());

        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("*****\nboxed\n*****"));
    }

    #[test]
    fn test_pretty_config_and_plain_override() {
        let (logger, memory) = memory_logger(
            "svc",
            Config {
                format: LogFormat::Pretty,
                ..quiet_config()
            },
        );
        logger.info("abc");
        logger.log_with(LogLevel::Info, "flat", LogOptions::plain());

        let records = memory.records();
        assert!(records[0].contains("***\nabc\n***"));
        assert!(records[1].ends_with(" - flat\n"));
        assert!(records[1].contains("- INFO - logger.rs: "));
    }

    #[test]
    fn test_exception_includes_sources() {
        #[derive(Debug)]
        struct Outer(io::Error);

        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "request failed")
            }
        }

        impl Error for Outer {
            fn source(&self) -> Option<&(dyn Error + 'static)> {
                Some(&self.0)
            }
        }

        let (logger, memory) = memory_logger("svc", quiet_config());
        let err = Outer(io::Error::new(io::ErrorKind::TimedOut, "socket timed out"));
        logger.exception("upload", &err);

        let record = memory.contents();
        assert!(record.contains(" - upload: request failed"));
        assert!(record.contains("svc - ERROR - "));
        assert!(record.contains("caused by: socket timed out"));
    }

    #[test]
    fn test_macros() {
        let (logger, memory) = memory_logger("svc", quiet_config());
        crate::log_info!(logger, "{} items", 3);
        crate::log_debug!(logger, "hidden {}", 1);
        crate::log_critical!(&logger, "down");
        assert_eq!(memory.len(), 2);
        assert!(memory.records()[0].contains("INFO - logger.rs: "));
        assert!(memory.records()[0].ends_with(" - 3 items\n"));
    }

    #[test]
    fn test_macros_skip_formatting_below_level() {
        struct Counting<'a>(&'a Cell<usize>);

        impl std::fmt::Display for Counting<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.set(self.0.get() + 1);
                f.write_str("counted")
            }
        }

        let calls = Cell::new(0);
        let (logger, memory) = memory_logger("svc", quiet_config());
        crate::log_debug!(logger, "{}", Counting(&calls));
        assert_eq!(calls.get(), 0);
        assert!(memory.is_empty());

        crate::log_warning!(logger, "{}", Counting(&calls));
        assert_eq!(calls.get(), 1);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_records_name_the_call_site() {
        let (logger, memory) = memory_logger("svc", quiet_config());
        let line = line!() + 1;
        logger.info("from a method");
        let macro_line = line!() + 1;
        crate::log_error!(logger, "from a macro");
        logger.exception("from exception", &io::Error::new(io::ErrorKind::Other, "x"));
        let exception_line = line!() - 1;

        let records = memory.records();
        assert!(records[0].contains(&format!("svc - INFO - logger.rs: {} - from a method", line)));
        assert!(records[1].contains(&format!("svc - ERROR - logger.rs: {} - from a macro", macro_line)));
        assert!(records[2].contains(&format!("logger.rs: {} - from exception", exception_line)));
    }

    #[test]
    fn test_logger_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Logger>();
    }
}
