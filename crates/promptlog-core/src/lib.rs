//! promptlog core
//!
//! Config-driven named loggers with dynamic log file routing, and a prompt
//! logger for recording LLM prompt/response pairs.
//!
//! Configuration is resolved from built-in defaults, an optional YAML file
//! and `LOG_*` environment variables, then passed by value into each logger.
//! Log files land under `<log_dir>/<logger_name>[/<batch_id>]/`.
//!
//! ```rust,no_run
//! use promptlog_core::{Logger, PromptLogger};
//!
//! promptlog_core::init();
//!
//! let logger = Logger::new("my_app");
//! logger.info("Application started");
//! logger.debug("Debug information");
//!
//! let prompts = PromptLogger::new("llm");
//! prompts.log_prompt("Say hello", "Hello!");
//! ```

pub mod config;
pub mod logging;
pub mod resolver;
pub mod paths;
pub mod maintenance;
pub mod panic_hook;

pub use config::{Config, ConfigError, ConfigResult, ConfigWarning, LogFormat};

pub use logging::{
    Logger, LoggerBuilder, LogLevel, LogOptions,
    PromptLogger, PromptLoggerBuilder,
    Destination, ConsoleDestination, FileDestination, MemoryDestination,
};

pub use resolver::{ConfigResolver, ResolvedConfig};

pub use paths::{PathGenerator, make_id};

/// Resolve the process-wide configuration and run startup housekeeping once.
///
/// Optional: loggers resolve the same configuration lazily on first use.
/// Calling this early also runs [`maintenance::run`] against the log folder.
pub fn init() -> &'static Config {
    static STARTED: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();

    let config = Config::global();
    STARTED.get_or_init(|| {
        maintenance::run(config);
    });
    config
}
