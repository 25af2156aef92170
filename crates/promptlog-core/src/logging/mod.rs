//! Loggers, destinations and record formatting

mod traits;
mod level;
mod console;
mod file;
mod memory;
mod logger;
mod prompt;
pub mod format;
pub mod diag;

pub use traits::{Destination, BoxedDestination};
pub use level::LogLevel;
pub use console::{ConsoleDestination, ConsoleStream};
pub use file::FileDestination;
pub use memory::MemoryDestination;
pub use logger::{Logger, LoggerBuilder, LogOptions};
pub use prompt::{PromptLogger, PromptLoggerBuilder, DEFAULT_PROMPT_NAME};
pub use format::LogRecord;
