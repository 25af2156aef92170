//! Panic reporting through a logger
//!
//! Installs a process panic hook that writes the panic as a CRITICAL record
//! with pretty framing, tidies empty log files and folders so the report is
//! easy to find, then hands over to the previously installed hook.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::logging::{LogLevel, LogOptions, Logger};
use crate::maintenance;
use crate::paths::LOG_EXTENSION;

/// Name of the logger created by [`install`]
pub const PANIC_LOGGER_NAME: &str = "UNCAUGHT_PANIC";

/// Install the hook with a logger built from `config`.
///
/// Empty logs under `config.log_dir` are removed after each report when file
/// output is enabled.
pub fn install(config: &Config) {
    let cleanup_root = config.file_enabled.then(|| config.log_dir.clone());
    install_with(Logger::with_config(PANIC_LOGGER_NAME, config.clone()), cleanup_root);
}

/// Install the hook with a caller-supplied logger
pub fn install_with(logger: Logger, cleanup_root: Option<PathBuf>) {
    let logger = Arc::new(logger);
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        let backtrace = Backtrace::force_capture();
        let report = describe(thread.name(), location.as_deref(), info.payload(), Some(&backtrace));

        logger.log_with(LogLevel::Critical, &report, LogOptions::pretty());
        logger.flush();

        if let Some(root) = &cleanup_root {
            maintenance::delete_empty_files(root, LOG_EXTENSION);
            maintenance::delete_empty_dirs(root);
        }

        previous(info);
    }));
}

fn payload_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Panic report body, with the backtrace when one was captured
fn describe(
    thread: Option<&str>,
    location: Option<&str>,
    payload: &(dyn Any + Send),
    backtrace: Option<&Backtrace>,
) -> String {
    let mut report = format!(
        "!!! Uncaught panic !!!\nthread: {}\nlocation: {}\nmessage: {}",
        thread.unwrap_or("<unnamed>"),
        location.unwrap_or("<unknown>"),
        payload_text(payload)
    );
    if let Some(backtrace) = backtrace {
        report.push_str(&format!("\nbacktrace:\n{}", backtrace));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryDestination;

    #[test]
    fn test_describe_payloads() {
        let text = describe(Some("worker"), Some("src/main.rs:4:9"), &"boom", None);
        assert!(text.contains("thread: worker"));
        assert!(text.contains("location: src/main.rs:4:9"));
        assert!(text.contains("message: boom"));

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert!(describe(None, None, owned.as_ref(), None).contains("message: owned boom"));

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        let text = describe(None, None, other.as_ref(), None);
        assert!(text.contains("<non-string panic payload>"));
        assert!(text.contains("thread: <unnamed>"));
        assert!(!text.contains("backtrace:"));

        let backtrace = Backtrace::force_capture();
        let text = describe(None, None, &"boom", Some(&backtrace));
        assert!(text.contains("\nbacktrace:\n"));
    }

    #[test]
    fn test_hook_records_panic() {
        let memory = MemoryDestination::new();
        let logger = Logger::builder(PANIC_LOGGER_NAME)
            .config(Config {
                console_enabled: false,
                ..Config::default()
            })
            .destination(memory.clone())
            .build()
            .unwrap();

        let saved = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        install_with(logger, None);
        let result = panic::catch_unwind(|| panic!("hook test panic"));
        drop(panic::take_hook());
        panic::set_hook(saved);

        assert!(result.is_err());
        let contents = memory.contents();
        assert!(contents.contains("UNCAUGHT_PANIC - CRITICAL"));
        assert!(contents.contains("message: hook test panic"));
        assert!(contents.contains("*****"));
        assert!(contents.contains("backtrace:"));
    }
}
