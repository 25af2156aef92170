//! Internal diagnostics
//!
//! Problems inside the logging layer itself (bad config values, a log file
//! that cannot be written) are reported here and never raised to the caller.
//! When the host application has installed a `tracing` subscriber the report
//! goes through it; otherwise it is printed to stderr.

/// Prefix for reports printed to stderr
const PREFIX: &str = "[promptlog]";

#[cfg(test)]
thread_local! {
    static REPORTED: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Reports emitted so far on the current thread
#[cfg(test)]
pub(crate) fn reported_on_this_thread() -> usize {
    REPORTED.with(|count| count.get())
}

fn count_report() {
    #[cfg(test)]
    REPORTED.with(|count| count.set(count.get() + 1));
}

/// Report a recoverable problem
pub fn warn(module: &str, message: &str) {
    count_report();
    if tracing::dispatcher::has_been_set() {
        tracing::warn!(target: "promptlog", module, "{}", message);
    } else {
        eprintln!("{} WARNING: [{}] {}", PREFIX, module, message);
    }
}

/// Report a failure that lost log output
pub fn error(module: &str, message: &str) {
    count_report();
    if tracing::dispatcher::has_been_set() {
        tracing::error!(target: "promptlog", module, "{}", message);
    } else {
        eprintln!("{} ERROR: [{}] {}", PREFIX, module, message);
    }
}
