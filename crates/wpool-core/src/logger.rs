//! Injectable logging sink.
//!
//! The pool logs exactly two things on its own: a panic recovered from a
//! task (when no [`PanicHandler`](crate::PanicHandler) is configured) and a
//! swallowed internal store error from the reaper. Everything else is
//! silent. `Logger` is the seam a caller plugs into to redirect that output;
//! the default writes timestamped lines to stderr, the same shape as the
//! pool implementation this crate's design is modeled on.

use std::fmt;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

/// A sink for formatted pool diagnostics.
///
/// Implementors must be cheap to call from any worker thread and must not
/// panic — a logger that panics while unwinding a task's own panic would
/// abort the process.
pub trait Logger: Send + Sync {
    fn log(&self, args: fmt::Arguments<'_>);
}

/// Default logger: timestamped lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "[wpool] {}.{:06} {}", now.as_secs(), now.subsec_micros(), args);
    }
}

/// Convenience macro mirroring the `log`/`tracing` crates' call shape,
/// without depending on either — the pool logs through the injected
/// [`Logger`] trait object, not a process-global subscriber.
#[macro_export]
macro_rules! pool_log {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingLogger(Mutex<Vec<String>>);

    impl Logger for RecordingLogger {
        fn log(&self, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(args.to_string());
        }
    }

    #[test]
    fn custom_logger_receives_formatted_message() {
        let logger = Arc::new(RecordingLogger(Mutex::new(Vec::new())));
        pool_log!(logger, "worker {} retired", 3);
        let messages = logger.0.lock().unwrap();
        assert_eq!(messages.as_slice(), ["worker 3 retired"]);
    }

    #[test]
    fn stderr_logger_does_not_panic() {
        let logger = StderrLogger;
        pool_log!(logger, "smoke test {}", 1);
    }
}
