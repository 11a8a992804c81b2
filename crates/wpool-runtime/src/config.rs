//! Pool configuration.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use wpool_core::{pool_log, Logger, PoolError, PoolResult, StderrLogger};

/// Interval the reaper ticks on, and the idle TTL it reclaims against.
pub const DEFAULT_EXPIRY_DURATION: Duration = Duration::from_secs(1);

/// Invoked with the panic payload when a task panics, in place of the
/// default log-and-discard behavior.
pub type PanicHandler = Arc<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;

/// Configuration accepted by [`Pool::new`](crate::pool::Pool::new).
///
/// Built with [`PoolOptions::builder`], mirroring the chained-method
/// construction style used throughout this crate's configuration surface.
#[derive(Clone)]
pub struct PoolOptions {
    pub(crate) expiry_duration: Duration,
    pub(crate) pre_alloc: bool,
    pub(crate) max_waiting: usize,
    pub(crate) nonblocking: bool,
    pub(crate) panic_handler: Option<PanicHandler>,
    pub(crate) logger: Arc<dyn Logger>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            expiry_duration: DEFAULT_EXPIRY_DURATION,
            pre_alloc: false,
            max_waiting: 0,
            nonblocking: false,
            panic_handler: None,
            logger: Arc::new(StderrLogger),
        }
    }
}

impl PoolOptions {
    /// Start building options from defaults.
    pub fn builder() -> PoolOptionsBuilder {
        PoolOptionsBuilder(PoolOptions::default())
    }

    pub fn expiry_duration(&self) -> Duration {
        self.expiry_duration
    }

    pub fn pre_alloc(&self) -> bool {
        self.pre_alloc
    }

    pub fn max_waiting(&self) -> usize {
        self.max_waiting
    }

    pub fn nonblocking(&self) -> bool {
        self.nonblocking
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn panic_handler(&self) -> Option<&PanicHandler> {
        self.panic_handler.as_ref()
    }

    /// Validate and normalize: zero expiry becomes
    /// [`DEFAULT_EXPIRY_DURATION`], `pre_alloc` with a non-positive capacity
    /// is rejected. A negative expiry duration, rejected at this point by
    /// the pool this crate is modeled on, cannot arise here: `Duration` has
    /// no negative representation, so that validation is enforced by the
    /// type system instead of at runtime.
    pub(crate) fn validate(mut self, capacity: i64) -> PoolResult<Self> {
        if self.expiry_duration.is_zero() {
            self.expiry_duration = DEFAULT_EXPIRY_DURATION;
        }
        if self.pre_alloc && capacity <= 0 {
            return Err(PoolError::InvalidPreAllocSize);
        }
        Ok(self)
    }

    /// Invoke the panic handler if configured, else log via the pool's
    /// logger. Always called with the raw panic payload captured by
    /// `catch_unwind`, wrapped so `Fn` can be called from within a `Drop`
    /// unwind context.
    pub(crate) fn handle_panic(&self, payload: Box<dyn Any + Send>) {
        if let Some(handler) = &self.panic_handler {
            // `AssertUnwindSafe` is sound here: the handler only reads the
            // payload, it does not resume the unwind.
            let handler = AssertUnwindSafe(handler);
            (handler.0)(payload);
        } else {
            let message = crate::worker::panic_message(&payload);
            let backtrace = std::backtrace::Backtrace::force_capture();
            pool_log!(self.logger, "worker exits from a panic: {message}\n{backtrace}");
        }
    }
}

/// Consuming builder for [`PoolOptions`].
pub struct PoolOptionsBuilder(PoolOptions);

impl PoolOptionsBuilder {
    pub fn expiry_duration(mut self, d: Duration) -> Self {
        self.0.expiry_duration = d;
        self
    }

    pub fn pre_alloc(mut self, enabled: bool) -> Self {
        self.0.pre_alloc = enabled;
        self
    }

    pub fn max_waiting(mut self, n: usize) -> Self {
        self.0.max_waiting = n;
        self
    }

    pub fn nonblocking(mut self, enabled: bool) -> Self {
        self.0.nonblocking = enabled;
        self
    }

    pub fn panic_handler(mut self, handler: PanicHandler) -> Self {
        self.0.panic_handler = Some(handler);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.0.logger = logger;
        self
    }

    pub fn build(self) -> PoolOptions {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_expiry_is_one_second() {
        let opts = PoolOptions::default();
        assert_eq!(opts.expiry_duration(), DEFAULT_EXPIRY_DURATION);
    }

    #[test]
    fn zero_expiry_normalizes_to_default() {
        let opts = PoolOptions::builder()
            .expiry_duration(Duration::ZERO)
            .build()
            .validate(-1)
            .unwrap();
        assert_eq!(opts.expiry_duration(), DEFAULT_EXPIRY_DURATION);
    }

    #[test]
    fn negative_capacity_with_pre_alloc_is_rejected() {
        let err = PoolOptions::builder()
            .pre_alloc(true)
            .build()
            .validate(0)
            .unwrap_err();
        assert_eq!(err, PoolError::InvalidPreAllocSize);
    }

    #[test]
    fn pre_alloc_with_positive_capacity_is_accepted() {
        let opts = PoolOptions::builder().pre_alloc(true).build().validate(4);
        assert!(opts.is_ok());
    }
}
