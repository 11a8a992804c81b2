//! Error types returned by the pool.

use core::fmt;

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors surfaced to callers of the pool.
///
/// Construction errors ([`PoolError::InvalidExpiry`],
/// [`PoolError::InvalidPreAllocSize`]) are returned synchronously from
/// `Pool::new`. Submission errors ([`PoolError::PoolClosed`],
/// [`PoolError::PoolOverloaded`]) are returned synchronously from
/// `Pool::submit`; the task is never invoked. [`PoolError::QueueFull`] is
/// internal to the pre-allocated ring store and never reaches a caller — it
/// only causes a return-refusal, which silently retires the returning
/// worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Reserved for a function-bound pool variant not implemented here;
    /// kept for taxonomy parity with the wider family of pool errors.
    InvalidPoolSize,

    /// `expiry_duration` was negative.
    InvalidExpiry,

    /// `pre_alloc` was set with a non-positive capacity.
    InvalidPreAllocSize,

    /// `submit` was called after `release()`.
    PoolClosed,

    /// Nonblocking admission found no idle or spawnable worker, or the
    /// bounded waiter queue was full.
    PoolOverloaded,

    /// The ring-backed store is at capacity.
    QueueFull,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::InvalidPoolSize => write!(f, "invalid size for pool"),
            PoolError::InvalidExpiry => write!(f, "invalid expiry duration for pool"),
            PoolError::InvalidPreAllocSize => {
                write!(f, "cannot set up a non-positive capacity under pre_alloc mode")
            }
            PoolError::PoolClosed => write!(f, "this pool has been closed"),
            PoolError::PoolOverloaded => {
                write!(f, "too many callers blocked on submit, or nonblocking is set")
            }
            PoolError::QueueFull => write!(f, "the worker queue is full"),
        }
    }
}

impl std::error::Error for PoolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(PoolError::PoolClosed.to_string(), "this pool has been closed");
        assert_eq!(
            PoolError::PoolOverloaded.to_string(),
            "too many callers blocked on submit, or nonblocking is set"
        );
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&PoolError::QueueFull);
    }
}
