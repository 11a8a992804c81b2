//! # wpool-core
//!
//! Platform-agnostic primitives shared by the pool: the cold-path
//! [`SpinLock`], the [`PoolError`] taxonomy, and the injectable [`Logger`]
//! seam. The admission/return engine itself lives in `wpool-runtime`.
//!
//! ## Modules
//!
//! - `spinlock` - CAS spinlock for `WorkerCache`
//! - `error` - `PoolError` / `PoolResult`
//! - `logger` - `Logger` trait and the default stderr sink

pub mod error;
pub mod logger;
pub mod spinlock;

pub use error::{PoolError, PoolResult};
pub use logger::{Logger, StderrLogger};
pub use spinlock::{SpinLock, SpinLockGuard};
