//! # wpool-runtime
//!
//! The pool's concurrency engine: worker lifecycle, the two-tier idle-worker
//! cache, the admission/return protocols, and the expiry reaper. Everything
//! here is private except [`Pool`], [`PoolOptions`], and the `Task` alias —
//! the internal module boundaries exist to keep the hot admission path
//! small and auditable, not as a public API surface.

mod cache;
mod config;
mod pool;
mod store;
mod worker;

pub use config::{PanicHandler, PoolOptions, PoolOptionsBuilder, DEFAULT_EXPIRY_DURATION};
pub use pool::Pool;
pub use worker::Task;
