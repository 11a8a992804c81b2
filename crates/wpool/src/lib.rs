//! # wpool - a bounded worker pool
//!
//! A capped population of reusable OS threads that execute short-lived,
//! opaque tasks submitted from anywhere in a program. Three admission modes
//! cover the usual load-shedding choices: spawn a fresh worker while under
//! capacity, park the caller until one frees up, or reject outright in
//! `nonblocking` mode.
//!
//! ## Quick Start
//!
//! ```ignore
//! use wpool::{Pool, PoolOptions};
//!
//! fn main() {
//!     let pool = Pool::new(16, PoolOptions::default()).unwrap();
//!
//!     for i in 0..100 {
//!         pool.submit(Box::new(move || {
//!             println!("task {i} running");
//!         }))
//!         .unwrap();
//!     }
//!
//!     pool.release();
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        submit(task)                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Pool::acquire_worker                    │
//! │      WorkerStore.detach()  →  WorkerCache.obtain()+start()  │
//! │           (fast path)              (spawn path)             │
//! │                     or: wait on the shared condvar          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┴───────────────────┐
//!          ▼                                        ▼
//!    ┌───────────┐                            ┌───────────┐
//!    │  Worker   │  ◄── idle, on return ──     │  Worker   │
//!    │  Thread   │                              │  Thread   │
//!    └───────────┘                              └───────────┘
//!          │                                        │
//!          └───────────────── reaper ───────────────┘
//!              (sentinels workers idle past expiry_duration)
//! ```
//!
//! Task completion, results, and errors are not reported back to the
//! submitter — a task is fire-and-forget. Wire your own result channel into
//! the closure if you need one back.

pub use wpool_core::{pool_log, Logger, PoolError, PoolResult, StderrLogger};

pub use wpool_runtime::{PanicHandler, Pool, PoolOptions, PoolOptionsBuilder, Task, DEFAULT_EXPIRY_DURATION};
