//! `WorkerCache`: a best-effort free list of retired [`Worker`] handles.
//!
//! Retiring a worker tears down its thread; recreating a `Worker` only
//! allocates a channel, so the cache exists purely to amortize that
//! allocation under churn, not to keep threads alive. It is guarded by
//! [`SpinLock`] rather than the pool's `Mutex` — this is the cold path
//! (touched only on retire and on a store miss), so the spinlock's CAS
//! overhead is a better trade than contending the pool's own lock.

use crate::worker::Worker;
use wpool_core::SpinLock;

/// Free-list entries beyond this count are dropped rather than cached, for
/// an unbounded (`capacity <= 0`) pool. Bounded pools cap at `2 * capacity`.
/// Unlike the original Go pool, which leans on `sync.Pool`'s GC-driven
/// eviction to keep this list from growing without bound, Rust has no GC
/// backstop here — the cap below is an explicit, load-bearing choice.
const UNBOUNDED_CACHE_CAP: usize = 256;

pub(crate) struct WorkerCache {
    items: SpinLock<Vec<Worker>>,
    cap: usize,
}

impl WorkerCache {
    pub(crate) fn new(capacity: i64) -> Self {
        let cap = if capacity > 0 {
            (capacity as usize).saturating_mul(2)
        } else {
            UNBOUNDED_CACHE_CAP
        };
        WorkerCache {
            items: SpinLock::new(Vec::new()),
            cap,
        }
    }

    /// Take a retired worker off the free list, if one is available.
    pub(crate) fn obtain(&self) -> Option<Worker> {
        self.items.lock().pop()
    }

    /// Offer a retired worker back to the free list. Silently discarded
    /// once the cap is reached — the worker's channel is simply dropped,
    /// and a fresh one is allocated the next time a worker must be spawned.
    pub(crate) fn release(&self, worker: Worker) {
        let mut guard = self.items.lock();
        if guard.len() < self.cap {
            guard.push(worker);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obtain_on_empty_cache_is_none() {
        let cache = WorkerCache::new(4);
        assert!(cache.obtain().is_none());
    }

    #[test]
    fn release_then_obtain_round_trips() {
        let cache = WorkerCache::new(4);
        cache.release(Worker::new_channel(1));
        assert!(cache.obtain().is_some());
        assert!(cache.obtain().is_none());
    }

    #[test]
    fn release_beyond_cap_is_discarded() {
        let cache = WorkerCache::new(1); // cap = 2
        cache.release(Worker::new_channel(1));
        cache.release(Worker::new_channel(1));
        cache.release(Worker::new_channel(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn unbounded_pool_uses_default_cap() {
        let cache = WorkerCache::new(0);
        assert_eq!(cache.cap, UNBOUNDED_CACHE_CAP);
    }
}
