//! Idle-worker store: the ordered hot path of the pool's two-tier cache.
//!
//! A `WorkerStore` holds every worker that is currently idle and still
//! alive, ordered by `last_returned_at` so the reaper can binary-search the
//! prefix that has aged past the expiry duration. Dispatch always pops the
//! *most* recently returned worker (LIFO) — the one least likely to have
//! gone cold — mirroring the order `WorkerCache` uses for its own free list.

use crate::worker::Worker;
use std::collections::VecDeque;
use std::time::Instant;
use wpool_core::{PoolError, PoolResult};

/// Operations common to both store backings.
///
/// Dispatched through `StoreKind` rather than as a `dyn WorkerStore` — this
/// sits on the pool's hottest path (every submit and every return touches
/// it), and the teacher prefers a concrete, statically-dispatched type over
/// a trait object wherever a call happens per-task rather than per-pool.
pub(crate) trait WorkerStore {
    /// Insert a newly idle worker. Workers are expected to arrive in
    /// non-decreasing `last_returned_at` order (the caller stamps the
    /// timestamp immediately before insertion), so the store never needs to
    /// re-sort.
    fn insert(&mut self, worker: Worker) -> PoolResult<()>;

    /// Remove and return the most recently idle worker, if any.
    fn detach(&mut self) -> Option<Worker>;

    /// Remove every worker whose `last_returned_at` is at or before
    /// `now - expiry`, returning them for sentinel dispatch.
    fn retrieve_expired(&mut self, now: Instant, expiry: std::time::Duration) -> Vec<Worker>;

    /// Remove every worker, returning them (used on `release`/`reboot`).
    fn reset(&mut self) -> Vec<Worker>;

    fn len(&self) -> usize;
}

/// Growable, unbounded store backed by a `Vec<Worker>`. Default mode.
pub(crate) struct StackStore {
    items: Vec<Worker>,
}

impl StackStore {
    pub(crate) fn new() -> Self {
        StackStore { items: Vec::new() }
    }
}

impl WorkerStore for StackStore {
    fn insert(&mut self, worker: Worker) -> PoolResult<()> {
        self.items.push(worker);
        Ok(())
    }

    fn detach(&mut self) -> Option<Worker> {
        self.items.pop()
    }

    fn retrieve_expired(&mut self, now: Instant, expiry: std::time::Duration) -> Vec<Worker> {
        let cutoff = now.checked_sub(expiry).unwrap_or(now);
        // `items` is non-decreasing in `last_returned_at`, so the prefix
        // that has expired is exactly the partition point of "still fresh".
        let split = self.items.partition_point(|w| w.last_returned_at <= cutoff);
        self.items.drain(..split).collect()
    }

    fn reset(&mut self) -> Vec<Worker> {
        std::mem::take(&mut self.items)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Fixed-capacity store backed by a `VecDeque<Worker>`, pre-sized to the
/// pool's capacity under `pre_alloc`. Rejects `insert` past capacity with
/// [`PoolError::QueueFull`] rather than growing — the pool never inserts
/// more idle workers than it has spawned, so this only trips if a caller
/// mixes `pre_alloc` with a later `tune()` that raises capacity beyond the
/// ring's original size, which the pool guards against separately.
pub(crate) struct RingStore {
    items: VecDeque<Worker>,
    capacity: usize,
}

impl RingStore {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        RingStore {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
}

impl WorkerStore for RingStore {
    fn insert(&mut self, worker: Worker) -> PoolResult<()> {
        if self.items.len() >= self.capacity {
            return Err(PoolError::QueueFull);
        }
        self.items.push_back(worker);
        Ok(())
    }

    fn detach(&mut self) -> Option<Worker> {
        self.items.pop_back()
    }

    fn retrieve_expired(&mut self, now: Instant, expiry: std::time::Duration) -> Vec<Worker> {
        let cutoff = now.checked_sub(expiry).unwrap_or(now);
        let split = self
            .items
            .iter()
            .take_while(|w| w.last_returned_at <= cutoff)
            .count();
        self.items.drain(..split).collect()
    }

    fn reset(&mut self) -> Vec<Worker> {
        self.items.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Static-dispatch union of the two store backings, selected once at
/// `Pool::new` time by `options.pre_alloc` and never switched thereafter.
pub(crate) enum StoreKind {
    Stack(StackStore),
    Ring(RingStore),
}

impl StoreKind {
    pub(crate) fn new(pre_alloc: bool, capacity: i64) -> Self {
        if pre_alloc && capacity > 0 {
            StoreKind::Ring(RingStore::with_capacity(capacity as usize))
        } else {
            StoreKind::Stack(StackStore::new())
        }
    }
}

impl WorkerStore for StoreKind {
    fn insert(&mut self, worker: Worker) -> PoolResult<()> {
        match self {
            StoreKind::Stack(s) => s.insert(worker),
            StoreKind::Ring(s) => s.insert(worker),
        }
    }

    fn detach(&mut self) -> Option<Worker> {
        match self {
            StoreKind::Stack(s) => s.detach(),
            StoreKind::Ring(s) => s.detach(),
        }
    }

    fn retrieve_expired(&mut self, now: Instant, expiry: std::time::Duration) -> Vec<Worker> {
        match self {
            StoreKind::Stack(s) => s.retrieve_expired(now, expiry),
            StoreKind::Ring(s) => s.retrieve_expired(now, expiry),
        }
    }

    fn reset(&mut self) -> Vec<Worker> {
        match self {
            StoreKind::Stack(s) => s.reset(),
            StoreKind::Ring(s) => s.reset(),
        }
    }

    fn len(&self) -> usize {
        match self {
            StoreKind::Stack(s) => s.len(),
            StoreKind::Ring(s) => s.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn worker_at(millis_ago: u64, base: Instant) -> Worker {
        let w = Worker::new_channel(1);
        w.backdate_for_test(base - Duration::from_millis(millis_ago))
    }

    #[test]
    fn stack_detach_is_lifo() {
        let base = Instant::now();
        let mut store = StackStore::new();
        store.insert(worker_at(200, base)).unwrap();
        store.insert(worker_at(100, base)).unwrap();
        store.insert(worker_at(0, base)).unwrap();
        let first = store.detach().unwrap();
        assert_eq!(first.last_returned_at, base);
    }

    #[test]
    fn stack_retrieve_expired_takes_prefix() {
        let base = Instant::now();
        let mut store = StackStore::new();
        store.insert(worker_at(500, base)).unwrap();
        store.insert(worker_at(400, base)).unwrap();
        store.insert(worker_at(10, base)).unwrap();

        let expired = store.retrieve_expired(base, Duration::from_millis(300));
        assert_eq!(expired.len(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ring_rejects_insert_past_capacity() {
        let mut store = RingStore::with_capacity(1);
        store.insert(Worker::new_channel(1)).unwrap();
        assert_eq!(store.insert(Worker::new_channel(1)), Err(PoolError::QueueFull));
    }

    #[test]
    fn ring_retrieve_expired_matches_stack_semantics() {
        let base = Instant::now();
        let mut store = RingStore::with_capacity(4);
        store.insert(worker_at(500, base)).unwrap();
        store.insert(worker_at(10, base)).unwrap();
        let expired = store.retrieve_expired(base, Duration::from_millis(100));
        assert_eq!(expired.len(), 1);
        assert_eq!(store.len(), 1);
    }
}
