//! Worker: one OS thread bound to a one-slot rendezvous channel.
//!
//! A `Worker` is cheap to clone — cloning only duplicates the channel
//! handles, not the thread. This is what lets `WorkerCache` hand a retired
//! worker back out for reuse without recreating its channel: the channel's
//! receiving half lives behind an `Arc<Mutex<_>>` that each spawned thread
//! locks for its own lifetime, so the same `Worker` value can be `start()`ed
//! again after its previous thread has exited.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Instant;

use crate::pool::PoolInner;

/// An opaque, zero-argument, no-return unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A worker's channel carries `Some(task)` to run, or `None` — the
/// sentinel that asks the worker to retire.
type Mail = Option<Task>;

/// A reusable execution agent.
///
/// Holds the sending half of its channel directly (so the pool can dispatch
/// a task without taking any lock beyond the one already held during
/// admission) and the receiving half behind a mutex that the worker's own
/// thread holds for the duration of one `start()` call.
#[derive(Clone)]
pub(crate) struct Worker {
    sender: SyncSender<Mail>,
    receiver: Arc<Mutex<Receiver<Mail>>>,
    pub(crate) last_returned_at: Instant,
}

impl Worker {
    /// Construct a worker with a fresh channel of the given capacity (0 or
    /// 1 — see the pool's channel-capacity rationale).
    pub(crate) fn new_channel(capacity: usize) -> Worker {
        let (sender, receiver) = sync_channel(capacity);
        Worker {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            last_returned_at: Instant::now(),
        }
    }

    /// Hand this worker a task. Never blocks in practice: a worker is only
    /// ever handed a task right after being freshly started (its thread is
    /// about to park on `recv`) or right after being popped off the idle
    /// store (its channel is necessarily empty).
    pub(crate) fn dispatch(&self, task: Task) {
        let _ = self.sender.send(Some(task));
    }

    /// Deposit the sentinel, asking this worker to retire the next time its
    /// thread reads the channel.
    pub(crate) fn sentinel(&self) {
        let _ = self.sender.send(None);
    }

    /// Stamp `last_returned_at` with the current time, consuming and
    /// returning the worker so a return can be written in one expression:
    /// `store.insert(worker.touch_returned_at())`.
    pub(crate) fn touch_returned_at(mut self) -> Worker {
        self.last_returned_at = Instant::now();
        self
    }

    /// Force `last_returned_at` to a specific instant, for store ordering
    /// tests that need workers backdated beyond what real scheduling jitter
    /// could reliably produce.
    #[cfg(test)]
    pub(crate) fn backdate_for_test(mut self, at: Instant) -> Worker {
        self.last_returned_at = at;
        self
    }

    /// Transition to *running*: increment `Pool.running` and spawn the
    /// thread that reads this worker's channel until it sees the sentinel,
    /// the channel disconnects, or a return is refused.
    pub(crate) fn start(&self, pool: Weak<PoolInner>) {
        if let Some(inner) = pool.upgrade() {
            inner.mark_running();
        }
        let worker = self.clone();
        thread::Builder::new()
            .name("wpool-worker".to_string())
            .spawn(move || worker.run(pool))
            .expect("failed to spawn worker thread");
    }

    fn run(&self, pool: Weak<PoolInner>) {
        let receiver = match self.receiver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        loop {
            let task = match receiver.recv() {
                Ok(Some(task)) => task,
                Ok(None) => break, // sentinel: retire
                Err(_) => break,   // channel disconnected: retire
            };

            let Some(inner) = pool.upgrade() else {
                break; // the pool itself is gone; nothing left to report to
            };

            match catch_unwind(AssertUnwindSafe(task)) {
                Ok(()) => {
                    if !inner.return_worker(self.clone()) {
                        break;
                    }
                }
                Err(payload) => {
                    inner.options().handle_panic(payload);
                    break;
                }
            }
        }

        if let Some(inner) = pool.upgrade() {
            inner.retire_worker(self.clone());
        }
    }
}

/// Recover a human-readable message from a `catch_unwind` panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispatch_then_sentinel_runs_task_once_then_retires() {
        let worker = Worker::new_channel(1);
        let counter = Arc::new(AtomicUsize::new(0));
        let receiver = worker.receiver.clone();

        let c = counter.clone();
        worker.dispatch(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        worker.sentinel();

        let rx = receiver.lock().unwrap();
        match rx.recv().unwrap() {
            Some(task) => task(),
            None => panic!("expected a task first"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(rx.recv().unwrap(), None));
    }
}
