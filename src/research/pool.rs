//! Bounded worker pool for search fan-out
//!
//! A fixed number of permits caps how many units run at once. Units over the
//! cap wait on the semaphore, which hands out permits in FIFO order, so the
//! semaphore's wait list is the overflow queue.

use crate::types::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Snapshot of pool activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Maximum number of concurrent units, `None` when unbounded
    pub limit: Option<usize>,
    /// Units currently holding a permit
    pub in_flight: usize,
    /// Units waiting for a permit
    pub queued: usize,
    /// Highest `in_flight` value observed
    pub peak_in_flight: usize,
    /// Units that have finished
    pub completed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    queued: AtomicUsize,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

/// Cloneable handle to a shared pool. Clones share permits and counters.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Option<Arc<Semaphore>>,
    limit: Option<usize>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Pool allowing at most `limit` concurrent units; `None` launches all at once
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            permits: limit.map(|n| Arc::new(Semaphore::new(n))),
            limit,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Pool with no concurrency cap
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Run `work` once a permit is available.
    ///
    /// The permit is held until `work` completes or is dropped, so aborting
    /// the calling task frees its slot for the next queued unit.
    pub async fn run<F>(&self, work: F) -> Result<F::Output>
    where
        F: Future,
    {
        let _permit = match &self.permits {
            Some(semaphore) => {
                let waiting = Queued::enter(&self.counters);
                let acquired = Arc::clone(semaphore).acquire_owned().await;
                drop(waiting);
                Some(acquired.map_err(|_| {
                    AppError::Internal("Worker pool semaphore closed".to_string())
                })?)
            }
            None => None,
        };

        let _slot = InFlight::enter(&self.counters);
        Ok(work.await)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            limit: self.limit,
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            queued: self.counters.queued.load(Ordering::SeqCst),
            peak_in_flight: self.counters.peak_in_flight.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
        }
    }
}

/// Tracks one unit waiting for a permit.
struct Queued<'a> {
    counters: &'a Counters,
}

impl<'a> Queued<'a> {
    fn enter(counters: &'a Counters) -> Self {
        counters.queued.fetch_add(1, Ordering::SeqCst);
        Self { counters }
    }
}

impl Drop for Queued<'_> {
    fn drop(&mut self) {
        self.counters.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Tracks one running unit; decrements on drop, including on abort.
struct InFlight<'a> {
    counters: &'a Counters,
}

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { counters }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.completed.fetch_add(1, Ordering::SeqCst);
    }
}
