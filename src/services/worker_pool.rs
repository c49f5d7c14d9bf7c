use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Hard ceiling on concurrent transcription calls, to stay inside the
/// upstream service's rate limits.
pub const MAX_WORKERS: usize = 10;

#[derive(Debug, Error)]
pub enum WorkerPoolError {
    #[error("worker pool is closed")]
    Closed,
}

/// Bounded-concurrency executor for I/O-bound units of work.
///
/// At most `capacity` units run at once; the rest wait and are admitted in
/// FIFO order. The pool does not look at what the work returns.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(default_capacity())
    }
}

impl WorkerPool {
    /// Creates a pool; `capacity` is clamped to `1..=MAX_WORKERS`.
    pub fn new(capacity: usize) -> Self {
        let capacity = clamp_capacity(capacity);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free slot, then drives `work` to completion while holding it.
    /// The slot is released when `work` finishes or is dropped.
    pub async fn run<F, T>(&self, work: F) -> Result<T, WorkerPoolError>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| WorkerPoolError::Closed)?;
        Ok(work.await)
    }
}

pub fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(1, MAX_WORKERS)
}

/// Available parallelism, clamped to `1..=MAX_WORKERS`.
pub fn default_capacity() -> usize {
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    clamp_capacity(parallelism)
}
