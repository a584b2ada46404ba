use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tenantlog_core::errors::{Result, TenantLogError};
use tokio::sync::Semaphore;

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Sizing of the bounded executor behind every service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Operations allowed to run at the same time.
    pub workers: usize,
    /// Operations allowed to wait for a free worker.
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerPoolConfig {
    fn admission_limit(&self) -> usize {
        self.workers.max(1) + self.queue_capacity
    }
}

/// Bounded executor. At most `workers` operations run concurrently and at
/// most `queue_capacity` more wait; anything beyond that is refused with
/// [`TenantLogError::Overloaded`] instead of blocking the caller.
#[derive(Clone)]
pub struct WorkerPool {
    config: WorkerPoolConfig,
    permits: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
}

/// Releases an admission slot when the operation ends, including on panic.
struct Admission {
    admitted: Arc<AtomicUsize>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.admitted.fetch_sub(1, Ordering::AcqRel);
    }
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Self {
        Self {
            config,
            permits: Arc::new(Semaphore::new(config.workers.max(1))),
            admitted: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> WorkerPoolConfig {
        self.config
    }

    /// Operations currently running or waiting.
    pub fn in_flight(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }

    /// Runs `operation` on a worker and waits for its result.
    ///
    /// The operation is spawned, so it completes even if the caller stops
    /// waiting. A panic inside it surfaces as [`TenantLogError::WorkerFailed`].
    pub async fn execute<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let admission = self.admit()?;
        let permits = Arc::clone(&self.permits);

        let handle = tokio::spawn(async move {
            let _admission = admission;
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| TenantLogError::WorkerFailed("worker pool closed".into()))?;
            operation.await
        });

        match handle.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                tracing::error!(error = %err, "worker panicked");
                Err(TenantLogError::WorkerFailed("operation panicked".into()))
            }
            Err(err) => Err(TenantLogError::WorkerFailed(err.to_string())),
        }
    }

    fn admit(&self) -> Result<Admission> {
        let limit = self.config.admission_limit();
        self.admitted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < limit).then_some(current + 1)
            })
            .map_err(|current| {
                tracing::warn!(in_flight = current, limit, "worker pool saturated");
                TenantLogError::Overloaded
            })?;

        Ok(Admission {
            admitted: Arc::clone(&self.admitted),
        })
    }
}
