//! Bounded work pool for blocking provider calls.
//!
//! A [`WorkPool`] admits at most `size` operations at once. Each submitted
//! operation waits for a permit, then runs on tokio's blocking thread pool so
//! the scheduling side never blocks. Submission itself never waits.
//!
//! Every operation resolves: with its value, or with a [`PoolError`] when it
//! panicked, overran its limit, was cancelled, or the pool was closed before
//! it got a permit.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use crate::error::PoolError;

/// Fixed-size pool handle. Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct WorkPool {
    name: Arc<str>,
    size: usize,
    permits: Arc<Semaphore>,
    runtime: Handle,
}

impl WorkPool {
    /// Pool bound to the runtime the caller is running on.
    pub fn new(name: impl Into<String>, size: usize) -> Result<Self, PoolError> {
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        Ok(Self::with_handle(name, size, runtime))
    }

    pub fn with_handle(name: impl Into<String>, size: usize, runtime: Handle) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            size,
            permits: Arc::new(Semaphore::new(size)),
            runtime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runtime the pool schedules onto.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Queue a blocking operation. Returns immediately.
    pub fn submit<T, F>(&self, label: impl Into<String>, op: F) -> PoolTask<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.submit_with_limit(label, None, op)
    }

    /// Like [`submit`](Self::submit), but give up after `limit` of running time.
    ///
    /// The clock starts once the operation holds a permit, so time spent
    /// queued behind other work does not count. An operation that overruns
    /// resolves to [`PoolError::TimedOut`]; its thread cannot be interrupted
    /// and keeps the permit until it returns.
    pub fn submit_with_limit<T, F>(
        &self,
        label: impl Into<String>,
        limit: Option<Duration>,
        op: F,
    ) -> PoolTask<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let label: String = label.into();
        let permits = Arc::clone(&self.permits);
        let pool = Arc::clone(&self.name);
        let runtime = self.runtime.clone();
        let task_label = label.clone();

        let handle = self.runtime.spawn(async move {
            let permit = permits.acquire_owned().await.map_err(|_| PoolError::Closed {
                pool: pool.to_string(),
            })?;

            let start = Instant::now();
            let mut blocking = runtime.spawn_blocking(op);
            let outcome = match limit {
                None => (&mut blocking).await,
                Some(limit) => match tokio::time::timeout(limit, &mut blocking).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        debug!(pool = %pool, label = %task_label, ?limit, "pool operation timed out");
                        runtime.spawn(async move {
                            let _ = blocking.await;
                            drop(permit);
                        });
                        return Err(PoolError::TimedOut {
                            label: task_label,
                            limit,
                        });
                    }
                },
            };
            drop(permit);
            let elapsed_ms = start.elapsed().as_millis() as u64;
            debug!(pool = %pool, label = %task_label, elapsed_ms, "pool operation finished");

            outcome.map_err(|e| from_join_error(&task_label, e))
        });

        PoolTask { label, handle }
    }

    /// Wait for every task from async code. Results keep submission order.
    pub async fn join_all<T>(tasks: Vec<PoolTask<T>>) -> Vec<Result<T, PoolError>>
    where
        T: Send + 'static,
    {
        join_all(tasks.into_iter().map(PoolTask::wait)).await
    }

    /// Wait for every task from a blocking thread. Results keep submission order.
    ///
    /// Must not be called from inside an async task; pool workers and
    /// `spawn_blocking` threads are fine.
    pub fn wait_all<T>(&self, tasks: Vec<PoolTask<T>>) -> Vec<Result<T, PoolError>>
    where
        T: Send + 'static,
    {
        self.runtime.block_on(Self::join_all(tasks))
    }

    /// Stop admitting work. Operations still waiting for a permit fail with
    /// [`PoolError::Closed`]; running ones finish normally.
    pub fn close(&self) {
        self.permits.close();
    }
}

/// Handle to one submitted operation.
#[derive(Debug)]
pub struct PoolTask<T> {
    label: String,
    handle: JoinHandle<Result<T, PoolError>>,
}

impl<T> PoolTask<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn wait(self) -> Result<T, PoolError> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(from_join_error(&self.label, e)),
        }
    }
}

fn from_join_error(label: &str, err: JoinError) -> PoolError {
    if err.is_panic() {
        PoolError::Panicked {
            label: label.to_string(),
            message: panic_message(err.into_panic()),
        }
    } else {
        PoolError::Cancelled {
            label: label.to_string(),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
