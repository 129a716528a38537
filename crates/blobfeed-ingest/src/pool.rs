//! Fixed-size worker pool with zero queue depth
//!
//! `submit` hands a task to a free worker slot or blocks the submitter
//! until one frees up. There is no internal queue: at most `workers`
//! tasks are ever in flight, which bounds network concurrency against
//! the storage account (each task performs a fetch and a delete).

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            tasks: JoinSet::new(),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tasks currently occupying a worker slot.
    pub fn in_flight(&self) -> usize {
        self.workers - self.permits.available_permits()
    }

    /// Run `task` on the next free worker slot.
    ///
    /// Blocks the submitter while all slots are busy; this is the pool's
    /// back-pressure. Submission order is preserved because there is only
    /// one submitter (the poll-loop driver).
    pub async fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Reap finished handles so the join set only holds live tasks.
        while self.tasks.try_join_next().is_some() {}

        // The semaphore is never closed, so acquire can only block, not fail.
        let Ok(permit) = self.permits.clone().acquire_owned().await else {
            unreachable!("worker pool semaphore closed");
        };

        self.tasks.spawn(async move {
            task.await;
            drop(permit);
        });
    }

    /// Block until every previously submitted task has completed.
    ///
    /// Tasks are never cancelled; drain time is bounded by the slowest
    /// in-flight task.
    pub async fn drain(&mut self) {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(err) = res {
                warn!(?err, "Ingestion task panicked");
            }
        }
    }
}
