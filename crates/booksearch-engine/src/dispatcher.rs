//! Concurrent, order-preserving execution of fetch batches.
//!
//! Every task in a batch runs as its own Tokio task inside a
//! [`JoinSet`](tokio::task::JoinSet). A batch call returns only after every
//! task has finished, and results always come back in submission order.
//! Dropping the returned future aborts whatever is still running.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use booksearch_common::FetchError;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::source::Payload;
use crate::task::FetchTask;

/// Runs batches of [`FetchTask`]s against a shared [`ResponseCache`].
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct Dispatcher {
    cache: Arc<ResponseCache>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher. `timeout` bounds each individual provider call;
    /// `None` lets calls run for as long as the provider takes.
    pub fn new(cache: Arc<ResponseCache>, timeout: Option<Duration>) -> Self {
        Self { cache, timeout }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run every task concurrently and return them finished, in input order.
    ///
    /// Never fails: a task that errored (or whose unit of work panicked) is
    /// returned in its slot with [`TaskState::Failed`](crate::TaskState::Failed).
    pub async fn run_all(&self, tasks: Vec<FetchTask>) -> Vec<FetchTask> {
        let count = tasks.len();
        if count == 0 {
            return Vec::new();
        }
        debug!(tasks = count, "Dispatching fetch batch");

        let mut set = JoinSet::new();
        let mut positions = HashMap::with_capacity(count);
        let mut slots: Vec<Option<FetchTask>> = Vec::with_capacity(count);
        let mut shells: Vec<FetchTask> = Vec::with_capacity(count);

        for (index, task) in tasks.into_iter().enumerate() {
            shells.push(task.clone());
            slots.push(None);

            let cache = Arc::clone(&self.cache);
            let timeout = self.timeout;
            let handle = set.spawn(async move { (index, task.run(&cache, timeout).await) });
            positions.insert(handle.id(), index);
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, task)) => slots[index] = Some(task),
                Err(e) => {
                    if let Some(&index) = positions.get(&e.id()) {
                        warn!(
                            provider = shells[index].provider(),
                            operation = shells[index].request().operation(),
                            error = %e,
                            "Fetch task did not complete"
                        );
                        slots[index] = Some(
                            shells[index]
                                .clone()
                                .finish(Err(FetchError::Aborted(e.to_string()))),
                        );
                    }
                }
            }
        }

        let finished: Vec<FetchTask> = slots
            .into_iter()
            .zip(shells)
            .map(|(slot, shell)| {
                slot.unwrap_or_else(|| {
                    shell.finish(Err(FetchError::Aborted("task was lost".to_string())))
                })
            })
            .collect();

        debug!(
            tasks = count,
            failed = finished.iter().filter(|t| t.error().is_some()).count(),
            "Fetch batch complete"
        );
        finished
    }

    /// Run every task and return only the payloads, in input order.
    ///
    /// Failed tasks are logged and resolve to `None`.
    pub async fn run_all_data(&self, tasks: Vec<FetchTask>) -> Vec<Option<Arc<Payload>>> {
        self.run_all(tasks)
            .await
            .into_iter()
            .map(|task| {
                if let Some(e) = task.error() {
                    warn!(
                        provider = task.provider(),
                        operation = task.request().operation(),
                        params = ?task.request().params(),
                        error = %e,
                        "Fetch failed; continuing without its data"
                    );
                }
                task.into_result().ok()
            })
            .collect()
    }

    /// Run a single task through the cache.
    pub async fn run_one(&self, task: FetchTask) -> FetchTask {
        task.run(&self.cache, self.timeout).await
    }
}
