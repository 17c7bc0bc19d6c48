//! A single schedulable provider call.

use std::sync::Arc;
use std::time::Duration;

use booksearch_common::FetchError;
use tracing::{debug, trace};

use crate::cache::ResponseCache;
use crate::signature::RequestSignature;
use crate::source::{Payload, Request, Source};

/// Lifecycle of a [`FetchTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Failed,
}

/// One call to one provider, routed through the response cache.
///
/// A task is created `Pending`, moved into a [`Dispatcher`](crate::Dispatcher)
/// batch, and handed back `Done` (with a payload) or `Failed` (with a
/// [`FetchError`]). Once finished its outcome never changes.
#[derive(Clone)]
pub struct FetchTask {
    source: Arc<dyn Source>,
    request: Request,
    signature: RequestSignature,
    state: TaskState,
    outcome: Option<Result<Arc<Payload>, FetchError>>,
}

impl FetchTask {
    pub fn new(source: Arc<dyn Source>, request: Request) -> Self {
        let signature = RequestSignature::new(source.name(), &request);
        Self {
            source,
            request,
            signature,
            state: TaskState::Pending,
            outcome: None,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.source.name()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn signature(&self) -> &RequestSignature {
        &self.signature
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, TaskState::Done | TaskState::Failed)
    }

    /// The decoded payload, if the task completed successfully.
    pub fn payload(&self) -> Option<&Arc<Payload>> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().ok())
    }

    /// The recorded failure, if the task failed.
    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }

    /// Consume the task, yielding its outcome.
    ///
    /// A task that never ran reports [`FetchError::Aborted`].
    pub fn into_result(self) -> Result<Arc<Payload>, FetchError> {
        self.outcome
            .unwrap_or_else(|| Err(FetchError::Aborted("task never ran".to_string())))
    }

    /// Execute the call: serve from `cache` when possible, otherwise ask the
    /// source and cache a successful payload.
    ///
    /// Running an already finished task is a no-op.
    pub async fn run(mut self, cache: &ResponseCache, timeout: Option<Duration>) -> Self {
        if self.is_finished() {
            return self;
        }
        self.state = TaskState::Running;

        if let Some(hit) = cache.get(&self.signature) {
            trace!(
                provider = self.provider(),
                operation = self.request.operation(),
                signature = %self.signature,
                "Cache hit"
            );
            return self.finish(Ok(hit));
        }

        debug!(
            provider = self.provider(),
            operation = self.request.operation(),
            signature = %self.signature,
            params = ?self.request.params(),
            "Fetching from provider"
        );

        let fetch = self.source.fetch(&self.request);
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout(limit)),
            },
            None => fetch.await,
        };

        let outcome = outcome.map(|payload| {
            let payload = Arc::new(payload);
            cache.set(self.signature, Arc::clone(&payload));
            payload
        });

        self.finish(outcome)
    }

    /// Record the final outcome of the task.
    pub(crate) fn finish(mut self, outcome: Result<Arc<Payload>, FetchError>) -> Self {
        self.state = if outcome.is_ok() {
            TaskState::Done
        } else {
            TaskState::Failed
        };
        self.outcome = Some(outcome);
        self
    }
}

impl std::fmt::Debug for FetchTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchTask")
            .field("provider", &self.provider())
            .field("request", &self.request)
            .field("signature", &self.signature.to_string())
            .field("state", &self.state)
            .field("outcome", &self.outcome)
            .finish()
    }
}
