//! Booksearch-Engine: request aggregation, caching, merge and enrichment.
//!
//! A search is turned into batches of independent provider calls. Every call
//! is a [`FetchTask`] that consults the shared [`ResponseCache`] before
//! touching the network; batches are run concurrently by the [`Dispatcher`],
//! which hands results back in submission order.
//!
//! # Module layout
//!
//! - [`source`] -- The [`Source`] capability implemented by provider adapters,
//!   plus the request and payload shapes the engine understands.
//! - [`signature`] -- Canonical cache keys for requests.
//! - [`cache`] -- Process-wide TTL + capacity bounded response cache.
//! - [`task`] -- A single cached provider call and its lifecycle.
//! - [`dispatcher`] -- Concurrent, order-preserving batch execution.
//! - [`coordinator`] -- Direct and two-tier searches with derived pagination.
//! - [`enrichment`] -- Best-effort secondary metadata lookups.

pub mod cache;
pub mod coordinator;
pub mod dispatcher;
pub mod enrichment;
pub mod signature;
pub mod source;
pub mod task;

pub use cache::ResponseCache;
pub use coordinator::{merge_unique, Query, SearchContext, SearchCoordinator, SearchState};
pub use dispatcher::Dispatcher;
pub use enrichment::EnrichmentStage;
pub use signature::RequestSignature;
pub use source::{BookFilter, Listing, Payload, Request, Source};
pub use task::{FetchTask, TaskState};
