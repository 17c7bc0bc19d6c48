//! Concrete [`Source`](booksearch_engine::Source) adapters and wiring.
//!
//! - [`IsbndbSource`]: catalogue listings (books and entities).
//! - [`GoogleBooksSource`]: per-ISBN enrichment lookups.

pub mod google_books;
pub mod http;
pub mod isbndb;

pub use google_books::GoogleBooksSource;
pub use isbndb::IsbndbSource;

use std::sync::Arc;

use anyhow::Result;
use booksearch_engine::{Dispatcher, ResponseCache, SearchContext};

use crate::config::Config;

/// Build the process-wide search context: one shared response cache, one
/// dispatcher and both provider adapters.
pub fn build_search_context(config: &Config) -> Result<SearchContext> {
    let timeout = config.fetch.timeout();

    let cache = Arc::new(ResponseCache::new(config.cache.capacity, config.cache.ttl()));
    let dispatcher = Dispatcher::new(cache, Some(timeout));

    let catalog = Arc::new(IsbndbSource::new(&config.isbndb, timeout)?);
    let enrichment = Arc::new(GoogleBooksSource::new(&config.google_books, timeout)?);

    tracing::debug!(
        cache_capacity = config.cache.capacity,
        cache_ttl_secs = config.cache.ttl_secs,
        timeout_secs = config.fetch.timeout_secs,
        "Search context ready"
    );

    Ok(SearchContext::new(catalog, Some(enrichment), dispatcher))
}
