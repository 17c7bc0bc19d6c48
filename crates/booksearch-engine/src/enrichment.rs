//! Secondary metadata lookups for search results.
//!
//! For each book with a usable ISBN one `Volume` request is sent to the
//! enrichment provider; all of them run as a single dispatcher batch. The
//! stage is purely additive: a failed or empty lookup leaves the record
//! unenriched but never removes it.

use std::sync::Arc;

use booksearch_common::isbn::{clean_isbn, is_valid_isbn};
use booksearch_common::{Book, BookRecord};
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::source::{Request, Source};
use crate::task::FetchTask;

/// Attaches [`Enrichment`](booksearch_common::Enrichment) data to books.
#[derive(Clone)]
pub struct EnrichmentStage {
    source: Option<Arc<dyn Source>>,
    dispatcher: Dispatcher,
}

impl EnrichmentStage {
    /// Create a stage backed by `source`. With `None` every record is
    /// returned unenriched.
    pub fn new(source: Option<Arc<dyn Source>>, dispatcher: Dispatcher) -> Self {
        Self { source, dispatcher }
    }

    /// Enrich `books`, preserving their order and count.
    pub async fn enrich(&self, books: Vec<Book>) -> Vec<BookRecord> {
        let mut records: Vec<BookRecord> = books.into_iter().map(BookRecord::from).collect();
        let Some(source) = &self.source else {
            return records;
        };

        let mut positions = Vec::new();
        let mut tasks = Vec::new();
        for (index, record) in records.iter().enumerate() {
            match record.book.isbn.as_deref() {
                Some(isbn) if is_valid_isbn(isbn) => {
                    positions.push(index);
                    tasks.push(FetchTask::new(
                        Arc::clone(source),
                        Request::Volume {
                            isbn: clean_isbn(isbn),
                        },
                    ));
                }
                other => {
                    debug!(
                        isbn = ?other,
                        title = ?record.book.title,
                        "Skipping enrichment for record without a usable isbn"
                    );
                }
            }
        }

        let finished = self.dispatcher.run_all(tasks).await;

        for (index, task) in positions.into_iter().zip(finished) {
            if let Some(e) = task.error() {
                warn!(
                    provider = task.provider(),
                    isbn = ?records[index].book.isbn,
                    error = %e,
                    "Enrichment lookup failed; leaving record unenriched"
                );
                continue;
            }

            match task.payload().map(|payload| payload.as_volume()) {
                Some(Some(Some(extra))) => records[index].extra = extra.clone(),
                Some(Some(None)) => {
                    debug!(isbn = ?records[index].book.isbn, "No enrichment match");
                }
                _ => {
                    warn!(
                        provider = task.provider(),
                        isbn = ?records[index].book.isbn,
                        "Enrichment provider returned an unexpected payload"
                    );
                }
            }
        }

        records
    }
}
