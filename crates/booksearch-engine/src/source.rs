//! The outbound provider capability and the shapes exchanged with it.
//!
//! Every provider adapter (catalogue, enrichment, ...) implements [`Source`].
//! The engine never depends on a concrete adapter: it builds a [`Request`],
//! hands it to whichever source it was configured with, and reads the decoded
//! [`Payload`] back.

use async_trait::async_trait;
use booksearch_common::{total_pages_for, Book, Enrichment, EntityId, EntityKind, FetchError};

/// What a book listing is filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BookFilter {
    Isbn(String),
    Title(String),
    BookId(String),
    /// Books belonging to an entity resolved by a first-tier lookup.
    Entity(EntityKind, EntityId),
}

impl BookFilter {
    /// Name of the index the filter searches on.
    pub fn index(&self) -> &'static str {
        match self {
            Self::Isbn(_) => "isbn",
            Self::Title(_) => "title",
            Self::BookId(_) => "book_id",
            Self::Entity(EntityKind::Author, _) => "person_id",
            Self::Entity(EntityKind::Publisher, _) => "publisher_id",
            Self::Entity(EntityKind::Subject, _) => "subject_id",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Isbn(v) | Self::Title(v) | Self::BookId(v) => v,
            Self::Entity(_, id) => id.as_str(),
        }
    }
}

/// A single idempotent provider call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
    /// One page of books matching a filter.
    Books { filter: BookFilter, page: u32 },
    /// One page of entity ids whose name matches `name`.
    Entities {
        kind: EntityKind,
        name: String,
        page: u32,
    },
    /// Secondary metadata for a single (cleaned) ISBN.
    Volume { isbn: String },
}

impl Request {
    /// Stable operation identity, used in cache keys and log lines.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Books { .. } => "books",
            Self::Entities { .. } => "entities",
            Self::Volume { .. } => "volume",
        }
    }

    /// Ordered parameter list describing the call.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Books { filter, page } => vec![
                ("index", filter.index().to_string()),
                ("value", filter.value().to_string()),
                ("page", page.to_string()),
            ],
            Self::Entities { kind, name, page } => vec![
                ("kind", kind.to_string()),
                ("name", name.clone()),
                ("page", page.to_string()),
            ],
            Self::Volume { isbn } => vec![("isbn", isbn.clone())],
        }
    }
}

/// One page of a provider listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Total matches across all pages, as reported by the provider.
    pub total_results: u64,
    /// Page this listing corresponds to.
    pub page_number: u32,
}

impl<T> Listing<T> {
    /// An empty listing for `page_number` reporting zero matches.
    pub fn empty(page_number: u32) -> Self {
        Self {
            items: Vec::new(),
            total_results: 0,
            page_number,
        }
    }

    pub fn total_pages(&self) -> u64 {
        total_pages_for(self.total_results)
    }
}

/// Decoded provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Books(Listing<Book>),
    Entities(Listing<EntityId>),
    /// `None` when the provider reported zero matches.
    Volume(Option<Enrichment>),
}

impl Payload {
    pub fn as_books(&self) -> Option<&Listing<Book>> {
        match self {
            Self::Books(listing) => Some(listing),
            _ => None,
        }
    }

    pub fn as_entities(&self) -> Option<&Listing<EntityId>> {
        match self {
            Self::Entities(listing) => Some(listing),
            _ => None,
        }
    }

    pub fn as_volume(&self) -> Option<Option<&Enrichment>> {
        match self {
            Self::Volume(volume) => Some(volume.as_ref()),
            _ => None,
        }
    }
}

/// Async capability every provider adapter implements.
///
/// Implementations own the wire format: they translate a [`Request`] into
/// whatever HTTP call the provider expects and decode the response into a
/// [`Payload`]. Unreachable providers and error statuses map to
/// [`FetchError::Transport`]; undecodable bodies to [`FetchError::Parse`].
///
/// Sources are shared across concurrent tasks behind an `Arc`.
#[async_trait]
pub trait Source: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"isbndb"`).
    fn name(&self) -> &'static str;

    /// Perform the call described by `request`.
    async fn fetch(&self, request: &Request) -> Result<Payload, FetchError>;
}
