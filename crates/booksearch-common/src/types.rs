//! Core type definitions for filters, book records and search results.
//!
//! All enums are serialized in snake_case so they line up with the filter
//! names used in URLs (`/b/author/conrad`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of items a provider returns per listing page.
pub const PAGE_SIZE: u64 = 10;

/// Number of pages needed to show `total_results` items at [`PAGE_SIZE`].
pub fn total_pages_for(total_results: u64) -> u64 {
    total_results.div_ceil(PAGE_SIZE)
}

/// Field a search is filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Direct lookup by ISBN.
    Isbn,
    /// Direct search by title.
    Title,
    /// Direct lookup by the provider's book id (slug).
    BookId,
    /// Two-tier search: author names, then books per author.
    Author,
    /// Two-tier search: publisher names, then books per publisher.
    Publisher,
    /// Two-tier search: subject names, then books per subject.
    Subject,
}

impl FilterKind {
    /// All supported filters, in the order they are documented.
    pub const ALL: [FilterKind; 6] = [
        Self::Isbn,
        Self::Title,
        Self::Author,
        Self::Publisher,
        Self::Subject,
        Self::BookId,
    ];

    /// The entity a two-tier filter resolves through, or `None` for direct filters.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Author => Some(EntityKind::Author),
            Self::Publisher => Some(EntityKind::Publisher),
            Self::Subject => Some(EntityKind::Subject),
            Self::Isbn | Self::Title | Self::BookId => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Isbn => "isbn",
            Self::Title => "title",
            Self::BookId => "book_id",
            Self::Author => "author",
            Self::Publisher => "publisher",
            Self::Subject => "subject",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownFilter(s.to_string()))
    }
}

/// Kind of entity resolved by the first tier of a two-tier search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Author,
    Publisher,
    Subject,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Publisher => "publisher",
            Self::Subject => "subject",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity fields of a book as returned by the primary catalogue.
///
/// Two books are duplicates iff every field here is equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    pub book_id: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub title_long: Option<String>,
    /// Free-text author line, e.g. `"Conrad, Joseph"`.
    pub authors_text: Option<String>,
    /// Author names in the order the catalogue lists them.
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher_id: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
}

impl Book {
    /// Trim every text field, turn blanks into `None` and derive `authors`
    /// from `authors_text` when the catalogue did not provide a list.
    #[must_use]
    pub fn normalized(self) -> Self {
        let authors_text = clean(self.authors_text);
        let mut authors: Vec<String> = self
            .authors
            .into_iter()
            .filter_map(|a| clean(Some(a)))
            .collect();
        if authors.is_empty() {
            if let Some(text) = &authors_text {
                authors = text
                    .split(',')
                    .filter_map(|a| clean(Some(a.to_string())))
                    .collect();
            }
        }

        Self {
            book_id: clean(self.book_id),
            isbn: clean(self.isbn),
            title: clean(self.title),
            title_long: clean(self.title_long),
            authors_text,
            authors,
            publisher_id: clean(self.publisher_id),
            publisher: clean(self.publisher),
            language: clean(self.language),
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Secondary metadata attached by the enrichment provider.
///
/// Every field is independently optional; a record that could not be
/// enriched carries `Enrichment::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub page_count: Option<u32>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    /// Cover image URLs keyed by size name (`thumbnail`, `small`, ...).
    pub image_links: Option<BTreeMap<String, String>>,
}

impl Enrichment {
    /// Returns `true` when no enrichment field is present.
    pub fn is_empty(&self) -> bool {
        self.page_count.is_none()
            && self.average_rating.is_none()
            && self.ratings_count.is_none()
            && self.image_links.is_none()
    }
}

/// A book together with whatever enrichment data was found for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(flatten)]
    pub book: Book,
    #[serde(flatten)]
    pub extra: Enrichment,
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            book,
            extra: Enrichment::default(),
        }
    }
}

/// One page of search results.
///
/// `total_pages` is always consistent with `total_results` at [`PAGE_SIZE`]
/// for direct searches; two-tier searches report scaled estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub filter: FilterKind,
    pub query: String,
    pub items: Vec<BookRecord>,
    pub total_results: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

impl SearchResult {
    /// Number of items on this page.
    pub fn shown_results(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the current page is not the last one.
    pub fn has_more_pages(&self) -> bool {
        u64::from(self.current_page) < self.total_pages
    }
}
