//! Search orchestration.
//!
//! Filters fall into two groups:
//!
//! - **Direct** (`isbn`, `title`, `book_id`): one book listing request, whose
//!   pagination is reported as-is. Any failure aborts the search.
//! - **Two-tier** (`author`, `publisher`, `subject`): the name is first
//!   resolved to entity ids, then the books of every entity are fetched
//!   concurrently. Only the first [`BOOKS_PER_ENTITY`] books of each entity
//!   are kept, and the caller's page number is compressed accordingly.
//!   Failures of individual per-entity fetches are absorbed.
//!
//! Both paths finish by deduplicating and handing the books to the
//! [`EnrichmentStage`].

use std::collections::HashSet;
use std::sync::Arc;

use booksearch_common::isbn::is_valid_isbn;
use booksearch_common::{
    Book, EntityId, EntityKind, FetchError, FilterKind, SearchError, SearchResult,
    ValidationError,
};
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::enrichment::EnrichmentStage;
use crate::source::{BookFilter, Listing, Payload, Request, Source};
use crate::task::FetchTask;

/// Books kept from each entity in a two-tier search.
pub const BOOKS_PER_ENTITY: usize = 3;

/// A validated search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub filter: FilterKind,
    pub value: String,
    pub page: u32,
}

impl Query {
    /// Validate raw caller input. No network activity happens here.
    pub fn parse(filter: &str, value: &str, page: u32) -> Result<Self, ValidationError> {
        let filter: FilterKind = filter.parse()?;
        let value = value.trim();

        if value.is_empty() {
            return Err(ValidationError::EmptyQuery(filter.to_string()));
        }
        if page == 0 {
            return Err(ValidationError::InvalidPage(page));
        }
        if filter == FilterKind::Isbn && !is_valid_isbn(value) {
            return Err(ValidationError::InvalidIsbn(value.to_string()));
        }

        Ok(Self {
            filter,
            value: value.to_string(),
            page,
        })
    }

    /// Entity-listing page a two-tier search must request for this query.
    pub fn entity_page(&self) -> u32 {
        (self.page - 1) / BOOKS_PER_ENTITY as u32 + 1
    }

    /// Maximum number of entities whose books are fetched.
    pub fn entity_limit(&self) -> usize {
        (self.page as usize).saturating_mul(BOOKS_PER_ENTITY)
    }
}

/// Progress of a [`SearchCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    NotStarted,
    /// Resolving entity ids (two-tier searches only).
    Resolving,
    Fetching,
    Deduplicating,
    Enriching,
    Done,
    /// The last run hit a fatal error; running again starts over.
    Failed,
}

/// Shared, process-wide search dependencies.
///
/// Cheap to clone. Hand out one [`SearchCoordinator`] per incoming query via
/// [`coordinator`](Self::coordinator), or use [`search`](Self::search)
/// directly.
#[derive(Clone)]
pub struct SearchContext {
    catalog: Arc<dyn Source>,
    dispatcher: Dispatcher,
    enrichment: EnrichmentStage,
}

impl SearchContext {
    /// `catalog` answers book and entity listings; `enrichment`, when given,
    /// answers per-ISBN volume lookups.
    pub fn new(
        catalog: Arc<dyn Source>,
        enrichment: Option<Arc<dyn Source>>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            catalog,
            enrichment: EnrichmentStage::new(enrichment, dispatcher.clone()),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Validate the query and create a coordinator for it.
    pub fn coordinator(
        &self,
        filter: &str,
        value: &str,
        page: u32,
    ) -> Result<SearchCoordinator, SearchError> {
        let query = Query::parse(filter, value, page)?;
        Ok(SearchCoordinator {
            ctx: self.clone(),
            query,
            state: SearchState::NotStarted,
            result: None,
        })
    }

    /// Run a complete search.
    ///
    /// Returns either a populated result or the first fatal error; partial
    /// failures only show up as missing items or missing enrichment fields.
    pub async fn search(
        &self,
        filter: &str,
        value: &str,
        page: u32,
    ) -> Result<SearchResult, SearchError> {
        let mut coordinator = self.coordinator(filter, value, page)?;
        coordinator.run().await.cloned()
    }
}

/// Books collected for a query, before enrichment.
struct Collected {
    books: Vec<Book>,
    total_results: u64,
    total_pages: u64,
    current_page: u32,
}

/// Runs one query to completion and memoizes its result.
pub struct SearchCoordinator {
    ctx: SearchContext,
    query: Query,
    state: SearchState,
    result: Option<SearchResult>,
}

impl SearchCoordinator {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Execute the search. Once `Done`, later calls return the stored result
    /// without fetching anything.
    pub async fn run(&mut self) -> Result<&SearchResult, SearchError> {
        let result = match self.result.take() {
            Some(result) => result,
            None => match self.execute().await {
                Ok(result) => result,
                Err(e) => {
                    self.state = SearchState::Failed;
                    return Err(e);
                }
            },
        };
        self.state = SearchState::Done;
        Ok(self.result.insert(result))
    }

    async fn execute(&mut self) -> Result<SearchResult, SearchError> {
        info!(
            filter = %self.query.filter,
            query = %self.query.value,
            page = self.query.page,
            "Starting search"
        );

        let value = self.query.value.clone();
        let collected = match self.query.filter {
            FilterKind::Isbn => self.direct(BookFilter::Isbn(value)).await?,
            FilterKind::Title => self.direct(BookFilter::Title(value)).await?,
            FilterKind::BookId => self.direct(BookFilter::BookId(value)).await?,
            FilterKind::Author => self.two_tier(EntityKind::Author).await?,
            FilterKind::Publisher => self.two_tier(EntityKind::Publisher).await?,
            FilterKind::Subject => self.two_tier(EntityKind::Subject).await?,
        };

        self.state = SearchState::Enriching;
        let items = self.ctx.enrichment.enrich(collected.books).await;

        info!(
            filter = %self.query.filter,
            query = %self.query.value,
            items = items.len(),
            total_results = collected.total_results,
            "Search complete"
        );

        Ok(SearchResult {
            filter: self.query.filter,
            query: self.query.value.clone(),
            items,
            total_results: collected.total_results,
            total_pages: collected.total_pages,
            current_page: collected.current_page,
        })
    }

    async fn direct(&mut self, filter: BookFilter) -> Result<Collected, SearchError> {
        self.state = SearchState::Fetching;
        let request = Request::Books {
            filter,
            page: self.query.page,
        };
        let payload = self.fetch_fatal(request).await?;
        let listing = self.expect_books(&payload)?;

        self.state = SearchState::Deduplicating;
        Ok(Collected {
            books: listing.items.clone(),
            total_results: listing.total_results,
            total_pages: listing.total_pages(),
            current_page: listing.page_number,
        })
    }

    async fn two_tier(&mut self, kind: EntityKind) -> Result<Collected, SearchError> {
        self.state = SearchState::Resolving;
        let request = Request::Entities {
            kind,
            name: self.query.value.clone(),
            page: self.query.entity_page(),
        };
        let payload = self.fetch_fatal(request).await?;
        let entities = self.expect_entities(&payload)?;

        // Every entity is assumed to contribute exactly BOOKS_PER_ENTITY books.
        let scale = BOOKS_PER_ENTITY as u64;
        let total_results = entities.total_results.saturating_mul(scale);
        let total_pages = entities.total_pages().saturating_mul(scale);

        let ids: Vec<&EntityId> = entities
            .items
            .iter()
            .take(self.query.entity_limit())
            .collect();
        debug!(
            kind = %kind,
            entity_page = self.query.entity_page(),
            resolved = entities.items.len(),
            used = ids.len(),
            "Resolved entities"
        );

        self.state = SearchState::Fetching;
        let tasks = ids
            .into_iter()
            .map(|id| {
                FetchTask::new(
                    Arc::clone(&self.ctx.catalog),
                    Request::Books {
                        filter: BookFilter::Entity(kind, id.clone()),
                        page: 1,
                    },
                )
            })
            .collect();
        let data = self.ctx.dispatcher.run_all_data(tasks).await;

        self.state = SearchState::Deduplicating;
        let groups = data.iter().flatten().filter_map(|payload| {
            payload
                .as_books()
                .map(|listing| listing.items.iter().take(BOOKS_PER_ENTITY))
        });
        let books = merge_unique(groups);

        Ok(Collected {
            books,
            total_results,
            total_pages,
            current_page: self.query.page,
        })
    }

    /// Run a first-tier request; any failure aborts the search.
    async fn fetch_fatal(&self, request: Request) -> Result<Arc<Payload>, SearchError> {
        let operation = request.operation();
        let task = FetchTask::new(Arc::clone(&self.ctx.catalog), request);
        let provider = task.provider();
        self.ctx
            .dispatcher
            .run_one(task)
            .await
            .into_result()
            .map_err(|cause| SearchError::upstream(provider, operation, cause))
    }

    fn expect_books<'a>(&self, payload: &'a Payload) -> Result<&'a Listing<Book>, SearchError> {
        payload.as_books().ok_or_else(|| {
            SearchError::upstream(
                self.ctx.catalog.name(),
                "books",
                FetchError::parse("expected a book listing"),
            )
        })
    }

    fn expect_entities<'a>(
        &self,
        payload: &'a Payload,
    ) -> Result<&'a Listing<EntityId>, SearchError> {
        payload.as_entities().ok_or_else(|| {
            SearchError::upstream(
                self.ctx.catalog.name(),
                "entities",
                FetchError::parse("expected an entity listing"),
            )
        })
    }
}

/// Concatenate `groups` in order, dropping any book equal to one already seen.
///
/// The first occurrence wins and keeps its position.
pub fn merge_unique<'a, G, I>(groups: G) -> Vec<Book>
where
    G: IntoIterator<Item = I>,
    I: IntoIterator<Item = &'a Book>,
{
    let mut seen: HashSet<&'a Book> = HashSet::new();
    let mut merged = Vec::new();
    for book in groups.into_iter().flatten() {
        if seen.insert(book) {
            merged.push(book.clone());
        }
    }
    merged
}
