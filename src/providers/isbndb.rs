//! ISBNdb catalogue provider.
//!
//! Serves the `books` and `entities` operations. Listings come from the
//! collection endpoints (`books`, `authors`, `publisher`, `subjects`) using the
//! `index1`/`value1` query scheme, and are always paged 10 items at a time.
//!
//! A book listing looks like:
//!
//! ```json
//! {
//!   "total_results": 88, "page_size": 10, "page_number": 1,
//!   "data": [
//!     { "book_id": "law_and_disorder", "isbn": "0210406240",
//!       "title": "Law and disorder", "authors_text": "Donald Herbert, ",
//!       "publisher_id": "kaplan", "publisher_text": "Kaplan",
//!       "language": "eng" }
//!   ]
//! }
//! ```
//!
//! Entity listings carry `person_id`, `publisher_id` or `subject_id` per item.

use std::time::Duration;

use async_trait::async_trait;
use booksearch_common::{Book, EntityId, EntityKind, FetchError};
use booksearch_engine::{BookFilter, Listing, Payload, Request, Source};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::http::{endpoint, HttpClient};
use crate::config::IsbndbConfig;

const PROVIDER: &str = "isbndb";

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    total_results: u64,
    #[serde(default = "first_page")]
    page_number: u32,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookData {
    book_id: Option<String>,
    isbn: Option<String>,
    title: Option<String>,
    title_long: Option<String>,
    authors_text: Option<String>,
    publisher_id: Option<String>,
    publisher_text: Option<String>,
    language: Option<String>,
}

impl From<BookData> for Book {
    fn from(data: BookData) -> Self {
        Book {
            book_id: data.book_id,
            isbn: data.isbn,
            title: data.title,
            title_long: data.title_long,
            authors_text: data.authors_text,
            authors: Vec::new(),
            publisher_id: data.publisher_id,
            publisher: data.publisher_text,
            language: data.language,
        }
        .normalized()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntityData {
    person_id: Option<String>,
    publisher_id: Option<String>,
    subject_id: Option<String>,
}

impl EntityData {
    fn id_for(self, kind: EntityKind) -> Option<EntityId> {
        let id = match kind {
            EntityKind::Author => self.person_id,
            EntityKind::Publisher => self.publisher_id,
            EntityKind::Subject => self.subject_id,
        }?;
        let id = id.trim();
        (!id.is_empty()).then(|| EntityId::new(id))
    }
}

/// [`Source`] backed by the ISBNdb API.
pub struct IsbndbSource {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl IsbndbSource {
    pub fn new(config: &IsbndbConfig, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new(PROVIDER, config.requests_per_second, timeout)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn collection(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Author => "authors",
            EntityKind::Publisher => "publisher",
            EntityKind::Subject => "subjects",
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        index: &str,
        value: &str,
        page: u32,
        details: bool,
    ) -> Result<ListResponse<T>, FetchError> {
        let mut query = vec![
            ("access_key", self.api_key.clone()),
            ("index1", index.to_string()),
            ("value1", value.to_string()),
            ("page_number", page.to_string()),
        ];
        if details {
            query.push(("results", "details".to_string()));
        }

        let url = endpoint(&self.base_url, &format!("{collection}.json"));
        let response: ListResponse<T> = self.http.get_json(&url, &query).await?;

        if let Some(error) = response.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return Err(FetchError::transport(format!("{PROVIDER}: {error}")));
        }
        Ok(response)
    }

    async fn books(&self, filter: &BookFilter, page: u32) -> Result<Payload, FetchError> {
        let response: ListResponse<BookData> = self
            .list("books", filter.index(), filter.value(), page, true)
            .await?;

        let items: Vec<Book> = response.data.into_iter().map(Book::from).collect();
        debug!(
            index = filter.index(),
            value = filter.value(),
            page,
            items = items.len(),
            total_results = response.total_results,
            "ISBNdb book listing"
        );

        Ok(Payload::Books(Listing {
            items,
            total_results: response.total_results,
            page_number: response.page_number,
        }))
    }

    async fn entities(&self, kind: EntityKind, name: &str, page: u32) -> Result<Payload, FetchError> {
        let response: ListResponse<EntityData> = self
            .list(Self::collection(kind), "name", name, page, false)
            .await?;

        let items: Vec<EntityId> = response
            .data
            .into_iter()
            .filter_map(|entity| entity.id_for(kind))
            .collect();
        debug!(
            kind = %kind,
            entity_name = name,
            page,
            items = items.len(),
            total_results = response.total_results,
            "ISBNdb entity listing"
        );

        Ok(Payload::Entities(Listing {
            items,
            total_results: response.total_results,
            page_number: response.page_number,
        }))
    }
}

#[async_trait]
impl Source for IsbndbSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, request: &Request) -> Result<Payload, FetchError> {
        match request {
            Request::Books { filter, page } => self.books(filter, *page).await,
            Request::Entities { kind, name, page } => self.entities(*kind, name, *page).await,
            Request::Volume { .. } => Err(FetchError::unsupported(PROVIDER, request.operation())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> IsbndbSource {
        let config = IsbndbConfig {
            base_url: format!("{}/api", server.uri()),
            api_key: "KEY".into(),
            requests_per_second: 100,
        };
        IsbndbSource::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn book_listing_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/books.json"))
            .and(query_param("access_key", "KEY"))
            .and(query_param("index1", "title"))
            .and(query_param("value1", "Nostromo"))
            .and(query_param("page_number", "2"))
            .and(query_param("results", "details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 88,
                "page_size": 10,
                "page_number": 2,
                "data": [{
                    "book_id": "nostromo",
                    "isbn": "0140180877 ",
                    "title": "Nostromo",
                    "title_long": "",
                    "authors_text": "Joseph Conrad, Martin Seymour-Smith",
                    "publisher_id": "penguin",
                    "publisher_text": " Penguin ",
                    "language": "eng"
                }]
            })))
            .mount(&server)
            .await;

        let payload = source(&server)
            .fetch(&Request::Books {
                filter: BookFilter::Title("Nostromo".into()),
                page: 2,
            })
            .await
            .unwrap();

        let listing = payload.as_books().unwrap();
        assert_eq!(listing.total_results, 88);
        assert_eq!(listing.page_number, 2);
        assert_eq!(listing.total_pages(), 9);

        let book = &listing.items[0];
        assert_eq!(book.isbn.as_deref(), Some("0140180877"));
        assert_eq!(book.title_long, None);
        assert_eq!(book.publisher.as_deref(), Some("Penguin"));
        assert_eq!(book.authors.len(), 2);
        assert_eq!(book.authors[0], "Joseph Conrad");
    }

    #[tokio::test]
    async fn author_listing_yields_person_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authors.json"))
            .and(query_param("index1", "name"))
            .and(query_param("value1", "conrad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 88,
                "page_number": 1,
                "data": [
                    {"person_id": "conrad_joseph", "name": "Joseph Conrad"},
                    {"name": "No id"},
                    {"person_id": "conrad_betty", "name": "Betty Conrad"}
                ]
            })))
            .mount(&server)
            .await;

        let payload = source(&server)
            .fetch(&Request::Entities {
                kind: EntityKind::Author,
                name: "conrad".into(),
                page: 1,
            })
            .await
            .unwrap();

        let listing = payload.as_entities().unwrap();
        assert_eq!(listing.total_results, 88);
        assert_eq!(
            listing.items,
            vec![EntityId::from("conrad_joseph"), EntityId::from("conrad_betty")]
        );
    }

    #[tokio::test]
    async fn publisher_books_use_publisher_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/books.json"))
            .and(query_param("index1", "publisher_id"))
            .and(query_param("value1", "kaplan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 0,
                "page_number": 1,
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = source(&server)
            .fetch(&Request::Books {
                filter: BookFilter::Entity(EntityKind::Publisher, EntityId::from("kaplan")),
                page: 1,
            })
            .await
            .unwrap();
        assert!(payload.as_books().unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn provider_error_field_fails_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": "Access key error"})),
            )
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch(&Request::Books {
                filter: BookFilter::Isbn("0210406240".into()),
                page: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(msg) if msg.contains("Access key error")));
    }

    #[tokio::test]
    async fn volume_lookups_are_unsupported() {
        let server = MockServer::start().await;
        let err = source(&server)
            .fetch(&Request::Volume {
                isbn: "0210406240".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unsupported { .. }));
    }
}
