//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which starts mock ISBNdb and Google Books
//! servers, points a [`Config`] at them and builds the full [`AppContext`].
//! The [`with_server`](TestHarness::with_server) constructor also starts Axum
//! on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booksearch::config::Config;
use booksearch::providers::build_search_context;
use booksearch::server::{create_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by mock
/// provider servers.
pub struct TestHarness {
    pub ctx: AppContext,
    pub isbndb: MockServer,
    pub google: MockServer,
}

impl TestHarness {
    /// Start both mock providers and build the context against them.
    pub async fn new() -> Self {
        let isbndb = MockServer::start().await;
        let google = MockServer::start().await;

        let mut config = Config::default();
        config.isbndb.base_url = format!("{}/api", isbndb.uri());
        config.isbndb.api_key = "TESTKEY".into();
        config.isbndb.requests_per_second = 1000;
        config.google_books.base_url = google.uri();
        config.google_books.requests_per_second = 1000;
        config.fetch.timeout_secs = 5;

        let search = build_search_context(&config).expect("failed to build search context");
        let ctx = AppContext::new(config, search);

        Self {
            ctx,
            isbndb,
            google,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new().await;
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Serve a `books` listing for `index1=index, value1=value`.
    pub async fn mock_books(&self, index: &str, value: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/books.json"))
            .and(query_param("index1", index))
            .and(query_param("value1", value))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.isbndb)
            .await;
    }

    /// Serve an entity listing from `collection` for the given name.
    pub async fn mock_entities(&self, collection: &str, name: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{collection}.json")))
            .and(query_param("value1", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.isbndb)
            .await;
    }

    /// Answer every Google Books search with zero matches.
    pub async fn mock_no_volumes(&self) {
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalItems": 0})))
            .mount(&self.google)
            .await;
    }

    /// Make `isbn` resolve to a volume with the given page count.
    pub async fn mock_volume(&self, isbn: &str, page_count: u32) {
        let id = format!("vol-{isbn}");
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .and(query_param("q", format!("isbn:{isbn}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalItems": 1,
                "items": [{"id": id}]
            })))
            .with_priority(1)
            .mount(&self.google)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/volumes/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "volumeInfo": {"pageCount": page_count}
            })))
            .mount(&self.google)
            .await;
    }
}

/// A book entry as the ISBNdb listing returns it.
pub fn book_json(book_id: &str, isbn: &str, title: &str) -> Value {
    json!({
        "book_id": book_id,
        "isbn": isbn,
        "title": title,
        "title_long": "",
        "authors_text": "Joseph Conrad, ",
        "publisher_id": "penguin",
        "publisher_text": "Penguin",
        "language": "eng"
    })
}

/// A listing envelope.
pub fn listing(total_results: u64, page_number: u32, data: Vec<Value>) -> Value {
    json!({
        "total_results": total_results,
        "page_size": 10,
        "page_number": page_number,
        "data": data
    })
}
