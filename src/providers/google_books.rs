//! Google Books enrichment provider.
//!
//! A `volume` lookup is two calls: a search for `isbn:<isbn>` limited to one
//! result, then a fetch of that volume by id. Only `pageCount`,
//! `averageRating`, `ratingsCount` and `imageLinks` are kept.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use booksearch_common::{Enrichment, FetchError};
use booksearch_engine::{Payload, Request, Source};
use serde::Deserialize;
use tracing::debug;

use super::http::{endpoint, HttpClient};
use crate::config::GoogleBooksConfig;

const PROVIDER: &str = "google_books";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeSearch {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Vec<VolumeRef>,
}

#[derive(Debug, Deserialize)]
struct VolumeRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    page_count: Option<u32>,
    average_rating: Option<f64>,
    ratings_count: Option<u32>,
    image_links: Option<BTreeMap<String, String>>,
}

impl From<VolumeInfo> for Enrichment {
    fn from(info: VolumeInfo) -> Self {
        Enrichment {
            page_count: info.page_count,
            average_rating: info.average_rating,
            ratings_count: info.ratings_count,
            image_links: info.image_links,
        }
    }
}

/// [`Source`] backed by the Google Books volumes API.
pub struct GoogleBooksSource {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl GoogleBooksSource {
    pub fn new(config: &GoogleBooksConfig, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new(PROVIDER, config.requests_per_second, timeout)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn with_key(&self, mut query: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if !self.api_key.is_empty() {
            query.push(("key", self.api_key.clone()));
        }
        query
    }

    /// Look up enrichment data for a cleaned ISBN. `None` means no match.
    async fn volume(&self, isbn: &str) -> Result<Option<Enrichment>, FetchError> {
        let search: VolumeSearch = self
            .http
            .get_json(
                &endpoint(&self.base_url, "volumes"),
                &self.with_key(vec![
                    ("q", format!("isbn:{isbn}")),
                    ("maxResults", "1".to_string()),
                ]),
            )
            .await?;

        let Some(first) = search.items.first().filter(|_| search.total_items > 0) else {
            debug!(isbn, "No Google Books volume for isbn");
            return Ok(None);
        };

        let volume: Volume = self
            .http
            .get_json(
                &endpoint(&self.base_url, &format!("volumes/{}", first.id)),
                &self.with_key(Vec::new()),
            )
            .await?;

        Ok(volume.volume_info.map(Enrichment::from))
    }
}

#[async_trait]
impl Source for GoogleBooksSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, request: &Request) -> Result<Payload, FetchError> {
        match request {
            Request::Volume { isbn } => self.volume(isbn).await.map(Payload::Volume),
            _ => Err(FetchError::unsupported(PROVIDER, request.operation())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booksearch_engine::BookFilter;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer, api_key: &str) -> GoogleBooksSource {
        let config = GoogleBooksConfig {
            base_url: server.uri(),
            api_key: api_key.into(),
            requests_per_second: 100,
        };
        GoogleBooksSource::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn volume_request(isbn: &str) -> Request {
        Request::Volume { isbn: isbn.into() }
    }

    #[tokio::test]
    async fn search_then_lookup_extracts_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .and(query_param("q", "isbn:9780553804577"))
            .and(query_param("maxResults", "1"))
            .and(query_param("key", "GKEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "books#volumes",
                "totalItems": 1,
                "items": [{"kind": "books#volume", "id": "qGlqzgAACAAJ"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/volumes/qGlqzgAACAAJ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "volumeInfo": {
                    "title": "The Google story",
                    "pageCount": 207,
                    "averageRating": 3.5,
                    "ratingsCount": 136,
                    "imageLinks": {
                        "smallThumbnail": "http://books.example/s",
                        "thumbnail": "http://books.example/t"
                    }
                }
            })))
            .mount(&server)
            .await;

        let payload = source(&server, "GKEY")
            .fetch(&volume_request("9780553804577"))
            .await
            .unwrap();

        let extra = payload.as_volume().flatten().unwrap();
        assert_eq!(extra.page_count, Some(207));
        assert_eq!(extra.average_rating, Some(3.5));
        assert_eq!(extra.ratings_count, Some(136));
        assert_eq!(extra.image_links.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn zero_total_items_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"kind": "books#volumes", "totalItems": 0})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let payload = source(&server, "")
            .fetch(&volume_request("1111111111"))
            .await
            .unwrap();
        assert_eq!(payload.as_volume(), Some(None));
    }

    #[tokio::test]
    async fn missing_volume_info_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalItems": 3,
                "items": [{"id": "abc"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/volumes/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
            .mount(&server)
            .await;

        let payload = source(&server, "")
            .fetch(&volume_request("0210406240"))
            .await
            .unwrap();
        assert_eq!(payload.as_volume(), Some(None));
    }

    #[tokio::test]
    async fn lookup_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalItems": 1,
                "items": [{"id": "abc"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/volumes/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = source(&server, "")
            .fetch(&volume_request("0210406240"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn book_listings_are_unsupported() {
        let server = MockServer::start().await;
        let err = source(&server, "")
            .fetch(&Request::Books {
                filter: BookFilter::Title("Nostromo".into()),
                page: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unsupported { .. }));
    }
}
