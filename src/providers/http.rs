//! Shared HTTP plumbing for provider adapters.
//!
//! Every adapter owns one [`HttpClient`]: a `reqwest` client with a request
//! timeout plus a token-bucket rate limiter via [`governor`]. Failed calls are
//! reported once and never retried here.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use booksearch_common::FetchError;
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use tracing::debug;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Rate-limited JSON-over-HTTP client for a single provider.
pub struct HttpClient {
    provider: &'static str,
    client: reqwest::Client,
    rate_limiter: DirectLimiter,
}

impl HttpClient {
    /// Create a client allowing `requests_per_second` calls to `provider`.
    pub fn new(
        provider: &'static str,
        requests_per_second: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("booksearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let rate = NonZeroU32::new(requests_per_second).with_context(|| {
            format!("{provider}: requests_per_second must be greater than 0")
        })?;

        Ok(Self {
            provider,
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    /// GET `url` with `query` and decode the JSON body.
    ///
    /// Network failures and non-2xx statuses become [`FetchError::Transport`];
    /// a body that does not decode becomes [`FetchError::Parse`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        self.rate_limiter.until_ready().await;

        debug!(provider = self.provider, url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::transport(format!("{} request failed: {e}", self.provider)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::transport(format!(
                "{} returned HTTP {status}",
                self.provider
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            FetchError::transport(format!("{} response body unreadable: {e}", self.provider))
        })?;

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::parse(format!("{} response: {e}", self.provider)))
    }
}

/// Join a base URL and a path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
