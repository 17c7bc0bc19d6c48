use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub isbndb: IsbndbConfig,

    #[serde(default)]
    pub google_books: GoogleBooksConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Response cache sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of cached provider responses
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Seconds a cached response stays valid
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_capacity() -> usize {
    500
}
fn default_cache_ttl() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Upper bound for a single provider call, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// ISBNdb catalogue provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IsbndbConfig {
    #[serde(default = "default_isbndb_url")]
    pub base_url: String,

    /// Access key sent with every request
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_isbndb_rate")]
    pub requests_per_second: u32,
}

fn default_isbndb_url() -> String {
    "https://isbndb.com/api".to_string()
}
fn default_isbndb_rate() -> u32 {
    5
}

impl Default for IsbndbConfig {
    fn default() -> Self {
        Self {
            base_url: default_isbndb_url(),
            api_key: String::new(),
            requests_per_second: default_isbndb_rate(),
        }
    }
}

/// Google Books enrichment provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleBooksConfig {
    #[serde(default = "default_google_books_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_google_books_rate")]
    pub requests_per_second: u32,
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}
fn default_google_books_rate() -> u32 {
    10
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            base_url: default_google_books_url(),
            api_key: String::new(),
            requests_per_second: default_google_books_rate(),
        }
    }
}
