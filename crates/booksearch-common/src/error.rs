//! Error types used throughout booksearch.
//!
//! Three layers of failure exist:
//!
//! - [`ValidationError`] is raised before any network call is attempted.
//! - [`FetchError`] describes why a single provider call failed. It is
//!   recorded on the fetch task rather than propagated.
//! - [`SearchError`] is what the public search entry point returns when a
//!   failure is fatal to the whole query.

use std::time::Duration;

/// Caller supplied something the search cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The filter kind is not one of the supported filters.
    #[error("Invalid filter '{0}'")]
    UnknownFilter(String),

    /// The value does not pass the structural ISBN check.
    #[error("Invalid isbn \"{0}\"")]
    InvalidIsbn(String),

    /// The query value is empty or whitespace only.
    #[error("Empty query for filter '{0}'")]
    EmptyQuery(String),

    /// Pages are numbered from 1.
    #[error("Invalid page number {0}")]
    InvalidPage(u32),

    /// The page is not a number at all.
    #[error("Invalid page number '{0}'")]
    MalformedPage(String),
}

/// Failure of a single provider call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The provider could not be reached or answered with an error status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered but the payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The call did not finish within the configured budget.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The unit of work running the call panicked or was cancelled.
    #[error("Fetch aborted: {0}")]
    Aborted(String),

    /// The provider does not implement the requested operation.
    #[error("Provider '{provider}' does not support '{operation}'")]
    Unsupported {
        /// Name of the provider.
        provider: String,
        /// Operation identity that was requested.
        operation: String,
    },
}

impl FetchError {
    /// Create a new Transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new Parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new Unsupported error.
    pub fn unsupported(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            provider: provider.into(),
            operation: operation.into(),
        }
    }
}

/// A failure that aborts a whole search.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The query was rejected before any network activity.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A first-tier provider call failed.
    #[error("{operation} request to {provider} failed: {cause}")]
    Upstream {
        /// Name of the provider that failed.
        provider: String,
        /// Operation identity of the failed call.
        operation: String,
        /// The underlying fetch failure.
        #[source]
        cause: FetchError,
    },
}

impl SearchError {
    /// Convenience constructor for [`SearchError::Upstream`].
    pub fn upstream(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: FetchError,
    ) -> Self {
        Self::Upstream {
            provider: provider.into(),
            operation: operation.into(),
            cause,
        }
    }

    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Upstream {
                cause: FetchError::Timeout(_),
                ..
            } => 504,
            Self::Upstream { .. } => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = ValidationError::UnknownFilter("not_a_filter".into());
        assert_eq!(err.to_string(), "Invalid filter 'not_a_filter'");

        let err = ValidationError::InvalidIsbn("123".into());
        assert_eq!(err.to_string(), "Invalid isbn \"123\"");

        let err = ValidationError::InvalidPage(0);
        assert_eq!(err.to_string(), "Invalid page number 0");
        let err = ValidationError::MalformedPage("abc".into());
        assert_eq!(err.to_string(), "Invalid page number 'abc'");
    }

    #[test]
    fn test_search_error_wraps_cause() {
        let err = SearchError::upstream("isbndb", "books", FetchError::transport("refused"));
        assert_eq!(
            err.to_string(),
            "books request to isbndb failed: Transport error: refused"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_http_status() {
        let err = SearchError::from(ValidationError::EmptyQuery("title".into()));
        assert_eq!(err.http_status(), 400);

        let err = SearchError::upstream("isbndb", "books", FetchError::parse("bad json"));
        assert_eq!(err.http_status(), 502);

        let err = SearchError::upstream(
            "isbndb",
            "books",
            FetchError::Timeout(Duration::from_secs(30)),
        );
        assert_eq!(err.http_status(), 504);
    }

    #[test]
    fn test_fetch_error_constructors() {
        assert!(matches!(FetchError::transport("x"), FetchError::Transport(_)));
        assert!(matches!(FetchError::parse("x"), FetchError::Parse(_)));
        assert_eq!(
            FetchError::unsupported("google_books", "entities").to_string(),
            "Provider 'google_books' does not support 'entities'"
        );
    }
}
