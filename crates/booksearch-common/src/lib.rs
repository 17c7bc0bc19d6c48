//! Booksearch-Common: Shared types, identifiers, and error definitions.
//!
//! This crate provides common functionality used across booksearch:
//!
//! - **Identifiers**: The opaque [`EntityId`] handed out by first-tier lookups
//! - **Core Types**: Filters, entity kinds, book records and paginated results
//! - **ISBN Utilities**: Structural validation and normalisation of ISBNs
//! - **Error Handling**: Validation, fetch, and search error types
//!
//! # Examples
//!
//! ```
//! use booksearch_common::{FilterKind, EntityKind};
//! use booksearch_common::isbn::clean_isbn;
//!
//! let filter: FilterKind = "author".parse().unwrap();
//! assert_eq!(filter.entity_kind(), Some(EntityKind::Author));
//!
//! assert_eq!(clean_isbn("0-19-852663-X"), "019852663X");
//! ```

pub mod error;
pub mod ids;
pub mod isbn;
pub mod types;

pub use error::{FetchError, SearchError, ValidationError};
pub use ids::EntityId;
pub use types::*;
