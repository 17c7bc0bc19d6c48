//! Booksearch - book search aggregation service
//!
//! This library crate exposes the provider adapters, configuration and HTTP
//! surface for integration testing. The search engine itself lives in
//! `booksearch-engine`.

pub mod config;
pub mod providers;
pub mod server;
