//! In-memory response cache.
//!
//! Memoizes decoded provider payloads keyed by [`RequestSignature`] so that
//! identical calls inside the TTL window never reach the network. Only
//! successful payloads are stored; a failed call is retried on the next
//! request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::trace;

use crate::signature::RequestSignature;
use crate::source::Payload;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 500;

/// Default time an entry stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Entry in the response cache.
struct CacheEntry {
    value: Arc<Payload>,
    stored_at: Instant,
    last_accessed: Instant,
}

/// Thread-safe cache for provider payloads.
///
/// Entries expire `ttl` after they were stored, regardless of how often they
/// are read. When the cache is full, expired entries are dropped first and
/// then the least recently accessed entry is evicted. A single instance is
/// created at startup and shared by every [`Dispatcher`](crate::Dispatcher).
pub struct ResponseCache {
    entries: DashMap<RequestSignature, CacheEntry>,
    capacity: usize,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a new response cache.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            ttl,
        }
    }

    /// Look up a payload. Expired entries are removed and reported as absent.
    pub fn get(&self, signature: &RequestSignature) -> Option<Arc<Payload>> {
        if let Some(mut entry) = self.entries.get_mut(signature) {
            if entry.stored_at.elapsed() < self.ttl {
                entry.last_accessed = Instant::now();
                return Some(Arc::clone(&entry.value));
            }
            drop(entry);
            self.entries
                .remove_if(signature, |_, entry| entry.stored_at.elapsed() >= self.ttl);
            trace!(signature = %signature, "Cache entry expired");
        }
        None
    }

    /// Store a payload, evicting if the cache is at capacity.
    pub fn set(&self, signature: RequestSignature, value: Arc<Payload>) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&signature) && self.entries.len() >= self.capacity {
            self.cleanup_expired();
            if self.entries.len() >= self.capacity {
                self.evict_oldest(None);
            }
        }

        let now = Instant::now();
        self.entries.insert(
            signature,
            CacheEntry {
                value,
                stored_at: now,
                last_accessed: now,
            },
        );

        // Concurrent setters can all pass the check above with one free slot.
        while self.entries.len() > self.capacity {
            if !self.evict_oldest(Some(&signature)) {
                break;
            }
        }
    }

    /// Remove an entry from the cache.
    pub fn remove(&self, signature: &RequestSignature) {
        self.entries.remove(signature);
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get the number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    /// Evict the least recently accessed entry other than `keep`. Returns
    /// `false` when there was nothing to evict.
    fn evict_oldest(&self, keep: Option<&RequestSignature>) -> bool {
        let oldest = self
            .entries
            .iter()
            .filter(|entry| Some(entry.key()) != keep)
            .min_by_key(|entry| entry.value().last_accessed)
            .map(|entry| *entry.key());

        match oldest {
            Some(signature) => {
                trace!(signature = %signature, "Evicting least recently used cache entry");
                self.entries.remove(&signature);
                true
            }
            None => false,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
