// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for fetched content.
//!
//! Rendering the decrypted records fetches each locator from the storage
//! network; content is immutable per locator, so a short-lived cache avoids
//! refetching the same blob on every render.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;

use super::ContentLocator;

/// How long fetched content stays cached.
pub const DEFAULT_CONTENT_TTL: Duration = Duration::from_secs(300);

/// Cached entry: content bytes + insertion timestamp.
struct CacheEntry {
    content: Bytes,
    inserted_at: Instant,
}

/// In-process LRU cache keyed by content locator.
pub struct ContentCache {
    cache: Mutex<LruCache<ContentLocator, CacheEntry>>,
    ttl: Duration,
}

impl ContentCache {
    /// Create a new cache with the given capacity and TTL.
    ///
    /// - `capacity`: Max number of blobs to keep (clamped to at least 1).
    /// - `ttl`: Time-to-live for each cache entry.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Get cached content for a locator.
    ///
    /// Returns `None` if not cached or expired.
    pub fn get(&self, locator: &ContentLocator) -> Option<Bytes> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(locator) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.content.clone());
            }
            // Expired
            cache.pop(locator);
        }
        None
    }

    pub fn put(&self, locator: ContentLocator, content: Bytes) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                locator,
                CacheEntry {
                    content,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(64, DEFAULT_CONTENT_TTL)
    }
}
