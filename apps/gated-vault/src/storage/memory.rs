// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process content store.
//!
//! Locators are the hex SHA-256 digest of the content, so identical uploads
//! collapse onto one entry just as they would on a real content-addressed
//! network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::{ContentLocator, ContentStore, StorageError, StorageResult};

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentLocator, Bytes>>,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate a network outage: every call fails with
    /// [`StorageError::Timeout`] while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn locator_for(bytes: &[u8]) -> ContentLocator {
        ContentLocator::from_digest(&Sha256::digest(bytes))
    }

    async fn simulate_network(&self) -> StorageResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn add(&self, bytes: Bytes) -> StorageResult<ContentLocator> {
        self.simulate_network().await?;
        let locator = Self::locator_for(&bytes);
        self.blobs.write().await.insert(locator.clone(), bytes);
        Ok(locator)
    }

    async fn get(&self, locator: &ContentLocator) -> StorageResult<Bytes> {
        self.simulate_network().await?;
        self.blobs
            .read()
            .await
            .get(locator)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))
    }
}
