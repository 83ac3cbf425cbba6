// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Content Storage Module
//!
//! Client side of the content-addressed storage network. Uploaded bytes are
//! identified by a [`ContentLocator`] derived from their content, not by a
//! path.
//!
//! ## Backends
//!
//! - [`IpfsHttpClient`] - IPFS HTTP API (`/api/v0/add`, `/api/v0/cat`)
//! - [`MemoryContentStore`] - in-process store for development and tests
//!
//! Fetched content is kept in a small [`ContentCache`] so repeated renders of
//! the same record do not go back to the network.

pub mod cache;
pub mod ipfs;
pub mod locator;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;

pub use cache::ContentCache;
pub use ipfs::{IpfsCredentials, IpfsHttpClient};
pub use locator::ContentLocator;
pub use memory::MemoryContentStore;

/// Error type for storage network operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage network unavailable: {0}")]
    Unavailable(String),

    #[error("Storage request timed out")]
    Timeout,

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),

    #[error("Invalid content locator: {0}")]
    InvalidLocator(String),
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "storage_unavailable",
            StorageError::Timeout => "storage_timeout",
            StorageError::NotFound(_) => "content_not_found",
            StorageError::InvalidResponse(_) => "storage_invalid_response",
            StorageError::InvalidLocator(_) => "invalid_locator",
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A content-addressed blob store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload bytes and return the locator the network assigned to them.
    async fn add(&self, bytes: Bytes) -> StorageResult<ContentLocator>;

    /// Fetch the bytes stored under `locator`.
    async fn get(&self, locator: &ContentLocator) -> StorageResult<Bytes>;
}
