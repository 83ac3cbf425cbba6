// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content locators and their gateway URL form.

use serde::{Deserialize, Serialize};
use url::Url;

use super::StorageError;

/// Maximum accepted locator length (CIDv1 base32 strings stay well below this).
const MAX_LOCATOR_LEN: usize = 128;

/// Identifier of a blob in the content-addressed store.
///
/// Locators are opaque to this service; the only structure enforced is that
/// they are non-empty ASCII alphanumeric strings, which covers CIDv0
/// (base58btc), CIDv1 (base32) and the hex digests used by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentLocator(String);

impl ContentLocator {
    /// Validate and wrap a raw locator string.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidLocator("locator is empty".to_string()));
        }
        if trimmed.len() > MAX_LOCATOR_LEN {
            return Err(StorageError::InvalidLocator(format!(
                "locator exceeds {MAX_LOCATOR_LEN} characters"
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidLocator(format!(
                "locator `{trimmed}` contains non-alphanumeric characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Locator for a raw digest, hex encoded. Hex is always a valid locator.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(alloy::hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join the locator onto a path-style gateway prefix
    /// (e.g. `https://ipfs.infura.io/ipfs/` + `Qm...`).
    pub fn gateway_url(&self, gateway_prefix: &str) -> String {
        format!("{}/{}", gateway_prefix.trim_end_matches('/'), self.0)
    }

    /// Recover a locator from a gateway URL.
    ///
    /// Accepts both the path form produced by [`ContentLocator::gateway_url`]
    /// and the subdomain form (`https://<cid>.ipfs.<gateway-host>/`).
    pub fn from_gateway_url(url: &str, gateway_prefix: &str) -> Result<Self, StorageError> {
        let prefix = gateway_prefix.trim_end_matches('/');
        if let Some(rest) = url.strip_prefix(prefix) {
            let candidate = rest.trim_matches('/');
            if !candidate.is_empty() && !candidate.contains('/') {
                return Self::parse(candidate);
            }
        }

        let parsed = Url::parse(url)
            .map_err(|e| StorageError::InvalidLocator(format!("not a gateway URL: {e}")))?;

        if let Some(host) = parsed.host_str() {
            let mut labels = host.split('.');
            if let (Some(first), Some("ipfs")) = (labels.next(), labels.next()) {
                return Self::parse(first);
            }
        }

        let mut segments = parsed.path_segments().into_iter().flatten();
        while let Some(segment) = segments.next() {
            if segment == "ipfs" {
                if let Some(cid) = segments.next() {
                    return Self::parse(cid);
                }
            }
        }

        Err(StorageError::InvalidLocator(format!(
            "no locator found in `{url}`"
        )))
    }
}

impl std::fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentLocator {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentLocator> for String {
    fn from(value: ContentLocator) -> Self {
        value.0
    }
}
