// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session record ledger.
//!
//! Index `i` of the ciphertext list and index `i` of the key-handle list
//! belong to the same upload. Both lists only grow, and only through
//! [`RecordLedger::append`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::VaultError;
use crate::gateway::KeyHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// View of one record for listing.
///
/// Carries nothing derived from the plaintext locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub index: usize,
    pub id: Uuid,
    pub key_handle: KeyHandle,
    pub ciphertext_bytes: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct RecordLedger {
    ciphertexts: Vec<Bytes>,
    key_handles: Vec<KeyHandle>,
    meta: Vec<RecordMeta>,
}

impl RecordLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record to every list. Returns its index.
    pub fn append(
        &mut self,
        ciphertext: Bytes,
        key_handle: KeyHandle,
    ) -> (usize, RecordMeta) {
        let index = self.ciphertexts.len();
        let meta = RecordMeta {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        self.ciphertexts.push(ciphertext);
        self.key_handles.push(key_handle);
        self.meta.push(meta.clone());

        (index, meta)
    }

    /// Number of records, or [`VaultError::StateInvariant`] if the lists disagree.
    pub fn len(&self) -> Result<usize, VaultError> {
        let ciphertexts = self.ciphertexts.len();
        let key_handles = self.key_handles.len();
        if ciphertexts != key_handles || self.meta.len() != ciphertexts {
            return Err(VaultError::StateInvariant {
                ciphertexts,
                key_handles,
            });
        }
        Ok(ciphertexts)
    }

    pub fn is_empty(&self) -> Result<bool, VaultError> {
        Ok(self.len()? == 0)
    }

    /// Clone of every (ciphertext, key handle) pair in index order.
    pub fn pairs(&self) -> Result<Vec<(Bytes, KeyHandle)>, VaultError> {
        self.len()?;
        Ok(self
            .ciphertexts
            .iter()
            .cloned()
            .zip(self.key_handles.iter().cloned())
            .collect())
    }

    pub fn summaries(&self) -> Result<Vec<RecordSummary>, VaultError> {
        self.len()?;
        Ok(self
            .meta
            .iter()
            .zip(self.ciphertexts.iter().zip(&self.key_handles))
            .enumerate()
            .map(|(index, (meta, (ciphertext, key_handle)))| RecordSummary {
                index,
                id: meta.id,
                key_handle: key_handle.clone(),
                ciphertext_bytes: ciphertext.len(),
                created_at: meta.created_at,
            })
            .collect())
    }

    #[cfg(test)]
    pub(crate) fn push_orphan_ciphertext(&mut self, ciphertext: Bytes) {
        self.ciphertexts.push(ciphertext);
    }
}
