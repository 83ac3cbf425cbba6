// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `Serialize` and `ToSchema` for JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Records**: submitted (ciphertext, key handle) pairs
//! - **Decrypt**: batch decrypt outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::vault::{DecryptedOutput, RecordSummary, SubmittedRecord, VaultError};

/// Placeholder message returned when no records exist yet.
pub const EMPTY_MESSAGE: &str = "Upload data first";

// =============================================================================
// Record Models
// =============================================================================

/// A record created by an upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SubmitResponse {
    /// Position of the record in the session ledger.
    pub index: usize,
    pub id: String,
    /// Content locator returned by the storage network.
    pub locator: String,
    /// Base16 key handle guarding the record's symmetric key.
    pub key_handle: String,
    pub ciphertext_bytes: usize,
}

impl From<SubmittedRecord> for SubmitResponse {
    fn from(record: SubmittedRecord) -> Self {
        Self {
            index: record.index,
            id: record.id.to_string(),
            locator: record.locator.to_string(),
            key_handle: record.key_handle.to_string(),
            ciphertext_bytes: record.ciphertext_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecordView {
    pub index: usize,
    pub id: String,
    pub key_handle: String,
    pub ciphertext_bytes: usize,
    pub created_at: DateTime<Utc>,
}

impl From<RecordSummary> for RecordView {
    fn from(summary: RecordSummary) -> Self {
        Self {
            index: summary.index,
            id: summary.id.to_string(),
            key_handle: summary.key_handle.to_string(),
            ciphertext_bytes: summary.ciphertext_bytes,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<RecordView>,
}

// =============================================================================
// Decrypt Models
// =============================================================================

/// Failure policy of a decrypt batch.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecryptMode {
    /// Fail the batch if any record fails.
    #[default]
    All,
    /// Report each record's outcome.
    Settled,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DecryptQuery {
    #[serde(default)]
    pub mode: DecryptMode,
}

/// Outcome for one record. Exactly one of `plaintext` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DecryptedOutputView {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<String>,
    /// Locator parsed from the plaintext; fetch it from `/v1/content/{locator}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl From<DecryptedOutput> for DecryptedOutputView {
    fn from(output: DecryptedOutput) -> Self {
        Self {
            index: output.index,
            locator: output.locator.map(|l| l.to_string()),
            plaintext: Some(output.plaintext),
            error: None,
            error_code: None,
        }
    }
}

impl DecryptedOutputView {
    pub fn failed(index: usize, err: &VaultError) -> Self {
        Self {
            index,
            plaintext: None,
            locator: None,
            error: Some(err.to_string()),
            error_code: Some(err.error_code().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DecryptResponse {
    /// No records yet.
    Empty { message: String },
    Decrypted { outputs: Vec<DecryptedOutputView> },
}

impl DecryptResponse {
    pub fn empty() -> Self {
        DecryptResponse::Empty {
            message: EMPTY_MESSAGE.to_string(),
        }
    }
}
