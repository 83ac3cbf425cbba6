// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Orchestrator errors.

use crate::auth::AuthError;
use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Errors surfaced by [`super::Vault`] operations. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Access policy denied: {0}")]
    PolicyDenied(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption of record {index} failed: {reason}")]
    Decryption { index: usize, reason: String },

    /// The parallel record lists disagree. Never expected; fatal if seen.
    #[error("Record lists out of sync: {ciphertexts} ciphertexts, {key_handles} key handles")]
    StateInvariant {
        ciphertexts: usize,
        key_handles: usize,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl VaultError {
    /// Classify a gateway failure during encryption.
    pub fn from_encrypt(err: GatewayError) -> Self {
        match err {
            GatewayError::Auth(reason) => Self::Auth(AuthError::Rejected(reason)),
            GatewayError::PolicyDenied(reason) => Self::PolicyDenied(reason),
            other => Self::Encryption(other.to_string()),
        }
    }

    /// Classify a gateway failure while decrypting record `index`.
    pub fn from_decrypt(index: usize, err: GatewayError) -> Self {
        match err {
            GatewayError::Auth(reason) => {
                Self::Auth(AuthError::Rejected(format!("record {index}: {reason}")))
            }
            GatewayError::PolicyDenied(reason) => {
                Self::PolicyDenied(format!("record {index}: {reason}"))
            }
            other => Self::Decryption {
                index,
                reason: other.to_string(),
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            VaultError::Storage(e) => e.error_code(),
            VaultError::Auth(e) => e.error_code(),
            VaultError::PolicyDenied(_) => "policy_denied",
            VaultError::Encryption(_) => "encryption_failed",
            VaultError::Decryption { .. } => "decryption_failed",
            VaultError::StateInvariant { .. } => "state_invariant_violated",
            VaultError::Cancelled => "cancelled",
        }
    }
}
