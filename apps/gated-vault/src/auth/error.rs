// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

/// Errors raised while producing or checking an auth assertion.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The assertion could not be decoded
    #[error("Auth signature is malformed: {0}")]
    Malformed(String),

    /// The signature does not recover to any address
    #[error("Auth signature is invalid: {0}")]
    InvalidSignature(String),

    /// The signature recovers to a different address than the one claimed
    #[error("Auth signature was produced by {recovered}, not {claimed}")]
    AddressMismatch { claimed: String, recovered: String },

    /// The assertion is past its expiration time
    #[error("Auth signature expired at {0}")]
    Expired(String),

    /// The wallet could not sign the auth message
    #[error("Failed to sign auth message: {0}")]
    SigningFailed(String),

    /// The configured signing key is unusable
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// The key network refused the assertion
    #[error("Auth signature rejected by key network: {0}")]
    Rejected(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Malformed(_) => "auth_sig_malformed",
            AuthError::InvalidSignature(_) => "auth_sig_invalid",
            AuthError::AddressMismatch { .. } => "auth_sig_address_mismatch",
            AuthError::Expired(_) => "auth_sig_expired",
            AuthError::SigningFailed(_) => "auth_signing_failed",
            AuthError::InvalidKey(_) => "invalid_signing_key",
            AuthError::Rejected(_) => "auth_sig_rejected",
        }
    }
}
