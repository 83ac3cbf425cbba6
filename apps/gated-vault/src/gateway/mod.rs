// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encryption Gateway Module
//!
//! Access-controlled encryption of short strings (content locators).
//!
//! ## Model
//!
//! - Plaintext is sealed locally with a fresh AES-256-GCM key
//! - The key is handed to a decentralized key network together with the
//!   access policy and the caller's auth sig; the network answers with an
//!   opaque, base16 encoded key handle
//! - To decrypt, the caller presents ciphertext, key handle, policy and a
//!   fresh auth sig; the network releases the key only if the caller
//!   satisfies the policy
//!
//! The gateway connection is an explicit dependency with a
//! [`EncryptionGateway::connect`] / [`EncryptionGateway::disconnect`]
//! lifecycle; nothing is initialized lazily behind the caller's back.
//!
//! ## Key Networks
//!
//! - [`HttpKeyNetwork`] - remote key node over JSON/HTTP
//! - [`LocalKeyNetwork`] - in-process custodian for development and tests

pub mod custodian;
pub mod http_node;
pub mod key_network;
pub mod symmetric;
pub mod threshold;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::auth::AuthSig;
use crate::policy::AccessPolicy;

pub use custodian::LocalKeyNetwork;
pub use http_node::HttpKeyNetwork;
pub use key_network::{
    KeyNetwork, RetrieveKeyRequest, RetrieveKeyResponse, StoreKeyRequest, StoreKeyResponse,
};
pub use symmetric::SymmetricKey;
pub use threshold::ThresholdGateway;

/// Errors returned by the encryption gateway and key networks.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Encryption gateway is not connected")]
    NotConnected,

    #[error("Auth signature rejected: {0}")]
    Auth(String),

    #[error("Access policy not satisfied: {0}")]
    PolicyDenied(String),

    /// The policy could not be evaluated at all.
    #[error("Access policy cannot be evaluated: {0}")]
    InvalidPolicy(String),

    #[error("Key network unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key handle: {0}")]
    InvalidKeyHandle(String),

    #[error("Cipher failure: {0}")]
    Crypto(String),
}

/// Opaque token referencing a key guarded by the key network (base16).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyHandle(String);

impl KeyHandle {
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if trimmed.is_empty() || trimmed.len() % 2 != 0 {
            return Err(GatewayError::InvalidKeyHandle(
                "expected an even number of hex characters".to_string(),
            ));
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GatewayError::InvalidKeyHandle(
                "found non-hex characters".to_string(),
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(alloy::hex::encode(bytes))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GatewayError> {
        alloy::hex::decode(&self.0).map_err(|e| GatewayError::InvalidKeyHandle(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KeyHandle {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyHandle> for String {
    fn from(value: KeyHandle) -> Self {
        value.0
    }
}

/// Result of an encrypt call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedString {
    /// `nonce || AES-256-GCM ciphertext`
    pub encrypted_file: Bytes,
    pub encrypted_symmetric_key: KeyHandle,
}

/// Access-controlled string encryption.
#[async_trait]
pub trait EncryptionGateway: Send + Sync {
    /// Establish the key network connection. Calls before this fail with
    /// [`GatewayError::NotConnected`].
    async fn connect(&self) -> Result<(), GatewayError>;

    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    async fn encrypt_string(
        &self,
        plaintext: &str,
        policy: &AccessPolicy,
        auth_sig: &AuthSig,
    ) -> Result<EncryptedString, GatewayError>;

    async fn decrypt_string(
        &self,
        encrypted_file: &[u8],
        key_handle: &KeyHandle,
        policy: &AccessPolicy,
        auth_sig: &AuthSig,
    ) -> Result<String, GatewayError>;
}
