// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key network contract and wire messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::auth::AuthSig;
use crate::policy::AccessPolicy;

/// Ask the network to guard a symmetric key under a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKeyRequest {
    pub access_control_conditions: AccessPolicy,
    /// Base16 symmetric key.
    pub symmetric_key: String,
    pub auth_sig: AuthSig,
    pub chain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKeyResponse {
    /// Base16 key handle.
    pub encrypted_symmetric_key: String,
}

/// Ask the network to release a key previously stored under `access_control_conditions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveKeyRequest {
    pub access_control_conditions: AccessPolicy,
    /// Base16 key handle returned by the store call.
    pub to_decrypt: String,
    pub auth_sig: AuthSig,
    pub chain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveKeyResponse {
    /// Base16 symmetric key.
    pub symmetric_key: String,
}

/// A network of nodes that jointly guard symmetric keys.
///
/// Node selection, consensus and threshold cryptography live behind this
/// trait; callers only see store and retrieve.
#[async_trait]
pub trait KeyNetwork: Send + Sync {
    async fn connect(&self) -> Result<(), GatewayError>;

    async fn store_key(&self, request: StoreKeyRequest) -> Result<StoreKeyResponse, GatewayError>;

    async fn retrieve_key(
        &self,
        request: RetrieveKeyRequest,
    ) -> Result<RetrieveKeyResponse, GatewayError>;
}
