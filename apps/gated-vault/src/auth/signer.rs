// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth message signing.

use std::path::Path;
use std::time::Duration;

use alloy::{
    primitives::Address,
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::auth_sig::{AuthSig, DERIVED_VIA, EXPIRATION_PREFIX};
use super::keys::{signer_from_hex, signer_from_pem};
use super::AuthError;
use crate::blockchain::network_by_name;

/// Default validity window of an auth assertion.
pub const DEFAULT_AUTH_SIG_TTL: Duration = Duration::from_secs(300);

const DEFAULT_DOMAIN: &str = "localhost";
const DEFAULT_URI: &str = "http://localhost/";

/// Produces auth assertions for the current caller.
///
/// A wallet-backed implementation prompts the user; the service binary uses a
/// locally held key.
#[async_trait]
pub trait AuthSigner: Send + Sync {
    /// Address assertions are issued for.
    fn address(&self) -> Address;

    /// Sign a fresh auth message for `chain`.
    async fn sign_auth_message(&self, chain: &str) -> Result<AuthSig, AuthError>;
}

/// Signs EIP-4361 style auth messages with a local secp256k1 key.
pub struct WalletAuthSigner {
    signer: PrivateKeySigner,
    domain: String,
    uri: String,
    ttl: Duration,
}

impl WalletAuthSigner {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            domain: DEFAULT_DOMAIN.to_string(),
            uri: DEFAULT_URI.to_string(),
            ttl: DEFAULT_AUTH_SIG_TTL,
        }
    }

    pub fn from_hex(private_key_hex: &str) -> Result<Self, AuthError> {
        Ok(Self::new(signer_from_hex(private_key_hex)?))
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let pem = std::fs::read(path)
            .map_err(|e| AuthError::InvalidKey(format!("{}: {e}", path.display())))?;
        Ok(Self::new(signer_from_pem(&pem)?))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Origin shown to the user in the auth message.
    pub fn with_origin(mut self, domain: impl Into<String>, uri: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.uri = uri.into();
        self
    }

    fn auth_message(&self, chain: &str, chain_id: u64) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::SigningFailed(format!("invalid ttl: {e}")))?;
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::SigningFailed("ttl overflows expiration time".to_string()))?;

        Ok(format!(
            "{domain} wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             Authorize access-controlled encryption on {chain}.\n\
             \n\
             URI: {uri}\n\
             Version: 1\n\
             Chain ID: {chain_id}\n\
             Nonce: {nonce}\n\
             Issued At: {issued}\n\
             {EXPIRATION_PREFIX}{expires}",
            domain = self.domain,
            address = self.signer.address().to_checksum(None),
            uri = self.uri,
            nonce = Uuid::new_v4().simple(),
            issued = issued_at.to_rfc3339(),
            expires = expires_at.to_rfc3339(),
        ))
    }
}

#[async_trait]
impl AuthSigner for WalletAuthSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_auth_message(&self, chain: &str) -> Result<AuthSig, AuthError> {
        let network = network_by_name(chain).map_err(AuthError::SigningFailed)?;
        let message = self.auth_message(network.chain, network.chain_id)?;

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| AuthError::SigningFailed(e.to_string()))?;

        debug!(
            address = %self.signer.address(),
            chain = network.chain,
            "Signed auth message"
        );

        Ok(AuthSig {
            sig: alloy::hex::encode_prefixed(signature.as_bytes()),
            derived_via: DERIVED_VIA.to_string(),
            signed_message: message,
            address: self.signer.address().to_checksum(None),
        })
    }
}
