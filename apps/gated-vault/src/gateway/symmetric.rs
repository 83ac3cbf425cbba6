// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM symmetric sealing.
//!
//! Sealed format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};

use super::GatewayError;

/// Size of an AES-256 key in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 32;
/// Size of an AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// A 256-bit key sealing exactly one payload.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl SymmetricKey {
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; SYMMETRIC_KEY_SIZE];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, GatewayError> {
        if data.len() != SYMMETRIC_KEY_SIZE {
            return Err(GatewayError::Crypto(format!(
                "invalid key size, expected {SYMMETRIC_KEY_SIZE}, got {}",
                data.len()
            )));
        }
        let mut bytes = [0u8; SYMMETRIC_KEY_SIZE];
        bytes.copy_from_slice(data);
        Ok(Self(bytes))
    }

    pub fn from_hex(raw: &str) -> Result<Self, GatewayError> {
        let trimmed = raw.trim();
        let bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| GatewayError::Crypto(format!("key hex: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        alloy::hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Seal `plaintext`, authenticating `aad` alongside it.
    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, GatewayError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, Payload { msg: plaintext, aad })
            .map_err(|e| GatewayError::Crypto(format!("seal failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a payload produced by [`SymmetricKey::seal`] with the same `aad`.
    pub fn open(&self, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>, GatewayError> {
        if sealed.len() <= NONCE_SIZE {
            return Err(GatewayError::Crypto("sealed payload too short".to_string()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0));

        cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
            .map_err(|_| GatewayError::Crypto("authentication failed".to_string()))
    }
}
