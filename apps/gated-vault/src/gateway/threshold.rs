// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encryption gateway backed by a key network.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use super::{
    EncryptedString, EncryptionGateway, GatewayError, KeyHandle, KeyNetwork, RetrieveKeyRequest,
    StoreKeyRequest, SymmetricKey,
};
use crate::auth::AuthSig;
use crate::policy::AccessPolicy;

/// Seals plaintext locally and lets a [`KeyNetwork`] guard the key.
pub struct ThresholdGateway<K> {
    network: K,
    /// Chain used when a policy does not name one.
    default_chain: String,
    connected: AtomicBool,
}

impl<K: KeyNetwork> ThresholdGateway<K> {
    pub fn new(network: K, default_chain: impl Into<String>) -> Self {
        Self {
            network,
            default_chain: default_chain.into(),
            connected: AtomicBool::new(false),
        }
    }

    fn ensure_connected(&self) -> Result<(), GatewayError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GatewayError::NotConnected)
        }
    }

    fn chain_for(&self, policy: &AccessPolicy) -> String {
        policy
            .chain()
            .unwrap_or(self.default_chain.as_str())
            .to_string()
    }
}

#[async_trait]
impl<K: KeyNetwork> EncryptionGateway for ThresholdGateway<K> {
    async fn connect(&self) -> Result<(), GatewayError> {
        self.network.connect().await?;
        self.connected.store(true, Ordering::SeqCst);
        info!(chain = %self.default_chain, "Connected to key network");
        Ok(())
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Disconnected from key network");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn encrypt_string(
        &self,
        plaintext: &str,
        policy: &AccessPolicy,
        auth_sig: &AuthSig,
    ) -> Result<EncryptedString, GatewayError> {
        self.ensure_connected()?;

        let key = SymmetricKey::generate();
        let encrypted_file = key.seal(plaintext.as_bytes(), &[])?;

        let stored = self
            .network
            .store_key(StoreKeyRequest {
                access_control_conditions: policy.clone(),
                symmetric_key: key.to_hex(),
                auth_sig: auth_sig.clone(),
                chain: self.chain_for(policy),
            })
            .await?;

        let handle = KeyHandle::parse(&stored.encrypted_symmetric_key)?;
        debug!(
            ciphertext_bytes = encrypted_file.len(),
            key_handle_len = handle.as_str().len(),
            "Encrypted string"
        );

        Ok(EncryptedString {
            encrypted_file: Bytes::from(encrypted_file),
            encrypted_symmetric_key: handle,
        })
    }

    async fn decrypt_string(
        &self,
        encrypted_file: &[u8],
        key_handle: &KeyHandle,
        policy: &AccessPolicy,
        auth_sig: &AuthSig,
    ) -> Result<String, GatewayError> {
        self.ensure_connected()?;

        let released = self
            .network
            .retrieve_key(RetrieveKeyRequest {
                access_control_conditions: policy.clone(),
                to_decrypt: key_handle.to_string(),
                auth_sig: auth_sig.clone(),
                chain: self.chain_for(policy),
            })
            .await?;

        let key = SymmetricKey::from_hex(&released.symmetric_key)?;
        let plaintext = key.open(encrypted_file, &[])?;

        String::from_utf8(plaintext)
            .map_err(|e| GatewayError::Crypto(format!("plaintext is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{local_gateway, test_signer, StaticBalances};
    use crate::auth::AuthSigner;

    #[tokio::test]
    async fn calls_before_connect_fail() {
        let gateway = local_gateway(StaticBalances::rich_test_account());
        let sig = test_signer().sign_auth_message("ethereum").await.unwrap();
        let policy = AccessPolicy::default_balance_gate("ethereum");

        let err = gateway.encrypt_string("x", &policy, &sig).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConnected));
        assert!(!gateway.is_connected());
    }

    #[tokio::test]
    async fn round_trip_and_idempotent_decrypt() {
        let gateway = local_gateway(StaticBalances::rich_test_account());
        gateway.connect().await.unwrap();
        let signer = test_signer();
        let policy = AccessPolicy::default_balance_gate("ethereum");

        let sig = signer.sign_auth_message("ethereum").await.unwrap();
        let encrypted = gateway
            .encrypt_string("https://ipfs.infura.io/ipfs/Qm123", &policy, &sig)
            .await
            .unwrap();
        assert_ne!(encrypted.encrypted_file.as_ref(), b"https://ipfs.infura.io/ipfs/Qm123");

        let sig = signer.sign_auth_message("ethereum").await.unwrap();
        let first = gateway
            .decrypt_string(&encrypted.encrypted_file, &encrypted.encrypted_symmetric_key, &policy, &sig)
            .await
            .unwrap();
        let second = gateway
            .decrypt_string(&encrypted.encrypted_file, &encrypted.encrypted_symmetric_key, &policy, &sig)
            .await
            .unwrap();

        assert_eq!(first, "https://ipfs.infura.io/ipfs/Qm123");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn disconnect_blocks_further_calls() {
        let gateway = local_gateway(StaticBalances::rich_test_account());
        gateway.connect().await.unwrap();
        gateway.disconnect().await;

        let sig = test_signer().sign_auth_message("ethereum").await.unwrap();
        let policy = AccessPolicy::default_balance_gate("ethereum");
        assert!(matches!(
            gateway.encrypt_string("x", &policy, &sig).await,
            Err(GatewayError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn tampered_ciphertext_fails_to_open() {
        let gateway = local_gateway(StaticBalances::rich_test_account());
        gateway.connect().await.unwrap();
        let signer = test_signer();
        let policy = AccessPolicy::default_balance_gate("ethereum");

        let sig = signer.sign_auth_message("ethereum").await.unwrap();
        let encrypted = gateway.encrypt_string("locator", &policy, &sig).await.unwrap();

        let mut tampered = encrypted.encrypted_file.to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xff;

        let err = gateway
            .decrypt_string(&tampered, &encrypted.encrypted_symmetric_key, &policy, &sig)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Crypto(_)));
    }
}
