// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process key custodian.
//!
//! Stands in for the decentralized key network in development and tests.
//! Symmetric keys are wrapped with a master key; the wrapped form is the key
//! handle, and the policy digest is bound to it as associated data so a handle
//! cannot be released under a different policy.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use super::{
    GatewayError, KeyHandle, KeyNetwork, RetrieveKeyRequest, RetrieveKeyResponse,
    StoreKeyRequest, StoreKeyResponse, SymmetricKey,
};
use crate::auth::AuthSig;
use crate::policy::{evaluate, AccessPolicy, BalanceOracle, PolicyError};

pub struct LocalKeyNetwork {
    master: SymmetricKey,
    oracle: Arc<dyn BalanceOracle>,
}

impl LocalKeyNetwork {
    pub fn new(master: SymmetricKey, oracle: Arc<dyn BalanceOracle>) -> Self {
        Self { master, oracle }
    }

    /// Custodian with a master key that lives only as long as the process.
    pub fn ephemeral(oracle: Arc<dyn BalanceOracle>) -> Self {
        Self::new(SymmetricKey::generate(), oracle)
    }

    /// Verify the assertion and check the recovered address against `policy`.
    async fn authorize(&self, auth_sig: &AuthSig, policy: &AccessPolicy) -> Result<(), GatewayError> {
        let user = auth_sig
            .verify(Utc::now())
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        match evaluate(policy, user, self.oracle.as_ref()).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(user = %user, "Access policy not satisfied");
                Err(GatewayError::PolicyDenied(format!(
                    "{user} does not satisfy the access policy"
                )))
            }
            Err(PolicyError::Oracle(e)) => Err(GatewayError::Unavailable(e)),
            Err(e) => {
                warn!(error = %e, "Access policy could not be evaluated");
                Err(GatewayError::InvalidPolicy(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl KeyNetwork for LocalKeyNetwork {
    async fn connect(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn store_key(&self, request: StoreKeyRequest) -> Result<StoreKeyResponse, GatewayError> {
        self.authorize(&request.auth_sig, &request.access_control_conditions)
            .await?;

        let key = SymmetricKey::from_hex(&request.symmetric_key)?;
        let digest = request.access_control_conditions.digest();
        let wrapped = self.master.seal(key.bytes(), &digest)?;

        debug!(chain = %request.chain, "Stored symmetric key");
        Ok(StoreKeyResponse {
            encrypted_symmetric_key: KeyHandle::from_bytes(&wrapped).to_string(),
        })
    }

    async fn retrieve_key(
        &self,
        request: RetrieveKeyRequest,
    ) -> Result<RetrieveKeyResponse, GatewayError> {
        let handle = KeyHandle::parse(&request.to_decrypt)?;
        self.authorize(&request.auth_sig, &request.access_control_conditions)
            .await?;

        let digest = request.access_control_conditions.digest();
        let key = self
            .master
            .open(&handle.to_bytes()?, &digest)
            .map_err(|_| {
                GatewayError::InvalidKeyHandle(
                    "key handle was not issued under this policy".to_string(),
                )
            })?;

        debug!(chain = %request.chain, "Released symmetric key");
        Ok(RetrieveKeyResponse {
            symmetric_key: SymmetricKey::from_slice(&key)?.to_hex(),
        })
    }
}
