// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::auth::{AuthError, WalletAuthSigner};
use crate::blockchain::{ChainClient, ChainClientError};
use crate::config::{AppConfig, ConfigError, WalletKeySource};
use crate::gateway::{
    EncryptionGateway, GatewayError, HttpKeyNetwork, LocalKeyNetwork, SymmetricKey,
    ThresholdGateway,
};
use crate::policy::{AccessPolicy, PolicyError};
use crate::storage::cache::DEFAULT_CONTENT_TTL;
use crate::storage::{ContentCache, IpfsHttpClient, StorageError};
use crate::vault::Vault;

#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
    pub max_upload_bytes: usize,
    /// Cancelled on server shutdown; in-flight submissions and batches stop.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(vault: Vault, max_upload_bytes: usize) -> Self {
        Self {
            vault: Arc::new(vault),
            max_upload_bytes,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Failures while wiring the service together at startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Chain(#[from] ChainClientError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Build the production vault from `config`.
///
/// The returned gateway is not connected yet.
pub fn build_vault(config: &AppConfig) -> Result<(Vault, Arc<dyn EncryptionGateway>), BootstrapError> {
    let store = IpfsHttpClient::new(
        &config.ipfs_api_url,
        config.ipfs_credentials.clone(),
        config.request_timeout,
    )?;

    let signer = match &config.wallet_key {
        WalletKeySource::Hex(hex) => WalletAuthSigner::from_hex(hex)?,
        WalletKeySource::PemFile(path) => WalletAuthSigner::from_pem_file(path)?,
    }
    .with_ttl(config.auth_sig_ttl);

    let policy = match &config.policy_path {
        Some(path) => AccessPolicy::from_json_file(path)?,
        None => AccessPolicy::default_balance_gate(&config.chain),
    };

    let gateway: Arc<dyn EncryptionGateway> = match &config.key_network_url {
        Some(url) => {
            info!(url = %url, "Using remote key node");
            Arc::new(ThresholdGateway::new(
                HttpKeyNetwork::new(url, config.request_timeout)?,
                config.chain.clone(),
            ))
        }
        None => {
            let oracle = Arc::new(ChainClient::for_chain(
                &config.chain,
                config.chain_rpc_url.as_deref(),
            )?);
            let network = match &config.key_network_master_key {
                Some(hex) => LocalKeyNetwork::new(SymmetricKey::from_hex(hex)?, oracle),
                None => {
                    info!("No custodian master key configured, generating an ephemeral one");
                    LocalKeyNetwork::ephemeral(oracle)
                }
            };
            info!(chain = %config.chain, "Using in-process key custodian");
            Arc::new(ThresholdGateway::new(network, config.chain.clone()))
        }
    };

    let vault = Vault::new(Arc::new(store), Arc::clone(&gateway), Arc::new(signer), policy)
        .with_chain(config.chain.clone())
        .with_gateway_prefix(config.ipfs_gateway_url.clone())
        .with_cache(ContentCache::new(
            config.content_cache_capacity,
            DEFAULT_CONTENT_TTL,
        ));

    Ok((vault, gateway))
}
