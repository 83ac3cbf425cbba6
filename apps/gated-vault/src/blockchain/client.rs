// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC client used to evaluate access conditions.

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;
use tracing::debug;

use super::erc20::Erc20Contract;
use super::types::*;
use crate::policy::{BalanceOracle, PolicyError};

/// HTTP provider type (with the default fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Read-only client for one EVM network.
pub struct ChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: HttpProvider,
}

impl ChainClient {
    /// Create a new client for the specified network.
    ///
    /// `rpc_url` overrides the network's default public endpoint.
    pub fn new(network: NetworkConfig, rpc_url: Option<&str>) -> Result<Self, ChainClientError> {
        let url: url::Url = rpc_url
            .unwrap_or(network.rpc_url)
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    /// Create a client for a chain name used in access conditions.
    pub fn for_chain(chain: &str, rpc_url: Option<&str>) -> Result<Self, ChainClientError> {
        let network = network_by_name(chain).map_err(ChainClientError::UnsupportedChain)?;
        Self::new(network, rpc_url)
    }

    /// Get the native balance (wei) for an address.
    pub async fn get_native_balance(&self, address: Address) -> Result<U256, ChainClientError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))
    }

    /// Get the ERC-20 token balance for an address.
    pub async fn get_token_balance(
        &self,
        token: Address,
        holder: Address,
    ) -> Result<U256, ChainClientError> {
        Erc20Contract::new(&self.provider, token)
            .balance_of(holder)
            .await
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn ensure_chain(&self, chain: &str) -> Result<(), PolicyError> {
        if chain.trim().eq_ignore_ascii_case(self.network.chain) {
            Ok(())
        } else {
            Err(PolicyError::UnsupportedChain(format!(
                "`{chain}` (client is connected to `{}`)",
                self.network.chain
            )))
        }
    }
}

#[async_trait]
impl BalanceOracle for ChainClient {
    async fn native_balance(&self, chain: &str, holder: Address) -> Result<U256, PolicyError> {
        self.ensure_chain(chain)?;
        let balance = self
            .get_native_balance(holder)
            .await
            .map_err(|e| PolicyError::Oracle(e.to_string()))?;
        debug!(
            chain = self.network.chain,
            holder = %holder,
            balance = %format_balance(balance, 18),
            "Fetched native balance"
        );
        Ok(balance)
    }

    async fn token_balance(
        &self,
        chain: &str,
        token: Address,
        holder: Address,
    ) -> Result<U256, PolicyError> {
        self.ensure_chain(chain)?;
        self.get_token_balance(token, holder)
            .await
            .map_err(|e| PolicyError::Oracle(e.to_string()))
    }
}

/// Format a balance with the specified number of decimals.
pub fn format_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        // Format with up to 6 decimal places
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
        }
    }
}

/// Errors that can occur during blockchain reads.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("{0}")]
    UnsupportedChain(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}
