// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

/// EVM network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Chain name as used in access conditions (e.g. `"ethereum"`)
    pub chain: &'static str,
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
}

/// Ethereum mainnet configuration.
pub const ETHEREUM_MAINNET: NetworkConfig = NetworkConfig {
    chain: "ethereum",
    name: "Ethereum Mainnet",
    chain_id: 1,
    rpc_url: "https://ethereum-rpc.publicnode.com",
};

/// Ethereum Sepolia testnet configuration.
pub const ETHEREUM_SEPOLIA: NetworkConfig = NetworkConfig {
    chain: "sepolia",
    name: "Ethereum Sepolia Testnet",
    chain_id: 11155111,
    rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
};

/// Networks this build knows how to reach.
pub const SUPPORTED_NETWORKS: &[NetworkConfig] = &[ETHEREUM_MAINNET, ETHEREUM_SEPOLIA];

/// Resolve a condition chain name to its network configuration.
pub fn network_by_name(raw: &str) -> Result<NetworkConfig, String> {
    let value = raw.trim().to_ascii_lowercase();
    SUPPORTED_NETWORKS
        .iter()
        .find(|network| network.chain == value)
        .cloned()
        .ok_or_else(|| {
            let known: Vec<&str> = SUPPORTED_NETWORKS.iter().map(|n| n.chain).collect();
            format!("Unsupported chain `{value}` (supported: {})", known.join(", "))
        })
}
