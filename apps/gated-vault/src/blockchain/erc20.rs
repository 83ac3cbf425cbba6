// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract reads.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
};

use super::client::ChainClientError;

// Only the read side of the ERC-20 interface is needed for access checks.
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

/// ERC-20 contract wrapper.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IERC20::new(address, provider.clone()),
        }
    }

    /// Get the raw balance of an address.
    pub async fn balance_of(&self, holder: Address) -> Result<U256, ChainClientError> {
        self.contract
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }
}
