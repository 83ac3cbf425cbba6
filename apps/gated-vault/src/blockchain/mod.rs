// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for access-policy evaluation.
//!
//! This module provides read-only functionality for:
//! - Querying native balances (`eth_getBalance`)
//! - Querying ERC-20 token balances (`balanceOf`)

pub mod client;
pub mod erc20;
pub mod types;

pub use client::{ChainClient, ChainClientError};
pub use types::*;
