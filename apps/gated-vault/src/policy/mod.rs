// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access-Control Policy Module
//!
//! Declarative predicates over on-chain state that gate who may obtain a
//! decryption key. Policies are data: they are serialized verbatim into key
//! network requests and evaluated by the key network (or by the in-process
//! custodian in [`crate::gateway::custodian`]).
//!
//! ## Wire Shape
//!
//! ```json
//! [
//!   {
//!     "contractAddress": "",
//!     "standardContractType": "",
//!     "chain": "ethereum",
//!     "method": "eth_getBalance",
//!     "parameters": [":userAddress", "latest"],
//!     "returnValueTest": { "comparator": ">=", "value": "10000000000000" }
//!   }
//! ]
//! ```
//!
//! Conditions may be separated by `{"operator": "and"}` / `{"operator": "or"}`
//! entries and are evaluated left to right.

pub mod condition;
pub mod evaluate;

pub use condition::{
    AccessCondition, AccessPolicy, BooleanOperator, Comparator, PolicyEntry, ReturnValueTest,
    USER_ADDRESS_PARAM,
};
pub use evaluate::{evaluate, BalanceOracle};

/// Errors raised while building or evaluating a policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Invalid access policy: {0}")]
    InvalidPolicy(String),

    #[error("Unsupported condition method: {0}")]
    UnsupportedMethod(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Invalid address in condition: {0}")]
    InvalidAddress(String),

    #[error("Invalid comparison value: {0}")]
    InvalidValue(String),

    #[error("Failed to load policy: {0}")]
    Load(String),

    #[error("Chain query failed: {0}")]
    Oracle(String),
}
