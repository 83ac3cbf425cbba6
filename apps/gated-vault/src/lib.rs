// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gated Vault - Access-Controlled Content Locker
//!
//! Uploads files to content-addressed storage, encrypts each resulting
//! locator under an on-chain access policy through a key network, and keeps
//! the (ciphertext, key handle) pairs for later decryption by callers that
//! satisfy the policy.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Auth assertions (EIP-191 signed messages)
//! - `blockchain` - EVM balance reads for policy evaluation
//! - `gateway` - Access-controlled encryption and key networks
//! - `policy` - Access-control conditions and their evaluation
//! - `storage` - Content-addressed storage (IPFS)
//! - `vault` - Upload-and-encrypt / decrypt-all orchestration

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod policy;
pub mod state;
pub mod storage;
pub mod vault;

#[cfg(test)]
pub(crate) mod testing;
