// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Auth assertions ("auth sigs") prove control of an on-chain identity to the
//! key network before it stores or releases a key.
//!
//! ## Flow
//!
//! 1. The orchestrator asks an [`AuthSigner`] for a fresh assertion at the
//!    start of every encrypt or decrypt operation
//! 2. The signer produces an EIP-4361 style message with an expiration time
//!    and signs it (EIP-191 personal sign)
//! 3. The key network recovers the signer from the signature, checks it
//!    against the claimed address and expiry, then evaluates the access
//!    policy for that address
//!
//! Assertions are never cached between operations.

pub mod auth_sig;
pub mod error;
pub mod keys;
pub mod signer;

pub use auth_sig::AuthSig;
pub use error::AuthError;
pub use signer::{AuthSigner, WalletAuthSigner, DEFAULT_AUTH_SIG_TTL};
