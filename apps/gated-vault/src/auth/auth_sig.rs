// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed auth assertions.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// How the signature was produced (EIP-191 personal sign).
pub const DERIVED_VIA: &str = "web3.eth.personal.sign";

/// Line of the auth message carrying the expiry (RFC 3339).
pub const EXPIRATION_PREFIX: &str = "Expiration Time: ";

/// A signed statement proving control of an on-chain identity.
///
/// Obtained fresh for each encrypt or decrypt operation and sent to the key
/// network alongside the access policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSig {
    /// `0x`-prefixed 65-byte signature over `signed_message`.
    pub sig: String,
    pub derived_via: String,
    pub signed_message: String,
    /// Address the signer claims to control.
    pub address: String,
}

impl AuthSig {
    pub fn claimed_address(&self) -> Result<Address, AuthError> {
        Address::from_str(self.address.trim())
            .map_err(|e| AuthError::Malformed(format!("address `{}`: {e}", self.address)))
    }

    /// Expiration time stated in the signed message.
    pub fn expiration_time(&self) -> Result<DateTime<Utc>, AuthError> {
        let raw = self
            .signed_message
            .lines()
            .find_map(|line| line.strip_prefix(EXPIRATION_PREFIX))
            .ok_or_else(|| AuthError::Malformed("message has no expiration time".to_string()))?;

        DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AuthError::Malformed(format!("expiration time `{raw}`: {e}")))
    }

    /// Check the signature and expiry, returning the proven address.
    pub fn verify(&self, now: DateTime<Utc>) -> Result<Address, AuthError> {
        if self.derived_via != DERIVED_VIA {
            return Err(AuthError::Malformed(format!(
                "unsupported derivation `{}`",
                self.derived_via
            )));
        }

        let raw = alloy::hex::decode(self.sig.trim())
            .map_err(|e| AuthError::Malformed(format!("signature hex: {e}")))?;
        let signature = Signature::try_from(raw.as_slice())
            .map_err(|e| AuthError::Malformed(format!("signature bytes: {e}")))?;

        let recovered = signature
            .recover_address_from_msg(self.signed_message.as_bytes())
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

        let claimed = self.claimed_address()?;
        if recovered != claimed {
            return Err(AuthError::AddressMismatch {
                claimed: claimed.to_checksum(None),
                recovered: recovered.to_checksum(None),
            });
        }

        let expires_at = self.expiration_time()?;
        if now >= expires_at {
            return Err(AuthError::Expired(expires_at.to_rfc3339()));
        }

        Ok(recovered)
    }
}
