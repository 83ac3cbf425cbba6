// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access condition types.

use std::path::Path;
use std::str::FromStr;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::PolicyError;

/// Placeholder parameter replaced with the authenticated signer's address.
pub const USER_ADDRESS_PARAM: &str = ":userAddress";

/// Minimum native balance (in wei) required by the default policy.
pub const DEFAULT_MIN_BALANCE_WEI: &str = "10000000000000";

/// Comparison applied between the on-chain value and the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Comparator {
    pub fn compare(self, actual: U256, expected: U256) -> bool {
        match self {
            Comparator::Gte => actual >= expected,
            Comparator::Lte => actual <= expected,
            Comparator::Gt => actual > expected,
            Comparator::Lt => actual < expected,
            Comparator::Eq => actual == expected,
            Comparator::Ne => actual != expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnValueTest {
    pub comparator: Comparator,
    /// Decimal (or `0x` hex) 256-bit unsigned integer.
    pub value: String,
}

impl ReturnValueTest {
    pub fn expected(&self) -> Result<U256, PolicyError> {
        U256::from_str(self.value.trim())
            .map_err(|e| PolicyError::InvalidValue(format!("`{}`: {e}", self.value)))
    }
}

/// A single predicate over on-chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCondition {
    /// Contract queried by the method (empty for native balance checks).
    #[serde(default)]
    pub contract_address: String,
    /// Contract standard (`"ERC20"` for `balanceOf`, empty otherwise).
    #[serde(default)]
    pub standard_contract_type: String,
    pub chain: String,
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub return_value_test: ReturnValueTest,
}

impl AccessCondition {
    /// `eth_getBalance(:userAddress, latest) <comparator> <value>`.
    pub fn native_balance(chain: &str, comparator: Comparator, value: &str) -> Self {
        Self {
            contract_address: String::new(),
            standard_contract_type: String::new(),
            chain: chain.to_string(),
            method: "eth_getBalance".to_string(),
            parameters: vec![USER_ADDRESS_PARAM.to_string(), "latest".to_string()],
            return_value_test: ReturnValueTest {
                comparator,
                value: value.to_string(),
            },
        }
    }

    /// ERC-20 `balanceOf(:userAddress) <comparator> <value>`.
    pub fn token_balance(chain: &str, token: &str, comparator: Comparator, value: &str) -> Self {
        Self {
            contract_address: token.to_string(),
            standard_contract_type: "ERC20".to_string(),
            chain: chain.to_string(),
            method: "balanceOf".to_string(),
            parameters: vec![USER_ADDRESS_PARAM.to_string()],
            return_value_test: ReturnValueTest {
                comparator,
                value: value.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOperator {
    And,
    Or,
}

/// One entry of a policy: a condition or an operator joining two conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyEntry {
    Condition(AccessCondition),
    Operator { operator: BooleanOperator },
}

/// Ordered list of access conditions shared by encrypt and decrypt calls.
///
/// Construction validates the list: at least one condition, operators only
/// between conditions, and every expected value parses as a 256-bit integer.
/// Adjacent conditions without an operator are joined with `and`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PolicyEntry>", into = "Vec<PolicyEntry>")]
pub struct AccessPolicy(Vec<PolicyEntry>);

impl AccessPolicy {
    pub fn new(entries: Vec<PolicyEntry>) -> Result<Self, PolicyError> {
        let mut expect_condition = true;
        let mut conditions = 0usize;

        for (position, entry) in entries.iter().enumerate() {
            match entry {
                PolicyEntry::Condition(condition) => {
                    condition.return_value_test.expected()?;
                    if condition.chain.trim().is_empty() {
                        return Err(PolicyError::InvalidPolicy(format!(
                            "condition {position} has no chain"
                        )));
                    }
                    conditions += 1;
                    expect_condition = false;
                }
                PolicyEntry::Operator { .. } => {
                    if expect_condition {
                        return Err(PolicyError::InvalidPolicy(format!(
                            "operator at position {position} does not follow a condition"
                        )));
                    }
                    expect_condition = true;
                }
            }
        }

        if conditions == 0 {
            return Err(PolicyError::InvalidPolicy(
                "policy has no conditions".to_string(),
            ));
        }
        if expect_condition {
            return Err(PolicyError::InvalidPolicy(
                "policy ends with an operator".to_string(),
            ));
        }

        Ok(Self(entries))
    }

    /// Policy gated on a single condition.
    pub fn single(condition: AccessCondition) -> Result<Self, PolicyError> {
        Self::new(vec![PolicyEntry::Condition(condition)])
    }

    /// The stock policy: the caller must hold at least 0.00001 ETH
    /// (`10000000000000` wei) on `chain`.
    pub fn default_balance_gate(chain: &str) -> Self {
        Self(vec![PolicyEntry::Condition(AccessCondition::native_balance(
            chain,
            Comparator::Gte,
            DEFAULT_MIN_BALANCE_WEI,
        ))])
    }

    /// Load a policy from a JSON file holding the wire-shape array.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| PolicyError::Load(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&raw)
            .map_err(|e| PolicyError::Load(format!("{}: {e}", path.display())))
    }

    pub fn entries(&self) -> &[PolicyEntry] {
        &self.0
    }

    pub fn conditions(&self) -> impl Iterator<Item = &AccessCondition> {
        self.0.iter().filter_map(|entry| match entry {
            PolicyEntry::Condition(condition) => Some(condition),
            PolicyEntry::Operator { .. } => None,
        })
    }

    /// Chain of the first condition; policies are expected to target one chain.
    pub fn chain(&self) -> Option<&str> {
        self.conditions().next().map(|c| c.chain.as_str())
    }

    /// SHA-256 over the canonical JSON encoding.
    ///
    /// Key handles are bound to this digest, so a handle saved under one
    /// policy cannot be redeemed by presenting a different one.
    pub fn digest(&self) -> [u8; 32] {
        // Field order is fixed by the struct definitions, so the encoding is stable.
        let encoded = serde_json::to_vec(&self.0).unwrap_or_default();
        Sha256::digest(&encoded).into()
    }
}

impl TryFrom<Vec<PolicyEntry>> for AccessPolicy {
    type Error = PolicyError;

    fn try_from(entries: Vec<PolicyEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<AccessPolicy> for Vec<PolicyEntry> {
    fn from(policy: AccessPolicy) -> Self {
        policy.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEPLOYED_POLICY: &str = r#"[
      {
        "contractAddress": "",
        "standardContractType": "",
        "chain": "ethereum",
        "method": "eth_getBalance",
        "parameters": [":userAddress", "latest"],
        "returnValueTest": { "comparator": ">=", "value": "10000000000000" }
      }
    ]"#;

    #[test]
    fn default_policy_matches_wire_shape() {
        let parsed: AccessPolicy = serde_json::from_str(DEPLOYED_POLICY).unwrap();
        assert_eq!(parsed, AccessPolicy::default_balance_gate("ethereum"));
        assert_eq!(parsed.chain(), Some("ethereum"));
    }

    #[test]
    fn serializes_in_camel_case() {
        let json = serde_json::to_value(AccessPolicy::default_balance_gate("ethereum")).unwrap();
        assert_eq!(json[0]["returnValueTest"]["comparator"], ">=");
        assert_eq!(json[0]["standardContractType"], "");
        assert_eq!(json[0]["parameters"][0], USER_ADDRESS_PARAM);
    }

    #[test]
    fn operators_parse_between_conditions() {
        let policy = AccessPolicy::new(vec![
            PolicyEntry::Condition(AccessCondition::native_balance("ethereum", Comparator::Gt, "0")),
            PolicyEntry::Operator {
                operator: BooleanOperator::Or,
            },
            PolicyEntry::Condition(AccessCondition::token_balance(
                "ethereum",
                "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                Comparator::Gte,
                "1000000",
            )),
        ])
        .unwrap();

        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains(r#"{"operator":"or"}"#));
        let back: AccessPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back.conditions().count(), 2);
    }

    #[test]
    fn rejects_malformed_policies() {
        assert!(AccessPolicy::new(vec![]).is_err());
        assert!(AccessPolicy::new(vec![PolicyEntry::Operator {
            operator: BooleanOperator::And
        }])
        .is_err());

        let trailing = vec![
            PolicyEntry::Condition(AccessCondition::native_balance("ethereum", Comparator::Gt, "0")),
            PolicyEntry::Operator {
                operator: BooleanOperator::And,
            },
        ];
        assert!(AccessPolicy::new(trailing).is_err());

        let bad_value = AccessCondition::native_balance("ethereum", Comparator::Gt, "lots");
        assert!(matches!(
            AccessPolicy::single(bad_value),
            Err(PolicyError::InvalidValue(_))
        ));

        assert!(serde_json::from_str::<AccessPolicy>("[]").is_err());
    }

    #[test]
    fn digest_distinguishes_policies() {
        let a = AccessPolicy::default_balance_gate("ethereum");
        let b = AccessPolicy::default_balance_gate("sepolia");
        assert_eq!(a.digest(), a.clone().digest());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn comparators() {
        let one = U256::from(1u64);
        let two = U256::from(2u64);
        assert!(Comparator::Gte.compare(two, one));
        assert!(Comparator::Gte.compare(two, two));
        assert!(!Comparator::Gt.compare(two, two));
        assert!(Comparator::Lt.compare(one, two));
        assert!(Comparator::Lte.compare(one, one));
        assert!(Comparator::Eq.compare(one, one));
        assert!(Comparator::Ne.compare(one, two));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEPLOYED_POLICY.as_bytes()).unwrap();

        let policy = AccessPolicy::from_json_file(file.path()).unwrap();
        assert_eq!(policy, AccessPolicy::default_balance_gate("ethereum"));

        assert!(matches!(
            AccessPolicy::from_json_file("/nonexistent/policy.json"),
            Err(PolicyError::Load(_))
        ));
    }
}
