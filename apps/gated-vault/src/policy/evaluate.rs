// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Policy evaluation against on-chain balances.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::debug;

use super::{AccessCondition, AccessPolicy, BooleanOperator, PolicyEntry, PolicyError, USER_ADDRESS_PARAM};

/// Source of the on-chain values conditions compare against.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Native balance (wei) of `holder` on `chain`.
    async fn native_balance(&self, chain: &str, holder: Address) -> Result<U256, PolicyError>;

    /// ERC-20 balance of `holder` in `token` on `chain`, in the token's smallest unit.
    async fn token_balance(
        &self,
        chain: &str,
        token: Address,
        holder: Address,
    ) -> Result<U256, PolicyError>;
}

/// Evaluate `policy` for `user`.
///
/// Entries are folded left to right; a condition whose outcome cannot change
/// the running result (`false and ..`, `true or ..`) is not queried.
pub async fn evaluate(
    policy: &AccessPolicy,
    user: Address,
    oracle: &dyn BalanceOracle,
) -> Result<bool, PolicyError> {
    let mut result: Option<bool> = None;
    let mut pending = BooleanOperator::And;

    for entry in policy.entries() {
        match entry {
            PolicyEntry::Operator { operator } => pending = *operator,
            PolicyEntry::Condition(condition) => {
                let next = match (result, pending) {
                    (Some(false), BooleanOperator::And) => false,
                    (Some(true), BooleanOperator::Or) => true,
                    (Some(acc), BooleanOperator::And) => {
                        acc && evaluate_condition(condition, user, oracle).await?
                    }
                    (Some(acc), BooleanOperator::Or) => {
                        acc || evaluate_condition(condition, user, oracle).await?
                    }
                    (None, _) => evaluate_condition(condition, user, oracle).await?,
                };
                result = Some(next);
                pending = BooleanOperator::And;
            }
        }
    }

    Ok(result.unwrap_or(false))
}

async fn evaluate_condition(
    condition: &AccessCondition,
    user: Address,
    oracle: &dyn BalanceOracle,
) -> Result<bool, PolicyError> {
    let holder = resolve_holder(condition, user)?;
    let expected = condition.return_value_test.expected()?;

    let actual = match condition.method.as_str() {
        "eth_getBalance" => oracle.native_balance(&condition.chain, holder).await?,
        "balanceOf" => {
            if !condition.standard_contract_type.eq_ignore_ascii_case("ERC20") {
                return Err(PolicyError::UnsupportedMethod(format!(
                    "balanceOf on `{}` contracts",
                    condition.standard_contract_type
                )));
            }
            let token = parse_address(&condition.contract_address)?;
            oracle.token_balance(&condition.chain, token, holder).await?
        }
        other => return Err(PolicyError::UnsupportedMethod(other.to_string())),
    };

    let passed = condition
        .return_value_test
        .comparator
        .compare(actual, expected);

    debug!(
        method = %condition.method,
        chain = %condition.chain,
        holder = %holder,
        actual = %actual,
        expected = %expected,
        passed,
        "Evaluated access condition"
    );

    Ok(passed)
}

/// The first parameter names the account being checked.
fn resolve_holder(condition: &AccessCondition, user: Address) -> Result<Address, PolicyError> {
    match condition.parameters.first().map(String::as_str) {
        None | Some(USER_ADDRESS_PARAM) => Ok(user),
        Some(literal) => parse_address(literal),
    }
}

fn parse_address(raw: &str) -> Result<Address, PolicyError> {
    Address::from_str(raw.trim()).map_err(|e| PolicyError::InvalidAddress(format!("`{raw}`: {e}")))
}
