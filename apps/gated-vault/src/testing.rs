// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test fixtures shared across modules.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use axum::Router;

use crate::auth::{AuthSig, WalletAuthSigner};
use crate::gateway::{
    EncryptedString, EncryptionGateway, GatewayError, KeyHandle, LocalKeyNetwork,
    ThresholdGateway,
};
use crate::policy::{AccessPolicy, BalanceOracle, PolicyError};
use crate::storage::MemoryContentStore;
use crate::vault::Vault;

/// First default anvil account.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const TEST_GATEWAY_PREFIX: &str = "https://ipfs.test/ipfs/";

pub fn test_address() -> Address {
    Address::from_str(TEST_ADDRESS).unwrap()
}

pub fn test_signer() -> WalletAuthSigner {
    WalletAuthSigner::from_hex(TEST_PRIVATE_KEY).unwrap()
}

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Balance oracle answering from fixed tables. Balances can be changed
/// after construction to simulate on-chain movements.
#[derive(Default)]
pub struct StaticBalances {
    native: Mutex<HashMap<Address, U256>>,
    tokens: Mutex<HashMap<(Address, Address), U256>>,
    chain: Option<String>,
    unavailable: bool,
}

impl StaticBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test account holding 1 ETH.
    pub fn rich_test_account() -> Self {
        Self::new().with_native(test_address(), U256::from(1_000_000_000_000_000_000u64))
    }

    pub fn with_native(self, holder: Address, balance: U256) -> Self {
        self.set_native(holder, balance);
        self
    }

    pub fn with_token(self, token: Address, holder: Address, balance: U256) -> Self {
        self.tokens.lock().unwrap().insert((token, holder), balance);
        self
    }

    /// Reject queries for any other chain.
    pub fn only_chain(mut self, chain: &str) -> Self {
        self.chain = Some(chain.to_string());
        self
    }

    /// Fail every query.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn set_native(&self, holder: Address, balance: U256) {
        self.native.lock().unwrap().insert(holder, balance);
    }

    fn check(&self, chain: &str) -> Result<(), PolicyError> {
        if self.unavailable {
            return Err(PolicyError::Oracle("rpc unreachable".to_string()));
        }
        match &self.chain {
            Some(expected) if expected != chain => {
                Err(PolicyError::UnsupportedChain(chain.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl BalanceOracle for StaticBalances {
    async fn native_balance(&self, chain: &str, holder: Address) -> Result<U256, PolicyError> {
        self.check(chain)?;
        Ok(self
            .native
            .lock()
            .unwrap()
            .get(&holder)
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance(
        &self,
        chain: &str,
        token: Address,
        holder: Address,
    ) -> Result<U256, PolicyError> {
        self.check(chain)?;
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(&(token, holder))
            .copied()
            .unwrap_or_default())
    }
}

pub fn local_gateway(balances: StaticBalances) -> ThresholdGateway<LocalKeyNetwork> {
    ThresholdGateway::new(LocalKeyNetwork::ephemeral(Arc::new(balances)), "ethereum")
}

/// Gateway wrapper injecting latency and failures per key handle.
pub struct ScriptedGateway {
    inner: Arc<dyn EncryptionGateway>,
    encrypt_delay: Mutex<Duration>,
    decrypt_delays: Mutex<HashMap<KeyHandle, Duration>>,
    failing: Mutex<HashSet<KeyHandle>>,
    encrypted: Mutex<Vec<String>>,
    completions: Mutex<Vec<KeyHandle>>,
}

impl ScriptedGateway {
    pub fn new(inner: Arc<dyn EncryptionGateway>) -> Self {
        Self {
            inner,
            encrypt_delay: Mutex::new(Duration::ZERO),
            decrypt_delays: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            encrypted: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    pub fn set_encrypt_delay(&self, delay: Duration) {
        *self.encrypt_delay.lock().unwrap() = delay;
    }

    pub fn delay_decrypt(&self, handle: &KeyHandle, delay: Duration) {
        self.decrypt_delays
            .lock()
            .unwrap()
            .insert(handle.clone(), delay);
    }

    pub fn fail_decrypt(&self, handle: &KeyHandle) {
        self.failing.lock().unwrap().insert(handle.clone());
    }

    /// Plaintexts passed to `encrypt_string`, in call order.
    pub fn encrypted_plaintexts(&self) -> Vec<String> {
        self.encrypted.lock().unwrap().clone()
    }

    /// Key handles of finished decrypt calls, in completion order.
    pub fn completion_order(&self) -> Vec<KeyHandle> {
        self.completions.lock().unwrap().clone()
    }
}

#[async_trait]
impl EncryptionGateway for ScriptedGateway {
    async fn connect(&self) -> Result<(), GatewayError> {
        self.inner.connect().await
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn encrypt_string(
        &self,
        plaintext: &str,
        policy: &AccessPolicy,
        auth_sig: &AuthSig,
    ) -> Result<EncryptedString, GatewayError> {
        self.encrypted.lock().unwrap().push(plaintext.to_string());
        let delay = *self.encrypt_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.inner.encrypt_string(plaintext, policy, auth_sig).await
    }

    async fn decrypt_string(
        &self,
        encrypted_file: &[u8],
        key_handle: &KeyHandle,
        policy: &AccessPolicy,
        auth_sig: &AuthSig,
    ) -> Result<String, GatewayError> {
        let delay = self.decrypt_delays.lock().unwrap().get(key_handle).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fail = self.failing.lock().unwrap().contains(key_handle);
        let result = if fail {
            Err(GatewayError::Unavailable("node quorum not reached".to_string()))
        } else {
            self.inner
                .decrypt_string(encrypted_file, key_handle, policy, auth_sig)
                .await
        };

        self.completions.lock().unwrap().push(key_handle.clone());
        result
    }
}

/// A vault wired to in-process collaborators.
pub struct TestVault {
    pub vault: Vault,
    pub store: Arc<MemoryContentStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub balances: Arc<StaticBalances>,
}

pub async fn local_vault(balances: StaticBalances) -> TestVault {
    local_vault_with_store(balances, MemoryContentStore::new()).await
}

pub async fn local_vault_with_store(
    balances: StaticBalances,
    store: MemoryContentStore,
) -> TestVault {
    let balances = Arc::new(balances);
    let oracle: Arc<dyn BalanceOracle> = balances.clone();
    let inner = ThresholdGateway::new(LocalKeyNetwork::ephemeral(oracle), "ethereum");
    let gateway = Arc::new(ScriptedGateway::new(Arc::new(inner)));
    gateway.connect().await.unwrap();

    let store = Arc::new(store);
    let vault = Vault::new(
        store.clone(),
        gateway.clone(),
        Arc::new(test_signer()),
        AccessPolicy::default_balance_gate("ethereum"),
    )
    .with_gateway_prefix(TEST_GATEWAY_PREFIX);

    TestVault {
        vault,
        store,
        gateway,
        balances,
    }
}
