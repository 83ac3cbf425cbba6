// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault Orchestrator
//!
//! Ties the content store, the encryption gateway and the auth signer
//! together into two workflows.
//!
//! ## Submit
//!
//! 1. Upload the bytes, obtaining a fresh content locator
//! 2. Build the resource string (`gateway prefix + locator`)
//! 3. Sign a fresh auth assertion
//! 4. Encrypt the resource under the access policy
//! 5. Append (ciphertext, key handle) to the ledger
//!
//! Any failure or cancellation before step 5 leaves the ledger untouched.
//!
//! ## Decrypt
//!
//! Every record is decrypted concurrently with one shared auth assertion and
//! results are returned in record order. By default the batch is
//! all-or-nothing: once every call has settled, the error of the lowest
//! failing index is returned. [`Vault::decrypt_all_settled`] returns one
//! result per record instead.

pub mod error;
pub mod ledger;

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::AuthSigner;
use crate::gateway::{EncryptionGateway, GatewayError, KeyHandle};
use crate::policy::AccessPolicy;
use crate::storage::{ContentCache, ContentLocator, ContentStore};

pub use error::VaultError;
pub use ledger::{RecordLedger, RecordMeta, RecordSummary};

/// Default prefix joined with a locator to form the encrypted resource.
pub const DEFAULT_GATEWAY_PREFIX: &str = "https://ipfs.infura.io/ipfs/";

const DEFAULT_CHAIN: &str = "ethereum";

/// A record accepted by [`Vault::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRecord {
    pub index: usize,
    pub id: Uuid,
    pub locator: ContentLocator,
    pub key_handle: KeyHandle,
    pub ciphertext_bytes: usize,
}

/// Plaintext recovered from one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedOutput {
    pub index: usize,
    pub plaintext: String,
    /// Locator parsed back out of `plaintext`, if it is a gateway URL.
    pub locator: Option<ContentLocator>,
}

/// Outcome of a decrypt batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptBatch {
    /// Nothing has been submitted yet.
    Empty,
    Decrypted(Vec<DecryptedOutput>),
}

pub struct Vault {
    store: Arc<dyn ContentStore>,
    gateway: Arc<dyn EncryptionGateway>,
    signer: Arc<dyn AuthSigner>,
    policy: AccessPolicy,
    chain: String,
    gateway_prefix: String,
    cache: ContentCache,
    ledger: RwLock<RecordLedger>,
}

impl Vault {
    pub fn new(
        store: Arc<dyn ContentStore>,
        gateway: Arc<dyn EncryptionGateway>,
        signer: Arc<dyn AuthSigner>,
        policy: AccessPolicy,
    ) -> Self {
        let chain = policy.chain().unwrap_or(DEFAULT_CHAIN).to_string();
        Self {
            store,
            gateway,
            signer,
            policy,
            chain,
            gateway_prefix: DEFAULT_GATEWAY_PREFIX.to_string(),
            cache: ContentCache::default(),
            ledger: RwLock::new(RecordLedger::new()),
        }
    }

    pub fn with_gateway_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.gateway_prefix = prefix.into();
        self
    }

    pub fn with_cache(mut self, cache: ContentCache) -> Self {
        self.cache = cache;
        self
    }

    /// Chain auth assertions are signed for.
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn gateway(&self) -> &Arc<dyn EncryptionGateway> {
        &self.gateway
    }

    pub fn gateway_prefix(&self) -> &str {
        &self.gateway_prefix
    }

    /// Upload and encrypt `bytes` under the configured policy.
    pub async fn submit(&self, bytes: Bytes) -> Result<SubmittedRecord, VaultError> {
        self.submit_with(bytes, &self.policy, &CancellationToken::new())
            .await
    }

    pub async fn submit_with(
        &self,
        bytes: Bytes,
        policy: &AccessPolicy,
        cancel: &CancellationToken,
    ) -> Result<SubmittedRecord, VaultError> {
        let size = bytes.len();

        let locator = cancellable(cancel, self.store.add(bytes))
            .await?
            .inspect_err(|e| warn!(error = %e, bytes = size, "Upload failed"))?;

        let resource = locator.gateway_url(&self.gateway_prefix);

        let auth_sig = cancellable(cancel, self.signer.sign_auth_message(&self.chain)).await??;

        let encrypted = cancellable(
            cancel,
            self.gateway.encrypt_string(&resource, policy, &auth_sig),
        )
        .await?
        .map_err(VaultError::from_encrypt)
        .inspect_err(|e| warn!(error = %e, locator = %locator, "Encryption failed"))?;

        let mut ledger = self.ledger.write().await;
        if cancel.is_cancelled() {
            debug!(locator = %locator, "Submission cancelled before append");
            return Err(VaultError::Cancelled);
        }

        let ciphertext_bytes = encrypted.encrypted_file.len();
        let key_handle = encrypted.encrypted_symmetric_key;
        let (index, meta) = ledger.append(encrypted.encrypted_file, key_handle.clone());
        drop(ledger);

        info!(
            index,
            record_id = %meta.id,
            locator = %locator,
            ciphertext_bytes,
            "Record submitted"
        );

        Ok(SubmittedRecord {
            index,
            id: meta.id,
            locator,
            key_handle,
            ciphertext_bytes,
        })
    }

    /// Decrypt every record, failing the whole batch if any record fails.
    pub async fn decrypt_all(&self) -> Result<DecryptBatch, VaultError> {
        self.decrypt_all_with(&self.policy, &CancellationToken::new())
            .await
    }

    pub async fn decrypt_all_with(
        &self,
        policy: &AccessPolicy,
        cancel: &CancellationToken,
    ) -> Result<DecryptBatch, VaultError> {
        let Some(results) = self.fan_out(policy, cancel).await? else {
            return Ok(DecryptBatch::Empty);
        };

        let mut outputs = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    warn!(error = %e, "Decrypt batch failed");
                    return Err(e);
                }
            }
        }

        info!(records = outputs.len(), "Decrypt batch completed");
        Ok(DecryptBatch::Decrypted(outputs))
    }

    /// Decrypt every record, reporting each record's outcome separately.
    ///
    /// Returns an empty vector when nothing has been submitted.
    pub async fn decrypt_all_settled(
        &self,
        policy: &AccessPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<DecryptedOutput, VaultError>>, VaultError> {
        let results = self.fan_out(policy, cancel).await?.unwrap_or_default();
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(records = results.len(), failed, "Settled decrypt batch completed");
        Ok(results)
    }

    /// One concurrent gateway call per record; `None` when there are no records.
    async fn fan_out(
        &self,
        policy: &AccessPolicy,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Result<DecryptedOutput, VaultError>>>, VaultError> {
        let pairs = self.ledger.read().await.pairs()?;
        if pairs.is_empty() {
            return Ok(None);
        }

        let auth_sig = Arc::new(
            cancellable(cancel, self.signer.sign_auth_message(&self.chain)).await??,
        );
        let policy = Arc::new(policy.clone());

        let mut tasks = JoinSet::new();
        for (index, (ciphertext, key_handle)) in pairs.into_iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let auth_sig = Arc::clone(&auth_sig);
            let policy = Arc::clone(&policy);
            tasks.spawn(async move {
                let result = gateway
                    .decrypt_string(&ciphertext, &key_handle, &policy, &auth_sig)
                    .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<String, GatewayError>>> = vec![None; tasks.len()];
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    debug!("Decrypt batch cancelled");
                    return Err(VaultError::Cancelled);
                }
                next = tasks.join_next() => next,
            };

            match next {
                Some(Ok((index, result))) => {
                    debug!(index, ok = result.is_ok(), "Record decrypt settled");
                    slots[index] = Some(result);
                }
                Some(Err(e)) => warn!(error = %e, "Decrypt task did not complete"),
                None => break,
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(Ok(plaintext)) => Ok(DecryptedOutput {
                    index,
                    locator: ContentLocator::from_gateway_url(&plaintext, &self.gateway_prefix)
                        .ok(),
                    plaintext,
                }),
                Some(Err(e)) => Err(VaultError::from_decrypt(index, e)),
                None => Err(VaultError::Decryption {
                    index,
                    reason: "decrypt task did not complete".to_string(),
                }),
            })
            .collect();

        Ok(Some(results))
    }

    /// Content behind `locator`, served from the cache when possible.
    pub async fn fetch_content(&self, locator: &ContentLocator) -> Result<Bytes, VaultError> {
        if let Some(content) = self.cache.get(locator) {
            debug!(locator = %locator, "Content cache hit");
            return Ok(content);
        }

        let content = self.store.get(locator).await?;
        self.cache.put(locator.clone(), content.clone());
        Ok(content)
    }

    pub async fn records(&self) -> Result<Vec<RecordSummary>, VaultError> {
        self.ledger.read().await.summaries()
    }

    pub async fn len(&self) -> Result<usize, VaultError> {
        self.ledger.read().await.len()
    }

    pub async fn is_empty(&self) -> Result<bool, VaultError> {
        Ok(self.len().await? == 0)
    }

    #[cfg(test)]
    pub(crate) async fn corrupt_ledger_for_test(&self) {
        self.ledger
            .write()
            .await
            .push_orphan_ciphertext(Bytes::from_static(b"orphan"));
    }
}

/// Race `fut` against `cancel`; cancellation wins ties.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, VaultError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(VaultError::Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use alloy::primitives::U256;

    use crate::storage::{MemoryContentStore, StorageError};
    use crate::testing::{
        local_vault, local_vault_with_store, test_address, StaticBalances, TEST_GATEWAY_PREFIX,
    };

    fn file(body: &'static str) -> Bytes {
        Bytes::from_static(body.as_bytes())
    }

    fn expect_outputs(batch: DecryptBatch) -> Vec<DecryptedOutput> {
        match batch {
            DecryptBatch::Decrypted(outputs) => outputs,
            DecryptBatch::Empty => panic!("expected decrypted outputs"),
        }
    }

    #[tokio::test]
    async fn submit_appends_one_pair() {
        let t = local_vault(StaticBalances::rich_test_account()).await;

        let record = t.vault.submit(file("file A")).await.unwrap();

        assert_eq!(record.index, 0);
        assert_eq!(record.locator, MemoryContentStore::locator_for(b"file A"));
        assert_eq!(t.vault.len().await.unwrap(), 1);
        assert_eq!(t.store.get(&record.locator).await.unwrap(), file("file A"));
    }

    #[tokio::test]
    async fn fresh_locator_is_what_gets_encrypted() {
        let t = local_vault(StaticBalances::rich_test_account()).await;

        let a = t.vault.submit(file("file A")).await.unwrap();
        let b = t.vault.submit(file("file B")).await.unwrap();

        assert_eq!(
            t.gateway.encrypted_plaintexts(),
            vec![
                format!("{TEST_GATEWAY_PREFIX}{}", a.locator),
                format!("{TEST_GATEWAY_PREFIX}{}", b.locator),
            ]
        );
    }

    #[tokio::test]
    async fn second_submission_leaves_first_record_unchanged() {
        let t = local_vault(StaticBalances::rich_test_account()).await;

        let a = t.vault.submit(file("file A")).await.unwrap();
        let before = t.vault.records().await.unwrap();

        let b = t.vault.submit(file("file B")).await.unwrap();
        let after = t.vault.records().await.unwrap();

        assert_eq!(after.len(), 2);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1].key_handle, b.key_handle);

        let outputs = expect_outputs(t.vault.decrypt_all().await.unwrap());
        assert_eq!(outputs[0].locator.as_ref(), Some(&a.locator));
        assert_eq!(outputs[1].locator.as_ref(), Some(&b.locator));
    }

    #[tokio::test]
    async fn round_trip_recovers_each_locator_in_order() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let submitted = vec![
            t.vault.submit(file("r0")).await.unwrap(),
            t.vault.submit(file("r1")).await.unwrap(),
            t.vault.submit(file("r2")).await.unwrap(),
        ];

        let outputs = expect_outputs(t.vault.decrypt_all().await.unwrap());

        assert_eq!(outputs.len(), 3);
        for (output, record) in outputs.iter().zip(&submitted) {
            assert_eq!(output.index, record.index);
            assert_eq!(output.locator.as_ref(), Some(&record.locator));
            assert_eq!(output.plaintext, record.locator.gateway_url(TEST_GATEWAY_PREFIX));
        }
    }

    #[tokio::test]
    async fn decrypt_is_idempotent() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        t.vault.submit(file("image")).await.unwrap();

        let first = t.vault.decrypt_all().await.unwrap();
        let second = t.vault.decrypt_all().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn output_order_ignores_completion_order() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let mut handles = Vec::new();
        for body in ["r0", "r1", "r2"] {
            handles.push(t.vault.submit(file(body)).await.unwrap().key_handle);
        }

        // Reversed latency: r0 finishes last.
        t.gateway.delay_decrypt(&handles[0], Duration::from_millis(150));
        t.gateway.delay_decrypt(&handles[1], Duration::from_millis(75));
        t.gateway.delay_decrypt(&handles[2], Duration::ZERO);

        let outputs = expect_outputs(t.vault.decrypt_all().await.unwrap());

        let completed = t.gateway.completion_order();
        assert_eq!(
            completed,
            vec![handles[2].clone(), handles[1].clone(), handles[0].clone()]
        );
        let indices: Vec<usize> = outputs.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            outputs[0].locator,
            Some(MemoryContentStore::locator_for(b"r0"))
        );
    }

    #[tokio::test]
    async fn empty_ledger_yields_empty_state() {
        let t = local_vault(StaticBalances::rich_test_account()).await;

        assert_eq!(t.vault.decrypt_all().await.unwrap(), DecryptBatch::Empty);
        let settled = t
            .vault
            .decrypt_all_settled(t.vault.policy(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(settled.is_empty());
    }

    #[tokio::test]
    async fn policy_denial_on_encrypt_does_not_append() {
        let t = local_vault(StaticBalances::new().with_native(test_address(), U256::from(1u64))).await;

        let err = t.vault.submit(file("file A")).await.unwrap_err();

        assert!(matches!(err, VaultError::PolicyDenied(_)));
        assert_eq!(t.vault.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn policy_denial_on_decrypt_is_surfaced() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        t.vault.submit(file("file A")).await.unwrap();

        t.balances.set_native(test_address(), U256::ZERO);

        let err = t.vault.decrypt_all().await.unwrap_err();
        assert!(matches!(err, VaultError::PolicyDenied(_)));
        assert_eq!(t.vault.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn storage_timeout_does_not_append() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        t.store.set_unavailable(true);

        let err = t.vault.submit(file("file A")).await.unwrap_err();

        assert!(matches!(err, VaultError::Storage(StorageError::Timeout)));
        assert_eq!(t.vault.len().await.unwrap(), 0);
        assert!(t.gateway.encrypted_plaintexts().is_empty());
    }

    #[tokio::test]
    async fn concurrent_submissions_keep_pairs_aligned() {
        let t = local_vault_with_store(
            StaticBalances::rich_test_account(),
            MemoryContentStore::new().with_latency(Duration::from_millis(5)),
        )
        .await;
        let vault = Arc::new(t.vault);

        let mut tasks = JoinSet::new();
        for i in 0..16 {
            let vault = Arc::clone(&vault);
            tasks.spawn(async move { vault.submit(Bytes::from(format!("file {i}"))).await });
        }
        let mut submitted = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            submitted.push(joined.unwrap().unwrap());
        }
        submitted.sort_by_key(|record| record.index);

        assert_eq!(vault.len().await.unwrap(), 16);

        let outputs = expect_outputs(vault.decrypt_all().await.unwrap());
        assert_eq!(outputs.len(), submitted.len());
        for (record, output) in submitted.iter().zip(&outputs) {
            assert_eq!(output.index, record.index);
            assert_eq!(output.locator.as_ref(), Some(&record.locator));
        }
    }

    #[tokio::test]
    async fn all_or_nothing_reports_lowest_failing_index() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let mut handles = Vec::new();
        for body in ["r0", "r1", "r2"] {
            handles.push(t.vault.submit(file(body)).await.unwrap().key_handle);
        }
        t.gateway.fail_decrypt(&handles[1]);
        t.gateway.fail_decrypt(&handles[2]);
        // Index 2 fails first; index 1 must still be the one reported.
        t.gateway.delay_decrypt(&handles[1], Duration::from_millis(50));

        let err = t.vault.decrypt_all().await.unwrap_err();
        assert!(matches!(err, VaultError::Decryption { index: 1, .. }));
        assert_eq!(t.gateway.completion_order().len(), 3);
    }

    #[tokio::test]
    async fn settled_mode_reports_each_record() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let mut handles = Vec::new();
        for body in ["r0", "r1"] {
            handles.push(t.vault.submit(file(body)).await.unwrap().key_handle);
        }
        t.gateway.fail_decrypt(&handles[0]);

        let results = t
            .vault
            .decrypt_all_settled(t.vault.policy(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(results[0], Err(VaultError::Decryption { index: 0, .. })));
        assert_eq!(
            results[1].as_ref().unwrap().locator,
            Some(MemoryContentStore::locator_for(b"r1"))
        );
    }

    #[tokio::test]
    async fn cancelled_submission_discards_its_work() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        t.gateway.set_encrypt_delay(Duration::from_secs(5));
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = t
            .vault
            .submit_with(file("file A"), t.vault.policy(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::Cancelled));
        assert_eq!(t.vault.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cancelled_batch_leaves_ledger_intact() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let handle = t.vault.submit(file("slow")).await.unwrap().key_handle;
        t.gateway.delay_decrypt(&handle, Duration::from_secs(5));

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = t
            .vault
            .decrypt_all_with(t.vault.policy(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::Cancelled));
        assert_eq!(t.vault.len().await.unwrap(), 1);
        assert!(t.gateway.completion_order().is_empty());
    }

    #[tokio::test]
    async fn per_call_policy_is_honored() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let strict = AccessPolicy::single(crate::policy::AccessCondition::native_balance(
            "ethereum",
            crate::policy::Comparator::Gte,
            "1000000000000000000000",
        ))
        .unwrap();

        let err = t
            .vault
            .submit_with(file("file A"), &strict, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::PolicyDenied(_)));
    }

    #[tokio::test]
    async fn invariant_violation_is_detected() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        t.vault.submit(file("file A")).await.unwrap();
        t.vault.corrupt_ledger_for_test().await;

        assert!(matches!(
            t.vault.decrypt_all().await,
            Err(VaultError::StateInvariant { .. })
        ));
        assert!(t.vault.records().await.is_err());
    }

    #[tokio::test]
    async fn fetch_content_reads_through_cache() {
        let t = local_vault(StaticBalances::rich_test_account()).await;
        let record = t.vault.submit(file("picture")).await.unwrap();

        assert_eq!(t.vault.fetch_content(&record.locator).await.unwrap(), file("picture"));

        t.store.set_unavailable(true);
        assert_eq!(t.vault.fetch_content(&record.locator).await.unwrap(), file("picture"));

        let missing = ContentLocator::parse("QmMissing").unwrap();
        assert!(matches!(
            t.vault.fetch_content(&missing).await,
            Err(VaultError::Storage(StorageError::Timeout))
        ));
    }
}
