use alloy::primitives::{Address, B256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::digest::{safe_message_hashes, safe_tx_hashes, DigestContext};
use crate::domain::{QueueKey, SafeMessagePayload, SafeTransaction};
use crate::error::CoreError;
use crate::ports::KeyValueStore;
use crate::signatures::{Signature, SignatureSet, Signed};

pub type PendingTransaction = Signed<SafeTransaction>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMessage {
    pub message_hash: B256,
    pub data: SafeMessagePayload,
    #[serde(default)]
    pub signatures: SignatureSet,
}

impl PendingMessage {
    pub fn new(message_hash: B256, data: SafeMessagePayload) -> Self {
        Self {
            message_hash,
            data,
            signatures: SignatureSet::new(),
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.insert(signature);
        self
    }
}

/// `{transactions: [{data, signatures}]}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionBundle {
    pub transactions: Vec<PendingTransaction>,
}

/// `{message: {data, signatures}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBundle {
    pub message: PortableMessage,
}

/// Message as exchanged between signers. The hash is recomputed on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableMessage {
    pub data: SafeMessagePayload,
    #[serde(default)]
    pub signatures: SignatureSet,
}

/// `{signature: {signer, data, isContractSignature}, txHash | messageHash}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureShare {
    pub signature: Signature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_hash: Option<B256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    Transaction { nonce: u64 },
    Message { message_hash: B256 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub added: usize,
    pub merged: usize,
    pub replaced: usize,
    pub skipped: usize,
    /// Imported signatures dropped because they do not verify or do not name an owner.
    #[serde(default)]
    pub rejected_signatures: usize,
}

enum MergeOutcome {
    Added,
    Merged,
    Replaced,
}

impl MergeReport {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Added => self.added += 1,
            MergeOutcome::Merged => self.merged += 1,
            MergeOutcome::Replaced => self.replaced += 1,
        }
    }
}

/// Transactions and messages awaiting signatures, persisted per (account, chain).
///
/// Writes are read-modify-write against the key-value store with last-write-wins
/// semantics. Corrupt persisted state reads as empty.
pub struct PendingQueueStore<S> {
    store: S,
}

impl<S: KeyValueStore> PendingQueueStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transactions_key(key: &QueueKey) -> String {
        format!("safe-queue/v1/{}/{:#x}/transactions", key.chain_id, key.account)
    }

    pub fn messages_key(key: &QueueKey) -> String {
        format!("safe-queue/v1/{}/{:#x}/messages", key.chain_id, key.account)
    }

    /// Sorted by nonce, ascending.
    pub fn transactions(&self, key: &QueueKey) -> Result<Vec<PendingTransaction>, CoreError> {
        let mut list: Vec<PendingTransaction> = self.load_list(&Self::transactions_key(key))?;
        list.sort_by_key(|tx| tx.data.nonce);
        list.dedup_by_key(|tx| tx.data.nonce);
        Ok(list)
    }

    pub fn transaction(
        &self,
        key: &QueueKey,
        nonce: u64,
    ) -> Result<Option<PendingTransaction>, CoreError> {
        Ok(self
            .transactions(key)?
            .into_iter()
            .find(|tx| tx.data.nonce == nonce))
    }

    pub fn find_transaction(
        &self,
        key: &QueueKey,
        ctx: &DigestContext,
        safe_tx_hash: B256,
    ) -> Result<Option<PendingTransaction>, CoreError> {
        Ok(self
            .transactions(key)?
            .into_iter()
            .find(|tx| safe_tx_hashes(&tx.data, ctx).digest == safe_tx_hash))
    }

    /// Replaces any entry with the same nonce, else inserts in nonce order.
    pub fn upsert_transaction(
        &self,
        key: &QueueKey,
        tx: PendingTransaction,
    ) -> Result<(), CoreError> {
        let mut list = self.transactions(key)?;
        upsert_by_nonce(&mut list, tx);
        self.save_list(&Self::transactions_key(key), &list)
    }

    /// `Some(nonce)` removes that entry, `None` clears the queue. Returns how many were removed.
    pub fn remove_transaction(
        &self,
        key: &QueueKey,
        nonce: Option<u64>,
    ) -> Result<usize, CoreError> {
        let storage_key = Self::transactions_key(key);
        match nonce {
            None => {
                let removed = self.transactions(key)?.len();
                self.store
                    .delete(&storage_key)
                    .map_err(|e| CoreError::Persistence(e.to_string()))?;
                debug!(queue = %key, removed, "cleared transaction queue");
                Ok(removed)
            }
            Some(nonce) => {
                let mut list = self.transactions(key)?;
                let before = list.len();
                list.retain(|tx| tx.data.nonce != nonce);
                let removed = before - list.len();
                if removed > 0 {
                    self.save_list(&storage_key, &list)?;
                }
                Ok(removed)
            }
        }
    }

    /// Advisory only; the account's own nonce check is authoritative.
    pub fn next_available_nonce(&self, key: &QueueKey, on_chain_nonce: u64) -> Result<u64, CoreError> {
        let list = self.transactions(key)?;
        Ok(next_available_nonce(
            list.iter().map(|tx| tx.data.nonce),
            on_chain_nonce,
        ))
    }

    pub fn messages(&self, key: &QueueKey) -> Result<Vec<PendingMessage>, CoreError> {
        self.load_list(&Self::messages_key(key))
    }

    pub fn message(
        &self,
        key: &QueueKey,
        message_hash: B256,
    ) -> Result<Option<PendingMessage>, CoreError> {
        Ok(self
            .messages(key)?
            .into_iter()
            .find(|msg| msg.message_hash == message_hash))
    }

    pub fn upsert_message(&self, key: &QueueKey, msg: PendingMessage) -> Result<(), CoreError> {
        let mut list = self.messages(key)?;
        match list.iter_mut().find(|m| m.message_hash == msg.message_hash) {
            Some(slot) => *slot = msg,
            None => list.push(msg),
        }
        self.save_list(&Self::messages_key(key), &list)
    }

    pub fn remove_message(
        &self,
        key: &QueueKey,
        message_hash: Option<B256>,
    ) -> Result<usize, CoreError> {
        let storage_key = Self::messages_key(key);
        let mut list = self.messages(key)?;
        let before = list.len();
        match message_hash {
            None => {
                self.store
                    .delete(&storage_key)
                    .map_err(|e| CoreError::Persistence(e.to_string()))?;
                return Ok(before);
            }
            Some(hash) => list.retain(|m| m.message_hash != hash),
        }
        let removed = before - list.len();
        if removed > 0 {
            self.save_list(&storage_key, &list)?;
        }
        Ok(removed)
    }

    /// Merges a `{transactions: [...]}` blob (a bare array is accepted too).
    ///
    /// Same nonce and same transaction: signatures are unioned. Same nonce and a
    /// different transaction: the imported entry replaces the local one. Imported
    /// signatures must verify against the recomputed digest and name one of `owners`.
    pub fn import_transactions(
        &self,
        key: &QueueKey,
        ctx: &DigestContext,
        owners: &[Address],
        blob: &str,
    ) -> Result<MergeReport, CoreError> {
        let root: Value = serde_json::from_str(blob)
            .map_err(|e| CoreError::validation(format!("import is not JSON: {e}")))?;
        let entries = match root {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("transactions") {
                Some(Value::Array(items)) => items,
                _ => return Err(CoreError::validation("import has no 'transactions' array")),
            },
            _ => return Err(CoreError::validation("import must be an object or array")),
        };

        let mut report = MergeReport::default();
        let mut list = self.transactions(key)?;
        for entry in entries {
            let mut imported: PendingTransaction = match serde_json::from_value(entry) {
                Ok(tx) => tx,
                Err(e) => {
                    warn!(queue = %key, error = %e, "skipping malformed imported transaction");
                    report.skipped += 1;
                    continue;
                }
            };
            let digest = safe_tx_hashes(&imported.data, ctx).digest;
            imported.signatures =
                verified_signatures(key, &imported.signatures, digest, owners, &mut report);
            report.record(merge_transaction(&mut list, imported));
        }
        self.save_list(&Self::transactions_key(key), &list)?;
        debug!(queue = %key, ?report, "imported transactions");
        Ok(report)
    }

    pub fn export_transactions(
        &self,
        key: &QueueKey,
        nonces: Option<&[u64]>,
    ) -> Result<TransactionBundle, CoreError> {
        let transactions = self
            .transactions(key)?
            .into_iter()
            .filter(|tx| nonces.map_or(true, |n| n.contains(&tx.data.nonce)))
            .collect();
        Ok(TransactionBundle { transactions })
    }

    /// Merges a `{message: {...}}` blob. Same message: signatures unioned; otherwise inserted.
    /// Signatures are checked as in [`Self::import_transactions`].
    pub fn import_message(
        &self,
        key: &QueueKey,
        ctx: &DigestContext,
        owners: &[Address],
        blob: &str,
    ) -> Result<(B256, MergeReport), CoreError> {
        let mut bundle: MessageBundle = serde_json::from_str(blob)
            .map_err(|e| CoreError::validation(format!("malformed message import: {e}")))?;
        let hash = safe_message_hashes(&bundle.message.data, ctx)?.digest;
        let mut report = MergeReport::default();
        bundle.message.signatures =
            verified_signatures(key, &bundle.message.signatures, hash, owners, &mut report);
        let merged = match self.message(key, hash)? {
            Some(local) => {
                report.merged += 1;
                PendingMessage {
                    signatures: local.signatures.merge(&bundle.message.signatures),
                    ..local
                }
            }
            None => {
                report.added += 1;
                PendingMessage {
                    message_hash: hash,
                    data: bundle.message.data,
                    signatures: bundle.message.signatures,
                }
            }
        };
        self.upsert_message(key, merged)?;
        Ok((hash, report))
    }

    pub fn export_message(
        &self,
        key: &QueueKey,
        message_hash: B256,
    ) -> Result<MessageBundle, CoreError> {
        let msg = self
            .message(key, message_hash)?
            .ok_or_else(|| CoreError::NotFound(format!("message {message_hash}")))?;
        Ok(MessageBundle {
            message: PortableMessage {
                data: msg.data,
                signatures: msg.signatures,
            },
        })
    }

    /// Adds a single shared signature to the entity it names, after verifying it.
    pub fn apply_share(
        &self,
        key: &QueueKey,
        ctx: &DigestContext,
        share: &SignatureShare,
    ) -> Result<ShareTarget, CoreError> {
        match (share.tx_hash, share.message_hash) {
            (Some(tx_hash), None) => {
                let tx = self
                    .find_transaction(key, ctx, tx_hash)?
                    .ok_or_else(|| CoreError::NotFound(format!("transaction {tx_hash}")))?;
                share.signature.verify(tx_hash)?;
                let nonce = tx.data.nonce;
                self.upsert_transaction(key, tx.with_signature(share.signature.clone()))?;
                Ok(ShareTarget::Transaction { nonce })
            }
            (None, Some(message_hash)) => {
                let msg = self
                    .message(key, message_hash)?
                    .ok_or_else(|| CoreError::NotFound(format!("message {message_hash}")))?;
                share.signature.verify(message_hash)?;
                self.upsert_message(key, msg.with_signature(share.signature.clone()))?;
                Ok(ShareTarget::Message { message_hash })
            }
            _ => Err(CoreError::validation(
                "signature share must name exactly one of txHash or messageHash",
            )),
        }
    }

    fn load_list<T: DeserializeOwned>(&self, storage_key: &str) -> Result<Vec<T>, CoreError> {
        let raw = self
            .store
            .get(storage_key)
            .map_err(|e| CoreError::Persistence(e.to_string()))?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                warn!(key = storage_key, "persisted queue is corrupt, treating as empty");
                return Ok(Vec::new());
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value(item) {
                Ok(entity) => out.push(entity),
                Err(e) => warn!(key = storage_key, error = %e, "dropping corrupt queue entry"),
            }
        }
        Ok(out)
    }

    fn save_list<T: Serialize>(&self, storage_key: &str, list: &[T]) -> Result<(), CoreError> {
        let raw = serde_json::to_string(list)
            .map_err(|e| CoreError::Persistence(format!("serialize queue: {e}")))?;
        self.store
            .set(storage_key, &raw)
            .map_err(|e| CoreError::Persistence(e.to_string()))?;
        debug!(key = storage_key, entries = list.len(), "persisted queue");
        Ok(())
    }
}

pub fn next_available_nonce(queued: impl IntoIterator<Item = u64>, on_chain_nonce: u64) -> u64 {
    match queued.into_iter().max() {
        Some(max) => max.saturating_add(1).max(on_chain_nonce),
        None => on_chain_nonce,
    }
}

fn verified_signatures(
    key: &QueueKey,
    signatures: &SignatureSet,
    digest: B256,
    owners: &[Address],
    report: &mut MergeReport,
) -> SignatureSet {
    signatures
        .iter()
        .filter(|sig| {
            let checked = if owners.contains(&sig.signer) {
                sig.verify(digest)
            } else {
                Err(CoreError::validation(format!("{} is not an owner", sig.signer)))
            };
            match checked {
                Ok(()) => true,
                Err(e) => {
                    warn!(queue = %key, signer = %sig.signer, error = %e, "dropping imported signature");
                    report.rejected_signatures += 1;
                    false
                }
            }
        })
        .cloned()
        .collect()
}

fn upsert_by_nonce(list: &mut Vec<PendingTransaction>, tx: PendingTransaction) {
    match list.binary_search_by_key(&tx.data.nonce, |t| t.data.nonce) {
        Ok(idx) => list[idx] = tx,
        Err(idx) => list.insert(idx, tx),
    }
}

fn merge_transaction(list: &mut Vec<PendingTransaction>, imported: PendingTransaction) -> MergeOutcome {
    match list.binary_search_by_key(&imported.data.nonce, |t| t.data.nonce) {
        Ok(idx) if list[idx].data == imported.data => {
            list[idx] = list[idx].merge(&imported);
            MergeOutcome::Merged
        }
        Ok(idx) => {
            list[idx] = imported;
            MergeOutcome::Replaced
        }
        Err(idx) => {
            list.insert(idx, imported);
            MergeOutcome::Added
        }
    }
}
