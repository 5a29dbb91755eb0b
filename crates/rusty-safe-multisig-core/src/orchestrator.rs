use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use serde_json::Value;

use crate::account::AccountStateReader;
use crate::builder::{build_transaction, TransactionDraft};
use crate::contracts::{ContractSet, ISafe};
use crate::deployment::{DeploymentExecution, DeploymentOrchestrator};
use crate::digest::{safe_message_hashes, safe_tx_hashes, DigestContext};
use crate::domain::{AccountState, QueueKey, SafeMessagePayload, SafeTransaction};
use crate::error::{ConflictWarning, CoreError};
use crate::ports::{
    AbiPort, AccountRegistry, ChainReader, ClockPort, KeyValueStore, PortError, RequestResponder,
    SigningProvider,
};
use crate::queue::{
    MergeReport, PendingMessage, PendingQueueStore, PendingTransaction, ShareTarget,
    SignatureShare,
};
use crate::requests::{
    is_expired, is_stale_session_error, message_response, parse_request, transaction_response,
    RequestIntent, RequestRejection, SessionRequest,
};
use crate::signatures::{Signature, Signed};

#[derive(Debug, Clone)]
pub enum SigningCommand {
    CreateTransaction {
        key: QueueKey,
        draft: TransactionDraft,
        nonce: Option<u64>,
    },
    AddTransactionSignature {
        key: QueueKey,
        nonce: u64,
        signature: Signature,
    },
    SignTransaction {
        key: QueueKey,
        nonce: u64,
    },
    ExecuteTransaction {
        key: QueueKey,
        nonce: u64,
    },
    DeleteTransaction {
        key: QueueKey,
        nonce: Option<u64>,
    },
    CreateMessage {
        key: QueueKey,
        payload: SafeMessagePayload,
    },
    AddMessageSignature {
        key: QueueKey,
        message_hash: B256,
        signature: Signature,
    },
    SignMessage {
        key: QueueKey,
        message_hash: B256,
    },
    DeleteMessage {
        key: QueueKey,
        message_hash: Option<B256>,
    },
    HandleRequest {
        key: QueueKey,
        request: SessionRequest,
    },
    ApproveRequest {
        request_id: String,
    },
    RejectRequest {
        request_id: String,
    },
    AbandonRequest {
        request_id: String,
    },
    ExpireRequests,
    ImportTransactions {
        key: QueueKey,
        blob: String,
    },
    ExportTransactions {
        key: QueueKey,
        nonces: Option<Vec<u64>>,
    },
    ImportMessage {
        key: QueueKey,
        blob: String,
    },
    ExportMessage {
        key: QueueKey,
        message_hash: B256,
    },
    ImportSignature {
        key: QueueKey,
        share: SignatureShare,
    },
    DeployAccount {
        key: QueueKey,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Pending,
    Approved,
    Rejected { code: i64, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub safe_tx_hash: Option<B256>,
    pub message_hash: Option<B256>,
    pub nonce: Option<u64>,
    pub threshold_met: Option<bool>,
    pub warnings: Vec<ConflictWarning>,
    pub merge: Option<MergeReport>,
    pub exported: Option<Value>,
    pub executed_tx_hash: Option<B256>,
    pub request: Option<RequestOutcome>,
    pub removed: Option<usize>,
    pub deployment: Option<DeploymentExecution>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub contracts: ContractSet,
    pub request_ttl_ms: u64,
    pub receipt_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            contracts: ContractSet::default(),
            request_ttl_ms: 5 * 60 * 1000,
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RequestTarget {
    Transaction { nonce: u64, safe_tx_hash: B256 },
    Message { message_hash: B256 },
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    key: QueueKey,
    target: RequestTarget,
    received_at_ms: u64,
}

pub struct Orchestrator<P, C, S, W, A, R, K>
where
    P: SigningProvider,
    C: ChainReader,
    S: KeyValueStore,
    W: RequestResponder,
    A: AbiPort,
    R: AccountRegistry,
    K: ClockPort,
{
    pub provider: P,
    pub chain: C,
    pub queue: PendingQueueStore<S>,
    pub responder: W,
    pub abi: A,
    pub registry: R,
    pub clock: K,
    pub config: OrchestratorConfig,
    requests: Mutex<HashMap<String, PendingRequest>>,
}

impl<P, C, S, W, A, R, K> Orchestrator<P, C, S, W, A, R, K>
where
    P: SigningProvider,
    C: ChainReader,
    S: KeyValueStore,
    W: RequestResponder,
    A: AbiPort,
    R: AccountRegistry,
    K: ClockPort,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: P,
        chain: C,
        store: S,
        responder: W,
        abi: A,
        registry: R,
        clock: K,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            chain,
            queue: PendingQueueStore::new(store),
            responder,
            abi,
            registry,
            clock,
            config,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub async fn handle(&self, command: SigningCommand) -> Result<CommandResult, CoreError> {
        match command {
            SigningCommand::CreateTransaction { key, draft, nonce } => {
                let state = self.account(&key).await?;
                let tx = build_transaction(&draft, &state, &self.config.contracts, &self.abi)?;
                self.queue_transaction(&key, &state, tx, nonce)
            }
            SigningCommand::AddTransactionSignature {
                key,
                nonce,
                signature,
            } => {
                let state = self.account(&key).await?;
                self.add_transaction_signature(&key, &state, nonce, signature)
            }
            SigningCommand::SignTransaction { key, nonce } => {
                let state = self.account(&key).await?;
                let tx = self.load_transaction(&key, nonce)?;
                let digest = safe_tx_hashes(&tx.data, &digest_context(&state)).digest;
                let signature = self.sign_with_provider(&key, &state, digest).await?;
                self.add_transaction_signature(&key, &state, nonce, signature)
            }
            SigningCommand::ExecuteTransaction { key, nonce } => {
                self.execute_transaction(&key, nonce).await
            }
            SigningCommand::DeleteTransaction { key, nonce } => {
                let removed = self.queue.remove_transaction(&key, nonce)?;
                Ok(CommandResult {
                    removed: Some(removed),
                    ..CommandResult::default()
                })
            }
            SigningCommand::CreateMessage { key, payload } => {
                let state = self.account(&key).await?;
                self.queue_message(&key, &state, payload)
            }
            SigningCommand::AddMessageSignature {
                key,
                message_hash,
                signature,
            } => {
                let state = self.account(&key).await?;
                self.add_message_signature(&key, &state, message_hash, signature)
            }
            SigningCommand::SignMessage { key, message_hash } => {
                let state = self.account(&key).await?;
                self.load_message(&key, message_hash)?;
                let signature = self.sign_with_provider(&key, &state, message_hash).await?;
                self.add_message_signature(&key, &state, message_hash, signature)
            }
            SigningCommand::DeleteMessage { key, message_hash } => {
                let removed = self.queue.remove_message(&key, message_hash)?;
                Ok(CommandResult {
                    removed: Some(removed),
                    ..CommandResult::default()
                })
            }
            SigningCommand::HandleRequest { key, request } => {
                self.handle_request(&key, request).await
            }
            SigningCommand::ApproveRequest { request_id } => {
                self.approve_request(&request_id).await
            }
            SigningCommand::RejectRequest { request_id } => {
                self.finish_request(&request_id, RequestRejection::user_rejected())
            }
            SigningCommand::AbandonRequest { request_id } => {
                self.finish_request(&request_id, RequestRejection::abandoned())
            }
            SigningCommand::ExpireRequests => self.expire_requests(),
            SigningCommand::ImportTransactions { key, blob } => {
                let state = self.account(&key).await?;
                let merge = self.queue.import_transactions(
                    &key,
                    &digest_context(&state),
                    &state.owners,
                    &blob,
                )?;
                Ok(CommandResult {
                    merge: Some(merge),
                    ..CommandResult::default()
                })
            }
            SigningCommand::ExportTransactions { key, nonces } => {
                let bundle = self.queue.export_transactions(&key, nonces.as_deref())?;
                Ok(CommandResult {
                    exported: Some(to_json(&bundle)?),
                    ..CommandResult::default()
                })
            }
            SigningCommand::ImportMessage { key, blob } => {
                let state = self.account(&key).await?;
                let (message_hash, merge) = self.queue.import_message(
                    &key,
                    &digest_context(&state),
                    &state.owners,
                    &blob,
                )?;
                Ok(CommandResult {
                    message_hash: Some(message_hash),
                    merge: Some(merge),
                    ..CommandResult::default()
                })
            }
            SigningCommand::ExportMessage { key, message_hash } => {
                let bundle = self.queue.export_message(&key, message_hash)?;
                Ok(CommandResult {
                    message_hash: Some(message_hash),
                    exported: Some(to_json(&bundle)?),
                    ..CommandResult::default()
                })
            }
            SigningCommand::ImportSignature { key, share } => {
                let state = self.account(&key).await?;
                ensure_owner(&state, share.signature.signer)?;
                match self.queue.apply_share(&key, &digest_context(&state), &share)? {
                    ShareTarget::Transaction { nonce } => {
                        let tx = self.load_transaction(&key, nonce)?;
                        Ok(CommandResult {
                            safe_tx_hash: share.tx_hash,
                            nonce: Some(nonce),
                            threshold_met: Some(tx.is_threshold_met(state.threshold)),
                            ..CommandResult::default()
                        })
                    }
                    ShareTarget::Message { message_hash } => {
                        let msg = self.load_message(&key, message_hash)?;
                        Ok(CommandResult {
                            message_hash: Some(message_hash),
                            threshold_met: Some(msg.signatures.is_threshold_met(state.threshold)),
                            ..CommandResult::default()
                        })
                    }
                }
            }
            SigningCommand::DeployAccount { key } => {
                let safe = self
                    .registry
                    .load_undeployed(key.chain_id, key.account)?
                    .ok_or_else(|| CoreError::NotFound(format!("undeployed account {key}")))?;
                let runner = DeploymentOrchestrator::new(
                    &self.chain,
                    &self.provider,
                    &self.registry,
                    self.config.contracts,
                    self.config.receipt_timeout,
                );
                let execution = runner.deploy(&safe).await?;
                Ok(CommandResult {
                    executed_tx_hash: execution.state.tx_hash(),
                    deployment: Some(execution),
                    ..CommandResult::default()
                })
            }
        }
    }

    pub async fn account(&self, key: &QueueKey) -> Result<AccountState, CoreError> {
        AccountStateReader::new(&self.chain, &self.registry)
            .read(key.chain_id, key.account)
            .await
    }

    fn queue_transaction(
        &self,
        key: &QueueKey,
        state: &AccountState,
        tx: SafeTransaction,
        nonce: Option<u64>,
    ) -> Result<CommandResult, CoreError> {
        let nonce = match nonce {
            Some(nonce) => nonce,
            None => self.queue.next_available_nonce(key, state.nonce)?,
        };
        let mut warnings = Vec::new();
        if nonce < state.nonce {
            warnings.push(ConflictWarning::NonceAlreadyExecuted {
                nonce,
                on_chain_nonce: state.nonce,
            });
        }
        if self.queue.transaction(key, nonce)?.is_some() {
            warnings.push(ConflictWarning::NonceAlreadyQueued { nonce });
        }
        for warning in &warnings {
            tracing::warn!(queue = %key, "{}", warning.message());
        }

        let tx = tx.with_nonce(nonce);
        let safe_tx_hash = safe_tx_hashes(&tx, &digest_context(state)).digest;
        self.queue.upsert_transaction(key, Signed::new(tx))?;
        tracing::info!(queue = %key, nonce, %safe_tx_hash, "queued transaction");
        Ok(CommandResult {
            safe_tx_hash: Some(safe_tx_hash),
            nonce: Some(nonce),
            threshold_met: Some(false),
            warnings,
            ..CommandResult::default()
        })
    }

    fn add_transaction_signature(
        &self,
        key: &QueueKey,
        state: &AccountState,
        nonce: u64,
        signature: Signature,
    ) -> Result<CommandResult, CoreError> {
        let tx = self.load_transaction(key, nonce)?;
        let safe_tx_hash = safe_tx_hashes(&tx.data, &digest_context(state)).digest;
        ensure_owner(state, signature.signer)?;
        signature.verify(safe_tx_hash)?;
        let signer = signature.signer;
        let tx = tx.with_signature(signature);
        let threshold_met = tx.is_threshold_met(state.threshold);
        self.queue.upsert_transaction(key, tx)?;
        tracing::info!(queue = %key, nonce, %signer, threshold_met, "added transaction signature");
        Ok(CommandResult {
            safe_tx_hash: Some(safe_tx_hash),
            nonce: Some(nonce),
            threshold_met: Some(threshold_met),
            ..CommandResult::default()
        })
    }

    async fn execute_transaction(&self, key: &QueueKey, nonce: u64) -> Result<CommandResult, CoreError> {
        let state = self.account(key).await?;
        if !state.deployed {
            return Err(CoreError::validation(format!("account {} is not deployed", key.account)));
        }
        let chain_id = self.provider.chain_id().await?;
        if chain_id != key.chain_id {
            return Err(CoreError::validation(format!(
                "signer is on chain {chain_id}, queue is for chain {}",
                key.chain_id
            )));
        }
        let tx = self.load_transaction(key, nonce)?;
        if tx.data.nonce != state.nonce {
            return Err(CoreError::validation(format!(
                "transaction nonce {nonce} is not the account nonce {}",
                state.nonce
            )));
        }
        let safe_tx_hash = safe_tx_hashes(&tx.data, &digest_context(&state)).digest;

        let executor = self.provider.address().await?;
        let mut signatures = tx.signatures.clone();
        if !signatures.is_threshold_met(state.threshold)
            && state.is_owner(executor)
            && !signatures.contains(executor)
        {
            signatures.insert(Signature::pre_validated(executor));
        }
        if !signatures.is_threshold_met(state.threshold) {
            return Err(CoreError::validation(format!(
                "{} of {} signatures collected",
                signatures.len(),
                state.threshold
            )));
        }

        let calldata = exec_transaction_calldata(&tx.data, signatures.encode());
        let tx_hash = self
            .provider
            .send_transaction(key.account, U256::ZERO, calldata)
            .await?;
        tracing::info!(queue = %key, nonce, %tx_hash, "execution broadcast");
        let receipt = self
            .chain
            .wait_for_receipt(tx_hash, self.config.receipt_timeout)
            .await?;
        if !receipt.success {
            return Err(CoreError::Chain(format!("execution {tx_hash} reverted")));
        }
        self.queue.remove_transaction(key, Some(nonce))?;
        Ok(CommandResult {
            safe_tx_hash: Some(safe_tx_hash),
            nonce: Some(nonce),
            threshold_met: Some(true),
            executed_tx_hash: Some(tx_hash),
            ..CommandResult::default()
        })
    }

    fn queue_message(
        &self,
        key: &QueueKey,
        state: &AccountState,
        payload: SafeMessagePayload,
    ) -> Result<CommandResult, CoreError> {
        let message_hash = safe_message_hashes(&payload, &digest_context(state))?.digest;
        let threshold_met = match self.queue.message(key, message_hash)? {
            Some(existing) => existing.signatures.is_threshold_met(state.threshold),
            None => {
                self.queue
                    .upsert_message(key, PendingMessage::new(message_hash, payload))?;
                tracing::info!(queue = %key, %message_hash, "queued message");
                false
            }
        };
        Ok(CommandResult {
            message_hash: Some(message_hash),
            threshold_met: Some(threshold_met),
            ..CommandResult::default()
        })
    }

    fn add_message_signature(
        &self,
        key: &QueueKey,
        state: &AccountState,
        message_hash: B256,
        signature: Signature,
    ) -> Result<CommandResult, CoreError> {
        let msg = self.load_message(key, message_hash)?;
        ensure_owner(state, signature.signer)?;
        signature.verify(message_hash)?;
        let msg = msg.with_signature(signature);
        let threshold_met = msg.signatures.is_threshold_met(state.threshold);
        self.queue.upsert_message(key, msg)?;
        Ok(CommandResult {
            message_hash: Some(message_hash),
            threshold_met: Some(threshold_met),
            ..CommandResult::default()
        })
    }

    async fn sign_with_provider(
        &self,
        key: &QueueKey,
        state: &AccountState,
        digest: B256,
    ) -> Result<Signature, CoreError> {
        let chain_id = self.provider.chain_id().await?;
        if chain_id != key.chain_id {
            return Err(CoreError::validation(format!(
                "signer is on chain {chain_id}, queue is for chain {}",
                key.chain_id
            )));
        }
        let signer = self.provider.address().await?;
        ensure_owner(state, signer)?;
        let raw = self.provider.sign_digest(digest).await?;
        Signature::eoa(signer, raw)
    }

    async fn handle_request(
        &self,
        key: &QueueKey,
        request: SessionRequest,
    ) -> Result<CommandResult, CoreError> {
        let now = self.clock.now_ms()?;
        let received_at_ms = request.received_at_ms.unwrap_or(now);
        if is_expired(received_at_ms, now, self.config.request_ttl_ms) {
            return self.respond_rejected(&request.id, RequestRejection::expired());
        }
        let intent = match parse_request(&request, key.account, key.chain_id) {
            Ok(intent) => intent,
            Err(rejection) => return self.respond_rejected(&request.id, rejection),
        };
        match self.route_request(key, &request, intent, received_at_ms).await {
            Ok(result) => Ok(result),
            Err(err) => {
                // The request is never registered, so this is its only response.
                let rejection = RequestRejection::internal(err.to_string());
                if let Err(reject_err) = self.respond_rejected(&request.id, rejection) {
                    tracing::warn!(request_id = %request.id, error = %reject_err, "could not reject unroutable request");
                }
                Err(err)
            }
        }
    }

    async fn route_request(
        &self,
        key: &QueueKey,
        request: &SessionRequest,
        intent: RequestIntent,
        received_at_ms: u64,
    ) -> Result<CommandResult, CoreError> {
        let state = self.account(key).await?;
        let (mut result, target) = match intent {
            RequestIntent::Transaction(tx) => {
                let result = self.queue_transaction(key, &state, tx, None)?;
                let target = RequestTarget::Transaction {
                    nonce: result.nonce.unwrap_or_default(),
                    safe_tx_hash: result.safe_tx_hash.unwrap_or_default(),
                };
                (result, target)
            }
            RequestIntent::Message { payload, .. } => {
                let result = self.queue_message(key, &state, payload)?;
                let target = RequestTarget::Message {
                    message_hash: result.message_hash.unwrap_or_default(),
                };
                (result, target)
            }
        };
        self.requests
            .lock()
            .map_err(|_| CoreError::Persistence("request table lock poisoned".to_owned()))?
            .insert(
                request.id.clone(),
                PendingRequest {
                    key: *key,
                    target,
                    received_at_ms,
                },
            );
        tracing::debug!(request_id = %request.id, method = %request.method, "request routed");
        result.request = Some(RequestOutcome::Pending);
        Ok(result)
    }

    async fn approve_request(&self, request_id: &str) -> Result<CommandResult, CoreError> {
        let pending = self.pending_request(request_id)?;
        let now = self.clock.now_ms()?;
        if is_expired(pending.received_at_ms, now, self.config.request_ttl_ms) {
            return self.finish_request(request_id, RequestRejection::expired());
        }
        let (response, mut result) = match pending.target {
            RequestTarget::Transaction {
                nonce,
                safe_tx_hash,
            } => (
                transaction_response(safe_tx_hash),
                CommandResult {
                    safe_tx_hash: Some(safe_tx_hash),
                    nonce: Some(nonce),
                    ..CommandResult::default()
                },
            ),
            RequestTarget::Message { message_hash } => {
                let state = self.account(&pending.key).await?;
                let msg = self.load_message(&pending.key, message_hash)?;
                if !msg.signatures.is_threshold_met(state.threshold) {
                    return Err(CoreError::validation(format!(
                        "{} of {} message signatures collected",
                        msg.signatures.len(),
                        state.threshold
                    )));
                }
                (
                    message_response(&msg.signatures.encode()),
                    CommandResult {
                        message_hash: Some(message_hash),
                        threshold_met: Some(true),
                        ..CommandResult::default()
                    },
                )
            }
        };
        let outcome = self.responder.approve(request_id, response);
        self.take_request(request_id)?;
        self.check_responder(request_id, outcome)?;
        result.request = Some(RequestOutcome::Approved);
        Ok(result)
    }

    fn finish_request(
        &self,
        request_id: &str,
        rejection: RequestRejection,
    ) -> Result<CommandResult, CoreError> {
        self.pending_request(request_id)?;
        self.take_request(request_id)?;
        self.respond_rejected(request_id, rejection)
    }

    fn expire_requests(&self) -> Result<CommandResult, CoreError> {
        let now = self.clock.now_ms()?;
        let expired: Vec<String> = self
            .requests
            .lock()
            .map_err(|_| CoreError::Persistence("request table lock poisoned".to_owned()))?
            .iter()
            .filter(|(_, p)| is_expired(p.received_at_ms, now, self.config.request_ttl_ms))
            .map(|(id, _)| id.clone())
            .collect();
        let mut removed = 0;
        for id in expired {
            self.take_request(&id)?;
            match self.respond_rejected(&id, RequestRejection::expired()) {
                Ok(_) | Err(CoreError::StaleRequest(_)) => removed += 1,
                Err(err) => return Err(err),
            }
        }
        Ok(CommandResult {
            removed: Some(removed),
            ..CommandResult::default()
        })
    }

    fn respond_rejected(
        &self,
        request_id: &str,
        rejection: RequestRejection,
    ) -> Result<CommandResult, CoreError> {
        let outcome = self
            .responder
            .reject(request_id, rejection.code, &rejection.message);
        self.check_responder(request_id, outcome)?;
        tracing::info!(request_id, code = rejection.code, message = %rejection.message, "request rejected");
        Ok(CommandResult {
            request: Some(RequestOutcome::Rejected {
                code: rejection.code,
                message: rejection.message,
            }),
            ..CommandResult::default()
        })
    }

    fn check_responder(&self, request_id: &str, outcome: Result<(), PortError>) -> Result<(), CoreError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if is_stale_session_error(&err.to_string()) => {
                tracing::warn!(request_id, error = %err, "request session is stale");
                Err(CoreError::StaleRequest(err.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn pending_request(&self, request_id: &str) -> Result<PendingRequest, CoreError> {
        self.requests
            .lock()
            .map_err(|_| CoreError::Persistence("request table lock poisoned".to_owned()))?
            .get(request_id)
            .copied()
            .ok_or_else(|| CoreError::NotFound(format!("request {request_id}")))
    }

    fn take_request(&self, request_id: &str) -> Result<(), CoreError> {
        self.requests
            .lock()
            .map_err(|_| CoreError::Persistence("request table lock poisoned".to_owned()))?
            .remove(request_id);
        Ok(())
    }

    fn load_transaction(&self, key: &QueueKey, nonce: u64) -> Result<PendingTransaction, CoreError> {
        self.queue
            .transaction(key, nonce)?
            .ok_or_else(|| CoreError::NotFound(format!("transaction with nonce {nonce} in {key}")))
    }

    fn load_message(&self, key: &QueueKey, message_hash: B256) -> Result<PendingMessage, CoreError> {
        self.queue
            .message(key, message_hash)?
            .ok_or_else(|| CoreError::NotFound(format!("message {message_hash} in {key}")))
    }
}

pub fn digest_context(state: &AccountState) -> DigestContext {
    DigestContext::new(state.chain_id, state.address, state.version.clone())
}

pub fn exec_transaction_calldata(tx: &SafeTransaction, signatures: Bytes) -> Bytes {
    ISafe::execTransactionCall {
        to: tx.to,
        value: tx.value,
        data: tx.data.clone(),
        operation: tx.operation.as_u8(),
        safeTxGas: tx.safe_tx_gas,
        baseGas: tx.base_gas,
        gasPrice: tx.gas_price,
        gasToken: tx.gas_token,
        refundReceiver: tx.refund_receiver,
        signatures,
    }
    .abi_encode()
    .into()
}

fn ensure_owner(state: &AccountState, signer: Address) -> Result<(), CoreError> {
    if !state.is_owner(signer) {
        return Err(CoreError::validation(format!(
            "{signer} is not an owner of {}",
            state.address
        )));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Persistence(format!("serialize export: {e}")))
}
