pub mod account;
pub mod builder;
pub mod contracts;
pub mod deployment;
pub mod digest;
pub mod domain;
pub mod error;
pub mod multisend;
pub mod orchestrator;
pub mod owners;
pub mod ports;
pub mod queue;
pub mod requests;
pub mod signatures;
pub mod state_machine;

pub use account::AccountStateReader;
pub use builder::{build_transaction, erc20_transfer, native_transfer, TransactionDraft};
pub use contracts::{ContractSet, SENTINEL_OWNERS};
pub use deployment::{
    deployment_call, encode_setup, init_code_hash, predict_address, predict_undeployed,
    DeploymentCall, DeploymentExecution, DeploymentOrchestrator,
};
pub use digest::{
    eip712_digest, message_inner_hash, safe_message_hashes, safe_tx_hashes, DigestContext,
    SafeHashes,
};
pub use domain::{
    parse_address, AccountState, Operation, QueueKey, SafeAccountConfig, SafeDeploymentConfig,
    SafeMessagePayload, SafeTransaction, SafeVersion, TypedDataPayload, UndeployedSafe,
};
pub use error::{ConflictWarning, CoreError};
pub use multisend::{
    decode_multisend, decode_multisend_calldata, encode_multisend, multisend_transaction,
    MultiSendCall,
};
pub use orchestrator::{
    digest_context, exec_transaction_calldata, CommandResult, Orchestrator, OrchestratorConfig,
    RequestOutcome, SigningCommand,
};
pub use owners::{plan_owner_changes, prev_owner, OwnerChange, OwnerOperation, OwnerPlan};
pub use ports::{
    AbiPort, AccountRegistry, ChainReader, ClockPort, KeyValueStore, PortError, ReceiptSummary,
    RequestResponder, SigningProvider,
};
pub use queue::{
    MergeReport, MessageBundle, PendingMessage, PendingQueueStore, PendingTransaction,
    PortableMessage, ShareTarget, SignatureShare, TransactionBundle,
};
pub use requests::{
    is_stale_session_error, parse_request, RequestIntent, RequestMethod, RequestRejection,
    SessionRequest,
};
pub use signatures::{Signature, SignatureSet, Signed};
pub use state_machine::{
    deployment_transition, DeploymentEvent, DeploymentPhase, DeploymentState, DeploymentStep,
    StateTransition, StepRecord, StepStatus,
};
