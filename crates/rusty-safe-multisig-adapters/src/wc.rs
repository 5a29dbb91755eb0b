use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rusty_safe_multisig_core::{PortError, RequestResponder, SessionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Approved,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub topic: String,
    pub account: Address,
    pub chain_id: u64,
    pub dapp_name: String,
    pub status: SessionStatus,
}

/// A response the relay still has to deliver to the dApp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutgoingResponse {
    Result {
        topic: String,
        id: String,
        result: Value,
    },
    Error {
        topic: String,
        id: String,
        code: i64,
        message: String,
    },
}

/// Session bookkeeping for a WalletConnect-style relay.
///
/// Requests arrive through [`WalletConnectAdapter::receive`] and leave through the
/// [`RequestResponder`] impl, which queues the response for the relay. Responding to a
/// request whose session is gone fails with the relay's "No matching key" wording so
/// the engine treats it as stale.
#[derive(Debug, Clone, Default)]
pub struct WalletConnectAdapter {
    inner: Arc<Mutex<WalletConnectState>>,
}

#[derive(Debug, Default)]
struct WalletConnectState {
    sessions: HashMap<String, Session>,
    requests: HashMap<String, String>,
    outbox: Vec<OutgoingResponse>,
}

impl WalletConnectAdapter {
    fn lock(&self) -> Result<MutexGuard<'_, WalletConnectState>, PortError> {
        self.inner
            .lock()
            .map_err(|e| PortError::Transport(format!("wc lock poisoned: {e}")))
    }

    pub fn insert_session(&self, session: Session) -> Result<(), PortError> {
        let mut g = self.lock()?;
        tracing::info!(topic = %session.topic, dapp = %session.dapp_name, "session approved");
        g.sessions.insert(session.topic.clone(), session);
        Ok(())
    }

    /// Marks the session disconnected and forgets its pending requests.
    pub fn disconnect(&self, topic: &str) -> Result<(), PortError> {
        let mut g = self.lock()?;
        let session = g
            .sessions
            .get_mut(topic)
            .ok_or_else(|| PortError::NotFound(format!("wc session missing: {topic}")))?;
        session.status = SessionStatus::Disconnected;
        g.requests.retain(|_, t| t.as_str() != topic);
        tracing::info!(topic, "session disconnected");
        Ok(())
    }

    pub fn sessions(&self) -> Result<Vec<Session>, PortError> {
        Ok(self.lock()?.sessions.values().cloned().collect())
    }

    /// Registers an incoming request and returns it tagged with the session's chain.
    pub fn receive(
        &self,
        topic: &str,
        id: impl Into<String>,
        method: impl Into<String>,
        params: Value,
    ) -> Result<SessionRequest, PortError> {
        let mut g = self.lock()?;
        let session = g
            .sessions
            .get(topic)
            .filter(|s| s.status == SessionStatus::Approved)
            .ok_or_else(|| {
                PortError::NotFound(format!(
                    "No matching key. session topic doesn't exist: {topic}"
                ))
            })?;
        let request = SessionRequest {
            id: id.into(),
            method: method.into(),
            params,
            chain_id: session.chain_id,
            received_at_ms: None,
        };
        g.requests.insert(request.id.clone(), topic.to_owned());
        Ok(request)
    }

    pub fn pending_request_ids(&self) -> Result<Vec<String>, PortError> {
        Ok(self.lock()?.requests.keys().cloned().collect())
    }

    /// Hands queued responses to the relay.
    pub fn drain_responses(&self) -> Result<Vec<OutgoingResponse>, PortError> {
        Ok(std::mem::take(&mut self.lock()?.outbox))
    }

    fn respond<F>(&self, request_id: &str, build: F) -> Result<(), PortError>
    where
        F: FnOnce(String) -> OutgoingResponse,
    {
        let mut g = self.lock()?;
        let topic = g.requests.remove(request_id).ok_or_else(|| {
            PortError::NotFound(format!("Pending request not found for id {request_id}"))
        })?;
        let live = g
            .sessions
            .get(&topic)
            .is_some_and(|s| s.status == SessionStatus::Approved);
        if !live {
            return Err(PortError::NotFound(format!(
                "No matching key. session topic doesn't exist: {topic}"
            )));
        }
        g.outbox.push(build(topic));
        Ok(())
    }
}

impl RequestResponder for WalletConnectAdapter {
    fn approve(&self, request_id: &str, result: Value) -> Result<(), PortError> {
        self.respond(request_id, |topic| OutgoingResponse::Result {
            topic,
            id: request_id.to_owned(),
            result,
        })
    }

    fn reject(&self, request_id: &str, code: i64, message: &str) -> Result<(), PortError> {
        self.respond(request_id, |topic| OutgoingResponse::Error {
            topic,
            id: request_id.to_owned(),
            code,
            message: message.to_owned(),
        })
    }
}
