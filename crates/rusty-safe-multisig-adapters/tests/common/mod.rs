#![allow(dead_code)]

use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

pub const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn owner_signer() -> PrivateKeySigner {
    OWNER_KEY.parse().expect("valid test key")
}

pub fn owner_address() -> Address {
    owner_signer().address()
}

pub fn safe_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid safe address")
}

type Handler = dyn Fn(&str, &Value) -> Result<Value, String> + Send + Sync;

/// JSON-RPC server answering through `handler`; `Err` becomes a JSON-RPC error object.
pub struct MockNode {
    pub url: String,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockNode {
    pub fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("start server");
        let url = format!("http://{}", server.server_addr());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let handler: Arc<Handler> = Arc::new(handler);

        thread::spawn(move || {
            for mut req in server.incoming_requests() {
                let mut body = String::new();
                if req.as_reader().read_to_string(&mut body).is_err() {
                    continue;
                }
                let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                let method = payload["method"].as_str().unwrap_or_default().to_owned();
                let params = payload["params"].clone();
                recorded
                    .lock()
                    .expect("calls lock")
                    .push((method.clone(), params.clone()));

                let reply = match handler(&method, &params) {
                    Ok(result) => json!({"jsonrpc": "2.0", "id": payload["id"], "result": result}),
                    Err(message) => json!({
                        "jsonrpc": "2.0",
                        "id": payload["id"],
                        "error": {"code": -32000, "message": message}
                    }),
                };
                let _ = req.respond(
                    Response::from_string(reply.to_string()).with_status_code(StatusCode(200)),
                );
            }
        });

        Self { url, calls }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p)
    }
}

/// Unique path under the system temp dir; the file itself is not created.
pub fn temp_store_path(label: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "rusty-safe-multisig-{label}-{}-{n}.json",
        std::process::id()
    ))
}
