//! Scripted gateway shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use token_sdk::{GatewayMethod, RpcCall, SdkError, TokenClient, Transport};

/// Answers each method with a canned JSON response (default `{}`) and
/// records every call.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<GatewayMethod, Value>>,
    calls: Mutex<Vec<RpcCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        init_tracing();
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: GatewayMethod, response: Value) {
        self.responses.lock().unwrap().insert(method, response);
    }

    pub fn calls_to(&self, method: GatewayMethod) -> Vec<RpcCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    pub fn last_request(&self, method: GatewayMethod) -> Value {
        let call = self.calls_to(method).pop().expect("method was not called");
        serde_json::from_slice(&call.body).unwrap()
    }

    pub fn client(self: &Arc<Self>) -> TokenClient {
        TokenClient::builder()
            .dev_key("integration-dev-key")
            .with_transport(self.clone())
            .build()
            .unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedGateway {
    async fn unary(&self, call: RpcCall) -> Result<Vec<u8>, SdkError> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&call.method)
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        self.calls.lock().unwrap().push(call);
        Ok(serde_json::to_vec(&response)?)
    }
}

/// Route SDK logs to the test output; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Member record JSON as the gateway returns it.
pub fn member_json(member_id: &str, last_hash: &str) -> Value {
    serde_json::json!({"member": {"id": member_id, "last_hash": last_hash}})
}
