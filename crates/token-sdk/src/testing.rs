//! In-memory gateway used by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::channel::Channel;
use crate::error::{SdkError, StatusCode};
use crate::routes::GatewayMethod;
use crate::transport::{RpcCall, Transport};

/// Answers each method with a canned response (default `{}`) and records
/// every call.
#[derive(Default)]
pub(crate) struct MockGateway {
    responses: Mutex<HashMap<GatewayMethod, Result<Value, (StatusCode, String)>>>,
    calls: Mutex<Vec<RpcCall>>,
}

impl MockGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn channel(self: &Arc<Self>) -> Channel {
        Channel::new(self.clone(), vec![])
    }

    pub(crate) fn respond(&self, method: GatewayMethod, response: Value) {
        self.responses.lock().unwrap().insert(method, Ok(response));
    }

    pub(crate) fn fail(&self, method: GatewayMethod, code: StatusCode, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(method, Err((code, message.to_string())));
    }

    pub(crate) fn calls(&self) -> Vec<RpcCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, method: GatewayMethod) -> Vec<RpcCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    /// Body of the last call to `method`.
    pub(crate) fn request(&self, method: GatewayMethod) -> Value {
        let call = self
            .calls_to(method)
            .pop()
            .unwrap_or_else(|| panic!("no call to {method}"));
        serde_json::from_slice(&call.body).unwrap()
    }
}

#[async_trait]
impl Transport for MockGateway {
    async fn unary(&self, call: RpcCall) -> Result<Vec<u8>, SdkError> {
        let response = self.responses.lock().unwrap().get(&call.method).cloned();
        self.calls.lock().unwrap().push(call);
        match response {
            Some(Ok(value)) => Ok(serde_json::to_vec(&value)?),
            Some(Err((code, message))) => Err(SdkError::status(code, message)),
            None => Ok(b"{}".to_vec()),
        }
    }
}
