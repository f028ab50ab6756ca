//! Shared gateway channel.
//!
//! A [`Channel`] wraps a [`Transport`], adds the static headers every call
//! carries, and owns the lifecycle: once [`Channel::shutdown`] starts no
//! new call is accepted, and shutdown waits (bounded by
//! [`SHUTDOWN_TIMEOUT`]) for in-flight calls to finish.
//!
//! Channels are cheap to clone; clones share transport and lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::SdkError;
use crate::routes::GatewayMethod;
use crate::transport::{RpcCall, Transport};

/// How long [`Channel::shutdown`] waits for in-flight calls.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

struct ChannelState {
    closed: AtomicBool,
    in_flight: watch::Sender<usize>,
}

/// Decrements the in-flight count when the call ends, however it ends.
struct InFlight<'a>(&'a ChannelState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a ChannelState) -> Self {
        state.in_flight.send_modify(|n| *n += 1);
        InFlight(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.send_modify(|n| *n -= 1);
    }
}

/// Shared connection to the gateway.
#[derive(Clone)]
pub struct Channel {
    transport: Arc<dyn Transport>,
    headers: Arc<Vec<(String, String)>>,
    state: Arc<ChannelState>,
}

impl Channel {
    /// Channel over `transport`, sending `headers` on every call.
    pub fn new(transport: Arc<dyn Transport>, headers: Vec<(String, String)>) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            transport,
            headers: Arc::new(headers),
            state: Arc::new(ChannelState {
                closed: AtomicBool::new(false),
                in_flight,
            }),
        }
    }

    /// Whether shutdown has started.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        *self.state.in_flight.borrow()
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Serialize `request`, call `method` and decode the response.
    ///
    /// An empty response body decodes as `{}`.
    pub async fn call<Req, Resp>(
        &self,
        method: GatewayMethod,
        headers: Vec<(String, String)>,
        request: &Req,
    ) -> Result<Resp, SdkError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        decode(&self.unary(method, headers, body).await?)
    }

    /// Send a pre-serialized body.
    pub async fn unary(
        &self,
        method: GatewayMethod,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, SdkError> {
        if self.is_closed() {
            return Err(SdkError::ChannelClosed);
        }
        let _guard = InFlight::enter(&self.state);
        // Shutdown may have started between the check and the increment.
        if self.is_closed() {
            return Err(SdkError::ChannelClosed);
        }

        let mut all_headers = Vec::with_capacity(self.headers.len() + headers.len());
        all_headers.extend(self.headers.iter().cloned());
        all_headers.extend(headers);

        let started = Instant::now();
        let result = self
            .transport
            .unary(RpcCall {
                method,
                headers: all_headers,
                body,
            })
            .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(_) => debug!(%method, elapsed_ms, "gateway call succeeded"),
            Err(e) => debug!(%method, elapsed_ms, error = %e, "gateway call failed"),
        }
        result
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Refuse new calls and wait up to [`SHUTDOWN_TIMEOUT`] for in-flight
    /// calls. A timeout is logged, not returned.
    pub async fn shutdown(&self) {
        self.shutdown_within(SHUTDOWN_TIMEOUT).await;
    }

    /// Like [`shutdown`](Self::shutdown) with a custom bound. Returns
    /// whether every in-flight call finished in time.
    pub async fn shutdown_within(&self, timeout: Duration) -> bool {
        self.state.closed.store(true, Ordering::SeqCst);

        let mut in_flight = self.state.in_flight.subscribe();
        let drained = tokio::time::timeout(timeout, in_flight.wait_for(|n| *n == 0)).await;
        match drained {
            Ok(Ok(_)) => {
                debug!("gateway channel shut down");
                true
            }
            Ok(Err(_)) | Err(_) => {
                warn!(
                    in_flight = self.in_flight(),
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "gateway channel did not drain before shutdown timeout"
                );
                false
            }
        }
    }
}

/// Decode a response body; an empty body is the empty message.
pub(crate) fn decode<Resp: DeserializeOwned>(bytes: &[u8]) -> Result<Resp, SdkError> {
    if bytes.is_empty() {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Answers `{}` and records every call.
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<RpcCall>>,
    }

    #[async_trait]
    impl Transport for Recording {
        async fn unary(&self, call: RpcCall) -> Result<Vec<u8>, SdkError> {
            self.calls.lock().unwrap().push(call);
            Ok(b"{}".to_vec())
        }
    }

    /// Blocks every call until released.
    #[derive(Default)]
    struct Gate {
        release: Notify,
    }

    #[async_trait]
    impl Transport for Gate {
        async fn unary(&self, _call: RpcCall) -> Result<Vec<u8>, SdkError> {
            self.release.notified().await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn static_headers_come_first() {
        let transport = Arc::new(Recording::default());
        let channel = Channel::new(
            transport.clone(),
            vec![("token-dev-key".into(), "dev".into())],
        );

        let _: serde_json::Value = channel
            .call(
                GatewayMethod::GetMember,
                vec![("token-member-id".into(), "m:1".into())],
                &serde_json::json!({"member_id": "m:1"}),
            )
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, GatewayMethod::GetMember);
        assert_eq!(calls[0].headers[0].0, "token-dev-key");
        assert_eq!(calls[0].header("token-member-id"), Some("m:1"));
        assert_eq!(calls[0].body, br#"{"member_id":"m:1"}"#);
    }

    #[tokio::test]
    async fn empty_body_decodes_as_empty_message() {
        let transport = Arc::new(Gate::default());
        let channel = Channel::new(transport.clone(), vec![]);
        let call = tokio::spawn({
            let channel = channel.clone();
            async move {
                channel
                    .call::<_, token_models::gateway::Empty>(
                        GatewayMethod::DeleteMember,
                        vec![],
                        &token_models::gateway::Empty {},
                    )
                    .await
            }
        });
        while channel.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        transport.release.notify_one();
        assert!(call.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn calls_after_shutdown_are_refused() {
        let channel = Channel::new(Arc::new(Recording::default()), vec![]);
        assert!(channel.shutdown_within(Duration::from_millis(10)).await);
        assert!(channel.is_closed());

        let err = channel
            .unary(GatewayMethod::GetMember, vec![], b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::ChannelClosed));
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_calls() {
        let transport = Arc::new(Gate::default());
        let channel = Channel::new(transport.clone(), vec![]);

        let call = tokio::spawn({
            let channel = channel.clone();
            async move {
                channel
                    .unary(GatewayMethod::GetAccounts, vec![], b"{}".to_vec())
                    .await
            }
        });
        while channel.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        let shutdown = tokio::spawn({
            let channel = channel.clone();
            async move { channel.shutdown_within(Duration::from_secs(5)).await }
        });
        tokio::task::yield_now().await;
        transport.release.notify_one();

        assert!(call.await.unwrap().is_ok());
        assert!(shutdown.await.unwrap());
        assert_eq!(channel.in_flight(), 0);
    }

    #[tokio::test]
    async fn shutdown_gives_up_after_timeout() {
        let channel = Channel::new(Arc::new(Gate::default()), vec![]);
        let _stuck = tokio::spawn({
            let channel = channel.clone();
            async move {
                channel
                    .unary(GatewayMethod::GetAccounts, vec![], b"{}".to_vec())
                    .await
            }
        });
        while channel.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        let started = Instant::now();
        assert!(!channel.shutdown_within(Duration::from_millis(50)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(channel.in_flight(), 1);
    }
}
