//! Wire transport.
//!
//! A [`Transport`] delivers one serialized request to the gateway and
//! returns the serialized response. [`HttpTransport`] posts JSON over
//! HTTP(S); any other transport (a generated gRPC stub, an in-process fake)
//! plugs in through
//! [`TokenClientBuilder::with_transport`](crate::TokenClientBuilder::with_transport).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::SdkError;
use crate::routes::GatewayMethod;

/// One unary gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCall {
    /// Method being called.
    pub method: GatewayMethod,
    /// Request headers (static, authentication and context headers).
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub body: Vec<u8>,
}

impl RpcCall {
    /// Value of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Delivers gateway calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a unary call; returns the JSON response body. Non-OK
    /// statuses are returned as [`SdkError::Status`].
    async fn unary(&self, call: RpcCall) -> Result<Vec<u8>, SdkError>;
}

/// Connection settings of an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Gateway host name.
    pub host: String,
    /// Gateway port.
    pub port: u16,
    /// Use HTTPS.
    pub use_tls: bool,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Extra trusted root certificate, PEM-encoded.
    pub root_certificate_pem: Option<Vec<u8>>,
}

impl HttpTransportConfig {
    /// `scheme://host:port`.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// JSON-over-HTTP transport built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for `config`.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, SdkError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(pem) = &config.root_certificate_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url(),
        })
    }

    /// Base URL calls are posted under.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn unary(&self, call: RpcCall) -> Result<Vec<u8>, SdkError> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, call.method.path()))
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &call.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let res = request.body(call.body).send().await?;
        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            return Err(SdkError::from_error_response(status.as_u16(), &body));
        }
        Ok(body.to_vec())
    }
}
