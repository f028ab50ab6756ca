//! Client configuration.
//!
//! [`TokenClientBuilder`] collects connection and key-management settings
//! and builds a [`TokenClient`]. Settings can also be read from the
//! environment with [`TokenClientBuilder::from_env`].

use std::sync::Arc;
use std::time::Duration;

use crate::channel::Channel;
use crate::crypto::{CryptoEngineFactory, TokenCryptoEngineFactory};
use crate::error::SdkError;
use crate::key_store::{InMemoryKeyStore, KeyStore};
use crate::routes::{headers, SDK_PLATFORM, SDK_VERSION};
use crate::token_client::TokenClient;
use crate::transport::{HttpTransport, HttpTransportConfig, Transport};

/// Per-call timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Port on which the gateway speaks TLS.
pub const DEFAULT_TLS_PORT: u16 = 443;

const MISSING_DEV_KEY: &str = "Please provide a developer key. Contact Token for more details.";

/// Token deployments.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TokenCluster {
    /// Live traffic.
    Production,
    /// Partner integration testing.
    Integration,
    /// Public sandbox.
    #[default]
    Sandbox,
    /// Pre-release staging.
    Staging,
    /// Load testing.
    Performance,
    /// Development.
    Development,
}

impl TokenCluster {
    /// Gateway host of the cluster.
    pub fn host(self) -> &'static str {
        match self {
            TokenCluster::Production => "api-grpc.token.io",
            TokenCluster::Integration => "api-grpc.int.token.io",
            TokenCluster::Sandbox => "api-grpc.sandbox.token.io",
            TokenCluster::Staging => "api-grpc.stg.token.io",
            TokenCluster::Performance => "api-grpc.perf.token.io",
            TokenCluster::Development => "api-grpc.dev.token.io",
        }
    }
}

/// Builder of [`TokenClient`].
///
/// ```
/// use std::time::Duration;
/// use token_sdk::{TokenClientBuilder, TokenCluster};
///
/// let builder = TokenClientBuilder::new()
///     .connect_to(TokenCluster::Production)
///     .timeout(Duration::from_secs(30))
///     .dev_key("my-dev-key");
/// assert_eq!(builder.host(), "api-grpc.token.io");
/// assert!(builder.use_tls());
/// ```
#[derive(Clone)]
pub struct TokenClientBuilder {
    cluster: TokenCluster,
    host: String,
    port: u16,
    use_tls: bool,
    timeout: Duration,
    root_certificate_pem: Option<Vec<u8>>,
    dev_key: Option<String>,
    key_store: Option<Arc<dyn KeyStore>>,
    crypto_factory: Option<Arc<dyn CryptoEngineFactory>>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for TokenClientBuilder {
    fn default() -> Self {
        let cluster = TokenCluster::default();
        Self {
            cluster,
            host: cluster.host().to_string(),
            port: DEFAULT_TLS_PORT,
            use_tls: true,
            timeout: DEFAULT_TIMEOUT,
            root_certificate_pem: None,
            dev_key: None,
            key_store: None,
            crypto_factory: None,
            transport: None,
        }
    }
}

impl TokenClientBuilder {
    /// Builder targeting the sandbox cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from the environment.
    ///
    /// | Variable           | Effect                                   |
    /// |--------------------|------------------------------------------|
    /// | `TOKEN_DEV_KEY`    | developer key                            |
    /// | `TOKEN_CLUSTER`    | cluster name, e.g. `production`          |
    /// | `TOKEN_HOST`       | gateway host, overrides the cluster host |
    /// | `TOKEN_PORT`       | gateway port                             |
    /// | `TOKEN_TIMEOUT_MS` | per-call timeout in milliseconds         |
    ///
    /// Unset or unparsable variables keep the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut builder = Self::new();
        if let Some(cluster) = lookup("TOKEN_CLUSTER").and_then(|v| v.parse().ok()) {
            builder = builder.connect_to(cluster);
        }
        if let Some(host) = lookup("TOKEN_HOST") {
            builder = builder.host_name(host);
        }
        if let Some(port) = lookup("TOKEN_PORT").and_then(|v| v.parse().ok()) {
            builder = builder.port(port);
        }
        if let Some(ms) = lookup("TOKEN_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(dev_key) = lookup("TOKEN_DEV_KEY") {
            builder = builder.dev_key(dev_key);
        }
        builder
    }

    /// Gateway host.
    pub fn host_name(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Gateway port. TLS is used iff the port is 443.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self.use_tls = port == DEFAULT_TLS_PORT;
        self
    }

    /// Target a cluster; sets the host to the cluster's gateway.
    pub fn connect_to(mut self, cluster: TokenCluster) -> Self {
        self.cluster = cluster;
        self.host = cluster.host().to_string();
        self
    }

    /// Per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where member keys are kept. Ignored when a crypto engine factory is
    /// set.
    pub fn with_key_store(mut self, key_store: Arc<dyn KeyStore>) -> Self {
        self.key_store = Some(key_store);
        self
    }

    /// Crypto engine factory for member keys.
    pub fn with_crypto_engine(mut self, factory: Arc<dyn CryptoEngineFactory>) -> Self {
        self.crypto_factory = Some(factory);
        self
    }

    /// Trust an extra root certificate (PEM).
    pub fn with_root_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certificate_pem = Some(pem.into());
        self
    }

    /// Developer key sent with every call. Required.
    pub fn dev_key(mut self, dev_key: impl Into<String>) -> Self {
        self.dev_key = Some(dev_key.into());
        self
    }

    /// Use `transport` instead of HTTP.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Cluster the client reports.
    pub fn cluster(&self) -> TokenCluster {
        self.cluster
    }

    /// Gateway host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether TLS will be used.
    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Connection settings of the HTTP transport.
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            host: self.host.clone(),
            port: self.port,
            use_tls: self.use_tls,
            timeout: self.timeout,
            root_certificate_pem: self.root_certificate_pem.clone(),
        }
    }

    /// Build the client.
    ///
    /// Fails with [`SdkError::Config`] without a developer key.
    pub fn build(self) -> Result<TokenClient, SdkError> {
        let dev_key = match self.dev_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => return Err(SdkError::Config(MISSING_DEV_KEY.to_string())),
        };

        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(HttpTransport::new(&self.transport_config())?),
        };
        let channel = Channel::new(
            transport,
            vec![
                (headers::DEV_KEY.to_string(), dev_key),
                (headers::SDK.to_string(), SDK_PLATFORM.to_string()),
                (headers::SDK_VERSION.to_string(), SDK_VERSION.to_string()),
            ],
        );

        let crypto_factory = self.crypto_factory.unwrap_or_else(|| {
            let key_store = self
                .key_store
                .unwrap_or_else(|| Arc::new(InMemoryKeyStore::default()));
            Arc::new(TokenCryptoEngineFactory::new(key_store))
        });

        Ok(TokenClient::from_parts(channel, crypto_factory, self.cluster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::str::FromStr;

    #[test]
    fn defaults_to_sandbox_over_tls() {
        let builder = TokenClientBuilder::new();
        assert_eq!(builder.cluster(), TokenCluster::Sandbox);
        let config = builder.transport_config();
        assert_eq!(config.host, "api-grpc.sandbox.token.io");
        assert_eq!(config.port, 443);
        assert!(config.use_tls);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn non_tls_port_disables_tls() {
        let builder = TokenClientBuilder::new().host_name("localhost").port(9000);
        assert!(!builder.use_tls());
        assert_eq!(builder.transport_config().base_url(), "http://localhost:9000");
    }

    #[test]
    fn host_name_overrides_cluster_host() {
        let builder = TokenClientBuilder::new()
            .connect_to(TokenCluster::Staging)
            .host_name("gateway.internal");
        assert_eq!(builder.cluster(), TokenCluster::Staging);
        assert_eq!(builder.host(), "gateway.internal");
    }

    #[test]
    fn cluster_names_parse() {
        assert_eq!(
            TokenCluster::from_str("Production").unwrap(),
            TokenCluster::Production
        );
        assert_eq!(TokenCluster::Development.to_string(), "development");
    }

    #[test]
    fn missing_dev_key_is_rejected() {
        let err = TokenClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, SdkError::Config(ref m) if m == MISSING_DEV_KEY));
        let err = TokenClientBuilder::new().dev_key("  ").build().unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn reads_environment() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TOKEN_CLUSTER", "integration"),
            ("TOKEN_PORT", "8443"),
            ("TOKEN_TIMEOUT_MS", "2500"),
            ("TOKEN_DEV_KEY", "dev"),
        ]);
        let builder = TokenClientBuilder::from_lookup(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(builder.cluster(), TokenCluster::Integration);
        let config = builder.transport_config();
        assert_eq!(config.host, "api-grpc.int.token.io");
        assert_eq!(config.port, 8443);
        assert!(!config.use_tls);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(builder.dev_key.as_deref(), Some("dev"));
    }

    #[test]
    fn bad_environment_values_keep_defaults() {
        let builder = TokenClientBuilder::from_lookup(|name| match name {
            "TOKEN_PORT" => Some("not-a-port".into()),
            "TOKEN_CLUSTER" => Some("moon".into()),
            _ => None,
        });
        assert_eq!(builder.cluster(), TokenCluster::Sandbox);
        assert!(builder.use_tls());
    }
}
