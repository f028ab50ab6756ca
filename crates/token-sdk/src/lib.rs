//! # Token SDK
//!
//! Client SDK for the **Token** open-banking gateway.
//!
//! The SDK provides:
//!
//! * [`TokenClient`]: entry point. Creates, provisions and recovers
//!   members, looks up aliases and banks, and owns the gateway channel.
//! * [`Member`]: a member bound to an authenticated [`Client`] that signs
//!   every call with the member's keys.
//! * [`UnauthenticatedClient`]: identity bootstrapping calls.
//! * [`blocking`]: blocking versions of [`TokenClient`] and [`Member`].
//! * [`CryptoEngine`] / [`KeyStore`]: where member keys live and how they
//!   sign.
//! * [`Transport`]: how calls reach the gateway ([`HttpTransport`] by
//!   default).
//! * [`SdkError`]: unified error type for all SDK operations.
//!
//! Request builders and wire types live in [`token_models`]; the builders
//! are re-exported here.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use token_models::{Alias, CreateMemberType, KeyLevel};
//! use token_sdk::TokenClient;
//!
//! # async fn run() -> Result<(), token_sdk::SdkError> {
//! let client = TokenClient::builder().dev_key("my-dev-key").build()?;
//!
//! let mut member = client
//!     .create_member(Some(&Alias::email("alice@example.com")), CreateMemberType::Personal)
//!     .await?;
//!
//! // Read accounts another member granted access to.
//! member.use_access_token("tt:access-token-id");
//! for account in member.get_accounts().await? {
//!     let balance = member.get_balance(&account.id, KeyLevel::Low).await?;
//!     println!("{}: {} {}", account.name, balance.current.value, balance.current.currency);
//! }
//! member.clear_access_token();
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod auth_context;
pub mod blocking;
pub mod channel;
pub mod client;
pub mod config;
pub mod crypto;
pub mod eidas;
pub mod error;
pub mod key_store;
pub mod member;
pub mod routes;
pub mod stub;
pub mod token_client;
pub mod transport;
pub mod unauthenticated;

#[cfg(test)]
mod testing;

pub use auth_context::AuthenticationContext;
pub use channel::{Channel, SHUTDOWN_TIMEOUT};
pub use client::Client;
pub use config::{TokenClientBuilder, TokenCluster, DEFAULT_TIMEOUT, DEFAULT_TLS_PORT};
pub use crypto::{
    CryptoEngine, CryptoEngineFactory, Ed25519Signer, Ed25519Verifier, RsaSigner, Signer,
    TokenCryptoEngine, TokenCryptoEngineFactory, Verifier,
};
pub use eidas::{onboard_with_eidas, EidasOnboarding};
pub use error::{SdkError, StatusCode};
pub use key_store::{InMemoryKeyStore, KeyStore, SecretKey};
pub use member::Member;
pub use routes::GatewayMethod;
pub use token_client::TokenClient;
pub use transport::{HttpTransport, HttpTransportConfig, RpcCall, Transport};
pub use unauthenticated::{BankQuery, UnauthenticatedClient};

// Re-export builders from token-models for ergonomic usage.
pub use token_models::{MemberUpdateBuilder, TokenRequest, TokenRequestBuilder};
