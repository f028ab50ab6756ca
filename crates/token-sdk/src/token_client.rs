//! Top-level client.
//!
//! [`TokenClient`] owns the gateway channel and the crypto engine factory.
//! It answers identity questions through the unauthenticated client and
//! hands out [`Member`]s bound to authenticated clients.
//!
//! # Member set-up
//!
//! ```text
//! create_member(alias)
//!   ├─ CreateMember            → member id
//!   ├─ GetDefaultAgent         → recovery agent
//!   ├─ generate PRIVILEGED, STANDARD, LOW keys
//!   └─ UpdateMember            add keys, recovery rule, alias (signed PRIVILEGED)
//! ```

use std::sync::Arc;

use token_models::{
    add_alias_metadata, add_alias_operation, add_key_operation, normalize_alias,
    recovery_agent_operation, Alias, Authorization, Bank, Blob, CreateMemberType, DeviceInfo,
    DeviceMetadata, Key, KeyLevel, MemberRecoveryOperation, NotifyStatus, TokenRequest,
};

use crate::channel::Channel;
use crate::client::Client;
use crate::config::{TokenClientBuilder, TokenCluster};
use crate::crypto::{CryptoEngine, CryptoEngineFactory};
use crate::error::SdkError;
use crate::member::Member;
use crate::unauthenticated::{BankQuery, UnauthenticatedClient};

/// Entry point of the SDK.
///
/// ```no_run
/// use token_models::{Alias, CreateMemberType};
/// use token_sdk::{TokenClient, TokenCluster};
///
/// # async fn run() -> Result<(), token_sdk::SdkError> {
/// let client = TokenClient::builder()
///     .connect_to(TokenCluster::Sandbox)
///     .dev_key("my-dev-key")
///     .build()?;
///
/// let member = client
///     .create_member(Some(&Alias::email("alice@example.com")), CreateMemberType::Personal)
///     .await?;
/// println!("created {}", member.member_id());
///
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TokenClient {
    channel: Channel,
    crypto_factory: Arc<dyn CryptoEngineFactory>,
    cluster: TokenCluster,
    unauthenticated: UnauthenticatedClient,
}

impl TokenClient {
    /// Start configuring a client.
    pub fn builder() -> TokenClientBuilder {
        TokenClientBuilder::new()
    }

    pub(crate) fn from_parts(
        channel: Channel,
        crypto_factory: Arc<dyn CryptoEngineFactory>,
        cluster: TokenCluster,
    ) -> Self {
        Self {
            unauthenticated: UnauthenticatedClient::new(channel.clone()),
            channel,
            crypto_factory,
            cluster,
        }
    }

    /// Cluster the client talks to.
    pub fn cluster(&self) -> TokenCluster {
        self.cluster
    }

    /// Client for identity bootstrapping calls.
    pub fn unauthenticated(&self) -> &UnauthenticatedClient {
        &self.unauthenticated
    }

    /// Shared channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Crypto engine of `member_id` from the configured factory.
    pub fn crypto_engine(&self, member_id: &str) -> Arc<dyn CryptoEngine> {
        self.crypto_factory.create(member_id)
    }

    fn bind(&self, record: token_models::Member, crypto: Arc<dyn CryptoEngine>) -> Member {
        let client = Client::new(record.id.clone(), crypto, self.channel.clone());
        Member::new(record, client, self.cluster)
    }

    /// Stop accepting calls and wait for in-flight calls, up to the
    /// channel's shutdown timeout.
    pub async fn shutdown(&self) {
        self.channel.shutdown().await;
    }

    // ------------------------------------------------------------------
    // Aliases
    // ------------------------------------------------------------------

    /// Whether `alias` belongs to a member.
    pub async fn alias_exists(&self, alias: &Alias) -> Result<bool, SdkError> {
        self.unauthenticated.alias_exists(alias).await
    }

    /// Id of the member owning `alias`.
    pub async fn get_member_id(&self, alias: &Alias) -> Result<String, SdkError> {
        self.unauthenticated.get_member_id(alias).await
    }

    /// Member owning `alias`, if any.
    pub async fn resolve_alias(
        &self,
        alias: &Alias,
    ) -> Result<Option<token_models::TokenMember>, SdkError> {
        self.unauthenticated.resolve_alias(alias).await
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Create a member with fresh keys and, optionally, an alias.
    pub async fn create_member(
        &self,
        alias: Option<&Alias>,
        member_type: CreateMemberType,
    ) -> Result<Member, SdkError> {
        let member_id = self
            .unauthenticated
            .create_member_id(member_type, None)
            .await?;
        self.set_up_member(alias, &member_id).await
    }

    /// Create a member in a bank's realm.
    pub async fn create_member_in_realm(
        &self,
        alias: Option<&Alias>,
        member_type: CreateMemberType,
        realm_id: &str,
    ) -> Result<Member, SdkError> {
        let member_id = self
            .unauthenticated
            .create_member_id(member_type, Some(realm_id))
            .await?;
        self.set_up_member(alias, &member_id).await
    }

    /// Give an existing, keyless member id a full key set, the default
    /// recovery rule and (optionally) an alias.
    pub async fn set_up_member(
        &self,
        alias: Option<&Alias>,
        member_id: &str,
    ) -> Result<Member, SdkError> {
        let agent_id = self.unauthenticated.get_default_agent().await?;
        let crypto = self.crypto_factory.create(member_id);

        let mut operations = vec![
            add_key_operation(crypto.generate_key(KeyLevel::Privileged)?),
            add_key_operation(crypto.generate_key(KeyLevel::Standard)?),
            add_key_operation(crypto.generate_key(KeyLevel::Low)?),
            recovery_agent_operation(agent_id),
        ];
        let mut metadata = Vec::new();
        if let Some(alias) = alias {
            let alias = normalize_alias(alias);
            operations.push(add_alias_operation(&alias));
            metadata.push(add_alias_metadata(&alias));
        }

        let signer = crypto.create_signer(KeyLevel::Privileged)?;
        let record = self
            .unauthenticated
            .create_member(member_id, operations, metadata, signer.as_ref())
            .await?;
        let crypto = self.crypto_factory.create(&record.id);
        Ok(self.bind(record, crypto))
    }

    /// Generate a key set for a new device of the member owning `alias`.
    ///
    /// The keys are only stored locally; another device has to approve
    /// them (see [`notify_add_key`](Self::notify_add_key)).
    pub async fn provision_device(&self, alias: &Alias) -> Result<DeviceInfo, SdkError> {
        let member_id = self.unauthenticated.get_member_id(alias).await?;
        let crypto = self.crypto_factory.create(&member_id);
        let keys = vec![
            crypto.generate_key(KeyLevel::Privileged)?,
            crypto.generate_key(KeyLevel::Standard)?,
            crypto.generate_key(KeyLevel::Low)?,
        ];
        Ok(DeviceInfo { member_id, keys })
    }

    /// Member whose keys are in the configured key store.
    pub async fn get_member(&self, member_id: &str) -> Result<Member, SdkError> {
        let crypto = self.crypto_factory.create(member_id);
        let client = Client::new(member_id, crypto, self.channel.clone());
        let record = client.get_member(member_id).await?;
        Ok(Member::new(record, client, self.cluster))
    }

    // ------------------------------------------------------------------
    // Notifications & blobs
    // ------------------------------------------------------------------

    /// Ask the member owning `alias` to approve `keys`.
    pub async fn notify_add_key(
        &self,
        alias: &Alias,
        keys: Vec<Key>,
        device_metadata: DeviceMetadata,
    ) -> Result<NotifyStatus, SdkError> {
        self.unauthenticated
            .notify_add_key(alias, keys, device_metadata)
            .await
    }

    /// Withdraw a notification.
    pub async fn invalidate_notification(
        &self,
        notification_id: &str,
    ) -> Result<NotifyStatus, SdkError> {
        self.unauthenticated
            .invalidate_notification(notification_id)
            .await
    }

    /// Fetch a public blob.
    pub async fn get_blob(&self, blob_id: &str) -> Result<Blob, SdkError> {
        self.unauthenticated.get_blob(blob_id).await
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Start recovery of the member owning `alias`; returns the
    /// verification id.
    pub async fn begin_recovery(&self, alias: &Alias) -> Result<String, SdkError> {
        self.unauthenticated.begin_recovery(alias).await
    }

    /// Authorization for a recovery agent to sign.
    pub async fn create_recovery_authorization(
        &self,
        member_id: &str,
        privileged_key: &Key,
    ) -> Result<Authorization, SdkError> {
        self.unauthenticated
            .create_recovery_authorization(member_id, privileged_key)
            .await
    }

    /// The default agent's recovery operation, in exchange for a
    /// verification code.
    pub async fn get_recovery_authorization(
        &self,
        verification_id: &str,
        code: &str,
        privileged_key: &Key,
    ) -> Result<MemberRecoveryOperation, SdkError> {
        self.unauthenticated
            .get_recovery_authorization(verification_id, code, privileged_key)
            .await
    }

    /// Recover a member with agent-signed operations; `crypto` holds the
    /// new privileged key.
    pub async fn complete_recovery(
        &self,
        member_id: &str,
        recovery_operations: Vec<MemberRecoveryOperation>,
        privileged_key: Key,
        crypto: Arc<dyn CryptoEngine>,
    ) -> Result<Member, SdkError> {
        let record = self
            .unauthenticated
            .complete_recovery(member_id, recovery_operations, privileged_key, &crypto)
            .await?;
        Ok(self.bind(record, crypto))
    }

    /// Recover a member whose recovery rule names the default agent. New
    /// keys go to the configured key store.
    pub async fn complete_recovery_with_default_rule(
        &self,
        member_id: &str,
        verification_id: &str,
        code: &str,
    ) -> Result<Member, SdkError> {
        let crypto = self.crypto_factory.create(member_id);
        let record = self
            .unauthenticated
            .complete_recovery_with_default_rule(member_id, verification_id, code, &crypto)
            .await?;
        Ok(self.bind(record, crypto))
    }

    // ------------------------------------------------------------------
    // Banks & token requests
    // ------------------------------------------------------------------

    /// Banks matching `query`.
    pub async fn get_banks(&self, query: &BankQuery) -> Result<Vec<Bank>, SdkError> {
        self.unauthenticated.get_banks(query).await
    }

    /// Fetch a stored token request.
    pub async fn retrieve_token_request(&self, request_id: &str) -> Result<TokenRequest, SdkError> {
        self.unauthenticated.retrieve_token_request(request_id).await
    }
}

impl std::fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClient")
            .field("cluster", &self.cluster)
            .field("closed", &self.channel.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TokenCryptoEngineFactory;
    use crate::key_store::{InMemoryKeyStore, KeyStore};
    use crate::routes::GatewayMethod;
    use crate::testing::MockGateway;
    use serde_json::json;
    use token_models::gateway::UpdateMemberRequest;
    use token_models::MemberOperation;

    fn token_client(gateway: &Arc<MockGateway>, key_store: Arc<InMemoryKeyStore>) -> TokenClient {
        TokenClient::builder()
            .dev_key("dev")
            .with_transport(gateway.clone())
            .with_key_store(key_store)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn create_member_adds_keys_agent_and_alias() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::CreateMember, json!({"member_id": "m:dave"}));
        gateway.respond(GatewayMethod::GetDefaultAgent, json!({"member_id": "m:agent"}));
        gateway.respond(
            GatewayMethod::UpdateMember,
            json!({"member": {"id": "m:dave", "last_hash": "h1"}}),
        );
        let key_store = Arc::new(InMemoryKeyStore::new());
        let client = token_client(&gateway, key_store.clone());

        let member = client
            .create_member(Some(&Alias::email("Dave@Example.com")), CreateMemberType::Personal)
            .await
            .unwrap();
        assert_eq!(member.member_id(), "m:dave");

        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        let ops = &request.update.operations;
        assert_eq!(ops.len(), 5);
        assert!(matches!(ops[0], MemberOperation::AddKey(ref k) if k.key.level == KeyLevel::Privileged));
        assert!(matches!(ops[3], MemberOperation::RecoveryRules(_)));
        assert!(matches!(ops[4], MemberOperation::AddAlias(_)));
        assert_eq!(request.metadata.len(), 1);

        let privileged = key_store
            .get_by_level("m:dave", KeyLevel::Privileged)
            .unwrap();
        assert_eq!(request.update_signature.key_id, privileged.id());
        assert_eq!(key_store.list_keys("m:dave").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn set_up_member_without_alias_sends_no_metadata() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::UpdateMember,
            json!({"member": {"id": "m:erin", "last_hash": "h1"}}),
        );
        let client = token_client(&gateway, Arc::new(InMemoryKeyStore::new()));

        client.set_up_member(None, "m:erin").await.unwrap();

        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        assert_eq!(request.update.operations.len(), 4);
        assert!(request.metadata.is_empty());
    }

    #[tokio::test]
    async fn provision_device_generates_local_keys() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::ResolveAlias,
            json!({"member": {"id": "m:frank"}}),
        );
        let key_store = Arc::new(InMemoryKeyStore::new());
        let client = token_client(&gateway, key_store.clone());

        let device = client
            .provision_device(&Alias::email("frank@example.com"))
            .await
            .unwrap();
        assert_eq!(device.member_id, "m:frank");
        let levels: Vec<KeyLevel> = device.keys.iter().map(|k| k.level).collect();
        assert_eq!(
            levels,
            vec![KeyLevel::Privileged, KeyLevel::Standard, KeyLevel::Low]
        );
        assert_eq!(gateway.calls_to(GatewayMethod::UpdateMember).len(), 0);
        assert_eq!(key_store.list_keys("m:frank").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn static_headers_are_sent() {
        let gateway = MockGateway::new();
        let client = token_client(&gateway, Arc::new(InMemoryKeyStore::new()));
        client.get_banks(&BankQuery::new()).await.unwrap();

        let call = &gateway.calls()[0];
        assert_eq!(call.header(crate::routes::headers::DEV_KEY), Some("dev"));
        assert_eq!(call.header(crate::routes::headers::SDK), Some("rust"));
    }

    #[tokio::test]
    async fn shutdown_refuses_new_calls() {
        let gateway = MockGateway::new();
        let client = token_client(&gateway, Arc::new(InMemoryKeyStore::new()));
        client.shutdown().await;

        let err = client
            .alias_exists(&Alias::email("x@y.z"))
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::ChannelClosed));
    }

    #[test]
    fn crypto_factory_is_shared() {
        let gateway = MockGateway::new();
        let client = TokenClient::builder()
            .dev_key("dev")
            .with_transport(gateway.clone())
            .with_crypto_engine(Arc::new(TokenCryptoEngineFactory::in_memory()))
            .build()
            .unwrap();
        let key = client
            .crypto_engine("m:gina")
            .generate_key(KeyLevel::Low)
            .unwrap();
        let keys = client.crypto_engine("m:gina").public_keys().unwrap();
        assert_eq!(keys, vec![key]);
    }
}
