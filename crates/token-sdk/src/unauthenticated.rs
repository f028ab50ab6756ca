//! Unauthenticated gateway client.
//!
//! Used to bootstrap an identity: look up aliases, create members, provision
//! devices and run recovery. Calls made here carry no member identity.
//! Member updates sent from here (creation, recovery) are signed by a key
//! the caller hands in, never by an identity of the client's own.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use token_models::gateway::{
    BeginRecoveryRequest, CompleteRecoveryRequest, CompleteRecoveryResponse, CreateMemberRequest,
    CreateMemberResponse, Empty, GetBanksRequest, GetBanksResponse, GetBlobRequest,
    GetBlobResponse, GetDefaultAgentResponse, GetMemberRequest, InvalidateNotificationRequest,
    MemberResponse, NotifyRequest, NotifyResponse, ResolveAliasRequest, ResolveAliasResponse,
    RetrieveTokenRequestRequest, TokenRequestResponse, UpdateMemberRequest,
    VerificationIdResponse, VerificationStatus,
};
use token_models::{
    add_key_operation, normalize_alias, recover_operation, AddKey, Alias, Authorization, Bank,
    Blob, CreateMemberType, DeviceMetadata, Key, KeyLevel, Member as MemberRecord,
    MemberOperation, MemberOperationMetadata, MemberRecoveryOperation, MemberUpdateBuilder,
    NotifyBody, NotifyStatus, Signature, TokenMember, TokenRequest,
};

use crate::channel::Channel;
use crate::crypto::{CryptoEngine, Signer};
use crate::error::SdkError;
use crate::routes::GatewayMethod;
use crate::stub::GatewayStub;

/// Filters of a bank listing. Unset filters do not restrict the result.
///
/// ```
/// use token_sdk::BankQuery;
///
/// let query = BankQuery::new().country("GB").search("iron").per_page(20);
/// assert_eq!(query.request().country.as_deref(), Some("GB"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankQuery {
    request: GetBanksRequest,
}

impl BankQuery {
    /// Query without filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only these bank ids.
    pub fn ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.request.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Name or identifier substring.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.request.search = Some(search.into());
        self
    }

    /// ISO 3166-1 alpha-2 country.
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.request.country = Some(country.into());
        self
    }

    /// 1-based page.
    pub fn page(mut self, page: u32) -> Self {
        self.request.page = Some(page);
        self
    }

    /// Page size.
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.request.per_page = Some(per_page);
        self
    }

    /// Sort key.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.request.sort = Some(sort.into());
        self
    }

    /// Connectivity provider.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.request.provider = Some(provider.into());
        self
    }

    /// Request this query sends.
    pub fn request(&self) -> &GetBanksRequest {
        &self.request
    }
}

/// Gateway client without a member identity.
#[derive(Clone)]
pub struct UnauthenticatedClient {
    channel: Channel,
}

impl UnauthenticatedClient {
    /// Client over `channel`.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    fn stub(&self) -> GatewayStub {
        GatewayStub::unauthenticated(&self.channel)
    }

    // ------------------------------------------------------------------
    // Aliases & members
    // ------------------------------------------------------------------

    /// Whether `alias` belongs to a member.
    pub async fn alias_exists(&self, alias: &Alias) -> Result<bool, SdkError> {
        Ok(self.resolve_alias(alias).await?.is_some())
    }

    /// Member owning `alias`, if any.
    pub async fn resolve_alias(&self, alias: &Alias) -> Result<Option<TokenMember>, SdkError> {
        let response: ResolveAliasResponse = self
            .stub()
            .call(
                GatewayMethod::ResolveAlias,
                &ResolveAliasRequest {
                    alias: alias.clone(),
                },
            )
            .await?;
        Ok(response.member.filter(|member| !member.id.is_empty()))
    }

    /// Id of the member owning `alias`.
    ///
    /// Fails with [`SdkError::NotFound`] when no member owns it.
    pub async fn get_member_id(&self, alias: &Alias) -> Result<String, SdkError> {
        self.resolve_alias(alias)
            .await?
            .map(|member| member.id)
            .ok_or_else(|| SdkError::NotFound(format!("no member with alias {}", alias.value)))
    }

    /// Reserve a fresh member id. `realm_id` scopes the member to a bank's
    /// realm.
    pub async fn create_member_id(
        &self,
        member_type: CreateMemberType,
        realm_id: Option<&str>,
    ) -> Result<String, SdkError> {
        let response: CreateMemberResponse = self
            .stub()
            .call(
                GatewayMethod::CreateMember,
                &CreateMemberRequest {
                    nonce: Uuid::new_v4().to_string(),
                    member_type,
                    realm_id: realm_id.unwrap_or_default().to_string(),
                    token_request_id: String::new(),
                },
            )
            .await?;
        Ok(response.member_id)
    }

    /// Apply the first update to a freshly reserved member.
    ///
    /// `signer` belongs to the new member; its key must be added by
    /// `operations`.
    pub async fn create_member(
        &self,
        member_id: &str,
        operations: Vec<MemberOperation>,
        metadata: Vec<MemberOperationMetadata>,
        signer: &dyn Signer,
    ) -> Result<MemberRecord, SdkError> {
        let update = MemberUpdateBuilder::for_member(member_id, "")
            .operations(operations)
            .build();
        let member = self.apply_update(update, metadata, signer).await?;
        info!(member_id = %member.id, "member created");
        Ok(member)
    }

    /// Fetch a member record.
    pub async fn get_member(&self, member_id: &str) -> Result<MemberRecord, SdkError> {
        let response: MemberResponse = self
            .stub()
            .call(
                GatewayMethod::GetMember,
                &GetMemberRequest {
                    member_id: member_id.to_string(),
                },
            )
            .await?;
        Ok(response.member)
    }

    /// Id of the default recovery agent.
    pub async fn get_default_agent(&self) -> Result<String, SdkError> {
        let response: GetDefaultAgentResponse = self
            .stub()
            .call(GatewayMethod::GetDefaultAgent, &Empty {})
            .await?;
        Ok(response.member_id)
    }

    async fn apply_update(
        &self,
        update: token_models::MemberUpdate,
        metadata: Vec<MemberOperationMetadata>,
        signer: &dyn Signer,
    ) -> Result<MemberRecord, SdkError> {
        let update_signature = Signature {
            member_id: update.member_id.clone(),
            key_id: signer.key_id().to_string(),
            signature: signer.sign(&update)?,
        };
        let response: MemberResponse = self
            .stub()
            .call(
                GatewayMethod::UpdateMember,
                &UpdateMemberRequest {
                    update,
                    update_signature,
                    metadata,
                },
            )
            .await?;
        Ok(response.member)
    }

    // ------------------------------------------------------------------
    // Notifications & blobs
    // ------------------------------------------------------------------

    /// Ask the devices of the member owning `alias` to approve `keys`.
    pub async fn notify_add_key(
        &self,
        alias: &Alias,
        keys: Vec<Key>,
        device_metadata: DeviceMetadata,
    ) -> Result<NotifyStatus, SdkError> {
        let response: NotifyResponse = self
            .stub()
            .call(
                GatewayMethod::Notify,
                &NotifyRequest {
                    alias: alias.clone(),
                    body: NotifyBody::AddKey(AddKey {
                        keys,
                        device_metadata,
                    }),
                },
            )
            .await?;
        Ok(response.status)
    }

    /// Withdraw a notification.
    pub async fn invalidate_notification(
        &self,
        notification_id: &str,
    ) -> Result<NotifyStatus, SdkError> {
        let response: NotifyResponse = self
            .stub()
            .call(
                GatewayMethod::InvalidateNotification,
                &InvalidateNotificationRequest {
                    notification_id: notification_id.to_string(),
                },
            )
            .await?;
        Ok(response.status)
    }

    /// Fetch a public blob.
    pub async fn get_blob(&self, blob_id: &str) -> Result<Blob, SdkError> {
        let response: GetBlobResponse = self
            .stub()
            .call(
                GatewayMethod::GetBlob,
                &GetBlobRequest {
                    blob_id: blob_id.to_string(),
                },
            )
            .await?;
        Ok(response.blob)
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Start recovery of the member owning `alias`; returns the
    /// verification id.
    pub async fn begin_recovery(&self, alias: &Alias) -> Result<String, SdkError> {
        let response: VerificationIdResponse = self
            .stub()
            .call(
                GatewayMethod::BeginRecovery,
                &BeginRecoveryRequest {
                    alias: normalize_alias(alias),
                },
            )
            .await?;
        Ok(response.verification_id)
    }

    /// Authorization a recovery agent signs to let `privileged_key` take
    /// over the member.
    pub async fn create_recovery_authorization(
        &self,
        member_id: &str,
        privileged_key: &Key,
    ) -> Result<Authorization, SdkError> {
        let member = self.get_member(member_id).await?;
        Ok(Authorization {
            member_id: member.id,
            prev_hash: member.last_hash,
            member_key: privileged_key.clone(),
        })
    }

    /// Exchange a verification code for the default agent's recovery
    /// operation.
    ///
    /// Fails with [`SdkError::Verification`] unless the code was accepted.
    pub async fn get_recovery_authorization(
        &self,
        verification_id: &str,
        code: &str,
        privileged_key: &Key,
    ) -> Result<MemberRecoveryOperation, SdkError> {
        let response = self
            .complete_recovery_call(verification_id, code, privileged_key)
            .await?;
        Ok(response.recovery_entry)
    }

    /// Recover a member with agent-signed `recovery_operations`.
    ///
    /// `crypto` must already hold the privileged key named by
    /// `privileged_key`; new standard and low keys are generated in it.
    pub async fn complete_recovery(
        &self,
        member_id: &str,
        recovery_operations: Vec<MemberRecoveryOperation>,
        privileged_key: Key,
        crypto: &Arc<dyn CryptoEngine>,
    ) -> Result<MemberRecord, SdkError> {
        let standard = crypto.generate_key(KeyLevel::Standard)?;
        let low = crypto.generate_key(KeyLevel::Low)?;
        let signer = crypto.create_signer(KeyLevel::Privileged)?;

        let member = self.get_member(member_id).await?;
        let operations = recovery_operations
            .into_iter()
            .map(recover_operation)
            .chain([
                add_key_operation(privileged_key),
                add_key_operation(standard),
                add_key_operation(low),
            ]);
        let update = MemberUpdateBuilder::new(&member)
            .operations(operations)
            .build();

        let member = self.apply_update(update, Vec::new(), signer.as_ref()).await?;
        info!(member_id = %member.id, "member recovered");
        Ok(member)
    }

    /// Recover a member whose recovery rule names the default agent.
    ///
    /// Generates a full key set in `crypto`. Fails with
    /// [`SdkError::Verification`] unless the code was accepted.
    pub async fn complete_recovery_with_default_rule(
        &self,
        member_id: &str,
        verification_id: &str,
        code: &str,
        crypto: &Arc<dyn CryptoEngine>,
    ) -> Result<MemberRecord, SdkError> {
        let privileged = crypto.generate_key(KeyLevel::Privileged)?;
        let standard = crypto.generate_key(KeyLevel::Standard)?;
        let low = crypto.generate_key(KeyLevel::Low)?;
        let signer = crypto.create_signer(KeyLevel::Privileged)?;

        let response = self
            .complete_recovery_call(verification_id, code, &privileged)
            .await?;
        let member = self.get_member(member_id).await?;
        let update = MemberUpdateBuilder::new(&member)
            .recover(response.recovery_entry)
            .add_key(privileged)
            .add_key(standard)
            .add_key(low)
            .build();

        let member = self.apply_update(update, Vec::new(), signer.as_ref()).await?;
        info!(member_id = %member.id, "member recovered with default rule");
        Ok(member)
    }

    async fn complete_recovery_call(
        &self,
        verification_id: &str,
        code: &str,
        key: &Key,
    ) -> Result<CompleteRecoveryResponse, SdkError> {
        let response: CompleteRecoveryResponse = self
            .stub()
            .call(
                GatewayMethod::CompleteRecovery,
                &CompleteRecoveryRequest {
                    verification_id: verification_id.to_string(),
                    code: code.to_string(),
                    key: key.clone(),
                },
            )
            .await?;
        if response.status != VerificationStatus::Success {
            return Err(SdkError::Verification(response.status.to_string()));
        }
        Ok(response)
    }

    // ------------------------------------------------------------------
    // Banks & token requests
    // ------------------------------------------------------------------

    /// Banks matching `query`.
    pub async fn get_banks(&self, query: &BankQuery) -> Result<Vec<Bank>, SdkError> {
        let response: GetBanksResponse = self
            .stub()
            .call(GatewayMethod::GetBanks, query.request())
            .await?;
        Ok(response.banks)
    }

    /// Fetch a stored token request.
    pub async fn retrieve_token_request(&self, request_id: &str) -> Result<TokenRequest, SdkError> {
        let response: TokenRequestResponse = self
            .stub()
            .call(
                GatewayMethod::RetrieveTokenRequest,
                &RetrieveTokenRequestRequest {
                    request_id: request_id.to_string(),
                },
            )
            .await?;
        let stored = response.token_request;
        Ok(TokenRequest::from_parts(
            stored.request_payload,
            stored.request_options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CryptoEngineFactory, TokenCryptoEngineFactory};
    use crate::error::StatusCode;
    use crate::routes::headers;
    use crate::testing::MockGateway;
    use serde_json::json;

    fn member_json(last_hash: &str) -> serde_json::Value {
        json!({"member": {"id": "m:bob", "last_hash": last_hash}})
    }

    #[tokio::test]
    async fn unknown_alias_is_not_found() {
        let gateway = MockGateway::new();
        let client = UnauthenticatedClient::new(gateway.channel());

        assert!(!client.alias_exists(&Alias::email("x@y.z")).await.unwrap());
        let err = client.get_member_id(&Alias::email("x@y.z")).await.unwrap_err();
        assert!(matches!(err, SdkError::NotFound(_)));
    }

    #[tokio::test]
    async fn resolves_alias_without_identity() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::ResolveAlias,
            json!({"member": {"id": "m:bob"}}),
        );
        let client = UnauthenticatedClient::new(gateway.channel());

        assert_eq!(
            client.get_member_id(&Alias::email("bob@example.com")).await.unwrap(),
            "m:bob"
        );
        let call = &gateway.calls()[0];
        assert_eq!(call.header(headers::MEMBER_ID), None);
        assert_eq!(call.header(headers::KEY_LEVEL), None);
    }

    #[tokio::test]
    async fn member_ids_use_fresh_nonces() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::CreateMember, json!({"member_id": "m:new"}));
        let client = UnauthenticatedClient::new(gateway.channel());

        client
            .create_member_id(CreateMemberType::Business, Some("m:bank"))
            .await
            .unwrap();
        client
            .create_member_id(CreateMemberType::Personal, None)
            .await
            .unwrap();

        let calls = gateway.calls_to(GatewayMethod::CreateMember);
        let first: CreateMemberRequest = serde_json::from_slice(&calls[0].body).unwrap();
        let second: CreateMemberRequest = serde_json::from_slice(&calls[1].body).unwrap();
        assert_ne!(first.nonce, second.nonce);
        assert_eq!(first.member_type, CreateMemberType::Business);
        assert_eq!(first.realm_id, "m:bank");
        assert_eq!(second.realm_id, "");
    }

    #[tokio::test]
    async fn create_member_is_signed_by_supplied_signer() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::UpdateMember, member_json("h1"));
        let client = UnauthenticatedClient::new(gateway.channel());
        let crypto = TokenCryptoEngineFactory::in_memory().create("m:bob");
        let key = crypto.generate_key(KeyLevel::Privileged).unwrap();
        let signer = crypto.create_signer(KeyLevel::Privileged).unwrap();

        client
            .create_member("m:bob", vec![add_key_operation(key.clone())], vec![], signer.as_ref())
            .await
            .unwrap();

        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        assert_eq!(request.update.member_id, "m:bob");
        assert_eq!(request.update.prev_hash, "");
        assert_eq!(request.update_signature.key_id, key.id);
        crypto
            .create_verifier(&key.id)
            .unwrap()
            .verify(&request.update, &request.update_signature.signature)
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_recovery_code_is_a_verification_error() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::CompleteRecovery,
            json!({"status": "INCORRECT_CODE"}),
        );
        let client = UnauthenticatedClient::new(gateway.channel());

        let err = client
            .get_recovery_authorization("v:1", "000000", &Key::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Verification(ref s) if s == "INCORRECT_CODE"));
    }

    #[tokio::test]
    async fn recovery_authorization_chains_on_last_hash() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::GetMember, member_json("h7"));
        let client = UnauthenticatedClient::new(gateway.channel());
        let key = Key {
            id: "k:new".into(),
            ..Default::default()
        };

        let authorization = client
            .create_recovery_authorization("m:bob", &key)
            .await
            .unwrap();
        assert_eq!(authorization.prev_hash, "h7");
        assert_eq!(authorization.member_key.id, "k:new");
    }

    #[tokio::test]
    async fn default_rule_recovery_replaces_keys() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::CompleteRecovery,
            json!({"status": "SUCCESS", "recovery_entry": {
                "authorization": {
                    "member_id": "m:bob",
                    "prev_hash": "h2",
                    "member_key": {"id": "k", "public_key": "p", "level": "PRIVILEGED", "algorithm": "ED25519"}
                },
                "agent_signature": {"member_id": "m:agent", "key_id": "ka", "signature": "sig"}
            }}),
        );
        gateway.respond(GatewayMethod::GetMember, member_json("h2"));
        gateway.respond(GatewayMethod::UpdateMember, member_json("h3"));
        let client = UnauthenticatedClient::new(gateway.channel());
        let crypto = TokenCryptoEngineFactory::in_memory().create("m:bob");

        let member = client
            .complete_recovery_with_default_rule("m:bob", "v:1", "123456", &crypto)
            .await
            .unwrap();
        assert_eq!(member.last_hash, "h3");

        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        assert_eq!(request.update.prev_hash, "h2");
        assert_eq!(request.update.operations.len(), 4);
        assert!(matches!(request.update.operations[0], MemberOperation::Recover(_)));
        assert_eq!(crypto.public_keys().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn bank_filters_are_forwarded() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::GetBanks,
            json!({"banks": [{"id": "iron", "name": "Iron Bank"}]}),
        );
        let client = UnauthenticatedClient::new(gateway.channel());

        let banks = client
            .get_banks(&BankQuery::new().ids(["iron"]).country("GB"))
            .await
            .unwrap();
        assert_eq!(banks[0].name, "Iron Bank");
        assert_eq!(
            gateway.request(GatewayMethod::GetBanks),
            json!({"ids": ["iron"], "country": "GB"})
        );
    }

    #[tokio::test]
    async fn gateway_status_propagates() {
        let gateway = MockGateway::new();
        gateway.fail(GatewayMethod::GetBlob, StatusCode::NotFound, "no blob");
        let client = UnauthenticatedClient::new(gateway.channel());

        let err = client.get_blob("b:1").await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::NotFound));
    }
}
