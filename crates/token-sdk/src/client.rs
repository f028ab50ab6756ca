//! Authenticated gateway client.
//!
//! [`Client`] makes gateway calls as one member. Every call builds a fresh
//! [`AuthenticationContext`] from the client's delegation state and is
//! signed by the member key of the context's level (see
//! [`GatewayStub`](crate::stub::GatewayStub)).
//!
//! Two context shapes are used:
//!
//! ```text
//! member-scoped   { on_behalf_of: none,    customer_initiated: false, level: Low }
//! account-scoped  { on_behalf_of: current, customer_initiated: current, level: requested }
//! ```
//!
//! `delete_member` is the only member-scoped call made at `Privileged`.

use std::sync::Arc;

use token_models::gateway::{
    AccountRequest, Empty, GetAccountResponse, GetAccountsResponse, GetAliasesResponse,
    GetBalanceResponse, GetBalancesRequest, GetBalancesResponse, GetBankInfoRequest,
    GetBankInfoResponse, GetDefaultAgentResponse, GetMemberRequest, GetTransactionRequest,
    GetTransactionResponse, GetTransactionsRequest, GetTransactionsResponse, MemberResponse,
    ResolveTransferDestinationsResponse, RetryVerificationRequest, StoreTokenRequestRequest,
    TokenRequestResponse, UpdateMemberRequest, VerificationIdResponse, VerifyAliasRequest,
    VerifyEidasRequest,
};
use token_models::{
    recovery_agent_operation, Account, Alias, Authorization, Balance, BankInfo, KeyLevel,
    Member as MemberRecord, MemberOperation, MemberOperationMetadata, MemberUpdateBuilder, Page,
    PagedList, RequestStatus, SecurityMetadata, Signature, TokenRequest, Transaction,
    TransferEndpoint, VerifyEidasPayload, VerifyEidasResponse,
};

use crate::auth_context::AuthenticationContext;
use crate::channel::Channel;
use crate::crypto::CryptoEngine;
use crate::error::SdkError;
use crate::routes::GatewayMethod;
use crate::stub::GatewayStub;

/// Gateway client acting as a single member.
///
/// Cloning is cheap; clones share the channel and crypto engine but carry
/// their own delegation state.
#[derive(Clone)]
pub struct Client {
    member_id: String,
    crypto: Arc<dyn CryptoEngine>,
    channel: Channel,
    on_behalf_of: Option<String>,
    customer_initiated: bool,
    security_metadata: SecurityMetadata,
}

impl Client {
    /// Client for `member_id`, signing with keys from `crypto`.
    pub fn new(member_id: impl Into<String>, crypto: Arc<dyn CryptoEngine>, channel: Channel) -> Self {
        Self {
            member_id: member_id.into(),
            crypto,
            channel,
            on_behalf_of: None,
            customer_initiated: false,
            security_metadata: SecurityMetadata::default(),
        }
    }

    /// Member the client acts as.
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    /// Crypto engine holding the member's keys.
    pub fn crypto(&self) -> &Arc<dyn CryptoEngine> {
        &self.crypto
    }

    // ------------------------------------------------------------------
    // Delegation state
    // ------------------------------------------------------------------

    /// Make subsequent account-scoped calls on behalf of the grantor of
    /// `access_token_id`.
    pub fn use_access_token(&mut self, access_token_id: impl Into<String>) {
        self.on_behalf_of = Some(access_token_id.into());
    }

    /// Stop acting on behalf of another member. Also resets the
    /// customer-initiated flag.
    pub fn clear_access_token(&mut self) {
        self.on_behalf_of = None;
        self.customer_initiated = false;
    }

    /// Mark subsequent account-scoped calls as initiated by the end user.
    pub fn set_customer_initiated(&mut self, customer_initiated: bool) {
        self.customer_initiated = customer_initiated;
    }

    /// Attach tracking metadata to subsequent calls.
    pub fn set_tracking_metadata(&mut self, metadata: SecurityMetadata) {
        self.security_metadata = metadata;
    }

    /// Drop tracking metadata.
    pub fn clear_tracking_metadata(&mut self) {
        self.security_metadata = SecurityMetadata::default();
    }

    /// Token the client currently acts under.
    pub fn access_token(&self) -> Option<&str> {
        self.on_behalf_of.as_deref()
    }

    /// Context of member-scoped calls.
    pub fn authentication_context(&self) -> AuthenticationContext {
        self.member_context(KeyLevel::Low)
    }

    /// Context of account-scoped calls at `level`.
    pub fn on_behalf_of(&self, level: KeyLevel) -> AuthenticationContext {
        AuthenticationContext::new(
            self.on_behalf_of.clone(),
            self.customer_initiated,
            level,
            self.security_metadata.clone(),
        )
    }

    fn member_context(&self, level: KeyLevel) -> AuthenticationContext {
        AuthenticationContext::new(None, false, level, self.security_metadata.clone())
    }

    fn stub(&self, context: AuthenticationContext) -> GatewayStub {
        GatewayStub::with_authentication(&self.channel, &self.member_id, self.crypto.clone(), context)
    }

    fn member_stub(&self) -> GatewayStub {
        self.stub(self.authentication_context())
    }

    // ------------------------------------------------------------------
    // Member
    // ------------------------------------------------------------------

    /// Fetch a member record.
    pub async fn get_member(&self, member_id: &str) -> Result<MemberRecord, SdkError> {
        let response: MemberResponse = self
            .member_stub()
            .call(
                GatewayMethod::GetMember,
                &GetMemberRequest {
                    member_id: member_id.to_string(),
                },
            )
            .await?;
        Ok(response.member)
    }

    /// Apply `operations` to `member`, signed with the privileged key.
    ///
    /// Returns `member` unchanged when there is nothing to apply.
    pub async fn update_member(
        &self,
        member: &MemberRecord,
        operations: Vec<MemberOperation>,
        metadata: Vec<MemberOperationMetadata>,
    ) -> Result<MemberRecord, SdkError> {
        if operations.is_empty() {
            return Ok(member.clone());
        }

        let update = MemberUpdateBuilder::new(member).operations(operations).build();
        let signer = self.crypto.create_signer(KeyLevel::Privileged)?;
        let update_signature = Signature {
            member_id: self.member_id.clone(),
            key_id: signer.key_id().to_string(),
            signature: signer.sign(&update)?,
        };

        let response: MemberResponse = self
            .member_stub()
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

    /// Name the default recovery agent as the member's recovery rule.
    pub async fn use_default_recovery_rule(&self) -> Result<MemberRecord, SdkError> {
        let member = self.get_member(&self.member_id).await?;
        let agent = self.get_default_agent().await?;
        self.update_member(&member, vec![recovery_agent_operation(agent)], Vec::new())
            .await
    }

    /// Aliases of the member.
    pub async fn get_aliases(&self) -> Result<Vec<Alias>, SdkError> {
        let response: GetAliasesResponse = self
            .member_stub()
            .call(GatewayMethod::GetAliases, &Empty {})
            .await?;
        Ok(response.aliases)
    }

    /// Resend the verification code for `alias`; returns the verification id.
    pub async fn retry_verification(&self, alias: &Alias) -> Result<String, SdkError> {
        let response: VerificationIdResponse = self
            .member_stub()
            .call(
                GatewayMethod::RetryVerification,
                &RetryVerificationRequest {
                    member_id: self.member_id.clone(),
                    alias: alias.clone(),
                },
            )
            .await?;
        Ok(response.verification_id)
    }

    /// Submit the code of an alias verification.
    pub async fn verify_alias(&self, verification_id: &str, code: &str) -> Result<(), SdkError> {
        let _: Empty = self
            .member_stub()
            .call(
                GatewayMethod::VerifyAlias,
                &VerifyAliasRequest {
                    verification_id: verification_id.to_string(),
                    code: code.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    /// Sign a recovery authorization with the member's privileged key.
    ///
    /// Purely local; nothing is sent.
    pub fn authorize_recovery(&self, authorization: &Authorization) -> Result<Signature, SdkError> {
        let signer = self.crypto.create_signer(KeyLevel::Privileged)?;
        Ok(Signature {
            member_id: self.member_id.clone(),
            key_id: signer.key_id().to_string(),
            signature: signer.sign(authorization)?,
        })
    }

    /// Id of the default recovery agent.
    pub async fn get_default_agent(&self) -> Result<String, SdkError> {
        let response: GetDefaultAgentResponse = self
            .member_stub()
            .call(GatewayMethod::GetDefaultAgent, &Empty {})
            .await?;
        Ok(response.member_id)
    }

    /// Delete the member. Requires the privileged key.
    pub async fn delete_member(&self) -> Result<(), SdkError> {
        let _: Empty = self
            .stub(self.member_context(KeyLevel::Privileged))
            .call(GatewayMethod::DeleteMember, &Empty {})
            .await?;
        Ok(())
    }

    /// Store a token request; returns its id.
    pub async fn store_token_request(&self, request: &TokenRequest) -> Result<String, SdkError> {
        let response: TokenRequestResponse = self
            .member_stub()
            .call(
                GatewayMethod::StoreTokenRequest,
                &StoreTokenRequestRequest {
                    request_payload: request.payload().clone(),
                    request_options: request.options().clone(),
                },
            )
            .await?;
        Ok(response.token_request.id)
    }

    /// Verify an eIDAS certificate. `signature` is the certificate key's
    /// signature over `payload`.
    pub async fn verify_eidas(
        &self,
        payload: VerifyEidasPayload,
        signature: String,
    ) -> Result<VerifyEidasResponse, SdkError> {
        self.member_stub()
            .call(
                GatewayMethod::VerifyEidas,
                &VerifyEidasRequest { payload, signature },
            )
            .await
    }

    /// Linking information of a bank.
    pub async fn get_bank_info(&self, bank_id: &str) -> Result<BankInfo, SdkError> {
        let response: GetBankInfoResponse = self
            .member_stub()
            .call(
                GatewayMethod::GetBankInfo,
                &GetBankInfoRequest {
                    bank_id: bank_id.to_string(),
                },
            )
            .await?;
        Ok(response.info)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Fetch one account.
    pub async fn get_account(&self, account_id: &str) -> Result<Account, SdkError> {
        let response: GetAccountResponse = self
            .stub(self.on_behalf_of(KeyLevel::Low))
            .call(
                GatewayMethod::GetAccount,
                &AccountRequest {
                    account_id: account_id.to_string(),
                },
            )
            .await?;
        Ok(response.account)
    }

    /// List linked accounts.
    pub async fn get_accounts(&self) -> Result<Vec<Account>, SdkError> {
        let response: GetAccountsResponse = self
            .stub(self.on_behalf_of(KeyLevel::Low))
            .call(GatewayMethod::GetAccounts, &Empty {})
            .await?;
        Ok(response.accounts)
    }

    /// Balance of an account.
    ///
    /// Fails with [`SdkError::StepUpRequired`] when the gateway wants a
    /// higher key level.
    pub async fn get_balance(&self, account_id: &str, level: KeyLevel) -> Result<Balance, SdkError> {
        let response: GetBalanceResponse = self
            .stub(self.on_behalf_of(level))
            .call(
                GatewayMethod::GetBalance,
                &AccountRequest {
                    account_id: account_id.to_string(),
                },
            )
            .await?;
        match (response.status, response.balance) {
            (RequestStatus::SuccessfulRequest, Some(balance)) => Ok(balance),
            _ => Err(SdkError::StepUpRequired("Balance step up required.".into())),
        }
    }

    /// Balances of several accounts. Entries the gateway did not serve are
    /// left out.
    pub async fn get_balances(
        &self,
        account_ids: &[String],
        level: KeyLevel,
    ) -> Result<Vec<Balance>, SdkError> {
        let response: GetBalancesResponse = self
            .stub(self.on_behalf_of(level))
            .call(
                GatewayMethod::GetBalances,
                &GetBalancesRequest {
                    account_id: account_ids.to_vec(),
                },
            )
            .await?;
        Ok(response
            .response
            .into_iter()
            .filter(|r| r.status == RequestStatus::SuccessfulRequest)
            .filter_map(|r| r.balance)
            .collect())
    }

    /// Fetch one transaction.
    pub async fn get_transaction(
        &self,
        account_id: &str,
        transaction_id: &str,
        level: KeyLevel,
    ) -> Result<Transaction, SdkError> {
        let response: GetTransactionResponse = self
            .stub(self.on_behalf_of(level))
            .call(
                GatewayMethod::GetTransaction,
                &GetTransactionRequest {
                    account_id: account_id.to_string(),
                    transaction_id: transaction_id.to_string(),
                },
            )
            .await?;
        match (response.status, response.transaction) {
            (RequestStatus::SuccessfulRequest, Some(transaction)) => Ok(transaction),
            _ => Err(SdkError::StepUpRequired(
                "Transaction step up required.".into(),
            )),
        }
    }

    /// One page of an account's transactions.
    pub async fn get_transactions(
        &self,
        account_id: &str,
        offset: Option<&str>,
        limit: u32,
        level: KeyLevel,
    ) -> Result<PagedList<Transaction>, SdkError> {
        let response: GetTransactionsResponse = self
            .stub(self.on_behalf_of(level))
            .call(
                GatewayMethod::GetTransactions,
                &GetTransactionsRequest {
                    account_id: account_id.to_string(),
                    page: Page::new(offset, limit),
                },
            )
            .await?;
        if response.status != RequestStatus::SuccessfulRequest {
            return Err(SdkError::StepUpRequired(
                "Transactions step up required.".into(),
            ));
        }
        Ok(PagedList::new(response.transactions, response.offset))
    }

    /// Where transfers into an account may be sent.
    pub async fn resolve_transfer_destinations(
        &self,
        account_id: &str,
    ) -> Result<Vec<TransferEndpoint>, SdkError> {
        let response: ResolveTransferDestinationsResponse = self
            .stub(self.on_behalf_of(KeyLevel::Low))
            .call(
                GatewayMethod::ResolveTransferDestinations,
                &AccountRequest {
                    account_id: account_id.to_string(),
                },
            )
            .await?;
        Ok(response.destinations)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("member_id", &self.member_id)
            .field("on_behalf_of", &self.on_behalf_of)
            .field("customer_initiated", &self.customer_initiated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CryptoEngineFactory, TokenCryptoEngineFactory};
    use crate::routes::headers;
    use crate::testing::MockGateway;
    use serde_json::json;

    fn client(gateway: &Arc<MockGateway>) -> Client {
        let crypto = TokenCryptoEngineFactory::in_memory().create("m:alice");
        for level in [KeyLevel::Privileged, KeyLevel::Standard, KeyLevel::Low] {
            crypto.generate_key(level).unwrap();
        }
        Client::new("m:alice", crypto, gateway.channel())
    }

    fn member_json() -> serde_json::Value {
        json!({"member": {"id": "m:alice", "last_hash": "h1"}})
    }

    #[tokio::test]
    async fn member_calls_use_low_key_without_delegation() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::GetMember, member_json());
        let mut client = client(&gateway);
        client.use_access_token("tt:granted");

        let member = client.get_member("m:alice").await.unwrap();
        assert_eq!(member.last_hash, "h1");

        let call = &gateway.calls()[0];
        assert_eq!(call.header(headers::KEY_LEVEL), Some("LOW"));
        assert_eq!(call.header(headers::ON_BEHALF_OF), None);
        assert_eq!(call.header(headers::MEMBER_ID), Some("m:alice"));
    }

    #[tokio::test]
    async fn access_token_applies_to_account_calls_until_cleared() {
        let gateway = MockGateway::new();
        let mut client = client(&gateway);

        client.use_access_token("tt:granted");
        client.set_customer_initiated(true);
        client.get_accounts().await.unwrap();
        client.clear_access_token();
        client.get_accounts().await.unwrap();

        let calls = gateway.calls_to(GatewayMethod::GetAccounts);
        assert_eq!(calls[0].header(headers::ON_BEHALF_OF), Some("tt:granted"));
        assert_eq!(calls[0].header(headers::CUSTOMER_INITIATED), Some("true"));
        assert_eq!(calls[1].header(headers::ON_BEHALF_OF), None);
        assert_eq!(calls[1].header(headers::CUSTOMER_INITIATED), None);
    }

    #[tokio::test]
    async fn balance_step_up() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::GetBalance,
            json!({"status": "MORE_SIGNATURES_NEEDED"}),
        );
        let client = client(&gateway);

        let err = client
            .get_balance("a:1", KeyLevel::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::StepUpRequired(ref m) if m == "Balance step up required."));
        assert_eq!(
            gateway.calls()[0].header(headers::KEY_LEVEL),
            Some("STANDARD")
        );
    }

    #[tokio::test]
    async fn balances_keep_only_successful_entries() {
        let gateway = MockGateway::new();
        let balance = json!({
            "account_id": "a:1",
            "current": {"value": "10.0", "currency": "EUR"},
            "available": {"value": "9.0", "currency": "EUR"},
        });
        gateway.respond(
            GatewayMethod::GetBalances,
            json!({"response": [
                {"balance": balance, "status": "SUCCESSFUL_REQUEST"},
                {"status": "MORE_SIGNATURES_NEEDED"},
            ]}),
        );
        let client = client(&gateway);

        let balances = client
            .get_balances(&["a:1".into(), "a:2".into()], KeyLevel::Low)
            .await
            .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].account_id, "a:1");
        assert_eq!(
            gateway.request(GatewayMethod::GetBalances)["account_id"],
            json!(["a:1", "a:2"])
        );
    }

    #[tokio::test]
    async fn transactions_page() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::GetTransactions,
            json!({"transactions": [], "offset": "next", "status": "SUCCESSFUL_REQUEST"}),
        );
        let client = client(&gateway);

        let page = client
            .get_transactions("a:1", None, 20, KeyLevel::Low)
            .await
            .unwrap();
        assert_eq!(page.offset, "next");
        let request = gateway.request(GatewayMethod::GetTransactions);
        assert_eq!(request["page"]["limit"], 20);
        assert!(request["page"].get("offset").is_none());
    }

    #[tokio::test]
    async fn transaction_step_up() {
        let gateway = MockGateway::new();
        let client = client(&gateway);
        let err = client
            .get_transaction("a:1", "t:1", KeyLevel::Low)
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::StepUpRequired(_)));
    }

    #[tokio::test]
    async fn empty_update_is_not_sent() {
        let gateway = MockGateway::new();
        let client = client(&gateway);
        let member = MemberRecord {
            id: "m:alice".into(),
            last_hash: "h1".into(),
            ..Default::default()
        };

        let unchanged = client.update_member(&member, vec![], vec![]).await.unwrap();
        assert_eq!(unchanged, member);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn update_is_signed_with_privileged_key() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::UpdateMember, member_json());
        let client = client(&gateway);
        let member = MemberRecord {
            id: "m:alice".into(),
            last_hash: "h0".into(),
            ..Default::default()
        };

        client
            .update_member(
                &member,
                vec![token_models::remove_key_operation("k:old")],
                vec![],
            )
            .await
            .unwrap();

        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        assert_eq!(request.update.prev_hash, "h0");
        let privileged = client.crypto().create_signer(KeyLevel::Privileged).unwrap();
        assert_eq!(request.update_signature.key_id, privileged.key_id());
        client
            .crypto()
            .create_verifier(&request.update_signature.key_id)
            .unwrap()
            .verify(&request.update, &request.update_signature.signature)
            .unwrap();
    }

    #[tokio::test]
    async fn delete_member_uses_privileged_level() {
        let gateway = MockGateway::new();
        let client = client(&gateway);
        client.delete_member().await.unwrap();
        assert_eq!(
            gateway.calls()[0].header(headers::KEY_LEVEL),
            Some("PRIVILEGED")
        );
    }

    #[tokio::test]
    async fn default_recovery_rule_names_agent() {
        let gateway = MockGateway::new();
        gateway.respond(GatewayMethod::GetMember, member_json());
        gateway.respond(GatewayMethod::GetDefaultAgent, json!({"member_id": "m:agent"}));
        gateway.respond(GatewayMethod::UpdateMember, member_json());
        let client = client(&gateway);

        client.use_default_recovery_rule().await.unwrap();

        let request = gateway.request(GatewayMethod::UpdateMember);
        assert_eq!(
            request["update"]["operations"][0]["recovery_rules"]["recovery_rule"]["primary_agent"],
            "m:agent"
        );
    }

    #[test]
    fn authorize_recovery_is_local() {
        let gateway = MockGateway::new();
        let client = client(&gateway);
        let authorization = Authorization {
            member_id: "m:alice".into(),
            prev_hash: "h1".into(),
            member_key: client.crypto().public_keys().unwrap()[0].clone(),
        };

        let signature = client.authorize_recovery(&authorization).unwrap();
        assert_eq!(signature.member_id, "m:alice");
        client
            .crypto()
            .create_verifier(&signature.key_id)
            .unwrap()
            .verify(&authorization, &signature.signature)
            .unwrap();
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn tracking_metadata_is_sent_until_cleared() {
        let gateway = MockGateway::new();
        let mut client = client(&gateway);
        client.set_tracking_metadata(SecurityMetadata {
            device_fingerprint: "fp".into(),
            ..Default::default()
        });
        client.get_aliases().await.unwrap();
        client.clear_tracking_metadata();
        client.get_aliases().await.unwrap();

        let calls = gateway.calls();
        assert!(calls[0].header(headers::SECURITY_METADATA).is_some());
        assert!(calls[1].header(headers::SECURITY_METADATA).is_none());
    }
}
