//! A member bound to an authenticated client.
//!
//! [`Member`] pairs the latest member record with a [`Client`] acting as
//! that member. Calls that change the record (keys, aliases) refresh the
//! cached record, so the next update chains on the right hash.

use token_models::{
    add_alias_metadata, add_alias_operation, add_key_operation, normalize_alias,
    remove_alias_operation, remove_key_operation, Account, Alias, Authorization, Balance,
    BankInfo, Key, KeyLevel, Member as MemberRecord, MemberOperation, PagedList,
    SecurityMetadata, Signature, TokenRequest, Transaction, TransferEndpoint,
    VerifyEidasPayload, VerifyEidasResponse,
};

use crate::client::Client;
use crate::config::TokenCluster;
use crate::error::SdkError;

/// A Token member.
#[derive(Debug, Clone)]
pub struct Member {
    record: MemberRecord,
    client: Client,
    cluster: TokenCluster,
}

impl Member {
    /// Wrap `record`, making calls through `client`.
    pub fn new(record: MemberRecord, client: Client, cluster: TokenCluster) -> Self {
        Self {
            record,
            client,
            cluster,
        }
    }

    /// Member id.
    pub fn member_id(&self) -> &str {
        &self.record.id
    }

    /// Last known member record.
    pub fn record(&self) -> &MemberRecord {
        &self.record
    }

    /// Keys on the last known record.
    pub fn keys(&self) -> &[Key] {
        &self.record.keys
    }

    /// Cluster the member lives in.
    pub fn cluster(&self) -> TokenCluster {
        self.cluster
    }

    /// Client acting as this member.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Mutable access to the client, for delegation settings.
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Re-fetch the member record.
    pub async fn refresh(&mut self) -> Result<&MemberRecord, SdkError> {
        self.record = self.client.get_member(&self.record.id).await?;
        Ok(&self.record)
    }

    /// Apply `operations` on top of the latest member record.
    pub async fn update_member(
        &mut self,
        operations: Vec<MemberOperation>,
        metadata: Vec<token_models::MemberOperationMetadata>,
    ) -> Result<(), SdkError> {
        let latest = self.client.get_member(&self.record.id).await?;
        self.record = self.client.update_member(&latest, operations, metadata).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Keys & aliases
    // ------------------------------------------------------------------

    /// Add a key.
    pub async fn add_key(&mut self, key: Key) -> Result<(), SdkError> {
        self.add_keys(vec![key]).await
    }

    /// Add keys in one update.
    pub async fn add_keys(&mut self, keys: Vec<Key>) -> Result<(), SdkError> {
        self.update_member(keys.into_iter().map(add_key_operation).collect(), Vec::new())
            .await
    }

    /// Remove a key.
    pub async fn remove_key(&mut self, key_id: &str) -> Result<(), SdkError> {
        self.remove_keys(&[key_id]).await
    }

    /// Remove keys in one update.
    pub async fn remove_keys(&mut self, key_ids: &[&str]) -> Result<(), SdkError> {
        self.update_member(
            key_ids.iter().map(|id| remove_key_operation(*id)).collect(),
            Vec::new(),
        )
        .await
    }

    /// Add an alias. The alias stays unverified until
    /// [`verify_alias`](Self::verify_alias) succeeds.
    pub async fn add_alias(&mut self, alias: &Alias) -> Result<(), SdkError> {
        self.add_aliases(std::slice::from_ref(alias)).await
    }

    /// Add aliases in one update.
    pub async fn add_aliases(&mut self, aliases: &[Alias]) -> Result<(), SdkError> {
        let normalized: Vec<Alias> = aliases.iter().map(normalize_alias).collect();
        let operations = normalized.iter().map(add_alias_operation).collect();
        let metadata = normalized.iter().map(add_alias_metadata).collect();
        self.update_member(operations, metadata).await
    }

    /// Remove an alias.
    pub async fn remove_alias(&mut self, alias: &Alias) -> Result<(), SdkError> {
        self.remove_aliases(std::slice::from_ref(alias)).await
    }

    /// Remove aliases in one update.
    pub async fn remove_aliases(&mut self, aliases: &[Alias]) -> Result<(), SdkError> {
        self.update_member(
            aliases.iter().map(remove_alias_operation).collect(),
            Vec::new(),
        )
        .await
    }

    /// Verified aliases of the member.
    pub async fn aliases(&self) -> Result<Vec<Alias>, SdkError> {
        self.client.get_aliases().await
    }

    /// First verified alias, if any.
    pub async fn first_alias(&self) -> Result<Option<Alias>, SdkError> {
        Ok(self.aliases().await?.into_iter().next())
    }

    /// Resend the verification code for `alias`.
    pub async fn retry_verification(&self, alias: &Alias) -> Result<String, SdkError> {
        self.client.retry_verification(alias).await
    }

    /// Submit an alias verification code.
    pub async fn verify_alias(&self, verification_id: &str, code: &str) -> Result<(), SdkError> {
        self.client.verify_alias(verification_id, code).await
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Name the default recovery agent as the recovery rule.
    pub async fn use_default_recovery_rule(&mut self) -> Result<(), SdkError> {
        self.record = self.client.use_default_recovery_rule().await?;
        Ok(())
    }

    /// Sign a recovery authorization as this member's agent.
    pub fn authorize_recovery(&self, authorization: &Authorization) -> Result<Signature, SdkError> {
        self.client.authorize_recovery(authorization)
    }

    /// Id of the default recovery agent.
    pub async fn get_default_agent(&self) -> Result<String, SdkError> {
        self.client.get_default_agent().await
    }

    /// Delete the member.
    pub async fn delete_member(&self) -> Result<(), SdkError> {
        self.client.delete_member().await
    }

    // ------------------------------------------------------------------
    // Delegation
    // ------------------------------------------------------------------

    /// Act on behalf of the grantor of `access_token_id`.
    pub fn use_access_token(&mut self, access_token_id: impl Into<String>) {
        self.client.use_access_token(access_token_id);
    }

    /// Stop acting on behalf of another member.
    pub fn clear_access_token(&mut self) {
        self.client.clear_access_token();
    }

    /// Mark calls as initiated by the end user.
    pub fn set_customer_initiated(&mut self, customer_initiated: bool) {
        self.client.set_customer_initiated(customer_initiated);
    }

    /// Attach tracking metadata to calls.
    pub fn set_tracking_metadata(&mut self, metadata: SecurityMetadata) {
        self.client.set_tracking_metadata(metadata);
    }

    /// Drop tracking metadata.
    pub fn clear_tracking_metadata(&mut self) {
        self.client.clear_tracking_metadata();
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Fetch one account.
    pub async fn get_account(&self, account_id: &str) -> Result<Account, SdkError> {
        self.client.get_account(account_id).await
    }

    /// List linked accounts.
    pub async fn get_accounts(&self) -> Result<Vec<Account>, SdkError> {
        self.client.get_accounts().await
    }

    /// Balance of an account.
    pub async fn get_balance(&self, account_id: &str, level: KeyLevel) -> Result<Balance, SdkError> {
        self.client.get_balance(account_id, level).await
    }

    /// Balances of several accounts.
    pub async fn get_balances(
        &self,
        account_ids: &[String],
        level: KeyLevel,
    ) -> Result<Vec<Balance>, SdkError> {
        self.client.get_balances(account_ids, level).await
    }

    /// Fetch one transaction.
    pub async fn get_transaction(
        &self,
        account_id: &str,
        transaction_id: &str,
        level: KeyLevel,
    ) -> Result<Transaction, SdkError> {
        self.client
            .get_transaction(account_id, transaction_id, level)
            .await
    }

    /// One page of an account's transactions.
    pub async fn get_transactions(
        &self,
        account_id: &str,
        offset: Option<&str>,
        limit: u32,
        level: KeyLevel,
    ) -> Result<PagedList<Transaction>, SdkError> {
        self.client
            .get_transactions(account_id, offset, limit, level)
            .await
    }

    /// Where transfers into an account may be sent.
    pub async fn resolve_transfer_destinations(
        &self,
        account_id: &str,
    ) -> Result<Vec<TransferEndpoint>, SdkError> {
        self.client.resolve_transfer_destinations(account_id).await
    }

    /// Linking information of a bank.
    pub async fn get_bank_info(&self, bank_id: &str) -> Result<BankInfo, SdkError> {
        self.client.get_bank_info(bank_id).await
    }

    // ------------------------------------------------------------------
    // Token requests & eIDAS
    // ------------------------------------------------------------------

    /// Store a token request; returns its id.
    pub async fn store_token_request(&self, request: &TokenRequest) -> Result<String, SdkError> {
        self.client.store_token_request(request).await
    }

    /// Verify an eIDAS certificate.
    pub async fn verify_eidas(
        &self,
        payload: VerifyEidasPayload,
        signature: String,
    ) -> Result<VerifyEidasResponse, SdkError> {
        self.client.verify_eidas(payload, signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CryptoEngineFactory, TokenCryptoEngineFactory};
    use crate::routes::GatewayMethod;
    use crate::testing::MockGateway;
    use serde_json::json;
    use token_models::gateway::UpdateMemberRequest;

    fn member(gateway: &std::sync::Arc<MockGateway>) -> Member {
        let crypto = TokenCryptoEngineFactory::in_memory().create("m:carol");
        crypto.generate_key(KeyLevel::Privileged).unwrap();
        crypto.generate_key(KeyLevel::Low).unwrap();
        let client = Client::new("m:carol", crypto, gateway.channel());
        let record = MemberRecord {
            id: "m:carol".into(),
            last_hash: "h0".into(),
            ..Default::default()
        };
        Member::new(record, client, TokenCluster::Sandbox)
    }

    #[tokio::test]
    async fn add_alias_normalizes_and_refreshes_record() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::GetMember,
            json!({"member": {"id": "m:carol", "last_hash": "h1"}}),
        );
        gateway.respond(
            GatewayMethod::UpdateMember,
            json!({"member": {"id": "m:carol", "last_hash": "h2", "alias_hashes": ["x"]}}),
        );
        let mut member = member(&gateway);

        member
            .add_alias(&Alias::email(" Carol@Example.com"))
            .await
            .unwrap();

        assert_eq!(member.record().last_hash, "h2");
        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        assert_eq!(request.update.prev_hash, "h1");
        let token_models::MemberOperationMetadata::AddAliasMetadata(meta) = &request.metadata[0];
        assert_eq!(meta.alias.value, "carol@example.com");
    }

    #[tokio::test]
    async fn remove_keys_in_one_update() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::GetMember,
            json!({"member": {"id": "m:carol", "last_hash": "h1"}}),
        );
        gateway.respond(
            GatewayMethod::UpdateMember,
            json!({"member": {"id": "m:carol", "last_hash": "h2"}}),
        );
        let mut member = member(&gateway);

        member.remove_keys(&["k:1", "k:2"]).await.unwrap();

        assert_eq!(gateway.calls_to(GatewayMethod::UpdateMember).len(), 1);
        let request: UpdateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::UpdateMember)).unwrap();
        assert_eq!(request.update.operations.len(), 2);
    }

    #[tokio::test]
    async fn first_alias_of_member_without_aliases() {
        let gateway = MockGateway::new();
        let member = member(&gateway);
        assert_eq!(member.first_alias().await.unwrap(), None);
    }
}
