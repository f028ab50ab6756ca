//! Blocking variants of [`TokenClient`](crate::TokenClient) and
//! [`Member`](crate::Member).
//!
//! Each blocking client owns a current-thread Tokio runtime and runs every
//! call to completion on it. Do not use these types from inside an async
//! context; `block_on` panics there.
//!
//! ```no_run
//! use token_models::Alias;
//! use token_sdk::{blocking, TokenClientBuilder};
//!
//! # fn run() -> Result<(), token_sdk::SdkError> {
//! let client = blocking::TokenClient::new(TokenClientBuilder::from_env())?;
//! let exists = client.alias_exists(&Alias::email("alice@example.com"))?;
//! println!("alias taken: {exists}");
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Runtime;

use token_models::{
    Account, Alias, Authorization, Balance, Bank, BankInfo, Blob, CreateMemberType, DeviceInfo,
    DeviceMetadata, Key, KeyLevel, Member as MemberRecord, MemberOperation,
    MemberOperationMetadata, MemberRecoveryOperation, NotifyStatus, PagedList, SecurityMetadata,
    Signature, TokenMember, TokenRequest, Transaction, TransferEndpoint, VerifyEidasPayload,
    VerifyEidasResponse,
};

use crate::config::{TokenClientBuilder, TokenCluster};
use crate::crypto::CryptoEngine;
use crate::error::SdkError;
use crate::unauthenticated::BankQuery;

#[derive(Clone)]
struct Blocker(Arc<Runtime>);

impl Blocker {
    fn new() -> Result<Self, SdkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SdkError::Config(e.to_string()))?;
        Ok(Self(Arc::new(runtime)))
    }

    fn run<F: Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}

/// Blocking [`TokenClient`](crate::TokenClient).
#[derive(Clone)]
pub struct TokenClient {
    inner: crate::TokenClient,
    runtime: Blocker,
}

impl TokenClient {
    /// Build a blocking client from `builder`.
    pub fn new(builder: TokenClientBuilder) -> Result<Self, SdkError> {
        Ok(Self {
            runtime: Blocker::new()?,
            inner: builder.build()?,
        })
    }

    /// The async client underneath.
    pub fn as_async(&self) -> &crate::TokenClient {
        &self.inner
    }

    /// Cluster the client talks to.
    pub fn cluster(&self) -> TokenCluster {
        self.inner.cluster()
    }

    fn member(&self, member: crate::Member) -> Member {
        Member {
            inner: member,
            runtime: self.runtime.clone(),
        }
    }

    /// See [`crate::TokenClient::shutdown`].
    pub fn shutdown(&self) {
        self.runtime.run(self.inner.shutdown());
    }

    /// See [`crate::TokenClient::alias_exists`].
    pub fn alias_exists(&self, alias: &Alias) -> Result<bool, SdkError> {
        self.runtime.run(self.inner.alias_exists(alias))
    }

    /// See [`crate::TokenClient::get_member_id`].
    pub fn get_member_id(&self, alias: &Alias) -> Result<String, SdkError> {
        self.runtime.run(self.inner.get_member_id(alias))
    }

    /// See [`crate::TokenClient::resolve_alias`].
    pub fn resolve_alias(&self, alias: &Alias) -> Result<Option<TokenMember>, SdkError> {
        self.runtime.run(self.inner.resolve_alias(alias))
    }

    /// See [`crate::TokenClient::create_member`].
    pub fn create_member(
        &self,
        alias: Option<&Alias>,
        member_type: CreateMemberType,
    ) -> Result<Member, SdkError> {
        let member = self
            .runtime
            .run(self.inner.create_member(alias, member_type))?;
        Ok(self.member(member))
    }

    /// See [`crate::TokenClient::create_member_in_realm`].
    pub fn create_member_in_realm(
        &self,
        alias: Option<&Alias>,
        member_type: CreateMemberType,
        realm_id: &str,
    ) -> Result<Member, SdkError> {
        let member = self.runtime.run(
            self.inner
                .create_member_in_realm(alias, member_type, realm_id),
        )?;
        Ok(self.member(member))
    }

    /// See [`crate::TokenClient::set_up_member`].
    pub fn set_up_member(&self, alias: Option<&Alias>, member_id: &str) -> Result<Member, SdkError> {
        let member = self.runtime.run(self.inner.set_up_member(alias, member_id))?;
        Ok(self.member(member))
    }

    /// See [`crate::TokenClient::provision_device`].
    pub fn provision_device(&self, alias: &Alias) -> Result<DeviceInfo, SdkError> {
        self.runtime.run(self.inner.provision_device(alias))
    }

    /// See [`crate::TokenClient::get_member`].
    pub fn get_member(&self, member_id: &str) -> Result<Member, SdkError> {
        let member = self.runtime.run(self.inner.get_member(member_id))?;
        Ok(self.member(member))
    }

    /// See [`crate::TokenClient::notify_add_key`].
    pub fn notify_add_key(
        &self,
        alias: &Alias,
        keys: Vec<Key>,
        device_metadata: DeviceMetadata,
    ) -> Result<NotifyStatus, SdkError> {
        self.runtime
            .run(self.inner.notify_add_key(alias, keys, device_metadata))
    }

    /// See [`crate::TokenClient::invalidate_notification`].
    pub fn invalidate_notification(&self, notification_id: &str) -> Result<NotifyStatus, SdkError> {
        self.runtime
            .run(self.inner.invalidate_notification(notification_id))
    }

    /// See [`crate::TokenClient::get_blob`].
    pub fn get_blob(&self, blob_id: &str) -> Result<Blob, SdkError> {
        self.runtime.run(self.inner.get_blob(blob_id))
    }

    /// See [`crate::TokenClient::begin_recovery`].
    pub fn begin_recovery(&self, alias: &Alias) -> Result<String, SdkError> {
        self.runtime.run(self.inner.begin_recovery(alias))
    }

    /// See [`crate::TokenClient::create_recovery_authorization`].
    pub fn create_recovery_authorization(
        &self,
        member_id: &str,
        privileged_key: &Key,
    ) -> Result<Authorization, SdkError> {
        self.runtime.run(
            self.inner
                .create_recovery_authorization(member_id, privileged_key),
        )
    }

    /// See [`crate::TokenClient::get_recovery_authorization`].
    pub fn get_recovery_authorization(
        &self,
        verification_id: &str,
        code: &str,
        privileged_key: &Key,
    ) -> Result<MemberRecoveryOperation, SdkError> {
        self.runtime.run(
            self.inner
                .get_recovery_authorization(verification_id, code, privileged_key),
        )
    }

    /// See [`crate::TokenClient::complete_recovery`].
    pub fn complete_recovery(
        &self,
        member_id: &str,
        recovery_operations: Vec<MemberRecoveryOperation>,
        privileged_key: Key,
        crypto: Arc<dyn CryptoEngine>,
    ) -> Result<Member, SdkError> {
        let member = self.runtime.run(self.inner.complete_recovery(
            member_id,
            recovery_operations,
            privileged_key,
            crypto,
        ))?;
        Ok(self.member(member))
    }

    /// See [`crate::TokenClient::complete_recovery_with_default_rule`].
    pub fn complete_recovery_with_default_rule(
        &self,
        member_id: &str,
        verification_id: &str,
        code: &str,
    ) -> Result<Member, SdkError> {
        let member = self.runtime.run(
            self.inner
                .complete_recovery_with_default_rule(member_id, verification_id, code),
        )?;
        Ok(self.member(member))
    }

    /// See [`crate::TokenClient::get_banks`].
    pub fn get_banks(&self, query: &BankQuery) -> Result<Vec<Bank>, SdkError> {
        self.runtime.run(self.inner.get_banks(query))
    }

    /// See [`crate::TokenClient::retrieve_token_request`].
    pub fn retrieve_token_request(&self, request_id: &str) -> Result<TokenRequest, SdkError> {
        self.runtime.run(self.inner.retrieve_token_request(request_id))
    }
}

/// Blocking [`Member`](crate::Member).
#[derive(Clone)]
pub struct Member {
    inner: crate::Member,
    runtime: Blocker,
}

impl Member {
    /// The async member underneath.
    pub fn as_async(&self) -> &crate::Member {
        &self.inner
    }

    /// Member id.
    pub fn member_id(&self) -> &str {
        self.inner.member_id()
    }

    /// Last known member record.
    pub fn record(&self) -> &MemberRecord {
        self.inner.record()
    }

    /// Keys on the last known record.
    pub fn keys(&self) -> &[Key] {
        self.inner.keys()
    }

    /// See [`crate::Member::refresh`].
    pub fn refresh(&mut self) -> Result<&MemberRecord, SdkError> {
        self.runtime.run(self.inner.refresh())
    }

    /// See [`crate::Member::update_member`].
    pub fn update_member(
        &mut self,
        operations: Vec<MemberOperation>,
        metadata: Vec<MemberOperationMetadata>,
    ) -> Result<(), SdkError> {
        self.runtime.run(self.inner.update_member(operations, metadata))
    }

    /// See [`crate::Member::add_key`].
    pub fn add_key(&mut self, key: Key) -> Result<(), SdkError> {
        self.runtime.run(self.inner.add_key(key))
    }

    /// See [`crate::Member::add_keys`].
    pub fn add_keys(&mut self, keys: Vec<Key>) -> Result<(), SdkError> {
        self.runtime.run(self.inner.add_keys(keys))
    }

    /// See [`crate::Member::remove_key`].
    pub fn remove_key(&mut self, key_id: &str) -> Result<(), SdkError> {
        self.runtime.run(self.inner.remove_key(key_id))
    }

    /// See [`crate::Member::remove_keys`].
    pub fn remove_keys(&mut self, key_ids: &[&str]) -> Result<(), SdkError> {
        self.runtime.run(self.inner.remove_keys(key_ids))
    }

    /// See [`crate::Member::add_alias`].
    pub fn add_alias(&mut self, alias: &Alias) -> Result<(), SdkError> {
        self.runtime.run(self.inner.add_alias(alias))
    }

    /// See [`crate::Member::add_aliases`].
    pub fn add_aliases(&mut self, aliases: &[Alias]) -> Result<(), SdkError> {
        self.runtime.run(self.inner.add_aliases(aliases))
    }

    /// See [`crate::Member::remove_alias`].
    pub fn remove_alias(&mut self, alias: &Alias) -> Result<(), SdkError> {
        self.runtime.run(self.inner.remove_alias(alias))
    }

    /// See [`crate::Member::remove_aliases`].
    pub fn remove_aliases(&mut self, aliases: &[Alias]) -> Result<(), SdkError> {
        self.runtime.run(self.inner.remove_aliases(aliases))
    }

    /// See [`crate::Member::aliases`].
    pub fn aliases(&self) -> Result<Vec<Alias>, SdkError> {
        self.runtime.run(self.inner.aliases())
    }

    /// See [`crate::Member::first_alias`].
    pub fn first_alias(&self) -> Result<Option<Alias>, SdkError> {
        self.runtime.run(self.inner.first_alias())
    }

    /// See [`crate::Member::retry_verification`].
    pub fn retry_verification(&self, alias: &Alias) -> Result<String, SdkError> {
        self.runtime.run(self.inner.retry_verification(alias))
    }

    /// See [`crate::Member::verify_alias`].
    pub fn verify_alias(&self, verification_id: &str, code: &str) -> Result<(), SdkError> {
        self.runtime.run(self.inner.verify_alias(verification_id, code))
    }

    /// See [`crate::Member::use_default_recovery_rule`].
    pub fn use_default_recovery_rule(&mut self) -> Result<(), SdkError> {
        self.runtime.run(self.inner.use_default_recovery_rule())
    }

    /// See [`crate::Member::authorize_recovery`].
    pub fn authorize_recovery(&self, authorization: &Authorization) -> Result<Signature, SdkError> {
        self.inner.authorize_recovery(authorization)
    }

    /// See [`crate::Member::get_default_agent`].
    pub fn get_default_agent(&self) -> Result<String, SdkError> {
        self.runtime.run(self.inner.get_default_agent())
    }

    /// See [`crate::Member::delete_member`].
    pub fn delete_member(&self) -> Result<(), SdkError> {
        self.runtime.run(self.inner.delete_member())
    }

    /// See [`crate::Member::use_access_token`].
    pub fn use_access_token(&mut self, access_token_id: impl Into<String>) {
        self.inner.use_access_token(access_token_id);
    }

    /// See [`crate::Member::clear_access_token`].
    pub fn clear_access_token(&mut self) {
        self.inner.clear_access_token();
    }

    /// See [`crate::Member::set_customer_initiated`].
    pub fn set_customer_initiated(&mut self, customer_initiated: bool) {
        self.inner.set_customer_initiated(customer_initiated);
    }

    /// See [`crate::Member::set_tracking_metadata`].
    pub fn set_tracking_metadata(&mut self, metadata: SecurityMetadata) {
        self.inner.set_tracking_metadata(metadata);
    }

    /// See [`crate::Member::clear_tracking_metadata`].
    pub fn clear_tracking_metadata(&mut self) {
        self.inner.clear_tracking_metadata();
    }

    /// See [`crate::Member::get_account`].
    pub fn get_account(&self, account_id: &str) -> Result<Account, SdkError> {
        self.runtime.run(self.inner.get_account(account_id))
    }

    /// See [`crate::Member::get_accounts`].
    pub fn get_accounts(&self) -> Result<Vec<Account>, SdkError> {
        self.runtime.run(self.inner.get_accounts())
    }

    /// See [`crate::Member::get_balance`].
    pub fn get_balance(&self, account_id: &str, level: KeyLevel) -> Result<Balance, SdkError> {
        self.runtime.run(self.inner.get_balance(account_id, level))
    }

    /// See [`crate::Member::get_balances`].
    pub fn get_balances(&self, account_ids: &[String], level: KeyLevel) -> Result<Vec<Balance>, SdkError> {
        self.runtime.run(self.inner.get_balances(account_ids, level))
    }

    /// See [`crate::Member::get_transaction`].
    pub fn get_transaction(
        &self,
        account_id: &str,
        transaction_id: &str,
        level: KeyLevel,
    ) -> Result<Transaction, SdkError> {
        self.runtime
            .run(self.inner.get_transaction(account_id, transaction_id, level))
    }

    /// See [`crate::Member::get_transactions`].
    pub fn get_transactions(
        &self,
        account_id: &str,
        offset: Option<&str>,
        limit: u32,
        level: KeyLevel,
    ) -> Result<PagedList<Transaction>, SdkError> {
        self.runtime
            .run(self.inner.get_transactions(account_id, offset, limit, level))
    }

    /// See [`crate::Member::resolve_transfer_destinations`].
    pub fn resolve_transfer_destinations(
        &self,
        account_id: &str,
    ) -> Result<Vec<TransferEndpoint>, SdkError> {
        self.runtime
            .run(self.inner.resolve_transfer_destinations(account_id))
    }

    /// See [`crate::Member::get_bank_info`].
    pub fn get_bank_info(&self, bank_id: &str) -> Result<BankInfo, SdkError> {
        self.runtime.run(self.inner.get_bank_info(bank_id))
    }

    /// See [`crate::Member::store_token_request`].
    pub fn store_token_request(&self, request: &TokenRequest) -> Result<String, SdkError> {
        self.runtime.run(self.inner.store_token_request(request))
    }

    /// See [`crate::Member::verify_eidas`].
    pub fn verify_eidas(
        &self,
        payload: VerifyEidasPayload,
        signature: String,
    ) -> Result<VerifyEidasResponse, SdkError> {
        self.runtime.run(self.inner.verify_eidas(payload, signature))
    }
}
