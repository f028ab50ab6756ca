//! Gateway RPC messages.
//!
//! One request/response pair per gateway method. Method names live in
//! `token_sdk::routes::GatewayMethod`; this module only describes bodies.
//!
//! | Group | Methods |
//! |-------|---------|
//! | Members | `CreateMember`, `UpdateMember`, `GetMember`, `DeleteMember`, `ResolveAlias`, `GetAliases`, `GetDefaultAgent` |
//! | Verification | `RetryVerification`, `VerifyAlias`, `BeginRecovery`, `CompleteRecovery` |
//! | Accounts | `GetAccount`, `GetAccounts`, `GetBalance`, `GetBalances`, `GetTransaction`, `GetTransactions`, `ResolveTransferDestinations` |
//! | Banks | `GetBankInfo`, `GetBanks` |
//! | Notifications | `Notify`, `InvalidateNotification`, `GetBlob` |
//! | Token requests | `StoreTokenRequest`, `RetrieveTokenRequest` |
//! | eIDAS | `VerifyEidas` |
//!
//! Response fields default when absent so that an older gateway omitting a
//! field still decodes.

use serde::{Deserialize, Serialize};

use crate::account::{
    Account, Balance, Bank, BankInfo, Page, Paging, RequestStatus, Transaction,
    TransferEndpoint,
};
use crate::alias::Alias;
use crate::eidas::VerifyEidasPayload;
use crate::member::{
    CreateMemberType, Member, MemberOperationMetadata, MemberRecoveryOperation, MemberUpdate,
    TokenMember,
};
use crate::notification::{Blob, NotifyBody, NotifyStatus};
use crate::security::{Key, Signature};
use crate::token_request::{TokenRequestOptions, TokenRequestPayload};

/// Empty message, for requests and responses without fields.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Empty {}

/// Error body the gateway sends alongside a non-2xx HTTP status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorBody {
    /// RPC status code name, e.g. `NOT_FOUND`.
    pub code: String,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
}

/// Outcome of a verification-code check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Unset.
    #[default]
    Invalid,
    /// Unknown verification id.
    Unknown,
    /// The code matched.
    Success,
    /// The code did not match.
    IncorrectCode,
    /// The code expired.
    ExpiredCode,
    /// Too many wrong codes were entered.
    TooManyCodeAttempts,
}

// ─── Members ─────────────────────────────────────────────────────────

/// `CreateMember`: reserve a fresh member id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateMemberRequest {
    /// Random nonce making the request idempotent.
    pub nonce: String,
    /// Member type.
    pub member_type: CreateMemberType,
    /// Realm to create the member in; empty for the global realm.
    #[serde(default)]
    pub realm_id: String,
    /// Token request that triggered the creation, if any.
    #[serde(default)]
    pub token_request_id: String,
}

/// Answer to [`CreateMemberRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateMemberResponse {
    /// The reserved id.
    #[serde(default)]
    pub member_id: String,
}

/// `UpdateMember`: apply a signed member update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateMemberRequest {
    /// The update.
    pub update: MemberUpdate,
    /// Signature over the canonical serialization of `update`.
    pub update_signature: Signature,
    /// Unsigned side information.
    #[serde(default)]
    pub metadata: Vec<MemberOperationMetadata>,
}

/// Answer carrying a member record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MemberResponse {
    /// The member after the call.
    #[serde(default)]
    pub member: Member,
}

/// `GetMember`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetMemberRequest {
    /// Member to fetch.
    pub member_id: String,
}

/// `ResolveAlias`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolveAliasRequest {
    /// Alias to look up.
    pub alias: Alias,
}

/// Answer to [`ResolveAliasRequest`]; `member` is absent when unknown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolveAliasResponse {
    /// The owning member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<TokenMember>,
}

/// Answer to `GetAliases`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetAliasesResponse {
    /// Verified aliases.
    #[serde(default)]
    pub aliases: Vec<Alias>,
    /// Aliases still awaiting verification.
    #[serde(default)]
    pub unverified_aliases: Vec<Alias>,
}

/// Answer to `GetDefaultAgent`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetDefaultAgentResponse {
    /// Member id of the default recovery agent.
    #[serde(default)]
    pub member_id: String,
}

// ─── Verification & recovery ─────────────────────────────────────────

/// `RetryVerification`: resend the verification code for an alias.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryVerificationRequest {
    /// Member owning the alias.
    pub member_id: String,
    /// Alias to verify.
    pub alias: Alias,
}

/// Answer carrying a verification id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationIdResponse {
    /// The verification id.
    #[serde(default)]
    pub verification_id: String,
}

/// `VerifyAlias`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyAliasRequest {
    /// Verification id.
    pub verification_id: String,
    /// Code received by the user.
    pub code: String,
}

/// `BeginRecovery`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BeginRecoveryRequest {
    /// Alias of the member to recover.
    pub alias: Alias,
}

/// `CompleteRecovery`: exchange a verification code for an agent-signed
/// recovery operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CompleteRecoveryRequest {
    /// Verification id from `BeginRecovery`.
    pub verification_id: String,
    /// Code received by the user.
    pub code: String,
    /// New privileged key.
    pub key: Key,
}

/// Answer to [`CompleteRecoveryRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CompleteRecoveryResponse {
    /// The agent-signed recovery, valid only when `status` is success.
    #[serde(default)]
    pub recovery_entry: MemberRecoveryOperation,
    /// Outcome of the code check.
    #[serde(default)]
    pub status: VerificationStatus,
}

// ─── Accounts ────────────────────────────────────────────────────────

/// Request addressing one account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountRequest {
    /// Account id.
    pub account_id: String,
}

/// Answer to `GetAccount`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetAccountResponse {
    /// The account.
    #[serde(default)]
    pub account: Account,
}

/// Answer to `GetAccounts`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetAccountsResponse {
    /// Linked accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Answer to `GetBalance`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBalanceResponse {
    /// The balance, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
    /// Whether a higher key level is needed.
    #[serde(default)]
    pub status: RequestStatus,
}

/// `GetBalances`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBalancesRequest {
    /// Accounts to query.
    pub account_id: Vec<String>,
}

/// Answer to [`GetBalancesRequest`], one entry per account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBalancesResponse {
    /// Per-account answers.
    #[serde(default)]
    pub response: Vec<GetBalanceResponse>,
}

/// `GetTransaction`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetTransactionRequest {
    /// Account id.
    pub account_id: String,
    /// Transaction id.
    pub transaction_id: String,
}

/// Answer to [`GetTransactionRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetTransactionResponse {
    /// The transaction, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    /// Whether a higher key level is needed.
    #[serde(default)]
    pub status: RequestStatus,
}

/// `GetTransactions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetTransactionsRequest {
    /// Account id.
    pub account_id: String,
    /// Page to fetch.
    pub page: Page,
}

/// Answer to [`GetTransactionsRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetTransactionsResponse {
    /// Transactions on this page.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Offset of the next page.
    #[serde(default)]
    pub offset: String,
    /// Whether a higher key level is needed.
    #[serde(default)]
    pub status: RequestStatus,
}

/// Answer to `ResolveTransferDestinations`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolveTransferDestinationsResponse {
    /// Where money can be sent to reach the account.
    #[serde(default)]
    pub destinations: Vec<TransferEndpoint>,
}

// ─── Banks ───────────────────────────────────────────────────────────

/// `GetBankInfo`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBankInfoRequest {
    /// Bank id.
    pub bank_id: String,
}

/// Answer to [`GetBankInfoRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBankInfoResponse {
    /// Linking information.
    #[serde(default)]
    pub info: BankInfo,
}

/// `GetBanks`. Unset filters do not restrict the result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBanksRequest {
    /// Only these bank ids (case-insensitive), at most 1000.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    /// Substring of name or identifier (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// ISO 3166-1 alpha-2 country (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Page to fetch, 1-based; the gateway defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size, at most 200; the gateway defaults to 200.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Sort key: `name`, `provider` or `country`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Connectivity provider (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Answer to [`GetBanksRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBanksResponse {
    /// Matching banks.
    #[serde(default)]
    pub banks: Vec<Bank>,
    /// Page metadata.
    #[serde(default)]
    pub paging: Paging,
}

// ─── Notifications & blobs ───────────────────────────────────────────

/// `Notify`: push a notification to the devices of an alias.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    /// Recipient.
    pub alias: Alias,
    /// Notification body.
    pub body: NotifyBody,
}

/// `InvalidateNotification`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct InvalidateNotificationRequest {
    /// Notification to invalidate.
    pub notification_id: String,
}

/// Answer carrying a notification status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct NotifyResponse {
    /// Delivery status.
    #[serde(default)]
    pub status: NotifyStatus,
}

/// `GetBlob`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBlobRequest {
    /// Blob id.
    pub blob_id: String,
}

/// Answer to [`GetBlobRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GetBlobResponse {
    /// The blob.
    #[serde(default)]
    pub blob: Blob,
}

// ─── Token requests ──────────────────────────────────────────────────

/// `StoreTokenRequest`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreTokenRequestRequest {
    /// Payload.
    pub request_payload: TokenRequestPayload,
    /// Options.
    pub request_options: TokenRequestOptions,
}

/// A token request as stored by the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredTokenRequest {
    /// Request id, used to start the web flow.
    pub id: String,
    /// Payload.
    #[serde(default)]
    pub request_payload: TokenRequestPayload,
    /// Options.
    #[serde(default)]
    pub request_options: TokenRequestOptions,
}

/// Answer carrying a stored token request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenRequestResponse {
    /// The stored request.
    #[serde(default)]
    pub token_request: StoredTokenRequest,
}

/// `RetrieveTokenRequest`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RetrieveTokenRequestRequest {
    /// Request id.
    pub request_id: String,
}

// ─── eIDAS ───────────────────────────────────────────────────────────

/// `VerifyEidas`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyEidasRequest {
    /// What was signed.
    pub payload: VerifyEidasPayload,
    /// Base64url signature over the canonical payload, made with the
    /// certificate's private key.
    pub signature: String,
}
