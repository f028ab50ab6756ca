//! Token-request payloads.
//!
//! A token request describes a token a TPP would like a user to approve:
//! who receives it, what it allows (account access, a one-off transfer, a
//! standing order) and how the web flow should behave. The SDK populates
//! these messages; it never interprets them. Use the builders in
//! [`request_builder`](crate::request_builder) rather than filling them in
//! by hand.

use serde::{Deserialize, Serialize};

use crate::account::{TransferDestination, TransferEndpoint};
use crate::canonical::{decode_base64url, encode_base64url};
use crate::error::ModelError;
use crate::member::TokenMember;

/// Resources an access token may grant.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// List accounts.
    Accounts,
    /// Read balances.
    Balances,
    /// Read transactions.
    Transactions,
    /// Read transfer destinations.
    TransferDestinations,
    /// Confirm availability of funds.
    FundsConfirmations,
}

/// Body of an access-token request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessBody {
    /// Requested resource types.
    #[serde(rename = "type")]
    pub resource_types: Vec<ResourceType>,
}

/// Who bears foreign-exchange and transfer charges (ISO 20022).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeBearer {
    /// Borne by the creditor.
    Cred,
    /// Borne by the debtor.
    Debt,
    /// Shared.
    Shar,
    /// Following the service level.
    Slev,
}

/// Metadata understood by a specific provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTransferMetadata {
    /// UK Open Banking (CMA9) fields.
    Cma9 {
        /// End-to-end identification.
        #[serde(default)]
        end_to_end_identification: String,
        /// Instruction identification.
        #[serde(default)]
        instruction_identification: String,
        /// Payment context code.
        #[serde(default)]
        payment_context_code: String,
        /// Merchant category code.
        #[serde(default)]
        merchant_category_code: String,
    },
    /// Berlin Group NextGenPSD2 fields.
    NextGenPsd2 {
        /// Structured remittance information.
        #[serde(default)]
        remittance_information_structured: String,
    },
}

/// Transfer metadata shared by one-off transfers and standing orders.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferMetadata {
    /// Provider-specific metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_transfer_metadata: Option<ProviderTransferMetadata>,
    /// Charge bearer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_bearer: Option<ChargeBearer>,
    /// Ultimate party the money is due to.
    #[serde(default)]
    pub ultimate_creditor: String,
    /// Ultimate party that owes the money.
    #[serde(default)]
    pub ultimate_debtor: String,
    /// ISO 20022 purpose code.
    #[serde(default)]
    pub purpose_code: String,
}

/// Source, destinations and metadata of a transfer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferInstructions {
    /// Source account, if preselected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TransferEndpoint>,
    /// Candidate destinations.
    #[serde(default)]
    pub transfer_destinations: Vec<TransferDestination>,
    /// Transfer metadata.
    #[serde(default)]
    pub metadata: TransferMetadata,
}

/// Body of a transfer-token request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferBody {
    /// Maximum total amount over the token's lifetime.
    pub lifetime_amount: String,
    /// ISO 4217 currency.
    pub currency: String,
    /// Maximum amount per charge; empty when unrestricted.
    #[serde(default)]
    pub amount: String,
    /// Execution date for future-dated payments, `YYYYMMDD`.
    #[serde(default)]
    pub execution_date: String,
    /// Legacy destinations.
    #[serde(default)]
    pub destinations: Vec<TransferEndpoint>,
    /// Transfer instructions.
    #[serde(default)]
    pub instructions: TransferInstructions,
}

/// Body of a standing-order request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StandingOrderBody {
    /// Amount per individual charge.
    #[serde(default)]
    pub amount: String,
    /// ISO 4217 currency.
    #[serde(default)]
    pub currency: String,
    /// ISO 20022 frequency code: `DAIL`, `WEEK`, `TOWK`, `MNTH`, `TOMN`,
    /// `QUTR`, `SEMI`, `YEAR`.
    #[serde(default)]
    pub frequency: String,
    /// Start date, ISO 8601.
    #[serde(default)]
    pub start_date: String,
    /// End date, ISO 8601; empty for an open-ended order.
    #[serde(default)]
    pub end_date: String,
    /// Transfer instructions.
    #[serde(default)]
    pub instructions: TransferInstructions,
}

/// What the requested token allows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestBody {
    /// Account information access.
    Access(AccessBody),
    /// A (possibly recurring) transfer up to a lifetime amount.
    Transfer(TransferBody),
    /// A standing order.
    StandingOrder(StandingOrderBody),
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Access(AccessBody::default())
    }
}

impl From<AccessBody> for RequestBody {
    fn from(body: AccessBody) -> Self {
        RequestBody::Access(body)
    }
}

impl From<TransferBody> for RequestBody {
    fn from(body: TransferBody) -> Self {
        RequestBody::Transfer(body)
    }
}

impl From<StandingOrderBody> for RequestBody {
    fn from(body: StandingOrderBody) -> Self {
        RequestBody::StandingOrder(body)
    }
}

/// The entity a redeemer acts on behalf of.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ActingAs {
    /// Display name shown to the user.
    pub display_name: String,
    /// The redeemer's reference for the entity.
    #[serde(default)]
    pub ref_id: String,
    /// Logo shown to the user.
    #[serde(default)]
    pub logo_url: String,
    /// Secondary display name.
    #[serde(default)]
    pub secondary_name: String,
}

/// The part of a token request that ends up in the token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenRequestPayload {
    /// TPP's reference for the user.
    #[serde(default)]
    pub user_ref_id: String,
    /// Web-app customization id.
    #[serde(default)]
    pub customization_id: String,
    /// Where the web flow redirects when done.
    #[serde(default)]
    pub redirect_url: String,
    /// TPP's reference for the token.
    #[serde(default)]
    pub ref_id: String,
    /// Payee / grantee.
    #[serde(default)]
    pub to: TokenMember,
    /// Entity the redeemer acts for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_as: Option<ActingAs>,
    /// Description shown to the user.
    #[serde(default)]
    pub description: String,
    /// Serialized [`TokenRequestState`].
    #[serde(default)]
    pub callback_state: String,
    /// Narrows the country selection in the web flow.
    #[serde(default)]
    pub destination_country: String,
    /// What the token allows.
    pub request_body: RequestBody,
}

/// Web-flow options that do not end up in the token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenRequestOptions {
    /// Preselected bank.
    #[serde(default)]
    pub bank_id: String,
    /// Preselected payer / grantor.
    #[serde(default)]
    pub from: TokenMember,
    /// Preselected source account.
    #[serde(default)]
    pub source_account_id: String,
    /// Send a receipt to the payee's default receipt address.
    #[serde(default)]
    pub receipt_requested: bool,
}

/// State carried through the web flow and handed back on the callback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenRequestState {
    /// Hash of the CSRF token; empty when none was set.
    pub csrf_token_hash: String,
    /// Developer-supplied state; empty when none was set.
    pub state: String,
}

impl TokenRequestState {
    /// Create a state value.
    pub fn new(csrf_token_hash: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            csrf_token_hash: csrf_token_hash.into(),
            state: state.into(),
        }
    }

    /// URL-safe serialized form (base64url of the JSON).
    pub fn serialize(&self) -> Result<String, ModelError> {
        Ok(encode_base64url(serde_json::to_string(self)?.as_bytes()))
    }

    /// Parse the form produced by [`serialize`](Self::serialize).
    pub fn parse(serialized: &str) -> Result<Self, ModelError> {
        let invalid = |reason: String| ModelError::InvalidCallbackState {
            value: serialized.to_string(),
            reason,
        };
        let bytes = decode_base64url(serialized).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))
    }
}
