//! Accounts, balances, transactions, transfer endpoints and banks.

use serde::{Deserialize, Serialize};

/// Outcome of a request that may need a higher key level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Unset / unrecognised.
    #[default]
    InvalidRequest,
    /// The request was served.
    SuccessfulRequest,
    /// The caller must repeat the call at a higher key level.
    MoreSignaturesNeeded,
}

/// An amount of money. `value` is a decimal string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Money {
    /// Decimal amount, e.g. `"10.50"`.
    pub value: String,
    /// ISO 4217 currency code.
    pub currency: String,
}

impl Money {
    /// Create an amount.
    pub fn new(value: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            currency: currency.into(),
        }
    }
}

/// A bank account linked to a member.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    /// Account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Bank the account lives at.
    pub bank_id: String,
    /// Whether the account is locked for transfers.
    #[serde(default)]
    pub is_locked: bool,
}

/// Balance of an account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Balance {
    /// Account the balance belongs to.
    pub account_id: String,
    /// Booked balance.
    pub current: Money,
    /// Available balance.
    pub available: Money,
    /// Last update, milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at_ms: i64,
}

/// Direction of a transaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Unset.
    #[default]
    InvalidType,
    /// Money leaving the account.
    Debit,
    /// Money entering the account.
    Credit,
}

/// Processing state of a transaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Unset.
    #[default]
    InvalidStatus,
    /// Submitted, not yet settled.
    Processing,
    /// Settled.
    Success,
    /// Rejected or failed.
    Failure,
}

/// A single account transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Transaction id.
    pub id: String,
    /// Direction.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Processing state.
    pub status: TransactionStatus,
    /// Amount moved.
    pub amount: Money,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Token that initiated the transaction, if any.
    #[serde(default)]
    pub token_id: String,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at_ms: i64,
}

/// A bank account in one of the supported schemes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BankAccount {
    /// An account held at Token itself.
    Token {
        /// Owning member.
        member_id: String,
        /// Account id.
        account_id: String,
    },
    /// SEPA account.
    Sepa {
        /// IBAN.
        iban: String,
        /// BIC; may be empty.
        #[serde(default)]
        bic: String,
    },
    /// UK Faster Payments account.
    FasterPayments {
        /// Sort code.
        sort_code: String,
        /// Account number.
        account_number: String,
    },
    /// Bank-specific account identifier.
    Custom {
        /// Bank that understands the payload.
        bank_id: String,
        /// Opaque payload.
        payload: String,
    },
}

/// Legacy transfer endpoint: an account plus the bank it lives at.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferEndpoint {
    /// The account.
    pub account: BankAccount,
    /// Bank id; may be empty.
    #[serde(default)]
    pub bank_id: String,
}

/// Where a transfer may land.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferDestination {
    /// Token account.
    Token {
        /// Owning member.
        member_id: String,
        /// Account id; empty means the member's default.
        #[serde(default)]
        account_id: String,
    },
    /// SEPA credit transfer.
    Sepa {
        /// IBAN.
        iban: String,
        /// BIC; may be empty.
        #[serde(default)]
        bic: String,
    },
    /// SEPA instant credit transfer.
    SepaInstant {
        /// IBAN.
        iban: String,
    },
    /// UK Faster Payments.
    FasterPayments {
        /// Sort code.
        sort_code: String,
        /// Account number.
        account_number: String,
    },
    /// Anything else, understood by a specific bank.
    Custom {
        /// Bank that understands the payload.
        bank_id: String,
        /// Opaque payload.
        payload: String,
    },
}

/// How to link accounts at a bank.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BankInfo {
    /// Linking URI for the web flow.
    pub linking_uri: String,
    /// Regex matching the redirect that ends the linking flow.
    pub redirect_uri_regex: String,
    /// Bank's own linking page.
    #[serde(default)]
    pub bank_linking_uri: String,
    /// Realm of the bank.
    #[serde(default)]
    pub realm: Vec<String>,
}

/// A bank as listed in the directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Bank {
    /// Bank id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Square logo.
    #[serde(default)]
    pub logo_uri: String,
    /// Full-size logo.
    #[serde(default)]
    pub full_logo_uri: String,
    /// Supported transfer types (e.g. `SEPA`).
    #[serde(default)]
    pub supported_transfer_types: Vec<String>,
    /// ISO 3166-1 alpha-2 country.
    #[serde(default)]
    pub country: String,
    /// Connectivity provider.
    #[serde(default)]
    pub provider: String,
}

/// Page metadata for bank listings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paging {
    /// Current page, 1-based.
    pub page: u32,
    /// Total number of pages.
    pub page_count: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total_count: u32,
}

/// Offset-based page request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Opaque offset from a previous [`PagedList`]; absent for the first page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    /// Maximum number of items.
    pub limit: u32,
}

impl Page {
    /// Page starting at `offset` (or at the beginning).
    pub fn new(offset: Option<&str>, limit: u32) -> Self {
        Self {
            offset: offset.map(str::to_string),
            limit,
        }
    }
}

/// A page of results plus the offset of the next page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PagedList<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Offset to pass to fetch the next page.
    pub offset: String,
}

impl<T> PagedList<T> {
    /// Bundle a page.
    pub fn new(items: Vec<T>, offset: impl Into<String>) -> Self {
        Self {
            items,
            offset: offset.into(),
        }
    }
}
