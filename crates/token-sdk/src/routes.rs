//! Canonical gateway method and header names.
//!
//! Every gateway call made by the SDK is addressed through
//! [`GatewayMethod`], and every header it sets is named in [`headers`].
//! Transports map a method to their own addressing; the HTTP transport
//! posts to [`GatewayMethod::path`].
//!
//! # Path layout
//!
//! ```text
//! /v1/{Method}      ← POST, JSON body (e.g. /v1/GetMember)
//! ```

/// Current path version prefix.
const VERSION: &str = "v1";

/// Gateway RPC methods used by the SDK.
///
/// # Examples
///
/// ```
/// use token_sdk::GatewayMethod;
///
/// assert_eq!(GatewayMethod::GetMember.path(), "/v1/GetMember");
/// assert_eq!(GatewayMethod::UpdateMember.to_string(), "UpdateMember");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum GatewayMethod {
    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------
    /// Reserve a member id.
    CreateMember,
    /// Apply a signed member update.
    UpdateMember,
    /// Fetch a member record.
    GetMember,
    /// Delete the calling member.
    DeleteMember,
    /// Look up the member owning an alias.
    ResolveAlias,
    /// List the calling member's aliases.
    GetAliases,
    /// Fetch the default recovery agent.
    GetDefaultAgent,

    // ------------------------------------------------------------------
    // Verification & recovery
    // ------------------------------------------------------------------
    /// Resend an alias verification code.
    RetryVerification,
    /// Submit an alias verification code.
    VerifyAlias,
    /// Start recovery of a member.
    BeginRecovery,
    /// Exchange a recovery code for an agent-signed recovery.
    CompleteRecovery,

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------
    /// Fetch one account.
    GetAccount,
    /// List linked accounts.
    GetAccounts,
    /// Fetch one balance.
    GetBalance,
    /// Fetch several balances.
    GetBalances,
    /// Fetch one transaction.
    GetTransaction,
    /// Fetch a page of transactions.
    GetTransactions,
    /// List transfer destinations of an account.
    ResolveTransferDestinations,

    // ------------------------------------------------------------------
    // Banks
    // ------------------------------------------------------------------
    /// Fetch linking information of a bank.
    GetBankInfo,
    /// List banks.
    GetBanks,

    // ------------------------------------------------------------------
    // Notifications & blobs
    // ------------------------------------------------------------------
    /// Notify the devices of an alias.
    Notify,
    /// Invalidate a notification.
    InvalidateNotification,
    /// Fetch a blob.
    GetBlob,

    // ------------------------------------------------------------------
    // Token requests & eIDAS
    // ------------------------------------------------------------------
    /// Store a token request.
    StoreTokenRequest,
    /// Retrieve a stored token request.
    RetrieveTokenRequest,
    /// Verify an eIDAS certificate.
    VerifyEidas,
}

impl GatewayMethod {
    /// HTTP path of the method.
    pub fn path(self) -> String {
        format!("/{VERSION}/{self}")
    }

    /// Parse the method back out of an HTTP path.
    ///
    /// Given `"/v1/GetBalance"` returns `Some(GetBalance)`.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.strip_prefix('/')?.strip_prefix(VERSION)?.strip_prefix('/')?;
        name.parse().ok()
    }
}

/// Header names.
pub mod headers {
    // ------------------------------------------------------------------
    // Static headers, set on every call
    // ------------------------------------------------------------------

    /// Developer key.
    pub const DEV_KEY: &str = "token-dev-key";
    /// SDK platform.
    pub const SDK: &str = "token-sdk";
    /// SDK version.
    pub const SDK_VERSION: &str = "token-sdk-version";

    // ------------------------------------------------------------------
    // Per-request authentication
    // ------------------------------------------------------------------

    /// Calling member.
    pub const MEMBER_ID: &str = "token-member-id";
    /// Key that produced [`SIGNATURE`].
    pub const KEY_ID: &str = "token-key-id";
    /// Signature over the request.
    pub const SIGNATURE: &str = "token-signature";
    /// Signing time, milliseconds since the Unix epoch.
    pub const CREATED_AT_MS: &str = "token-created-at-ms";

    // ------------------------------------------------------------------
    // Authentication context
    // ------------------------------------------------------------------

    /// Access token the caller acts under.
    pub const ON_BEHALF_OF: &str = "token-on-behalf-of";
    /// Present (`true`) when the end user initiated the call.
    pub const CUSTOMER_INITIATED: &str = "token-customer-initiated";
    /// Key level the request is signed at.
    pub const KEY_LEVEL: &str = "token-key-level";
    /// Base64url JSON of the tracking security metadata.
    pub const SECURITY_METADATA: &str = "token-security-metadata";
}

/// Platform reported in [`headers::SDK`].
pub const SDK_PLATFORM: &str = "rust";

/// Version reported in [`headers::SDK_VERSION`].
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn method_paths() {
        assert_eq!(GatewayMethod::CreateMember.path(), "/v1/CreateMember");
        assert_eq!(
            GatewayMethod::ResolveTransferDestinations.path(),
            "/v1/ResolveTransferDestinations",
        );
    }

    #[test]
    fn every_path_parses_back() {
        for method in GatewayMethod::iter() {
            assert_eq!(GatewayMethod::from_path(&method.path()), Some(method));
        }
    }

    #[test]
    fn from_path_rejects_foreign_paths() {
        assert_eq!(GatewayMethod::from_path("/v2/GetMember"), None);
        assert_eq!(GatewayMethod::from_path("/v1/NoSuchMethod"), None);
        assert_eq!(GatewayMethod::from_path("GetMember"), None);
    }

    #[test]
    fn header_names_are_lowercase() {
        for name in [
            headers::DEV_KEY,
            headers::MEMBER_ID,
            headers::ON_BEHALF_OF,
            headers::SECURITY_METADATA,
        ] {
            assert_eq!(name, name.to_lowercase());
        }
    }
}
