//! Member aliases.
//!
//! An [`Alias`] is a human-readable handle (email, domain, bank id, eIDAS
//! authorization number, …) that resolves to a member id. Aliases are
//! normalized before they are hashed or sent, so that `Alice@Example.com `
//! and `alice@example.com` name the same member.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::canonical::sha256_base64url;

/// Kind of an [`Alias`].
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AliasType {
    /// Unset / unrecognised.
    #[default]
    Unknown,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Internet domain (business members).
    Domain,
    /// Bank identifier.
    Bank,
    /// eIDAS authorization number of a TPP.
    Eidas,
    /// Free-form custom alias.
    Custom,
    /// Username.
    Username,
}

/// A typed alias, optionally scoped to a realm (another member id).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Alias {
    /// The alias kind.
    #[serde(rename = "type")]
    pub alias_type: AliasType,
    /// The alias value as entered.
    pub value: String,
    /// Realm the alias lives in; empty for the global realm.
    #[serde(default)]
    pub realm_id: String,
}

impl Alias {
    /// Create an alias of the given type in the global realm.
    pub fn new(alias_type: AliasType, value: impl Into<String>) -> Self {
        Self {
            alias_type,
            value: value.into(),
            realm_id: String::new(),
        }
    }

    /// Shorthand for an [`AliasType::Email`] alias.
    pub fn email(value: impl Into<String>) -> Self {
        Self::new(AliasType::Email, value)
    }

    /// Shorthand for an [`AliasType::Domain`] alias.
    pub fn domain(value: impl Into<String>) -> Self {
        Self::new(AliasType::Domain, value)
    }

    /// Shorthand for an [`AliasType::Bank`] alias.
    pub fn bank(value: impl Into<String>) -> Self {
        Self::new(AliasType::Bank, value)
    }

    /// Shorthand for an [`AliasType::Eidas`] alias.
    pub fn eidas(value: impl Into<String>) -> Self {
        Self::new(AliasType::Eidas, value)
    }

    /// Scope the alias to a realm.
    pub fn in_realm(mut self, realm_id: impl Into<String>) -> Self {
        self.realm_id = realm_id.into();
        self
    }
}

/// Normalize an alias: surrounding whitespace is trimmed everywhere, and
/// email and domain values are lower-cased.
///
/// # Examples
///
/// ```
/// use token_models::{normalize_alias, Alias};
///
/// let alias = normalize_alias(&Alias::email("  Alice@Example.COM "));
/// assert_eq!(alias.value, "alice@example.com");
/// ```
pub fn normalize_alias(alias: &Alias) -> Alias {
    let trimmed = alias.value.trim();
    let value = match alias.alias_type {
        AliasType::Email | AliasType::Domain => trimmed.to_lowercase(),
        _ => trimmed.to_string(),
    };
    Alias {
        alias_type: alias.alias_type,
        value,
        realm_id: alias.realm_id.trim().to_string(),
    }
}

/// Hash of an alias as stored on the member record.
///
/// The alias is normalized first, so equivalent spellings hash equally.
pub fn alias_hash(alias: &Alias) -> String {
    let alias = normalize_alias(alias);
    let canonical = json!({
        "realm_id": alias.realm_id,
        "type": alias.alias_type.to_string(),
        "value": alias.value,
    });
    sha256_base64url(canonical.to_string().as_bytes())
}
