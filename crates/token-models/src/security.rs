//! Keys, signatures and security metadata.

use serde::{Deserialize, Serialize};

/// Privilege tier of a key.
///
/// Levels are ordered: `Low < Standard < Privileged`. A call made at a
/// given level must be signed with a key of that level.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyLevel {
    /// Read-only style operations.
    #[default]
    Low,
    /// Everyday operations.
    Standard,
    /// Member-management operations (keys, aliases, recovery, deletion).
    Privileged,
}

/// Signature algorithm of a key.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyAlgorithm {
    /// Ed25519 (member keys).
    #[default]
    Ed25519,
    /// RSASSA-PKCS1-v1_5 with SHA-256 (eIDAS certificates).
    Rs256,
}

/// Public half of a member key, as registered with the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key {
    /// Key id derived from the public key.
    pub id: String,
    /// Encoded public key.
    pub public_key: String,
    /// Privilege tier.
    pub level: KeyLevel,
    /// Signature algorithm.
    pub algorithm: KeyAlgorithm,
    /// Optional expiry, milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<i64>,
}

/// A detached signature over some canonical payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    /// Member that produced the signature.
    pub member_id: String,
    /// Key that produced the signature.
    pub key_id: String,
    /// Base64url-encoded signature bytes.
    pub signature: String,
}

/// Client-side tracking information forwarded with every authenticated call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityMetadata {
    /// Originating IP address of the end user.
    #[serde(default)]
    pub ip_address: String,
    /// Geo location of the end user.
    #[serde(default)]
    pub geo_location: String,
    /// Device fingerprint of the end user.
    #[serde(default)]
    pub device_fingerprint: String,
}

impl SecurityMetadata {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.ip_address.is_empty()
            && self.geo_location.is_empty()
            && self.device_fingerprint.is_empty()
    }
}

/// What the per-request authentication signature covers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GrpcAuthPayload {
    /// Base64url of the serialized request body.
    pub request: String,
    /// Time the request was signed, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn key_levels_are_ordered() {
        assert!(KeyLevel::Low < KeyLevel::Standard);
        assert!(KeyLevel::Standard < KeyLevel::Privileged);
        let all: Vec<KeyLevel> = KeyLevel::iter().collect();
        assert_eq!(all, vec![KeyLevel::Low, KeyLevel::Standard, KeyLevel::Privileged]);
    }

    #[test]
    fn key_level_wire_names() {
        assert_eq!(KeyLevel::Privileged.to_string(), "PRIVILEGED");
        assert_eq!(KeyLevel::from_str("STANDARD").unwrap(), KeyLevel::Standard);
        assert_eq!(
            serde_json::to_string(&KeyLevel::Low).unwrap(),
            "\"LOW\""
        );
    }

    #[test]
    fn key_without_expiry_omits_field() {
        let key = Key {
            id: "k1".into(),
            public_key: "pk".into(),
            level: KeyLevel::Standard,
            algorithm: KeyAlgorithm::Ed25519,
            expires_at_ms: None,
        };
        let json = serde_json::to_value(&key).unwrap();
        assert!(json.get("expires_at_ms").is_none());
        assert_eq!(json["algorithm"], "ED25519");
    }

    #[test]
    fn empty_security_metadata() {
        assert!(SecurityMetadata::default().is_empty());
        let meta = SecurityMetadata {
            ip_address: "10.0.0.1".into(),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }
}
