//! Canonical serialization and digests.
//!
//! Anything that is signed or hashed goes through [`to_canonical_json`] so
//! that two parties serializing the same value produce the same bytes:
//! the value is first converted into a [`serde_json::Value`] (whose object
//! keys are kept sorted) and then rendered without whitespace.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ModelError;

/// Render `value` as canonical JSON.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use token_models::to_canonical_json;
///
/// let a = to_canonical_json(&json!({"b": 1, "a": [true, null]})).unwrap();
/// assert_eq!(a, r#"{"a":[true,null],"b":1}"#);
/// ```
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ModelError> {
    // Keys come out sorted only while serde_json's `preserve_order` feature is off.
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Canonical JSON as raw bytes, ready to be signed.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ModelError> {
    to_canonical_json(value).map(String::into_bytes)
}

/// SHA-256 of `bytes`, base64url-encoded without padding.
pub fn sha256_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(bytes))
}

/// Base64url (no padding) encoding used for signatures and opaque blobs.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Inverse of [`encode_base64url`].
pub fn decode_base64url(value: &str) -> Result<Vec<u8>, ModelError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| ModelError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Unordered {
        zeta: u8,
        alpha: &'static str,
    }

    #[test]
    fn keys_are_sorted_regardless_of_field_order() {
        let json = to_canonical_json(&Unordered {
            zeta: 1,
            alpha: "x",
        })
        .unwrap();
        assert_eq!(json, r#"{"alpha":"x","zeta":1}"#);
    }

    #[test]
    fn identical_input_identical_bytes() {
        let a = to_canonical_bytes(&Unordered { zeta: 7, alpha: "a" }).unwrap();
        let b = to_canonical_bytes(&Unordered { zeta: 7, alpha: "a" }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sha256_is_url_safe_and_unpadded() {
        let digest = sha256_base64url(b"hello");
        assert_eq!(digest.len(), 43);
        assert!(!digest.contains('='));
        assert!(!digest.contains('+'));
        assert!(!digest.contains('/'));
    }

    #[test]
    fn base64url_decode_rejects_garbage() {
        assert!(decode_base64url("***").is_err());
        assert_eq!(decode_base64url(&encode_base64url(b"abc")).unwrap(), b"abc");
    }
}
