//! Storage for members' private keys.
//!
//! A [`KeyStore`] holds [`SecretKey`]s per member. The SDK ships
//! [`InMemoryKeyStore`]; applications that need keys to survive a restart
//! plug in their own implementation via
//! [`TokenClientBuilder::with_key_store`](crate::TokenClientBuilder::with_key_store).

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::Utc;
use nkeys::{KeyPair, KeyPairType};
use token_models::{sha256_base64url, Key, KeyAlgorithm, KeyLevel};

use crate::error::SdkError;

/// Length of a key id, in base64url characters.
const KEY_ID_LEN: usize = 16;

/// Key id derived from an encoded public key.
pub fn key_id(public_key: &str) -> String {
    let mut id = sha256_base64url(public_key.as_bytes());
    id.truncate(KEY_ID_LEN);
    id
}

/// A member's private key. Only the nkey seed is stored; the key pair is
/// rebuilt on demand.
#[derive(Clone)]
pub struct SecretKey {
    id: String,
    level: KeyLevel,
    seed: String,
    public_key: String,
    expires_at_ms: Option<i64>,
}

impl SecretKey {
    /// Generate a fresh ed25519 key.
    pub fn generate(level: KeyLevel) -> Result<Self, SdkError> {
        let key_pair = KeyPair::new(KeyPairType::User);
        Self::from_seed(&key_pair.seed()?, level)
    }

    /// Rebuild a key from its seed.
    pub fn from_seed(seed: &str, level: KeyLevel) -> Result<Self, SdkError> {
        let public_key = KeyPair::from_seed(seed)?.public_key();
        Ok(Self {
            id: key_id(&public_key),
            level,
            seed: seed.to_string(),
            public_key,
            expires_at_ms: None,
        })
    }

    /// Set an expiry, milliseconds since the Unix epoch.
    pub fn with_expiry(mut self, expires_at_ms: i64) -> Self {
        self.expires_at_ms = Some(expires_at_ms);
        self
    }

    /// Key id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Privilege tier.
    pub fn level(&self) -> KeyLevel {
        self.level
    }

    /// The nkey seed.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Expiry, if any.
    pub fn expires_at_ms(&self) -> Option<i64> {
        self.expires_at_ms
    }

    /// True once the expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at_ms
            .is_some_and(|at| at <= Utc::now().timestamp_millis())
    }

    /// The signing key pair.
    pub fn key_pair(&self) -> Result<KeyPair, SdkError> {
        Ok(KeyPair::from_seed(&self.seed)?)
    }

    /// Public half, as registered with the gateway.
    pub fn public_key(&self) -> Key {
        Key {
            id: self.id.clone(),
            public_key: self.public_key.clone(),
            level: self.level,
            algorithm: KeyAlgorithm::Ed25519,
            expires_at_ms: self.expires_at_ms,
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("id", &self.id)
            .field("level", &self.level)
            .field("public_key", &self.public_key)
            .field("expires_at_ms", &self.expires_at_ms)
            .finish_non_exhaustive()
    }
}

/// Per-member private key storage.
pub trait KeyStore: Send + Sync {
    /// Store a key for a member.
    fn put(&self, member_id: &str, key: SecretKey) -> Result<(), SdkError>;

    /// The most recently stored, unexpired key of the given level.
    fn get_by_level(&self, member_id: &str, level: KeyLevel) -> Result<SecretKey, SdkError>;

    /// A key by id; fails if it is unknown or expired.
    fn get_by_id(&self, member_id: &str, key_id: &str) -> Result<SecretKey, SdkError>;

    /// All unexpired keys of a member.
    fn list_keys(&self, member_id: &str) -> Result<Vec<SecretKey>, SdkError>;

    /// Forget every key of a member.
    fn delete_keys(&self, member_id: &str) -> Result<(), SdkError>;
}

/// A [`KeyStore`] that keeps keys in process memory.
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<String, Vec<SecretKey>>>,
}

impl InMemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> SdkError {
        SdkError::Crypto("key store lock poisoned".into())
    }
}

impl KeyStore for InMemoryKeyStore {
    fn put(&self, member_id: &str, key: SecretKey) -> Result<(), SdkError> {
        let mut keys = self.keys.write().map_err(|_| Self::poisoned())?;
        let member_keys = keys.entry(member_id.to_string()).or_default();
        member_keys.retain(|k| k.id != key.id);
        member_keys.push(key);
        Ok(())
    }

    fn get_by_level(&self, member_id: &str, level: KeyLevel) -> Result<SecretKey, SdkError> {
        let keys = self.keys.read().map_err(|_| Self::poisoned())?;
        keys.get(member_id)
            .and_then(|member_keys| {
                member_keys
                    .iter()
                    .rev()
                    .find(|k| k.level == level && !k.is_expired())
            })
            .cloned()
            .ok_or_else(|| SdkError::Crypto(format!("no {level} key for member {member_id}")))
    }

    fn get_by_id(&self, member_id: &str, key_id: &str) -> Result<SecretKey, SdkError> {
        let keys = self.keys.read().map_err(|_| Self::poisoned())?;
        let key = keys
            .get(member_id)
            .and_then(|member_keys| member_keys.iter().find(|k| k.id == key_id))
            .ok_or_else(|| SdkError::Crypto(format!("key {key_id} not found for {member_id}")))?;
        if key.is_expired() {
            return Err(SdkError::Crypto(format!("key {key_id} has expired")));
        }
        Ok(key.clone())
    }

    fn list_keys(&self, member_id: &str) -> Result<Vec<SecretKey>, SdkError> {
        let keys = self.keys.read().map_err(|_| Self::poisoned())?;
        Ok(keys
            .get(member_id)
            .map(|member_keys| {
                member_keys
                    .iter()
                    .filter(|k| !k.is_expired())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete_keys(&self, member_id: &str) -> Result<(), SdkError> {
        self.keys
            .write()
            .map_err(|_| Self::poisoned())?
            .remove(member_id);
        Ok(())
    }
}
