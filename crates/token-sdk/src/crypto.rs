//! Signing and verification.
//!
//! | Type | Role |
//! |------|------|
//! | [`Signer`] / [`Verifier`] | Sign / verify bytes; values are signed over their canonical JSON |
//! | [`Ed25519Signer`] / [`Ed25519Verifier`] | Member keys (nkeys) |
//! | [`RsaSigner`] | RS256, for eIDAS certificate keys |
//! | [`CryptoEngine`] | Key generation and signer lookup for one member |
//! | [`CryptoEngineFactory`] | Creates a [`CryptoEngine`] per member |
//!
//! Signatures are base64url without padding. Ed25519 is deterministic, so
//! signing the same value twice with the same key yields the same string.

use std::fmt;
use std::sync::Arc;

use nkeys::KeyPair;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer as _};
use rsa::RsaPrivateKey;
use serde::Serialize;
use token_models::{decode_base64url, encode_base64url, to_canonical_bytes, Key, KeyLevel};

use crate::error::SdkError;
use crate::key_store::{InMemoryKeyStore, KeyStore, SecretKey};

// ─── Signer / Verifier ───────────────────────────────────────────────

/// Produces signatures with one key.
pub trait Signer: Send + Sync {
    /// Id of the signing key.
    fn key_id(&self) -> &str;

    /// Sign raw bytes; returns a base64url signature.
    fn sign_bytes(&self, payload: &[u8]) -> Result<String, SdkError>;
}

impl dyn Signer + '_ {
    /// Sign the canonical JSON of `value`.
    pub fn sign<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SdkError> {
        self.sign_bytes(&to_canonical_bytes(value)?)
    }
}

/// Checks signatures made by one key.
pub trait Verifier: Send + Sync {
    /// Verify a base64url signature over raw bytes.
    fn verify_bytes(&self, payload: &[u8], signature: &str) -> Result<(), SdkError>;
}

impl dyn Verifier + '_ {
    /// Verify a signature over the canonical JSON of `value`.
    pub fn verify<T: Serialize + ?Sized>(&self, value: &T, signature: &str) -> Result<(), SdkError> {
        self.verify_bytes(&to_canonical_bytes(value)?, signature)
    }
}

/// Ed25519 signer backed by an nkey pair.
pub struct Ed25519Signer {
    key_id: String,
    key_pair: KeyPair,
}

impl Ed25519Signer {
    /// Signer for a stored key.
    pub fn new(key: &SecretKey) -> Result<Self, SdkError> {
        Ok(Self {
            key_id: key.id().to_string(),
            key_pair: key.key_pair()?,
        })
    }
}

impl Signer for Ed25519Signer {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign_bytes(&self, payload: &[u8]) -> Result<String, SdkError> {
        Ok(encode_base64url(&self.key_pair.sign(payload)?))
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// Ed25519 verifier for a registered public key.
pub struct Ed25519Verifier {
    key_pair: KeyPair,
}

impl Ed25519Verifier {
    /// Verifier for an encoded public key.
    pub fn new(public_key: &str) -> Result<Self, SdkError> {
        Ok(Self {
            key_pair: KeyPair::from_public_key(public_key)?,
        })
    }
}

impl Verifier for Ed25519Verifier {
    fn verify_bytes(&self, payload: &[u8], signature: &str) -> Result<(), SdkError> {
        let signature = decode_base64url(signature)?;
        Ok(self.key_pair.verify(payload, &signature)?)
    }
}

/// RSASSA-PKCS1-v1_5 / SHA-256 (RS256) signer, used to sign eIDAS payloads
/// with a certificate's private key.
pub struct RsaSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl RsaSigner {
    /// Signer for a private key.
    pub fn new(key_id: impl Into<String>, private_key: RsaPrivateKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key: SigningKey::<Sha256>::new(private_key),
        }
    }

    /// Signer for a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(key_id: impl Into<String>, pem: &str) -> Result<Self, SdkError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| SdkError::Crypto(format!("invalid PKCS#8 key: {e}")))?;
        Ok(Self::new(key_id, private_key))
    }
}

impl Signer for RsaSigner {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign_bytes(&self, payload: &[u8]) -> Result<String, SdkError> {
        let signature = self
            .signing_key
            .try_sign(payload)
            .map_err(|e| SdkError::Crypto(e.to_string()))?;
        Ok(encode_base64url(&signature.to_bytes()))
    }
}

impl fmt::Debug for RsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

// ─── Crypto engine ───────────────────────────────────────────────────

/// Key management and signing for a single member.
pub trait CryptoEngine: Send + Sync {
    /// Generate and store a key; returns its public half.
    fn generate_key(&self, level: KeyLevel) -> Result<Key, SdkError>;

    /// Generate and store a key expiring at `expires_at_ms`.
    fn generate_key_with_expiry(&self, level: KeyLevel, expires_at_ms: i64)
        -> Result<Key, SdkError>;

    /// Signer using the latest key of `level`.
    fn create_signer(&self, level: KeyLevel) -> Result<Box<dyn Signer>, SdkError>;

    /// Verifier for one of the member's stored keys.
    fn create_verifier(&self, key_id: &str) -> Result<Box<dyn Verifier>, SdkError>;

    /// Public halves of all stored keys.
    fn public_keys(&self) -> Result<Vec<Key>, SdkError>;
}

/// [`CryptoEngine`] storing ed25519 keys in a [`KeyStore`].
pub struct TokenCryptoEngine {
    member_id: String,
    key_store: Arc<dyn KeyStore>,
}

impl TokenCryptoEngine {
    /// Engine for `member_id` backed by `key_store`.
    pub fn new(member_id: impl Into<String>, key_store: Arc<dyn KeyStore>) -> Self {
        Self {
            member_id: member_id.into(),
            key_store,
        }
    }

    /// The member this engine works for.
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    fn store(&self, key: SecretKey) -> Result<Key, SdkError> {
        let public = key.public_key();
        self.key_store.put(&self.member_id, key)?;
        Ok(public)
    }
}

impl CryptoEngine for TokenCryptoEngine {
    fn generate_key(&self, level: KeyLevel) -> Result<Key, SdkError> {
        self.store(SecretKey::generate(level)?)
    }

    fn generate_key_with_expiry(
        &self,
        level: KeyLevel,
        expires_at_ms: i64,
    ) -> Result<Key, SdkError> {
        self.store(SecretKey::generate(level)?.with_expiry(expires_at_ms))
    }

    fn create_signer(&self, level: KeyLevel) -> Result<Box<dyn Signer>, SdkError> {
        let key = self.key_store.get_by_level(&self.member_id, level)?;
        Ok(Box::new(Ed25519Signer::new(&key)?))
    }

    fn create_verifier(&self, key_id: &str) -> Result<Box<dyn Verifier>, SdkError> {
        let key = self.key_store.get_by_id(&self.member_id, key_id)?;
        Ok(Box::new(Ed25519Verifier::new(&key.public_key().public_key)?))
    }

    fn public_keys(&self) -> Result<Vec<Key>, SdkError> {
        Ok(self
            .key_store
            .list_keys(&self.member_id)?
            .iter()
            .map(SecretKey::public_key)
            .collect())
    }
}

/// Creates a [`CryptoEngine`] per member.
pub trait CryptoEngineFactory: Send + Sync {
    /// Engine for `member_id`.
    fn create(&self, member_id: &str) -> Arc<dyn CryptoEngine>;
}

/// Factory producing [`TokenCryptoEngine`]s over a shared [`KeyStore`].
#[derive(Clone)]
pub struct TokenCryptoEngineFactory {
    key_store: Arc<dyn KeyStore>,
}

impl TokenCryptoEngineFactory {
    /// Factory over `key_store`.
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self { key_store }
    }

    /// Factory over a fresh [`InMemoryKeyStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKeyStore::new()))
    }
}

impl CryptoEngineFactory for TokenCryptoEngineFactory {
    fn create(&self, member_id: &str) -> Arc<dyn CryptoEngine> {
        Arc::new(TokenCryptoEngine::new(member_id, Arc::clone(&self.key_store)))
    }
}
