//! eIDAS certificate verification messages.
//!
//! A TPP proves its identity to a bank by signing a [`VerifyEidasPayload`]
//! with the private key of its eIDAS certificate.

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::security::KeyAlgorithm;

/// What the TPP signs with its certificate key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyEidasPayload {
    /// Signature algorithm of the certificate key.
    pub algorithm: KeyAlgorithm,
    /// The TPP's eIDAS alias, in the bank's realm.
    pub alias: Alias,
    /// Base64-encoded certificate.
    pub certificate: String,
    /// The TPP's member id.
    pub member_id: String,
}

/// Outcome of an eIDAS verification.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EidasVerificationStatus {
    /// Unset.
    #[default]
    Invalid,
    /// Verification is in progress.
    Pending,
    /// The certificate was accepted.
    Success,
    /// The certificate does not match the alias.
    FailureEidasInvalid,
    /// Any other failure.
    FailureError,
}

/// Gateway answer to a verification request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyEidasResponse {
    /// Verification status.
    pub status: EidasVerificationStatus,
    /// Human-readable status details.
    #[serde(default)]
    pub status_details: String,
    /// Verification id, for later status queries.
    #[serde(default)]
    pub verification_id: String,
}
