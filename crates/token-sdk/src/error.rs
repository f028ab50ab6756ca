//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. Gateway failures keep their RPC status
//! ([`StatusCode`]); conditions the SDK itself derives from response
//! fields (step-up, failed verification) get their own variants so callers
//! can match on them.

use std::str::FromStr;

use token_models::gateway::ErrorBody;
use token_models::ModelError;

/// RPC status code reported by the gateway.
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
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Not an error.
    Ok,
    /// Cancelled by the caller.
    Cancelled,
    /// Unknown error.
    Unknown,
    /// The request was malformed.
    InvalidArgument,
    /// The deadline passed before completion.
    DeadlineExceeded,
    /// The entity was not found.
    NotFound,
    /// The entity already exists.
    AlreadyExists,
    /// The caller may not perform the operation.
    PermissionDenied,
    /// Quota or rate limit exhausted.
    ResourceExhausted,
    /// The system is not in a state allowing the operation.
    FailedPrecondition,
    /// Concurrency conflict (e.g. a stale `prev_hash`).
    Aborted,
    /// Out of range.
    OutOfRange,
    /// Not implemented by the gateway.
    Unimplemented,
    /// Internal gateway error.
    Internal,
    /// The gateway is unavailable.
    Unavailable,
    /// Unrecoverable data loss.
    DataLoss,
    /// Missing or invalid authentication.
    Unauthenticated,
}

impl StatusCode {
    /// Closest status for an HTTP status without a parsable error body.
    pub fn from_http(status: u16) -> Self {
        match status {
            200..=299 => StatusCode::Ok,
            400 => StatusCode::InvalidArgument,
            401 => StatusCode::Unauthenticated,
            403 => StatusCode::PermissionDenied,
            404 => StatusCode::NotFound,
            409 => StatusCode::Aborted,
            412 => StatusCode::FailedPrecondition,
            429 => StatusCode::ResourceExhausted,
            499 => StatusCode::Cancelled,
            501 => StatusCode::Unimplemented,
            503 => StatusCode::Unavailable,
            504 => StatusCode::DeadlineExceeded,
            500..=599 => StatusCode::Internal,
            _ => StatusCode::Unknown,
        }
    }
}

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. no developer key).
    #[error("configuration error: {0}")]
    Config(String),

    /// The gateway answered with a non-OK RPC status.
    #[error("{code}: {message}")]
    Status {
        /// RPC status code.
        code: StatusCode,
        /// Description sent by the gateway.
        message: String,
    },

    /// The call must be repeated with a higher key level.
    #[error("step up required: {0}")]
    StepUpRequired(String),

    /// A verification code was rejected.
    #[error("verification failed: {0}")]
    Verification(String),

    /// A looked-up entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Key generation, key lookup or signing failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The channel was shut down; no new calls are accepted.
    #[error("channel is shut down")]
    ChannelClosed,

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Model-level error (canonical serialization, callback state, ...).
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl SdkError {
    /// Build a [`SdkError::Status`].
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        SdkError::Status {
            code,
            message: message.into(),
        }
    }

    /// Decode a failed gateway response. Falls back to the HTTP status when
    /// the body is not an [`ErrorBody`] or names an unknown code.
    pub fn from_error_response(http_status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(error) => {
                let code = StatusCode::from_str(&error.code)
                    .unwrap_or_else(|_| StatusCode::from_http(http_status));
                SdkError::status(code, error.message)
            }
            Err(_) => SdkError::status(
                StatusCode::from_http(http_status),
                String::from_utf8_lossy(body).into_owned(),
            ),
        }
    }

    /// The RPC status code, if this error carries one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            SdkError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<nkeys::error::Error> for SdkError {
    fn from(e: nkeys::error::Error) -> Self {
        SdkError::Crypto(e.to_string())
    }
}

impl From<rsa::Error> for SdkError {
    fn from(e: rsa::Error) -> Self {
        SdkError::Crypto(e.to_string())
    }
}
