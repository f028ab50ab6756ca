//! Error types for the `token-models` crate.
//!
//! All fallible serialization helpers and parsers in this crate return
//! variants of [`ModelError`].

/// Errors produced when serializing or parsing model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A value could not be rendered to (or read from) its canonical JSON form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A token-request callback state string could not be decoded.
    #[error("invalid callback state \"{value}\": {reason}")]
    InvalidCallbackState {
        /// The value that failed to decode.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A required field was missing from a message.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Serialization(e.to_string())
    }
}
