//! Per-call authentication context.
//!
//! Every authenticated call is made under an [`AuthenticationContext`]
//! built fresh from the client's state at call time. The context selects
//! the key level the request is signed at and carries delegation and
//! tracking information to the gateway as headers.

use token_models::{encode_base64url, to_canonical_bytes, KeyLevel, SecurityMetadata};

use crate::error::SdkError;
use crate::routes::headers;

/// Immutable authentication context of a single call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticationContext {
    on_behalf_of: Option<String>,
    customer_initiated: bool,
    key_level: KeyLevel,
    security_metadata: SecurityMetadata,
}

impl AuthenticationContext {
    /// Create a context.
    pub fn new(
        on_behalf_of: Option<String>,
        customer_initiated: bool,
        key_level: KeyLevel,
        security_metadata: SecurityMetadata,
    ) -> Self {
        Self {
            on_behalf_of,
            customer_initiated,
            key_level,
            security_metadata,
        }
    }

    /// Access token the call is made under.
    pub fn on_behalf_of(&self) -> Option<&str> {
        self.on_behalf_of.as_deref()
    }

    /// Whether the end user initiated the call.
    pub fn customer_initiated(&self) -> bool {
        self.customer_initiated
    }

    /// Level of the key that signs the call.
    pub fn key_level(&self) -> KeyLevel {
        self.key_level
    }

    /// Tracking metadata.
    pub fn security_metadata(&self) -> &SecurityMetadata {
        &self.security_metadata
    }

    /// Context headers. Unset fields produce no header.
    pub fn headers(&self) -> Result<Vec<(String, String)>, SdkError> {
        let mut out = vec![(headers::KEY_LEVEL.to_string(), self.key_level.to_string())];
        if let Some(token_id) = &self.on_behalf_of {
            out.push((headers::ON_BEHALF_OF.to_string(), token_id.clone()));
        }
        if self.customer_initiated {
            out.push((headers::CUSTOMER_INITIATED.to_string(), "true".to_string()));
        }
        if !self.security_metadata.is_empty() {
            out.push((
                headers::SECURITY_METADATA.to_string(),
                encode_base64url(&to_canonical_bytes(&self.security_metadata)?),
            ));
        }
        Ok(out)
    }
}
