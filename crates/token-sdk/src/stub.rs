//! Gateway stub.
//!
//! [`GatewayStub`] is what the RPC clients call through. An
//! unauthenticated stub forwards requests as-is. An authenticated stub
//! (see [`GatewayStub::with_authentication`]) signs each request with the
//! member key of the context's level:
//!
//! ```text
//! signature = sign(canonical(GrpcAuthPayload {
//!     request:       base64url(body),
//!     created_at_ms: now,
//! }))
//! ```
//!
//! and sends member id, key id, signature and timestamp as headers next to
//! the context headers.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use token_models::{encode_base64url, GrpcAuthPayload};

use crate::auth_context::AuthenticationContext;
use crate::channel::{decode, Channel};
use crate::crypto::CryptoEngine;
use crate::error::SdkError;
use crate::routes::{headers, GatewayMethod};

struct Identity {
    member_id: String,
    crypto: Arc<dyn CryptoEngine>,
    context: AuthenticationContext,
}

/// Call surface used by the RPC clients.
pub struct GatewayStub {
    channel: Channel,
    identity: Option<Identity>,
}

impl GatewayStub {
    /// Stub that sends requests without authentication.
    pub fn unauthenticated(channel: &Channel) -> Self {
        Self {
            channel: channel.clone(),
            identity: None,
        }
    }

    /// Stub that signs every request as `member_id` under `context`.
    pub fn with_authentication(
        channel: &Channel,
        member_id: &str,
        crypto: Arc<dyn CryptoEngine>,
        context: AuthenticationContext,
    ) -> Self {
        Self {
            channel: channel.clone(),
            identity: Some(Identity {
                member_id: member_id.to_string(),
                crypto,
                context,
            }),
        }
    }

    /// Call `method` with `request`.
    pub async fn call<Req, Resp>(&self, method: GatewayMethod, request: &Req) -> Result<Resp, SdkError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let headers = match &self.identity {
            Some(identity) => identity.headers(&body)?,
            None => Vec::new(),
        };
        decode(&self.channel.unary(method, headers, body).await?)
    }
}

impl Identity {
    fn headers(&self, body: &[u8]) -> Result<Vec<(String, String)>, SdkError> {
        let signer = self.crypto.create_signer(self.context.key_level())?;
        let created_at_ms = Utc::now().timestamp_millis();
        let signature = signer.sign(&GrpcAuthPayload {
            request: encode_base64url(body),
            created_at_ms,
        })?;

        let mut out = vec![
            (headers::MEMBER_ID.to_string(), self.member_id.clone()),
            (headers::KEY_ID.to_string(), signer.key_id().to_string()),
            (headers::SIGNATURE.to_string(), signature),
            (headers::CREATED_AT_MS.to_string(), created_at_ms.to_string()),
        ];
        out.extend(self.context.headers()?);
        Ok(out)
    }
}
