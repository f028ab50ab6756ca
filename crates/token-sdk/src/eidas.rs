//! eIDAS onboarding.
//!
//! A third-party provider holding an eIDAS certificate onboards with a bank
//! by creating a business member in the bank's realm, aliased by its
//! authorization number, and proving possession of the certificate key.

use token_models::{
    normalize_alias, Alias, CreateMemberType, KeyAlgorithm, VerifyEidasPayload,
    VerifyEidasResponse,
};
use tracing::info;

use crate::crypto::Signer;
use crate::error::SdkError;
use crate::member::Member;
use crate::token_client::TokenClient;

/// Outcome of [`onboard_with_eidas`].
#[derive(Debug)]
pub struct EidasOnboarding {
    /// The new business member.
    pub member: Member,
    /// Verification answer; the status may still be pending.
    pub response: VerifyEidasResponse,
}

/// Create a business member under the realm of `bank_id` and verify it
/// with an eIDAS certificate.
///
/// `certificate` is the base64 certificate; `signer` holds its private
/// key (see [`RsaSigner`](crate::crypto::RsaSigner)).
pub async fn onboard_with_eidas(
    client: &TokenClient,
    tpp_auth_number: &str,
    certificate: &str,
    bank_id: &str,
    signer: &dyn Signer,
) -> Result<EidasOnboarding, SdkError> {
    let bank_member_id = client.get_member_id(&Alias::bank(bank_id)).await?;
    let alias = normalize_alias(&Alias::eidas(tpp_auth_number).in_realm(&bank_member_id));

    let member = client
        .create_member_in_realm(Some(&alias), CreateMemberType::Business, &bank_member_id)
        .await?;

    let payload = VerifyEidasPayload {
        algorithm: KeyAlgorithm::Rs256,
        alias,
        certificate: certificate.to_string(),
        member_id: member.member_id().to_string(),
    };
    let signature = signer.sign(&payload)?;
    let response = member.verify_eidas(payload, signature).await?;
    info!(
        member_id = %member.member_id(),
        status = ?response.status,
        "eIDAS verification submitted"
    );

    Ok(EidasOnboarding { member, response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RsaSigner;
    use crate::key_store::InMemoryKeyStore;
    use crate::routes::GatewayMethod;
    use crate::testing::MockGateway;
    use serde_json::json;
    use std::sync::Arc;
    use token_models::gateway::{CreateMemberRequest, VerifyEidasRequest};
    use token_models::EidasVerificationStatus;

    #[tokio::test]
    async fn onboards_in_bank_realm() {
        let gateway = MockGateway::new();
        gateway.respond(
            GatewayMethod::ResolveAlias,
            json!({"member": {"id": "m:bank"}}),
        );
        gateway.respond(GatewayMethod::CreateMember, json!({"member_id": "m:tpp"}));
        gateway.respond(
            GatewayMethod::UpdateMember,
            json!({"member": {"id": "m:tpp", "last_hash": "h1"}}),
        );
        gateway.respond(
            GatewayMethod::VerifyEidas,
            json!({"status": "PENDING", "verification_id": "v:1"}),
        );
        let client = TokenClient::builder()
            .dev_key("dev")
            .with_transport(gateway.clone())
            .with_key_store(Arc::new(InMemoryKeyStore::new()))
            .build()
            .unwrap();

        let mut rng = rand::thread_rng();
        let key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let signer = RsaSigner::new("eidas", key);

        let onboarding =
            onboard_with_eidas(&client, " PSDGB-FCA-123 ", "Y2VydA==", "iron", &signer)
                .await
                .unwrap();
        assert_eq!(onboarding.member.member_id(), "m:tpp");
        assert_eq!(onboarding.response.status, EidasVerificationStatus::Pending);

        let create: CreateMemberRequest =
            serde_json::from_value(gateway.request(GatewayMethod::CreateMember)).unwrap();
        assert_eq!(create.realm_id, "m:bank");
        assert_eq!(create.member_type, CreateMemberType::Business);

        let verify: VerifyEidasRequest =
            serde_json::from_value(gateway.request(GatewayMethod::VerifyEidas)).unwrap();
        assert_eq!(verify.payload.alias.value, "PSDGB-FCA-123");
        assert_eq!(verify.payload.alias.realm_id, "m:bank");
        assert_eq!(verify.payload.member_id, "m:tpp");
        let canonical = token_models::to_canonical_bytes(&verify.payload).unwrap();
        assert_eq!(verify.signature, signer.sign_bytes(&canonical).unwrap());
    }
}
