use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::{env, fs, path::PathBuf};
use token_models::{
    Alias, ResourceType, TokenRequest, TokenRequestOptions, TokenRequestPayload,
    TransferDestination,
};

#[derive(Serialize)]
struct Sample {
    name: &'static str,
    request_payload: TokenRequestPayload,
    request_options: TokenRequestOptions,
}

#[derive(Serialize)]
struct SampleFile {
    schema_version: String,
    generated_at_utc: String,
    samples: Vec<Sample>,
}

fn sample(name: &'static str, request: TokenRequest) -> Sample {
    let (request_payload, request_options) = request.into_parts();
    Sample {
        name,
        request_payload,
        request_options,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/token-request-samples.json"));

    let access = TokenRequest::access_token_request_builder([
        ResourceType::Accounts,
        ResourceType::Balances,
    ])
    .to_alias(Alias::domain("tpp.example.com"))
    .redirect_url("https://tpp.example.com/callback")
    .csrf_token("csrf-nonce")
    .build()?;

    let transfer = TokenRequest::transfer_token_request_builder(100.0, "EUR")
        .to_alias(Alias::domain("shop.example.com"))
        .add_destination(TransferDestination::Sepa {
            iban: "DE89370400440532013000".to_string(),
            bic: String::new(),
        })
        .execution_date(NaiveDate::from_ymd_opt(2026, 12, 24).ok_or("invalid date")?)
        .description("gift order")
        .state("order=1234")
        .build()?;

    let standing_order = TokenRequest::standing_order_request_builder()
        .amount(25.0)
        .currency("GBP")
        .frequency("MNTH")
        .start_date("2027-01-01")
        .to_member_id("m:landlord")
        .build()?;

    let file = SampleFile {
        schema_version: "token-request-samples.v1".to_string(),
        generated_at_utc: Utc::now().to_rfc3339(),
        samples: vec![
            sample("access", access),
            sample("transfer", transfer),
            sample("standing_order", standing_order),
        ],
    };

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&out, serde_json::to_string_pretty(&file)?)?;
    println!("token request samples exported to {}", out.display());
    Ok(())
}
