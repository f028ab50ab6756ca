//! # Token Request Builder
//!
//! Fluent builder API for constructing [`TokenRequest`]s without filling in
//! the nested [`TokenRequestPayload`] / [`TokenRequestOptions`] messages by
//! hand.
//!
//! Each flavour of request has its own entry point; setters that only make
//! sense for one flavour are only available on that flavour's builder.
//!
//! ## Quick examples
//!
//! ```rust
//! use token_models::{Alias, ResourceType, TokenRequest};
//!
//! // One-off transfer of up to 100 USD
//! let request = TokenRequest::transfer_token_request_builder(100.0, "USD")
//!     .to_alias(Alias::domain("shop.example.com"))
//!     .redirect_url("https://shop.example.com/callback")
//!     .description("book purchase")
//!     .csrf_token("a-nonce")
//!     .build()
//!     .unwrap();
//! assert_eq!(request.payload().description, "book purchase");
//!
//! // Account information access
//! let request = TokenRequest::access_token_request_builder([
//!     ResourceType::Accounts,
//!     ResourceType::Balances,
//! ])
//! .to_member_id("m:tpp")
//! .bank_id("ngp-cbi")
//! .build()
//! .unwrap();
//! assert_eq!(request.options().bank_id, "ngp-cbi");
//! ```
//!
//! No cross-field validation happens here: a transfer without a
//! destination builds fine and is rejected by the gateway.

use chrono::NaiveDate;

use crate::account::{TransferDestination, TransferEndpoint};
use crate::alias::Alias;
use crate::canonical::sha256_base64url;
use crate::error::ModelError;
use crate::token_request::{
    AccessBody, ActingAs, ChargeBearer, ProviderTransferMetadata, RequestBody, ResourceType,
    StandingOrderBody, TokenRequestOptions, TokenRequestPayload, TokenRequestState,
    TransferBody, TransferMetadata,
};

/// Render an amount the way the gateway expects: plain decimal notation with
/// at least one fractional digit (`100.0`, `123.45`).
pub fn format_amount(amount: f64) -> String {
    // `Display` never switches to exponent form but drops a zero fraction.
    let rendered = amount.to_string();
    if rendered.contains('.') || !amount.is_finite() {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

// ─── Token Request ───────────────────────────────────────────────────

/// An immutable token request: the payload plus the web-flow options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    payload: TokenRequestPayload,
    options: TokenRequestOptions,
}

impl TokenRequest {
    /// Start an access-token request for the given resource types.
    pub fn access_token_request_builder(
        resources: impl IntoIterator<Item = ResourceType>,
    ) -> TokenRequestBuilder<AccessBody> {
        TokenRequestBuilder::new(AccessBody {
            resource_types: resources.into_iter().collect(),
        })
    }

    /// Start a transfer-token request with a lifetime amount and currency.
    pub fn transfer_token_request_builder(
        amount: f64,
        currency: impl Into<String>,
    ) -> TokenRequestBuilder<TransferBody> {
        TokenRequestBuilder::new(TransferBody {
            lifetime_amount: format_amount(amount),
            currency: currency.into(),
            ..Default::default()
        })
    }

    /// Start a standing-order request.
    pub fn standing_order_request_builder() -> TokenRequestBuilder<StandingOrderBody> {
        TokenRequestBuilder::new(StandingOrderBody::default())
    }

    /// Reassemble a request from its two messages (e.g. after retrieval).
    pub fn from_parts(payload: TokenRequestPayload, options: TokenRequestOptions) -> Self {
        Self { payload, options }
    }

    /// The payload.
    pub fn payload(&self) -> &TokenRequestPayload {
        &self.payload
    }

    /// The web-flow options.
    pub fn options(&self) -> &TokenRequestOptions {
        &self.options
    }

    /// Split into payload and options.
    pub fn into_parts(self) -> (TokenRequestPayload, TokenRequestOptions) {
        (self.payload, self.options)
    }
}

// ─── Common Builder ──────────────────────────────────────────────────

/// Builder for [`TokenRequest`]s, parameterized by the body being built.
///
/// Created via [`TokenRequest::access_token_request_builder`],
/// [`TokenRequest::transfer_token_request_builder`] or
/// [`TokenRequest::standing_order_request_builder`].
#[derive(Debug, Clone)]
pub struct TokenRequestBuilder<B> {
    payload: TokenRequestPayload,
    options: TokenRequestOptions,
    body: B,
    oauth_state: Option<String>,
    csrf_token: Option<String>,
}

impl<B: Into<RequestBody>> TokenRequestBuilder<B> {
    fn new(body: B) -> Self {
        Self {
            payload: TokenRequestPayload::default(),
            options: TokenRequestOptions::default(),
            body,
            oauth_state: None,
            csrf_token: None,
        }
    }

    /// Optional. Preselect the bank, bypassing bank selection.
    pub fn bank_id(mut self, bank_id: impl Into<String>) -> Self {
        self.options.bank_id = bank_id.into();
        self
    }

    /// Optional. Preselect the payer / grantor by member id.
    pub fn from_member_id(mut self, member_id: impl Into<String>) -> Self {
        self.options.from.id = member_id.into();
        self
    }

    /// Optional. Preselect the payer / grantor by alias.
    pub fn from_alias(mut self, alias: Alias) -> Self {
        self.options.from.alias = Some(alias);
        self
    }

    /// Optional. Preselect the source bank account.
    pub fn source_account(mut self, account_id: impl Into<String>) -> Self {
        self.options.source_account_id = account_id.into();
        self
    }

    /// Optional. Send a receipt to the payee's default receipt address.
    pub fn receipt_requested(mut self, requested: bool) -> Self {
        self.options.receipt_requested = requested;
        self
    }

    /// Optional. TPP's reference for the user.
    pub fn user_ref_id(mut self, user_ref_id: impl Into<String>) -> Self {
        self.payload.user_ref_id = user_ref_id.into();
        self
    }

    /// Optional. Web-app customization.
    pub fn customization_id(mut self, customization_id: impl Into<String>) -> Self {
        self.payload.customization_id = customization_id.into();
        self
    }

    /// URL the web flow redirects to once the user is done.
    pub fn redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.payload.redirect_url = redirect_url.into();
        self
    }

    /// TPP's reference for the resulting token.
    pub fn ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.payload.ref_id = ref_id.into();
        self
    }

    /// Payee / grantee by alias.
    pub fn to_alias(mut self, alias: Alias) -> Self {
        self.payload.to.alias = Some(alias);
        self
    }

    /// Payee / grantee by member id.
    pub fn to_member_id(mut self, member_id: impl Into<String>) -> Self {
        self.payload.to.id = member_id.into();
        self
    }

    /// Entity the redeemer acts on behalf of.
    pub fn acting_as(mut self, acting_as: ActingAs) -> Self {
        self.payload.acting_as = Some(acting_as);
        self
    }

    /// Description shown to the user.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.payload.description = description.into();
        self
    }

    /// Developer state persisted between the request and callback phases.
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.oauth_state = Some(state.into());
        self
    }

    /// Nonce verified in the callback phase (CSRF mitigation). Only its
    /// hash leaves the process.
    pub fn csrf_token(mut self, csrf_token: impl Into<String>) -> Self {
        self.csrf_token = Some(csrf_token.into());
        self
    }

    /// Consume the builder and produce a [`TokenRequest`].
    ///
    /// Fails only if the callback state cannot be serialized.
    pub fn build(self) -> Result<TokenRequest, ModelError> {
        let csrf_token_hash = self
            .csrf_token
            .as_deref()
            .map(|t| sha256_base64url(t.as_bytes()))
            .unwrap_or_default();
        let state = TokenRequestState::new(csrf_token_hash, self.oauth_state.unwrap_or_default());

        let mut payload = self.payload;
        payload.callback_state = state.serialize()?;
        payload.request_body = self.body.into();

        Ok(TokenRequest {
            payload,
            options: self.options,
        })
    }
}

// ─── Transfer Builder ────────────────────────────────────────────────

impl TokenRequestBuilder<TransferBody> {
    fn metadata(&mut self) -> &mut TransferMetadata {
        &mut self.body.instructions.metadata
    }

    /// Optional. Narrow the country selection in the web flow.
    pub fn destination_country(mut self, country: impl Into<String>) -> Self {
        self.payload.destination_country = country.into();
        self
    }

    /// Add a transfer destination.
    pub fn add_destination(mut self, destination: TransferDestination) -> Self {
        self.body.instructions.transfer_destinations.push(destination);
        self
    }

    /// Add a legacy transfer endpoint destination.
    pub fn add_legacy_destination(mut self, destination: TransferEndpoint) -> Self {
        self.body.destinations.push(destination);
        self
    }

    /// Optional. Maximum amount per charge.
    pub fn charge_amount(mut self, amount: f64) -> Self {
        self.body.amount = format_amount(amount);
        self
    }

    /// Execution date for a future-dated payment.
    pub fn execution_date(mut self, date: NaiveDate) -> Self {
        self.body.execution_date = date.format("%Y%m%d").to_string();
        self
    }

    /// Optional. Provider-specific metadata.
    pub fn provider_transfer_metadata(mut self, metadata: ProviderTransferMetadata) -> Self {
        self.metadata().provider_transfer_metadata = Some(metadata);
        self
    }

    /// Optional. Bearer of foreign-exchange fees.
    pub fn charge_bearer(mut self, bearer: ChargeBearer) -> Self {
        self.metadata().charge_bearer = Some(bearer);
        self
    }

    /// Optional. Ultimate party the money is due to.
    pub fn ultimate_creditor(mut self, creditor: impl Into<String>) -> Self {
        self.metadata().ultimate_creditor = creditor.into();
        self
    }

    /// Optional. Ultimate party that owes the money.
    pub fn ultimate_debtor(mut self, debtor: impl Into<String>) -> Self {
        self.metadata().ultimate_debtor = debtor.into();
        self
    }

    /// Optional. ISO 20022 purpose code.
    pub fn purpose_code(mut self, purpose_code: impl Into<String>) -> Self {
        self.metadata().purpose_code = purpose_code.into();
        self
    }
}

// ─── Standing Order Builder ──────────────────────────────────────────

impl TokenRequestBuilder<StandingOrderBody> {
    fn metadata(&mut self) -> &mut TransferMetadata {
        &mut self.body.instructions.metadata
    }

    /// Amount per individual charge.
    pub fn amount(mut self, amount: f64) -> Self {
        self.body.amount = format_amount(amount);
        self
    }

    /// Currency of each charge.
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.body.currency = currency.into();
        self
    }

    /// ISO 20022 frequency: `DAIL`, `WEEK`, `TOWK`, `MNTH`, `TOMN`, `QUTR`,
    /// `SEMI`, `YEAR`.
    pub fn frequency(mut self, frequency: impl Into<String>) -> Self {
        self.body.frequency = frequency.into();
        self
    }

    /// Start date, ISO 8601 (`YYYY-MM-DD` or `YYYYMMDD`).
    pub fn start_date(mut self, start_date: impl Into<String>) -> Self {
        self.body.start_date = start_date.into();
        self
    }

    /// End date, ISO 8601. Without one the order runs indefinitely.
    pub fn end_date(mut self, end_date: impl Into<String>) -> Self {
        self.body.end_date = end_date.into();
        self
    }

    /// Add a transfer destination.
    pub fn add_destination(mut self, destination: TransferDestination) -> Self {
        self.body.instructions.transfer_destinations.push(destination);
        self
    }

    /// Optional. Narrow the country selection in the web flow.
    pub fn destination_country(mut self, country: impl Into<String>) -> Self {
        self.payload.destination_country = country.into();
        self
    }

    /// Optional. Preselect the source account.
    pub fn source(mut self, source: TransferEndpoint) -> Self {
        self.body.instructions.source = Some(source);
        self
    }

    /// Optional. Provider-specific metadata.
    pub fn provider_transfer_metadata(mut self, metadata: ProviderTransferMetadata) -> Self {
        self.metadata().provider_transfer_metadata = Some(metadata);
        self
    }

    /// Optional. Ultimate party the money is due to.
    pub fn ultimate_creditor(mut self, creditor: impl Into<String>) -> Self {
        self.metadata().ultimate_creditor = creditor.into();
        self
    }

    /// Optional. Ultimate party that owes the money.
    pub fn ultimate_debtor(mut self, debtor: impl Into<String>) -> Self {
        self.metadata().ultimate_debtor = debtor.into();
        self
    }

    /// Optional. ISO 20022 purpose code.
    pub fn purpose_code(mut self, purpose_code: impl Into<String>) -> Self {
        self.metadata().purpose_code = purpose_code.into();
        self
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::BankAccount;

    fn transfer_body(request: &TokenRequest) -> &TransferBody {
        match &request.payload().request_body {
            RequestBody::Transfer(body) => body,
            other => panic!("Expected Transfer, got {:?}", other),
        }
    }

    fn standing_order_body(request: &TokenRequest) -> &StandingOrderBody {
        match &request.payload().request_body {
            RequestBody::StandingOrder(body) => body,
            other => panic!("Expected StandingOrder, got {:?}", other),
        }
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(100.0), "100.0");
        assert_eq!(format_amount(123.45), "123.45");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(0.0001), "0.0001");
        assert_eq!(format_amount(0.00001), "0.00001");
        assert_eq!(format_amount(1e-8), "0.00000001");
        assert_eq!(format_amount(1.2e7), "12000000.0");
        assert_eq!(format_amount(1e16), "10000000000000000.0");
    }

    #[test]
    fn tiny_transfer_amount_stays_decimal() {
        let request = TokenRequest::transfer_token_request_builder(0.00001, "BTC")
            .charge_amount(1e-8)
            .build()
            .unwrap();

        let body = transfer_body(&request);
        assert_eq!(body.lifetime_amount, "0.00001");
        assert_eq!(body.amount, "0.00000001");
    }

    #[test]
    fn build_transfer_request() {
        let request = TokenRequest::transfer_token_request_builder(100.0, "USD")
            .to_alias(Alias::email("payee@example.com"))
            .description("book purchase")
            .build()
            .unwrap();

        let body = transfer_body(&request);
        assert_eq!(body.lifetime_amount, "100.0");
        assert_eq!(body.currency, "USD");
        assert_eq!(body.amount, "");
        assert_eq!(
            request.payload().to.alias,
            Some(Alias::email("payee@example.com"))
        );
        assert_eq!(request.payload().description, "book purchase");
    }

    #[test]
    fn transfer_specific_setters() {
        let request = TokenRequest::transfer_token_request_builder(250.0, "EUR")
            .charge_amount(50.0)
            .execution_date(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap())
            .destination_country("DE")
            .add_destination(TransferDestination::Sepa {
                iban: "DE89370400440532013000".into(),
                bic: String::new(),
            })
            .add_legacy_destination(TransferEndpoint {
                account: BankAccount::Token {
                    member_id: "m:payee".into(),
                    account_id: "a:1".into(),
                },
                bank_id: "iron".into(),
            })
            .charge_bearer(ChargeBearer::Shar)
            .ultimate_creditor("Creditor Ltd")
            .ultimate_debtor("Debtor GmbH")
            .purpose_code("GDDS")
            .build()
            .unwrap();

        let body = transfer_body(&request);
        assert_eq!(body.amount, "50.0");
        assert_eq!(body.execution_date, "20260307");
        assert_eq!(body.instructions.transfer_destinations.len(), 1);
        assert_eq!(body.destinations.len(), 1);
        assert_eq!(request.payload().destination_country, "DE");

        let metadata = &body.instructions.metadata;
        assert_eq!(metadata.charge_bearer, Some(ChargeBearer::Shar));
        assert_eq!(metadata.ultimate_creditor, "Creditor Ltd");
        assert_eq!(metadata.ultimate_debtor, "Debtor GmbH");
        assert_eq!(metadata.purpose_code, "GDDS");
    }

    #[test]
    fn build_access_request() {
        let request = TokenRequest::access_token_request_builder([
            ResourceType::Accounts,
            ResourceType::Transactions,
        ])
        .to_member_id("m:grantee")
        .from_alias(Alias::email("user@example.com"))
        .bank_id("iron")
        .source_account("a:src")
        .receipt_requested(true)
        .build()
        .unwrap();

        match &request.payload().request_body {
            RequestBody::Access(body) => assert_eq!(
                body.resource_types,
                vec![ResourceType::Accounts, ResourceType::Transactions]
            ),
            other => panic!("Expected Access, got {:?}", other),
        }
        assert_eq!(request.payload().to.id, "m:grantee");
        let options = request.options();
        assert_eq!(options.bank_id, "iron");
        assert_eq!(options.source_account_id, "a:src");
        assert!(options.receipt_requested);
        assert_eq!(options.from.alias, Some(Alias::email("user@example.com")));
    }

    #[test]
    fn build_standing_order_request() {
        let request = TokenRequest::standing_order_request_builder()
            .amount(12.5)
            .currency("GBP")
            .frequency("MNTH")
            .start_date("2026-01-01")
            .end_date("2026-12-31")
            .ultimate_debtor("Tenant")
            .purpose_code("RENT")
            .source(TransferEndpoint {
                account: BankAccount::FasterPayments {
                    sort_code: "040004".into(),
                    account_number: "12345678".into(),
                },
                bank_id: String::new(),
            })
            .build()
            .unwrap();

        let body = standing_order_body(&request);
        assert_eq!(body.amount, "12.5");
        assert_eq!(body.currency, "GBP");
        assert_eq!(body.frequency, "MNTH");
        assert_eq!(body.start_date, "2026-01-01");
        assert_eq!(body.end_date, "2026-12-31");
        assert!(body.instructions.source.is_some());
        assert_eq!(body.instructions.metadata.ultimate_debtor, "Tenant");
        assert_eq!(body.instructions.metadata.purpose_code, "RENT");
    }

    #[test]
    fn callback_state_hashes_csrf_token() {
        let request = TokenRequest::transfer_token_request_builder(1.0, "EUR")
            .csrf_token("nonce-123")
            .state("cart=42")
            .build()
            .unwrap();

        let state = TokenRequestState::parse(&request.payload().callback_state).unwrap();
        assert_eq!(state.state, "cart=42");
        assert_eq!(state.csrf_token_hash, sha256_base64url(b"nonce-123"));
        assert_ne!(state.csrf_token_hash, "nonce-123");
    }

    #[test]
    fn callback_state_defaults_to_empty() {
        let request = TokenRequest::access_token_request_builder([ResourceType::Balances])
            .build()
            .unwrap();
        let state = TokenRequestState::parse(&request.payload().callback_state).unwrap();
        assert_eq!(state, TokenRequestState::default());
    }

    #[test]
    fn from_parts_round_trips() {
        let request = TokenRequest::transfer_token_request_builder(9.99, "EUR")
            .ref_id("ref-1")
            .build()
            .unwrap();
        let (payload, options) = request.clone().into_parts();
        assert_eq!(TokenRequest::from_parts(payload, options), request);
    }
}
