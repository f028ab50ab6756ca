#![deny(missing_docs)]

//! # Token Models
//!
//! Data types for the Token open-banking gateway.
//!
//! ## Message hierarchy
//!
//! ```text
//! TokenRequest
//! ├── TokenRequestPayload
//! │   ├── to: TokenMember { id, alias }
//! │   ├── callback_state: TokenRequestState (base64url JSON)
//! │   └── request_body: RequestBody
//! │       ├── Access(AccessBody)
//! │       ├── Transfer(TransferBody)
//! │       └── StandingOrder(StandingOrderBody)
//! └── TokenRequestOptions { bank_id, from, source_account_id, .. }
//!
//! MemberUpdate { member_id, prev_hash }
//! └── operations: [MemberOperation]
//!     ├── AddKey / RemoveKey
//!     ├── AddAlias / RemoveAlias (hash only; plaintext in metadata)
//!     ├── RecoveryRules
//!     └── Recover(MemberRecoveryOperation)
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`alias`] | `Alias`, normalization and hashing |
//! | [`security`] | Keys, key levels, signatures, security metadata |
//! | [`member`] | Member records and member operations |
//! | [`account`] | Accounts, balances, transactions, banks, paging |
//! | [`token_request`] | Token-request payloads and callback state |
//! | [`request_builder`] | Fluent token-request builders |
//! | [`member_update`] | Member-update builder and operation helpers |
//! | [`notification`] | Device notifications and blobs |
//! | [`eidas`] | eIDAS verification messages |
//! | [`gateway`] | Request/response bodies of every gateway method |
//! | [`canonical`] | Deterministic serialization for signing and hashing |

pub mod account;
pub mod alias;
pub mod canonical;
pub mod eidas;
pub mod error;
pub mod gateway;
pub mod member;
pub mod member_update;
pub mod notification;
pub mod request_builder;
pub mod security;
pub mod token_request;

// Re-export all public types at crate root for convenience.
// Gateway messages stay under `gateway::` to keep the root readable.
pub use account::*;
pub use alias::*;
pub use canonical::*;
pub use eidas::*;
pub use error::*;
pub use member::*;
pub use member_update::*;
pub use notification::*;
pub use request_builder::*;
pub use security::*;
pub use token_request::*;
