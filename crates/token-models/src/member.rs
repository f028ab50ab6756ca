//! Member records and the operations that mutate them.
//!
//! A member is an append-only chain of [`MemberUpdate`]s: every update
//! names the hash of the previous state (`prev_hash`) and carries a list of
//! [`MemberOperation`]s, signed by one of the member's privileged keys.

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::security::{Key, Signature};

/// Kind of member to create.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateMemberType {
    /// A consumer.
    #[default]
    Personal,
    /// A business or TPP.
    Business,
    /// A short-lived member without aliases.
    Transient,
}

/// The state of a member as returned by the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Member {
    /// Member id.
    pub id: String,
    /// Hash of the latest applied update.
    pub last_hash: String,
    /// Hashes of the member's verified aliases.
    #[serde(default)]
    pub alias_hashes: Vec<String>,
    /// Registered public keys.
    #[serde(default)]
    pub keys: Vec<Key>,
    /// Recovery rule, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_rule: Option<RecoveryRule>,
    /// Member type.
    #[serde(default)]
    pub member_type: CreateMemberType,
    /// Realm the member was created in; empty for the global realm.
    #[serde(default)]
    pub realm_id: String,
}

/// Who may recover a member.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RecoveryRule {
    /// Member id of the primary recovery agent.
    pub primary_agent: String,
    /// Additional agents.
    #[serde(default)]
    pub secondary_agents: Vec<String>,
}

/// What a recovery agent authorizes: installing `member_key` on top of
/// `prev_hash`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Authorization {
    /// Member being recovered.
    pub member_id: String,
    /// Member's last hash at the time of authorization.
    pub prev_hash: String,
    /// The new privileged key.
    pub member_key: Key,
}

/// An agent-signed recovery authorization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberRecoveryOperation {
    /// What was authorized.
    pub authorization: Authorization,
    /// The agent's signature over `authorization`.
    pub agent_signature: Signature,
}

/// Add a key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberAddKeyOperation {
    /// Key to add.
    pub key: Key,
}

/// Remove a key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberRemoveKeyOperation {
    /// Id of the key to remove.
    pub key_id: String,
}

/// Add or remove an alias, referenced by hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberAliasOperation {
    /// [`alias_hash`](crate::alias_hash) of the alias.
    pub alias_hash: String,
    /// Realm of the alias.
    #[serde(default)]
    pub realm_id: String,
}

/// Replace the recovery rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberRecoveryRulesOperation {
    /// The new rule.
    pub recovery_rule: RecoveryRule,
}

/// A single mutation of a member record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberOperation {
    /// Register a public key.
    AddKey(MemberAddKeyOperation),
    /// Drop a public key.
    RemoveKey(MemberRemoveKeyOperation),
    /// Attach an alias (the plaintext travels in metadata).
    AddAlias(MemberAliasOperation),
    /// Detach an alias.
    RemoveAlias(MemberAliasOperation),
    /// Replace the recovery rule.
    RecoveryRules(MemberRecoveryRulesOperation),
    /// Apply an agent-authorized recovery.
    Recover(MemberRecoveryOperation),
}

/// Side information for an add-alias operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddAliasMetadata {
    /// Hash of the alias being added.
    pub alias_hash: String,
    /// The alias in plaintext, so the gateway can start verification.
    pub alias: Alias,
}

/// Metadata accompanying a [`MemberUpdate`]; not covered by its signature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberOperationMetadata {
    /// Metadata for an add-alias operation.
    AddAliasMetadata(AddAliasMetadata),
}

/// A signed-over batch of operations on a member.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberUpdate {
    /// Member being updated.
    pub member_id: String,
    /// Hash of the state this update applies to.
    pub prev_hash: String,
    /// Operations, applied in order.
    pub operations: Vec<MemberOperation>,
}

/// A device's view of a member: the member id and the keys generated
/// locally for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Member id.
    pub member_id: String,
    /// Locally generated public keys, highest level first.
    pub keys: Vec<Key>,
}

/// A member reference inside tokens and token requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenMember {
    /// Member id; empty if only the alias is known.
    #[serde(default)]
    pub id: String,
    /// Alias, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,
}
