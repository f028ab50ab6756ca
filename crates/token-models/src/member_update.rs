//! # Member Update Builder
//!
//! Helpers for assembling [`MemberUpdate`]s. A member update is always
//! applied on top of the member's latest state, so the builder is seeded
//! from a [`Member`] and copies its `id` and `last_hash`.
//!
//! ```rust
//! use token_models::{Alias, Key, Member, MemberUpdateBuilder};
//!
//! let member = Member { id: "m:1".into(), last_hash: "h7".into(), ..Default::default() };
//! let update = MemberUpdateBuilder::new(&member)
//!     .add_key(Key::default())
//!     .add_alias(&Alias::email("alice@example.com"))
//!     .build();
//! assert_eq!(update.prev_hash, "h7");
//! assert_eq!(update.operations.len(), 2);
//! ```
//!
//! Aliases are normalized and hashed before they go into an operation; the
//! plaintext only travels in [`add_alias_metadata`].

use crate::alias::{alias_hash, normalize_alias, Alias};
use crate::member::{
    AddAliasMetadata, Member, MemberAddKeyOperation, MemberAliasOperation, MemberOperation,
    MemberOperationMetadata, MemberRecoveryOperation, MemberRecoveryRulesOperation,
    MemberRemoveKeyOperation, MemberUpdate, RecoveryRule,
};
use crate::security::Key;

// ─── Single operations ───────────────────────────────────────────────

/// Operation registering `key`.
pub fn add_key_operation(key: Key) -> MemberOperation {
    MemberOperation::AddKey(MemberAddKeyOperation { key })
}

/// Operation removing the key with id `key_id`.
pub fn remove_key_operation(key_id: impl Into<String>) -> MemberOperation {
    MemberOperation::RemoveKey(MemberRemoveKeyOperation {
        key_id: key_id.into(),
    })
}

/// Operation attaching `alias` (normalized, then hashed).
pub fn add_alias_operation(alias: &Alias) -> MemberOperation {
    MemberOperation::AddAlias(alias_operation(alias))
}

/// Operation detaching `alias` (normalized, then hashed).
pub fn remove_alias_operation(alias: &Alias) -> MemberOperation {
    MemberOperation::RemoveAlias(alias_operation(alias))
}

/// Operation installing a recovery rule with `agent_id` as primary agent.
pub fn recovery_agent_operation(agent_id: impl Into<String>) -> MemberOperation {
    recovery_rule_operation(RecoveryRule {
        primary_agent: agent_id.into(),
        secondary_agents: Vec::new(),
    })
}

/// Operation replacing the recovery rule.
pub fn recovery_rule_operation(recovery_rule: RecoveryRule) -> MemberOperation {
    MemberOperation::RecoveryRules(MemberRecoveryRulesOperation { recovery_rule })
}

/// Operation applying an agent-signed recovery.
pub fn recover_operation(recovery: MemberRecoveryOperation) -> MemberOperation {
    MemberOperation::Recover(recovery)
}

/// Metadata carrying the plaintext of an alias being added.
pub fn add_alias_metadata(alias: &Alias) -> MemberOperationMetadata {
    let alias = normalize_alias(alias);
    MemberOperationMetadata::AddAliasMetadata(AddAliasMetadata {
        alias_hash: alias_hash(&alias),
        alias,
    })
}

fn alias_operation(alias: &Alias) -> MemberAliasOperation {
    let alias = normalize_alias(alias);
    MemberAliasOperation {
        alias_hash: alias_hash(&alias),
        realm_id: alias.realm_id,
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Accumulates operations against a member's latest state.
#[derive(Debug, Clone)]
pub struct MemberUpdateBuilder {
    update: MemberUpdate,
}

impl MemberUpdateBuilder {
    /// Start an update on top of `member`'s latest state.
    pub fn new(member: &Member) -> Self {
        Self::for_member(member.id.clone(), member.last_hash.clone())
    }

    /// Start an update for a member known only by id and hash. An empty
    /// `prev_hash` targets a member without any applied update.
    pub fn for_member(member_id: impl Into<String>, prev_hash: impl Into<String>) -> Self {
        Self {
            update: MemberUpdate {
                member_id: member_id.into(),
                prev_hash: prev_hash.into(),
                operations: Vec::new(),
            },
        }
    }

    /// Register a key.
    pub fn add_key(self, key: Key) -> Self {
        self.operation(add_key_operation(key))
    }

    /// Remove a key.
    pub fn remove_key(self, key_id: impl Into<String>) -> Self {
        self.operation(remove_key_operation(key_id))
    }

    /// Attach an alias.
    pub fn add_alias(self, alias: &Alias) -> Self {
        self.operation(add_alias_operation(alias))
    }

    /// Detach an alias.
    pub fn remove_alias(self, alias: &Alias) -> Self {
        self.operation(remove_alias_operation(alias))
    }

    /// Replace the recovery rule.
    pub fn recovery_rule(self, recovery_rule: RecoveryRule) -> Self {
        self.operation(recovery_rule_operation(recovery_rule))
    }

    /// Apply an agent-signed recovery.
    pub fn recover(self, recovery: MemberRecoveryOperation) -> Self {
        self.operation(recover_operation(recovery))
    }

    /// Append an arbitrary operation.
    pub fn operation(mut self, operation: MemberOperation) -> Self {
        self.update.operations.push(operation);
        self
    }

    /// Append several operations.
    pub fn operations(mut self, operations: impl IntoIterator<Item = MemberOperation>) -> Self {
        self.update.operations.extend(operations);
        self
    }

    /// Finish the update.
    pub fn build(self) -> MemberUpdate {
        self.update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::KeyLevel;

    fn member() -> Member {
        Member {
            id: "m:alice".into(),
            last_hash: "hash-3".into(),
            ..Default::default()
        }
    }

    #[test]
    fn builder_seeds_member_state() {
        let update = MemberUpdateBuilder::new(&member())
            .remove_key("k1")
            .build();
        assert_eq!(update.member_id, "m:alice");
        assert_eq!(update.prev_hash, "hash-3");
        assert_eq!(update.operations, vec![remove_key_operation("k1")]);
    }

    #[test]
    fn operations_keep_insertion_order() {
        let key = Key {
            id: "k-priv".into(),
            level: KeyLevel::Privileged,
            ..Default::default()
        };
        let update = MemberUpdateBuilder::for_member("m:new", "")
            .add_key(key.clone())
            .recovery_rule(RecoveryRule {
                primary_agent: "m:agent".into(),
                secondary_agents: vec![],
            })
            .add_alias(&Alias::email("a@b.c"))
            .build();

        assert_eq!(update.prev_hash, "");
        assert!(matches!(&update.operations[0], MemberOperation::AddKey(op) if op.key == key));
        assert_eq!(update.operations[1], recovery_agent_operation("m:agent"));
        assert!(matches!(update.operations[2], MemberOperation::AddAlias(_)));
    }

    #[test]
    fn alias_operations_normalize_before_hashing() {
        let messy = Alias::email("  Alice@Example.COM ");
        let clean = Alias::email("alice@example.com");
        assert_eq!(add_alias_operation(&messy), add_alias_operation(&clean));
        assert_eq!(remove_alias_operation(&messy), remove_alias_operation(&clean));
    }

    #[test]
    fn alias_operation_keeps_realm() {
        let alias = Alias::eidas("PSDGB-FCA-123456").in_realm("m:bank");
        match add_alias_operation(&alias) {
            MemberOperation::AddAlias(op) => {
                assert_eq!(op.realm_id, "m:bank");
                assert_eq!(op.alias_hash, alias_hash(&alias));
            }
            other => panic!("Expected AddAlias, got {:?}", other),
        }
    }

    #[test]
    fn metadata_matches_operation_hash() {
        let alias = Alias::domain("Shop.Example.com");
        let MemberOperation::AddAlias(op) = add_alias_operation(&alias) else {
            panic!("Expected AddAlias");
        };
        let MemberOperationMetadata::AddAliasMetadata(meta) = add_alias_metadata(&alias);
        assert_eq!(meta.alias_hash, op.alias_hash);
        assert_eq!(meta.alias.value, "shop.example.com");
    }
}
