// crates/covenant-core/src/runtime/selector.rs
// ============================================================================
// Module: Clause Selectors
// Description: Policies deciding which clauses are active at a threshold.
// Purpose: Define the `Selector` trait, the default level policy, and the
//          audit policy.
// Dependencies: crate::core::{clause, level}
// ============================================================================

//! ## Overview
//! A selector is a pure policy `(threshold, clause) -> bool` consulted on
//! every invocation to compute the active clause subset. The default policy
//! admits a clause when its level reaches the contract threshold. Contracts
//! merge clause sets only across identical policies, compared by
//! [`Selector::policy_id`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::core::clause::Clause;
use crate::core::level::Level;

// ============================================================================
// SECTION: Selector Trait
// ============================================================================

/// Policy deciding, per clause, whether it is active at a threshold.
pub trait Selector: fmt::Debug + Send + Sync {
    /// Stable identifier of this policy, used for merge gating.
    fn policy_id(&self) -> &'static str;

    /// Returns whether the clause is active at the given threshold.
    fn admits(&self, threshold: Level, clause: &Clause) -> bool;
}

// ============================================================================
// SECTION: Shipped Policies
// ============================================================================

/// Default policy: a clause is active when its level reaches the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelGate;

impl Selector for LevelGate {
    fn policy_id(&self) -> &'static str {
        "level-gate"
    }

    fn admits(&self, threshold: Level, clause: &Clause) -> bool {
        clause.level() >= threshold
    }
}

/// Audit policy: every clause is active regardless of threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditAll;

impl Selector for AuditAll {
    fn policy_id(&self) -> &'static str {
        "audit-all"
    }

    fn admits(&self, _threshold: Level, _clause: &Clause) -> bool {
        true
    }
}

/// Returns the default selector policy.
#[must_use]
pub fn default_selector() -> Arc<dyn Selector> {
    Arc::new(LevelGate)
}
