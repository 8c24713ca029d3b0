// crates/covenant-core/src/core/registry.rs
// ============================================================================
// Module: Contract Registry
// Description: One-contract-per-target identity and retrieval.
// Purpose: Provide idempotent contract retrieval keyed by target identity,
//          for free callables and for (owner, method) slots.
// Dependencies: crate::core::{clause, contract}, serde, std::collections
// ============================================================================

//! ## Overview
//! Targets are identified by a [`TargetKey`]: the name of a free callable, or
//! an `(owner, method)` slot. The registry holds at most one contract per
//! key: retrieval creates the contract on first sight and returns the
//! existing aggregate on every later call, so all clause declarations against
//! one target accumulate in one place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::clause::TargetFn;
use crate::core::contract::Contract;

// ============================================================================
// SECTION: Target Keys
// ============================================================================

/// Identity of a governed target.
///
/// # Invariants
/// - Keys are value-comparable; two equal keys denote the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetKey {
    /// A free callable known by name.
    Callable {
        /// Name of the callable.
        name: String,
    },
    /// A method slot on an owner type.
    Slot {
        /// Name of the owner type.
        owner: String,
        /// Name of the method slot.
        name: String,
    },
}

impl TargetKey {
    /// Creates a key for a free callable.
    #[must_use]
    pub fn callable(name: impl Into<String>) -> Self {
        Self::Callable {
            name: name.into(),
        }
    }

    /// Creates a key for a method slot on an owner type.
    #[must_use]
    pub fn slot(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Slot {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable {
                name,
            } => f.write_str(name),
            Self::Slot {
                owner,
                name,
            } => {
                write!(f, "{owner}::{name}")
            }
        }
    }
}

// ============================================================================
// SECTION: Contract Registry
// ============================================================================

/// Registry holding at most one contract per target key.
///
/// # Invariants
/// - Retrieval is idempotent per key: the first call creates the contract,
///   every later call returns the same aggregate.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    /// Contracts keyed by target identity.
    entries: HashMap<TargetKey, Contract>,
}

impl ContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves the contract for a target, creating it on first sight.
    ///
    /// The supplied target attaches only when the contract is created; a key
    /// that already carries a contract returns the existing aggregate and the
    /// supplied target is dropped.
    pub fn contract_for(&mut self, key: TargetKey, target: TargetFn) -> &mut Contract {
        self.entries.entry(key).or_insert_with(|| Contract::new(target))
    }

    /// Retrieves the contract for a target that will be attached later,
    /// creating a pending contract on first sight.
    pub fn contract_at(&mut self, key: TargetKey) -> &mut Contract {
        self.entries.entry(key).or_insert_with(Contract::pending)
    }

    /// Returns the contract for a key without creating one.
    #[must_use]
    pub fn get(&self, key: &TargetKey) -> Option<&Contract> {
        self.entries.get(key)
    }

    /// Removes and returns the contract for a key, provided it is unbound.
    ///
    /// A bound contract stays registered and `None` is returned; unbind it
    /// first to release it.
    pub fn release(&mut self, key: &TargetKey) -> Option<Contract> {
        if self.entries.get(key).is_some_and(Contract::is_bound) {
            return None;
        }
        self.entries.remove(key)
    }

    /// Returns the number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
