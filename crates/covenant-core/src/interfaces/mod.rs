// crates/covenant-core/src/interfaces/mod.rs
// ============================================================================
// Module: Host Interfaces
// Description: Host-supplied slot access and the registration-table host.
// Purpose: Define the capability surface for governing method slots without
//          reflecting over or mutating shared type metadata.
// Dependencies: crate::core::{clause, contract}, crate::error,
//               crate::runtime::court, thiserror
// ============================================================================

//! ## Overview
//! The engine never rewrites attributes on arbitrary objects. When the
//! governed target is a method slot rather than a free callable, the host
//! supplies the capability behind [`SlotHost`]: read a slot descriptor
//! (searching the owner's ancestry for the defining site), install a
//! replacement on an owner, and remove one, without disturbing unrelated
//! slots.
//!
//! [`SlotTable`] is the reference implementation: an explicit registration
//! table of `(owner, slot)` descriptors plus an owner-to-parent ancestry map.
//! [`bind_slot`] and [`unbind_slot`] wrap a hosted method with a contract and
//! restore the original.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::core::clause::TargetFn;
use crate::core::contract::Contract;
use crate::error::ContractError;
use crate::runtime::court::Bound;

// ============================================================================
// SECTION: Slot Descriptors
// ============================================================================

/// Descriptor of one method slot on an owner.
#[derive(Clone)]
pub enum SlotDescriptor {
    /// A plain callable slot.
    Method(TargetFn),
    /// An accessor pair; either side may be absent.
    Accessor {
        /// Getter side of the accessor.
        get: Option<TargetFn>,
        /// Setter side of the accessor.
        set: Option<TargetFn>,
    },
}

impl fmt::Debug for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(_) => f.debug_tuple("Method").finish_non_exhaustive(),
            Self::Accessor {
                get,
                set,
            } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .finish(),
        }
    }
}

// ============================================================================
// SECTION: Host Errors
// ============================================================================

/// Errors raised by slot hosts.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The owner is not known to the host.
    #[error("unknown owner `{owner}`")]
    UnknownOwner {
        /// The unknown owner name.
        owner: String,
    },
    /// The slot is not defined on the owner or its ancestry.
    #[error("slot `{name}` is not defined on `{owner}` or its ancestry")]
    UnknownSlot {
        /// Owner the lookup started from.
        owner: String,
        /// Name of the missing slot.
        name: String,
    },
    /// The slot is an accessor and cannot be bound as a plain method.
    #[error("slot `{name}` on `{owner}` is an accessor, not a plain method")]
    AccessorSlot {
        /// Owner carrying the accessor.
        owner: String,
        /// Name of the accessor slot.
        name: String,
    },
}

/// Errors raised while binding a contract to a hosted slot.
#[derive(Debug, Error)]
pub enum SlotBindError {
    /// The host rejected the slot operation.
    #[error(transparent)]
    Host(#[from] HostError),
    /// The contract rejected the binding.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

// ============================================================================
// SECTION: Slot Host Capability
// ============================================================================

/// Host-supplied capability for reading and replacing method slots.
pub trait SlotHost {
    /// Returns the descriptor for a slot, searching the owner's ancestry.
    fn descriptor(&self, owner: &str, name: &str) -> Option<SlotDescriptor>;

    /// Returns the owner on which the slot is actually defined, searching
    /// the ancestry chain.
    fn defining_owner(&self, owner: &str, name: &str) -> Option<String>;

    /// Installs a descriptor on the named owner, replacing any present one.
    /// Unrelated slots are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the owner is unknown to the host.
    fn install(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: SlotDescriptor,
    ) -> Result<(), HostError>;

    /// Removes and returns the descriptor defined directly on the owner.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the owner or slot is unknown.
    fn remove(&mut self, owner: &str, name: &str) -> Result<SlotDescriptor, HostError>;
}

// ============================================================================
// SECTION: Registration-Table Host
// ============================================================================

/// In-memory slot host backed by an explicit registration table.
///
/// # Invariants
/// - Ancestry is acyclic; lookups walk at most the registered chain.
#[derive(Debug, Default)]
pub struct SlotTable {
    /// Slot descriptors keyed by `(owner, slot name)`.
    slots: HashMap<(String, String), SlotDescriptor>,
    /// Owner-to-parent ancestry.
    parents: HashMap<String, String>,
    /// Owners known to the table, including those without slots.
    owners: Vec<String>,
}

impl SlotTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an owner, optionally as a child of a parent owner.
    pub fn register_owner(&mut self, owner: impl Into<String>, parent: Option<&str>) {
        let owner = owner.into();
        if let Some(parent) = parent {
            self.parents.insert(owner.clone(), parent.to_string());
        }
        if !self.owners.contains(&owner) {
            self.owners.push(owner);
        }
    }

    /// Defines a method slot directly on an owner.
    pub fn define_method(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        body: TargetFn,
    ) {
        let owner = owner.into();
        if !self.owners.contains(&owner) {
            self.owners.push(owner.clone());
        }
        self.slots.insert((owner, name.into()), SlotDescriptor::Method(body));
    }

    /// Walks the ancestry chain starting at an owner.
    fn chain<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a str> {
        let mut current = Some(owner);
        std::iter::from_fn(move || {
            let owner = current?;
            current = self.parents.get(owner).map(String::as_str);
            Some(owner)
        })
    }
}

impl SlotHost for SlotTable {
    fn descriptor(&self, owner: &str, name: &str) -> Option<SlotDescriptor> {
        self.chain(owner)
            .find_map(|site| self.slots.get(&(site.to_string(), name.to_string())).cloned())
    }

    fn defining_owner(&self, owner: &str, name: &str) -> Option<String> {
        self.chain(owner)
            .find(|site| self.slots.contains_key(&(site.to_string(), name.to_string())))
            .map(str::to_string)
    }

    fn install(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: SlotDescriptor,
    ) -> Result<(), HostError> {
        if !self.owners.iter().any(|known| known == owner) {
            return Err(HostError::UnknownOwner {
                owner: owner.to_string(),
            });
        }
        self.slots.insert((owner.to_string(), name.to_string()), descriptor);
        Ok(())
    }

    fn remove(&mut self, owner: &str, name: &str) -> Result<SlotDescriptor, HostError> {
        self.slots.remove(&(owner.to_string(), name.to_string())).ok_or_else(|| {
            HostError::UnknownSlot {
                owner: owner.to_string(),
                name: name.to_string(),
            }
        })
    }
}

// ============================================================================
// SECTION: Slot Binding Helpers
// ============================================================================

/// Binds a contract to a hosted method slot.
///
/// The slot's current body becomes the contract target, and the instrumented
/// callable is installed on the named owner (shadowing an inherited
/// definition rather than mutating the ancestor). Breaches surface through
/// the slot as faults of kind `breach`.
///
/// # Errors
///
/// Returns [`SlotBindError`] when the slot is missing, is an accessor, or the
/// contract rejects the binding.
pub fn bind_slot(
    host: &mut dyn SlotHost,
    owner: &str,
    name: &str,
    contract: &mut Contract,
) -> Result<Bound, SlotBindError> {
    let descriptor = host.descriptor(owner, name).ok_or_else(|| HostError::UnknownSlot {
        owner: owner.to_string(),
        name: name.to_string(),
    })?;
    let body = match descriptor {
        SlotDescriptor::Method(body) => body,
        SlotDescriptor::Accessor {
            ..
        } => {
            return Err(SlotBindError::Host(HostError::AccessorSlot {
                owner: owner.to_string(),
                name: name.to_string(),
            }));
        }
    };

    contract.set_target(body)?;
    let bound = contract.bind()?;
    host.install(owner, name, SlotDescriptor::Method(bound.as_target()))?;
    Ok(bound)
}

/// Unbinds a contract from a hosted method slot, restoring the original body
/// on the named owner.
///
/// # Errors
///
/// Returns [`SlotBindError`] when the contract is not bound or the owner is
/// unknown to the host.
pub fn unbind_slot(
    host: &mut dyn SlotHost,
    owner: &str,
    name: &str,
    contract: &mut Contract,
) -> Result<(), SlotBindError> {
    let original = contract.unbind()?;
    host.install(owner, name, SlotDescriptor::Method(original))?;
    Ok(())
}
