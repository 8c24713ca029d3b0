// crates/covenant-core/src/error.rs
// ============================================================================
// Module: Covenant Error Taxonomy
// Description: Construction errors, runtime breaches, and target faults.
// Purpose: Keep contract authoring fail-fast and make runtime violations
//          distinguishable from ordinary target failures.
// Dependencies: crate::core::{clause, level}, covenant-rules, serde, thiserror
// ============================================================================

//! ## Overview
//! Two error families exist. [`ContractError`] covers contract authoring and
//! always surfaces from the builder method that caused it. [`CourtError`]
//! covers invocation: a [`Breach`] identifies the failing clause and phase,
//! while an allowed [`Fault`] from the target body propagates untouched and
//! remains distinguishable from a breach.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use covenant_rules::RuleError;
use covenant_rules::value_match::KIND_FIELD;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::core::clause::ClauseInfo;
use crate::core::clause::ClauseKind;

// ============================================================================
// SECTION: Target Faults
// ============================================================================

/// A failure raised by the target body, the engine's model of a thrown
/// exception.
///
/// # Invariants
/// - `kind` is a stable classification string usable by throw-guard rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    /// Stable fault classification.
    pub kind: String,
    /// Human-readable failure message.
    pub message: String,
    /// Optional structured payload.
    pub data: Option<Value>,
}

impl Fault {
    /// Creates a fault with a kind and message.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Attaches a structured payload to the fault.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Projects the fault into a value so throw-guard rules can examine it.
    ///
    /// The projection carries the fault kind in the standard kind-marker
    /// field, so `instanceof` rules classify faults like any other value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            KIND_FIELD: self.kind,
            "message": self.message,
            "data": self.data,
        })
    }
}

// ============================================================================
// SECTION: Invocation Phases
// ============================================================================

/// Phase of the invocation protocol in which a breach occurred.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Invariant and requirement checks before the body runs.
    Pre,
    /// Body execution and throw-guard checks.
    Body,
    /// Return-shape, guarantee, and invariant checks after the body.
    Post,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pre => "pre",
            Self::Body => "body",
            Self::Post => "post",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SECTION: Breach Citations
// ============================================================================

/// Identification of what a breach violated.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Citation {
    /// A clause predicate rejected the invocation.
    Clause {
        /// Snapshot of the failing clause.
        clause: ClauseInfo,
    },
    /// The matched signature rejected the produced result.
    Signature {
        /// Description of the rejected shape.
        detail: String,
    },
    /// The body faulted and no throw guard covered the fault.
    UncoveredFault {
        /// Classification of the uncovered fault.
        fault_kind: String,
    },
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clause {
                clause,
            } => write!(f, "{clause}"),
            Self::Signature {
                detail,
            } => {
                write!(f, "signature violation: {detail}")
            }
            Self::UncoveredFault {
                fault_kind,
            } => {
                write!(f, "uncovered fault `{fault_kind}`")
            }
        }
    }
}

// ============================================================================
// SECTION: Breach
// ============================================================================

/// A runtime contract violation.
///
/// # Invariants
/// - `fault` is populated exactly when the breach captured a body fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("breach of contract in {phase} phase: {citation}")]
pub struct Breach {
    /// Phase in which the violation was detected.
    pub phase: Phase,
    /// Identification of the violated clause or signature.
    pub citation: Citation,
    /// The originally captured fault, chained rather than swallowed.
    #[source]
    pub fault: Option<Fault>,
}

impl Breach {
    /// Creates a breach citing a clause.
    #[must_use]
    pub const fn clause(phase: Phase, clause: ClauseInfo) -> Self {
        Self {
            phase,
            citation: Citation::Clause {
                clause,
            },
            fault: None,
        }
    }

    /// Creates a body-phase breach wrapping an uncovered fault.
    #[must_use]
    pub fn uncovered(fault: Fault) -> Self {
        Self {
            phase: Phase::Body,
            citation: Citation::UncoveredFault {
                fault_kind: fault.kind.clone(),
            },
            fault: Some(fault),
        }
    }
}

impl From<Breach> for Fault {
    /// Demotes a breach into a fault for hosts whose call surface only
    /// carries faults (installed slots). The breach survives serialized in
    /// the fault payload.
    fn from(breach: Breach) -> Self {
        let data = serde_json::to_value(&breach).ok();
        Self {
            kind: "breach".to_string(),
            message: breach.to_string(),
            data,
        }
    }
}

// ============================================================================
// SECTION: Construction Errors
// ============================================================================

/// Errors raised while authoring a contract.
///
/// # Invariants
/// - Every variant is raised at declaration time, never at invocation time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    /// A clause draft was attached without a predicate.
    #[error("{kind} clause is missing its predicate")]
    MissingPredicate {
        /// Kind the malformed clause was declared as.
        kind: ClauseKind,
    },

    /// A decorator draft was attached without a rewrite function.
    #[error("decorator clause is missing its rewrite function")]
    MissingRewrite,

    /// The contract has no target to bind.
    #[error("contract has no target to bind")]
    MissingTarget,

    /// A mutation or merge was attempted on a bound contract.
    #[error("contract is already bound")]
    AlreadyBound,

    /// An unbind was attempted on a contract that is not bound.
    #[error("contract is not bound")]
    NotBound,

    /// A rule construction failed while building a clause predicate.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

// ============================================================================
// SECTION: Invocation Errors
// ============================================================================

/// Errors surfacing from a bound callable.
///
/// A breach means the contract itself was violated; a fault is the target's
/// own failure, propagated untouched because the contract allows it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CourtError {
    /// The contract was violated.
    #[error(transparent)]
    Breach(#[from] Breach),

    /// The target faulted and the contract permits the fault.
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl CourtError {
    /// Returns the breach when this error is a contract violation.
    #[must_use]
    pub const fn breach(&self) -> Option<&Breach> {
        match self {
            Self::Breach(breach) => Some(breach),
            Self::Fault(_) => None,
        }
    }

    /// Returns the underlying fault, whether allowed or captured by a breach.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::Breach(breach) => breach.fault.as_ref(),
        }
    }
}
