// crates/covenant-rules/src/error.rs
// ============================================================================
// Module: Rule Error Definitions
// Description: Structured diagnostics for rule construction.
// Purpose: Report malformed rule requests eagerly, before any predicate runs.
// Dependencies: serde::{Serialize, Deserialize}, std::fmt
// ============================================================================

//! ## Overview
//! Centralizes the rule-construction errors, their user-facing messaging, and
//! serialization guarantees. Rule construction is eager and total: every
//! variant here is raised while a predicate is being built, never while one is
//! being evaluated.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Error Definition
// ============================================================================

/// Errors that can occur while constructing a predicate from a rule key.
///
/// # Invariants
/// - Variants capture structured construction failures; none are raised
///   during predicate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleError {
    /// The requested combinator key is not registered in the rule book.
    UnknownRule {
        /// The unrecognized combinator key.
        key: String,
    },

    /// The positional filter suffix (`key@index`) failed to parse.
    InvalidFilter {
        /// The full key as supplied, including the filter suffix.
        key: String,
        /// The filter text that failed to parse as a position.
        raw: String,
    },

    /// The combinator requires at least one argument and received none.
    MissingArgument {
        /// The combinator key that was invoked.
        key: String,
    },

    /// An argument had the wrong shape for the combinator.
    InvalidArgument {
        /// The combinator key that was invoked.
        key: String,
        /// Description of the expectation that was violated.
        detail: String,
    },

    /// A pattern argument failed to compile.
    InvalidPattern {
        /// The pattern text that failed to compile.
        pattern: String,
        /// Compiler diagnostic for the failure.
        detail: String,
    },
}

// ============================================================================
// SECTION: Display Implementation
// ============================================================================

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRule {
                key,
            } => {
                write!(f, "unknown rule `{key}`")
            }
            Self::InvalidFilter {
                key,
                raw,
            } => {
                write!(f, "invalid positional filter `{raw}` in rule key `{key}`")
            }
            Self::MissingArgument {
                key,
            } => {
                write!(f, "rule `{key}` requires at least one argument")
            }
            Self::InvalidArgument {
                key,
                detail,
            } => {
                write!(f, "invalid argument for rule `{key}`: {detail}")
            }
            Self::InvalidPattern {
                pattern,
                detail,
            } => {
                write!(f, "invalid pattern `{pattern}`: {detail}")
            }
        }
    }
}

// ============================================================================
// SECTION: Standard Trait Implementations
// ============================================================================

impl std::error::Error for RuleError {}

// ============================================================================
// SECTION: Convenience Helpers
// ============================================================================

impl RuleError {
    /// Creates an unknown-rule error for the given key.
    pub fn unknown(key: impl Into<String>) -> Self {
        Self::UnknownRule {
            key: key.into(),
        }
    }

    /// Creates a missing-argument error for the given key.
    pub fn missing_argument(key: impl Into<String>) -> Self {
        Self::MissingArgument {
            key: key.into(),
        }
    }

    /// Creates an invalid-argument error with the given expectation text.
    pub fn invalid_argument(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            key: key.into(),
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Result Alias
// ============================================================================

/// Convenient Result type for rule-construction operations.
pub type RuleResult<T = ()> = Result<T, RuleError>;
