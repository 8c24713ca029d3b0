// crates/covenant-rules/src/predicate.rs
// ============================================================================
// Module: Predicate Core Type
// Description: Shared, composable check functions over dynamic values.
// Purpose: Define `Predicate` along with its combinator constructors.
// Dependencies: serde_json, smallvec, std::sync::Arc
// ============================================================================

//! ## Overview
//! A [`Predicate`] is a cheaply cloneable check `(receiver, values…) -> bool`
//! over dynamic JSON values. Predicates are the leaves and the internal nodes
//! of clause conditions: the constructors here compose them with conjunction,
//! disjunction, and negation while preserving short-circuit evaluation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

// ============================================================================
// SECTION: Predicate Definition
// ============================================================================

/// Shared check function backing a [`Predicate`].
type CheckFn = dyn Fn(&Value, &[Value]) -> bool + Send + Sync;

/// A composable check over a receiver and a slice of values.
///
/// # Invariants
/// - Checks are total: a predicate returns `false` for values it cannot
///   examine instead of failing.
/// - Cloning shares the underlying check function.
#[derive(Clone)]
pub struct Predicate {
    /// The shared check function.
    eval: Arc<CheckFn>,
}

impl Predicate {
    /// Wraps a check function into a predicate.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            eval: Arc::new(check),
        }
    }

    /// Runs the check against a receiver and a slice of values.
    #[must_use]
    pub fn check(&self, receiver: &Value, values: &[Value]) -> bool {
        (self.eval)(receiver, values)
    }

    /// Predicate that accepts every input.
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_, _| true)
    }

    /// Predicate that rejects every input.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_, _| false)
    }

    /// Conjunction: every supplied predicate must accept.
    ///
    /// Evaluation short-circuits on the first rejection. An empty conjunction
    /// is trivially satisfied (mathematical identity).
    #[must_use]
    pub fn all_of<I>(predicates: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let parts: SmallVec<[Self; 4]> = predicates.into_iter().collect();
        Self::new(move |receiver, values| parts.iter().all(|p| p.check(receiver, values)))
    }

    /// Disjunction: at least one supplied predicate must accept.
    ///
    /// Evaluation short-circuits on the first acceptance. An empty disjunction
    /// is trivially unsatisfiable (no options available).
    #[must_use]
    pub fn any_of<I>(predicates: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let parts: SmallVec<[Self; 4]> = predicates.into_iter().collect();
        Self::new(move |receiver, values| parts.iter().any(|p| p.check(receiver, values)))
    }

    /// Negation: inverts the result of the supplied predicate.
    #[must_use]
    pub fn negate(predicate: Self) -> Self {
        Self::new(move |receiver, values| !predicate.check(receiver, values))
    }
}

// ============================================================================
// SECTION: Standard Trait Implementations
// ============================================================================

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

impl std::ops::Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::negate(self)
    }
}
