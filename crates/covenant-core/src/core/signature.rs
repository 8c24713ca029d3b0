// crates/covenant-core/src/core/signature.rs
// ============================================================================
// Module: Signatures
// Description: Accepted call shapes with return and throw checking.
// Purpose: Define `Signature`, its matchers, and the structured draft used
//          to declare additional call shapes on a contract.
// Dependencies: crate::core::clause, crate::error, covenant-rules, smallvec
// ============================================================================

//! ## Overview
//! A signature describes one accepted call shape: per-position argument
//! matchers, a return matcher, and an optional fault allow-list. A contract
//! holds signatures in declaration order; the first whose argument matchers
//! accept a call governs that invocation's return and throw checking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use covenant_rules::Predicate;
use serde_json::Value;
use smallvec::SmallVec;

use crate::core::clause::Clause;
use crate::core::clause::ClauseDraft;
use crate::core::clause::ClauseKind;
use crate::error::ContractError;

// ============================================================================
// SECTION: Matchers
// ============================================================================

/// Matcher for one argument position.
#[derive(Debug, Clone)]
pub enum ArgMatcher {
    /// Wildcard: accepts any value at this position.
    Any,
    /// The predicate must accept the value at this position.
    Must(Predicate),
}

impl ArgMatcher {
    /// Tests the matcher against a value.
    #[must_use]
    pub fn accepts(&self, receiver: &Value, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Must(predicate) => predicate.check(receiver, std::slice::from_ref(value)),
        }
    }
}

impl From<Predicate> for ArgMatcher {
    fn from(predicate: Predicate) -> Self {
        Self::Must(predicate)
    }
}

/// Matcher for the produced result.
#[derive(Debug, Clone, Default)]
pub enum ReturnMatcher {
    /// Wildcard: accepts any result.
    #[default]
    Any,
    /// The predicate must accept the result.
    Must(Predicate),
}

// ============================================================================
// SECTION: Signature
// ============================================================================

/// One accepted call shape for a governed target.
///
/// # Invariants
/// - An empty argument-matcher list matches any call; a non-empty list
///   applies only to calls of equal arity.
/// - `safety` of `None` means throw-checking is inactive; `Some` holds the
///   ordered allow-list, empty after an explicit no-throw declaration.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    /// Optional human-readable description.
    description: Option<String>,
    /// Ordered per-position argument matchers.
    arguments: SmallVec<[ArgMatcher; 4]>,
    /// Matcher over the produced result.
    returns: ReturnMatcher,
    /// Ordered fault allow-list of throw-guard clauses.
    safety: Option<Vec<Clause>>,
}

impl Signature {
    /// Creates the implicit accept-anything signature.
    #[must_use]
    pub(crate) fn accept_anything() -> Self {
        Self::default()
    }

    /// Returns the signature description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared argument arity, `None` for the match-any shape.
    #[must_use]
    pub fn arity(&self) -> Option<usize> {
        if self.arguments.is_empty() { None } else { Some(self.arguments.len()) }
    }

    /// Tests whether this signature accepts the call shape.
    #[must_use]
    pub fn matches_call(&self, receiver: &Value, args: &[Value]) -> bool {
        if self.arguments.is_empty() {
            return true;
        }
        self.arguments.len() == args.len()
            && self.arguments.iter().zip(args).all(|(matcher, arg)| matcher.accepts(receiver, arg))
    }

    /// Tests whether this signature accepts the produced result.
    #[must_use]
    pub fn matches_return(&self, receiver: &Value, value: &Value) -> bool {
        match &self.returns {
            ReturnMatcher::Any => true,
            ReturnMatcher::Must(predicate) => {
                predicate.check(receiver, std::slice::from_ref(value))
            }
        }
    }

    /// Returns the fault allow-list, `None` when throw-checking is inactive.
    #[must_use]
    pub fn safety(&self) -> Option<&[Clause]> {
        self.safety.as_deref()
    }

    /// Declares that this shape must not fault at all.
    pub(crate) fn set_nothrow(&mut self) {
        self.safety = Some(Vec::new());
    }

    /// Appends a throw-guard clause, activating throw-checking.
    pub(crate) fn push_guard(&mut self, guard: Clause) {
        self.safety.get_or_insert_with(Vec::new).push(guard);
    }
}

// ============================================================================
// SECTION: Signature Draft
// ============================================================================

/// Structured draft for declaring an additional call shape.
#[derive(Debug, Clone, Default)]
pub struct SignatureDraft {
    /// Optional human-readable description.
    description: Option<String>,
    /// Ordered per-position argument matchers.
    arguments: Vec<ArgMatcher>,
    /// Matcher over the produced result.
    returns: Option<Predicate>,
    /// Fault allow-list drafts; `Some(empty)` declares no-throw.
    throws: Option<Vec<ClauseDraft>>,
}

impl SignatureDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a positional argument matcher.
    #[must_use]
    pub fn arg(mut self, matcher: impl Into<ArgMatcher>) -> Self {
        self.arguments.push(matcher.into());
        self
    }

    /// Appends a wildcard argument position.
    #[must_use]
    pub fn any_arg(mut self) -> Self {
        self.arguments.push(ArgMatcher::Any);
        self
    }

    /// Sets the return matcher.
    #[must_use]
    pub fn returns(mut self, predicate: Predicate) -> Self {
        self.returns = Some(predicate);
        self
    }

    /// Declares that this shape must not fault at all.
    #[must_use]
    pub fn nothrow(mut self) -> Self {
        self.throws = Some(Vec::new());
        self
    }

    /// Appends a fault allow-list entry, activating throw-checking.
    #[must_use]
    pub fn throws(mut self, draft: impl Into<ClauseDraft>) -> Self {
        self.throws.get_or_insert_with(Vec::new).push(draft.into());
        self
    }

    /// Validates the draft into a signature.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when a throw-guard draft lacks a predicate.
    pub(crate) fn build(self) -> Result<Signature, ContractError> {
        let safety = match self.throws {
            None => None,
            Some(drafts) => Some(
                drafts
                    .into_iter()
                    .map(|draft| draft.build(ClauseKind::ThrowGuard))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(Signature {
            description: self.description,
            arguments: self.arguments.into_iter().collect(),
            returns: self.returns.map_or(ReturnMatcher::Any, ReturnMatcher::Must),
            safety,
        })
    }
}
