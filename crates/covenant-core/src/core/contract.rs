// crates/covenant-core/src/core/contract.rs
// ============================================================================
// Module: Contract Aggregate
// Description: Clause and signature aggregation for one governed target.
// Purpose: Provide the fail-fast builder surface, the amend merge, and the
//          bind/unbind lifecycle entry points.
// Dependencies: crate::core::{clause, level, signature}, crate::error,
//               crate::runtime::{court, selector}, smallvec
// ============================================================================

//! ## Overview
//! A contract aggregates the clauses and signatures governing one target.
//! Builder methods validate eagerly and return `Result<&mut Self>` so
//! declarations chain with `?`. The contract is built fully, bound once via
//! [`Contract::bind`], and never mutated while bound: every builder method
//! rejects a bound contract with [`ContractError::AlreadyBound`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use smallvec::smallvec;

use crate::core::clause::Clause;
use crate::core::clause::ClauseDraft;
use crate::core::clause::ClauseKind;
use crate::core::clause::DecoratorDraft;
use crate::core::clause::TargetFn;
use crate::core::level::Level;
use crate::core::signature::Signature;
use crate::core::signature::SignatureDraft;
use crate::error::ContractError;
use crate::error::Fault;
use crate::runtime::court::Bound;
use crate::runtime::selector::Selector;
use crate::runtime::selector::default_selector;

// ============================================================================
// SECTION: Amend Fields
// ============================================================================

/// Fields eligible for merging through [`Contract::amend`].
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendField {
    /// The governed target; merged only when explicitly listed and unset.
    Target,
    /// Invariant clause sequence.
    Invariants,
    /// Requirement clause sequence.
    Requirements,
    /// Guarantee clause sequence.
    Guarantees,
    /// Decorator clause sequence.
    Decorators,
    /// Declared signature sequence.
    Signatures,
}

// ============================================================================
// SECTION: Contract
// ============================================================================

/// The aggregate of clauses and signatures governing one target.
///
/// # Invariants
/// - Clause sequences preserve declaration order; declaration order is
///   evaluation order within a kind.
/// - `signatures[0]` is the implicit accept-anything shape created at
///   construction.
/// - Builder mutation is rejected while `bound` is true.
pub struct Contract {
    /// The governed callable, if already attached.
    target: Option<TargetFn>,
    /// Active enforcement threshold.
    level: Level,
    /// Policy deciding which clauses are active per invocation.
    selector: Arc<dyn Selector>,
    /// Invariant clauses, checked before and after the body.
    invariants: Vec<Clause>,
    /// Requirement clauses, checked before the body.
    requirements: Vec<Clause>,
    /// Guarantee clauses, checked after the body.
    guarantees: Vec<Clause>,
    /// Decorator clauses, applied to the pending call.
    decorators: Vec<Clause>,
    /// Accepted call shapes in declaration order.
    signatures: SmallVec<[Signature; 2]>,
    /// Whether a wrapped callable has been produced.
    bound: bool,
}

impl Contract {
    /// Creates a contract governing the given target.
    #[must_use]
    pub fn new(target: TargetFn) -> Self {
        Self {
            target: Some(target),
            ..Self::pending()
        }
    }

    /// Creates a contract whose target will be attached later (slot binding).
    #[must_use]
    pub fn pending() -> Self {
        Self {
            target: None,
            level: Level::default(),
            selector: default_selector(),
            invariants: Vec::new(),
            requirements: Vec::new(),
            guarantees: Vec::new(),
            decorators: Vec::new(),
            signatures: smallvec![Signature::accept_anything()],
            bound: false,
        }
    }

    /// Creates a contract over a plain closure.
    pub fn over<F>(body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::new(Arc::new(body))
    }

    // ========================================================================
    // SECTION: Builder Surface
    // ========================================================================

    /// Appends an invariant clause.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the draft lacks a predicate or the
    /// contract is bound.
    pub fn invariant(&mut self, draft: impl Into<ClauseDraft>) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        let clause = draft.into().build(ClauseKind::Invariant)?;
        self.invariants.push(clause);
        Ok(self)
    }

    /// Appends a requirement clause.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the draft lacks a predicate or the
    /// contract is bound.
    pub fn require(&mut self, draft: impl Into<ClauseDraft>) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        let clause = draft.into().build(ClauseKind::Requirement)?;
        self.requirements.push(clause);
        Ok(self)
    }

    /// Appends a guarantee clause.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the draft lacks a predicate or the
    /// contract is bound.
    pub fn guarantee(&mut self, draft: impl Into<ClauseDraft>) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        let clause = draft.into().build(ClauseKind::Guarantee)?;
        self.guarantees.push(clause);
        Ok(self)
    }

    /// Appends several invariant clauses in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] on the first invalid draft; drafts before it
    /// are already attached.
    pub fn invariant_all<I>(&mut self, drafts: I) -> Result<&mut Self, ContractError>
    where
        I: IntoIterator,
        I::Item: Into<ClauseDraft>,
    {
        for draft in drafts {
            self.invariant(draft)?;
        }
        Ok(self)
    }

    /// Appends several requirement clauses in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] on the first invalid draft; drafts before it
    /// are already attached.
    pub fn require_all<I>(&mut self, drafts: I) -> Result<&mut Self, ContractError>
    where
        I: IntoIterator,
        I::Item: Into<ClauseDraft>,
    {
        for draft in drafts {
            self.require(draft)?;
        }
        Ok(self)
    }

    /// Appends several guarantee clauses in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] on the first invalid draft; drafts before it
    /// are already attached.
    pub fn guarantee_all<I>(&mut self, drafts: I) -> Result<&mut Self, ContractError>
    where
        I: IntoIterator,
        I::Item: Into<ClauseDraft>,
    {
        for draft in drafts {
            self.guarantee(draft)?;
        }
        Ok(self)
    }

    /// Appends a decorator clause.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the draft lacks a rewrite function or
    /// the contract is bound.
    pub fn decorate(&mut self, draft: DecoratorDraft) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        let clause = draft.build()?;
        self.decorators.push(clause);
        Ok(self)
    }

    /// Declares an additional accepted call shape.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the draft is invalid or the contract is
    /// bound.
    pub fn signature(&mut self, draft: SignatureDraft) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        let signature = draft.build()?;
        self.signatures.push(signature);
        Ok(self)
    }

    /// Declares that the default call shape must not fault at all.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyBound`] when the contract is bound.
    pub fn nothrow(&mut self) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        self.signatures[0].set_nothrow();
        Ok(self)
    }

    /// Appends a fault allow-list entry to the default call shape,
    /// activating throw-checking.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the draft lacks a predicate or the
    /// contract is bound.
    pub fn throws(&mut self, draft: impl Into<ClauseDraft>) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        let guard = draft.into().build(ClauseKind::ThrowGuard)?;
        self.signatures[0].push_guard(guard);
        Ok(self)
    }

    /// Moves the enforcement threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyBound`] when the contract is bound;
    /// a live binding moves its threshold through [`Bound::set_level`].
    pub fn set_level(&mut self, level: Level) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        self.level = level;
        Ok(self)
    }

    /// Replaces the selector policy.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyBound`] when the contract is bound.
    pub fn set_selector(
        &mut self,
        selector: Arc<dyn Selector>,
    ) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        self.selector = selector;
        Ok(self)
    }

    /// Attaches the governed target (used by slot binding).
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyBound`] when the contract is bound.
    pub fn set_target(&mut self, target: TargetFn) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;
        self.target = Some(target);
        Ok(self)
    }

    // ========================================================================
    // SECTION: Amend
    // ========================================================================

    /// Merges another contract's fields and clause sequences into this one.
    ///
    /// Scalar fields (the target) merge only when explicitly listed in
    /// `fields` and only when unset on `self`. Clause and signature sequences
    /// merge by default, or when listed — but only when both contracts share
    /// the same selector policy. On a policy mismatch the clause and
    /// signature merge is skipped entirely, silently, while the scalar merge
    /// still proceeds. Callers combining contracts across policies must align
    /// the selectors first.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyBound`] when this contract is bound.
    pub fn amend(
        &mut self,
        other: &Self,
        fields: Option<&[AmendField]>,
    ) -> Result<&mut Self, ContractError> {
        self.ensure_unbound()?;

        let listed = |field: AmendField| fields.is_some_and(|set| set.contains(&field));
        let merged = |field: AmendField| fields.is_none_or(|set| set.contains(&field));

        if listed(AmendField::Target) && self.target.is_none() {
            self.target = other.target.clone();
        }

        if self.selector.policy_id() == other.selector.policy_id() {
            if merged(AmendField::Invariants) {
                self.invariants.extend(other.invariants.iter().cloned());
            }
            if merged(AmendField::Requirements) {
                self.requirements.extend(other.requirements.iter().cloned());
            }
            if merged(AmendField::Guarantees) {
                self.guarantees.extend(other.guarantees.iter().cloned());
            }
            if merged(AmendField::Decorators) {
                self.decorators.extend(other.decorators.iter().cloned());
            }
            if merged(AmendField::Signatures) {
                // The other contract's implicit default shape stays behind.
                self.signatures.extend(other.signatures.iter().skip(1).cloned());
            }
        }

        Ok(self)
    }

    // ========================================================================
    // SECTION: Lifecycle
    // ========================================================================

    /// Produces the instrumented callable enforcing this contract.
    ///
    /// Binding is idempotent-safe: binding an already-bound contract returns
    /// an equivalent wrapped callable, since clause sequences cannot change
    /// while the contract is bound.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MissingTarget`] when no target is attached.
    pub fn bind(&mut self) -> Result<Bound, ContractError> {
        let target = self.target.clone().ok_or(ContractError::MissingTarget)?;
        self.bound = true;
        Ok(Bound::assemble(self, target))
    }

    /// Installs a selector policy and produces the instrumented callable in
    /// one step.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyBound`] when the contract is bound
    /// (configure the selector before binding), and
    /// [`ContractError::MissingTarget`] when no target is attached.
    pub fn bind_with(&mut self, selector: Arc<dyn Selector>) -> Result<Bound, ContractError> {
        self.set_selector(selector)?;
        self.bind()
    }

    /// Discards the binding and returns the original target.
    ///
    /// The contract becomes eligible for amendment and rebinding.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::NotBound`] when the contract is not bound,
    /// and [`ContractError::MissingTarget`] when it has no target.
    pub fn unbind(&mut self) -> Result<TargetFn, ContractError> {
        if !self.bound {
            return Err(ContractError::NotBound);
        }
        self.bound = false;
        self.target.clone().ok_or(ContractError::MissingTarget)
    }

    // ========================================================================
    // SECTION: Accessors
    // ========================================================================

    /// Returns the active enforcement threshold.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Returns whether a wrapped callable has been produced.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Returns the selector policy.
    #[must_use]
    pub fn selector(&self) -> &Arc<dyn Selector> {
        &self.selector
    }

    /// Returns the invariant clauses in declaration order.
    #[must_use]
    pub fn invariants(&self) -> &[Clause] {
        &self.invariants
    }

    /// Returns the requirement clauses in declaration order.
    #[must_use]
    pub fn requirements(&self) -> &[Clause] {
        &self.requirements
    }

    /// Returns the guarantee clauses in declaration order.
    #[must_use]
    pub fn guarantees(&self) -> &[Clause] {
        &self.guarantees
    }

    /// Returns the decorator clauses in declaration order.
    #[must_use]
    pub fn decorators(&self) -> &[Clause] {
        &self.decorators
    }

    /// Returns the declared signatures, the implicit default first.
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Returns whether a target is attached.
    #[must_use]
    pub const fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Rejects builder mutation on a bound contract.
    const fn ensure_unbound(&self) -> Result<(), ContractError> {
        if self.bound { Err(ContractError::AlreadyBound) } else { Ok(()) }
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("level", &self.level)
            .field("selector", &self.selector.policy_id())
            .field("invariants", &self.invariants.len())
            .field("requirements", &self.requirements.len())
            .field("guarantees", &self.guarantees.len())
            .field("decorators", &self.decorators.len())
            .field("signatures", &self.signatures.len())
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}
