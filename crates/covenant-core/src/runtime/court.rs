// crates/covenant-core/src/runtime/court.rs
// ============================================================================
// Module: Court Runtime
// Description: Instrumented callable and the per-invocation state machine.
// Purpose: Run selector filtering, pre-checks, decoration, body capture, and
//          post-checks in a fixed order around every invocation.
// Dependencies: crate::core::{clause, contract, level, signature},
//               crate::error, crate::runtime::selector, smallvec
// ============================================================================

//! ## Overview
//! [`Bound`] is the wrapped callable a contract produces. Every call convenes
//! a court that runs the invocation protocol in fixed order: selector filter,
//! invariants and requirements against the receiver and arguments, decorator
//! rewrites, body execution inside a fault capture, then return-shape,
//! guarantee, and invariant checks over the result. The first failing check
//! raises a [`Breach`] naming the clause and phase.
//!
//! The court is a stateless wrapper per call: the filtered clause lists and
//! any captured fault are local to the invocation, so a `Bound` is safe to
//! share exactly when its target is, and re-entrant calls simply re-run the
//! full protocol (inner frames report first). The engine adds no locking and
//! has no suspension points.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

use crate::core::clause::Clause;
use crate::core::clause::Decorated;
use crate::core::clause::TargetFn;
use crate::core::contract::Contract;
use crate::core::level::Level;
use crate::core::signature::Signature;
use crate::error::Breach;
use crate::error::Citation;
use crate::error::CourtError;
use crate::error::Fault;
use crate::error::Phase;
use crate::runtime::selector::Selector;

// ============================================================================
// SECTION: Bound Callable
// ============================================================================

/// The instrumented callable produced by binding a contract.
///
/// # Invariants
/// - Clause sequences are snapshots taken at bind time; the source contract
///   rejects mutation while bound, so every snapshot of one binding agrees.
/// - All per-call state is local to the invocation.
#[derive(Clone)]
pub struct Bound {
    /// The original governed target.
    target: TargetFn,
    /// Enforcement threshold consulted by the selector on each call.
    level: Level,
    /// Policy computing the active clause subset.
    selector: Arc<dyn Selector>,
    /// Invariant clauses in declaration order.
    invariants: Vec<Clause>,
    /// Requirement clauses in declaration order.
    requirements: Vec<Clause>,
    /// Guarantee clauses in declaration order.
    guarantees: Vec<Clause>,
    /// Decorator clauses in declaration order.
    decorators: Vec<Clause>,
    /// Accepted call shapes, the implicit default first.
    signatures: SmallVec<[Signature; 2]>,
}

impl Bound {
    /// Snapshots a contract into an instrumented callable.
    pub(crate) fn assemble(contract: &Contract, target: TargetFn) -> Self {
        Self {
            target,
            level: contract.level(),
            selector: Arc::clone(contract.selector()),
            invariants: contract.invariants().to_vec(),
            requirements: contract.requirements().to_vec(),
            guarantees: contract.guarantees().to_vec(),
            decorators: contract.decorators().to_vec(),
            signatures: contract.signatures().iter().cloned().collect(),
        }
    }

    /// Invokes the governed target with full contract enforcement.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::Breach`] when a clause or signature check fails,
    /// and [`CourtError::Fault`] when the body faults and the contract allows
    /// the fault (the fault propagates unchanged).
    pub fn call(&self, receiver: &Value, args: &[Value]) -> Result<Value, CourtError> {
        Court {
            bound: self,
            receiver,
        }
        .run(args)
    }

    /// Moves the enforcement threshold for subsequent calls.
    ///
    /// Lowering the threshold activates dormant low-level clauses on the next
    /// call; raising it sheds them.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// Returns the current enforcement threshold.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Repackages this binding as a plain target function.
    ///
    /// Used when the binding is installed into a host slot whose call surface
    /// only carries faults: breaches surface as faults of kind `breach` with
    /// the serialized breach as payload.
    #[must_use]
    pub fn as_target(&self) -> TargetFn {
        let bound = self.clone();
        Arc::new(move |receiver, args| {
            bound.call(receiver, args).map_err(|err| match err {
                CourtError::Fault(fault) => fault,
                CourtError::Breach(breach) => Fault::from(breach),
            })
        })
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("level", &self.level)
            .field("selector", &self.selector.policy_id())
            .field("invariants", &self.invariants.len())
            .field("requirements", &self.requirements.len())
            .field("guarantees", &self.guarantees.len())
            .field("decorators", &self.decorators.len())
            .field("signatures", &self.signatures.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Court State Machine
// ============================================================================

/// Active clause subset computed for one invocation.
struct Docket<'a> {
    /// Active invariant clauses.
    invariants: Vec<&'a Clause>,
    /// Active requirement clauses.
    requirements: Vec<&'a Clause>,
    /// Active guarantee clauses.
    guarantees: Vec<&'a Clause>,
    /// Active decorator clauses.
    decorators: Vec<&'a Clause>,
}

/// Per-invocation evaluation state.
struct Court<'a> {
    /// The binding under evaluation.
    bound: &'a Bound,
    /// Receiver the clauses are evaluated against.
    receiver: &'a Value,
}

impl<'a> Court<'a> {
    /// Runs the full invocation protocol.
    fn run(&self, args: &[Value]) -> Result<Value, CourtError> {
        let docket = self.docket();
        let shape = self.governing_shape(args);

        self.pre(&docket, args)?;
        let pending = self.decorate(&docket, args);

        match (pending.body)(self.receiver, &pending.args) {
            Err(fault) => Err(self.judge_fault(shape, fault)),
            Ok(result) => {
                self.post(&docket, shape, args, &result)?;
                Ok(result)
            }
        }
    }

    /// Selects the signature governing this call's return and throw checks.
    ///
    /// Declared shapes are tried in declaration order; the implicit
    /// accept-anything shape at index zero is the final fallback, so
    /// contract-wide throw declarations still govern calls no declared shape
    /// fits.
    fn governing_shape(&self, args: &[Value]) -> Option<&'a Signature> {
        self.bound
            .signatures
            .iter()
            .skip(1)
            .chain(self.bound.signatures.first())
            .find(|shape| shape.matches_call(self.receiver, args))
    }

    /// Computes the active clause subset for this invocation.
    fn docket(&self) -> Docket<'a> {
        Docket {
            invariants: self.active(&self.bound.invariants),
            requirements: self.active(&self.bound.requirements),
            guarantees: self.active(&self.bound.guarantees),
            decorators: self.active(&self.bound.decorators),
        }
    }

    /// Filters one clause sequence through the selector.
    fn active(&self, clauses: &'a [Clause]) -> Vec<&'a Clause> {
        clauses
            .iter()
            .filter(|clause| self.bound.selector.admits(self.bound.level, clause))
            .collect()
    }

    /// Pre-phase: invariants, then requirements, against the call arguments.
    fn pre(&self, docket: &Docket<'_>, args: &[Value]) -> Result<(), Breach> {
        for clause in docket.invariants.iter().chain(&docket.requirements) {
            if !clause.test(self.receiver, args) {
                return Err(Breach::clause(Phase::Pre, clause.info()));
            }
        }
        Ok(())
    }

    /// Decoration: each active decorator rewrites the pending call in
    /// declaration order.
    fn decorate(&self, docket: &Docket<'_>, args: &[Value]) -> Decorated {
        let mut pending = Decorated {
            args: args.to_vec(),
            body: Arc::clone(&self.bound.target),
        };
        for clause in &docket.decorators {
            if let Some(rewrite) = clause.rewrite() {
                pending = rewrite(pending);
            }
        }
        pending
    }

    /// Body-phase fault judgement against the matched shape's allow-list.
    fn judge_fault(&self, shape: Option<&Signature>, fault: Fault) -> CourtError {
        let Some(signature) = shape else {
            return CourtError::Fault(fault);
        };
        match signature.safety() {
            None => CourtError::Fault(fault),
            Some(guards) => {
                let image = fault.to_value();
                let covered = guards
                    .iter()
                    .find(|guard| guard.test(self.receiver, std::slice::from_ref(&image)));
                if covered.is_some() {
                    CourtError::Fault(fault)
                } else {
                    CourtError::Breach(Breach::uncovered(fault))
                }
            }
        }
    }

    /// Post-phase: return shape, then guarantees over the arguments plus the
    /// result, then invariants over the receiver alone.
    fn post(
        &self,
        docket: &Docket<'_>,
        shape: Option<&Signature>,
        args: &[Value],
        result: &Value,
    ) -> Result<(), Breach> {
        if let Some(signature) = shape
            && !signature.matches_return(self.receiver, result)
        {
            let detail = signature.description().map_or_else(
                || "return value rejected".to_string(),
                |name| format!("return value rejected by `{name}`"),
            );
            return Err(Breach {
                phase: Phase::Post,
                citation: Citation::Signature {
                    detail,
                },
                fault: None,
            });
        }

        let mut values = args.to_vec();
        values.push(result.clone());
        for clause in &docket.guarantees {
            if !clause.test(self.receiver, &values) {
                return Err(Breach::clause(Phase::Post, clause.info()));
            }
        }
        for clause in &docket.invariants {
            if !clause.test(self.receiver, &[]) {
                return Err(Breach::clause(Phase::Post, clause.info()));
            }
        }
        Ok(())
    }
}
