// crates/covenant-core/src/core/clause.rs
// ============================================================================
// Module: Clauses
// Description: Enforceable conditions with severity, kind, and drafts.
// Purpose: Define `Clause`, its serializable snapshot, and the structured
//          drafts through which clauses are authored and validated.
// Dependencies: crate::core::level, crate::error, covenant-rules, serde
// ============================================================================

//! ## Overview
//! A clause is one enforceable condition: a kind, a severity level, a payload
//! (a predicate for checking kinds, a rewrite function for decorators), and an
//! optional description surfaced in breach messages.
//!
//! Clauses are authored through structured drafts. A draft without its payload
//! is invalid and rejected when attached, never skipped at run time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use covenant_rules::Predicate;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::level::Level;
use crate::error::ContractError;
use crate::error::Fault;

// ============================================================================
// SECTION: Target and Decoration Types
// ============================================================================

/// A governed callable: receives the receiver and call arguments, produces a
/// value or a fault.
pub type TargetFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, Fault> + Send + Sync>;

/// A pending call flowing through decorator clauses: the current arguments
/// and the body about to execute.
#[derive(Clone)]
pub struct Decorated {
    /// Arguments the body will receive.
    pub args: Vec<Value>,
    /// Body that will execute.
    pub body: TargetFn,
}

impl fmt::Debug for Decorated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorated").field("args", &self.args).finish_non_exhaustive()
    }
}

/// Rewrite function carried by a decorator clause: receives the pending call
/// and returns the next one.
pub type DecoratorFn = Arc<dyn Fn(Decorated) -> Decorated + Send + Sync>;

// ============================================================================
// SECTION: Clause Kinds
// ============================================================================

/// Category of an enforceable clause.
///
/// # Invariants
/// - Variants are stable for serialization and breach reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    /// Precondition checked before the body runs.
    Requirement,
    /// Postcondition checked after the body runs.
    Guarantee,
    /// Condition checked both before and after the body.
    Invariant,
    /// Pre-execution transform of the pending call.
    Decorator,
    /// Allow-list entry over a captured body fault.
    ThrowGuard,
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requirement => "requirement",
            Self::Guarantee => "guarantee",
            Self::Invariant => "invariant",
            Self::Decorator => "decorator",
            Self::ThrowGuard => "throw guard",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SECTION: Clause
// ============================================================================

/// Payload of a clause: a check or a call rewrite.
#[derive(Clone)]
pub(crate) enum ClauseAction {
    /// Predicate evaluated against the invocation.
    Test(Predicate),
    /// Rewrite applied to the pending call.
    Rewrite(DecoratorFn),
}

impl fmt::Debug for ClauseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test(predicate) => f.debug_tuple("Test").field(predicate).finish(),
            Self::Rewrite(_) => f.debug_tuple("Rewrite").finish_non_exhaustive(),
        }
    }
}

/// One enforceable condition.
///
/// # Invariants
/// - A clause always carries its payload; payload-less drafts are rejected
///   at attachment time.
#[derive(Debug, Clone)]
pub struct Clause {
    /// Category of the clause.
    kind: ClauseKind,
    /// Severity level consulted by the selector.
    level: Level,
    /// Payload evaluated or applied during invocation.
    action: ClauseAction,
    /// Human-readable explanation, used in breach messages.
    description: Option<String>,
}

impl Clause {
    /// Assembles a validated clause.
    pub(crate) const fn assemble(
        kind: ClauseKind,
        level: Level,
        action: ClauseAction,
        description: Option<String>,
    ) -> Self {
        Self {
            kind,
            level,
            action,
            description,
        }
    }

    /// Returns the clause kind.
    #[must_use]
    pub const fn kind(&self) -> ClauseKind {
        self.kind
    }

    /// Returns the clause severity level.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Returns the clause description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns a serializable snapshot for breach reporting.
    #[must_use]
    pub fn info(&self) -> ClauseInfo {
        ClauseInfo {
            kind: self.kind,
            level: self.level,
            description: self.description.clone(),
        }
    }

    /// Evaluates the clause predicate against an invocation.
    ///
    /// Decorator clauses carry no predicate and trivially pass.
    #[must_use]
    pub(crate) fn test(&self, receiver: &Value, values: &[Value]) -> bool {
        match &self.action {
            ClauseAction::Test(predicate) => predicate.check(receiver, values),
            ClauseAction::Rewrite(_) => true,
        }
    }

    /// Returns the rewrite payload of a decorator clause.
    pub(crate) fn rewrite(&self) -> Option<&DecoratorFn> {
        match &self.action {
            ClauseAction::Rewrite(rewrite) => Some(rewrite),
            ClauseAction::Test(_) => None,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}@{}]", self.kind, self.level)?;
        if let Some(description) = &self.description {
            write!(f, " {description}")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Clause Snapshot
// ============================================================================

/// Serializable snapshot of a clause, carried inside breaches.
///
/// # Invariants
/// - Mirrors the clause metadata at the time the breach was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseInfo {
    /// Category of the cited clause.
    pub kind: ClauseKind,
    /// Severity level of the cited clause.
    pub level: Level,
    /// Description of the cited clause, if any.
    pub description: Option<String>,
}

impl fmt::Display for ClauseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} clause at {} level", self.kind, self.level)?;
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Clause Drafts
// ============================================================================

/// Structured draft for a checking clause: predicate, level, description.
///
/// # Invariants
/// - The predicate is optional on the draft and mandatory on the clause; the
///   gap is closed by validation at attachment time.
#[derive(Debug, Clone, Default)]
pub struct ClauseDraft {
    /// Condition the clause will enforce.
    predicate: Option<Predicate>,
    /// Severity override; defaults to [`Level::Development`].
    level: Option<Level>,
    /// Human-readable explanation.
    description: Option<String>,
}

impl ClauseDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the condition the clause will enforce.
    #[must_use]
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Overrides the clause severity level.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the human-readable explanation.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the draft into a clause of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MissingPredicate`] when no predicate was set.
    pub(crate) fn build(self, kind: ClauseKind) -> Result<Clause, ContractError> {
        let predicate = self.predicate.ok_or(ContractError::MissingPredicate {
            kind,
        })?;
        Ok(Clause::assemble(
            kind,
            self.level.unwrap_or_default(),
            ClauseAction::Test(predicate),
            self.description,
        ))
    }
}

impl From<Predicate> for ClauseDraft {
    /// A bare predicate drafts a clause with default level and no description.
    fn from(predicate: Predicate) -> Self {
        Self::new().predicate(predicate)
    }
}

/// Structured draft for a decorator clause: rewrite, level, description.
#[derive(Clone, Default)]
pub struct DecoratorDraft {
    /// Rewrite the clause will apply to pending calls.
    rewrite: Option<DecoratorFn>,
    /// Severity override; defaults to [`Level::Development`].
    level: Option<Level>,
    /// Human-readable explanation.
    description: Option<String>,
}

impl fmt::Debug for DecoratorDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorDraft")
            .field("level", &self.level)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl DecoratorDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rewrite applied to pending calls.
    #[must_use]
    pub fn rewrite<F>(mut self, rewrite: F) -> Self
    where
        F: Fn(Decorated) -> Decorated + Send + Sync + 'static,
    {
        self.rewrite = Some(Arc::new(rewrite));
        self
    }

    /// Overrides the clause severity level.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the human-readable explanation.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the draft into a decorator clause.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MissingRewrite`] when no rewrite was set.
    pub(crate) fn build(self) -> Result<Clause, ContractError> {
        let rewrite = self.rewrite.ok_or(ContractError::MissingRewrite)?;
        Ok(Clause::assemble(
            ClauseKind::Decorator,
            self.level.unwrap_or_default(),
            ClauseAction::Rewrite(rewrite),
            self.description,
        ))
    }
}
