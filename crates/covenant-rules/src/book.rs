// crates/covenant-rules/src/book.rs
// ============================================================================
// Module: Rule Book
// Description: Declarative key-to-predicate factory with positional filters.
// Purpose: Turn `key@index` requests plus arguments into validated predicates,
//          with host-registered handlers and kind ancestry.
// Dependencies: crate::{error, predicate, value_match}, regex, serde_json
// ============================================================================

//! ## Overview
//! The rule book maps combinator keys to handlers that build [`Predicate`]
//! values. Construction is eager and total: unknown keys, malformed positional
//! filters, missing arguments, and invalid patterns are all reported while the
//! predicate is being built, never while it runs.
//!
//! A key may carry a positional filter suffix (`typeof@0`), restricting the
//! predicate to a single value position instead of every supplied value. An
//! out-of-range position makes the predicate evaluate false.
//!
//! Hosts extend the book with [`RuleBook::register`] and teach it kind
//! ancestry with [`RuleBook::register_kind`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::RuleError;
use crate::error::RuleResult;
use crate::predicate::Predicate;
use crate::value_match::TypeTag;
use crate::value_match::declared_kind;
use crate::value_match::fields_eq;
use crate::value_match::fields_ne;
use crate::value_match::loose_eq;
use crate::value_match::strict_eq;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum ancestry hops walked during kind membership checks.
const ANCESTRY_HOP_LIMIT: usize = 64;

// ============================================================================
// SECTION: Combinator Keys
// ============================================================================

/// Canonical combinator keys recognized by the default rule book.
pub mod keys {
    /// Metatype tag membership.
    pub const TYPE_OF: &str = "typeof";
    /// Kind/ancestry membership.
    pub const INSTANCE_OF: &str = "instanceof";
    /// Loose value equality.
    pub const EQUALS: &str = "equals";
    /// Loose value inequality.
    pub const NOT_EQUALS: &str = "notequals";
    /// Strict value equality.
    pub const STRICT_EQUALS: &str = "strictequals";
    /// Strict value inequality.
    pub const STRICT_NOT_EQUALS: &str = "strictnotequals";
    /// Pattern match over string values.
    pub const MATCHES: &str = "matches";
    /// Pattern non-match over string values.
    pub const NO_MATCH: &str = "nomatch";
    /// Field-wise object equality.
    pub const STRUCT_EQUALS: &str = "structequals";
    /// Field-wise object inequality.
    pub const STRUCT_NOT_EQUALS: &str = "structnotequals";
    /// Conjunction over sub-predicates.
    pub const ALL_OF: &str = "allof";
    /// Disjunction over sub-predicates.
    pub const ANY_OF: &str = "anyof";
}

// ============================================================================
// SECTION: Rule Arguments
// ============================================================================

/// One argument to a rule handler: a plain value or a sub-predicate.
#[derive(Debug, Clone)]
pub enum RuleArg {
    /// A JSON value argument.
    Value(Value),
    /// A sub-predicate argument, used by composition combinators.
    Predicate(Predicate),
}

impl RuleArg {
    /// Wraps a JSON value as a rule argument.
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Wraps a predicate as a rule argument.
    #[must_use]
    pub const fn predicate(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<Value> for RuleArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Predicate> for RuleArg {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<&str> for RuleArg {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for RuleArg {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<bool> for RuleArg {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<i64> for RuleArg {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for RuleArg {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

// ============================================================================
// SECTION: Rule Book
// ============================================================================

/// Handler building a predicate from rule arguments.
///
/// Handlers receive the book so composition and ancestry-aware combinators can
/// consult its registered state at construction time.
pub type RuleHandler = Arc<dyn Fn(&RuleBook, &[RuleArg]) -> RuleResult<Predicate> + Send + Sync>;

/// Registry of combinator handlers plus kind ancestry.
///
/// # Invariants
/// - Handler lookup is by exact key name, after the positional filter suffix
///   has been stripped.
/// - Ancestry is snapshotted into predicates at construction time; later
///   `register_kind` calls do not retroactively change built predicates.
#[derive(Clone)]
pub struct RuleBook {
    /// Registered combinator handlers keyed by name.
    handlers: BTreeMap<String, RuleHandler>,
    /// Kind ancestry: child kind to parent kind.
    ancestry: BTreeMap<String, String>,
}

impl RuleBook {
    /// Creates a book with the default combinators registered.
    #[must_use]
    pub fn new() -> Self {
        let mut book = Self {
            handlers: BTreeMap::new(),
            ancestry: BTreeMap::new(),
        };
        book.register(keys::TYPE_OF, handlers::type_of);
        book.register(keys::INSTANCE_OF, handlers::instance_of);
        book.register(keys::EQUALS, handlers::equals);
        book.register(keys::NOT_EQUALS, handlers::not_equals);
        book.register(keys::STRICT_EQUALS, handlers::strict_equals);
        book.register(keys::STRICT_NOT_EQUALS, handlers::strict_not_equals);
        book.register(keys::MATCHES, handlers::matches);
        book.register(keys::NO_MATCH, handlers::no_match);
        book.register(keys::STRUCT_EQUALS, handlers::struct_equals);
        book.register(keys::STRUCT_NOT_EQUALS, handlers::struct_not_equals);
        book.register(keys::ALL_OF, handlers::all_of);
        book.register(keys::ANY_OF, handlers::any_of);
        book
    }

    /// Registers a combinator handler, replacing any previous one at the key.
    pub fn register<F>(&mut self, key: impl Into<String>, handler: F)
    where
        F: Fn(&Self, &[RuleArg]) -> RuleResult<Predicate> + Send + Sync + 'static,
    {
        self.handlers.insert(key.into(), Arc::new(handler));
    }

    /// Registers a kind as a child of a parent kind for ancestry membership.
    pub fn register_kind(&mut self, kind: impl Into<String>, parent: impl Into<String>) {
        self.ancestry.insert(kind.into(), parent.into());
    }

    /// Builds a predicate from a combinator key plus arguments.
    ///
    /// The key may carry a `@index` positional filter suffix.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the key is unknown, the filter is malformed,
    /// or the arguments do not fit the combinator. Construction is eager:
    /// a returned predicate never fails at evaluation time.
    pub fn rule(&self, key: &str, args: &[RuleArg]) -> RuleResult<Predicate> {
        let (name, position) = parse_key(key)?;
        let handler =
            self.handlers.get(name).cloned().ok_or_else(|| RuleError::unknown(name))?;
        let base = handler(self, args)?;
        Ok(positioned(base, position))
    }

    /// Tests kind membership against the registered ancestry.
    fn is_kind(&self, value: &Value, kind: &str) -> bool {
        if TypeTag::of(value).name() == kind {
            return true;
        }
        let Some(mut current) = declared_kind(value) else {
            return false;
        };
        for _ in 0 .. ANCESTRY_HOP_LIMIT {
            if current == kind {
                return true;
            }
            match self.ancestry.get(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBook")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("ancestry", &self.ancestry)
            .finish()
    }
}

// ============================================================================
// SECTION: Default Book
// ============================================================================

/// Process-wide default rule book with the builtin combinators.
static DEFAULT_BOOK: LazyLock<RuleBook> = LazyLock::new(RuleBook::new);

/// Builds a predicate from the default rule book.
///
/// # Errors
///
/// Returns [`RuleError`] under the same conditions as [`RuleBook::rule`].
pub fn rule(key: &str, args: &[RuleArg]) -> RuleResult<Predicate> {
    DEFAULT_BOOK.rule(key, args)
}

// ============================================================================
// SECTION: Key Parsing
// ============================================================================

/// Splits a rule key into its combinator name and optional position filter.
fn parse_key(key: &str) -> RuleResult<(&str, Option<usize>)> {
    match key.split_once('@') {
        None => Ok((key, None)),
        Some((name, raw)) => raw
            .parse::<usize>()
            .map(|index| (name, Some(index)))
            .map_err(|_| RuleError::InvalidFilter {
                key: key.to_string(),
                raw: raw.to_string(),
            }),
    }
}

/// Applies a positional filter around a built predicate.
fn positioned(base: Predicate, position: Option<usize>) -> Predicate {
    match position {
        None => base,
        Some(index) => Predicate::new(move |receiver, values| {
            values
                .get(index)
                .is_some_and(|value| base.check(receiver, std::slice::from_ref(value)))
        }),
    }
}

// ============================================================================
// SECTION: Argument Extraction
// ============================================================================

/// Extracts plain value arguments, rejecting predicates and empty lists.
fn value_args(key: &str, args: &[RuleArg]) -> RuleResult<Vec<Value>> {
    if args.is_empty() {
        return Err(RuleError::missing_argument(key));
    }
    args.iter()
        .map(|arg| match arg {
            RuleArg::Value(value) => Ok(value.clone()),
            RuleArg::Predicate(_) => {
                Err(RuleError::invalid_argument(key, "expects value arguments, found a predicate"))
            }
        })
        .collect()
}

/// Extracts string arguments, rejecting every other shape.
fn string_args(key: &str, args: &[RuleArg]) -> RuleResult<Vec<String>> {
    value_args(key, args)?
        .into_iter()
        .map(|value| match value {
            Value::String(text) => Ok(text),
            other => Err(RuleError::invalid_argument(
                key,
                format!("expects string arguments, found {}", TypeTag::of(&other)),
            )),
        })
        .collect()
}

/// Extracts object arguments, rejecting every other shape.
fn object_args(key: &str, args: &[RuleArg]) -> RuleResult<Vec<Value>> {
    let values = value_args(key, args)?;
    for value in &values {
        if !value.is_object() {
            return Err(RuleError::invalid_argument(
                key,
                format!("expects object arguments, found {}", TypeTag::of(value)),
            ));
        }
    }
    Ok(values)
}

/// Extracts sub-predicate arguments, rejecting plain values and empty lists.
fn predicate_args(key: &str, args: &[RuleArg]) -> RuleResult<Vec<Predicate>> {
    if args.is_empty() {
        return Err(RuleError::missing_argument(key));
    }
    args.iter()
        .map(|arg| match arg {
            RuleArg::Predicate(predicate) => Ok(predicate.clone()),
            RuleArg::Value(_) => {
                Err(RuleError::invalid_argument(key, "expects predicate arguments, found a value"))
            }
        })
        .collect()
}

/// Builds a predicate applying a per-value test to every supplied value.
///
/// Vacuously true over an empty value list.
fn each_value<F>(test: F) -> Predicate
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Predicate::new(move |_, values| values.iter().all(&test))
}

// ============================================================================
// SECTION: Builtin Handlers
// ============================================================================

/// Builtin combinator handlers registered by [`RuleBook::new`].
mod handlers {
    use super::Predicate;
    use super::Regex;
    use super::RuleArg;
    use super::RuleBook;
    use super::RuleError;
    use super::RuleResult;
    use super::TypeTag;
    use super::each_value;
    use super::fields_eq;
    use super::fields_ne;
    use super::keys;
    use super::loose_eq;
    use super::object_args;
    use super::predicate_args;
    use super::strict_eq;
    use super::string_args;
    use super::value_args;

    /// Every value's metatype tag must equal every expected tag.
    pub fn type_of(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let tags = string_args(keys::TYPE_OF, args)?
            .into_iter()
            .map(|name| {
                TypeTag::from_name(&name).ok_or_else(|| {
                    RuleError::invalid_argument(keys::TYPE_OF, format!("unknown type tag `{name}`"))
                })
            })
            .collect::<RuleResult<Vec<_>>>()?;
        Ok(each_value(move |value| tags.iter().all(|tag| TypeTag::of(value) == *tag)))
    }

    /// Every value must belong to every expected kind, directly or through
    /// the book's registered ancestry.
    pub fn instance_of(book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let kinds = string_args(keys::INSTANCE_OF, args)?;
        let snapshot = book.clone();
        Ok(each_value(move |value| kinds.iter().all(|kind| snapshot.is_kind(value, kind))))
    }

    /// Every value must loosely equal every expected value.
    pub fn equals(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let expected = value_args(keys::EQUALS, args)?;
        Ok(each_value(move |value| expected.iter().all(|e| loose_eq(value, e))))
    }

    /// Every value must loosely differ from every expected value.
    pub fn not_equals(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let expected = value_args(keys::NOT_EQUALS, args)?;
        Ok(each_value(move |value| expected.iter().all(|e| !loose_eq(value, e))))
    }

    /// Every value must strictly equal every expected value.
    pub fn strict_equals(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let expected = value_args(keys::STRICT_EQUALS, args)?;
        Ok(each_value(move |value| expected.iter().all(|e| strict_eq(value, e))))
    }

    /// Every value must strictly differ from every expected value.
    pub fn strict_not_equals(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let expected = value_args(keys::STRICT_NOT_EQUALS, args)?;
        Ok(each_value(move |value| expected.iter().all(|e| !strict_eq(value, e))))
    }

    /// Every value must be a string matching every pattern.
    pub fn matches(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let patterns = compile_patterns(keys::MATCHES, args)?;
        Ok(each_value(move |value| {
            value.as_str().is_some_and(|text| patterns.iter().all(|re| re.is_match(text)))
        }))
    }

    /// Every value must be a string matching none of the patterns.
    pub fn no_match(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let patterns = compile_patterns(keys::NO_MATCH, args)?;
        Ok(each_value(move |value| {
            value.as_str().is_some_and(|text| patterns.iter().all(|re| !re.is_match(text)))
        }))
    }

    /// Every value must field-wise equal every expected object.
    pub fn struct_equals(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let expected = object_args(keys::STRUCT_EQUALS, args)?;
        Ok(each_value(move |value| expected.iter().all(|e| fields_eq(value, e))))
    }

    /// Every value must field-wise differ from every expected object.
    pub fn struct_not_equals(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let expected = object_args(keys::STRUCT_NOT_EQUALS, args)?;
        Ok(each_value(move |value| expected.iter().all(|e| fields_ne(value, e))))
    }

    /// Conjunction over sub-predicates applied to the same filtered values.
    pub fn all_of(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let parts = predicate_args(keys::ALL_OF, args)?;
        Ok(Predicate::all_of(parts))
    }

    /// Disjunction over sub-predicates applied to the same filtered values.
    pub fn any_of(_book: &RuleBook, args: &[RuleArg]) -> RuleResult<Predicate> {
        let parts = predicate_args(keys::ANY_OF, args)?;
        Ok(Predicate::any_of(parts))
    }

    /// Compiles pattern arguments eagerly.
    fn compile_patterns(key: &str, args: &[RuleArg]) -> RuleResult<Vec<Regex>> {
        string_args(key, args)?
            .into_iter()
            .map(|pattern| {
                Regex::new(&pattern).map_err(|err| RuleError::InvalidPattern {
                    pattern,
                    detail: err.to_string(),
                })
            })
            .collect()
    }
}
