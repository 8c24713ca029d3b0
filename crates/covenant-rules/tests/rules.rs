// crates/covenant-rules/tests/rules.rs
// ============================================================================
// Module: Rule Construction Tests
// Description: Tests for the declarative key-to-predicate factory.
// Purpose: Validate eager construction errors and builtin combinator
//          evaluation semantics.
// Dependencies: covenant-rules, serde_json
// ============================================================================

//! ## Overview
//! Validates builtin combinators, positional filters, and the fail-fast
//! construction contract of the rule book.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use covenant_rules::RuleError;
use covenant_rules::rule;
use serde_json::Value;
use serde_json::json;
use support::TestResult;
use support::ensure;

// ============================================================================
// SECTION: Type Tag Combinators
// ============================================================================

/// Tests typeof accepting matching tags.
#[test]
fn test_typeof_accepts_matching_values() -> TestResult {
    let predicate = rule("typeof", &["number".into()])?;
    ensure(
        predicate.check(&Value::Null, &[json!(5), json!(2.5)]),
        "Expected typeof to accept numeric values",
    )?;
    ensure(
        !predicate.check(&Value::Null, &[json!(5), json!("five")]),
        "Expected typeof to reject a mixed value list",
    )?;
    Ok(())
}

/// Tests typeof positional filter restricting the checked position.
#[test]
fn test_typeof_positional_filter() -> TestResult {
    let predicate = rule("typeof@0", &["number".into()])?;
    ensure(
        predicate.check(&Value::Null, &[json!(5), json!("ignored")]),
        "Expected typeof@0 to examine only the first value",
    )?;
    ensure(
        !predicate.check(&Value::Null, &[json!("five"), json!(5)]),
        "Expected typeof@0 to reject a non-number at position zero",
    )?;
    Ok(())
}

/// Tests out-of-range positional filter evaluating false.
#[test]
fn test_positional_filter_out_of_range() -> TestResult {
    let predicate = rule("typeof@5", &["number".into()])?;
    ensure(
        !predicate.check(&Value::Null, &[json!(5)]),
        "Expected an out-of-range position to evaluate false",
    )?;
    Ok(())
}

/// Tests typeof vacuous truth over an empty value list.
#[test]
fn test_typeof_vacuous_over_empty_values() -> TestResult {
    let predicate = rule("typeof", &["string".into()])?;
    ensure(
        predicate.check(&Value::Null, &[]),
        "Expected an unfiltered rule to be vacuously true with no values",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Equality Combinators
// ============================================================================

/// Tests loose equality across integer and float representations.
#[test]
fn test_equals_is_decimal_aware() -> TestResult {
    let predicate = rule("equals", &[json!(1).into()])?;
    ensure(predicate.check(&Value::Null, &[json!(1)]), "Expected 1 to equal 1")?;
    ensure(
        predicate.check(&Value::Null, &[json!(1.0)]),
        "Expected 1.0 to loosely equal 1",
    )?;
    ensure(!predicate.check(&Value::Null, &[json!(2)]), "Expected 2 to differ from 1")?;
    Ok(())
}

/// Tests strict equality preserving the number representation.
#[test]
fn test_strict_equals_distinguishes_representations() -> TestResult {
    let predicate = rule("strictequals", &[json!(1).into()])?;
    ensure(predicate.check(&Value::Null, &[json!(1)]), "Expected 1 to strictly equal 1")?;
    ensure(
        !predicate.check(&Value::Null, &[json!(1.0)]),
        "Expected 1.0 to strictly differ from 1",
    )?;
    Ok(())
}

/// Tests loose inequality.
#[test]
fn test_not_equals() -> TestResult {
    let predicate = rule("notequals", &[json!("closed").into()])?;
    ensure(
        predicate.check(&Value::Null, &[json!("open")]),
        "Expected a differing value to pass notequals",
    )?;
    ensure(
        !predicate.check(&Value::Null, &[json!("closed")]),
        "Expected an equal value to fail notequals",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Pattern Combinators
// ============================================================================

/// Tests pattern matching over string values.
#[test]
fn test_matches_and_no_match() -> TestResult {
    let matches = rule("matches", &["^acct-[0-9]+$".into()])?;
    let no_match = rule("nomatch", &["^acct-".into()])?;

    ensure(
        matches.check(&Value::Null, &[json!("acct-42")]),
        "Expected matching string to pass",
    )?;
    ensure(
        !matches.check(&Value::Null, &[json!("order-42")]),
        "Expected non-matching string to fail",
    )?;
    ensure(
        no_match.check(&Value::Null, &[json!("order-42")]),
        "Expected nomatch to accept a non-matching string",
    )?;
    ensure(
        !no_match.check(&Value::Null, &[json!("acct-42")]),
        "Expected nomatch to reject a matching string",
    )?;
    Ok(())
}

/// Tests pattern combinators rejecting non-string values.
#[test]
fn test_patterns_reject_non_strings() -> TestResult {
    let matches = rule("matches", &[".*".into()])?;
    let no_match = rule("nomatch", &["x".into()])?;
    ensure(
        !matches.check(&Value::Null, &[json!(5)]),
        "Expected matches to reject a non-string",
    )?;
    ensure(
        !no_match.check(&Value::Null, &[json!(5)]),
        "Expected nomatch to reject a non-string",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Field-Wise Combinators
// ============================================================================

/// Tests field-wise object equality ignoring identity.
#[test]
fn test_struct_equals() -> TestResult {
    let predicate = rule("structequals", &[json!({"a": 1, "b": 2}).into()])?;
    ensure(
        predicate.check(&Value::Null, &[json!({"a": 1, "b": 2})]),
        "Expected identical fields to match",
    )?;
    ensure(
        predicate.check(&Value::Null, &[json!({"a": 1})]),
        "Expected a field subset to match field-wise",
    )?;
    ensure(
        !predicate.check(&Value::Null, &[json!({"a": 9})]),
        "Expected a differing field to fail",
    )?;
    ensure(
        !predicate.check(&Value::Null, &[json!(7)]),
        "Expected a non-object to fail field-wise equality",
    )?;
    Ok(())
}

/// Tests per-field negation semantics of structnotequals.
#[test]
fn test_struct_not_equals_is_per_field() -> TestResult {
    let predicate = rule("structnotequals", &[json!({"a": 1, "b": 2}).into()])?;
    ensure(
        predicate.check(&Value::Null, &[json!({"a": 9, "b": 9})]),
        "Expected all-differing fields to pass",
    )?;
    ensure(
        !predicate.check(&Value::Null, &[json!({"a": 1, "b": 9})]),
        "Expected a single shared field value to fail",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Construction Errors
// ============================================================================

/// Tests unknown combinator keys failing eagerly.
#[test]
fn test_unknown_rule_is_construction_error() -> TestResult {
    let result = rule("nonsense", &[json!(1).into()]);
    ensure(
        matches!(result, Err(RuleError::UnknownRule { ref key }) if key == "nonsense"),
        "Expected an unknown key to fail at construction",
    )?;
    Ok(())
}

/// Tests malformed positional filters failing eagerly.
#[test]
fn test_invalid_filter_is_construction_error() -> TestResult {
    let result = rule("equals@first", &[json!(1).into()]);
    ensure(
        matches!(result, Err(RuleError::InvalidFilter { .. })),
        "Expected a non-numeric filter to fail at construction",
    )?;
    Ok(())
}

/// Tests invalid patterns failing eagerly.
#[test]
fn test_invalid_pattern_is_construction_error() -> TestResult {
    let result = rule("matches", &["(".into()]);
    ensure(
        matches!(result, Err(RuleError::InvalidPattern { .. })),
        "Expected an unbalanced pattern to fail at construction",
    )?;
    Ok(())
}

/// Tests empty argument lists failing eagerly.
#[test]
fn test_missing_argument_is_construction_error() -> TestResult {
    let result = rule("equals", &[]);
    ensure(
        matches!(result, Err(RuleError::MissingArgument { .. })),
        "Expected an empty argument list to fail at construction",
    )?;
    Ok(())
}

/// Tests argument shape validation failing eagerly.
#[test]
fn test_invalid_argument_is_construction_error() -> TestResult {
    let result = rule("typeof", &[json!(1).into()]);
    ensure(
        matches!(result, Err(RuleError::InvalidArgument { .. })),
        "Expected a non-string type tag to fail at construction",
    )?;
    let result = rule("typeof", &["quaternion".into()]);
    ensure(
        matches!(result, Err(RuleError::InvalidArgument { .. })),
        "Expected an unknown type tag to fail at construction",
    )?;
    Ok(())
}
