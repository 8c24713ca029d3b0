// crates/covenant-core/tests/court.rs
// ============================================================================
// Module: Court Protocol Tests
// Description: Tests for the per-invocation state machine.
// Purpose: Validate phase ordering, decoration, fault judgement, and the
//          unbind round trip.
// Dependencies: covenant-core, covenant-rules, serde_json
// ============================================================================

//! ## Overview
//! Validates the invocation protocol end to end: pre-check short-circuit,
//! post-checks after body effects, decorator rewrites, the fault allow-list,
//! and restoration of the original target on unbind.

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

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use covenant_core::Bound;
use covenant_core::Breach;
use covenant_core::ClauseDraft;
use covenant_core::Contract;
use covenant_core::CourtError;
use covenant_core::DecoratorDraft;
use covenant_core::Fault;
use covenant_core::Phase;
use covenant_rules::Predicate;
use covenant_rules::rule;
use serde_json::Value;
use serde_json::json;
use support::TestResult;
use support::ensure;

/// Builds a contract whose body counts its executions and echoes arg zero.
fn counting_contract(counter: &Arc<AtomicUsize>) -> Contract {
    let hits = Arc::clone(counter);
    Contract::over(move |_, args| {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(args.first().cloned().unwrap_or(Value::Null))
    })
}

// ============================================================================
// SECTION: Phase Ordering
// ============================================================================

/// Tests a failing requirement short-circuiting before the body.
#[test]
fn test_failing_requirement_never_runs_body() -> TestResult {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut contract = counting_contract(&counter);
    contract.require(ClauseDraft::from(Predicate::never()).describe("always rejects"))?;
    let bound = contract.bind()?;

    let err = match bound.call(&Value::Null, &[json!(1)]) {
        Err(err) => err,
        Ok(_) => return Err("expected a pre-phase breach".into()),
    };
    ensure(
        matches!(
            err,
            CourtError::Breach(Breach {
                phase: Phase::Pre,
                ..
            })
        ),
        "Expected the breach to cite the pre phase",
    )?;
    ensure(
        counter.load(Ordering::SeqCst) == 0,
        "Expected the body to never execute after a failed requirement",
    )?;
    Ok(())
}

/// Tests a failing guarantee firing only after the body's side effects.
#[test]
fn test_failing_guarantee_runs_after_body() -> TestResult {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut contract = counting_contract(&counter);
    contract.guarantee(ClauseDraft::from(Predicate::never()).describe("always rejects"))?;
    let bound = contract.bind()?;

    let err = match bound.call(&Value::Null, &[json!(1)]) {
        Err(err) => err,
        Ok(_) => return Err("expected a post-phase breach".into()),
    };
    ensure(
        matches!(
            err,
            CourtError::Breach(Breach {
                phase: Phase::Post,
                ..
            })
        ),
        "Expected the breach to cite the post phase",
    )?;
    ensure(
        counter.load(Ordering::SeqCst) == 1,
        "Expected the body's side effects to have occurred before the guarantee",
    )?;
    Ok(())
}

/// Tests invariants seeing the call arguments pre and nothing post.
#[test]
fn test_invariant_value_shapes_across_phases() -> TestResult {
    // Rejects whenever values are present: must fail in the pre phase.
    let mut pre_contract = Contract::over(|_, _| Ok(json!(true)));
    pre_contract.invariant(Predicate::new(|_, values| values.is_empty()))?;
    let bound = pre_contract.bind()?;
    let err = bound.call(&Value::Null, &[json!(1)]);
    ensure(
        matches!(
            err,
            Err(CourtError::Breach(Breach {
                phase: Phase::Pre,
                ..
            }))
        ),
        "Expected the argument-rejecting invariant to fail pre",
    )?;

    // Rejects whenever values are absent: passes pre, fails post.
    let counter = Arc::new(AtomicUsize::new(0));
    let mut post_contract = counting_contract(&counter);
    post_contract.invariant(Predicate::new(|_, values| !values.is_empty()))?;
    let bound = post_contract.bind()?;
    let err = bound.call(&Value::Null, &[json!(1)]);
    ensure(
        matches!(
            err,
            Err(CourtError::Breach(Breach {
                phase: Phase::Post,
                ..
            }))
        ),
        "Expected the emptiness-rejecting invariant to fail post",
    )?;
    ensure(
        counter.load(Ordering::SeqCst) == 1,
        "Expected the body to have run before the post invariant",
    )?;
    Ok(())
}

/// Tests guarantees observing the arguments plus the produced result.
#[test]
fn test_guarantee_sees_arguments_and_result() -> TestResult {
    let mut contract = Contract::over(|_, args| {
        let doubled = args.first().and_then(Value::as_i64).unwrap_or(0) * 2;
        Ok(json!(doubled))
    });
    contract.guarantee(
        ClauseDraft::from(Predicate::new(|_, values| {
            let arg = values.first().and_then(Value::as_i64).unwrap_or(0);
            let result = values.last().and_then(Value::as_i64).unwrap_or(0);
            result == arg * 2
        }))
        .describe("result is double the argument"),
    )?;
    let bound = contract.bind()?;
    ensure(
        bound.call(&Value::Null, &[json!(21)])? == json!(42),
        "Expected the doubling guarantee to hold",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Decoration
// ============================================================================

/// Tests decorators rewriting arguments in declaration order.
#[test]
fn test_decorators_rewrite_arguments() -> TestResult {
    let mut contract = Contract::over(|_, args| Ok(args.first().cloned().unwrap_or(Value::Null)));
    contract
        .decorate(DecoratorDraft::new().describe("add one").rewrite(|mut pending| {
            let n = pending.args.first().and_then(Value::as_i64).unwrap_or(0);
            pending.args = vec![json!(n + 1)];
            pending
        }))?
        .decorate(DecoratorDraft::new().describe("double").rewrite(|mut pending| {
            let n = pending.args.first().and_then(Value::as_i64).unwrap_or(0);
            pending.args = vec![json!(n * 2)];
            pending
        }))?;
    let bound = contract.bind()?;
    ensure(
        bound.call(&Value::Null, &[json!(3)])? == json!(8),
        "Expected add-one then double to produce eight",
    )?;
    Ok(())
}

/// Tests a decorator substituting the body.
#[test]
fn test_decorator_substitutes_body() -> TestResult {
    let mut contract = Contract::over(|_, _| Ok(json!("original")));
    contract.decorate(DecoratorDraft::new().describe("replace body").rewrite(|mut pending| {
        pending.body = Arc::new(|_, _| Ok(json!("replaced")));
        pending
    }))?;
    let bound = contract.bind()?;
    ensure(
        bound.call(&Value::Null, &[])? == json!("replaced"),
        "Expected the substituted body to execute",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Fault Judgement
// ============================================================================

/// Tests an explicit no-throw declaration turning any fault into a breach.
#[test]
fn test_nothrow_turns_fault_into_breach() -> TestResult {
    let mut contract = Contract::over(|_, _| Err(Fault::new("io", "disk offline")));
    contract.nothrow()?;
    let bound = contract.bind()?;

    let err = match bound.call(&Value::Null, &[]) {
        Err(err) => err,
        Ok(_) => return Err("expected a body-phase breach".into()),
    };
    let breach = err.breach().ok_or("expected a breach, not a bare fault")?;
    ensure(breach.phase == Phase::Body, "Expected the breach to cite the body phase")?;
    ensure(
        breach.fault.as_ref().is_some_and(|fault| fault.kind == "io"),
        "Expected the original fault to be chained inside the breach",
    )?;
    Ok(())
}

/// Tests a matching throw guard letting the fault propagate unchanged.
#[test]
fn test_allowed_fault_propagates_unchanged() -> TestResult {
    let mut contract = Contract::over(|_, _| {
        Err(Fault::new("io", "disk offline").with_data(json!({"retries": 3})))
    });
    contract.throws(
        ClauseDraft::from(rule("instanceof", &["io".into()])?).describe("io faults are expected"),
    )?;
    let bound = contract.bind()?;

    let err = match bound.call(&Value::Null, &[]) {
        Err(err) => err,
        Ok(_) => return Err("expected the fault to surface".into()),
    };
    ensure(err.breach().is_none(), "Expected no breach for an allowed fault")?;
    let fault = err.fault().ok_or("expected the original fault")?;
    ensure(fault.kind == "io", "Expected the fault kind to survive")?;
    ensure(
        fault.data == Some(json!({"retries": 3})),
        "Expected the fault payload to survive unchanged",
    )?;
    Ok(())
}

/// Tests an uncovered fault breaching while covered kinds pass.
#[test]
fn test_uncovered_fault_breaches() -> TestResult {
    let mut contract = Contract::over(|_, _| Err(Fault::new("net", "connection reset")));
    contract.throws(ClauseDraft::from(rule("instanceof", &["io".into()])?))?;
    let bound = contract.bind()?;

    let err = match bound.call(&Value::Null, &[]) {
        Err(err) => err,
        Ok(_) => return Err("expected a breach".into()),
    };
    let breach = err.breach().ok_or("expected a breach for the uncovered fault")?;
    ensure(breach.phase == Phase::Body, "Expected a body-phase breach")?;
    ensure(
        breach.fault.as_ref().is_some_and(|fault| fault.kind == "net"),
        "Expected the uncovered fault to be chained",
    )?;
    Ok(())
}

/// Tests faults propagating untouched when throw-checking is inactive.
#[test]
fn test_fault_propagates_without_throw_declarations() -> TestResult {
    let mut contract = Contract::over(|_, _| Err(Fault::new("io", "disk offline")));
    let bound = contract.bind()?;

    let err = match bound.call(&Value::Null, &[]) {
        Err(err) => err,
        Ok(_) => return Err("expected the fault to surface".into()),
    };
    ensure(
        err.breach().is_none() && err.fault().is_some_and(|fault| fault.kind == "io"),
        "Expected the fault to propagate unchanged with no throw declarations",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Unbind Round Trip
// ============================================================================

/// Tests the unbound target matching the never-bound original.
#[test]
fn test_unbind_restores_original_behavior() -> TestResult {
    let body = |_: &Value, args: &[Value]| {
        let n = args.first().and_then(Value::as_i64).unwrap_or(0);
        Ok(json!(n * n))
    };

    let mut contract = Contract::over(body);
    contract.require(ClauseDraft::from(Predicate::never()).describe("blocks everything"))?;
    let bound = contract.bind()?;
    ensure(
        bound.call(&Value::Null, &[json!(4)]).is_err(),
        "Expected the bound callable to enforce the blocking requirement",
    )?;

    let restored = contract.unbind()?;
    let direct = body(&Value::Null, &[json!(4)])?;
    ensure(
        restored(&Value::Null, &[json!(4)])? == direct,
        "Expected the unbound target to match the never-bound original",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Re-Entrancy
// ============================================================================

/// Tests a body re-entering its own binding.
#[test]
fn test_reentrant_calls_rerun_the_protocol() -> TestResult {
    let cell: Arc<OnceLock<Bound>> = Arc::new(OnceLock::new());
    let inner = Arc::clone(&cell);

    let mut contract = Contract::over(move |receiver, args| {
        let n = args.first().and_then(Value::as_i64).unwrap_or(0);
        if n <= 0 {
            return Ok(json!(0));
        }
        let bound = inner.get().ok_or_else(|| Fault::new("setup", "binding not installed"))?;
        bound
            .call(receiver, &[json!(n - 1)])
            .map_err(|err| Fault::new("nested", err.to_string()))
    });
    contract.require(rule("typeof@0", &["number".into()])?)?;

    let bound = contract.bind()?;
    let _ = cell.set(bound.clone());

    ensure(
        bound.call(&Value::Null, &[json!(3)])? == json!(0),
        "Expected the recursive descent to reach zero",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Concrete Scenario
// ============================================================================

/// Tests the type-only requirement scenario: typeof rules do not enforce
/// value ranges.
#[test]
fn test_type_only_rules_do_not_enforce_ranges() -> TestResult {
    let mut contract = Contract::over(|_, args| {
        let x = args.first().and_then(Value::as_i64).unwrap_or(0);
        Ok(json!(x - 1))
    });
    contract.require(
        ClauseDraft::from(rule("typeof@0", &["number".into()])?).describe("arg0 must be numeric"),
    )?;
    let bound = contract.bind()?;

    ensure(
        bound.call(&Value::Null, &[json!(5)])? == json!(4),
        "Expected f(5) to return 4 without a breach",
    )?;
    ensure(
        bound.call(&Value::Null, &[json!(-1)])? == json!(-2),
        "Expected the type-only requirement to pass for a negative number",
    )?;
    ensure(
        bound.call(&Value::Null, &[json!("5")]).is_err(),
        "Expected a string argument to breach the type requirement",
    )?;
    Ok(())
}
