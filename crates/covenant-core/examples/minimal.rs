// crates/covenant-core/examples/minimal.rs
// ============================================================================
// Module: Covenant Minimal Example
// Description: Minimal end-to-end contract over a ledger withdrawal.
// Purpose: Demonstrate clause declaration, binding, enforcement, and unbind.
// Dependencies: covenant-core, covenant-rules
// ============================================================================

//! ## Overview
//! Declares a contract over a withdrawal function: the amount must be
//! numeric, the remaining balance stays numeric, and overdraft faults are
//! expected. Demonstrates a clean call, a breach, an allowed fault, and the
//! unbind round trip.

use std::error::Error;
use std::fmt;

use covenant_core::ClauseDraft;
use covenant_core::Contract;
use covenant_core::Fault;
use covenant_rules::rule;
use serde_json::Value;
use serde_json::json;

/// Error type for example preconditions.
#[derive(Debug)]
struct ExampleError(&'static str);

impl fmt::Display for ExampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for ExampleError {}

fn main() -> Result<(), Box<dyn Error>> {
    let mut contract = Contract::over(|receiver, args| {
        let balance = receiver.get("balance").and_then(Value::as_i64).unwrap_or(0);
        let amount = args.first().and_then(Value::as_i64).unwrap_or(0);
        if amount > balance {
            return Err(Fault::new("overdraft", "insufficient funds"));
        }
        Ok(json!(balance - amount))
    });

    contract
        .require(
            ClauseDraft::from(rule("typeof@0", &["number".into()])?)
                .describe("withdrawal amount must be numeric"),
        )?
        .guarantee(
            ClauseDraft::from(rule("typeof", &["number".into()])?)
                .describe("amounts and balances stay numeric"),
        )?
        .throws(
            ClauseDraft::from(rule("instanceof", &["overdraft".into()])?)
                .describe("overdraft faults are expected"),
        )?;

    let bound = contract.bind()?;
    let account = json!({"balance": 100});

    let remaining = bound.call(&account, &[json!(40)])?;
    if remaining != json!(60) {
        return Err(Box::new(ExampleError("expected a remaining balance of 60")));
    }

    let breach = bound.call(&account, &[json!("forty")]);
    if breach.as_ref().err().and_then(|err| err.breach()).is_none() {
        return Err(Box::new(ExampleError("expected a breach for a non-numeric amount")));
    }

    let overdraft = bound.call(&account, &[json!(500)]);
    match overdraft {
        Err(err) if err.breach().is_none() => {}
        _ => return Err(Box::new(ExampleError("expected the overdraft fault to propagate"))),
    }

    let original = contract.unbind()?;
    let unchecked = original(&account, &[json!(40)])?;
    let _ = (remaining, unchecked);
    Ok(())
}
