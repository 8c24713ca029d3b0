// crates/covenant-rules/src/value_match.rs
// ============================================================================
// Module: Value Matching Primitives
// Description: Metatype tagging and equality semantics over JSON values.
// Purpose: Give combinators one shared vocabulary for type tags, loose and
//          strict equality, and field-wise structural comparison.
// Dependencies: bigdecimal, serde, serde_json
// ============================================================================

//! ## Overview
//! Combinators examine dynamic values. This module defines how those values
//! are classified and compared: metatype tags partition the JSON value space,
//! loose equality is decimal-aware across integer and float representations,
//! strict equality preserves the exact number representation, and the
//! field-wise comparisons ignore identity entirely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

// ============================================================================
// SECTION: Metatype Tags
// ============================================================================

/// Field carrying a value's declared kind for ancestry membership checks.
pub const KIND_FIELD: &str = "$type";

/// Metatype tag partitioning the JSON value space.
///
/// # Invariants
/// - Variants are stable for serialization and rule-key matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// The null value.
    Null,
    /// A boolean value.
    Boolean,
    /// Any numeric value, integer or float.
    Number,
    /// A string value.
    String,
    /// An array value.
    Array,
    /// An object value.
    Object,
}

impl TypeTag {
    /// Classifies a value into its metatype tag.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Parses a tag from its canonical name, returning `None` when unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// Returns the canonical name for this tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the declared kind marker of a value, if it carries one.
///
/// Objects may declare a kind through their [`KIND_FIELD`] entry; every other
/// shape is classified by metatype tag alone.
#[must_use]
pub fn declared_kind(value: &Value) -> Option<&str> {
    value.get(KIND_FIELD).and_then(Value::as_str)
}

// ============================================================================
// SECTION: Equality Semantics
// ============================================================================

/// Compares two values loosely: numbers are compared decimal-aware across
/// integer and float representations, containers recurse element-wise, and
/// every other shape compares structurally.
#[must_use]
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left_num), Value::Number(right_num)) => number_eq(left_num, right_num),
        (Value::Array(left_items), Value::Array(right_items)) => {
            left_items.len() == right_items.len()
                && left_items.iter().zip(right_items).all(|(l, r)| loose_eq(l, r))
        }
        (Value::Object(left_map), Value::Object(right_map)) => {
            left_map.len() == right_map.len()
                && left_map
                    .iter()
                    .all(|(key, l)| right_map.get(key).is_some_and(|r| loose_eq(l, r)))
        }
        _ => left == right,
    }
}

/// Compares two values strictly, preserving the exact number representation:
/// an integer and a float never compare strictly equal even when they denote
/// the same quantity.
#[must_use]
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    left == right
}

/// Compares two numbers by parsing them into decimal form.
///
/// Falls back to representation equality when either number cannot be
/// rendered as a decimal (non-finite floats).
#[must_use]
pub fn number_eq(left: &Number, right: &Number) -> bool {
    match (decimal_from_number(left), decimal_from_number(right)) {
        (Some(left_dec), Some(right_dec)) => left_dec == right_dec,
        _ => left == right,
    }
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

// ============================================================================
// SECTION: Field-Wise Comparison
// ============================================================================

/// Compares an object field-wise against an expected object, ignoring
/// identity: every field of `value` must be present in `expected` and
/// loosely equal to it. Non-object values never match.
#[must_use]
pub fn fields_eq(value: &Value, expected: &Value) -> bool {
    let (Value::Object(fields), Value::Object(expected_fields)) = (value, expected) else {
        return false;
    };
    fields.iter().all(|(key, item)| expected_fields.get(key).is_some_and(|e| loose_eq(item, e)))
}

/// Field-wise inverse comparison: every field of `value` must be absent from
/// `expected` or loosely unequal to its counterpart. This is a per-field
/// negation, not a blanket negation of [`fields_eq`]. Non-object values never
/// match.
#[must_use]
pub fn fields_ne(value: &Value, expected: &Value) -> bool {
    let (Value::Object(fields), Value::Object(expected_fields)) = (value, expected) else {
        return false;
    };
    fields.iter().all(|(key, item)| expected_fields.get(key).is_none_or(|e| !loose_eq(item, e)))
}
