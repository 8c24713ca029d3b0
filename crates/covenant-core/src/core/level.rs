// crates/covenant-core/src/core/level.rs
// ============================================================================
// Module: Enforcement Levels
// Description: Ordinal severity levels for clauses and contracts.
// Purpose: Provide a totally ordered, serializable enforcement scale with
//          stable raw conversions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every clause carries a level and every contract carries a threshold on the
//! same scale. The default selector admits a clause when its level reaches the
//! contract threshold, so `Debug` clauses are the cheapest to shed and
//! `Production` clauses survive every threshold.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Level Definition
// ============================================================================

/// Ordinal enforcement severity.
///
/// # Invariants
/// - Ordering follows the rank: `Debug < Development < Testing < Production`.
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Level {
    /// Diagnostic-only clauses, shed first.
    Debug = 1,
    /// Default severity for authored clauses.
    Development = 2,
    /// Clauses enforced under test thresholds.
    Testing = 3,
    /// Clauses enforced under every threshold.
    Production = 4,
}

impl Level {
    /// Returns the numeric rank of this level (1-based).
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Creates a level from its numeric rank (returns `None` out of range).
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Debug),
            2 => Some(Self::Development),
            3 => Some(Self::Testing),
            4 => Some(Self::Production),
            _ => None,
        }
    }

    /// Returns the canonical name for this level.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }
}

impl Default for Level {
    /// Authored clauses and fresh contracts default to `Development`.
    fn default() -> Self {
        Self::Development
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
