//! Metric type
//!
//! The two independently tracked numeric dimensions of a balance, plus the
//! fixed-point rounding rule every delta passes through before it reaches
//! the ledger.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places carried by every ledger figure.
pub const LEDGER_SCALE: u32 = 6;

/// Round a raw delta to the ledger scale, half-up.
pub fn round6(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Balance dimension a movement line applies to.
///
/// The derive order (quantity before value) matches the lexicographic order
/// of the wire names, which the engine relies on when sorting impacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Quantity,
    Value,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Quantity => "quantity",
            Metric::Value => "value",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quantity" => Ok(Metric::Quantity),
            "value" => Ok(Metric::Value),
            other => Err(format!("unknown metric: {}", other)),
        }
    }
}
