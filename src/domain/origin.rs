//! Origin type
//!
//! Where a movement came from. New origins get new variants; the stored
//! representation is the snake_case wire name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provenance of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    /// Manual or administrative stock adjustment.
    ManualAdjustment,
    /// Company changed scope group; balances moved between scope keys.
    GroupTransfer,
}

impl OriginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginType::ManualAdjustment => "manual_adjustment",
            OriginType::GroupTransfer => "group_transfer",
        }
    }
}

impl fmt::Display for OriginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OriginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual_adjustment" => Ok(OriginType::ManualAdjustment),
            "group_transfer" => Ok(OriginType::GroupTransfer),
            other => Err(format!("unknown origin type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_round_trip() {
        for origin in [OriginType::ManualAdjustment, OriginType::GroupTransfer] {
            assert_eq!(origin.as_str().parse::<OriginType>().unwrap(), origin);
        }
        assert!("telepathy".parse::<OriginType>().is_err());
    }
}
