//! Scope key
//!
//! The composite key identifying one balance row. A command header fixes the
//! catalog half of the key; each impact contributes the scope group, stock
//! type and branch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of catalog item a movement is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogType {
    Product,
    Service,
}

impl CatalogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogType::Product => "product",
            CatalogType::Service => "service",
        }
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(CatalogType::Product),
            "service" => Ok(CatalogType::Service),
            other => Err(format!("unknown catalog type: {}", other)),
        }
    }
}

/// Composite key of one stock balance row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub tenant_id: i64,
    pub catalog_type: CatalogType,
    pub catalog_item_id: i64,
    pub catalog_configuration_id: i64,
    pub scope_group_id: i64,
    pub stock_type_id: i64,
    pub branch_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(branch_id: i64) -> ScopeKey {
        ScopeKey {
            tenant_id: 1,
            catalog_type: CatalogType::Product,
            catalog_item_id: 42,
            catalog_configuration_id: 5,
            scope_group_id: 100,
            stock_type_id: 10,
            branch_id,
        }
    }

    #[test]
    fn test_scope_key_equality_is_field_wise() {
        assert_eq!(key(7), key(7));
        assert_ne!(key(7), key(8));
    }

    #[test]
    fn test_catalog_type_round_trip() {
        assert_eq!("product".parse::<CatalogType>().unwrap(), CatalogType::Product);
        assert_eq!("service".parse::<CatalogType>().unwrap(), CatalogType::Service);
        assert!("bundle".parse::<CatalogType>().is_err());
    }
}
