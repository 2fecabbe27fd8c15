//! Movement records
//!
//! Persistent shapes of the ledger: the immutable movement header, its
//! immutable lines, and the mutable balance projection. Headers and lines
//! are write-once; only `StockBalance` is ever revisited for mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CatalogType, Metric, OriginType, ScopeKey};

/// Movement header. Created once by the engine, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub tenant_id: i64,
    pub catalog_type: CatalogType,
    pub catalog_item_id: i64,
    pub catalog_configuration_id: i64,
    pub scope_group_id: i64,
    pub origin_type: OriginType,
    pub origin_code: Option<String>,
    pub origin_item_code: Option<String>,
    pub note: Option<String>,
    pub moved_at: DateTime<Utc>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// One delta against one scope key and metric, with the balance it observed.
///
/// `position` records the deterministic write order within the movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementLine {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub position: i32,
    pub scope_group_id: i64,
    pub stock_type_id: i64,
    pub branch_id: i64,
    pub metric: Metric,
    pub before_value: Decimal,
    pub delta: Decimal,
    pub after_value: Decimal,
}

/// Current (quantity, value) for one scope key. Materialized fold over the
/// ledger; the ledger stays the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBalance {
    pub key: ScopeKey,
    pub quantity: Decimal,
    pub value: Decimal,
}

impl StockBalance {
    /// Current figure for one metric.
    pub fn current(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Quantity => self.quantity,
            Metric::Value => self.value,
        }
    }

    /// Overwrite one metric with its post-delta figure.
    pub fn set_current(&mut self, metric: Metric, after: Decimal) {
        match metric {
            Metric::Quantity => self.quantity = after,
            Metric::Value => self.value = after,
        }
    }
}
