//! Raw command contract
//!
//! What callers submit to the engine, before normalization. Field values are
//! taken as-is here; all trimming, truncation and validation happens in the
//! normalizer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CatalogType, Metric, OriginType};

/// One requested delta against one scope key and metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRequest {
    pub scope_group_id: i64,
    pub metric: Metric,
    pub stock_type_id: i64,
    pub branch_id: i64,
    pub delta: Decimal,
}

/// Command to record one movement against a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRequest {
    pub tenant_id: i64,
    pub catalog_type: CatalogType,
    pub catalog_item_id: i64,
    pub catalog_configuration_id: i64,
    pub scope_group_id: i64,
    pub origin_type: OriginType,
    #[serde(default)]
    pub origin_code: Option<String>,
    #[serde(default)]
    pub origin_item_code: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub idempotency_key: String,
    /// Caller-supplied movement timestamp; defaults to "now" when absent.
    #[serde(default)]
    pub moved_at: Option<DateTime<Utc>>,
    pub impacts: Vec<ImpactRequest>,
}

impl MovementRequest {
    pub fn new(
        tenant_id: i64,
        catalog_type: CatalogType,
        catalog_item_id: i64,
        catalog_configuration_id: i64,
        scope_group_id: i64,
        origin_type: OriginType,
        idempotency_key: String,
    ) -> Self {
        Self {
            tenant_id,
            catalog_type,
            catalog_item_id,
            catalog_configuration_id,
            scope_group_id,
            origin_type,
            origin_code: None,
            origin_item_code: None,
            note: None,
            idempotency_key,
            moved_at: None,
            impacts: Vec::new(),
        }
    }

    pub fn with_origin_code(mut self, origin_code: String) -> Self {
        self.origin_code = Some(origin_code);
        self
    }

    pub fn with_origin_item_code(mut self, origin_item_code: String) -> Self {
        self.origin_item_code = Some(origin_item_code);
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }

    pub fn with_moved_at(mut self, moved_at: DateTime<Utc>) -> Self {
        self.moved_at = Some(moved_at);
        self
    }

    pub fn with_impact(
        mut self,
        scope_group_id: i64,
        metric: Metric,
        stock_type_id: i64,
        branch_id: i64,
        delta: Decimal,
    ) -> Self {
        self.impacts.push(ImpactRequest {
            scope_group_id,
            metric,
            stock_type_id,
            branch_id,
            delta,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_builder() {
        let request = MovementRequest::new(
            1,
            CatalogType::Product,
            42,
            5,
            100,
            OriginType::ManualAdjustment,
            "adjust-1".to_string(),
        )
        .with_note("Stocktake correction".to_string())
        .with_impact(100, Metric::Quantity, 10, 7, dec!(2.5));

        assert_eq!(request.note.as_deref(), Some("Stocktake correction"));
        assert_eq!(request.impacts.len(), 1);
        assert_eq!(request.impacts[0].delta, dec!(2.5));
    }
}
