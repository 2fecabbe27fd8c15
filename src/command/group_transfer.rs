//! Group transfer workflow
//!
//! When a company changes scope group, every balance it holds must move from
//! the old scope key to the new one. This module turns a transfer request
//! into one movement command per catalog item, each with paired impacts
//! (negative at the source scope, positive at the target) and an idempotency
//! key derived from the transfer itself, so re-running the same transfer
//! replays as no-ops.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{CatalogType, Metric, OriginType};

use super::raw::MovementRequest;

/// One balance position to carry over for a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTransferPosition {
    pub metric: Metric,
    pub stock_type_id: i64,
    pub branch_id: i64,
    /// Amount held at the source scope; moved in full.
    pub amount: Decimal,
}

/// One catalog item affected by the transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTransferItem {
    pub catalog_type: CatalogType,
    pub catalog_item_id: i64,
    pub catalog_configuration_id: i64,
    pub positions: Vec<GroupTransferPosition>,
}

/// A scope-group change and the positions it affects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTransfer {
    pub source_scope_group_id: i64,
    pub target_scope_group_id: i64,
    /// External token identifying this transfer run; part of the derived
    /// idempotency key.
    pub correlation_token: String,
    pub items: Vec<GroupTransferItem>,
}

impl GroupTransfer {
    /// Build one movement command per catalog item.
    pub fn plan(&self, tenant_id: i64) -> Vec<MovementRequest> {
        self.items
            .iter()
            .map(|item| self.plan_item(tenant_id, item))
            .collect()
    }

    fn plan_item(&self, tenant_id: i64, item: &GroupTransferItem) -> MovementRequest {
        let key = derive_idempotency_key(
            item.catalog_item_id,
            self.source_scope_group_id,
            self.target_scope_group_id,
            &self.correlation_token,
        );

        let mut request = MovementRequest::new(
            tenant_id,
            item.catalog_type,
            item.catalog_item_id,
            item.catalog_configuration_id,
            self.target_scope_group_id,
            OriginType::GroupTransfer,
            key,
        )
        .with_origin_code(self.correlation_token.clone());

        for position in &item.positions {
            request = request
                .with_impact(
                    self.source_scope_group_id,
                    position.metric,
                    position.stock_type_id,
                    position.branch_id,
                    -position.amount,
                )
                .with_impact(
                    self.target_scope_group_id,
                    position.metric,
                    position.stock_type_id,
                    position.branch_id,
                    position.amount,
                );
        }

        request
    }
}

/// Deterministic idempotency key for one item of one transfer run.
pub fn derive_idempotency_key(
    catalog_item_id: i64,
    source_scope_group_id: i64,
    target_scope_group_id: i64,
    correlation_token: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "group-transfer:{}:{}:{}:{}",
            catalog_item_id, source_scope_group_id, target_scope_group_id, correlation_token
        )
        .as_bytes(),
    );
    hex::encode(hasher.finalize())
}
