//! Balance store
//!
//! Read and write access to the `stock_balances` projection. Writes happen
//! only inside the engine's transaction, against rows the balance resolver
//! already locked; reads serve the balance views.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{CatalogType, LedgerError, ScopeKey, StockBalance};

/// Filters for the balance views. Absent fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceFilter {
    pub catalog_type: Option<CatalogType>,
    pub catalog_item_id: Option<i64>,
    pub catalog_configuration_id: Option<i64>,
    pub scope_group_id: Option<i64>,
    pub stock_type_id: Option<i64>,
    pub branch_id: Option<i64>,
}

/// Balance summed across branches for one (catalog item, scope group,
/// stock type) combination.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedBalance {
    pub catalog_type: CatalogType,
    pub catalog_item_id: i64,
    pub catalog_configuration_id: i64,
    pub scope_group_id: i64,
    pub stock_type_id: i64,
    pub quantity: Decimal,
    pub value: Decimal,
}

type BalanceRow = (String, i64, i64, i64, i64, i64, Decimal, Decimal);

/// Store for the mutable balance projection.
#[derive(Debug, Clone)]
pub struct BalanceStore {
    pool: PgPool,
}

impl BalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write back one mutated balance. The row was created and locked by the
    /// resolver earlier in the same transaction, so an update that touches
    /// nothing is a fatal inconsistency.
    pub async fn persist(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        balance: &StockBalance,
    ) -> Result<(), LedgerError> {
        let key = &balance.key;
        let rows = sqlx::query(
            r#"
            UPDATE stock_balances
            SET quantity = $8, value = $9, updated_at = NOW()
            WHERE tenant_id = $1
              AND catalog_type = $2
              AND catalog_item_id = $3
              AND catalog_configuration_id = $4
              AND scope_group_id = $5
              AND stock_type_id = $6
              AND branch_id = $7
            "#,
        )
        .bind(key.tenant_id)
        .bind(key.catalog_type.as_str())
        .bind(key.catalog_item_id)
        .bind(key.catalog_configuration_id)
        .bind(key.scope_group_id)
        .bind(key.stock_type_id)
        .bind(key.branch_id)
        .bind(balance.quantity)
        .bind(balance.value)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(LedgerError::Internal(format!(
                "balance row vanished for scope key {:?}",
                key
            )));
        }

        Ok(())
    }

    /// Current balances per scope key.
    pub async fn balances(
        &self,
        tenant_id: i64,
        filter: &BalanceFilter,
    ) -> Result<Vec<StockBalance>, LedgerError> {
        let catalog_type = filter.catalog_type.map(|c| c.as_str().to_string());

        let rows: Vec<BalanceRow> = sqlx::query_as(
            r#"
            SELECT catalog_type, catalog_item_id, catalog_configuration_id,
                   scope_group_id, stock_type_id, branch_id, quantity, value
            FROM stock_balances
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR catalog_type = $2)
              AND ($3::bigint IS NULL OR catalog_item_id = $3)
              AND ($4::bigint IS NULL OR catalog_configuration_id = $4)
              AND ($5::bigint IS NULL OR scope_group_id = $5)
              AND ($6::bigint IS NULL OR stock_type_id = $6)
              AND ($7::bigint IS NULL OR branch_id = $7)
            ORDER BY catalog_item_id, scope_group_id, stock_type_id, branch_id
            "#,
        )
        .bind(tenant_id)
        .bind(&catalog_type)
        .bind(filter.catalog_item_id)
        .bind(filter.catalog_configuration_id)
        .bind(filter.scope_group_id)
        .bind(filter.stock_type_id)
        .bind(filter.branch_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| balance_from_row(tenant_id, row))
            .collect()
    }

    /// Balances consolidated across branches.
    pub async fn consolidated(
        &self,
        tenant_id: i64,
        filter: &BalanceFilter,
    ) -> Result<Vec<ConsolidatedBalance>, LedgerError> {
        let catalog_type = filter.catalog_type.map(|c| c.as_str().to_string());

        let rows: Vec<(String, i64, i64, i64, i64, Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT catalog_type, catalog_item_id, catalog_configuration_id,
                   scope_group_id, stock_type_id,
                   SUM(quantity) AS quantity, SUM(value) AS value
            FROM stock_balances
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR catalog_type = $2)
              AND ($3::bigint IS NULL OR catalog_item_id = $3)
              AND ($4::bigint IS NULL OR catalog_configuration_id = $4)
              AND ($5::bigint IS NULL OR scope_group_id = $5)
              AND ($6::bigint IS NULL OR stock_type_id = $6)
            GROUP BY catalog_type, catalog_item_id, catalog_configuration_id,
                     scope_group_id, stock_type_id
            ORDER BY catalog_item_id, scope_group_id, stock_type_id
            "#,
        )
        .bind(tenant_id)
        .bind(&catalog_type)
        .bind(filter.catalog_item_id)
        .bind(filter.catalog_configuration_id)
        .bind(filter.scope_group_id)
        .bind(filter.stock_type_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(
                    catalog_type,
                    catalog_item_id,
                    catalog_configuration_id,
                    scope_group_id,
                    stock_type_id,
                    quantity,
                    value,
                )| {
                    Ok(ConsolidatedBalance {
                        catalog_type: catalog_type.parse().map_err(LedgerError::Internal)?,
                        catalog_item_id,
                        catalog_configuration_id,
                        scope_group_id,
                        stock_type_id,
                        quantity,
                        value,
                    })
                },
            )
            .collect()
    }
}

fn balance_from_row(tenant_id: i64, row: BalanceRow) -> Result<StockBalance, LedgerError> {
    let (
        catalog_type,
        catalog_item_id,
        catalog_configuration_id,
        scope_group_id,
        stock_type_id,
        branch_id,
        quantity,
        value,
    ) = row;

    Ok(StockBalance {
        key: ScopeKey {
            tenant_id,
            catalog_type: catalog_type.parse().map_err(LedgerError::Internal)?,
            catalog_item_id,
            catalog_configuration_id,
            scope_group_id,
            stock_type_id,
            branch_id,
        },
        quantity,
        value,
    })
}
