//! Balance resolver
//!
//! Find-or-create-and-lock for stock balance rows. The exclusive row lock
//! taken here is held until the enclosing transaction ends, which is what
//! serializes concurrent commands touching the same scope key. Resolved
//! rows are memoized for the lifetime of one `apply()` call so a key shared
//! by several impacts is fetched and locked once.

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::domain::{LedgerError, ScopeKey, StockBalance};

/// Per-command balance resolver. Create one per `apply()` call.
#[derive(Debug, Default)]
pub struct BalanceResolver {
    resolved: HashMap<ScopeKey, StockBalance>,
}

impl BalanceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the balance for a scope key, locking its row for the rest of
    /// the transaction. The returned reference is the in-memory working copy
    /// later persisted by the engine.
    pub async fn resolve(
        &mut self,
        tx: &mut Transaction<'_, Postgres>,
        key: &ScopeKey,
    ) -> Result<&mut StockBalance, LedgerError> {
        match self.resolved.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let balance = fetch_or_create_locked(tx, key).await?;
                Ok(entry.insert(balance))
            }
        }
    }

    /// Hand the mutated working copies back for persistence.
    pub fn into_balances(self) -> Vec<StockBalance> {
        self.resolved.into_values().collect()
    }
}

/// Lock the row for `key`, creating a zero-initialized one when absent.
/// A concurrent creator losing us the insert is absorbed by re-reading
/// under the lock; the winner's row is used as-is.
async fn fetch_or_create_locked(
    tx: &mut Transaction<'_, Postgres>,
    key: &ScopeKey,
) -> Result<StockBalance, LedgerError> {
    if let Some(balance) = fetch_locked(tx, key).await? {
        return Ok(balance);
    }

    sqlx::query(
        r#"
        INSERT INTO stock_balances (
            tenant_id, catalog_type, catalog_item_id, catalog_configuration_id,
            scope_group_id, stock_type_id, branch_id, quantity, value
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, 0)
        ON CONFLICT (tenant_id, catalog_type, catalog_item_id,
                     catalog_configuration_id, scope_group_id,
                     stock_type_id, branch_id)
        DO NOTHING
        "#,
    )
    .bind(key.tenant_id)
    .bind(key.catalog_type.as_str())
    .bind(key.catalog_item_id)
    .bind(key.catalog_configuration_id)
    .bind(key.scope_group_id)
    .bind(key.stock_type_id)
    .bind(key.branch_id)
    .execute(&mut **tx)
    .await?;

    match fetch_locked(tx, key).await? {
        Some(balance) => Ok(balance),
        None => Err(LedgerError::Internal(format!(
            "stock balance neither created nor found for scope key {:?}",
            key
        ))),
    }
}

async fn fetch_locked(
    tx: &mut Transaction<'_, Postgres>,
    key: &ScopeKey,
) -> Result<Option<StockBalance>, LedgerError> {
    let row: Option<(Decimal, Decimal)> = sqlx::query_as(
        r#"
        SELECT quantity, value
        FROM stock_balances
        WHERE tenant_id = $1
          AND catalog_type = $2
          AND catalog_item_id = $3
          AND catalog_configuration_id = $4
          AND scope_group_id = $5
          AND stock_type_id = $6
          AND branch_id = $7
        FOR UPDATE
        "#,
    )
    .bind(key.tenant_id)
    .bind(key.catalog_type.as_str())
    .bind(key.catalog_item_id)
    .bind(key.catalog_configuration_id)
    .bind(key.scope_group_id)
    .bind(key.stock_type_id)
    .bind(key.branch_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|(quantity, value)| StockBalance {
        key: key.clone(),
        quantity,
        value,
    }))
}
