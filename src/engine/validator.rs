//! Impact validator
//!
//! Confirms each impact references live scope entities: an active stock
//! type matching the (tenant, catalog configuration, scope group) triple,
//! and a branch belonging to the tenant. Positive results are cached for
//! the lifetime of one `apply()` call.

use sqlx::{Postgres, Transaction};
use std::collections::HashSet;

use crate::command::{Impact, MovementCommand};
use crate::domain::LedgerError;

/// Per-command impact validator. Create one per `apply()` call.
#[derive(Debug, Default)]
pub struct ImpactValidator {
    // (stock_type_id, scope_group_id); tenant and configuration are fixed
    // per command
    known_stock_types: HashSet<(i64, i64)>,
    known_branches: HashSet<i64>,
}

impl ImpactValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(
        &mut self,
        tx: &mut Transaction<'_, Postgres>,
        command: &MovementCommand,
        impact: &Impact,
    ) -> Result<(), LedgerError> {
        self.check_stock_type(tx, command, impact).await?;
        self.check_branch(tx, command.tenant_id, impact.branch_id).await
    }

    async fn check_stock_type(
        &mut self,
        tx: &mut Transaction<'_, Postgres>,
        command: &MovementCommand,
        impact: &Impact,
    ) -> Result<(), LedgerError> {
        let cache_key = (impact.stock_type_id, impact.scope_group_id);
        if self.known_stock_types.contains(&cache_key) {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM stock_types
                WHERE id = $1
                  AND tenant_id = $2
                  AND catalog_configuration_id = $3
                  AND scope_group_id = $4
                  AND active
            )
            "#,
        )
        .bind(impact.stock_type_id)
        .bind(command.tenant_id)
        .bind(command.catalog_configuration_id)
        .bind(impact.scope_group_id)
        .fetch_one(&mut **tx)
        .await?;

        if !exists {
            return Err(LedgerError::StockTypeNotFound {
                stock_type_id: impact.stock_type_id,
                scope_group_id: impact.scope_group_id,
            });
        }

        self.known_stock_types.insert(cache_key);
        Ok(())
    }

    async fn check_branch(
        &mut self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: i64,
        branch_id: i64,
    ) -> Result<(), LedgerError> {
        if self.known_branches.contains(&branch_id) {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM branches
                WHERE id = $1 AND tenant_id = $2
            )
            "#,
        )
        .bind(branch_id)
        .bind(tenant_id)
        .fetch_one(&mut **tx)
        .await?;

        if !exists {
            return Err(LedgerError::BranchNotFound { branch_id });
        }

        self.known_branches.insert(branch_id);
        Ok(())
    }
}
