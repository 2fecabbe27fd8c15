//! Movement engine
//!
//! The orchestrator: normalizes a command, enforces idempotency, validates
//! impacts, resolves and locks balances, and writes lines and balances in
//! one atomic transaction. At most one set of effects per (tenant,
//! idempotency key), ever.

mod resolver;
mod validator;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::balance::BalanceStore;
use crate::command::{self, MovementCommand, MovementRequest};
use crate::domain::{LedgerError, MovementLine, OperationContext};
use crate::ledger::LedgerStore;

pub use resolver::BalanceResolver;
pub use validator::ImpactValidator;

/// Outcome of applying a command.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub movement_id: Uuid,
    /// True when the command's idempotency key had been seen before and the
    /// existing movement was returned instead of writing anything.
    pub reused: bool,
}

/// Engine applying movement commands against the ledger.
#[derive(Debug, Clone)]
pub struct MovementEngine {
    ledger: LedgerStore,
    balances: BalanceStore,
    pool: PgPool,
}

impl MovementEngine {
    pub fn new(pool: PgPool) -> Self {
        Self {
            ledger: LedgerStore::new(pool.clone()),
            balances: BalanceStore::new(pool.clone()),
            pool,
        }
    }

    /// Apply one movement command. All effects happen inside a single
    /// transaction; any failure leaves the store untouched.
    #[tracing::instrument(
        skip_all,
        fields(
            tenant_id = request.tenant_id,
            correlation_id = ?context.correlation_id
        )
    )]
    pub async fn apply(
        &self,
        request: MovementRequest,
        context: &OperationContext,
    ) -> Result<ApplyOutcome, LedgerError> {
        let command = command::normalize(request, Utc::now())?;

        let mut tx = self.pool.begin().await?;

        // Fast path for a replayed key: no re-validation, no writes.
        if let Some(existing) = self
            .ledger
            .find_id_by_key(&mut tx, command.tenant_id, &command.idempotency_key)
            .await?
        {
            tracing::debug!(movement_id = %existing, "idempotent replay");
            return Ok(ApplyOutcome {
                movement_id: existing,
                reused: true,
            });
        }

        // Optimistic create; a concurrent caller winning the race surfaces
        // as a conflict, resolved by re-reading the winner's row.
        let movement_id = Uuid::new_v4();
        let movement_id = match self
            .ledger
            .insert_header(&mut tx, movement_id, &command)
            .await?
        {
            Some(id) => id,
            None => {
                let existing = self
                    .ledger
                    .find_id_by_key(&mut tx, command.tenant_id, &command.idempotency_key)
                    .await?
                    .ok_or_else(|| {
                        LedgerError::Internal(format!(
                            "movement conflict for key '{}' but no winner row found",
                            command.idempotency_key
                        ))
                    })?;
                tracing::debug!(movement_id = %existing, "lost create race, reusing winner");
                return Ok(ApplyOutcome {
                    movement_id: existing,
                    reused: true,
                });
            }
        };

        let lines = self.apply_impacts(&mut tx, movement_id, &command).await?;
        self.ledger.insert_lines(&mut tx, &lines).await?;

        tx.commit().await?;

        tracing::info!(
            movement_id = %movement_id,
            lines = lines.len(),
            origin = %command.origin_type,
            "movement applied"
        );

        Ok(ApplyOutcome {
            movement_id,
            reused: false,
        })
    }

    /// Validate, lock and mutate balances for every impact, in the
    /// deterministic (scope group, stock type, branch, metric) order that
    /// keeps lock acquisition consistent across commands.
    async fn apply_impacts(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        movement_id: Uuid,
        command: &MovementCommand,
    ) -> Result<Vec<MovementLine>, LedgerError> {
        let mut impacts = command.impacts.clone();
        impacts.sort_by_key(|impact| impact.order_key());

        let mut validator = ImpactValidator::new();
        let mut resolver = BalanceResolver::new();
        let mut lines = Vec::with_capacity(impacts.len());

        for (position, impact) in impacts.iter().enumerate() {
            validator.check(tx, command, impact).await?;

            let key = command.scope_key_for(impact);
            let balance = resolver.resolve(tx, &key).await?;

            let before = balance.current(impact.metric);
            let after = before + impact.delta;
            balance.set_current(impact.metric, after);

            lines.push(MovementLine {
                id: Uuid::new_v4(),
                movement_id,
                position: position as i32,
                scope_group_id: impact.scope_group_id,
                stock_type_id: impact.stock_type_id,
                branch_id: impact.branch_id,
                metric: impact.metric,
                before_value: before,
                delta: impact.delta,
                after_value: after,
            });
        }

        for balance in resolver.into_balances() {
            self.balances.persist(tx, &balance).await?;
        }

        Ok(lines)
    }
}
