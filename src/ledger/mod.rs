//! Ledger store
//!
//! Append side: movement headers and lines, written inside the engine's
//! transaction and never touched again. Read side: movement-by-id and the
//! paginated, filterable history view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::command::MovementCommand;
use crate::domain::{LedgerError, Metric, Movement, MovementLine, OriginType};

/// Filters for the history view. Absent fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub moved_from: Option<DateTime<Utc>>,
    pub moved_to: Option<DateTime<Utc>>,
    pub origin_type: Option<OriginType>,
    pub catalog_item_id: Option<i64>,
    pub scope_group_id: Option<i64>,
    pub stock_type_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub metric: Option<Metric>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl HistoryFilter {
    const DEFAULT_PER_PAGE: i64 = 50;
    const MAX_PER_PAGE: i64 = 200;

    fn limit_offset(&self) -> (i64, i64) {
        let per_page = self
            .per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, page.saturating_sub(1).saturating_mul(per_page))
    }
}

/// A movement header together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct MovementWithLines {
    pub movement: Movement,
    pub lines: Vec<MovementLine>,
}

/// One page of ledger history.
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub movements: Vec<MovementWithLines>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

type MovementRow = (
    Uuid,
    i64,
    String,
    i64,
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    String,
    DateTime<Utc>,
);

type LineRow = (
    Uuid,
    Uuid,
    i32,
    i64,
    i64,
    i64,
    String,
    Decimal,
    Decimal,
    Decimal,
);

const MOVEMENT_COLUMNS: &str = "id, tenant_id, catalog_type, catalog_item_id, \
     catalog_configuration_id, scope_group_id, origin_type, origin_code, \
     origin_item_code, note, moved_at, idempotency_key, created_at";

const LINE_COLUMNS: &str = "id, movement_id, position, scope_group_id, \
     stock_type_id, branch_id, metric, before_value, delta, after_value";

/// Store for the immutable half of the ledger.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up a movement id by (tenant, idempotency key) inside a transaction.
    pub async fn find_id_by_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: i64,
        idempotency_key: &str,
    ) -> Result<Option<Uuid>, LedgerError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM movements
            WHERE tenant_id = $1 AND idempotency_key = $2
            "#,
        )
        .bind(tenant_id)
        .bind(idempotency_key)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Optimistically insert the movement header. Returns `None` when a
    /// concurrent caller already holds the (tenant, idempotency key) pair;
    /// the caller falls back to a re-read.
    pub async fn insert_header(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        movement_id: Uuid,
        command: &MovementCommand,
    ) -> Result<Option<Uuid>, LedgerError> {
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO movements (
                id, tenant_id, catalog_type, catalog_item_id,
                catalog_configuration_id, scope_group_id, origin_type,
                origin_code, origin_item_code, note, moved_at, idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (tenant_id, idempotency_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(movement_id)
        .bind(command.tenant_id)
        .bind(command.catalog_type.as_str())
        .bind(command.catalog_item_id)
        .bind(command.catalog_configuration_id)
        .bind(command.scope_group_id)
        .bind(command.origin_type.as_str())
        .bind(&command.origin_code)
        .bind(&command.origin_item_code)
        .bind(&command.note)
        .bind(command.moved_at)
        .bind(&command.idempotency_key)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(inserted)
    }

    /// Persist the lines of one movement in their deterministic order.
    pub async fn insert_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lines: &[MovementLine],
    ) -> Result<(), LedgerError> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO movement_lines (
                    id, movement_id, position, scope_group_id, stock_type_id,
                    branch_id, metric, before_value, delta, after_value
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(line.id)
            .bind(line.movement_id)
            .bind(line.position)
            .bind(line.scope_group_id)
            .bind(line.stock_type_id)
            .bind(line.branch_id)
            .bind(line.metric.as_str())
            .bind(line.before_value)
            .bind(line.delta)
            .bind(line.after_value)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Fetch one movement with its lines.
    pub async fn find_movement(
        &self,
        tenant_id: i64,
        movement_id: Uuid,
    ) -> Result<Option<MovementWithLines>, LedgerError> {
        let row: Option<MovementRow> = sqlx::query_as(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(movement_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let movement = movement_from_row(row)?;

        let lines: Vec<LineRow> = sqlx::query_as(&format!(
            "SELECT {LINE_COLUMNS} FROM movement_lines WHERE movement_id = $1 ORDER BY position"
        ))
        .bind(movement_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(MovementWithLines {
            movement,
            lines: lines
                .into_iter()
                .map(line_from_row)
                .collect::<Result<_, _>>()?,
        }))
    }

    /// Paginated history view. Line-level filters (scope group, stock type,
    /// branch, metric) match movements having at least one such line.
    pub async fn history(
        &self,
        tenant_id: i64,
        filter: &HistoryFilter,
    ) -> Result<HistoryPage, LedgerError> {
        let (per_page, offset) = filter.limit_offset();
        let page = filter.page.unwrap_or(1).max(1);

        const WHERE_CLAUSE: &str = r#"
            m.tenant_id = $1
            AND ($2::timestamptz IS NULL OR m.moved_at >= $2)
            AND ($3::timestamptz IS NULL OR m.moved_at <= $3)
            AND ($4::text IS NULL OR m.origin_type = $4)
            AND ($5::bigint IS NULL OR m.catalog_item_id = $5)
            AND ($6::bigint IS NULL OR EXISTS (
                SELECT 1 FROM movement_lines l
                WHERE l.movement_id = m.id AND l.scope_group_id = $6))
            AND ($7::bigint IS NULL OR EXISTS (
                SELECT 1 FROM movement_lines l
                WHERE l.movement_id = m.id AND l.stock_type_id = $7))
            AND ($8::bigint IS NULL OR EXISTS (
                SELECT 1 FROM movement_lines l
                WHERE l.movement_id = m.id AND l.branch_id = $8))
            AND ($9::text IS NULL OR EXISTS (
                SELECT 1 FROM movement_lines l
                WHERE l.movement_id = m.id AND l.metric = $9))
        "#;

        let origin = filter.origin_type.map(|o| o.as_str().to_string());
        let metric = filter.metric.map(|m| m.as_str().to_string());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM movements m WHERE {WHERE_CLAUSE}"
        ))
        .bind(tenant_id)
        .bind(filter.moved_from)
        .bind(filter.moved_to)
        .bind(&origin)
        .bind(filter.catalog_item_id)
        .bind(filter.scope_group_id)
        .bind(filter.stock_type_id)
        .bind(filter.branch_id)
        .bind(&metric)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<MovementRow> = sqlx::query_as(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements m WHERE {WHERE_CLAUSE} \
             ORDER BY m.moved_at DESC, m.created_at DESC \
             LIMIT $10 OFFSET $11"
        ))
        .bind(tenant_id)
        .bind(filter.moved_from)
        .bind(filter.moved_to)
        .bind(&origin)
        .bind(filter.catalog_item_id)
        .bind(filter.scope_group_id)
        .bind(filter.stock_type_id)
        .bind(filter.branch_id)
        .bind(&metric)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let movements: Vec<Movement> = rows
            .into_iter()
            .map(movement_from_row)
            .collect::<Result<_, _>>()?;

        let ids: Vec<Uuid> = movements.iter().map(|m| m.id).collect();
        let line_rows: Vec<LineRow> = sqlx::query_as(&format!(
            "SELECT {LINE_COLUMNS} FROM movement_lines \
             WHERE movement_id = ANY($1) ORDER BY movement_id, position"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_movement: std::collections::HashMap<Uuid, Vec<MovementLine>> =
            std::collections::HashMap::new();
        for row in line_rows {
            let line = line_from_row(row)?;
            lines_by_movement
                .entry(line.movement_id)
                .or_default()
                .push(line);
        }

        let movements = movements
            .into_iter()
            .map(|movement| {
                let lines = lines_by_movement.remove(&movement.id).unwrap_or_default();
                MovementWithLines { movement, lines }
            })
            .collect();

        Ok(HistoryPage {
            movements,
            total,
            page,
            per_page,
        })
    }
}

fn movement_from_row(row: MovementRow) -> Result<Movement, LedgerError> {
    let (
        id,
        tenant_id,
        catalog_type,
        catalog_item_id,
        catalog_configuration_id,
        scope_group_id,
        origin_type,
        origin_code,
        origin_item_code,
        note,
        moved_at,
        idempotency_key,
        created_at,
    ) = row;

    Ok(Movement {
        id,
        tenant_id,
        catalog_type: catalog_type.parse().map_err(LedgerError::Internal)?,
        catalog_item_id,
        catalog_configuration_id,
        scope_group_id,
        origin_type: origin_type.parse().map_err(LedgerError::Internal)?,
        origin_code,
        origin_item_code,
        note,
        moved_at,
        idempotency_key,
        created_at,
    })
}

fn line_from_row(row: LineRow) -> Result<MovementLine, LedgerError> {
    let (
        id,
        movement_id,
        position,
        scope_group_id,
        stock_type_id,
        branch_id,
        metric,
        before_value,
        delta,
        after_value,
    ) = row;

    Ok(MovementLine {
        id,
        movement_id,
        position,
        scope_group_id,
        stock_type_id,
        branch_id,
        metric: metric.parse().map_err(LedgerError::Internal)?,
        before_value,
        delta,
        after_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_offset_defaults() {
        let filter = HistoryFilter::default();
        assert_eq!(filter.limit_offset(), (50, 0));
    }

    #[test]
    fn test_limit_offset_clamps() {
        let filter = HistoryFilter {
            page: Some(3),
            per_page: Some(1000),
            ..Default::default()
        };
        assert_eq!(filter.limit_offset(), (200, 400));

        let filter = HistoryFilter {
            page: Some(0),
            per_page: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.limit_offset(), (1, 0));
    }

    #[test]
    fn test_limit_offset_saturates_on_extreme_page() {
        let filter = HistoryFilter {
            page: Some(i64::MAX),
            per_page: Some(200),
            ..Default::default()
        };
        // never overflows; the offset pins to i64::MAX and the query
        // simply returns an empty page
        assert_eq!(filter.limit_offset(), (200, i64::MAX));
    }
}
