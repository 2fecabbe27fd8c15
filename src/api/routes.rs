//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::balance::{BalanceFilter, BalanceStore};
use crate::command::{GroupTransfer, ImpactRequest, MovementRequest};
use crate::domain::{CatalogType, LedgerError, OperationContext, OriginType};
use crate::engine::MovementEngine;
use crate::error::AppError;
use crate::ledger::{HistoryFilter, HistoryPage, LedgerStore, MovementWithLines};

use super::middleware::RequestTenant;

// =========================================================================
// Request/Response types
// =========================================================================

/// Movement command body; the tenant comes from the X-Tenant-Id header.
#[derive(Debug, Deserialize)]
pub struct ApplyMovementRequest {
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
    #[serde(default)]
    pub moved_at: Option<DateTime<Utc>>,
    pub impacts: Vec<ImpactRequest>,
}

impl ApplyMovementRequest {
    fn into_request(self, tenant_id: i64) -> MovementRequest {
        MovementRequest {
            tenant_id,
            catalog_type: self.catalog_type,
            catalog_item_id: self.catalog_item_id,
            catalog_configuration_id: self.catalog_configuration_id,
            scope_group_id: self.scope_group_id,
            origin_type: self.origin_type,
            origin_code: self.origin_code,
            origin_item_code: self.origin_item_code,
            note: self.note,
            idempotency_key: self.idempotency_key,
            moved_at: self.moved_at,
            impacts: self.impacts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplyMovementResponse {
    pub movement_id: Uuid,
    pub reused: bool,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub catalog_type: Option<CatalogType>,
    pub catalog_item_id: Option<i64>,
    pub catalog_configuration_id: Option<i64>,
    pub scope_group_id: Option<i64>,
    pub stock_type_id: Option<i64>,
    pub branch_id: Option<i64>,
    /// Collapse branches and sum quantity/value per scope group and stock type.
    #[serde(default)]
    pub consolidated: bool,
}

impl BalanceQuery {
    fn filter(&self) -> BalanceFilter {
        BalanceFilter {
            catalog_type: self.catalog_type,
            catalog_item_id: self.catalog_item_id,
            catalog_configuration_id: self.catalog_configuration_id,
            scope_group_id: self.scope_group_id,
            stock_type_id: self.stock_type_id,
            branch_id: self.branch_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupTransferOutcome {
    pub catalog_item_id: i64,
    pub movement_id: Uuid,
    pub reused: bool,
}

#[derive(Debug, Serialize)]
pub struct GroupTransferResponse {
    pub transfers: Vec<GroupTransferOutcome>,
}

// =========================================================================
// Router
// =========================================================================

/// Create the API router. Tenant middleware is applied by the caller.
pub fn create_router() -> Router<PgPool> {
    Router::new()
        .route("/movements", post(apply_movement).get(movement_history))
        .route("/movements/:id", get(movement_by_id))
        .route("/balances", get(balances))
        .route("/group-transfers", post(group_transfer))
}

// =========================================================================
// Handlers
// =========================================================================

/// Build an operation context from request headers. A missing or malformed
/// correlation id just means a fresh one is generated.
fn context_from_headers(headers: &HeaderMap) -> OperationContext {
    let mut context = OperationContext::new();

    if let Some(id) = headers
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
    {
        context = context.with_correlation_id(id);
    }
    if let Some(user_id) = headers
        .get("X-Request-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
    {
        context = context.with_actor(user_id);
    }

    context.ensure_correlation_id();
    context
}

async fn apply_movement(
    State(pool): State<PgPool>,
    Extension(tenant): Extension<RequestTenant>,
    headers: HeaderMap,
    Json(body): Json<ApplyMovementRequest>,
) -> Result<Response, AppError> {
    let context = context_from_headers(&headers);
    let engine = MovementEngine::new(pool);
    let outcome = engine
        .apply(body.into_request(tenant.tenant_id), &context)
        .await?;

    let status = if outcome.reused {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(ApplyMovementResponse {
            movement_id: outcome.movement_id,
            reused: outcome.reused,
        }),
    )
        .into_response())
}

async fn movement_history(
    State(pool): State<PgPool>,
    Extension(tenant): Extension<RequestTenant>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<HistoryPage>, AppError> {
    let store = LedgerStore::new(pool);
    let page = store.history(tenant.tenant_id, &filter).await?;

    Ok(Json(page))
}

async fn movement_by_id(
    State(pool): State<PgPool>,
    Extension(tenant): Extension<RequestTenant>,
    Path(id): Path<Uuid>,
) -> Result<Json<MovementWithLines>, AppError> {
    let store = LedgerStore::new(pool);
    let movement = store
        .find_movement(tenant.tenant_id, id)
        .await?
        .ok_or(LedgerError::MovementNotFound(id))?;

    Ok(Json(movement))
}

async fn balances(
    State(pool): State<PgPool>,
    Extension(tenant): Extension<RequestTenant>,
    Query(query): Query<BalanceQuery>,
) -> Result<Response, AppError> {
    let store = BalanceStore::new(pool);

    let filter = query.filter();
    if query.consolidated {
        let balances = store.consolidated(tenant.tenant_id, &filter).await?;
        Ok(Json(balances).into_response())
    } else {
        let balances = store.balances(tenant.tenant_id, &filter).await?;
        Ok(Json(balances).into_response())
    }
}

async fn group_transfer(
    State(pool): State<PgPool>,
    Extension(tenant): Extension<RequestTenant>,
    headers: HeaderMap,
    Json(transfer): Json<GroupTransfer>,
) -> Result<Json<GroupTransferResponse>, AppError> {
    let context = context_from_headers(&headers);
    let engine = MovementEngine::new(pool);

    let mut transfers = Vec::with_capacity(transfer.items.len());
    for request in transfer.plan(tenant.tenant_id) {
        let catalog_item_id = request.catalog_item_id;
        let outcome = engine.apply(request, &context).await?;
        transfers.push(GroupTransferOutcome {
            catalog_item_id,
            movement_id: outcome.movement_id,
            reused: outcome.reused,
        });
    }

    Ok(Json(GroupTransferResponse { transfers }))
}
