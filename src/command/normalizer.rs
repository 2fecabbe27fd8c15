//! Command normalizer
//!
//! Turns a raw `MovementRequest` into an immutable `MovementCommand`:
//! positive-id checks, text trimming and truncation, timestamp defaulting,
//! delta rounding, and zero-delta filtering. Pure, no side effects; a
//! command that fails here never touches the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{round6, CatalogType, LedgerError, Metric, OriginType, ScopeKey};

use super::raw::{ImpactRequest, MovementRequest};

/// Maximum length of origin codes after trimming.
const MAX_CODE_LEN: usize = 120;
/// Maximum length of the free-text note.
const MAX_NOTE_LEN: usize = 255;
/// Maximum length of the idempotency key.
const MAX_KEY_LEN: usize = 180;

/// Normalized impact: positive ids, delta rounded to the ledger scale,
/// guaranteed non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Impact {
    pub scope_group_id: i64,
    pub metric: Metric,
    pub stock_type_id: i64,
    pub branch_id: i64,
    pub delta: Decimal,
}

impl Impact {
    /// Key the engine sorts by: (scope group, stock type, branch, metric name).
    pub fn order_key(&self) -> (i64, i64, i64, &'static str) {
        (
            self.scope_group_id,
            self.stock_type_id,
            self.branch_id,
            self.metric.as_str(),
        )
    }
}

/// Fully normalized, validated movement command.
#[derive(Debug, Clone)]
pub struct MovementCommand {
    pub tenant_id: i64,
    pub catalog_type: CatalogType,
    pub catalog_item_id: i64,
    pub catalog_configuration_id: i64,
    pub scope_group_id: i64,
    pub origin_type: OriginType,
    pub origin_code: Option<String>,
    pub origin_item_code: Option<String>,
    pub note: Option<String>,
    pub idempotency_key: String,
    pub moved_at: DateTime<Utc>,
    pub impacts: Vec<Impact>,
}

impl MovementCommand {
    /// Full composite key for one of this command's impacts.
    pub fn scope_key_for(&self, impact: &Impact) -> ScopeKey {
        ScopeKey {
            tenant_id: self.tenant_id,
            catalog_type: self.catalog_type,
            catalog_item_id: self.catalog_item_id,
            catalog_configuration_id: self.catalog_configuration_id,
            scope_group_id: impact.scope_group_id,
            stock_type_id: impact.stock_type_id,
            branch_id: impact.branch_id,
        }
    }
}

/// Normalize a raw request. `now` supplies the timestamp default.
pub fn normalize(
    request: MovementRequest,
    now: DateTime<Utc>,
) -> Result<MovementCommand, LedgerError> {
    let tenant_id = positive("tenant_id", request.tenant_id)?;
    let catalog_item_id = positive("catalog_item_id", request.catalog_item_id)?;
    let catalog_configuration_id =
        positive("catalog_configuration_id", request.catalog_configuration_id)?;
    let scope_group_id = positive("scope_group_id", request.scope_group_id)?;

    let idempotency_key = clean_text(Some(request.idempotency_key), MAX_KEY_LEN)
        .ok_or_else(|| LedgerError::validation("idempotency_key", "must not be blank"))?;

    let mut impacts = Vec::with_capacity(request.impacts.len());
    for raw in request.impacts {
        if let Some(impact) = normalize_impact(raw)? {
            impacts.push(impact);
        }
    }
    if impacts.is_empty() {
        return Err(LedgerError::EmptyCommand);
    }

    Ok(MovementCommand {
        tenant_id,
        catalog_type: request.catalog_type,
        catalog_item_id,
        catalog_configuration_id,
        scope_group_id,
        origin_type: request.origin_type,
        origin_code: clean_text(request.origin_code, MAX_CODE_LEN),
        origin_item_code: clean_text(request.origin_item_code, MAX_CODE_LEN),
        note: clean_text(request.note, MAX_NOTE_LEN),
        idempotency_key,
        moved_at: request.moved_at.unwrap_or(now),
        impacts,
    })
}

/// Normalize one impact; `Ok(None)` means the delta rounded to zero and the
/// impact is dropped.
fn normalize_impact(raw: ImpactRequest) -> Result<Option<Impact>, LedgerError> {
    let scope_group_id = positive("impact.scope_group_id", raw.scope_group_id)?;
    let stock_type_id = positive("impact.stock_type_id", raw.stock_type_id)?;
    let branch_id = positive("impact.branch_id", raw.branch_id)?;

    let delta = round6(raw.delta);
    if delta.is_zero() {
        return Ok(None);
    }

    Ok(Some(Impact {
        scope_group_id,
        metric: raw.metric,
        stock_type_id,
        branch_id,
        delta,
    }))
}

fn positive(field: &'static str, value: i64) -> Result<i64, LedgerError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(LedgerError::validation(
            field,
            format!("must be positive (got {})", value),
        ))
    }
}

/// Trim, map empty to absent, truncate to `max` characters.
fn clean_text(value: Option<String>, max: usize) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > max {
        Some(trimmed.chars().take(max).collect())
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_request() -> MovementRequest {
        MovementRequest::new(
            1,
            CatalogType::Product,
            42,
            5,
            100,
            OriginType::ManualAdjustment,
            "adjust-1".to_string(),
        )
        .with_impact(100, Metric::Quantity, 10, 7, dec!(2.5))
    }

    #[test]
    fn test_normalize_happy_path() {
        let now = Utc::now();
        let command = normalize(base_request(), now).unwrap();

        assert_eq!(command.tenant_id, 1);
        assert_eq!(command.idempotency_key, "adjust-1");
        assert_eq!(command.moved_at, now);
        assert_eq!(command.impacts.len(), 1);
        assert_eq!(command.impacts[0].delta, dec!(2.5));
    }

    #[test]
    fn test_non_positive_ids_rejected() {
        let mut request = base_request();
        request.catalog_item_id = 0;

        let err = normalize(request, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation {
                field: "catalog_item_id",
                ..
            }
        ));
    }

    #[test]
    fn test_non_positive_impact_ids_rejected() {
        let mut request = base_request();
        request.impacts[0].branch_id = -3;

        let err = normalize(request, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation {
                field: "impact.branch_id",
                ..
            }
        ));
    }

    #[test]
    fn test_blank_idempotency_key_rejected() {
        let mut request = base_request();
        request.idempotency_key = "   ".to_string();

        let err = normalize(request, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation {
                field: "idempotency_key",
                ..
            }
        ));
    }

    #[test]
    fn test_text_fields_trimmed_and_emptied() {
        let mut request = base_request().with_note("  counted twice  ".to_string());
        request.origin_code = Some("   ".to_string());

        let command = normalize(request, Utc::now()).unwrap();
        assert_eq!(command.note.as_deref(), Some("counted twice"));
        assert_eq!(command.origin_code, None);
    }

    #[test]
    fn test_text_fields_truncated() {
        let request = base_request()
            .with_origin_code("x".repeat(200))
            .with_note("y".repeat(400));

        let command = normalize(request, Utc::now()).unwrap();
        assert_eq!(command.origin_code.unwrap().len(), 120);
        assert_eq!(command.note.unwrap().len(), 255);
    }

    #[test]
    fn test_idempotency_key_truncated() {
        let mut request = base_request();
        request.idempotency_key = "k".repeat(500);

        let command = normalize(request, Utc::now()).unwrap();
        assert_eq!(command.idempotency_key.len(), 180);
    }

    #[test]
    fn test_delta_rounded_half_up() {
        let mut request = base_request();
        request.impacts[0].delta = dec!(1.00000051);

        let command = normalize(request, Utc::now()).unwrap();
        assert_eq!(command.impacts[0].delta, dec!(1.000001));
    }

    #[test]
    fn test_zero_delta_impacts_dropped() {
        let request = base_request().with_impact(100, Metric::Value, 10, 7, dec!(0.0000004));

        let command = normalize(request, Utc::now()).unwrap();
        // the second impact rounds to zero and disappears
        assert_eq!(command.impacts.len(), 1);
        assert_eq!(command.impacts[0].metric, Metric::Quantity);
    }

    #[test]
    fn test_all_zero_deltas_rejected() {
        let mut request = base_request();
        request.impacts[0].delta = dec!(0.0000001);

        let err = normalize(request, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyCommand));
    }

    #[test]
    fn test_no_impacts_rejected() {
        let mut request = base_request();
        request.impacts.clear();

        let err = normalize(request, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyCommand));
    }

    #[test]
    fn test_timestamp_defaults_to_now() {
        let now = Utc::now();
        let explicit = now - chrono::Duration::days(3);

        let command = normalize(base_request().with_moved_at(explicit), now).unwrap();
        assert_eq!(command.moved_at, explicit);

        let command = normalize(base_request(), now).unwrap();
        assert_eq!(command.moved_at, now);
    }

    #[test]
    fn test_order_key_sorts_by_scope_then_metric_name() {
        let make = |scope, stock, branch, metric| Impact {
            scope_group_id: scope,
            metric,
            stock_type_id: stock,
            branch_id: branch,
            delta: dec!(1),
        };

        let mut impacts = vec![
            make(200, 10, 7, Metric::Quantity),
            make(100, 10, 7, Metric::Value),
            make(100, 10, 7, Metric::Quantity),
            make(100, 10, 8, Metric::Quantity),
        ];
        impacts.sort_by_key(|i| i.order_key());

        assert_eq!(impacts[0].order_key(), (100, 10, 7, "quantity"));
        assert_eq!(impacts[1].order_key(), (100, 10, 7, "value"));
        assert_eq!(impacts[2].order_key(), (100, 10, 8, "quantity"));
        assert_eq!(impacts[3].order_key(), (200, 10, 7, "quantity"));
    }
}
