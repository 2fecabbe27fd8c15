//! API Middleware
//!
//! Tenant extraction and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Instant;

/// Tenant resolved from the X-Tenant-Id header.
#[derive(Debug, Clone, Copy)]
pub struct RequestTenant {
    pub tenant_id: i64,
}

/// Extract and validate the tenant id from the X-Tenant-Id header.
/// Every /api/v1 route runs behind this.
pub async fn tenant_middleware(
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let raw = match headers.get("X-Tenant-Id").and_then(|v| v.to_str().ok()) {
        Some(value) => value,
        None => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Missing X-Tenant-Id header",
                    "error_code": "missing_tenant"
                })),
            )
                .into_response());
        }
    };

    let tenant_id: i64 = match raw.parse() {
        Ok(id) if id > 0 => id,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "X-Tenant-Id must be a positive integer",
                    "error_code": "invalid_tenant"
                })),
            )
                .into_response());
        }
    };

    request.extensions_mut().insert(RequestTenant { tenant_id });

    Ok(next.run(request).await)
}

/// Log method, path, status and latency for every request.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn, routing::get, Extension, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn echo_tenant(Extension(tenant): Extension<RequestTenant>) -> String {
        tenant.tenant_id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo_tenant))
            .layer(from_fn(tenant_middleware))
    }

    fn request(tenant_header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = tenant_header {
            builder = builder.header("X-Tenant-Id", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_tenant_header_rejected() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error_code"], "missing_tenant");
    }

    #[tokio::test]
    async fn test_malformed_tenant_header_rejected() {
        for bad in ["abc", "0", "-5", "1.5"] {
            let response = app().oneshot(request(Some(bad))).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "value: {}", bad);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error_code"], "invalid_tenant");
        }
    }

    #[tokio::test]
    async fn test_valid_tenant_reaches_handler() {
        let response = app().oneshot(request(Some("42"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"42");
    }
}
