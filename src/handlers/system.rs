use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{ApiError, ROUTE_NOT_FOUND_MESSAGE};

/// GET / - service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Pukk Admin API",
        "version": version,
        "description": "Admin catalog API for outlets, products and their per-outlet listings",
        "store": state.store.backend_name(),
        "endpoints": {
            "health": "/health (public)",
            "outlets": "/api/admin/outlets[/:id] (admin)",
            "products": "/api/admin/products[/:id] (admin)",
            "outlet_products": "/api/admin/outlet-products[/:id] (admin)",
        }
    }))
}

/// GET /health - store reachability
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": state.store.backend_name(),
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": state.store.backend_name(),
                    "error": e.to_string(),
                })),
            )
        }
    }
}

/// Unmatched paths and unsupported methods.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found(ROUTE_NOT_FOUND_MESSAGE)
}
