use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service information
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Estate API",
            "version": version,
            "description": "Real-estate marketplace backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/signup, /api/auth/login (public), /api/auth/me (authenticated)",
                "properties": "/api/properties[/:id] (public reads, entitlement-gated features)",
                "projects": "/api/projects[/:id] (builder writes)",
                "commercial": "/api/commercial[/:id] (landlord/builder/agent writes)",
                "estate": "/api/leases, /api/utility-bills (landlord/tenant)",
                "workflows": "/api/kyc, /api/verification (admin review)",
                "subscriptions": "/api/subscriptions/plans, /api/subscriptions/me",
            }
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
