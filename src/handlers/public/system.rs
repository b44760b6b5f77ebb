// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Minetrack API",
        "error": false,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "endpoints": {
                "health": "/health (public)",
                "mines": "/mines[/:id]",
                "equipments": "/equipments[/:id]",
                "effective_capacity": "/effective-capacity[/:id]",
                "production_constraints": "/production-constraints",
                "production_plans": "/production-plans[/:id]",
                "weather": "/weather",
                "roads": "/roads[/:id]",
                "shipping_schedules": "/shipping-schedules[/:id]",
                "users": "/users/:id[/role], /logout/:id",
            }
        }
    }))
}

/// 200 when the record store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "message": "ok",
                "error": false,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "message": "database unavailable",
                    "error": true,
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
