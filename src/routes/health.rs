use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Returns the health status of the server and its store.
/// Used by load balancers and monitoring systems.
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.store.health_check().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Store health check failed: {:?}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
        "database": db_status,
        "backend": format!("{:?}", state.store.backend()).to_lowercase(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
