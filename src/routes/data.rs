use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::Caller;
use crate::db::catalog_of;
use crate::error::Result;
use crate::models::CategoryWithLinks;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub nav: Vec<CategoryWithLinks>,
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct VisitRequest {
    #[serde(default)]
    pub id: Option<i64>,
}

/// Categories with their links, plus site settings
///
/// Anonymous callers see public rows only.
///
/// GET /api/data
pub async fn get_data(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<DashboardResponse>> {
    let catalog = catalog_of(state.store.as_ref())?;

    let nav = catalog.load_dashboard(caller.is_user()).await?;
    let config = catalog.settings().await?;

    Ok(Json(DashboardResponse { nav, config }))
}

/// Count a click on a link
///
/// Always answers ok so that click tracking never disturbs navigation.
///
/// POST /api/visit
pub async fn record_visit(
    State(state): State<AppState>,
    Json(payload): Json<VisitRequest>,
) -> Result<Json<Value>> {
    let Some(catalog) = state.store.catalog() else {
        tracing::debug!("Visit ignored: {:?} store keeps no counters", state.store.backend());
        return Ok(Json(json!({ "status": "ok" })));
    };

    if let Some(id) = payload.id {
        match catalog.record_visit(id).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Visit for unknown link {}", id),
            Err(e) => tracing::warn!("Failed to record visit for link {}: {}", id, e),
        }
    }

    Ok(Json(json!({ "status": "ok" })))
}
