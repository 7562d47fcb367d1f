use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::Caller;
use crate::db::catalog_of;
use crate::error::Result;
use crate::import::{export_document, BulkImporter};
use crate::models::{ExportDocument, ImportPayload, ImportReport};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ImportReport,
}

/// Bulk import groups of links (root only)
///
/// Accepts a bare list of groups or a document produced by `/api/export`.
///
/// POST /api/import
pub async fn import_data(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<ImportPayload>,
) -> Result<Json<ImportResponse>> {
    caller.require_root()?;
    let catalog = catalog_of(state.store.as_ref())?;

    let report = BulkImporter::new(catalog, state.config.import_chunk_size)
        .import(payload.into_groups())
        .await?;

    Ok(Json(ImportResponse {
        success: true,
        report,
    }))
}

/// Export every category and link, private ones included (root only)
///
/// GET /api/export
pub async fn export_data(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ExportDocument>> {
    caller.require_root()?;
    let dashboard = catalog_of(state.store.as_ref())?
        .load_dashboard(true)
        .await?;

    Ok(Json(export_document(dashboard)))
}
