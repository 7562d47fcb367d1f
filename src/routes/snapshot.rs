use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::db::snapshots_of;
use crate::error::{AppError, Result};
use crate::models::{sanitize_groups, Snapshot, SnapshotGroup, WriteOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SnapshotWriteRequest {
    /// Version the client read and edited
    #[serde(alias = "base_ver", alias = "expected_version")]
    pub version: i64,
    pub data: Vec<SnapshotGroup>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotWriteResponse {
    pub success: bool,
    pub new_version: i64,
}

/// Whole dataset with the version a later write must quote
///
/// GET /api/snapshot
pub async fn read_snapshot(State(state): State<AppState>) -> Result<Json<Snapshot>> {
    let snapshot = snapshots_of(state.store.as_ref())?.read_snapshot().await?;
    Ok(Json(snapshot))
}

/// Replace the dataset if `version` is still current
///
/// On a version mismatch nothing is written and the 409 body carries the
/// sanitized pending data back so the client can keep it before reloading.
///
/// POST /api/snapshot
pub async fn write_snapshot(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<SnapshotWriteRequest>,
) -> Result<Json<SnapshotWriteResponse>> {
    caller.require_user()?;
    let repo = snapshots_of(state.store.as_ref())?;

    let data = sanitize_groups(payload.data);
    match repo.write_snapshot(data, payload.version).await? {
        WriteOutcome::Committed { new_version } => Ok(Json(SnapshotWriteResponse {
            success: true,
            new_version,
        })),
        WriteOutcome::Conflict {
            current_version,
            pending,
        } => Err(AppError::Conflict {
            current_version,
            pending,
        }),
    }
}
