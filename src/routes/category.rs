use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{ChangesResponse, DataResponse};
use crate::auth::Caller;
use crate::db::catalog_of;
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryPatch, NewCategory};
use crate::ordering::{OrderScope, ReorderItem, ReorderOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub id: i64,
    #[serde(flatten)]
    pub patch: CategoryPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCategoryRequest {
    pub id: i64,
    /// Also delete the category's links
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: ReorderOutcome,
}

/// Append a category to the end of the list
///
/// POST /api/category
pub async fn create_category(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<NewCategory>,
) -> Result<Json<DataResponse<Category>>> {
    caller.require_user()?;
    let category = payload.validated()?;

    let created = catalog_of(state.store.as_ref())?
        .create_category(&category)
        .await?;
    Ok(Json(DataResponse::ok(created)))
}

/// Change only the supplied fields of a category
///
/// POST /api/category/update
pub async fn update_category(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<ChangesResponse>> {
    caller.require_user()?;
    let patch = payload.patch.validated()?;
    if patch.fields().is_empty() {
        return Ok(Json(ChangesResponse::ok(0)));
    }

    let changes = catalog_of(state.store.as_ref())?
        .update_category(payload.id, &patch)
        .await?;
    if changes == 0 {
        return Err(AppError::NotFound(format!("category {}", payload.id)));
    }

    Ok(Json(ChangesResponse::ok(changes)))
}

/// Delete a category; refused while it still owns links unless `cascade`
///
/// POST /api/category/delete
pub async fn delete_category(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<DeleteCategoryRequest>,
) -> Result<Json<ChangesResponse>> {
    caller.require_user()?;

    let changes = catalog_of(state.store.as_ref())?
        .delete_category(payload.id, payload.cascade)
        .await?;
    if changes == 0 {
        return Err(AppError::NotFound(format!("category {}", payload.id)));
    }

    tracing::info!("Category {} deleted by {}", payload.id, caller.identity);
    Ok(Json(ChangesResponse::ok(changes)))
}

/// Apply a client-computed category order
///
/// POST /api/category/reorder with `[{id, sort_order}, ...]`
pub async fn reorder_categories(
    State(state): State<AppState>,
    caller: Caller,
    Json(items): Json<Vec<ReorderItem>>,
) -> Result<Json<ReorderResponse>> {
    caller.require_user()?;

    let outcome = catalog_of(state.store.as_ref())?
        .reorder(OrderScope::Categories, &items)
        .await?;
    Ok(Json(ReorderResponse {
        success: true,
        outcome,
    }))
}
