use axum::{extract::State, Json};
use serde::Deserialize;

use super::category::ReorderResponse;
use super::{ChangesResponse, DataResponse, IdRequest};
use crate::auth::Caller;
use crate::db::catalog_of;
use crate::error::{AppError, Result};
use crate::models::{Link, LinkPatch, NewLink};
use crate::ordering::{LinkMove, OrderScope, ReorderItem};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub id: i64,
    #[serde(flatten)]
    pub patch: LinkPatch,
}

/// Link reorder body
///
/// Either one category's links (`{category_id, items}`), where ids from other
/// categories are skipped, or a bare list of moves that may change category.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LinkReorderRequest {
    Scoped {
        category_id: i64,
        items: Vec<ReorderItem>,
    },
    Moves(Vec<LinkMove>),
}

/// Append a link to the end of its category
///
/// POST /api/link
pub async fn create_link(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<NewLink>,
) -> Result<Json<DataResponse<Link>>> {
    caller.require_user()?;
    let link = payload.validated()?;

    let created = catalog_of(state.store.as_ref())?.create_link(&link).await?;
    Ok(Json(DataResponse::ok(created)))
}

/// Change only the supplied fields of a link
///
/// POST /api/link/update
pub async fn update_link(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<ChangesResponse>> {
    caller.require_user()?;
    let patch = payload.patch.validated()?;
    if patch.fields().is_empty() {
        return Ok(Json(ChangesResponse::ok(0)));
    }

    let changes = catalog_of(state.store.as_ref())?
        .update_link(payload.id, &patch)
        .await?;
    if changes == 0 {
        return Err(AppError::NotFound(format!("link {}", payload.id)));
    }

    Ok(Json(ChangesResponse::ok(changes)))
}

/// POST /api/link/delete
pub async fn delete_link(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<IdRequest>,
) -> Result<Json<ChangesResponse>> {
    caller.require_user()?;

    let changes = catalog_of(state.store.as_ref())?
        .delete_link(payload.id)
        .await?;
    if changes == 0 {
        return Err(AppError::NotFound(format!("link {}", payload.id)));
    }

    Ok(Json(ChangesResponse::ok(changes)))
}

/// Apply a client-computed link order, optionally moving links between categories
///
/// POST /api/link/reorder
pub async fn reorder_links(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<LinkReorderRequest>,
) -> Result<Json<ReorderResponse>> {
    caller.require_user()?;
    let catalog = catalog_of(state.store.as_ref())?;

    let outcome = match payload {
        LinkReorderRequest::Scoped { category_id, items } => {
            catalog
                .reorder(OrderScope::Links { category_id }, &items)
                .await?
        }
        LinkReorderRequest::Moves(moves) => catalog.reorder_with_scope_change(&moves).await?,
    };

    Ok(Json(ReorderResponse {
        success: true,
        outcome,
    }))
}
