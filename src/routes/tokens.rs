use axum::{extract::State, Json};
use serde::Deserialize;

use super::{ChangesResponse, IdRequest};
use crate::auth::Caller;
use crate::constants::MAX_TITLE_CHARS;
use crate::db::tokens_of;
use crate::error::{AppError, Result};
use crate::models::{CreatedToken, Token};
use crate::security::{generate_token, hash_token};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
}

/// GET /api/tokens
pub async fn list_tokens(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Token>>> {
    caller.require_root()?;
    let tokens = tokens_of(state.store.as_ref())?.list_tokens().await?;
    Ok(Json(tokens))
}

/// Issue a new API token
///
/// The plaintext is in this response only; the store keeps its salted hash.
///
/// POST /api/token/create
pub async fn create_token(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<Json<CreatedToken>> {
    caller.require_root()?;

    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "Token name must be 1 to {} characters",
            MAX_TITLE_CHARS
        )));
    }

    let token = generate_token();
    let stored = tokens_of(state.store.as_ref())?
        .create_token(name, &hash_token(&token, &state.config.token_salt))
        .await?;

    Ok(Json(CreatedToken {
        id: stored.id,
        name: stored.name,
        token,
    }))
}

/// POST /api/token/delete
pub async fn delete_token(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<IdRequest>,
) -> Result<Json<ChangesResponse>> {
    caller.require_root()?;

    if !tokens_of(state.store.as_ref())?
        .delete_token(payload.id)
        .await?
    {
        return Err(AppError::NotFound(format!("token {}", payload.id)));
    }

    tracing::info!("API token {} revoked", payload.id);
    Ok(Json(ChangesResponse::ok(1)))
}
