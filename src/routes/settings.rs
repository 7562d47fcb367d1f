use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::db::catalog_of;
use crate::error::{AppError, Result};
use crate::AppState;

/// Longest accepted settings key
const MAX_SETTING_KEY_CHARS: usize = 64;

/// Public site settings
#[derive(Debug, Serialize)]
pub struct PublicConfig {
    pub title: String,
    pub bg_image: String,
    pub allow_search: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SettingRequest {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Stored settings over the process defaults
///
/// The snapshot backend has no settings table, so only defaults apply there.
///
/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Result<Json<PublicConfig>> {
    let stored = match state.store.catalog() {
        Some(catalog) => catalog.settings().await?,
        None => Default::default(),
    };

    let title = stored
        .get("title")
        .filter(|t| !t.is_empty())
        .cloned()
        .unwrap_or_else(|| state.config.site_title.clone());

    Ok(Json(PublicConfig {
        title,
        bg_image: stored.get("bg_image").cloned().unwrap_or_default(),
        allow_search: stored.get("allow_search").map(String::as_str) != Some("false"),
    }))
}

/// Set one site setting (root only)
///
/// POST /api/config with `{key, value}`
pub async fn update_config(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<SettingRequest>,
) -> Result<Json<SettingRequest>> {
    caller.require_root()?;

    let key = payload.key.trim();
    if key.is_empty() || key.chars().count() > MAX_SETTING_KEY_CHARS {
        return Err(AppError::Validation(format!(
            "Setting key must be 1 to {} characters",
            MAX_SETTING_KEY_CHARS
        )));
    }

    catalog_of(state.store.as_ref())?
        .put_setting(key, &payload.value)
        .await?;
    tracing::info!("Setting {} updated", key);

    Ok(Json(SettingRequest {
        key: key.to_string(),
        value: payload.value,
    }))
}
