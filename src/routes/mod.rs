pub mod auth;
pub mod category;
pub mod data;
pub mod health;
pub mod link;
pub mod settings;
pub mod snapshot;
pub mod tokens;
pub mod transfer;

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

pub use health::health_check;

use crate::AppState;

/// Body of endpoints addressing one row
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: i64,
}

/// Success envelope carrying a payload
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Success envelope for updates and deletes
#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub success: bool,
    pub changes: u64,
}

impl ChangesResponse {
    pub fn ok(changes: u64) -> Self {
        Self {
            success: true,
            changes,
        }
    }
}

/// All API routes; layers (CORS, tracing) are added by the caller
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/data", get(data::get_data))
        .route("/api/visit", post(data::record_visit))
        .route("/api/category", post(category::create_category))
        .route("/api/category/update", post(category::update_category))
        .route("/api/category/delete", post(category::delete_category))
        .route("/api/category/reorder", post(category::reorder_categories))
        .route("/api/link", post(link::create_link))
        .route("/api/link/update", post(link::update_link))
        .route("/api/link/delete", post(link::delete_link))
        .route("/api/link/reorder", post(link::reorder_links))
        .route("/api/import", post(transfer::import_data))
        .route("/api/export", get(transfer::export_data))
        .route("/api/tokens", get(tokens::list_tokens))
        .route("/api/token/create", post(tokens::create_token))
        .route("/api/token/delete", post(tokens::delete_token))
        .route(
            "/api/config",
            get(settings::get_config).post(settings::update_config),
        )
        .route(
            "/api/snapshot",
            get(snapshot::read_snapshot).post(snapshot::write_snapshot),
        )
        .with_state(state)
}
