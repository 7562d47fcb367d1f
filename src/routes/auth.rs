use axum::Json;
use serde::Serialize;

use crate::auth::{Caller, Role};
use crate::error::Result;
use crate::security::now_ms;

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    pub role: Role,
    pub timestamp: i64,
}

/// Confirm the presented credential and report its role
///
/// GET /api/auth/verify
pub async fn verify(caller: Caller) -> Result<Json<VerifyResponse>> {
    caller.require_user()?;

    Ok(Json(VerifyResponse {
        status: "ok",
        role: caller.role,
        timestamp: now_ms(),
    }))
}
