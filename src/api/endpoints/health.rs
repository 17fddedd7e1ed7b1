use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub ai_configured: bool,
    pub investors_loaded: usize,
    pub uptime_secs: u64,
}

/// `GET /api/v1/health` — liveness, no auth.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        service: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
        ai_configured: ctx.core.llm().is_configured(),
        investors_loaded: ctx.core.investors.len(),
        uptime_secs: ctx.core.uptime_secs(),
    }))
}
