//! Stored strategy ideas.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db;
use crate::models::Idea;

/// `GET /ideas` — newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<Vec<Idea>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_ideas(&conn, &caller.user_id)?))
}

/// `GET /ideas/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Idea>, ApiError> {
    let id = parse_id(&id, "idea")?;
    let conn = ctx.core.open_db()?;
    db::get_idea(&conn, &caller.user_id, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Idea not found".into()))
}

/// `DELETE /ideas/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "idea")?;
    let conn = ctx.core.open_db()?;
    if db::delete_idea(&conn, &caller.user_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Idea not found".into()))
    }
}
