//! Execution roadmaps: generate, browse, tick off tasks, export.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::{blocking, parse_id, require_llm};
use crate::ai::roadmap::{self, RoadmapRequest};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db;
use crate::finance::Baseline;
use crate::models::Roadmap;

#[derive(Serialize)]
pub struct RoadmapView {
    #[serde(flatten)]
    pub roadmap: Roadmap,
    /// Completed tasks over all tasks, 0.0 to 1.0.
    pub progress: f64,
}

impl From<Roadmap> for RoadmapView {
    fn from(roadmap: Roadmap) -> Self {
        let progress = roadmap.progress();
        Self { roadmap, progress }
    }
}

#[derive(Deserialize)]
pub struct GenerateRoadmapBody {
    #[serde(flatten)]
    pub request: RoadmapRequest,
    pub user_context: Option<String>,
}

/// `GET /roadmaps` — newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<Vec<RoadmapView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let roadmaps = db::list_roadmaps(&conn, &caller.user_id)?;
    Ok(Json(roadmaps.into_iter().map(RoadmapView::from).collect()))
}

/// `POST /roadmaps` — generate a plan for a strategy and store it.
///
/// With an `idea_id` the idea's title and description fill in whatever the
/// body leaves blank. Missing runway and team size come from the user's
/// latest month and startup profile.
pub async fn generate(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(body): Json<GenerateRoadmapBody>,
) -> Result<(StatusCode, Json<RoadmapView>), ApiError> {
    require_llm(&ctx)?;
    let GenerateRoadmapBody {
        mut request,
        user_context,
    } = body;

    {
        let conn = ctx.core.open_db()?;
        if let Some(idea_id) = request.idea_id {
            let idea = db::get_idea(&conn, &caller.user_id, &idea_id)?
                .ok_or_else(|| ApiError::NotFound("Idea not found".into()))?;
            if request.strategy_title.trim().is_empty() {
                request.strategy_title = idea.title;
            }
            if request.strategy_description.trim().is_empty() {
                request.strategy_description = idea.description;
            }
        }
        if request.available_runway_months.is_none() {
            request.available_runway_months = db::latest_financial_record(&conn, &caller.user_id)?
                .and_then(|r| Baseline::from_record(&r).runway().months());
        }
        if request.team_size.is_none() {
            request.team_size =
                db::get_startup_profile(&conn, &caller.user_id)?.map(|p| p.team_size);
        }
    }

    request.strategy_title = request.strategy_title.trim().to_string();
    if request.strategy_title.is_empty() {
        return Err(ApiError::BadRequest("strategy_title is required".into()));
    }

    let chat = roadmap::build_roadmap_request(&request, user_context.as_deref());
    let llm = ctx.core.llm();
    let fallback_title = format!("{} Roadmap", request.strategy_title);
    let generated =
        blocking(move || Ok(roadmap::parse_roadmap(&llm.complete(&chat)?, &fallback_title)?))
            .await?;

    let roadmap = generated.into_roadmap(caller.user_id, &request);
    let conn = ctx.core.open_db()?;
    db::insert_roadmap(&conn, &roadmap)?;
    tracing::info!(
        user_id = %caller.user_id,
        roadmap_id = %roadmap.id,
        phases = roadmap.phases.len(),
        "Roadmap generated"
    );
    Ok((StatusCode::CREATED, Json(roadmap.into())))
}

/// `GET /roadmaps/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<RoadmapView>, ApiError> {
    let id = parse_id(&id, "roadmap")?;
    let conn = ctx.core.open_db()?;
    db::get_roadmap(&conn, &caller.user_id, &id)?
        .map(|r| Json(r.into()))
        .ok_or_else(|| ApiError::NotFound("Roadmap not found".into()))
}

/// `DELETE /roadmaps/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "roadmap")?;
    let conn = ctx.core.open_db()?;
    if db::delete_roadmap(&conn, &caller.user_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Roadmap not found".into()))
    }
}

/// `GET /roadmaps/:id/export` — Markdown download.
pub async fn export(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "roadmap")?;
    let conn = ctx.core.open_db()?;
    let roadmap = db::get_roadmap(&conn, &caller.user_id, &id)?
        .ok_or_else(|| ApiError::NotFound("Roadmap not found".into()))?;

    let disposition = format!("attachment; filename=\"roadmap-{}.md\"", roadmap.id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        roadmap::export_markdown(&roadmap),
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct TaskUpdate {
    pub is_completed: bool,
}

/// `PATCH /roadmaps/:id/tasks/:task_id`
pub async fn update_task(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path((id, task_id)): Path<(String, String)>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<RoadmapView>, ApiError> {
    let id = parse_id(&id, "roadmap")?;
    let conn = ctx.core.open_db()?;
    let mut roadmap = db::get_roadmap(&conn, &caller.user_id, &id)?
        .ok_or_else(|| ApiError::NotFound("Roadmap not found".into()))?;
    if !roadmap.set_task_completed(&task_id, update.is_completed) {
        return Err(ApiError::NotFound(format!("Task {task_id} not found")));
    }
    db::save_roadmap_phases(&conn, &roadmap)?;
    Ok(Json(roadmap.into()))
}
