//! What-if scenarios: stored deltas plus ad-hoc simulation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db;
use crate::finance::{self, Baseline, ScenarioDeltas, ScenarioImpact};
use crate::models::{Scenario, ScenarioInput};

/// A scenario with its effect on the latest month's runway. `impact` is
/// `None` until the user has at least one financial record.
#[derive(Serialize)]
pub struct ScenarioView {
    #[serde(flatten)]
    pub scenario: Scenario,
    pub impact: Option<ScenarioImpact>,
}

fn latest_baseline(conn: &Connection, user_id: &Uuid) -> Result<Option<Baseline>, ApiError> {
    Ok(db::latest_financial_record(conn, user_id)?
        .as_ref()
        .map(Baseline::from_record))
}

fn view(scenario: Scenario, baseline: Option<&Baseline>) -> ScenarioView {
    let impact = baseline.map(|b| finance::simulate(b, &ScenarioDeltas::from(&scenario)));
    ScenarioView { scenario, impact }
}

fn validate_deltas(deltas: &ScenarioDeltas) -> Result<(), ApiError> {
    let finite = deltas.expense_change.is_finite()
        && deltas.revenue_change.is_finite()
        && deltas.cash_injection.is_finite();
    if !finite {
        return Err(ApiError::BadRequest("Scenario changes must be numbers".into()));
    }
    Ok(())
}

fn validate_input(input: &mut ScenarioInput) -> Result<(), ApiError> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(ApiError::BadRequest("Scenario name is required".into()));
    }
    input.description = input
        .description
        .take()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    validate_deltas(&ScenarioDeltas::from(&*input))
}

/// `GET /scenarios` — newest first, each with its runway impact.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<Vec<ScenarioView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let baseline = latest_baseline(&conn, &caller.user_id)?;
    let views = db::list_scenarios(&conn, &caller.user_id)?
        .into_iter()
        .map(|s| view(s, baseline.as_ref()))
        .collect();
    Ok(Json(views))
}

/// `POST /scenarios`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(mut input): Json<ScenarioInput>,
) -> Result<(StatusCode, Json<ScenarioView>), ApiError> {
    validate_input(&mut input)?;
    let conn = ctx.core.open_db()?;
    let scenario = db::insert_scenario(&conn, &caller.user_id, &input)?;
    tracing::info!(user_id = %caller.user_id, scenario_id = %scenario.id, "Scenario created");
    let baseline = latest_baseline(&conn, &caller.user_id)?;
    Ok((StatusCode::CREATED, Json(view(scenario, baseline.as_ref()))))
}

/// `GET /scenarios/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<ScenarioView>, ApiError> {
    let id = parse_id(&id, "scenario")?;
    let conn = ctx.core.open_db()?;
    let scenario = db::get_scenario(&conn, &caller.user_id, &id)?
        .ok_or_else(|| ApiError::NotFound("Scenario not found".into()))?;
    let baseline = latest_baseline(&conn, &caller.user_id)?;
    Ok(Json(view(scenario, baseline.as_ref())))
}

/// `PUT /scenarios/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Json(mut input): Json<ScenarioInput>,
) -> Result<Json<ScenarioView>, ApiError> {
    let id = parse_id(&id, "scenario")?;
    validate_input(&mut input)?;
    let conn = ctx.core.open_db()?;
    let scenario = db::update_scenario(&conn, &caller.user_id, &id, &input)?
        .ok_or_else(|| ApiError::NotFound("Scenario not found".into()))?;
    let baseline = latest_baseline(&conn, &caller.user_id)?;
    Ok(Json(view(scenario, baseline.as_ref())))
}

/// `DELETE /scenarios/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "scenario")?;
    let conn = ctx.core.open_db()?;
    if db::delete_scenario(&conn, &caller.user_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Scenario not found".into()))
    }
}

/// `POST /scenarios/simulate` — impact of unsaved deltas.
pub async fn simulate(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(deltas): Json<ScenarioDeltas>,
) -> Result<Json<ScenarioImpact>, ApiError> {
    validate_deltas(&deltas)?;
    let conn = ctx.core.open_db()?;
    let baseline = latest_baseline(&conn, &caller.user_id)?.ok_or_else(|| {
        ApiError::BadRequest("Add a financial record before running scenarios".into())
    })?;
    Ok(Json(finance::simulate(&baseline, &deltas)))
}
