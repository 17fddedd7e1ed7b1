//! Monthly financial records, dashboard metrics and cash projection.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::{parse_id, validate_month};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::{self, DatabaseError};
use crate::finance::{self, Baseline, DashboardMetrics, ProjectionPoint};
use crate::models::{FinancialRecord, FinancialRecordInput};

const DEFAULT_PROJECTION_MONTHS: u32 = 12;

fn validate_input(input: &FinancialRecordInput) -> Result<(), ApiError> {
    validate_month(&input.month)?;
    let amounts = [
        ("revenue_recurring", input.revenue_recurring),
        ("revenue_one_time", input.revenue_one_time),
        ("expenses_salaries", input.expenses_salaries),
        ("expenses_marketing", input.expenses_marketing),
        ("expenses_infrastructure", input.expenses_infrastructure),
        ("expenses_other", input.expenses_other),
    ];
    for (name, value) in amounts {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::BadRequest(format!("{name} must be a non-negative number")));
        }
    }
    if !input.cash_balance.is_finite() {
        return Err(ApiError::BadRequest("cash_balance must be a number".into()));
    }
    Ok(())
}

fn month_conflict(err: DatabaseError, month: &str) -> ApiError {
    if err.is_unique_violation() {
        ApiError::Conflict(format!("A record for {month} already exists"))
    } else {
        err.into()
    }
}

/// `GET /financials` — every month, oldest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<Vec<FinancialRecord>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_financial_records(&conn, &caller.user_id)?))
}

/// `POST /financials` — create the month or replace it.
pub async fn upsert(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(input): Json<FinancialRecordInput>,
) -> Result<(StatusCode, Json<FinancialRecord>), ApiError> {
    validate_input(&input)?;
    let conn = ctx.core.open_db()?;
    let record = db::upsert_financial_record(&conn, &caller.user_id, &input)?;
    tracing::info!(user_id = %caller.user_id, month = %record.month, "Financial record saved");
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /financials/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<FinancialRecord>, ApiError> {
    let id = parse_id(&id, "record")?;
    let conn = ctx.core.open_db()?;
    db::get_financial_record(&conn, &caller.user_id, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Financial record not found".into()))
}

/// `PUT /financials/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<FinancialRecordInput>,
) -> Result<Json<FinancialRecord>, ApiError> {
    let id = parse_id(&id, "record")?;
    validate_input(&input)?;
    let conn = ctx.core.open_db()?;
    db::update_financial_record(&conn, &caller.user_id, &id, &input)
        .map_err(|e| month_conflict(e, &input.month))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Financial record not found".into()))
}

/// `DELETE /financials/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "record")?;
    let conn = ctx.core.open_db()?;
    if db::delete_financial_record(&conn, &caller.user_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Financial record not found".into()))
    }
}

/// `GET /financials/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<DashboardMetrics>, ApiError> {
    let conn = ctx.core.open_db()?;
    let records = db::list_financial_records(&conn, &caller.user_id)?;
    let settings = db::get_user_settings(&conn, &caller.user_id)?.unwrap_or_default();
    Ok(Json(finance::dashboard_metrics(records, &settings)))
}

#[derive(Deserialize)]
pub struct ProjectionQuery {
    pub months: Option<u32>,
}

#[derive(Serialize)]
pub struct ProjectionResponse {
    /// Month the projection starts from; `None` without data.
    pub baseline_month: Option<String>,
    pub burn_rate: f64,
    pub runway_months: Option<f64>,
    pub points: Vec<ProjectionPoint>,
}

/// `GET /financials/projection?months=N` — cash curve from the latest month.
pub async fn projection(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<ProjectionResponse>, ApiError> {
    let months = query.months.unwrap_or(DEFAULT_PROJECTION_MONTHS);
    if months == 0 || months > finance::MAX_PROJECTION_MONTHS {
        return Err(ApiError::BadRequest(format!(
            "months must be between 1 and {}",
            finance::MAX_PROJECTION_MONTHS
        )));
    }

    let conn = ctx.core.open_db()?;
    let Some(latest) = db::latest_financial_record(&conn, &caller.user_id)? else {
        return Ok(Json(ProjectionResponse {
            baseline_month: None,
            burn_rate: 0.0,
            runway_months: None,
            points: Vec::new(),
        }));
    };

    let baseline = Baseline::from_record(&latest);
    Ok(Json(ProjectionResponse {
        points: finance::project_cash(&baseline, &latest.month, months),
        burn_rate: finance::round2(baseline.burn()),
        runway_months: baseline.runway().months().map(finance::round2),
        baseline_month: Some(latest.month),
    }))
}
