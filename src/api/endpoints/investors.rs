//! Investor directory and LLM-scored matching under `/ai/match`.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{blocking, require_llm};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::investors::matching::{self, MatchRequest};
use crate::investors::{DirectoryQuery, FilterOptions, SortOrder, DEFAULT_PAGE_SIZE};
use crate::models::InvestorMatch;

#[derive(Serialize)]
pub struct MatchResponse {
    pub status: &'static str,
    pub top_investors: Vec<InvestorMatch>,
}

/// `POST /ai/match/investors`
pub async fn match_investors(
    State(ctx): State<ApiContext>,
    Json(body): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    if body.startup_description.trim().is_empty() {
        return Err(ApiError::BadRequest("startup_description is required".into()));
    }
    if !body.raise_amount.is_finite() || body.raise_amount <= 0.0 {
        return Err(ApiError::BadRequest("raise_amount must be positive".into()));
    }
    if body.stage.trim().is_empty() {
        return Err(ApiError::BadRequest("stage is required".into()));
    }
    require_llm(&ctx)?;

    let top_investors = blocking(move || {
        let llm = ctx.core.llm();
        Ok(matching::match_investors(llm.as_ref(), &ctx.core.investors, &body)?)
    })
    .await?;
    tracing::info!(matches = top_investors.len(), "Investor matching complete");

    Ok(Json(MatchResponse {
        status: "success",
        top_investors,
    }))
}

/// `GET /ai/match/filter-options`
pub async fn filter_options(State(ctx): State<ApiContext>) -> Json<FilterOptions> {
    Json(ctx.core.investors.filter_options())
}

#[derive(Deserialize)]
pub struct DirectoryParams {
    pub stage: Option<String>,
    pub hq: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Serialize)]
pub struct DirectoryResponse {
    pub status: &'static str,
    pub investors: Vec<InvestorMatch>,
    pub total: usize,
}

/// `GET /ai/match/all?stage=&hq=&sort_by=&limit=&skip=`
pub async fn directory(
    State(ctx): State<ApiContext>,
    Query(params): Query<DirectoryParams>,
) -> Json<DirectoryResponse> {
    let query = DirectoryQuery {
        stage: params.stage,
        hq: params.hq,
        sort: SortOrder::from_param(params.sort_by.as_deref()),
        skip: params.skip.unwrap_or(0),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    };
    let page = ctx.core.investors.directory(&query);
    Json(DirectoryResponse {
        status: "success",
        investors: page.investors,
        total: page.total,
    })
}
