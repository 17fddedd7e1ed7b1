//! AI advisor endpoints: strategy ideas, CFO chat and the executive report.
//!
//! Every handler checks the LLM is configured before touching the
//! database, then runs the model call on the blocking pool.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{blocking, require_llm};
use crate::ai::cfo::{self, DEFAULT_COMPANY_DESCRIPTION};
use crate::ai::strategy::{self, StrategySuggestion};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::{self, now};
use crate::investors::matching::{self, MatchRequest};
use crate::models::Idea;

/// Longest chat message accepted.
const MAX_MESSAGE_CHARS: usize = 4_000;
const MAX_CONTEXT_MONTHS: u32 = 60;

// ═══════════════════════════════════════════════════════════
// Strategy ideas
// ═══════════════════════════════════════════════════════════

#[derive(Deserialize, Default)]
pub struct StrategyRequest {
    pub context: Option<String>,
}

#[derive(Serialize)]
pub struct StrategyResponse {
    pub suggestions: Vec<StrategySuggestion>,
    /// The same suggestions as stored ideas.
    pub ideas: Vec<Idea>,
}

/// `POST /ai/suggest-strategy` — generate ideas and keep them.
pub async fn suggest_strategy(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    body: Option<Json<StrategyRequest>>,
) -> Result<Json<StrategyResponse>, ApiError> {
    require_llm(&ctx)?;
    let context = body
        .and_then(|Json(b)| b.context)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let (request, user_id) = {
        let conn = ctx.core.open_db()?;
        let latest = db::latest_financial_record(&conn, &caller.user_id)?;
        let founder = db::get_user(&conn, &caller.user_id)?.and_then(|u| u.full_name);
        let request = strategy::build_strategy_request(
            context.as_deref(),
            &strategy::financial_summary(latest.as_ref()),
            founder.as_deref(),
        );
        (request, caller.user_id)
    };

    let llm = ctx.core.llm();
    let suggestions =
        blocking(move || Ok(strategy::suggest_strategies(llm.as_ref(), &request)?)).await?;

    let created_at = now();
    let ideas: Vec<Idea> = suggestions
        .iter()
        .map(|s| Idea {
            id: Uuid::new_v4(),
            user_id,
            title: s.title.clone(),
            description: s.description.clone(),
            feasibility_score: s.impact_score,
            difficulty: s.difficulty,
            context: context.clone(),
            created_at,
        })
        .collect();

    let mut conn = ctx.core.open_db()?;
    db::insert_ideas(&mut conn, &ideas)?;
    tracing::info!(user_id = %user_id, count = ideas.len(), "Strategy ideas stored");

    Ok(Json(StrategyResponse { suggestions, ideas }))
}

// ═══════════════════════════════════════════════════════════
// CFO chat
// ═══════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct ChatBody {
    pub message: String,
    #[serde(default = "default_context_months")]
    pub context_months: u32,
}

fn default_context_months() -> u32 {
    cfo::DEFAULT_CONTEXT_MONTHS
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `POST /ai/chat` — answer with the user's books in the prompt, plus
/// investor matches when the question is about fundraising.
pub async fn chat(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    require_llm(&ctx)?;
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message is longer than {MAX_MESSAGE_CHARS} characters"
        )));
    }
    let months = body.context_months.clamp(1, MAX_CONTEXT_MONTHS);

    let (records, description) = {
        let conn = ctx.core.open_db()?;
        let records = db::recent_financial_records(&conn, &caller.user_id, months as usize)?;
        let description = db::get_startup_profile(&conn, &caller.user_id)?
            .and_then(|p| p.description)
            .filter(|d| !d.trim().is_empty());
        (records, description)
    };

    let user_id = caller.user_id;
    let response = blocking(move || {
        let llm = ctx.core.llm();
        let latest = records.last();

        let investor_context = if cfo::wants_investors(&message) {
            let target = cfo::infer_raise(latest);
            tracing::info!(
                user_id = %user_id,
                raise_amount = target.amount,
                stage = target.stage,
                "Investor intent detected, running matcher"
            );
            let request = MatchRequest {
                startup_description: description
                    .unwrap_or_else(|| DEFAULT_COMPANY_DESCRIPTION.to_string()),
                raise_amount: target.amount,
                stage: target.stage.to_string(),
            };
            // A failed match degrades to a plain CFO answer.
            match matching::match_investors(llm.as_ref(), &ctx.core.investors, &request) {
                Ok(matches) => cfo::investor_context(&target, &matches),
                Err(e) => {
                    tracing::warn!(error = %e, "Investor matching failed during chat");
                    None
                }
            }
        } else {
            None
        };

        let request = cfo::build_chat_request(
            &message,
            months,
            &cfo::financial_context(&records),
            &cfo::runway_status_line(latest),
            investor_context.as_deref(),
        );
        Ok(llm.complete(&request)?)
    })
    .await?;

    Ok(Json(ChatResponse { response }))
}

// ═══════════════════════════════════════════════════════════
// Executive report
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct ReportResponse {
    pub report: String,
}

/// `POST /ai/report` — board update email from the last three months.
pub async fn report(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<ReportResponse>, ApiError> {
    require_llm(&ctx)?;
    let records = {
        let conn = ctx.core.open_db()?;
        db::recent_financial_records(&conn, &caller.user_id, cfo::REPORT_MONTHS)?
    };
    let request = cfo::build_report_request(&cfo::financial_context(&records));
    let llm = ctx.core.llm();
    let report = blocking(move || Ok(llm.complete(&request)?)).await?;
    tracing::info!(user_id = %caller.user_id, months = records.len(), "Executive report generated");
    Ok(Json(ReportResponse { report }))
}
