//! Endpoint handlers, one module per route group.
//!
//! Handlers open their own SQLite connection; LLM and other outbound HTTP
//! calls run on the blocking pool through [`blocking`].

pub mod ai;
pub mod auth;
pub mod financials;
pub mod health;
pub mod ideas;
pub mod investors;
pub mod notifications;
pub mod onboarding;
pub mod roadmaps;
pub mod scenarios;
pub mod startup;

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Run blocking work (PBKDF2, LLM calls, outbound HTTP) off the runtime.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {entity} ID: {raw}")))
}

/// Current UTC month as `YYYY-MM`.
pub(crate) fn current_month() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

/// Reject anything that is not a real `YYYY-MM` month.
pub(crate) fn validate_month(month: &str) -> Result<(), ApiError> {
    let valid = month.len() == 7
        && chrono::NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok();
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Month must be YYYY-MM, got '{month}'")))
    }
}

/// Fail fast with 503 before doing any database work for an AI endpoint.
pub(crate) fn require_llm(ctx: &ApiContext) -> Result<(), ApiError> {
    if ctx.core.llm().is_configured() {
        Ok(())
    } else {
        Err(ApiError::AiUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_validation() {
        assert!(validate_month("2024-03").is_ok());
        assert!(validate_month("2024-13").is_err());
        assert!(validate_month("2024-3").is_err());
        assert!(validate_month("March").is_err());
    }

    #[test]
    fn bad_id_is_400() {
        assert!(matches!(parse_id("nope", "scenario"), Err(ApiError::BadRequest(_))));
        assert!(parse_id(&Uuid::new_v4().to_string(), "scenario").is_ok());
    }

    #[tokio::test]
    async fn blocking_propagates_errors() {
        let result: Result<(), ApiError> =
            blocking(|| Err(ApiError::NotFound("x".into()))).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
