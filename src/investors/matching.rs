//! LLM-scored investor matching.
//!
//! Candidates are pre-filtered by cheque size and stage, then the model
//! scores each candidate's thesis against the pitch. The model only supplies
//! scores; names and links always come from the catalog.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::InvestorCatalog;
use crate::ai::prompt::parse_json_object;
use crate::ai::{AiError, ChatMessage, ChatRequest, LlmClient};
use crate::models::{Investor, InvestorMatch};

/// Raise amounts within this fraction of a cheque range still match.
pub const CHEQUE_TOLERANCE: f64 = 0.2;
pub const MAX_CANDIDATES: usize = 40;
pub const TOP_MATCHES: usize = 10;
const THESIS_PROMPT_CHARS: usize = 400;

const MATCHING_SYSTEM_PROMPT: &str = "You are an investor-relations analyst. Score how well each \
investor's thesis fits the startup, from 0.0 (no fit) to 1.0 (perfect fit). Use only the investor \
ids given. Respond only with JSON: {\"matches\": [{\"investor_id\": 12, \"score\": 0.83}]}";

#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub startup_description: String,
    pub raise_amount: f64,
    pub stage: String,
}

fn cheque_fits(investor: &Investor, raise_amount: f64) -> bool {
    let min_acceptable = raise_amount * (1.0 - CHEQUE_TOLERANCE);
    let max_acceptable = raise_amount * (1.0 + CHEQUE_TOLERANCE);
    investor.first_cheque_minimum.unwrap_or(0.0) <= max_acceptable
        && investor.first_cheque_maximum.unwrap_or(f64::MAX) >= min_acceptable
}

/// Cheque-size and stage filter; falls back to stage only when nothing fits
/// the cheque size. Capped at [`MAX_CANDIDATES`].
pub fn prefilter<'a>(catalog: &'a InvestorCatalog, raise_amount: f64, stage: &str) -> Vec<&'a Investor> {
    let by_stage: Vec<&Investor> = catalog
        .all()
        .iter()
        .filter(|i| i.invests_in_stage(stage))
        .collect();

    let by_cheque: Vec<&Investor> = by_stage
        .iter()
        .copied()
        .filter(|i| cheque_fits(i, raise_amount))
        .collect();

    let mut candidates = if by_cheque.is_empty() {
        tracing::debug!(raise_amount, stage, "No cheque-size match, falling back to stage only");
        by_stage
    } else {
        by_cheque
    };
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

pub fn build_matching_request(description: &str, candidates: &[&Investor]) -> ChatRequest {
    let mut prompt = format!("STARTUP:\n{}\n\nINVESTORS:\n", description.trim());
    for investor in candidates {
        let thesis: String = investor.investment_thesis.chars().take(THESIS_PROMPT_CHARS).collect();
        prompt.push_str(&format!(
            "- id {}: {} ({}; stages: {}) thesis: {}\n",
            investor.id,
            investor.name,
            investor.investor_type,
            investor.stage_of_investment,
            if thesis.is_empty() { "not stated" } else { thesis.as_str() },
        ));
    }
    ChatRequest::new(vec![
        ChatMessage::system(MATCHING_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ])
    .json()
}

/// Turn the model's scores into ranked matches. Unknown ids are dropped,
/// scores are clamped to [0, 1] and a repeated id keeps its best score.
pub fn rank_matches(raw: &str, candidates: &[&Investor]) -> Result<Vec<InvestorMatch>, AiError> {
    let value = parse_json_object(raw)?;
    let entries = value
        .get("matches")
        .and_then(Value::as_array)
        .ok_or_else(|| AiError::Malformed("missing \"matches\" list".into()))?;

    let by_id: HashMap<u32, &Investor> = candidates.iter().map(|i| (i.id, *i)).collect();
    let mut best: HashMap<u32, f64> = HashMap::new();
    for entry in entries {
        let Some(id) = entry.get("investor_id").and_then(Value::as_u64) else {
            continue;
        };
        let Some(score) = entry.get("score").and_then(Value::as_f64) else {
            continue;
        };
        let Ok(id) = u32::try_from(id) else { continue };
        if !by_id.contains_key(&id) || !score.is_finite() {
            continue;
        }
        let score = score.clamp(0.0, 1.0);
        best.entry(id)
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }

    let mut matches: Vec<InvestorMatch> = best
        .into_iter()
        .filter_map(|(id, score)| by_id.get(&id).map(|i| InvestorMatch::from_investor(i, score)))
        .collect();
    matches.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    matches.truncate(TOP_MATCHES);
    Ok(matches)
}

/// Full matching pass. No candidates means no LLM call and no matches.
pub fn match_investors(
    llm: &dyn LlmClient,
    catalog: &InvestorCatalog,
    request: &MatchRequest,
) -> Result<Vec<InvestorMatch>, AiError> {
    let candidates = prefilter(catalog, request.raise_amount, &request.stage);
    if candidates.is_empty() {
        tracing::info!(stage = %request.stage, "No investors match this stage");
        return Ok(Vec::new());
    }
    let raw = llm.complete(&build_matching_request(&request.startup_description, &candidates))?;
    rank_matches(&raw, &candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockLlmClient;
    use crate::investors::sample_catalog;

    fn request(raise_amount: f64, stage: &str) -> MatchRequest {
        MatchRequest {
            startup_description: "API-first billing for SaaS companies".into(),
            raise_amount,
            stage: stage.into(),
        }
    }

    #[test]
    fn prefilter_uses_cheque_range() {
        let catalog = sample_catalog();
        let ids: Vec<_> = prefilter(&catalog, 1_000_000.0, "Seed").iter().map(|i| i.id).collect();
        // Alpine caps at 200k; Mystery Fund has no cheque limits.
        assert_eq!(ids, vec![0, 3]);
    }

    #[test]
    fn prefilter_tolerance_is_twenty_percent() {
        let catalog = sample_catalog();
        // 240k * 0.8 = 192k <= Alpine's 200k maximum.
        let ids: Vec<_> = prefilter(&catalog, 240_000.0, "Pre-Seed").iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn prefilter_falls_back_to_stage() {
        let catalog = sample_catalog();
        let ids: Vec<_> = prefilter(&catalog, 50_000_000.0, "Series B").iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(prefilter(&catalog, 1.0, "Series Z").is_empty());
    }

    #[test]
    fn ranking_drops_unknown_ids_and_clamps() {
        let catalog = sample_catalog();
        let candidates = prefilter(&catalog, 1_000_000.0, "Seed");
        let raw = r#"{"matches": [
            {"investor_id": 3, "score": 0.4},
            {"investor_id": 0, "score": 1.7},
            {"investor_id": 2, "score": 0.99},
            {"investor_id": 3, "score": 0.6},
            {"investor_id": "x", "score": 0.5}
        ]}"#;
        let matches = rank_matches(raw, &candidates).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].investor_id, 0);
        assert_eq!(matches[0].match_score, 1.0);
        assert_eq!(matches[0].hq, "USA");
        assert_eq!(matches[1].match_score, 0.6);
    }

    #[test]
    fn unparseable_reply_is_malformed() {
        let catalog = sample_catalog();
        let candidates = prefilter(&catalog, 1_000_000.0, "Seed");
        assert!(matches!(
            rank_matches("I think Northwind", &candidates),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn no_candidates_skips_llm() {
        let mock = MockLlmClient::new("{}");
        let matches = match_investors(&mock, &sample_catalog(), &request(1.0, "Series Z")).unwrap();
        assert!(matches.is_empty());
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn prompt_lists_only_candidates() {
        let mock = MockLlmClient::new(r#"{"matches": [{"investor_id": 0, "score": 0.9}]}"#);
        let matches = match_investors(&mock, &sample_catalog(), &request(1_000_000.0, "Seed")).unwrap();
        assert_eq!(matches[0].name, "Northwind Capital");

        let prompt = &mock.requests()[0].messages[1].content;
        assert!(prompt.contains("id 0: Northwind Capital"));
        assert!(!prompt.contains("Harbor Growth"));
        assert!(prompt.contains("API-first billing"));
    }
}
