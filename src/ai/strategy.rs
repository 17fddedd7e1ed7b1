use serde::Serialize;
use serde_json::Value;

use super::prompt::{format_money, parse_json_object, str_field, u64_field};
use super::{AiError, ChatMessage, ChatRequest, LlmClient};
use crate::finance::Baseline;
use crate::models::enums::Difficulty;
use crate::models::FinancialRecord;

pub const STRATEGY_TEMPERATURE: f32 = 0.7;

const STRATEGY_SYSTEM_PROMPT: &str = "You are an expert startup strategy advisor. Always provide \
detailed, actionable advice with specific steps and expected outcomes. Respond only in valid JSON format.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySuggestion {
    pub title: String,
    pub description: String,
    /// 1-10.
    pub impact_score: u8,
    pub difficulty: Difficulty,
}

/// Plain-text snapshot of the latest month for the prompt.
pub fn financial_summary(latest: Option<&FinancialRecord>) -> String {
    let Some(record) = latest else {
        return "No financial data available yet. Assume early-stage startup.".to_string();
    };
    let baseline = Baseline::from_record(record);
    let runway = match baseline.runway().months() {
        Some(m) => format!("{m:.1} months"),
        None => "Sustainable (revenue covers expenses)".to_string(),
    };
    format!(
        "Cash Balance: {}\nMonthly Revenue: {}\nMonthly Expenses: {}\nMonthly Burn Rate: {}\nRunway: {runway}\n",
        format_money(baseline.cash),
        format_money(baseline.revenue),
        format_money(baseline.expenses),
        format_money(baseline.burn()),
    )
}

pub fn build_strategy_request(
    situation: Option<&str>,
    financial_summary: &str,
    founder_name: Option<&str>,
) -> ChatRequest {
    let situation = situation
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("USER'S CURRENT SITUATION:\n{s}\n\n"))
        .unwrap_or_default();
    let founder = founder_name.unwrap_or("Startup Founder");

    let prompt = format!(
        r#"You are a veteran startup advisor and turnaround expert known for ruthless prioritization and financial discipline.

FINANCIAL SUMMARY:
{situation}FINANCIAL DATA:
{financial_summary}

STARTUP CONTEXT:
Founder: {founder}.

1. Analyze the financial health first (runway = cash / burn).
   - If runway < 6 months: prioritize survival, cost-cutting and immediate revenue.
   - If runway > 12 months: prioritize aggressive scaling and market capture.
2. Generate 3-4 distinct, high-impact strategies tailored to this situation.

For each strategy provide:
- "title": action-oriented and specific.
- "description": 3-5 sentences covering the diagnosis, the prescription, a concrete first step and the quantified financial result.
- "impact_score": integer 1-10.
- "difficulty": "Low", "Medium" or "High".

Return ONLY raw JSON of the form:
{{"suggestions": [{{"title": "String", "description": "String", "impact_score": 8, "difficulty": "Medium"}}]}}"#
    );

    ChatRequest::new(vec![
        ChatMessage::system(STRATEGY_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ])
    .temperature(STRATEGY_TEMPERATURE)
    .json()
}

/// Parse `{"suggestions": [...]}`, skipping entries without a title.
pub fn parse_suggestions(raw: &str) -> Result<Vec<StrategySuggestion>, AiError> {
    let value = parse_json_object(raw)?;
    if let Some(error) = str_field(&value, &["error"]) {
        return Err(AiError::Malformed(error));
    }
    let items = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| AiError::Malformed("missing \"suggestions\" list".into()))?;

    let suggestions: Vec<_> = items
        .iter()
        .filter_map(|item| {
            let title = str_field(item, &["title"])?;
            Some(StrategySuggestion {
                title,
                description: str_field(item, &["description"]).unwrap_or_default(),
                impact_score: u64_field(item, "impact_score")
                    .or_else(|| u64_field(item, "feasibility_score"))
                    .unwrap_or(5)
                    .clamp(1, 10) as u8,
                difficulty: str_field(item, &["difficulty"])
                    .map(|d| Difficulty::from_loose(&d))
                    .unwrap_or(Difficulty::Medium),
            })
        })
        .collect();

    if suggestions.is_empty() {
        return Err(AiError::Malformed("no usable suggestions".into()));
    }
    Ok(suggestions)
}

pub fn suggest_strategies(
    llm: &dyn LlmClient,
    request: &ChatRequest,
) -> Result<Vec<StrategySuggestion>, AiError> {
    let raw = llm.complete(request)?;
    parse_suggestions(&raw)
}
