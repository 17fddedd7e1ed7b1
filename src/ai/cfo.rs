//! "AI CFO" chat and the executive report.

use serde::Serialize;

use super::prompt::format_money;
use super::{ChatMessage, ChatRequest};
use crate::finance::Baseline;
use crate::models::{FinancialRecord, InvestorMatch};

pub const CHAT_TEMPERATURE: f32 = 0.1;
pub const REPORT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_CONTEXT_MONTHS: u32 = 12;
pub const REPORT_MONTHS: usize = 3;
/// Matches quoted in a chat answer.
pub const CHAT_MATCH_COUNT: usize = 3;

const INVESTOR_KEYWORDS: &[&str] = &["investor", "raise", "funding", "vc", "pitch", "capital", "match"];

pub const DEFAULT_COMPANY_DESCRIPTION: &str =
    "A fast-growing tech startup looking for strategic venture capital.";

/// True when the message asks about fundraising.
pub fn wants_investors(message: &str) -> bool {
    let lower = message.to_lowercase();
    INVESTOR_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaiseTarget {
    pub amount: f64,
    pub stage: &'static str,
}

/// Suggested round for the latest month: 18 months of burn at Seed when
/// burning, a $5M Series A when profitable, $2M Seed without data.
pub fn infer_raise(latest: Option<&FinancialRecord>) -> RaiseTarget {
    match latest.map(Baseline::from_record) {
        Some(b) if b.burn() > 0.0 => RaiseTarget { amount: b.burn() * 18.0, stage: "Seed" },
        Some(_) => RaiseTarget { amount: 5_000_000.0, stage: "Series A" },
        None => RaiseTarget { amount: 2_000_000.0, stage: "Seed" },
    }
}

/// Runway sentence given to the model so it never computes its own.
pub fn runway_status_line(latest: Option<&FinancialRecord>) -> String {
    let Some(record) = latest else {
        return "Unknown".to_string();
    };
    let baseline = Baseline::from_record(record);
    match baseline.runway().months() {
        Some(m) => format!("{m:.1} months of runway remaining."),
        None => format!(
            "Infinite (Company is profitable by {}/month).",
            format_money(-baseline.burn())
        ),
    }
}

#[derive(Serialize)]
struct MonthContext<'a> {
    #[serde(rename = "Month")]
    month: &'a str,
    #[serde(rename = "Revenue")]
    revenue: f64,
    #[serde(rename = "Expenses")]
    expenses: f64,
    /// Positive = profitable, negative = burn.
    #[serde(rename = "Net_Income")]
    net_income: f64,
    #[serde(rename = "Cash_Bank")]
    cash: f64,
}

/// JSON table of the given months, newest first.
pub fn financial_context(records: &[FinancialRecord]) -> String {
    if records.is_empty() {
        return "No financial data available.".to_string();
    }
    let rows: Vec<_> = records
        .iter()
        .rev()
        .map(|r| MonthContext {
            month: &r.month,
            revenue: r.total_revenue(),
            expenses: r.total_expenses(),
            net_income: r.total_revenue() - r.total_expenses(),
            cash: r.cash_balance,
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_default()
}

pub fn investor_context(target: &RaiseTarget, matches: &[InvestorMatch]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }
    let mut context = String::from("\n--- INVESTOR MATCHMAKER DATA ---\n");
    context.push_str(&format!(
        "The system calculates the ideal raise amount is {} for a {} round.\n",
        format_money(target.amount),
        target.stage
    ));
    context.push_str("Here are the top matches from the investor database:\n");
    for (i, m) in matches.iter().take(CHAT_MATCH_COUNT).enumerate() {
        context.push_str(&format!(
            "{}. {} ({}) - Type: {} - Match Score: {:.2}\n",
            i + 1,
            m.name,
            m.hq,
            m.investor_type,
            m.match_score
        ));
    }
    context.push_str(
        "\nYou MUST explicitly list these specific investors in your response and recommend them.",
    );
    Some(context)
}

pub fn build_chat_request(
    message: &str,
    context_months: u32,
    financial_context: &str,
    runway_status: &str,
    investor_context: Option<&str>,
) -> ChatRequest {
    let system = format!(
        "You are an expert Startup CFO. You are helpful, concise and data-driven.\n\n\
         FINANCIAL DATA (last {context_months} months):\n{financial_context}\n\n\
         CURRENT RUNWAY STATUS: {runway_status}\n{}\n\
         STRICT RULES:\n\
         1. NEVER calculate runway yourself. Use the exact CURRENT RUNWAY STATUS above.\n\
         2. Look at Net_Income. If it is positive the company is profitable: do not talk about burn, congratulate them.\n\
         3. If matchmaker data is provided above, list those investors by name.",
        investor_context.unwrap_or("")
    );
    ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(message)])
        .temperature(CHAT_TEMPERATURE)
}

pub fn build_report_request(financial_context: &str) -> ChatRequest {
    let prompt = format!(
        "You are writing a monthly investor update email for the CEO.\n\
         Use this financial data:\n{financial_context}\n\n\
         Structure the email:\n\
         1. Highlights (1-2 bullet points on growth or runway)\n\
         2. Lowlights/Challenges (where did costs go up? high burn?)\n\
         3. Cash Position (current bank balance and runway)\n\
         4. Outlook (brief sentiment for next month)\n\n\
         Tone: professional, transparent and concise. No fluff."
    );
    ChatRequest::new(vec![ChatMessage::user(prompt)]).temperature(REPORT_TEMPERATURE)
}
