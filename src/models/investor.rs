use serde::{Deserialize, Serialize};

/// Catalog entry from the static investor dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    #[serde(default)]
    pub id: u32,
    #[serde(default = "unknown_name", alias = "investor_name")]
    pub name: String,
    #[serde(default = "default_type", rename = "type", alias = "investor_type")]
    pub investor_type: String,
    #[serde(default = "unknown_location")]
    pub global_hq: String,
    #[serde(default)]
    pub website: String,
    /// Pipe-separated, e.g. `"Pre-Seed | Seed"`.
    #[serde(default)]
    pub stage_of_investment: String,
    pub first_cheque_minimum: Option<f64>,
    pub first_cheque_maximum: Option<f64>,
    #[serde(default)]
    pub investment_thesis: String,
}

pub const UNKNOWN_LOCATION: &str = "Location Unknown";

fn unknown_name() -> String {
    "Unknown Investor".to_string()
}

fn default_type() -> String {
    "VC".to_string()
}

fn unknown_location() -> String {
    UNKNOWN_LOCATION.to_string()
}

impl Investor {
    /// Country-level location: the last comma-separated part of `global_hq`.
    pub fn display_hq(&self) -> &str {
        if self.global_hq == UNKNOWN_LOCATION {
            return &self.global_hq;
        }
        self.global_hq
            .rsplit(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.global_hq)
    }

    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.stage_of_investment
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn invests_in_stage(&self, stage: &str) -> bool {
        self.stage_of_investment
            .to_lowercase()
            .contains(&stage.trim().to_lowercase())
    }
}

/// Investor as rendered in directory and match results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorMatch {
    pub investor_id: u32,
    pub name: String,
    pub match_score: f64,
    pub website: String,
    pub hq: String,
    #[serde(rename = "type")]
    pub investor_type: String,
}

impl InvestorMatch {
    pub fn from_investor(investor: &Investor, match_score: f64) -> Self {
        Self {
            investor_id: investor.id,
            name: investor.name.clone(),
            match_score,
            website: investor.website.clone(),
            hq: investor.display_hq().to_string(),
            investor_type: investor.investor_type.clone(),
        }
    }
}
