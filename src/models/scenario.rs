use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named what-if adjustment applied on top of the latest financial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Monthly change to total expenses (positive = spend more).
    pub expense_change: f64,
    /// Monthly change to total revenue.
    pub revenue_change: f64,
    /// One-time cash added to the current balance (e.g. a bridge round).
    pub cash_injection: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub expense_change: f64,
    #[serde(default)]
    pub revenue_change: f64,
    #[serde(default)]
    pub cash_injection: f64,
}
