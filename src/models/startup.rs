use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{StartupStage, Theme};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub industry: String,
    pub stage: StartupStage,
    pub description: Option<String>,
    pub team_size: u32,
    pub initial_cash_balance: Option<f64>,
    pub initial_monthly_expenses: Option<f64>,
    pub initial_monthly_revenue: Option<f64>,
    pub goals: Option<Vec<String>>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Per-user display, notification and alert preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub full_name: Option<String>,
    pub theme: Theme,
    pub currency: String,
    pub notifications_enabled: bool,
    pub email_reports: bool,
    /// Months of runway below which a warning is raised.
    pub runway_warning_threshold: u32,
    /// Months of runway below which the alert becomes critical.
    pub runway_critical_threshold: u32,
    pub llm_provider: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            full_name: None,
            theme: Theme::Light,
            currency: "USD".to_string(),
            notifications_enabled: true,
            email_reports: false,
            runway_warning_threshold: 6,
            runway_critical_threshold: 3,
            llm_provider: "groq".to_string(),
        }
    }
}
