//! Runway alerts derived from the latest month and the user's thresholds.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db;
use crate::finance::{Baseline, RunwayStatus};
use crate::models::{FinancialRecord, UserSettings};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Stable per month and status, so the client can dismiss it.
    pub id: String,
    pub level: &'static str,
    pub title: String,
    pub message: String,
    pub month: String,
}

#[derive(Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
}

/// Alerts for `latest` under `settings`. Healthy and sustainable runways
/// produce none, as does a user who turned notifications off.
pub fn runway_notifications(
    latest: Option<&FinancialRecord>,
    settings: &UserSettings,
) -> Vec<Notification> {
    if !settings.notifications_enabled {
        return Vec::new();
    }
    let Some(record) = latest else {
        return Vec::new();
    };
    let runway = Baseline::from_record(record).runway();
    let Some(months) = runway.months() else {
        return Vec::new();
    };

    let status = RunwayStatus::for_settings(runway, settings);
    let (title, threshold) = match status {
        RunwayStatus::Critical => ("Runway critical", settings.runway_critical_threshold),
        RunwayStatus::Warning => ("Runway running low", settings.runway_warning_threshold),
        RunwayStatus::Healthy | RunwayStatus::Sustainable => return Vec::new(),
    };
    vec![Notification {
        id: format!("runway-{}-{}", status.as_str(), record.month),
        level: status.as_str(),
        title: title.to_string(),
        message: format!(
            "At the {} burn rate you have {months:.1} months of runway, below your {threshold}-month threshold.",
            record.month
        ),
        month: record.month.clone(),
    }]
}

/// `GET /notifications`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<NotificationList>, ApiError> {
    let conn = ctx.core.open_db()?;
    let settings = db::get_user_settings(&conn, &caller.user_id)?.unwrap_or_default();
    let latest = db::latest_financial_record(&conn, &caller.user_id)?;
    Ok(Json(NotificationList {
        notifications: runway_notifications(latest.as_ref(), &settings),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FinancialRecordInput;
    use chrono::NaiveDateTime;
    use uuid::Uuid;

    fn record(revenue: f64, expenses: f64, cash: f64) -> FinancialRecord {
        let i = FinancialRecordInput::from_totals("2024-03", revenue, expenses, cash);
        FinancialRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            month: i.month,
            revenue_recurring: i.revenue_recurring,
            revenue_one_time: i.revenue_one_time,
            expenses_salaries: i.expenses_salaries,
            expenses_marketing: i.expenses_marketing,
            expenses_infrastructure: i.expenses_infrastructure,
            expenses_other: i.expenses_other,
            cash_balance: i.cash_balance,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn five_months_is_a_warning() {
        let latest = record(22_000.0, 50_000.0, 142_000.0);
        let alerts = runway_notifications(Some(&latest), &UserSettings::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, "warning");
        assert_eq!(alerts[0].id, "runway-warning-2024-03");
        assert!(alerts[0].message.contains("5.1 months"));
    }

    #[test]
    fn two_months_is_critical() {
        let latest = record(0.0, 10_000.0, 20_000.0);
        let alerts = runway_notifications(Some(&latest), &UserSettings::default());
        assert_eq!(alerts[0].level, "critical");
    }

    #[test]
    fn quiet_when_healthy_profitable_or_disabled() {
        let settings = UserSettings::default();
        assert!(runway_notifications(Some(&record(0.0, 10_000.0, 500_000.0)), &settings).is_empty());
        assert!(runway_notifications(Some(&record(30_000.0, 10_000.0, 0.0)), &settings).is_empty());
        assert!(runway_notifications(None, &settings).is_empty());

        let off = UserSettings {
            notifications_enabled: false,
            ..UserSettings::default()
        };
        assert!(runway_notifications(Some(&record(0.0, 10_000.0, 20_000.0)), &off).is_empty());
    }
}
