//! Startup profile, user settings, account info, data export and deletion.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::current_month;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::{self, now};
use crate::models::enums::{StartupStage, Theme};
use crate::models::{
    FinancialRecord, FinancialRecordInput, Idea, Roadmap, Scenario, StartupProfile, User,
    UserSettings,
};

const DEFAULT_INDUSTRY: &str = "Technology";

// ═══════════════════════════════════════════════════════════
// Profile
// ═══════════════════════════════════════════════════════════

/// Body for both create and update; on update only present fields change.
#[derive(Deserialize, Default)]
pub struct ProfileBody {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub stage: Option<String>,
    pub description: Option<String>,
    pub team_size: Option<u32>,
    pub initial_cash_balance: Option<f64>,
    pub initial_monthly_expenses: Option<f64>,
    pub initial_monthly_revenue: Option<f64>,
    pub goals: Option<Vec<String>>,
}

impl ProfileBody {
    fn validate(&self) -> Result<(), ApiError> {
        let amounts = [
            self.initial_cash_balance,
            self.initial_monthly_expenses,
            self.initial_monthly_revenue,
        ];
        if amounts.iter().flatten().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ApiError::BadRequest(
                "Initial financials must be non-negative numbers".into(),
            ));
        }
        if self.team_size == Some(0) {
            return Err(ApiError::BadRequest("team_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Overlay the present fields onto `profile`.
    fn apply(self, profile: &mut StartupProfile) {
        if let Some(name) = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            profile.name = name;
        }
        if let Some(industry) = self.industry.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()) {
            profile.industry = industry;
        }
        if let Some(stage) = self.stage {
            profile.stage = StartupStage::from_loose(&stage);
        }
        if let Some(description) = self.description {
            profile.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        }
        if let Some(team_size) = self.team_size {
            profile.team_size = team_size;
        }
        if self.initial_cash_balance.is_some() {
            profile.initial_cash_balance = self.initial_cash_balance;
        }
        if self.initial_monthly_expenses.is_some() {
            profile.initial_monthly_expenses = self.initial_monthly_expenses;
        }
        if self.initial_monthly_revenue.is_some() {
            profile.initial_monthly_revenue = self.initial_monthly_revenue;
        }
        if self.goals.is_some() {
            profile.goals = self.goals;
        }
    }
}

fn blank_profile(user_id: Uuid) -> StartupProfile {
    let at = now();
    StartupProfile {
        id: Uuid::new_v4(),
        user_id,
        name: String::new(),
        industry: DEFAULT_INDUSTRY.to_string(),
        stage: StartupStage::Mvp,
        description: None,
        team_size: 1,
        initial_cash_balance: None,
        initial_monthly_expenses: None,
        initial_monthly_revenue: None,
        goals: None,
        created_at: at,
        updated_at: at,
    }
}

/// Seed the current month from the profile's initial figures, but only for
/// a user with no records yet and only when some figure is non-zero.
fn seed_initial_month(conn: &Connection, profile: &StartupProfile) -> Result<(), ApiError> {
    let cash = profile.initial_cash_balance.unwrap_or(0.0);
    let expenses = profile.initial_monthly_expenses.unwrap_or(0.0);
    let revenue = profile.initial_monthly_revenue.unwrap_or(0.0);
    if cash == 0.0 && expenses == 0.0 && revenue == 0.0 {
        return Ok(());
    }
    if db::count_financial_records(conn, &profile.user_id)? > 0 {
        return Ok(());
    }
    let month = current_month();
    db::upsert_financial_record(
        conn,
        &profile.user_id,
        &FinancialRecordInput::from_totals(&month, revenue, expenses, cash),
    )?;
    tracing::info!(user_id = %profile.user_id, month = %month, "Seeded first month from profile");
    Ok(())
}

/// `GET /startup/profile`
pub async fn get_profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<StartupProfile>, ApiError> {
    let conn = ctx.core.open_db()?;
    db::get_startup_profile(&conn, &caller.user_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Startup profile not found".into()))
}

/// `POST /startup/profile` — 400 when the user already has one.
pub async fn create_profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(body): Json<ProfileBody>,
) -> Result<(StatusCode, Json<StartupProfile>), ApiError> {
    body.validate()?;
    if body.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest("Startup name is required".into()));
    }
    let conn = ctx.core.open_db()?;
    if db::get_startup_profile(&conn, &caller.user_id)?.is_some() {
        return Err(ApiError::BadRequest(
            "Startup profile already exists. Use PUT to update.".into(),
        ));
    }

    let mut profile = blank_profile(caller.user_id);
    body.apply(&mut profile);
    let profile = db::upsert_startup_profile(&conn, &profile)?;
    seed_initial_month(&conn, &profile)?;
    tracing::info!(user_id = %caller.user_id, "Startup profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `PUT /startup/profile` — merge into the existing profile, creating it
/// when absent.
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(body): Json<ProfileBody>,
) -> Result<Json<StartupProfile>, ApiError> {
    body.validate()?;
    let conn = ctx.core.open_db()?;
    let mut profile = db::get_startup_profile(&conn, &caller.user_id)?
        .unwrap_or_else(|| blank_profile(caller.user_id));
    body.apply(&mut profile);
    if profile.name.is_empty() {
        return Err(ApiError::BadRequest("Startup name is required".into()));
    }
    let profile = db::upsert_startup_profile(&conn, &profile)?;
    seed_initial_month(&conn, &profile)?;
    Ok(Json(profile))
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[derive(Deserialize, Default)]
pub struct SettingsUpdate {
    pub full_name: Option<String>,
    pub theme: Option<Theme>,
    pub currency: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub email_reports: Option<bool>,
    pub runway_warning_threshold: Option<u32>,
    pub runway_critical_threshold: Option<u32>,
    pub llm_provider: Option<String>,
}

fn load_settings(conn: &Connection, user_id: &Uuid) -> Result<UserSettings, ApiError> {
    if let Some(settings) = db::get_user_settings(conn, user_id)? {
        return Ok(settings);
    }
    let full_name = db::get_user(conn, user_id)?.and_then(|u| u.full_name);
    Ok(UserSettings {
        full_name,
        ..UserSettings::default()
    })
}

/// `GET /startup/settings` — defaults until the user saves any.
pub async fn get_settings(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<UserSettings>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(load_settings(&conn, &caller.user_id)?))
}

/// `PUT /startup/settings` — partial update.
pub async fn update_settings(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<UserSettings>, ApiError> {
    let conn = ctx.core.open_db()?;
    let mut settings = load_settings(&conn, &caller.user_id)?;

    if let Some(name) = update.full_name {
        let name = name.trim().to_string();
        db::update_full_name(&conn, &caller.user_id, &name)?;
        settings.full_name = Some(name).filter(|n| !n.is_empty());
    }
    if let Some(theme) = update.theme {
        settings.theme = theme;
    }
    if let Some(currency) = update.currency {
        let currency = currency.trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ApiError::BadRequest("currency must be a 3-letter code".into()));
        }
        settings.currency = currency;
    }
    if let Some(enabled) = update.notifications_enabled {
        settings.notifications_enabled = enabled;
    }
    if let Some(enabled) = update.email_reports {
        settings.email_reports = enabled;
    }
    if let Some(months) = update.runway_warning_threshold {
        settings.runway_warning_threshold = months;
    }
    if let Some(months) = update.runway_critical_threshold {
        settings.runway_critical_threshold = months;
    }
    if let Some(provider) = update.llm_provider {
        settings.llm_provider = provider.trim().to_string();
    }

    if settings.runway_critical_threshold > settings.runway_warning_threshold {
        return Err(ApiError::BadRequest(
            "runway_critical_threshold cannot exceed runway_warning_threshold".into(),
        ));
    }

    db::upsert_user_settings(&conn, &caller.user_id, &settings)?;
    Ok(Json(settings))
}

// ═══════════════════════════════════════════════════════════
// Account
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct AccountInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub onboarding_completed: bool,
}

fn current_user(conn: &Connection, caller: &UserContext) -> Result<User, ApiError> {
    db::get_user(conn, &caller.user_id)?.ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// `GET /startup/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<AccountInfo>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = current_user(&conn, &caller)?;
    Ok(Json(AccountInfo {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        is_active: user.is_active,
        onboarding_completed: user.onboarding_completed,
    }))
}

#[derive(Serialize)]
pub struct ExportedUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Serialize)]
pub struct DataExport {
    pub user: ExportedUser,
    pub startup_profile: Option<StartupProfile>,
    pub settings: UserSettings,
    pub financial_records: Vec<FinancialRecord>,
    pub scenarios: Vec<Scenario>,
    pub ideas: Vec<Idea>,
    pub roadmaps: Vec<Roadmap>,
    pub exported_at: NaiveDateTime,
}

/// `GET /startup/export` — everything the user owns, as one JSON document.
pub async fn export(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<DataExport>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = current_user(&conn, &caller)?;
    let export = DataExport {
        startup_profile: db::get_startup_profile(&conn, &user.id)?,
        settings: load_settings(&conn, &user.id)?,
        financial_records: db::list_financial_records(&conn, &user.id)?,
        scenarios: db::list_scenarios(&conn, &user.id)?,
        ideas: db::list_ideas(&conn, &user.id)?,
        roadmaps: db::list_roadmaps(&conn, &user.id)?,
        exported_at: now(),
        user: ExportedUser {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        },
    };
    tracing::info!(user_id = %caller.user_id, "Account data exported");
    Ok(Json(export))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub deleted_at: NaiveDateTime,
}

/// `DELETE /startup/account` — the user and every row they own.
pub async fn delete_account(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    if !db::delete_user(&conn, &caller.user_id)? {
        return Err(ApiError::NotFound("User not found".into()));
    }
    tracing::info!(user_id = %caller.user_id, "Account deleted");
    Ok(Json(DeletedResponse {
        message: "Account deleted successfully",
        deleted_at: now(),
    }))
}
