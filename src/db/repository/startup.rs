use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{enum_column, json_column_opt, now, optional, uuid_column};
use crate::db::DatabaseError;
use crate::models::{StartupProfile, UserSettings};

// ═══════════════════════════════════════════
// Startup profile
// ═══════════════════════════════════════════

const PROFILE_COLUMNS: &str = "id, user_id, name, industry, stage, description, team_size,
     initial_cash_balance, initial_monthly_expenses, initial_monthly_revenue, goals,
     created_at, updated_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<StartupProfile> {
    Ok(StartupProfile {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        industry: row.get(3)?,
        stage: enum_column(row, 4)?,
        description: row.get(5)?,
        team_size: row.get(6)?,
        initial_cash_balance: row.get(7)?,
        initial_monthly_expenses: row.get(8)?,
        initial_monthly_revenue: row.get(9)?,
        goals: json_column_opt(row, 10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

pub fn get_startup_profile(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<StartupProfile>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM startup_profiles WHERE user_id = ?1"),
        params![user_id.to_string()],
        profile_from_row,
    ))
}

/// Insert or replace the user's single profile, keeping `id` and `created_at`
/// of an existing one.
pub fn upsert_startup_profile(
    conn: &Connection,
    profile: &StartupProfile,
) -> Result<StartupProfile, DatabaseError> {
    let goals = profile
        .goals
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO startup_profiles (id, user_id, name, industry, stage, description, team_size,
                initial_cash_balance, initial_monthly_expenses, initial_monthly_revenue, goals,
                created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT (user_id) DO UPDATE SET
                name = excluded.name,
                industry = excluded.industry,
                stage = excluded.stage,
                description = excluded.description,
                team_size = excluded.team_size,
                initial_cash_balance = excluded.initial_cash_balance,
                initial_monthly_expenses = excluded.initial_monthly_expenses,
                initial_monthly_revenue = excluded.initial_monthly_revenue,
                goals = excluded.goals,
                updated_at = excluded.updated_at",
        params![
            profile.id.to_string(),
            profile.user_id.to_string(),
            profile.name,
            profile.industry,
            profile.stage.as_str(),
            profile.description,
            profile.team_size,
            profile.initial_cash_balance,
            profile.initial_monthly_expenses,
            profile.initial_monthly_revenue,
            goals,
            profile.created_at,
            now(),
        ],
    )?;
    get_startup_profile(conn, &profile.user_id)?
        .ok_or_else(|| DatabaseError::not_found("StartupProfile", profile.user_id))
}

// ═══════════════════════════════════════════
// User settings
// ═══════════════════════════════════════════

/// Stored settings, or `None` when the user never saved any.
pub fn get_user_settings(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<UserSettings>, DatabaseError> {
    optional(conn.query_row(
        "SELECT full_name, theme, currency, notifications_enabled, email_reports,
                runway_warning_threshold, runway_critical_threshold, llm_provider
         FROM user_settings WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| {
            Ok(UserSettings {
                full_name: row.get(0)?,
                theme: enum_column(row, 1)?,
                currency: row.get(2)?,
                notifications_enabled: row.get::<_, i32>(3)? != 0,
                email_reports: row.get::<_, i32>(4)? != 0,
                runway_warning_threshold: row.get(5)?,
                runway_critical_threshold: row.get(6)?,
                llm_provider: row.get(7)?,
            })
        },
    ))
}

pub fn upsert_user_settings(
    conn: &Connection,
    user_id: &Uuid,
    settings: &UserSettings,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_settings (user_id, full_name, theme, currency, notifications_enabled,
                email_reports, runway_warning_threshold, runway_critical_threshold, llm_provider)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT (user_id) DO UPDATE SET
                full_name = excluded.full_name,
                theme = excluded.theme,
                currency = excluded.currency,
                notifications_enabled = excluded.notifications_enabled,
                email_reports = excluded.email_reports,
                runway_warning_threshold = excluded.runway_warning_threshold,
                runway_critical_threshold = excluded.runway_critical_threshold,
                llm_provider = excluded.llm_provider",
        params![
            user_id.to_string(),
            settings.full_name,
            settings.theme.as_str(),
            settings.currency,
            settings.notifications_enabled as i32,
            settings.email_reports as i32,
            settings.runway_warning_threshold,
            settings.runway_critical_threshold,
            settings.llm_provider,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_user;
    use crate::models::enums::{StartupStage, Theme};

    fn profile(user_id: Uuid, name: &str) -> StartupProfile {
        let at = now();
        StartupProfile {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            industry: "Technology".into(),
            stage: StartupStage::Mvp,
            description: None,
            team_size: 3,
            initial_cash_balance: Some(100_000.0),
            initial_monthly_expenses: None,
            initial_monthly_revenue: None,
            goals: Some(vec!["Reach $10k MRR".into()]),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn profile_upsert_keeps_identity() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "p@example.com");
        let first = upsert_startup_profile(&conn, &profile(user.id, "Acme")).unwrap();
        let second = upsert_startup_profile(&conn, &profile(user.id, "Acme Labs")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Acme Labs");
        assert_eq!(second.goals.as_deref(), Some(&["Reach $10k MRR".to_string()][..]));
    }

    #[test]
    fn settings_absent_then_saved() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "s@example.com");
        assert!(get_user_settings(&conn, &user.id).unwrap().is_none());

        let settings = UserSettings {
            theme: Theme::Dark,
            runway_warning_threshold: 9,
            ..UserSettings::default()
        };
        upsert_user_settings(&conn, &user.id, &settings).unwrap();
        assert_eq!(get_user_settings(&conn, &user.id).unwrap().unwrap(), settings);
    }
}
