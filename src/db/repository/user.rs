use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{enum_column_opt, now, optional, uuid_column};
use crate::db::DatabaseError;
use crate::models::enums::OAuthProvider;
use crate::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, full_name, is_active, oauth_provider,
     oauth_id, profile_picture, onboarding_completed, created_at, last_login";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        is_active: row.get::<_, i32>(4)? != 0,
        oauth_provider: enum_column_opt(row, 5)?,
        oauth_id: row.get(6)?,
        profile_picture: row.get(7)?,
        onboarding_completed: row.get::<_, i32>(8)? != 0,
        created_at: row.get(9)?,
        last_login: row.get(10)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, full_name, is_active, oauth_provider,
                            oauth_id, profile_picture, onboarding_completed, created_at, last_login)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            user.id.to_string(),
            user.email,
            user.password_hash,
            user.full_name,
            user.is_active as i32,
            user.oauth_provider.map(|p| p.as_str()),
            user.oauth_id,
            user.profile_picture,
            user.onboarding_completed as i32,
            user.created_at,
            user.last_login,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id.to_string()],
        user_from_row,
    ))
}

/// Lookup by email; callers pass the address already lowercased.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        user_from_row,
    ))
}

pub fn get_user_by_oauth(
    conn: &Connection,
    provider: OAuthProvider,
    oauth_id: &str,
) -> Result<Option<User>, DatabaseError> {
    optional(conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE oauth_provider = ?1 AND oauth_id = ?2"),
        params![provider.as_str(), oauth_id],
        user_from_row,
    ))
}

/// Attach an OAuth identity to an existing (password) account.
pub fn link_oauth_identity(
    conn: &Connection,
    user_id: &Uuid,
    provider: OAuthProvider,
    oauth_id: &str,
    profile_picture: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET oauth_provider = ?2, oauth_id = ?3,
                profile_picture = COALESCE(?4, profile_picture)
         WHERE id = ?1",
        params![user_id.to_string(), provider.as_str(), oauth_id, profile_picture],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("User", user_id));
    }
    Ok(())
}

pub fn touch_last_login(conn: &Connection, user_id: &Uuid) -> Result<NaiveDateTime, DatabaseError> {
    let at = now();
    conn.execute(
        "UPDATE users SET last_login = ?2 WHERE id = ?1",
        params![user_id.to_string(), at],
    )?;
    Ok(at)
}

pub fn set_onboarding_completed(conn: &Connection, user_id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET onboarding_completed = 1 WHERE id = ?1",
        params![user_id.to_string()],
    )?;
    Ok(())
}

pub fn update_full_name(
    conn: &Connection,
    user_id: &Uuid,
    full_name: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET full_name = ?2 WHERE id = ?1",
        params![user_id.to_string(), full_name],
    )?;
    Ok(())
}

/// Delete the user; every owned row goes with it through ON DELETE CASCADE.
pub fn delete_user(conn: &Connection, user_id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id.to_string()])?;
    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) fn test_user(conn: &Connection, email: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: Some("pbkdf2_sha256$1$c2FsdA$aGFzaA".into()),
        full_name: Some("Test Founder".into()),
        is_active: true,
        oauth_provider: None,
        oauth_id: None,
        profile_picture: None,
        onboarding_completed: false,
        created_at: now(),
        last_login: None,
    };
    insert_user(conn, &user).unwrap();
    user
}
