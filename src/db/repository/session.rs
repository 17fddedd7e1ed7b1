use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{optional, uuid_column};
use crate::db::DatabaseError;
use crate::models::Session;

pub fn insert_session(conn: &Connection, session: &Session) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            session.token_hash,
            session.user_id.to_string(),
            session.created_at,
            session.expires_at,
        ],
    )?;
    Ok(())
}

pub fn get_session(conn: &Connection, token_hash: &str) -> Result<Option<Session>, DatabaseError> {
    optional(conn.query_row(
        "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?1",
        params![token_hash],
        |row| {
            Ok(Session {
                token_hash: row.get(0)?,
                user_id: uuid_column(row, 1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
            })
        },
    ))
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(deleted > 0)
}

pub fn delete_user_sessions(conn: &Connection, user_id: &Uuid) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1",
        params![user_id.to_string()],
    )?)
}

/// Remove sessions that expired before `now`. Returns how many were dropped.
pub fn purge_expired_sessions(conn: &Connection, now: NaiveDateTime) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?)
}
