use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::crypto::{generate_token, hash_token};
use crate::db::{self, DatabaseError};
use crate::models::{Session, User};

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: NaiveDateTime,
}

/// Outcome of presenting a bearer token.
#[derive(Debug)]
pub enum SessionLookup {
    Valid(User),
    Expired,
    Invalid,
}

/// Create a session for the user and return the raw token (shown once).
pub fn issue_session(
    conn: &Connection,
    secret: &str,
    ttl: Duration,
    user_id: &Uuid,
) -> Result<IssuedToken, DatabaseError> {
    let token = generate_token();
    let created_at = db::now();
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::days(8));
    let session = Session {
        token_hash: hash_token(secret, &token),
        user_id: *user_id,
        created_at,
        expires_at: created_at + ttl,
    };
    db::insert_session(conn, &session)?;
    Ok(IssuedToken {
        access_token: token,
        token_type: "bearer",
        expires_at: session.expires_at,
    })
}

/// Resolve a bearer token to its user. Expired sessions are deleted on sight.
pub fn resolve_session(
    conn: &Connection,
    secret: &str,
    token: &str,
) -> Result<SessionLookup, DatabaseError> {
    let token_hash = hash_token(secret, token);
    let Some(session) = db::get_session(conn, &token_hash)? else {
        return Ok(SessionLookup::Invalid);
    };
    if session.expires_at <= db::now() {
        db::delete_session(conn, &token_hash)?;
        return Ok(SessionLookup::Expired);
    }
    match db::get_user(conn, &session.user_id)? {
        Some(user) if user.is_active => Ok(SessionLookup::Valid(user)),
        _ => Ok(SessionLookup::Invalid),
    }
}

pub fn revoke_session(conn: &Connection, secret: &str, token: &str) -> Result<bool, DatabaseError> {
    db::delete_session(conn, &hash_token(secret, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_memory_database, test_user};

    const SECRET: &str = "s3cret";

    #[test]
    fn issued_token_resolves_to_user() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "a@example.com");
        let issued = issue_session(&conn, SECRET, Duration::from_secs(3600), &user.id).unwrap();
        assert_eq!(issued.token_type, "bearer");

        match resolve_session(&conn, SECRET, &issued.access_token).unwrap() {
            SessionLookup::Valid(found) => assert_eq!(found.id, user.id),
            other => panic!("expected valid session, got {other:?}"),
        }
    }

    #[test]
    fn wrong_secret_or_token_is_invalid() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "b@example.com");
        let issued = issue_session(&conn, SECRET, Duration::from_secs(3600), &user.id).unwrap();

        assert!(matches!(
            resolve_session(&conn, "other", &issued.access_token).unwrap(),
            SessionLookup::Invalid
        ));
        assert!(matches!(
            resolve_session(&conn, SECRET, "forged").unwrap(),
            SessionLookup::Invalid
        ));
    }

    #[test]
    fn expired_session_reported_then_removed() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "c@example.com");
        let issued = issue_session(&conn, SECRET, Duration::ZERO, &user.id).unwrap();

        assert!(matches!(
            resolve_session(&conn, SECRET, &issued.access_token).unwrap(),
            SessionLookup::Expired
        ));
        assert!(matches!(
            resolve_session(&conn, SECRET, &issued.access_token).unwrap(),
            SessionLookup::Invalid
        ));
    }

    #[test]
    fn revoked_session_is_invalid() {
        let conn = open_memory_database().unwrap();
        let user = test_user(&conn, "d@example.com");
        let issued = issue_session(&conn, SECRET, Duration::from_secs(60), &user.id).unwrap();
        assert!(revoke_session(&conn, SECRET, &issued.access_token).unwrap());
        assert!(matches!(
            resolve_session(&conn, SECRET, &issued.access_token).unwrap(),
            SessionLookup::Invalid
        ));
    }
}
