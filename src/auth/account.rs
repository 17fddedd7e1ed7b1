use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{AuthError, GoogleIdentity};
use crate::crypto::{hash_password, validate_password_strength, verify_password};
use crate::db;
use crate::models::enums::OAuthProvider;
use crate::models::User;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Emails are compared lowercased everywhere.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

pub fn register(conn: &Connection, request: &RegisterRequest) -> Result<User, AuthError> {
    let email = normalize_email(&request.email)?;
    validate_password_strength(&request.password)?;

    if db::get_user_by_email(conn, &email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        password_hash: Some(hash_password(&request.password)),
        full_name: request
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
        is_active: true,
        oauth_provider: None,
        oauth_id: None,
        profile_picture: None,
        onboarding_completed: false,
        created_at: db::now(),
        last_login: None,
    };

    // Two concurrent registrations can both pass the lookup above.
    db::insert_user(conn, &user).map_err(|e| {
        if e.is_unique_violation() {
            AuthError::EmailTaken
        } else {
            AuthError::Database(e)
        }
    })?;
    tracing::info!(user_id = %user.id, "Account registered");
    Ok(user)
}

/// Password login. Unknown email, wrong password and Google-only accounts
/// all produce the same error.
pub fn login(conn: &Connection, email: &str, password: &str) -> Result<User, AuthError> {
    let email = email.trim().to_lowercase();
    let mut user = db::get_user_by_email(conn, &email)?.ok_or(AuthError::InvalidCredentials)?;

    let Some(stored) = user.password_hash.as_deref() else {
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(password, stored)? {
        return Err(AuthError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AuthError::Inactive);
    }

    user.last_login = Some(db::touch_last_login(conn, &user.id)?);
    Ok(user)
}

/// Sign in with a verified Google identity: known Google account, then an
/// existing account with the same email (linked), else a new account.
pub fn google_sign_in(conn: &Connection, identity: &GoogleIdentity) -> Result<User, AuthError> {
    let email = normalize_email(&identity.email)?;

    let existing = match db::get_user_by_oauth(conn, OAuthProvider::Google, &identity.subject)? {
        Some(user) => Some(user),
        None => match db::get_user_by_email(conn, &email)? {
            Some(user) => {
                db::link_oauth_identity(
                    conn,
                    &user.id,
                    OAuthProvider::Google,
                    &identity.subject,
                    identity.picture.as_deref(),
                )?;
                tracing::info!(user_id = %user.id, "Linked Google identity to existing account");
                db::get_user(conn, &user.id)?
            }
            None => None,
        },
    };

    let mut user = match existing {
        Some(user) => user,
        None => {
            let user = User {
                id: Uuid::new_v4(),
                email,
                password_hash: None,
                full_name: identity.name.clone(),
                is_active: true,
                oauth_provider: Some(OAuthProvider::Google),
                oauth_id: Some(identity.subject.clone()),
                profile_picture: identity.picture.clone(),
                onboarding_completed: false,
                created_at: db::now(),
                last_login: None,
            };
            db::insert_user(conn, &user)?;
            tracing::info!(user_id = %user.id, "Account created from Google sign-in");
            user
        }
    };

    if !user.is_active {
        return Err(AuthError::Inactive);
    }
    user.last_login = Some(db::touch_last_login(conn, &user.id)?);
    Ok(user)
}
