//! Account endpoints.
//!
//! - `POST /auth/register`, `/auth/login`, `/auth/google` issue a bearer token
//! - `POST /auth/logout` revokes the presented token
//! - `GET /auth/me` returns the caller

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::auth::{self, RegisterRequest};
use crate::db;
use crate::models::User;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(alias = "id_token", alias = "credential")]
    pub token: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: NaiveDateTime,
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn issue(ctx: &ApiContext, user: User) -> Result<AuthResponse, ApiError> {
    let conn = ctx.core.open_db()?;
    let issued = auth::issue_session(
        &conn,
        &ctx.core.config.secret_key,
        ctx.core.config.access_token_ttl,
        &user.id,
    )?;
    Ok(AuthResponse {
        access_token: issued.access_token,
        token_type: issued.token_type,
        expires_at: issued.expires_at,
        user,
    })
}

/// `POST /auth/register` — 201 with a token for the new account.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = blocking(move || {
        let user = {
            let conn = ctx.core.open_db()?;
            auth::register(&conn, &body)?
        };
        issue(&ctx, user)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = blocking(move || {
        let user = {
            let conn = ctx.core.open_db()?;
            auth::login(&conn, &body.email, &body.password)?
        };
        tracing::info!(user_id = %user.id, "Password login");
        issue(&ctx, user)
    })
    .await?;
    Ok(Json(response))
}

/// `POST /auth/google` — exchange a Google ID token for a session.
pub async fn google(
    State(ctx): State<ApiContext>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing Google ID token".into()));
    }
    let response = blocking(move || {
        let identity = ctx.core.identity().verify(body.token.trim())?;
        let user = {
            let conn = ctx.core.open_db()?;
            auth::google_sign_in(&conn, &identity)?
        };
        tracing::info!(user_id = %user.id, "Google sign-in");
        issue(&ctx, user)
    })
    .await?;
    Ok(Json(response))
}

/// `POST /auth/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    auth::revoke_session(&conn, &ctx.core.config.secret_key, &caller.token)?;
    Ok(Json(MessageResponse {
        message: "Logged out",
    }))
}

/// `GET /auth/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = db::get_user(&conn, &caller.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}
