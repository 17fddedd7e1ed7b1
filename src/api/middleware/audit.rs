//! Request audit logging.
//!
//! Logs method, path, caller and response status for every request.
//! Runs innermost, after auth has injected `UserContext`.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::UserContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_id = req
        .extensions()
        .get::<UserContext>()
        .map(|u| u.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, path, user_id, status, elapsed_ms, "API request failed");
    } else {
        tracing::info!(%method, path, user_id, status, elapsed_ms, "API request");
    }
    response
}
