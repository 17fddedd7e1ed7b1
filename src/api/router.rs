//! HTTP router for the `/api/v1` surface.
//!
//! Middleware stack (outermost → innermost):
//! - public: Rate limiter (peer address) → Audit logger
//! - protected: Auth validator → Rate limiter (user id) → Audit logger
//!
//! CORS wraps everything so preflight requests never reach the limiter.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::API_V1_PREFIX;
use crate::core_state::CoreState;

/// Largest accepted onboarding upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build the full API router over shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext`, e.g. with a tighter
/// rate limiter.
pub(crate) fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied bottom (outermost) to top (innermost). Extension
    // must be outermost so every middleware can read ApiContext.
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/google", post(endpoints::auth::google))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/auth/me", get(endpoints::auth::me))
        // Financials
        .route(
            "/financials",
            get(endpoints::financials::list).post(endpoints::financials::upsert),
        )
        .route("/financials/dashboard", get(endpoints::financials::dashboard))
        .route("/financials/projection", get(endpoints::financials::projection))
        .route(
            "/financials/:id",
            get(endpoints::financials::detail)
                .put(endpoints::financials::update)
                .delete(endpoints::financials::remove),
        )
        // Scenarios
        .route(
            "/scenarios",
            get(endpoints::scenarios::list).post(endpoints::scenarios::create),
        )
        .route("/scenarios/simulate", post(endpoints::scenarios::simulate))
        .route(
            "/scenarios/:id",
            get(endpoints::scenarios::detail)
                .put(endpoints::scenarios::update)
                .delete(endpoints::scenarios::remove),
        )
        // Ideas and AI
        .route("/ideas", get(endpoints::ideas::list))
        .route(
            "/ideas/:id",
            get(endpoints::ideas::detail).delete(endpoints::ideas::remove),
        )
        .route("/ai/suggest-strategy", post(endpoints::ai::suggest_strategy))
        .route("/ai/chat", post(endpoints::ai::chat))
        .route("/ai/report", post(endpoints::ai::report))
        .route("/ai/match/investors", post(endpoints::investors::match_investors))
        .route("/ai/match/filter-options", get(endpoints::investors::filter_options))
        .route("/ai/match/all", get(endpoints::investors::directory))
        // Roadmaps
        .route(
            "/roadmaps",
            get(endpoints::roadmaps::list).post(endpoints::roadmaps::generate),
        )
        .route(
            "/roadmaps/:id",
            get(endpoints::roadmaps::detail).delete(endpoints::roadmaps::remove),
        )
        .route("/roadmaps/:id/export", get(endpoints::roadmaps::export))
        .route(
            "/roadmaps/:id/tasks/:task_id",
            patch(endpoints::roadmaps::update_task),
        )
        // Startup profile, settings, account
        .route(
            "/startup/profile",
            get(endpoints::startup::get_profile)
                .post(endpoints::startup::create_profile)
                .put(endpoints::startup::update_profile),
        )
        .route(
            "/startup/settings",
            get(endpoints::startup::get_settings).put(endpoints::startup::update_settings),
        )
        .route("/startup/me", get(endpoints::startup::me))
        .route("/startup/export", get(endpoints::startup::export))
        .route(
            "/startup/account",
            axum::routing::delete(endpoints::startup::delete_account),
        )
        // Onboarding and notifications
        .route(
            "/onboarding/extract-from-file",
            post(endpoints::onboarding::extract_from_file)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/onboarding/connect-google-sheets",
            post(endpoints::onboarding::connect_google_sheets),
        )
        .route("/onboarding/complete", post(endpoints::onboarding::complete))
        .route("/notifications", get(endpoints::notifications::list))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    Router::new()
        .nest(API_V1_PREFIX, public.merge(protected))
        .layer(cors_layer(&ctx.core.config.cors_origins))
}

/// Explicit origin list from configuration. Unparseable origins are skipped;
/// an empty list allows no cross-origin callers.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
