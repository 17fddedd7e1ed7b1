pub mod ai; // LLM client, prompts and response parsing
pub mod api; // HTTP router, middleware, endpoints
pub mod auth; // Registration, login, Google sign-in, sessions
pub mod config;
pub mod core_state; // Shared state for every request
pub mod crypto;
pub mod db;
pub mod finance; // Runway math, scenarios, CSV import
pub mod investors; // Investor catalog and matching
pub mod models;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Cannot start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Process entry point: logging, configuration, state, then the HTTP server
/// until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    // Built outside the runtime: the LLM and Google clients are blocking
    // reqwest clients and must also be dropped outside it.
    let core = Arc::new(core_state::CoreState::from_config(config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(Arc::clone(&core)))?;
    drop(runtime);
    drop(core);
    Ok(())
}
