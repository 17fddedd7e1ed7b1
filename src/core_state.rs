//! Process-wide application state shared by every request handler.
//!
//! Everything here is either immutable after startup (configuration,
//! investor catalog) or internally synchronised (the LLM and identity
//! clients). Per-request data lives in the SQLite database; handlers
//! open their own connection through [`CoreState::open_db`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::ai::{AiError, HostedLlmClient, LlmClient};
use crate::auth::{AuthError, GoogleTokenVerifier, IdentityVerifier};
use crate::config::AppConfig;
use crate::db;
use crate::investors::{CatalogError, InvestorCatalog};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: AppConfig,
    /// Read-only investor dataset, loaded once.
    pub investors: InvestorCatalog,
    llm: Arc<dyn LlmClient>,
    identity: Arc<dyn IdentityVerifier>,
    started_at: Instant,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        investors: InvestorCatalog,
        llm: Arc<dyn LlmClient>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            config,
            investors,
            llm,
            identity,
            started_at: Instant::now(),
        }
    }

    /// Build production state: hosted LLM, Google verifier, investor
    /// dataset from disk. The database is opened once up front so schema
    /// migrations run before the first request.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let conn = db::open_database(&config.database_path)?;
        drop(conn);

        let investors = match InvestorCatalog::load(&config.investor_dataset) {
            Ok(catalog) => catalog,
            Err(CatalogError::Io { path, source }) => {
                tracing::warn!(
                    path = %path,
                    error = %source,
                    "Investor dataset missing, directory will be empty"
                );
                InvestorCatalog::new(Vec::new())
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(count = investors.len(), "Investor catalog loaded");

        let llm: Arc<dyn LlmClient> = Arc::new(HostedLlmClient::new(&config.llm)?);
        if !llm.is_configured() {
            tracing::warn!("GROQ_API_KEY not set, AI endpoints will return 503");
        }
        let identity: Arc<dyn IdentityVerifier> =
            Arc::new(GoogleTokenVerifier::new(config.google_client_id.clone())?);

        Ok(Self::new(config, investors, llm, identity))
    }

    /// Open a database connection for one request.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.database_path).map_err(CoreError::Database)
    }

    pub fn database_path(&self) -> &PathBuf {
        &self.config.database_path
    }

    /// Shared LLM client; clone the `Arc` into blocking tasks.
    pub fn llm(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.llm)
    }

    pub fn identity(&self) -> Arc<dyn IdentityVerifier> {
        Arc::clone(&self.identity)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Investor dataset error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("LLM client error: {0}")]
    Llm(#[from] AiError),
    #[error("Identity verifier error: {0}")]
    Identity(#[from] AuthError),
}

// ═══════════════════════════════════════════════════════════
// Test support
// ═══════════════════════════════════════════════════════════


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn open_db_runs_against_migrated_schema() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);
        let conn = state.open_db().unwrap();
        assert_eq!(db::count_tables(&conn).unwrap(), 9);
    }

    #[test]
    fn llm_handle_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);
        assert!(!state.llm().is_configured());
        assert_eq!(Arc::strong_count(&state.llm), 1);
    }

    #[test]
    fn from_config_tolerates_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::for_tests(dir.path().join("db.sqlite"));
        config.investor_dataset = dir.path().join("absent.json");
        let state = CoreState::from_config(config).unwrap();
        assert!(state.investors.is_empty());
        assert!(!state.llm().is_configured());
    }

    #[test]
    fn from_config_rejects_malformed_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("investors.json");
        std::fs::write(&dataset, "{not json").unwrap();
        let mut config = AppConfig::for_tests(dir.path().join("db.sqlite"));
        config.investor_dataset = dataset;
        assert!(matches!(
            CoreState::from_config(config),
            Err(CoreError::Catalog(_))
        ));
    }
}
