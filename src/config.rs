//! Process configuration, read once from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Stratify";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Path prefix for every versioned endpoint.
pub const API_V1_PREFIX: &str = "/api/v1";

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_DATABASE_PATH: &str = "stratify.db";
const DEFAULT_INVESTOR_DATASET: &str = "data/investors.json";
const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
/// 8 days.
const DEFAULT_TOKEN_EXPIRE_MINUTES: u64 = 60 * 24 * 8;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "stratify=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the hosted LLM.
#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    /// `None` disables every AI endpoint (503).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub access_token_ttl: Duration,
    pub llm: LlmConfig,
    pub google_client_id: Option<String>,
    pub rate_limit_per_minute: u32,
    /// Key the rate limiter by `X-Forwarded-For`. Only safe behind a
    /// reverse proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    pub cors_origins: Vec<String>,
    pub investor_dataset: PathBuf,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = env_string("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let temperature = env_f32("LLM_TEMPERATURE", 0.2)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                name: "LLM_TEMPERATURE",
                value: temperature.to_string(),
            });
        }

        Ok(Self {
            bind_addr: env_string("STRATIFY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            database_path: env_string("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            secret_key,
            access_token_ttl: token_ttl(env_u64(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                DEFAULT_TOKEN_EXPIRE_MINUTES,
            )?)?,
            llm: LlmConfig {
                api_key: env_string("GROQ_API_KEY"),
                base_url: env_string("LLM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                model: env_string("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                temperature,
                timeout: Duration::from_secs(env_u64("LLM_TIMEOUT_SECS", 60)?),
            },
            google_client_id: env_string("GOOGLE_CLIENT_ID"),
            rate_limit_per_minute: rate_limit(env_u64("RATE_LIMIT_PER_MINUTE", 60)?)?,
            trust_forwarded_for: env_bool("TRUST_PROXY_HEADERS", false)?,
            cors_origins: parse_origins(&env::var("BACKEND_CORS_ORIGINS").unwrap_or_default()),
            investor_dataset: env_string("INVESTOR_DATASET")
                .unwrap_or_else(|| DEFAULT_INVESTOR_DATASET.to_string())
                .into(),
        })
    }

    /// Configuration for tests: temp database path, no LLM key.
    pub fn for_tests(database_path: PathBuf) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database_path,
            secret_key: "test-secret".to_string(),
            access_token_ttl: Duration::from_secs(60 * DEFAULT_TOKEN_EXPIRE_MINUTES),
            llm: LlmConfig {
                api_key: None,
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                model: DEFAULT_LLM_MODEL.to_string(),
                temperature: 0.2,
                timeout: Duration::from_secs(5),
            },
            google_client_id: Some("test-client.apps.googleusercontent.com".to_string()),
            rate_limit_per_minute: 1000,
            trust_forwarded_for: false,
            cors_origins: Vec::new(),
            investor_dataset: PathBuf::from(DEFAULT_INVESTOR_DATASET),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_string(name) {
        None => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

fn env_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_string(name).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: v }),
        },
    }
}

fn token_ttl(minutes: u64) -> Result<Duration, ConfigError> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid {
            name: "ACCESS_TOKEN_EXPIRE_MINUTES",
            value: minutes.to_string(),
        })
}

fn rate_limit(per_minute: u64) -> Result<u32, ConfigError> {
    u32::try_from(per_minute).map_err(|_| ConfigError::Invalid {
        name: "RATE_LIMIT_PER_MINUTE",
        value: per_minute.to_string(),
    })
}

fn env_f32(name: &'static str, default: f32) -> Result<f32, ConfigError> {
    match env_string(name) {
        None => Ok(default),
        Some(v) => v
            .parse::<f32>()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

/// Accepts `a,b,c` or a JSON list `["a","b"]`.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw).unwrap_or_default();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
