use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use super::AuthError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Verified claims of a Google ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    /// Stable Google account id.
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies Google ID tokens (allows mocking)
pub trait IdentityVerifier: Send + Sync {
    /// Blocking; call from `spawn_blocking`.
    fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError>;
}

/// Checks tokens against Google's tokeninfo endpoint and requires the
/// audience to be our OAuth client id.
pub struct GoogleTokenVerifier {
    client_id: Option<String>,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> Result<Self, AuthError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))?;
        Ok(Self {
            client_id,
            endpoint: TOKENINFO_URL.to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    /// Google sends `"true"`/`"false"` strings here.
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
    picture: Option<String>,
}

impl TokenInfo {
    fn email_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn into_identity(self, client_id: &str) -> Result<GoogleIdentity, AuthError> {
        if self.aud != client_id {
            return Err(AuthError::InvalidIdentityToken("audience mismatch".into()));
        }
        if !self.email_verified() {
            return Err(AuthError::InvalidIdentityToken("email not verified".into()));
        }
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::InvalidIdentityToken("token has no email".into()))?;
        Ok(GoogleIdentity {
            subject: self.sub,
            email,
            name: self.name,
            picture: self.picture,
        })
    }
}

impl IdentityVerifier for GoogleTokenVerifier {
    fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(AuthError::IdentityNotConfigured)?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AuthError::InvalidIdentityToken("token rejected by Google".into()));
        }
        if !status.is_success() {
            return Err(AuthError::IdentityUnavailable(format!("HTTP {status}")));
        }

        let info: TokenInfo = response
            .json()
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))?;
        info.into_identity(client_id)
    }
}

/// Mock verifier for tests: accepts a fixed set of tokens.
#[derive(Default)]
pub struct MockIdentityVerifier {
    identities: HashMap<String, GoogleIdentity>,
}

impl MockIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, identity: GoogleIdentity) -> Self {
        self.identities.insert(token.to_string(), identity);
        self
    }
}

impl IdentityVerifier for MockIdentityVerifier {
    fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        self.identities
            .get(id_token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidIdentityToken("unknown token".into()))
    }
}
