use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AiError;
use crate::config::LlmConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// One chat-completion call. The model comes from the client's configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// `None` uses the configured default.
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            json_mode: false,
            max_tokens: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Chat-completion backend (allows mocking)
pub trait LlmClient: Send + Sync {
    /// Run the request and return the assistant message text.
    fn complete(&self, request: &ChatRequest) -> Result<String, AiError>;

    /// False when no API key is configured; AI endpoints answer 503.
    fn is_configured(&self) -> bool {
        true
    }
}

// ═══════════════════════════════════════════
// OpenAI-compatible client (Groq by default)
// ═══════════════════════════════════════════

pub struct HostedLlmClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    default_temperature: f32,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl HostedLlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, AiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            default_temperature: config.temperature,
            timeout: config.timeout,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient for HostedLlmClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.default_temperature),
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
            max_tokens: request.max_tokens,
        };

        tracing::debug!(model = %self.model, messages = request.messages.len(), "LLM request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Http(format!(
                        "Request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    AiError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| AiError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Malformed("response has no message content".into()))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ═══════════════════════════════════════════
// Mock
// ═══════════════════════════════════════════

/// Mock LLM client for testing: replays scripted responses in order (the
/// last one repeats) and records every request it receives.
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
    configured: bool,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self::scripted(&[response])
    }

    pub fn scripted(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    /// Behaves like a server without an API key.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::scripted(&[])
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        if !self.configured {
            return Err(AiError::NotConfigured);
        }
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| AiError::Http("mock poisoned".into()))?;
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        next.ok_or_else(|| AiError::Malformed("no scripted response".into()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest::new(vec![ChatMessage::system("sys"), ChatMessage::user("hi")])
    }

    #[test]
    fn mock_replays_in_order_then_repeats_last() {
        let mock = MockLlmClient::scripted(&["one", "two"]);
        assert_eq!(mock.complete(&request()).unwrap(), "one");
        assert_eq!(mock.complete(&request()).unwrap(), "two");
        assert_eq!(mock.complete(&request()).unwrap(), "two");
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn unconfigured_mock_reports_not_configured() {
        let mock = MockLlmClient::unconfigured();
        assert!(!mock.is_configured());
        assert!(matches!(mock.complete(&request()), Err(AiError::NotConfigured)));
    }

    #[test]
    fn hosted_client_without_key_is_not_configured() {
        let config = crate::config::AppConfig::for_tests("x.db".into()).llm;
        let client = HostedLlmClient::new(&config).unwrap();
        assert!(!client.is_configured());
        assert_eq!(client.model(), "llama-3.3-70b-versatile");
        assert!(matches!(client.complete(&request()), Err(AiError::NotConfigured)));
    }

    #[test]
    fn completion_body_serializes_json_mode() {
        let messages = vec![ChatMessage::user("x")];
        let body = CompletionBody {
            model: "m",
            messages: &messages,
            temperature: 0.1,
            response_format: Some(ResponseFormat { kind: "json_object" }),
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn builder_sets_options() {
        let req = request().temperature(0.5).json().max_tokens(4000);
        assert_eq!(req.temperature, Some(0.5));
        assert!(req.json_mode);
        assert_eq!(req.max_tokens, Some(4000));
    }
}
