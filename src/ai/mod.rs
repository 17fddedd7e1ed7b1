//! Hosted-LLM features: strategy ideas, CFO chat, executive reports and
//! execution roadmaps.
//!
//! All calls go through the blocking [`LlmClient`] seam; async handlers run
//! them on `spawn_blocking`.

pub mod cfo;
pub mod client;
pub mod prompt;
pub mod roadmap;
pub mod strategy;

pub use client::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI features are not configured on this server")]
    NotConfigured,

    #[error("Could not reach the AI provider: {0}")]
    Http(String),

    #[error("AI provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI returned an unexpected response: {0}")]
    Malformed(String),
}
