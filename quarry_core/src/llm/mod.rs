//! Text acquisition from a language model.
//!
//! A backend takes a fully rendered prompt and returns the model's raw text.
//! Interpreting that text is [`crate::analysis`]'s job.

pub mod api;
pub mod cli;

pub use api::AnthropicApiBackend;
pub use cli::ClaudeCliBackend;

use crate::settings::LlmSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("note is empty")]
    EmptyNote,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis timed out after {0}s")]
    Timeout(u64),

    #[error("analysis command exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("analysis output exceeded {0} bytes")]
    OutputTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Anthropic API error: {status} - {body}")]
    ApiStatus { status: u16, body: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("Anthropic API key not set (set llm.api_key or ANTHROPIC_API_KEY)")]
    MissingApiKey,
}

impl AnalysisError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AnalysisError::EmptyNote => "invalid_input",
            AnalysisError::MissingApiKey => "missing_credentials",
            AnalysisError::Timeout(_) => "timeout",
            AnalysisError::Http(e) if e.is_timeout() => "timeout",
            AnalysisError::Http(_) | AnalysisError::ApiStatus { .. } => "upstream_error",
            AnalysisError::MalformedResponse(_) => "parse_error",
            AnalysisError::Spawn { .. }
            | AnalysisError::ExitStatus { .. }
            | AnalysisError::OutputTooLarge(_)
            | AnalysisError::Io(_) => "backend_error",
        }
    }
}

/// Anything that can turn a prompt into model text.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}

/// Which backend a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local `claude` command-line tool.
    #[default]
    Cli,
    /// Hosted Messages API.
    Api,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cli => f.write_str("cli"),
            BackendKind::Api => f.write_str("api"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(BackendKind::Cli),
            "api" => Ok(BackendKind::Api),
            other => Err(format!("unknown backend '{}' (expected cli or api)", other)),
        }
    }
}

/// Build the configured backend.
pub fn build_backend(llm: &LlmSettings) -> Result<Arc<dyn AnalysisBackend>, AnalysisError> {
    let timeout = llm.timeout();
    match llm.backend {
        BackendKind::Cli => Ok(Arc::new(
            ClaudeCliBackend::new(&llm.cli_path).with_timeout(timeout),
        )),
        BackendKind::Api => {
            let mut backend = AnthropicApiBackend::new(llm.api_key.clone(), timeout)?;
            if let Some(model) = llm.model.as_deref().filter(|m| !m.trim().is_empty()) {
                backend = backend.with_model(model);
            }
            Ok(Arc::new(backend))
        }
    }
}
