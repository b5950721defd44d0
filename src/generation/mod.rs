//! Text generation backends.
//!
//! The pipeline only sees `GenerationProvider`: a component that turns a
//! prompt (plus optional system instruction and sampling parameters) into
//! text or a failure. Backends are constructed once at startup and shared
//! across requests behind an `Arc`.

pub mod ollama;
pub mod openai;

#[cfg(test)]
pub mod mock;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BackendKind, ConfigError, Settings};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation backend is not reachable at {0}")]
    Connection(String),

    #[error("Generation backend returned error (status {status}): {body}")]
    Backend { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generation backend returned an empty response")]
    EmptyResponse,

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("No compatible model available")]
    NoModelAvailable,
}

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl SamplingParams {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// One generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub system: Option<&'a str>,
    pub params: SamplingParams,
}

/// A component that turns prompts into text.
///
/// Implementations must be safe to call concurrently. A backend may
/// serialize calls internally; the pipeline only depends on the results.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError>;

    /// Backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Prepare the backend ahead of the first request (model resolution, etc.).
    async fn warm_up(&self) -> Result<(), GenerationError> {
        Ok(())
    }
}

/// Invoke a provider with a hard time limit.
///
/// A timeout and a blank response are both reported as failures so the
/// caller's degradation policy covers them.
pub async fn generate_with_timeout(
    provider: &dyn GenerationProvider,
    request: &GenerationRequest<'_>,
    timeout: Duration,
) -> Result<String, GenerationError> {
    let started = std::time::Instant::now();
    let text = tokio::time::timeout(timeout, provider.generate(request))
        .await
        .map_err(|_| GenerationError::Timeout(timeout))??;

    tracing::debug!(
        backend = provider.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        chars = text.len(),
        "Generation completed"
    );

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// Construct the provider selected by `settings`.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn GenerationProvider>, ConfigError> {
    match settings.backend {
        BackendKind::Ollama => Ok(Arc::new(OllamaProvider::new(
            &settings.ollama_url,
            settings.model.clone(),
            settings.generation_timeout,
        ))),
        BackendKind::OpenAi => {
            let api_key = settings
                .openai_api_key
                .clone()
                .ok_or(ConfigError::MissingApiKey)?;
            Ok(Arc::new(OpenAiProvider::new(
                &settings.openai_base_url,
                api_key,
                settings.model.clone(),
                settings.generation_timeout,
            )))
        }
    }
}

/// Map a reqwest transport error onto the generation error taxonomy.
pub(crate) fn classify_transport_error(
    err: reqwest::Error,
    base_url: &str,
    timeout: Duration,
) -> GenerationError {
    if err.is_connect() {
        GenerationError::Connection(base_url.to_string())
    } else if err.is_timeout() {
        GenerationError::Timeout(timeout)
    } else {
        GenerationError::Http(err.to_string())
    }
}
