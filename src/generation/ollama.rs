use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{classify_transport_error, GenerationError, GenerationProvider, GenerationRequest};

/// Preferred local models in order of preference (matched as name prefixes).
const PREFERRED_MODELS: &[&str] = &["llama3", "medgemma", "phi3", "mistral"];

/// Ollama HTTP backend for local inference.
///
/// The model name is resolved once, on first use or at warm-up, and
/// cached for the lifetime of the provider.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    model_override: Option<String>,
    model: OnceCell<String>,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model_override: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client settings");
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
            model_override,
            model: OnceCell::new(),
        }
    }

    /// The resolved model, if resolution has already happened.
    pub fn resolved_model(&self) -> Option<&str> {
        self.model.get().map(String::as_str)
    }

    async fn model(&self) -> Result<&str, GenerationError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                if let Some(model) = &self.model_override {
                    return Ok(model.clone());
                }
                self.find_best_model().await
            })
            .await?;
        Ok(model.as_str())
    }

    /// Pick the first preferred model that the server has pulled.
    pub async fn find_best_model(&self) -> Result<String, GenerationError> {
        let available = self.list_models().await?;
        pick_preferred(&available).ok_or(GenerationError::NoModelAvailable)
    }

    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &self.base_url, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

fn pick_preferred(available: &[String]) -> Option<String> {
    PREFERRED_MODELS.iter().find_map(|preferred| {
        available
            .iter()
            .find(|m| m.starts_with(preferred))
            .cloned()
    })
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        let model = self.model().await?;
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options: OllamaOptions {
                temperature: request.params.temperature,
                num_predict: request.params.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &self.base_url, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn warm_up(&self) -> Result<(), GenerationError> {
        let model = self.model().await?;
        tracing::info!(model = %model, base_url = %self.base_url, "Ollama model resolved");
        Ok(())
    }
}
