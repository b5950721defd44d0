//! Scripted provider for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{GenerationError, GenerationProvider, GenerationRequest, SamplingParams};

type Responder = dyn Fn(&GenerationRequest<'_>) -> Result<String, GenerationError> + Send + Sync;

/// A recorded call, owned so assertions can run after the fact.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub system: Option<String>,
    pub params: SamplingParams,
}

/// Provider whose output is decided by a closure over the request.
pub struct ScriptedProvider {
    responder: Box<Responder>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest<'_>) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    /// Fails every call as if the backend were down.
    pub fn failing() -> Self {
        Self::from_fn(|_| Err(GenerationError::Connection("http://localhost:11434".into())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt: request.prompt.to_string(),
                system: request.system.map(str::to_string),
                params: request.params,
            });
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(request)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
