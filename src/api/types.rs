//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::ReportPipeline;

/// Shared context for all routes.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<ReportPipeline>,
}

impl ApiContext {
    pub fn new(pipeline: ReportPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// `POST /explain-report` body.
#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub report_text: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}
