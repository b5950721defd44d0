pub mod types;
pub mod knowledge_base;
pub mod prompt;
pub mod extraction;
pub mod summarize;
pub mod citation;
pub mod orchestrator;

pub use types::*;
pub use knowledge_base::{CitationRecord, KnowledgeBase};
pub use extraction::ExtractionError;
pub use summarize::Audience;
pub use citation::resolve_citations;
pub use orchestrator::ReportPipeline;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Empty report content")]
    EmptyReport,

    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::TaskFailed(err.to_string())
    }
}
