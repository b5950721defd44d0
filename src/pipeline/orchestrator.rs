use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use super::citation::resolve_citations;
use super::extraction;
use super::knowledge_base::KnowledgeBase;
use super::summarize::{self, Audience};
use super::types::{AnalysisResult, FindingsRecord, RawReport, DISCLAIMER};
use super::PipelineError;
use crate::generation::{GenerationError, GenerationProvider};

/// Report explanation pipeline.
///
/// Coordinates: extract → (patient summary ∥ clinician summary ∥ citations) → assemble.
#[derive(Clone)]
pub struct ReportPipeline {
    provider: Arc<dyn GenerationProvider>,
    knowledge_base: Arc<KnowledgeBase>,
    call_timeout: Duration,
}

impl ReportPipeline {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        knowledge_base: Arc<KnowledgeBase>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            knowledge_base,
            call_timeout,
        }
    }

    pub fn provider(&self) -> &Arc<dyn GenerationProvider> {
        &self.provider
    }

    /// Run the full pipeline for one report.
    ///
    /// Generation and parsing failures degrade into fallback content; only a
    /// crashed or cancelled summary task is returned as an error.
    pub async fn run(&self, report: &RawReport) -> Result<AnalysisResult, PipelineError> {
        let started = Instant::now();

        // Step 1: Extraction (everything downstream depends on it)
        let findings =
            Arc::new(extraction::extract(self.provider.as_ref(), report, self.call_timeout).await);
        tracing::info!(
            test_type = %findings.test_type,
            findings = findings.findings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction stage finished"
        );

        // Step 2: Both summaries in parallel
        let mut patient_task = self.spawn_summary(Audience::Patient, findings.clone());
        let mut clinician_task = self.spawn_summary(Audience::Clinician, findings.clone());

        // Step 3: Citations while the summaries generate
        let citations = resolve_citations(&self.knowledge_base, &findings);

        let (patient, clinician) = tokio::join!(&mut patient_task.0, &mut clinician_task.0);
        let patient_explanation = summarize::recover(Audience::Patient, patient?);
        let clinician_explanation = summarize::recover(Audience::Clinician, clinician?);

        tracing::info!(
            citations = citations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Report pipeline completed"
        );

        Ok(AnalysisResult {
            patient_explanation,
            clinician_explanation,
            citations,
            disclaimer: DISCLAIMER.to_string(),
        })
    }

    fn spawn_summary(&self, audience: Audience, findings: Arc<FindingsRecord>) -> SummaryTask {
        let provider = self.provider.clone();
        let timeout = self.call_timeout;
        SummaryTask(tokio::spawn(async move {
            summarize::summarize(provider.as_ref(), audience, &findings, timeout).await
        }))
    }
}

/// Spawned summary call, aborted if the run that owns it is dropped.
struct SummaryTask(JoinHandle<Result<String, GenerationError>>);

impl Drop for SummaryTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
