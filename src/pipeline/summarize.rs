use std::time::Duration;

use super::prompt::{
    build_clinician_prompt, build_patient_prompt, CLINICIAN_SYSTEM_PROMPT, PATIENT_SYSTEM_PROMPT,
    SUMMARY_PARAMS,
};
use super::types::FindingsRecord;
use crate::generation::{generate_with_timeout, GenerationError, GenerationProvider, GenerationRequest};

/// Who an explanation is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Patient,
    Clinician,
}

impl Audience {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Patient => PATIENT_SYSTEM_PROMPT,
            Self::Clinician => CLINICIAN_SYSTEM_PROMPT,
        }
    }

    pub fn build_prompt(&self, findings: &FindingsRecord) -> String {
        match self {
            Self::Patient => build_patient_prompt(findings),
            Self::Clinician => build_clinician_prompt(findings),
        }
    }

    /// Text shown in place of an explanation that could not be generated.
    pub fn failure_text(&self, error: &GenerationError) -> String {
        match self {
            Self::Patient => format!("Error generating patient explanation: {error}"),
            Self::Clinician => format!("Error generating clinician summary: {error}"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Clinician => "clinician",
        }
    }
}

/// Generate one audience's explanation of the findings.
pub async fn summarize(
    provider: &dyn GenerationProvider,
    audience: Audience,
    findings: &FindingsRecord,
    timeout: Duration,
) -> Result<String, GenerationError> {
    let prompt = audience.build_prompt(findings);
    let request = GenerationRequest {
        prompt: &prompt,
        system: Some(audience.system_prompt()),
        params: SUMMARY_PARAMS,
    };
    generate_with_timeout(provider, &request, timeout).await
}

pub async fn summarize_patient(
    provider: &dyn GenerationProvider,
    findings: &FindingsRecord,
    timeout: Duration,
) -> Result<String, GenerationError> {
    summarize(provider, Audience::Patient, findings, timeout).await
}

pub async fn summarize_clinician(
    provider: &dyn GenerationProvider,
    findings: &FindingsRecord,
    timeout: Duration,
) -> Result<String, GenerationError> {
    summarize(provider, Audience::Clinician, findings, timeout).await
}

/// Collapse a summary outcome into display text.
pub fn recover(audience: Audience, outcome: Result<String, GenerationError>) -> String {
    outcome.unwrap_or_else(|e| {
        tracing::warn!(audience = audience.as_str(), error = %e, "Summary generation failed");
        audience.failure_text(&e)
    })
}
