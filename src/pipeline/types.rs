use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Fixed disclaimer attached to every analysis.
pub const DISCLAIMER: &str = "This is an AI-generated explanation and does NOT constitute a medical diagnosis. Always consult a qualified physician for medical advice.";

/// Unstructured clinical text, guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport(String);

impl RawReport {
    pub fn new(text: impl Into<String>) -> Result<Self, PipelineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyReport);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key clinical facts extracted from one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsRecord {
    pub test_type: String,
    pub body_part_or_panel: String,
    pub findings: Vec<String>,
    pub impression: String,
    pub critical_values: Vec<String>,
}

impl FindingsRecord {
    /// Deterministic substitute used when extraction fails.
    pub fn fallback(reason: &str) -> Self {
        Self {
            test_type: "Unknown".to_string(),
            body_part_or_panel: "Unknown".to_string(),
            findings: vec![format!("Error extracting data: {reason}")],
            impression: "Extraction failed".to_string(),
            critical_values: Vec::new(),
        }
    }
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub patient_explanation: String,
    pub clinician_explanation: String,
    pub citations: Vec<String>,
    pub disclaimer: String,
}
