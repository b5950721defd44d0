//! Structured extraction of findings from free-text reports.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::prompt::{build_extraction_prompt, EXTRACTION_PARAMS, EXTRACTION_SYSTEM_PROMPT};
use super::types::{FindingsRecord, RawReport};
use crate::generation::{generate_with_timeout, GenerationError, GenerationProvider, GenerationRequest};

const UNKNOWN: &str = "Unknown";

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("No JSON object found in model output")]
    NoJsonObject,

    #[error("Malformed JSON in model output: {0}")]
    MalformedJson(String),
}

/// Run extraction, reporting failures to the caller.
pub async fn try_extract(
    provider: &dyn GenerationProvider,
    report: &RawReport,
    timeout: Duration,
) -> Result<FindingsRecord, ExtractionError> {
    let prompt = build_extraction_prompt(report.as_str());
    let request = GenerationRequest {
        prompt: &prompt,
        system: Some(EXTRACTION_SYSTEM_PROMPT),
        params: EXTRACTION_PARAMS,
    };

    let response = generate_with_timeout(provider, &request, timeout).await?;
    parse_findings_response(&response)
}

/// Run extraction, substituting the fallback record on any failure.
pub async fn extract(
    provider: &dyn GenerationProvider,
    report: &RawReport,
    timeout: Duration,
) -> FindingsRecord {
    recover(try_extract(provider, report, timeout).await)
}

/// Map an extraction outcome onto a usable record.
pub fn recover(outcome: Result<FindingsRecord, ExtractionError>) -> FindingsRecord {
    outcome.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Extraction failed, using fallback record");
        FindingsRecord::fallback(&e.to_string())
    })
}

/// Cut the JSON object out of a model response: everything outside the
/// first `{` and the last `}` is discarded.
pub fn repair_json_response(response: &str) -> Result<&str, ExtractionError> {
    let start = response.find('{').ok_or(ExtractionError::NoJsonObject)?;
    let end = response.rfind('}').ok_or(ExtractionError::NoJsonObject)?;
    if end < start {
        return Err(ExtractionError::NoJsonObject);
    }
    Ok(&response[start..=end])
}

/// Parse a raw model response into a findings record, after stripping
/// markdown code-fence markers.
pub fn parse_findings_response(response: &str) -> Result<FindingsRecord, ExtractionError> {
    let cleaned = strip_code_fences(response);
    let json_str = repair_json_response(&cleaned)?;

    let raw: RawFindings =
        serde_json::from_str(json_str).map_err(|e| ExtractionError::MalformedJson(e.to_string()))?;

    Ok(FindingsRecord {
        test_type: text_field(raw.test_type),
        body_part_or_panel: text_field(raw.body_part_or_panel),
        findings: list_field(raw.findings),
        impression: text_field(raw.impression),
        critical_values: list_field(raw.critical_values),
    })
}

/// Extraction payload with every field optional and untyped.
#[derive(Deserialize)]
struct RawFindings {
    test_type: Option<Value>,
    body_part_or_panel: Option<Value>,
    findings: Option<Value>,
    impression: Option<Value>,
    critical_values: Option<Value>,
}

fn strip_code_fences(response: &str) -> String {
    response.replace("```json", "").replace("```", "").trim().to_string()
}

/// Scalar field: strings are kept, `null`/missing/blank become "Unknown".
fn text_field(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Null) | None => UNKNOWN.to_string(),
        Some(Value::String(_)) => UNKNOWN.to_string(),
        Some(other) => other.to_string(),
    }
}

/// List field, parsed leniently: a bare string becomes a single item,
/// non-string items keep their JSON text, null and blank items are skipped.
fn list_field(value: Option<Value>) -> Vec<String> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(single) => vec![single],
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        })
        .collect()
}
