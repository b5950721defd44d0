use super::types::FindingsRecord;
use crate::generation::SamplingParams;

/// Extraction is a parsing task: keep sampling close to deterministic.
pub const EXTRACTION_PARAMS: SamplingParams = SamplingParams::new(1000, 0.1);

/// Explanations benefit from some variety in phrasing.
pub const SUMMARY_PARAMS: SamplingParams = SamplingParams::new(1000, 0.7);

/// Sentence the patient explanation must end with.
pub const PATIENT_CLOSING_SENTENCE: &str =
    "This is not a diagnosis. Consult a qualified physician.";

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a precise medical data extraction AI. \
Extract information strictly from the text provided. Do not add anything that is not written. \
Output strictly valid JSON.";

pub const PATIENT_SYSTEM_PROMPT: &str = "You are a helpful medical assistant for patients. \
You explain medical reports in plain, calm, everyday language.";

pub const CLINICIAN_SYSTEM_PROMPT: &str = "You are a professional medical assistant for clinicians. \
You write concise, technical summaries and never recommend medications or treatments.";

/// Build the extraction prompt for a report.
pub fn build_extraction_prompt(report_text: &str) -> String {
    format!(
        r#"Task:
Read the provided medical report text and extract ONLY explicitly stated information.
Do not add diagnoses or hallucinations.

Identify:
- Test type
- Body part or panel
- Findings (list)
- Impression
- Critical values (list)

Return STRICTLY in JSON format with this structure. Do not include markdown formatting like ```json.
{{
  "test_type": "string",
  "body_part_or_panel": "string",
  "findings": ["string", "string"],
  "impression": "string",
  "critical_values": ["string"]
}}

Report Text:
{report_text}
"#
    )
}

/// Build the patient-mode prompt from extracted findings.
pub fn build_patient_prompt(findings: &FindingsRecord) -> String {
    let data = findings_json(findings);
    format!(
        r#"Using the extracted report data below, explain the report in simple everyday language.

Include these sections:
- Overview of the test
- What the report says (Findings)
- Possible implications
- Red flags to watch (if any)
- Questions the patient should ask their doctor

Keep language non-technical and reassuring.
End with disclaimer: "{PATIENT_CLOSING_SENTENCE}"

Extracted Data:
{data}
"#
    )
}

/// Build the clinician-mode prompt from extracted findings.
pub fn build_clinician_prompt(findings: &FindingsRecord) -> String {
    let data = findings_json(findings);
    format!(
        r#"Summarize the extracted report data into a concise bullet-point professional overview.

Must contain:
- Key findings
- Critical values
- Impression in one line
- Suggested next steps (non-prescriptive)

Do NOT recommend medications or treatments.
Limit to under 10 bullets.

Extracted Data:
{data}
"#
    )
}

fn findings_json(findings: &FindingsRecord) -> String {
    // Serializing plain strings cannot fail.
    serde_json::to_string_pretty(findings).unwrap_or_else(|_| format!("{findings:#?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FindingsRecord {
        FindingsRecord {
            test_type: "Chest X-Ray".into(),
            body_part_or_panel: "Chest".into(),
            findings: vec!["mild pleural effusion".into()],
            impression: "stable".into(),
            critical_values: vec![],
        }
    }

    #[test]
    fn extraction_prompt_embeds_report_and_schema() {
        let report = "CBC: Hemoglobin 9.1 g/dL (L)";
        let prompt = build_extraction_prompt(report);
        assert!(prompt.contains(report));
        assert!(prompt.contains("\"body_part_or_panel\": \"string\""));
        assert!(prompt.contains("\"critical_values\": [\"string\"]"));
    }

    #[test]
    fn patient_prompt_requires_closing_disclaimer() {
        let prompt = build_patient_prompt(&sample());
        assert!(prompt.contains(PATIENT_CLOSING_SENTENCE));
        assert!(prompt.contains("Red flags"));
        assert!(prompt.contains("\"test_type\": \"Chest X-Ray\""));
    }

    #[test]
    fn clinician_prompt_forbids_treatment_and_caps_bullets() {
        let prompt = build_clinician_prompt(&sample());
        assert!(prompt.contains("Do NOT recommend medications or treatments."));
        assert!(prompt.contains("under 10 bullets"));
        assert!(prompt.contains("mild pleural effusion"));
    }

    #[test]
    fn extraction_is_colder_than_summaries() {
        assert!(EXTRACTION_PARAMS.temperature < SUMMARY_PARAMS.temperature);
    }
}
