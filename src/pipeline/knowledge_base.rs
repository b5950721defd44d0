//! Static reference data mapping medical terms to public explanations.
//!
//! Built once at startup and shared read-only across requests. Entries keep
//! their insertion order, which is the order citations are reported in.

use serde::Serialize;

/// One knowledge-base entry describing a medical term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationRecord {
    pub definition: String,
    pub source: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_range: Option<String>,
}

impl CitationRecord {
    fn new(definition: &str, source: &str, url: &str, normal_range: Option<&str>) -> Self {
        Self {
            definition: definition.to_string(),
            source: source.to_string(),
            url: url.to_string(),
            normal_range: normal_range.map(str::to_string),
        }
    }
}

/// Ordered term → citation mapping. Keys are lower-case and trimmed.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<(String, CitationRecord)>,
}

impl KnowledgeBase {
    /// Build from ordered `(term, record)` pairs. Later duplicates of a term are dropped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, CitationRecord)>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<(String, CitationRecord)> = Vec::new();
        for (term, record) in entries {
            let key = normalize(term.as_ref());
            if key.is_empty() || normalized.iter().any(|(k, _)| *k == key) {
                continue;
            }
            normalized.push((key, record));
        }
        Self {
            entries: normalized,
        }
    }

    /// The built-in radiology and lab reference set.
    pub fn builtin() -> Self {
        Self::from_entries([
            // Radiology terms
            (
                "consolidation",
                CitationRecord::new(
                    "A region of normally compressible lung tissue that has filled with liquid instead of air.",
                    "Radiopaedia",
                    "https://radiopaedia.org/articles/consolidation",
                    None,
                ),
            ),
            (
                "pneumothorax",
                CitationRecord::new(
                    "The presence of air or gas in the cavity between the lungs and the chest wall, causing collapse of the lung.",
                    "Mayo Clinic",
                    "https://www.mayoclinic.org/diseases-conditions/pneumothorax/symptoms-causes/syc-20350367",
                    None,
                ),
            ),
            (
                "fracture",
                CitationRecord::new(
                    "A complete or partial break in a bone.",
                    "MedlinePlus (NIH)",
                    "https://medlineplus.gov/fractures.html",
                    None,
                ),
            ),
            (
                "atelectasis",
                CitationRecord::new(
                    "Complete or partial collapse of the entire lung or area (lobe) of the lung.",
                    "Mayo Clinic",
                    "https://www.mayoclinic.org/diseases-conditions/atelectasis/symptoms-causes/syc-20369684",
                    None,
                ),
            ),
            (
                "pleural effusion",
                CitationRecord::new(
                    "A backup of fluid in the space between the lungs and the chest wall.",
                    "MedlinePlus (NIH)",
                    "https://medlineplus.gov/pleuraldisorders.html",
                    None,
                ),
            ),
            // Lab parameters (general adult approximations)
            (
                "hemoglobin",
                CitationRecord::new(
                    "A protein in red blood cells that carries oxygen.",
                    "Mayo Clinic",
                    "https://www.mayoclinic.org/tests-procedures/hemoglobin-test/about/pac-20385075",
                    Some("Male: 13.5-17.5 g/dL, Female: 12.0-15.5 g/dL"),
                ),
            ),
            (
                "wbc",
                CitationRecord::new(
                    "White Blood Cells, part of the immune system.",
                    "MedlinePlus (NIH)",
                    "https://medlineplus.gov/wbc.html",
                    Some("4,500 to 11,000 cells per microliter"),
                ),
            ),
            (
                "creatinine",
                CitationRecord::new(
                    "A waste product pumped out of the blood by the kidneys.",
                    "Mayo Clinic",
                    "https://www.mayoclinic.org/tests-procedures/creatinine-test/about/pac-20384646",
                    Some("Male: 0.74-1.35 mg/dL, Female: 0.59-1.04 mg/dL"),
                ),
            ),
            (
                "glucose",
                CitationRecord::new(
                    "Blood sugar.",
                    "MedlinePlus (NIH)",
                    "https://medlineplus.gov/bloodglucose.html",
                    Some("70-99 mg/dL (fasting)"),
                ),
            ),
            (
                "platelets",
                CitationRecord::new(
                    "Blood cells that help your body form clots to stop bleeding.",
                    "Johns Hopkins Medicine",
                    "https://www.hopkinsmedicine.org/health/conditions-and-diseases/what-are-platelets-and-why-are-they-important",
                    Some("150,000 to 450,000 platelets/mcL"),
                ),
            ),
        ])
    }

    /// Look up a term: exact match first, then the first key that contains
    /// the term or is contained in it.
    pub fn resolve(&self, term: &str) -> Option<&CitationRecord> {
        let term = normalize(term);
        if term.is_empty() {
            return None;
        }

        if let Some((_, record)) = self.entries.iter().find(|(key, _)| *key == term) {
            return Some(record);
        }

        self.entries
            .iter()
            .find(|(key, _)| term.contains(key.as_str()) || key.contains(term.as_str()))
            .map(|(_, record)| record)
    }

    /// Entries in defined order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CitationRecord)> {
        self.entries.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}
