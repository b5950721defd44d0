use super::knowledge_base::KnowledgeBase;
use super::types::FindingsRecord;

/// Collect citation URLs for every knowledge-base term that appears in the
/// findings, critical values or test type.
///
/// Matching is literal substring containment on lower-cased text; a term
/// never spans two fields or items. Output follows knowledge-base order and
/// holds each URL once.
pub fn resolve_citations(kb: &KnowledgeBase, findings: &FindingsRecord) -> Vec<String> {
    let blob = search_blob(findings);
    let mut urls: Vec<String> = Vec::new();

    for (term, record) in kb.iter() {
        if blob.contains(term) && !urls.iter().any(|u| *u == record.url) {
            urls.push(record.url.clone());
        }
    }

    tracing::debug!(count = urls.len(), "Citations resolved");
    urls
}

fn search_blob(findings: &FindingsRecord) -> String {
    findings
        .findings
        .iter()
        .chain(findings.critical_values.iter())
        .chain(std::iter::once(&findings.test_type))
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
