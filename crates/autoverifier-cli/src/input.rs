use anyhow::{bail, Context, Result};
use autoverifier_core::{EvidenceItem, VerificationRequest};
use std::path::Path;

const INLINE_SEPARATOR: &str = "::";

/// Parse an inline `--evidence "Source::content"` argument
pub fn parse_inline_evidence(raw: &str) -> Result<EvidenceItem> {
    let Some((source, content)) = raw.split_once(INLINE_SEPARATOR) else {
        bail!(
            "Invalid evidence '{}': expected \"Source{}content\"",
            raw,
            INLINE_SEPARATOR
        );
    };

    let content = content.trim();
    if content.is_empty() {
        bail!("Evidence from '{}' has no content", source.trim());
    }

    Ok(EvidenceItem::new(source.trim(), content))
}

/// Read a JSON array of evidence items
pub fn load_evidence_file(path: &Path) -> Result<Vec<EvidenceItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse evidence file {}", path.display()))
}

/// Read a JSON array of verification requests
pub fn load_batch_file(path: &Path) -> Result<Vec<VerificationRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse batch file {}", path.display()))
}

/// Evidence from an optional file followed by inline arguments
pub fn collect_evidence(file: Option<&Path>, inline: &[String]) -> Result<Vec<EvidenceItem>> {
    let mut evidence = match file {
        Some(path) => load_evidence_file(path)?,
        None => Vec::new(),
    };

    for raw in inline {
        evidence.push(parse_inline_evidence(raw)?);
    }

    Ok(evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_inline_evidence() {
        let item = parse_inline_evidence("Wikipedia :: The tower is in Paris::France").unwrap();
        assert_eq!(item.source, "Wikipedia");
        assert_eq!(item.content, "The tower is in Paris::France");
        assert_eq!(item.source_type, "web_page");
    }

    #[test]
    fn test_inline_evidence_requires_separator() {
        let err = parse_inline_evidence("just some text").unwrap_err();
        assert!(err.to_string().contains("expected \"Source::content\""));

        assert!(parse_inline_evidence("Blog::   ").is_err());
    }

    #[test]
    fn test_collect_evidence_from_file_and_inline() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"source": "Britannica", "content": "Iconic landmark in Paris.", "url": "https://www.britannica.com/topic/Eiffel-Tower"}}]"#
        )
        .unwrap();

        let evidence = collect_evidence(
            Some(file.path()),
            &["Tourism Guide::Visit the Eiffel Tower in Paris.".to_string()],
        )
        .unwrap();

        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].source, "Britannica");
        assert_eq!(evidence[0].locator(), "https://www.britannica.com/topic/Eiffel-Tower");
        assert_eq!(evidence[1].source, "Tourism Guide");
        assert_ne!(evidence[0].evidence_id, evidence[1].evidence_id);
    }

    #[test]
    fn test_load_batch_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"claim": "Aliens visited Earth in 2023"}}, {{"claim": "Paris is in France", "evidence": [{{"source": "Atlas", "content": "Paris is the capital of France."}}]}}]"#
        )
        .unwrap();

        let requests = load_batch_file(file.path()).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].evidence.is_empty());
        assert_eq!(requests[1].evidence[0].source, "Atlas");
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_evidence_file(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse evidence file"));
    }
}
