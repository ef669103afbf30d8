use autoverifier_core::CredibilityConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scores for well-known outlets
const KNOWN_OUTLETS: &[(&str, f64)] = &[
    ("bbc.com", 0.90),
    ("reuters.com", 0.92),
    ("apnews.com", 0.90),
    ("nytimes.com", 0.88),
    ("theguardian.com", 0.85),
    ("aljazeera.com", 0.82),
    ("wikipedia.org", 0.75),
    ("reddit.com", 0.55),
    ("x.com", 0.45),
    ("twitter.com", 0.45),
];

const NEUTRAL_SCORE: f64 = 0.5;
const INSTITUTIONAL_BONUS: f64 = 0.25;
const LOW_QUALITY_TLD_PENALTY: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityReport {
    pub domain: String,
    /// Credibility in [0.0, 1.0]
    pub score: f64,
    pub rationale: String,
}

/// Static credibility estimates for evidence sources
#[derive(Debug, Clone)]
pub struct SourceCredibility {
    known: HashMap<String, f64>,
}

impl Default for SourceCredibility {
    fn default() -> Self {
        Self {
            known: KNOWN_OUTLETS
                .iter()
                .map(|(domain, score)| (domain.to_string(), *score))
                .collect(),
        }
    }
}

impl SourceCredibility {
    /// Built-in table with the configured overrides applied on top
    pub fn from_config(config: &CredibilityConfig) -> Self {
        let mut credibility = Self::default();
        for (domain, score) in &config.overrides {
            credibility
                .known
                .insert(normalize_domain(domain), score.clamp(0.0, 1.0));
        }
        credibility
    }

    /// Estimate credibility for a URL, bare domain or source name. Never fails;
    /// unknown sources get a heuristic score around 0.5.
    pub fn assess(&self, url_or_source: &str) -> CredibilityReport {
        let domain = normalize_domain(url_or_source);

        if let Some(score) = self.known.get(&domain) {
            return CredibilityReport {
                domain,
                score: *score,
                rationale: "Known outlet (static map).".to_string(),
            };
        }

        let mut score = NEUTRAL_SCORE;
        if domain.ends_with(".gov") || domain.ends_with(".edu") {
            score += INSTITUTIONAL_BONUS;
        }
        if domain.ends_with(".info") || domain.ends_with(".xyz") || domain.ends_with(".blog") {
            score -= LOW_QUALITY_TLD_PENALTY;
        }

        CredibilityReport {
            domain,
            score: round_to(score.clamp(0.0, 1.0), 2),
            rationale: "Heuristic fallback.".to_string(),
        }
    }
}

/// Reduce a URL to its lowercase host: scheme, path, port and `www.` are dropped
pub fn normalize_domain(url_or_source: &str) -> String {
    let trimmed = url_or_source.trim();
    let lowered = trimmed.to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_known_outlets() {
        let credibility = SourceCredibility::default();
        let report = credibility.assess("https://www.reuters.com/world/some-story");
        assert_eq!(report.domain, "reuters.com");
        assert_eq!(report.score, 0.92);
        assert_eq!(report.rationale, "Known outlet (static map).");

        assert_eq!(credibility.assess("twitter.com").score, 0.45);
    }

    #[test]
    fn test_heuristic_fallback() {
        let credibility = SourceCredibility::default();

        let gov = credibility.assess("https://data.census.gov/table");
        assert_eq!(gov.domain, "data.census.gov");
        assert_eq!(gov.score, 0.75);
        assert_eq!(gov.rationale, "Heuristic fallback.");

        assert_eq!(credibility.assess("http://rumors.xyz/post/1").score, 0.4);
        assert_eq!(credibility.assess("https://example.com/news/1").score, 0.5);
    }

    #[test]
    fn test_source_names_and_empty_input() {
        let credibility = SourceCredibility::default();
        let report = credibility.assess("Tourism Guide");
        assert_eq!(report.domain, "tourism guide");
        assert_eq!(report.score, 0.5);

        let empty = credibility.assess("");
        assert_eq!(empty.domain, "");
        assert_eq!(empty.score, 0.5);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = CredibilityConfig {
            overrides: BTreeMap::from([
                ("WWW.Example.org".to_string(), 0.8),
                ("reddit.com".to_string(), 0.3),
            ]),
        };
        let credibility = SourceCredibility::from_config(&config);
        assert_eq!(credibility.assess("https://example.org/a").score, 0.8);
        assert_eq!(credibility.assess("reddit.com").score, 0.3);
    }

    #[test]
    fn test_normalize_domain_strips_port() {
        assert_eq!(normalize_domain("HTTP://News.BBC.com:8080/x"), "news.bbc.com");
    }
}
