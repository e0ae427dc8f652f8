//! Quality Scorer
//!
//! Heuristic 0-100 score for an existing section's content, built from three
//! weighted components: valuable-element density, length adequacy against an
//! ideal band, and the density of low-information phrasing.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::config::QualityConfig;
use crate::constants::quality::{LOW_INFORMATION_PHRASES, MIN_KEYWORD_COVERAGE, THIN_CONTENT_WORDS};
use crate::engine::extractor::extract;
use crate::text::{content_tokens, raw_tokens, word_count};

static RE_LOW_INFORMATION: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = LOW_INFORMATION_PHRASES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
});

static RE_OUTDATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:201[0-8]|last year|recently launched|coming soon)\b").unwrap()
});

/// Diagnostic attached to a scored section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum QualityIssue {
    ThinContent { words: usize },
    OutdatedReference { found: Vec<String> },
    NoValuableElements,
    GenericLanguage { phrases: Vec<String> },
    /// Heading keywords the content never mentions
    WeakKeywordRelevance { missing: Vec<String> },
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThinContent { words } => write!(f, "thin content ({} words)", words),
            Self::OutdatedReference { found } => {
                write!(f, "possibly outdated: {}", found.join(", "))
            }
            Self::NoValuableElements => write!(f, "no statistics, quotes, examples or specifics"),
            Self::GenericLanguage { phrases } => {
                write!(f, "generic language: {}", phrases.join(", "))
            }
            Self::WeakKeywordRelevance { missing } => {
                write!(f, "heading keywords missing from content: {}", missing.join(", "))
            }
        }
    }
}

/// Score plus the component contributions that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub score: u8,
    pub words: usize,
    pub elements: usize,
    /// Elements per 100 words
    pub density: f64,
    pub density_points: f64,
    pub length_points: f64,
    pub generic_points: f64,
    pub issues: Vec<QualityIssue>,
}

#[derive(Debug, Clone)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

impl QualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    pub fn score(&self, content: &str) -> u8 {
        self.assess(content).score
    }

    /// [`assess`](Self::assess) plus a check that the content talks about
    /// what its heading names. Does not change the score.
    pub fn assess_section(&self, heading: &str, content: &str) -> QualityAssessment {
        let mut assessment = self.assess(content);
        if assessment.words > 0
            && let Some(issue) = keyword_relevance(heading, content)
        {
            assessment.issues.push(issue);
        }
        assessment
    }

    pub fn assess(&self, content: &str) -> QualityAssessment {
        let words = word_count(content);
        if words == 0 {
            return QualityAssessment {
                score: 0,
                words: 0,
                elements: 0,
                density: 0.0,
                density_points: 0.0,
                length_points: 0.0,
                generic_points: 0.0,
                issues: vec![QualityIssue::ThinContent { words: 0 }],
            };
        }

        let cfg = &self.config;
        let elements = extract(content).len();
        let per_hundred = |count: usize| count as f64 * 100.0 / words as f64;

        let density = per_hundred(elements);
        let density_points =
            f64::from(cfg.density_weight) * (density / cfg.target_density).min(1.0);

        let length_weight = f64::from(cfg.length_weight);
        let length_points = if words < cfg.ideal_min_words {
            length_weight * words as f64 / cfg.ideal_min_words as f64
        } else if words > cfg.ideal_max_words {
            length_weight * cfg.ideal_max_words as f64 / words as f64
        } else {
            length_weight
        };

        let generic_found: Vec<String> = RE_LOW_INFORMATION
            .find_iter(content)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        let generic_rate = per_hundred(generic_found.len());
        let generic_points = f64::from(cfg.generic_weight)
            * (1.0 - (generic_rate / cfg.max_generic_rate).min(1.0));

        let total = density_points + length_points + generic_points;
        let score = total.round().clamp(0.0, 100.0) as u8;

        let mut issues = Vec::new();
        if words < THIN_CONTENT_WORDS {
            issues.push(QualityIssue::ThinContent { words });
        }
        let outdated: Vec<String> = RE_OUTDATED
            .find_iter(content)
            .map(|m| m.as_str().to_string())
            .collect();
        if !outdated.is_empty() {
            issues.push(QualityIssue::OutdatedReference {
                found: dedup_preserving_order(outdated),
            });
        }
        if elements == 0 {
            issues.push(QualityIssue::NoValuableElements);
        }
        if !generic_found.is_empty() {
            issues.push(QualityIssue::GenericLanguage {
                phrases: dedup_preserving_order(generic_found),
            });
        }

        QualityAssessment {
            score,
            words,
            elements,
            density,
            density_points,
            length_points,
            generic_points,
            issues,
        }
    }
}

fn keyword_relevance(heading: &str, content: &str) -> Option<QualityIssue> {
    let present = content_tokens(content);
    let keywords: Vec<(String, String)> = raw_tokens(heading)
        .filter_map(|word| {
            let stem = content_tokens(&word).into_iter().next()?;
            Some((word, stem))
        })
        .collect();
    if keywords.is_empty() {
        return None;
    }

    let missing: Vec<String> = keywords
        .iter()
        .filter(|(_, stem)| !present.contains(stem))
        .map(|(word, _)| word.clone())
        .collect();
    let coverage = 1.0 - missing.len() as f64 / keywords.len() as f64;
    (coverage < MIN_KEYWORD_COVERAGE).then(|| QualityIssue::WeakKeywordRelevance {
        missing: dedup_preserving_order(missing),
    })
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(words: usize) -> String {
        vec!["edge"; words].join(" ")
    }

    #[test]
    fn test_empty_content_scores_zero() {
        let scorer = QualityScorer::default();
        assert_eq!(scorer.score(""), 0);
        assert_eq!(scorer.score("   \n"), 0);
    }

    #[test]
    fn test_plain_text_in_band_scores_length_and_generic() {
        // 150 words, no elements, no generic phrases: 0 + 25 + 25
        let scorer = QualityScorer::default();
        assert_eq!(scorer.score(&filler(150)), 50);
    }

    #[test]
    fn test_length_penalty_below_and_above_band() {
        let scorer = QualityScorer::default();
        let short = scorer.assess(&filler(50));
        assert!((short.length_points - 12.5).abs() < 1e-9);
        let long = scorer.assess(&filler(600));
        assert!((long.length_points - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_dense_facts_reach_full_density() {
        // 4 statistic sentences in ~100 words: density >= 2 per 100 words
        let facts = "Latency fell 40%. Costs dropped $20 a month. Traffic hit 2 billion requests. Cache hit ratio rose to 95%. ";
        let text = format!("{}{}", facts, filler(100 - word_count(facts)));
        let assessment = QualityScorer::default().assess(&text);
        assert_eq!(assessment.elements, 4);
        assert!((assessment.density_points - 50.0).abs() < 1e-9);
        assert_eq!(assessment.score, 100);
    }

    #[test]
    fn test_generic_language_lowers_score() {
        let scorer = QualityScorer::default();
        let clean = filler(100);
        let generic = format!(
            "Moreover, we leverage robust tooling. Furthermore, it is seamless. {}",
            filler(91)
        );
        let a = scorer.assess(&generic);
        assert!(a.generic_points < 25.0);
        assert!(a.score < scorer.score(&clean));
        assert!(a.issues.iter().any(|i| matches!(
            i,
            QualityIssue::GenericLanguage { phrases } if phrases.contains(&"moreover".to_string())
        )));
    }

    #[test]
    fn test_diagnostics() {
        let scorer = QualityScorer::default();
        let issues = scorer
            .assess("Our dashboard, coming soon, will help. It launched in 2017.")
            .issues;
        assert!(issues.contains(&QualityIssue::ThinContent { words: 10 }));
        assert!(issues.iter().any(|i| matches!(
            i,
            QualityIssue::OutdatedReference { found } if found.len() == 2
        )));
        assert!(issues.contains(&QualityIssue::NoValuableElements));
    }

    #[test]
    fn test_keyword_relevance() {
        let scorer = QualityScorer::default();
        let off = scorer.assess_section("What is CDN security?", "Edge firewalls block attacks.");
        assert!(off.issues.contains(&QualityIssue::WeakKeywordRelevance {
            missing: vec!["cdn".to_string(), "security".to_string()],
        }));
        assert_eq!(off.score, scorer.score("Edge firewalls block attacks."));

        // stems match across inflection; half coverage is enough
        for content in ["CDN security relies on edge firewalls.", "CDNs cache content."] {
            let on = scorer.assess_section("What is CDN security?", content);
            assert!(!on.issues.iter().any(|i| matches!(i, QualityIssue::WeakKeywordRelevance { .. })));
        }
        assert!(scorer.assess_section("FAQ", "").issues == vec![QualityIssue::ThinContent { words: 0 }]);
    }

    #[test]
    fn test_score_bounds() {
        let scorer = QualityScorer::default();
        for text in ["a", "Uptime 99.9%.", &filler(1000)] {
            assert!(scorer.score(text) <= 100);
        }
    }
}
