//! Merge Engine
//!
//! Combines freshly generated section text with the section's original text
//! according to a preservation strategy and reports which valuable elements
//! survived. Elements the generated text already carries are never appended
//! twice; elements left out by a cap are counted, never silently lost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::MergeConfig;
use crate::constants::merge::WORD_SIMILARITY;
use crate::text::{normalize, split_sentences};
use crate::types::{ElementKind, PreservationReport, Span, ValuableElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Generated text only
    Replace,
    /// Generated text followed by the whole original
    Append,
    /// Generated text plus the top-K most valuable original sentences
    Smart,
    /// Generated text plus every valuable original sentence it lacks
    PreserveValuable,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Append => write!(f, "append"),
            Self::Smart => write!(f, "smart"),
            Self::PreserveValuable => write!(f, "preserve_valuable"),
        }
    }
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "smart" => Ok(Self::Smart),
            "preserve_valuable" | "preserve" => Ok(Self::PreserveValuable),
            _ => Err(format!(
                "Unknown merge strategy: {}. Valid values: replace, append, smart, preserve_valuable",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub text: String,
    pub report: PreservationReport,
}

/// One source sentence and every element kind tagged on it
struct Unit<'e> {
    span: Span,
    text: &'e str,
    kinds: Vec<ElementKind>,
}

impl Unit<'_> {
    fn best_priority(&self) -> u8 {
        self.kinds.iter().map(|k| k.priority()).min().unwrap_or(u8::MAX)
    }
}

/// Elements sharing a span belong to the same sentence
fn units(elements: &[ValuableElement]) -> Vec<Unit<'_>> {
    let mut units: Vec<Unit<'_>> = Vec::new();
    for element in elements {
        match units.iter_mut().find(|u| u.span == element.span) {
            Some(unit) => unit.kinds.push(element.kind),
            None => units.push(Unit {
                span: element.span,
                text: &element.text,
                kinds: vec![element.kind],
            }),
        }
    }
    units.sort_by_key(|u| u.span.start);
    units
}

#[derive(Debug, Clone)]
pub struct MergeEngine {
    top_k: usize,
    fuzzy_threshold: f64,
    separator: String,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(&MergeConfig::default())
    }
}

impl MergeEngine {
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            top_k: config.top_k,
            fuzzy_threshold: config.fuzzy_threshold,
            separator: config.separator.clone(),
        }
    }

    pub fn merge(
        &self,
        original: &str,
        generated: &str,
        strategy: MergeStrategy,
        elements: &[ValuableElement],
    ) -> MergeOutcome {
        match strategy {
            MergeStrategy::Replace => MergeOutcome {
                text: generated.to_string(),
                report: PreservationReport::default(),
            },
            MergeStrategy::Append => MergeOutcome {
                text: self.join(generated, original.trim()),
                report: PreservationReport::full(elements),
            },
            MergeStrategy::Smart => self.merge_units(generated, elements, Some(self.top_k)),
            MergeStrategy::PreserveValuable => self.merge_units(generated, elements, None),
        }
    }

    fn merge_units(
        &self,
        generated: &str,
        elements: &[ValuableElement],
        cap: Option<usize>,
    ) -> MergeOutcome {
        let mut report = PreservationReport::default();

        // Deduplicate against the generated text before applying any cap
        let mut missing: Vec<Unit<'_>> = Vec::new();
        for unit in units(elements) {
            if self.is_present(unit.text, generated) {
                report.already_present += unit.kinds.len();
            } else {
                missing.push(unit);
            }
        }

        if let Some(k) = cap
            && missing.len() > k
        {
            // Stable: equal priorities keep source order
            missing.sort_by_key(|u| u.best_priority());
            for unit in missing.drain(k..) {
                report.dropped += unit.kinds.len();
            }
            missing.sort_by_key(|u| u.span.start);
        }

        for unit in &missing {
            for kind in &unit.kinds {
                report.record(*kind);
            }
        }
        let appended: Vec<&str> = missing.iter().map(|u| u.text).collect();

        MergeOutcome {
            text: self.join(generated, &appended.join(" ")),
            report,
        }
    }

    fn join(&self, head: &str, tail: &str) -> String {
        let head = head.trim_end();
        match (head.is_empty(), tail.is_empty()) {
            (_, true) => head.to_string(),
            (true, false) => tail.to_string(),
            (false, false) => format!("{}{}{}", head, self.separator, tail),
        }
    }

    /// Whether `generated` already states the fact in `element`.
    ///
    /// Either the normalized element occurs in the normalized text on word
    /// boundaries, or a single generated sentence holds at least
    /// `fuzzy_threshold` of the element's tokens and every one of its numbers.
    /// Words may differ by inflection; numbers must match exactly.
    pub fn is_present(&self, element: &str, generated: &str) -> bool {
        let needle = normalize(element);
        if needle.is_empty() {
            return true;
        }
        if format!(" {} ", normalize(generated)).contains(&format!(" {} ", needle)) {
            return true;
        }

        let tokens: BTreeSet<&str> = needle.split_whitespace().collect();
        let numbers: Vec<&str> = tokens.iter().copied().filter(|t| is_numeric(t)).collect();

        split_sentences(generated).iter().any(|sentence| {
            let normalized = normalize(sentence.text);
            let candidate: BTreeSet<&str> = normalized.split_whitespace().collect();
            let shared = tokens
                .iter()
                .filter(|t| candidate.iter().any(|c| same_word(t, c)))
                .count();
            shared as f64 / tokens.len() as f64 >= self.fuzzy_threshold
                && numbers.iter().all(|n| candidate.contains(n))
        })
    }
}

fn is_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

/// Equal words, or non-numeric words one small edit apart ("request"/"requests")
fn same_word(a: &str, b: &str) -> bool {
    a == b
        || (!is_numeric(a)
            && !is_numeric(b)
            && strsim::normalized_levenshtein(a, b) >= WORD_SIMILARITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::extractor::extract;
    use proptest::prelude::*;

    const ORIGINAL: &str = "Latency fell 40% after rollout. Bandwidth bills dropped $1200 a month. \
        Edge nodes serve 2 billion requests daily. Cache hit ratio reached 95%. \
        Origin load fell 70% overall. Purges finish in 150ms.";

    #[test]
    fn test_replace_has_empty_report() {
        let elements = extract(ORIGINAL);
        let out = MergeEngine::default().merge(ORIGINAL, "Fresh text.", MergeStrategy::Replace, &elements);
        assert_eq!(out.text, "Fresh text.");
        assert!(out.report.is_empty());
    }

    #[test]
    fn test_append_keeps_everything() {
        let elements = extract(ORIGINAL);
        let out = MergeEngine::default().merge(ORIGINAL, "Fresh text.", MergeStrategy::Append, &elements);
        assert_eq!(out.text, format!("Fresh text.\n\n{}", ORIGINAL));
        assert_eq!(out.report.count(ElementKind::Statistic), 6);
    }

    #[test]
    fn test_smart_skips_present_statistics() {
        let elements = extract(ORIGINAL);
        assert_eq!(elements.len(), 6);
        let generated = "CDNs help a lot. Latency fell 40% after the rollout. \
            The cache hit ratio reached 95%.";
        let out = MergeEngine::default().merge(ORIGINAL, generated, MergeStrategy::Smart, &elements);
        assert_eq!(out.report.count(ElementKind::Statistic), 4);
        assert_eq!(out.report.already_present, 2);
        assert_eq!(out.report.dropped, 0);
        assert!(out.text.starts_with(generated));
        assert!(out.text.contains("Bandwidth bills dropped $1200 a month."));
        assert!(out.text.contains("Purges finish in 150ms."));
        // already-present sentences are not duplicated
        assert_eq!(out.text.matches("95%").count(), 1);
    }

    #[test]
    fn test_smart_caps_by_priority_then_source_order() {
        let original = "A CDN is a network. Edges speak HTTP/3. Traffic grew 30%. \
            Tools such as purge APIs help. Costs fell 10%. Latency hit 20ms. \
            Uptime was 99.9%. Bills fell $50.";
        let elements = extract(original);
        let engine = MergeEngine::default();
        let out = engine.merge(original, "New text.", MergeStrategy::Smart, &elements);

        // five statistic sentences outrank the spec, example and definition
        assert_eq!(out.report.count(ElementKind::Statistic), 5);
        assert!(out.report.dropped > 0);
        assert!(!out.text.contains("A CDN is a network."));
        let grew = out.text.find("Traffic grew 30%.").unwrap();
        let bills = out.text.find("Bills fell $50.").unwrap();
        assert!(grew < bills, "appended in source order");
    }

    #[test]
    fn test_preserve_valuable_appends_all_missing() {
        let elements = extract(ORIGINAL);
        let generated = "Latency fell 40% after the rollout.";
        let out = MergeEngine::default().merge(
            ORIGINAL,
            generated,
            MergeStrategy::PreserveValuable,
            &elements,
        );
        assert_eq!(out.report.count(ElementKind::Statistic), 5);
        assert_eq!(out.report.already_present, 1);
        assert_eq!(out.report.dropped, 0);
    }

    #[test]
    fn test_fuzzy_presence_requires_numbers() {
        let engine = MergeEngine::default();
        assert!(engine.is_present(
            "Latency fell 40% after rollout.",
            "After the rollout, latency fell 40%."
        ));
        assert!(!engine.is_present(
            "Latency fell 40% after rollout.",
            "Latency fell 35% after rollout."
        ));
        assert!(!engine.is_present("Latency fell 40% after rollout.", "Something unrelated."));
    }

    #[test]
    fn test_presence_respects_number_boundaries() {
        let original = "9% of sites use a CDN. 5 million users joined last month.";
        let generated = "Today 99% of sites use a CDN. Over 25 million users joined last month.";
        let engine = MergeEngine::default();
        assert!(!engine.is_present("9% of sites use a CDN.", generated));
        assert!(!engine.is_present("5 million users joined last month.", generated));

        let elements = extract(original);
        assert_eq!(elements.len(), 2);
        let out = engine.merge(original, generated, MergeStrategy::PreserveValuable, &elements);
        assert_eq!(out.report.already_present, 0);
        assert_eq!(out.report.count(ElementKind::Statistic), 2);
        assert!(out.text.ends_with("9% of sites use a CDN. 5 million users joined last month."));
    }

    #[test]
    fn test_presence_tolerates_inflection_not_numbers() {
        let engine = MergeEngine::default();
        assert!(engine.is_present(
            "Edge nodes serve 2 billion requests daily.",
            "Every day, edge nodes serve 2 billion request."
        ));
        assert!(!engine.is_present(
            "Edge nodes serve 2 billion requests daily.",
            "Edge nodes serve 3 billion requests daily."
        ));
    }

    #[test]
    fn test_empty_generated_yields_original_elements() {
        let elements = extract(ORIGINAL);
        let out = MergeEngine::default().merge(ORIGINAL, "", MergeStrategy::PreserveValuable, &elements);
        assert!(out.text.starts_with("Latency fell 40%"));
        assert_eq!(out.report.total_retained(), 6);
    }

    #[test]
    fn test_strategy_parse_and_serde() {
        assert_eq!("preserve_valuable".parse::<MergeStrategy>().unwrap(), MergeStrategy::PreserveValuable);
        assert_eq!("Smart".parse::<MergeStrategy>().unwrap(), MergeStrategy::Smart);
        assert!("merge".parse::<MergeStrategy>().is_err());
        assert_eq!(
            serde_json::to_string(&MergeStrategy::PreserveValuable).unwrap(),
            "\"preserve_valuable\""
        );
    }

    fn arb_fact() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec!["Latency", "Traffic", "Costs", "Uptime", "Throughput"]),
            prop::sample::select(vec!["fell", "rose", "reached", "stayed at"]),
            1u32..1000,
            prop::sample::select(vec!["%", "ms", " Gbps", " million"]),
        )
            .prop_map(|(subject, verb, n, unit)| format!("{} {} {}{}.", subject, verb, n, unit))
    }

    proptest! {
        #[test]
        fn prop_preserve_valuable_never_loses_elements(
            facts in prop::collection::vec(arb_fact(), 0..8),
            filler in prop::collection::vec(prop::sample::select(vec!["Edges help.", "Users notice."]), 0..4),
            generated_facts in prop::collection::vec(arb_fact(), 0..4),
        ) {
            let mut sentences = facts.clone();
            sentences.extend(filler.iter().map(|s| s.to_string()));
            let original = sentences.join(" ");
            let generated = format!("Fresh intro. {}", generated_facts.join(" "));
            let elements = extract(&original);

            let engine = MergeEngine::default();
            let out = engine.merge(&original, &generated, MergeStrategy::PreserveValuable, &elements);
            for element in &elements {
                prop_assert!(
                    engine.is_present(&element.text, &out.text),
                    "lost '{}' in '{}'", element.text, out.text
                );
            }
            prop_assert_eq!(
                out.report.total_retained() + out.report.already_present,
                elements.len()
            );
            prop_assert_eq!(out.report.dropped, 0);
        }
    }
}
