//! Canonical topic keys
//!
//! The single definition of "same topic" used by the aggregator and the
//! classifier. A heading is lowercased, split into alphanumeric tokens,
//! stripped of stop words (including question words) and stemmed. The
//! resulting token set is the key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::matching as defaults;

const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been", "being",
    "by", "can", "could", "did", "do", "does", "for", "from", "has", "have", "how", "i", "if",
    "in", "into", "is", "it", "its", "may", "might", "more", "most", "must", "my", "not", "of",
    "on", "or", "our", "should", "so", "some", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "us", "versus", "very", "vs", "was", "we",
    "were", "what", "when", "where", "which", "who", "whom", "whose", "why", "will", "with",
    "would", "you", "your",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Light suffix-stripping stemmer.
///
/// Conflates the plural/verb forms headings actually vary in
/// ("benefits"/"benefit", "caching"/"cache"/"cached", "works"/"working").
pub fn stem(token: &str) -> String {
    let mut word = token.to_string();
    let len = word.chars().count();
    if len <= 3 || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return word;
    }

    if len > 4 && word.ends_with("ies") {
        word.truncate(word.len() - 3);
        word.push('y');
    } else if word.ends_with("sses") {
        word.truncate(word.len() - 2);
    } else if len > 5 && word.ends_with("ing") {
        word.truncate(word.len() - 3);
    } else if len > 4 && word.ends_with("ed") {
        word.truncate(word.len() - 2);
    } else if ["ches", "shes", "xes"].iter().any(|s| word.ends_with(s)) {
        word.truncate(word.len() - 2);
    } else if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is") {
        word.truncate(word.len() - 1);
    }

    if word.len() > 4 && word.ends_with('e') {
        word.truncate(word.len() - 1);
    }
    word
}

/// Lowercased alphanumeric tokens, in order, without filtering
pub fn raw_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Stemmed content tokens with stop words and single characters removed
pub fn content_tokens(text: &str) -> BTreeSet<String> {
    raw_tokens(text)
        .filter(|t| t.chars().count() > 1 && !is_stop_word(t))
        .map(|t| stem(&t))
        .collect()
}

/// Canonical form of a heading
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicKey(BTreeSet<String>);

impl TopicKey {
    pub fn from_heading(text: &str) -> Self {
        Self(content_tokens(text))
    }

    /// Parse the space-joined form produced by `Display`
    pub fn parse(key: &str) -> Self {
        Self(key.split_whitespace().map(str::to_string).collect())
    }

    pub fn tokens(&self) -> &BTreeSet<String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// |A ∩ B| / max(|A|, |B|); 0.0 when either key is empty
    pub fn overlap(&self, other: &TopicKey) -> f64 {
        let larger = self.len().max(other.len());
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let shared = self.0.intersection(&other.0).count();
        shared as f64 / larger as f64
    }

    /// Fraction of this key's tokens present in `tokens`
    pub fn coverage_in(&self, tokens: &BTreeSet<String>) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let hits = self.0.iter().filter(|t| tokens.contains(*t)).count();
        hits as f64 / self.len() as f64
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", joined.join(" "))
    }
}

/// Outcome of comparing two topic keys
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TopicMatch {
    /// Identical token sets
    Same,
    /// Overlap at or above the threshold
    Overlap(f64),
    /// Some shared tokens but below the threshold; treated as distinct topics
    Ambiguous(f64),
    Distinct,
}

impl TopicMatch {
    pub fn is_match(self) -> bool {
        matches!(self, Self::Same | Self::Overlap(_))
    }

    pub fn score(self) -> f64 {
        match self {
            Self::Same => 1.0,
            Self::Overlap(v) | Self::Ambiguous(v) => v,
            Self::Distinct => 0.0,
        }
    }
}

/// Decides whether two canonical keys describe the same topic
#[derive(Debug, Clone, Copy)]
pub struct TopicMatcher {
    threshold: f64,
}

impl Default for TopicMatcher {
    fn default() -> Self {
        Self::new(defaults::TOPIC_OVERLAP_THRESHOLD)
    }
}

impl TopicMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn compare(&self, a: &TopicKey, b: &TopicKey) -> TopicMatch {
        if a.is_empty() || b.is_empty() {
            return TopicMatch::Distinct;
        }
        if a == b {
            return TopicMatch::Same;
        }
        let overlap = a.overlap(b);
        if overlap >= self.threshold {
            TopicMatch::Overlap(overlap)
        } else if overlap > 0.0 {
            TopicMatch::Ambiguous(overlap)
        } else {
            TopicMatch::Distinct
        }
    }

    pub fn matches(&self, a: &TopicKey, b: &TopicKey) -> bool {
        self.compare(a, b).is_match()
    }
}

/// Jaccard similarity of two token sets
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.union(b).count();
    shared as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS, "binary search requires a sorted list");
    }

    #[test]
    fn test_stem_conflates_forms() {
        assert_eq!(stem("benefits"), stem("benefit"));
        assert_eq!(stem("caching"), stem("cache"));
        assert_eq!(stem("cached"), stem("caches"));
        assert_eq!(stem("works"), stem("working"));
        assert_eq!(stem("companies"), "company");
        assert_eq!(stem("cdn"), "cdn");
        assert_eq!(stem("http2"), "http2");
    }

    #[test]
    fn test_key_ignores_question_words_and_order() {
        let a = TopicKey::from_heading("What are the benefits of a CDN?");
        let b = TopicKey::from_heading("CDN Benefits");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "benefit cdn");
    }

    #[test]
    fn test_key_roundtrips_through_display() {
        let key = TopicKey::from_heading("How does CDN caching work?");
        assert_eq!(TopicKey::parse(&key.to_string()), key);
    }

    #[test]
    fn test_matcher_threshold() {
        let matcher = TopicMatcher::new(0.7);
        let base = TopicKey::parse("cach cdn edg rul");
        let close = TopicKey::parse("cach cdn edg");
        let far = TopicKey::parse("cach cdn");
        // 3 of 4 tokens shared
        assert_eq!(matcher.compare(&base, &close), TopicMatch::Overlap(0.75));
        // 2 of 4 shared: ambiguous, resolved as distinct
        let result = matcher.compare(&base, &far);
        assert!(matches!(result, TopicMatch::Ambiguous(v) if (v - 0.5).abs() < 1e-9));
        assert!(!result.is_match());
        assert_eq!(
            matcher.compare(&base, &TopicKey::parse("pric")),
            TopicMatch::Distinct
        );
    }

    #[test]
    fn test_empty_keys_never_match() {
        let matcher = TopicMatcher::default();
        let empty = TopicKey::from_heading("What is the?");
        assert!(empty.is_empty());
        assert!(!matcher.matches(&empty, &empty));
    }

    #[test]
    fn test_jaccard() {
        let a = content_tokens("edge servers cache static assets");
        let b = content_tokens("edge servers cache static assets");
        assert!((jaccard(&a, &b) - 1.0).abs() < 1e-9);
        let c = content_tokens("pricing plans");
        assert_eq!(jaccard(&a, &c), 0.0);
    }
}
