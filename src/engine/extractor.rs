//! Valuable-Element Extractor
//!
//! Scans section text sentence by sentence and tags fact-bearing sentences.
//! Each detection rule is a standalone predicate so it can be tested alone.
//! At most one element per kind per sentence; output follows sentence order,
//! then [`EMISSION_ORDER`] within a sentence.

use regex::Regex;
use std::sync::LazyLock;

use crate::text::{Sentence, split_sentences};
use crate::types::{ElementKind, ValuableElement};

/// Order in which kinds found in the same sentence are emitted
pub const EMISSION_ORDER: [ElementKind; 5] = [
    ElementKind::Statistic,
    ElementKind::Quote,
    ElementKind::Example,
    ElementKind::Specification,
    ElementKind::Definition,
];

// =============================================================================
// Patterns
// =============================================================================

static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d(?:[.,]\d+)?\s?%").unwrap());

static RE_CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$€£¥]\s?\d|\d\s?[$€£¥]").unwrap());

static RE_MAGNITUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:[.,]\d+)?\s*(?:thousand|million|billion|trillion)\b").unwrap()
});

static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d+(?:[.,]\d+)?\s?(?:ms|s|GB|MB|TB|KB|Gbps|Mbps|Tbps|PoPs|x)\b|(?i:\b\d+(?:[.,]\d+)?\s?(?:uptime|latency)\b|\b(?:uptime|latency)\s+(?:of\s+)?\d)",
    )
    .unwrap()
});

static RE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\u{201c}]([^"\u{201c}\u{201d}]{10,})["\u{201d}]"#).unwrap());

static RE_REPORTING_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:said|says|stated|explained|reported|according to)\b").unwrap()
});

static RE_EXAMPLE_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:for example|such as|for instance|case study)\b|\be\.g\.").unwrap()
});

static RE_PROTOCOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:API|SDK|HTTPS?|HTTP/[23]|TLS|SSL|TCP|UDP|QUIC|DNS|REST|gRPC|JSON|XML|IPv[46])\b|(?i:\bprotocols?\b)",
    )
    .unwrap()
});

static RE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bv\d+(?:\.\d+)+\b|\b\d+\.\d+\.\d+\b|(?i:\bversion\s+\d)").unwrap()
});

static RE_KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z_][\w.-]*=[\w\x22'-]|\b[A-Z][a-z]+(?:-[A-Z][a-z]+)+:\s*\S").unwrap()
});

static RE_DEFINITION_VERB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(?:is|are|refers\s+to)\s").unwrap());

/// Subjects that make "X is ..." a remark rather than a definition
const NON_DEFINING_SUBJECTS: &[&str] = &[
    "it", "this", "that", "there", "these", "those", "they", "here", "what", "which", "who",
];

const MAX_DEFINITION_SUBJECT_WORDS: usize = 6;

// =============================================================================
// Rules
// =============================================================================

pub fn is_statistic(sentence: &str) -> bool {
    RE_PERCENT.is_match(sentence)
        || RE_CURRENCY.is_match(sentence)
        || RE_MAGNITUDE.is_match(sentence)
        || RE_UNIT.is_match(sentence)
}

pub fn is_quote(sentence: &str) -> bool {
    if RE_QUOTED.is_match(sentence) {
        return true;
    }
    RE_REPORTING_VERB.is_match(sentence) && has_proper_noun(sentence)
}

/// Capitalized word anywhere but the first position
fn has_proper_noun(sentence: &str) -> bool {
    sentence.split_whitespace().skip(1).any(|word| {
        word.trim_start_matches(|c: char| !c.is_alphanumeric())
            .chars()
            .next()
            .is_some_and(char::is_uppercase)
    })
}

pub fn is_example(sentence: &str) -> bool {
    RE_EXAMPLE_CUE.is_match(sentence)
}

pub fn is_specification(sentence: &str) -> bool {
    RE_PROTOCOL.is_match(sentence)
        || RE_VERSION.is_match(sentence)
        || RE_KEY_VALUE.is_match(sentence)
}

/// `<Subject> is/are/refers to ...` with a short, non-pronoun subject
pub fn is_definition(sentence: &str) -> bool {
    let trimmed = sentence.trim();
    if trimmed.ends_with('?') {
        return false;
    }
    let Some(found) = RE_DEFINITION_VERB.find(trimmed) else {
        return false;
    };
    let subject = &trimmed[..found.start()];
    if subject.contains([',', ';', ':']) {
        return false;
    }
    let words: Vec<&str> = subject.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_DEFINITION_SUBJECT_WORDS {
        return false;
    }
    let first = words[0]
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    !(words.len() == 1 && NON_DEFINING_SUBJECTS.contains(&first.as_str()))
}

fn matches_kind(kind: ElementKind, sentence: &Sentence<'_>) -> bool {
    match kind {
        ElementKind::Statistic => is_statistic(sentence.text),
        ElementKind::Quote => is_quote(sentence.text),
        ElementKind::Example => is_example(sentence.text),
        ElementKind::Specification => is_specification(sentence.text),
        // Definitions open a section; later "X is Y" sentences are ordinary prose
        ElementKind::Definition => sentence.index < 2 && is_definition(sentence.text),
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Tag every valuable sentence in `text`
pub fn extract(text: &str) -> Vec<ValuableElement> {
    let mut elements = Vec::new();
    for sentence in split_sentences(text) {
        for kind in EMISSION_ORDER {
            if matches_kind(kind, &sentence) {
                elements.push(ValuableElement::new(kind, sentence.text, sentence.span));
            }
        }
    }
    elements
}
