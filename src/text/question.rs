//! Question-format detection and rewriting
//!
//! The single definition of "question format": an H2 is compliant when its
//! first word is interrogative and it ends with `?`. FAQ section headings are
//! exempt. Rewrites only introduce stop words, so the canonical topic key of
//! a rewritten heading equals the key of the original.

use regex::Regex;
use std::sync::LazyLock;

const QUESTION_STARTERS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "who", "is", "are", "can", "does", "do",
    "should", "will",
];

/// Acronyms kept upper-case by sentence casing
const ACRONYMS: &[&str] = &[
    "CDN", "API", "DNS", "SSL", "TLS", "HTTP", "HTTPS", "VPN", "SLA", "FAQ", "SEO", "AI", "ML",
    "GPU", "CPU", "RAM", "SSD", "HDD", "DDOS", "WAF", "URL", "SDK",
];

static RE_DEFINITION_SINGULAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(what is|define|explain what)\b").unwrap());
static RE_DEFINITION_PLURAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^what are\b").unwrap());
static RE_HOW_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(how to|how can (i|you|we|one)|steps to)\b").unwrap());
static RE_HOW_PROCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(how does|how do|how .+ works?\??$)").unwrap());
static RE_YES_NO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(is|are|was|were|will|would|can|could|should|does|do|did|has|have)\b")
        .unwrap()
});
static RE_TYPES_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(types|kinds)\s+of\s+(.+)$").unwrap());
static RE_WHY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^why\b").unwrap());
static RE_WHEN_WHERE_WHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(when|where|who|which)\b").unwrap());

/// Answer shape a heading asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPattern {
    DefinitionSingular,
    DefinitionPlural,
    HowTo,
    HowProcess,
    YesNo,
    Why,
    Factual,
    Statement,
}

impl QuestionPattern {
    pub fn detect(heading: &str) -> Self {
        let h = heading.trim();
        if RE_DEFINITION_SINGULAR.is_match(h) {
            Self::DefinitionSingular
        } else if RE_DEFINITION_PLURAL.is_match(h) {
            Self::DefinitionPlural
        } else if RE_HOW_TO.is_match(h) {
            Self::HowTo
        } else if RE_HOW_PROCESS.is_match(h) {
            Self::HowProcess
        } else if RE_WHY.is_match(h) {
            Self::Why
        } else if RE_WHEN_WHERE_WHO.is_match(h) {
            Self::Factual
        } else if RE_YES_NO.is_match(h) {
            Self::YesNo
        } else {
            Self::Statement
        }
    }

    /// Short instruction describing the expected answer shape
    pub fn answer_guidance(self) -> &'static str {
        match self {
            Self::DefinitionSingular => {
                "Open with a direct one-sentence definition, then two or three sentences of expansion."
            }
            Self::DefinitionPlural => {
                "Open with a sentence introducing the list, then bullet points with a bold term and explanation."
            }
            Self::HowTo => "Restate the goal, then give ordered steps.",
            Self::HowProcess => "Explain the mechanism directly, then break the process down.",
            Self::YesNo => "Answer yes or no in the first sentence, then justify.",
            Self::Why => "State the main reason first, then supporting reasons.",
            Self::Factual => "Give the direct answer first, then context.",
            Self::Statement => "Cover the topic directly and concretely.",
        }
    }
}

pub fn is_faq(heading: &str) -> bool {
    let lower = heading.trim().to_lowercase();
    let bare = lower.trim_end_matches(['?', ':', '.']);
    bare == "faq"
        || bare == "faqs"
        || lower.contains("frequently asked")
        || lower.contains("common questions")
}

fn first_word(heading: &str) -> String {
    heading
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn starts_with_question_word(heading: &str) -> bool {
    QUESTION_STARTERS.contains(&first_word(heading).as_str())
}

/// Whether an H2 already satisfies the question-format convention
pub fn is_question_format(heading: &str) -> bool {
    if is_faq(heading) {
        return true;
    }
    starts_with_question_word(heading) && heading.trim().ends_with('?')
}

fn is_acronym(word: &str) -> bool {
    let core = word.trim_matches(|c: char| !c.is_alphanumeric());
    if core.is_empty() {
        return false;
    }
    let leading = core
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("")
        .to_uppercase();
    ACRONYMS.contains(&leading.as_str())
        || (core.len() <= 4
            && core.chars().any(|c| c.is_ascii_alphabetic())
            && core.chars().all(|c| !c.is_lowercase())
            && core.chars().count() > 1)
}

/// Mixed-case product tokens such as "gRPC" or "IPv6"
fn is_mixed_case(word: &str) -> bool {
    word.chars().skip(1).any(|c| c.is_uppercase()) && word.chars().any(|c| c.is_lowercase())
}

/// Only the first letter capitalized; acronyms and mixed-case tokens preserved
pub fn sentence_case(text: &str) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            if is_acronym(word) {
                let core = word.trim_matches(|c: char| !c.is_alphanumeric());
                let leading = core.split(|c: char| !c.is_alphanumeric()).next().unwrap_or("");
                word.replacen(leading, &leading.to_uppercase(), 1)
            } else if is_mixed_case(word) {
                word.to_string()
            } else if i == 0 {
                let lower = word.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            } else {
                word.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop words matching `pred` and a dangling leading connective
fn subject_without(words: &[&str], pred: impl Fn(&str) -> bool) -> String {
    let kept: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| !pred(&w.to_lowercase()))
        .collect();
    let mut slice = kept.as_slice();
    while let Some(first) = slice.first() {
        if matches!(first.to_lowercase().as_str(), "of" | "the" | "and" | "for") {
            slice = &slice[1..];
        } else {
            break;
        }
    }
    slice.join(" ")
}

/// "What are the benefits of X?", or "What are the benefits?" without a subject
fn list_question(noun: &str, subject: &str) -> String {
    if subject.is_empty() {
        format!("What are the {}?", noun)
    } else {
        format!("What are the {} of {}?", noun, subject)
    }
}

fn looks_plural(word: &str) -> bool {
    let lower = word.to_lowercase();
    lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") && !is_acronym(word)
}

/// Reword a heading as a direct question.
///
/// Already-compliant headings are only sentence-cased.
pub fn to_question(heading: &str) -> String {
    let trimmed = heading.trim();
    if is_question_format(trimmed) {
        return sentence_case(trimmed);
    }

    let base = trimmed.trim_end_matches(['?', ':', '.', '!']).trim();
    if base.is_empty() {
        return String::new();
    }
    if starts_with_question_word(base) {
        return sentence_case(&format!("{}?", base));
    }

    let words: Vec<&str> = base.split_whitespace().collect();
    let lower = base.to_lowercase();

    let question = if lower.contains("benefit") {
        list_question("benefits", &subject_without(&words, |w| w.starts_with("benefit")))
    } else if lower.contains("advantage") {
        list_question("advantages", &subject_without(&words, |w| w.starts_with("advantage")))
    } else if lower.contains("feature") {
        list_question("features", &subject_without(&words, |w| w.starts_with("feature")))
    } else if let Some(caps) = RE_TYPES_OF.captures(base) {
        list_question(&caps[1].to_lowercase(), caps[2].trim())
    } else if words.last().is_some_and(|w| looks_plural(w)) {
        format!("What are {}?", base)
    } else {
        format!("What is {}?", base)
    };

    sentence_case(question.replace("  ", " ").replace(" ?", "?").as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TopicKey;

    #[test]
    fn test_question_format() {
        assert!(is_question_format("What is a CDN?"));
        assert!(is_question_format("How does caching work?"));
        assert!(!is_question_format("What is a CDN"));
        assert!(!is_question_format("CDN Benefits"));
        assert!(is_question_format("Frequently asked questions"));
        assert!(is_question_format("FAQ"));
    }

    #[test]
    fn test_sentence_case_preserves_acronyms() {
        assert_eq!(sentence_case("what are the BENEFITS of a cdn?"), "What are the benefits of a CDN?");
        assert_eq!(sentence_case("How Does gRPC Use HTTP/2"), "How does gRPC use HTTP/2");
        assert_eq!(sentence_case("is DNS fast?"), "Is DNS fast?");
    }

    #[test]
    fn test_rewrites() {
        assert_eq!(to_question("CDN Benefits"), "What are the benefits of CDN?");
        assert_eq!(
            to_question("Benefits of using a CDN"),
            "What are the benefits of using a CDN?"
        );
        assert_eq!(to_question("Key Features"), "What are the features of key?");
        assert_eq!(to_question("Types of caching"), "What are the types of caching?");
        assert_eq!(to_question("Kinds of edge nodes"), "What are the kinds of edge nodes?");
        assert_eq!(to_question("Types offered by CDNs"), "What are types offered by CDNs?");
        assert_eq!(to_question("Benefits"), "What are the benefits?");
        assert_eq!(to_question("Features:"), "What are the features?");
        assert_eq!(to_question("How CDNs work"), "How CDNs work?");
        assert_eq!(to_question("Pricing"), "What is pricing?");
        assert_eq!(to_question("Edge locations"), "What are edge locations?");
        assert_eq!(to_question("what is a cdn?"), "What is a CDN?");
    }

    #[test]
    fn test_rewrites_preserve_topic_key() {
        for heading in [
            "CDN Benefits",
            "Benefits of using a CDN",
            "Types of caching",
            "Edge locations",
            "CDN security features",
            "Advantages of edge computing",
            "Types offered by CDNs",
            "Kinds of edge nodes",
            "Benefits",
        ] {
            assert_eq!(
                TopicKey::from_heading(heading),
                TopicKey::from_heading(&to_question(heading)),
                "key changed for {}",
                heading
            );
        }
    }

    #[test]
    fn test_pattern_detection() {
        assert_eq!(QuestionPattern::detect("What is a CDN?"), QuestionPattern::DefinitionSingular);
        assert_eq!(QuestionPattern::detect("What are the benefits of a CDN?"), QuestionPattern::DefinitionPlural);
        assert_eq!(QuestionPattern::detect("How to set up a CDN"), QuestionPattern::HowTo);
        assert_eq!(QuestionPattern::detect("How does a CDN work?"), QuestionPattern::HowProcess);
        assert_eq!(QuestionPattern::detect("Why use a CDN?"), QuestionPattern::Why);
        assert_eq!(QuestionPattern::detect("Is a CDN secure?"), QuestionPattern::YesNo);
        assert_eq!(QuestionPattern::detect("CDN pricing"), QuestionPattern::Statement);
    }
}
