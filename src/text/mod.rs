//! Text primitives shared by the engine
//!
//! - `canonical`: topic keys and the topic matcher
//! - `question`: question-format detection, rewriting and sentence casing
//! - `sentence`: sentence segmentation with spans

pub mod canonical;
pub mod question;
pub mod sentence;

pub use canonical::{TopicKey, TopicMatch, TopicMatcher, content_tokens, jaccard, raw_tokens, stem};
pub use question::{QuestionPattern, is_faq, is_question_format, sentence_case, to_question};
pub use sentence::{Sentence, split_sentences};

/// Whitespace-delimited word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercase, strip punctuation except digits' decimal points and percent
/// signs, collapse whitespace. Used for fuzzy containment checks.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let keep = c.is_alphanumeric()
            || c == '%'
            || (c == '.'
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()));
        if keep {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  one\ttwo\nthree  "), 3);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Uptime:  99.99%, \"always\"."), "uptime 99.99% always");
        assert_eq!(normalize("End of sentence. Next"), "end of sentence next");
        assert_eq!(normalize(""), "");
    }
}
