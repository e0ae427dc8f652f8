//! Sentence segmentation with byte spans.

use crate::types::Span;

/// Tokens that end in a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "dr", "mr", "mrs", "ms", "inc", "approx", "fig", "no", "st",
];

/// A sentence slice and its location in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub span: Span,
    /// Zero-based sentence index within the source
    pub index: usize,
}

/// Split text into sentences.
///
/// Boundaries are `.`, `!` or `?` followed by whitespace (or end of input,
/// optionally through a closing quote or parenthesis) and line breaks.
/// Decimals and common abbreviations do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (offset, ch) = chars[i];
        let boundary_end = match ch {
            '\n' => Some(offset),
            '.' | '!' | '?' => {
                let mut j = i + 1;
                while j < chars.len() && matches!(chars[j].1, '"' | '\u{201d}' | '\'' | ')') {
                    j += 1;
                }
                let at_break = j >= chars.len() || chars[j].1.is_whitespace();
                if at_break && !(ch == '.' && ends_with_abbreviation(&text[start..offset])) {
                    i = j - 1;
                    Some(if j < chars.len() { chars[j].0 } else { text.len() })
                } else {
                    None
                }
            }
            _ => None,
        };

        if let Some(end) = boundary_end {
            push_trimmed(text, start, end, &mut sentences);
            start = end;
        }
        i += 1;
    }
    push_trimmed(text, start, text.len(), &mut sentences);
    sentences
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let last = segment
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("")
        .to_lowercase();
    ABBREVIATIONS.contains(&last.as_str())
}

fn push_trimmed<'a>(text: &'a str, start: usize, end: usize, out: &mut Vec<Sentence<'a>>) {
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let s = start + leading;
    let e = s + trimmed.len();
    out.push(Sentence {
        text: &text[s..e],
        span: Span::new(s, e),
        index: out.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        split_sentences(input).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_basic_split() {
        assert_eq!(
            texts("A CDN caches content. It reduces latency! Does it help?"),
            vec!["A CDN caches content.", "It reduces latency!", "Does it help?"]
        );
    }

    #[test]
    fn test_decimals_and_abbreviations() {
        assert_eq!(
            texts("Uptime is 99.99% on average. Formats, e.g. WebP, load fast."),
            vec!["Uptime is 99.99% on average.", "Formats, e.g. WebP, load fast."]
        );
    }

    #[test]
    fn test_line_breaks_split() {
        assert_eq!(
            texts("- Lower latency\n- Fewer origin hits\n\nClosing words"),
            vec!["- Lower latency", "- Fewer origin hits", "Closing words"]
        );
    }

    #[test]
    fn test_closing_quote_kept() {
        assert_eq!(
            texts("She said \"speed matters.\" Then left."),
            vec!["She said \"speed matters.\"", "Then left."]
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        let input = "  First one.   Second one.";
        for sentence in split_sentences(input) {
            assert_eq!(&input[sentence.span.start..sentence.span.end], sentence.text);
        }
        assert_eq!(split_sentences(input)[1].index, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
    }
}
