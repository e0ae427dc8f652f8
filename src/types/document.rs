//! Heading tree: the document model shared by every engine component.
//!
//! A [`Document`] is a flat, ordered sequence of [`HeadingNode`]s. Hierarchy is
//! expressed by adjacency: an H3 belongs to the nearest preceding H2.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::text::word_count;
use crate::types::error::{Result, ValidationError, ValidationErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Markdown ATX prefix depth
    pub fn depth(self) -> usize {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }

    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            _ => None,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H1 => write!(f, "H1"),
            Self::H2 => write!(f, "H2"),
            Self::H3 => write!(f, "H3"),
        }
    }
}

impl std::str::FromStr for HeadingLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "H1" => Ok(Self::H1),
            "H2" => Ok(Self::H2),
            "H3" => Ok(Self::H3),
            _ => Err(format!("Unknown heading level: {}. Valid values: H1, H2, H3", s)),
        }
    }
}

/// One heading and the section text beneath it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    pub text: String,
    pub level: HeadingLevel,
    pub content: String,
    pub word_count: usize,
    /// Source order, strictly increasing within a document
    pub position: usize,
}

impl HeadingNode {
    /// Creates a node, deriving `word_count` from `content`
    pub fn new(
        text: impl Into<String>,
        level: HeadingLevel,
        content: impl Into<String>,
        position: usize,
    ) -> Self {
        let content = content.into();
        Self {
            text: text.into(),
            level,
            word_count: word_count(&content),
            content,
            position,
        }
    }
}

/// Serialized form accepted from fetchers; `word_count` and `position` are optional
#[derive(Debug, Deserialize)]
struct RawHeading {
    text: String,
    level: HeadingLevel,
    #[serde(default)]
    content: String,
    word_count: Option<usize>,
    position: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    headings: Vec<RawHeading>,
}

/// Ordered heading tree produced by a fetcher. Immutable once built.
///
/// A document has a single title: every H1 after the first is demoted to an
/// H2 on construction, so its section is reconciled like any other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    pub source: Option<String>,
    headings: Vec<HeadingNode>,
}

impl TryFrom<RawDocument> for Document {
    type Error = ValidationError;

    fn try_from(raw: RawDocument) -> std::result::Result<Self, Self::Error> {
        let mut headings = Vec::with_capacity(raw.headings.len());
        for (index, h) in raw.headings.into_iter().enumerate() {
            let position = h.position.unwrap_or(index);
            let node = HeadingNode::new(h.text, h.level, h.content, position);
            if let Some(declared) = h.word_count
                && declared != node.word_count
            {
                return Err(ValidationError::new(
                    ValidationErrorKind::Consistency,
                    "word_count does not match content",
                )
                .with_field(format!("headings[{}].word_count", index))
                .with_comparison(node.word_count.to_string(), declared.to_string()));
            }
            headings.push(node);
        }
        Document::validate(&headings)?;
        demote_extra_titles(&mut headings);
        Ok(Self {
            source: raw.source,
            headings,
        })
    }
}

impl Document {
    /// Build a document from nodes, checking ordering and word counts
    pub fn new(mut headings: Vec<HeadingNode>) -> Result<Self> {
        Self::validate(&headings)?;
        demote_extra_titles(&mut headings);
        Ok(Self {
            source: None,
            headings,
        })
    }

    /// Build a document from `(level, heading, content)` triples, assigning positions
    pub fn from_sections<I, T, C>(sections: I) -> Self
    where
        I: IntoIterator<Item = (HeadingLevel, T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        let mut headings: Vec<HeadingNode> = sections
            .into_iter()
            .enumerate()
            .map(|(position, (level, text, content))| {
                HeadingNode::new(text, level, content, position)
            })
            .collect();
        demote_extra_titles(&mut headings);
        Self {
            source: None,
            headings,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn validate(headings: &[HeadingNode]) -> std::result::Result<(), ValidationError> {
        for (index, pair) in headings.windows(2).enumerate() {
            if pair[1].position <= pair[0].position {
                return Err(ValidationError::new(
                    ValidationErrorKind::Ordering,
                    "positions must be strictly increasing",
                )
                .with_field(format!("headings[{}].position", index + 1))
                .with_comparison(
                    format!("> {}", pair[0].position),
                    pair[1].position.to_string(),
                ));
            }
        }
        for (index, node) in headings.iter().enumerate() {
            let actual = word_count(&node.content);
            if node.word_count != actual {
                return Err(ValidationError::new(
                    ValidationErrorKind::Consistency,
                    "word_count does not match content",
                )
                .with_field(format!("headings[{}].word_count", index))
                .with_comparison(actual.to_string(), node.word_count.to_string()));
            }
        }
        Ok(())
    }

    pub fn headings(&self) -> &[HeadingNode] {
        &self.headings
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.headings.len()
    }

    /// First H1, treated as the document title and primary subject
    pub fn title(&self) -> Option<&HeadingNode> {
        self.headings.iter().find(|h| h.level == HeadingLevel::H1)
    }

    pub fn h2s(&self) -> impl Iterator<Item = (usize, &HeadingNode)> {
        self.headings
            .iter()
            .enumerate()
            .filter(|(_, h)| h.level == HeadingLevel::H2)
    }

    /// Headings that take part in reconciliation (everything below the title)
    pub fn sections(&self) -> impl Iterator<Item = (usize, &HeadingNode)> {
        self.headings
            .iter()
            .enumerate()
            .filter(|(_, h)| h.level != HeadingLevel::H1)
    }

    /// Index of the H2 an H3 belongs to
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        if self.headings.get(index)?.level != HeadingLevel::H3 {
            return None;
        }
        self.headings[..index]
            .iter()
            .rposition(|h| h.level != HeadingLevel::H3)
            .filter(|&i| self.headings[i].level == HeadingLevel::H2)
    }

    /// H3 children of the H2 at `index`
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = (usize, &HeadingNode)> {
        self.headings
            .iter()
            .enumerate()
            .skip(index + 1)
            .take_while(|(_, h)| h.level == HeadingLevel::H3)
    }

    pub fn total_words(&self) -> usize {
        self.headings.iter().map(|h| h.word_count).sum()
    }
}

fn demote_extra_titles(headings: &mut [HeadingNode]) {
    let mut seen_title = false;
    for node in headings.iter_mut().filter(|h| h.level == HeadingLevel::H1) {
        if seen_title {
            node.level = HeadingLevel::H2;
        }
        seen_title = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_sections([
            (HeadingLevel::H1, "CDN guide", "Intro text here."),
            (HeadingLevel::H2, "What is a CDN?", "A CDN is a network."),
            (HeadingLevel::H3, "Edge servers", "Edge servers cache content."),
            (HeadingLevel::H3, "Origin", "The origin holds the source."),
            (HeadingLevel::H2, "CDN benefits", ""),
        ])
    }

    #[test]
    fn test_word_count_derived() {
        let node = HeadingNode::new("A", HeadingLevel::H2, "one two  three\nfour", 0);
        assert_eq!(node.word_count, 4);
    }

    #[test]
    fn test_adjacency() {
        let doc = sample();
        assert_eq!(doc.title().map(|h| h.text.as_str()), Some("CDN guide"));
        assert_eq!(doc.h2s().count(), 2);
        assert_eq!(doc.parent_of(2), Some(1));
        assert_eq!(doc.parent_of(3), Some(1));
        assert_eq!(doc.parent_of(1), None);
        let children: Vec<usize> = doc.children_of(1).map(|(i, _)| i).collect();
        assert_eq!(children, vec![2, 3]);
        assert_eq!(doc.children_of(4).count(), 0);
        assert_eq!(doc.sections().count(), 4);
    }

    #[test]
    fn test_later_h1_becomes_section() {
        let doc = Document::from_sections([
            (HeadingLevel::H1, "CDN guide", ""),
            (HeadingLevel::H2, "What is a CDN?", "A network."),
            (HeadingLevel::H1, "Appendix: CDN benchmarks", "Uptime reached 99.99%."),
            (HeadingLevel::H3, "Method", "We tested 40 regions."),
        ]);
        assert_eq!(doc.title().map(|h| h.text.as_str()), Some("CDN guide"));
        assert_eq!(doc.headings()[2].level, HeadingLevel::H2);
        assert_eq!(doc.sections().count(), 3);
        assert_eq!(doc.parent_of(3), Some(2));

        let json = r#"{"headings": [
            {"text": "Guide", "level": "H1"},
            {"text": "Appendix", "level": "H1", "content": "x"}
        ]}"#;
        let parsed: Document = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.headings()[1].level, HeadingLevel::H2);
    }

    #[test]
    fn test_rejects_unordered_positions() {
        let nodes = vec![
            HeadingNode::new("A", HeadingLevel::H2, "", 3),
            HeadingNode::new("B", HeadingLevel::H2, "", 3),
        ];
        assert!(Document::new(nodes).is_err());
    }

    #[test]
    fn test_rejects_stale_word_count() {
        let mut node = HeadingNode::new("A", HeadingLevel::H2, "two words", 0);
        node.word_count = 5;
        assert!(Document::new(vec![node]).is_err());
    }

    #[test]
    fn test_deserialize_assigns_positions() {
        let json = r#"{
            "source": "https://example.com/cdn",
            "headings": [
                {"text": "What is a CDN?", "level": "H2", "content": "A network of servers."},
                {"text": "How does a CDN work?", "level": "H2"}
            ]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.headings()[1].position, 1);
        assert_eq!(doc.headings()[0].word_count, 4);
        assert_eq!(doc.source.as_deref(), Some("https://example.com/cdn"));
    }

    #[test]
    fn test_deserialize_rejects_mismatched_word_count() {
        let json = r#"{"headings": [{"text": "A", "level": "H2", "content": "x y", "word_count": 7}]}"#;
        assert!(serde_json::from_str::<Document>(json).is_err());
    }
}
