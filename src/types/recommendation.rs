use serde::{Deserialize, Serialize};
use std::fmt;

use super::document::HeadingLevel;

/// Structural action assigned to one topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Keep,
    Improve,
    Add,
    Remove,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "KEEP"),
            Self::Improve => write!(f, "IMPROVE"),
            Self::Add => write!(f, "ADD"),
            Self::Remove => write!(f, "REMOVE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    /// Original heading text; `None` for ADD
    pub existing_heading: Option<String>,
    pub proposed_heading: String,
    pub level: HeadingLevel,
    /// Names the rule or condition that produced the action
    pub reason: String,
    /// Number of competitors covering this topic
    pub competitor_support: usize,
    pub subheadings: Vec<String>,
    /// Canonical key of the topic this recommendation is about
    pub topic_key: String,
    /// Source position of the existing heading
    pub existing_position: Option<usize>,
    pub quality_score: Option<u8>,
    /// Mean relative position (0.0-1.0) of the topic among competitor H2s
    pub typical_position: Option<f64>,
}

impl Recommendation {
    /// Recommendation for a heading that exists in the source document
    pub fn existing(
        action: Action,
        heading: impl Into<String>,
        level: HeadingLevel,
        position: usize,
        topic_key: impl Into<String>,
    ) -> Self {
        let heading = heading.into();
        Self {
            action,
            proposed_heading: heading.clone(),
            existing_heading: Some(heading),
            level,
            reason: String::new(),
            competitor_support: 0,
            subheadings: Vec::new(),
            topic_key: topic_key.into(),
            existing_position: Some(position),
            quality_score: None,
            typical_position: None,
        }
    }

    /// New section suggested by competitor coverage
    pub fn add(
        proposed_heading: impl Into<String>,
        topic_key: impl Into<String>,
        competitor_support: usize,
    ) -> Self {
        Self {
            action: Action::Add,
            existing_heading: None,
            proposed_heading: proposed_heading.into(),
            level: HeadingLevel::H2,
            reason: String::new(),
            competitor_support,
            subheadings: Vec::new(),
            topic_key: topic_key.into(),
            existing_position: None,
            quality_score: None,
            typical_position: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn with_support(mut self, support: usize) -> Self {
        self.competitor_support = support;
        self
    }

    pub fn with_subheadings(mut self, subheadings: Vec<String>) -> Self {
        self.subheadings = subheadings;
        self
    }

    pub fn with_typical_position(mut self, position: f64) -> Self {
        self.typical_position = Some(position);
        self
    }

    /// Heading text the section carries after the plan is applied
    pub fn final_heading(&self) -> &str {
        &self.proposed_heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_constructor() {
        let rec = Recommendation::existing(Action::Keep, "What is a CDN?", HeadingLevel::H2, 3, "cdn")
            .with_reason("already optimal")
            .with_score(82);
        assert_eq!(rec.existing_heading.as_deref(), Some("What is a CDN?"));
        assert_eq!(rec.proposed_heading, "What is a CDN?");
        assert_eq!(rec.existing_position, Some(3));
        assert_eq!(rec.quality_score, Some(82));
    }

    #[test]
    fn test_add_constructor() {
        let rec = Recommendation::add("How does CDN caching work?", "cach cdn", 4)
            .with_typical_position(0.4);
        assert_eq!(rec.existing_heading, None);
        assert_eq!(rec.level, HeadingLevel::H2);
        assert_eq!(rec.competitor_support, 4);
        assert_eq!(rec.action, Action::Add);
    }

    #[test]
    fn test_action_serde() {
        let json = serde_json::to_string(&Action::Improve).unwrap();
        assert_eq!(json, "\"IMPROVE\"");
        assert_eq!(Action::Remove.to_string(), "REMOVE");
    }
}
