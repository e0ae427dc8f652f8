//! Competitor Aggregator
//!
//! Folds N competitor heading trees into a frequency-annotated topic set.
//! H2 and H3 topics are grouped separately with the shared topic matcher;
//! each group remembers which documents covered it, a few example phrasings,
//! the H3 subtopics competitors nest under it, and where it tends to sit.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::MatchingConfig;
use crate::text::{TopicKey, TopicMatch, TopicMatcher};
use crate::types::{Document, HeadingLevel, Result, ReweaveError};

/// Whether enough competitors were usable to trust the topic set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageStatus {
    Sufficient,
    InsufficientData { usable: usize, required: usize },
}

/// One competitor topic and the evidence for it
#[derive(Debug, Clone, Serialize)]
pub struct TopicEntry {
    pub key: TopicKey,
    /// Distinct competitor documents covering the topic
    pub occurrence_count: usize,
    /// Original phrasings, first seen first
    pub example_headings: Vec<String>,
    /// Nested subtopics, deduplicated by canonical key, first seen first
    pub suggested_subtopics: Vec<String>,
    /// Mean relative position (0.0-1.0) among the document's headings of this level
    pub typical_position: f64,
    #[serde(skip)]
    documents: BTreeSet<usize>,
    #[serde(skip)]
    subtopic_keys: Vec<TopicKey>,
    #[serde(skip)]
    position_sum: f64,
}

impl TopicEntry {
    fn new(key: TopicKey) -> Self {
        Self {
            key,
            occurrence_count: 0,
            example_headings: Vec::new(),
            suggested_subtopics: Vec::new(),
            typical_position: 0.0,
            documents: BTreeSet::new(),
            subtopic_keys: Vec::new(),
            position_sum: 0.0,
        }
    }

    fn observe(&mut self, doc: usize, heading: &str, relative_position: f64, max_examples: usize) {
        if self.example_headings.len() < max_examples
            && !self.example_headings.iter().any(|h| h == heading)
        {
            self.example_headings.push(heading.to_string());
        }
        // A document counts once, at its first mention of the topic
        if self.documents.insert(doc) {
            self.occurrence_count = self.documents.len();
            self.position_sum += relative_position;
            self.typical_position = self.position_sum / self.occurrence_count as f64;
        }
    }

    fn add_subtopic(&mut self, heading: &str, key: TopicKey, matcher: &TopicMatcher) {
        if key.is_empty() || self.subtopic_keys.iter().any(|k| matcher.matches(k, &key)) {
            return;
        }
        self.subtopic_keys.push(key);
        self.suggested_subtopics.push(heading.to_string());
    }

    /// Distinct subtopics competitors nest under this topic
    pub fn subtopic_count(&self) -> usize {
        self.suggested_subtopics.len()
    }
}

/// Aggregated competitor coverage
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorTopicSet {
    pub h2_topics: Vec<TopicEntry>,
    pub h3_topics: Vec<TopicEntry>,
    pub usable_documents: usize,
    pub status: CoverageStatus,
}

impl CompetitorTopicSet {
    /// Topic set with no competitor evidence
    pub fn empty(usable: usize, required: usize) -> Self {
        Self {
            h2_topics: Vec::new(),
            h3_topics: Vec::new(),
            usable_documents: usable,
            status: CoverageStatus::InsufficientData { usable, required },
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.status == CoverageStatus::Sufficient
    }

    pub fn is_empty(&self) -> bool {
        self.h2_topics.is_empty() && self.h3_topics.is_empty()
    }

    /// Fail with `InsufficientCompetitorData` unless enough competitors were usable
    pub fn ensure_sufficient(&self) -> Result<&Self> {
        match self.status {
            CoverageStatus::Sufficient => Ok(self),
            CoverageStatus::InsufficientData { usable, required } => {
                Err(ReweaveError::InsufficientCompetitorData { usable, required })
            }
        }
    }

    /// Best-matching H2 topic for `key`
    pub fn find_h2(&self, key: &TopicKey, matcher: &TopicMatcher) -> Option<&TopicEntry> {
        find_best(&self.h2_topics, key, matcher).map(|i| &self.h2_topics[i])
    }

    /// Highest overlap between `key` and any competitor topic, matched or not
    pub fn best_overlap(&self, key: &TopicKey) -> f64 {
        self.h2_topics
            .iter()
            .chain(self.h3_topics.iter())
            .map(|t| t.key.overlap(key))
            .fold(0.0, f64::max)
    }

    /// H2 topics covered by at least `min_occurrence` competitors
    pub fn gaps(&self, min_occurrence: usize) -> impl Iterator<Item = &TopicEntry> {
        self.h2_topics
            .iter()
            .filter(move |t| t.occurrence_count >= min_occurrence)
    }
}

/// Index of the best match for `key`; ties go to the earliest entry
fn find_best(entries: &[TopicEntry], key: &TopicKey, matcher: &TopicMatcher) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, entry) in entries.iter().enumerate() {
        match matcher.compare(&entry.key, key) {
            m @ (TopicMatch::Same | TopicMatch::Overlap(_)) => {
                if best.is_none_or(|(_, score)| m.score() > score) {
                    best = Some((i, m.score()));
                }
            }
            TopicMatch::Ambiguous(overlap) => {
                debug!(
                    "Ambiguous topic match '{}' ~ '{}' ({:.2}), treated as distinct",
                    entry.key, key, overlap
                );
            }
            TopicMatch::Distinct => {}
        }
    }
    best.map(|(i, _)| i)
}

fn relative(index: usize, count: usize) -> f64 {
    if count <= 1 {
        0.0
    } else {
        index as f64 / (count - 1) as f64
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    matcher: TopicMatcher,
    min_competitors: usize,
    max_examples: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl Aggregator {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            matcher: TopicMatcher::new(config.topic_overlap_threshold),
            min_competitors: config.min_competitors,
            max_examples: config.max_example_headings,
        }
    }

    pub fn aggregate(&self, competitors: &[Document]) -> CompetitorTopicSet {
        let usable: Vec<&Document> = competitors
            .iter()
            .filter(|doc| doc.h2s().next().is_some())
            .collect();

        if usable.len() < self.min_competitors {
            info!(
                "Aggregation: {} usable competitor(s), {} required; topic set left empty",
                usable.len(),
                self.min_competitors
            );
            return CompetitorTopicSet::empty(usable.len(), self.min_competitors);
        }

        let mut h2_topics: Vec<TopicEntry> = Vec::new();
        let mut h3_topics: Vec<TopicEntry> = Vec::new();

        for (doc_index, doc) in usable.iter().enumerate() {
            let h2_count = doc.h2s().count();
            let h3_count = doc
                .headings()
                .iter()
                .filter(|h| h.level == HeadingLevel::H3)
                .count();
            let mut h2_ordinal = 0;
            let mut h3_ordinal = 0;
            let mut current_h2: Option<usize> = None;

            for heading in doc.headings() {
                match heading.level {
                    HeadingLevel::H1 => current_h2 = None,
                    HeadingLevel::H2 => {
                        let position = relative(h2_ordinal, h2_count);
                        h2_ordinal += 1;
                        let key = TopicKey::from_heading(&heading.text);
                        if key.is_empty() {
                            current_h2 = None;
                            continue;
                        }
                        let index = self.entry_for(&mut h2_topics, key);
                        h2_topics[index].observe(
                            doc_index,
                            &heading.text,
                            position,
                            self.max_examples,
                        );
                        current_h2 = Some(index);
                    }
                    HeadingLevel::H3 => {
                        let position = relative(h3_ordinal, h3_count);
                        h3_ordinal += 1;
                        let key = TopicKey::from_heading(&heading.text);
                        if key.is_empty() {
                            continue;
                        }
                        if let Some(parent) = current_h2 {
                            h2_topics[parent].add_subtopic(
                                &heading.text,
                                key.clone(),
                                &self.matcher,
                            );
                        }
                        let index = self.entry_for(&mut h3_topics, key);
                        h3_topics[index].observe(
                            doc_index,
                            &heading.text,
                            position,
                            self.max_examples,
                        );
                    }
                }
            }
        }

        info!(
            "Aggregation: {} H2 topics, {} H3 topics from {} competitors",
            h2_topics.len(),
            h3_topics.len(),
            usable.len()
        );

        CompetitorTopicSet {
            h2_topics,
            h3_topics,
            usable_documents: usable.len(),
            status: CoverageStatus::Sufficient,
        }
    }

    fn entry_for(&self, entries: &mut Vec<TopicEntry>, key: TopicKey) -> usize {
        match find_best(entries, &key, &self.matcher) {
            Some(index) => index,
            None => {
                entries.push(TopicEntry::new(key));
                entries.len() - 1
            }
        }
    }
}
