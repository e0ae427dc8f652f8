//! Reconciliation Classifier
//!
//! Assigns exactly one action to every H2/H3 of an existing document and
//! proposes ADD sections for competitor topics it lacks. The decision runs as
//! four materialized phases, each reading the output of the previous one:
//!
//! 1. REMOVE: boilerplate, duplicate and off-topic H2s (and their H3s)
//! 2. ADD: competitor gaps not covered by any surviving heading
//! 3. IMPROVE: surviving headings failing the format or depth checks
//! 4. KEEP: everything else
//!
//! The H1 is the document title and primary subject; it is never classified.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::config::{MatchingConfig, QualityConfig};
use crate::engine::aggregator::{CompetitorTopicSet, TopicEntry};
use crate::engine::scorer::QualityScorer;
use crate::text::{
    TopicKey, TopicMatcher, content_tokens, is_question_format, jaccard, sentence_case,
    to_question,
};
use crate::types::{
    Action, Document, HeadingLevel, HeadingNode, Recommendation, Result, ReweaveError,
};

static RE_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:conclusions?|summary|wrap(?:ping)?[- ]?up|final thoughts|about the author|about us|table of contents|references|citations|key takeaways)\b",
    )
    .unwrap()
});

/// Stems of topics whose subtopics are list items rather than structure
const ENUMERABLE_STEMS: &[&str] = &[
    "advantag", "benefit", "exampl", "featur", "reason", "step", "tip", "type",
];

pub const KEEP_REASON: &str =
    "already optimal: question-format, quality above threshold, uniquely covers topic.";
pub const KEEP_SUBSECTION_REASON: &str = "subsection retained: quality above threshold";
pub const PARENT_REMOVED_REASON: &str = "parent section removed";

/// Structural wrap-up or navigation section carrying no topic of its own
pub fn is_boilerplate(heading: &str) -> bool {
    RE_BOILERPLATE.is_match(heading)
}

fn is_enumerable(key: &TopicKey) -> bool {
    key.tokens()
        .iter()
        .any(|t| ENUMERABLE_STEMS.contains(&t.as_str()))
}

/// Competitor topic with enough nested structure to warrant subheadings
fn is_complex(topic: &TopicEntry) -> bool {
    topic.subtopic_count() >= 2 && !is_enumerable(&topic.key)
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Classifier output: one recommendation per existing H2/H3, then ADDs
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub recommendations: Vec<Recommendation>,
    /// Title of the existing document
    pub subject: Option<String>,
    pub insufficient_data: bool,
    /// Positions of every existing H2/H3, in source order
    expected_positions: Vec<usize>,
}

impl Reconciliation {
    pub fn by_action(&self, action: Action) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(move |r| r.action == action)
    }

    pub fn count(&self, action: Action) -> usize {
        self.by_action(action).count()
    }

    /// Recommendation for the existing heading at `position`
    pub fn for_position(&self, position: usize) -> Option<&Recommendation> {
        self.recommendations
            .iter()
            .find(|r| r.existing_position == Some(position))
    }

    /// Check the structural post-conditions of a classification
    pub fn verify(&self) -> Result<()> {
        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        for rec in &self.recommendations {
            match (rec.action, rec.existing_position) {
                (Action::Add, None) => {}
                (Action::Add, Some(p)) => {
                    return Err(ReweaveError::InvariantViolation(format!(
                        "ADD '{}' refers to existing position {}",
                        rec.proposed_heading, p
                    )));
                }
                (action, None) => {
                    return Err(ReweaveError::InvariantViolation(format!(
                        "{} '{}' has no existing position",
                        action, rec.proposed_heading
                    )));
                }
                (_, Some(p)) => *seen.entry(p).or_insert(0) += 1,
            }
        }

        for &position in &self.expected_positions {
            match seen.remove(&position) {
                Some(1) => {}
                Some(n) => {
                    return Err(ReweaveError::InvariantViolation(format!(
                        "heading at position {} has {} recommendations",
                        position, n
                    )));
                }
                None => {
                    return Err(ReweaveError::InvariantViolation(format!(
                        "heading at position {} has no recommendation",
                        position
                    )));
                }
            }
        }
        if let Some(position) = seen.keys().next() {
            return Err(ReweaveError::InvariantViolation(format!(
                "recommendation for unknown position {}",
                position
            )));
        }

        let removed: BTreeSet<&str> = self
            .by_action(Action::Remove)
            .map(|r| r.topic_key.as_str())
            .filter(|k| !k.is_empty())
            .collect();
        if let Some(add) = self
            .by_action(Action::Add)
            .find(|r| removed.contains(r.topic_key.as_str()))
        {
            return Err(ReweaveError::InvariantViolation(format!(
                "topic '{}' is both removed and added",
                add.topic_key
            )));
        }

        if let Some(rec) = self
            .recommendations
            .iter()
            .find(|r| !r.subheadings.is_empty() && !matches!(r.action, Action::Add | Action::Improve))
        {
            return Err(ReweaveError::InvariantViolation(format!(
                "{} '{}' carries subheadings",
                rec.action, rec.proposed_heading
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Per-heading facts computed once and shared by every phase
struct Section<'a> {
    index: usize,
    node: &'a HeadingNode,
    key: TopicKey,
    tokens: BTreeSet<String>,
    score: u8,
    boilerplate: bool,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    matcher: TopicMatcher,
    scorer: QualityScorer,
    matching: MatchingConfig,
    improve_threshold: u8,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&MatchingConfig::default(), &QualityConfig::default())
    }
}

impl Classifier {
    pub fn new(matching: &MatchingConfig, quality: &QualityConfig) -> Self {
        Self {
            matcher: TopicMatcher::new(matching.topic_overlap_threshold),
            scorer: QualityScorer::new(quality.clone()),
            matching: matching.clone(),
            improve_threshold: quality.improve_threshold,
        }
    }

    pub fn classify(
        &self,
        existing: &Document,
        competitors: &CompetitorTopicSet,
    ) -> Reconciliation {
        let sections: Vec<Section<'_>> = existing
            .sections()
            .map(|(index, node)| Section {
                index,
                node,
                key: TopicKey::from_heading(&node.text),
                tokens: content_tokens(&node.content),
                score: self.scorer.score(&node.content),
                boilerplate: node.level == HeadingLevel::H2 && is_boilerplate(&node.text),
            })
            .collect();
        let subject = existing
            .title()
            .map(|t| TopicKey::from_heading(&t.text))
            .unwrap_or_default();

        let removals = self.phase_remove(existing, &sections, &subject, competitors);
        let adds = self.phase_add(&sections, &removals, competitors);

        let mut recommendations = Vec::with_capacity(sections.len() + adds.len());
        for section in &sections {
            let rec = match removals.get(&section.index) {
                Some(reason) => self.removal(section, reason),
                None => self.improve_or_keep(existing, section, competitors),
            };
            debug!(
                "{} '{}' ({})",
                rec.action, section.node.text, rec.reason
            );
            recommendations.push(rec);
        }
        recommendations.extend(adds);

        let reconciliation = Reconciliation {
            recommendations,
            subject: existing.title().map(|t| t.text.clone()),
            insufficient_data: !competitors.is_sufficient(),
            expected_positions: sections.iter().map(|s| s.node.position).collect(),
        };
        debug_assert!(
            reconciliation.verify().is_ok(),
            "{:?}",
            reconciliation.verify()
        );

        info!(
            "Classification: {} keep, {} improve, {} add, {} remove",
            reconciliation.count(Action::Keep),
            reconciliation.count(Action::Improve),
            reconciliation.count(Action::Add),
            reconciliation.count(Action::Remove)
        );
        reconciliation
    }

    // -------------------------------------------------------------------------
    // Phase 1: REMOVE
    // -------------------------------------------------------------------------

    /// Heading index -> removal reason
    fn phase_remove(
        &self,
        doc: &Document,
        sections: &[Section<'_>],
        subject: &TopicKey,
        competitors: &CompetitorTopicSet,
    ) -> BTreeMap<usize, String> {
        let mut removed: BTreeMap<usize, String> = BTreeMap::new();
        let h2s: Vec<&Section<'_>> = sections
            .iter()
            .filter(|s| s.node.level == HeadingLevel::H2)
            .collect();

        for s in h2s.iter().filter(|s| s.boilerplate) {
            removed.insert(
                s.index,
                format!("boilerplate: '{}' is a structural section", s.node.text),
            );
        }

        for group in self.duplicate_groups(&h2s) {
            let survivor = group
                .iter()
                .filter(|s| !s.boilerplate)
                .max_by(|a, b| a.score.cmp(&b.score).then(b.index.cmp(&a.index)));
            let Some(survivor) = survivor else { continue };
            for member in group.iter().filter(|s| s.index != survivor.index) {
                removed.entry(member.index).or_insert_with(|| {
                    format!(
                        "duplicate: covers the same topic as '{}'",
                        survivor.node.text
                    )
                });
            }
        }

        if !subject.is_empty() {
            let off_topic: Vec<(usize, f64)> = h2s
                .iter()
                .filter(|s| !removed.contains_key(&s.index))
                .map(|s| {
                    let relevance = s
                        .key
                        .overlap(subject)
                        .max(subject.coverage_in(&s.tokens))
                        .max(competitors.best_overlap(&s.key));
                    (s.index, relevance)
                })
                .filter(|(_, relevance)| *relevance < self.matching.off_topic_threshold)
                .collect();
            for (index, relevance) in off_topic {
                removed.insert(
                    index,
                    format!(
                        "off-topic: relevance {:.2} to the primary subject is below {:.2}",
                        relevance, self.matching.off_topic_threshold
                    ),
                );
            }
        }

        for s in sections.iter().filter(|s| s.node.level == HeadingLevel::H3) {
            if let Some(parent) = doc.parent_of(s.index)
                && removed.contains_key(&parent)
            {
                removed.insert(s.index, PARENT_REMOVED_REASON.to_string());
            }
        }

        info!("Phase 1 (remove): {} heading(s)", removed.len());
        removed
    }

    /// Groups of H2s sharing a topic key or near-identical content
    fn duplicate_groups<'s, 'a>(&self, h2s: &[&'s Section<'a>]) -> Vec<Vec<&'s Section<'a>>> {
        let mut parent: Vec<usize> = (0..h2s.len()).collect();
        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for a in 0..h2s.len() {
            for b in (a + 1)..h2s.len() {
                let (x, y) = (h2s[a], h2s[b]);
                let same_topic = self.matcher.matches(&x.key, &y.key);
                let same_content = !x.tokens.is_empty()
                    && !y.tokens.is_empty()
                    && jaccard(&x.tokens, &y.tokens) >= self.matching.content_duplicate_threshold;
                if same_topic || same_content {
                    let (ra, rb) = (root(&mut parent, a), root(&mut parent, b));
                    parent[rb] = ra;
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<&'s Section<'a>>> = BTreeMap::new();
        for i in 0..h2s.len() {
            let r = root(&mut parent, i);
            groups.entry(r).or_default().push(h2s[i]);
        }
        groups.into_values().filter(|g| g.len() > 1).collect()
    }

    // -------------------------------------------------------------------------
    // Phase 2: ADD
    // -------------------------------------------------------------------------

    fn phase_add(
        &self,
        sections: &[Section<'_>],
        removals: &BTreeMap<usize, String>,
        competitors: &CompetitorTopicSet,
    ) -> Vec<Recommendation> {
        let (removed_keys, existing_keys): (Vec<&Section<'_>>, Vec<&Section<'_>>) = sections
            .iter()
            .filter(|s| !s.key.is_empty())
            .partition(|s| removals.contains_key(&s.index));

        let mut added: Vec<(TopicKey, Recommendation)> = Vec::new();
        for topic in competitors.gaps(self.matching.min_occurrence) {
            if topic.example_headings.iter().any(|h| is_boilerplate(h)) {
                continue;
            }
            if existing_keys
                .iter()
                .any(|s| self.matcher.matches(&s.key, &topic.key))
            {
                continue;
            }
            if removed_keys
                .iter()
                .any(|s| self.matcher.matches(&s.key, &topic.key))
            {
                debug!("Gap '{}' matches a removed heading; not re-added", topic.key);
                continue;
            }
            if added.iter().any(|(k, _)| self.matcher.matches(k, &topic.key)) {
                continue;
            }

            let proposed = match topic
                .example_headings
                .iter()
                .find(|h| is_question_format(h))
            {
                Some(question) => sentence_case(question),
                None => to_question(topic.example_headings.first().map_or("", String::as_str)),
            };
            if proposed.is_empty() {
                continue;
            }

            let subheadings = if is_complex(topic) {
                self.cap_subheadings(topic.suggested_subtopics.iter())
            } else {
                Vec::new()
            };

            let rec = Recommendation::add(proposed, topic.key.to_string(), topic.occurrence_count)
                .with_reason(format!(
                    "gap: covered by {} of {} competitors",
                    topic.occurrence_count, competitors.usable_documents
                ))
                .with_subheadings(subheadings)
                .with_typical_position(topic.typical_position);
            added.push((topic.key.clone(), rec));
        }

        let mut adds: Vec<Recommendation> = added.into_iter().map(|(_, r)| r).collect();
        adds.sort_by(|a, b| {
            a.typical_position
                .unwrap_or(1.0)
                .total_cmp(&b.typical_position.unwrap_or(1.0))
        });
        info!("Phase 2 (add): {} gap(s)", adds.len());
        adds
    }

    fn cap_subheadings<'t>(&self, subtopics: impl Iterator<Item = &'t String>) -> Vec<String> {
        subtopics
            .take(self.matching.max_subheadings)
            .map(|s| sentence_case(s))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Phases 3 and 4: IMPROVE / KEEP
    // -------------------------------------------------------------------------

    fn removal(&self, section: &Section<'_>, reason: &str) -> Recommendation {
        Recommendation::existing(
            Action::Remove,
            &section.node.text,
            section.node.level,
            section.node.position,
            section.key.to_string(),
        )
        .with_reason(reason)
        .with_score(section.score)
    }

    fn improve_or_keep(
        &self,
        doc: &Document,
        section: &Section<'_>,
        competitors: &CompetitorTopicSet,
    ) -> Recommendation {
        let node = section.node;
        let matched = competitors.find_h2(&section.key, &self.matcher);
        let support = matched.map_or(0, |t| t.occurrence_count);
        let depth_ok = section.score >= self.improve_threshold;
        let base = |action| {
            Recommendation::existing(
                action,
                &node.text,
                node.level,
                node.position,
                section.key.to_string(),
            )
            .with_score(section.score)
            .with_support(support)
        };

        if node.level == HeadingLevel::H3 {
            return if depth_ok {
                base(Action::Keep).with_reason(KEEP_SUBSECTION_REASON)
            } else {
                base(Action::Improve).with_reason(format!(
                    "quality: score {} below {}",
                    section.score, self.improve_threshold
                ))
            };
        }

        let format_ok = is_question_format(&node.text);
        if format_ok && depth_ok {
            return base(Action::Keep).with_reason(KEEP_REASON);
        }

        let mut reasons = Vec::new();
        if !format_ok {
            reasons.push("format: heading is not phrased as a question".to_string());
        }
        if !depth_ok {
            reasons.push(format!(
                "quality: score {} below {}",
                section.score, self.improve_threshold
            ));
        }

        let mut rec = base(Action::Improve).with_reason(reasons.join("; "));
        if !format_ok {
            let rewritten = to_question(&node.text);
            if !rewritten.is_empty() {
                rec.proposed_heading = rewritten;
            }
        }

        if let Some(topic) = matched.filter(|t| is_complex(t)) {
            let children: Vec<TopicKey> = doc
                .children_of(section.index)
                .map(|(_, h)| TopicKey::from_heading(&h.text))
                .collect();
            let missing: Vec<&String> = topic
                .suggested_subtopics
                .iter()
                .filter(|s| {
                    let key = TopicKey::from_heading(s);
                    !children.iter().any(|c| self.matcher.matches(c, &key))
                })
                .collect();
            rec = rec.with_subheadings(self.cap_subheadings(missing.into_iter()));
        }
        rec
    }
}
