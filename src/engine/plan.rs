//! Action Plan
//!
//! Runs the classifier once, asks a [`SectionGenerator`] for text for every
//! IMPROVE and ADD section, merges that text with what the section already
//! says and assembles the final ordered document.
//!
//! Only [`ActionPlanner::execute`] talks to the generator. `prepare` and
//! `assemble` are pure, so the ordering and degradation rules are testable
//! without any I/O.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::collab::generator::{GenerationRequest, SectionGenerator};
use crate::collab::timeout::{TimeoutConfig, with_timeout};
use crate::config::Config;
use crate::constants::improvement::{ADD_BONUS, REMOVE_BONUS, WORD_DELTA_CAP};
use crate::engine::aggregator::CompetitorTopicSet;
use crate::engine::classifier::{Classifier, Reconciliation};
use crate::engine::extractor::extract;
use crate::engine::merge::{MergeEngine, MergeStrategy};
use crate::engine::report::{self, ChangeMagnitude};
use crate::engine::scorer::QualityScorer;
use crate::text::{TopicKey, content_tokens, is_faq, split_sentences, word_count};
use crate::types::{
    Action, Document, HeadingLevel, PreservationReport, Recommendation, Result, ReweaveError,
    ValuableElement,
};

// =============================================================================
// Plan types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Complete,
    /// Generation failed; the section carries its original text or a placeholder
    NeedsAttention { reason: String },
}

impl SectionStatus {
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::NeedsAttention { .. })
    }
}

/// One section of the final document
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub recommendation: Recommendation,
    /// Section text before the plan; empty for ADD
    pub original_content: String,
    pub final_content: String,
    pub preservation_report: PreservationReport,
    pub status: SectionStatus,
    pub change: ChangeMagnitude,
    /// Quality score of `final_content`
    pub final_score: u8,
    /// Merge strategy applied, when generated text was merged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MergeStrategy>,
}

impl PlanEntry {
    pub fn heading(&self) -> &str {
        self.recommendation.final_heading()
    }

    pub fn level(&self) -> HeadingLevel {
        self.recommendation.level
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub kept: usize,
    pub improved: usize,
    pub added: usize,
    pub removed: usize,
    pub needs_attention: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionPlan {
    pub title: Option<String>,
    /// Text under the title, carried over unchanged
    pub introduction: String,
    /// Final sections in document order
    pub entries: Vec<PlanEntry>,
    /// REMOVE recommendations, for reporting only
    pub removed: Vec<Recommendation>,
    pub summary: ChangeSummary,
    pub insufficient_data: bool,
    /// Word count of the source document
    pub original_words: usize,
}

impl ActionPlan {
    pub fn final_words(&self) -> usize {
        word_count(&self.introduction)
            + self
                .entries
                .iter()
                .map(|e| word_count(&e.final_content))
                .sum::<usize>()
    }

    pub fn needs_attention(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.status.needs_attention())
    }

    /// Overall improvement, 0-100: mean final section quality, a bonus for
    /// structural changes and a capped term for word growth
    pub fn improvement_score(&self) -> f64 {
        let quality = if self.entries.is_empty() {
            0.0
        } else {
            self.entries
                .iter()
                .map(|e| f64::from(e.final_score))
                .sum::<f64>()
                / self.entries.len() as f64
        };

        let mut structural = 0.0;
        if self.summary.added > 0 {
            structural += ADD_BONUS;
        }
        if self.summary.removed > 0 {
            structural += REMOVE_BONUS;
        }

        let words = if self.original_words == 0 {
            WORD_DELTA_CAP
        } else {
            let growth = (self.final_words() as f64 - self.original_words as f64)
                / self.original_words as f64;
            (growth * 10.0).clamp(-WORD_DELTA_CAP, WORD_DELTA_CAP)
        };

        (quality + structural + words).clamp(0.0, 100.0)
    }

    /// The revised document, ready to be analyzed again
    pub fn to_document(&self) -> Document {
        let title = self
            .title
            .iter()
            .map(|t| (HeadingLevel::H1, t.clone(), self.introduction.clone()));
        let sections = self
            .entries
            .iter()
            .map(|e| (e.level(), e.heading().to_string(), e.final_content.clone()));
        Document::from_sections(title.chain(sections))
    }

    pub fn render_report(&self) -> String {
        report::render(self)
    }
}

// =============================================================================
// Prepared plan
// =============================================================================

/// A section that survives into the plan, before any generation
#[derive(Debug, Clone)]
pub struct PreparedEntry {
    pub recommendation: Recommendation,
    pub original_content: String,
    /// Index into [`PreparedPlan::jobs`]
    pub job: Option<usize>,
}

/// One generation request and how to merge its answer
#[derive(Debug, Clone)]
pub struct SectionJob {
    pub request: GenerationRequest,
    pub strategy: MergeStrategy,
    /// Text whose elements are merged into the generated answer
    pub merge_base: String,
    pub elements: Vec<ValuableElement>,
}

#[derive(Debug, Clone)]
pub struct PreparedPlan {
    pub reconciliation: Reconciliation,
    pub title: Option<String>,
    pub introduction: String,
    pub entries: Vec<PreparedEntry>,
    pub jobs: Vec<SectionJob>,
    pub original_words: usize,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub job: usize,
    pub result: Result<String>,
}

// =============================================================================
// Planner
// =============================================================================

#[derive(Debug, Clone)]
pub struct ActionPlanner {
    classifier: Classifier,
    scorer: QualityScorer,
    merger: MergeEngine,
    strategy_override: Option<MergeStrategy>,
    improve_threshold: u8,
    max_concurrency: usize,
    generation_timeout: Duration,
}

impl Default for ActionPlanner {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl ActionPlanner {
    pub fn new(config: &Config) -> Self {
        Self {
            classifier: Classifier::new(&config.matching, &config.quality),
            scorer: QualityScorer::new(config.quality.clone()),
            merger: MergeEngine::new(&config.merge),
            strategy_override: config.merge.strategy_override,
            improve_threshold: config.quality.improve_threshold,
            max_concurrency: config.generator.max_concurrency,
            generation_timeout: TimeoutConfig::from_config(config).generation,
        }
    }

    /// Force one merge strategy for every merged section
    pub fn with_strategy(mut self, strategy: Option<MergeStrategy>) -> Self {
        if strategy.is_some() {
            self.strategy_override = strategy;
        }
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub async fn run(
        &self,
        existing: &Document,
        competitors: &CompetitorTopicSet,
        generator: &dyn SectionGenerator,
    ) -> ActionPlan {
        let prepared = self.prepare(existing, competitors);
        let outcomes = self.execute(&prepared, generator).await;
        self.assemble(prepared, outcomes)
    }

    // -------------------------------------------------------------------------
    // Prepare
    // -------------------------------------------------------------------------

    pub fn prepare(&self, existing: &Document, competitors: &CompetitorTopicSet) -> PreparedPlan {
        let reconciliation = self.classifier.classify(existing, competitors);
        let title = existing.title();
        let subject = title.map(|t| t.text.clone());

        // Text that stays in the document, for partial coverage of ADD topics
        let surviving: Vec<&str> = existing
            .headings()
            .iter()
            .filter(|h| {
                h.level == HeadingLevel::H1
                    || reconciliation
                        .for_position(h.position)
                        .is_some_and(|r| r.action != Action::Remove)
            })
            .map(|h| h.content.as_str())
            .collect();

        let mut entries = Vec::new();
        let mut jobs = Vec::new();
        for rec in &reconciliation.recommendations {
            let original = rec
                .existing_position
                .and_then(|p| existing.headings().iter().find(|h| h.position == p))
                .map(|h| h.content.clone())
                .unwrap_or_default();

            let job = match rec.action {
                Action::Remove => continue,
                Action::Keep => None,
                Action::Improve => {
                    let score = rec
                        .quality_score
                        .unwrap_or_else(|| self.scorer.score(&original));
                    Some(self.job(rec, original.clone(), self.strategy_for(score), &subject))
                }
                Action::Add => {
                    let partial = partial_original(&surviving, &TopicKey::parse(&rec.topic_key));
                    if partial.is_empty() {
                        Some(self.job(rec, partial, MergeStrategy::Replace, &subject))
                    } else {
                        debug!("'{}' is partly covered by existing text", rec.proposed_heading);
                        let strategy = self.strategy_for(self.scorer.score(&partial));
                        Some(self.job(rec, partial, strategy, &subject))
                    }
                }
            };

            let job = job.map(|j| {
                jobs.push(j);
                jobs.len() - 1
            });
            entries.push(PreparedEntry {
                recommendation: rec.clone(),
                original_content: original,
                job,
            });
        }

        info!(
            "Prepared {} section(s), {} generation job(s)",
            entries.len(),
            jobs.len()
        );
        PreparedPlan {
            title: subject,
            introduction: title.map(|t| t.content.clone()).unwrap_or_default(),
            reconciliation,
            entries,
            jobs,
            original_words: existing.total_words(),
        }
    }

    fn strategy_for(&self, score: u8) -> MergeStrategy {
        self.strategy_override.unwrap_or(if score < self.improve_threshold {
            MergeStrategy::Smart
        } else {
            MergeStrategy::PreserveValuable
        })
    }

    fn job(
        &self,
        rec: &Recommendation,
        merge_base: String,
        strategy: MergeStrategy,
        subject: &Option<String>,
    ) -> SectionJob {
        let elements = extract(&merge_base);
        let mut preserve: Vec<String> = elements.iter().map(|e| e.text.clone()).collect();
        // Elements of one sentence are adjacent
        preserve.dedup();

        SectionJob {
            request: GenerationRequest {
                heading: rec.final_heading().to_string(),
                level: rec.level,
                action: rec.action,
                original: merge_base.clone(),
                preserve,
                subheadings: rec.subheadings.clone(),
                subject: subject.clone(),
            },
            strategy,
            merge_base,
            elements,
        }
    }

    // -------------------------------------------------------------------------
    // Execute
    // -------------------------------------------------------------------------

    /// Run every generation job, at most `max_concurrency` at a time.
    ///
    /// Never fails as a whole; each outcome carries its own result.
    pub async fn execute(
        &self,
        prepared: &PreparedPlan,
        generator: &dyn SectionGenerator,
    ) -> Vec<JobOutcome> {
        if prepared.jobs.is_empty() {
            return Vec::new();
        }
        info!(
            "Generating {} section(s) with {} (concurrency: {})",
            prepared.jobs.len(),
            generator.name(),
            self.max_concurrency
        );

        let timeout = self.generation_timeout;
        let mut stream = stream::iter(prepared.jobs.iter().enumerate())
            .map(|(index, job)| async move {
                let operation = format!("generate '{}'", job.request.heading);
                let result =
                    with_timeout(timeout, generator.generate(&job.request), &operation).await;
                JobOutcome { job: index, result }
            })
            .buffer_unordered(self.max_concurrency.max(1));

        let mut outcomes = Vec::with_capacity(prepared.jobs.len());
        while let Some(outcome) = stream.next().await {
            let heading = &prepared.jobs[outcome.job].request.heading;
            match &outcome.result {
                Ok(text) => debug!("Generated '{}' ({} words)", heading, word_count(text)),
                Err(e) => warn!("Generation failed for '{}': {}", heading, e),
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    // -------------------------------------------------------------------------
    // Assemble
    // -------------------------------------------------------------------------

    pub fn assemble(&self, prepared: PreparedPlan, outcomes: Vec<JobOutcome>) -> ActionPlan {
        let PreparedPlan {
            reconciliation,
            title,
            introduction,
            entries,
            jobs,
            original_words,
        } = prepared;

        let mut results: Vec<Option<Result<String>>> = jobs.iter().map(|_| None).collect();
        for outcome in outcomes {
            if let Some(slot) = results.get_mut(outcome.job) {
                *slot = Some(outcome.result);
            }
        }

        // Existing H2 groups (H2 plus its H3s) in source order
        let mut groups: Vec<Vec<PlanEntry>> = Vec::new();
        let mut faq_group: Option<usize> = None;
        let mut adds: Vec<PlanEntry> = Vec::new();

        for entry in entries {
            let resolved = match entry.job.and_then(|j| jobs.get(j).map(|job| (j, job))) {
                Some((j, job)) => {
                    let result = results.get_mut(j).and_then(Option::take).unwrap_or_else(|| {
                        Err(ReweaveError::generation(
                            &job.request.heading,
                            "generation did not run",
                        ))
                    });
                    self.resolve(entry, job, result)
                }
                None => self.kept(entry),
            };

            let rec = &resolved.recommendation;
            if rec.action == Action::Add {
                adds.push(resolved);
                continue;
            }
            if rec.level == HeadingLevel::H3
                && let Some(group) = groups.last_mut()
            {
                group.push(resolved);
                continue;
            }
            let faq = is_faq(rec.final_heading())
                || rec.existing_heading.as_deref().is_some_and(is_faq);
            if faq && faq_group.is_none() {
                faq_group = Some(groups.len());
            }
            groups.push(vec![resolved]);
        }

        // ADD slots: round(typical_position * groups), never past the first FAQ
        let n = groups.len();
        let mut slots: Vec<Vec<PlanEntry>> = (0..=n).map(|_| Vec::new()).collect();
        for add in adds {
            let position = add
                .recommendation
                .typical_position
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            let mut slot = ((position * n as f64).round() as usize).min(n);
            if let Some(faq) = faq_group {
                slot = slot.min(faq);
            }
            slots[slot].push(add);
        }

        let mut ordered = Vec::new();
        let mut groups = groups.into_iter();
        for slot in slots {
            ordered.extend(slot);
            if let Some(group) = groups.next() {
                ordered.extend(group);
            }
        }

        let removed: Vec<Recommendation> = reconciliation.by_action(Action::Remove).cloned().collect();
        let count = |action: Action| {
            ordered
                .iter()
                .filter(|e| e.recommendation.action == action)
                .count()
        };
        let summary = ChangeSummary {
            kept: count(Action::Keep),
            improved: count(Action::Improve),
            added: count(Action::Add),
            removed: removed.len(),
            needs_attention: ordered.iter().filter(|e| e.status.needs_attention()).count(),
        };
        info!(
            "Plan: {} kept, {} improved, {} added, {} removed, {} need attention",
            summary.kept, summary.improved, summary.added, summary.removed, summary.needs_attention
        );

        ActionPlan {
            title,
            introduction,
            entries: ordered,
            removed,
            summary,
            insufficient_data: reconciliation.insufficient_data,
            original_words,
        }
    }

    fn kept(&self, entry: PreparedEntry) -> PlanEntry {
        let elements = extract(&entry.original_content);
        PlanEntry {
            change: ChangeMagnitude::between(&entry.original_content, &entry.original_content),
            final_score: self.scorer.score(&entry.original_content),
            final_content: entry.original_content.clone(),
            original_content: entry.original_content,
            recommendation: entry.recommendation,
            preservation_report: PreservationReport::full(&elements),
            status: SectionStatus::Complete,
            strategy: None,
        }
    }

    fn resolve(&self, entry: PreparedEntry, job: &SectionJob, result: Result<String>) -> PlanEntry {
        let heading = entry.recommendation.final_heading().to_string();
        let result = result.and_then(|text| {
            if text.trim().is_empty() {
                Err(ReweaveError::generation(&heading, "generator returned empty text"))
            } else {
                Ok(text)
            }
        });

        match result {
            Ok(generated) => {
                let merged =
                    self.merger
                        .merge(&job.merge_base, &generated, job.strategy, &job.elements);
                PlanEntry {
                    change: ChangeMagnitude::between(&entry.original_content, &merged.text),
                    final_score: self.scorer.score(&merged.text),
                    final_content: merged.text,
                    original_content: entry.original_content,
                    recommendation: entry.recommendation,
                    preservation_report: merged.report,
                    status: SectionStatus::Complete,
                    strategy: Some(job.strategy),
                }
            }
            Err(e) => {
                let (final_content, preservation_report) =
                    if entry.original_content.trim().is_empty() {
                        (placeholder(&heading), PreservationReport::default())
                    } else {
                        let elements = extract(&entry.original_content);
                        (
                            entry.original_content.clone(),
                            PreservationReport::full(&elements),
                        )
                    };
                PlanEntry {
                    change: ChangeMagnitude::between(&entry.original_content, &final_content),
                    final_score: self.scorer.score(&final_content),
                    final_content,
                    original_content: entry.original_content,
                    recommendation: entry.recommendation,
                    preservation_report,
                    status: SectionStatus::NeedsAttention {
                        reason: e.to_string(),
                    },
                    strategy: None,
                }
            }
        }
    }
}

/// Marker text for a new section whose generation failed
pub fn placeholder(heading: &str) -> String {
    format!(
        "[Section pending: content generation failed for \"{}\"]",
        heading
    )
}

/// Sentences of `sections` that mention every token of `key`
fn partial_original(sections: &[&str], key: &TopicKey) -> String {
    if key.is_empty() {
        return String::new();
    }
    let mut found: Vec<&str> = Vec::new();
    for content in sections {
        for sentence in split_sentences(content) {
            if key.tokens().is_subset(&content_tokens(sentence.text))
                && !found.contains(&sentence.text)
            {
                found.push(sentence.text);
            }
        }
    }
    found.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::generator::OfflineGenerator;
    use crate::engine::aggregator::Aggregator;
    use HeadingLevel::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DENSE_DEFINITION: &str = "A CDN is a network of 300 PoPs across 100 countries. \
        Median latency drops to 20ms for most visitors. Cache hit ratios above 95% are typical.";

    fn doc(sections: &[(HeadingLevel, &str, &str)]) -> Document {
        Document::from_sections(sections.iter().map(|(l, t, c)| (*l, *t, *c)))
    }

    fn competitors() -> CompetitorTopicSet {
        Aggregator::default().aggregate(&[
            doc(&[
                (H2, "What is a CDN?", ""),
                (H2, "How does a CDN work?", ""),
                (H3, "Edge servers", ""),
                (H3, "Origin shield", ""),
                (H2, "CDN benefits", ""),
            ]),
            doc(&[
                (H2, "What is a content delivery network?", ""),
                (H2, "How a CDN works", ""),
                (H3, "Edge servers", ""),
                (H3, "Request routing", ""),
                (H2, "Benefits of a CDN", ""),
                (H2, "CDN security", ""),
            ]),
            doc(&[
                (H2, "What is a CDN", ""),
                (H2, "CDN Benefits", ""),
                (H2, "Security of a CDN", ""),
            ]),
        ])
    }

    fn existing() -> Document {
        doc(&[
            (H1, "CDN guide", "A short guide to content delivery."),
            (H2, "What is a CDN?", DENSE_DEFINITION),
            (H2, "CDN Benefits", "Faster pages and happier users."),
            (H2, "Conclusion", "That is all about CDNs."),
        ])
    }

    /// Distinct, topic-specific text per heading
    struct ScriptedGenerator;

    #[async_trait]
    impl SectionGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            let heading = request.heading.to_lowercase();
            let text = if heading.contains("benefit") {
                "Benefits include 50% lower latency and offloaded origin traffic."
            } else if heading.contains("work") {
                "Requests resolve to the nearest edge over anycast DNS within 10ms."
            } else if heading.contains("security") {
                "Edge firewalls filter attacks exceeding 2 Tbps before they reach origin."
            } else {
                "Placeholder answer with 12% detail."
            };
            Ok(text.to_string())
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl SectionGenerator for SlowGenerator {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok("late".to_string())
        }
    }

    struct CountingGenerator {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SectionGenerator for CountingGenerator {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("Generated body for {}.", request.heading))
        }
    }

    fn headings(plan: &ActionPlan) -> Vec<&str> {
        plan.entries.iter().map(|e| e.heading()).collect()
    }

    #[tokio::test]
    async fn test_plan_orders_sections_and_merges() {
        let plan = ActionPlanner::default()
            .run(&existing(), &competitors(), &ScriptedGenerator)
            .await;

        assert_eq!(plan.title.as_deref(), Some("CDN guide"));
        assert_eq!(plan.introduction, "A short guide to content delivery.");
        let order = headings(&plan);
        assert_eq!(
            order[..3],
            ["What is a CDN?", "How does a CDN work?", "What are the benefits of CDN?"]
        );
        assert!(order[3].to_lowercase().contains("security"));
        assert_eq!(plan.entries[3].recommendation.action, Action::Add);
        assert_eq!(
            plan.summary,
            ChangeSummary {
                kept: 1,
                improved: 1,
                added: 2,
                removed: 1,
                needs_attention: 0,
            }
        );
        assert_eq!(plan.removed[0].existing_heading.as_deref(), Some("Conclusion"));

        let kept = &plan.entries[0];
        assert_eq!(kept.final_content, DENSE_DEFINITION);
        assert_eq!(kept.change, ChangeMagnitude::Unchanged);
        assert!(kept.preservation_report.total_retained() >= 3);

        let improved = &plan.entries[2];
        assert_eq!(improved.strategy, Some(MergeStrategy::Smart));
        assert!(improved.final_content.starts_with("Benefits include 50%"));
        assert_eq!(improved.change, ChangeMagnitude::MajorRewrite);

        let added = &plan.entries[1];
        assert_eq!(added.strategy, Some(MergeStrategy::Replace));
        assert_eq!(added.change, ChangeMagnitude::New);
        assert!(added.original_content.is_empty());
    }

    #[tokio::test]
    async fn test_plan_output_is_stable_under_reclassification() {
        let competitors = competitors();
        let plan = ActionPlanner::default()
            .run(&existing(), &competitors, &ScriptedGenerator)
            .await;

        let revised = plan.to_document();
        assert_eq!(revised.title().map(|t| t.text.as_str()), Some("CDN guide"));
        let again = Classifier::default().classify(&revised, &competitors);
        assert_eq!(again.count(Action::Remove), 0);
        assert_eq!(again.count(Action::Add), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_degrades_sections() {
        let plan = ActionPlanner::default()
            .run(&existing(), &competitors(), &OfflineGenerator)
            .await;

        assert_eq!(plan.summary.needs_attention, 3);
        let improved = plan
            .entries
            .iter()
            .find(|e| e.recommendation.action == Action::Improve)
            .unwrap();
        assert_eq!(improved.final_content, "Faster pages and happier users.");
        assert_eq!(improved.change, ChangeMagnitude::Unchanged);
        assert!(improved.status.needs_attention());

        for added in plan.entries.iter().filter(|e| e.recommendation.action == Action::Add) {
            assert_eq!(added.final_content, placeholder(added.heading()));
            assert!(matches!(
                &added.status,
                SectionStatus::NeedsAttention { reason } if reason.contains("offline")
            ));
        }

        let report = plan.render_report();
        assert!(report.contains("NEEDS ATTENTION"));
        assert!(report.contains("- Needs attention: 3"));
        assert!(report.contains(&format!(
            "- Overall improvement score: {:.1}%",
            plan.improvement_score()
        )));
        // degraded sections keep their original score
        assert!(report.contains(&format!("- Quality score: {}/100", improved.final_score)));
    }

    #[test]
    fn test_improvement_score() {
        let entry = |score: u8, content: &str| PlanEntry {
            recommendation: Recommendation::add("What is CDN security?", "cdn secur", 2),
            original_content: String::new(),
            final_content: content.to_string(),
            preservation_report: PreservationReport::default(),
            status: SectionStatus::Complete,
            change: ChangeMagnitude::New,
            final_score: score,
            strategy: None,
        };
        let mut plan = ActionPlan {
            title: None,
            introduction: String::new(),
            entries: vec![
                entry(60, "one two three four five"),
                entry(80, "six seven eight nine ten"),
            ],
            removed: Vec::new(),
            summary: ChangeSummary {
                added: 1,
                removed: 1,
                ..ChangeSummary::default()
            },
            insufficient_data: false,
            original_words: 5,
        };
        // mean 70, structural 10 + 5, words doubled: +10
        assert!((plan.improvement_score() - 95.0).abs() < 1e-9);

        // 100 words down to 10: -9
        plan.original_words = 100;
        assert!((plan.improvement_score() - 76.0).abs() < 1e-9);

        // no original text: full word bonus
        plan.original_words = 0;
        plan.summary = ChangeSummary::default();
        assert!((plan.improvement_score() - 90.0).abs() < 1e-9);

        plan.entries = vec![entry(100, "a"), entry(100, "b")];
        plan.summary.added = 2;
        assert_eq!(plan.improvement_score(), 100.0);
    }

    #[tokio::test]
    async fn test_later_h1_section_is_carried() {
        let existing = doc(&[
            (H1, "CDN guide", ""),
            (H2, "What is a CDN?", DENSE_DEFINITION),
            (H1, "Appendix: CDN benchmarks", "Uptime reached 99.99% across 40 regions."),
        ]);
        let plan = ActionPlanner::default()
            .run(&existing, &competitors(), &OfflineGenerator)
            .await;

        let appendix = plan
            .entries
            .iter()
            .find(|e| e.recommendation.existing_heading.as_deref() == Some("Appendix: CDN benchmarks"))
            .unwrap();
        assert_eq!(appendix.level(), H2);
        assert!(appendix.final_content.contains("99.99%"));
        assert!(
            plan.to_document()
                .headings()
                .iter()
                .any(|h| h.content.contains("99.99%"))
        );
    }

    #[tokio::test]
    async fn test_generation_timeout_is_local() {
        let plan = ActionPlanner::default()
            .with_generation_timeout(Duration::from_millis(20))
            .run(&existing(), &competitors(), &SlowGenerator)
            .await;
        assert_eq!(plan.entries.len(), 4);
        assert!(plan.needs_attention().all(|e| matches!(
            &e.status,
            SectionStatus::NeedsAttention { reason } if reason.contains("Timeout")
        )));
        assert_eq!(plan.summary.needs_attention, 3);
    }

    #[tokio::test]
    async fn test_generation_concurrency_is_bounded() {
        let generator = CountingGenerator {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        // Title only: every shared competitor topic becomes an ADD
        let empty = doc(&[(H1, "CDN guide", "")]);
        let plan = ActionPlanner::default()
            .with_concurrency(2)
            .run(&empty, &competitors(), &generator)
            .await;
        assert_eq!(plan.summary.added, 4);
        assert_eq!(plan.summary.needs_attention, 0);
        assert!(generator.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_adds_are_placed_before_faq() {
        let existing = doc(&[
            (H1, "CDN guide", ""),
            (H2, "What is a CDN?", DENSE_DEFINITION),
            (H2, "FAQ", "Common CDN questions answered briefly."),
        ]);
        let planner = ActionPlanner::default();
        let prepared = planner.prepare(&existing, &competitors());
        let plan = planner.assemble(prepared, Vec::new());

        let last = plan.entries.last().unwrap();
        assert_eq!(last.recommendation.existing_heading.as_deref(), Some("FAQ"));
        assert_eq!(plan.entries[0].heading(), "What is a CDN?");
        assert!(
            plan.entries[1..plan.entries.len() - 1]
                .iter()
                .all(|e| e.recommendation.action == Action::Add)
        );
    }

    #[test]
    fn test_h3_stays_with_its_parent() {
        let existing = doc(&[
            (H1, "CDN guide", ""),
            (H2, "What is a CDN?", DENSE_DEFINITION),
            (H3, "Edge locations", DENSE_DEFINITION),
            (H2, "CDN Benefits", "Faster pages."),
        ]);
        let planner = ActionPlanner::default();
        let plan = planner.assemble(planner.prepare(&existing, &competitors()), Vec::new());
        let pos = |heading: &str| {
            plan.entries
                .iter()
                .position(|e| e.recommendation.existing_heading.as_deref() == Some(heading))
                .unwrap()
        };
        assert_eq!(pos("Edge locations"), pos("What is a CDN?") + 1);
    }

    #[test]
    fn test_strategy_selection() {
        let existing = doc(&[
            (H1, "CDN guide", ""),
            (
                H2,
                "What is a CDN?",
                "A CDN is a network of 300 PoPs. Security of a CDN relies on TLS 1.3 at the edge.",
            ),
            (H2, "CDN Benefits", "Faster pages and happier users."),
        ]);
        let competitors = competitors();
        let planner = ActionPlanner::default();
        let prepared = planner.prepare(&existing, &competitors);

        let job_for = |needle: &str| {
            let entry = prepared
                .entries
                .iter()
                .find(|e| e.recommendation.final_heading().contains(needle))
                .unwrap();
            &prepared.jobs[entry.job.unwrap()]
        };

        // Thin IMPROVE section goes through the capped strategy
        assert_eq!(job_for("benefits").strategy, MergeStrategy::Smart);
        // Partly covered ADD topic is merged, not replaced
        let security = job_for("ecurity");
        assert_ne!(security.strategy, MergeStrategy::Replace);
        assert_eq!(
            security.merge_base,
            "Security of a CDN relies on TLS 1.3 at the edge."
        );
        assert_eq!(security.request.action, Action::Add);
        // Uncovered ADD topic is generated from scratch
        assert_eq!(job_for("work").strategy, MergeStrategy::Replace);

        let forced = ActionPlanner::default()
            .with_strategy(Some(MergeStrategy::PreserveValuable))
            .prepare(&existing, &competitors);
        assert!(
            forced
                .jobs
                .iter()
                .filter(|j| j.request.action == Action::Improve)
                .all(|j| j.strategy == MergeStrategy::PreserveValuable)
        );
    }

    #[test]
    fn test_partial_original_requires_every_key_token() {
        let key = TopicKey::from_heading("CDN security");
        let text = "CDN security matters. Security is hard. A CDN helps.";
        assert_eq!(partial_original(&[text], &key), "CDN security matters.");
        assert_eq!(partial_original(&[text], &TopicKey::default()), "");
    }

    #[test]
    fn test_to_document_roundtrips_structure() {
        let planner = ActionPlanner::default();
        let plan = planner.assemble(planner.prepare(&existing(), &competitors()), Vec::new());
        let doc = plan.to_document();
        assert_eq!(doc.len(), plan.entries.len() + 1);
        assert_eq!(doc.headings()[0].level, H1);
        assert_eq!(plan.original_words, existing().total_words());
    }
}
