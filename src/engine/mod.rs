//! Reconciliation engine
//!
//! Leaves first:
//! - `extractor`: fact-bearing sentences in a block of text
//! - `scorer`: 0-100 quality score for existing section content
//! - `aggregator`: competitor documents folded into a topic set
//! - `classifier`: KEEP / IMPROVE / ADD / REMOVE for every heading
//! - `merge`: generated text combined with original text
//! - `plan`: orchestration into the final ordered document
//! - `report`: change magnitude and the optimization report

pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod merge;
pub mod plan;
pub mod report;
pub mod scorer;

pub use aggregator::{Aggregator, CompetitorTopicSet, CoverageStatus, TopicEntry};
pub use classifier::{Classifier, Reconciliation, is_boilerplate};
pub use extractor::extract;
pub use merge::{MergeEngine, MergeOutcome, MergeStrategy};
pub use plan::{
    ActionPlan, ActionPlanner, ChangeSummary, PlanEntry, PreparedPlan, SectionStatus,
};
pub use report::ChangeMagnitude;
pub use scorer::{QualityAssessment, QualityIssue, QualityScorer};
