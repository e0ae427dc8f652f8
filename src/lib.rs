//! reweave - Content Structure Reconciliation & Merge Engine
//!
//! Revises an existing article so it covers what competing pages cover,
//! without losing the facts it already states.
//!
//! ## Core Features
//!
//! - **Reconciliation**: every H2/H3 gets exactly one of KEEP, IMPROVE, ADD or
//!   REMOVE, with no topic both removed and added
//! - **Fact preservation**: statistics, quotes, examples and specifications
//!   survive regeneration or are reported as dropped
//! - **Bounded generation**: sections are generated concurrently and degrade
//!   individually on failure
//!
//! ## Quick Start
//!
//! ```ignore
//! use reweave::{ActionPlanner, Aggregator, Config};
//! use reweave::collab::{FileFetcher, DocumentFetcher, OfflineGenerator};
//!
//! let config = Config::default();
//! let existing = FileFetcher.fetch("article.md").await?;
//! let topics = Aggregator::new(&config.matching).aggregate(&competitors);
//! let plan = ActionPlanner::new(&config)
//!     .run(&existing, &topics, &OfflineGenerator)
//!     .await;
//! println!("{}", plan.render_report());
//! ```
//!
//! ## Modules
//!
//! - [`types`]: heading tree, elements, recommendations, errors
//! - [`text`]: topic keys, question format, sentences
//! - [`engine`]: extractor, scorer, aggregator, classifier, merge, plan
//! - [`collab`]: fetcher, generator and exporter collaborators
//! - [`config`]: layered configuration

pub mod cli;
pub mod collab;
pub mod config;
pub mod constants;
pub mod engine;
pub mod text;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::error::{Result, ResultExt, ReweaveError};
pub use types::{Action, Document, HeadingLevel, HeadingNode, Recommendation};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use engine::{
    ActionPlan, ActionPlanner, Aggregator, Classifier, CompetitorTopicSet, MergeEngine,
    MergeStrategy, QualityScorer, Reconciliation,
};
