pub mod analyze;
pub mod config;
pub mod inspect;
pub mod optimize;

use tracing::info;

use crate::cli::ui::Output;
use crate::collab::{DocumentFetcher, FileFetcher, TimeoutConfig, fetch_all};
use crate::config::Config;
use crate::engine::{Aggregator, CompetitorTopicSet, CoverageStatus};
use crate::types::{Document, Result};

/// Inputs shared by `analyze` and `optimize`
#[derive(Debug, Clone)]
pub struct SourceArgs {
    /// Existing article
    pub existing: String,
    /// Competitor documents
    pub competitors: Vec<String>,
    /// Fail instead of continuing when too few competitors are usable
    pub require_competitors: bool,
}

/// Load the existing document and fold the competitors into a topic set
pub(crate) async fn load_sources(
    config: &Config,
    args: &SourceArgs,
    output: &Output,
) -> Result<(Document, CompetitorTopicSet)> {
    let fetcher = FileFetcher;
    let existing = fetcher.fetch(&args.existing).await?;
    info!(
        "Loaded '{}' ({} headings, {} words)",
        args.existing,
        existing.len(),
        existing.total_words()
    );

    let timeouts = TimeoutConfig::from_config(config);
    let fetched = fetch_all(
        &fetcher,
        &args.competitors,
        config.fetch.max_concurrency,
        timeouts.fetch,
    )
    .await;
    for failure in &fetched.failures {
        output.warning(&failure.to_string());
    }

    let topics = Aggregator::new(&config.matching).aggregate(&fetched.documents);
    if args.require_competitors {
        topics.ensure_sufficient()?;
    } else if let CoverageStatus::InsufficientData { usable, required } = topics.status {
        output.warning(&format!(
            "Only {} usable competitor(s), {} required: no sections will be added",
            usable, required
        ));
    }
    Ok((existing, topics))
}
