//! Analyze Command
//!
//! Classifies every heading of an existing article against competitor
//! documents without generating or changing any text.

use crate::cli::commands::{SourceArgs, load_sources};
use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::engine::Classifier;
use crate::types::{Action, Result};

pub async fn run(args: SourceArgs, format: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    let output = Output::new();
    let (existing, topics) = load_sources(&config, &args, &output).await?;

    let reconciliation =
        Classifier::new(&config.matching, &config.quality).classify(&existing, &topics);
    reconciliation.verify()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&reconciliation)?);
        return Ok(());
    }

    output.header("Structure Reconciliation");
    if let Some(subject) = &reconciliation.subject {
        output.kv("Subject", subject);
    }
    output.kv("Competitors", topics.usable_documents);
    output.kv("Competitor topics", topics.h2_topics.len());

    for (title, action) in [
        ("Keep", Action::Keep),
        ("Improve", Action::Improve),
        ("Add", Action::Add),
        ("Remove", Action::Remove),
    ] {
        let count = reconciliation.count(action);
        if count == 0 {
            continue;
        }
        output.section(&format!("{} ({})", title, count));
        for rec in reconciliation.by_action(action) {
            output.recommendation(rec);
        }
    }

    if reconciliation.insufficient_data {
        output.warning("Competitor data insufficient: recommendations limited to existing sections");
    }
    Ok(())
}
