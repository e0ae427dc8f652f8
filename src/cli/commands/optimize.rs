//! Optimize Command
//!
//! Runs the full plan: classify, generate IMPROVE/ADD sections, merge with
//! the original text and export the revised article.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::{SourceArgs, load_sources};
use crate::cli::ui::Output;
use crate::collab::{ExportFormat, OfflineGenerator, SectionGenerator, build_generator, output_path};
use crate::config::ConfigLoader;
use crate::engine::{ActionPlanner, MergeStrategy, SectionStatus};
use crate::types::Result;

#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub sources: SourceArgs,
    /// Write the revised article here instead of stdout; the exporter's
    /// extension is added when the path has none
    pub output: Option<PathBuf>,
    pub format: ExportFormat,
    pub strategy: Option<MergeStrategy>,
    /// Also write the optimization report here
    pub report: Option<PathBuf>,
    /// Skip generation; sections keep their text or get placeholders
    pub offline: bool,
}

pub async fn run(options: OptimizeOptions) -> Result<()> {
    let config = ConfigLoader::load()?;
    let output = Output::new();
    let (existing, topics) = load_sources(&config, &options.sources, &output).await?;

    let generator: Arc<dyn SectionGenerator> = if options.offline {
        Arc::new(OfflineGenerator)
    } else {
        build_generator(&config.generator)?
    };

    let planner = ActionPlanner::new(&config).with_strategy(options.strategy);
    let plan = planner.run(&existing, &topics, generator.as_ref()).await;

    let exporter = options.format.exporter();
    let exported = exporter.export(&plan)?;
    let Some(path) = options.output.as_deref().map(|p| output_path(p, exporter.as_ref())) else {
        // stdout carries only the document
        println!("{}", exported);
        if let Some(report) = &options.report {
            std::fs::write(report, plan.render_report())?;
        }
        return Ok(());
    };

    std::fs::write(&path, exported)?;
    output.success(&format!("Wrote {}", path.display()));
    if let Some(report) = &options.report {
        std::fs::write(report, plan.render_report())?;
        output.success(&format!("Wrote report {}", report.display()));
    }

    let s = &plan.summary;
    output.section("Summary");
    output.kv("Kept", s.kept);
    output.kv("Improved", s.improved);
    output.kv("Added", s.added);
    output.kv("Removed", s.removed);
    output.kv(
        "Words",
        format!("{} → {}", plan.original_words, plan.final_words()),
    );
    output.kv("Improvement", format!("{:.1}%", plan.improvement_score()));

    for entry in plan.needs_attention() {
        if let SectionStatus::NeedsAttention { reason } = &entry.status {
            output.warning(&format!("'{}' needs attention: {}", entry.heading(), reason));
        }
    }
    Ok(())
}
