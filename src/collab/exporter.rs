//! Plan exporters

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

use crate::engine::plan::{ActionPlan, SectionStatus};
use crate::types::{Result, ReweaveError};

pub trait Exporter: Send + Sync {
    /// File extension for the exported text, without the dot
    fn extension(&self) -> &str;

    fn export(&self, plan: &ActionPlan) -> Result<String>;
}

/// `path` with the exporter's extension when it has none
pub fn output_path(path: &Path, exporter: &dyn Exporter) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(exporter.extension())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn exporter(self) -> Box<dyn Exporter> {
        match self {
            Self::Markdown => Box::new(MarkdownExporter),
            Self::Json => Box::new(JsonExporter),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown export format: {}. Valid values: markdown, json",
                s
            )),
        }
    }
}

/// Revised article as Markdown. Sections needing attention carry an HTML
/// comment so they are visible in source but not in rendered output.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownExporter;

impl Exporter for MarkdownExporter {
    fn extension(&self) -> &str {
        "md"
    }

    fn export(&self, plan: &ActionPlan) -> Result<String> {
        let mut out = String::new();
        write_markdown(plan, &mut out).map_err(|e| ReweaveError::Export(e.to_string()))?;
        Ok(out)
    }
}

fn write_markdown(plan: &ActionPlan, out: &mut String) -> fmt::Result {
    if let Some(title) = &plan.title {
        writeln!(out, "# {}", title)?;
        writeln!(out)?;
    }
    if !plan.introduction.trim().is_empty() {
        writeln!(out, "{}", plan.introduction.trim())?;
        writeln!(out)?;
    }
    for entry in &plan.entries {
        writeln!(
            out,
            "{} {}",
            "#".repeat(entry.level().depth()),
            entry.heading()
        )?;
        writeln!(out)?;
        if let SectionStatus::NeedsAttention { reason } = &entry.status {
            writeln!(out, "<!-- needs attention: {} -->", reason.replace("--", "-"))?;
            writeln!(out)?;
        }
        if !entry.final_content.trim().is_empty() {
            writeln!(out, "{}", entry.final_content.trim())?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Full plan, including recommendations and preservation reports
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn extension(&self) -> &str {
        "json"
    }

    fn export(&self, plan: &ActionPlan) -> Result<String> {
        Ok(serde_json::to_string_pretty(plan)?)
    }
}
