//! Change magnitude and the human-readable optimization report

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::engine::plan::{ActionPlan, SectionStatus};
use crate::text::word_count;
use crate::types::Action;

/// How far a section's final text moved from its original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMagnitude {
    Unchanged,
    MinorEdits,
    ModerateChanges,
    SignificantChanges,
    MajorRewrite,
    /// No original text to compare against
    New,
}

impl ChangeMagnitude {
    pub fn between(original: &str, revised: &str) -> Self {
        if original.trim().is_empty() {
            return Self::New;
        }
        if original == revised {
            return Self::Unchanged;
        }
        let ratio = similarity(original, revised);
        if ratio > 0.9 {
            Self::MinorEdits
        } else if ratio > 0.7 {
            Self::ModerateChanges
        } else if ratio > 0.5 {
            Self::SignificantChanges
        } else {
            Self::MajorRewrite
        }
    }
}

impl fmt::Display for ChangeMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "No changes"),
            Self::MinorEdits => write!(f, "Minor edits"),
            Self::ModerateChanges => write!(f, "Moderate changes"),
            Self::SignificantChanges => write!(f, "Significant changes"),
            Self::MajorRewrite => write!(f, "Major rewrite"),
            Self::New => write!(f, "New section"),
        }
    }
}

/// Word-level similarity: 1 - edit distance / longer length, 1.0 for two
/// empty texts
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<&str> = a.split_whitespace().collect();
    let b: Vec<&str> = b.split_whitespace().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - strsim::generic_levenshtein(&a, &b) as f64 / longest as f64
}

/// Markdown optimization report for a finished plan
pub fn render(plan: &ActionPlan) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(plan, &mut out);
    out
}

fn write_report(plan: &ActionPlan, out: &mut String) -> fmt::Result {
    let s = &plan.summary;
    writeln!(out, "# Content Optimization Report")?;
    writeln!(out)?;
    writeln!(out, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    if let Some(title) = &plan.title {
        writeln!(out, "Document: {}", title)?;
    }
    writeln!(out)?;

    writeln!(out, "## Summary")?;
    writeln!(out, "- Original word count: {}", plan.original_words)?;
    writeln!(out, "- Optimized word count: {}", plan.final_words())?;
    writeln!(out, "- Overall improvement score: {:.1}%", plan.improvement_score())?;
    writeln!(out, "- Sections kept: {}", s.kept)?;
    writeln!(out, "- Sections improved: {}", s.improved)?;
    writeln!(out, "- Sections added: {}", s.added)?;
    writeln!(out, "- Sections removed: {}", s.removed)?;
    writeln!(out, "- Needs attention: {}", s.needs_attention)?;
    if plan.insufficient_data {
        writeln!(
            out,
            "- Competitor data insufficient: no sections were added from competitor coverage"
        )?;
    }

    writeln!(out)?;
    writeln!(out, "## Section Details")?;
    for entry in &plan.entries {
        let rec = &entry.recommendation;
        writeln!(out)?;
        writeln!(out, "### {}", rec.final_heading())?;
        match &rec.existing_heading {
            Some(before) if before != rec.final_heading() => {
                writeln!(out, "- Action: {} (was \"{}\")", rec.action, before)?
            }
            _ => writeln!(out, "- Action: {}", rec.action)?,
        }
        writeln!(out, "- Reason: {}", rec.reason)?;
        if let Some(strategy) = entry.strategy {
            writeln!(out, "- Strategy: {}", strategy)?;
        }
        writeln!(out, "- Changes: {}", entry.change)?;
        match rec.quality_score {
            Some(before) if before != entry.final_score => writeln!(
                out,
                "- Quality score: {} -> {}/100",
                before, entry.final_score
            )?,
            _ => writeln!(out, "- Quality score: {}/100", entry.final_score)?,
        }
        if rec.action == Action::Add {
            writeln!(out, "- Competitor support: {}", rec.competitor_support)?;
        }
        if !rec.subheadings.is_empty() {
            writeln!(out, "- Suggested subheadings: {}", rec.subheadings.join("; "))?;
        }
        writeln!(
            out,
            "- Words: {} -> {}",
            word_count(&entry.original_content),
            word_count(&entry.final_content)
        )?;
        if !entry.preservation_report.is_empty() {
            writeln!(out, "- Preserved: {}", entry.preservation_report)?;
        }
        if let SectionStatus::NeedsAttention { reason } = &entry.status {
            writeln!(out, "- NEEDS ATTENTION: {}", reason)?;
        }
    }

    if !plan.removed.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Removed Sections")?;
        for rec in &plan.removed {
            writeln!(
                out,
                "- {} ({}): {}",
                rec.existing_heading.as_deref().unwrap_or(&rec.proposed_heading),
                rec.level,
                rec.reason
            )?;
        }
    }
    Ok(())
}
