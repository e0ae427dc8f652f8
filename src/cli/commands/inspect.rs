//! Inspect Command
//!
//! Shows how a single document is seen by the engine: topic keys, quality
//! scores, valuable elements and diagnostics per heading.

use serde::Serialize;

use crate::cli::ui::Output;
use crate::collab::{DocumentFetcher, FileFetcher};
use crate::config::ConfigLoader;
use crate::engine::{QualityIssue, QualityScorer, extract};
use crate::text::{TopicKey, is_question_format};
use crate::types::{Document, HeadingLevel, PreservationReport, Result};

#[derive(Debug, Serialize)]
pub struct SectionInspection {
    pub heading: String,
    pub level: HeadingLevel,
    pub topic_key: String,
    pub words: usize,
    pub score: u8,
    pub question_format: bool,
    pub elements: PreservationReport,
    pub issues: Vec<QualityIssue>,
}

pub fn inspect(doc: &Document, scorer: &QualityScorer) -> Vec<SectionInspection> {
    doc.headings()
        .iter()
        .map(|h| {
            let assessment = scorer.assess_section(&h.text, &h.content);
            SectionInspection {
                heading: h.text.clone(),
                level: h.level,
                topic_key: TopicKey::from_heading(&h.text).to_string(),
                words: h.word_count,
                score: assessment.score,
                question_format: is_question_format(&h.text),
                elements: PreservationReport::full(&extract(&h.content)),
                issues: assessment.issues,
            }
        })
        .collect()
}

pub async fn run(source: &str, format: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    let doc = FileFetcher.fetch(source).await?;
    let sections = inspect(&doc, &QualityScorer::new(config.quality.clone()));

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    let output = Output::new();
    output.header(source);
    output.kv("Headings", doc.len());
    output.kv("Words", doc.total_words());
    for s in &sections {
        output.section(&format!("{} {}", s.level, s.heading));
        output.kv("Topic key", &s.topic_key);
        output.kv("Score", format!("{}/100 ({} words)", s.score, s.words));
        if s.level == HeadingLevel::H2 {
            output.kv("Question format", if s.question_format { "yes" } else { "no" });
        }
        output.kv("Elements", &s.elements);
        for issue in &s.issues {
            output.warning(&issue.to_string());
        }
    }
    Ok(())
}
