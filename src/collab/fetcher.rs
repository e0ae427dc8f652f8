//! Document Fetcher
//!
//! Turns a source reference into a [`Document`]. Batch fetching is bounded and
//! never fails as a whole: each source either yields a document or a failure.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::collab::timeout::with_timeout;
use crate::types::{Document, HeadingLevel, Result, ReweaveError};

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Document>;
}

/// Result of a batch fetch, in source order
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<ReweaveError>,
}

impl FetchOutcome {
    pub fn attempted(&self) -> usize {
        self.documents.len() + self.failures.len()
    }
}

/// Fetch every source with at most `concurrency` requests in flight.
///
/// Failures and timeouts are recorded per source; no retries.
pub async fn fetch_all(
    fetcher: &dyn DocumentFetcher,
    sources: &[String],
    concurrency: usize,
    timeout: Duration,
) -> FetchOutcome {
    let mut results: Vec<(usize, Result<Document>)> = stream::iter(sources.iter().enumerate())
        .map(|(index, source)| async move {
            let operation = format!("fetch {}", source);
            let result = with_timeout(timeout, fetcher.fetch(source), &operation)
                .await
                .map_err(|e| match e {
                    e @ ReweaveError::Fetch { .. } => e,
                    other => ReweaveError::fetch(source.as_str(), other.to_string()),
                });
            (index, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    let mut outcome = FetchOutcome::default();
    for (_, result) in results {
        match result {
            Ok(doc) => outcome.documents.push(doc),
            Err(e) => {
                warn!("{}", e);
                outcome.failures.push(e);
            }
        }
    }
    info!(
        "Fetched {}/{} competitor document(s)",
        outcome.documents.len(),
        outcome.attempted()
    );
    outcome
}

// =============================================================================
// File Fetcher
// =============================================================================

/// Reads documents from local files.
///
/// `.json`, `.yaml` and `.yml` files hold a serialized [`Document`]; anything
/// else is read as Markdown with ATX headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl DocumentFetcher for FileFetcher {
    async fn fetch(&self, source: &str) -> Result<Document> {
        let path = Path::new(source);
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReweaveError::fetch(source, e.to_string()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let doc = match extension.as_deref() {
            Some("json") => serde_json::from_str::<Document>(&text)
                .map_err(|e| ReweaveError::fetch(source, e.to_string()))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str::<Document>(&text)
                .map_err(|e| ReweaveError::fetch(source, e.to_string()))?,
            _ => parse_markdown(&text),
        };

        Ok(match doc.source {
            Some(_) => doc,
            None => doc.with_source(source),
        })
    }
}

/// Split Markdown into H1-H3 sections.
///
/// Deeper headings and fenced code stay in the section body. Text before the
/// first heading is dropped.
pub fn parse_markdown(text: &str) -> Document {
    let mut sections: Vec<(HeadingLevel, String, Vec<&str>)> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        let heading = if in_fence { None } else { atx_heading(line) };
        match heading {
            Some((level, title)) => sections.push((level, title, Vec::new())),
            None => {
                if let Some((_, _, body)) = sections.last_mut() {
                    body.push(line);
                }
            }
        }
    }

    Document::from_sections(
        sections
            .into_iter()
            .map(|(level, title, body)| (level, title, body.join("\n").trim().to_string())),
    )
}

fn atx_heading(line: &str) -> Option<(HeadingLevel, String)> {
    // Up to three spaces of indentation
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let depth = rest.chars().take_while(|c| *c == '#').count();
    let level = HeadingLevel::from_depth(depth)?;
    let after = &rest[depth..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    let title = after.trim().trim_end_matches('#').trim_end();
    if title.is_empty() {
        return None;
    }
    Some((level, title.to_string()))
}
