//! External collaborators
//!
//! The engine is pure. Everything that touches the outside world sits behind
//! the traits here:
//! - `fetcher`: [`DocumentFetcher`] and bounded batch fetching
//! - `generator`: [`SectionGenerator`] for fresh section text
//! - `exporter`: [`Exporter`] for the finished plan
//! - `timeout`: per-call deadlines

pub mod exporter;
pub mod fetcher;
pub mod generator;
pub mod timeout;

pub use exporter::{ExportFormat, Exporter, JsonExporter, MarkdownExporter, output_path};
pub use fetcher::{DocumentFetcher, FetchOutcome, FileFetcher, fetch_all, parse_markdown};
pub use generator::{
    GenerationRequest, OfflineGenerator, OpenAiGenerator, SectionGenerator, build_generator,
};
pub use timeout::{TimeoutConfig, with_timeout};
