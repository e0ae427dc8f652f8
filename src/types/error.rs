//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Propagation Policy
//!
//! - **Per-section failures** (`Generation`, `Timeout`) are recovered locally by the
//!   action planner: the section degrades and is flagged, the plan continues.
//! - **Per-source failures** (`Fetch`) are collected by the batch fetcher and never
//!   abort the batch.
//! - **`InsufficientCompetitorData`** is a signal, not a crash: classification still
//!   runs in bootstrap mode.
//! - **`InvariantViolation`** is a programming error. It is produced only by
//!   `Reconciliation::verify()` and is asserted in debug builds and tests.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
    /// Expected value or format
    pub expected: Option<String>,
    /// Actual value received
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)?;
        } else {
            write!(f, "Validation failed: {}", self.message)?;
        }
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected {}, got {})", expected, actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add expected/actual values
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Positions not strictly increasing
    Ordering,
    /// Stored count disagrees with content
    Consistency,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ReweaveError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    // -------------------------------------------------------------------------
    // Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("Failed to fetch {source_ref}: {message}")]
    Fetch { source_ref: String, message: String },

    #[error("Generation failed for '{heading}': {reason}")]
    Generation { heading: String, reason: String },

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Insufficient competitor data: {usable} usable document(s), at least {required} required")]
    InsufficientCompetitorData { usable: usize, required: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("{0}")]
    Validation(ValidationError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<ValidationError> for ReweaveError {
    fn from(err: ValidationError) -> Self {
        ReweaveError::Validation(err)
    }
}

impl From<reqwest::Error> for ReweaveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReweaveError::Http(format!("request timed out: {}", err))
        } else {
            ReweaveError::Http(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ReweaveError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl ReweaveError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a per-section generation error
    pub fn generation(heading: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Generation {
            heading: heading.into(),
            reason: reason.into(),
        }
    }

    /// Create a per-source fetch error
    pub fn fetch(source_ref: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_ref: source_ref.into(),
            message: message.into(),
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ReweaveError::Config(format!("{}: {}", context.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(ValidationErrorKind::Consistency, "word count mismatch")
            .with_field("headings[2].word_count")
            .with_comparison("12", "10");
        assert_eq!(
            err.to_string(),
            "Validation failed for 'headings[2].word_count': word count mismatch (expected 12, got 10)"
        );
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = ReweaveError::InsufficientCompetitorData {
            usable: 1,
            required: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient competitor data: 1 usable document(s), at least 2 required"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = ReweaveError::timeout("generate 'What is a CDN?'", Duration::from_secs(2));
        assert_eq!(err.to_string(), "Timeout after 2s: generate 'What is a CDN?'");
    }

    #[test]
    fn test_result_ext_context() {
        let raw: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let err = raw.with_context("reading config").unwrap_err();
        assert!(err.to_string().contains("reading config: missing"));
    }
}
