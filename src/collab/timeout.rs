//! Timeout helpers for collaborator calls
//!
//! Generation and fetching each get a per-call deadline. An expired deadline
//! becomes a [`ReweaveError::Timeout`] that callers treat as a local failure.
//!
//! ```ignore
//! use crate::collab::timeout::{TimeoutConfig, with_timeout};
//!
//! let timeouts = TimeoutConfig::from_config(&config);
//! let text = with_timeout(
//!     timeouts.generation,
//!     generator.generate(&request),
//!     "generate 'What is a CDN?'",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::constants::network;
use crate::types::{Result, ReweaveError};

/// Per-call deadlines for the two collaborator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// One section generation request
    pub generation: Duration,
    /// One competitor document fetch
    pub fetch: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            generation: Duration::from_secs(network::GENERATION_TIMEOUT_SECS),
            fetch: Duration::from_secs(network::FETCH_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generation: Duration::from_secs(config.generator.timeout_secs),
            fetch: Duration::from_secs(config.fetch.timeout_secs),
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ReweaveError::timeout(operation_name, timeout)),
    }
}
