//! Configuration Types
//!
//! All configuration structures with defaults taken from `crate::constants`.
//! Supports global (~/.config/reweave/) and project (.reweave/) level configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{matching, merge, network, quality};
use crate::engine::merge::MergeStrategy;
use crate::types::{Result, ReweaveError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Topic matching and classification thresholds
    pub matching: MatchingConfig,

    /// Quality scorer weights and bands
    pub quality: QualityConfig,

    /// Merge engine settings
    pub merge: MergeConfig,

    /// Section generator settings
    pub generator: GeneratorConfig,

    /// Competitor fetch settings
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            matching: MatchingConfig::default(),
            quality: QualityConfig::default(),
            merge: MergeConfig::default(),
            generator: GeneratorConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ReweaveError::Config(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_nonzero(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ReweaveError::Config(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ReweaveError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        check_ratio("matching.topic_overlap_threshold", m.topic_overlap_threshold)?;
        check_ratio(
            "matching.content_duplicate_threshold",
            m.content_duplicate_threshold,
        )?;
        check_ratio("matching.off_topic_threshold", m.off_topic_threshold)?;
        if m.topic_overlap_threshold == 0.0 {
            return Err(ReweaveError::Config(
                "matching.topic_overlap_threshold must be greater than 0".to_string(),
            ));
        }
        check_nonzero("matching.min_competitors", m.min_competitors)?;
        check_nonzero("matching.min_occurrence", m.min_occurrence)?;
        check_nonzero("matching.max_example_headings", m.max_example_headings)?;

        let q = &self.quality;
        let weight_sum =
            u32::from(q.density_weight) + u32::from(q.length_weight) + u32::from(q.generic_weight);
        if weight_sum != 100 {
            return Err(ReweaveError::Config(format!(
                "quality weights must sum to 100, got {}",
                weight_sum
            )));
        }
        if q.target_density <= 0.0 || q.max_generic_rate <= 0.0 {
            return Err(ReweaveError::Config(
                "quality.target_density and quality.max_generic_rate must be positive".to_string(),
            ));
        }
        if q.ideal_min_words == 0 || q.ideal_min_words > q.ideal_max_words {
            return Err(ReweaveError::Config(format!(
                "quality ideal band is empty: [{}, {}]",
                q.ideal_min_words, q.ideal_max_words
            )));
        }
        if q.improve_threshold > 100 {
            return Err(ReweaveError::Config(
                "quality.improve_threshold must be between 0 and 100".to_string(),
            ));
        }

        check_ratio("merge.fuzzy_threshold", self.merge.fuzzy_threshold)?;
        check_nonzero("merge.top_k", self.merge.top_k)?;

        check_nonzero("generator.max_concurrency", self.generator.max_concurrency)?;
        if self.generator.timeout_secs == 0 {
            return Err(ReweaveError::Config(
                "generator.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ReweaveError::Config(format!(
                "generator.temperature must be between 0.0 and 2.0, got {}",
                self.generator.temperature
            )));
        }

        check_nonzero("fetch.max_concurrency", self.fetch.max_concurrency)?;
        if self.fetch.timeout_secs == 0 {
            return Err(ReweaveError::Config(
                "fetch.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Matching Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Key overlap at which two headings are the same topic
    pub topic_overlap_threshold: f64,

    /// Content Jaccard similarity at which two sections duplicate each other
    pub content_duplicate_threshold: f64,

    /// Relevance below which a section is off-topic
    pub off_topic_threshold: f64,

    /// Usable competitor documents required
    pub min_competitors: usize,

    /// Competitor documents that must cover a topic for it to become an ADD
    pub min_occurrence: usize,

    pub max_example_headings: usize,

    pub max_subheadings: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            topic_overlap_threshold: matching::TOPIC_OVERLAP_THRESHOLD,
            content_duplicate_threshold: matching::CONTENT_DUPLICATE_THRESHOLD,
            off_topic_threshold: matching::OFF_TOPIC_THRESHOLD,
            min_competitors: matching::MIN_COMPETITORS,
            min_occurrence: matching::MIN_OCCURRENCE,
            max_example_headings: matching::MAX_EXAMPLE_HEADINGS,
            max_subheadings: matching::MAX_SUBHEADINGS,
        }
    }
}

// =============================================================================
// Quality Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub density_weight: u8,
    pub length_weight: u8,
    pub generic_weight: u8,

    /// Elements per 100 words earning the full density weight
    pub target_density: f64,

    /// Generic phrases per 100 words that zero the generic weight
    pub max_generic_rate: f64,

    pub ideal_min_words: usize,
    pub ideal_max_words: usize,

    /// Scores below this fail the depth check
    pub improve_threshold: u8,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            density_weight: quality::DENSITY_WEIGHT,
            length_weight: quality::LENGTH_WEIGHT,
            generic_weight: quality::GENERIC_WEIGHT,
            target_density: quality::TARGET_DENSITY,
            max_generic_rate: quality::MAX_GENERIC_RATE,
            ideal_min_words: quality::IDEAL_MIN_WORDS,
            ideal_max_words: quality::IDEAL_MAX_WORDS,
            improve_threshold: quality::IMPROVE_THRESHOLD,
        }
    }
}

// =============================================================================
// Merge Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Elements kept by the `smart` strategy
    pub top_k: usize,

    /// Token containment for an element to count as already present
    pub fuzzy_threshold: f64,

    pub separator: String,

    /// Force one strategy for every IMPROVE section instead of the quality band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_override: Option<MergeStrategy>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            top_k: merge::TOP_K,
            fuzzy_threshold: merge::FUZZY_THRESHOLD,
            separator: merge::SEPARATOR.to_string(),
            strategy_override: None,
        }
    }
}

// =============================================================================
// Generator Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    /// Never generates; sections degrade to their original text
    #[default]
    Offline,
    Openai,
}

impl std::fmt::Display for GeneratorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorProvider::Offline => write!(f, "offline"),
            GeneratorProvider::Openai => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for GeneratorProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offline" => Ok(GeneratorProvider::Offline),
            "openai" => Ok(GeneratorProvider::Openai),
            _ => Err(format!(
                "Unknown generator provider: {}. Valid values: offline, openai",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: GeneratorProvider,

    pub model: String,

    /// Chat Completions base URL
    pub endpoint: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Per-section timeout in seconds
    pub timeout_secs: u64,

    pub temperature: f32,

    /// Concurrent generation requests
    pub max_concurrency: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::Offline,
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: network::GENERATION_TIMEOUT_SECS,
            temperature: 0.3,
            max_concurrency: network::GENERATION_CONCURRENCY,
        }
    }
}

// =============================================================================
// Fetch Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Concurrent competitor fetches
    pub max_concurrency: usize,

    /// Per-document timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: network::FETCH_CONCURRENCY,
            timeout_secs: network::FETCH_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.generator.provider, GeneratorProvider::Offline);
        assert_eq!(config.matching.topic_overlap_threshold, 0.70);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_weights_not_summing_to_100() {
        let mut config = Config::default();
        config.quality.density_weight = 60;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 100"));
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.matching.off_topic_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.generator.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_ideal_band() {
        let mut config = Config::default();
        config.quality.ideal_min_words = 400;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generator_provider_parse() {
        assert_eq!(
            "openai".parse::<GeneratorProvider>().unwrap(),
            GeneratorProvider::Openai
        );
        assert_eq!(GeneratorProvider::Offline.to_string(), "offline");
        assert!("claude".parse::<GeneratorProvider>().is_err());
    }
}
