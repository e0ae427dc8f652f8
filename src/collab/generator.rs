//! Section Generator
//!
//! Produces fresh text for one heading. The planner never inspects how text
//! is produced; it only merges what comes back.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{GeneratorConfig, GeneratorProvider};
use crate::text::QuestionPattern;
use crate::types::{Action, HeadingLevel, Result, ReweaveError};

/// Everything a generator may use to write one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub heading: String,
    pub level: HeadingLevel,
    pub action: Action,
    /// Existing section text; empty for new sections
    pub original: String,
    /// Fact-bearing sentences the new text should keep
    pub preserve: Vec<String>,
    pub subheadings: Vec<String>,
    /// Title of the document being revised
    pub subject: Option<String>,
}

impl GenerationRequest {
    /// User prompt for chat-style generators
    pub fn prompt(&self) -> String {
        let mut prompt = format!("Write the body of the section \"{}\".\n", self.heading);
        if let Some(subject) = &self.subject {
            prompt.push_str(&format!("The article is titled \"{}\".\n", subject));
        }
        prompt.push_str(QuestionPattern::detect(&self.heading).answer_guidance());
        prompt.push('\n');
        if !self.subheadings.is_empty() {
            prompt.push_str("\nCover these subtopics:\n");
            for sub in &self.subheadings {
                prompt.push_str(&format!("- {}\n", sub));
            }
        }
        if !self.preserve.is_empty() {
            prompt.push_str("\nKeep these facts accurate and include them:\n");
            for fact in &self.preserve {
                prompt.push_str(&format!("- {}\n", fact));
            }
        }
        if self.action == Action::Improve && !self.original.trim().is_empty() {
            prompt.push_str(&format!("\nCurrent text to improve:\n{}\n", self.original.trim()));
        }
        prompt.push_str("\nReturn only the section body as plain paragraphs, without the heading.");
        prompt
    }
}

#[async_trait]
pub trait SectionGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Build the generator selected in config
pub fn build_generator(config: &GeneratorConfig) -> Result<Arc<dyn SectionGenerator>> {
    match config.provider {
        GeneratorProvider::Offline => Ok(Arc::new(OfflineGenerator)),
        GeneratorProvider::Openai => Ok(Arc::new(OpenAiGenerator::from_config(config)?)),
    }
}

// =============================================================================
// Offline
// =============================================================================

/// Generator for dry runs: every request fails, so IMPROVE sections keep
/// their original text and ADD sections become placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl SectionGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Err(ReweaveError::generation(
            &request.heading,
            "no generator configured (offline mode)",
        ))
    }
}

// =============================================================================
// OpenAI Chat Completions
// =============================================================================

const SYSTEM_PROMPT: &str = "You revise web articles section by section. Write concrete, specific prose. Never invent statistics; reuse the facts you are given verbatim.";

pub struct OpenAiGenerator {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    endpoint: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiGenerator {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ReweaveError::Config(format!(
                    "OpenAI API key not found. Set the {} environment variable",
                    config.api_key_env
                ))
            })?;
        Self::new(SecretString::from(api_key), config)
    }

    pub fn new(api_key: SecretString, config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReweaveError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt(),
                },
            ],
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl SectionGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!("Generating '{}' with {}", request.heading, self.model);
        let url = format!("{}/chat/completions", self.endpoint);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&self.build_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReweaveError::generation(
                &request.heading,
                format!("API error ({}): {}", status, body),
            ));
        }

        let body: ChatCompletionResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ReweaveError::generation(&request.heading, "empty completion"))?;

        debug!("Generated {} chars for '{}'", text.len(), request.heading);
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            heading: "What are the benefits of CDN?".to_string(),
            level: HeadingLevel::H2,
            action: Action::Improve,
            original: "CDNs are good.".to_string(),
            preserve: vec!["Latency fell 40%.".to_string()],
            subheadings: vec!["Lower latency".to_string()],
            subject: Some("CDN guide".to_string()),
        }
    }

    #[test]
    fn test_prompt_carries_context() {
        let prompt = request().prompt();
        assert!(prompt.contains("\"What are the benefits of CDN?\""));
        assert!(prompt.contains("titled \"CDN guide\""));
        assert!(prompt.contains("bullet points"));
        assert!(prompt.contains("- Lower latency"));
        assert!(prompt.contains("- Latency fell 40%."));
        assert!(prompt.contains("CDNs are good."));

        assert!(prompt.starts_with(
            "Write the body of the section \"What are the benefits of CDN?\".\nThe article is titled \"CDN guide\".\n"
        ));
        assert!(prompt.contains("\n\nCover these subtopics:\n- Lower latency\n"));
        assert!(prompt.contains("\n\nKeep these facts accurate and include them:\n- Latency fell 40%.\n"));
        assert!(prompt.ends_with("\n\nReturn only the section body as plain paragraphs, without the heading."));
    }

    #[test]
    fn test_prompt_for_add_omits_original() {
        let mut req = request();
        req.action = Action::Add;
        req.original = "Partial mention of CDN benefits.".to_string();
        assert!(!req.prompt().contains("Current text to improve"));
    }

    #[tokio::test]
    async fn test_offline_always_fails() {
        let err = OfflineGenerator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ReweaveError::Generation { .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let generator = OpenAiGenerator::new(
            SecretString::from("sk-very-secret".to_string()),
            &GeneratorConfig::default(),
        )
        .unwrap();
        let debug = format!("{:?}", generator);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-very-secret"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = GeneratorConfig {
            provider: GeneratorProvider::Openai,
            api_key_env: "REWEAVE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            OpenAiGenerator::from_config(&config),
            Err(ReweaveError::Config(_))
        ));
        assert!(build_generator(&config).is_err());
    }

    #[test]
    fn test_build_offline_by_default() {
        let generator = build_generator(&GeneratorConfig::default()).unwrap();
        assert_eq!(generator.name(), "offline");
    }

    #[test]
    fn test_request_body_shape() {
        let generator = OpenAiGenerator::new(
            SecretString::from("k".to_string()),
            &GeneratorConfig::default(),
        )
        .unwrap();
        let body = serde_json::to_value(generator.build_request(&request())).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
    }
}
