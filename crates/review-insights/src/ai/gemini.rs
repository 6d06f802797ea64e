//! Google Gemini provider implementation.
//!
//! This module provides the [`GeminiProvider`] which implements
//! [`InsightsProvider`] against the `generateContent` REST endpoint
//! (<https://ai.google.dev/>).
//!
//! Two models are used: a fast one for per-source work (summaries, deep
//! dives, chat) and a reasoning one for cross-summary work (strategy,
//! trends, persona comparison).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::provider::InsightsProvider;
use super::{prompts, schema};
use crate::error::{InsightsError, Result};
use crate::types::{
    DeepDiveAnalysis, PersonaComparison, SegmentSummary, StrategicAnalysis, Summary, TrendAnalysis,
};

/// Default Gemini API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/";

/// Model for summaries, deep dives, chat, questions, sample data and replies.
const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash";

/// Model for strategy, trend and persona comparison.
const DEFAULT_REASONING_MODEL: &str = "gemini-2.5-pro";

/// Default timeout for API requests in seconds. Reasoning calls are slow.
const DEFAULT_TIMEOUT_SECS: u64 = 180;

// Gemini API request structures
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

// Gemini API response structures
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Pull the generated text out of a response.
///
/// Text parts of the first candidate are concatenated. Blocked, empty or
/// missing candidates are errors.
fn extract_text(response: GeminiResponse) -> std::result::Result<String, String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("Prompt was blocked ({reason})"));
    }

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| "The response was empty.".to_string())?;

    if let Some(reason) = &candidate.finish_reason
        && (reason == "SAFETY" || reason == "BLOCKED")
    {
        return Err(format!("Response was blocked ({reason})"));
    }

    let text: String = candidate
        .content
        .and_then(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err("The response was empty.".to_string());
    }
    Ok(text)
}

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Model for per-source requests.
    pub fast_model: String,
    /// Model for strategy, trend and persona comparison.
    pub reasoning_model: String,
    /// Sampling temperature (0.0 - 2.0). `None` uses the model default.
    pub temperature: Option<f32>,
    /// Maximum output tokens. `None` uses the model default.
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL for the API (useful for proxies or custom endpoints).
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            fast_model: DEFAULT_FAST_MODEL.to_owned(),
            reasoning_model: DEFAULT_REASONING_MODEL.to_owned(),
            temperature: None,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl GeminiConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }
}

/// Builder for [`GeminiConfig`].
#[derive(Default)]
pub struct GeminiConfigBuilder {
    fast_model: Option<String>,
    reasoning_model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
    pub fn fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = Some(model.into());
        self
    }

    pub fn reasoning_model(mut self, model: impl Into<String>) -> Self {
        self.reasoning_model = Some(model.into());
        self
    }

    /// Set the temperature (0.0 - 2.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Set a custom base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiConfig {
        GeminiConfig {
            fast_model: self.fast_model.unwrap_or_else(|| DEFAULT_FAST_MODEL.to_owned()),
            reasoning_model: self
                .reasoning_model
                .unwrap_or_else(|| DEFAULT_REASONING_MODEL.to_owned()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        }
    }
}

/// Google Gemini provider.
///
/// # Example
///
/// ```rust,ignore
/// use review_insights::ai::{GeminiConfig, GeminiProvider};
///
/// let provider = GeminiProvider::new("your-api-key")?;
///
/// let config = GeminiConfig::builder()
///     .reasoning_model("gemini-2.5-flash")
///     .timeout_secs(60)
///     .build();
/// let provider = GeminiProvider::with_config("your-api-key", config)?;
/// ```
pub struct GeminiProvider {
    api_key: String,
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Create a provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, GeminiConfig::default())
    }

    /// Create a provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InsightsError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            config,
            client,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        // {base_url}{model}:generateContent?key={api_key}
        format!(
            "{}{}:generateContent?key={}",
            self.config.base_url, model, self.api_key
        )
    }

    fn build_request(&self, prompt: &str, schema: Option<Value>) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                role: "user".to_owned(),
                parts: vec![RequestPart {
                    text: prompt.to_owned(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                response_mime_type: schema.as_ref().map(|_| "application/json".to_owned()),
                response_schema: schema,
            },
        }
    }

    /// Send a prompt and return the generated text.
    ///
    /// Every failure is mapped to [`InsightsError::Api`] for `action`.
    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        schema: Option<Value>,
        action: &str,
    ) -> Result<String> {
        let request = self.build_request(prompt, schema);
        debug!("Gemini request: model={}, action={}", model, action);

        let response = self
            .client
            .post(self.endpoint(model))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| InsightsError::api(action, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {} for '{}'", status, action);
            return Err(InsightsError::api(action, format!("HTTP {status}: {body}")));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| InsightsError::api(action, e.without_url()))?;

        extract_text(parsed).map_err(|detail| InsightsError::api(action, detail))
    }

    /// Send a prompt with a response schema and parse the JSON answer.
    async fn generate_structured<T: DeserializeOwned>(
        &self,
        model: &str,
        prompt: &str,
        schema: Value,
        action: &str,
    ) -> Result<T> {
        let text = self.generate_text(model, prompt, Some(schema), action).await?;
        parse_structured(&text, action)
    }
}

fn parse_structured<T: DeserializeOwned>(text: &str, action: &str) -> Result<T> {
    serde_json::from_str(text.trim())
        .map_err(|e| InsightsError::api(action, format!("invalid JSON in response: {e}")))
}

#[async_trait]
impl InsightsProvider for GeminiProvider {
    async fn summarize(&self, reviews: &str, language: &str, context: &str) -> Result<Summary> {
        let prompt = prompts::summary_prompt(reviews, language, context);
        self.generate_structured(
            &self.config.fast_model,
            &prompt,
            schema::summary_schema(),
            "process reviews",
        )
        .await
    }

    async fn strategic_analysis(
        &self,
        summary: &Summary,
        language: &str,
    ) -> Result<StrategicAnalysis> {
        let prompt = prompts::strategy_prompt(summary, language);
        self.generate_structured(
            &self.config.reasoning_model,
            &prompt,
            schema::strategy_schema(),
            "generate strategic analysis",
        )
        .await
    }

    async fn trend_analysis(
        &self,
        start: &Summary,
        end: &Summary,
        start_label: &str,
        end_label: &str,
        language: &str,
    ) -> Result<TrendAnalysis> {
        let prompt = prompts::trend_prompt(start, end, start_label, end_label, language);
        self.generate_structured(
            &self.config.reasoning_model,
            &prompt,
            schema::trend_schema(start_label, end_label),
            "generate trend analysis",
        )
        .await
    }

    async fn persona_comparison(
        &self,
        summaries: &[SegmentSummary<'_>],
        language: &str,
    ) -> Result<PersonaComparison> {
        let prompt = prompts::persona_prompt(summaries, language);
        self.generate_structured(
            &self.config.reasoning_model,
            &prompt,
            schema::persona_schema(),
            "generate persona comparison",
        )
        .await
    }

    async fn deep_dive(
        &self,
        reviews: &str,
        topic: &str,
        language: &str,
        context: &str,
    ) -> Result<DeepDiveAnalysis> {
        let prompt = prompts::deep_dive_prompt(reviews, topic, language, context);
        self.generate_structured(
            &self.config.fast_model,
            &prompt,
            schema::deep_dive_schema(topic),
            "generate deep dive analysis",
        )
        .await
    }

    async fn answer_question(
        &self,
        reviews: &str,
        question: &str,
        language: &str,
        context: &str,
    ) -> Result<String> {
        let prompt = prompts::question_prompt(reviews, question, language, context);
        self.generate_text(&self.config.fast_model, &prompt, None, "answer question")
            .await
    }

    async fn suggest_questions(&self, reviews: &str, context: &str) -> Result<Vec<String>> {
        let prompt = prompts::suggested_questions_prompt(reviews, context);
        self.generate_structured(
            &self.config.fast_model,
            &prompt,
            schema::questions_schema(),
            "generate questions",
        )
        .await
    }

    async fn draft_reply(&self, complaint: &str, language: &str, context: &str) -> Result<String> {
        let prompt = prompts::draft_reply_prompt(complaint, language, context);
        self.generate_text(&self.config.fast_model, &prompt, None, "draft reply")
            .await
    }

    async fn sample_reviews(&self) -> Result<String> {
        let prompt = prompts::sample_reviews_prompt();
        self.generate_text(&self.config.fast_model, &prompt, None, "generate sample data")
            .await
    }

    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.fast_model)
    }
}

// ============================================================================
// Tests
// ============================================================================
