//! Provider trait for the generative-language backend.
//!
//! The [`InsightsProvider`] trait is the seam between orchestration and the
//! network: the controller only ever talks to an `Arc<dyn InsightsProvider>`,
//! so tests substitute a scripted mock and alternative backends can be
//! added without touching the pipeline.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new file in `src/ai/` (e.g., `openai.rs`)
//! 2. Implement [`InsightsProvider`] for your provider struct
//! 3. Export the provider in `src/ai/mod.rs`

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    DeepDiveAnalysis, PersonaComparison, SegmentSummary, StrategicAnalysis, Summary, TrendAnalysis,
};

/// Backend that turns review text into structured analysis.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; sibling requests of one stage run
/// concurrently on the same provider.
///
/// # Error Handling
///
/// Failures are reported as [`InsightsError::Api`](crate::error::InsightsError::Api)
/// carrying the failed action, e.g. "Failed to process reviews. Gemini API
/// error: ...". Providers never retry.
#[async_trait]
pub trait InsightsProvider: Send + Sync {
    /// Summarize one block of reviews.
    async fn summarize(&self, reviews: &str, language: &str, context: &str) -> Result<Summary>;

    /// Derive a strategic analysis from a summary.
    async fn strategic_analysis(&self, summary: &Summary, language: &str)
    -> Result<StrategicAnalysis>;

    /// Compare two summaries, `start` being the earlier one.
    async fn trend_analysis(
        &self,
        start: &Summary,
        end: &Summary,
        start_label: &str,
        end_label: &str,
        language: &str,
    ) -> Result<TrendAnalysis>;

    /// Compare per-segment summaries.
    async fn persona_comparison(
        &self,
        summaries: &[SegmentSummary<'_>],
        language: &str,
    ) -> Result<PersonaComparison>;

    /// Analyze a single keyword or theme across the reviews.
    async fn deep_dive(
        &self,
        reviews: &str,
        topic: &str,
        language: &str,
        context: &str,
    ) -> Result<DeepDiveAnalysis>;

    /// Answer a free-form question about the reviews.
    async fn answer_question(
        &self,
        reviews: &str,
        question: &str,
        language: &str,
        context: &str,
    ) -> Result<String>;

    /// Suggest 3-4 questions worth asking about the reviews.
    async fn suggest_questions(&self, reviews: &str, context: &str) -> Result<Vec<String>>;

    /// Draft a customer-service reply to a complaint.
    async fn draft_reply(&self, complaint: &str, language: &str, context: &str) -> Result<String>;

    /// Generate a sample review dataset as CSV.
    async fn sample_reviews(&self) -> Result<String>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Primary model used by this provider, if it exposes one.
    fn model(&self) -> Option<&str> {
        None
    }
}
