//! Generative-language backends.
//!
//! The [`InsightsProvider`] trait is what orchestration depends on;
//! [`GeminiProvider`] is the production implementation.
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `src/ai/openai.rs`)
//! 2. Implement the [`InsightsProvider`] trait
//! 3. Export the new provider in this module
//!
//! # Example
//!
//! ```rust,ignore
//! use review_insights::ai::{GeminiProvider, InsightsProvider};
//! use std::sync::Arc;
//!
//! let provider: Arc<dyn InsightsProvider> = Arc::new(GeminiProvider::new(api_key)?);
//! let summary = provider.summarize(&reviews, "Auto-detect", "").await?;
//! ```

mod gemini;
pub mod prompts;
mod provider;
pub mod schema;

pub use gemini::{GeminiConfig, GeminiConfigBuilder, GeminiProvider};
pub use provider::InsightsProvider;
