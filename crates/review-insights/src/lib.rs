//! Customer Review Insights Library
//!
//! Turns raw customer reviews into structured, exportable insight reports
//! with the help of a generative-language model.
//!
//! # Overview
//!
//! - **Ingestion**: pasted text, CSV/TXT/XLSX uploads and published Google
//!   Sheets, with upload limits checked before anything is read
//! - **Persona Analysis**: split a CSV by a segment column and analyse
//!   each customer persona on its own
//! - **Analysis Runs**: per-source summaries and strategic analyses,
//!   requested concurrently and committed all-or-nothing
//! - **Follow-ups**: trend comparison of two reports, chat questions,
//!   deep dives on a keyword and reply drafts
//! - **Export**: plain text, PDF, DOCX and JSON reports, plus SVG charts
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use review_insights::ai::GeminiProvider;
//! use review_insights::{AnalysisController, ExportFormat, InsightsConfig};
//! use std::sync::Arc;
//!
//! let controller = AnalysisController::builder()
//!     .config(InsightsConfig::builder().segment_column("Customer Type").build()?)
//!     .provider(Arc::new(GeminiProvider::new(api_key)?))
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build();
//!
//! controller.load_files(vec!["reviews.csv".into()]).await?;
//! controller.run_analysis().await?;
//!
//! let path = controller.write_report(0, ExportFormat::Pdf, None).await?;
//! println!("Report written to {}", path.display());
//! ```
//!
//! # Providers
//!
//! All model calls go through the [`ai::InsightsProvider`] trait. The
//! crate ships [`ai::GeminiProvider`]; see the [`ai`] module to add another.
//!
//! # Features
//!
//! | Feature | Enables                                   |
//! |---------|-------------------------------------------|
//! | `xlsx`  | spreadsheet uploads via `calamine`        |
//! | `pdf`   | PDF export via `lopdf`                    |
//! | `docx`  | Word export via `docx-rs`                 |
//!
//! All three are on by default. Without them the matching operation fails
//! with [`InsightsError::CapabilityUnavailable`].

pub mod ai;
pub mod config;
pub mod credentials;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod state;
pub mod types;

// Re-exports for convenient access
pub use config::{ConfigValidationError, InsightsConfig, InsightsConfigBuilder};
pub use credentials::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
};
pub use error::{InsightsError, Result as InsightsResult, ResultExt};
pub use pipeline::{
    AnalysisController, AnalysisControllerBuilder, AnalysisStage, CancellationToken,
    ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
pub use report::{ExportArtifact, ExportFormat, RendererRegistry, ReportData, ReportRenderer};
pub use state::{AppEvent, AppState, SourceField, TrendReport};
pub use types::{
    ChatMessage, ChatSender, DeepDiveAnalysis, Insight, Keyword, PersonaComparison, ReviewSource,
    SegmentComparison, SentimentPoint, StrategicAnalysis, StrategicStep, Summary, TrendAnalysis,
};
