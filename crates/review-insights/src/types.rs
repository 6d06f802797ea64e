//! Core data types shared across ingestion, analysis and reporting.
//!
//! Analysis types mirror the JSON shapes requested from the model, so their
//! serde representation uses camelCase field names.

use serde::{Deserialize, Serialize};

// ============================================================================
// Review sources
// ============================================================================

/// One named block of review text, the unit of independent analysis.
///
/// Sources are held in an ordered list; a source's position is its identity
/// (tab order, comparison indices, report index).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSource {
    pub label: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_date: Option<String>,
}

impl ReviewSource {
    /// Create a source with no product context or report date.
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            product_context: None,
            report_date: None,
        }
    }

    /// Attach background context about the reviewed product.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.product_context = Some(context.into());
        self
    }

    /// Attach a report date (e.g. "Q4 2024").
    pub fn with_report_date(mut self, date: impl Into<String>) -> Self {
        self.report_date = Some(date.into());
        self
    }

    /// Product context, or the empty string.
    pub fn context_or_empty(&self) -> &str {
        self.product_context.as_deref().unwrap_or("")
    }

    /// True when the content is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ============================================================================
// Analysis results (produced externally)
// ============================================================================

/// Counts of positive, negative and neutral reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    #[serde(default)]
    pub positive: f64,
    #[serde(default)]
    pub negative: f64,
    #[serde(default)]
    pub neutral: f64,
}

impl SentimentPoint {
    pub fn new(positive: f64, negative: f64, neutral: f64) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    pub fn total(&self) -> f64 {
        self.positive + self.negative + self.neutral
    }

    /// Largest of the three counts.
    pub fn max_count(&self) -> f64 {
        self.positive.max(self.negative).max(self.neutral)
    }
}

/// Inferred root cause paired with a suggested action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub suggestion: String,
}

/// A frequently mentioned keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub frequency: f64,
}

/// Structured summary of one review source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub themes: Vec<String>,
    pub sentiment: SentimentPoint,
    pub insights: Vec<Insight>,
    pub keywords: Vec<Keyword>,
}

/// A recommended step and why it matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicStep {
    pub step: String,
    pub rationale: String,
}

/// Strategic overview derived from a [`Summary`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicAnalysis {
    pub overview: String,
    pub key_focus_area: String,
    pub steps: Vec<StrategicStep>,
}

/// Comparison between two summaries (start and end period).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub summary: String,
    pub new_issues: Vec<String>,
    pub resolved_issues: Vec<String>,
    pub persistent_themes: Vec<String>,
}

/// Focused analysis of a single keyword or theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepDiveAnalysis {
    pub summary: String,
    pub snippets: Vec<String>,
    pub sentiment: SentimentPoint,
}

/// What sets one customer segment apart from the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentComparison {
    pub segment: String,
    pub key_differentiators: Vec<String>,
}

/// Comparison across all persona segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaComparison {
    pub overview: String,
    pub segment_comparisons: Vec<SegmentComparison>,
}

/// A summary tagged with its segment name, as sent for persona comparison.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary<'a> {
    pub segment: &'a str,
    pub summary: &'a Summary,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: ChatSender,
    pub text: String,
}
