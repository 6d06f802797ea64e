//! Custom error types for the review insights toolkit.
//!
//! This module provides the error hierarchy using `thiserror`. Errors fall
//! into three families:
//!
//! - **Input validation** (too many files, missing columns, oversized text):
//!   raised before any external call is made.
//! - **External calls** (Gemini API, spreadsheet fetch): surfaced as-is,
//!   never retried.
//! - **Capability** (a document library is not compiled in): aborts a single
//!   export or conversion and leaves application state untouched.
//!
//! Errors are serializable as `{code, message}` so a front end can render
//! them in its error slot.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the toolkit.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// The run was superseded by a newer run before it finished.
    #[error("Analysis run was superseded by a newer run")]
    Cancelled,

    /// No API key is configured.
    #[error("API Key is not set. Please set it first.")]
    MissingApiKey,

    /// No review text was supplied.
    #[error("Please provide some review data before summarizing.")]
    NoReviewData,

    /// A batch contained more files than allowed.
    #[error("You can upload a maximum of {max} files at a time.")]
    TooManyFiles { max: usize },

    /// One or more files exceed the size ceiling.
    #[error("The following files are too large (max {max_mb}MB): {}", .files.join(", "))]
    FileTooLarge { max_mb: u64, files: Vec<String> },

    /// File extension is not one of csv, txt, xlsx, xls.
    #[error("Unsupported file type: {0}. Please use CSV, XLSX, or TXT.")]
    UnsupportedFileType(String),

    /// File had no content.
    #[error("File is empty or could not be read: {0}")]
    EmptyFile(String),

    /// The source list is already at capacity.
    #[error("You can have a maximum of {max} data sources.")]
    TooManySources { max: usize },

    /// Text exceeds the per-source character ceiling.
    #[error("Text is too large. The limit is {limit} characters.")]
    TextTooLong { limit: usize },

    /// CSV content has no header line.
    #[error("CSV data is empty or missing a header.")]
    EmptyCsv,

    /// A requested column does not exist in the CSV header.
    #[error("{role} column \"{column}\" not found in the data header.")]
    ColumnNotFound { role: ColumnRole, column: String },

    /// Grouping produced no segment with at least one review.
    #[error("No personas or reviews could be extracted. Check your column name and data format.")]
    NoSegmentsExtracted,

    /// The spreadsheet URL does not contain a sheet id.
    #[error("Invalid Google Sheet URL format.")]
    InvalidSheetUrl,

    /// The spreadsheet export could not be fetched.
    #[error("{0}")]
    SheetFetch(String),

    /// A user selection (report index, comparison pair) is invalid.
    #[error("{0}")]
    InvalidSelection(String),

    /// The generative-language API call failed.
    #[error("Failed to {action}. Gemini API error: {detail}")]
    Api { action: String, detail: String },

    /// An optional document/spreadsheet library is not available.
    #[error("{0} not found.")]
    CapabilityUnavailable(String),

    /// Rendering a report artifact failed.
    #[error("Failed to export report: {0}")]
    Export(String),

    /// A font file cannot be embedded in PDF exports.
    #[error("Unusable PDF font: {0}")]
    InvalidFont(String),

    /// The OS keychain could not be reached.
    #[error("Failed to access secure storage: {0}")]
    SecureStorage(String),

    /// Internal error (e.g., task join failure).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightsError>,
    },
}

/// Which lookup failed during persona grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnRole {
    Segment,
    Review,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Segment => f.write_str("Segment"),
            Self::Review => f.write_str("Review"),
        }
    }
}

impl InsightsError {
    /// Build an API error for the given action ("summarize reviews", ...).
    pub fn api(action: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Api {
            action: action.into(),
            detail: detail.to_string(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::NoReviewData => "NO_REVIEW_DATA",
            Self::TooManyFiles { .. } => "TOO_MANY_FILES",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::EmptyFile(_) => "EMPTY_FILE",
            Self::TooManySources { .. } => "TOO_MANY_SOURCES",
            Self::TextTooLong { .. } => "TEXT_TOO_LONG",
            Self::EmptyCsv => "EMPTY_CSV",
            Self::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            Self::NoSegmentsExtracted => "NO_SEGMENTS_EXTRACTED",
            Self::InvalidSheetUrl => "INVALID_SHEET_URL",
            Self::SheetFetch(_) => "SHEET_FETCH_FAILED",
            Self::InvalidSelection(_) => "INVALID_SELECTION",
            Self::Api { .. } => "API_ERROR",
            Self::CapabilityUnavailable(_) => "CAPABILITY_UNAVAILABLE",
            Self::Export(_) => "EXPORT_FAILED",
            Self::InvalidFont(_) => "INVALID_FONT",
            Self::SecureStorage(_) => "SECURE_STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a superseded run.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// True for errors raised by local validation, before any network call.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::MissingApiKey
            | Self::NoReviewData
            | Self::TooManyFiles { .. }
            | Self::FileTooLarge { .. }
            | Self::UnsupportedFileType(_)
            | Self::EmptyFile(_)
            | Self::TooManySources { .. }
            | Self::TextTooLong { .. }
            | Self::EmptyCsv
            | Self::ColumnNotFound { .. }
            | Self::NoSegmentsExtracted
            | Self::InvalidSheetUrl
            | Self::InvalidSelection(_) => true,
            Self::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

impl Serialize for InsightsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightsError::Io(e).with_context(context))
    }
}
