//! Configuration types for review ingestion, analysis and export.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of files per upload batch (also the maximum number of sources).
pub const DEFAULT_MAX_FILES: usize = 5;

/// Maximum size of a single uploaded file, in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 5;

/// Maximum number of characters held by a single review source.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 500_000;

/// Column expected to hold the review text when grouping by persona.
pub const DEFAULT_REVIEW_COLUMN: &str = "Comment";

/// Output language value that asks the model to detect the language itself.
pub const AUTO_DETECT_LANGUAGE: &str = "Auto-detect";

/// Configuration for ingestion limits, analysis and report output.
///
/// Use [`InsightsConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use review_insights::config::InsightsConfig;
///
/// let config = InsightsConfig::builder()
///     .output_language("German")
///     .segment_column("Customer Type")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Maximum number of files in one upload batch and of sources held at once.
    /// Default: 5
    pub max_files: usize,

    /// Maximum size of a single uploaded file in megabytes.
    /// Default: 5
    pub max_file_size_mb: u64,

    /// Maximum number of characters in one review source.
    /// Default: 500 000
    pub max_text_length: usize,

    /// Name of the CSV column holding review text for persona analysis.
    /// Default: "Comment"
    pub review_column: String,

    /// CSV column to group reviews by. `None` disables persona analysis.
    /// Default: None
    pub segment_column: Option<String>,

    /// Language the model should answer in, or "Auto-detect".
    /// Default: "Auto-detect"
    pub output_language: String,

    /// Directory where exported reports are written.
    /// Default: "reports"
    pub output_dir: PathBuf,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            review_column: DEFAULT_REVIEW_COLUMN.to_string(),
            segment_column: None,
            output_language: AUTO_DETECT_LANGUAGE.to_string(),
            output_dir: PathBuf::from("reports"),
        }
    }
}

impl InsightsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> InsightsConfigBuilder {
        InsightsConfigBuilder::default()
    }

    /// Maximum file size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// The segment column, if persona analysis is enabled.
    ///
    /// A blank or whitespace-only column name counts as disabled.
    pub fn persona_column(&self) -> Option<&str> {
        self.segment_column
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_files == 0 {
            return Err(ConfigValidationError::InvalidLimit {
                field: "max_files".to_string(),
            });
        }

        if self.max_file_size_mb == 0 {
            return Err(ConfigValidationError::InvalidLimit {
                field: "max_file_size_mb".to_string(),
            });
        }

        if self.max_text_length == 0 {
            return Err(ConfigValidationError::InvalidLimit {
                field: "max_text_length".to_string(),
            });
        }

        if self.review_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("review_column".to_string()));
        }

        if self.output_language.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField(
                "output_language".to_string(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid limit for '{field}': must be at least 1")]
    InvalidLimit { field: String },

    #[error("'{0}' cannot be empty")]
    EmptyField(String),
}

/// Builder for [`InsightsConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct InsightsConfigBuilder {
    max_files: Option<usize>,
    max_file_size_mb: Option<u64>,
    max_text_length: Option<usize>,
    review_column: Option<String>,
    segment_column: Option<String>,
    output_language: Option<String>,
    output_dir: Option<PathBuf>,
}

impl InsightsConfigBuilder {
    /// Set the maximum number of files per batch.
    pub fn max_files(mut self, max: usize) -> Self {
        self.max_files = Some(max);
        self
    }

    /// Set the maximum size of a single file in megabytes.
    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size_mb = Some(mb);
        self
    }

    /// Set the per-source character ceiling.
    pub fn max_text_length(mut self, chars: usize) -> Self {
        self.max_text_length = Some(chars);
        self
    }

    /// Set the review text column used by persona analysis.
    pub fn review_column(mut self, column: impl Into<String>) -> Self {
        self.review_column = Some(column.into());
        self
    }

    /// Enable persona analysis, grouping by this column.
    pub fn segment_column(mut self, column: impl Into<String>) -> Self {
        self.segment_column = Some(column.into());
        self
    }

    /// Set the output language ("Auto-detect" lets the model decide).
    pub fn output_language(mut self, language: impl Into<String>) -> Self {
        self.output_language = Some(language.into());
        self
    }

    /// Set the directory exported reports are written to.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `InsightsConfig` or an error if validation fails.
    pub fn build(self) -> Result<InsightsConfig, ConfigValidationError> {
        let config = InsightsConfig {
            max_files: self.max_files.unwrap_or(DEFAULT_MAX_FILES),
            max_file_size_mb: self.max_file_size_mb.unwrap_or(DEFAULT_MAX_FILE_SIZE_MB),
            max_text_length: self.max_text_length.unwrap_or(DEFAULT_MAX_TEXT_LENGTH),
            review_column: self
                .review_column
                .unwrap_or_else(|| DEFAULT_REVIEW_COLUMN.to_string()),
            segment_column: self.segment_column,
            output_language: self
                .output_language
                .unwrap_or_else(|| AUTO_DETECT_LANGUAGE.to_string()),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("reports")),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InsightsConfig::default();
        assert_eq!(config.max_files, 5);
        assert_eq!(config.max_file_size_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.max_text_length, 500_000);
        assert_eq!(config.review_column, "Comment");
        assert_eq!(config.output_language, "Auto-detect");
        assert!(config.persona_column().is_none());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = InsightsConfig::builder()
            .max_files(3)
            .max_text_length(1000)
            .segment_column("Customer Type")
            .output_language("French")
            .build()
            .unwrap();

        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_text_length, 1000);
        assert_eq!(config.persona_column(), Some("Customer Type"));
        assert_eq!(config.output_language, "French");
    }

    #[test]
    fn test_blank_segment_column_disables_personas() {
        let config = InsightsConfig::builder()
            .segment_column("   ")
            .build()
            .unwrap();
        assert!(config.persona_column().is_none());
    }

    #[test]
    fn test_validation_zero_limit() {
        let result = InsightsConfig::builder().max_files(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidLimit { .. }
        ));
    }

    #[test]
    fn test_validation_empty_review_column() {
        let result = InsightsConfig::builder().review_column(" ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyField(field) if field == "review_column"
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "max_files": 4,
            "max_file_size_mb": 2,
            "max_text_length": 10000,
            "review_column": "Review",
            "segment_column": "Plan",
            "output_language": "Spanish",
            "output_dir": "out"
        }"#;

        let config: InsightsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_files, 4);
        assert_eq!(config.max_file_size_bytes(), 2 * 1024 * 1024);
        assert_eq!(config.review_column, "Review");
        assert_eq!(config.persona_column(), Some("Plan"));
        assert_eq!(config.output_dir.to_str().unwrap(), "out");
    }
}
