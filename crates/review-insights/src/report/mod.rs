//! Report export.
//!
//! A report is built from one summary and its strategic analysis
//! ([`ReportData`]) and handed to a [`ReportRenderer`] for a given
//! [`ExportFormat`]. Renderers are looked up in a [`RendererRegistry`];
//! formats whose library was compiled out are simply not registered and
//! surface as [`InsightsError::CapabilityUnavailable`].
//!
//! # Available Renderers
//!
//! | Format | Renderer        | Feature |
//! |--------|-----------------|---------|
//! | TXT    | [`TextRenderer`] | always  |
//! | JSON   | [`JsonRenderer`] | always  |
//! | PDF    | `PdfRenderer`    | `pdf`   |
//! | DOCX   | `DocxRenderer`   | `docx`  |

pub mod chart;
mod data;
#[cfg(feature = "docx")]
mod docx;
#[cfg(feature = "pdf")]
mod font;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{InsightsError, Result};

pub use chart::{DashboardMetrics, nice_ceiling, sentiment_trend_svg};
pub use data::{REPORT_TITLE_PREFIX, ReportData};
#[cfg(feature = "docx")]
pub use docx::DocxRenderer;
#[cfg(feature = "pdf")]
pub use font::{PDF_FONT_ENV, PdfFont};
#[cfg(feature = "pdf")]
pub use pdf::PdfRenderer;
pub use text::{TextRenderer, render_text, summary_markdown};

/// File name stem shared by every export.
pub const EXPORT_FILE_STEM: &str = "Customer_Insights_Report";

/// Output formats for a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Pdf,
    Docx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Json => "application/json",
        }
    }

    /// Library named in the error when no renderer is registered.
    pub fn library_name(&self) -> &'static str {
        match self {
            Self::Txt => "Text report writer",
            Self::Pdf => "PDF generation library",
            Self::Docx => "DOCX generation library",
            Self::Json => "JSON report writer",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown export format '{other}' (expected txt, pdf, docx or json)"
            )),
        }
    }
}

/// `Customer_Insights_Report_DD-MM-YYYY.<ext>`
pub fn export_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{EXPORT_FILE_STEM}_{}.{}",
        date.format("%d-%m-%Y"),
        format.extension()
    )
}

/// A rendered report ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Turns report data into the bytes of one export format.
pub trait ReportRenderer: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn render(&self, report: &ReportData) -> Result<Vec<u8>>;
}

/// Renders the report as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn render(&self, report: &ReportData) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(report)?)
    }
}

/// Renderers by format.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<ExportFormat, Box<dyn ReportRenderer>>,
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

impl RendererRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every renderer compiled into this build.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TextRenderer));
        registry.register(Box::new(JsonRenderer));
        #[cfg(feature = "pdf")]
        registry.register(Box::new(PdfRenderer::with_system_font()));
        #[cfg(feature = "docx")]
        registry.register(Box::new(DocxRenderer));
        registry
    }

    /// Add or replace the renderer for its format.
    pub fn register(&mut self, renderer: Box<dyn ReportRenderer>) {
        self.renderers.insert(renderer.format(), renderer);
    }

    /// Registered formats, sorted by extension.
    pub fn formats(&self) -> Vec<ExportFormat> {
        let mut formats: Vec<_> = self.renderers.keys().copied().collect();
        formats.sort_by_key(|f| f.extension());
        formats
    }

    pub fn get(&self, format: ExportFormat) -> Result<&dyn ReportRenderer> {
        self.renderers
            .get(&format)
            .map(|r| r.as_ref())
            .ok_or_else(|| InsightsError::CapabilityUnavailable(format.library_name().to_string()))
    }

    /// Render `report` and name the artifact for `date`.
    pub fn render(
        &self,
        report: &ReportData,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<ExportArtifact> {
        let bytes = self.get(format)?.render(report)?;
        let file_name = export_file_name(format, date);
        info!("Rendered {} ({} bytes)", file_name, bytes.len());
        Ok(ExportArtifact {
            file_name,
            format,
            bytes,
        })
    }
}
