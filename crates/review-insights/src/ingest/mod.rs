//! Review ingestion.
//!
//! Everything that turns user input into [`ReviewSource`](crate::types::ReviewSource)s:
//!
//! - [`csv_line`]: single-line CSV tokenizer
//! - [`persona`]: split one CSV source into per-segment sources
//! - [`upload`]: batch file validation, reading and spreadsheet conversion
//! - [`sheet`]: Google Sheets CSV import
//! - [`template`]: downloadable CSV template and sample presets

pub mod csv_line;
pub mod persona;
pub mod sheet;
pub mod template;
pub mod upload;

pub use csv_line::parse_csv_line;
pub use persona::{SegmentBuckets, build_persona_sources, group_by_segment};
pub use sheet::{fetch_sheet, sheet_export_url};
pub use template::{CSV_TEMPLATE, TEMPLATE_FILE_NAME};
pub use upload::{
    FileKind, PendingFile, SpreadsheetConverter, default_converter, read_batch, validate_batch,
};

#[cfg(feature = "xlsx")]
pub use upload::CalamineConverter;

/// Drop a leading UTF-8 byte order mark, as written by Excel's CSV export.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}
