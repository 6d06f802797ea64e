//! Batch file upload: validation, reading and spreadsheet conversion.
//!
//! A batch is validated as a whole from file metadata (count, then size,
//! then extension) before any file is read. Files are then read
//! concurrently; if any single file fails, the whole batch fails and no
//! source is produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::InsightsConfig;
use crate::error::{InsightsError, Result, ResultExt};
use crate::ingest::strip_bom;
use crate::types::ReviewSource;

/// How a file's bytes are turned into review text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.csv` or `.txt`, read as UTF-8 text.
    Text,
    /// `.xlsx` or `.xls`, converted to CSV.
    Spreadsheet,
}

impl FileKind {
    /// Classify a file by its name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)?;
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Text),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// A file selected for upload, described by metadata only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Display name, used as the source label.
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size_bytes,
        }
    }

    /// Describe a file on disk, reading its size from metadata.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .context(format!("Error reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, path, metadata.len()))
    }
}

/// Converts spreadsheet bytes to CSV text.
///
/// Injected so that spreadsheet support can be compiled out; a missing
/// converter surfaces as [`InsightsError::CapabilityUnavailable`].
pub trait SpreadsheetConverter: Send + Sync {
    /// Human-readable library name, used in error messages.
    fn name(&self) -> &str;

    /// Convert the first worksheet of a workbook to CSV.
    fn to_csv(&self, bytes: &[u8]) -> Result<String>;
}

/// Check a batch against the count and size ceilings and the accepted types.
///
/// Runs on metadata only; nothing is read from disk.
pub fn validate_batch(files: &[PendingFile], config: &InsightsConfig) -> Result<()> {
    if files.len() > config.max_files {
        return Err(InsightsError::TooManyFiles {
            max: config.max_files,
        });
    }

    let max_bytes = config.max_file_size_bytes();
    let oversized: Vec<String> = files
        .iter()
        .filter(|f| f.size_bytes > max_bytes)
        .map(|f| f.name.clone())
        .collect();
    if !oversized.is_empty() {
        return Err(InsightsError::FileTooLarge {
            max_mb: config.max_file_size_mb,
            files: oversized,
        });
    }

    if let Some(file) = files.iter().find(|f| FileKind::from_name(&f.name).is_none()) {
        return Err(InsightsError::UnsupportedFileType(file.name.clone()));
    }

    Ok(())
}

/// Validate and read a batch of files into review sources, in input order.
///
/// Each file becomes one source labelled with the file name. Reads run
/// concurrently; every read settles before the result is decided, and the
/// error of the earliest failing file is returned.
pub async fn read_batch(
    files: Vec<PendingFile>,
    config: &InsightsConfig,
    converter: Option<Arc<dyn SpreadsheetConverter>>,
) -> Result<Vec<ReviewSource>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }
    validate_batch(&files, config)?;

    info!("Reading {} uploaded files", files.len());

    let count = files.len();
    let mut set = JoinSet::new();
    for (index, file) in files.into_iter().enumerate() {
        let converter = converter.clone();
        set.spawn(async move { (index, read_one(file, converter).await) });
    }

    let mut results: Vec<Option<Result<ReviewSource>>> = (0..count).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, result) =
            joined.map_err(|e| InsightsError::Internal(format!("file read task failed: {e}")))?;
        results[index] = Some(result);
    }

    let mut sources = Vec::with_capacity(count);
    for result in results {
        match result {
            Some(Ok(source)) => sources.push(source),
            Some(Err(e)) => {
                warn!("Upload batch rejected: {}", e);
                return Err(e);
            }
            None => return Err(InsightsError::Internal("file read task lost".to_string())),
        }
    }

    Ok(sources)
}

async fn read_one(
    file: PendingFile,
    converter: Option<Arc<dyn SpreadsheetConverter>>,
) -> Result<ReviewSource> {
    let kind = FileKind::from_name(&file.name)
        .ok_or_else(|| InsightsError::UnsupportedFileType(file.name.clone()))?;

    let bytes = tokio::fs::read(&file.path)
        .await
        .context(format!("Error reading {}", file.name))?;
    if bytes.is_empty() {
        return Err(InsightsError::EmptyFile(file.name));
    }

    let content = match kind {
        FileKind::Text => strip_bom(&String::from_utf8_lossy(&bytes)).to_string(),
        FileKind::Spreadsheet => {
            let converter = converter.ok_or_else(|| {
                InsightsError::CapabilityUnavailable("Spreadsheet library".to_string())
            })?;
            debug!("Converting {} with {}", file.name, converter.name());
            converter.to_csv(&bytes)?
        }
    };

    Ok(ReviewSource::new(file.name, content))
}

/// Spreadsheet converter backed by `calamine`. Reads XLSX, XLS and ODS.
#[cfg(feature = "xlsx")]
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineConverter;

#[cfg(feature = "xlsx")]
impl SpreadsheetConverter for CalamineConverter {
    fn name(&self) -> &str {
        "calamine"
    }

    fn to_csv(&self, bytes: &[u8]) -> Result<String> {
        use calamine::{Reader, open_workbook_auto_from_rs};
        use std::io::Cursor;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| InsightsError::Internal(format!("Could not parse Excel file: {e}")))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| InsightsError::Internal("Workbook has no sheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| InsightsError::Internal(format!("Could not read sheet '{sheet_name}': {e}")))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        for row in range.rows() {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(|e| InsightsError::Internal(format!("Could not write CSV row: {e}")))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| InsightsError::Internal(format!("Could not finish CSV output: {e}")))?;

        String::from_utf8(bytes)
            .map_err(|e| InsightsError::Internal(format!("Sheet produced invalid UTF-8: {e}")))
    }
}

/// The spreadsheet converter compiled into this build, if any.
pub fn default_converter() -> Option<Arc<dyn SpreadsheetConverter>> {
    #[cfg(feature = "xlsx")]
    {
        Some(Arc::new(CalamineConverter))
    }
    #[cfg(not(feature = "xlsx"))]
    {
        None
    }
}
