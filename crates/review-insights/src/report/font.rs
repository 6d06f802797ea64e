//! TrueType font for PDF exports outside the Latin-1 range.
//!
//! The standard PDF fonts only cover WinAnsi. Reports in Vietnamese,
//! Russian, Japanese and the other output languages need a real font
//! embedded as a composite (Type0) font; see [`crate::report::PdfRenderer`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use ttf_parser::{Face, name_id};

use crate::error::{InsightsError, Result, ResultExt};

/// Environment variable naming the font file used by PDF exports.
pub const PDF_FONT_ENV: &str = "REVIEW_INSIGHTS_PDF_FONT";

/// Fonts tried, in order, when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    r"C:\Windows\Fonts\arialuni.ttf",
    r"C:\Windows\Fonts\arial.ttf",
];

/// A TrueType font file checked for embedding.
///
/// Only single-face fonts with `glyf` outlines are accepted: collections
/// (`.ttc`) and CFF-flavoured OpenType fonts cannot be written as a
/// `FontFile2` stream.
#[derive(Clone)]
pub struct PdfFont {
    name: String,
    data: Arc<Vec<u8>>,
}

impl fmt::Debug for PdfFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PdfFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if ttf_parser::fonts_in_collection(&data).is_some() {
            return Err(InsightsError::InvalidFont(
                "font collections cannot be embedded, use a single .ttf file".to_string(),
            ));
        }
        let face = Face::parse(&data, 0).map_err(|e| InsightsError::InvalidFont(e.to_string()))?;
        if face.tables().glyf.is_none() {
            return Err(InsightsError::InvalidFont(
                "font has no TrueType outlines".to_string(),
            ));
        }
        let name = postscript_name(&face);
        Ok(Self {
            name,
            data: Arc::new(data),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).context(format!("Error reading font {}", path.display()))?;
        Self::from_bytes(data)
    }

    /// The font named by [`PDF_FONT_ENV`], else the first usable system
    /// font. `None` when neither is available.
    pub fn discover() -> Option<Self> {
        if let Ok(path) = std::env::var(PDF_FONT_ENV)
            && !path.trim().is_empty()
        {
            match Self::from_path(path.trim()) {
                Ok(font) => return Some(font),
                Err(e) => warn!("Ignoring {}: {}", PDF_FONT_ENV, e),
            }
        }

        let found = SYSTEM_FONTS
            .iter()
            .map(Path::new)
            .filter(|path| path.is_file())
            .find_map(|path| Self::from_path(path).ok());
        match &found {
            Some(font) => debug!("PDF exports will embed {}", font.name),
            None => debug!("No Unicode font found, PDF exports limited to Latin-1"),
        }
        found
    }

    /// PostScript name, used as the PDF `BaseFont`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Parse the face. Validated in the constructor, so this only fails
    /// if the bytes were corrupted since.
    pub(crate) fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }
}

/// PostScript name restricted to characters valid in a PDF name.
fn postscript_name(face: &Face<'_>) -> String {
    let name: String = face
        .names()
        .into_iter()
        .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|n| n.to_string())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}
