//! PDF export on A4 pages, built with `lopdf`.
//!
//! Layout works in millimetres from the top-left corner. A line that does
//! not fit the text width is wrapped on word boundaries, and a page break
//! is taken before any line that would cross the bottom margin.
//!
//! Without a font, text is set in the standard Helvetica faces with WinAnsi
//! encoding and line widths are estimated from average glyph widths. With a
//! [`PdfFont`] the font is embedded as a Type0 font: text is written as
//! two-byte glyph ids (`Identity-H`), a ToUnicode map keeps it extractable,
//! and widths come from the font's own advances. Bold lines are then drawn
//! with a stroked outline.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::warn;
use ttf_parser::{Face, GlyphId};

use crate::error::{InsightsError, Result};
use crate::report::data::ReportData;
use crate::report::font::{PDF_FONT_ENV, PdfFont};
use crate::report::{ExportFormat, ReportRenderer};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const PT_PER_MM: f32 = 72.0 / 25.4;

const TITLE_SIZE: f32 = 18.0;
const DATE_SIZE: f32 = 8.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 10.0;

/// One line of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlacedLine {
    pub text: String,
    /// Left edge, mm from the page's left side.
    pub x: f32,
    /// Baseline, mm from the page's top.
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

/// Renders the PDF export.
#[derive(Debug, Default, Clone)]
pub struct PdfRenderer {
    font: Option<PdfFont>,
}

impl PdfRenderer {
    /// Standard fonts only; characters outside WinAnsi print as `?`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed `font` and set every line in it.
    pub fn with_font(font: PdfFont) -> Self {
        Self { font: Some(font) }
    }

    /// Embed the font found by [`PdfFont::discover`], if any.
    pub fn with_system_font() -> Self {
        Self {
            font: PdfFont::discover(),
        }
    }

    pub fn font(&self) -> Option<&PdfFont> {
        self.font.as_ref()
    }
}

impl ReportRenderer for PdfRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, report: &ReportData) -> Result<Vec<u8>> {
        let typeface = match &self.font {
            Some(font) => Typeface::embedded(font).ok_or_else(|| {
                InsightsError::InvalidFont(format!("{} could not be parsed", font.name()))
            })?,
            None => Typeface::Standard,
        };
        let pages = layout(report, &typeface);
        write_document(&pages, &typeface).map_err(|e| InsightsError::Export(format!("PDF: {e}")))
    }
}

// ============================================================================
// TYPEFACES
// ============================================================================

/// How text is measured and encoded.
pub(crate) enum Typeface<'a> {
    /// Helvetica and Helvetica-Bold, WinAnsi encoded.
    Standard,
    /// An embedded TrueType font addressed by glyph id.
    Embedded {
        font: &'a PdfFont,
        face: Face<'a>,
        units_per_em: f32,
    },
}

impl<'a> Typeface<'a> {
    fn embedded(font: &'a PdfFont) -> Option<Self> {
        let face = font.face()?;
        let units_per_em = f32::from(face.units_per_em());
        Some(Self::Embedded {
            font,
            face,
            units_per_em,
        })
    }

    /// Advance width of `text`, in em.
    fn em_width(&self, text: &str) -> f32 {
        match self {
            Self::Standard => text.chars().map(helvetica_width).sum(),
            Self::Embedded {
                face, units_per_em, ..
            } => text
                .chars()
                .map(|ch| {
                    let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
                    f32::from(face.glyph_hor_advance(glyph).unwrap_or(0)) / units_per_em
                })
                .sum(),
        }
    }

    pub(crate) fn width_mm(&self, text: &str, size: f32, bold: bool) -> f32 {
        let factor = if bold { 1.07 } else { 1.0 };
        self.em_width(text) * size * factor / PT_PER_MM
    }

    /// Encode one line for a `Tj` operator, recording the glyphs used.
    fn encode(&self, text: &str, usage: &mut GlyphUsage) -> Object {
        match self {
            Self::Standard => {
                let mut bytes = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    bytes.push(win_ansi_byte(ch).unwrap_or_else(|| {
                        usage.missing += 1;
                        b'?'
                    }));
                }
                Object::string_literal(bytes)
            }
            Self::Embedded {
                face, units_per_em, ..
            } => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    let glyph = match face.glyph_index(ch) {
                        Some(glyph) => {
                            usage.unicode.entry(glyph.0).or_insert(ch);
                            glyph
                        }
                        None => {
                            usage.missing += 1;
                            GlyphId(0)
                        }
                    };
                    let advance = f32::from(face.glyph_hor_advance(glyph).unwrap_or(0));
                    usage
                        .widths
                        .entry(glyph.0)
                        .or_insert((advance * 1000.0 / units_per_em).round() as i64);
                    bytes.extend_from_slice(&glyph.0.to_be_bytes());
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }
}

/// Glyphs referenced by the page content, for the font objects.
#[derive(Debug, Default)]
struct GlyphUsage {
    /// Glyph id to advance width in thousandths of an em.
    widths: BTreeMap<u16, i64>,
    /// Glyph id to the character it was chosen for.
    unicode: BTreeMap<u16, char>,
    /// Characters the typeface could not represent.
    missing: usize,
}

/// Approximate Helvetica advance width of `ch`, in em.
fn helvetica_width(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.25,
        ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '-' => 0.33,
        'm' | 'w' | 'M' | 'W' => 0.85,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        _ => 0.52,
    }
}

/// WinAnsi code of `ch`, if it has one.
fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch {
        '€' => Some(0x80),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => Some(c as u32 as u8),
        _ => None,
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

struct Layout<'a> {
    typeface: &'a Typeface<'a>,
    pages: Vec<Vec<PlacedLine>>,
    y: f32,
}

impl<'a> Layout<'a> {
    fn new(typeface: &'a Typeface<'a>) -> Self {
        Self {
            typeface,
            pages: vec![Vec::new()],
            y: MARGIN_MM,
        }
    }

    fn max_width(&self) -> f32 {
        PAGE_WIDTH_MM - 2.0 * MARGIN_MM
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = MARGIN_MM;
    }

    /// Wrap and place `text`, then advance by `spacing`.
    ///
    /// A block that fits on one page is moved to the next page whole; a
    /// longer block breaks wherever the next line would cross the margin.
    fn add_text(&mut self, text: &str, size: f32, bold: bool, spacing: f32) {
        let lines = wrap_text(text, size, bold, self.max_width(), self.typeface);
        let line_height = size / 2.0;
        let needed = lines.len() as f32 * line_height;
        let bottom = PAGE_HEIGHT_MM - MARGIN_MM;

        if self.y + needed > bottom && needed <= bottom - MARGIN_MM {
            self.new_page();
        }

        for line in lines {
            if self.y + line_height > bottom {
                self.new_page();
            }
            if let Some(page) = self.pages.last_mut() {
                page.push(PlacedLine {
                    text: line,
                    x: MARGIN_MM,
                    y: self.y,
                    size,
                    bold,
                });
            }
            self.y += line_height;
        }
        self.y += spacing;
    }

    fn gap(&mut self, mm: f32) {
        self.y += mm;
    }

    fn heading(&mut self, text: &str) {
        self.add_text(text, HEADING_SIZE, true, 4.0);
    }

    fn list(&mut self, items: &[String], empty: &str) {
        if items.is_empty() {
            self.add_text(empty, BODY_SIZE, false, 3.0);
        } else {
            for item in items {
                self.add_text(&format!("- {item}"), BODY_SIZE, false, 3.0);
            }
        }
        self.gap(5.0);
    }
}

pub(crate) fn layout(report: &ReportData, typeface: &Typeface<'_>) -> Vec<Vec<PlacedLine>> {
    let mut doc = Layout::new(typeface);

    doc.add_text(&report.title, TITLE_SIZE, true, 5.0);
    doc.add_text(&format!("Date: {}", report.date), DATE_SIZE, false, 10.0);

    doc.heading("STRATEGIC ANALYSIS");
    doc.add_text(
        &format!("Overview: {}", report.strategy.overview),
        BODY_SIZE,
        false,
        3.0,
    );
    doc.add_text(
        &format!("Key Focus Area: {}", report.strategy.key_focus_area),
        BODY_SIZE,
        false,
        5.0,
    );
    for (i, step) in report.strategy.steps.iter().enumerate() {
        doc.add_text(
            &format!("Step {}: {}", i + 1, step.step),
            BODY_SIZE,
            true,
            2.0,
        );
        doc.add_text(
            &format!("Rationale: {}", step.rationale),
            BODY_SIZE,
            false,
            4.0,
        );
    }
    doc.gap(5.0);

    doc.heading("SENTIMENT BREAKDOWN");
    doc.add_text(
        &format!(
            "Positive: {}, Negative: {}, Neutral: {}",
            report.sentiment.positive, report.sentiment.negative, report.sentiment.neutral
        ),
        BODY_SIZE,
        false,
        5.0,
    );
    doc.gap(5.0);

    doc.heading("PROS");
    doc.list(&report.pros, "No items found.");
    doc.heading("CONS");
    doc.list(&report.cons, "No items found.");
    doc.heading("COMMON THEMES");
    doc.list(&report.themes, "No items found.");

    doc.heading("TOP KEYWORDS");
    let keywords: Vec<String> = report
        .keywords
        .iter()
        .map(|kw| format!("{} ({} mentions)", kw.keyword, kw.frequency))
        .collect();
    doc.list(&keywords, "No keywords extracted.");

    doc.heading("ACTIONABLE INSIGHTS");
    if report.insights.is_empty() {
        doc.add_text("No specific insights generated.", BODY_SIZE, false, 3.0);
    }
    for insight in &report.insights {
        doc.add_text(&format!("Cause: {}", insight.cause), BODY_SIZE, true, 2.0);
        doc.add_text(
            &format!("Suggestion: {}", insight.suggestion),
            BODY_SIZE,
            false,
            5.0,
        );
    }

    doc.pages
}

/// Greedy word wrap; words longer than a line are split by character.
pub(crate) fn wrap_text(
    text: &str,
    size: f32,
    bold: bool,
    max_width_mm: f32,
    typeface: &Typeface<'_>,
) -> Vec<String> {
    let fits = |candidate: &str| typeface.width_mm(candidate, size, bold) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if !fits(&current) {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}

// ============================================================================
// DOCUMENT
// ============================================================================

fn write_document(
    pages: &[Vec<PlacedLine>],
    typeface: &Typeface<'_>,
) -> std::result::Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = doc.new_object_id();

    let page_height_pt = PAGE_HEIGHT_MM * PT_PER_MM;
    let mut usage = GlyphUsage::default();
    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());

    for page in pages {
        let mut operations = Vec::with_capacity(page.len() * 7);
        for line in page {
            let embedded = matches!(typeface, Typeface::Embedded { .. });
            let font = if line.bold && !embedded { "F2" } else { "F1" };
            if embedded && line.bold {
                operations.push(Operation::new("w", vec![Object::Real(line.size * 0.03)]));
            }
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![font.into(), Object::Real(line.size)],
            ));
            if embedded {
                let mode: i64 = if line.bold { 2 } else { 0 };
                operations.push(Operation::new("Tr", vec![mode.into()]));
            }
            operations.push(Operation::new(
                "Td",
                vec![
                    Object::Real(line.x * PT_PER_MM),
                    Object::Real(page_height_pt - line.y * PT_PER_MM),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![typeface.encode(&line.text, &mut usage)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let fonts = match typeface {
        Typeface::Standard => {
            if usage.missing > 0 {
                warn!(
                    "{} characters have no Latin-1 form and print as '?'; set {} to a TrueType font",
                    usage.missing, PDF_FONT_ENV
                );
            }
            let regular_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            let bold_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica-Bold",
                "Encoding" => "WinAnsiEncoding",
            });
            dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            }
        }
        Typeface::Embedded {
            font,
            face,
            units_per_em,
        } => {
            if usage.missing > 0 {
                warn!(
                    "{} characters are not covered by font {} and print as blanks",
                    usage.missing,
                    font.name()
                );
            }
            let font_id = embed_font(&mut doc, font, face, *units_per_em, &usage)?;
            dictionary! { "F1" => font_id }
        }
    };
    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! { "Font" => fonts }),
    );

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_ids.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(PAGE_WIDTH_MM * PT_PER_MM),
            Object::Real(page_height_pt),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Add the Type0 font, its CIDFontType2 descendant, descriptor, font file
/// and ToUnicode map. Returns the Type0 font's id.
fn embed_font(
    doc: &mut Document,
    font: &PdfFont,
    face: &Face<'_>,
    units_per_em: f32,
    usage: &GlyphUsage,
) -> std::result::Result<ObjectId, lopdf::Error> {
    let scale = |value: i16| (f32::from(value) * 1000.0 / units_per_em).round() as i64;
    let bbox = face.global_bounding_box();

    let mut font_file = Stream::new(
        dictionary! { "Length1" => font.bytes().len() as i64 },
        font.bytes().to_vec(),
    );
    font_file.compress()?;
    let font_file_id = doc.add_object(font_file);

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => font.name(),
        "Flags" => 32,
        "FontBBox" => vec![
            scale(bbox.x_min).into(),
            scale(bbox.y_min).into(),
            scale(bbox.x_max).into(),
            scale(bbox.y_max).into(),
        ],
        "ItalicAngle" => 0,
        "Ascent" => scale(face.ascender()),
        "Descent" => scale(face.descender()),
        "CapHeight" => scale(face.capital_height().unwrap_or_else(|| face.ascender())),
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let widths: Vec<Object> = usage
        .widths
        .iter()
        .flat_map(|(&glyph, &width)| [Object::from(glyph), Object::Array(vec![width.into()])])
        .collect();
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => font.name(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(&usage.unicode).into_bytes(),
    ));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => font.name(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    }))
}

/// ToUnicode CMap mapping two-byte glyph ids back to UTF-16BE text.
fn to_unicode_cmap(unicode: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo\n\
         << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    // At most 100 entries per bfchar block.
    let entries: Vec<(&u16, &char)> = unicode.iter().collect();
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (glyph, ch) in chunk {
            let mut utf16 = [0u16; 2];
            let target: String = ch
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            cmap.push_str(&format!("<{glyph:04X}> <{target}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}
