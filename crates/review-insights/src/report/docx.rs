//! Word (DOCX) export, built with `docx-rs`.

use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, Start, Style, StyleType,
};

use crate::error::{InsightsError, Result};
use crate::report::data::ReportData;
use crate::report::{ExportFormat, ReportRenderer};

const BULLET_NUMBERING: usize = 1;

/// Renders the DOCX export.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl ReportRenderer for DocxRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, report: &ReportData) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        build_document(report)
            .build()
            .pack(&mut buffer)
            .map_err(|e| InsightsError::Export(format!("DOCX: {e}")))?;
        Ok(buffer.into_inner())
    }
}

fn heading(text: &str, style: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .style(style)
}

/// A paragraph with a bold label followed by plain text.
fn labelled(label: &str, text: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(label).bold())
        .add_run(Run::new().add_text(text))
}

fn bullet(text: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
}

fn bullets(docx: Docx, items: &[String], empty: &str) -> Docx {
    if items.is_empty() {
        return docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(empty)));
    }
    items
        .iter()
        .fold(docx, |docx, item| docx.add_paragraph(bullet(item)))
}

pub(crate) fn build_document(report: &ReportData) -> Docx {
    let mut docx = Docx::new()
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(26)
                .bold(),
        )
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING).add_level(Level::new(
                0,
                Start::new(1),
                NumberFormat::new("bullet"),
                LevelText::new("•"),
                LevelJc::new("left"),
            )),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));

    docx = docx
        .add_paragraph(heading(&report.title, "Heading1"))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(format!("Date: {}", report.date))));

    docx = docx
        .add_paragraph(heading("Strategic Analysis", "Heading2"))
        .add_paragraph(labelled("Overview: ", &report.strategy.overview))
        .add_paragraph(labelled("Key Focus Area: ", &report.strategy.key_focus_area));
    for (i, step) in report.strategy.steps.iter().enumerate() {
        docx = docx
            .add_paragraph(labelled(&format!("Step {}: ", i + 1), &step.step))
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Rationale: ").italic())
                    .add_run(Run::new().add_text(&step.rationale).italic()),
            );
    }

    docx = docx
        .add_paragraph(heading("Sentiment Breakdown", "Heading2"))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(format!(
            "Positive: {}, Negative: {}, Neutral: {}",
            report.sentiment.positive, report.sentiment.negative, report.sentiment.neutral
        ))));

    docx = docx.add_paragraph(heading("Pros", "Heading2"));
    docx = bullets(docx, &report.pros, "No items found.");
    docx = docx.add_paragraph(heading("Cons", "Heading2"));
    docx = bullets(docx, &report.cons, "No items found.");
    docx = docx.add_paragraph(heading("Common Themes", "Heading2"));
    docx = bullets(docx, &report.themes, "No items found.");

    docx = docx.add_paragraph(heading("Top Keywords", "Heading2"));
    let keywords: Vec<String> = report
        .keywords
        .iter()
        .map(|kw| format!("{} ({} mentions)", kw.keyword, kw.frequency))
        .collect();
    docx = bullets(docx, &keywords, "No keywords extracted.");

    docx = docx.add_paragraph(heading("Actionable Insights", "Heading2"));
    if report.insights.is_empty() {
        docx = docx.add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("No specific insights generated.")),
        );
    }
    for insight in &report.insights {
        docx = docx
            .add_paragraph(labelled("Cause: ", &insight.cause))
            .add_paragraph(labelled("Suggestion: ", &insight.suggestion));
    }

    docx
}
