//! Plain-text report and the clipboard summary.

use std::fmt::Write;

use crate::error::Result;
use crate::report::data::ReportData;
use crate::report::{ExportFormat, ReportRenderer};
use crate::types::Summary;

const RULE: &str = "=========================================";

/// Renders the plain-text export.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Txt
    }

    fn render(&self, report: &ReportData) -> Result<Vec<u8>> {
        Ok(render_text(report).into_bytes())
    }
}

/// Render the report as plain text.
pub fn render_text(report: &ReportData) -> String {
    let mut out = String::new();

    // writes into a String cannot fail
    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(out, "{RULE}");
    let _ = write!(out, "Date: {}\n\n", report.date);

    out.push_str("--- STRATEGIC ANALYSIS ---\n");
    let _ = writeln!(out, "Overview: {}", report.strategy.overview);
    let _ = write!(out, "Key Focus Area: {}\n\n", report.strategy.key_focus_area);
    for (i, step) in report.strategy.steps.iter().enumerate() {
        let _ = writeln!(out, "Strategic Step {}: {}", i + 1, step.step);
        let _ = write!(out, "Rationale: {}\n\n", step.rationale);
    }

    out.push_str("--- SENTIMENT BREAKDOWN ---\n");
    let _ = writeln!(out, "Positive: {}", report.sentiment.positive);
    let _ = writeln!(out, "Negative: {}", report.sentiment.negative);
    let _ = write!(out, "Neutral: {}\n\n", report.sentiment.neutral);

    push_list(&mut out, "PROS", &report.pros);
    push_list(&mut out, "CONS", &report.cons);
    push_list(&mut out, "COMMON THEMES", &report.themes);

    out.push_str("--- TOP KEYWORDS ---\n");
    if report.keywords.is_empty() {
        out.push_str("No keywords extracted.\n\n");
    } else {
        for kw in &report.keywords {
            let _ = writeln!(out, "- {} ({} mentions)", kw.keyword, kw.frequency);
        }
        out.push('\n');
    }

    out.push_str("--- ACTIONABLE INSIGHTS (ROOT CAUSE ANALYSIS) ---\n");
    if report.insights.is_empty() {
        out.push_str("No specific insights generated.\n");
    } else {
        for insight in &report.insights {
            let _ = writeln!(out, "Cause: {}", insight.cause);
            let _ = write!(out, "Suggestion: {}\n\n", insight.suggestion);
        }
    }

    out
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(out, "--- {heading} ---");
    if items.is_empty() {
        out.push_str("No items found.");
    } else {
        let lines: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
        out.push_str(&lines.join("\n"));
    }
    out.push_str("\n\n");
}

/// Markdown-flavoured summary for the clipboard. Empty sections are left out.
pub fn summary_markdown(label: &str, summary: &Summary) -> String {
    let mut out = format!("**Customer Review Summary for {label}**\n\n");

    let sections: [(&str, Vec<String>); 4] = [
        ("Pros", summary.pros.clone()),
        ("Cons", summary.cons.clone()),
        ("Common Themes", summary.themes.clone()),
        (
            "Top Keywords",
            summary
                .keywords
                .iter()
                .map(|kw| format!("{} ({} mentions)", kw.keyword, kw.frequency))
                .collect(),
        ),
    ];

    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "**{heading}:**");
        for item in items {
            let _ = writeln!(out, "- {item}");
        }
        out.push('\n');
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::data::fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_text_layout() {
        let text = render_text(&fixtures::report());
        let expected = "CUSTOMER INSIGHTS AI - ANALYSIS REPORT for Q4 Reviews\n\
=========================================\n\
Date: 18/10/2024, 09:05:00\n\
\n\
--- STRATEGIC ANALYSIS ---\n\
Overview: Loved for sound, hurt by battery\n\
Key Focus Area: Battery life\n\
\n\
Strategic Step 1: Redesign battery\n\
Rationale: Most frequent complaint\n\
\n\
--- SENTIMENT BREAKDOWN ---\n\
Positive: 5\n\
Negative: 2\n\
Neutral: 1\n\
\n\
--- PROS ---\n\
- Great sound\n\
- Comfortable\n\
\n\
--- CONS ---\n\
- Battery drains fast\n\
\n\
--- COMMON THEMES ---\n\
- Audio quality\n\
\n\
--- TOP KEYWORDS ---\n\
- battery (4 mentions)\n\
\n\
--- ACTIONABLE INSIGHTS (ROOT CAUSE ANALYSIS) ---\n\
Cause: Small battery cell\n\
Suggestion: Ship a larger cell\n\
\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_sections_use_placeholders() {
        let mut report = fixtures::report();
        report.cons.clear();
        report.keywords.clear();
        report.insights.clear();

        let text = render_text(&report);
        assert!(text.contains("--- CONS ---\nNo items found.\n\n"));
        assert!(text.contains("--- TOP KEYWORDS ---\nNo keywords extracted.\n\n"));
        assert!(text.ends_with(
            "--- ACTIONABLE INSIGHTS (ROOT CAUSE ANALYSIS) ---\nNo specific insights generated.\n"
        ));
    }

    #[test]
    fn test_summary_markdown() {
        let markdown = summary_markdown("Q4 Reviews", &fixtures::summary());
        assert_eq!(
            markdown,
            "**Customer Review Summary for Q4 Reviews**\n\n\
**Pros:**\n- Great sound\n- Comfortable\n\n\
**Cons:**\n- Battery drains fast\n\n\
**Common Themes:**\n- Audio quality\n\n\
**Top Keywords:**\n- battery (4 mentions)"
        );
    }

    #[test]
    fn test_summary_markdown_skips_empty_sections() {
        let summary = Summary {
            cons: vec!["Price".to_string()],
            ..Summary::default()
        };
        assert_eq!(
            summary_markdown("X", &summary),
            "**Customer Review Summary for X**\n\n**Cons:**\n- Price"
        );
    }
}
