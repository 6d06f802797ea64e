//! Persona (segment) grouping.
//!
//! Splits one CSV review source into one [`ReviewSource`] per distinct value
//! of a segment column, so that each customer persona can be analysed on
//! its own and compared afterwards.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{ColumnRole, InsightsError, Result};
use crate::ingest::csv_line::parse_csv_line;
use crate::ingest::strip_bom;
use crate::types::ReviewSource;

/// Reviews grouped by segment value, in first-seen segment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentBuckets {
    segments: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl SegmentBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a review to a segment, creating the segment if unseen.
    pub fn push(&mut self, segment: &str, review: &str) {
        match self.index.get(segment) {
            Some(&pos) => self.segments[pos].1.push(review.to_string()),
            None => {
                self.index.insert(segment.to_string(), self.segments.len());
                self.segments
                    .push((segment.to_string(), vec![review.to_string()]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of distinct segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Reviews for a segment, in insertion order.
    pub fn get(&self, segment: &str) -> Option<&[String]> {
        self.index
            .get(segment)
            .map(|&pos| self.segments[pos].1.as_slice())
    }

    /// Iterate `(segment, reviews)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.segments
            .iter()
            .map(|(segment, reviews)| (segment.as_str(), reviews.as_slice()))
    }

    /// Convert into review sources that inherit `template`'s context and date.
    pub fn into_sources(self, template: &ReviewSource) -> Vec<ReviewSource> {
        self.segments
            .into_iter()
            .map(|(segment, reviews)| ReviewSource {
                label: segment,
                content: reviews.join("\n"),
                product_context: template.product_context.clone(),
                report_date: template.report_date.clone(),
            })
            .collect()
    }
}

/// Group the rows of a CSV blob by the value of `segment_column`.
///
/// The first line is the header. Both column names are matched exactly
/// (case-sensitive) against the trimmed header fields; the segment column
/// is checked before the review column. Rows whose segment or review value
/// is empty after trimming, or that are too short to hold either column,
/// are skipped.
///
/// # Errors
///
/// - [`InsightsError::EmptyCsv`] when the content has no header line
/// - [`InsightsError::ColumnNotFound`] naming the missing column
/// - [`InsightsError::NoSegmentsExtracted`] when no row survived
pub fn group_by_segment(
    content: &str,
    segment_column: &str,
    review_column: &str,
) -> Result<SegmentBuckets> {
    let trimmed = strip_bom(content).trim();
    if trimmed.is_empty() {
        return Err(InsightsError::EmptyCsv);
    }

    let mut lines = trimmed.split('\n');
    let header_line = lines.next().ok_or(InsightsError::EmptyCsv)?;
    let headers = parse_csv_line(header_line);

    let segment_column = segment_column.trim();
    let review_column = review_column.trim();

    let segment_idx = find_column(&headers, segment_column).ok_or_else(|| {
        InsightsError::ColumnNotFound {
            role: ColumnRole::Segment,
            column: segment_column.to_string(),
        }
    })?;
    let review_idx = find_column(&headers, review_column).ok_or_else(|| {
        InsightsError::ColumnNotFound {
            role: ColumnRole::Review,
            column: review_column.to_string(),
        }
    })?;

    let mut buckets = SegmentBuckets::new();
    let mut skipped = 0usize;

    for line in lines {
        let values = parse_csv_line(line);
        let segment = values.get(segment_idx).map(|v| v.trim()).unwrap_or("");
        let review = values.get(review_idx).map(|v| v.trim()).unwrap_or("");

        if segment.is_empty() || review.is_empty() {
            skipped += 1;
            continue;
        }
        buckets.push(segment, review);
    }

    if skipped > 0 {
        debug!("Skipped {} rows with an empty segment or review", skipped);
    }

    if buckets.is_empty() {
        return Err(InsightsError::NoSegmentsExtracted);
    }

    info!(
        "Grouped reviews into {} segments by column '{}'",
        buckets.len(),
        segment_column
    );
    Ok(buckets)
}

/// Run persona grouping on `source` and return one source per segment.
pub fn build_persona_sources(
    source: &ReviewSource,
    segment_column: &str,
    review_column: &str,
) -> Result<Vec<ReviewSource>> {
    let buckets = group_by_segment(&source.content, segment_column, review_column)?;
    Ok(buckets.into_sources(source))
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "Name,Type,Comment\nX,S1,r1\nY,S1,r2\nZ,S2,r3";

    #[test]
    fn test_groups_in_first_seen_order() {
        let source = ReviewSource::new("upload.csv", SAMPLE);
        let sources = build_persona_sources(&source, "Type", "Comment").unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].label, "S1");
        assert_eq!(sources[0].content, "r1\nr2");
        assert_eq!(sources[1].label, "S2");
        assert_eq!(sources[1].content, "r3");
    }

    #[test]
    fn test_sources_inherit_context_and_date() {
        let source = ReviewSource::new("upload.csv", SAMPLE)
            .with_context("Headphones")
            .with_report_date("Q4 2024");
        let sources = build_persona_sources(&source, "Type", "Comment").unwrap();

        for s in &sources {
            assert_eq!(s.product_context.as_deref(), Some("Headphones"));
            assert_eq!(s.report_date.as_deref(), Some("Q4 2024"));
        }
    }

    #[test]
    fn test_segment_column_is_case_sensitive() {
        let err = group_by_segment(SAMPLE, "type", "Comment").unwrap_err();
        assert!(matches!(
            err,
            InsightsError::ColumnNotFound { role: ColumnRole::Segment, ref column } if column == "type"
        ));
        assert!(err.to_string().contains("\"type\""));
    }

    #[test]
    fn test_missing_review_column_fails() {
        let content = "Name,Type,Review\nX,S1,r1";
        let err = group_by_segment(content, "Type", "Comment").unwrap_err();
        assert!(matches!(
            err,
            InsightsError::ColumnNotFound { role: ColumnRole::Review, .. }
        ));
    }

    #[test]
    fn test_missing_review_column_fails_even_with_bad_segment() {
        // Segment lookup runs first; either way grouping fails on a column.
        let content = "Name,Kind,Review\nX,S1,r1";
        let err = group_by_segment(content, "Type", "Comment").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_header_is_matched_after_trimming() {
        let content = " Name , Type , Comment \nX,S1,r1";
        let buckets = group_by_segment(content, " Type ", "Comment").unwrap();
        assert_eq!(buckets.get("S1"), Some(&["r1".to_string()][..]));
    }

    #[test]
    fn test_rows_with_empty_values_are_skipped() {
        let content = "Name,Type,Comment\nA,,orphan\nB,S1,  \nC\nD,S1,kept\n\n";
        let buckets = group_by_segment(content, "Type", "Comment").unwrap();

        assert_eq!(buckets.len(), 1);
        assert!(buckets.get("").is_none());
        assert_eq!(buckets.get("S1"), Some(&["kept".to_string()][..]));
    }

    #[test]
    fn test_byte_order_mark_before_header_is_ignored() {
        let buckets = group_by_segment("\u{FEFF}Type,Comment\nS1,r1", "Type", "Comment").unwrap();
        assert_eq!(buckets.get("S1"), Some(&["r1".to_string()][..]));
    }

    #[test]
    fn test_empty_content_fails() {
        assert!(matches!(
            group_by_segment("   \n  ", "Type", "Comment"),
            Err(InsightsError::EmptyCsv)
        ));
    }

    #[test]
    fn test_no_usable_rows_fails() {
        let content = "Name,Type,Comment\nA,,x\nB,S1,";
        assert!(matches!(
            group_by_segment(content, "Type", "Comment"),
            Err(InsightsError::NoSegmentsExtracted)
        ));
    }

    #[test]
    fn test_header_only_fails() {
        assert!(matches!(
            group_by_segment("Name,Type,Comment", "Type", "Comment"),
            Err(InsightsError::NoSegmentsExtracted)
        ));
    }

    #[test]
    fn test_quoted_reviews_keep_commas() {
        let content = "Reviewer Name,Rating (1-5),Customer Type,Comment\n\
                       John,5,Power User,\"Love it, truly\"\n\
                       Jane,2,New User,\"Battery, setup\"\r\n";
        let buckets = group_by_segment(content, "Customer Type", "Comment").unwrap();
        assert_eq!(
            buckets.iter().collect::<Vec<_>>(),
            vec![
                ("Power User", &["Love it, truly".to_string()][..]),
                ("New User", &["Battery, setup".to_string()][..]),
            ]
        );
    }
}
