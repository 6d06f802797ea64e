//! Report data assembly.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::types::{Insight, Keyword, ReviewSource, SentimentPoint, StrategicAnalysis, Summary};

/// Report titles read `<prefix> <source label>`.
pub const REPORT_TITLE_PREFIX: &str = "CUSTOMER INSIGHTS AI - ANALYSIS REPORT for";

/// Everything an exported report contains, flattened from one summary and
/// its strategic analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub title: String,
    pub date: String,
    pub strategy: StrategicAnalysis,
    pub sentiment: SentimentPoint,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub themes: Vec<String>,
    pub insights: Vec<Insight>,
    pub keywords: Vec<Keyword>,
}

impl ReportData {
    /// Assemble the report for `index`.
    ///
    /// Returns `None` unless a source, a summary and a strategic analysis
    /// all exist at that index.
    pub fn build<Tz>(
        sources: &[ReviewSource],
        summaries: Option<&[Summary]>,
        strategies: Option<&[StrategicAnalysis]>,
        index: usize,
        now: &DateTime<Tz>,
    ) -> Option<Self>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let summary = summaries?.get(index)?;
        let strategy = strategies?.get(index)?;
        let label = match sources.get(index)?.label.trim() {
            "" => format!("Report {}", index + 1),
            label => label.to_string(),
        };

        Some(Self {
            title: format!("{REPORT_TITLE_PREFIX} {label}"),
            date: now.format("%d/%m/%Y, %H:%M:%S").to_string(),
            strategy: strategy.clone(),
            sentiment: summary.sentiment,
            pros: summary.pros.clone(),
            cons: summary.cons.clone(),
            themes: summary.themes.clone(),
            insights: summary.insights.clone(),
            keywords: summary.keywords.clone(),
        })
    }
}
