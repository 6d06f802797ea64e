//! Google Sheets import.
//!
//! A public spreadsheet is fetched through its CSV export endpoint and
//! becomes a single review source labelled "Google Sheet".

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{InsightsError, Result};
use crate::ingest::strip_bom;
use crate::types::ReviewSource;

/// Label given to the source produced by a sheet import.
pub const SHEET_SOURCE_LABEL: &str = "Google Sheet";

static SHEET_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"spreadsheets/d/([a-zA-Z0-9_-]+)").expect("Invalid regex: sheet id")
});

/// Extract the spreadsheet id from a sharing or edit URL.
pub fn sheet_id(url: &str) -> Result<&str> {
    SHEET_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(InsightsError::InvalidSheetUrl)
}

/// Derive the CSV export URL for a spreadsheet URL.
pub fn sheet_export_url(url: &str) -> Result<String> {
    let id = sheet_id(url.trim())?;
    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{id}/export?format=csv"
    ))
}

/// Reject a fetched body longer than `limit` characters.
pub fn validate_sheet_body(text: &str, limit: usize) -> Result<()> {
    if text.chars().count() > limit {
        return Err(InsightsError::TextTooLong { limit });
    }
    Ok(())
}

/// Fetch a published spreadsheet as CSV.
///
/// # Errors
///
/// - [`InsightsError::InvalidSheetUrl`] when no sheet id is found
/// - [`InsightsError::SheetFetch`] on a non-success HTTP status
/// - [`InsightsError::TextTooLong`] when the body exceeds `limit` characters
pub async fn fetch_sheet(client: &reqwest::Client, url: &str, limit: usize) -> Result<ReviewSource> {
    if url.trim().is_empty() {
        return Err(InsightsError::InvalidSheetUrl);
    }
    let export_url = sheet_export_url(url)?;
    info!("Fetching spreadsheet export: {}", export_url);

    let response = client.get(&export_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!("Spreadsheet export returned HTTP {}", status);
        return Err(InsightsError::SheetFetch(
            "Fetch failed. Ensure the sheet is published to the web.".to_string(),
        ));
    }

    let body = response.text().await?;
    let text = strip_bom(&body).to_string();
    validate_sheet_body(&text, limit)?;

    info!("Fetched {} characters from spreadsheet", text.len());
    Ok(ReviewSource::new(SHEET_SOURCE_LABEL, text))
}
