//! Dashboard figures and the sentiment trend chart.
//!
//! The chart is emitted as a standalone SVG document so it can be written
//! next to an exported report or embedded in a web page.

use std::fmt::Write;

use serde::Serialize;

use crate::types::{Keyword, SentimentPoint, Summary};

const CHART_HEIGHT: f64 = 250.0;
const PAD_TOP: f64 = 20.0;
const PAD_RIGHT: f64 = 20.0;
const PAD_BOTTOM: f64 = 50.0;
const PAD_LEFT: f64 = 40.0;
const MIN_SPACING: f64 = 120.0;
const MIN_WIDTH: f64 = 500.0;

const POSITIVE_COLOR: &str = "#10b981";
const NEGATIVE_COLOR: &str = "#f43f5e";
const NEUTRAL_COLOR: &str = "#64748b";

/// Headline numbers shown above a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_points: f64,
    /// Share of positive points, 0-100. Zero when there are no points.
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_percent: f64,
    pub pros_count: usize,
    pub cons_count: usize,
    pub themes_count: usize,
    pub top_keyword: Option<String>,
}

impl DashboardMetrics {
    pub fn from_summary(summary: &Summary) -> Self {
        let s = &summary.sentiment;
        let total = s.total();
        let percent = |value: f64| if total > 0.0 { value / total * 100.0 } else { 0.0 };

        // first keyword wins ties
        let top_keyword = summary
            .keywords
            .iter()
            .fold(None::<&Keyword>, |best, kw| match best {
                Some(b) if b.frequency >= kw.frequency => Some(b),
                _ => Some(kw),
            })
            .map(|kw| kw.keyword.clone());

        Self {
            total_points: total,
            positive_percent: percent(s.positive),
            negative_percent: percent(s.negative),
            neutral_percent: percent(s.neutral),
            pros_count: summary.pros.len(),
            cons_count: summary.cons.len(),
            themes_count: summary.themes.len(),
            top_keyword,
        }
    }
}

/// Round `value` up to a readable axis maximum (1.5, 2, 3, 4, 5, 8 or 10
/// times a power of ten). Zero maps to 5.
pub fn nice_ceiling(value: f64) -> f64 {
    if value <= 0.0 {
        return 5.0;
    }
    let power = 10f64.powf(value.log10().floor());
    let relative = value / power;
    let ceiling = if relative < 1.5 {
        1.5
    } else if relative < 2.0 {
        2.0
    } else if relative < 3.0 {
        3.0
    } else if relative < 4.0 {
        4.0
    } else if relative < 5.0 {
        5.0
    } else if relative < 8.0 {
        8.0
    } else {
        10.0
    };
    ceiling * power
}

/// Line chart of sentiment counts across labelled reports, as SVG.
///
/// Lines are drawn only when there are at least two points.
pub fn sentiment_trend_svg(points: &[(String, SentimentPoint)]) -> String {
    let width = MIN_WIDTH.max(
        PAD_LEFT + PAD_RIGHT + points.len().saturating_sub(1) as f64 * MIN_SPACING,
    );
    let max_value = points
        .iter()
        .map(|(_, s)| s.max_count())
        .fold(0.0, f64::max);
    let y_max = nice_ceiling(max_value);

    let tick_count = if y_max <= 5.0 { y_max } else { 5.0 };
    let tick_increment = y_max / tick_count;

    let x_at = |index: usize| {
        let drawable = width - PAD_LEFT - PAD_RIGHT;
        let section = drawable / points.len().max(1) as f64;
        PAD_LEFT + index as f64 * section + section / 2.0
    };
    let y_at = |value: f64| {
        CHART_HEIGHT - PAD_BOTTOM - (value / y_max) * (CHART_HEIGHT - PAD_TOP - PAD_BOTTOM)
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {CHART_HEIGHT}" width="{width}" height="{CHART_HEIGHT}">"#
    );

    // Fractional tick counts (y_max 1.5) stop at the last whole tick.
    let tick_lines = (tick_count + 1.0).floor() as usize;
    for i in 0..tick_lines {
        let value = i as f64 * tick_increment;
        let y = y_at(value);
        let _ = writeln!(
            svg,
            r##"  <line x1="{PAD_LEFT}" y1="{y}" x2="{}" y2="{y}" stroke="#e2e8f0" stroke-width="0.5" stroke-dasharray="3,3"/>"##,
            width - PAD_RIGHT
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="end" font-size="10">{}</text>"#,
            PAD_LEFT - 8.0,
            y + 3.0,
            (value * 10.0).round() / 10.0
        );
    }

    for (i, (label, _)) in points.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="middle" font-size="10">{}</text>"#,
            x_at(i),
            CHART_HEIGHT - PAD_BOTTOM + 20.0,
            escape_xml(label)
        );
    }

    let series: [(fn(&SentimentPoint) -> f64, &str); 3] = [
        (|s| s.positive, POSITIVE_COLOR),
        (|s| s.negative, NEGATIVE_COLOR),
        (|s| s.neutral, NEUTRAL_COLOR),
    ];

    if points.len() > 1 {
        for (value_of, color) in series {
            let path: Vec<String> = points
                .iter()
                .enumerate()
                .map(|(i, (_, s))| {
                    let cmd = if i == 0 { 'M' } else { 'L' };
                    format!("{cmd} {} {}", x_at(i), y_at(value_of(s)))
                })
                .collect();
            let _ = writeln!(
                svg,
                r#"  <path d="{}" fill="none" stroke="{color}" stroke-width="2"/>"#,
                path.join(" ")
            );
        }
    }

    for (i, (_, s)) in points.iter().enumerate() {
        for (value_of, color) in series {
            let _ = writeln!(
                svg,
                r#"  <circle cx="{}" cy="{}" r="3" fill="{color}"/>"#,
                x_at(i),
                y_at(value_of(s))
            );
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_ceiling_steps() {
        assert_eq!(nice_ceiling(0.0), 5.0);
        assert_eq!(nice_ceiling(1.0), 1.5);
        assert_eq!(nice_ceiling(7.0), 8.0);
        assert_eq!(nice_ceiling(12.0), 15.0);
        assert_eq!(nice_ceiling(25.0), 30.0);
        assert_eq!(nice_ceiling(95.0), 100.0);
    }

    #[test]
    fn test_metrics_percentages() {
        let summary = Summary {
            sentiment: SentimentPoint::new(6.0, 3.0, 1.0),
            pros: vec!["a".to_string()],
            keywords: vec![
                Keyword {
                    keyword: "battery".to_string(),
                    frequency: 4.0,
                },
                Keyword {
                    keyword: "sound".to_string(),
                    frequency: 4.0,
                },
            ],
            ..Summary::default()
        };
        let metrics = DashboardMetrics::from_summary(&summary);
        assert_eq!(metrics.total_points, 10.0);
        assert_eq!(metrics.positive_percent, 60.0);
        assert_eq!(metrics.pros_count, 1);
        assert_eq!(metrics.top_keyword.as_deref(), Some("battery"));
    }

    #[test]
    fn test_metrics_without_sentiment() {
        let metrics = DashboardMetrics::from_summary(&Summary::default());
        assert_eq!(metrics.positive_percent, 0.0);
        assert!(metrics.top_keyword.is_none());
    }

    #[test]
    fn test_single_point_has_no_lines() {
        let svg = sentiment_trend_svg(&[("Q1".to_string(), SentimentPoint::new(3.0, 1.0, 0.0))]);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<path"));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_trend_lines_and_escaped_labels() {
        let svg = sentiment_trend_svg(&[
            ("Q1 & Q2".to_string(), SentimentPoint::new(3.0, 1.0, 0.0)),
            ("Q3".to_string(), SentimentPoint::new(5.0, 2.0, 1.0)),
        ]);
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains("Q1 &amp; Q2"));
        assert!(svg.contains(POSITIVE_COLOR));
    }

    #[test]
    fn test_fractional_axis_keeps_ticks_inside_plot() {
        let svg = sentiment_trend_svg(&[("Q1".to_string(), SentimentPoint::new(1.0, 0.0, 0.0))]);
        assert_eq!(svg.matches("stroke-dasharray").count(), 2);
        assert!(!svg.contains(r#"y1="-"#));
    }

    #[test]
    fn test_five_point_axis_draws_six_ticks() {
        let svg = sentiment_trend_svg(&[("Q1".to_string(), SentimentPoint::new(4.5, 0.0, 0.0))]);
        assert_eq!(svg.matches("stroke-dasharray").count(), 6);
    }

    #[test]
    fn test_chart_widens_with_many_points() {
        let points: Vec<_> = (0..10)
            .map(|i| (format!("R{i}"), SentimentPoint::new(i as f64, 0.0, 0.0)))
            .collect();
        let svg = sentiment_trend_svg(&points);
        // 40 + 20 + 9 * 120
        assert!(svg.contains(r#"viewBox="0 0 1140 250""#));
    }
}
