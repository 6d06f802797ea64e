//! Integration tests for the analysis controller.
//!
//! A scripted provider stands in for Gemini so that runs, follow-ups and
//! exports can be exercised end to end without network access.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::Notify;

use review_insights::ai::InsightsProvider;
use review_insights::pipeline::{CHAT_ERROR_REPLY, DRAFT_REPLY_ERROR, TREND_SELECTION_ERROR};
use review_insights::types::SegmentSummary;
use review_insights::{
    AnalysisController, AnalysisStage, ChatSender, DeepDiveAnalysis, ExportFormat, InsightsConfig,
    InsightsError, InsightsResult, Keyword, PersonaComparison, RendererRegistry, ReviewSource,
    SegmentComparison, SentimentPoint, StrategicAnalysis, StrategicStep, Summary, TrendAnalysis,
};

// ============================================================================
// Mock Provider
// ============================================================================

/// Provider whose answers are derived from its input.
///
/// Reviews containing `FAIL` make `summarize` fail, reviews containing
/// `SLOW` block until [`MockProvider::release`] is notified. With
/// `hold_trend`, trend requests block the same way.
#[derive(Default)]
struct MockProvider {
    summarize_calls: AtomicUsize,
    strategy_calls: AtomicUsize,
    comparison_calls: AtomicUsize,
    fail_follow_ups: bool,
    hold_trend: bool,
    trend_labels: Mutex<Vec<(String, String)>>,
    entered: Notify,
    release: Notify,
}

impl MockProvider {
    fn failing_follow_ups() -> Self {
        Self {
            fail_follow_ups: true,
            ..Self::default()
        }
    }

    fn holding_trend() -> Self {
        Self {
            hold_trend: true,
            ..Self::default()
        }
    }

    fn api_error(action: &str) -> InsightsError {
        InsightsError::Api {
            action: action.to_string(),
            detail: "quota exceeded".to_string(),
        }
    }
}

#[async_trait]
impl InsightsProvider for MockProvider {
    async fn summarize(
        &self,
        reviews: &str,
        _language: &str,
        _context: &str,
    ) -> InsightsResult<Summary> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        if reviews.contains("SLOW") {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if reviews.contains("FAIL") {
            return Err(Self::api_error("process reviews"));
        }
        let first = reviews.lines().next().unwrap_or_default().to_string();
        Ok(Summary {
            pros: vec![first],
            cons: vec!["Price".to_string()],
            themes: vec!["Sound".to_string()],
            sentiment: SentimentPoint::new(reviews.lines().count() as f64, 1.0, 0.0),
            insights: Vec::new(),
            keywords: vec![Keyword {
                keyword: "battery".to_string(),
                frequency: 3.0,
            }],
        })
    }

    async fn strategic_analysis(
        &self,
        summary: &Summary,
        _language: &str,
    ) -> InsightsResult<StrategicAnalysis> {
        self.strategy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StrategicAnalysis {
            overview: format!("Overview of {}", summary.pros.join(", ")),
            key_focus_area: "Battery life".to_string(),
            steps: vec![StrategicStep {
                step: "Ship a firmware update".to_string(),
                rationale: "Most complaints mention battery drain".to_string(),
            }],
        })
    }

    async fn trend_analysis(
        &self,
        _start: &Summary,
        _end: &Summary,
        start_label: &str,
        end_label: &str,
        _language: &str,
    ) -> InsightsResult<TrendAnalysis> {
        self.trend_labels
            .lock()
            .push((start_label.to_string(), end_label.to_string()));
        if self.hold_trend {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(TrendAnalysis {
            summary: format!("{start_label} to {end_label}"),
            new_issues: vec!["Hinge cracks".to_string()],
            resolved_issues: Vec::new(),
            persistent_themes: vec!["Sound".to_string()],
        })
    }

    async fn persona_comparison(
        &self,
        summaries: &[SegmentSummary<'_>],
        _language: &str,
    ) -> InsightsResult<PersonaComparison> {
        self.comparison_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PersonaComparison {
            overview: format!("{} personas", summaries.len()),
            segment_comparisons: summaries
                .iter()
                .map(|s| SegmentComparison {
                    segment: s.segment.to_string(),
                    key_differentiators: s.summary.pros.clone(),
                })
                .collect(),
        })
    }

    async fn deep_dive(
        &self,
        _reviews: &str,
        topic: &str,
        _language: &str,
        _context: &str,
    ) -> InsightsResult<DeepDiveAnalysis> {
        if self.fail_follow_ups {
            return Err(Self::api_error("analyze topic"));
        }
        Ok(DeepDiveAnalysis {
            summary: format!("About {topic}"),
            snippets: vec![format!("the {topic} is great")],
            sentiment: SentimentPoint::new(1.0, 0.0, 0.0),
        })
    }

    async fn answer_question(
        &self,
        _reviews: &str,
        question: &str,
        _language: &str,
        _context: &str,
    ) -> InsightsResult<String> {
        if self.fail_follow_ups {
            return Err(Self::api_error("answer question"));
        }
        Ok(format!("Answer to: {question}"))
    }

    async fn suggest_questions(
        &self,
        _reviews: &str,
        _context: &str,
    ) -> InsightsResult<Vec<String>> {
        if self.fail_follow_ups {
            return Err(Self::api_error("suggest questions"));
        }
        Ok(vec![
            "What do people like?".to_string(),
            "What breaks first?".to_string(),
            "Is it worth the price?".to_string(),
        ])
    }

    async fn draft_reply(
        &self,
        complaint: &str,
        _language: &str,
        _context: &str,
    ) -> InsightsResult<String> {
        if self.fail_follow_ups {
            return Err(Self::api_error("draft reply"));
        }
        Ok(format!("We are sorry about: {complaint}"))
    }

    async fn sample_reviews(&self) -> InsightsResult<String> {
        Ok("Customer Type,Rating,Comment\nGamer,5,Great latency\nCommuter,3,Noise cancelling is weak\n"
            .to_string())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

const PERSONA_CSV: &str = "Name,Customer Type,Comment\n\
                           Ann,Gamer,Great latency\n\
                           Bob,Commuter,Battery lasts all week\n\
                           Cid,Gamer,Mic is muffled\n";

fn controller_with(provider: Arc<MockProvider>) -> AnalysisController {
    AnalysisController::builder().provider(provider).build()
}

fn two_sources() -> Vec<ReviewSource> {
    vec![
        ReviewSource::new("Q1", "Loud and clear\nComfortable"),
        ReviewSource::new("Q2", "Hinge cracked\nStill loud"),
    ]
}

async fn analyzed(provider: Arc<MockProvider>) -> AnalysisController {
    let controller = controller_with(provider);
    controller.set_sources(two_sources()).unwrap();
    controller.run_analysis().await.unwrap();
    controller
}

fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.path().join(format!("reviews_{i}.csv"));
            std::fs::write(&path, format!("Comment\nreview {i}\n")).unwrap();
            path
        })
        .collect()
}

// ============================================================================
// Analysis Runs
// ============================================================================

#[tokio::test]
async fn test_full_run_produces_one_report_per_source() {
    let provider = Arc::new(MockProvider::default());
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&stages);

    let controller = AnalysisController::builder()
        .provider(provider.clone())
        .on_progress(move |update| seen.lock().push(update.stage))
        .build();
    controller.set_sources(two_sources()).unwrap();
    controller.run_analysis().await.unwrap();

    let state = controller.snapshot();
    let summaries = state.summaries.unwrap();
    let strategies = state.strategies.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(strategies.len(), 2);
    assert_eq!(summaries[0].pros, vec!["Loud and clear"]);
    assert_eq!(summaries[1].pros, vec!["Hinge cracked"]);
    assert_eq!(strategies[1].overview, "Overview of Hinge cracked");
    assert!(state.persona_comparison.is_none());
    assert!(state.error.is_none());
    assert!(!state.loading.analysis);

    assert_eq!(provider.summarize_calls.load(Ordering::SeqCst), 2);
    assert_eq!(provider.strategy_calls.load(Ordering::SeqCst), 2);
    assert_eq!(provider.comparison_calls.load(Ordering::SeqCst), 0);

    let stages = stages.lock();
    assert!(stages.contains(&AnalysisStage::Summarizing));
    assert!(stages.contains(&AnalysisStage::StrategicAnalysis));
    assert_eq!(stages.last(), Some(&AnalysisStage::Complete));
}

#[tokio::test]
async fn test_persona_run_groups_and_compares() {
    let provider = Arc::new(MockProvider::default());
    let controller = controller_with(provider.clone());
    controller
        .set_sources(vec![
            ReviewSource::new("upload.csv", PERSONA_CSV).with_context("Headphones"),
        ])
        .unwrap();
    controller.set_segment_column("Customer Type");

    controller.run_analysis().await.unwrap();

    let state = controller.snapshot();
    let labels: Vec<_> = state.sources.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Gamer", "Commuter"]);
    assert_eq!(state.sources[0].content, "Great latency\nMic is muffled");
    assert_eq!(state.sources[1].product_context.as_deref(), Some("Headphones"));
    assert_eq!(state.summaries.as_ref().unwrap().len(), 2);

    let comparison = state.persona_comparison.unwrap();
    assert_eq!(comparison.overview, "2 personas");
    assert_eq!(comparison.segment_comparisons[0].segment, "Gamer");
    assert_eq!(provider.comparison_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_single_persona_skips_comparison() {
    let provider = Arc::new(MockProvider::default());
    let controller = controller_with(provider.clone());
    controller
        .set_sources(vec![ReviewSource::new(
            "upload.csv",
            "Customer Type,Comment\nGamer,Great\nGamer,Laggy",
        )])
        .unwrap();
    controller.set_segment_column("Customer Type");

    controller.run_analysis().await.unwrap();

    let state = controller.snapshot();
    assert_eq!(state.summaries.unwrap().len(), 1);
    assert!(state.persona_comparison.is_none());
    assert_eq!(provider.comparison_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_segment_column_fails_before_any_request() {
    let provider = Arc::new(MockProvider::default());
    let controller = controller_with(provider.clone());
    controller
        .set_sources(vec![ReviewSource::new("upload.csv", PERSONA_CSV)])
        .unwrap();
    controller.set_segment_column("Segment");

    let err = controller.run_analysis().await.unwrap_err();

    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    assert!(err.to_string().starts_with("Persona analysis failed"));
    assert_eq!(provider.summarize_calls.load(Ordering::SeqCst), 0);
    let state = controller.snapshot();
    assert!(state.summaries.is_none());
    assert!(state.error.unwrap().contains("\"Segment\""));
}

#[tokio::test]
async fn test_one_failed_summary_commits_nothing() {
    let provider = Arc::new(MockProvider::default());
    let controller = controller_with(provider.clone());
    controller
        .set_sources(vec![
            ReviewSource::new("ok", "Nice"),
            ReviewSource::new("bad", "FAIL"),
            ReviewSource::new("ok too", "Fine"),
        ])
        .unwrap();

    let err = controller.run_analysis().await.unwrap_err();

    assert_eq!(err.error_code(), "API_ERROR");
    assert_eq!(provider.summarize_calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.strategy_calls.load(Ordering::SeqCst), 0);
    let state = controller.snapshot();
    assert!(state.summaries.is_none());
    assert!(state.strategies.is_none());
    assert!(!state.loading.analysis);
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to process reviews. Gemini API error: quota exceeded")
    );
}

#[tokio::test]
async fn test_new_run_clears_previous_results() {
    let provider = Arc::new(MockProvider::default());
    let controller = analyzed(provider).await;
    controller.toggle_comparison(0);
    controller.toggle_comparison(1);
    controller.run_trend_analysis().await.unwrap();
    controller.ask_question("Anything?").await.unwrap();

    controller
        .set_sources(vec![ReviewSource::new("bad", "FAIL")])
        .unwrap();
    assert!(controller.run_analysis().await.is_err());

    let state = controller.snapshot();
    assert!(state.summaries.is_none());
    assert!(state.trend.is_none());
    assert!(state.chat_history.is_empty());
}

#[tokio::test]
async fn test_superseded_run_is_discarded() {
    let provider = Arc::new(MockProvider::default());
    let controller = Arc::new(controller_with(provider.clone()));
    controller
        .set_sources(vec![ReviewSource::new("old", "SLOW reviews")])
        .unwrap();

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.run_analysis().await })
    };
    provider.entered.notified().await;

    controller
        .set_sources(vec![ReviewSource::new("new", "Fresh reviews")])
        .unwrap();
    controller.run_analysis().await.unwrap();

    provider.release.notify_one();
    let err = first.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());

    let state = controller.snapshot();
    let summaries = state.summaries.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].pros, vec!["Fresh reviews"]);
    assert_eq!(state.current_run, 2);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_missing_api_key_and_empty_input() {
    let controller = AnalysisController::builder().build();
    let err = controller.run_analysis().await.unwrap_err();
    assert_eq!(err.error_code(), "MISSING_API_KEY");
    assert_eq!(
        controller.snapshot().error.as_deref(),
        Some("API Key is not set. Please set it first.")
    );

    let controller = controller_with(Arc::new(MockProvider::default()));
    controller
        .set_sources(vec![ReviewSource::new("blank", "   ")])
        .unwrap();
    let err = controller.run_analysis().await.unwrap_err();
    assert_eq!(err.error_code(), "NO_REVIEW_DATA");
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn test_load_files_one_source_per_file() {
    let dir = TempDir::new().unwrap();
    let controller = controller_with(Arc::new(MockProvider::default()));

    let count = controller.load_files(write_files(&dir, 2)).await.unwrap();

    assert_eq!(count, 2);
    let state = controller.snapshot();
    assert_eq!(state.sources[0].label, "reviews_0.csv");
    assert_eq!(state.sources[1].content, "Comment\nreview 1\n");
}

#[tokio::test]
async fn test_six_files_are_rejected_without_change() {
    let dir = TempDir::new().unwrap();
    let controller = controller_with(Arc::new(MockProvider::default()));
    controller.set_sources(two_sources()).unwrap();

    let err = controller.load_files(write_files(&dir, 6)).await.unwrap_err();

    assert_eq!(err.error_code(), "TOO_MANY_FILES");
    let state = controller.snapshot();
    assert_eq!(state.sources.len(), 2);
    assert_eq!(
        state.error.as_deref(),
        Some("You can upload a maximum of 5 files at a time.")
    );
}

#[tokio::test]
async fn test_unsupported_file_rejects_whole_batch() {
    let dir = TempDir::new().unwrap();
    let mut files = write_files(&dir, 1);
    let pdf = dir.path().join("notes.pdf");
    std::fs::write(&pdf, "%PDF").unwrap();
    files.push(pdf);

    let controller = controller_with(Arc::new(MockProvider::default()));
    let err = controller.load_files(files).await.unwrap_err();

    assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
    assert_eq!(controller.snapshot().sources[0].label, "Pasted Source 1");
}

#[tokio::test]
async fn test_spreadsheet_without_converter_is_capability_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.xlsx");
    std::fs::write(&path, b"PK\x03\x04").unwrap();

    let controller = AnalysisController::builder()
        .provider(Arc::new(MockProvider::default()))
        .spreadsheet_converter(None)
        .build();
    let err = controller.load_files(vec![path]).await.unwrap_err();

    assert_eq!(err.error_code(), "CAPABILITY_UNAVAILABLE");
}

#[tokio::test]
async fn test_source_limit_applies_to_manual_sources() {
    let config = InsightsConfig::builder().max_files(2).build().unwrap();
    let controller = AnalysisController::builder().config(config).build();

    controller.add_source().unwrap();
    let err = controller.add_source().unwrap_err();

    assert_eq!(err.error_code(), "TOO_MANY_SOURCES");
    assert_eq!(controller.snapshot().sources.len(), 2);
}

#[tokio::test]
async fn test_sample_data_presets_persona_analysis() {
    let provider = Arc::new(MockProvider::default());
    let controller = controller_with(provider.clone());

    controller.generate_sample_data().await.unwrap();
    let state = controller.snapshot();
    assert_eq!(state.sources.len(), 1);
    assert_eq!(state.sources[0].label, "Sample Headphones Data");
    assert_eq!(state.sources[0].report_date.as_deref(), Some("Q4 2024"));
    assert_eq!(state.segment_column, "Customer Type");
    assert!(!state.loading.sample);

    controller.run_analysis().await.unwrap();
    let state = controller.snapshot();
    assert_eq!(state.sources.len(), 2);
    assert!(state.persona_comparison.is_some());
}

// ============================================================================
// Trends & Follow-ups
// ============================================================================

#[tokio::test]
async fn test_trend_compares_earlier_report_first() {
    let provider = Arc::new(MockProvider::default());
    let controller = analyzed(provider.clone()).await;

    assert!(controller.toggle_comparison(1));
    assert!(controller.toggle_comparison(0));
    assert!(!controller.toggle_comparison(2));

    let report = controller.run_trend_analysis().await.unwrap();

    assert_eq!(report.start_index, 0);
    assert_eq!(report.end_index, 1);
    assert_eq!(report.analysis.summary, "Q1 to Q2");
    assert_eq!(
        provider.trend_labels.lock().as_slice(),
        &[("Q1".to_string(), "Q2".to_string())]
    );
    let state = controller.snapshot();
    assert!(state.comparison_indices.is_empty());
    assert!(!state.loading.trend);
}

#[tokio::test]
async fn test_trend_from_superseded_run_is_discarded() {
    let provider = Arc::new(MockProvider::holding_trend());
    let controller = Arc::new(analyzed(provider.clone()).await);
    controller.toggle_comparison(0);
    controller.toggle_comparison(1);

    let trend = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.run_trend_analysis().await })
    };
    provider.entered.notified().await;

    controller
        .set_sources(vec![ReviewSource::new("Fresh", "Brand new reviews")])
        .unwrap();
    controller.run_analysis().await.unwrap();

    provider.release.notify_one();
    let err = trend.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());

    let state = controller.snapshot();
    assert_eq!(state.current_run, 2);
    assert_eq!(state.summaries.map(|s| s.len()), Some(1));
    assert_eq!(state.sources[0].label, "Fresh");
    assert!(state.trend.is_none());
    assert!(!state.loading.trend);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_trend_needs_exactly_two_reports() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;
    controller.toggle_comparison(0);

    let err = controller.run_trend_analysis().await.unwrap_err();

    assert_eq!(err.to_string(), TREND_SELECTION_ERROR);
    assert_eq!(
        controller.snapshot().error.as_deref(),
        Some(TREND_SELECTION_ERROR)
    );
}

#[tokio::test]
async fn test_chat_records_question_and_answer() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;
    controller.select_report(1).unwrap();

    let answer = controller.ask_question("  Is it loud?  ").await.unwrap();

    assert_eq!(answer, "Answer to: Is it loud?");
    let history = controller.snapshot().chat_history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, ChatSender::User);
    assert_eq!(history[0].text, "Is it loud?");
    assert_eq!(history[1].sender, ChatSender::Ai);
    assert!(history[0].id < history[1].id);
}

#[tokio::test]
async fn test_failed_follow_ups_degrade_gracefully() {
    let controller = analyzed(Arc::new(MockProvider::failing_follow_ups())).await;

    let answer = controller.ask_question("Why?").await.unwrap();
    assert_eq!(answer, CHAT_ERROR_REPLY);
    assert!(!controller.snapshot().loading.chat);

    let reply = controller.draft_reply("It broke").await.unwrap();
    assert_eq!(reply, DRAFT_REPLY_ERROR);

    assert!(controller.suggest_questions().await.is_err());
    assert!(!controller.snapshot().loading.questions);

    assert!(controller.deep_dive("battery").await.is_err());
    let state = controller.snapshot();
    let slot = state.deep_dive.unwrap();
    assert_eq!(slot.topic, "battery");
    assert!(slot.result.is_none());
    assert!(
        slot.error
            .unwrap()
            .starts_with("Failed to analyze \"battery\": ")
    );
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_follow_ups_need_an_analysis() {
    let controller = controller_with(Arc::new(MockProvider::default()));
    controller.set_sources(two_sources()).unwrap();

    let err = controller.ask_question("Hello?").await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SELECTION");
    assert!(controller.snapshot().chat_history.is_empty());
}

#[tokio::test]
async fn test_deep_dive_and_suggestions_succeed() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;

    let questions = controller.suggest_questions().await.unwrap();
    assert_eq!(questions.len(), 3);

    let analysis = controller.deep_dive("battery").await.unwrap();
    assert_eq!(analysis.summary, "About battery");

    let state = controller.snapshot();
    assert_eq!(state.suggested_questions, questions);
    assert_eq!(state.deep_dive.unwrap().result, Some(analysis));
}

// ============================================================================
// Exports
// ============================================================================

#[tokio::test]
async fn test_text_export_contains_report_sections() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;

    let artifact = controller.export_report(1, ExportFormat::Txt).unwrap();

    assert!(artifact.file_name.starts_with("Customer_Insights_Report_"));
    assert!(artifact.file_name.ends_with(".txt"));
    let text = String::from_utf8(artifact.bytes).unwrap();
    assert!(text.starts_with("CUSTOMER INSIGHTS AI - ANALYSIS REPORT for Q2\n"));
    assert!(text.contains("Hinge cracked"));
    assert!(text.contains("Battery life"));
}

#[tokio::test]
async fn test_json_export_round_trips_strategy() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;

    let artifact = controller.export_report(0, ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&artifact.bytes).unwrap();

    assert_eq!(value["title"], "CUSTOMER INSIGHTS AI - ANALYSIS REPORT for Q1");
    assert_eq!(value["strategy"]["keyFocusArea"], "Battery life");
    assert_eq!(value["keywords"][0]["keyword"], "battery");
}

#[tokio::test]
async fn test_export_without_renderer_reports_missing_library() {
    let controller = AnalysisController::builder()
        .provider(Arc::new(MockProvider::default()))
        .renderers(RendererRegistry::new())
        .build();
    controller.set_sources(two_sources()).unwrap();
    controller.run_analysis().await.unwrap();

    let err = controller.export_report(0, ExportFormat::Pdf).unwrap_err();

    assert_eq!(err.error_code(), "CAPABILITY_UNAVAILABLE");
    assert_eq!(
        controller.snapshot().error.as_deref(),
        Some("PDF generation library not found.")
    );
}

#[tokio::test]
async fn test_export_out_of_range_is_rejected() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;
    let err = controller.export_report(5, ExportFormat::Txt).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SELECTION");
}

#[tokio::test]
async fn test_write_report_creates_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let controller = analyzed(Arc::new(MockProvider::default())).await;

    let path = controller
        .write_report(0, ExportFormat::Json, Some(&out))
        .await
        .unwrap();

    assert!(path.starts_with(&out));
    assert!(path.exists());
}

#[cfg(feature = "pdf")]
#[tokio::test]
async fn test_pdf_export_is_a_pdf() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;
    let artifact = controller.export_report(0, ExportFormat::Pdf).unwrap();
    assert!(artifact.bytes.starts_with(b"%PDF"));
}

#[cfg(feature = "docx")]
#[tokio::test]
async fn test_docx_export_is_a_zip_package() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;
    let artifact = controller.export_report(0, ExportFormat::Docx).unwrap();
    assert!(artifact.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_dashboard_helpers() {
    let controller = analyzed(Arc::new(MockProvider::default())).await;

    let metrics = controller.dashboard_metrics(0).unwrap();
    assert_eq!(metrics.total_points, 3.0);
    assert_eq!(metrics.top_keyword.as_deref(), Some("battery"));

    let markdown = controller.copy_summary(0).unwrap();
    assert!(markdown.contains("Q1"));

    let svg = controller.sentiment_chart().unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Q2"));
}
