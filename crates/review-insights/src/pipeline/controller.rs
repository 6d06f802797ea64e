//! Analysis controller.
//!
//! The controller owns the [`AppState`] and sequences every external call.
//! An analysis run goes through these stages:
//!
//! 1. **Validation**: API key present, some review text supplied.
//! 2. **Persona grouping** (optional): the first source is split by the
//!    segment column and the resulting sources replace the loaded ones.
//! 3. **Summaries**: one request per source, concurrently. Committed only
//!    if every request succeeds.
//! 4. **Strategic analyses**: one request per summary, concurrently, with
//!    the same all-or-nothing rule.
//! 5. **Persona comparison** (optional): a single request, only when
//!    grouping ran and produced more than one summary.
//!
//! Starting a new run cancels the previous one. Requests already in flight
//! are not aborted; their results are tagged with the old run id and the
//! reducer drops them. Follow-ups (trends, chat, suggested questions, deep
//! dives) are tagged with the run whose summaries they were asked about,
//! so an answer arriving after a new run started is dropped the same way.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::ai::InsightsProvider;
use crate::config::InsightsConfig;
use crate::error::{InsightsError, Result, ResultExt};
use crate::ingest::template::{SAMPLE_LABEL, SAMPLE_PRODUCT_CONTEXT, SAMPLE_REPORT_DATE};
use crate::ingest::{PendingFile, SpreadsheetConverter, build_persona_sources};
use crate::pipeline::progress::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::stage::run_stage;
use crate::report::{
    DashboardMetrics, ExportArtifact, ExportFormat, RendererRegistry, ReportData,
    sentiment_trend_svg, summary_markdown,
};
use crate::state::{AppEvent, AppState, RunId, SourceField, TrendReport};
use crate::types::{DeepDiveAnalysis, ReviewSource, SegmentSummary, SentimentPoint, Summary};

/// AI message shown when a chat answer fails.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error trying to answer your question.";

/// Text returned when a reply draft fails.
pub const DRAFT_REPLY_ERROR: &str = "Sorry, I was unable to generate a reply at this time.";

/// Message for a trend request without exactly two valid reports.
pub const TREND_SELECTION_ERROR: &str = "Please select exactly two reports to analyze trends.";

/// What a run works on, copied out of the state when it starts.
struct RunInput {
    sources: Vec<ReviewSource>,
    segment_column: String,
    language: String,
}

/// The two summaries a trend request compares, start first.
struct TrendSelection {
    run: RunId,
    start_index: usize,
    end_index: usize,
    start: Summary,
    end: Summary,
    start_label: String,
    end_label: String,
    language: String,
}

/// The selected report's material for a follow-up question.
struct FollowUpInput {
    run: RunId,
    reviews: String,
    context: String,
    language: String,
}

/// Orchestrates ingestion, analysis runs, follow-up questions and exports.
///
/// Use [`AnalysisController::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use review_insights::ai::GeminiProvider;
/// use review_insights::pipeline::AnalysisController;
/// use std::sync::Arc;
///
/// let controller = AnalysisController::builder()
///     .provider(Arc::new(GeminiProvider::new(api_key)?))
///     .on_progress(|update| println!("{}", update.message))
///     .build();
///
/// controller.load_files(vec!["reviews.csv".into()]).await?;
/// controller.run_analysis().await?;
/// let artifact = controller.export_report(0, ExportFormat::Pdf)?;
/// ```
pub struct AnalysisController {
    config: InsightsConfig,
    provider: RwLock<Option<Arc<dyn InsightsProvider>>>,
    state: Arc<RwLock<AppState>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    converter: Option<Arc<dyn SpreadsheetConverter>>,
    renderers: RendererRegistry,
    http: reqwest::Client,
    run_counter: AtomicU64,
    active_token: Mutex<Option<CancellationToken>>,
}

static_assertions::assert_impl_all!(AnalysisController: Send, Sync);

impl AnalysisController {
    pub fn builder() -> AnalysisControllerBuilder {
        AnalysisControllerBuilder::default()
    }

    // ========================================================================
    // STATE ACCESS
    // ========================================================================

    /// A copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }

    /// Shared handle to the state, for front ends that render it live.
    pub fn state_handle(&self) -> Arc<RwLock<AppState>> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Install or replace the provider, e.g. after an API key was saved.
    pub fn set_provider(&self, provider: Arc<dyn InsightsProvider>) {
        *self.provider.write() = Some(provider);
    }

    fn dispatch(&self, event: AppEvent) -> bool {
        self.state.write().reduce(event)
    }

    /// Store `error` in the error slot and hand it back.
    fn fail(&self, error: InsightsError) -> InsightsError {
        if !error.is_cancelled() {
            self.dispatch(AppEvent::ErrorRaised(error.to_string()));
        }
        error
    }

    fn provider(&self) -> Result<Arc<dyn InsightsProvider>> {
        self.provider
            .read()
            .clone()
            .ok_or(InsightsError::MissingApiKey)
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    // ========================================================================
    // SOURCES
    // ========================================================================

    /// Append an empty pasted source.
    pub fn add_source(&self) -> Result<()> {
        if self.dispatch(AppEvent::SourceAdded) {
            Ok(())
        } else {
            Err(InsightsError::TooManySources {
                max: self.config.max_files,
            })
        }
    }

    pub fn remove_source(&self, index: usize) -> Result<()> {
        if self.dispatch(AppEvent::SourceRemoved(index)) {
            Ok(())
        } else {
            Err(InsightsError::InvalidSelection(format!(
                "No source at position {}",
                index + 1
            )))
        }
    }

    /// Edit one field of a source. Content over the character limit is
    /// truncated and the limit error is shown in the error slot.
    pub fn update_source(
        &self,
        index: usize,
        field: SourceField,
        value: impl Into<String>,
    ) -> Result<()> {
        let applied = self.dispatch(AppEvent::SourceEdited {
            index,
            field,
            value: value.into(),
        });
        if applied {
            Ok(())
        } else {
            Err(InsightsError::InvalidSelection(format!(
                "No source at position {}",
                index + 1
            )))
        }
    }

    /// Replace all sources.
    pub fn set_sources(&self, sources: Vec<ReviewSource>) -> Result<()> {
        if sources.len() > self.config.max_files {
            return Err(self.fail(InsightsError::TooManySources {
                max: self.config.max_files,
            }));
        }
        let limit = self.config.max_text_length;
        if sources.iter().any(|s| s.content.chars().count() > limit) {
            return Err(self.fail(InsightsError::TextTooLong { limit }));
        }
        self.dispatch(AppEvent::SourcesLoaded(sources));
        Ok(())
    }

    /// Blank disables persona analysis.
    pub fn set_segment_column(&self, column: impl Into<String>) {
        self.dispatch(AppEvent::SegmentColumnChanged(column.into()));
    }

    pub fn set_output_language(&self, language: impl Into<String>) {
        self.dispatch(AppEvent::LanguageChanged(language.into()));
    }

    /// Read uploaded files into sources, replacing the current ones.
    ///
    /// Count, size and type are checked from metadata before anything is
    /// read; any failure leaves the sources untouched.
    pub async fn load_files(&self, paths: Vec<PathBuf>) -> Result<usize> {
        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(PendingFile::from_path(path).await.map_err(|e| self.fail(e))?);
        }
        self.load_pending(files).await
    }

    /// Like [`load_files`](Self::load_files), for files already described.
    pub async fn load_pending(&self, files: Vec<PendingFile>) -> Result<usize> {
        let sources = crate::ingest::read_batch(files, &self.config, self.converter.clone())
            .await
            .map_err(|e| self.fail(e))?;
        let count = sources.len();
        if count > 0 {
            self.dispatch(AppEvent::SourcesLoaded(sources));
        }
        Ok(count)
    }

    /// Import a published spreadsheet as the only source.
    pub async fn fetch_sheet(&self, url: &str) -> Result<()> {
        let source =
            crate::ingest::fetch_sheet(&self.http, url, self.config.max_text_length)
                .await
                .map_err(|e| self.fail(e))?;
        self.dispatch(AppEvent::SourcesLoaded(vec![source]));
        Ok(())
    }

    /// Ask the model for a sample review set and load it as the only source,
    /// with the segment column preset for persona analysis.
    pub async fn generate_sample_data(&self) -> Result<()> {
        let provider = self.provider().map_err(|e| self.fail(e))?;
        self.dispatch(AppEvent::SampleStarted);

        match provider.sample_reviews().await {
            Ok(csv) => {
                let source = ReviewSource::new(SAMPLE_LABEL, csv.trim())
                    .with_context(SAMPLE_PRODUCT_CONTEXT)
                    .with_report_date(SAMPLE_REPORT_DATE);
                self.dispatch(AppEvent::SampleLoaded(source));
                info!("Loaded sample review data");
                Ok(())
            }
            Err(e) => {
                self.dispatch(AppEvent::SampleFailed(e.to_string()));
                Err(e)
            }
        }
    }

    // ========================================================================
    // ANALYSIS RUN
    // ========================================================================

    /// Run the full analysis over the current sources.
    ///
    /// # Errors
    ///
    /// - [`InsightsError::MissingApiKey`] / [`InsightsError::NoReviewData`]
    ///   before anything is sent
    /// - persona grouping errors, before any request
    /// - the first failing request of a stage
    /// - [`InsightsError::Cancelled`] when a newer run superseded this one
    pub async fn run_analysis(&self) -> Result<()> {
        let provider = self.provider().map_err(|e| self.fail(e))?;

        let input = {
            let state = self.state.read();
            RunInput {
                sources: state.sources.clone(),
                segment_column: state.segment_column.trim().to_string(),
                language: state.output_language.clone(),
            }
        };
        if input.sources.iter().all(ReviewSource::is_blank) {
            return Err(self.fail(InsightsError::NoReviewData));
        }

        let (run, token) = self.begin_run();
        info!("Starting analysis run {} over {} sources", run, input.sources.len());
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Validating,
            1.0,
            "Input validated",
        ));

        match self.execute_run(run, &token, provider, input).await {
            Ok(()) => {
                self.dispatch(AppEvent::RunFinished(run));
                self.report_progress(ProgressUpdate::complete("Analysis complete"));
                info!("Analysis run {} complete", run);
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                self.report_progress(ProgressUpdate::cancelled());
                debug!("Analysis run {} superseded", run);
                Err(e)
            }
            Err(e) => {
                self.dispatch(AppEvent::RunFailed {
                    run,
                    message: e.to_string(),
                });
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Analysis run {} failed: {}", run, e);
                Err(e)
            }
        }
    }

    /// Cancel whatever runs now and register a new run.
    fn begin_run(&self) -> (RunId, CancellationToken) {
        let run = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = self.active_token.lock().replace(token.clone()) {
            previous.cancel();
        }
        self.dispatch(AppEvent::RunStarted(run));
        (run, token)
    }

    async fn execute_run(
        &self,
        run: RunId,
        token: &CancellationToken,
        provider: Arc<dyn InsightsProvider>,
        input: RunInput,
    ) -> Result<()> {
        let RunInput {
            mut sources,
            segment_column,
            language,
        } = input;

        let persona_mode = !segment_column.is_empty();
        if persona_mode {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::PersonaGrouping,
                0.0,
                format!("Grouping reviews by '{segment_column}'"),
            ));
            sources = build_persona_sources(&sources[0], &segment_column, &self.config.review_column)
                .context("Persona analysis failed")?;
            self.dispatch(AppEvent::PersonasGrouped {
                run,
                sources: sources.clone(),
            });
        }
        check_cancelled(token)?;

        let summary_inputs: Vec<(String, String)> = sources
            .iter()
            .map(|s| (s.content.clone(), s.context_or_empty().to_string()))
            .collect();
        let summaries = {
            let provider = Arc::clone(&provider);
            let language = language.clone();
            run_stage(
                AnalysisStage::Summarizing,
                summary_inputs,
                move |(reviews, context)| {
                    let provider = Arc::clone(&provider);
                    let language = language.clone();
                    async move { provider.summarize(&reviews, &language, &context).await }
                },
                self.progress_reporter.as_ref(),
            )
            .await?
        };
        check_cancelled(token)?;
        self.dispatch(AppEvent::SummariesReady {
            run,
            summaries: summaries.clone(),
        });

        let strategies = {
            let provider = Arc::clone(&provider);
            let language = language.clone();
            run_stage(
                AnalysisStage::StrategicAnalysis,
                summaries.clone(),
                move |summary| {
                    let provider = Arc::clone(&provider);
                    let language = language.clone();
                    async move { provider.strategic_analysis(&summary, &language).await }
                },
                self.progress_reporter.as_ref(),
            )
            .await?
        };
        check_cancelled(token)?;
        self.dispatch(AppEvent::StrategiesReady { run, strategies });

        if persona_mode && summaries.len() > 1 {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::PersonaComparison,
                0.0,
                format!("Comparing {} personas", summaries.len()),
            ));
            let segments: Vec<SegmentSummary<'_>> = sources
                .iter()
                .zip(&summaries)
                .map(|(source, summary)| SegmentSummary {
                    segment: source.label.as_str(),
                    summary,
                })
                .collect();
            let comparison = provider.persona_comparison(&segments, &language).await?;
            check_cancelled(token)?;
            self.dispatch(AppEvent::PersonaComparisonReady { run, comparison });
        }

        Ok(())
    }

    // ========================================================================
    // REPORT NAVIGATION & TRENDS
    // ========================================================================

    pub fn select_report(&self, index: usize) -> Result<()> {
        if self.dispatch(AppEvent::ReportSelected(index)) {
            Ok(())
        } else {
            Err(InsightsError::InvalidSelection(format!(
                "No report at position {}",
                index + 1
            )))
        }
    }

    /// Add `index` to the trend pair, or remove it if already picked.
    /// Returns `false` when the pair is already full.
    pub fn toggle_comparison(&self, index: usize) -> bool {
        self.dispatch(AppEvent::ComparisonToggled(index))
    }

    pub fn clear_comparison(&self) {
        self.dispatch(AppEvent::CompareCleared);
    }

    /// Compare the two picked reports, earlier index first.
    pub async fn run_trend_analysis(&self) -> Result<TrendReport> {
        let provider = self.provider().map_err(|e| self.fail(e))?;

        let selection = {
            let state = self.state.read();
            match (state.summaries.as_ref(), state.comparison_indices.as_slice()) {
                (Some(summaries), &[a, b])
                    if a != b && a < summaries.len() && b < summaries.len() =>
                {
                    let (a, b) = (a.min(b), a.max(b));
                    Some(TrendSelection {
                        run: state.current_run,
                        start_index: a,
                        end_index: b,
                        start: summaries[a].clone(),
                        end: summaries[b].clone(),
                        start_label: state.report_label(a),
                        end_label: state.report_label(b),
                        language: state.output_language.clone(),
                    })
                }
                _ => None,
            }
        };
        let Some(selection) = selection else {
            return Err(self.fail(InsightsError::InvalidSelection(
                TREND_SELECTION_ERROR.to_string(),
            )));
        };

        let run = selection.run;
        self.dispatch(AppEvent::TrendStarted(run));
        info!(
            "Trend analysis: '{}' -> '{}'",
            selection.start_label, selection.end_label
        );

        match provider
            .trend_analysis(
                &selection.start,
                &selection.end,
                &selection.start_label,
                &selection.end_label,
                &selection.language,
            )
            .await
        {
            Ok(analysis) => {
                let report = TrendReport {
                    start_index: selection.start_index,
                    end_index: selection.end_index,
                    start_label: selection.start_label,
                    end_label: selection.end_label,
                    analysis,
                };
                let applied = self.dispatch(AppEvent::TrendReady {
                    run,
                    report: report.clone(),
                });
                superseded(applied, "Trend analysis", run)?;
                Ok(report)
            }
            Err(e) => {
                let applied = self.dispatch(AppEvent::TrendFailed {
                    run,
                    message: e.to_string(),
                });
                superseded(applied, "Trend analysis", run)?;
                Err(e)
            }
        }
    }

    // ========================================================================
    // FOLLOW-UPS
    // ========================================================================

    /// The selected source's reviews and context, once summaries exist.
    fn selected_material(&self) -> Result<FollowUpInput> {
        let state = self.state.read();
        if state.summaries.is_none() {
            return Err(InsightsError::InvalidSelection(
                "Run an analysis first.".to_string(),
            ));
        }
        let source = state.selected_source().ok_or_else(|| {
            InsightsError::InvalidSelection("No report is selected.".to_string())
        })?;
        Ok(FollowUpInput {
            run: state.current_run,
            reviews: source.content.clone(),
            context: source.context_or_empty().to_string(),
            language: state.output_language.clone(),
        })
    }

    /// Ask a free-form question about the selected report.
    ///
    /// The user message and the answer are appended to the chat history.
    /// A failed request still yields an answer: a fixed apology.
    pub async fn ask_question(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(InsightsError::InvalidSelection(
                "Question cannot be empty.".to_string(),
            ));
        }
        let provider = self.provider()?;
        let input = self.selected_material()?;
        let run = input.run;

        self.dispatch(AppEvent::ChatAsked {
            run,
            question: question.to_string(),
        });
        let answer = match provider
            .answer_question(&input.reviews, question, &input.language, &input.context)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                CHAT_ERROR_REPLY.to_string()
            }
        };
        let applied = self.dispatch(AppEvent::ChatAnswered {
            run,
            answer: answer.clone(),
        });
        superseded(applied, "Chat answer", run)?;
        Ok(answer)
    }

    /// Three suggested questions for the selected report.
    pub async fn suggest_questions(&self) -> Result<Vec<String>> {
        let provider = self.provider()?;
        let input = self.selected_material()?;
        let run = input.run;

        self.dispatch(AppEvent::QuestionsStarted(run));
        match provider.suggest_questions(&input.reviews, &input.context).await {
            Ok(questions) => {
                let applied = self.dispatch(AppEvent::QuestionsSuggested {
                    run,
                    questions: questions.clone(),
                });
                superseded(applied, "Suggested questions", run)?;
                Ok(questions)
            }
            Err(e) => {
                self.dispatch(AppEvent::QuestionsFailed(run));
                Err(e)
            }
        }
    }

    /// Focused analysis of one keyword or theme in the selected report.
    /// Failures land in the deep-dive slot, not the global error slot.
    pub async fn deep_dive(&self, topic: &str) -> Result<DeepDiveAnalysis> {
        let provider = self.provider()?;
        let input = self.selected_material()?;
        let run = input.run;

        self.dispatch(AppEvent::DeepDiveStarted {
            run,
            topic: topic.to_string(),
        });
        match provider
            .deep_dive(&input.reviews, topic, &input.language, &input.context)
            .await
        {
            Ok(analysis) => {
                let applied = self.dispatch(AppEvent::DeepDiveReady {
                    run,
                    analysis: analysis.clone(),
                });
                superseded(applied, "Deep dive", run)?;
                Ok(analysis)
            }
            Err(e) => {
                self.dispatch(AppEvent::DeepDiveFailed {
                    run,
                    message: format!("Failed to analyze \"{topic}\": {e}"),
                });
                Err(e)
            }
        }
    }

    /// Draft a customer-service reply to a complaint. A failed request
    /// yields a fixed apology instead of an error.
    pub async fn draft_reply(&self, complaint: &str) -> Result<String> {
        let provider = self.provider()?;
        let (context, language) = {
            let state = self.state.read();
            let context = state
                .selected_source()
                .map(|s| s.context_or_empty().to_string())
                .unwrap_or_default();
            (context, state.output_language.clone())
        };

        match provider.draft_reply(complaint, &language, &context).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!("Reply draft failed: {}", e);
                Ok(DRAFT_REPLY_ERROR.to_string())
            }
        }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    fn report_data(&self, index: usize, now: &DateTime<Local>) -> Result<ReportData> {
        let state = self.state.read();
        ReportData::build(
            &state.sources,
            state.summaries.as_deref(),
            state.strategies.as_deref(),
            index,
            now,
        )
        .ok_or_else(|| {
            InsightsError::InvalidSelection(format!("No complete report at position {}", index + 1))
        })
    }

    /// Render report `index` in `format`.
    pub fn export_report(&self, index: usize, format: ExportFormat) -> Result<ExportArtifact> {
        let now = Local::now();
        let report = self.report_data(index, &now).map_err(|e| self.fail(e))?;
        self.renderers
            .render(&report, format, now.date_naive())
            .map_err(|e| self.fail(e))
    }

    /// Render and write report `index` into `dir` (the configured output
    /// directory when `None`). Returns the written path.
    pub async fn write_report(
        &self,
        index: usize,
        format: ExportFormat,
        dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let artifact = self.export_report(index, format)?;
        let dir = dir.unwrap_or(self.config.output_dir.as_path());
        tokio::fs::create_dir_all(dir)
            .await
            .context(format!("Failed to create {}", dir.display()))?;
        let path = dir.join(&artifact.file_name);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .context(format!("Failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
        Ok(path)
    }

    /// Markdown summary of report `index`, for the clipboard.
    pub fn copy_summary(&self, index: usize) -> Option<String> {
        let state = self.state.read();
        let summary = state.summaries.as_ref()?.get(index)?;
        Some(summary_markdown(&state.report_label(index), summary))
    }

    /// Headline numbers for report `index`.
    pub fn dashboard_metrics(&self, index: usize) -> Option<DashboardMetrics> {
        let state = self.state.read();
        let summary = state.summaries.as_ref()?.get(index)?;
        Some(DashboardMetrics::from_summary(summary))
    }

    /// SVG chart of sentiment across every report.
    pub fn sentiment_chart(&self) -> Option<String> {
        let state = self.state.read();
        let summaries = state.summaries.as_ref()?;
        let points: Vec<(String, SentimentPoint)> = summaries
            .iter()
            .enumerate()
            .map(|(i, s)| (state.report_label(i), s.sentiment))
            .collect();
        Some(sentiment_trend_svg(&points))
    }
}

fn check_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(InsightsError::Cancelled);
    }
    Ok(())
}

/// Turn a follow-up result the reducer dropped into [`InsightsError::Cancelled`].
fn superseded(applied: bool, what: &str, run: RunId) -> Result<()> {
    if applied {
        return Ok(());
    }
    debug!("{} for run {} discarded: a newer run started", what, run);
    Err(InsightsError::Cancelled)
}

/// Builder for [`AnalysisController`].
#[derive(Default)]
pub struct AnalysisControllerBuilder {
    config: Option<InsightsConfig>,
    provider: Option<Arc<dyn InsightsProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    converter: Option<Option<Arc<dyn SpreadsheetConverter>>>,
    renderers: Option<RendererRegistry>,
    http: Option<reqwest::Client>,
}

static_assertions::assert_impl_all!(AnalysisControllerBuilder: Send);

impl AnalysisControllerBuilder {
    /// Limits, language and output settings. Defaults to
    /// [`InsightsConfig::default()`].
    pub fn config(mut self, config: InsightsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The analysis backend. Without one, every model call fails with
    /// [`InsightsError::MissingApiKey`].
    pub fn provider(mut self, provider: Arc<dyn InsightsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Convenience for [`progress_reporter`](Self::progress_reporter) with a closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Spreadsheet converter. `None` disables spreadsheet uploads; when
    /// never called, the compiled-in default is used.
    pub fn spreadsheet_converter(mut self, converter: Option<Arc<dyn SpreadsheetConverter>>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Export renderers. Defaults to [`RendererRegistry::with_defaults()`].
    pub fn renderers(mut self, renderers: RendererRegistry) -> Self {
        self.renderers = Some(renderers);
        self
    }

    /// HTTP client used for spreadsheet imports.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn build(self) -> AnalysisController {
        let config = self.config.unwrap_or_default();
        AnalysisController {
            state: Arc::new(RwLock::new(AppState::new(&config))),
            config,
            provider: RwLock::new(self.provider),
            progress_reporter: self.progress_reporter,
            converter: self
                .converter
                .unwrap_or_else(crate::ingest::default_converter),
            renderers: self.renderers.unwrap_or_else(RendererRegistry::with_defaults),
            http: self.http.unwrap_or_default(),
            run_counter: AtomicU64::new(0),
            active_token: Mutex::new(None),
        }
    }
}
