//! Application State Management
//!
//! Everything a dashboard renders lives in one [`AppState`] value. Actions
//! never mutate it piecemeal: they describe what happened as an
//! [`AppEvent`] and [`AppState::reduce`] applies it. The controller keeps
//! the state behind `Arc<RwLock<AppState>>` (`parking_lot`) and takes the
//! write lock only for the duration of a `reduce` call, never across an
//! `.await`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              AppState                                       │
//! ├─────────────────────────────────┬───────────────────────────────────────────┤
//! │  Inputs                         │  Analysis results                         │
//! │  - sources: Vec<ReviewSource>   │  - summaries: Option<Vec<Summary>>        │
//! │  - segment_column               │  - strategies: Option<Vec<..>>            │
//! │  - output_language              │  - persona_comparison                     │
//! │                                 │  - trend: Option<TrendReport>             │
//! ├─────────────────────────────────┼───────────────────────────────────────────┤
//! │  Selection                      │  Conversation                             │
//! │  - selected_report              │  - chat_history                           │
//! │  - comparison_indices (max 2)   │  - suggested_questions                    │
//! │                                 │  - deep_dive: Option<DeepDiveSlot>        │
//! ├─────────────────────────────────┼───────────────────────────────────────────┤
//! │  error: Option<String>          │  loading: LoadingFlags                    │
//! │                                 │  current_run: RunId                       │
//! └─────────────────────────────────┴───────────────────────────────────────────┘
//! ```
//!
//! # Superseded Runs
//!
//! Every analysis run is tagged with a [`RunId`]. Events carrying a run id
//! other than [`AppState::current_run`] are dropped by the reducer, so the
//! results of a run that was replaced by a newer one never reach the state.

use serde::Serialize;

use crate::config::InsightsConfig;
use crate::error::InsightsError;
use crate::ingest::template::SAMPLE_SEGMENT_COLUMN;
use crate::types::{
    ChatMessage, ChatSender, DeepDiveAnalysis, PersonaComparison, ReviewSource,
    StrategicAnalysis, Summary, TrendAnalysis,
};

/// Identifier of one analysis run. Zero means "no run started yet".
pub type RunId = u64;

/// Label of the first, empty source.
pub const INITIAL_SOURCE_LABEL: &str = "Pasted Source 1";

// ============================================================================
// SLOTS
// ============================================================================

/// Which operations are currently waiting on the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFlags {
    pub analysis: bool,
    pub trend: bool,
    pub chat: bool,
    pub questions: bool,
    pub deep_dive: bool,
    pub sample: bool,
}

/// Trend comparison between two reports, start first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub start_index: usize,
    pub end_index: usize,
    pub start_label: String,
    pub end_label: String,
    pub analysis: TrendAnalysis,
}

/// Inline slot for the most recent deep dive. Errors stay here rather
/// than in the global error slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepDiveSlot {
    pub topic: String,
    pub result: Option<DeepDiveAnalysis>,
    pub error: Option<String>,
}

/// Editable fields of a review source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceField {
    Label,
    Content,
    ProductContext,
    ReportDate,
}

// ============================================================================
// EVENTS
// ============================================================================

/// Something that happened. Applied to the state with [`AppState::reduce`].
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Replace every source (file upload, sheet import).
    SourcesLoaded(Vec<ReviewSource>),
    /// Append an empty pasted source.
    SourceAdded,
    SourceRemoved(usize),
    SourceEdited {
        index: usize,
        field: SourceField,
        value: String,
    },
    SegmentColumnChanged(String),
    LanguageChanged(String),

    /// A new run supersedes whatever ran before.
    RunStarted(RunId),
    /// Persona grouping replaced the sources for this run.
    PersonasGrouped {
        run: RunId,
        sources: Vec<ReviewSource>,
    },
    SummariesReady {
        run: RunId,
        summaries: Vec<Summary>,
    },
    StrategiesReady {
        run: RunId,
        strategies: Vec<StrategicAnalysis>,
    },
    PersonaComparisonReady {
        run: RunId,
        comparison: PersonaComparison,
    },
    RunFailed {
        run: RunId,
        message: String,
    },
    RunFinished(RunId),

    ReportSelected(usize),
    ComparisonToggled(usize),
    CompareCleared,

    // Follow-ups carry the run whose summaries they were asked about.
    TrendStarted(RunId),
    TrendReady {
        run: RunId,
        report: TrendReport,
    },
    TrendFailed {
        run: RunId,
        message: String,
    },

    ChatAsked {
        run: RunId,
        question: String,
    },
    ChatAnswered {
        run: RunId,
        answer: String,
    },
    QuestionsStarted(RunId),
    QuestionsSuggested {
        run: RunId,
        questions: Vec<String>,
    },
    QuestionsFailed(RunId),

    DeepDiveStarted {
        run: RunId,
        topic: String,
    },
    DeepDiveReady {
        run: RunId,
        analysis: DeepDiveAnalysis,
    },
    DeepDiveFailed {
        run: RunId,
        message: String,
    },

    SampleStarted,
    SampleLoaded(ReviewSource),
    SampleFailed(String),

    ErrorRaised(String),
    ErrorCleared,
}

impl AppEvent {
    /// The run this event belongs to, for run-scoped events.
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            Self::PersonasGrouped { run, .. }
            | Self::SummariesReady { run, .. }
            | Self::StrategiesReady { run, .. }
            | Self::PersonaComparisonReady { run, .. }
            | Self::RunFailed { run, .. }
            | Self::TrendReady { run, .. }
            | Self::TrendFailed { run, .. }
            | Self::ChatAsked { run, .. }
            | Self::ChatAnswered { run, .. }
            | Self::QuestionsSuggested { run, .. }
            | Self::DeepDiveStarted { run, .. }
            | Self::DeepDiveReady { run, .. }
            | Self::DeepDiveFailed { run, .. } => Some(*run),
            Self::RunFinished(run)
            | Self::TrendStarted(run)
            | Self::QuestionsStarted(run)
            | Self::QuestionsFailed(run) => Some(*run),
            _ => None,
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub sources: Vec<ReviewSource>,
    pub segment_column: String,
    pub output_language: String,

    pub summaries: Option<Vec<Summary>>,
    pub strategies: Option<Vec<StrategicAnalysis>>,
    pub persona_comparison: Option<PersonaComparison>,
    pub trend: Option<TrendReport>,

    pub selected_report: usize,
    pub comparison_indices: Vec<usize>,

    pub chat_history: Vec<ChatMessage>,
    pub suggested_questions: Vec<String>,
    pub deep_dive: Option<DeepDiveSlot>,

    pub error: Option<String>,
    pub loading: LoadingFlags,
    pub current_run: RunId,

    #[serde(skip)]
    max_sources: usize,
    #[serde(skip)]
    max_text_length: usize,
    #[serde(skip)]
    next_message_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&InsightsConfig::default())
    }
}

impl AppState {
    /// Fresh state with one empty pasted source.
    pub fn new(config: &InsightsConfig) -> Self {
        Self {
            sources: vec![ReviewSource::new(INITIAL_SOURCE_LABEL, "")],
            segment_column: config.segment_column.clone().unwrap_or_default(),
            output_language: config.output_language.clone(),
            summaries: None,
            strategies: None,
            persona_comparison: None,
            trend: None,
            selected_report: 0,
            comparison_indices: Vec::new(),
            chat_history: Vec::new(),
            suggested_questions: Vec::new(),
            deep_dive: None,
            error: None,
            loading: LoadingFlags::default(),
            current_run: 0,
            max_sources: config.max_files,
            max_text_length: config.max_text_length,
            next_message_id: 1,
        }
    }

    /// True when a trend can be requested: exactly two reports picked.
    pub fn compare_ready(&self) -> bool {
        self.comparison_indices.len() == 2
    }

    /// Display label of report `index`, falling back to "Report N".
    pub fn report_label(&self, index: usize) -> String {
        self.sources
            .get(index)
            .map(|s| s.label.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Report {}", index + 1))
    }

    /// The source behind the currently selected report.
    pub fn selected_source(&self) -> Option<&ReviewSource> {
        self.sources.get(self.selected_report)
    }

    /// Apply an event. Returns `false` if the event was ignored, either
    /// because it belongs to a superseded run or because it was rejected
    /// (for example adding a source past the limit).
    pub fn reduce(&mut self, event: AppEvent) -> bool {
        if let Some(run) = event.run_id()
            && run != self.current_run
        {
            return false;
        }

        match event {
            AppEvent::SourcesLoaded(sources) => {
                self.sources = sources;
                self.selected_report = 0;
                self.error = None;
            }
            AppEvent::SourceAdded => {
                if self.sources.len() >= self.max_sources {
                    self.error = Some(
                        InsightsError::TooManySources {
                            max: self.max_sources,
                        }
                        .to_string(),
                    );
                    return false;
                }
                let label = format!("Pasted Source {}", self.sources.len() + 1);
                self.sources.push(ReviewSource::new(label, ""));
            }
            AppEvent::SourceRemoved(index) => {
                if index >= self.sources.len() {
                    return false;
                }
                self.sources.remove(index);
                if self.sources.is_empty() {
                    self.sources.push(ReviewSource::new(INITIAL_SOURCE_LABEL, ""));
                }
            }
            AppEvent::SourceEdited {
                index,
                field,
                value,
            } => return self.edit_source(index, field, value),
            AppEvent::SegmentColumnChanged(column) => self.segment_column = column,
            AppEvent::LanguageChanged(language) => self.output_language = language,

            AppEvent::RunStarted(run) => {
                self.current_run = run;
                // Follow-ups still in flight belong to the old run.
                self.loading = LoadingFlags {
                    analysis: true,
                    sample: self.loading.sample,
                    ..LoadingFlags::default()
                };
                self.error = None;
                self.summaries = None;
                self.strategies = None;
                self.persona_comparison = None;
                self.trend = None;
                self.chat_history.clear();
                self.suggested_questions.clear();
                self.deep_dive = None;
                self.selected_report = 0;
                self.comparison_indices.clear();
            }
            AppEvent::PersonasGrouped { sources, .. } => self.sources = sources,
            AppEvent::SummariesReady { summaries, .. } => self.summaries = Some(summaries),
            AppEvent::StrategiesReady { strategies, .. } => self.strategies = Some(strategies),
            AppEvent::PersonaComparisonReady { comparison, .. } => {
                self.persona_comparison = Some(comparison)
            }
            AppEvent::RunFailed { message, .. } => {
                self.error = Some(message);
                self.loading.analysis = false;
            }
            AppEvent::RunFinished(_) => self.loading.analysis = false,

            AppEvent::ReportSelected(index) => {
                let count = self.summaries.as_ref().map_or(0, Vec::len);
                if index >= count {
                    return false;
                }
                self.selected_report = index;
            }
            AppEvent::ComparisonToggled(index) => {
                if let Some(pos) = self.comparison_indices.iter().position(|&i| i == index) {
                    self.comparison_indices.remove(pos);
                } else if self.comparison_indices.len() < 2 {
                    self.comparison_indices.push(index);
                } else {
                    return false;
                }
            }
            AppEvent::CompareCleared => self.comparison_indices.clear(),

            AppEvent::TrendStarted(_) => {
                self.loading.trend = true;
                self.error = None;
                self.trend = None;
            }
            AppEvent::TrendReady { report, .. } => {
                self.trend = Some(report);
                self.loading.trend = false;
                self.comparison_indices.clear();
            }
            AppEvent::TrendFailed { message, .. } => {
                self.error = Some(message);
                self.loading.trend = false;
            }

            AppEvent::ChatAsked { question, .. } => {
                self.push_message(ChatSender::User, question);
                self.loading.chat = true;
            }
            AppEvent::ChatAnswered { answer, .. } => {
                self.push_message(ChatSender::Ai, answer);
                self.loading.chat = false;
            }
            AppEvent::QuestionsStarted(_) => self.loading.questions = true,
            AppEvent::QuestionsSuggested { questions, .. } => {
                self.suggested_questions = questions;
                self.loading.questions = false;
            }
            AppEvent::QuestionsFailed(_) => self.loading.questions = false,

            AppEvent::DeepDiveStarted { topic, .. } => {
                self.error = None;
                self.loading.deep_dive = true;
                self.deep_dive = Some(DeepDiveSlot {
                    topic,
                    result: None,
                    error: None,
                });
            }
            AppEvent::DeepDiveReady { analysis, .. } => {
                self.loading.deep_dive = false;
                if let Some(slot) = self.deep_dive.as_mut() {
                    slot.result = Some(analysis);
                }
            }
            AppEvent::DeepDiveFailed { message, .. } => {
                self.loading.deep_dive = false;
                if let Some(slot) = self.deep_dive.as_mut() {
                    slot.error = Some(message);
                }
            }

            AppEvent::SampleStarted => {
                self.loading.sample = true;
                self.error = None;
            }
            AppEvent::SampleLoaded(source) => {
                self.sources = vec![source];
                self.segment_column = SAMPLE_SEGMENT_COLUMN.to_string();
                self.selected_report = 0;
                self.loading.sample = false;
            }
            AppEvent::SampleFailed(message) => {
                self.error = Some(message);
                self.loading.sample = false;
            }

            AppEvent::ErrorRaised(message) => self.error = Some(message),
            AppEvent::ErrorCleared => self.error = None,
        }
        true
    }

    fn edit_source(&mut self, index: usize, field: SourceField, value: String) -> bool {
        let limit = self.max_text_length;
        let Some(source) = self.sources.get_mut(index) else {
            return false;
        };

        match field {
            SourceField::Label => source.label = value,
            SourceField::ProductContext => source.product_context = Some(value),
            SourceField::ReportDate => source.report_date = Some(value),
            SourceField::Content => {
                if value.chars().count() > limit {
                    source.content = value.chars().take(limit).collect();
                    self.error = Some(InsightsError::TextTooLong { limit }.to_string());
                } else {
                    source.content = value;
                }
            }
        }
        true
    }

    fn push_message(&mut self, sender: ChatSender, text: String) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.chat_history.push(ChatMessage { id, sender, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SentimentPoint;
    use pretty_assertions::assert_eq;

    fn summary(positive: f64) -> Summary {
        Summary {
            sentiment: SentimentPoint::new(positive, 0.0, 0.0),
            ..Summary::default()
        }
    }

    fn trend_report() -> TrendReport {
        TrendReport {
            start_index: 0,
            end_index: 1,
            start_label: "Q1".to_string(),
            end_label: "Q2".to_string(),
            analysis: TrendAnalysis::default(),
        }
    }

    fn analysed_state(reports: usize) -> AppState {
        let mut state = AppState::default();
        state.reduce(AppEvent::RunStarted(1));
        state.reduce(AppEvent::SummariesReady {
            run: 1,
            summaries: (0..reports).map(|i| summary(i as f64)).collect(),
        });
        state.reduce(AppEvent::RunFinished(1));
        state
    }

    #[test]
    fn test_starts_with_one_empty_source() {
        let state = AppState::default();
        assert_eq!(state.sources.len(), 1);
        assert_eq!(state.sources[0].label, "Pasted Source 1");
        assert!(state.summaries.is_none());
        assert_eq!(state.current_run, 0);
    }

    #[test]
    fn test_add_source_stops_at_limit() {
        let mut state = AppState::default();
        for _ in 0..4 {
            assert!(state.reduce(AppEvent::SourceAdded));
        }
        assert_eq!(state.sources[4].label, "Pasted Source 5");

        assert!(!state.reduce(AppEvent::SourceAdded));
        assert_eq!(state.sources.len(), 5);
        assert_eq!(
            state.error.as_deref(),
            Some("You can have a maximum of 5 data sources.")
        );
    }

    #[test]
    fn test_removing_last_source_leaves_an_empty_one() {
        let mut state = AppState::default();
        assert!(state.reduce(AppEvent::SourceRemoved(0)));
        assert_eq!(state.sources.len(), 1);
        assert!(state.sources[0].is_blank());
        assert!(!state.reduce(AppEvent::SourceRemoved(3)));
    }

    #[test]
    fn test_oversized_content_is_truncated_with_error() {
        let config = InsightsConfig::builder().max_text_length(10).build().unwrap();
        let mut state = AppState::new(&config);

        state.reduce(AppEvent::SourceEdited {
            index: 0,
            field: SourceField::Content,
            value: "ééééééééééééééé".to_string(),
        });

        assert_eq!(state.sources[0].content.chars().count(), 10);
        assert_eq!(
            state.error.as_deref(),
            Some("Text is too large. The limit is 10 characters.")
        );
    }

    #[test]
    fn test_run_started_resets_results() {
        let mut state = analysed_state(2);
        state.reduce(AppEvent::ReportSelected(1));
        state.reduce(AppEvent::ChatAsked {
            run: 1,
            question: "Why?".to_string(),
        });
        state.reduce(AppEvent::ComparisonToggled(0));
        state.error = Some("old".to_string());

        state.reduce(AppEvent::RunStarted(2));

        assert_eq!(state.current_run, 2);
        assert!(state.loading.analysis);
        assert!(state.summaries.is_none());
        assert!(state.chat_history.is_empty());
        assert!(state.comparison_indices.is_empty());
        assert_eq!(state.selected_report, 0);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_events_from_superseded_run_are_dropped() {
        let mut state = AppState::default();
        state.reduce(AppEvent::RunStarted(1));
        state.reduce(AppEvent::RunStarted(2));

        let applied = state.reduce(AppEvent::SummariesReady {
            run: 1,
            summaries: vec![summary(9.0)],
        });
        assert!(!applied);
        assert!(state.summaries.is_none());

        assert!(!state.reduce(AppEvent::RunFinished(1)));
        assert!(state.loading.analysis);

        assert!(state.reduce(AppEvent::SummariesReady {
            run: 2,
            summaries: vec![summary(1.0)],
        }));
        assert_eq!(state.summaries.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_run_failure_keeps_committed_summaries() {
        let mut state = AppState::default();
        state.reduce(AppEvent::RunStarted(1));
        state.reduce(AppEvent::SummariesReady {
            run: 1,
            summaries: vec![summary(1.0)],
        });
        state.reduce(AppEvent::RunFailed {
            run: 1,
            message: "Failed to generate strategic analysis.".to_string(),
        });

        assert!(state.summaries.is_some());
        assert!(state.strategies.is_none());
        assert!(!state.loading.analysis);
        assert!(state.error.is_some());
    }

    #[test]
    fn test_comparison_toggle_caps_at_two() {
        let mut state = analysed_state(3);
        assert!(state.reduce(AppEvent::ComparisonToggled(2)));
        assert!(state.reduce(AppEvent::ComparisonToggled(0)));
        assert!(!state.reduce(AppEvent::ComparisonToggled(1)));
        assert_eq!(state.comparison_indices, vec![2, 0]);
        assert!(state.compare_ready());

        assert!(state.reduce(AppEvent::ComparisonToggled(2)));
        assert_eq!(state.comparison_indices, vec![0]);
        assert!(!state.compare_ready());
    }

    #[test]
    fn test_report_selection_is_bounded_by_summaries() {
        let mut state = analysed_state(2);
        assert!(state.reduce(AppEvent::ReportSelected(1)));
        assert!(!state.reduce(AppEvent::ReportSelected(2)));
        assert_eq!(state.selected_report, 1);
    }

    #[test]
    fn test_trend_ready_exits_compare_mode() {
        let mut state = analysed_state(2);
        state.reduce(AppEvent::ComparisonToggled(0));
        state.reduce(AppEvent::ComparisonToggled(1));
        state.reduce(AppEvent::TrendStarted(1));
        state.reduce(AppEvent::TrendReady {
            run: 1,
            report: trend_report(),
        });

        assert!(state.trend.is_some());
        assert!(state.comparison_indices.is_empty());
        assert!(!state.loading.trend);
    }

    #[test]
    fn test_follow_ups_from_superseded_run_are_dropped() {
        let mut state = analysed_state(2);
        state.reduce(AppEvent::TrendStarted(1));
        state.reduce(AppEvent::QuestionsStarted(1));
        state.reduce(AppEvent::RunStarted(2));
        assert!(!state.loading.trend);
        assert!(!state.loading.questions);

        assert!(!state.reduce(AppEvent::TrendReady {
            run: 1,
            report: trend_report(),
        }));
        assert!(!state.reduce(AppEvent::ChatAnswered {
            run: 1,
            answer: "late".to_string(),
        }));
        assert!(!state.reduce(AppEvent::QuestionsSuggested {
            run: 1,
            questions: vec!["late?".to_string()],
        }));
        assert!(!state.reduce(AppEvent::DeepDiveStarted {
            run: 1,
            topic: "battery".to_string(),
        }));

        assert!(state.trend.is_none());
        assert!(state.chat_history.is_empty());
        assert!(state.suggested_questions.is_empty());
        assert!(state.deep_dive.is_none());
    }

    #[test]
    fn test_chat_messages_get_increasing_ids() {
        let mut state = analysed_state(1);
        state.reduce(AppEvent::ChatAsked {
            run: 1,
            question: "What do users like?".to_string(),
        });
        assert!(state.loading.chat);
        state.reduce(AppEvent::ChatAnswered {
            run: 1,
            answer: "The sound.".to_string(),
        });

        let senders: Vec<_> = state.chat_history.iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![ChatSender::User, ChatSender::Ai]);
        assert!(state.chat_history[0].id < state.chat_history[1].id);
        assert!(!state.loading.chat);
    }

    #[test]
    fn test_deep_dive_errors_stay_inline() {
        let mut state = analysed_state(1);
        state.reduce(AppEvent::DeepDiveStarted {
            run: 1,
            topic: "battery".to_string(),
        });
        state.reduce(AppEvent::DeepDiveFailed {
            run: 1,
            message: "Failed to analyze \"battery\": timeout".to_string(),
        });

        let slot = state.deep_dive.as_ref().unwrap();
        assert_eq!(slot.topic, "battery");
        assert!(slot.error.as_deref().unwrap().contains("battery"));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_sample_presets_segment_column() {
        let mut state = AppState::default();
        state.reduce(AppEvent::SampleStarted);
        state.reduce(AppEvent::SampleLoaded(ReviewSource::new("Sample", "a,b")));

        assert_eq!(state.sources.len(), 1);
        assert_eq!(state.segment_column, "Customer Type");
        assert!(!state.loading.sample);
    }

    #[test]
    fn test_report_label_falls_back_to_position() {
        let mut state = AppState::default();
        state.reduce(AppEvent::SourcesLoaded(vec![
            ReviewSource::new("Q1 Reviews", "x"),
            ReviewSource::new("  ", "y"),
        ]));
        assert_eq!(state.report_label(0), "Q1 Reviews");
        assert_eq!(state.report_label(1), "Report 2");
        assert_eq!(state.report_label(7), "Report 8");
    }

    #[test]
    fn test_state_serializes_without_internal_counters() {
        let state = AppState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("chatHistory").is_some());
        assert!(json.get("nextMessageId").is_none());
        assert!(json.get("maxSources").is_none());
    }
}
