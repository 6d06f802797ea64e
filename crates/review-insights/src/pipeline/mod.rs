//! Pipeline module.
//!
//! This module provides the analysis controller and the pieces it runs on:
//! stage fan-out, progress reporting and run cancellation.

mod controller;
pub mod progress;
mod stage;

pub use controller::{
    AnalysisController, AnalysisControllerBuilder, CHAT_ERROR_REPLY, DRAFT_REPLY_ERROR,
    TREND_SELECTION_ERROR,
};
pub use progress::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
pub use stage::run_stage;
