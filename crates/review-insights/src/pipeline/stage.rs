//! Fan-out execution of one analysis stage.
//!
//! A stage issues one request per input concurrently. Every request is
//! allowed to settle before the stage decides its outcome: the stage
//! succeeds only if all requests succeed, and otherwise fails with the
//! error of the lowest-indexed failing input. Results keep input order.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{InsightsError, Result};
use crate::pipeline::progress::{AnalysisStage, ProgressReporter, ProgressUpdate};

/// Run `task` once per input and collect the results in input order.
///
/// Progress is reported each time a request settles, successful or not.
pub async fn run_stage<I, T, F, Fut>(
    stage: AnalysisStage,
    inputs: Vec<I>,
    task: F,
    reporter: Option<&Arc<dyn ProgressReporter>>,
) -> Result<Vec<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let total = inputs.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    debug!("{}: issuing {} requests", stage.display_name(), total);
    if let Some(reporter) = reporter {
        reporter.report(ProgressUpdate::with_items(
            stage,
            0,
            total,
            format!("{}...", stage.display_name()),
        ));
    }

    let mut set = JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let fut = task(input);
        set.spawn(async move { (index, fut.await) });
    }

    let mut results: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
    let mut settled = 0usize;
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.map_err(|e| {
            InsightsError::Internal(format!("{} task failed: {e}", stage.display_name()))
        })?;
        results[index] = Some(result);
        settled += 1;

        if let Some(reporter) = reporter {
            reporter.report(ProgressUpdate::with_items(
                stage,
                settled,
                total,
                format!("{}: {} of {} settled", stage.display_name(), settled, total),
            ));
        }
    }

    let mut outputs = Vec::with_capacity(total);
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Some(Ok(value)) => outputs.push(value),
            Some(Err(e)) => {
                warn!("{} failed on input {}: {}", stage.display_name(), index, e);
                return Err(e);
            }
            None => {
                return Err(InsightsError::Internal(format!(
                    "{} lost the result for input {index}",
                    stage.display_name()
                )));
            }
        }
    }
    Ok(outputs)
}
