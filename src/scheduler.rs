use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{Id as TaskId, JoinSet};

use crate::client::{CompletionBackend, CompletionRequest};
use crate::config::RunConfig;
use crate::error::GustError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::progress::Progress;
use crate::table::Table;
use crate::template::Template;

/// Marker written to the output column when a row yields no result.
pub const EMPTY_MARKER: &str = "";

/// Explicit per-row result. Row tasks never propagate errors — a failed
/// completion or substitution becomes `Failed`, and the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Completed(String),
    Failed,
}

impl RowOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    fn into_cell(self) -> String {
        match self {
            Self::Completed(text) => text,
            Self::Failed => EMPTY_MARKER.to_string(),
        }
    }
}

/// Startup offset for row `i`: an approximate rate limit. Rows still
/// overlap in flight once each has waited its offset — the semaphore,
/// not the stagger, is what bounds concurrency.
pub fn stagger_delay(ordinal: usize, requests_per_minute: u32) -> Duration {
    // f64 keeps the offset monotonic for any table size; a u32 cast of
    // the ordinal would wrap and collapse the delay back to zero.
    Duration::from_secs_f64(ordinal as f64 * 60.0 / f64::from(requests_per_minute))
}

/// Apply `template` to every row of `table` via `client`, writing results
/// into `output_column` at their original ordinals. Completion order is
/// arbitrary; output order is input order.
pub async fn annotate<C>(
    client: Arc<C>,
    table: Table,
    template: &Template,
    config: &RunConfig,
    output_column: &str,
) -> Result<(Table, MetricsSnapshot), GustError>
where
    C: CompletionBackend + 'static,
{
    let total = table.len();
    let mut metrics = Metrics::start();
    let mut progress = Progress::new(total);
    let template = Arc::new(template.clone());
    let semaphore = Arc::new(Semaphore::new(config.max_workers));

    tracing::info!(
        rows = total,
        model = %config.model,
        max_workers = config.max_workers,
        requests_per_minute = config.requests_per_minute,
        "starting table annotation"
    );

    // All rows are staged immediately; the stagger sleep spreads dispatch
    // out and the semaphore bounds in-flight completions to max_workers.
    let mut set = JoinSet::new();
    let mut task_ordinals: HashMap<TaskId, usize> = HashMap::new();

    for ordinal in 0..total {
        let mut fields = table.fields(ordinal);
        // A prior run's output column must never leak into the prompt.
        fields.remove(output_column);

        let client = client.clone();
        let template = template.clone();
        let semaphore = semaphore.clone();
        let model = config.model.clone();
        let temperature = config.temperature;
        let delay = stagger_delay(ordinal, config.requests_per_minute);

        let handle = set.spawn(async move {
            tokio::time::sleep(delay).await;
            // The scheduler never closes the semaphore; a closed permit
            // means the run is tearing down, so the row just fails.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (ordinal, RowOutcome::Failed);
            };

            let prompt = match template.substitute(&fields) {
                Ok(prompt) => prompt,
                Err(e) => {
                    tracing::warn!(row = ordinal, error = %e, "row skipped: template substitution failed");
                    return (ordinal, RowOutcome::Failed);
                }
            };

            let req = CompletionRequest::new(&model, prompt, temperature, ordinal);
            match client.complete(&req).await {
                Ok(text) => (ordinal, RowOutcome::Completed(text)),
                Err(e) => {
                    tracing::warn!(row = ordinal, request_id = %req.request_id, error = %e, "row failed after retries");
                    (ordinal, RowOutcome::Failed)
                }
            }
        });
        task_ordinals.insert(handle.id(), ordinal);
    }

    // Single aggregation point: metrics and the result slots are only
    // touched here, in completion order, so no locking is needed.
    let mut results: Vec<Option<RowOutcome>> = vec![None; total];
    while let Some(joined) = set.join_next().await {
        let (ordinal, outcome) = match joined {
            Ok(done) => done,
            Err(join_err) => {
                // A panicked row task counts as a failed row, attributed
                // via the task-id map; it never aborts the run.
                tracing::error!("row task aborted: {join_err}");
                match task_ordinals.get(&join_err.id()) {
                    Some(&ordinal) => (ordinal, RowOutcome::Failed),
                    None => continue,
                }
            }
        };
        metrics.record(!outcome.is_failed());
        progress.tick();
        results[ordinal] = Some(outcome);
    }
    progress.finish();

    let cells: Vec<String> = results
        .into_iter()
        .map(|slot| slot.unwrap_or(RowOutcome::Failed).into_cell())
        .collect();

    let table = table.with_column(output_column, cells)?;
    let snapshot = metrics.finish();
    tracing::info!(
        processed = snapshot.processed,
        failed = snapshot.failed,
        elapsed_ms = snapshot.total_elapsed.as_millis() as u64,
        "table annotation finished"
    );
    Ok((table, snapshot))
}
