// vigil-core/src/application/engine.rs

use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::application::cancel::CancellationToken;
use crate::domain::compiler::QueryDescriptor;
use crate::domain::error::ExecutionError;
use crate::ports::store::{QueryRunner, ResultRow};

/// Runs one violation query in isolation with a row cap and a deadline.
///
/// When the deadline passes or the token fires, the runner's future is dropped
/// right away. Runners interrupt their in-flight statement on drop
/// (`DuckDBStore` does it through the connection's interrupt handle), so the
/// query stops instead of finishing in the background.
#[instrument(
    skip(runner, query, cancel),
    fields(table = %query.target_table, binds = query.bind_parameters.len())
)]
pub async fn execute_isolated(
    runner: &dyn QueryRunner,
    query: &QueryDescriptor,
    max_rows: usize,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<ResultRow>, ExecutionError> {
    let start = Instant::now();
    debug!(sql = %query.sql_text, "Executing violation query");

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecutionError::Cancelled),
        res = tokio::time::timeout(deadline, runner.run_isolated(query, max_rows)) => {
            res.unwrap_or(Err(ExecutionError::Timeout(deadline)))
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(rows) => debug!(rows = rows.len(), "Query finished in {:.2?}", duration),
        Err(e) => debug!("Query failed after {:.2?}: {}", duration, e),
    }
    result
}
