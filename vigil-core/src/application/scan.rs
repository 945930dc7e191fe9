// vigil-core/src/application/scan.rs

use chrono::Utc;
use futures::StreamExt;
use miette::Diagnostic;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::application::cancel::CancellationToken;
use crate::application::engine::execute_isolated;
use crate::domain::compiler::{QueryCompiler, QueryDescriptor, SchemaCatalog};
use crate::domain::error::ExecutionError;
use crate::domain::rule::{Rule, RuleStatus};
use crate::domain::scan::{RuleEvaluation, RuleOutcome, ScanReport};
use crate::domain::violation::{Evidence, Severity, ViolationCandidate, explanation_for};
use crate::error::VigilError;
use crate::infrastructure::config::ScanConfig;
use crate::ports::store::{QueryRunner, ResultRow, RuleSource, ViolationSink};

/// Record id used when the primary-key column of an offending row is NULL.
pub const NULL_RECORD_ID: &str = "<null>";

/// Failures that abort a whole scan pass. Nothing is persisted when one occurs.
#[derive(Error, Debug, Diagnostic)]
pub enum ScanError {
    #[error("Store unavailable: {0}")]
    #[diagnostic(
        code(vigil::scan::store_unavailable),
        help("Check that the database path is correct and that `vigil init` has been run.")
    )]
    StoreUnavailable(#[source] VigilError),

    #[error("Failed to persist violations: {0}")]
    #[diagnostic(code(vigil::scan::persistence))]
    Persistence(#[source] VigilError),

    #[error("Scan cancelled before violations were persisted")]
    #[diagnostic(code(vigil::scan::cancelled))]
    Cancelled,
}

/// Runs every scannable rule against the store and records what it finds.
pub struct ScanEvaluator {
    rules: Arc<dyn RuleSource>,
    runner: Arc<dyn QueryRunner>,
    sink: Arc<dyn ViolationSink>,
    config: ScanConfig,
}

impl ScanEvaluator {
    pub fn new(
        rules: Arc<dyn RuleSource>,
        runner: Arc<dyn QueryRunner>,
        sink: Arc<dyn ViolationSink>,
        config: ScanConfig,
    ) -> Self {
        Self {
            rules,
            runner,
            sink,
            config,
        }
    }

    /// One scan pass: fetch rules, evaluate each in isolation, then persist
    /// every violation found in a single transaction.
    #[instrument(skip(self, cancel), fields(workers = self.config.max_workers))]
    pub async fn scan_all(&self, cancel: &CancellationToken) -> Result<ScanReport, ScanError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let rules = self
            .rules
            .fetch_rules(&RuleStatus::SCANNABLE)
            .await
            .map_err(ScanError::StoreUnavailable)?;
        if rules.is_empty() {
            info!("No scannable rules, nothing to do");
            return Ok(ScanReport::empty(started_at));
        }

        let catalog = self
            .runner
            .load_catalog()
            .await
            .map_err(ScanError::StoreUnavailable)?;
        info!(rules = rules.len(), tables = ?catalog.table_names().collect::<Vec<_>>(), "Starting scan pass");

        let tasks = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let catalog = &catalog;
                async move { (index, self.evaluate(rule, catalog, cancel).await) }
            });
        let mut indexed: Vec<(usize, RuleEvaluation)> = futures::stream::iter(tasks)
            .buffer_unordered(self.config.max_workers)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);
        let evaluations: Vec<RuleEvaluation> = indexed.into_iter().map(|(_, e)| e).collect();

        let cancelled = cancel.is_cancelled();
        if cancelled && !self.config.persist_on_cancel {
            warn!("Scan cancelled, discarding all results");
            return Err(ScanError::Cancelled);
        }

        let candidates: Vec<ViolationCandidate> = evaluations
            .iter()
            .flat_map(|e| match &e.outcome {
                RuleOutcome::Matched { candidates, .. } => candidates.clone(),
                _ => Vec::new(),
            })
            .collect();

        let persisted = self
            .sink
            .persist(&candidates, self.config.dedup)
            .await
            .map_err(ScanError::Persistence)?;

        let report = ScanReport::new(
            started_at,
            clock.elapsed().as_millis(),
            &evaluations,
            &persisted,
            cancelled,
        );
        info!(
            rules_evaluated = report.rules_evaluated,
            rules_failed = report.rules_failed,
            violations_found = report.violations_found,
            cancelled,
            "Scan pass committed in {}ms",
            report.duration_ms
        );
        Ok(report)
    }

    async fn evaluate(
        &self,
        rule: &Rule,
        catalog: &SchemaCatalog,
        cancel: &CancellationToken,
    ) -> RuleEvaluation {
        let outcome = self.outcome(rule, catalog, cancel).await;
        RuleEvaluation {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            outcome,
        }
    }

    async fn outcome(
        &self,
        rule: &Rule,
        catalog: &SchemaCatalog,
        cancel: &CancellationToken,
    ) -> RuleOutcome {
        if cancel.is_cancelled() {
            debug!(rule_id = %rule.id, "Skipping rule, scan cancelled");
            return RuleOutcome::Skipped;
        }

        let query = match QueryCompiler::new(catalog).compile(rule) {
            Ok(query) => query,
            Err(e) => {
                warn!(rule_id = %rule.id, rule_type = %rule.rule_type, error = %e, "Rule skipped: compile failed");
                return RuleOutcome::CompileFailed(e);
            }
        };

        // One row past the cap tells a full result apart from a cut one.
        let max_rows = self.config.max_rows_per_rule;
        match execute_isolated(
            self.runner.as_ref(),
            &query,
            max_rows.saturating_add(1),
            self.config.rule_timeout(),
            cancel,
        )
        .await
        {
            Ok(mut rows) => {
                let truncated = rows.len() > max_rows;
                rows.truncate(max_rows);
                if truncated {
                    warn!(rule_id = %rule.id, max_rows, "Row cap reached, more violations may exist");
                }
                RuleOutcome::Matched {
                    candidates: extract_candidates(rule, &query, rows),
                    truncated,
                }
            }
            Err(ExecutionError::Cancelled) => RuleOutcome::Skipped,
            Err(e) => {
                warn!(rule_id = %rule.id, error = %e, "Rule skipped: execution failed");
                RuleOutcome::ExecutionFailed(e)
            }
        }
    }
}

/// Turns result rows into violation candidates: the record id comes from the
/// primary-key column, the evidence is the whole projected row.
pub fn extract_candidates(
    rule: &Rule,
    query: &QueryDescriptor,
    rows: Vec<ResultRow>,
) -> Vec<ViolationCandidate> {
    let pk = query.primary_key_index();
    let explanation = explanation_for(&rule.description);

    rows.into_iter()
        .map(|row| {
            let record_id = row
                .get(pk)
                .cloned()
                .flatten()
                .unwrap_or_else(|| NULL_RECORD_ID.to_string());
            let evidence: Evidence = query
                .projected_columns
                .iter()
                .cloned()
                .zip(row.into_iter().map(|value| {
                    value.map_or(serde_json::Value::Null, serde_json::Value::String)
                }))
                .collect();
            ViolationCandidate {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                table_name: query.target_table.clone(),
                record_id,
                severity: Severity::default(),
                evidence,
                explanation: explanation.clone(),
            }
        })
        .collect()
}
