// vigil-core/src/domain/scan.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{CompileError, ExecutionError};
use crate::domain::violation::{Violation, ViolationCandidate};

/// What to do when a rescan finds a row that already has an open violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Insert a new violation on every scan.
    #[default]
    Append,
    /// Skip rows with an open violation for the same `(rule_id, table_name, record_id)`.
    SkipOpen,
}

/// Result of evaluating one rule in isolation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Matched {
        candidates: Vec<ViolationCandidate>,
        /// The row cap was reached; more violating rows may exist.
        truncated: bool,
    },
    CompileFailed(CompileError),
    ExecutionFailed(ExecutionError),
    /// Not started, or interrupted mid-query, because the scan was cancelled.
    Skipped,
}

impl RuleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched { .. } => "matched",
            Self::CompileFailed(_) => "compile_failed",
            Self::ExecutionFailed(ExecutionError::Timeout(_)) => "timed_out",
            Self::ExecutionFailed(_) => "execution_failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CompileFailed(_) | Self::ExecutionFailed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub rule_name: String,
    pub outcome: RuleOutcome,
}

/// Per-rule line of a [`ScanReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub rule_name: String,
    pub outcome: String,
    pub matched_rows: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RuleEvaluation> for RuleSummary {
    fn from(eval: &RuleEvaluation) -> Self {
        let (matched_rows, truncated, error) = match &eval.outcome {
            RuleOutcome::Matched {
                candidates,
                truncated,
            } => (candidates.len(), *truncated, None),
            RuleOutcome::CompileFailed(e) => (0, false, Some(e.to_string())),
            RuleOutcome::ExecutionFailed(e) => (0, false, Some(e.to_string())),
            RuleOutcome::Skipped => (0, false, None),
        };
        Self {
            rule_id: eval.rule_id.clone(),
            rule_name: eval.rule_name.clone(),
            outcome: eval.outcome.label().to_string(),
            matched_rows,
            truncated,
            error,
        }
    }
}

/// Reference to a violation created by a scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewViolationRef {
    pub id: String,
    pub rule: String,
    pub table_name: String,
    pub record_id: String,
}

/// Outcome of a committed scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub rules_evaluated: usize,
    pub rules_failed: usize,
    pub cancelled: bool,
    pub violations_found: usize,
    pub new_violations: Vec<NewViolationRef>,
    pub rules: Vec<RuleSummary>,
}

impl ScanReport {
    pub fn new(
        started_at: DateTime<Utc>,
        duration_ms: u128,
        evaluations: &[RuleEvaluation],
        persisted: &[Violation],
        cancelled: bool,
    ) -> Self {
        let rule_names: std::collections::HashMap<&str, &str> = evaluations
            .iter()
            .map(|e| (e.rule_id.as_str(), e.rule_name.as_str()))
            .collect();

        let new_violations = persisted
            .iter()
            .map(|v| NewViolationRef {
                id: v.id.clone(),
                rule: rule_names
                    .get(v.rule_id.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| v.rule_id.clone()),
                table_name: v.table_name.clone(),
                record_id: v.record_id.clone(),
            })
            .collect::<Vec<_>>();

        Self {
            started_at,
            duration_ms,
            rules_evaluated: evaluations
                .iter()
                .filter(|e| e.outcome != RuleOutcome::Skipped)
                .count(),
            rules_failed: evaluations.iter().filter(|e| e.outcome.is_failure()).count(),
            cancelled,
            violations_found: new_violations.len(),
            new_violations,
            rules: evaluations.iter().map(RuleSummary::from).collect(),
        }
    }

    /// Report for a pass that found no eligible rules.
    pub fn empty(started_at: DateTime<Utc>) -> Self {
        Self::new(started_at, 0, &[], &[], false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn eval(id: &str, outcome: RuleOutcome) -> RuleEvaluation {
        RuleEvaluation {
            rule_id: id.into(),
            rule_name: format!("rule {}", id),
            outcome,
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            RuleOutcome::ExecutionFailed(ExecutionError::Timeout(Duration::from_secs(1))).label(),
            "timed_out"
        );
        assert_eq!(RuleOutcome::Skipped.label(), "skipped");
        assert!(!RuleOutcome::Skipped.is_failure());
        assert!(RuleOutcome::CompileFailed(CompileError::MissingParameter("table".into())).is_failure());
    }

    #[test]
    fn test_report_counts() {
        let evaluations = vec![
            eval(
                "a",
                RuleOutcome::Matched {
                    candidates: vec![],
                    truncated: false,
                },
            ),
            eval(
                "b",
                RuleOutcome::CompileFailed(CompileError::UnsupportedRuleType("x".into())),
            ),
            eval("c", RuleOutcome::Skipped),
        ];
        let report = ScanReport::new(Utc::now(), 12, &evaluations, &[], true);
        assert_eq!(report.rules_evaluated, 2);
        assert_eq!(report.rules_failed, 1);
        assert_eq!(report.violations_found, 0);
        assert!(report.cancelled);
        assert_eq!(report.rules[1].outcome, "compile_failed");
        assert_eq!(
            report.rules[1].error.as_deref(),
            Some("Unsupported rule type 'x'")
        );
    }

    #[test]
    fn test_empty_report() {
        let report = ScanReport::empty(Utc::now());
        assert_eq!(report.violations_found, 0);
        assert!(report.rules.is_empty());
    }
}
