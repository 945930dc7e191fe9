// vigil-core/src/ports/store.rs

// What the scan engine needs from the relational store, without knowing which
// engine answers. The DuckDB adapter implements all three traits; tests plug
// in-memory fakes.

use async_trait::async_trait;

use crate::domain::compiler::{QueryDescriptor, SchemaCatalog};
use crate::domain::error::ExecutionError;
use crate::domain::rule::{Rule, RuleStatus};
use crate::domain::scan::DedupPolicy;
use crate::domain::violation::{Violation, ViolationCandidate, ViolationFilter, ViolationView};
use crate::error::VigilError;

/// One result row, one text value per projected column (`None` for NULL).
pub type ResultRow = Vec<Option<String>>;

#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn fetch_rules(&self, statuses: &[RuleStatus]) -> Result<Vec<Rule>, VigilError>;

    async fn get_rule(&self, rule_id: &str) -> Result<Option<Rule>, VigilError>;

    /// Inserts all rules or none.
    async fn insert_rules(&self, rules: &[Rule]) -> Result<(), VigilError>;
}

#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Tables and columns rules are allowed to reference.
    async fn load_catalog(&self) -> Result<SchemaCatalog, VigilError>;

    /// Runs a violation query away from the bookkeeping transaction, returning
    /// at most `max_rows` rows. A failure here must leave no state behind.
    /// Dropping the returned future must stop the statement it started.
    async fn run_isolated(
        &self,
        query: &QueryDescriptor,
        max_rows: usize,
    ) -> Result<Vec<ResultRow>, ExecutionError>;
}

#[async_trait]
pub trait ViolationSink: Send + Sync {
    /// Persists a whole pass in one transaction: every candidate is stored, or none.
    async fn persist(
        &self,
        candidates: &[ViolationCandidate],
        policy: DedupPolicy,
    ) -> Result<Vec<Violation>, VigilError>;

    /// Violations joined with their rule, newest first.
    async fn list_violations(&self, filter: &ViolationFilter)
    -> Result<Vec<ViolationView>, VigilError>;
}
