// vigil-core/src/application/compile.rs

use serde::Serialize;
use tracing::instrument;

use crate::domain::compiler::{QueryCompiler, QueryDescriptor};
use crate::domain::error::{CompileError, DomainError};
use crate::domain::rule::{Rule, RuleStatus};
use crate::error::VigilError;
use crate::ports::store::{QueryRunner, RuleSource};

/// Dry-run result for one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledRule {
    pub rule_id: String,
    pub rule_name: String,
    pub rule_type: String,
    #[serde(flatten)]
    pub result: CompileResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileResult {
    Query(QueryDescriptor),
    Error(String),
}

impl CompiledRule {
    fn new(rule: &Rule, result: Result<QueryDescriptor, CompileError>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            rule_type: rule.rule_type.clone(),
            result: match result {
                Ok(query) => CompileResult::Query(query),
                Err(e) => CompileResult::Error(e.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.result, CompileResult::Query(_))
    }
}

/// Compiles rules against the live catalog without running anything.
///
/// With `rule_id`, only that rule (whatever its status); otherwise every
/// scannable rule.
#[instrument(skip(rules, runner))]
pub async fn compile_rules(
    rules: &dyn RuleSource,
    runner: &dyn QueryRunner,
    rule_id: Option<&str>,
) -> Result<Vec<CompiledRule>, VigilError> {
    let selected = match rule_id {
        Some(id) => vec![
            rules
                .get_rule(id)
                .await?
                .ok_or_else(|| DomainError::RuleNotFound(id.to_string()))?,
        ],
        None => rules.fetch_rules(&RuleStatus::SCANNABLE).await?,
    };

    let catalog = runner.load_catalog().await?;
    let compiler = QueryCompiler::new(&catalog);
    Ok(selected
        .iter()
        .map(|rule| CompiledRule::new(rule, compiler.compile(rule)))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::DuckDBStore;
    use anyhow::Result;
    use chrono::Utc;
    use serde_json::json;

    fn rule(id: &str, rule_type: &str, parameters: serde_json::Value, status: RuleStatus) -> Rule {
        Rule {
            id: id.into(),
            name: id.into(),
            rule_type: rule_type.into(),
            description: String::new(),
            parameters,
            confidence_score: 0.5,
            status,
            created_at: Utc::now(),
            source_document: None,
        }
    }

    async fn store() -> Result<DuckDBStore> {
        let store = DuckDBStore::open(":memory:")?;
        store.execute_batch("CREATE TABLE orders (order_id INTEGER, total DOUBLE);")?;
        store
            .insert_rules(&[
                rule("ok", "threshold", json!({"table": "orders", "column": "total", "operator": "<=", "value": 500.0}), RuleStatus::Active),
                rule("bad", "threshold", json!({"table": "orders", "column": "total"}), RuleStatus::Pending),
                rule("off", "not_null", json!({"table": "orders", "column": "total"}), RuleStatus::Disabled),
            ])
            .await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_compile_all_scannable() -> Result<()> {
        let store = store().await?;
        let compiled = compile_rules(&store, &store, None).await?;
        assert_eq!(compiled.len(), 2);

        let ok = compiled.iter().find(|c| c.rule_id == "ok").unwrap();
        match &ok.result {
            CompileResult::Query(q) => {
                assert!(q.sql_text.ends_with("WHERE \"total\" > ?"));
            }
            CompileResult::Error(e) => panic!("unexpected error: {}", e),
        }
        let bad = compiled.iter().find(|c| c.rule_id == "bad").unwrap();
        assert_eq!(bad.result, CompileResult::Error("Missing parameter 'value'".into()));
        Ok(())
    }

    #[tokio::test]
    async fn test_compile_single_rule_ignores_status() -> Result<()> {
        let store = store().await?;
        let compiled = compile_rules(&store, &store, Some("off")).await?;
        assert_eq!(compiled.len(), 1);
        assert!(compiled[0].is_ok());

        let err = compile_rules(&store, &store, Some("ghost")).await.unwrap_err();
        assert!(matches!(err, VigilError::Domain(DomainError::RuleNotFound(_))));
        Ok(())
    }
}
