// vigil-core/src/domain/compiler/mod.rs

pub mod builder;
pub mod catalog;
pub mod quoter;
pub mod shapes;

pub use builder::{Predicate, ViolationQueryBuilder};
pub use catalog::{SchemaCatalog, TableSchema};
pub use quoter::UniversalQuoter;
pub use shapes::ViolationShape;

use serde::Serialize;
use std::fmt;

use crate::domain::error::CompileError;
use crate::domain::rule::{Rule, RuleSpec};

/// A literal that is bound to a placeholder, never spliced into SQL text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlLiteral {
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Everything needed to run one rule's violation query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    /// A single `SELECT` with one `?` per entry of `bind_parameters`.
    pub sql_text: String,
    pub bind_parameters: Vec<SqlLiteral>,
    pub target_table: String,
    /// Selected columns, each rendered as text, in table order.
    pub projected_columns: Vec<String>,
    /// Column whose value identifies an offending row.
    pub primary_key_hint: String,
}

impl QueryDescriptor {
    /// The query with a row cap appended. The cap is configuration, not rule input.
    pub fn limited_sql(&self, max_rows: usize) -> String {
        format!("{} LIMIT {}", self.sql_text, max_rows)
    }

    pub fn primary_key_index(&self) -> usize {
        self.projected_columns
            .iter()
            .position(|c| c == &self.primary_key_hint)
            .unwrap_or(0)
    }
}

/// Pure translation from rules to violation queries.
pub struct QueryCompiler<'a> {
    catalog: &'a SchemaCatalog,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self { catalog }
    }

    pub fn compile(&self, rule: &Rule) -> Result<QueryDescriptor, CompileError> {
        self.compile_spec(&rule.spec()?)
    }

    pub fn compile_spec(&self, spec: &RuleSpec) -> Result<QueryDescriptor, CompileError> {
        let shape = spec.shape();
        let query = ViolationQueryBuilder::new(self.catalog, shape.target())?;
        let predicate = shape.violation(&query)?;
        query.filter(predicate).build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::rule::RuleStatus;
    use chrono::Utc;
    use serde_json::json;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
            .with_table("customers", &["customer_id", "age", "email", "zip"])
            .with_table("employees", &["employee_id", "joined", "trained"])
    }

    fn rule(rule_type: &str, parameters: serde_json::Value) -> Rule {
        Rule {
            id: "r-1".into(),
            name: "test".into(),
            rule_type: rule_type.into(),
            description: "test rule".into(),
            parameters,
            confidence_score: 0.5,
            status: RuleStatus::Active,
            created_at: Utc::now(),
            source_document: None,
        }
    }

    fn compile(rule_type: &str, parameters: serde_json::Value) -> Result<QueryDescriptor, CompileError> {
        let catalog = catalog();
        QueryCompiler::new(&catalog).compile(&rule(rule_type, parameters))
    }

    #[test]
    fn test_threshold_selects_inverse_condition() {
        let q = compile(
            "threshold",
            json!({"table": "customers", "column": "age", "operator": ">=", "value": 18}),
        )
        .unwrap();
        assert!(q.sql_text.ends_with("FROM \"customers\" WHERE \"age\" < ?"));
        assert_eq!(q.bind_parameters, vec![SqlLiteral::Integer(18)]);
        assert_eq!(q.primary_key_hint, "customer_id");
        assert_eq!(q.primary_key_index(), 0);
    }

    #[test]
    fn test_date_difference_shape() {
        let q = compile(
            "date_difference",
            json!({"table": "employees", "date_col_1": "joined", "date_col_2": "trained", "max_days": 30}),
        )
        .unwrap();
        assert!(q.sql_text.ends_with("WHERE date_diff('day', \"joined\", \"trained\") > ?"));
        assert_eq!(q.bind_parameters, vec![SqlLiteral::Integer(30)]);
    }

    #[test]
    fn test_not_null_shape() {
        let q = compile("not_null", json!({"table": "customers", "column": "email"})).unwrap();
        assert!(q.sql_text.ends_with(
            "WHERE (\"email\" IS NULL OR CAST(\"email\" AS VARCHAR) = '')"
        ));
    }

    #[test]
    fn test_pattern_binds_regex() {
        let q = compile(
            "pattern",
            json!({"table": "customers", "column": "zip", "regex_pattern": "^[0-9]{5}$"}),
        )
        .unwrap();
        assert!(q.sql_text.ends_with("WHERE NOT regexp_matches(CAST(\"zip\" AS VARCHAR), ?)"));
        assert_eq!(q.bind_parameters, vec![SqlLiteral::Text("^[0-9]{5}$".into())]);
    }

    #[test]
    fn test_unsupported_type_produces_no_query() {
        let err = compile("role_based", json!({"table": "customers"})).unwrap_err();
        assert_eq!(err, CompileError::UnsupportedRuleType("role_based".into()));
    }

    #[test]
    fn test_identifiers_outside_allow_list_are_rejected() {
        let err = compile(
            "not_null",
            json!({"table": "customers", "column": "email\" OR 1=1 --"}),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownIdentifier(_)));

        let err = compile("not_null", json!({"table": "compliance_rules", "column": "rule_id"}))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownIdentifier("compliance_rules".into()));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let params = json!({"table": "customers", "column": "age", "operator": ">", "value": 65.5});
        let a = compile("threshold", params.clone()).unwrap();
        let b = compile("threshold", params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.bind_parameters, vec![SqlLiteral::Real(65.5)]);
    }

    #[test]
    fn test_limited_sql_appends_cap() {
        let q = compile("not_null", json!({"table": "customers", "column": "email"})).unwrap();
        assert!(q.limited_sql(50).ends_with(" LIMIT 50"));
    }
}
