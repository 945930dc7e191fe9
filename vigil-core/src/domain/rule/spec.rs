// vigil-core/src/domain/rule/spec.rs

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::compiler::SqlLiteral;
use crate::domain::error::CompileError;
use crate::domain::rule::ComparisonOperator;

/// The closed set of rule kinds the compiler knows how to shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Threshold,
    DateDifference,
    NotNull,
    Pattern,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::DateDifference => "date_difference",
            Self::NotNull => "not_null",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "threshold" => Ok(Self::Threshold),
            "date_difference" => Ok(Self::DateDifference),
            "not_null" => Ok(Self::NotNull),
            "pattern" => Ok(Self::Pattern),
            _ => Err(CompileError::UnsupportedRuleType(s.to_string())),
        }
    }
}

/// Where a rule looks. `primary_key` overrides the column used as `record_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableTarget {
    pub table: String,
    pub primary_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRule {
    pub target: TableTarget,
    pub column: String,
    pub operator: ComparisonOperator,
    pub value: SqlLiteral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateDifferenceRule {
    pub target: TableTarget,
    pub date_col_1: String,
    pub date_col_2: String,
    pub max_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotNullRule {
    pub target: TableTarget,
    pub column: String,
}

/// Rows whose column does not match `regex_pattern`.
///
/// The pattern is checked with the `regex` crate at import, but DuckDB runs it
/// with RE2 (`regexp_matches`). The two syntaxes mostly overlap; a pattern
/// using a construct only one side knows can still fail at scan time, where it
/// shows up as an `execution_failed` outcome for that rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRule {
    pub target: TableTarget,
    pub column: String,
    pub regex_pattern: String,
}

/// Typed rule parameters, one variant per [`RuleKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum RuleSpec {
    Threshold(ThresholdRule),
    DateDifference(DateDifferenceRule),
    NotNull(NotNullRule),
    Pattern(PatternRule),
}

impl RuleSpec {
    /// Validating parse of the free-form `parameters` object for a given `rule_type`.
    pub fn parse(rule_type: &str, parameters: &Value) -> Result<Self, CompileError> {
        let kind: RuleKind = rule_type.parse()?;
        let params = Params::new(parameters)?;
        let target = TableTarget {
            table: params.required_str("table")?,
            primary_key: params.optional_str("primary_key")?,
        };

        let spec = match kind {
            RuleKind::Threshold => {
                let operator = match params.optional_str("operator")? {
                    Some(op) => op.parse()?,
                    None => ComparisonOperator::Equal,
                };
                RuleSpec::Threshold(ThresholdRule {
                    target,
                    column: params.required_str("column")?,
                    operator,
                    value: params.required_literal("value")?,
                })
            }
            RuleKind::DateDifference => RuleSpec::DateDifference(DateDifferenceRule {
                target,
                date_col_1: params.required_str("date_col_1")?,
                date_col_2: params.required_str("date_col_2")?,
                max_days: params.required_days("max_days")?,
            }),
            RuleKind::NotNull => RuleSpec::NotNull(NotNullRule {
                target,
                column: params.required_str("column")?,
            }),
            RuleKind::Pattern => {
                let column = params.required_str("column")?;
                let regex_pattern = params.required_str("regex_pattern")?;
                regex::Regex::new(&regex_pattern)
                    .map_err(|e| CompileError::invalid("regex_pattern", e.to_string()))?;
                RuleSpec::Pattern(PatternRule {
                    target,
                    column,
                    regex_pattern,
                })
            }
        };
        Ok(spec)
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Threshold(_) => RuleKind::Threshold,
            Self::DateDifference(_) => RuleKind::DateDifference,
            Self::NotNull(_) => RuleKind::NotNull,
            Self::Pattern(_) => RuleKind::Pattern,
        }
    }

    pub fn target(&self) -> &TableTarget {
        match self {
            Self::Threshold(r) => &r.target,
            Self::DateDifference(r) => &r.target,
            Self::NotNull(r) => &r.target,
            Self::Pattern(r) => &r.target,
        }
    }
}

/// Typed accessors over the raw parameter object.
struct Params<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    fn new(value: &'a Value) -> Result<Self, CompileError> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(CompileError::invalid(
                "parameters",
                format!("expected an object, got {}", json_kind(other)),
            )),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&'a Value, CompileError> {
        self.get(key)
            .ok_or_else(|| CompileError::MissingParameter(key.to_string()))
    }

    fn required_str(&self, key: &str) -> Result<String, CompileError> {
        match self.required(key)? {
            Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Value::String(_) => Err(CompileError::invalid(key, "must not be empty")),
            other => Err(CompileError::invalid(
                key,
                format!("expected a string, got {}", json_kind(other)),
            )),
        }
    }

    fn optional_str(&self, key: &str) -> Result<Option<String>, CompileError> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.required_str(key).map(Some),
        }
    }

    fn required_literal(&self, key: &str) -> Result<SqlLiteral, CompileError> {
        match self.required(key)? {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlLiteral::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SqlLiteral::Real(f))
                } else {
                    Err(CompileError::invalid(key, format!("{} is out of range", n)))
                }
            }
            Value::String(s) => Ok(SqlLiteral::Text(s.clone())),
            Value::Bool(b) => Ok(SqlLiteral::Boolean(*b)),
            other => Err(CompileError::invalid(
                key,
                format!("expected a scalar, got {}", json_kind(other)),
            )),
        }
    }

    /// Day counts: a non-negative integer, or a string holding one (extractors emit both).
    fn required_days(&self, key: &str) -> Result<i64, CompileError> {
        let days = match self.required(key)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| CompileError::invalid(key, "expected a whole number of days"))?,
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| CompileError::invalid(key, format!("'{}' is not a number", s)))?,
            other => {
                return Err(CompileError::invalid(
                    key,
                    format!("expected a number, got {}", json_kind(other)),
                ));
            }
        };
        if days < 0 {
            return Err(CompileError::invalid(key, "must not be negative"));
        }
        Ok(days)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_threshold() {
        let spec = RuleSpec::parse(
            "threshold",
            &json!({"table": "customers", "column": "age", "operator": ">=", "value": 18}),
        )
        .unwrap();
        match spec {
            RuleSpec::Threshold(r) => {
                assert_eq!(r.target.table, "customers");
                assert_eq!(r.column, "age");
                assert_eq!(r.operator, ComparisonOperator::GreaterOrEqual);
                assert_eq!(r.value, SqlLiteral::Integer(18));
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_threshold_operator_defaults_to_equal() {
        let spec = RuleSpec::parse(
            "threshold",
            &json!({"table": "t", "column": "c", "value": "EUR"}),
        )
        .unwrap();
        assert!(matches!(
            spec,
            RuleSpec::Threshold(ThresholdRule { operator: ComparisonOperator::Equal, .. })
        ));
    }

    #[test]
    fn test_threshold_unknown_operator_is_an_error() {
        let err = RuleSpec::parse(
            "threshold",
            &json!({"table": "t", "column": "c", "operator": "~", "value": 1}),
        )
        .unwrap_err();
        assert_eq!(err, CompileError::UnsupportedOperator("~".into()));
    }

    #[test]
    fn test_unknown_type() {
        let err = RuleSpec::parse("role_based", &json!({"table": "t"})).unwrap_err();
        assert_eq!(err, CompileError::UnsupportedRuleType("role_based".into()));
    }

    #[test]
    fn test_missing_parameters_are_named() {
        let cases = [
            ("not_null", json!({"column": "email"}), "table"),
            ("not_null", json!({"table": "users"}), "column"),
            ("pattern", json!({"table": "users", "column": "zip"}), "regex_pattern"),
            ("pattern", json!({"table": "users"}), "column"),
            ("threshold", json!({"table": "t", "column": "c"}), "value"),
            (
                "date_difference",
                json!({"table": "t", "date_col_1": "a", "max_days": 3}),
                "date_col_2",
            ),
            (
                "date_difference",
                json!({"table": "t", "date_col_1": "a", "date_col_2": "b"}),
                "max_days",
            ),
        ];
        for (rule_type, params, key) in cases {
            let err = RuleSpec::parse(rule_type, &params).unwrap_err();
            assert_eq!(err, CompileError::MissingParameter(key.into()), "{}", rule_type);
        }
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = RuleSpec::parse("not_null", &json!({"table": "t", "column": null})).unwrap_err();
        assert_eq!(err, CompileError::MissingParameter("column".into()));
    }

    #[test]
    fn test_parameters_must_be_an_object() {
        let err = RuleSpec::parse("not_null", &json!("table=users")).unwrap_err();
        assert!(matches!(err, CompileError::InvalidParameter { key, .. } if key == "parameters"));
    }

    #[test]
    fn test_max_days_accepts_numeric_strings() {
        let spec = RuleSpec::parse(
            "date_difference",
            &json!({"table": "t", "date_col_1": "a", "date_col_2": "b", "max_days": "30"}),
        )
        .unwrap();
        assert!(matches!(
            spec,
            RuleSpec::DateDifference(DateDifferenceRule { max_days: 30, .. })
        ));

        let err = RuleSpec::parse(
            "date_difference",
            &json!({"table": "t", "date_col_1": "a", "date_col_2": "b", "max_days": -1}),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidParameter { .. }));
    }

    #[test]
    fn test_pattern_must_compile() {
        let err = RuleSpec::parse(
            "pattern",
            &json!({"table": "t", "column": "c", "regex_pattern": "([a-z"}),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidParameter { key, .. } if key == "regex_pattern"));
    }

    #[test]
    fn test_primary_key_override() {
        let spec = RuleSpec::parse(
            "not_null",
            &json!({"table": "users", "column": "email", "primary_key": "user_id"}),
        )
        .unwrap();
        assert_eq!(spec.target().primary_key.as_deref(), Some("user_id"));
        assert_eq!(spec.kind(), RuleKind::NotNull);
    }
}
