// vigil-core/src/infrastructure/config/rules.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::rule::NewRule;
use crate::infrastructure::error::InfrastructureError;

/// Rules proposed by the extraction service, as read from disk.
///
/// Each entry is decoded on its own so one malformed record does not hide the
/// others.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDocument {
    pub entries: Vec<RuleEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    /// Position in the file, starting at 0.
    pub index: usize,
    pub record: Result<NewRule, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    List(Vec<serde_json::Value>),
    Wrapped { rules: Vec<serde_json::Value> },
    Single(serde_json::Map<String, serde_json::Value>),
}

/// Reads a YAML or JSON rule file: a list of records, `{rules: [...]}`, or one record.
#[instrument]
pub fn load_rule_document(path: &Path) -> Result<RuleDocument, InfrastructureError> {
    let content = fs::read_to_string(path).map_err(InfrastructureError::Io)?;
    let document = parse_rule_document(&content)?;
    info!(entries = document.entries.len(), "Rule document loaded");
    Ok(document)
}

pub fn parse_rule_document(content: &str) -> Result<RuleDocument, InfrastructureError> {
    // JSON is valid YAML, one parser covers both.
    let raw: RawDocument = serde_yaml::from_str(content).map_err(InfrastructureError::YamlError)?;
    let values = match raw {
        RawDocument::List(values) | RawDocument::Wrapped { rules: values } => values,
        RawDocument::Single(map) => vec![serde_json::Value::Object(map)],
    };

    let entries = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| RuleEntry {
            index,
            record: serde_json::from_value::<NewRule>(value).map_err(|e| e.to_string()),
        })
        .collect();

    Ok(RuleDocument { entries })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_yaml_list() -> Result<()> {
        let doc = parse_rule_document(
            r#"
- rule_name: Adults only
  rule_type: threshold
  description: Customers must be 18 or older
  parameters: { table: customers, column: age, operator: ">=", value: 18 }
  confidence_score: 0.9
- rule_type: not_null
  parameters: { table: customers, column: email }
"#,
        )?;
        assert_eq!(doc.entries.len(), 2);
        let first = doc.entries[0].record.as_ref().unwrap();
        assert_eq!(first.name, "Adults only");
        assert_eq!(first.parameters["value"], serde_json::json!(18));
        assert!(doc.entries[1].record.is_err(), "rule_name is required");
        Ok(())
    }

    #[test]
    fn test_json_wrapped_and_single() -> Result<()> {
        let wrapped = parse_rule_document(
            r#"{"rules": [{"rule_name": "Email", "rule_type": "not_null", "parameters": {"table": "t", "column": "c"}}]}"#,
        )?;
        assert_eq!(wrapped.entries.len(), 1);
        assert!(wrapped.entries[0].record.is_ok());

        let single = parse_rule_document(
            r#"{"rule_name": "Email", "rule_type": "not_null", "parameters": {"table": "t", "column": "c"}}"#,
        )?;
        assert_eq!(single.entries.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_from_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rules.json");
        fs::write(
            &path,
            r#"[{"rule_name": "Zip", "rule_type": "pattern", "parameters": {"table": "t", "column": "zip", "regex_pattern": "^[0-9]{5}$"}}]"#,
        )?;
        let doc = load_rule_document(&path)?;
        assert_eq!(doc.entries[0].index, 0);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = load_rule_document(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(matches!(err, InfrastructureError::Io(_)));
    }
}
