// vigil-core/src/domain/rule/mod.rs

pub mod operator;
pub mod spec;

pub use operator::ComparisonOperator;
pub use spec::{
    DateDifferenceRule, NotNullRule, PatternRule, RuleKind, RuleSpec, TableTarget, ThresholdRule,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a rule. Scans only ever look at `pending` and `active` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Pending,
    Active,
    Disabled,
}

impl RuleStatus {
    /// Statuses a scan pass evaluates.
    pub const SCANNABLE: [RuleStatus; 2] = [RuleStatus::Pending, RuleStatus::Active];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    pub fn is_scannable(&self) -> bool {
        Self::SCANNABLE.contains(self)
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RuleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            _ => Err(format!("Unknown rule status: {}", s)),
        }
    }
}

/// A stored compliance rule.
///
/// `rule_type` and `parameters` are kept exactly as the extraction service wrote
/// them; [`RuleSpec::parse`] turns them into a typed shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub rule_type: String,
    pub description: String,
    pub parameters: serde_json::Value,
    pub confidence_score: f64,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
    /// Document the rule was extracted from, when the extractor recorded one.
    #[serde(default)]
    pub source_document: Option<String>,
}

impl Rule {
    pub fn spec(&self) -> Result<RuleSpec, crate::domain::error::CompileError> {
        RuleSpec::parse(&self.rule_type, &self.parameters)
    }
}

/// A rule record as proposed by the extraction service, before it gets an id.
///
/// Field names follow the extractor's JSON output (`rule_name`, `rule_type`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRule {
    #[serde(rename = "rule_name")]
    pub name: String,
    pub rule_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub source_document: Option<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl NewRule {
    /// Structural validation done once, at ingestion.
    pub fn validate(&self) -> Result<RuleSpec, crate::domain::error::DomainError> {
        use crate::domain::error::DomainError;

        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRule {
                name: self.name.clone(),
                reason: "rule_name is empty".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(DomainError::InvalidRule {
                name: self.name.clone(),
                reason: format!(
                    "confidence_score {} is outside [0, 1]",
                    self.confidence_score
                ),
            });
        }
        Ok(RuleSpec::parse(&self.rule_type, &self.parameters)?)
    }

    pub fn into_rule(self, id: String, created_at: DateTime<Utc>) -> Rule {
        Rule {
            id,
            name: self.name,
            rule_type: self.rule_type,
            description: self.description,
            parameters: self.parameters,
            confidence_score: self.confidence_score,
            status: self.status,
            created_at,
            source_document: self.source_document,
        }
    }
}
