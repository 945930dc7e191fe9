// vigil-core/src/domain/violation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Violation severity. Every violation is `high` today; the other levels are
/// there for per-rule severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    #[default]
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViolationStatus {
    #[default]
    Open,
    Resolved,
}

impl ViolationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ViolationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ViolationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            _ => Err(format!("Unknown violation status: {}", s)),
        }
    }
}

/// Snapshot of an offending row: column name to its text value (`None` for NULL).
pub type Evidence = serde_json::Map<String, serde_json::Value>;

/// A row returned by a violation query, before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationCandidate {
    pub rule_id: String,
    pub rule_name: String,
    pub table_name: String,
    pub record_id: String,
    pub severity: Severity,
    pub evidence: Evidence,
    pub explanation: String,
}

impl ViolationCandidate {
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.rule_id, &self.table_name, &self.record_id)
    }
}

/// A persisted violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub rule_id: String,
    pub record_id: String,
    pub table_name: String,
    pub severity: Severity,
    pub status: ViolationStatus,
    pub evidence: Evidence,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

/// A violation joined with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationView {
    #[serde(flatten)]
    pub violation: Violation,
    pub rule_name: String,
    pub rule_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationFilter {
    pub severity: Option<Severity>,
    pub status: Option<ViolationStatus>,
}

/// Explanation text attached to every violation of a rule.
pub fn explanation_for(description: &str) -> String {
    format!("Violation of rule: {}", description)
}
