// vigil-core/src/domain/error.rs

use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

/// Why a rule could not be turned into a violation query.
///
/// Always recoverable at the granularity of a single rule: the scan logs it and
/// moves on to the next rule.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unsupported rule type '{0}'")]
    #[diagnostic(
        code(vigil::compile::rule_type),
        help("Supported types: threshold, date_difference, not_null, pattern.")
    )]
    UnsupportedRuleType(String),

    #[error("Missing parameter '{0}'")]
    #[diagnostic(code(vigil::compile::missing_parameter))]
    MissingParameter(String),

    #[error("Invalid parameter '{key}': {reason}")]
    #[diagnostic(code(vigil::compile::invalid_parameter))]
    InvalidParameter { key: String, reason: String },

    #[error("Unsupported operator '{0}'")]
    #[diagnostic(
        code(vigil::compile::operator),
        help("Use one of: >, >=, <, <=, =, !=")
    )]
    UnsupportedOperator(String),

    #[error("Unknown identifier '{0}'")]
    #[diagnostic(
        code(vigil::compile::unknown_identifier),
        help("Tables and columns must exist in the scanned database.")
    )]
    UnknownIdentifier(String),

    #[error("Generated query failed the structural check: {0}")]
    #[diagnostic(code(vigil::compile::malformed_query))]
    MalformedQuery(String),
}

impl CompileError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a compiled query failed against the store. Recoverable per rule.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Query timed out after {0:?}")]
    #[diagnostic(code(vigil::execute::timeout))]
    Timeout(Duration),

    #[error("Query failed: {0}")]
    #[diagnostic(
        code(vigil::execute::query),
        help("The target table or column may have changed since the rule was written.")
    )]
    Query(String),

    #[error("Query cancelled")]
    #[diagnostic(code(vigil::execute::cancelled))]
    Cancelled,

    #[error("Query worker panicked: {0}")]
    #[diagnostic(code(vigil::execute::worker))]
    WorkerPanicked(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error("Invalid rule record '{name}': {reason}")]
    #[diagnostic(code(vigil::domain::rule))]
    InvalidRule { name: String, reason: String },

    #[error("Rule '{0}' not found")]
    #[diagnostic(code(vigil::domain::rule_not_found))]
    RuleNotFound(String),
}
