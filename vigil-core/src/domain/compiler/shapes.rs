// vigil-core/src/domain/compiler/shapes.rs
//
// One query shape per rule kind. A new kind implements `ViolationShape` for its
// own parameter struct and gets a match arm in `RuleSpec::shape`; no other shape
// changes.

use crate::domain::compiler::builder::{Predicate, ViolationQueryBuilder};
use crate::domain::error::CompileError;
use crate::domain::rule::{
    DateDifferenceRule, NotNullRule, PatternRule, RuleSpec, TableTarget, ThresholdRule,
};

pub trait ViolationShape {
    fn target(&self) -> &TableTarget;

    /// Predicate selecting the rows that break the rule, i.e. the negation of
    /// its compliant condition.
    fn violation(&self, query: &ViolationQueryBuilder<'_>) -> Result<Predicate, CompileError>;
}

impl ViolationShape for ThresholdRule {
    fn target(&self) -> &TableTarget {
        &self.target
    }

    fn violation(&self, query: &ViolationQueryBuilder<'_>) -> Result<Predicate, CompileError> {
        Ok(Predicate::Compare {
            column: query.column(&self.column)?,
            operator: self.operator.invert(),
            value: self.value.clone(),
        })
    }
}

impl ViolationShape for DateDifferenceRule {
    fn target(&self) -> &TableTarget {
        &self.target
    }

    fn violation(&self, query: &ViolationQueryBuilder<'_>) -> Result<Predicate, CompileError> {
        Ok(Predicate::DayGapExceeds {
            start: query.column(&self.date_col_1)?,
            end: query.column(&self.date_col_2)?,
            max_days: self.max_days,
        })
    }
}

impl ViolationShape for NotNullRule {
    fn target(&self) -> &TableTarget {
        &self.target
    }

    fn violation(&self, query: &ViolationQueryBuilder<'_>) -> Result<Predicate, CompileError> {
        Ok(Predicate::IsBlank {
            column: query.column(&self.column)?,
        })
    }
}

impl ViolationShape for PatternRule {
    fn target(&self) -> &TableTarget {
        &self.target
    }

    fn violation(&self, query: &ViolationQueryBuilder<'_>) -> Result<Predicate, CompileError> {
        Ok(Predicate::NotMatching {
            column: query.column(&self.column)?,
            pattern: self.regex_pattern.clone(),
        })
    }
}

impl RuleSpec {
    pub fn shape(&self) -> &dyn ViolationShape {
        match self {
            Self::Threshold(r) => r,
            Self::DateDifference(r) => r,
            Self::NotNull(r) => r,
            Self::Pattern(r) => r,
        }
    }
}
