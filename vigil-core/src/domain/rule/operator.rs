// vigil-core/src/domain/rule/operator.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::CompileError;

/// Comparison operators a `threshold` rule may use.
///
/// A rule states the *compliant* condition (`age >= 18`); the compiler needs the
/// *violating* one (`age < 18`), hence `invert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::LessThan,
        Self::LessOrEqual,
        Self::Equal,
        Self::NotEqual,
    ];

    /// Logical complement: `NOT (x op v)` is `x op.invert() v` for non-null operands.
    pub fn invert(self) -> Self {
        match self {
            Self::GreaterThan => Self::LessOrEqual,
            Self::LessOrEqual => Self::GreaterThan,
            Self::LessThan => Self::GreaterOrEqual,
            Self::GreaterOrEqual => Self::LessThan,
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "=",
            Self::NotEqual => "!=",
        }
    }

    /// Evaluates `left op right`. Used by tests and the dry-run explainer.
    pub fn holds<T: PartialOrd>(&self, left: &T, right: &T) -> bool {
        match self {
            Self::GreaterThan => left > right,
            Self::GreaterOrEqual => left >= right,
            Self::LessThan => left < right,
            Self::LessOrEqual => left <= right,
            Self::Equal => left == right,
            Self::NotEqual => left != right,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ComparisonOperator {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterOrEqual),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessOrEqual),
            "=" | "==" => Ok(Self::Equal),
            "!=" | "<>" => Ok(Self::NotEqual),
            other => Err(CompileError::UnsupportedOperator(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_is_an_involution() {
        for op in ComparisonOperator::ALL {
            assert_eq!(op.invert().invert(), op, "double inversion of {}", op);
        }
    }

    #[test]
    fn test_invert_table() {
        use ComparisonOperator::*;
        assert_eq!(GreaterThan.invert(), LessOrEqual);
        assert_eq!(LessThan.invert(), GreaterOrEqual);
        assert_eq!(GreaterOrEqual.invert(), LessThan);
        assert_eq!(LessOrEqual.invert(), GreaterThan);
        assert_eq!(Equal.invert(), NotEqual);
        assert_eq!(NotEqual.invert(), Equal);
    }

    #[test]
    fn test_inverted_operator_is_the_complement() {
        let samples = [-1_i64, 0, 1, 17, 18, 19];
        for op in ComparisonOperator::ALL {
            for x in samples {
                assert_ne!(
                    op.holds(&x, &18),
                    op.invert().holds(&x, &18),
                    "{} {} 18 and its inverse agree",
                    x,
                    op
                );
            }
        }
    }

    #[test]
    fn test_parse_round_trips_display() {
        for op in ComparisonOperator::ALL {
            assert_eq!(op.to_string().parse::<ComparisonOperator>().unwrap(), op);
        }
        assert_eq!(
            "<>".parse::<ComparisonOperator>().unwrap(),
            ComparisonOperator::NotEqual
        );
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = "LIKE".parse::<ComparisonOperator>().unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedOperator(op) if op == "LIKE"));
    }
}
