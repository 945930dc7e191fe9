// vigil-core/src/domain/compiler/builder.rs

use crate::domain::compiler::catalog::{SchemaCatalog, TableSchema};
use crate::domain::compiler::quoter::UniversalQuoter;
use crate::domain::compiler::{QueryDescriptor, SqlLiteral};
use crate::domain::error::CompileError;
use crate::domain::rule::{ComparisonOperator, TableTarget};

/// A column that passed the allow-list, carrying the catalog spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef(String);

impl ColumnRef {
    pub fn name(&self) -> &str {
        &self.0
    }

    fn quoted(&self) -> String {
        UniversalQuoter::quote(&self.0)
    }
}

/// Conditions a violating row satisfies. Identifiers and literals stay separate
/// until rendering: identifiers are quoted, literals become placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op ?`
    Compare {
        column: ColumnRef,
        operator: ComparisonOperator,
        value: SqlLiteral,
    },
    /// `column IS NULL OR column = ''`
    IsBlank { column: ColumnRef },
    /// More than `max_days` whole days between `start` and `end`.
    DayGapExceeds {
        start: ColumnRef,
        end: ColumnRef,
        max_days: i64,
    },
    /// Value does not contain a match for `pattern`.
    NotMatching { column: ColumnRef, pattern: String },
}

/// Builds the `SELECT` returning every row of one table that violates a rule.
pub struct ViolationQueryBuilder<'a> {
    table: &'a TableSchema,
    primary_key: &'a str,
    predicates: Vec<Predicate>,
}

impl<'a> ViolationQueryBuilder<'a> {
    pub fn new(catalog: &'a SchemaCatalog, target: &TableTarget) -> Result<Self, CompileError> {
        let table = catalog.table(&target.table)?;
        let primary_key = match &target.primary_key {
            Some(pk) => table.resolve_column(pk)?,
            None => table
                .columns
                .first()
                .map(String::as_str)
                .ok_or_else(|| CompileError::UnknownIdentifier(target.table.clone()))?,
        };
        Ok(Self {
            table,
            primary_key,
            predicates: Vec::new(),
        })
    }

    pub fn column(&self, name: &str) -> Result<ColumnRef, CompileError> {
        self.table
            .resolve_column(name)
            .map(|c| ColumnRef(c.to_string()))
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn build(self) -> Result<QueryDescriptor, CompileError> {
        if self.predicates.is_empty() {
            return Err(CompileError::MalformedQuery(
                "a violation query needs at least one predicate".into(),
            ));
        }

        let projection = self
            .table
            .columns
            .iter()
            .map(|c| {
                let q = UniversalQuoter::quote(c);
                format!("CAST({q} AS VARCHAR) AS {q}")
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut binds = Vec::new();
        let conditions = self
            .predicates
            .into_iter()
            .map(|p| render(p, &mut binds))
            .collect::<Vec<_>>()
            .join(" AND ");

        let sql_text = format!(
            "SELECT {} FROM {} WHERE {}",
            projection,
            UniversalQuoter::quote(&self.table.name),
            conditions
        );
        UniversalQuoter::ensure_single_select(&sql_text)?;

        Ok(QueryDescriptor {
            sql_text,
            bind_parameters: binds,
            target_table: self.table.name.clone(),
            projected_columns: self.table.columns.clone(),
            primary_key_hint: self.primary_key.to_string(),
        })
    }
}

fn render(predicate: Predicate, binds: &mut Vec<SqlLiteral>) -> String {
    match predicate {
        Predicate::Compare {
            column,
            operator,
            value,
        } => {
            binds.push(value);
            format!("{} {} ?", column.quoted(), operator.as_sql())
        }
        Predicate::IsBlank { column } => {
            let c = column.quoted();
            format!("({c} IS NULL OR CAST({c} AS VARCHAR) = '')")
        }
        Predicate::DayGapExceeds {
            start,
            end,
            max_days,
        } => {
            binds.push(SqlLiteral::Integer(max_days));
            format!(
                "date_diff('day', {}, {}) > ?",
                start.quoted(),
                end.quoted()
            )
        }
        Predicate::NotMatching { column, pattern } => {
            binds.push(SqlLiteral::Text(pattern));
            format!(
                "NOT regexp_matches(CAST({} AS VARCHAR), ?)",
                column.quoted()
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn target(table: &str) -> TableTarget {
        TableTarget {
            table: table.into(),
            primary_key: None,
        }
    }

    #[test]
    fn test_projection_follows_catalog_order() {
        let catalog = SchemaCatalog::new().with_table("users", &["user_id", "email"]);
        let builder = ViolationQueryBuilder::new(&catalog, &target("USERS")).unwrap();
        let email = builder.column("Email").unwrap();
        let descriptor = builder.filter(Predicate::IsBlank { column: email }).build().unwrap();

        assert_eq!(
            descriptor.sql_text,
            "SELECT CAST(\"user_id\" AS VARCHAR) AS \"user_id\", CAST(\"email\" AS VARCHAR) AS \"email\" \
             FROM \"users\" WHERE (\"email\" IS NULL OR CAST(\"email\" AS VARCHAR) = '')"
        );
        assert!(descriptor.bind_parameters.is_empty());
        assert_eq!(descriptor.primary_key_hint, "user_id");
        assert_eq!(descriptor.target_table, "users");
    }

    #[test]
    fn test_literals_are_bound_in_order() {
        let catalog = SchemaCatalog::new().with_table("t", &["a", "b", "c"]);
        let builder = ViolationQueryBuilder::new(&catalog, &target("t")).unwrap();
        let a = builder.column("a").unwrap();
        let b = builder.column("b").unwrap();
        let c = builder.column("c").unwrap();
        let descriptor = builder
            .filter(Predicate::Compare {
                column: a,
                operator: ComparisonOperator::LessThan,
                value: SqlLiteral::Text("x'); DROP TABLE t; --".into()),
            })
            .filter(Predicate::NotMatching {
                column: b.clone(),
                pattern: "^[0-9]+$".into(),
            })
            .filter(Predicate::DayGapExceeds {
                start: b,
                end: c,
                max_days: 7,
            })
            .build()
            .unwrap();

        assert!(!descriptor.sql_text.contains("DROP"));
        assert_eq!(
            descriptor.bind_parameters,
            vec![
                SqlLiteral::Text("x'); DROP TABLE t; --".into()),
                SqlLiteral::Text("^[0-9]+$".into()),
                SqlLiteral::Integer(7),
            ]
        );
        assert_eq!(descriptor.sql_text.matches('?').count(), 3);
    }

    #[test]
    fn test_primary_key_override_must_exist() {
        let catalog = SchemaCatalog::new().with_table("t", &["a", "b"]);
        let with_pk = TableTarget {
            table: "t".into(),
            primary_key: Some("B".into()),
        };
        let builder = ViolationQueryBuilder::new(&catalog, &with_pk).unwrap();
        assert_eq!(builder.primary_key, "b");

        let missing_pk = TableTarget {
            table: "t".into(),
            primary_key: Some("z".into()),
        };
        assert!(matches!(
            ViolationQueryBuilder::new(&catalog, &missing_pk),
            Err(CompileError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn test_build_without_predicate_fails() {
        let catalog = SchemaCatalog::new().with_table("t", &["a"]);
        let builder = ViolationQueryBuilder::new(&catalog, &target("t")).unwrap();
        assert!(matches!(builder.build(), Err(CompileError::MalformedQuery(_))));
    }
}
