// vigil-core/src/domain/compiler/quoter.rs
use sqlparser::ast::{Ident, SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::domain::error::CompileError;

pub struct UniversalQuoter;

impl UniversalQuoter {
    /// Renders an identifier as `"name"`, doubling any embedded quote.
    pub fn quote(name: &str) -> String {
        Ident::with_quote('"', name).to_string()
    }

    /// Parses generated SQL back and checks it is exactly one plain `SELECT`.
    ///
    /// A stray `;` or a rendering bug that opens a second statement fails here
    /// instead of reaching the store.
    pub fn ensure_single_select(sql: &str) -> Result<(), CompileError> {
        let dialect = GenericDialect {};
        let statements = Parser::parse_sql(&dialect, sql)
            .map_err(|e| CompileError::MalformedQuery(e.to_string()))?;

        match statements.as_slice() {
            [Statement::Query(query)] => match query.body.as_ref() {
                SetExpr::Select(_) => {
                    tracing::debug!("Validated SQL: {}", sql);
                    Ok(())
                }
                other => Err(CompileError::MalformedQuery(format!(
                    "expected a SELECT, found {}",
                    other
                ))),
            },
            [other] => Err(CompileError::MalformedQuery(format!(
                "expected a query, found {}",
                other
            ))),
            many => Err(CompileError::MalformedQuery(format!(
                "expected one statement, found {}",
                many.len()
            ))),
        }
    }
}
