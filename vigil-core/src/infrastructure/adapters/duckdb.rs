// vigil-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::types::Value;
use duckdb::{Config, Connection, InterruptHandle, Row, params, params_from_iter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

// Imports Hexagonaux
use crate::domain::compiler::{QueryDescriptor, SchemaCatalog, SqlLiteral};
use crate::domain::error::ExecutionError;
use crate::domain::rule::{Rule, RuleStatus};
use crate::domain::scan::DedupPolicy;
use crate::domain::violation::{
    Violation, ViolationCandidate, ViolationFilter, ViolationStatus, ViolationView,
};
use crate::error::VigilError;
use crate::infrastructure::adapters::bootstrap::{
    BOOKKEEPING_TABLES, RULES_TABLE, SCHEMA_DDL, TIMESTAMP_BIND_FORMAT, TIMESTAMP_READ_FORMAT,
    VIOLATIONS_TABLE,
};
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::store::{QueryRunner, ResultRow, RuleSource, ViolationSink};

const RULE_COLUMNS: &str = "rule_id, rule_name, rule_type, description, parameters, \
     confidence_score, status, CAST(created_at AS VARCHAR), source_document";

/// Relational store backed by one DuckDB database.
///
/// The shared connection carries bookkeeping (rules, violations). Every rule
/// query runs on its own cloned connection so a failing query cannot touch the
/// bookkeeping transaction.
///
/// All port methods do their DuckDB work on tokio's blocking pool; the
/// synchronous helpers (`open`, `bootstrap`, `execute_batch`) are meant for
/// startup and fixtures.
pub struct DuckDBStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBStore {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens the database and makes sure the bookkeeping tables exist.
    pub fn open(db_path: &str) -> Result<Self, InfrastructureError> {
        let store = Self::new(db_path)?;
        store.bootstrap()?;
        Ok(store)
    }

    /// Creates the bookkeeping tables. Idempotent.
    #[instrument(skip(self))]
    pub fn bootstrap(&self) -> Result<(), InfrastructureError> {
        self.lock()?.execute_batch(SCHEMA_DDL)?;
        debug!("Bookkeeping schema ready");
        Ok(())
    }

    /// Runs raw SQL on the shared connection (fixtures, administration).
    pub fn execute_batch(&self, sql: &str) -> Result<(), InfrastructureError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned)
    }

    /// Runs `f` on the shared connection from the blocking pool so neither the
    /// std mutex nor DuckDB stalls an async worker.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, VigilError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, VigilError> + Send + 'static,
    {
        let shared = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = shared.lock().map_err(|_| DatabaseError::Poisoned)?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| VigilError::InternalError(format!("Store worker failed: {}", e)))?
    }
}

// --- ROW DECODING ---

fn parse_timestamp(table: &str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_READ_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::CorruptRow {
            table: table.to_string(),
            reason: format!("bad timestamp '{}': {}", raw, e),
        })
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_BIND_FORMAT).to_string()
}

fn corrupt(table: &str, reason: impl Into<String>) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: table.to_string(),
        reason: reason.into(),
    }
}

/// Raw columns of a `compliance_rules` row, in `RULE_COLUMNS` order.
struct RuleRow {
    id: String,
    name: String,
    rule_type: String,
    description: String,
    parameters: String,
    confidence_score: f64,
    status: String,
    created_at: String,
    source_document: Option<String>,
}

impl RuleRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            rule_type: row.get(2)?,
            description: row.get(3)?,
            parameters: row.get(4)?,
            confidence_score: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            source_document: row.get(8)?,
        })
    }

    fn into_rule(self) -> Result<Rule, DatabaseError> {
        // Unparseable parameters stay as a string: the compiler rejects them
        // for this rule only.
        let parameters = serde_json::from_str(&self.parameters)
            .unwrap_or(serde_json::Value::String(self.parameters));
        let status = self
            .status
            .parse::<RuleStatus>()
            .map_err(|e| corrupt(RULES_TABLE, e))?;

        Ok(Rule {
            created_at: parse_timestamp(RULES_TABLE, &self.created_at)?,
            id: self.id,
            name: self.name,
            rule_type: self.rule_type,
            description: self.description,
            parameters,
            confidence_score: self.confidence_score,
            status,
            source_document: self.source_document,
        })
    }
}

fn read_rules(conn: &Connection, sql: &str, binds: &[&str]) -> Result<Vec<Rule>, VigilError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(binds.iter()), RuleRow::read)?
        .collect::<duckdb::Result<Vec<_>>>()?;

    let rules = rows
        .into_iter()
        .map(RuleRow::into_rule)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rules)
}

fn to_value(literal: &SqlLiteral) -> Value {
    match literal {
        SqlLiteral::Integer(i) => Value::BigInt(*i),
        SqlLiteral::Real(r) => Value::Double(*r),
        SqlLiteral::Text(s) => Value::Text(s.clone()),
        SqlLiteral::Boolean(b) => Value::Boolean(*b),
    }
}

/// Interrupts a rule query whose caller stopped waiting for it.
///
/// Dropping the `run_isolated` future (deadline or cancellation) drops this
/// guard while the worker may still be inside DuckDB. The flag covers the
/// window before the statement starts, the interrupt covers the rest.
struct InterruptOnDrop {
    handle: Arc<InterruptHandle>,
    abandoned: Arc<AtomicBool>,
    finished: bool,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if !self.finished {
            self.abandoned.store(true, Ordering::SeqCst);
            self.handle.interrupt();
            debug!("Interrupted abandoned rule query");
        }
    }
}

/// Runs one violation query inside a transaction that is always rolled back.
fn run_select(
    mut conn: Connection,
    sql: &str,
    binds: &[Value],
    width: usize,
    abandoned: &AtomicBool,
) -> Result<Vec<ResultRow>, ExecutionError> {
    let query_err = |e: duckdb::Error| ExecutionError::Query(e.to_string());
    let tx = conn.transaction().map_err(query_err)?;
    let mut out = Vec::new();
    {
        let mut stmt = tx.prepare(sql).map_err(query_err)?;
        if abandoned.load(Ordering::SeqCst) {
            return Err(ExecutionError::Cancelled);
        }
        let mut rows = stmt.query(params_from_iter(binds.iter())).map_err(query_err)?;
        while let Some(row) = rows.next().map_err(query_err)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Option<String>>(i).map_err(query_err)?);
            }
            out.push(values);
        }
    }
    tx.rollback().map_err(query_err)?;
    Ok(out)
}

// --- PORTS ---

#[async_trait]
impl RuleSource for DuckDBStore {
    async fn fetch_rules(&self, statuses: &[RuleStatus]) -> Result<Vec<Rule>, VigilError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM {} WHERE status IN ({}) ORDER BY created_at, rule_id",
            RULE_COLUMNS, RULES_TABLE, placeholders
        );
        let binds: Vec<&'static str> = statuses.iter().map(RuleStatus::as_str).collect();

        self.with_conn(move |conn| read_rules(conn, &sql, &binds))
            .await
    }

    async fn get_rule(&self, rule_id: &str) -> Result<Option<Rule>, VigilError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE rule_id = ?",
            RULE_COLUMNS, RULES_TABLE
        );
        let rule_id = rule_id.to_string();
        let rules = self
            .with_conn(move |conn| read_rules(conn, &sql, &[rule_id.as_str()]))
            .await?;
        Ok(rules.into_iter().next())
    }

    async fn insert_rules(&self, rules: &[Rule]) -> Result<(), VigilError> {
        let rules = rules.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for rule in &rules {
                tx.execute(
                    "INSERT INTO compliance_rules (rule_id, rule_name, rule_type, description, \
                     parameters, confidence_score, status, created_at, source_document) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP), ?)",
                    params![
                        rule.id,
                        rule.name,
                        rule.rule_type,
                        rule.description,
                        serde_json::to_string(&rule.parameters)?,
                        rule.confidence_score,
                        rule.status.as_str(),
                        format_timestamp(&rule.created_at),
                        rule.source_document,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl QueryRunner for DuckDBStore {
    async fn load_catalog(&self) -> Result<SchemaCatalog, VigilError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT table_name, column_name FROM information_schema.columns \
                 WHERE table_schema = 'main' ORDER BY table_name, ordinal_position",
            )?;
            let pairs = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<duckdb::Result<Vec<_>>>()?;

            Ok(SchemaCatalog::from_columns(pairs).without_tables(&BOOKKEEPING_TABLES))
        })
        .await
    }

    /// Runs the query on a cloned connection in the blocking pool.
    ///
    /// If the returned future is dropped before the worker finishes, the
    /// running statement is interrupted through DuckDB's interrupt handle, so
    /// the worker thread ends shortly after instead of running to completion.
    async fn run_isolated(
        &self,
        query: &QueryDescriptor,
        max_rows: usize,
    ) -> Result<Vec<ResultRow>, ExecutionError> {
        let conn = {
            let shared = self
                .lock()
                .map_err(|e| ExecutionError::Query(e.to_string()))?;
            shared
                .try_clone()
                .map_err(|e| ExecutionError::Query(e.to_string()))?
        };
        let sql = query.limited_sql(max_rows);
        let binds: Vec<Value> = query.bind_parameters.iter().map(to_value).collect();
        let width = query.projected_columns.len();
        debug!(sql = %sql, binds = binds.len(), "Running violation query");

        let abandoned = Arc::new(AtomicBool::new(false));
        let mut guard = InterruptOnDrop {
            handle: conn.interrupt_handle(),
            abandoned: Arc::clone(&abandoned),
            finished: false,
        };

        let result = tokio::task::spawn_blocking(move || {
            run_select(conn, &sql, &binds, width, &abandoned)
        })
        .await;
        guard.finished = true;

        result.map_err(|e| {
            warn!("Rule query worker failed: {}", e);
            ExecutionError::WorkerPanicked(e.to_string())
        })?
    }
}

#[async_trait]
impl ViolationSink for DuckDBStore {
    async fn persist(
        &self,
        candidates: &[ViolationCandidate],
        policy: DedupPolicy,
    ) -> Result<Vec<Violation>, VigilError> {
        let candidates = candidates.to_vec();
        self.with_conn(move |conn| persist_batch(conn, &candidates, policy))
            .await
    }

    async fn list_violations(
        &self,
        filter: &ViolationFilter,
    ) -> Result<Vec<ViolationView>, VigilError> {
        let mut sql = String::from(
            "SELECT v.violation_id, v.rule_id, v.record_id, v.table_name, v.severity, v.status, \
             v.evidence, v.explanation, CAST(v.created_at AS VARCHAR), r.rule_name, r.rule_type \
             FROM violations v JOIN compliance_rules r ON v.rule_id = r.rule_id",
        );
        let mut conditions = Vec::new();
        let mut binds: Vec<&'static str> = Vec::new();
        if let Some(severity) = &filter.severity {
            conditions.push("v.severity = ?");
            binds.push(severity.as_str());
        }
        if let Some(status) = &filter.status {
            conditions.push("v.status = ?");
            binds.push(status.as_str());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY v.created_at DESC, v.violation_id");

        self.with_conn(move |conn| read_violations(conn, &sql, &binds))
            .await
    }
}

/// Inserts one scan's violations in a single transaction.
fn persist_batch(
    conn: &mut Connection,
    candidates: &[ViolationCandidate],
    policy: DedupPolicy,
) -> Result<Vec<Violation>, VigilError> {
    let tx = conn.transaction()?;
    let created_at = Utc::now();
    let created_at_text = format_timestamp(&created_at);
    let mut persisted = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if policy == DedupPolicy::SkipOpen {
            let (rule_id, table_name, record_id) = candidate.dedup_key();
            let open: i64 = tx.query_row(
                "SELECT count(*) FROM violations \
                 WHERE rule_id = ? AND table_name = ? AND record_id = ? AND status = 'open'",
                params![rule_id, table_name, record_id],
                |row| row.get(0),
            )?;
            if open > 0 {
                continue;
            }
        }

        let violation = Violation {
            id: Uuid::new_v4().to_string(),
            rule_id: candidate.rule_id.clone(),
            record_id: candidate.record_id.clone(),
            table_name: candidate.table_name.clone(),
            severity: candidate.severity,
            status: ViolationStatus::Open,
            evidence: candidate.evidence.clone(),
            explanation: candidate.explanation.clone(),
            created_at,
        };
        tx.execute(
            "INSERT INTO violations (violation_id, rule_id, record_id, table_name, severity, \
             status, evidence, explanation, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            params![
                violation.id,
                violation.rule_id,
                violation.record_id,
                violation.table_name,
                violation.severity.as_str(),
                violation.status.as_str(),
                serde_json::to_string(&violation.evidence)?,
                violation.explanation,
                created_at_text,
            ],
        )?;
        persisted.push(violation);
    }

    tx.commit()?;
    Ok(persisted)
}

fn read_violations(
    conn: &Connection,
    sql: &str,
    binds: &[&str],
) -> Result<Vec<ViolationView>, VigilError> {
    let mut stmt = conn.prepare(sql)?;
    let raw = stmt
        .query_map(params_from_iter(binds.iter()), |row| {
            Ok((
                [
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ],
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
            ))
        })?
        .collect::<duckdb::Result<Vec<_>>>()?;

    raw.into_iter()
        .map(|(cols, rule_name, rule_type)| {
            let [
                id,
                rule_id,
                record_id,
                table_name,
                severity,
                status,
                evidence,
                explanation,
                created_at,
            ] = cols;
            let violation = Violation {
                id,
                rule_id,
                record_id,
                table_name,
                severity: severity
                    .parse()
                    .map_err(|e: String| corrupt(VIOLATIONS_TABLE, e))?,
                status: status
                    .parse()
                    .map_err(|e: String| corrupt(VIOLATIONS_TABLE, e))?,
                evidence: serde_json::from_str(&evidence)
                    .map_err(|e| corrupt(VIOLATIONS_TABLE, e.to_string()))?,
                explanation,
                created_at: parse_timestamp(VIOLATIONS_TABLE, &created_at)?,
            };
            Ok(ViolationView {
                violation,
                rule_name,
                rule_type,
            })
        })
        .collect::<Result<Vec<_>, VigilError>>()
}
