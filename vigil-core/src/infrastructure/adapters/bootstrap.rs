// vigil-core/src/infrastructure/adapters/bootstrap.rs
//
// Bookkeeping schema. JSON payloads are stored as VARCHAR holding serialized
// JSON so the adapter does not depend on the json extension being loadable.

pub const RULES_TABLE: &str = "compliance_rules";
pub const VIOLATIONS_TABLE: &str = "violations";

/// Tables rules may never target.
pub const BOOKKEEPING_TABLES: [&str; 2] = [RULES_TABLE, VIOLATIONS_TABLE];

pub const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS compliance_rules (
    rule_id VARCHAR PRIMARY KEY,
    rule_name VARCHAR NOT NULL,
    rule_type VARCHAR NOT NULL,
    description VARCHAR NOT NULL DEFAULT '',
    parameters VARCHAR NOT NULL,
    confidence_score DOUBLE NOT NULL DEFAULT 0.0,
    status VARCHAR NOT NULL DEFAULT 'pending',
    created_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
    source_document VARCHAR
);

-- Databases created before rules carried their source document.
ALTER TABLE compliance_rules ADD COLUMN IF NOT EXISTS source_document VARCHAR;

CREATE TABLE IF NOT EXISTS violations (
    violation_id VARCHAR PRIMARY KEY,
    rule_id VARCHAR NOT NULL,
    record_id VARCHAR NOT NULL,
    table_name VARCHAR NOT NULL,
    severity VARCHAR NOT NULL DEFAULT 'high',
    status VARCHAR NOT NULL DEFAULT 'open',
    evidence VARCHAR NOT NULL,
    explanation VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);

CREATE INDEX IF NOT EXISTS idx_violations_rule_record
    ON violations (rule_id, table_name, record_id);
";

/// Text format used to bind timestamps (`CAST(? AS TIMESTAMP)`).
pub const TIMESTAMP_BIND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format DuckDB uses when casting a TIMESTAMP to VARCHAR.
pub const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
