// vigil-core/src/infrastructure/config/scan.rs

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::scan::DedupPolicy;
use crate::infrastructure::error::InfrastructureError;

/// Everything a scan pass needs to know about its environment.
///
/// Built once per process run and passed down explicitly.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct ScanConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Cap on rows fetched per rule.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_rows")]
    pub max_rows_per_rule: usize,

    #[validate(range(min = 1))]
    #[serde(default = "default_timeout_ms")]
    pub rule_timeout_ms: u64,

    /// Rules whose queries may run at the same time.
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_workers")]
    pub max_workers: usize,

    #[serde(default)]
    pub dedup: DedupPolicy,

    /// On cancellation, commit the violations of rules that already finished.
    #[serde(default = "default_true")]
    pub persist_on_cancel: bool,

    /// Where to write the JSON report of each scan, relative to the project dir.
    #[serde(default)]
    pub report_path: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_rows_per_rule: default_max_rows(),
            rule_timeout_ms: default_timeout_ms(),
            max_workers: default_workers(),
            dedup: DedupPolicy::default(),
            persist_on_cancel: true,
            report_path: None,
        }
    }
}

impl ScanConfig {
    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }
}

fn default_database_path() -> String {
    "vigil.duckdb".to_string()
}
fn default_max_rows() -> usize {
    1000
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_workers() -> usize {
    4
}
fn default_true() -> bool {
    true
}

// --- LOADER ---

/// Loads `vigil.yaml` from `project_dir` (defaults when absent), then applies
/// `VIGIL_*` environment overrides and validates the result.
#[instrument(skip(project_dir))]
pub fn load_scan_config(project_dir: &Path) -> Result<ScanConfig, InfrastructureError> {
    let mut config = match find_config(project_dir) {
        Some(path) => {
            info!(path = ?path, "Loading scan configuration");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {:?}", path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config YAML at {:?}", path))?
        }
        None => ScanConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn find_config(root: &Path) -> Option<PathBuf> {
    ["vigil.yaml", "vigil.yml"]
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

fn apply_env_overrides<F>(config: &mut ScanConfig, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("VIGIL_DATABASE_PATH") {
        info!(old = ?config.database_path, new = ?val, "Overriding database path via ENV");
        config.database_path = val;
    }
    if let Some(val) = lookup("VIGIL_MAX_ROWS") {
        config.max_rows_per_rule = parse_env("VIGIL_MAX_ROWS", &val)?;
    }
    if let Some(val) = lookup("VIGIL_RULE_TIMEOUT_MS") {
        config.rule_timeout_ms = parse_env("VIGIL_RULE_TIMEOUT_MS", &val)?;
    }
    if let Some(val) = lookup("VIGIL_MAX_WORKERS") {
        config.max_workers = parse_env("VIGIL_MAX_WORKERS", &val)?;
    }
    Ok(())
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, InfrastructureError> {
    raw.trim().parse().map_err(|_| {
        InfrastructureError::ConfigError(format!("{} must be a positive integer, got '{}'", key, raw))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() -> Result<()> {
        let dir = tempdir()?;
        let config = load_scan_config(dir.path())?;
        assert_eq!(config.database_path, "vigil.duckdb");
        assert_eq!(config.max_rows_per_rule, 1000);
        assert_eq!(config.rule_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.dedup, DedupPolicy::Append);
        assert!(config.persist_on_cancel);
        Ok(())
    }

    #[test]
    fn test_yaml_file_is_loaded() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("vigil.yaml"),
            "database-path: audit.duckdb\nmax-rows-per-rule: 10\ndedup: skip_open\nreport-path: target/scan.json\n",
        )?;
        let config = load_scan_config(dir.path())?;
        assert_eq!(config.database_path, "audit.duckdb");
        assert_eq!(config.max_rows_per_rule, 10);
        assert_eq!(config.dedup, DedupPolicy::SkipOpen);
        assert_eq!(config.report_path.as_deref(), Some("target/scan.json"));
        assert_eq!(config.max_workers, 4);
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("vigil.yml"), "max-workers: 0\n")?;
        let err = load_scan_config(dir.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::InvalidConfig(_)));
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VIGIL_DATABASE_PATH", ":memory:"),
            ("VIGIL_MAX_WORKERS", "2"),
            ("VIGIL_RULE_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();
        let mut config = ScanConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.rule_timeout_ms, 250);
        assert_eq!(config.max_rows_per_rule, 1000);
    }

    #[test]
    fn test_env_override_must_be_numeric() {
        let mut config = ScanConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == "VIGIL_MAX_ROWS").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigError(_)));
    }
}
