// vigil/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vigil_core::domain::rule::RuleStatus;
use vigil_core::domain::violation::{Severity, ViolationStatus};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Compiles compliance rules into SQL and scans your database for violations", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the project lives and which database to use.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Project directory (holds vigil.yaml)
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Database file, overrides `database-path` from vigil.yaml
    #[arg(long)]
    pub db_path: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🏗️  Creates the bookkeeping tables (compliance_rules, violations)
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// 📥 Imports rules from a YAML or JSON file produced by the extractor
    Import {
        /// Rule file (list of rule records)
        file: PathBuf,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// 📜 Lists stored rules
    Rules {
        #[command(flatten)]
        store: StoreArgs,

        /// Only rules with this status (pending | active | disabled)
        #[arg(long)]
        status: Option<RuleStatus>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// 🧪 Compiles rules to SQL without running them
    Compile {
        #[command(flatten)]
        store: StoreArgs,

        /// Compile only this rule (any status)
        #[arg(long)]
        rule_id: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// 🔎 Runs every pending/active rule and records violations
    Scan {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// 🚨 Lists recorded violations, newest first
    Violations {
        #[command(flatten)]
        store: StoreArgs,

        /// low | medium | high | critical
        #[arg(long)]
        severity: Option<Severity>,

        /// open | resolved
        #[arg(long)]
        status: Option<ViolationStatus>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_scan_defaults() -> Result<()> {
        let args = Cli::parse_from(["vigil", "scan"]);
        match args.command {
            Commands::Scan { store, format } => {
                assert_eq!(store.project_dir.to_string_lossy(), ".");
                assert_eq!(format, OutputFormat::Table);
                Ok(())
            }
            _ => bail!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_import() -> Result<()> {
        let args = Cli::parse_from([
            "vigil",
            "import",
            "rules.yaml",
            "--project-dir",
            "/tmp",
            "--db-path",
            "audit.duckdb",
        ]);
        match args.command {
            Commands::Import { file, store } => {
                assert_eq!(file.to_string_lossy(), "rules.yaml");
                assert_eq!(store.project_dir.to_string_lossy(), "/tmp");
                assert_eq!(store.db_path.as_deref(), Some("audit.duckdb"));
                Ok(())
            }
            _ => bail!("Expected Import command"),
        }
    }

    #[test]
    fn test_cli_parse_violation_filters() -> Result<()> {
        let args = Cli::parse_from([
            "vigil",
            "violations",
            "--severity",
            "high",
            "--status",
            "open",
            "--format",
            "json",
        ]);
        match args.command {
            Commands::Violations {
                severity,
                status,
                format,
                ..
            } => {
                assert_eq!(severity, Some(Severity::High));
                assert_eq!(status, Some(ViolationStatus::Open));
                assert_eq!(format, OutputFormat::Json);
                Ok(())
            }
            _ => bail!("Expected Violations command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_severity() {
        assert!(Cli::try_parse_from(["vigil", "violations", "--severity", "urgent"]).is_err());
    }

    #[test]
    fn test_cli_parse_compile_single_rule() -> Result<()> {
        let args = Cli::parse_from(["vigil", "compile", "--rule-id", "r-42"]);
        match args.command {
            Commands::Compile { rule_id, .. } => {
                assert_eq!(rule_id.as_deref(), Some("r-42"));
                Ok(())
            }
            _ => bail!("Expected Compile command"),
        }
    }
}
