// vigil/src/commands/mod.rs

pub mod compile;
pub mod import;
pub mod init;
pub mod rules;
pub mod scan;
pub mod violations;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use vigil_core::infrastructure::adapters::DuckDBStore;
use vigil_core::infrastructure::config::{ScanConfig, load_scan_config};

use crate::cli::StoreArgs;

/// Configuration and store shared by every subcommand.
pub struct Workspace {
    pub project_dir: PathBuf,
    pub config: ScanConfig,
    pub store: Arc<DuckDBStore>,
}

impl Workspace {
    pub fn open(args: &StoreArgs) -> anyhow::Result<Self> {
        let mut config = load_scan_config(&args.project_dir).with_context(|| {
            format!(
                "Failed to load scan configuration from {:?}",
                args.project_dir
            )
        })?;
        if let Some(db_path) = &args.db_path {
            config.database_path = db_path.clone();
        }

        let db_path = resolve_db_path(&args.project_dir, &config.database_path);
        let store = DuckDBStore::open(&db_path)
            .with_context(|| format!("Failed to open DuckDB at {}", db_path))?;

        Ok(Self {
            project_dir: args.project_dir.clone(),
            config,
            store: Arc::new(store),
        })
    }
}

/// Relative database paths are relative to the project directory.
fn resolve_db_path(project_dir: &Path, database_path: &str) -> String {
    let path = Path::new(database_path);
    if database_path == ":memory:" || path.is_absolute() {
        database_path.to_string()
    } else {
        project_dir.join(path).to_string_lossy().into_owned()
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
