// vigil/src/commands/import.rs
//
// USE CASE: Load extracted rules from a YAML/JSON file.

use std::path::PathBuf;

use anyhow::Context;
use comfy_table::Table;
use vigil_core::application::import_rules;
use vigil_core::infrastructure::config::load_rule_document;

use crate::cli::StoreArgs;
use crate::commands::Workspace;

pub async fn execute(file: PathBuf, store: StoreArgs) -> anyhow::Result<()> {
    let ws = Workspace::open(&store)?;
    let document = load_rule_document(&file)
        .with_context(|| format!("Failed to read rule file {:?}", file))?;

    let summary = import_rules(ws.store.as_ref(), document).await?;

    println!("📥 Imported {} rule(s)", summary.accepted.len());
    for rule in &summary.accepted {
        println!("   ➜ {} [{}] {}", rule.id, rule.rule_type, rule.name);
    }

    if !summary.rejected.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Rule", "Reason"]);
        for rejected in &summary.rejected {
            table.add_row(vec![
                rejected.index.to_string(),
                rejected.name.clone().unwrap_or_else(|| "-".to_string()),
                rejected.reason.clone(),
            ]);
        }
        eprintln!("⚠️  {} record(s) rejected:\n{}", summary.rejected.len(), table);
    }
    Ok(())
}
