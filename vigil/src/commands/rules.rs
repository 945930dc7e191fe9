// vigil/src/commands/rules.rs
//
// USE CASE: List stored rules.

use comfy_table::Table;
use vigil_core::application::list_rules;
use vigil_core::domain::rule::RuleStatus;

use crate::cli::{OutputFormat, StoreArgs};
use crate::commands::{Workspace, print_json};

pub async fn execute(
    store: StoreArgs,
    status: Option<RuleStatus>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ws = Workspace::open(&store)?;
    let rules = list_rules(ws.store.as_ref(), status).await?;

    match format {
        OutputFormat::Json => print_json(&rules)?,
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["ID", "Name", "Type", "Status", "Confidence", "Parameters", "Source"]);
            for rule in &rules {
                table.add_row(vec![
                    rule.id.clone(),
                    rule.name.clone(),
                    rule.rule_type.clone(),
                    rule.status.to_string(),
                    format!("{:.2}", rule.confidence_score),
                    rule.parameters.to_string(),
                    rule.source_document.clone().unwrap_or_else(|| "-".into()),
                ]);
            }
            println!("{table}");
            println!("{} rule(s)", rules.len());
        }
    }
    Ok(())
}
