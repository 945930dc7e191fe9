// vigil/src/commands/violations.rs
//
// USE CASE: Show recorded violations.

use comfy_table::Table;
use vigil_core::application::list_violations;
use vigil_core::domain::violation::{Severity, ViolationFilter, ViolationStatus};

use crate::cli::{OutputFormat, StoreArgs};
use crate::commands::{Workspace, print_json};

pub async fn execute(
    store: StoreArgs,
    severity: Option<Severity>,
    status: Option<ViolationStatus>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ws = Workspace::open(&store)?;
    let views = list_violations(ws.store.as_ref(), &ViolationFilter { severity, status }).await?;

    match format {
        OutputFormat::Json => print_json(&views)?,
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Created", "Rule", "Table", "Record", "Severity", "Status", "Evidence"]);
            for view in &views {
                let v = &view.violation;
                table.add_row(vec![
                    v.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    format!("{} [{}]", view.rule_name, view.rule_type),
                    v.table_name.clone(),
                    v.record_id.clone(),
                    v.severity.to_string(),
                    v.status.to_string(),
                    serde_json::Value::Object(v.evidence.clone()).to_string(),
                ]);
            }
            println!("{table}");
            println!("{} violation(s)", views.len());
        }
    }
    Ok(())
}
