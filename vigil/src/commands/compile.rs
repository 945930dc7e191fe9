// vigil/src/commands/compile.rs
//
// USE CASE: Dry-run the compiler and show the generated SQL.

use comfy_table::Table;
use vigil_core::application::{CompileResult, compile_rules};

use crate::cli::{OutputFormat, StoreArgs};
use crate::commands::{Workspace, print_json};

pub async fn execute(
    store: StoreArgs,
    rule_id: Option<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ws = Workspace::open(&store)?;
    let compiled = compile_rules(ws.store.as_ref(), ws.store.as_ref(), rule_id.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&compiled)?,
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Rule", "Type", "SQL / Error", "Binds"]);
            for rule in &compiled {
                let (sql, binds) = match &rule.result {
                    CompileResult::Query(q) => (
                        q.sql_text.clone(),
                        q.bind_parameters
                            .iter()
                            .map(|b| b.to_string())
                            .collect::<Vec<_>>()
                            .join(", "),
                    ),
                    CompileResult::Error(e) => (format!("❌ {}", e), String::new()),
                };
                table.add_row(vec![
                    format!("{} ({})", rule.rule_name, rule.rule_id),
                    rule.rule_type.clone(),
                    sql,
                    binds,
                ]);
            }
            println!("{table}");
            let failed = compiled.iter().filter(|c| !c.is_ok()).count();
            println!("{} rule(s), {} failed to compile", compiled.len(), failed);
        }
    }
    Ok(())
}
