// vigil/src/commands/init.rs
//
// USE CASE: Create the bookkeeping tables.

use crate::cli::StoreArgs;
use crate::commands::Workspace;

pub fn execute(store: StoreArgs) -> anyhow::Result<()> {
    let ws = Workspace::open(&store)?;
    println!(
        "✨ Database ready at {} (compliance_rules, violations)",
        ws.config.database_path
    );
    Ok(())
}
