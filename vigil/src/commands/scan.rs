// vigil/src/commands/scan.rs
//
// USE CASE: One scan pass over every pending/active rule.

use comfy_table::Table;
use tracing::warn;
use vigil_core::application::{CancellationToken, ScanEvaluator};
use vigil_core::domain::scan::ScanReport;
use vigil_core::infrastructure::fs::write_scan_report;

use crate::cli::{OutputFormat, StoreArgs};
use crate::commands::{Workspace, print_json};

pub async fn execute(store: StoreArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ws = Workspace::open(&store)?;

    // Ctrl-C stops new rules from starting; finished ones are still committed
    // unless persist-on-cancel is off.
    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling scan");
                token.cancel();
            }
        })
    };

    let scanner = ScanEvaluator::new(
        ws.store.clone(),
        ws.store.clone(),
        ws.store.clone(),
        ws.config.clone(),
    );
    let result = scanner.scan_all(&token).await;
    interrupt.abort();

    match result {
        Ok(report) => {
            if let Some(path) = &ws.config.report_path {
                write_scan_report(&ws.project_dir.join(path), &report)?;
            }
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => render(&report),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("\n💥 SCAN ABORTED: {:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }
}

fn render(report: &ScanReport) {
    let mut table = Table::new();
    table.set_header(vec!["Rule", "Outcome", "Rows", "Detail"]);
    for rule in &report.rules {
        let detail = match (&rule.error, rule.truncated) {
            (Some(e), _) => e.clone(),
            (None, true) => "row cap reached".to_string(),
            (None, false) => String::new(),
        };
        table.add_row(vec![
            format!("{} ({})", rule.rule_name, rule.rule_id),
            rule.outcome.clone(),
            rule.matched_rows.to_string(),
            detail,
        ]);
    }
    println!("{table}");

    if report.cancelled {
        println!("⚠️  Scan was cancelled, remaining rules were skipped.");
    }
    println!(
        "\n✨ {} rule(s) evaluated, {} failed, {} new violation(s) in {}ms",
        report.rules_evaluated, report.rules_failed, report.violations_found, report.duration_ms
    );
}
