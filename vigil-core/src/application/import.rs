// vigil-core/src/application/import.rs

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::rule::Rule;
use crate::error::VigilError;
use crate::infrastructure::config::RuleDocument;
use crate::ports::store::RuleSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRule {
    /// Position of the record in the source document.
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub accepted: Vec<Rule>,
    pub rejected: Vec<RejectedRule>,
}

/// Validates every record of `document` and stores the valid ones in one
/// transaction. Invalid records are reported, never stored.
#[instrument(skip(source, document), fields(entries = document.entries.len()))]
pub async fn import_rules(
    source: &dyn RuleSource,
    document: RuleDocument,
) -> Result<ImportSummary, VigilError> {
    let created_at = Utc::now();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for entry in document.entries {
        let record = match entry.record {
            Ok(record) => record,
            Err(reason) => {
                warn!(index = entry.index, %reason, "Rule record rejected");
                rejected.push(RejectedRule {
                    index: entry.index,
                    name: None,
                    reason,
                });
                continue;
            }
        };

        match record.validate() {
            Ok(_) => accepted.push(record.into_rule(Uuid::new_v4().to_string(), created_at)),
            Err(e) => {
                warn!(index = entry.index, rule_name = %record.name, error = %e, "Rule record rejected");
                rejected.push(RejectedRule {
                    index: entry.index,
                    name: Some(record.name),
                    reason: e.to_string(),
                });
            }
        }
    }

    if !accepted.is_empty() {
        source.insert_rules(&accepted).await?;
    }
    info!(
        accepted = accepted.len(),
        rejected = rejected.len(),
        "Rule import finished"
    );
    Ok(ImportSummary { accepted, rejected })
}
