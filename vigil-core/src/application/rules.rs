// vigil-core/src/application/rules.rs

use tracing::instrument;

use crate::domain::rule::{Rule, RuleStatus};
use crate::error::VigilError;
use crate::ports::store::RuleSource;

/// Stored rules, optionally restricted to one status.
#[instrument(skip(source))]
pub async fn list_rules(
    source: &dyn RuleSource,
    status: Option<RuleStatus>,
) -> Result<Vec<Rule>, VigilError> {
    let statuses = match status {
        Some(status) => vec![status],
        None => vec![RuleStatus::Pending, RuleStatus::Active, RuleStatus::Disabled],
    };
    source.fetch_rules(&statuses).await
}
