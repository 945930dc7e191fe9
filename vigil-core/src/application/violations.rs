// vigil-core/src/application/violations.rs

use tracing::{debug, instrument};

use crate::domain::violation::{ViolationFilter, ViolationView};
use crate::error::VigilError;
use crate::ports::store::ViolationSink;

/// Violations matching `filter`, newest first, with their rule's name and type.
#[instrument(skip(sink))]
pub async fn list_violations(
    sink: &dyn ViolationSink,
    filter: &ViolationFilter,
) -> Result<Vec<ViolationView>, VigilError> {
    let views = sink.list_violations(filter).await?;
    debug!(count = views.len(), "Violations listed");
    Ok(views)
}
