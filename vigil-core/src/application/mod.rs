// vigil-core/src/application/mod.rs

pub mod cancel;
pub mod compile;
pub mod engine;
pub mod import;
pub mod rules;
pub mod scan;
pub mod violations;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use vigil_core::application::{ScanEvaluator, import_rules};`

pub use cancel::CancellationToken;
pub use compile::{CompileResult, CompiledRule, compile_rules};
pub use engine::execute_isolated;
pub use import::{ImportSummary, RejectedRule, import_rules};
pub use rules::list_rules;
pub use scan::{ScanError, ScanEvaluator};
pub use violations::list_violations;
