pub mod rules;
pub mod scan;

pub use rules::{RuleDocument, load_rule_document};
pub use scan::{ScanConfig, load_scan_config};
