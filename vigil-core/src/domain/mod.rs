pub mod compiler;
pub mod error;
pub mod rule;
pub mod scan;
pub mod violation;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::{CompileError, DomainError, ExecutionError};
