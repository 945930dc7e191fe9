// vigil-core/src/error.rs

use crate::domain::error::{CompileError, DomainError};
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VigilError {
    // --- ERREURS DU DOMAINE (Règles, Compilation) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (DuckDB, IO, Parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ERREURS GÉNÉRIQUES / APPLICATIVES ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementations to avoid duplicate enum variants but keep ergonomics
impl From<std::io::Error> for VigilError {
    fn from(err: std::io::Error) -> Self {
        VigilError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for VigilError {
    fn from(err: duckdb::Error) -> Self {
        VigilError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(err)))
    }
}

impl From<DatabaseError> for VigilError {
    fn from(err: DatabaseError) -> Self {
        VigilError::Infrastructure(InfrastructureError::Database(err))
    }
}

impl From<CompileError> for VigilError {
    fn from(err: CompileError) -> Self {
        VigilError::Domain(DomainError::Compile(err))
    }
}

impl From<serde_json::Error> for VigilError {
    fn from(err: serde_json::Error) -> Self {
        VigilError::Infrastructure(InfrastructureError::JsonError(err))
    }
}
