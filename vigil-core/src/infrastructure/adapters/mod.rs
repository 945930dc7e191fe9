// vigil-core/src/infrastructure/adapters/mod.rs

pub mod bootstrap;
pub mod duckdb;

pub use self::duckdb::DuckDBStore;
