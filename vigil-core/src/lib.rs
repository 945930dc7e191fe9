// vigil-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- MODULES HEXAGONAUX ---

// 1. Ports (Interfaces / Traits)
// Contracts with the relational store (RuleSource, QueryRunner, ViolationSink).
pub mod ports;

// 2. Domain
// Rules, operator algebra, query compiler, violations. Pure: no I/O.
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB store, configuration and rule files, filesystem helpers.
pub mod infrastructure;

// 4. Application (Use Cases)
// Scan pass, rule import, dry-run compile, listings.
pub mod application;

// --- GESTION DES ERREURS GLOBALE ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::VigilError;
