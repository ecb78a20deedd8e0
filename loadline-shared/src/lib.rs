//! # Loadline Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the Loadline API server and ingestion worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `tenancy`: Tenant selection, session context, and impersonation
//! - `flags`: Feature flag resolution and per-session cache
//! - `auth`: Authentication and authorization utilities
//! - `geo`: Great-circle distance math
//! - `hunter`: Load-offer parsing and hunt-plan matching
//! - `billing`: Driver pay formulas and report rows
//! - `sync`: Row mirror with last-write-wins merge
//! - `db`: Connection pool and embedded migrations

pub mod auth;
pub mod billing;
pub mod db;
pub mod flags;
pub mod geo;
pub mod hunter;
pub mod models;
pub mod sync;
pub mod tenancy;

/// Current version of the Loadline shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
