//! # Dayplan Shared Library
//!
//! This crate contains the models, persistence helpers, and authentication
//! primitives used by the Dayplan API server and its test suites.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, completion records)
//! - `auth`: Password hashing, token signing, and the session manager
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Dayplan shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
