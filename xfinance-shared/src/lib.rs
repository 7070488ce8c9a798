//! # xFinance Shared Library
//!
//! Types, persistence and business logic shared by the xFinance API server
//! and the maintenance worker.
//!
//! ## Module Organization
//!
//! - `auth`: Passwords, JWTs, request auth context and role checks
//! - `db`: Connection pool and schema migrations
//! - `ledger`: Journal parsing, ledger reconstruction, trial balance, rates
//! - `models`: Database models and their CRUD operations

pub mod auth;
pub mod db;
pub mod ledger;
pub mod models;

/// Current version of the xFinance shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
