//! # xFinance API Server Library
//!
//! HTTP backend of the xFinance spreadsheet add-in: authentication,
//! bookkeeping masters, access administration, workspace data and the
//! ledger engine.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: First-run admin account
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
