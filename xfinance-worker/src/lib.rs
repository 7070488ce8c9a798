//! # xFinance Worker Library
//!
//! Background maintenance for the xFinance backend.
//!
//! ## Modules
//!
//! - `config`: Environment configuration
//! - `retention`: Audit log retention loop

pub mod config;
pub mod retention;
