//! Core shared library for the tenantlog services.
//!
//! This crate exposes the primitives every tenantlog binary depends on:
//! the canonical error type, configuration loading, the Postgres pool
//! wrapper, JSON helpers and tracing setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use errors::{ConfigError, Result as CoreResult, TenantLogError};
