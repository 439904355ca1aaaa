//! Shared types, errors, and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Amount helpers with decimal precision and the balance tolerance
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management, including the ledger account mapping

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AccountMapping, AppConfig, ConsolidationConfig, DatabaseConfig, LedgerConfig, RetryConfig,
    ServerConfig,
};
pub use error::{AppError, AppResult};
