//! PaperDigest Common Library
//!
//! Shared code for the PaperDigest services including:
//! - Summary entity and repository abstraction
//! - Error types and HTTP mapping
//! - Configuration management
//! - Bearer-token authentication
//! - Metrics helpers

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::models::{NewSummary, Summary};
pub use db::SummaryRepository;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
