//! Centralized error handling for the EmotiCat client core
//!
//! Every flow owns a layer error type; `AppError` unifies them for callers
//! that sit above several flows (the CLI, the application context).
//!
//! # Error Categories
//!
//! - **Transport**: network failures, non-2xx statuses, malformed JSON
//! - **In-band analysis**: the analysis endpoint answered 2xx but the label
//!   carries the reserved error prefix
//! - **Local I/O**: image normalization and cache file failures
//! - **Validation**: required local input missing before any network call
//!
//! # Usage
//!
//! ```rust
//! use emoticat::errors::{AppError, AppResult};
//!
//! fn require_name(name: &str) -> AppResult<&str> {
//!     if name.trim().is_empty() {
//!         return Err(AppError::validation("pet name is required"));
//!     }
//!     Ok(name)
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for remote API Results
pub type ApiResult<T> = Result<T, ApiError>;

/// Convenience type alias for image cache Results
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for analysis pipeline Results
pub type AnalysisResult<T> = Result<T, AnalysisError>;
