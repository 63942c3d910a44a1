//! Error type definitions for the EmotiCat client core

use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure taxonomy shared by every flow.
///
/// All categories are recoverable by user retry; none is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    InBandAnalysis,
    LocalIo,
    Validation,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transport => "transport",
            ErrorCategory::InBandAnalysis => "in_band_analysis",
            ErrorCategory::LocalIo => "local_io",
            ErrorCategory::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Image cache errors
    #[error("Image cache error: {0}")]
    Cache(#[from] CacheError),

    /// Analysis pipeline errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Missing or invalid local input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found in local state
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Local filesystem errors outside the image cache
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local state (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Transport-level errors talking to the EmotiCat backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network unreachable, connection reset, timeout
    #[error("Request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    /// Non-2xx HTTP status
    #[error("HTTP {status} from {endpoint}: {message}")]
    Status {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// Body was not the JSON shape we expected
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// Streamed body exceeded the configured limit
    #[error("Payload too large from {endpoint}: more than {max_size} bytes")]
    PayloadTooLarge { endpoint: String, max_size: u64 },

    /// Request could not be built (bad URL, bad multipart part)
    #[error("Invalid request for {endpoint}: {message}")]
    InvalidRequest { endpoint: String, message: String },
}

/// Image cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Remote fetch failed; the caller should render a placeholder
    #[error("Failed to fetch image '{key}': {message}")]
    ImageFetchFailed { key: String, message: String },

    /// Key sanitizes to an empty path
    #[error("Invalid image key '{key}'")]
    InvalidKey { key: String },

    /// Writing or inspecting a cache file failed
    #[error("Cache I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The persisted key→path index could not be read or written
    #[error("Cache index error: {0}")]
    Index(#[from] serde_json::Error),
}

/// Analysis pipeline errors; every variant ends the attempt in `Failed`
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Missing image or pet before submission
    #[error("{message}")]
    Validation { message: String },

    /// Pet is not present in the local store
    #[error("Unknown pet {pet_id}")]
    UnknownPet { pet_id: i64 },

    /// Decoding, resizing or re-encoding the photo failed
    #[error("Image normalization failed: {message}")]
    Normalization { message: String },

    /// Analysis or detail request failed at transport level
    #[error("{0}")]
    Transport(#[from] ApiError),

    /// Endpoint answered 2xx with an error-prefixed label
    #[error("Analysis rejected: {label}")]
    InBand { label: String },

    /// Response missing required fields
    #[error("Malformed analysis response: {message}")]
    MalformedResponse { message: String },

    /// Stage machine was driven out of order
    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: ToString>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Api(e) => e.category(),
            AppError::Cache(e) => e.category(),
            AppError::Analysis(e) => e.category(),
            AppError::Validation { .. } | AppError::NotFound { .. } => ErrorCategory::Validation,
            AppError::Configuration { .. }
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Internal { .. } => ErrorCategory::LocalIo,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { message } => message.clone(),
            AppError::NotFound { resource, id } => format!("No {resource} with id {id}"),
            AppError::Analysis(e) => e.user_message(),
            other => match other.category() {
                ErrorCategory::Transport => {
                    "Could not reach EmotiCat. Check your connection and try again.".to_string()
                }
                _ => "Something went wrong. Please try again.".to_string(),
            },
        }
    }
}

impl ApiError {
    pub fn network<E: Into<String>, M: ToString>(endpoint: E, message: M) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed<E: Into<String>, M: ToString>(endpoint: E, message: M) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::InvalidRequest { .. } => ErrorCategory::Validation,
            _ => ErrorCategory::Transport,
        }
    }

    /// HTTP status if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl CacheError {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CacheError::ImageFetchFailed { .. } => ErrorCategory::Transport,
            CacheError::InvalidKey { .. } => ErrorCategory::Validation,
            CacheError::Io { .. } | CacheError::Index(_) => ErrorCategory::LocalIo,
        }
    }
}

impl AnalysisError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::Validation { .. } | AnalysisError::UnknownPet { .. } => {
                ErrorCategory::Validation
            }
            AnalysisError::Normalization { .. } | AnalysisError::InvalidTransition { .. } => {
                ErrorCategory::LocalIo
            }
            AnalysisError::Transport(e) => e.category(),
            AnalysisError::MalformedResponse { .. } => ErrorCategory::Transport,
            AnalysisError::InBand { .. } => ErrorCategory::InBandAnalysis,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Validation { message } => message.clone(),
            AnalysisError::UnknownPet { pet_id } => {
                format!("Pet {pet_id} is not loaded. Refresh your pets and try again.")
            }
            AnalysisError::InBand { label } => label.clone(),
            _ => "Failed to analyze image. Please try again.".to_string(),
        }
    }
}
