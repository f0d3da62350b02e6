//! Error types for the gym_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gym_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Transport error talking to the hosted backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Rejected user input (unknown exercise, bad variant, bad number)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A record referenced by id or date does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No valid session; the user must sign in first
    #[error("Not signed in: {0}")]
    Unauthorized(String),

    /// The backend answered with an error status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
