//! Error types for the caddie pattern engine.
//!
//! Decay and aggregation never fail. Everything here comes from the edges:
//! parsing stored text back into shot fields, and the stores themselves.

use thiserror::Error;

/// Top-level error type for all caddie operations.
#[derive(Error, Debug)]
pub enum CaddieError {
    /// A shot field could not be parsed (unknown miss direction or lie).
    #[error("Invalid shot: {0}")]
    InvalidShot(String),

    /// A store collaborator could not serve the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background re-aggregation task failed to complete a refresh.
    #[error("Re-aggregation failed: {0}")]
    Reaggregation(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CaddieError>;
