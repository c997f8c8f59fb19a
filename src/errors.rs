//! Error types for the quoteshot application.
//!
//! This module defines custom error types that categorize the failures
//! that can occur while generating, positioning and saving quotes.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the quoteshot application.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors raised by the HTTP client while talking to a quote or image API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote source answered, but not with something we can use.
    #[error("Unexpected response from {source_url}: {message}")]
    UnexpectedResponse { source_url: String, message: String },

    /// Quote was not found when performing an operation.
    #[error("Quote not found: {id}")]
    QuoteNotFound { id: String },

    /// Quote content rejected at the save boundary.
    #[error("Invalid quote: {message}")]
    InvalidQuote { message: String },

    /// Category name outside the supported set.
    #[error("Unknown category '{name}'")]
    InvalidCategory { name: String },

    /// The user (or platform) refused access to the photo or media library.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Flattening the composition into an asset failed.
    #[error("Capture failed: {message}")]
    CaptureFailed { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
