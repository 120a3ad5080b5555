//! Error types for Shelter operations.
//!
//! This module defines [`ShelterError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Input errors (bad config, missing files) are fatal and never retried
//! - Ambiguity errors list every match so the operator can disambiguate
//! - "No compatible update" is not an error; it is an `Ok` outcome
//! - Transfer errors leave the installed image untouched
//! - Use `anyhow::Error` (via `ShelterError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Shelter operations.
#[derive(Debug, Error)]
pub enum ShelterError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a configuration or metadata file.
    #[error("Failed to parse {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A configuration layer whose top level is not a mapping.
    #[error("Configuration layer from {source_name} is not a mapping")]
    InvalidLayer { source_name: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A `{placeholder}` that does not name a descriptor field.
    #[error("Unknown placeholder '{{{placeholder}}}' in '{value}'")]
    UnknownPlaceholder { placeholder: String, value: String },

    /// Container type with no image back-end.
    #[error("Unsupported container type: {name}")]
    UnsupportedContainerType { name: String },

    /// Two environment descriptors declare the same name.
    #[error("Environment name '{name}' is declared by both {first} and {second}")]
    DuplicateEnvironment {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Setup target already exists.
    #[error("Environment already exists: {path}")]
    EnvironmentExists { path: PathBuf },

    /// Nothing matched a selection that expected exactly one item.
    #[error("No {what} matches {filter}")]
    NoMatch { what: String, filter: String },

    /// Several items matched a selection that expected exactly one.
    #[error("Several {what} match, select one of: {}", .matches.join(", "))]
    Ambiguous { what: String, matches: Vec<String> },

    /// Network failure while listing or transferring.
    #[error("Transfer of {url} failed: {message}")]
    Transfer { url: String, message: String },

    /// Remote metadata that cannot be verified.
    #[error("Metadata at {url} has no md5 or size")]
    MissingChecksum { url: String },

    /// Downloaded content does not match its metadata.
    #[error("Integrity check failed for {path}: expected {expected}, got {actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Installed image cannot serve the environment's pinned image.
    #[error(
        "Environment '{environment}' requires image id {pinned} but installed image is {installed} \
         and does not declare it compatible"
    )]
    Incompatible {
        environment: String,
        pinned: String,
        installed: String,
    },

    /// Launching a container failed or is not possible.
    #[error("Cannot launch environment '{environment}': {message}")]
    Launch { environment: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Shelter operations.
pub type Result<T> = std::result::Result<T, ShelterError>;
