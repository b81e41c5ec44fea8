//! Error types for input traversal.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while dispatching or traversing input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The `input` feature is not enabled.
    #[error("Input feature is not enabled, skipping input processing")]
    FeatureDisabled,

    /// A required setting is absent from the configuration.
    #[error("{setting} is not configured")]
    ConfigMissing { setting: &'static str },

    /// Structured input was requested without both window bounds.
    #[error("Start or end date are both required for structured input")]
    WindowRequired,

    /// Unstructured input was requested with a window bound.
    #[error("Start or end date is not allowed for unstructured input")]
    WindowNotAllowed,

    /// Window bounds are inverted.
    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Timezone is not a known IANA zone name.
    #[error("Invalid timezone: {name}")]
    InvalidTimezone { name: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Glob pattern failed to compile.
    #[error("Invalid pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A date or instant string could not be parsed.
    #[error("Invalid date: {input}")]
    InvalidDate { input: String },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Directory walk failed part way through.
    #[error("Walk error at {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl InputError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this error was raised before any traversal started.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::FeatureDisabled
                | Self::ConfigMissing { .. }
                | Self::WindowRequired
                | Self::WindowNotAllowed
                | Self::InvalidWindow { .. }
                | Self::InvalidTimezone { .. }
                | Self::InvalidConfig { .. }
        )
    }
}

/// Result alias used across the trawl crates.
pub type Result<T> = std::result::Result<T, InputError>;
