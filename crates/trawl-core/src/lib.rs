//! Core types and traits for trawl.
//!
//! This crate provides the configuration, error taxonomy, logging capability
//! and date model shared by the traversal engine: input structures, filename
//! schemas and date windows.

mod config;
mod error;
mod feature;
mod filename;
mod logger;
mod structure;
mod window;

pub use config::{InputConfig, InputConfigBuilder, normalize_extensions};
pub use error::{InputError, Result};
pub use feature::{Feature, is_enabled};
pub use filename::{FileStamp, FilenameOption, FilenameSchema, Precision};
pub use logger::{LogEntry, LogLevel, Logger, PrefixedLogger, RecordingLogger, TracingLogger};
pub use structure::{InputStructure, Partition};
pub use window::{
    DateWindow, WindowBounds, parse_end_instant, parse_instant, parse_timezone, resolve_local,
};

/// Re-exported so callers can name zones without a direct dependency.
pub use chrono_tz::Tz;
