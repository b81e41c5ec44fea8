//! Input traversal engine for trawl.
//!
//! This crate discovers input files and hands each one to an async
//! callback under a concurrency bound.
//!
//! # Overview
//!
//! `trawl-scan` has two discovery modes, chosen by the [`Dispatcher`]:
//!
//! - **Unstructured** glob discovery by extension, optionally recursive
//! - **Structured** discovery over `YYYY/MM/DD`-style date partitions,
//!   restricted to a date window
//!
//! A failing handler is logged and counted out; it never stops the run.
//! File discovery itself goes through an [`Enumerator`], so the filesystem
//! can be swapped for [`MemoryEnumerator`] in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use trawl_scan::{Feature, HandlerError, InputConfig, InputFile, TracingLogger, WindowBounds};
//!
//! # async fn run() -> trawl_scan::Result<()> {
//! let config = InputConfig::new("/var/mail/in");
//! let handler = |file: InputFile| async move {
//!     println!("{}", file.path);
//!     Ok::<(), HandlerError>(())
//! };
//!
//! let count = trawl_scan::process(
//!     &config,
//!     &[Feature::Input],
//!     &TracingLogger::new(),
//!     &handler,
//!     WindowBounds::default(),
//! )
//! .await?;
//! println!("Handled {count} files");
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! [`Dispatcher::process_with_cancel`] takes a `CancellationToken`; once it
//! fires no new handler starts and the call returns the count so far.

mod dispatch;
mod enumerator;
mod glob;
mod handler;
mod memory;
mod pattern;
mod structured;
mod unstructured;

pub use dispatch::{Dispatcher, process};
pub use enumerator::{
    EnumerateOptions, EnumerationSummary, Enumerator, VisitOutcome, Visitor, drive,
};
pub use glob::GlobEnumerator;
pub use handler::{FileHandler, HandlerError, HandlerResult, InputFile, describe_failure};
pub use memory::{EnumerateCall, MemoryEnumerator};
pub use pattern::{extension_glob, leaf_pattern, partition_pattern, unstructured_pattern};
pub use structured::{StructuredRequest, StructuredScanner};
pub use unstructured::{TraversalRequest, UnstructuredScanner};

pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use trawl_core::{
    DateWindow, Feature, FilenameOption, FilenameSchema, InputConfig, InputError, InputStructure,
    LogLevel, Logger, RecordingLogger, Result, TracingLogger, Tz, WindowBounds, parse_end_instant,
    parse_instant,
};
