//! Per-file callback contract and failure isolation.

use std::error::Error;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use chrono_tz::Tz;
use futures::FutureExt;
use futures::future::BoxFuture;

use trawl_core::Logger;

use crate::enumerator::VisitOutcome;

/// Error returned by a [`FileHandler`].
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Result of handling one file.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// A discovered file handed to the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Path relative to the input directory, `/`-separated.
    pub path: String,
    /// Start of the span the file covers, when its location or name carries
    /// a date. Always `None` for unstructured input.
    pub date: Option<DateTime<Tz>>,
}

impl InputFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: DateTime<Tz>) -> Self {
        self.date = Some(date);
        self
    }

    /// Join the relative path onto `root`.
    pub fn absolute(&self, root: &Path) -> PathBuf {
        self.path.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

/// Async callback invoked once per matched file.
///
/// Any `Fn(InputFile) -> impl Future<Output = HandlerResult>` closure is a
/// handler.
pub trait FileHandler: Send + Sync {
    fn handle(&self, file: InputFile) -> BoxFuture<'_, HandlerResult>;
}

impl<F, Fut> FileHandler for F
where
    F: Fn(InputFile) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, file: InputFile) -> BoxFuture<'_, HandlerResult> {
        Box::pin(self(file))
    }
}

/// Run `handler` on `file`, logging a failure instead of propagating it.
///
/// A panic, whether raised while building the future or while polling it,
/// is logged and counted as a failure like a returned error.
pub(crate) async fn invoke(
    handler: &dyn FileHandler,
    logger: &dyn Logger,
    file: InputFile,
) -> VisitOutcome {
    let path = file.path.clone();
    let result = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(file))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(payload) => Err(payload),
    };

    match result {
        Ok(Ok(())) => VisitOutcome::Succeeded,
        Ok(Err(err)) => {
            logger.error(&describe_failure(&path, &*err));
            VisitOutcome::Failed
        }
        Err(payload) => {
            logger.error(&format!(
                "Error processing file {path}: {}",
                panic_message(&*payload)
            ));
            VisitOutcome::Failed
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    }
}

/// The error line logged for a failed file.
///
/// When the error has causes they follow on separate lines.
pub fn describe_failure(path: &str, err: &(dyn Error + 'static)) -> String {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(format!("Caused by: {cause}"));
        source = cause.source();
    }

    if causes.is_empty() {
        format!("Error processing file {path}: {err}")
    } else {
        format!("Error processing file {path}: {err}\n{}", causes.join("\n"))
    }
}
