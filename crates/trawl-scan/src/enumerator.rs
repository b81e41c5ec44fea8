//! Enumerator contract and the bounded visit driver.

use std::future::ready;
use std::path::Path;
use std::pin::pin;

use futures::future::BoxFuture;
use futures::stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use trawl_core::Result;

/// What happened to one visited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// The handler completed without error.
    Succeeded,
    /// The handler returned an error or panicked; it has already been logged.
    Failed,
}

/// Receives each matched file, relative to the enumeration root.
pub trait Visitor: Send + Sync {
    /// Decide whether a matched path is handed to [`visit`](Self::visit).
    ///
    /// Rejected paths are counted as skipped and do not use up the limit.
    fn accept(&self, path: &str) -> bool {
        let _ = path;
        true
    }

    fn visit<'a>(&'a self, path: String) -> BoxFuture<'a, VisitOutcome>;
}

/// Options for one enumeration.
#[derive(Debug, Clone)]
pub struct EnumerateOptions {
    /// Glob applied to `/`-separated paths relative to the root.
    pub pattern: String,
    /// Hard cap on accepted matches handed to the visitor.
    pub limit: Option<usize>,
    /// Maximum visits in flight at once.
    pub concurrency: usize,
    /// Stops new visits from starting once cancelled.
    pub cancel: CancellationToken,
}

impl EnumerateOptions {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            limit: None,
            concurrency: 1,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Set the in-flight bound; zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Tally of one or more enumerations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationSummary {
    /// Accepted matches handed to the visitor.
    pub visited: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Matches the visitor rejected.
    pub skipped: usize,
}

impl EnumerationSummary {
    /// Count one visit.
    pub fn record(&mut self, outcome: VisitOutcome) {
        self.visited += 1;
        match outcome {
            VisitOutcome::Succeeded => self.succeeded += 1,
            VisitOutcome::Failed => self.failed += 1,
        }
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: EnumerationSummary) {
        self.visited += other.visited;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Discovers files under a root and drives a visitor over them.
///
/// Implementations must apply `options.pattern` to paths relative to `root`,
/// never visit more than `options.limit` accepted matches, and never have
/// more than `options.concurrency` visits outstanding.
pub trait Enumerator: Send + Sync {
    fn enumerate<'a>(
        &'a self,
        root: &'a Path,
        visitor: &'a dyn Visitor,
        options: EnumerateOptions,
    ) -> BoxFuture<'a, Result<EnumerationSummary>>;
}

/// Visit every path from `paths` under the bounds in `options`.
///
/// Paths are filtered through [`Visitor::accept`] and submitted in stream
/// order; at most `concurrency` visits run at once and completions are
/// tallied by this loop alone. The first error item from `paths` aborts the
/// run. Once `limit` paths have been accepted or the token is cancelled no
/// new visits start, and visits already running finish.
pub async fn drive<S>(
    paths: S,
    visitor: &dyn Visitor,
    options: &EnumerateOptions,
) -> Result<EnumerationSummary>
where
    S: Stream<Item = Result<String>> + Send,
{
    let limit = options.limit.unwrap_or(usize::MAX);
    let cancel = options.cancel.clone();
    let mut skipped = 0;

    let mut summary = {
        let mut visits = pin!(
            paths
                .filter(|entry| {
                    let accepted = match entry {
                        Ok(path) => visitor.accept(path),
                        Err(_) => true,
                    };
                    if !accepted {
                        skipped += 1;
                    }
                    ready(accepted)
                })
                .take(limit)
                .take_until(async move { cancel.cancelled().await })
                .map(move |entry| async move {
                    match entry {
                        Ok(path) => Ok(visitor.visit(path).await),
                        Err(err) => Err(err),
                    }
                })
                .buffer_unordered(options.concurrency.max(1))
        );

        let mut summary = EnumerationSummary::default();
        while let Some(outcome) = visits.next().await {
            summary.record(outcome?);
        }
        summary
    };

    summary.skipped = skipped;
    Ok(summary)
}
