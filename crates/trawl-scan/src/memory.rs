//! In-memory enumerator for tests and dry runs.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::stream;

use trawl_core::Result;

use crate::enumerator::{EnumerateOptions, EnumerationSummary, Enumerator, Visitor, drive};
use crate::glob::GlobPattern;

/// One recorded call to [`MemoryEnumerator::enumerate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateCall {
    pub root: PathBuf,
    pub pattern: String,
    pub limit: Option<usize>,
    pub concurrency: usize,
}

/// Serves a fixed list of relative paths, matched with the same glob rules
/// as [`GlobEnumerator`](crate::GlobEnumerator).
#[derive(Debug, Default)]
pub struct MemoryEnumerator {
    files: Vec<String>,
    calls: Mutex<Vec<EnumerateCall>>,
}

impl MemoryEnumerator {
    /// Paths are `/`-separated and relative to whatever root is enumerated.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files: Vec<String> = files.into_iter().map(Into::into).collect();
        files.sort();
        Self {
            files,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<EnumerateCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Enumerator for MemoryEnumerator {
    fn enumerate<'a>(
        &'a self,
        root: &'a Path,
        visitor: &'a dyn Visitor,
        options: EnumerateOptions,
    ) -> BoxFuture<'a, Result<EnumerationSummary>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(EnumerateCall {
                    root: root.to_path_buf(),
                    pattern: options.pattern.clone(),
                    limit: options.limit,
                    concurrency: options.concurrency,
                });
            }

            let pattern = GlobPattern::compile(&options.pattern)?;
            let matches: Vec<Result<String>> = self
                .files
                .iter()
                .filter(|path| pattern.is_match(path))
                .map(|path| Ok(path.clone()))
                .collect();

            drive(stream::iter(matches), visitor, &options).await
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::enumerator::VisitOutcome;

    use super::*;

    struct Count;

    impl Visitor for Count {
        fn visit<'a>(&'a self, _path: String) -> BoxFuture<'a, VisitOutcome> {
            Box::pin(async { VisitOutcome::Succeeded })
        }
    }

    #[tokio::test]
    async fn test_matches_and_records_calls() {
        let enumerator = MemoryEnumerator::new(["b.txt", "a.txt", "dir/c.txt", "d.csv"]);
        let summary = enumerator
            .enumerate(
                Path::new("/in"),
                &Count,
                EnumerateOptions::new("*.{txt}").with_concurrency(4),
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(
            enumerator.calls(),
            vec![EnumerateCall {
                root: PathBuf::from("/in"),
                pattern: "*.{txt}".to_string(),
                limit: None,
                concurrency: 4,
            }]
        );
    }
}
