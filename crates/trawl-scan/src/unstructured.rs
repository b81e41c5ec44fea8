//! Glob discovery over a flat or arbitrarily nested directory.

use std::path::PathBuf;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use trawl_core::{Logger, Result, normalize_extensions};

use crate::enumerator::{EnumerateOptions, Enumerator, VisitOutcome, Visitor};
use crate::handler::{FileHandler, InputFile, invoke};
use crate::pattern::unstructured_pattern;

/// Parameters of one unstructured traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalRequest {
    pub root: PathBuf,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub limit: Option<usize>,
    pub concurrency: usize,
}

impl TraversalRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            extensions: Vec::new(),
            limit: None,
            concurrency: 1,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Discovers files by extension, optionally recursing.
pub struct UnstructuredScanner<'e> {
    enumerator: &'e dyn Enumerator,
}

impl<'e> UnstructuredScanner<'e> {
    pub fn new(enumerator: &'e dyn Enumerator) -> Self {
        Self { enumerator }
    }

    /// Invoke `handler` on every matching file and return how many
    /// completed without error.
    ///
    /// Handler failures are logged and counted out; enumeration failures
    /// abort the traversal.
    pub async fn process(
        &self,
        request: &TraversalRequest,
        logger: &dyn Logger,
        handler: &dyn FileHandler,
        cancel: CancellationToken,
    ) -> Result<usize> {
        let extensions = normalize_extensions(&request.extensions);
        let pattern = unstructured_pattern(request.recursive, &extensions);

        logger.info(&format!(
            "Processing unstructured files {} in {} with pattern {}",
            if request.recursive {
                "recursively"
            } else {
                "non-recursively"
            },
            request.root.display(),
            pattern
        ));
        if !extensions.is_empty() {
            logger.debug(&format!(
                "Applying extension filter: {}",
                extensions.join(",")
            ));
        }

        let visitor = UnstructuredVisitor { logger, handler };
        let options = EnumerateOptions::new(pattern)
            .with_limit(request.limit)
            .with_concurrency(request.concurrency)
            .with_cancel(cancel);

        let summary = self
            .enumerator
            .enumerate(&request.root, &visitor, options)
            .await?;
        Ok(summary.succeeded)
    }
}

struct UnstructuredVisitor<'a> {
    logger: &'a dyn Logger,
    handler: &'a dyn FileHandler,
}

impl Visitor for UnstructuredVisitor<'_> {
    fn visit<'a>(&'a self, path: String) -> BoxFuture<'a, VisitOutcome> {
        Box::pin(async move {
            self.logger.debug(&format!("Processing file {path}"));
            invoke(self.handler, self.logger, InputFile::new(path)).await
        })
    }
}
