//! Discovery over date-partitioned directories.

use std::path::PathBuf;

use chrono::Utc;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use trawl_core::{
    DateWindow, FileStamp, FilenameSchema, InputStructure, Logger, Precision, Result,
    normalize_extensions,
};

use crate::enumerator::{EnumerateOptions, EnumerationSummary, Enumerator, VisitOutcome, Visitor};
use crate::handler::{FileHandler, InputFile, invoke};
use crate::pattern::partition_pattern;

/// Parameters of one structured traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredRequest {
    pub root: PathBuf,
    pub structure: InputStructure,
    pub schema: FilenameSchema,
    pub extensions: Vec<String>,
    pub window: DateWindow,
    /// Cap on files visited across all partitions.
    pub limit: Option<usize>,
    pub concurrency: usize,
}

impl StructuredRequest {
    pub fn new(root: impl Into<PathBuf>, structure: InputStructure, window: DateWindow) -> Self {
        Self {
            root: root.into(),
            structure,
            schema: FilenameSchema::default(),
            extensions: Vec::new(),
            window,
            limit: None,
            concurrency: 1,
        }
    }

    pub fn schema(mut self, schema: FilenameSchema) -> Self {
        self.schema = schema;
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

/// Walks the partitions a date window touches, oldest first, and hands
/// each in-window file to the handler with its date.
pub struct StructuredScanner<'e> {
    enumerator: &'e dyn Enumerator,
}

impl<'e> StructuredScanner<'e> {
    pub fn new(enumerator: &'e dyn Enumerator) -> Self {
        Self { enumerator }
    }

    /// Returns the number of files whose handler completed without error.
    ///
    /// Partitions are scanned one after another; the concurrency bound
    /// applies within a partition. Missing partition directories contribute
    /// nothing. Files whose date falls outside the window, or cannot be
    /// read from the path, are skipped and do not count toward the limit.
    pub async fn process(
        &self,
        request: &StructuredRequest,
        logger: &dyn Logger,
        handler: &dyn FileHandler,
        cancel: CancellationToken,
    ) -> Result<usize> {
        let window = &request.window;
        let partitions = request.structure.partitions(window);
        let extensions = normalize_extensions(&request.extensions);

        logger.info(&format!(
            "Processing structured files in {} from {} to {} ({}) across {} partitions",
            request.root.display(),
            window.start().to_rfc3339(),
            window.end().to_rfc3339(),
            window.timezone(),
            partitions.len()
        ));
        if !extensions.is_empty() {
            logger.debug(&format!(
                "Applying extension filter: {}",
                extensions.join(",")
            ));
        }

        let visitor = PartitionVisitor {
            request,
            logger,
            handler,
        };

        let mut total = EnumerationSummary::default();
        for partition in &partitions {
            if cancel.is_cancelled() {
                logger.warn(&format!(
                    "Structured traversal cancelled after {} files",
                    total.visited
                ));
                break;
            }

            let remaining = match request.limit {
                Some(limit) if total.visited >= limit => {
                    logger.debug(&format!("Reached limit of {limit} files"));
                    break;
                }
                Some(limit) => Some(limit - total.visited),
                None => None,
            };

            let pattern =
                partition_pattern(partition, &request.schema, request.structure, &extensions);
            logger.debug(&format!(
                "Scanning partition {} with pattern {}",
                partition.label(),
                pattern
            ));

            let options = EnumerateOptions::new(pattern)
                .with_limit(remaining)
                .with_concurrency(request.concurrency)
                .with_cancel(cancel.clone());
            let summary = self
                .enumerator
                .enumerate(&request.root, &visitor, options)
                .await?;
            total.merge(summary);
        }

        Ok(total.succeeded)
    }
}

struct PartitionVisitor<'a> {
    request: &'a StructuredRequest,
    logger: &'a dyn Logger,
    handler: &'a dyn FileHandler,
}

impl PartitionVisitor<'_> {
    /// A name carrying a time is a point in time and must lie inside the
    /// window; coarser stamps cover a whole unit and only need to touch it.
    fn in_window(&self, stamp: &FileStamp) -> bool {
        let window = &self.request.window;
        let (start, end) = stamp.span(window.timezone());
        match stamp.precision() {
            Precision::Minute => window.contains(start.with_timezone(&Utc)),
            _ => window.overlaps(start, end),
        }
    }
}

impl Visitor for PartitionVisitor<'_> {
    fn accept(&self, path: &str) -> bool {
        let request = self.request;
        match request.schema.stamp(request.structure, path) {
            Err(_) => {
                self.logger
                    .warn(&format!("Skipping file {path}: unable to determine date"));
                false
            }
            Ok(Some(stamp)) if !self.in_window(&stamp) => {
                self.logger
                    .debug(&format!("Skipping file {path} outside of window"));
                false
            }
            Ok(_) => true,
        }
    }

    fn visit<'a>(&'a self, path: String) -> BoxFuture<'a, VisitOutcome> {
        Box::pin(async move {
            let request = self.request;
            let date = request
                .schema
                .stamp(request.structure, &path)
                .ok()
                .flatten()
                .map(|stamp| stamp.span(request.window.timezone()).0);

            let mut file = InputFile::new(path);
            if let Some(date) = date {
                file = file.with_date(date);
            }

            self.logger.debug(&format!("Processing file {}", file.path));
            invoke(self.handler, self.logger, file).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use trawl_core::{
        FilenameOption, LogLevel, RecordingLogger, Tz, parse_end_instant, parse_instant,
    };

    use super::*;
    use crate::handler::HandlerError;
    use crate::memory::MemoryEnumerator;

    fn window(start: &str, end: &str) -> DateWindow {
        let tz = Tz::UTC;
        DateWindow::new(
            parse_instant(start, tz).unwrap(),
            parse_end_instant(end, tz).unwrap(),
            tz,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_scans_each_partition_in_order() {
        let enumerator = MemoryEnumerator::new([
            "2024/01/30/a.txt",
            "2024/01/31/b.txt",
            "2024/02/01/c.txt",
            "2024/02/02/d.txt",
        ]);
        let logger = RecordingLogger::new();
        let seen = Mutex::new(Vec::new());
        let handler = |file: InputFile| {
            seen.lock().unwrap().push(file.path);
            async { Ok::<(), HandlerError>(()) }
        };

        let request = StructuredRequest::new(
            "/in",
            InputStructure::Day,
            window("2024-01-31", "2024-02-01"),
        );
        let count = StructuredScanner::new(&enumerator)
            .process(&request, &logger, &handler, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(*seen.lock().unwrap(), vec!["2024/01/31/b.txt", "2024/02/01/c.txt"]);
        let patterns: Vec<String> = enumerator.calls().into_iter().map(|c| c.pattern).collect();
        assert_eq!(patterns, vec!["2024/01/31/*.*", "2024/02/01/*.*"]);
        assert!(logger.contains(
            LogLevel::Debug,
            "Scanning partition 2024/01/31 with pattern 2024/01/31/*.*"
        ));
    }

    #[tokio::test]
    async fn test_skips_undated_names_in_dated_schema() {
        let enumerator = MemoryEnumerator::new(["2024/01/05-note.txt", "2024/01/xx-note.txt"]);
        let logger = RecordingLogger::new();
        let handler = |_file: InputFile| async { Ok::<(), HandlerError>(()) };

        let request = StructuredRequest::new(
            "/in",
            InputStructure::Month,
            window("2024-01-01", "2024-01-31"),
        )
        .schema(FilenameSchema::new([FilenameOption::Date, FilenameOption::Subject]));

        let count = StructuredScanner::new(&enumerator)
            .process(&request, &logger, &handler, CancellationToken::new())
            .await
            .unwrap();

        // The `[0-9][0-9]` prefix keeps the malformed name out of the match set.
        assert_eq!(count, 1);
        assert_eq!(enumerator.calls()[0].pattern, "2024/01/[0-9][0-9]*.*");
    }

    #[tokio::test]
    async fn test_inverted_window_scans_nothing() {
        let enumerator = MemoryEnumerator::new(["2024/01/01/a.txt"]);
        let logger = RecordingLogger::new();
        let handler = |_file: InputFile| async { Ok::<(), HandlerError>(()) };

        let tz = Tz::UTC;
        let inverted = DateWindow::unchecked(
            parse_instant("2024-02-01", tz).unwrap(),
            parse_instant("2024-01-01", tz).unwrap(),
            tz,
        );
        let request = StructuredRequest::new("/in", InputStructure::Day, inverted);
        let count = StructuredScanner::new(&enumerator)
            .process(&request, &logger, &handler, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert!(enumerator.calls().is_empty());
    }
}
