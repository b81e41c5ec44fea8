//! Filesystem enumerator backed by jwalk and globset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::BoxFuture;
use globset::{GlobBuilder, GlobMatcher};
use itertools::Itertools;
use jwalk::{Parallelism, WalkDir};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use trawl_core::{InputError, Result};

use crate::enumerator::{EnumerateOptions, EnumerationSummary, Enumerator, Visitor, drive};

/// A compiled glob plus the walk bounds implied by its shape.
#[derive(Debug, Clone)]
pub(crate) struct GlobPattern {
    matcher: GlobMatcher,
    /// Leading segments without wildcards; the walk starts here.
    base: PathBuf,
    /// Deepest match below `base`, or `None` when the pattern has `**`.
    max_depth: Option<usize>,
}

impl GlobPattern {
    pub(crate) fn compile(pattern: &str) -> Result<Self> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| InputError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?
            .compile_matcher();

        let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        // The final segment names files, never the walk base.
        let literal = segments
            .iter()
            .take_while(|s| !is_wildcard(s))
            .count()
            .min(segments.len().saturating_sub(1));
        let rest = &segments[literal..];

        Ok(Self {
            matcher,
            base: segments[..literal].iter().collect(),
            max_depth: if rest.iter().any(|s| s.contains("**")) {
                None
            } else {
                Some(rest.len())
            },
        })
    }

    /// Match a `/`-separated path relative to the enumeration root.
    pub(crate) fn is_match(&self, relative: &str) -> bool {
        self.matcher.is_match(relative)
    }

    pub(crate) fn base(&self) -> &Path {
        &self.base
    }
}

fn is_wildcard(segment: &str) -> bool {
    segment.contains(|c| matches!(c, '*' | '?' | '[' | '{'))
}

/// `/`-joined form of a relative path.
fn to_slash(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .join("/")
}

/// Enumerates regular files on disk.
///
/// The directory walk runs on a blocking thread and feeds matches through a
/// bounded channel, so discovery stays a few entries ahead of the handlers
/// and stops as soon as the consumer goes away. Matches arrive in
/// lexicographic order within each directory. Hidden entries are skipped.
#[derive(Debug, Clone)]
pub struct GlobEnumerator {
    follow_links: bool,
    buffer: usize,
}

impl Default for GlobEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobEnumerator {
    pub fn new() -> Self {
        Self {
            follow_links: false,
            buffer: 64,
        }
    }

    /// Follow symbolic links while walking.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Number of discovered paths allowed to queue ahead of the handlers.
    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

impl Enumerator for GlobEnumerator {
    fn enumerate<'a>(
        &'a self,
        root: &'a Path,
        visitor: &'a dyn Visitor,
        options: EnumerateOptions,
    ) -> BoxFuture<'a, Result<EnumerationSummary>> {
        Box::pin(async move {
            let walk = Walk {
                root: root.to_path_buf(),
                pattern: GlobPattern::compile(&options.pattern)?,
                follow_links: self.follow_links,
            };

            let (tx, rx) = mpsc::channel(self.buffer);
            let walker = tokio::task::spawn_blocking(move || walk.run(&tx));

            // Dropping the receiver inside `drive` is what stops the walk early.
            let result = drive(ReceiverStream::new(rx), visitor, &options).await;

            match walker.await {
                Ok(()) => result,
                Err(e) => result.and(Err(InputError::Other {
                    message: format!("Directory walk failed: {e}"),
                })),
            }
        })
    }
}

struct Walk {
    root: PathBuf,
    pattern: GlobPattern,
    follow_links: bool,
}

impl Walk {
    fn run(self, tx: &mpsc::Sender<Result<String>>) {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                let _ = tx.blocking_send(Err(InputError::NotADirectory {
                    path: self.root.clone(),
                }));
                return;
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(InputError::io(&self.root, e)));
                return;
            }
        }

        // A missing base (for example an absent date partition) matches nothing.
        let base = self.root.join(self.pattern.base());
        if !base.is_dir() {
            return;
        }

        let walker = WalkDir::new(&base)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            })
            .sort(true)
            .skip_hidden(true)
            .follow_links(self.follow_links)
            .min_depth(1)
            .max_depth(self.pattern.max_depth.unwrap_or(usize::MAX));

        for entry in walker {
            if tx.is_closed() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| base.clone());
                    let _ = tx.blocking_send(Err(InputError::Walk {
                        path,
                        message: err.to_string(),
                    }));
                    return;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let relative = to_slash(relative);
            if self.pattern.is_match(&relative) && tx.blocking_send(Ok(relative)).is_err() {
                return;
            }
        }
    }
}
