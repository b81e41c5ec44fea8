//! Entry point: validates configuration and picks a discovery mode.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use trawl_core::{
    DateWindow, Feature, InputConfig, InputError, Logger, Result, WindowBounds, is_enabled,
};

use crate::enumerator::Enumerator;
use crate::glob::GlobEnumerator;
use crate::handler::FileHandler;
use crate::structured::{StructuredRequest, StructuredScanner};
use crate::unstructured::{TraversalRequest, UnstructuredScanner};

/// Routes a traversal to the structured or unstructured scanner.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<E = GlobEnumerator> {
    enumerator: E,
}

impl Dispatcher<GlobEnumerator> {
    /// Dispatcher over the real filesystem.
    pub fn new() -> Self {
        Self::with_enumerator(GlobEnumerator::new())
    }
}

impl<E: Enumerator> Dispatcher<E> {
    pub fn with_enumerator(enumerator: E) -> Self {
        Self { enumerator }
    }

    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    /// Process all input described by `config`, returning how many files the
    /// handler completed without error.
    pub async fn process(
        &self,
        config: &InputConfig,
        features: &[Feature],
        logger: &dyn Logger,
        handler: &dyn FileHandler,
        bounds: WindowBounds,
    ) -> Result<usize> {
        self.process_with_cancel(
            config,
            features,
            logger,
            handler,
            bounds,
            CancellationToken::new(),
        )
        .await
    }

    /// Like [`process`](Self::process), stopping early once `cancel` fires.
    ///
    /// Handlers already running when the token fires are allowed to finish.
    pub async fn process_with_cancel(
        &self,
        config: &InputConfig,
        features: &[Feature],
        logger: &dyn Logger,
        handler: &dyn FileHandler,
        bounds: WindowBounds,
        cancel: CancellationToken,
    ) -> Result<usize> {
        if !is_enabled(features, Feature::Input) {
            return Err(InputError::FeatureDisabled);
        }

        let concurrency = config.concurrency.ok_or(InputError::ConfigMissing {
            setting: "Concurrency",
        })?;
        if concurrency == 0 {
            return Err(InputError::InvalidConfig {
                message: "Concurrency must be at least 1".to_string(),
            });
        }

        let root = config
            .input_directory
            .as_ref()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or(InputError::ConfigMissing {
                setting: "Input directory",
            })?;

        let count = if is_enabled(features, Feature::StructuredInput) {
            logger.debug(&format!(
                "Processing Structured Input from {} with start date {} and end date {}",
                root.display(),
                render(bounds.start),
                render(bounds.end)
            ));

            let (Some(start), Some(end)) = (bounds.start, bounds.end) else {
                return Err(InputError::WindowRequired);
            };
            let tz = config.timezone()?;
            let window = DateWindow::new(start, end, tz)?;

            let request = StructuredRequest::new(root, config.input_structure, window)
                .schema(config.filename_schema())
                .extensions(config.extensions.iter().cloned())
                .limit(config.limit)
                .concurrency(concurrency);

            StructuredScanner::new(&self.enumerator)
                .process(&request, logger, handler, cancel)
                .await?
        } else {
            logger.debug(&format!("Processing Unstructured Input from {}", root.display()));

            if !bounds.is_empty() {
                return Err(InputError::WindowNotAllowed);
            }

            let request = TraversalRequest::new(root)
                .recursive(config.recursive)
                .extensions(config.extensions.iter().cloned())
                .limit(config.limit)
                .concurrency(concurrency);

            UnstructuredScanner::new(&self.enumerator)
                .process(&request, logger, handler, cancel)
                .await?
        };

        logger.info(&format!("Processed {count} files matching criteria."));
        Ok(count)
    }
}

fn render(bound: Option<DateTime<Utc>>) -> String {
    bound.map_or_else(|| "undefined".to_string(), |b| b.to_rfc3339())
}

/// Process input from the filesystem with a default [`Dispatcher`].
pub async fn process(
    config: &InputConfig,
    features: &[Feature],
    logger: &dyn Logger,
    handler: &dyn FileHandler,
    bounds: WindowBounds,
) -> Result<usize> {
    Dispatcher::new()
        .process(config, features, logger, handler, bounds)
        .await
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use trawl_core::{LogLevel, RecordingLogger};

    use super::*;
    use crate::handler::{HandlerError, InputFile};
    use crate::memory::MemoryEnumerator;

    fn ok_handler() -> impl FileHandler {
        |_file: InputFile| async { Ok::<(), HandlerError>(()) }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_feature_checked_before_config() {
        let dispatcher = Dispatcher::with_enumerator(MemoryEnumerator::default());
        let logger = RecordingLogger::new();
        let config = InputConfig {
            input_directory: None,
            concurrency: None,
            ..InputConfig::default()
        };

        let err = dispatcher
            .process(&config, &[], &logger, &ok_handler(), WindowBounds::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::FeatureDisabled));
        assert!(logger.entries().is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_checked_before_directory() {
        let dispatcher = Dispatcher::with_enumerator(MemoryEnumerator::default());
        let logger = RecordingLogger::new();
        let features = [Feature::Input];

        let config = InputConfig {
            input_directory: None,
            concurrency: None,
            ..InputConfig::default()
        };
        let err = dispatcher
            .process(&config, &features, &logger, &ok_handler(), WindowBounds::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Concurrency is not configured");

        let config = InputConfig {
            input_directory: None,
            ..InputConfig::default()
        };
        let err = dispatcher
            .process(&config, &features, &logger, &ok_handler(), WindowBounds::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Input directory is not configured");

        let config = InputConfig {
            concurrency: Some(0),
            ..InputConfig::new("/in")
        };
        assert!(matches!(
            dispatcher
                .process(&config, &features, &logger, &ok_handler(), WindowBounds::default())
                .await,
            Err(InputError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_unstructured_logs_before_rejecting_window() {
        let dispatcher = Dispatcher::with_enumerator(MemoryEnumerator::new(["a.txt"]));
        let logger = RecordingLogger::new();
        let bounds = WindowBounds {
            start: Some(utc("2024-01-01T00:00:00Z")),
            end: None,
        };

        let err = dispatcher
            .process(
                &InputConfig::new("/in"),
                &[Feature::Input],
                &logger,
                &ok_handler(),
                bounds,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InputError::WindowNotAllowed));
        assert!(logger.contains(LogLevel::Debug, "Processing Unstructured Input from /in"));
        assert!(dispatcher.enumerator().calls().is_empty());
    }

    #[tokio::test]
    async fn test_structured_logs_undefined_bounds() {
        let dispatcher = Dispatcher::with_enumerator(MemoryEnumerator::default());
        let logger = RecordingLogger::new();

        let err = dispatcher
            .process(
                &InputConfig::new("/in"),
                &[Feature::Input, Feature::StructuredInput],
                &logger,
                &ok_handler(),
                WindowBounds {
                    start: None,
                    end: Some(utc("2024-01-01T00:00:00Z")),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InputError::WindowRequired));
        assert!(logger.contains(
            LogLevel::Debug,
            "Processing Structured Input from /in with start date undefined \
             and end date 2024-01-01T00:00:00+00:00"
        ));
    }

    #[tokio::test]
    async fn test_structured_window_validation() {
        let dispatcher = Dispatcher::with_enumerator(MemoryEnumerator::default());
        let logger = RecordingLogger::new();
        let features = [Feature::Input, Feature::StructuredInput];
        let bounds = WindowBounds::new(utc("2024-02-01T00:00:00Z"), utc("2024-01-01T00:00:00Z"));

        let err = dispatcher
            .process(&InputConfig::new("/in"), &features, &logger, &ok_handler(), bounds)
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidWindow { .. }));

        let config = InputConfig {
            timezone: "Mars/Olympus".to_string(),
            ..InputConfig::new("/in")
        };
        let err = dispatcher
            .process(&config, &features, &logger, &ok_handler(), bounds)
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidTimezone { .. }));
    }

    #[tokio::test]
    async fn test_routes_config_into_unstructured_request() {
        let dispatcher = Dispatcher::with_enumerator(MemoryEnumerator::new(["a.txt", "b.txt"]));
        let logger = RecordingLogger::new();
        let config = InputConfig {
            recursive: true,
            extensions: vec!["txt".to_string()],
            concurrency: Some(3),
            limit: Some(1),
            ..InputConfig::new("/in")
        };

        let count = dispatcher
            .process(&config, &[Feature::Input], &logger, &ok_handler(), WindowBounds::default())
            .await
            .unwrap();

        assert_eq!(count, 1);
        let call = &dispatcher.enumerator().calls()[0];
        assert_eq!(call.root, PathBuf::from("/in"));
        assert_eq!(call.pattern, "**/*.{txt}");
        assert_eq!(call.limit, Some(1));
        assert_eq!(call.concurrency, 3);
        assert!(logger.contains(LogLevel::Info, "Processed 1 files matching criteria."));
    }
}
