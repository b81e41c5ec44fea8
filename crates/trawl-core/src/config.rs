//! Input configuration types.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};
use crate::filename::{FilenameOption, FilenameSchema};
use crate::structure::InputStructure;
use crate::window::parse_timezone;

/// Read-only configuration consumed by input traversal.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(rename_all = "snake_case")]
pub struct InputConfig {
    /// Root directory to discover files under.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub input_directory: Option<PathBuf>,

    /// Descend into subdirectories (unstructured input only).
    #[builder(default = "false")]
    #[serde(default)]
    pub recursive: bool,

    /// Extension allow-list; empty means any extension.
    #[builder(default)]
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Maximum number of handler invocations in flight.
    #[builder(default = "Some(1)")]
    #[serde(default = "default_concurrency")]
    pub concurrency: Option<usize>,

    /// Hard cap on the number of files visited.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub limit: Option<usize>,

    /// IANA timezone for reading date windows.
    #[builder(default = "default_timezone()")]
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Directory layout of structured input.
    #[builder(default)]
    #[serde(default)]
    pub input_structure: InputStructure,

    /// Components encoded in structured file names.
    #[builder(default)]
    #[serde(default)]
    pub input_filename_options: Vec<FilenameOption>,
}

fn default_concurrency() -> Option<usize> {
    Some(1)
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl InputConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(Some(ref dir)) = self.input_directory {
            if dir.as_os_str().is_empty() {
                return Err("Input directory cannot be empty".to_string());
            }
        }
        if let Some(Some(0)) = self.concurrency {
            return Err("Concurrency must be at least 1".to_string());
        }
        if let Some(Some(0)) = self.limit {
            return Err("Limit must be at least 1".to_string());
        }
        Ok(())
    }
}

impl InputConfig {
    /// Create a new config builder.
    pub fn builder() -> InputConfigBuilder {
        InputConfigBuilder::default()
    }

    /// Create a simple config for a directory with default settings.
    pub fn new(input_directory: impl Into<PathBuf>) -> Self {
        Self {
            input_directory: Some(input_directory.into()),
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| InputError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| InputError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Extensions with leading dots and blanks removed, order kept.
    pub fn normalized_extensions(&self) -> Vec<String> {
        normalize_extensions(&self.extensions)
    }

    /// Resolved timezone.
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Filename schema built from the configured options.
    pub fn filename_schema(&self) -> FilenameSchema {
        self.input_filename_options.iter().copied().collect()
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_directory: None,
            recursive: false,
            extensions: Vec::new(),
            concurrency: default_concurrency(),
            limit: None,
            timezone: default_timezone(),
            input_structure: InputStructure::default(),
            input_filename_options: Vec::new(),
        }
    }
}

/// Strip leading dots and drop empty entries.
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = InputConfig::builder()
            .input_directory("/data/in")
            .concurrency(Some(4))
            .recursive(true)
            .extensions(vec!["eml".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.input_directory, Some(PathBuf::from("/data/in")));
        assert_eq!(config.concurrency, Some(4));
        assert!(config.recursive);
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.input_structure, InputStructure::None);
    }

    #[test]
    fn test_config_builder_validation() {
        assert!(InputConfig::builder().input_directory("").build().is_err());
        assert!(InputConfig::builder().concurrency(Some(0)).build().is_err());
        assert!(InputConfig::builder().limit(0usize).build().is_err());
        assert!(InputConfig::builder().build().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let config = InputConfig::from_toml_str(
            r#"
            input_directory = "/archive"
            extensions = [".eml", "msg"]
            concurrency = 8
            timezone = "America/New_York"
            input_structure = "month"
            input_filename_options = ["date", "time", "subject"]
            "#,
        )
        .unwrap();

        assert_eq!(config.input_directory, Some(PathBuf::from("/archive")));
        assert_eq!(config.normalized_extensions(), vec!["eml", "msg"]);
        assert_eq!(config.concurrency, Some(8));
        assert_eq!(config.timezone().unwrap(), Tz::America__New_York);
        assert_eq!(config.input_structure, InputStructure::Month);
        assert!(config.filename_schema().has(FilenameOption::Time));
        assert!(!config.recursive);
    }

    #[test]
    fn test_config_from_toml_defaults_and_errors() {
        let config = InputConfig::from_toml_str("").unwrap();
        assert_eq!(config, InputConfig::default());

        assert!(matches!(
            InputConfig::from_toml_str("input_structure = \"week\""),
            Err(InputError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("trawl.toml");
        std::fs::write(&path, "recursive = true\nlimit = 5\n").unwrap();

        let config = InputConfig::load(&path).unwrap();
        assert!(config.recursive);
        assert_eq!(config.limit, Some(5));

        assert!(matches!(
            InputConfig::load(temp.path().join("missing.toml")),
            Err(InputError::NotFound { .. })
        ));
    }

    #[test]
    fn test_normalize_extensions() {
        assert_eq!(
            normalize_extensions(&[".csv", "json", "", " .txt "]),
            vec!["csv", "json", "txt"]
        );
    }
}
