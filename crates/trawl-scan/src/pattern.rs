//! Glob patterns for both discovery modes.
//!
//! | recursive | extensions    | pattern          |
//! |-----------|---------------|------------------|
//! | no        | none          | `*.*`            |
//! | yes       | none          | `**/*`           |
//! | no        | `eml`, `msg`  | `*.{eml,msg}`    |
//! | yes       | `eml`, `msg`  | `**/*.{eml,msg}` |
//!
//! The recursive unfiltered form matches files without an extension while the
//! top-level one does not.

use trawl_core::{FilenameSchema, InputStructure, Partition};

/// Leaf pattern for any file with one of `extensions`.
///
/// Expects already-normalized extensions.
pub fn extension_glob(extensions: &[String]) -> String {
    if extensions.is_empty() {
        "*.*".to_string()
    } else {
        format!("*.{{{}}}", extensions.join(","))
    }
}

/// Pattern for an unstructured traversal.
pub fn unstructured_pattern(recursive: bool, extensions: &[String]) -> String {
    match (recursive, extensions.is_empty()) {
        (false, _) => extension_glob(extensions),
        (true, true) => "**/*".to_string(),
        (true, false) => format!("**/{}", extension_glob(extensions)),
    }
}

/// File name pattern inside one partition directory.
pub fn leaf_pattern(
    schema: &FilenameSchema,
    structure: InputStructure,
    extensions: &[String],
) -> String {
    let prefix = schema.leaf_prefix(structure);
    format!("{prefix}{}", extension_glob(extensions))
}

/// Full pattern for `partition`, relative to the input directory.
pub fn partition_pattern(
    partition: &Partition,
    schema: &FilenameSchema,
    structure: InputStructure,
    extensions: &[String],
) -> String {
    let leaf = leaf_pattern(schema, structure, extensions);
    if partition.is_root() {
        leaf
    } else {
        format!("{}/{leaf}", partition.directory())
    }
}

#[cfg(test)]
mod tests {
    use trawl_core::{DateWindow, FilenameOption, Tz, parse_end_instant, parse_instant};

    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unstructured_patterns() {
        assert_eq!(unstructured_pattern(false, &[]), "*.*");
        assert_eq!(unstructured_pattern(true, &[]), "**/*");
        assert_eq!(unstructured_pattern(false, &exts(&["eml", "msg"])), "*.{eml,msg}");
        assert_eq!(unstructured_pattern(true, &exts(&["eml", "msg"])), "**/*.{eml,msg}");
        assert_eq!(unstructured_pattern(false, &exts(&["txt"])), "*.{txt}");
    }

    #[test]
    fn test_leaf_patterns() {
        let full = FilenameSchema::new([FilenameOption::Date, FilenameOption::Time]);
        assert_eq!(
            leaf_pattern(&full, InputStructure::Day, &exts(&["eml"])),
            "[0-9][0-9][0-9][0-9]*.{eml}"
        );
        assert_eq!(
            leaf_pattern(&full, InputStructure::Month, &[]),
            "[0-9][0-9]-[0-9][0-9][0-9][0-9]*.*"
        );
        assert_eq!(
            leaf_pattern(&FilenameSchema::default(), InputStructure::Day, &[]),
            "*.*"
        );
    }

    #[test]
    fn test_partition_patterns() {
        let tz = Tz::UTC;
        let window = DateWindow::new(
            parse_instant("2024-01-30", tz).unwrap(),
            parse_end_instant("2024-02-02", tz).unwrap(),
            tz,
        )
        .unwrap();
        let schema = FilenameSchema::default();
        let extensions = exts(&["txt"]);

        let patterns: Vec<String> = InputStructure::Month
            .partitions(&window)
            .iter()
            .map(|p| partition_pattern(p, &schema, InputStructure::Month, &extensions))
            .collect();
        assert_eq!(patterns, vec!["2024/01/*.{txt}", "2024/02/*.{txt}"]);

        let root = InputStructure::None.partitions(&window);
        assert_eq!(
            partition_pattern(&root[0], &schema, InputStructure::None, &extensions),
            "*.{txt}"
        );
    }
}
