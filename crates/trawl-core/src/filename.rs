//! Filename schema for structured input.
//!
//! A structured file name is a `-`-separated list of components in a fixed
//! order, followed by the extension:
//!
//! ```text
//! [date]-[time]-[subject].ext
//! ```
//!
//! The date component only carries the calendar parts the directory layout
//! does not: `YYYY-MM-DD` under [`InputStructure::None`], `MM-DD` under
//! `Year`, `DD` under `Month` and nothing under `Day`. Time is `HHMM`.

use chrono::{Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{InputError, Result};
use crate::structure::InputStructure;
use crate::window::resolve_local;

const DIGIT: &str = "[0-9]";

/// A semantic component that may appear in a file name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FilenameOption {
    Date,
    Time,
    Subject,
}

/// The set of components encoded in structured file names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilenameSchema {
    options: Vec<FilenameOption>,
}

impl FilenameSchema {
    pub fn new(options: impl IntoIterator<Item = FilenameOption>) -> Self {
        Self {
            options: options.into_iter().unique().collect(),
        }
    }

    pub fn options(&self) -> &[FilenameOption] {
        &self.options
    }

    pub fn has(&self, option: FilenameOption) -> bool {
        self.options.contains(&option)
    }

    /// Glob fragment matching `option` in a file under `structure`.
    ///
    /// `None` when the component contributes nothing to the pattern: the
    /// option is not part of the schema, the subject is free text, or the
    /// directories already carry the whole date.
    pub fn fragment(&self, option: FilenameOption, structure: InputStructure) -> Option<String> {
        if !self.has(option) {
            return None;
        }
        match option {
            FilenameOption::Date => {
                let widths = date_widths(structure);
                if widths.is_empty() {
                    None
                } else {
                    Some(widths.iter().map(|w| DIGIT.repeat(*w)).join("-"))
                }
            }
            FilenameOption::Time => Some(DIGIT.repeat(4)),
            FilenameOption::Subject => None,
        }
    }

    /// Leading part of the leaf pattern, before the wildcard and extension.
    ///
    /// Components appear in date, time, subject order regardless of the
    /// order options were configured in.
    pub fn leaf_prefix(&self, structure: InputStructure) -> String {
        [FilenameOption::Date, FilenameOption::Time]
            .into_iter()
            .filter_map(|option| self.fragment(option, structure))
            .join("-")
    }

    /// Work out the time span a file covers from its relative path.
    ///
    /// Returns `Ok(None)` when neither the directories nor the name carry a
    /// date, and [`InputError::InvalidDate`] when they do but it is
    /// malformed.
    pub fn stamp(
        &self,
        structure: InputStructure,
        relative_path: &str,
    ) -> Result<Option<FileStamp>> {
        let invalid = || InputError::InvalidDate {
            input: relative_path.to_string(),
        };

        let mut segments: Vec<&str> = relative_path.split('/').collect();
        let file_name = segments.pop().ok_or_else(invalid)?;
        if segments.len() < structure.depth() {
            return Err(invalid());
        }
        let dirs = &segments[segments.len() - structure.depth()..];

        let mut parts = DateParts::default();
        for (index, dir) in dirs.iter().enumerate() {
            let value = digits(dir, [4, 2, 2][index]).ok_or_else(invalid)?;
            parts.push(value);
        }

        let mut tokens = file_name.split('-');
        if self.has(FilenameOption::Date) {
            for width in date_widths(structure) {
                let token = tokens.next().ok_or_else(invalid)?;
                parts.push(digits(token, *width).ok_or_else(invalid)?);
            }
        }
        let mut time = None;
        if self.has(FilenameOption::Time) {
            let token = tokens.next().ok_or_else(invalid)?;
            let hhmm = digits(token, 4).ok_or_else(invalid)?;
            time = Some(NaiveTime::from_hms_opt(hhmm / 100, hhmm % 100, 0).ok_or_else(invalid)?);
        }

        parts.into_stamp(time).ok_or_else(invalid)
    }
}

impl FromIterator<FilenameOption> for FilenameSchema {
    fn from_iter<I: IntoIterator<Item = FilenameOption>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// How finely a file's date is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Year,
    Month,
    Day,
    Minute,
}

/// The wall-clock span a single file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    start: NaiveDateTime,
    precision: Precision,
}

impl FileStamp {
    /// Local start of the span.
    pub fn naive_start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Local exclusive end of the span.
    pub fn naive_end(&self) -> NaiveDateTime {
        match self.precision {
            Precision::Year => self.start + Months::new(12),
            Precision::Month => self.start + Months::new(1),
            Precision::Day => self.start + Duration::days(1),
            Precision::Minute => self.start + Duration::minutes(1),
        }
    }

    /// The half-open span `[start, end)` resolved in `tz`.
    pub fn span(&self, tz: Tz) -> (chrono::DateTime<Tz>, chrono::DateTime<Tz>) {
        (
            resolve_local(tz, self.naive_start()),
            resolve_local(tz, self.naive_end()),
        )
    }
}

#[derive(Debug, Default)]
struct DateParts {
    values: Vec<u32>,
}

impl DateParts {
    fn push(&mut self, value: u32) {
        self.values.push(value);
    }

    fn into_stamp(self, time: Option<NaiveTime>) -> Option<Option<FileStamp>> {
        let (year, month, day, precision) = match self.values.as_slice() {
            [] => return Some(None),
            [y] => (*y, 1, 1, Precision::Year),
            [y, m] => (*y, *m, 1, Precision::Month),
            [y, m, d, ..] => (*y, *m, *d, Precision::Day),
        };
        let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
        let stamp = match (precision, time) {
            (Precision::Day, Some(time)) => FileStamp {
                start: date.and_time(time),
                precision: Precision::Minute,
            },
            _ => FileStamp {
                start: date.and_time(NaiveTime::MIN),
                precision,
            },
        };
        Some(Some(stamp))
    }
}

/// Widths of the date components carried by the file name.
fn date_widths(structure: InputStructure) -> &'static [usize] {
    match structure {
        InputStructure::None => &[4, 2, 2],
        InputStructure::Year => &[2, 2],
        InputStructure::Month => &[2],
        InputStructure::Day => &[],
    }
}

/// Parse exactly `width` leading ASCII digits of `token`.
fn digits(token: &str, width: usize) -> Option<u32> {
    let end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if end != width {
        return None;
    }
    token[..end].parse().ok()
}
