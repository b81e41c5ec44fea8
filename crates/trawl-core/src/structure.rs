//! Date-partitioned directory layouts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::window::DateWindow;

/// How the input directory encodes dates in its subdirectories.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InputStructure {
    /// Files sit directly in the input directory.
    #[default]
    None,
    /// `YYYY/`
    Year,
    /// `YYYY/MM/`
    Month,
    /// `YYYY/MM/DD/`
    Day,
}

impl InputStructure {
    /// Number of directory levels below the input directory.
    pub fn depth(self) -> usize {
        match self {
            Self::None => 0,
            Self::Year => 1,
            Self::Month => 2,
            Self::Day => 3,
        }
    }

    /// Chronological partitions whose range intersects `window`.
    ///
    /// Partition boundaries are local calendar units in the window's
    /// timezone. An inverted window yields nothing; `None` yields a single
    /// partition rooted at the input directory.
    pub fn partitions(self, window: &DateWindow) -> Vec<Partition> {
        if window.is_inverted() {
            return Vec::new();
        }

        let first = window.local_start_date();
        let last = window.local_end_date();

        match self {
            Self::None => vec![Partition::root()],
            Self::Year => (first.year()..=last.year())
                .map(|year| Partition::new(format!("{year:04}")))
                .collect(),
            Self::Month => {
                let mut partitions = Vec::new();
                let (mut year, mut month) = (first.year(), first.month());
                while (year, month) <= (last.year(), last.month()) {
                    partitions.push(Partition::new(format!("{year:04}/{month:02}")));
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
                partitions
            }
            Self::Day => first
                .iter_days()
                .take_while(|day| *day <= last)
                .map(Partition::for_day)
                .collect(),
        }
    }
}

/// One directory of a date-partitioned layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    directory: String,
}

impl Partition {
    fn new(directory: String) -> Self {
        Self { directory }
    }

    fn root() -> Self {
        Self {
            directory: String::new(),
        }
    }

    fn for_day(day: NaiveDate) -> Self {
        Self::new(format!(
            "{:04}/{:02}/{:02}",
            day.year(),
            day.month(),
            day.day()
        ))
    }

    /// Directory relative to the input directory, `/`-separated.
    ///
    /// Empty for the root partition.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// True for the partition that is the input directory itself.
    pub fn is_root(&self) -> bool {
        self.directory.is_empty()
    }

    /// Human-readable label for log lines.
    pub fn label(&self) -> &str {
        if self.is_root() { "." } else { &self.directory }
    }
}
