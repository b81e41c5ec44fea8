//! Date windows for structured input.

use std::fmt;

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};

/// Caller-supplied window bounds, either of which may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl WindowBounds {
    /// Bounds with both ends set.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// True when neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// True when both bounds are set.
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// An inclusive `[start, end]` range of instants read in `timezone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timezone: Tz,
}

impl DateWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, timezone: Tz) -> Result<Self> {
        if start > end {
            return Err(InputError::InvalidWindow { start, end });
        }
        Ok(Self::unchecked(start, end, timezone))
    }

    /// Create a window without checking bound order.
    ///
    /// An inverted window intersects nothing.
    pub fn unchecked(start: DateTime<Utc>, end: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            start,
            end,
            timezone,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// True when `start > end`.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Local calendar date of `start` in the window's zone.
    pub fn local_start_date(&self) -> NaiveDate {
        self.start.with_timezone(&self.timezone).date_naive()
    }

    /// Local calendar date of `end` in the window's zone.
    pub fn local_end_date(&self) -> NaiveDate {
        self.end.with_timezone(&self.timezone).date_naive()
    }

    /// Whether the half-open span `[span_start, span_end)` touches the window.
    pub fn overlaps(&self, span_start: DateTime<Tz>, span_end: DateTime<Tz>) -> bool {
        let span_start = span_start.with_timezone(&Utc);
        let span_end = span_end.with_timezone(&Utc);
        !self.is_inverted() && span_start <= self.end && span_end > self.start
    }

    /// Whether a single instant lies inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({})",
            self.start.to_rfc3339(),
            self.end.to_rfc3339(),
            self.timezone
        )
    }
}

/// Parse an IANA zone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| InputError::InvalidTimezone {
        name: name.to_string(),
    })
}

/// Resolve a local wall-clock time in `tz` to a concrete instant.
///
/// Ambiguous times take the earlier instant; times inside a DST gap move
/// forward to the first valid minute.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = naive;
    for _ in 0..(24 * 4) {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => candidate += Duration::minutes(15),
        }
    }
    tz.from_utc_datetime(&naive)
}

/// Parse a window bound.
///
/// Accepts RFC 3339 instants, or a bare `YYYY-MM-DD` read as local midnight
/// in `tz`.
pub fn parse_instant(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = parse_date(input)?;
    Ok(resolve_local(tz, date.and_time(NaiveTime::MIN)).with_timezone(&Utc))
}

/// Parse an end bound.
///
/// Like [`parse_instant`], but a bare date selects the last instant of that
/// local day so the whole day falls inside the window.
pub fn parse_end_instant(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = parse_date(input)?;
    let next = date.succ_opt().ok_or_else(|| InputError::InvalidDate {
        input: input.to_string(),
    })?;
    let next_midnight = resolve_local(tz, next.and_time(NaiveTime::MIN));
    Ok(next_midnight.with_timezone(&Utc) - Duration::nanoseconds(1))
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| InputError::InvalidDate {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        let err = DateWindow::new(
            utc("2024-01-02T00:00:00Z"),
            utc("2024-01-01T00:00:00Z"),
            Tz::UTC,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::InvalidWindow { .. }));
    }

    #[test]
    fn test_local_dates_follow_timezone() {
        // 03:30 UTC on Jan 2nd is still Jan 1st in New York.
        let window = DateWindow::new(
            utc("2024-01-02T03:30:00Z"),
            utc("2024-01-02T03:30:00Z"),
            Tz::America__New_York,
        )
        .unwrap();
        assert_eq!(
            window.local_start_date(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_overlaps_is_inclusive_at_bounds() {
        let tz = Tz::UTC;
        let window = DateWindow::new(
            utc("2024-01-05T10:00:00Z"),
            utc("2024-01-05T12:00:00Z"),
            tz,
        )
        .unwrap();
        let minute = |s: &str| {
            let start = utc(s).with_timezone(&tz);
            (start, start + Duration::minutes(1))
        };

        let (s, e) = minute("2024-01-05T09:59:00Z");
        assert!(!window.overlaps(s, e));
        let (s, e) = minute("2024-01-05T10:00:00Z");
        assert!(window.overlaps(s, e));
        let (s, e) = minute("2024-01-05T12:00:00Z");
        assert!(window.overlaps(s, e));
        let (s, e) = minute("2024-01-05T12:01:00Z");
        assert!(!window.overlaps(s, e));
    }

    #[test]
    fn test_parse_instant_forms() {
        let tz = parse_timezone("Europe/Berlin").unwrap();
        assert_eq!(
            parse_instant("2024-03-01T12:00:00Z", tz).unwrap(),
            utc("2024-03-01T12:00:00Z")
        );
        // Midnight in Berlin (UTC+1 in winter).
        assert_eq!(
            parse_instant("2024-03-01", tz).unwrap(),
            utc("2024-02-29T23:00:00Z")
        );
        assert_eq!(
            parse_end_instant("2024-03-01", tz).unwrap(),
            utc("2024-03-01T22:59:59.999999999Z")
        );
        assert!(matches!(
            parse_instant("yesterday", tz),
            Err(InputError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_timezone_rejects_unknown() {
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(InputError::InvalidTimezone { .. })
        ));
    }

    #[test]
    fn test_resolve_local_skips_dst_gap() {
        let tz = Tz::America__New_York;
        // 02:30 does not exist on 2024-03-10 in New York.
        let naive = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = resolve_local(tz, naive);
        assert_eq!(resolved.with_timezone(&Utc), utc("2024-03-10T07:00:00Z"));
    }
}
