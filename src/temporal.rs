//! RFC-3339 temporal string parsing
//!
//! Parses date, date-time and time strings into a normalized UTC instant plus
//! a type tag, and evaluates half-open temporal extents. Date-only strings
//! anchor at midnight UTC; time-only strings anchor at the epoch date.

use crate::errors::{CubeError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

/// Which grammar a temporal string matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// A calendar date, e.g. `2021-01-15`
    Date,
    /// A full date-time, e.g. `2021-01-15T12:30:00Z`
    DateTime,
    /// A time of day, e.g. `12:30:00Z`
    Time,
}

/// A parsed temporal string: normalized UTC instant plus the matched kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTemporal {
    pub kind: TemporalKind,
    pub instant: DateTime<Utc>,
}

/// Parses an RFC-3339 date, date-time or time string.
///
/// # Errors
///
/// Returns `InvalidTemporalString` when the input matches none of the three
/// grammars.
pub fn parse_temporal(value: &str) -> Result<ParsedTemporal> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(ParsedTemporal {
            kind: TemporalKind::DateTime,
            instant: dt.with_timezone(&Utc),
        });
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            CubeError::InvalidTemporalString {
                value: value.to_string(),
            }
        })?;
        return Ok(ParsedTemporal {
            kind: TemporalKind::Date,
            instant: Utc.from_utc_datetime(&midnight),
        });
    }
    if let Some(time) = parse_time(value) {
        let anchored = DateTime::<Utc>::UNIX_EPOCH.date_naive().and_time(time);
        return Ok(ParsedTemporal {
            kind: TemporalKind::Time,
            instant: Utc.from_utc_datetime(&anchored),
        });
    }
    Err(CubeError::InvalidTemporalString {
        value: value.to_string(),
    })
}

/// Parses an RFC-3339 time-of-day string (`12:30:00`, `12:30:00Z`,
/// `12:30:00+01:00`). Offsets are accepted but the time is taken as given.
#[must_use]
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let bare = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(t) = NaiveTime::parse_from_str(bare, "%H:%M:%S%.f") {
        return Some(t);
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f%:z").ok()
}

/// A parsed 2-bound temporal extent; `None` bounds are open.
pub type ParsedExtent = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

/// Parses a `[start, end]` extent where each bound is either open (`None`)
/// or an RFC-3339 date, date-time or time string.
///
/// # Errors
///
/// Fails `InvalidExtent` when both bounds are open or a bound does not parse.
pub fn parse_extent(extent: (Option<&str>, Option<&str>)) -> Result<ParsedExtent> {
    let (start, end) = extent;
    if start.is_none() && end.is_none() {
        return Err(CubeError::InvalidExtent {
            message: "at least one bound must be given".to_string(),
        });
    }
    let parse_bound = |bound: Option<&str>| -> Result<Option<DateTime<Utc>>> {
        match bound {
            None => Ok(None),
            Some(s) => match parse_temporal(s) {
                Ok(parsed) => Ok(Some(parsed.instant)),
                Err(_) => Err(CubeError::InvalidExtent {
                    message: format!("'{}' is not a valid extent bound", s),
                }),
            },
        }
    };
    Ok((parse_bound(start)?, parse_bound(end)?))
}

/// Half-open membership test: `start == None || t >= start` and
/// `end == None || t < end` (inclusive start, exclusive end).
#[must_use]
pub fn in_extent(t: DateTime<Utc>, extent: &ParsedExtent) -> bool {
    extent.0.map_or(true, |start| t >= start) && extent.1.map_or(true, |end| t < end)
}
