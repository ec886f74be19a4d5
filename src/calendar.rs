//! Calendar-period labeling and date stepping
//!
//! Pure, total functions over the closed set of calendar periods used by
//! temporal aggregation: format a UTC timestamp into a period label, advance
//! a timestamp by exactly one period using calendar (not fixed-duration)
//! arithmetic, and generate inclusive period ranges.

use crate::errors::{CubeError, Result};
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use std::str::FromStr;

/// The closed set of calendar-period granularities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Hour,
    Day,
    Week,
    Dekad,
    Month,
    Season,
    TropicalSeason,
    Year,
    Decade,
    DecadeAd,
}

impl Period {
    /// Get the string representation of the period
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Dekad => "dekad",
            Self::Month => "month",
            Self::Season => "season",
            Self::TropicalSeason => "tropical-season",
            Self::Year => "year",
            Self::Decade => "decade",
            Self::DecadeAd => "decade-ad",
        }
    }
}

impl FromStr for Period {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "dekad" => Ok(Self::Dekad),
            "month" => Ok(Self::Month),
            "season" => Ok(Self::Season),
            "tropical-season" => Ok(Self::TropicalSeason),
            "year" => Ok(Self::Year),
            "decade" => Ok(Self::Decade),
            "decade-ad" => Ok(Self::DecadeAd),
            other => Err(CubeError::UnknownPeriod {
                period: other.to_string(),
            }),
        }
    }
}

/// Dekad index within the month: days 1-10 are dekad 1, 11-20 dekad 2,
/// everything beyond day 20 dekad 3.
const fn dekad_of_day(day: u32) -> u32 {
    if day > 20 {
        3
    } else if day > 10 {
        2
    } else {
        1
    }
}

/// Formats a UTC timestamp into a period-specific label.
///
/// Label grammar per period: hour `YYYY-MM-DD-HH`; day `YYYY-DDD` (3-digit
/// ordinal); week `YYYY-WW` (week index = ceil(day-of-year / 7), so January
/// 1st is always week 01 of its own year); dekad `YYYY-MM-DD` (2-digit dekad
/// index 1..3 per month); month `YYYY-MM`; season `YYYY-sss` (meteorological
/// code, every month labeled with its own calendar year, so January and
/// December of one calendar year share a `djf` label); tropical-season
/// `YYYY-ssssss`; year `YYYY`; decade the year floored to ten; decade-ad the
/// decade anchored at year 1.
#[must_use]
pub fn label_of(period: Period, ts: DateTime<Utc>) -> String {
    match period {
        Period::Hour => ts.format("%Y-%m-%d-%H").to_string(),
        Period::Day => format!("{}-{:03}", ts.year(), ts.ordinal()),
        Period::Week => format!("{}-{:02}", ts.year(), ts.ordinal().div_ceil(7)),
        Period::Dekad => format!(
            "{}-{:02}-{:02}",
            ts.year(),
            ts.month(),
            dekad_of_day(ts.day())
        ),
        Period::Month => ts.format("%Y-%m").to_string(),
        Period::Season => {
            let code = match ts.month() {
                3..=5 => "mam",
                6..=8 => "jja",
                9..=11 => "son",
                _ => "djf",
            };
            format!("{}-{}", ts.year(), code)
        }
        Period::TropicalSeason => {
            let code = if (5..=10).contains(&ts.month()) {
                "mjjaso"
            } else {
                "ndjfma"
            };
            format!("{}-{}", ts.year(), code)
        }
        Period::Year => format!("{}", ts.year()),
        Period::Decade => format!("{}", ts.year().div_euclid(10) * 10),
        Period::DecadeAd => format!("{}", (ts.year() - 1).div_euclid(10) * 10 + 1),
    }
}

/// Advances a timestamp by exactly one period using calendar arithmetic:
/// a month advances the month field rather than a fixed 30 days, a dekad
/// jumps to day 1 of the next month once the current day exceeds 20.
#[must_use]
pub fn advance(period: Period, ts: DateTime<Utc>) -> DateTime<Utc> {
    match period {
        Period::Hour => ts + Duration::hours(1),
        Period::Day => ts + Duration::days(1),
        Period::Week => ts + Duration::weeks(1),
        Period::Dekad => {
            if ts.day() > 20 {
                let next = ts + Months::new(1);
                next.with_day(1).unwrap_or(next)
            } else {
                ts + Duration::days(10)
            }
        }
        Period::Month => ts + Months::new(1),
        Period::Season => ts + Months::new(3),
        Period::TropicalSeason => ts + Months::new(6),
        Period::Year => ts + Months::new(12),
        Period::Decade | Period::DecadeAd => ts + Months::new(120),
    }
}

/// Produces the inclusive ordered sequence of timestamps from `min` through
/// the first timestamp exceeding `max`, stepping via [`advance`].
#[must_use]
pub fn generate_range(min: DateTime<Utc>, max: DateTime<Utc>, period: Period) -> Vec<DateTime<Utc>> {
    let mut out = Vec::new();
    let mut t = min;
    loop {
        out.push(t);
        if t > max {
            break;
        }
        t = advance(period, t);
    }
    out
}
