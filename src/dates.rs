//! Day parsing across the date layouts used by the yearly extracts.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Date-only layouts, tried in order. Slash layouts are day-first, as
/// published by the operator.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%y"];

/// Timestamp layouts; only the calendar date is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// chrono's `%Y` also accepts one- and two-digit years; a four-digit
/// layout must yield a four-digit year.
fn year_fits(fmt: &str, date: NaiveDate) -> bool {
    !fmt.contains("%Y") || date.year() >= 1000
}

/// Parses a day written in any of the known layouts.
///
/// Returns `None` when no layout matches; a value is never coerced into a
/// layout it does not fully match.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .filter(|d| year_fits(fmt, *d))
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| {
                    NaiveDateTime::parse_from_str(raw, fmt)
                        .ok()
                        .map(|dt| dt.date())
                        .filter(|d| year_fits(fmt, *d))
                })
        })
}
