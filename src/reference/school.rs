use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::DateInterval;
use crate::dates::parse_day;

/// Which rows of the national school calendar apply.
#[derive(Debug, Clone)]
pub struct SchoolCalendarFilter {
    pub zone: String,
    pub academies: Vec<String>,
}

impl Default for SchoolCalendarFilter {
    /// Île-de-France.
    fn default() -> Self {
        Self {
            zone: "Zone C".to_string(),
            academies: vec!["Paris".into(), "Créteil".into(), "Versailles".into()],
        }
    }
}

impl SchoolCalendarFilter {
    fn matches(&self, zone: &str, academy: &str) -> bool {
        zone == self.zone && self.academies.iter().any(|a| a == academy)
    }
}

#[derive(Debug, Deserialize)]
struct SchoolRow {
    #[serde(rename = "Zones")]
    zone: String,
    #[serde(rename = "Académies")]
    academy: String,
    #[serde(rename = "Date de début")]
    start: String,
    #[serde(rename = "Date de fin")]
    end: String,
}

/// School holiday intervals for one zone. Intervals may overlap.
#[derive(Debug, Clone, Default)]
pub struct SchoolHolidayCalendar {
    intervals: Vec<DateInterval>,
}

impl SchoolHolidayCalendar {
    pub fn new(intervals: Vec<DateInterval>) -> Self {
        Self { intervals }
    }

    /// Loads the semicolon-separated national calendar and keeps the rows
    /// matching `filter`.
    pub fn load(path: &Path, filter: &SchoolCalendarFilter) -> Result<Self> {
        let text = super::read_utf8(path)?;
        Self::parse(&text, filter)
            .with_context(|| format!("invalid school calendar '{}'", path.display()))
    }

    fn parse(text: &str, filter: &SchoolCalendarFilter) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());

        let mut intervals = Vec::new();
        let mut incomplete = 0usize;

        for result in reader.deserialize() {
            let row: SchoolRow = result?;
            if !filter.matches(row.zone.trim(), row.academy.trim()) {
                continue;
            }
            match (parse_bound(&row.start), parse_bound(&row.end)) {
                (Some(start), Some(end)) => intervals.push(DateInterval::new(start, end)),
                _ => incomplete += 1,
            }
        }

        debug!(intervals = intervals.len(), incomplete, "School calendar parsed");
        Ok(Self { intervals })
    }

    /// `true` if any interval contains `date`.
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        self.intervals.iter().any(|i| i.contains(date))
    }

    pub fn intervals(&self) -> &[DateInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Offset timestamps are converted to UTC; naive values are taken as-is.
fn parse_bound(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    parse_day(raw).map(|d| d.and_time(NaiveTime::MIN))
}
