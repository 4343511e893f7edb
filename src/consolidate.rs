//! Union of all period extracts into one row per `(date, station)`.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

use crate::dates::parse_day;
use crate::loader::RawExtract;

/// Roughly one observation per day over the 2015–2025 span, minus gaps.
pub const DEFAULT_MIN_OBSERVATIONS: usize = 3888;

#[derive(Debug, Clone)]
pub struct ConsolidateConfig {
    /// Stations with fewer distinct dates are dropped entirely.
    pub min_observations: usize,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self {
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

/// Total validations at one station on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedRecord {
    pub date: NaiveDate,
    pub station_name: String,
    pub total_validations: i64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Monday = 0 … Sunday = 6.
    pub day_of_week: u32,
}

impl ConsolidatedRecord {
    pub fn new(date: NaiveDate, station_name: String, total_validations: i64) -> Self {
        Self {
            date,
            station_name,
            total_validations,
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_week: date.weekday().num_days_from_monday(),
        }
    }
}

/// Row counts at each consolidation stage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidationReport {
    pub extracts: usize,
    pub input_rows: usize,
    pub duplicate_rows: usize,
    pub unparseable_days: usize,
    pub groups: usize,
    pub stations_kept: usize,
    pub stations_dropped: usize,
    pub rows_kept: usize,
}

#[derive(Debug, Clone)]
pub struct Consolidated {
    pub records: Vec<ConsolidatedRecord>,
    pub report: ConsolidationReport,
}

/// Canonical station key: trimmed, upper-cased.
pub fn canonical_station(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Builds the consolidated dataset from every extract.
///
/// Output is ordered by `(date, station_name)` and unique on that pair.
/// Rows whose day cannot be parsed take no part in grouping.
#[tracing::instrument(skip_all, fields(min_observations = config.min_observations))]
pub fn consolidate(extracts: Vec<RawExtract>, config: &ConsolidateConfig) -> Result<Consolidated> {
    let mut report = ConsolidationReport {
        extracts: extracts.len(),
        ..Default::default()
    };

    let mut seen: HashSet<(Option<NaiveDate>, String, i64)> = HashSet::new();
    let mut totals: BTreeMap<(NaiveDate, String), i64> = BTreeMap::new();

    for extract in extracts {
        for raw in extract.records {
            report.input_rows += 1;

            let date = parse_day(&raw.day);
            let station = canonical_station(&raw.station_name);
            let key = (date, station, raw.validation_count);

            if seen.contains(&key) {
                report.duplicate_rows += 1;
                continue;
            }
            seen.insert(key.clone());

            let (date, station, count) = key;
            match date {
                Some(date) => *totals.entry((date, station)).or_insert(0) += count,
                None => report.unparseable_days += 1,
            }
        }
    }

    if report.unparseable_days > 0 {
        warn!(
            unparseable_days = report.unparseable_days,
            "Rows with unparseable days excluded"
        );
    }
    report.groups = totals.len();

    let mut observations: HashMap<&str, usize> = HashMap::new();
    for (_, station) in totals.keys() {
        *observations.entry(station.as_str()).or_insert(0) += 1;
    }

    let kept: HashSet<String> = observations
        .iter()
        .filter(|(_, n)| **n >= config.min_observations)
        .map(|(station, _)| station.to_string())
        .collect();

    report.stations_kept = kept.len();
    report.stations_dropped = observations.len() - kept.len();

    let records: Vec<ConsolidatedRecord> = totals
        .into_iter()
        .filter(|((_, station), _)| kept.contains(station))
        .map(|((date, station), total)| ConsolidatedRecord::new(date, station, total))
        .collect();
    report.rows_kept = records.len();

    info!(
        stations_kept = report.stations_kept,
        stations_dropped = report.stations_dropped,
        min_observations = config.min_observations,
        "{} stations with >= {} observations",
        report.stations_kept,
        config.min_observations
    );

    Ok(Consolidated { records, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RawRecord;

    fn extract(rows: &[(&str, &str, i64)]) -> RawExtract {
        RawExtract {
            source: "test".into(),
            records: rows
                .iter()
                .map(|(day, station, count)| RawRecord {
                    day: day.to_string(),
                    station_name: station.to_string(),
                    validation_count: *count,
                })
                .collect(),
        }
    }

    fn no_filter() -> ConsolidateConfig {
        ConsolidateConfig { min_observations: 0 }
    }

    #[test]
    fn test_counts_across_extracts_are_summed() {
        let a = extract(&[("2019-03-01", "Gare A", 10)]);
        let b = extract(&[("01/03/2019", "gare a ", 15)]);

        let out = consolidate(vec![a, b], &no_filter()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].total_validations, 25);
        assert_eq!(out.records[0].station_name, "GARE A");
    }

    #[test]
    fn test_exact_duplicates_collapse_after_normalization() {
        let a = extract(&[("2019-03-01", "Gare A", 10), ("2019-03-01", " GARE A", 10)]);
        let out = consolidate(vec![a], &no_filter()).unwrap();
        assert_eq!(out.records[0].total_validations, 10);
        assert_eq!(out.report.duplicate_rows, 1);
    }

    #[test]
    fn test_pairs_are_unique_and_ordered() {
        let a = extract(&[
            ("2019-03-02", "B", 1),
            ("2019-03-01", "B", 2),
            ("2019-03-01", "A", 3),
            ("2019-03-01", "A", 4),
        ]);
        let out = consolidate(vec![a], &no_filter()).unwrap();

        let keys: Vec<(NaiveDate, &str)> = out
            .records
            .iter()
            .map(|r| (r.date, r.station_name.as_str()))
            .collect();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(out.records[0].total_validations, 7);
    }

    #[test]
    fn test_unparseable_days_are_excluded() {
        let a = extract(&[("garbage", "A", 5), ("2019-03-01", "A", 1)]);
        let out = consolidate(vec![a], &no_filter()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.report.unparseable_days, 1);
    }

    #[test]
    fn test_date_parts_are_derived() {
        let a = extract(&[("2020-04-05", "A", 1)]);
        let out = consolidate(vec![a], &no_filter()).unwrap();
        let r = &out.records[0];
        assert_eq!((r.year, r.month, r.day), (2020, 4, 5));
        // 2020-04-05 was a Sunday
        assert_eq!(r.day_of_week, 6);
    }

    #[test]
    fn test_sparse_stations_are_dropped() {
        let a = extract(&[
            ("2019-03-01", "DENSE", 1),
            ("2019-03-02", "DENSE", 1),
            ("2019-03-03", "DENSE", 1),
            ("2019-03-01", "SPARSE", 1),
            ("2019-03-02", "SPARSE", 1),
        ]);
        let out = consolidate(vec![a], &ConsolidateConfig { min_observations: 3 }).unwrap();

        assert!(out.records.iter().all(|r| r.station_name == "DENSE"));
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.report.stations_kept, 1);
        assert_eq!(out.report.stations_dropped, 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let a = extract(&[("2019-03-01", "A", 1), ("2019-03-02", "A", 1)]);
        let out = consolidate(vec![a], &ConsolidateConfig { min_observations: 2 }).unwrap();
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(ConsolidateConfig::default().min_observations, 3888);
    }
}
