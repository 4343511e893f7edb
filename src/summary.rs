//! Per-station descriptive statistics over the consolidated history.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::consolidate::ConsolidatedRecord;

/// Average daily total; 0.0 for a station with no days.
pub fn mean(daily: &[f64]) -> f64 {
    match daily.len() {
        0 => 0.0,
        n => daily.iter().sum::<f64>() / n as f64,
    }
}

/// Population spread of daily totals around `mean`; 0.0 for no days.
pub fn stddev(daily: &[f64], mean: f64) -> f64 {
    if daily.is_empty() {
        return 0.0;
    }
    let squared: f64 = daily.iter().map(|v| (v - mean).powi(2)).sum();
    (squared / daily.len() as f64).sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station_name: String,
    pub observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_validations: i64,
    pub mean_daily: f64,
    pub stddev_daily: f64,
}

/// One summary per station, ordered by station name.
pub fn summarize_stations(records: &[ConsolidatedRecord]) -> Vec<StationSummary> {
    let mut by_station: BTreeMap<&str, Vec<&ConsolidatedRecord>> = BTreeMap::new();
    for r in records {
        by_station.entry(r.station_name.as_str()).or_default().push(r);
    }

    by_station
        .into_iter()
        .filter_map(|(station, rows)| {
            let first_date = rows.iter().map(|r| r.date).min()?;
            let last_date = rows.iter().map(|r| r.date).max()?;
            let daily: Vec<f64> = rows.iter().map(|r| r.total_validations as f64).collect();
            let avg = mean(&daily);

            Some(StationSummary {
                station_name: station.to_string(),
                observations: rows.len(),
                first_date,
                last_date,
                total_validations: rows.iter().map(|r| r.total_validations).sum(),
                mean_daily: avg,
                stddev_daily: stddev(&daily, avg),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, station: &str, total: i64) -> ConsolidatedRecord {
        let date = NaiveDate::from_ymd_opt(2021, 3, day).unwrap();
        ConsolidatedRecord::new(date, station.into(), total)
    }

    #[test]
    fn test_mean_and_stddev() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[], 0.0), 0.0);
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(stddev(&values, m), 2.0);
    }

    #[test]
    fn test_summaries_per_station() {
        let records = vec![
            record(1, "B", 10),
            record(2, "B", 30),
            record(3, "A", 7),
        ];
        let summaries = summarize_stations(&records);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].station_name, "A");
        assert_eq!(summaries[0].observations, 1);
        assert_eq!(summaries[0].stddev_daily, 0.0);

        let b = &summaries[1];
        assert_eq!(b.total_validations, 40);
        assert_eq!(b.mean_daily, 20.0);
        assert_eq!(b.stddev_daily, 10.0);
        assert_eq!(b.first_date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
        assert_eq!(b.last_date, NaiveDate::from_ymd_opt(2021, 3, 2).unwrap());
    }
}
