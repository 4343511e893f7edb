use chrono::NaiveDate;

use super::DateInterval;

/// National COVID-19 lockdowns in France, first and last day inclusive.
const LOCKDOWNS: [((i32, u32, u32), (i32, u32, u32)); 3] = [
    ((2020, 3, 17), (2020, 5, 11)),
    ((2020, 10, 30), (2020, 12, 15)),
    ((2021, 4, 3), (2021, 5, 3)),
];

pub fn lockdown_periods() -> Vec<DateInterval> {
    LOCKDOWNS
        .iter()
        .filter_map(|&((sy, sm, sd), (ey, em, ed))| {
            let start = NaiveDate::from_ymd_opt(sy, sm, sd)?;
            let end = NaiveDate::from_ymd_opt(ey, em, ed)?;
            Some(DateInterval::from_dates(start, end))
        })
        .collect()
}
