use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Closed interval `[start, end]`. A date belongs to it when its midnight
/// falls inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let at = date.and_time(NaiveTime::MIN);
        self.start <= at && at <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let interval = DateInterval::from_dates(ymd(2020, 3, 17), ymd(2020, 5, 11));
        assert!(interval.contains(ymd(2020, 3, 17)));
        assert!(interval.contains(ymd(2020, 5, 11)));
        assert!(!interval.contains(ymd(2020, 3, 16)));
        assert!(!interval.contains(ymd(2020, 5, 12)));
    }

    #[test]
    fn test_sub_day_bounds() {
        let start = ymd(2019, 10, 18).and_hms_opt(22, 0, 0).unwrap();
        let end = ymd(2019, 11, 3).and_hms_opt(23, 0, 0).unwrap();
        let interval = DateInterval::new(start, end);
        assert!(!interval.contains(ymd(2019, 10, 18)));
        assert!(interval.contains(ymd(2019, 10, 19)));
        assert!(interval.contains(ymd(2019, 11, 3)));
        assert!(!interval.contains(ymd(2019, 11, 4)));
    }
}
