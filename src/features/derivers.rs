use chrono::Datelike;
use std::f64::consts::PI;

use super::{EnrichedRecord, FeatureDeriver};
use crate::reference::ReferenceData;

/// `is_holiday`, and `holiday_name` when `add_name` is set.
pub struct PublicHolidays {
    pub add_name: bool,
}

impl FeatureDeriver for PublicHolidays {
    fn name(&self) -> &'static str {
        "public_holiday"
    }

    fn derive(&self, row: &mut EnrichedRecord, reference: &ReferenceData) {
        row.is_holiday = Some(reference.holidays.contains(row.date));
        if self.add_name {
            row.holiday_name = reference.holidays.name(row.date).map(str::to_string);
        }
    }
}

/// `is_school_holiday`: inside any interval of the school calendar.
pub struct SchoolHolidays;

impl FeatureDeriver for SchoolHolidays {
    fn name(&self) -> &'static str {
        "school_holiday"
    }

    fn derive(&self, row: &mut EnrichedRecord, reference: &ReferenceData) {
        row.is_school_holiday = Some(reference.school_holidays.contains(row.date));
    }
}

/// `is_weekend`: Saturday or Sunday.
pub struct Weekend;

impl FeatureDeriver for Weekend {
    fn name(&self) -> &'static str {
        "weekend"
    }

    fn derive(&self, row: &mut EnrichedRecord, _: &ReferenceData) {
        row.is_weekend = Some(row.date.weekday().num_days_from_monday() >= 5);
    }
}

/// Meteorological seasons; exactly one flag is set.
pub struct Seasons;

impl FeatureDeriver for Seasons {
    fn name(&self) -> &'static str {
        "season"
    }

    fn derive(&self, row: &mut EnrichedRecord, _: &ReferenceData) {
        let month = row.date.month();
        row.is_winter = Some(matches!(month, 12 | 1 | 2));
        row.is_spring = Some(matches!(month, 3..=5));
        row.is_summer = Some(matches!(month, 6..=8));
        row.is_autumn = Some(matches!(month, 9..=11));
    }
}

/// `is_lockdown`: inside any lockdown interval.
pub struct Lockdowns;

impl FeatureDeriver for Lockdowns {
    fn name(&self) -> &'static str {
        "lockdown"
    }

    fn derive(&self, row: &mut EnrichedRecord, reference: &ReferenceData) {
        row.is_lockdown = Some(reference.lockdowns.iter().any(|p| p.contains(row.date)));
    }
}

/// Weekend conjunctions. Each is only written when both of its source
/// columns are present.
pub struct Interactions;

impl FeatureDeriver for Interactions {
    fn name(&self) -> &'static str {
        "interaction"
    }

    fn derive(&self, row: &mut EnrichedRecord, _: &ReferenceData) {
        if let (Some(weekend), Some(school)) = (row.is_weekend, row.is_school_holiday) {
            row.weekend_school_holiday = Some(weekend && school);
        }
        if let (Some(weekend), Some(holiday)) = (row.is_weekend, row.is_holiday) {
            row.weekend_holiday = Some(weekend && holiday);
        }
    }
}

/// Sine/cosine of day of week (period 7), zero-based day of month
/// (period 31) and month (period 12).
pub struct Cyclical;

fn encode(value: u32, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * f64::from(value) / period;
    (angle.sin(), angle.cos())
}

impl FeatureDeriver for Cyclical {
    fn name(&self) -> &'static str {
        "cyclical"
    }

    fn derive(&self, row: &mut EnrichedRecord, _: &ReferenceData) {
        let (s, c) = encode(row.date.weekday().num_days_from_monday(), 7.0);
        row.dayofweek_sin = Some(s);
        row.dayofweek_cos = Some(c);

        let (s, c) = encode(row.date.day0(), 31.0);
        row.dayofmonth_sin = Some(s);
        row.dayofmonth_cos = Some(c);

        let (s, c) = encode(row.date.month(), 12.0);
        row.month_sin = Some(s);
        row.month_cos = Some(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::ConsolidatedRecord;
    use chrono::NaiveDate;

    fn row(y: i32, m: u32, d: u32) -> EnrichedRecord {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        EnrichedRecord::from(&ConsolidatedRecord::new(date, "GARE".into(), 1))
    }

    #[test]
    fn test_month_boundaries_are_close() {
        let reference = ReferenceData::default();
        let mut first = row(2020, 1, 1);
        let mut last = row(2020, 1, 31);
        Cyclical.derive(&mut first, &reference);
        Cyclical.derive(&mut last, &reference);

        let distance = ((first.dayofmonth_sin.unwrap() - last.dayofmonth_sin.unwrap()).powi(2)
            + (first.dayofmonth_cos.unwrap() - last.dayofmonth_cos.unwrap()).powi(2))
        .sqrt();
        assert!(distance < 0.25);
        assert_eq!(first.dayofmonth_sin, Some(0.0));
        assert_eq!(first.dayofmonth_cos, Some(1.0));
    }

    #[test]
    fn test_december_is_winter() {
        let mut r = row(2020, 12, 25);
        Seasons.derive(&mut r, &ReferenceData::default());
        assert_eq!(r.is_winter, Some(true));
        assert_eq!(r.is_autumn, Some(false));
    }

    #[test]
    fn test_holiday_name_optional() {
        let mut r = row(2020, 5, 1);
        let reference = ReferenceData {
            holidays: crate::reference::HolidayCalendar::new([(r.date, "1er mai".to_string())]),
            ..Default::default()
        };
        PublicHolidays { add_name: false }.derive(&mut r, &reference);
        assert_eq!(r.is_holiday, Some(true));
        assert_eq!(r.holiday_name, None);
    }
}
