//! Calendar, holiday and event features appended to consolidated rows.
//!
//! Each [`FeatureDeriver`] fills its own columns of [`EnrichedRecord`] from
//! the row's date and the shared [`ReferenceData`]. [`FeaturePipeline`]
//! runs them in a fixed order; a later deriver may read columns written by
//! an earlier one. Rows are never added, dropped or reordered.

mod derivers;

pub use derivers::{Cyclical, Interactions, Lockdowns, PublicHolidays, SchoolHolidays, Seasons, Weekend};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::consolidate::ConsolidatedRecord;
use crate::reference::ReferenceData;

/// A consolidated row plus its feature columns. A feature column is `None`
/// until the deriver owning it has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub date: NaiveDate,
    pub station_name: String,
    pub total_validations: i64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub day_of_week: u32,

    pub is_holiday: Option<bool>,
    pub holiday_name: Option<String>,
    pub is_school_holiday: Option<bool>,
    pub is_weekend: Option<bool>,
    pub is_winter: Option<bool>,
    pub is_spring: Option<bool>,
    pub is_summer: Option<bool>,
    pub is_autumn: Option<bool>,
    pub is_lockdown: Option<bool>,
    pub weekend_school_holiday: Option<bool>,
    pub weekend_holiday: Option<bool>,

    pub dayofweek_sin: Option<f64>,
    pub dayofweek_cos: Option<f64>,
    pub dayofmonth_sin: Option<f64>,
    pub dayofmonth_cos: Option<f64>,
    pub month_sin: Option<f64>,
    pub month_cos: Option<f64>,
}

impl From<&ConsolidatedRecord> for EnrichedRecord {
    fn from(r: &ConsolidatedRecord) -> Self {
        Self {
            date: r.date,
            station_name: r.station_name.clone(),
            total_validations: r.total_validations,
            year: r.year,
            month: r.month,
            day: r.day,
            day_of_week: r.day_of_week,
            is_holiday: None,
            holiday_name: None,
            is_school_holiday: None,
            is_weekend: None,
            is_winter: None,
            is_spring: None,
            is_summer: None,
            is_autumn: None,
            is_lockdown: None,
            weekend_school_holiday: None,
            weekend_holiday: None,
            dayofweek_sin: None,
            dayofweek_cos: None,
            dayofmonth_sin: None,
            dayofmonth_cos: None,
            month_sin: None,
            month_cos: None,
        }
    }
}

impl EnrichedRecord {
    /// Resets every feature column, keeping the consolidated columns.
    pub fn clear_features(&mut self) {
        let base = ConsolidatedRecord::new(self.date, std::mem::take(&mut self.station_name), self.total_validations);
        *self = EnrichedRecord::from(&base);
    }
}

/// One step of the pipeline.
pub trait FeatureDeriver {
    fn name(&self) -> &'static str;

    /// Writes this deriver's columns on `row`.
    fn derive(&self, row: &mut EnrichedRecord, reference: &ReferenceData);
}

/// Ordered list of derivers.
pub struct FeaturePipeline {
    steps: Vec<Box<dyn FeatureDeriver>>,
}

impl Default for FeaturePipeline {
    /// Holidays, school holidays, weekend, seasons, lockdowns, interactions,
    /// cyclical encodings.
    fn default() -> Self {
        Self::new(vec![
            Box::new(PublicHolidays { add_name: true }),
            Box::new(SchoolHolidays),
            Box::new(Weekend),
            Box::new(Seasons),
            Box::new(Lockdowns),
            Box::new(Interactions),
            Box::new(Cyclical),
        ])
    }
}

impl FeaturePipeline {
    pub fn new(steps: Vec<Box<dyn FeatureDeriver>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Enriches consolidated rows, preserving their order.
    #[tracing::instrument(skip_all, fields(rows = records.len()))]
    pub fn run(&self, records: &[ConsolidatedRecord], reference: &ReferenceData) -> Vec<EnrichedRecord> {
        let mut rows: Vec<EnrichedRecord> = records.iter().map(EnrichedRecord::from).collect();
        self.apply(&mut rows, reference);
        rows
    }

    /// Recomputes every feature column from the date column of rows that
    /// may already be enriched.
    pub fn rederive(&self, rows: &mut [EnrichedRecord], reference: &ReferenceData) {
        rows.iter_mut().for_each(EnrichedRecord::clear_features);
        self.apply(rows, reference);
    }

    fn apply(&self, rows: &mut [EnrichedRecord], reference: &ReferenceData) {
        for step in &self.steps {
            for row in rows.iter_mut() {
                step.derive(row, reference);
            }
            debug!(step = step.name(), "Feature step applied");
        }
    }
}
