//! Read-only reference data shared by every enrichment step.
//!
//! [`HolidayCalendar`] holds public holidays, [`SchoolHolidayCalendar`] the
//! school holiday intervals of one zone, [`lockdown_periods`] the fixed
//! lockdown intervals and [`StationRegistry`] station coordinates.
//! [`ReferenceData`] bundles them; it is built once per run and passed by
//! reference.

mod holidays;
mod interval;
mod lockdowns;
mod school;
mod stations;

pub use holidays::HolidayCalendar;
pub use interval::DateInterval;
pub use lockdowns::lockdown_periods;
pub use school::{SchoolCalendarFilter, SchoolHolidayCalendar};
pub use stations::{Station, StationRegistry};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations of the reference files.
#[derive(Debug, Clone)]
pub struct ReferencePaths {
    pub holidays: PathBuf,
    pub school_calendar: PathBuf,
    /// Station coordinates; not joined into the dataset.
    pub stations: Option<PathBuf>,
}

impl ReferencePaths {
    /// File names as published, under `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            holidays: data_dir.join("jours_feries_metropole.csv"),
            school_calendar: data_dir.join("fr-en-calendrier-scolaire.csv"),
            stations: Some(data_dir.join("schema_gares-gf.csv")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub holidays: HolidayCalendar,
    pub school_holidays: SchoolHolidayCalendar,
    pub lockdowns: Vec<DateInterval>,
    pub stations: StationRegistry,
}

impl ReferenceData {
    /// Loads every reference file. Any failure is fatal.
    #[tracing::instrument(skip_all)]
    pub fn load(paths: &ReferencePaths, filter: &SchoolCalendarFilter) -> Result<Self> {
        let holidays = HolidayCalendar::load(&paths.holidays)?;
        let school_holidays = SchoolHolidayCalendar::load(&paths.school_calendar, filter)?;
        let stations = match &paths.stations {
            Some(path) => StationRegistry::load(path)?,
            None => StationRegistry::default(),
        };

        info!(
            holidays = holidays.len(),
            school_intervals = school_holidays.len(),
            stations = stations.len(),
            "Reference data loaded"
        );

        Ok(Self {
            holidays,
            school_holidays,
            lockdowns: lockdown_periods(),
            stations,
        })
    }
}

/// Reads a UTF-8 reference file, dropping a leading byte-order mark.
fn read_utf8(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
