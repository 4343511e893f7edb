use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::dates::parse_day;

#[derive(Debug, Deserialize)]
struct HolidayRow {
    date: String,
    nom_jour_ferie: String,
}

/// Metropolitan France public holidays, keyed by date.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    by_date: HashMap<NaiveDate, String>,
}

impl HolidayCalendar {
    pub fn new(entries: impl IntoIterator<Item = (NaiveDate, String)>) -> Self {
        Self {
            by_date: entries.into_iter().collect(),
        }
    }

    /// Loads a comma-separated file with `date` and `nom_jour_ferie` columns.
    pub fn load(path: &Path) -> Result<Self> {
        let text = super::read_utf8(path)?;
        Self::parse(&text).with_context(|| format!("invalid holiday file '{}'", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let mut by_date = HashMap::new();

        for result in reader.deserialize() {
            let row: HolidayRow = result?;
            let date = parse_day(&row.date).ok_or_else(|| anyhow!("bad holiday date {:?}", row.date))?;
            by_date.insert(date, row.nom_jour_ferie);
        }

        Ok(Self { by_date })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }

    pub fn name(&self, date: NaiveDate) -> Option<&str> {
        self.by_date.get(&date).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}
