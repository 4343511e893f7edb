use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::consolidate::canonical_station;

#[derive(Debug, Deserialize)]
struct StationRow {
    #[serde(rename = "NOM_GARE")]
    name: String,
    #[serde(rename = "X")]
    x: String,
    #[serde(rename = "Y")]
    y: String,
    #[serde(rename = "Geo Point")]
    geo_point: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub geo_point: String,
}

/// Station coordinates keyed by canonical station name.
///
/// Loaded alongside the other reference data but not joined into the
/// consolidated dataset; only used for lookups.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    by_name: HashMap<String, Station>,
}

impl StationRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let text = super::read_utf8(path)?;
        Self::parse(&text).with_context(|| format!("invalid station file '{}'", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());

        let mut by_name = HashMap::new();
        let mut skipped = 0usize;

        for result in reader.deserialize() {
            let row: StationRow = result?;
            let name = canonical_station(&row.name);

            let (Some(x), Some(y)) = (parse_coordinate(&row.x), parse_coordinate(&row.y)) else {
                skipped += 1;
                continue;
            };

            // first occurrence wins
            by_name.entry(name.clone()).or_insert(Station {
                name,
                x,
                y,
                geo_point: row.geo_point.trim().to_string(),
            });
        }

        if skipped > 0 {
            warn!(skipped, "Stations without usable coordinates skipped");
        }
        debug!(stations = by_name.len(), "Station registry parsed");

        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&Station> {
        self.by_name.get(&canonical_station(name))
    }

    /// Resolves each name, warning about and skipping unknown ones.
    pub fn locate<'a, S: AsRef<str>>(&'a self, names: &[S]) -> Vec<&'a Station> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let found = self.get(name);
                if found.is_none() {
                    warn!(station = name, "Unknown station, skipping");
                }
                found
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}
