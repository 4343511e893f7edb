//! Reading of one period extract into a minimal `(day, station, count)` set.

use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use crate::sanitize::{RawColumn, SanitizeConfig, sanitize};
use crate::sources::SourceFile;

pub const COL_DAY: &str = "JOUR";
pub const COL_STATION_CODE: &str = "CODE_STIF_ARRET";
pub const COL_NETWORK_CODE: &str = "CODE_STIF_TRNS";
pub const COL_STATION_NAME: &str = "LIBELLE_ARRET";
pub const COL_FARE_CATEGORY: &str = "CATEGORIE_TITRE";
pub const COL_COUNT: &str = "NB_VALD";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_DAY,
    COL_STATION_CODE,
    COL_STATION_NAME,
    COL_FARE_CATEGORY,
    COL_COUNT,
];

/// One projected row: the day is still raw text, parsed at consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawRecord {
    pub day: String,
    pub station_name: String,
    pub validation_count: i64,
}

#[derive(Debug, Clone)]
pub struct RawExtract {
    pub source: String,
    pub records: Vec<RawRecord>,
}

/// Interned fare-category labels.
#[derive(Debug, Default, Clone)]
pub struct CategorySet {
    labels: Vec<String>,
    index: HashMap<String, u32>,
}

impl CategorySet {
    pub fn intern(&mut self, label: &str) -> u32 {
        if let Some(&code) = self.index.get(label) {
            return code;
        }
        let code = self.labels.len() as u32;
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), code);
        code
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Full validated row before projection. Codes and categories only take
/// part in duplicate detection.
#[derive(Debug, PartialEq, Eq, Hash)]
struct ValidationRow {
    day: String,
    station_code: String,
    network_code: Option<String>,
    station_name: String,
    fare_category: u32,
    count: i64,
}

/// Loads one extract from `data_dir`.
///
/// # Errors
///
/// Fails on a missing file, undecodable bytes, a row that does not parse
/// with the configured separator, or a missing required column.
#[tracing::instrument(skip_all, fields(source = %source.name))]
pub fn load(data_dir: &Path, source: &SourceFile, sanitize_config: &SanitizeConfig) -> Result<RawExtract> {
    let path = data_dir.join(source.file_name());
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read '{}'", path.display()))?;

    let (text, had_errors) = source.encoding.encoding().decode_with_bom_removal(&bytes);
    if had_errors {
        bail!(
            "'{}' is not valid {}",
            path.display(),
            source.encoding.encoding().name()
        );
    }

    let extract = parse_extract(&source.name, &text, source.separator, sanitize_config)
        .with_context(|| format!("failed to load '{}'", path.display()))?;

    info!(rows = extract.records.len(), "Extract loaded");
    Ok(extract)
}

/// Parses decoded extract text. Split from [`load`] so the column rules can
/// be exercised without touching disk.
pub fn parse_extract(
    source: &str,
    text: &str,
    separator: char,
    sanitize_config: &SanitizeConfig,
) -> Result<RawExtract> {
    let delimiter = u8::try_from(separator)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("separator {separator:?} is not a single ASCII byte"))?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header(name), idx))
        .collect();

    for required in REQUIRED_COLUMNS {
        if !headers.contains_key(*required) {
            bail!("missing required column {required}");
        }
    }
    let col = |name: &str| headers[name];
    let network_idx = headers.get(COL_NETWORK_CODE).copied();

    let mut records: Vec<StringRecord> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header line, 1-based numbering
        let record = result.with_context(|| format!("malformed row at line {}", idx + 2))?;
        records.push(record);
    }

    let field = |record: &StringRecord, idx: usize| record.get(idx).unwrap_or("").to_string();

    let counts = RawColumn::infer(records.iter().map(|r| field(r, col(COL_COUNT))).collect());
    let counts = sanitize(counts, sanitize_config)?;

    let mut categories = CategorySet::default();
    let mut seen = HashSet::with_capacity(records.len());
    let mut projected = Vec::with_capacity(records.len());

    for (record, count) in records.iter().zip(counts) {
        let row = ValidationRow {
            day: field(record, col(COL_DAY)),
            station_code: field(record, col(COL_STATION_CODE)),
            network_code: network_idx.map(|idx| field(record, idx)),
            station_name: field(record, col(COL_STATION_NAME)),
            fare_category: categories.intern(record.get(col(COL_FARE_CATEGORY)).unwrap_or("")),
            count,
        };

        if !seen.contains(&row) {
            projected.push(RawRecord {
                day: row.day.clone(),
                station_name: row.station_name.clone(),
                validation_count: row.count,
            });
            seen.insert(row);
        }
    }

    debug!(
        source,
        rows_read = records.len(),
        rows_kept = projected.len(),
        fare_categories = categories.len(),
        "Extract parsed"
    );

    Ok(RawExtract {
        source: source.to_string(),
        records: projected,
    })
}

fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_uppercase()
}
