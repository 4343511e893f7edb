//! Cleaning of the raw validation-count column (`NB_VALD`).
//!
//! Source extracts publish counts either as plain numbers or as text with
//! thousands separators and a censored-value sentinel for small counts.
//! [`sanitize`] turns either shape into a strictly integer column.

use anyhow::{Result, bail};
use tracing::debug;

/// Sentinel the operator publishes instead of counts below five.
pub const CENSORED_SENTINEL: &str = "Moins de 5";

/// Assumed median of the censored range `[0, 5)`.
pub const DEFAULT_REPLACEMENT: i64 = 2;

/// What to do with values that still fail to parse after cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Fill with [`SanitizeConfig::replacement`]. Censored and malformed
    /// values become indistinguishable.
    #[default]
    Backfill,
    /// Fail on the first value that cannot be parsed.
    Strict,
}

#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    pub sentinel: String,
    pub replacement: i64,
    pub missing: MissingPolicy,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            sentinel: CENSORED_SENTINEL.to_string(),
            replacement: DEFAULT_REPLACEMENT,
            missing: MissingPolicy::Backfill,
        }
    }
}

/// A raw count column as read from one extract.
#[derive(Debug, Clone, PartialEq)]
pub enum RawColumn {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl RawColumn {
    /// Types a column the way a CSV reader would: numeric only if every
    /// cell parses as a number, text otherwise.
    pub fn infer(cells: Vec<String>) -> Self {
        let numeric: Option<Vec<f64>> = cells.iter().map(|c| c.trim().parse::<f64>().ok()).collect();

        match numeric {
            Some(values) if !values.is_empty() && values.iter().all(|v| v.is_finite()) => {
                RawColumn::Numeric(values)
            }
            _ => RawColumn::Text(cells),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawColumn::Numeric(v) => v.len(),
            RawColumn::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts a raw count column into integers.
///
/// Text columns are trimmed and non-breaking spaces become regular spaces.
/// Then two column-wide gates run, each decided by a single pre-scan:
/// cells equal to the sentinel are replaced if any value contains it, and
/// spaces are stripped from every value if any value contains one.
///
/// # Errors
///
/// Only in [`MissingPolicy::Strict`] mode, when a value does not parse.
pub fn sanitize(column: RawColumn, config: &SanitizeConfig) -> Result<Vec<i64>> {
    let cells = match column {
        RawColumn::Numeric(values) => return Ok(values.into_iter().map(|v| v as i64).collect()),
        RawColumn::Text(cells) => cells,
    };

    let mut cells: Vec<String> = cells
        .into_iter()
        .map(|c| c.trim().replace('\u{a0}', " "))
        .collect();
    let original = (config.missing == MissingPolicy::Strict).then(|| cells.clone());

    let has_sentinel = !config.sentinel.is_empty() && cells.iter().any(|c| c.contains(&config.sentinel));
    if has_sentinel {
        let replacement = config.replacement.to_string();
        for cell in cells.iter_mut().filter(|c| **c == config.sentinel) {
            *cell = replacement.clone();
        }
    }

    let has_separator = cells.iter().any(|c| c.contains(' '));
    if has_separator {
        for cell in &mut cells {
            cell.retain(|ch| ch != ' ');
        }
    }

    debug!(
        rows = cells.len(),
        has_sentinel, has_separator, "Sanitizing text count column"
    );

    let mut out = Vec::with_capacity(cells.len());
    let mut backfilled = 0usize;

    for (row, cell) in cells.iter().enumerate() {
        match parse_count(cell) {
            Some(v) => out.push(v),
            None => match config.missing {
                MissingPolicy::Backfill => {
                    backfilled += 1;
                    out.push(config.replacement);
                }
                MissingPolicy::Strict => {
                    let raw = original.as_ref().map_or(cell, |o| &o[row]);
                    bail!("unparseable validation count {raw:?} at row {row}");
                }
            },
        }
    }

    if backfilled > 0 {
        debug!(backfilled, "Backfilled unparseable counts");
    }

    Ok(out)
}

fn parse_count(cell: &str) -> Option<i64> {
    if let Ok(v) = cell.parse::<i64>() {
        return Some(v);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v as i64),
        _ => None,
    }
}
