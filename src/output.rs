//! Export of the enriched dataset and logging of run reports.
//!
//! The dataset is written as CSV, gzip-compressed when requested.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::features::EnrichedRecord;

/// Logs any report as pretty-printed JSON.
pub fn print_json(report: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes rows as CSV with a header line to any writer.
pub fn write_records<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the enriched dataset to `path`, replacing any existing file.
pub fn write_dataset(path: &Path, rows: &[EnrichedRecord], gzip: bool) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), gzip, "Writing dataset");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_records(&mut encoder, rows)?;
        encoder.finish()?;
    } else {
        write_records(file, rows)?;
    }

    info!(path = %path.display(), rows = rows.len(), "Dataset written");
    Ok(())
}
