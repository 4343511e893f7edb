//! One batch run: load every extract, consolidate, enrich.

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::consolidate::{ConsolidateConfig, Consolidated, consolidate};
use crate::features::{EnrichedRecord, FeaturePipeline};
use crate::loader::load;
use crate::reference::{ReferenceData, ReferencePaths, SchoolCalendarFilter};
use crate::sanitize::SanitizeConfig;
use crate::sources::SourceManifest;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub manifest: SourceManifest,
    pub sanitize: SanitizeConfig,
    pub consolidate: ConsolidateConfig,
    pub references: ReferencePaths,
    pub school_filter: SchoolCalendarFilter,
}

impl PipelineConfig {
    /// Defaults for a data directory laid out as published.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            references: ReferencePaths::in_dir(&data_dir),
            data_dir,
            manifest: SourceManifest::default(),
            sanitize: SanitizeConfig::default(),
            consolidate: ConsolidateConfig::default(),
            school_filter: SchoolCalendarFilter::default(),
        }
    }
}

pub struct PipelineOutput {
    pub consolidated: Consolidated,
    pub rows: Vec<EnrichedRecord>,
}

/// Loads and consolidates every extract in the manifest. The first load
/// error aborts the run.
pub fn build_consolidated(config: &PipelineConfig) -> Result<Consolidated> {
    let extracts = config
        .manifest
        .iter()
        .map(|source| load(&config.data_dir, source, &config.sanitize))
        .collect::<Result<Vec<_>>>()?;

    consolidate(extracts, &config.consolidate)
}

/// Full run with reference data loaded from `config.references`.
#[tracing::instrument(skip_all, fields(data_dir = %config.data_dir.display(), sources = config.manifest.len()))]
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    let reference = ReferenceData::load(&config.references, &config.school_filter)?;
    run_with_reference(config, &reference)
}

/// Full run against already loaded reference data.
pub fn run_with_reference(config: &PipelineConfig, reference: &ReferenceData) -> Result<PipelineOutput> {
    let consolidated = build_consolidated(config)?;
    let rows = FeaturePipeline::default().run(&consolidated.records, reference);

    info!(
        rows = rows.len(),
        stations = consolidated.report.stations_kept,
        "Pipeline complete"
    );

    Ok(PipelineOutput { consolidated, rows })
}
