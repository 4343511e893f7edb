//! CLI entry point for the ridership pipeline.
//!
//! Builds the enriched dataset from the period extracts, lists the
//! configured sources, summarizes stations, and looks stations up in the
//! coordinate registry.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ridership_pipeline::consolidate::ConsolidateConfig;
use ridership_pipeline::output::{print_json, write_dataset};
use ridership_pipeline::pipeline::{self, PipelineConfig};
use ridership_pipeline::reference::{ReferencePaths, StationRegistry};
use ridership_pipeline::sanitize::MissingPolicy;
use ridership_pipeline::sources::SourceManifest;
use ridership_pipeline::summary::summarize_stations;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ridership_pipeline")]
#[command(about = "Consolidate station ridership extracts into a feature-rich daily dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads the extracts.
#[derive(clap::Args)]
struct SourceArgs {
    /// Directory holding the extracts and reference files
    #[arg(short, long, env = "RIDERSHIP_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// JSON manifest replacing the built-in list of extracts
    #[arg(short, long, env = "RIDERSHIP_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Minimum number of distinct dates for a station to be kept
    #[arg(long, env = "RIDERSHIP_MIN_OBSERVATIONS", default_value_t = 3888)]
    min_observations: usize,

    /// Fail on unparseable validation counts instead of backfilling them
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl SourceArgs {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::for_data_dir(&self.data_dir);
        if let Some(path) = &self.manifest {
            config.manifest = SourceManifest::load(path)?;
        }
        config.consolidate = ConsolidateConfig {
            min_observations: self.min_observations,
        };
        if self.strict {
            config.sanitize.missing = MissingPolicy::Strict;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline and optionally write the enriched dataset
    Build {
        #[command(flatten)]
        sources: SourceArgs,

        /// CSV file to write the enriched dataset to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gzip compress the output file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// List the configured extracts and how each one is read
    Sources {
        /// JSON manifest replacing the built-in list of extracts
        #[arg(short, long, env = "RIDERSHIP_MANIFEST")]
        manifest: Option<PathBuf>,
    },
    /// Consolidate the extracts and log per-station statistics
    Summary {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Look station names up in the coordinate registry
    Stations {
        /// Directory holding the reference files
        #[arg(short, long, env = "RIDERSHIP_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Station reference file, defaults to the one under the data directory
        #[arg(short, long)]
        registry: Option<PathBuf>,

        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ridership_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ridership_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            sources,
            output,
            gzip,
        } => {
            let config = sources.pipeline_config()?;
            let result = pipeline::run(&config)?;

            print_json(&result.consolidated.report)?;

            match output {
                Some(path) => write_dataset(&path, &result.rows, gzip)?,
                None => info!(rows = result.rows.len(), "No output path given, dataset kept in memory"),
            }
        }
        Commands::Sources { manifest } => {
            let manifest = match manifest {
                Some(path) => SourceManifest::load(&path)?,
                None => SourceManifest::default(),
            };

            for source in manifest.iter() {
                info!(
                    file = %source.file_name(),
                    encoding = ?source.encoding,
                    separator = ?source.separator,
                    "Source"
                );
            }
            info!(total = manifest.len(), "Source list");
        }
        Commands::Summary { sources } => {
            let config = sources.pipeline_config()?;
            let consolidated = pipeline::build_consolidated(&config)?;

            for summary in summarize_stations(&consolidated.records) {
                info!(
                    station = %summary.station_name,
                    observations = summary.observations,
                    first_date = %summary.first_date,
                    last_date = %summary.last_date,
                    mean_daily = summary.mean_daily,
                    stddev_daily = summary.stddev_daily,
                    "Station"
                );
            }
            print_json(&consolidated.report)?;
        }
        Commands::Stations {
            data_dir,
            registry,
            names,
        } => {
            let path = registry.unwrap_or_else(|| station_registry_path(&data_dir));
            let registry = StationRegistry::load(&path)?;

            for station in registry.locate(&names) {
                info!(
                    station = %station.name,
                    x = station.x,
                    y = station.y,
                    geo_point = %station.geo_point,
                    "Station"
                );
            }
        }
    }

    Ok(())
}

/// Station file as laid out under `data_dir`.
fn station_registry_path(data_dir: &Path) -> PathBuf {
    let paths = ReferencePaths::in_dir(data_dir);
    paths
        .stations
        .unwrap_or_else(|| data_dir.join("schema_gares-gf.csv"))
}
