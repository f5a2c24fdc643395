//! Thermal index service.
//!
//! Reads a GRIB2 file of surface fields, derives thermal comfort indices
//! for every (step, member) group and writes them to a new GRIB2 file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use thermal_formulas::ReferenceFormulas;
use thermal_pipeline::{GribRecordDecoder, GribRecordEncoder, IndexKind, ThermalConfig};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "thermal-indexer")]
#[command(about = "Derive thermal comfort indices from GRIB2 surface fields")]
struct Args {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long, env = "THERMAL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one input file
    Run {
        /// GRIB2 input file
        input: PathBuf,
        /// GRIB2 output file (created or truncated)
        output: PathBuf,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ThermalConfig> {
    match path {
        Some(path) => ThermalConfig::from_yaml(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ThermalConfig::default()),
    }
}

/// Reject outputs the bundled formulas cannot compute.
fn check_outputs(config: &ThermalConfig) -> Result<()> {
    if config.outputs.contains(&IndexKind::Utci) {
        bail!("Output 'utci' is not available with the bundled formulas");
    }
    Ok(())
}

fn run_file(config: &ThermalConfig, input: &Path, output: &Path) -> Result<()> {
    let tables = config.grib_tables();

    let decoder = GribRecordDecoder::open(input, tables.clone())
        .with_context(|| format!("Failed to open input {}", input.display()))?;
    let mut encoder = GribRecordEncoder::create(output, tables)
        .with_context(|| format!("Failed to create output {}", output.display()))?;

    let summary = thermal_pipeline::run(decoder, &mut encoder, ReferenceFormulas, config)
        .with_context(|| format!("Processing {} failed", input.display()))?;

    info!(
        records = summary.records_read,
        batches = summary.batches_processed,
        skipped = summary.batches_skipped,
        messages = summary.messages_written,
        bytes = summary.bytes_written,
        output = %output.display(),
        "Finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    info!("Starting thermal indexer");
    let config = load_config(args.config.as_deref())?;
    check_outputs(&config)?;
    info!(
        required = config.required_count(),
        outputs = ?config.outputs,
        policy = ?config.on_invalid_batch,
        "Loaded configuration"
    );

    let result = match &args.command {
        Command::Run { input, output } => run_file(&config, input, output),
    };
    if let Err(e) = &result {
        error!(error = %format!("{:#}", e), "Thermal indexer failed");
    }
    result
}
