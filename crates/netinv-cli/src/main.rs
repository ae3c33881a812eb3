//! netinv - Device topology discovery from captured snapshots
//!
//! Each snapshot is an independent discovery run and is processed on its
//! own blocking task.

mod config;
mod report;

use anyhow::Result;
use clap::Parser;
use netinv_core::{ModelCatalog, SnapshotSource};
use netinv_discovery::{Autoload, AutoloadConfig};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use config::OutputFormat;
use report::RunReport;

#[derive(Parser, Debug)]
#[command(name = "netinv")]
#[command(about = "Discover physical topology and addressing of network devices")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "netinv.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Output format, overrides the configuration file
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Device snapshot files (JSON)
    #[arg(required = true)]
    snapshots: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so the report on stdout stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("netinv v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;
    let catalog = config.load_catalog()?;
    let format = args.format.unwrap_or(config.output.format);

    info!(
        snapshots = args.snapshots.len(),
        supported_os = ?config.autoload.supported_os,
        "Configuration loaded"
    );

    let reports = run_all(&args.snapshots, &config.autoload, &catalog).await;

    let output = match format {
        OutputFormat::Table => report::render_table(&reports)?,
        OutputFormat::Json => report::render_json(&reports)?,
    };
    println!("{}", output);

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} discovery runs failed", failed, reports.len());
    }
    Ok(())
}

/// Discover every snapshot concurrently, reports in argument order
async fn run_all(
    snapshots: &[PathBuf],
    autoload: &AutoloadConfig,
    catalog: &ModelCatalog,
) -> Vec<RunReport> {
    let mut tasks = JoinSet::new();
    for (position, path) in snapshots.iter().enumerate() {
        let path = path.clone();
        let autoload = autoload.clone();
        let catalog = catalog.clone();
        tasks.spawn_blocking(move || (position, discover_snapshot(&path, autoload, catalog)));
    }

    let mut reports: Vec<Option<RunReport>> = vec![None; snapshots.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, report)) => reports[position] = Some(report),
            Err(e) => error!(error = %e, "Discovery task failed"),
        }
    }

    reports
        .into_iter()
        .zip(snapshots)
        .map(|(report, path)| {
            report.unwrap_or_else(|| RunReport::failure(&path.display().to_string(), "task aborted"))
        })
        .collect()
}

fn discover_snapshot(path: &Path, autoload: AutoloadConfig, catalog: ModelCatalog) -> RunReport {
    let name = path.display().to_string();

    let source = match SnapshotSource::from_file(path) {
        Ok(source) => source,
        Err(e) => {
            error!(snapshot = %name, error = %e, "Failed to load snapshot");
            return RunReport::failure(&name, e);
        }
    };

    let result = Autoload::new(source, autoload, catalog).and_then(|engine| engine.discover());
    match result {
        Ok(result) => {
            info!(snapshot = %name, resources = result.resources.len(), "Discovery finished");
            RunReport::success(&name, result)
        }
        Err(e) => {
            error!(snapshot = %name, error = %e, "Discovery failed");
            RunReport::failure(&name, e)
        }
    }
}
