#![warn(clippy::all)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use healthcheck::{Config, HealthEngine, HealthReport, generate_service_pool};
use tracing::info;

/// Run the health checker against a synthetic service pool and print a summary
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (created with defaults if missing)
    #[arg(short, long, env = "UPPE_HEALTH_CONFIG")]
    config: Option<PathBuf>,

    /// Number of services to generate
    #[arg(short, long, default_value_t = 25)]
    services: usize,

    /// How long to monitor before reporting, e.g. "15s" or "2m"
    #[arg(long, default_value = "15s", value_parser = humantime::parse_duration)]
    run_for: Duration,

    /// Print the full report as JSON instead of the summary line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_tracing();
    let args = Args::parse();

    let config = Config::from_config(args.config.as_deref()).context("Failed to load configuration")?;
    info!("{}", config);

    let engine = HealthEngine::new(config)?;
    generate_service_pool(&engine, args.services).await?;

    engine.start_monitoring().await;
    tokio::time::sleep(args.run_for).await;

    let report = engine.get_report().await;
    engine.stop_monitoring().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summary_line(&report));
    }

    Ok(())
}

fn summary_line(report: &HealthReport) -> String {
    format!(
        "Health checker: {}/{} healthy ({:.1}%)",
        report.overall.healthy, report.overall.total_services, report.overall.health_percentage
    )
}
