use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use district_safety_analytics::{
    config::Config,
    dataset::{DatasetSource, JsonFileSource},
    ml::PredictionService,
    report::{
        compose_district_rows, CrimeReport, DistrictTable, PredictionReport, ReportFormat,
        SafetyReport, TabularReport,
    },
    telemetry::init_tracing,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "district-analytics-cli")]
#[command(about = "District safety analytics CLI", long_about = None)]
struct Cli {
    /// Dataset file (JSON array of district rows); defaults to the configured path
    #[arg(short, long, env = "DISTRICT_ANALYTICS_DATASET")]
    dataset: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,

    /// Override the configured random seed
    #[arg(short, long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict crime counts and show the largest errors
    Crime,

    /// Label districts and classify the probe inputs
    Safety,

    /// Run both pipelines
    All,

    /// Show every district with its predicted count and safety designation
    Districts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.observability);

    if let Some(seed) = cli.seed {
        config.ml = config.ml.with_seed(seed);
    }
    let dataset = cli.dataset.unwrap_or_else(|| config.dataset.path.clone());

    let source = JsonFileSource::new(&dataset);
    let snapshot = source
        .load()
        .await
        .with_context(|| format!("failed to load {}", source.describe()))?;

    let designations = config.ml.designations.clone();
    let service = PredictionService::new(config.ml).context("invalid ml configuration")?;

    let output = match cli.command {
        Commands::Crime => {
            let forecast = service.forecast_crime(&snapshot)?;
            render_table(cli.format, &CrimeReport::from_forecast(&forecast))?
        }
        Commands::Safety => {
            let assessment = service.assess_safety(&snapshot)?;
            render_table(
                cli.format,
                &SafetyReport::from_assessment(&assessment, &designations),
            )?
        }
        Commands::All => {
            let run = service.run_all(&snapshot)?;
            let report = PredictionReport::from_run(&run, &designations);
            match cli.format {
                ReportFormat::Json => serde_json::to_string_pretty(&report)?,
                ReportFormat::Html => report.to_html(),
                ReportFormat::Text => report.to_text(),
            }
        }
        Commands::Districts => {
            let run = service.run_all(&snapshot)?;
            let table = DistrictTable {
                rows: compose_district_rows(&snapshot, &run.crime, &run.safety, &designations),
            };
            render_table(cli.format, &table)?
        }
    };

    println!("{}", output);
    Ok(())
}

fn render_table<T: TabularReport + Serialize>(format: ReportFormat, report: &T) -> Result<String> {
    Ok(match format {
        ReportFormat::Json => serde_json::to_string_pretty(report)?,
        ReportFormat::Html => report.to_html(),
        ReportFormat::Text => report.to_text(),
    })
}
