//! FleetLens - vehicle inventory client and analytics
//!
//! A CLI for a `/vehicle` REST API: list, show, add, edit and delete
//! vehicles, and summarize the inventory into analytics reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, I/O, API error response)
//!   2 - Invalid data (a vehicle record could not be aggregated)

mod analysis;
mod api;
mod cli;
mod config;
mod models;
mod report;

use analysis::AggregationError;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, Command};
use config::{Config, ReportFormat, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalyticsReport, DataSource, ReportMetadata, VehicleDraft};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // Load configuration first so the file can raise the log level
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("FleetLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Effective config: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            if let Some(invalid) = e.downcast_ref::<AggregationError>() {
                error!("Rejected vehicle data: {}", invalid);
                eprintln!("\n⚠️  {}: {}", report::INVALID_DATA, invalid);
                std::process::exit(2);
            }
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .fleetlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the API URL, timeout, and report defaults.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the selected command. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let currency = config.report.currency_symbol.clone();
    let client = api::VehicleClient::new(api::ClientConfig::from(&config.api))?;

    match args.command.clone() {
        Command::List { json } => {
            let progress = spinner(args.quiet, "Fetching vehicles...");
            let vehicles = client.list_vehicles().await;
            finish_spinner(progress);
            let vehicles = vehicles?;

            info!(
                "Loaded {} vehicles: {}",
                vehicles.len(),
                report::manufacturer_summary(&vehicles)
            );
            println!("{}", render_listing(&vehicles, json, &currency)?);
        }
        Command::Show { vin } => {
            let vehicle = client.get_vehicle(&vin).await?;
            println!("{}", report::generate_vehicle_details(&vehicle, &currency));
        }
        Command::Add { fields } => {
            let draft = VehicleDraft::from(fields);
            let created = client.create_vehicle(&draft).await?;
            println!("✅ Added vehicle {}", stored_vin(&created, &draft.vin));
        }
        Command::Edit { fields } => {
            let draft = VehicleDraft::from(fields);
            let updated = client.update_vehicle(&draft.vin, &draft).await?;
            println!("✅ Saved vehicle {}", stored_vin(&updated, &draft.vin));
        }
        Command::Delete { vin } => {
            client.delete_vehicle(&vin).await?;
            println!("🗑️  Deleted vehicle {}", vin);
        }
        Command::Analytics {
            input,
            output,
            format,
            top,
        } => {
            let format = format.unwrap_or(config.report.format);
            let top = top.unwrap_or(config.report.top_expensive);
            return run_analytics(&client, &args, input, output, format, top, &currency).await;
        }
        Command::InitConfig => return handle_init_config().map(|_| 0),
    }

    Ok(0)
}

/// Render the listed vehicles as a table or as pretty JSON.
fn render_listing(vehicles: &[Value], json: bool, currency: &str) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(vehicles)?);
    }
    if vehicles.is_empty() {
        return Ok("No vehicles found.".to_string());
    }
    Ok(report::generate_vehicle_table(vehicles, currency))
}

/// VIN of a record echoed back by the server, falling back to the one sent.
fn stored_vin<'a>(stored: &'a Value, sent: &'a str) -> &'a str {
    stored.get("vin").and_then(Value::as_str).unwrap_or(sent)
}

/// Fetch or read the collection, aggregate it, and emit the report.
async fn run_analytics(
    client: &api::VehicleClient,
    args: &Args,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: ReportFormat,
    top: usize,
    currency: &str,
) -> Result<i32> {
    let start_time = Instant::now();

    let (raw, source) = match input {
        Some(path) => (read_vehicle_file(&path)?, DataSource::File(path.display().to_string())),
        None => {
            let progress = spinner(args.quiet, "Fetching vehicles...");
            let raw = client.fetch_raw().await;
            finish_spinner(progress);
            (raw?, DataSource::Api(client.collection_url()))
        }
    };

    let vehicles = analysis::parse_records(&raw)?;
    let summary = analysis::aggregate(&vehicles)?;
    info!(
        "Aggregated {} vehicles in {:.3}s",
        summary.total_count,
        start_time.elapsed().as_secs_f64()
    );

    if summary.is_empty() {
        warn!("No vehicles to analyze");
    }

    let report = AnalyticsReport {
        metadata: ReportMetadata {
            source,
            generated_at: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        charts: analysis::chart_series(&summary),
        most_expensive: analysis::most_expensive(&vehicles, top),
        summary,
    };

    let rendered = report::render_report(&report, format, currency)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", rendered),
    }

    Ok(0)
}

/// Read a JSON array of vehicle objects from disk.
fn read_vehicle_file(path: &Path) -> Result<Vec<Value>> {
    info!("Reading vehicles from {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;

    match value {
        Value::Array(items) => Ok(items),
        _ => anyhow::bail!("{} must contain a JSON array of vehicles", path.display()),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Start a spinner on stderr unless running quietly.
fn spinner(quiet: bool, message: &'static str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish_spinner(progress: Option<ProgressBar>) {
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
}
