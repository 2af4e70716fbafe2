//! CLI entry point for the court booking admin overview.
//!
//! Provides subcommands for running a single overview pass, keeping the
//! overview refreshed on an interval, and probing each backend source.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use court_overview::{
    config::ConsoleConfig,
    error::OverviewError,
    infra::backend::BackendClient,
    infra::credentials::{ChainedStore, CredentialStore, EnvCredentialStore, SessionFileStore},
    output::{print_pretty, render_text, to_json},
    overview::{compute_overview, metrics::OverviewMetrics, read_sources},
    period::{current_window, previous_window},
    refresh::OverviewRefresher,
    sources::SourceKind,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "court_overview")]
#[command(about = "Dashboard overview for the court booking admin console", long_about = None)]
struct Cli {
    /// Backend API base URL (overrides COURT_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// JSON session file holding the bearer token (overrides COURT_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Per-request timeout in seconds (overrides COURT_API_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one overview pass and print the result
    Overview {
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Reference instant in local time (YYYY-MM-DDTHH:MM:SS), defaults to now
        #[arg(long, value_name = "LOCAL_TIME")]
        at: Option<String>,
    },
    /// Re-run the overview on an interval until Ctrl+C
    Watch {
        #[arg(short, long, default_value_t = 60)]
        interval_secs: u64,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Probe every source reader once and report its status
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/court_overview.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("court_overview.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = ConsoleConfig::from_env()?;
    if let Some(url) = cli.base_url {
        config.api_base_url = url;
    }
    if let Some(path) = cli.session_file {
        config.session_file = Some(path);
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    info!(base_url = %config.api_base_url, "Using backend");

    let client = BackendClient::from_config(&config)?;
    let credentials = credential_store(&config);

    match cli.command {
        Commands::Overview { format, at } => {
            let now = match at {
                Some(raw) => parse_local(&raw)?,
                None => Local::now().naive_local(),
            };
            let credential = credentials
                .credential()
                .await
                .map_err(OverviewError::CredentialStore)?;
            let metrics = compute_overview(&client, credential.as_ref(), now).await?;
            emit(&metrics, format)?;
        }
        Commands::Watch {
            interval_secs,
            format,
        } => {
            watch(client, credentials, interval_secs, format).await?;
        }
        Commands::Sources => {
            probe_sources(&client, credentials.as_ref()).await?;
        }
    }

    Ok(())
}

fn credential_store(config: &ConsoleConfig) -> Arc<dyn CredentialStore> {
    let mut stores: Vec<Box<dyn CredentialStore>> = Vec::new();
    if let Some(path) = &config.session_file {
        stores.push(Box::new(SessionFileStore::new(path)));
    }
    stores.push(Box::new(EnvCredentialStore::new(&config.token_env)));
    Arc::new(ChainedStore::new(stores))
}

fn parse_local(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("--at must look like 2024-02-10T09:00:00, got '{raw}'"))
}

fn emit(metrics: &OverviewMetrics, format: Format) -> Result<()> {
    match format {
        Format::Text => print!("{}", render_text(metrics)),
        Format::Json => println!("{}", to_json(metrics)?),
        Format::Pretty => print_pretty(metrics),
    }
    Ok(())
}

/// Keeps the overview fresh until Ctrl+C. Each tick starts a new pass that
/// supersedes the previous one.
#[tracing::instrument(skip(client, credentials, format))]
async fn watch(
    client: BackendClient,
    credentials: Arc<dyn CredentialStore>,
    interval_secs: u64,
    format: Format,
) -> Result<()> {
    let refresher = OverviewRefresher::new(Arc::new(client), credentials);
    let mut rx = refresher.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    info!(interval_secs, "Watching overview. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let generation = refresher.refresh();
                info!(generation, "Started overview pass");
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(published) = rx.borrow_and_update().clone() else {
                    continue;
                };
                match published.result {
                    Ok(metrics) => emit(&metrics, format)?,
                    Err(e) => error!(
                        generation = published.generation,
                        error = %e,
                        "Overview pass failed, keeping last result"
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                refresher.shutdown();
                break;
            }
        }
    }

    Ok(())
}

/// Issues every reader call once and logs the per-source outcome.
#[tracing::instrument(skip_all)]
async fn probe_sources(
    client: &BackendClient,
    credentials: &dyn CredentialStore,
) -> Result<()> {
    let credential = credentials
        .credential()
        .await
        .map_err(OverviewError::CredentialStore)?
        .ok_or(OverviewError::MissingCredential)?;

    let now = Local::now().naive_local();
    let outcomes =
        read_sources(client, &credential, current_window(now), previous_window(now)).await;

    let records = |n: usize| format!("{n} records");
    let report: [(SourceKind, Option<String>); 8] = [
        (SourceKind::Users, outcomes.users.ready().map(|v| records(v.len()))),
        (SourceKind::Bookings, outcomes.bookings.ready().map(|v| records(v.len()))),
        (SourceKind::Courts, outcomes.courts.ready().map(|v| records(v.len()))),
        (SourceKind::CourtUsage, outcomes.court_usage.ready().map(|v| records(v.len()))),
        (
            SourceKind::CurrentRevenue,
            outcomes.current_revenue.ready().map(|r| format!("total {}", r.total)),
        ),
        (
            SourceKind::PreviousRevenue,
            outcomes.previous_revenue.ready().map(|r| format!("total {}", r.total)),
        ),
        (
            SourceKind::EquipmentIssues,
            outcomes.equipment_issues.ready().map(|n| format!("{n} pending")),
        ),
        (
            SourceKind::VenueMaintenance,
            outcomes.venue_maintenance.ready().map(|n| format!("{n} pending")),
        ),
    ];

    let mut available = 0;
    for (source, summary) in &report {
        match summary {
            Some(summary) => {
                available += 1;
                info!(source = %source, %summary, "Source available");
            }
            None => warn!(source = %source, "Source unavailable"),
        }
    }

    info!(available, total = report.len(), "Source probe summary");
    Ok(())
}
