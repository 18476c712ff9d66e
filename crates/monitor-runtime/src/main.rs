//! # Validator-Watch Monitor
//!
//! ```bash
//! monitor-runtime --config config.toml run
//! monitor-runtime backfill --from 1 --to 250000 --parallel --workers 20
//! monitor-runtime schedule --user 42 --hour 9 --minute 0 --timezone Europe/Paris
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use tracing::info;

use monitor_runtime::cli::{Cli, Command};
use monitor_runtime::{
    open_store, render_report, run_backfill, save_schedule, MonitorConfig, MonitorRuntime,
};
use vw_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _telemetry =
        init_telemetry(&TelemetryConfig::from_env()).context("initializing telemetry")?;

    let config = MonitorConfig::load_with_env(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Command::Run { disable_reports } => {
            let runtime = MonitorRuntime::new(config.clone())?;
            runtime
                .run(config.reports.enabled && !disable_reports)
                .await?;
        }
        Command::Backfill {
            from,
            to,
            parallel,
            workers,
        } => {
            let report = run_backfill(&config, from, to, parallel, workers).await?;
            info!(
                blocks = report.blocks,
                skipped = report.skipped,
                rows = report.written.rows,
                flushes = report.flushes,
                "Backfill complete"
            );
        }
        Command::Schedule {
            user,
            hour,
            minute,
            timezone,
        } => {
            let store = open_store(&config)?;
            save_schedule(&store, &config, &user, hour, minute, timezone)?;
        }
        Command::Report { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive() - Duration::days(1));
            let report = render_report(&config, date).await?;
            println!("{report}");
        }
    }

    Ok(())
}
