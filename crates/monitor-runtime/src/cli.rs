//! Command line.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Validator-Watch: validator participation monitor
#[derive(Parser, Debug)]
#[command(name = "monitor-runtime")]
#[command(about = "Track validator participation, alert on gaps and send daily reports")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Follow the chain tip until interrupted
    Run {
        /// Do not start per-user report loops
        #[arg(long)]
        disable_reports: bool,
    },

    /// Fill heights `from + 1 ..= to`, then exit
    Backfill {
        #[arg(long)]
        from: i64,

        #[arg(long)]
        to: i64,

        /// Use the worker pool instead of the sequential loop
        #[arg(long)]
        parallel: bool,

        /// Worker count for the parallel strategy
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Store a user's daily report time
    Schedule {
        #[arg(long)]
        user: String,

        #[arg(long)]
        hour: Option<u32>,

        #[arg(long)]
        minute: Option<u32>,

        /// IANA timezone name, e.g. Europe/Paris
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Print yesterday's summary and exit
    Report {
        /// Day to render (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
}
