//! Command-line parsing for the county case explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "covex",
    version,
    about = "COVID county case explorer (cached NYT dataset)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh the cache, ingest, and print the summary plus both tables.
    Report(ReportArgs),
    /// Print the per-state totals table only (useful for scripting).
    Totals(ReportArgs),
    /// Print the per-(state, county) latest-snapshot table only.
    Counties(ReportArgs),
    /// Refresh the local cache and report the server's answer, nothing else.
    Fetch(ReportArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Settings file (JSON). `covex.json` is used when present.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Remote dataset URL (overrides the settings file).
    #[arg(long, value_name = "URL")]
    pub source: Option<String>,

    /// Directory for the cached CSV and its validation tag.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// File name of the cached CSV.
    #[arg(long, value_name = "NAME")]
    pub out_file: Option<String>,

    /// State to include (repeatable; overrides the configured filter).
    #[arg(short = 's', long = "state", value_name = "NAME")]
    pub states: Vec<String>,

    /// Ignore any configured state filter and report every state.
    #[arg(long, conflicts_with = "states")]
    pub all_states: bool,

    /// Skip the interactive "press any key" pause.
    #[arg(long)]
    pub no_pause: bool,

    /// Upper bound in milliseconds for the interactive pause.
    #[arg(long, value_name = "MS")]
    pub exit_delay_ms: Option<u64>,
}
