//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves settings
//! - runs the fetch/ingest/filter/aggregate pipeline
//! - prints the run summary and report tables
//! - handles the interactive delayed exit

use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

use clap::Parser;

use crate::cli::{Cli, Command, ReportArgs};
use crate::config::{self, Settings};
use crate::data::{CacheClient, FetchStatus};
use crate::error::AppError;
use crate::report;

pub mod pipeline;

/// Entry point for the `covex` binary.
pub fn run() -> Result<(), AppError> {
    // `covex` and `covex --state Kansas` should behave like `covex report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args, OutputMode::Full),
        Command::Totals(args) => handle_report(args, OutputMode::TotalsOnly),
        Command::Counties(args) => handle_report(args, OutputMode::CountiesOnly),
        Command::Fetch(args) => handle_fetch(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    TotalsOnly,
    CountiesOnly,
}

fn handle_report(args: ReportArgs, mode: OutputMode) -> Result<(), AppError> {
    let settings = resolve_settings(&args)?;
    let run = pipeline::run_report(&settings)?;

    // Diagnostics go to stderr so the tables stay pipeable.
    if let pipeline::FetchReport::StaleFallback { error } = &run.fetch {
        eprintln!("{}", error.render_chain());
        eprintln!(
            "Continuing with the cached copy at '{}'.",
            run.data_path.display()
        );
    }
    for row in &run.ingest.row_errors {
        eprintln!("row {}: {}", row.line, row.message);
    }

    match mode {
        OutputMode::Full => {
            println!("{}", report::format_run_summary(&settings, &run));
            println!("{}", report::format_state_totals(&run.totals));
            println!("{}", report::format_county_rows(&run.snapshot));
        }
        OutputMode::TotalsOnly => {
            println!("{}", report::format_state_totals(&run.totals));
        }
        OutputMode::CountiesOnly => {
            println!("{}", report::format_county_rows(&run.snapshot));
        }
    }

    if mode == OutputMode::Full && !args.no_pause {
        pause_before_exit(settings.exit_delay_ms);
    }

    Ok(())
}

fn handle_fetch(args: ReportArgs) -> Result<(), AppError> {
    let settings = resolve_settings(&args)?;
    let client = CacheClient::new()?;
    let outcome = client.fetch(
        &settings.remote_data_source,
        &settings.output_directory,
        &settings.output_file_name,
    )?;

    match outcome.status {
        FetchStatus::Downloaded {
            etag,
            last_modified,
        } => {
            println!("Downloaded '{}'.", outcome.path.display());
            if let Some(tag) = etag {
                println!("ETag: {tag}");
            }
            if let Some(lm) = last_modified {
                println!("Last-Modified: {lm}");
            }
        }
        FetchStatus::NotModified => {
            println!("Data file in cache is the latest available.");
        }
    }

    Ok(())
}

/// Settings file + environment, then CLI flags on top.
fn resolve_settings(args: &ReportArgs) -> Result<Settings, AppError> {
    let mut settings = config::load(args.config.as_deref())?;

    if let Some(source) = &args.source {
        settings.remote_data_source = source.clone();
    }
    if let Some(dir) = &args.out_dir {
        settings.output_directory = dir.clone();
    }
    if let Some(name) = &args.out_file {
        settings.output_file_name = name.clone();
    }
    if args.all_states {
        settings.state_filter.clear();
    }
    if !args.states.is_empty() {
        settings.state_filter = args.states.clone();
    }
    if let Some(ms) = args.exit_delay_ms {
        settings.exit_delay_ms = ms;
    }

    Ok(settings)
}

/// "Done. Press any key to continue." — bounded by `exit_delay_ms`, cancelled
/// immediately by the first input event. Skipped when stdout is not a
/// terminal, so redirected/batch runs exit straight away.
fn pause_before_exit(exit_delay_ms: u64) {
    if !std::io::stdout().is_terminal() {
        return;
    }

    print!("Done. Press any key to continue. ");
    let _ = std::io::stdout().flush();

    if crossterm::terminal::enable_raw_mode().is_err() {
        return;
    }
    let _ = wait_for_input(Duration::from_millis(exit_delay_ms));
    let _ = crossterm::terminal::disable_raw_mode();
    println!();
}

fn wait_for_input(deadline: Duration) -> std::io::Result<()> {
    let started = Instant::now();
    loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Ok(());
        }
        if crossterm::event::poll(remaining)? {
            // Any event cancels the pause; the payload is irrelevant.
            let _ = crossterm::event::read()?;
            return Ok(());
        }
    }
}

/// Rewrite argv so `covex` defaults to `covex report`.
///
/// Rules:
/// - `covex`                        -> `covex report`
/// - `covex --state Kansas ...`     -> `covex report --state Kansas ...`
/// - `covex --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "totals" | "counties" | "fetch");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_report() {
        assert_eq!(argv(&["covex", "report"]), rewrite_args(argv(&["covex"])));
        assert_eq!(
            argv(&["covex", "report", "--state", "Kansas"]),
            rewrite_args(argv(&["covex", "--state", "Kansas"]))
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            argv(&["covex", "totals"]),
            rewrite_args(argv(&["covex", "totals"]))
        );
        assert_eq!(
            argv(&["covex", "--help"]),
            rewrite_args(argv(&["covex", "--help"]))
        );
    }

    #[test]
    fn cli_flags_override_settings() {
        let args = ReportArgs {
            config: None,
            source: Some("https://example.test/data.csv".to_string()),
            out_dir: None,
            out_file: None,
            states: vec!["Iowa".to_string()],
            all_states: false,
            no_pause: true,
            exit_delay_ms: Some(100),
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.remote_data_source, "https://example.test/data.csv");
        assert_eq!(settings.state_filter, vec!["Iowa"]);
        assert_eq!(settings.exit_delay_ms, 100);
    }
}
