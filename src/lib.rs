//! dupesweep - batch duplicate file remover
//!
//! Walks a directory tree, fingerprints every eligible file with a 256-bit
//! content hash on a pool of worker threads, groups files by digest and
//! deletes redundant copies according to an explicit keep policy.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`scanner::Scanner`] walks the tree and enqueues eligible files
//! 2. [`duplicates::WorkerPool`] hashes queued files in parallel
//! 3. [`duplicates::Aggregator`] owns the digest → group map
//! 4. [`actions::Reconciler`] removes duplicates once hashing has drained

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::actions::{remover_for, Reconciler};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonOutput, RunReport, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::signal::ShutdownHandler;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable root directory,
/// a pipeline failure, or an interrupt during the scan. Per-file problems
/// are reported in the run report instead.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let presentation = Presentation::from_cli(&cli);

    match cli.command {
        Commands::Config => {
            let toml = config.to_toml().context("Failed to render configuration")?;
            let mut stdout = io::stdout().lock();
            if let Some(path) = cli.config.clone().or_else(Config::default_path) {
                writeln!(stdout, "# {}", path.display())?;
            }
            write!(stdout, "{toml}")?;
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => {
            config.merge_scan_args(&args);
            run_scan(&presentation, &args, &config)
        }
    }
}

/// Global flags that affect how a scan is presented.
struct Presentation {
    quiet: bool,
    color: bool,
}

impl Presentation {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            quiet: cli.quiet,
            color: !cli.no_color && io::stdout().is_terminal(),
        }
    }
}

fn run_scan(
    presentation: &Presentation,
    args: &ScanArgs,
    config: &Config,
) -> anyhow::Result<ExitCode> {
    let started = Instant::now();
    let settings = config.validate().context("Invalid configuration")?;

    let handler = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{e}; Ctrl+C will terminate immediately");
        ShutdownHandler::new()
    });
    let shutdown = handler.get_flag();

    let hide_progress =
        presentation.quiet || args.no_progress || args.output == OutputFormat::Json;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(hide_progress));

    log::info!(
        "Scanning {} (keep {}, {}, {} workers)",
        args.root.display(),
        settings.keep,
        settings.delete_mode,
        settings.workers
    );

    let finder = DuplicateFinder::new(
        settings
            .finder_config()
            .with_shutdown_flag(Arc::clone(&shutdown))
            .with_progress_callback(Arc::clone(&progress)),
    );
    let (aggregate, summary) = finder
        .find_duplicates(&args.root)
        .with_context(|| format!("Scan of {} failed", args.root.display()))?;

    let remover = remover_for(settings.delete_mode);
    let reconciliation = Reconciler::new(settings.keep, remover.as_ref())
        .with_shutdown_flag(shutdown)
        .with_progress_callback(progress)
        .reconcile(aggregate.groups());

    let report = RunReport::builder(&args.root, settings.keep, settings.delete_mode, settings.hash)
        .finish(aggregate, summary, reconciliation, started.elapsed());

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&report).write_to(&mut stdout, true)?,
        OutputFormat::Text if !presentation.quiet => {
            TextOutput::new(&report, presentation.color).write_to(&mut stdout)?;
        }
        OutputFormat::Text => {}
    }
    stdout.flush()?;

    Ok(report.exit_code())
}
