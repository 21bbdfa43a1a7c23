//! dupelink - duplicate file finder and symlink remediator
//!
//! Walks directory trees, confirms duplicate files byte-for-byte, picks the
//! copy that looks most like the original, and prints either a listing or a
//! shell script replacing every other copy with a symlink to the original.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod uplift;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, ScanArgs, UpliftArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{ListingOutput, ScriptOutput};
use crate::progress::Progress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for anything that prevents producing a result: a missing
/// root, a malformed pattern or config file, or a failure writing stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Scan(args) => run_scan(args, cli.config.as_deref(), cli.quiet),
        Commands::Uplift(args) => run_uplift(args),
    }
}

fn run_scan(args: &ScanArgs, config_path: Option<&Path>, quiet: bool) -> Result<ExitCode> {
    let config = Config::load(config_path)?.apply_scan_args(args);
    let mut finder_config = config.to_finder_config()?;

    let progress = Progress::new(quiet);
    if progress.is_enabled() {
        finder_config = finder_config.with_progress_callback(Arc::new(progress));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates_in_paths(&args.paths)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let written = if args.script {
        ScriptOutput::new(&groups, &summary).write_to(&mut out)
    } else {
        ListingOutput::new(&groups).write_to(&mut out)
    };
    written.context("Failed to write output")?;

    if summary.has_errors() {
        log::warn!(
            "{} file(s) could not be read; results may be incomplete",
            summary.scan_errors.len()
        );
    }
    Ok(ExitCode::from_summary(&summary))
}

fn run_uplift(args: &UpliftArgs) -> Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut found = 0usize;

    for path in &args.paths {
        if !path.is_dir() {
            anyhow::bail!("Not a directory: {}", path.display());
        }
        for uplift in uplift::find_softlink_dirs(path, !args.flat) {
            match uplift.to_command() {
                Some(command) => {
                    writeln!(out, "{command}").context("Failed to write output")?;
                    found += 1;
                }
                None => log::warn!(
                    "Skipping {} with a path that is not valid UTF-8",
                    uplift.dir.display()
                ),
            }
        }
    }
    out.flush().context("Failed to write output")?;

    log::info!("Found {} collapsible director(ies)", found);
    Ok(if found == 0 {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    })
}
