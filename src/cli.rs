//! Command-line interface definitions for dupelink.
//!
//! This module defines all CLI arguments and subcommands using the clap derive
//! API. Scalar scan options are optional so that unset flags fall back to the
//! configuration file and environment (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # List duplicate groups, one path per line
//! dupelink scan ~/Photos ~/Backup
//!
//! # Emit a remediation script, preferring files under ~/Photos as originals
//! dupelink scan ~/Photos ~/Backup --original '^/home/[^/]+/Photos/' --script > fix.sh
//!
//! # Collapse directories that now only contain parallel symlinks
//! dupelink uplift ~/Backup
//!
//! # Verbose mode for debugging
//! dupelink -v scan ~/Downloads
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::duplicates::{LengthPreference, VerifyStrategy};

/// Find duplicate files and replace copies with symlinks.
///
/// dupelink walks one or more directory trees, confirms duplicates
/// byte-for-byte, and prints either a listing or a shell script that deletes
/// every copy and links it to the original.
#[derive(Debug, Parser)]
#[command(name = "dupelink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir/dupelink/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for dupelink.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
    /// Find directories that can be replaced by a single symlink
    Uplift(UpliftArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan for duplicates
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Do not step down into subdirectories
    #[arg(short, long)]
    pub flat: bool,

    /// Skip symbolic links instead of following them
    #[arg(long)]
    pub no_follow_symlinks: bool,

    /// Minimum file size to consider (e.g., 100, 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Only consider files matching this gitignore-style pattern (repeatable)
    #[arg(short, long = "include", value_name = "PATTERN")]
    pub include_patterns: Vec<String>,

    /// Skip files and directories matching this gitignore-style pattern (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Regex marking paths that look like originals (repeatable)
    #[arg(long = "original", value_name = "REGEX")]
    pub original_patterns: Vec<String>,

    /// Regex marking paths that look like copies (repeatable)
    #[arg(long = "not-original", value_name = "REGEX")]
    pub not_original_patterns: Vec<String>,

    /// Path-length preference applied before pattern scoring
    #[arg(long, value_enum, value_name = "PREFERENCE")]
    pub prefer: Option<LengthPreference>,

    /// Emit a delete-and-symlink shell script instead of a listing
    #[arg(short, long)]
    pub script: bool,

    /// Exact verification strategy
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub verify: Option<VerifyStrategy>,

    /// Report every path of a hardlinked file as a duplicate
    #[arg(long)]
    pub report_hardlinks: bool,

    /// Number of I/O threads for hashing and verification (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Abandon subtrees nested deeper than this many directories
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

/// Arguments for the uplift subcommand.
#[derive(Debug, Args)]
pub struct UpliftArgs {
    /// Search for collapsible directories in these locations
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Do not step down into subdirectories
    #[arg(short, long)]
    pub flat: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupelink::cli::parse_size;
///
/// assert_eq!(parse_size("100").unwrap(), 100);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
