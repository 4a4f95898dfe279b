//! Command-line interface definitions for dupesweep.
//!
//! Global options (verbosity, color, error format, config file) come before
//! the subcommand. Every scan option is optional on the command line so
//! that unset flags fall through to the config file, the environment and
//! finally the built-in defaults.
//!
//! # Example
//!
//! ```bash
//! # Remove every copy of every duplicate older than a day
//! dupesweep scan ~/cache --keep none
//!
//! # Keep one copy per group, move the rest to the trash
//! dupesweep scan ~/Downloads --keep one --trash
//!
//! # See what would happen, as JSON
//! dupesweep scan ~/Downloads --keep one --dry-run --output json
//!
//! # Show the configuration a scan would use
//! dupesweep config
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::actions::KeepPolicy;
use crate::scanner::HashAlgorithm;

/// Batch duplicate file remover.
///
/// dupesweep walks a directory tree, fingerprints every file that is large
/// and old enough with a 256-bit content hash, and deletes redundant copies
/// according to an explicit keep policy.
#[derive(Debug, Parser)]
#[command(name = "dupesweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: config.toml in the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and remove duplicate files
    Scan(ScanArgs),
    /// Print the resolved configuration as TOML
    Config,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Minimum file size to consider (e.g., 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Minimum time since last modification (e.g., 3600, 90m, 2d, 1w)
    #[arg(long, value_name = "AGE", value_parser = parse_age)]
    pub min_age: Option<Duration>,

    /// Number of hashing workers
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    pub workers: Option<usize>,

    /// Capacity of the queue between scanner and workers
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    pub queue_capacity: Option<usize>,

    /// Content hash algorithm
    #[arg(long, value_enum, value_name = "ALG")]
    pub hash: Option<HashAlgorithm>,

    /// Which members of a duplicate group survive: `one` keeps the
    /// lexicographically smallest path, `none` deletes every copy
    #[arg(long, value_enum, value_name = "POLICY")]
    pub keep: Option<KeepPolicy>,

    /// Move duplicates to the system trash instead of deleting them
    #[arg(long, conflicts_with = "dry_run")]
    pub trash: bool,

    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Follow symbolic links during the walk (cycles are detected)
    #[arg(long, overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symbolic links, even if the config file says so
    #[arg(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl ScanArgs {
    /// Follow-symlinks override from the command line, if any.
    #[must_use]
    pub fn follow_symlinks_override(&self) -> Option<bool> {
        if self.follow_symlinks {
            Some(true)
        } else if self.no_follow_symlinks {
            Some(false)
        } else {
            None
        }
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupesweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
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

/// Parse a minimum age into a duration.
///
/// Bare numbers are seconds. Suffixes: `s`, `m`, `h`, `d`, `w`.
///
/// ```
/// use dupesweep::cli::parse_age;
/// use std::time::Duration;
///
/// assert_eq!(parse_age("90").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_age("2d").unwrap(), Duration::from_secs(172_800));
/// ```
///
/// # Errors
///
/// Returns an error for empty input, a non-integer amount, an unknown
/// unit, or an amount that overflows.
pub fn parse_age(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Age cannot be empty".to_string());
    }

    let (num_str, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => (&s[..idx], s[idx..].trim().to_lowercase()),
        None => (s, String::new()),
    };

    let amount: u64 = num_str
        .parse()
        .map_err(|_| format!("Invalid age: '{s}'"))?;

    let unit_secs: u64 = match unit.as_str() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return Err(format!("Unknown age unit: '{unit}' (use s, m, h, d or w)")),
    };

    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Age is too large: '{s}'"))
}

/// Parse a count that must be at least one.
///
/// # Errors
///
/// Returns an error for non-numbers and zero.
pub fn parse_positive(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if n == 0 {
        return Err("Value must be at least 1".to_string());
    }
    Ok(n)
}
