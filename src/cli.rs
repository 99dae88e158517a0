//! Command-line interface definitions for dupsift.
//!
//! # Example
//!
//! ```bash
//! # List duplicate files below two directories
//! dupsift ~/Pictures /mnt/backup/Pictures
//!
//! # Only JPEG files, JSON for scripting
//! dupsift -p '\.jpe?g$' --output json ~/Pictures
//!
//! # Skip build directories, stay on one file system, hash on 8 threads
//! dupsift -P '^target$' -i -s -t 8 ~/src
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Config;

/// Find duplicate files.
///
/// Files are narrowed down by size, edge bytes and partial fingerprints
/// before any file is hashed in full (BLAKE3). Nothing is ever modified.
#[derive(Debug, Parser)]
#[command(name = "dupsift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories (or files) to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Number of hashing threads (1 = no thread pool)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Maximum directory depth below each path (0 = unlimited)
    #[arg(short = 'd', long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Do not cross file system boundaries
    #[arg(short = 's', long = "same-fs")]
    pub same_fs: bool,

    /// Follow symbolic links
    ///
    /// Paths reaching the same file twice are reported once.
    #[arg(short = 'f', long)]
    pub follow_symlinks: bool,

    /// Only consider files whose name matches this regular expression
    #[arg(short = 'p', long, value_name = "REGEX")]
    pub file_pattern: Option<String>,

    /// Only enter directories whose name matches this regular expression
    #[arg(short = 'P', long, value_name = "REGEX")]
    pub dir_pattern: Option<String>,

    /// Match name patterns case-sensitively
    #[arg(short = 'c', long)]
    pub case_sensitive: bool,

    /// Select names that do NOT match the patterns
    #[arg(short = 'i', long)]
    pub invert_match: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file (default: platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Do not show progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    ///
    /// Options given on the command line replace configured values; flags
    /// can only switch a setting on.
    #[must_use]
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(threads) = self.threads {
            config.threads = threads.max(1);
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(ref pattern) = self.file_pattern {
            config.file_pattern = Some(pattern.clone());
        }
        if let Some(ref pattern) = self.dir_pattern {
            config.dir_pattern = Some(pattern.clone());
        }
        config.same_file_system |= self.same_fs;
        config.follow_symlinks |= self.follow_symlinks;
        config.case_sensitive |= self.case_sensitive;
        config.invert_match |= self.invert_match;
        config
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text listing
    Text,
    /// JSON document for scripting
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
