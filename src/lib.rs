//! dupsift - duplicate file finder
//!
//! Files are discovered into a size-ordered candidate store, then narrowed
//! down in stages that read progressively more of each file: size, edge
//! bytes, head and tail fingerprints and finally a full BLAKE3 digest.
//! Only files that survive every cheaper stage are hashed in full.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the Ctrl+C handler
/// cannot be installed, a root does not exist, or results cannot be
/// written. A scan stopped with Ctrl+C is not an error: its partial
/// results are written and [`ExitCode::Interrupted`] is returned.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = cli.apply_to(config);
    log::debug!("Effective configuration: {:?}", config);

    let token = signal::install_handler()?;

    let mut finder_config = FinderConfig::default()
        .with_threads(config.threads)
        .with_walker_config(config.walker_config())
        .with_cancellation(token);
    if !cli.quiet && !cli.no_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates(&cli.paths).context("Scan failed")?;
    let exit_code = ExitCode::for_scan(summary.interrupted);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&groups, &summary).write_to(&mut out)?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary, exit_code).write_to(&mut out, true)?,
    }
    out.flush()?;

    Ok(exit_code)
}
