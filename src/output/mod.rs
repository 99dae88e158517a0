//! Output formatters for duplicate scan results.
//!
//! - [`TextOutput`]: human-readable listing
//! - [`JsonOutput`]: machine-readable document for scripting
//!
//! Formatters only read results; they never touch the listed files.
//!
//! # Example
//!
//! ```no_run
//! use dupsift::duplicates::DuplicateFinder;
//! use dupsift::error::ExitCode;
//! use dupsift::output::JsonOutput;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, OutputError};
pub use text::TextOutput;
