//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, or `config.toml` in the platform config
//!    directory)
//! 3. `DUPSIFT_*` environment variables
//! 4. command-line flags (applied by the caller)
//!
//! # Example
//!
//! ```toml
//! threads = 8
//! max_depth = 3
//! same_file_system = true
//! file_pattern = '\.(jpe?g|png)$'
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::checksum::DEFAULT_WORKERS;
use crate::scanner::WalkerConfig;

/// Prefix of the environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "DUPSIFT_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of hashing workers (1 hashes on the main thread).
    pub threads: usize,
    /// Maximum directory depth below a root; 0 means unlimited.
    pub max_depth: usize,
    /// Stay on the file system of each root.
    pub same_file_system: bool,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Match name patterns case-sensitively.
    pub case_sensitive: bool,
    /// Select names that do not match the patterns.
    pub invert_match: bool,
    /// Regular expression a file name must pass.
    pub file_pattern: Option<String>,
    /// Regular expression a directory name must pass to be entered.
    pub dir_pattern: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: DEFAULT_WORKERS,
            max_depth: 0,
            same_file_system: false,
            follow_symlinks: false,
            case_sensitive: false,
            invert_match: false,
            file_pattern: None,
            dir_pattern: None,
        }
    }
}

/// Errors raised while loading or saving configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be read or has the wrong shape.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The configuration could not be encoded as TOML.
    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The configuration file could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

impl Config {
    /// Build the layered figment without extracting it.
    ///
    /// `explicit` replaces the default file location. A missing file is
    /// simply an empty layer.
    #[must_use]
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = explicit.map(Path::to_path_buf).or_else(Self::config_path) {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file is malformed or a value has
    /// the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(explicit).extract()?)
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupsift").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Traversal settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            same_file_system: self.same_file_system,
            follow_symlinks: self.follow_symlinks,
            file_pattern: self.file_pattern.clone(),
            dir_pattern: self.dir_pattern.clone(),
            case_sensitive: self.case_sensitive,
            invert_match: self.invert_match,
        }
    }
}
