//! Sweep configuration structures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the directory sweep.
///
/// Captured once at construction and never mutated afterwards; every sweep
/// runs against the same target, pattern and thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Enable sweeping.
    ///
    /// Default: false (must be explicitly enabled)
    ///
    /// Env: DIRSWEEP__SWEEP__ENABLED
    #[serde(default)]
    pub enabled: bool,

    /// Directory whose immediate children are inspected. The directory
    /// itself is never deleted, and nothing below the first level is
    /// inspected.
    ///
    /// Env: DIRSWEEP__SWEEP__DIR_TO_CLEAN
    #[serde(default = "default_dir_to_clean")]
    pub dir_to_clean: PathBuf,

    /// Regex tested against each child's path string. A child matches when
    /// the pattern is found anywhere in the path, not only when it spans
    /// the whole string.
    ///
    /// Env: DIRSWEEP__SWEEP__PATTERN
    #[serde(default)]
    pub pattern: String,

    /// Minimum age before a matched directory becomes eligible for
    /// deletion. A child exactly at the threshold is retained.
    ///
    /// Env: DIRSWEEP__SWEEP__CLEAN_THRESHOLD
    #[serde(with = "humantime_serde", default = "default_clean_threshold")]
    pub clean_threshold: Duration,

    /// Interval between sweeps.
    ///
    /// Env: DIRSWEEP__SWEEP__CLEAN_INTERVAL
    #[serde(with = "humantime_serde", default = "default_clean_interval")]
    pub clean_interval: Duration,

    /// Dry-run mode: log what would be deleted without deleting.
    ///
    /// Env: DIRSWEEP__SWEEP__DRY_RUN
    #[serde(default)]
    pub dry_run: bool,
}

fn default_dir_to_clean() -> PathBuf {
    PathBuf::from(".data/scratch")
}

fn default_clean_threshold() -> Duration {
    Duration::from_secs(24 * 3600)
}

fn default_clean_interval() -> Duration {
    Duration::from_secs(3600)
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir_to_clean: default_dir_to_clean(),
            pattern: String::new(),
            clean_threshold: default_clean_threshold(),
            clean_interval: default_clean_interval(),
            dry_run: false,
        }
    }
}

impl SweepConfig {
    /// Validate the sweep configuration.
    ///
    /// Checks:
    /// - Threshold and interval are positive
    /// - Target directory path is non-empty
    /// - Pattern is non-empty and compiles
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = Duration::from_secs(0);

        if self.clean_threshold <= zero {
            return Err(ConfigError::InvalidThreshold(self.clean_threshold));
        }
        if self.clean_interval <= zero {
            return Err(ConfigError::InvalidInterval(self.clean_interval));
        }
        if self.dir_to_clean.as_os_str().is_empty() {
            return Err(ConfigError::EmptyTargetDir);
        }

        self.compile_pattern()?;

        Ok(())
    }

    /// Compile the configured pattern.
    ///
    /// An empty pattern is rejected rather than compiled: unanchored, it
    /// would match every child of the target directory.
    pub fn compile_pattern(&self) -> Result<Regex, ConfigError> {
        if self.pattern.is_empty() {
            return Err(ConfigError::EmptyPattern);
        }

        Regex::new(&self.pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: self.pattern.clone(),
            source,
        })
    }
}

/// Errors that can occur during sweep configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Pattern does not compile as a regex.
    #[error("invalid sweep pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// Pattern is empty.
    #[error("sweep pattern must not be empty")]
    EmptyPattern,

    /// Threshold must be positive.
    #[error("clean_threshold must be positive, got {0:?}")]
    InvalidThreshold(Duration),

    /// Interval must be positive.
    #[error("clean_interval must be positive, got {0:?}")]
    InvalidInterval(Duration),

    /// Target directory path is empty.
    #[error("dir_to_clean must not be empty")]
    EmptyTargetDir,
}

/// Top-level service configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    pub sweep: SweepConfig,
}

impl Configuration {
    /// Load configuration from `dirsweep.toml` and the environment, on top
    /// of the built-in defaults.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file("dirsweep.toml"))
            .merge(Env::prefixed("DIRSWEEP__").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    /// Load configuration from a specific TOML file and the environment.
    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("DIRSWEEP__").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
