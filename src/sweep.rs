//! The sweep pass: scan, match, reclaim.
//!
//! A sweep is one self-contained pass over the immediate children of the
//! target directory. Children that are directories, match the configured
//! pattern and are older than the threshold are recursively deleted; young
//! directories are assumed still in use by whatever process writes to the
//! target and are never touched.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::clock::Clock;
use crate::config::{ConfigError, SweepConfig};
use crate::fs::Filesystem;

/// Outcome of a single sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Children returned by the listing.
    pub evaluated: usize,
    /// Directories whose path matched the pattern.
    pub matched: usize,
    /// Matched directories retained because their age is at or under the
    /// threshold.
    pub retained_young: usize,
    /// Directories deleted (or, under dry-run, that would have been).
    pub deleted: usize,
    /// Deletions that failed, as (path, error) pairs. These never abort
    /// the sweep; the remaining candidates are still evaluated.
    pub failed: Vec<(String, String)>,
}

/// Failure that aborts a single sweep cycle.
///
/// The next scheduled sweep is the retry mechanism; nothing here stops the
/// schedule itself.
#[derive(Error, Debug)]
pub enum SweepError {
    /// The target directory could not be probed or listed.
    #[error("failed to scan {path}: {source}")]
    Scan { path: PathBuf, source: io::Error },
}

/// Scans, matches and reclaims expired subdirectories of one target
/// directory.
///
/// Holds no mutable state across sweeps beyond the immutable configuration
/// and the injected capabilities: a sweep is idempotent given identical
/// filesystem state and clock reading.
pub struct Sweeper {
    config: SweepConfig,
    pattern: Regex,
    clock: Arc<dyn Clock>,
    fs: Arc<dyn Filesystem>,
}

impl Sweeper {
    /// Build a sweeper from validated configuration and injected
    /// capabilities. The pattern is compiled once here.
    pub fn new(
        config: SweepConfig,
        clock: Arc<dyn Clock>,
        fs: Arc<dyn Filesystem>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let pattern = config.compile_pattern()?;

        tracing::info!(
            dir_to_clean = %config.dir_to_clean.display(),
            pattern = %config.pattern,
            clean_threshold = %humantime::format_duration(config.clean_threshold),
            clean_interval = %humantime::format_duration(config.clean_interval),
            dry_run = config.dry_run,
            "Sweeper configured"
        );

        Ok(Self {
            config,
            pattern,
            clock,
            fs,
        })
    }

    /// Interval between sweeps, for the scheduler.
    pub fn interval(&self) -> Duration {
        self.config.clean_interval
    }

    /// The directory whose children are swept.
    pub fn target(&self) -> &Path {
        &self.config.dir_to_clean
    }

    /// Run one scan-match-reclaim pass.
    ///
    /// A missing target directory is a no-op, not an error. A failed probe
    /// or listing aborts this pass only. Per-child deletion failures are
    /// recorded in the report and do not stop the remaining candidates.
    pub async fn sweep(&self) -> Result<SweepReport, SweepError> {
        let now = self.clock.now();
        let dir = &self.config.dir_to_clean;
        let mut report = SweepReport::default();

        tracing::info!(dir = %dir.display(), "Sweeping target directory");

        match self.fs.exists(dir).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(dir = %dir.display(), "Target directory absent, nothing to sweep");
                return Ok(report);
            }
            Err(source) => {
                return Err(SweepError::Scan {
                    path: dir.clone(),
                    source,
                });
            }
        }

        let children = self
            .fs
            .list_children(dir)
            .await
            .map_err(|source| SweepError::Scan {
                path: dir.clone(),
                source,
            })?;

        for child in children {
            report.evaluated += 1;

            if !child.is_dir {
                continue;
            }

            // Find-anywhere semantics: the pattern may land on any part of
            // the path string, not only on the whole of it.
            let path_str = child.path.to_string_lossy();
            if !self.pattern.is_match(&path_str) {
                continue;
            }
            report.matched += 1;

            // A modification time in the future counts as age zero.
            let age = now
                .signed_duration_since(child.modified)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age <= self.config.clean_threshold {
                report.retained_young += 1;
                tracing::debug!(
                    path = %child.path.display(),
                    age_secs = age.as_secs(),
                    "Matched directory too young to reclaim"
                );
                continue;
            }

            if self.config.dry_run {
                tracing::info!(
                    path = %child.path.display(),
                    age_secs = age.as_secs(),
                    "[DRY-RUN] Would delete expired directory"
                );
                report.deleted += 1;
                continue;
            }

            match self.fs.remove_dir_all(&child.path).await {
                Ok(()) => {
                    tracing::info!(
                        path = %child.path.display(),
                        age_secs = age.as_secs(),
                        "Deleted expired directory"
                    );
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::error!(
                        path = %child.path.display(),
                        error = %e,
                        "Failed to delete expired directory"
                    );
                    report.failed.push((child.path.display().to_string(), e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
