//! Fixed-interval scheduling of sweeps.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::sweep::Sweeper;

/// Drives a [`Sweeper`] on a dedicated background task.
///
/// The first sweep fires one full interval after [`SweepScheduler::start`],
/// then every interval thereafter. Sweeps are strictly serialized: when a
/// sweep overruns the interval, the next tick is delayed until the running
/// sweep returns, so two sweeps never race on the same directory. Sweep
/// failures are logged and never stop the schedule; the next tick is the
/// retry mechanism.
pub struct SweepScheduler {
    handle: JoinHandle<()>,
}

impl SweepScheduler {
    /// Spawn the background sweep loop.
    pub fn start(sweeper: Arc<Sweeper>) -> Self {
        let interval = sweeper.interval();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match sweeper.sweep().await {
                    Ok(report) => {
                        tracing::info!(
                            dir = %sweeper.target().display(),
                            evaluated = report.evaluated,
                            matched = report.matched,
                            deleted = report.deleted,
                            retained_young = report.retained_young,
                            failed = report.failed.len(),
                            "Sweep cycle completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            dir = %sweeper.target().display(),
                            error = %e,
                            "Sweep cycle failed, retrying on next tick"
                        );
                    }
                }
            }
        });

        Self { handle }
    }

    /// Stop the schedule. A sweep in flight is aborted with it.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::SweepConfig;
    use crate::fs::{ChildEntry, Filesystem, LocalFs};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(dir: &Path) -> SweepConfig {
        SweepConfig {
            enabled: true,
            dir_to_clean: dir.to_path_buf(),
            pattern: r"jobcache_\d+".to_string(),
            clean_threshold: Duration::from_millis(1),
            clean_interval: Duration::from_millis(50),
            dry_run: false,
        }
    }

    fn expired_dir(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_scheduler_runs_sweeps_periodically() {
        let root = TempDir::new().unwrap();
        let target = expired_dir(root.path(), "jobcache_001");

        let sweeper = Arc::new(
            Sweeper::new(
                config(root.path()),
                Arc::new(SystemClock),
                Arc::new(LocalFs),
            )
            .unwrap(),
        );

        // Let the candidate age past the 1ms threshold before starting.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let scheduler = SweepScheduler::start(sweeper);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!target.exists());

        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_first_sweep_waits_one_full_interval() {
        let root = TempDir::new().unwrap();
        let target = expired_dir(root.path(), "jobcache_001");

        let config = SweepConfig {
            clean_interval: Duration::from_millis(300),
            ..config(root.path())
        };
        let sweeper =
            Arc::new(Sweeper::new(config, Arc::new(SystemClock), Arc::new(LocalFs)).unwrap());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let scheduler = SweepScheduler::start(sweeper);

        // No immediate sweep at start time.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(target.exists());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!target.exists());

        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_future_sweeps() {
        let root = TempDir::new().unwrap();

        let sweeper = Arc::new(
            Sweeper::new(
                config(root.path()),
                Arc::new(SystemClock),
                Arc::new(LocalFs),
            )
            .unwrap(),
        );

        let scheduler = SweepScheduler::start(sweeper);
        scheduler.shutdown();

        // Created after shutdown; no sweep may ever reclaim it.
        let target = expired_dir(root.path(), "jobcache_001");
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(target.exists());
    }

    /// Fails the first listing, then behaves like the real filesystem.
    struct FlakyFs {
        inner: LocalFs,
        failed_once: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Filesystem for FlakyFs {
        async fn exists(&self, path: &Path) -> io::Result<bool> {
            self.inner.exists(path).await
        }

        async fn list_children(&self, path: &Path) -> io::Result<Vec<ChildEntry>> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "transient listing failure",
                ));
            }
            self.inner.list_children(path).await
        }

        async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            self.inner.remove_dir_all(path).await
        }
    }

    #[tokio::test]
    async fn test_failed_sweep_does_not_stop_the_schedule() {
        let root = TempDir::new().unwrap();
        let target = expired_dir(root.path(), "jobcache_001");

        let fs = Arc::new(FlakyFs {
            inner: LocalFs,
            failed_once: AtomicBool::new(false),
        });
        let sweeper =
            Arc::new(Sweeper::new(config(root.path()), Arc::new(SystemClock), fs).unwrap());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let scheduler = SweepScheduler::start(sweeper);

        // First tick fails on listing; a later tick must still reclaim.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!target.exists());

        scheduler.shutdown();
    }
}
