//! Filesystem capability used by the sweeper.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One immediate child of the target directory, as observed at listing
/// time. Produced per sweep and dropped when the sweep ends.
#[derive(Debug, Clone)]
pub struct ChildEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub modified: DateTime<Utc>,
}

/// Narrow filesystem contract the sweeper runs against.
///
/// Production uses [`LocalFs`]; tests substitute scripted implementations.
/// Nothing is cached between calls, so every sweep observes fresh state.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Whether `path` currently exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// The immediate children of `path`, one level only.
    async fn list_children(&self, path: &Path) -> io::Result<Vec<ChildEntry>>;

    /// Recursively delete `path` and everything under it.
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Local-disk implementation over `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

#[async_trait]
impl Filesystem for LocalFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn list_children(&self, path: &Path) -> io::Result<Vec<ChildEntry>> {
        let mut children = Vec::new();
        let mut dir = tokio::fs::read_dir(path).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            children.push(ChildEntry {
                path: entry.path(),
                is_dir: metadata.is_dir(),
                modified: DateTime::<Utc>::from(metadata.modified()?),
            });
        }

        Ok(children)
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }
}
