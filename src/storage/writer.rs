//! ReportWriter trait: where rendered reports end up.
//!
//! - `FileReportWriter`: local filesystem, atomic temp-file + rename
//! - `InMemoryReportWriter`: map of path to content, for tests and dry runs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

/// Sink for rendered report text.
///
/// Writing to an existing path replaces its content.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn write_text(&self, path: &Path, content: &str) -> Result<(), WriteError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Filesystem writer.
///
/// Creates the parent directory on demand, writes to a sibling `<path>.tmp` file and
/// renames it into place so a crash never leaves a half-written report.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileReportWriter;

impl FileReportWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportWriter for FileReportWriter {
    async fn write_text(&self, path: &Path, content: &str) -> Result<(), WriteError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = tmp_path_for(path);
        let written = match tokio::fs::write(&tmp_path, content).await {
            Ok(()) => tokio::fs::rename(&tmp_path, path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = content.len(), "[Writer] Report written");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

/// `<path>.tmp`, next to the final file.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// In-memory writer. Not durable.
#[derive(Debug, Default)]
pub struct InMemoryReportWriter {
    files: RwLock<BTreeMap<PathBuf, String>>,
    writes: AtomicUsize,
}

impl InMemoryReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content stored at `path`, if any.
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `write_text` calls that succeeded, overwrites included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportWriter for InMemoryReportWriter {
    async fn write_text(&self, path: &Path, content: &str) -> Result<(), WriteError> {
        let mut files = self
            .files
            .write()
            .map_err(|e| WriteError::Storage(e.to_string()))?;
        files.insert(path.to_path_buf(), content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
