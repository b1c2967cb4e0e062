//! Append-only JSON Lines result store
//!
//! One serialized [`AnalysisResult`] per line. Existing lines are indexed
//! on open so duplicate ids are rejected across restarts; unreadable lines
//! are skipped with a warning. A torn tail (no trailing newline, or a write
//! that failed partway) is closed off with a newline before the next append.

use super::{ResultStore, StoreError};
use crate::models::result::AnalysisResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct Inner {
    file: File,
    index: HashMap<String, AnalysisResult>,
    /// The file may end mid-line
    needs_newline: bool,
}

/// File-backed result store
pub struct JsonLinesResultStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for JsonLinesResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesResultStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonLinesResultStore {
    /// Open (or create) the store at `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let mut index = HashMap::new();
        let mut needs_newline = false;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                needs_newline = !contents.is_empty() && !contents.ends_with('\n');
                for (line_no, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<AnalysisResult>(line) {
                        Ok(result) => {
                            index.entry(result.transaction_id.clone()).or_insert(result);
                        }
                        Err(e) => {
                            warn!(path = %path.display(), line = line_no + 1, error = %e, "Skipping unreadable result line")
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new().create(true).append(true).open(&path).await?;
        debug!(path = %path.display(), existing = index.len(), "Opened result store");

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                index,
                needs_newline,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultStore for JsonLinesResultStore {
    async fn insert(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.index.contains_key(&result.transaction_id) {
            return Err(StoreError::DuplicateTransaction(result.transaction_id.clone()));
        }

        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        if inner.needs_newline {
            line.insert(0, '\n');
        }

        let written = match inner.file.write_all(line.as_bytes()).await {
            Ok(()) => inner.file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // part of the line may already be on disk
            inner.needs_newline = true;
            warn!(path = %self.path.display(), transaction_id = %result.transaction_id, error = %e, "Result append failed");
            return Err(e.into());
        }
        inner.needs_newline = false;

        inner.index.insert(result.transaction_id.clone(), result.clone());
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<AnalysisResult>, StoreError> {
        Ok(self.inner.lock().await.index.get(transaction_id).cloned())
    }
}
