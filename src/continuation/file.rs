//! File-backed continuation store
//!
//! One file per subscription key under a directory; the file holds the
//! cursor as a decimal integer so it can be inspected and edited by hand.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use super::ContinuationStore;
use crate::error::ContinuationError;

/// Continuation store persisting each cursor in `<dir>/<key>`
#[derive(Debug, Clone)]
pub struct FileContinuationStore {
    dir: PathBuf,
}

impl FileContinuationStore {
    /// Open the store, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        tracing::debug!(dir = %dir.display(), "Continuation store opened");

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl ContinuationStore for FileContinuationStore {
    async fn read(&self, key: &str) -> Result<Option<i64>, ContinuationError> {
        let raw = match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ContinuationError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        };

        raw.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ContinuationError::Corrupt {
                key: key.to_string(),
                value: raw,
            })
    }

    async fn write(&self, key: &str, cursor: i64) -> Result<(), ContinuationError> {
        let io_err = |source| ContinuationError::Io {
            key: key.to_string(),
            source,
        };

        // Write-then-rename so a crash never leaves a half-written cursor
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));

        tokio::fs::write(&tmp, cursor.to_string())
            .await
            .map_err(io_err)?;
        tokio::fs::rename(&tmp, &target).await.map_err(io_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContinuationStore::open(dir.path()).await.unwrap();

        assert_eq!(store.read("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileContinuationStore::open(dir.path()).await.unwrap();
            store.write("all", 1_700_000_000_000).await.unwrap();
            store.write("all", 1_700_000_000_500).await.unwrap();
        }

        let store = FileContinuationStore::open(dir.path()).await.unwrap();
        assert_eq!(store.read("all").await.unwrap(), Some(1_700_000_000_500));

        // Human-readable on disk
        let raw = std::fs::read_to_string(dir.path().join("all")).unwrap();
        assert_eq!(raw, "1700000000500");
    }

    #[tokio::test]
    async fn test_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("continuation");

        let store = FileContinuationStore::open(&nested).await.unwrap();
        store.write("k", 1).await.unwrap();

        assert!(nested.join("k").exists());
    }

    #[tokio::test]
    async fn test_hand_edited_value_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("all"), "12345\n").unwrap();

        let store = FileContinuationStore::open(dir.path()).await.unwrap();
        assert_eq!(store.read("all").await.unwrap(), Some(12345));
    }

    #[tokio::test]
    async fn test_corrupt_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("all"), "yesterday").unwrap();

        let store = FileContinuationStore::open(dir.path()).await.unwrap();
        let result = store.read("all").await;

        assert!(matches!(
            result,
            Err(ContinuationError::Corrupt { ref value, .. }) if value == "yesterday"
        ));
    }
}
