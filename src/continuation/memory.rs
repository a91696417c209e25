//! In-process continuation store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::ContinuationStore;
use crate::error::ContinuationError;

/// Continuation store that lives only as long as the process
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryContinuationStore {
    cursors: RwLock<HashMap<String, i64>>,
}

impl MemoryContinuationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value without going through the async trait
    pub fn get(&self, key: &str) -> Option<i64> {
        self.cursors.read().get(key).copied()
    }

    /// Seed a cursor
    pub fn insert(&self, key: impl Into<String>, cursor: i64) {
        self.cursors.write().insert(key.into(), cursor);
    }
}

#[async_trait]
impl ContinuationStore for MemoryContinuationStore {
    async fn read(&self, key: &str) -> Result<Option<i64>, ContinuationError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, cursor: i64) -> Result<(), ContinuationError> {
        self.insert(key, cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_write() {
        let store = MemoryContinuationStore::new();

        assert_eq!(store.read("all").await.unwrap(), None);

        store.write("all", 10).await.unwrap();
        store.write("all", 20).await.unwrap();
        store.write("other", 5).await.unwrap();

        assert_eq!(store.read("all").await.unwrap(), Some(20));
        assert_eq!(store.read("other").await.unwrap(), Some(5));
    }
}
