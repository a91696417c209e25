//! Durable per-subscription resume cursors
//!
//! The stream client reads its cursor once when it starts and writes it
//! back after every accepted event. Only the latest value matters.
//!
//! ```text
//!   start ──► read(key) ──► None ──► now()
//!                      └──► Some(c) ─► resume at c
//!   event ──► write(key, event.timestamp) ──► forward
//! ```

pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ContinuationError;

pub use file::FileContinuationStore;
pub use memory::MemoryContinuationStore;

/// Storage for continuation cursors, one per subscription key
#[async_trait]
pub trait ContinuationStore: Send + Sync {
    /// Read the stored cursor, `None` if nothing was ever written
    async fn read(&self, key: &str) -> Result<Option<i64>, ContinuationError>;

    /// Replace the stored cursor
    async fn write(&self, key: &str, cursor: i64) -> Result<(), ContinuationError>;
}

/// Cursor used when a subscription has no stored value: only new events
pub fn initial_cursor() -> i64 {
    Utc::now().timestamp_millis()
}
