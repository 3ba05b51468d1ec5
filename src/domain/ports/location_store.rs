//! Location Store Port
//!
//! Defines the interface for persisting the latest pipeline outcome.

use crate::domain::entities::LocationRecord;
use async_trait::async_trait;

/// Store holding the single current [`LocationRecord`].
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// The current record, if one was ever written.
    async fn latest(&self) -> anyhow::Result<Option<LocationRecord>>;

    /// Replace the current record.
    async fn upsert(&self, record: &LocationRecord) -> anyhow::Result<()>;

    /// Seed an `Unknown` record when the store is empty.
    ///
    /// Returns whether a record was inserted.
    async fn insert_initial(&self) -> anyhow::Result<bool>;
}
