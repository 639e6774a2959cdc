// file: src/store/repository.rs
// description: narrow store contract the sync engine writes through
// reference: https://docs.rs/async-trait

use crate::error::Result;
use crate::models::TrackedRepository;
use async_trait::async_trait;

/// The persistence operations the sync engine needs, and nothing more.
///
/// Each call is one atomic store operation; the engine sequences them but
/// never composes them into a transaction. Backends other than the JSON
/// file store (an SQL database, say) implement the same five operations.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Load the full configuration for one tracked repository.
    async fn load_config(&self, id: i64) -> Result<TrackedRepository>;

    /// Record that a run has started. Fails with `NotFound` if the record
    /// was deleted concurrently.
    async fn mark_syncing(&self, id: i64) -> Result<()>;

    /// Record a terminal failure with its operator-visible message.
    async fn mark_failed(&self, id: i64, message: &str) -> Result<()>;

    /// Record a terminal success: store the aggregated document, clear any
    /// previous error, stamp the success time.
    async fn mark_success(&self, id: i64, document: &str) -> Result<()>;

    /// All tracked repository ids, in ascending order.
    async fn list_tracked_ids(&self) -> Result<Vec<i64>>;
}
