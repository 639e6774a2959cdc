// file: src/models/repository.rs
// description: tracked repository record and sync state machine states
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one repository's synchronization.
///
/// Transitions: `Pending|Success|Failed -> Syncing` on run start (guarded by
/// the single-flight registry), `Syncing -> Success|Failed` when the run
/// reaches a terminal outcome. A record stuck in `Syncing` means the process
/// died mid-run; the next run for that id overwrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    Syncing,
    Success,
    Failed,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Success | SyncState::Failed)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Pending => "pending",
            SyncState::Syncing => "syncing",
            SyncState::Success => "success",
            SyncState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// A monitored GitHub repository configuration and its sync state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedRepository {
    pub id: i64,
    pub owner: String,
    pub name: String,
    /// Resolved once at creation time; non-empty and immutable thereafter.
    pub branch: String,
    /// Root of the documentation subtree to mirror, relative to the repo.
    pub docs_path: String,
    /// Comma-separated extension allow-list, e.g. "md,mdx".
    pub extensions: String,
    pub last_sync_status: SyncState,
    pub last_sync_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub aggregated_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedRepository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Parameters for registering a new tracked repository.
#[derive(Debug, Clone)]
pub struct NewRepository {
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub docs_path: String,
    pub extensions: String,
}

/// Listing view of a tracked repository, omitting the potentially large
/// aggregated content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub docs_path: String,
    pub extensions: String,
    pub last_sync_status: SyncState,
    pub last_sync_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub content_bytes: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&TrackedRepository> for RepositorySummary {
    fn from(repo: &TrackedRepository) -> Self {
        Self {
            id: repo.id,
            owner: repo.owner.clone(),
            name: repo.name.clone(),
            branch: repo.branch.clone(),
            docs_path: repo.docs_path.clone(),
            extensions: repo.extensions.clone(),
            last_sync_status: repo.last_sync_status,
            last_sync_error: repo.last_sync_error.clone(),
            last_synced_at: repo.last_synced_at,
            content_bytes: repo
                .aggregated_content
                .as_ref()
                .map(|c| c.len())
                .unwrap_or(0),
            updated_at: repo.updated_at,
        }
    }
}
