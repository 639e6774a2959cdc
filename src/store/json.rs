// file: src/store/json.rs
// description: JSON-file-backed repository store
// reference: serde_json persistence with full-file writes

use crate::error::{Result, SyncError};
use crate::models::{NewRepository, RepositorySummary, SyncState, TrackedRepository};
use crate::store::repository::RepositoryStore;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    next_id: i64,
    repositories: BTreeMap<i64, TrackedRepository>,
}

/// Repository store backed by one JSON document on disk.
///
/// Every mutation rewrites the whole file under the state mutex, so each
/// store operation is atomic with respect to the others in this process.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonStore {
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SyncError::Persistence(format!("Failed to create store directory: {}", e))
            })?;
        }

        let state = if fs::try_exists(&path).await.unwrap_or(false) {
            let contents = fs::read_to_string(&path).await.map_err(|e| {
                SyncError::Persistence(format!("Failed to read store file {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&contents)
                .map_err(|e| SyncError::Serialization(format!("Malformed store file {}: {}", path.display(), e)))?
        } else {
            debug!("No store file at {}, starting empty", path.display());
            StoreState::default()
        };

        info!(
            "Repository store opened with {} tracked repositories",
            state.repositories.len()
        );

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    async fn save(&self, state: &StoreState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| SyncError::Serialization(format!("Failed to serialize store: {}", e)))?;

        fs::write(&self.path, contents).await.map_err(|e| {
            SyncError::Persistence(format!("Failed to write store file {}: {}", self.path.display(), e))
        })
    }

    /// Apply one mutation to a record and persist the result.
    async fn update_record<F>(&self, id: i64, apply: F) -> Result<()>
    where
        F: FnOnce(&mut TrackedRepository),
    {
        let mut state = self.state.lock().await;

        let repo = state
            .repositories
            .get_mut(&id)
            .ok_or_else(|| SyncError::NotFound(format!("repository {} not found", id)))?;

        apply(&mut *repo);
        repo.updated_at = Utc::now();

        self.save(&state).await
    }

    /// Register a new tracked repository with a `Pending` status.
    pub async fn create(&self, new: NewRepository) -> Result<TrackedRepository> {
        let mut state = self.state.lock().await;

        let duplicate = state.repositories.values().any(|r| {
            r.owner == new.owner && r.name == new.name && r.docs_path == new.docs_path
        });
        if duplicate {
            return Err(SyncError::Conflict(format!(
                "repository {}/{} with docs path '{}' is already tracked",
                new.owner, new.name, new.docs_path
            )));
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();

        let repo = TrackedRepository {
            id,
            owner: new.owner,
            name: new.name,
            branch: new.branch,
            docs_path: new.docs_path,
            extensions: new.extensions,
            last_sync_status: SyncState::Pending,
            last_sync_error: None,
            last_synced_at: None,
            aggregated_content: None,
            created_at: now,
            updated_at: now,
        };

        state.repositories.insert(id, repo.clone());
        self.save(&state).await?;

        info!("Tracking repository {}/{} as id {}", repo.owner, repo.name, id);
        Ok(repo)
    }

    pub async fn get(&self, id: i64) -> Result<TrackedRepository> {
        let state = self.state.lock().await;
        state
            .repositories
            .get(&id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("repository {} not found", id)))
    }

    /// All tracked repositories in id order, without aggregated content.
    pub async fn list(&self) -> Result<Vec<RepositorySummary>> {
        let state = self.state.lock().await;
        Ok(state.repositories.values().map(RepositorySummary::from).collect())
    }

    pub async fn remove(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.repositories.remove(&id).is_none() {
            return Err(SyncError::NotFound(format!("repository {} not found", id)));
        }

        self.save(&state).await?;
        info!("Removed repository {}", id);
        Ok(())
    }
}

#[async_trait]
impl RepositoryStore for JsonStore {
    async fn load_config(&self, id: i64) -> Result<TrackedRepository> {
        self.get(id).await
    }

    async fn mark_syncing(&self, id: i64) -> Result<()> {
        self.update_record(id, |repo| {
            repo.last_sync_status = SyncState::Syncing;
        })
        .await
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<()> {
        self.update_record(id, |repo| {
            repo.last_sync_status = SyncState::Failed;
            repo.last_sync_error = Some(message.to_string());
        })
        .await
    }

    async fn mark_success(&self, id: i64, document: &str) -> Result<()> {
        self.update_record(id, |repo| {
            repo.last_sync_status = SyncState::Success;
            repo.last_sync_error = None;
            repo.last_synced_at = Some(Utc::now());
            repo.aggregated_content = Some(document.to_string());
        })
        .await
    }

    async fn list_tracked_ids(&self) -> Result<Vec<i64>> {
        let state = self.state.lock().await;
        Ok(state.repositories.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_new(owner: &str, docs_path: &str) -> NewRepository {
        NewRepository {
            owner: owner.to_string(),
            name: "book".to_string(),
            branch: "main".to_string(),
            docs_path: docs_path.to_string(),
            extensions: "md".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repositories.json");

        {
            let store = JsonStore::open(path.clone()).await.unwrap();
            let repo = store.create(sample_new("rust-lang", "src")).await.unwrap();
            assert_eq!(repo.id, 1);
            assert_eq!(repo.last_sync_status, SyncState::Pending);
        }

        let store = JsonStore::open(path).await.unwrap();
        let repo = store.get(1).await.unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(store.list_tracked_ids().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("s.json")).await.unwrap();

        store.create(sample_new("rust-lang", "src")).await.unwrap();
        let err = store.create(sample_new("rust-lang", "src")).await.unwrap_err();
        assert!(matches!(err, SyncError::Conflict(_)));

        // Same repository under a different docs path is a distinct record.
        store.create(sample_new("rust-lang", "guide")).await.unwrap();
        assert_eq!(store.list_tracked_ids().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("s.json")).await.unwrap();
        let id = store.create(sample_new("a", "docs")).await.unwrap().id;

        store.mark_syncing(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().last_sync_status, SyncState::Syncing);

        store.mark_failed(id, "listing failed").await.unwrap();
        let repo = store.get(id).await.unwrap();
        assert_eq!(repo.last_sync_status, SyncState::Failed);
        assert_eq!(repo.last_sync_error.as_deref(), Some("listing failed"));
        assert!(repo.last_synced_at.is_none());

        store.mark_success(id, "---\nFile: a.md\n---\n\nhi\n\n\n").await.unwrap();
        let repo = store.get(id).await.unwrap();
        assert_eq!(repo.last_sync_status, SyncState::Success);
        assert!(repo.last_sync_error.is_none());
        assert!(repo.last_synced_at.is_some());
        assert!(repo.aggregated_content.unwrap().starts_with("---\n"));
    }

    #[tokio::test]
    async fn test_mark_syncing_missing_record() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("s.json")).await.unwrap();

        let err = store.mark_syncing(99).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("s.json")).await.unwrap();
        let id = store.create(sample_new("a", "docs")).await.unwrap().id;

        store.remove(id).await.unwrap();
        assert!(store.get(id).await.unwrap_err().is_not_found());
        assert!(store.remove(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_ids_do_not_recycle_after_remove() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("s.json")).await.unwrap();

        let first = store.create(sample_new("a", "docs")).await.unwrap().id;
        store.remove(first).await.unwrap();
        let second = store.create(sample_new("b", "docs")).await.unwrap().id;
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_list_summaries() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("s.json")).await.unwrap();
        let id = store.create(sample_new("a", "docs")).await.unwrap().id;
        store.mark_success(id, "content").await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].content_bytes, "content".len());
    }
}
