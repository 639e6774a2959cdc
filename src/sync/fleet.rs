// file: src/sync/fleet.rs
// description: fleet-wide sync fan-out with a bounded worker pool
// reference: semaphore-capped concurrent dispatch over all tracked repositories

use crate::error::SyncError;
use crate::models::FleetStats;
use crate::store::RepositoryStore;
use crate::sync::engine::SyncEngine;
use crate::sync::progress::FleetProgress;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

enum RunDisposition {
    Succeeded,
    Failed,
    Skipped,
}

/// Drives one sync run per tracked repository under a fixed concurrency cap.
///
/// Repositories fail independently: one failure (including "already
/// syncing") never affects any other repository's run. The batch is
/// synchronous from the caller's point of view; `run_all` returns only
/// after every dispatched run has reached a terminal outcome.
pub struct FleetDriver {
    engine: Arc<SyncEngine>,
    store: Arc<dyn RepositoryStore>,
    parallel_workers: usize,
}

impl FleetDriver {
    pub fn new(
        engine: Arc<SyncEngine>,
        store: Arc<dyn RepositoryStore>,
        parallel_workers: usize,
    ) -> Self {
        Self {
            engine,
            store,
            parallel_workers: parallel_workers.max(1),
        }
    }

    pub async fn run_all(&self) -> FleetStats {
        let started = Instant::now();

        let ids = match self.store.list_tracked_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                error!("Failed to load tracked repositories for fleet sync: {}", err);
                return FleetStats::new();
            }
        };

        if ids.is_empty() {
            info!("No repositories tracked, nothing to sync");
            return FleetStats::new();
        }

        let dispatched = ids.len();
        info!(
            "Dispatching sync for {} repositories with {} workers",
            dispatched, self.parallel_workers
        );

        let progress = Arc::new(FleetProgress::new(dispatched as u64));
        let semaphore = Arc::new(Semaphore::new(self.parallel_workers));

        let tasks = ids.into_iter().map(|id| {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);

            async move {
                // An id that is already mid-run is skipped before taking a
                // worker slot; "already handled, try later".
                if engine.is_syncing(id) {
                    debug!("Repository {} already syncing, skipping", id);
                    progress.record_skip();
                    return RunDisposition::Skipped;
                }

                let Ok(_permit) = semaphore.acquire_owned().await else {
                    // The semaphore is never closed while the driver runs.
                    return RunDisposition::Skipped;
                };

                match engine.run_one(id).await {
                    Ok(_) => {
                        progress.record_success();
                        RunDisposition::Succeeded
                    }
                    Err(SyncError::SyncInProgress(_)) => {
                        progress.record_skip();
                        RunDisposition::Skipped
                    }
                    Err(err) => {
                        warn!("Fleet sync for repository {} failed: {}", id, err);
                        progress.record_failure();
                        RunDisposition::Failed
                    }
                }
            }
        });

        let dispositions: Vec<RunDisposition> = stream::iter(tasks)
            .buffer_unordered(dispatched)
            .collect()
            .await;

        progress.finish();

        let mut stats = FleetStats {
            dispatched,
            duration_secs: started.elapsed().as_secs(),
            ..FleetStats::new()
        };
        for disposition in dispositions {
            match disposition {
                RunDisposition::Succeeded => stats.succeeded += 1,
                RunDisposition::Failed => stats.failed += 1,
                RunDisposition::Skipped => stats.skipped_in_progress += 1,
            }
        }

        info!(
            "Fleet sync finished: {} succeeded, {} failed, {} skipped in {}s",
            stats.succeeded, stats.failed, stats.skipped_in_progress, stats.duration_secs
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::github::{FileEntry, RemoteTree};
    use crate::models::{SyncState, TrackedRepository};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn tracked(id: i64, owner: &str) -> TrackedRepository {
        let now = Utc::now();
        TrackedRepository {
            id,
            owner: owner.to_string(),
            name: "docs".to_string(),
            branch: "main".to_string(),
            docs_path: "docs".to_string(),
            extensions: "md".to_string(),
            last_sync_status: SyncState::Pending,
            last_sync_error: None,
            last_synced_at: None,
            aggregated_content: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[derive(Default)]
    struct FakeStore {
        repos: StdMutex<HashMap<i64, TrackedRepository>>,
    }

    impl FakeStore {
        fn with_repos(repos: Vec<TrackedRepository>) -> Self {
            let store = Self::default();
            {
                let mut map = store.repos.lock().unwrap();
                for repo in repos {
                    map.insert(repo.id, repo);
                }
            }
            store
        }

        fn status(&self, id: i64) -> SyncState {
            self.repos.lock().unwrap().get(&id).unwrap().last_sync_status
        }
    }

    #[async_trait]
    impl RepositoryStore for FakeStore {
        async fn load_config(&self, id: i64) -> Result<TrackedRepository> {
            self.repos
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| SyncError::NotFound(format!("repository {} not found", id)))
        }

        async fn mark_syncing(&self, id: i64) -> Result<()> {
            let mut repos = self.repos.lock().unwrap();
            let repo = repos
                .get_mut(&id)
                .ok_or_else(|| SyncError::NotFound(format!("repository {} not found", id)))?;
            repo.last_sync_status = SyncState::Syncing;
            Ok(())
        }

        async fn mark_failed(&self, id: i64, message: &str) -> Result<()> {
            let mut repos = self.repos.lock().unwrap();
            let repo = repos
                .get_mut(&id)
                .ok_or_else(|| SyncError::NotFound(format!("repository {} not found", id)))?;
            repo.last_sync_status = SyncState::Failed;
            repo.last_sync_error = Some(message.to_string());
            Ok(())
        }

        async fn mark_success(&self, id: i64, document: &str) -> Result<()> {
            let mut repos = self.repos.lock().unwrap();
            let repo = repos
                .get_mut(&id)
                .ok_or_else(|| SyncError::NotFound(format!("repository {} not found", id)))?;
            repo.last_sync_status = SyncState::Success;
            repo.last_sync_error = None;
            repo.aggregated_content = Some(document.to_string());
            Ok(())
        }

        async fn list_tracked_ids(&self) -> Result<Vec<i64>> {
            let mut ids: Vec<i64> = self.repos.lock().unwrap().keys().copied().collect();
            ids.sort_unstable();
            Ok(ids)
        }
    }

    /// Counts how many listings run at once; optionally fails some owners
    /// and blocks others on a one-shot barrier pair.
    #[derive(Default)]
    struct FakeRemote {
        current: AtomicUsize,
        max_concurrent: AtomicUsize,
        fail_owner: Option<String>,
        gates: StdMutex<Option<(Arc<Barrier>, Arc<Barrier>)>>,
        gated_owner: Option<String>,
    }

    #[async_trait]
    impl RemoteTree for FakeRemote {
        async fn resolve_default_branch(&self, _owner: &str, _repo: &str) -> Result<String> {
            Ok("main".to_string())
        }

        async fn list_subtree(
            &self,
            owner: &str,
            _repo: &str,
            _root_path: &str,
            _branch: &str,
        ) -> Result<Vec<FileEntry>> {
            if self.gated_owner.as_deref() == Some(owner) {
                let gates = self.gates.lock().unwrap().take();
                if let Some((started, release)) = gates {
                    started.wait().await;
                    release.wait().await;
                }
            }

            let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            if self.fail_owner.as_deref() == Some(owner) {
                return Err(SyncError::Host("listing exploded".to_string()));
            }

            Ok(vec![FileEntry {
                path: "docs/readme.md".to_string(),
                sha: "abc".to_string(),
            }])
        }

        async fn fetch_file_content(
            &self,
            _owner: &str,
            _repo: &str,
            _path: &str,
            _branch: &str,
        ) -> Result<String> {
            Ok("content".to_string())
        }
    }

    #[tokio::test]
    async fn test_twelve_repositories_capped_at_five_workers() {
        let repos: Vec<TrackedRepository> = (1..=12).map(|id| tracked(id, "octo")).collect();
        let store = Arc::new(FakeStore::with_repos(repos));
        let remote = Arc::new(FakeRemote::default());
        let store_handle: Arc<dyn RepositoryStore> = store.clone();
        let remote_handle: Arc<dyn RemoteTree> = remote.clone();
        let engine = Arc::new(SyncEngine::new(store_handle, remote_handle));
        let driver = FleetDriver::new(engine, store.clone(), 5);

        let stats = driver.run_all().await;

        assert_eq!(stats.dispatched, 12);
        assert_eq!(stats.completed(), 12);
        assert_eq!(stats.succeeded, 12);
        assert!(remote.max_concurrent.load(Ordering::SeqCst) <= 5);
        for id in 1..=12 {
            assert_eq!(store.status(id), SyncState::Success);
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_others() {
        let repos = vec![tracked(1, "good"), tracked(2, "bad"), tracked(3, "good")];
        let store = Arc::new(FakeStore::with_repos(repos));
        let remote = Arc::new(FakeRemote {
            fail_owner: Some("bad".to_string()),
            ..FakeRemote::default()
        });
        let store_handle: Arc<dyn RepositoryStore> = store.clone();
        let engine = Arc::new(SyncEngine::new(store_handle, remote));
        let driver = FleetDriver::new(engine, store.clone(), 2);

        let stats = driver.run_all().await;

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(store.status(1), SyncState::Success);
        assert_eq!(store.status(2), SyncState::Failed);
        assert_eq!(store.status(3), SyncState::Success);
    }

    #[tokio::test]
    async fn test_repository_already_syncing_is_skipped() {
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let repos = vec![tracked(1, "blocked"), tracked(2, "octo")];
        let store = Arc::new(FakeStore::with_repos(repos));
        let remote = Arc::new(FakeRemote {
            gates: StdMutex::new(Some((Arc::clone(&started), Arc::clone(&release)))),
            gated_owner: Some("blocked".to_string()),
            ..FakeRemote::default()
        });
        let store_handle: Arc<dyn RepositoryStore> = store.clone();
        let engine = Arc::new(SyncEngine::new(store_handle, remote));
        let driver = FleetDriver::new(Arc::clone(&engine), store.clone(), 2);

        // Occupy repository 1 with a run blocked inside the remote listing.
        let blocked = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.run_one(1).await }
        });
        started.wait().await;

        let stats = driver.run_all().await;
        assert_eq!(stats.skipped_in_progress, 1);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(store.status(2), SyncState::Success);

        release.wait().await;
        blocked.await.unwrap().unwrap();
        assert_eq!(store.status(1), SyncState::Success);
    }

    #[tokio::test]
    async fn test_empty_fleet() {
        let store = Arc::new(FakeStore::default());
        let remote = Arc::new(FakeRemote::default());
        let store_handle: Arc<dyn RepositoryStore> = store.clone();
        let engine = Arc::new(SyncEngine::new(store_handle, remote));
        let driver = FleetDriver::new(engine, store, 5);

        let stats = driver.run_all().await;
        assert_eq!(stats.dispatched, 0);
        assert_eq!(stats.completed(), 0);
    }
}
