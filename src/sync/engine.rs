// file: src/sync/engine.rs
// description: per-repository sync pipeline with single-flight guarding
// reference: orchestrates remote listing, filtering, fetching, persistence

use crate::error::{Result, SyncError};
use crate::github::{FileEntry, RemoteTree};
use crate::models::SyncOutcome;
use crate::store::RepositoryStore;
use crate::sync::aggregate::{aggregate, content_digest, FetchedFile};
use crate::sync::filter::ExtensionFilter;
use crate::sync::registry::SyncRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives the sync pipeline for single repositories.
///
/// One run: mark syncing, load configuration, list the remote subtree,
/// filter by extension, sort, fetch sequentially, aggregate, persist.
/// The single-flight registry rejects a second concurrent run for the same
/// id before any store state is touched.
pub struct SyncEngine {
    store: Arc<dyn RepositoryStore>,
    remote: Arc<dyn RemoteTree>,
    registry: SyncRegistry,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RepositoryStore>, remote: Arc<dyn RemoteTree>) -> Self {
        Self {
            store,
            remote,
            registry: SyncRegistry::new(),
        }
    }

    /// Whether a run for `id` is currently in flight in this process.
    pub fn is_syncing(&self, id: i64) -> bool {
        self.registry.is_active(id)
    }

    /// Run one full sync for a repository.
    ///
    /// Rejects immediately with `SyncInProgress` when a run for the same id
    /// is already in flight; no store state is mutated in that case.
    pub async fn run_one(&self, id: i64) -> Result<SyncOutcome> {
        let _permit = self
            .registry
            .try_acquire(id)
            .ok_or(SyncError::SyncInProgress(id))?;

        info!("Starting sync for repository {}", id);
        let result = self.execute(id).await;

        match &result {
            Ok(outcome) => info!(
                "Sync finished for repository {}: {} files aggregated, {} bytes in {:.2}s",
                id,
                outcome.files_aggregated,
                outcome.document_bytes,
                outcome.duration.as_secs_f64()
            ),
            Err(err) => warn!("Sync for repository {} ended in failure: {}", id, err),
        }

        result
    }

    async fn execute(&self, id: i64) -> Result<SyncOutcome> {
        let started = Instant::now();

        // Best effort: losing this write to anything but a concurrent delete
        // is tolerable, the terminal write at the end is the one that counts.
        if let Err(err) = self.store.mark_syncing(id).await {
            if err.is_not_found() {
                return Err(err);
            }
            warn!("Could not mark repository {} as syncing: {}", id, err);
        }

        let repo = match self.store.load_config(id).await {
            Ok(repo) => repo,
            Err(err) => {
                let message = format!("Failed to load repository configuration: {}", err);
                return self.fail(id, message, err).await;
            }
        };

        debug!(
            "Listing {} path '{}' (branch: {})",
            repo.full_name(),
            repo.docs_path,
            repo.branch
        );
        let entries = match self
            .remote
            .list_subtree(&repo.owner, &repo.name, &repo.docs_path, &repo.branch)
            .await
        {
            Ok(entries) => entries,
            Err(err) => {
                let message = format!(
                    "Failed to list repository contents (branch: {}): {}",
                    repo.branch, err
                );
                return self.fail(id, message, err).await;
            }
        };
        let files_discovered = entries.len();

        let filter = ExtensionFilter::from_config(&repo.extensions);
        let mut eligible: Vec<FileEntry> = entries
            .into_iter()
            .filter(|entry| filter.matches(&entry.path))
            .collect();

        // Sorted path order is the reproducibility contract for the
        // aggregate, whatever order the listing came back in.
        eligible.sort_unstable_by(|a, b| a.path.cmp(&b.path));

        debug!(
            "{} of {} discovered files match the extension filter",
            eligible.len(),
            files_discovered
        );

        if eligible.is_empty() {
            // Nothing matching the allow-list is still a successful run.
            info!("No eligible files for repository {}, storing empty document", id);
            self.persist(id, String::new()).await?;
            return Ok(SyncOutcome {
                repository_id: id,
                files_discovered,
                files_aggregated: 0,
                document_bytes: 0,
                content_hash: content_digest(""),
                duration: started.elapsed(),
            });
        }

        let mut fetched = Vec::with_capacity(eligible.len());
        for entry in &eligible {
            debug!("Fetching {} from {}", entry.path, repo.full_name());
            match self
                .remote
                .fetch_file_content(&repo.owner, &repo.name, &entry.path, &repo.branch)
                .await
            {
                Ok(content) => fetched.push(FetchedFile {
                    path: entry.path.clone(),
                    content,
                }),
                Err(err) => {
                    // First failure aborts the run: readers get a complete
                    // snapshot or the previous one, never a partial mix.
                    let message = format!(
                        "Failed to fetch content of '{}' (branch: {}): {}",
                        entry.path, repo.branch, err
                    );
                    return self.fail(id, message, err).await;
                }
            }
        }

        let document = aggregate(&fetched);
        let outcome = SyncOutcome {
            repository_id: id,
            files_discovered,
            files_aggregated: fetched.len(),
            document_bytes: document.len(),
            content_hash: content_digest(&document),
            duration: started.elapsed(),
        };

        self.persist(id, document).await?;
        Ok(outcome)
    }

    /// Record the terminal success state. A failure here means the aggregate
    /// was built but never recorded, which callers must be able to tell
    /// apart from a fetch failure.
    async fn persist(&self, id: i64, document: String) -> Result<()> {
        self.store.mark_success(id, &document).await.map_err(|err| {
            SyncError::Persistence(format!(
                "Aggregated document for repository {} was built but not recorded: {}",
                id, err
            ))
        })
    }

    /// Record the terminal failed state and propagate the originating error.
    async fn fail(&self, id: i64, message: String, err: SyncError) -> Result<SyncOutcome> {
        if let Err(store_err) = self.store.mark_failed(id, &message).await {
            warn!(
                "Could not record failure for repository {}: {}",
                id, store_err
            );
        }
        Err(err)
    }
}
