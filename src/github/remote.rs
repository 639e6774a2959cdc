// file: src/github/remote.rs
// description: host-agnostic remote tree contract consumed by the sync engine
// reference: https://docs.rs/async-trait

use crate::error::Result;
use async_trait::async_trait;

/// A file discovered in a remote repository subtree.
///
/// The sha identifies the content revision; it is never used for diffing.
/// Entries live only for the duration of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub sha: String,
}

/// Read access to a remote repository's file tree.
///
/// Pure I/O boundary; no sync policy lives here. The engine talks to this
/// trait so tests can substitute an in-memory host.
#[async_trait]
pub trait RemoteTree: Send + Sync {
    /// Resolve the repository's default branch name.
    ///
    /// Fails with `NotFound` if the repository does not exist or is not
    /// accessible, `Host` for any other transport or API failure.
    async fn resolve_default_branch(&self, owner: &str, repo: &str) -> Result<String>;

    /// List all files under `root_path` on `branch`, recursively.
    ///
    /// A `NotFound` for a specific sub-path is skipped with a warning and
    /// traversal continues; any other error aborts the whole listing.
    /// Symlinks and submodules are ignored. A root path that names a file
    /// directly yields a single-entry result.
    async fn list_subtree(
        &self,
        owner: &str,
        repo: &str,
        root_path: &str,
        branch: &str,
    ) -> Result<Vec<FileEntry>>;

    /// Fetch one file's decoded text content.
    ///
    /// Fails with `NotFound` if the path no longer exists (upstream may have
    /// changed since listing), `NotAFile` if it resolves to a directory,
    /// `Decode` if the payload cannot be decoded to text. Each call is
    /// bounded by its own timeout.
    async fn fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String>;
}
