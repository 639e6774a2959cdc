// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod store;
pub mod sync;
pub mod utils;

pub use config::{Config, GithubConfig, StorageConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use github::{parse_repo_url, FileEntry, GithubClient, RemoteTree};
pub use models::{
    FleetStats, NewRepository, RepositorySummary, SyncOutcome, SyncState, TrackedRepository,
};
pub use store::{JsonStore, RepositoryStore};
pub use sync::{
    aggregate, clean_extension_list, content_digest, ExtensionFilter, FetchedFile, FleetDriver,
    SyncEngine, SyncRegistry,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _filter = ExtensionFilter::from_config("md");
    }
}
