// file: src/sync/mod.rs
// description: synchronization engine module exports
// reference: internal module structure

pub mod aggregate;
pub mod engine;
pub mod filter;
pub mod fleet;
pub mod progress;
pub mod registry;

pub use aggregate::{aggregate, content_digest, FetchedFile};
pub use engine::SyncEngine;
pub use filter::{clean_extension_list, ExtensionFilter};
pub use fleet::FleetDriver;
pub use progress::FleetProgress;
pub use registry::{SyncPermit, SyncRegistry};
