// file: src/sync/filter.rs
// description: extension allow-list filtering for discovered paths
// reference: pure path suffix matching

use std::collections::HashSet;

/// Allow-list of file extensions, built from the comma-separated
/// configuration string of a tracked repository.
///
/// Entries are trimmed, lowercased, and normalized to a leading dot so
/// "md" matches the path suffix ".md". An empty allow-set matches nothing.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    allowed: HashSet<String>,
}

impl ExtensionFilter {
    pub fn from_config(raw: &str) -> Self {
        let allowed = raw
            .split(',')
            .filter_map(|entry| {
                let trimmed = entry.trim().to_lowercase();
                if trimmed.is_empty() {
                    None
                } else if trimmed.starts_with('.') {
                    Some(trimmed)
                } else {
                    Some(format!(".{}", trimmed))
                }
            })
            .collect();

        Self { allowed }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.allowed.is_empty() {
            return false;
        }
        let lower = path.to_lowercase();
        self.allowed.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Normalize a user-supplied extension list for storage: entries trimmed,
/// lowercased, empties dropped. Returns `None` when nothing usable remains.
pub fn clean_extension_list(raw: &str) -> Option<String> {
    let cleaned: Vec<String> = raw
        .split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(","))
    }
}
