// file: src/sync/aggregate.rs
// description: deterministic aggregation of fetched files into one document
// reference: fixed framing format shared with downstream consumers

use sha2::{Digest, Sha256};

/// A (path, content) pair ready for aggregation. Callers supply these in
/// the order the aggregate should carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
}

/// Concatenate fetched files into the aggregated document format.
///
/// Per file: a `---` line, a `File: <path>` line, another `---` line, a
/// blank line, the raw content, then two blank lines. The format is a
/// compatibility contract; downstream readers split on these frames. An
/// empty input yields an empty string, not an empty framed block.
pub fn aggregate(files: &[FetchedFile]) -> String {
    let mut document = String::new();

    for file in files {
        document.push_str("---\n");
        document.push_str(&format!("File: {}\n", file.path));
        document.push_str("---\n\n");
        document.push_str(&file.content);
        document.push_str("\n\n\n");
    }

    document
}

/// SHA-256 hex digest of an aggregated document, for identification.
pub fn content_digest(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    format!("{:x}", hasher.finalize())
}
