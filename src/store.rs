//! Document persistence: whole-file JSON with atomic replace.
//!
//! Saves write to a temp file next to the target and rename over it, so a
//! concurrent reader sees either the old or the new document in full, never
//! a partial write. No locking or merging: last writer wins, and callers
//! needing stronger guarantees must serialize access themselves.

use std::fs;
use std::path::Path;

use crate::document::Document;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a document from `path`.
pub fn load_document(path: &Path) -> Result<Document, StoreError> {
    let contents = fs::read_to_string(path)?;
    let doc = serde_json::from_str(&contents)?;
    Ok(doc)
}

/// Save a document to `path`, creating parent directories as needed.
pub fn save_document(path: &Path, doc: &Document) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_json::to_string_pretty(doc)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, contents)?;
    fs::rename(tmp, path)?;
    tracing::debug!(path = %path.display(), "saved document");
    Ok(())
}
