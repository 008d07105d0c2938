//! Schema cache: parse once per path, invalidate on content change.
//!
//! The cache key is the path; the stored entry remembers the keccak of
//! the file contents, so an edited schema is re-parsed on the next load
//! while repeated loads of an unchanged file share one immutable
//! [`Schema`]. Loaded schemas are `Send + Sync`, so callers may fan out
//! at the message boundary without further locking.

use anyhow::{Context, Result};
use fixsbe_merkle::keccak256;
use fixsbe_sbe::Schema;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

struct CacheEntry {
    content_hash: [u8; 32],
    schema: Arc<Schema>,
}

/// Path-keyed schema cache.
#[derive(Default)]
pub struct SchemaCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl SchemaCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a schema, reusing the parsed form when the file is
    /// unchanged.
    pub fn load(&self, path: &Path) -> Result<Arc<Schema>> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let content_hash = keccak256(text.as_bytes());

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(entry) = entries.get(path) {
            if entry.content_hash == content_hash {
                debug!(path = %path.display(), "schema cache hit");
                return Ok(Arc::clone(&entry.schema));
            }
        }

        let schema = Arc::new(
            Schema::from_xml(&text).with_context(|| format!("parsing {}", path.display()))?,
        );
        entries.insert(
            path.to_owned(),
            CacheEntry {
                content_hash,
                schema: Arc::clone(&schema),
            },
        );
        Ok(schema)
    }
}
