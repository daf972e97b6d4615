// src/graph/cache.rs
//! Snapshot persistence. One structured artifact under the reserved
//! metadata directory; a schema version plus a payload digest make
//! malformation detectable without throwing. A malformed artifact is
//! deleted and analysis proceeds as if it never existed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::META_DIR;
use crate::error::Result;
use crate::graph::GraphSnapshot;

const CACHE_FILE: &str = "graph.json";
const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheArtifact {
    version: u32,
    digest: String,
    snapshot: serde_json::Value,
}

#[must_use]
pub fn cache_path(root: &Path) -> PathBuf {
    root.join(META_DIR).join(CACHE_FILE)
}

/// Persists the snapshot, creating the metadata directory if needed.
///
/// # Errors
/// Returns an error if serialization or the write fails; callers log
/// and keep going (persistence is best-effort).
pub fn save(root: &Path, snapshot: &GraphSnapshot) -> Result<()> {
    // Digest over the canonical (key-sorted) value form, which is also
    // what load() re-serializes; struct field order never leaks in.
    let value = serde_json::to_value(snapshot)?;
    let payload = serde_json::to_string(&value)?;
    let artifact = CacheArtifact {
        version: CACHE_VERSION,
        digest: digest_of(&payload),
        snapshot: value,
    };

    let path = cache_path(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| crate::error::HoundError::io(e, parent))?;
    }
    let serialized = serde_json::to_string(&artifact)?;
    fs::write(&path, serialized).map_err(|e| crate::error::HoundError::io(e, &path))?;
    Ok(())
}

/// Loads a previously persisted snapshot. Returns `None` when absent;
/// a present-but-malformed artifact (unparseable, wrong version, or
/// digest mismatch) is deleted, logged, and treated as absent.
#[must_use]
pub fn load(root: &Path) -> Option<GraphSnapshot> {
    let path = cache_path(root);
    let raw = fs::read_to_string(&path).ok()?;

    match parse(&raw) {
        Some(snapshot) => Some(snapshot),
        None => {
            log::warn!("malformed graph cache at {}; discarding", path.display());
            let _ = fs::remove_file(&path);
            None
        }
    }
}

fn parse(raw: &str) -> Option<GraphSnapshot> {
    let artifact: CacheArtifact = serde_json::from_str(raw).ok()?;
    if artifact.version != CACHE_VERSION {
        return None;
    }
    let payload = serde_json::to_string(&artifact.snapshot).ok()?;
    if digest_of(&payload) != artifact.digest {
        return None;
    }
    serde_json::from_value(artifact.snapshot).ok()
}

fn digest_of(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}
