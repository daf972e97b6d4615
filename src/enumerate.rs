// src/enumerate.rs
//! Deterministic, ignore-pruned enumeration of project source files.
//! Shared by the graph builder (full pass) and the scorer (candidate
//! universe), so both always see the same listing for a given tree.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::CODE_EXT_PATTERN;
use crate::ignore_rules::IgnoreStore;
use crate::store::FileStore;

static CODE_EXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(CODE_EXT_PATTERN).unwrap());

/// Lists every non-ignored, code-like file under the store's root, in
/// a stable order (sorted directory listings, pre-order).
///
/// Unreadable directories are skipped, not fatal.
#[must_use]
pub fn project_files(store: &dyn FileStore, ignores: &IgnoreStore) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect(store, ignores, Path::new(""), &mut files);
    files
}

fn collect(store: &dyn FileStore, ignores: &IgnoreStore, dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(names) = store.list(dir) else {
        return;
    };

    for name in names {
        if name.starts_with('.') {
            continue;
        }
        let path = dir.join(&name);
        if store.is_directory(&path) {
            if !ignores.is_ignored(&path, true) {
                collect(store, ignores, &path, out);
            }
        } else if is_code_like(&name) && !ignores.is_ignored(&path, false) {
            out.push(path);
        }
    }
}

fn is_code_like(name: &str) -> bool {
    CODE_EXT_RE.is_match(name)
}
