// src/ignore_rules.rs
//! Nested ignore-spec discovery and matching.
//!
//! Two precedence classes per directory: the primary `.houndignore`
//! spec and the fallback `.gitignore` spec. A directory's primary spec,
//! if present, supersedes its fallback spec for rule purposes. Rule
//! evaluation is deepest-first; the first definitive match (ignore or
//! whitelist) wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use crate::config::{FALLBACK_IGNORE_FILE, META_DIR, PRIMARY_IGNORE_FILE};

/// Compiled specs of one directory. Either matcher may be absent;
/// absence of both still records the directory visit order.
struct DirSpecs {
    /// Project-relative directory ("" for the root).
    dir: PathBuf,
    primary: Option<Gitignore>,
    fallback: Option<Gitignore>,
}

pub struct IgnoreStore {
    root: PathBuf,
    /// Deepest-first; replaced wholesale on each rescan.
    specs: Vec<DirSpecs>,
    respect_fallback: bool,
}

impl IgnoreStore {
    /// Discovers every ignore spec under `root`.
    ///
    /// The walk is pre-order: at each directory both spec files are
    /// read (absence is normal), a local pruning ruleset (primary if
    /// present, else fallback) decides which subdirectories to enter,
    /// and the reserved metadata directory at the root is skipped.
    /// Unreadable directories are skipped, not fatal.
    #[must_use]
    pub fn discover(root: &Path, respect_fallback: bool) -> Self {
        let mut store = Self {
            root: root.to_path_buf(),
            specs: Vec::new(),
            respect_fallback,
        };
        store.rescan();
        store
    }

    /// Drops all compiled rules and re-runs discovery.
    pub fn rescan(&mut self) {
        let mut specs = Vec::new();
        let root = self.root.clone();
        self.walk(&root, Path::new(""), 0, &mut specs);
        // Deepest-first so nested rules are consulted before outer ones.
        specs.sort_by(|a, b| {
            b.dir
                .components()
                .count()
                .cmp(&a.dir.components().count())
                .then_with(|| a.dir.cmp(&b.dir))
        });
        self.specs = specs;
    }

    fn walk(&self, abs_dir: &Path, rel_dir: &Path, depth: usize, out: &mut Vec<DirSpecs>) {
        let primary = compile_spec(abs_dir, PRIMARY_IGNORE_FILE);
        let fallback = compile_spec(abs_dir, FALLBACK_IGNORE_FILE);

        let pruning = match (&primary, &fallback) {
            (Some(p), _) => Some(p),
            (None, Some(f)) if self.respect_fallback => Some(f),
            _ => None,
        };

        // One level at a time; recursion applies each directory's own
        // pruning ruleset before going deeper. Unreadable entries are
        // dropped, not fatal.
        let mut subdirs: Vec<PathBuf> = WalkDir::new(abs_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_dir())
            .map(walkdir::DirEntry::into_path)
            .collect();
        subdirs.sort();

        for sub in subdirs {
            let Some(name) = sub.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if depth == 0 && name == META_DIR {
                continue;
            }
            if let Some(matcher) = pruning {
                if matcher.matched(&sub, true).is_ignore() {
                    continue;
                }
            }
            self.walk(&sub, &rel_dir.join(name), depth + 1, out);
        }

        out.push(DirSpecs {
            dir: rel_dir.to_path_buf(),
            primary,
            fallback,
        });
    }

    /// Whether `path` (project-relative) is ignored.
    #[must_use]
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let abs = self.root.join(path);
        for specs in &self.specs {
            if !path.starts_with(&specs.dir) {
                continue;
            }
            let matcher = match (&specs.primary, &specs.fallback) {
                (Some(p), _) => p,
                (None, Some(f)) if self.respect_fallback => f,
                _ => continue,
            };
            // Parent matches count: a file inside an ignored directory
            // is ignored.
            match matcher.matched_path_or_any_parents(&abs, is_dir) {
                m if m.is_ignore() => return true,
                m if m.is_whitelist() => return false,
                _ => {}
            }
        }
        false
    }

    /// Appends a normalized pattern for `path` to the root primary
    /// spec, creating the file if absent. Returns false for duplicates
    /// or write failures; on success the full rule set is rediscovered.
    ///
    /// `match_all_by_name` writes the bare file name (matches anywhere
    /// in the tree); otherwise the pattern is root-anchored to this
    /// specific path.
    pub fn add_pattern(&mut self, path: &Path, match_all_by_name: bool) -> bool {
        let Some(line) = pattern_for(path, match_all_by_name) else {
            return false;
        };

        let spec_path = self.root.join(PRIMARY_IGNORE_FILE);
        let existing = fs::read_to_string(&spec_path).unwrap_or_default();
        if existing.lines().any(|l| l.trim() == line) {
            return false;
        }

        let appended = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&spec_path)
            .and_then(|mut f| {
                if !existing.is_empty() && !existing.ends_with('\n') {
                    writeln!(f)?;
                }
                writeln!(f, "{line}")
            });
        if let Err(e) = appended {
            log::warn!("failed to update {PRIMARY_IGNORE_FILE}: {e}");
            return false;
        }

        self.rescan();
        true
    }
}

fn compile_spec(dir: &Path, file_name: &str) -> Option<Gitignore> {
    let spec_path = dir.join(file_name);
    if !spec_path.is_file() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(dir);
    // Malformed lines are tolerated by the matcher itself.
    let _ = builder.add(&spec_path);
    builder.build().ok()
}

fn pattern_for(path: &Path, match_all_by_name: bool) -> Option<String> {
    if match_all_by_name {
        return path.file_name().map(|n| n.to_string_lossy().into_owned());
    }
    let normalized = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if normalized.is_empty() {
        return None;
    }
    Some(format!("/{normalized}"))
}
