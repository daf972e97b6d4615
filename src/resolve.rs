// src/resolve.rs
//! Resolves a raw import specifier to a project file, per language
//! family. Misses and filesystem errors resolve to `None` and never
//! propagate.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::lang::Language;
use crate::store::FileStore;

/// Extension probe order for JS-family specifiers written without one.
const JS_RESOLVE_EXTS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "css"];

/// Resolves `specifier` as imported from `source` (project-relative).
#[must_use]
pub fn resolve(source: &Path, specifier: &str, store: &dyn FileStore) -> Option<PathBuf> {
    match Language::from_path(source)? {
        Language::JsFamily => resolve_js(source, specifier, store),
        Language::Python => resolve_python(source, specifier, store),
        Language::Css => resolve_css(source, specifier, store),
    }
}

fn resolve_js(source: &Path, specifier: &str, store: &dyn FileStore) -> Option<PathBuf> {
    // Bare specifiers are package imports; not ours to resolve.
    let joined = if let Some(rooted) = specifier.strip_prefix('/') {
        normalize(Path::new(rooted))
    } else if specifier.starts_with('.') {
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        normalize(&dir.join(specifier))
    } else {
        return None;
    };
    let joined = joined?;

    probe_exact_then_exts(&joined, store)
        .or_else(|| probe_index(&joined, store))
}

fn probe_exact_then_exts(base: &Path, store: &dyn FileStore) -> Option<PathBuf> {
    if store.exists(base) && !store.is_directory(base) {
        return Some(base.to_path_buf());
    }
    for ext in JS_RESOLVE_EXTS {
        let candidate = append_extension(base, ext);
        if store.exists(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn probe_index(base: &Path, store: &dyn FileStore) -> Option<PathBuf> {
    for ext in JS_RESOLVE_EXTS {
        let candidate = base.join(format!("index.{ext}"));
        if store.exists(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn resolve_python(source: &Path, specifier: &str, store: &dyn FileStore) -> Option<PathBuf> {
    let dots = specifier.chars().take_while(|c| *c == '.').count();
    let rest = &specifier[dots..];

    let base = if dots > 0 {
        // D leading dots: ascend D-1 directories from the source's dir.
        let mut dir = source.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        for _ in 0..dots.saturating_sub(1) {
            dir = dir.parent()?.to_path_buf();
        }
        dir
    } else {
        PathBuf::new()
    };

    if rest.is_empty() {
        // Bare dots resolve only to the package init of the ascended dir.
        let init = base.join("__init__.py");
        return store.exists(&init).then_some(init);
    }

    let module_path: PathBuf = rest.split('.').collect();
    let candidate = base.join(module_path);

    let file_form = append_extension(&candidate, "py");
    if store.exists(&file_form) {
        return Some(file_form);
    }
    let init_form = candidate.join("__init__.py");
    if store.exists(&init_form) {
        return Some(init_form);
    }
    None
}

/// CSS `@import` targets are relative to the importing sheet; bare
/// names are files, not packages, so the external-specifier rule of the
/// JS family does not apply.
fn resolve_css(source: &Path, specifier: &str, store: &dyn FileStore) -> Option<PathBuf> {
    if specifier.contains("://") {
        return None;
    }
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let joined = normalize(&dir.join(specifier))?;
    probe_exact_then_exts(&joined, store)
}

/// Appends `.ext` to the final component without clobbering an
/// existing extension (`a.module` -> `a.module.py`).
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os: OsString = path.to_path_buf().into_os_string();
    os.push(format!(".{ext}"));
    PathBuf::from(os)
}

/// Collapses `.` and `..` components. A `..` that would escape the
/// project root yields `None`.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(p) => parts.push(p),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.iter().collect())
}
