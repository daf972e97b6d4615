// src/lang.rs
//! Language detection and raw import extraction.
//!
//! Scanning is regex over comment-stripped text. Not string-literal
//! aware: an import-shaped string inside a literal still matches.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Closed set of language families the scanner understands.
/// Each variant owns its regex table and its resolution strategy
/// (see `resolve`), so a match on `Language` is always exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JsFamily,
    Python,
    Css,
}

impl Language {
    /// Maps a file extension to its language family.
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" => Some(Self::JsFamily),
            "py" => Some(Self::Python),
            "css" | "scss" | "less" => Some(Self::Css),
            _ => None,
        }
    }

    /// Maps a file path to its language family via its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::from_ext(ext)
    }
}

// JS family: `from "..."` covers static imports and re-exports across
// line breaks; side-effect imports, require() and dynamic import() get
// their own patterns.
static JS_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bfrom\s+["']([^"']+)["']"#).unwrap());
static JS_SIDE_EFFECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*import\s+["']([^"']+)["']"#).unwrap());
static JS_REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\brequire\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap());
static JS_DYNAMIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimport\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap());

static PY_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+(.+)$").unwrap());
static PY_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*from\s+([.\w]+)\s+import\b").unwrap());

static CSS_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"'()\s;]+)"#).unwrap());

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)//[^\n]*").unwrap());
static HASH_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)#[^\n]*").unwrap());

/// Extracts raw import specifiers from file content.
///
/// Unknown extensions return empty. Duplicate statements yield one
/// specifier; scan order is preserved.
#[must_use]
pub fn scan(path: &Path, content: &str) -> Vec<String> {
    let Some(lang) = Language::from_path(path) else {
        return Vec::new();
    };

    let stripped = strip_comments(lang, content);
    let mut seen = HashSet::new();
    let mut specifiers = Vec::new();
    let mut push = |s: String| {
        if !s.is_empty() && seen.insert(s.clone()) {
            specifiers.push(s);
        }
    };

    match lang {
        Language::JsFamily => {
            for re in [&*JS_FROM_RE, &*JS_SIDE_EFFECT_RE, &*JS_REQUIRE_RE, &*JS_DYNAMIC_RE] {
                for cap in re.captures_iter(&stripped) {
                    push(cap[1].to_string());
                }
            }
        }
        Language::Python => {
            for cap in PY_IMPORT_RE.captures_iter(&stripped) {
                for segment in cap[1].split(',') {
                    push(python_module_name(segment));
                }
            }
            for cap in PY_FROM_RE.captures_iter(&stripped) {
                push(cap[1].to_string());
            }
        }
        Language::Css => {
            for cap in CSS_IMPORT_RE.captures_iter(&stripped) {
                push(cap[1].to_string());
            }
        }
    }

    specifiers
}

fn strip_comments(lang: Language, content: &str) -> String {
    match lang {
        Language::JsFamily => {
            let no_blocks = BLOCK_COMMENT_RE.replace_all(content, "");
            LINE_COMMENT_RE.replace_all(&no_blocks, "").into_owned()
        }
        Language::Python => HASH_COMMENT_RE.replace_all(content, "").into_owned(),
        Language::Css => BLOCK_COMMENT_RE.replace_all(content, "").into_owned(),
    }
}

/// `"os.path as p"` -> `"os.path"`; trims aliases and whitespace.
fn python_module_name(segment: &str) -> String {
    segment
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}
