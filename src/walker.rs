//! Directory walking and the default blacklist predicate (§4.A).
//!
//! The blacklist is NOT a real glob matcher: the default patterns are
//! either a literal basename (`.git`) or a `*.` extension shorthand that
//! mirrors Python's `os.path.splitext` — a leading-dot name with nothing
//! before the dot has no extension, so `.pyc` is not blocked by `*.pyc`
//! even though `foo.pyc` is (§8.7).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IsolateError, Result};

pub const DEFAULT_BLACKLIST: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "*.pyc",
    "*.swp",
    "testserver.log",
    "*.run_test_cases",
];

#[derive(Debug, Clone)]
pub struct Blacklist {
    patterns: Vec<String>,
}

impl Blacklist {
    #[must_use]
    pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn default_patterns() -> Self {
        Self::new(DEFAULT_BLACKLIST.iter().map(|s| (*s).to_string()))
    }

    /// Tests a path relative to the walk root. Patterns without `/` match
    /// the basename; patterns containing `/` match the whole relative path.
    #[must_use]
    pub fn is_blacklisted(&self, relative_path: &Path) -> bool {
        let basename = relative_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let full = relative_path.to_str().unwrap_or("");
        self.patterns.iter().any(|pattern| {
            if pattern.contains('/') {
                pattern_matches(full, pattern)
            } else {
                pattern_matches(basename, pattern)
            }
        })
    }
}

fn pattern_matches(candidate: &str, pattern: &str) -> bool {
    pattern.strip_prefix("*.").map_or_else(
        || candidate == pattern,
        |ext| splitext(candidate).is_some_and(|found| found == ext),
    )
}

/// `os.path.splitext`-style extension extraction: a name whose content
/// before the last `.` is empty (a dotfile like `.pyc`) has no extension.
fn splitext(name: &str) -> Option<&str> {
    let last_dot = name.rfind('.')?;
    let stem = &name[..last_dot];
    if stem.is_empty() {
        None
    } else {
        Some(&name[last_dot + 1..])
    }
}

/// One walked filesystem entry, relative to the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    File(PathBuf),
    Symlink { path: PathBuf, target: String },
}

impl WalkEntry {
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::File(p) | Self::Symlink { path: p, .. } => p,
        }
    }
}

/// Depth-first walk of `root`, blacklist-filtered, returning entries sorted
/// by relative path for deterministic manifest output (§5). Symlinks are
/// recorded with their target rather than followed; directories are walked
/// into (to discover their children) but never recorded as entries
/// themselves, matching the "don't follow but still enumerate" contract a
/// symlinked directory needs (§C).
///
/// # Errors
/// Returns an error if the walk hits a filesystem failure or a symlink's
/// target cannot be read.
pub fn walk(root: &Path, blacklist: &Blacklist) -> Result<Vec<WalkEntry>> {
    let mut out = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or_else(|_| entry.path());
            !blacklist.is_blacklisted(rel)
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let io_err = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("directory walk failed"));
            IsolateError::io_with_path(io_err, path)
        })?;
        if entry.depth() == 0 {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path())
            .to_path_buf();
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())
                .map_err(|e| IsolateError::io_with_path(e, entry.path().to_path_buf()))?;
            out.push(WalkEntry::Symlink {
                path: rel,
                target: target.to_string_lossy().into_owned(),
            });
        } else if file_type.is_file() {
            out.push(WalkEntry::File(rel));
        }
    }

    out.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(out)
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
