//! The `.isolated` artifact: a content-addressed file manifest, and the
//! splitter that partitions one into a master plus child manifests along
//! the `DEPTH`/`PRODUCT_DIR` path-variable axis (§3, §4.I, §6).
//!
//! Field order in [`Manifest`] and [`FileEntry`] is alphabetical by design:
//! `serde_json` serializes struct fields in declaration order, and the
//! `.isolated` schema requires sorted keys (§6), so declaration order *is*
//! the sort order. Don't reorder these fields without checking §6 again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The `.isolated` schema's minor/major version. An incompatible `MAJOR`
/// triggers regeneration rather than incremental reuse (§4.H, §6).
pub const ISOLATED_FILE_VERSION: &str = "1.4";

/// One entry in a manifest's `files` map (§3, §6).
///
/// `h`/`s` (hash + size) and `l` (symlink target) are mutually exclusive.
/// `m` (POSIX mode) is omitted entirely on `win` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
}

impl FileEntry {
    #[must_use]
    pub const fn hashed(hash: String, size: u64, mode: Option<u32>) -> Self {
        Self {
            h: Some(hash),
            l: None,
            m: mode,
            s: Some(size),
        }
    }

    #[must_use]
    pub const fn symlink(target: String) -> Self {
        Self {
            h: None,
            l: Some(target),
            m: None,
            s: None,
        }
    }

    /// A file entry whose hash is the literal string `"invalid"` is always
    /// re-hashed regardless of mtime/size/mode agreement (§4.G incremental
    /// rule).
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.h.as_deref() == Some("invalid")
    }
}

/// The compact, sorted-key `.isolated` artifact (§3, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub algo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    pub files: BTreeMap<String, FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    pub relative_cwd: String,
    pub version: String,
}

/// A split child's `.isolated` file (§4.I, §8 S5): a bare subset of
/// `files` with no `command`/`relative_cwd`/`includes` of its own — those
/// stay on the master that references it by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildManifest {
    pub algo: String,
    pub files: BTreeMap<String, FileEntry>,
    pub os: String,
    pub version: String,
}

impl Manifest {
    /// Serializes to the compact, sorted-key form the `.isolated` file is
    /// written in (§6). `serde_json::to_string` already emits no
    /// insignificant whitespace; key order comes from field declaration
    /// order, which mirrors the alphabetically-sorted schema.
    ///
    /// # Errors
    /// Returns an error if serialization fails (should not happen for a
    /// well-formed `Manifest`).
    pub fn to_compact_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
