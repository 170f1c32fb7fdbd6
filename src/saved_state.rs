//! The `.isolated.state` sidecar: everything a [`crate::manifest::Manifest`]
//! carries, plus the variable bindings and per-file mtimes needed to make a
//! repeat invocation with identical inputs a no-op (§3, §4.H, §6).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::manifest::{FileEntry, ISOLATED_FILE_VERSION, Manifest};
use crate::state::atomic_write;

/// A `.isolated.state` file entry: a [`FileEntry`] plus the mtime (`t`)
/// recorded at hash time, used for staleness detection (§3, §4.G, §4.H).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFileEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<u64>,
}

impl SavedFileEntry {
    #[must_use]
    pub const fn hashed(hash: String, size: u64, mode: Option<u32>, mtime: u64) -> Self {
        Self {
            h: Some(hash),
            l: None,
            m: mode,
            s: Some(size),
            t: Some(mtime),
        }
    }

    #[must_use]
    pub const fn symlink(target: String) -> Self {
        Self {
            h: None,
            l: Some(target),
            m: None,
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub fn to_file_entry(&self) -> FileEntry {
        FileEntry {
            h: self.h.clone(),
            l: self.l.clone(),
            m: self.m,
            s: self.s,
        }
    }

    /// Whether a prior hash can be trusted without re-reading the file,
    /// given freshly-stat'd metadata (§4.G incremental rule). A file whose
    /// recorded hash is the `"invalid"` sentinel is always re-hashed.
    #[must_use]
    pub fn is_fresh(&self, size: u64, mode: Option<u32>, mtime: u64) -> bool {
        self.h.as_deref().is_some_and(|h| h != "invalid")
            && self.s == Some(size)
            && self.m == mode
            && self.t == Some(mtime)
    }
}

/// The `.isolated.state` sidecar (§3, §6). Field order is alphabetical for
/// the same reason as [`crate::manifest::Manifest`]'s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    pub algo: String,
    pub child_isolated_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    pub config_variables: BTreeMap<String, String>,
    pub extra_variables: BTreeMap<String, String>,
    pub files: BTreeMap<String, SavedFileEntry>,
    pub isolate_file: String,
    pub path_variables: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    pub relative_cwd: String,
    pub version: String,
}

impl SavedState {
    /// Projects this sidecar onto the `.isolated` manifest it would emit
    /// (§3's "SavedState owns the authoritative manifest" lifecycle note).
    #[must_use]
    pub fn to_manifest(&self, os: &str, includes: Option<Vec<String>>) -> Manifest {
        Manifest {
            algo: self.algo.clone(),
            command: self.command.clone(),
            files: self
                .files
                .iter()
                .map(|(path, entry)| (path.clone(), entry.to_file_entry()))
                .collect(),
            includes,
            os: os.to_string(),
            read_only: self.read_only,
            relative_cwd: self.relative_cwd.clone(),
            version: self.version.clone(),
        }
    }

    /// Serializes to the pretty-printed form `.isolated.state` is written
    /// in (§6).
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes this sidecar next to its manifest, atomically (§4.H, §5).
    ///
    /// # Errors
    /// Returns an error if serialization or the atomic write fails.
    pub fn save(&self, state_path: &Path) -> Result<()> {
        let json = self.to_pretty_json()?;
        atomic_write(state_path, json.as_bytes())
    }
}

/// The `.isolated.state` path that sits next to a given `.isolated` path
/// (§4.H).
#[must_use]
pub fn isolated_to_state_path(isolated_path: &Path) -> std::path::PathBuf {
    let mut name = isolated_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".state");
    isolated_path.with_file_name(name)
}

/// Loads a prior sidecar, if one exists and its major version still
/// matches. Any other failure — missing file, malformed JSON, mismatched
/// major version — is treated as "no prior state" rather than an error,
/// since a stale or absent sidecar is recovered from locally (§4.H, §7).
#[must_use]
pub fn load_prior_state(state_path: &Path) -> Option<SavedState> {
    let text = std::fs::read_to_string(state_path).ok()?;
    let state: SavedState = serde_json::from_str(&text).ok()?;
    if major_version(&state.version) == major_version(ISOLATED_FILE_VERSION) {
        Some(state)
    } else {
        None
    }
}

fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// Looks up a file's prior saved entry by its manifest-relative path, for
/// staleness comparison during incremental re-hashing (§4.G).
#[must_use]
pub fn prior_entry_for<'a>(prior: Option<&'a SavedState>, rel_path: &str) -> Option<&'a SavedFileEntry> {
    prior?.files.get(rel_path)
}

#[cfg(test)]
#[path = "saved_state_tests.rs"]
mod tests;
