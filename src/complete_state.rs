//! Component G: the complete-state assembler. Turns an isolate file plus a
//! concrete binding into `root_dir`, `relative_cwd`, a hashed `files` map,
//! and `command` (§4.G); Component I's manifest splitter lives here too,
//! since it consumes the same resolved `files` map before it's written out
//! (§4.I).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::condition::{Binding, Literal};
use crate::configs::{self, Configs, Variables};
use crate::error::{IsolateError, Result};
use crate::hashing::{self, Algorithm};
use crate::includes;
use crate::manifest::{ChildManifest, FileEntry, ISOLATED_FILE_VERSION, Manifest};
use crate::saved_state::{SavedFileEntry, SavedState, prior_entry_for};
use crate::state::current_unix_timestamp;
use crate::substitution;
use crate::walker::{self, Blacklist};

/// Everything a caller supplies to assemble one compile (§4.G, §6).
#[derive(Debug, Clone)]
pub struct CompleteStateInputs {
    pub isolate_path: PathBuf,
    pub path_variables: BTreeMap<String, String>,
    pub config_variables: BTreeMap<String, String>,
    pub extra_variables: BTreeMap<String, String>,
    pub algorithm: Algorithm,
    /// The manifest's `os` tag (§6) — distinct from the `OS` config axis,
    /// though callers typically pass the same value for both.
    pub os: String,
    pub split: bool,
    /// Absolute path the `.isolated` file will be written to. Used only to
    /// compute `isolate_file`'s relative path in the saved state (§3); the
    /// actual write happens in [`CompleteState::write`].
    pub isolated_path: PathBuf,
    /// `--ignore-broken-items` (§6): treat a missing `files_tracked`/
    /// `files_untracked` entry the same as a missing `files_touched` one —
    /// skip it instead of failing the compile.
    pub ignore_broken_items: bool,
}

/// The output of one compile: the master manifest/state plus any split
/// children, not yet written to disk.
#[derive(Debug, Clone)]
pub struct CompleteState {
    pub root_dir: PathBuf,
    pub manifest: Manifest,
    pub saved_state: SavedState,
    /// Split children in `DEPTH` then `PRODUCT_DIR` order (§4.I), not yet
    /// assigned a filename or folded into the master's `includes`.
    pub children: Vec<ChildManifest>,
}

impl CompleteState {
    /// Writes the master `.isolated`, any split children, and the
    /// `.isolated.state` sidecar, all atomically (§4.H, §4.I, §5). Returns
    /// every path written, master first. Child filenames follow
    /// `<master-stem>.<i>.isolated` (§4.I, §8 S5); their content hash is
    /// folded into the master's `includes` list before it's written.
    ///
    /// # Errors
    /// Returns an error if any file can't be serialized or written.
    pub fn save_files(&mut self, isolated_path: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if self.children.is_empty() {
            self.manifest.includes = None;
            self.saved_state.child_isolated_files = Vec::new();
        } else {
            let stem = isolated_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("out");
            let mut includes = Vec::with_capacity(self.children.len());
            let mut child_names = Vec::with_capacity(self.children.len());
            for (i, child) in self.children.iter().enumerate() {
                let filename = format!("{stem}.{i}.isolated");
                let child_path = isolated_path.with_file_name(&filename);
                let json = serde_json::to_string(child)?;
                crate::state::atomic_write(&child_path, json.as_bytes())?;
                let hash = hashing::hash_file(&child_path, self.algorithm())?;
                includes.push(hash);
                child_names.push(filename.clone());
                written.push(child_path);
            }
            self.manifest.includes = Some(includes);
            self.saved_state.child_isolated_files = child_names;
        }

        let manifest_json = self.manifest.to_compact_json()?;
        crate::state::atomic_write(isolated_path, manifest_json.as_bytes())?;
        written.insert(0, isolated_path.to_path_buf());

        let state_path = crate::saved_state::isolated_to_state_path(isolated_path);
        self.saved_state.save(&state_path)?;
        written.push(state_path);

        Ok(written)
    }

    fn algorithm(&self) -> Algorithm {
        if self.manifest.algo == Algorithm::Sha256.tag() {
            Algorithm::Sha256
        } else {
            Algorithm::Sha1
        }
    }
}

/// One resolved file awaiting hashing, tagged by whether it's allowed to be
/// silently skipped if missing (touched entries, per original_source's
/// "opens but may not read" semantics).
struct PendingEntry {
    /// Path relative to `root_dir`, forward-slash separated (§5, §8.6).
    rel_path: String,
    absolute: PathBuf,
    optional: bool,
}

/// Loads and resolves everything needed to compile `inputs` into a
/// [`CompleteState`] (§4.G). `prior` is the previously saved sidecar, if
/// any, used to decide which files can skip re-hashing.
///
/// # Errors
/// Returns a `ConfigError` for any well-formedness violation in §4.G/§7,
/// or an `IOError` if the filesystem can't be read.
pub fn load_complete_state(
    inputs: &CompleteStateInputs,
    prior: Option<&SavedState>,
) -> Result<CompleteState> {
    let isolate_dir = inputs
        .isolate_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let canonical_isolate_dir = dunce::canonicalize(&isolate_dir)
        .map_err(|e| IsolateError::io_with_path(e, isolate_dir.clone()))?;

    let configs = includes::load_with_includes(&inputs.isolate_path)?;
    let binding = resolve_binding(&configs, &inputs.config_variables)?;
    let variables = select_variables(&configs, &binding);

    let mut extra_variables = inputs.extra_variables.clone();
    extra_variables
        .entry("EXECUTABLE_SUFFIX".to_string())
        .or_insert_with(|| if inputs.os == "win" { ".exe".to_string() } else { String::new() });

    let path_var_dirs = validate_path_variables(&canonical_isolate_dir, &inputs.path_variables)?;
    let root_dir = common_ancestor(
        std::iter::once(canonical_isolate_dir.clone()).chain(path_var_dirs.values().cloned()),
    );
    let relative_cwd = reroot(&root_dir, &canonical_isolate_dir)?;

    let command = substitute_list(
        variables.command.as_deref().unwrap_or_default(),
        &inputs.path_variables,
        &extra_variables,
        &inputs.config_variables,
    )?;

    let pending = collect_pending_entries(
        &variables,
        &canonical_isolate_dir,
        &root_dir,
        &inputs.path_variables,
        &extra_variables,
        &inputs.config_variables,
        inputs.ignore_broken_items,
    )?;

    let (all_files, saved_files) = hash_entries(&pending, inputs.algorithm, &inputs.os, prior)?;

    let product_dir_prefix = path_var_dirs
        .get("PRODUCT_DIR")
        .map(|dir| reroot(&root_dir, dir))
        .transpose()?;
    let can_split = inputs.split
        && inputs.path_variables.contains_key("DEPTH")
        && inputs.path_variables.contains_key("PRODUCT_DIR");
    let (master_files, children) = if can_split {
        let (master_files, tagged) =
            split_children(&all_files, product_dir_prefix.as_deref(), inputs.algorithm.tag(), &inputs.os);
        (master_files, tagged.into_iter().map(|(_, child)| child).collect())
    } else {
        (all_files, Vec::new())
    };

    let manifest = Manifest {
        algo: inputs.algorithm.tag().to_string(),
        command: (!command.is_empty()).then_some(command.clone()),
        files: master_files,
        includes: None,
        os: inputs.os.clone(),
        read_only: variables.read_only,
        relative_cwd: relative_cwd.clone(),
        version: ISOLATED_FILE_VERSION.to_string(),
    };

    let isolated_dir = inputs
        .isolated_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let isolate_file_rel = relative_between(&isolated_dir, &inputs.isolate_path);

    let saved_state = SavedState {
        algo: inputs.algorithm.tag().to_string(),
        child_isolated_files: Vec::new(),
        command: (!command.is_empty()).then_some(command),
        config_variables: inputs.config_variables.clone(),
        extra_variables,
        files: saved_files,
        isolate_file: isolate_file_rel,
        path_variables: inputs.path_variables.clone(),
        read_only: variables.read_only,
        relative_cwd,
        version: ISOLATED_FILE_VERSION.to_string(),
    };

    Ok(CompleteState {
        root_dir,
        manifest,
        saved_state,
        children,
    })
}

/// Relative path from `from_dir` to `to`, forward-slash joined, using `..`
/// segments when `to` isn't nested under `from_dir` (§3's `isolate_file`).
/// Both inputs must already be absolute.
fn relative_between(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();
    let shared = from.iter().zip(target.iter()).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::new();
    for _ in shared..from.len() {
        parts.push("..".to_string());
    }
    for component in &target[shared..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// §4.G.2 — builds the one [`Binding`] selected by the caller's supplied
/// config-variables, rejecting names that aren't an axis of `configs` and
/// axes the caller didn't supply a value for.
fn resolve_binding(configs: &Configs, config_variables: &BTreeMap<String, String>) -> Result<Binding> {
    for name in config_variables.keys() {
        if !configs.axes.contains(name) {
            return Err(IsolateError::config(format!(
                "unknown config-variable axis '{name}'"
            )));
        }
    }
    let mut entries = Vec::with_capacity(configs.axes.len());
    for axis in &configs.axes {
        let Some(raw) = config_variables.get(axis) else {
            return Err(IsolateError::config(format!(
                "missing value for config-variable axis '{axis}'"
            )));
        };
        entries.push((axis.clone(), literal_for(configs, axis, raw)));
    }
    Ok(Binding { entries })
}

/// Disambiguates whether a caller-supplied config-variable string should be
/// matched as an integer or a string literal, by checking which form
/// appears in the axis's known domain (§4.C, §4.G).
fn literal_for(configs: &Configs, axis: &str, raw: &str) -> Literal {
    if let Ok(n) = raw.parse::<i64>() {
        if let Some(domain) = configs.domain_by_axis.get(axis) {
            if domain.contains(&Literal::Int(n)) {
                return Literal::Int(n);
            }
        }
    }
    Literal::Str(raw.to_string())
}

fn select_variables(configs: &Configs, binding: &Binding) -> Variables {
    let key: Vec<Literal> = configs
        .axes
        .iter()
        .map(|axis| binding.get(axis).cloned().unwrap_or(Literal::Str(String::new())))
        .collect();
    configs.by_binding.get(&key).cloned().unwrap_or_default()
}

/// Validates every path-variable resolves to an existing directory
/// (§4.G.3, §7, §8 S6), returning each one's canonicalized absolute path.
fn validate_path_variables(
    isolate_dir: &Path,
    path_variables: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, PathBuf>> {
    let mut out = BTreeMap::new();
    for (name, value) in path_variables {
        let candidate = isolate_dir.join(value);
        if !candidate.is_dir() {
            return Err(IsolateError::config(format!(
                "{name}={} is not a directory",
                candidate.display()
            )));
        }
        let canonical = dunce::canonicalize(&candidate)
            .map_err(|e| IsolateError::io_with_path(e, candidate.clone()))?;
        out.insert(name.clone(), canonical);
    }
    Ok(out)
}

/// Highest common ancestor directory of every path in `dirs` (§4.G.3).
fn common_ancestor(dirs: impl IntoIterator<Item = PathBuf>) -> PathBuf {
    let mut iter = dirs.into_iter();
    let Some(first) = iter.next() else {
        return PathBuf::from(".");
    };
    let mut common: Vec<std::ffi::OsString> =
        first.components().map(|c| c.as_os_str().to_os_string()).collect();
    for dir in iter {
        let components: Vec<std::ffi::OsString> =
            dir.components().map(|c| c.as_os_str().to_os_string()).collect();
        let shared = common.iter().zip(components.iter()).take_while(|(a, b)| a == b).count();
        common.truncate(shared);
    }
    common.into_iter().collect()
}

/// Expresses `path` relative to `root`, forward-slash joined for
/// determinism regardless of host path-separator conventions (§5, §8.6).
/// Errs if `path` doesn't fall under `root` (§4.G.5, §7: "escaping
/// `root_dir`").
fn reroot(root: &Path, path: &Path) -> Result<String> {
    reroot_arbitrary(root, path).ok_or_else(|| {
        IsolateError::config(format!(
            "path '{}' escapes root_dir '{}'",
            path.display(),
            root.display()
        ))
    })
}

fn reroot_arbitrary(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return Some(".".to_string());
    }
    Some(
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Collapses `.`/`..` components lexically, without touching the
/// filesystem (needed for path-variables like `../../third_party` that may
/// not exist relative to the isolate file in every configuration).
fn lexical_normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn substitute_list(
    items: &[String],
    path_variables: &BTreeMap<String, String>,
    extra_variables: &BTreeMap<String, String>,
    config_variables: &BTreeMap<String, String>,
) -> Result<Vec<String>> {
    items
        .iter()
        .map(|s| substitution::substitute(s, path_variables, extra_variables, config_variables))
        .collect()
}

/// Resolves every declared `files_tracked`/`files_untracked`/`files_touched`
/// path into an absolute, root-relative [`PendingEntry`] (§4.G.5).
/// Directory entries (trailing `/`) are expanded here into one entry per
/// non-directory descendant via [`walker::walk`].
fn collect_pending_entries(
    variables: &Variables,
    isolate_dir: &Path,
    root_dir: &Path,
    path_variables: &BTreeMap<String, String>,
    extra_variables: &BTreeMap<String, String>,
    config_variables: &BTreeMap<String, String>,
    ignore_broken_items: bool,
) -> Result<Vec<PendingEntry>> {
    let blacklist = Blacklist::default_patterns();
    let mut out = Vec::new();

    let mut push_category =
        |paths: &std::collections::BTreeSet<String>, optional: bool| -> Result<()> {
            let tolerate_missing = optional || ignore_broken_items;
            for raw in paths {
                let substituted =
                    substitution::substitute(raw, path_variables, extra_variables, config_variables)?;
                let absolute = lexical_normalize(&isolate_dir.join(substituted.trim_end_matches('/')));
                if substituted.ends_with('/') {
                    if !absolute.is_dir() {
                        if tolerate_missing {
                            continue;
                        }
                        return Err(IsolateError::config(format!(
                            "'{raw}' does not resolve to an existing directory"
                        )));
                    }
                    let prefix = reroot(root_dir, &absolute)?;
                    for entry in walker::walk(&absolute, &blacklist)? {
                        let child_abs = absolute.join(entry.path());
                        let child_rel = if prefix == "." {
                            entry.path().to_string_lossy().replace('\\', "/")
                        } else {
                            format!("{prefix}/{}", entry.path().to_string_lossy().replace('\\', "/"))
                        };
                        out.push(PendingEntry {
                            rel_path: child_rel,
                            absolute: child_abs,
                            optional,
                        });
                    }
                } else {
                    if !absolute.exists() {
                        if tolerate_missing {
                            continue;
                        }
                        return Err(IsolateError::config(format!(
                            "'{raw}' does not exist"
                        )));
                    }
                    let rel = reroot(root_dir, &absolute)?;
                    out.push(PendingEntry {
                        rel_path: rel,
                        absolute,
                        optional,
                    });
                }
            }
            Ok(())
        };

    push_category(&variables.files_tracked, false)?;
    push_category(&variables.files_untracked, false)?;
    push_category(&variables.files_touched, true)?;

    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    out.dedup_by(|a, b| a.rel_path == b.rel_path);
    Ok(out)
}

/// Hashes (or reuses, per §4.G's incremental rule) every pending entry,
/// producing both the compact manifest map and the mtime-carrying saved
/// state map. Symlinks record their target instead of a hash.
fn hash_entries(
    pending: &[PendingEntry],
    algorithm: Algorithm,
    os: &str,
    prior: Option<&SavedState>,
) -> Result<(BTreeMap<String, FileEntry>, BTreeMap<String, SavedFileEntry>)> {
    let mut files = BTreeMap::new();
    let mut saved = BTreeMap::new();

    for entry in pending {
        let metadata = fs::symlink_metadata(&entry.absolute)
            .map_err(|e| IsolateError::io_with_path(e, entry.absolute.clone()))?;

        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&entry.absolute)
                .map_err(|e| IsolateError::io_with_path(e, entry.absolute.clone()))?
                .to_string_lossy()
                .into_owned();
            files.insert(entry.rel_path.clone(), FileEntry::symlink(target.clone()));
            saved.insert(entry.rel_path.clone(), SavedFileEntry::symlink(target));
            continue;
        }

        let size = metadata.len();
        let mode = file_mode(&metadata).filter(|_| os != "win");
        let mtime = mtime_seconds(&metadata);

        let prior_entry = prior_entry_for(prior, &entry.rel_path);
        let hash = if prior_entry.is_some_and(|p| p.is_fresh(size, mode, mtime)) {
            prior_entry.and_then(|p| p.h.clone()).unwrap_or_default()
        } else {
            hashing::hash_file(&entry.absolute, algorithm)?
        };

        files.insert(
            entry.rel_path.clone(),
            FileEntry::hashed(hash.clone(), size, mode),
        );
        saved.insert(
            entry.rel_path.clone(),
            SavedFileEntry::hashed(hash, size, mode, mtime),
        );
    }

    Ok((files, saved))
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

fn mtime_seconds(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or_else(current_unix_timestamp, |d| d.as_secs())
}

/// Which bin a file falls into for §4.I splitting. `Depth` collects files
/// nested below `relative_cwd` that aren't under `PRODUCT_DIR`; `Master`
/// keeps direct children of `relative_cwd` (e.g. the launcher script
/// sitting next to the command) ungrouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitBin {
    ProductDir,
    Depth,
    Master,
}

fn classify(rel_path: &str, product_dir_prefix: Option<&str>) -> SplitBin {
    if let Some(prefix) = product_dir_prefix {
        let under_product_dir = prefix == "."
            || rel_path == prefix
            || rel_path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'));
        if under_product_dir {
            return SplitBin::ProductDir;
        }
    }
    if rel_path.contains('/') {
        SplitBin::Depth
    } else {
        SplitBin::Master
    }
}

/// §4.I — partitions `manifest.files` into a `PRODUCT_DIR` child, a `DEPTH`
/// child, and leaves the rest (including `command`) in the master. Returns
/// the `(filename, manifest)` pairs for each non-empty child, in `DEPTH`
/// then `PRODUCT_DIR` order to match the master's `includes` list.
///
/// `DEPTH` collects any file nested below `relative_cwd` that isn't under
/// `PRODUCT_DIR`; files directly alongside the command (no path separator)
/// stay in the master, matching §8 S5's fixture.
fn split_children(
    files: &BTreeMap<String, FileEntry>,
    product_dir_prefix: Option<&str>,
    algo: &str,
    os: &str,
) -> (BTreeMap<String, FileEntry>, Vec<(SplitBin, ChildManifest)>) {
    let mut master = BTreeMap::new();
    let mut depth_files = BTreeMap::new();
    let mut product_dir_files = BTreeMap::new();

    for (path, entry) in files {
        match classify(path, product_dir_prefix) {
            SplitBin::Master => {
                master.insert(path.clone(), entry.clone());
            }
            SplitBin::Depth => {
                depth_files.insert(path.clone(), entry.clone());
            }
            SplitBin::ProductDir => {
                product_dir_files.insert(path.clone(), entry.clone());
            }
        }
    }

    let mut children = Vec::new();
    for (bin, bin_files) in [
        (SplitBin::Depth, depth_files),
        (SplitBin::ProductDir, product_dir_files),
    ] {
        if !bin_files.is_empty() {
            children.push((
                bin,
                ChildManifest {
                    algo: algo.to_string(),
                    files: bin_files,
                    os: os.to_string(),
                    version: ISOLATED_FILE_VERSION.to_string(),
                },
            ));
        }
    }
    (master, children)
}

#[cfg(test)]
#[path = "complete_state_tests.rs"]
mod tests;
