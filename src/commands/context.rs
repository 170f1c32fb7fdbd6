//! Shared setup for every verb that actually compiles a manifest
//! (`check`/`hashtable`/`run` — `rewrite` doesn't need any of this since it
//! never resolves a binding).

use std::path::PathBuf;

use crate::cli::CommonArgs;
use crate::complete_state::{CompleteState, CompleteStateInputs, load_complete_state};
use crate::hashing::Algorithm;
use crate::saved_state::{isolated_to_state_path, load_prior_state};

/// Where the `.isolated` (and its siblings) actually land: `--outdir`
/// relocates the file named by `--isolated` into that directory, keeping
/// its filename (§6's `--outdir DIR`).
#[must_use]
pub fn effective_isolated_path(common: &CommonArgs) -> PathBuf {
    match &common.outdir {
        Some(dir) => common
            .isolated
            .file_name()
            .map_or_else(|| common.isolated.clone(), |name| dir.join(name)),
        None => common.isolated.clone(),
    }
}

/// Compiles `common` into a [`CompleteState`], reusing the prior sidecar
/// next to the effective `.isolated` path when one is present and fresh
/// (§4.G, §4.H). Returns the compiled state plus the path it should be
/// written to.
///
/// # Errors
/// Propagates any `ConfigError`/`IOError` from loading includes, resolving
/// the binding, or hashing files.
pub fn compile(common: &CommonArgs) -> crate::Result<(CompleteState, PathBuf)> {
    let isolated_path = effective_isolated_path(common);
    let prior = load_prior_state(&isolated_to_state_path(&isolated_path));

    let inputs = CompleteStateInputs {
        isolate_path: common.isolate.clone(),
        path_variables: common.path_variables()?,
        config_variables: common.config_variables()?,
        extra_variables: common.extra_variables()?,
        algorithm: Algorithm::Sha1,
        os: common.os.clone(),
        split: true,
        isolated_path: isolated_path.clone(),
        ignore_broken_items: common.ignore_broken_items,
    };

    let state = load_complete_state(&inputs, prior.as_ref())?;
    Ok((state, isolated_path))
}
