//! The `hashtable`/`archive` verb (§6): compile, then upload to a
//! content-addressed store. The upload itself is a Non-goal (§1, §9.D) —
//! this module compiles the real manifest and stops at an injectable
//! [`Uploader`] trait object, exactly the interface spec.md names.

use std::path::PathBuf;

use crate::cli::HashtableArgs;
use crate::output::{ColorMode, ErrorOutput, print_written_paths};
use crate::{EXIT_SUCCESS, exit_code_for};

use super::context::compile;

/// Delegate point for pushing compiled `.isolated`/content-addressed blobs
/// to a remote store. Never implemented by this crate (§1 Non-goals).
pub trait Uploader {
    /// # Errors
    /// Returns an [`crate::error::IsolateError::Execution`] if the upload
    /// cannot proceed.
    fn upload(&self, written: &[PathBuf]) -> crate::Result<()>;
}

/// The default `Uploader`: reports that no transport is wired up. A real
/// deployment supplies its own `Uploader` (e.g. an isolate-server client)
/// in place of this one.
pub struct NullUploader;

impl Uploader for NullUploader {
    fn upload(&self, _written: &[PathBuf]) -> crate::Result<()> {
        Err(crate::error::IsolateError::execution(
            "hashtable upload is not implemented by this build; manifest was compiled and \
             written to disk but not uploaded",
        ))
    }
}

#[must_use]
pub fn run_hashtable(args: &HashtableArgs, color: ColorMode) -> i32 {
    run_hashtable_with(args, color, &NullUploader)
}

#[must_use]
pub fn run_hashtable_with(args: &HashtableArgs, color: ColorMode, uploader: &dyn Uploader) -> i32 {
    match run_hashtable_impl(args, color, uploader) {
        Ok(code) => code,
        Err(e) => {
            ErrorOutput::new(color).print_error(&e);
            exit_code_for(&e)
        }
    }
}

fn run_hashtable_impl(
    args: &HashtableArgs,
    color: ColorMode,
    uploader: &dyn Uploader,
) -> crate::Result<i32> {
    let (mut state, isolated_path) = compile(&args.common)?;
    let written = state.save_files(&isolated_path)?;
    uploader.upload(&written)?;
    print_written_paths(&written, color);
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
#[path = "hashtable_tests.rs"]
mod tests;
