//! The `check` verb (§6): compile the manifest, update the sidecar, exit 0.

use crate::cli::CheckArgs;
use crate::output::{ColorMode, ErrorOutput, print_written_paths};
use crate::{EXIT_SUCCESS, exit_code_for};

use super::context::compile;

#[must_use]
pub fn run_check(args: &CheckArgs, color: ColorMode) -> i32 {
    match run_check_impl(args, color) {
        Ok(code) => code,
        Err(e) => {
            ErrorOutput::new(color).print_error(&e);
            exit_code_for(&e)
        }
    }
}

fn run_check_impl(args: &CheckArgs, color: ColorMode) -> crate::Result<i32> {
    let (mut state, isolated_path) = compile(&args.common)?;
    let written = state.save_files(&isolated_path)?;
    print_written_paths(&written, color);
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
