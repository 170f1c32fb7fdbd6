//! The `run` verb (§6): compile, then invoke the manifest's declared
//! command with extra args. Sandboxed execution is a Non-goal (§1, §9.D) —
//! this module compiles the real manifest and stops at an injectable
//! [`Runner`] trait object.

use std::path::Path;

use crate::cli::RunArgs;
use crate::output::{ColorMode, ErrorOutput};
use crate::exit_code_for;

use super::context::compile;

/// Delegate point for invoking the manifest's `command` (plus any trailing
/// CLI args) with `relative_cwd` as its working directory. Never
/// implemented by this crate (§1 Non-goals: no subprocess execution, no
/// sandboxing).
pub trait Runner {
    /// # Errors
    /// Returns an [`crate::error::IsolateError::Execution`] if the command
    /// cannot be run.
    fn run(&self, command: &[String], cwd: &Path) -> crate::Result<i32>;
}

/// The default `Runner`: reports that no executor is wired up.
pub struct NullRunner;

impl Runner for NullRunner {
    fn run(&self, _command: &[String], _cwd: &Path) -> crate::Result<i32> {
        Err(crate::error::IsolateError::execution(
            "subprocess execution is not implemented by this build; manifest was compiled \
             but its command was not invoked",
        ))
    }
}

#[must_use]
pub fn run_run(args: &RunArgs, color: ColorMode) -> i32 {
    run_run_with(args, color, &NullRunner)
}

#[must_use]
pub fn run_run_with(args: &RunArgs, color: ColorMode, runner: &dyn Runner) -> i32 {
    match run_run_impl(args, runner) {
        Ok(code) => code,
        Err(e) => {
            ErrorOutput::new(color).print_error(&e);
            exit_code_for(&e)
        }
    }
}

fn run_run_impl(args: &RunArgs, runner: &dyn Runner) -> crate::Result<i32> {
    let (state, _isolated_path) = compile(&args.common)?;
    let mut command = state.manifest.command.clone().unwrap_or_default();
    command.extend(args.extra_args.iter().cloned());
    if command.is_empty() {
        return Err(crate::error::IsolateError::config(
            "manifest has no command to run",
        ));
    }
    let cwd = state.root_dir.join(&state.manifest.relative_cwd);
    runner.run(&command, &cwd)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
