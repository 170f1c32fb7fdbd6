//! `clap` CLI surface (§6): `check`, `hashtable`/`archive`, `rewrite`, `run`,
//! and the common flags they all share except `rewrite`, which only needs
//! an isolate path since it never resolves a config-variable binding.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::IsolateError;
use crate::output::ColorMode;

#[derive(Parser, Debug)]
#[command(name = "isolate")]
#[command(
    author,
    version,
    about = "Compile .isolate manifests into content-addressed .isolated files",
    long_about = "Compiles a restricted-literal .isolate source file plus a \
    config-variable binding into a compact, content-addressed .isolated \
    manifest, with an incremental .isolated.state sidecar for fast rebuilds."
)]
pub struct Cli {
    /// Control color output on stderr
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: CliColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

/// Mirrors [`ColorMode`]; kept as its own `ValueEnum` so `clap`'s derive
/// doesn't need `ColorMode` itself to implement it.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CliColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl From<CliColorMode> for ColorMode {
    fn from(mode: CliColorMode) -> Self {
        match mode {
            CliColorMode::Auto => Self::Auto,
            CliColorMode::Always => Self::Always,
            CliColorMode::Never => Self::Never,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile the manifest, update the sidecar, exit 0 on success
    Check(CheckArgs),

    /// Compile then upload to a content-addressed store
    #[command(alias = "archive")]
    Hashtable(HashtableArgs),

    /// Parse the isolate, normalize, write it back in canonical pretty-printed form
    Rewrite(RewriteArgs),

    /// Compile, then invoke the declared command with extra args
    Run(RunArgs),
}

/// Flags shared by `check`/`hashtable`/`run` (§6). `rewrite` doesn't need
/// any of these — it never resolves a binding.
#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to the .isolate source file
    #[arg(long)]
    pub isolate: PathBuf,

    /// Path to the .isolated output file
    #[arg(long, short = 's')]
    pub isolated: PathBuf,

    /// Directory new files are written relative to (defaults to --isolated's parent)
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// `NAME VALUE` selecting one value per condition axis (repeatable)
    #[arg(long = "config-variable", num_args = 2, value_names = ["NAME", "VALUE"])]
    pub config_variable: Vec<String>,

    /// `NAME=VALUE` or `NAME VALUE` path-variable binding (repeatable)
    #[arg(long = "path-variable", num_args = 1..=2, value_names = ["NAME", "VALUE"])]
    pub path_variable: Vec<String>,

    /// `NAME VALUE` substituted wherever `<(NAME)` appears (repeatable)
    #[arg(long = "extra-variable", num_args = 2, value_names = ["NAME", "VALUE"])]
    pub extra_variable: Vec<String>,

    /// Tolerate missing optional (`files_untracked`/`files_touched`) entries
    #[arg(long)]
    pub ignore_broken_items: bool,

    /// The manifest's `os` tag (§6); also used as the `OS` config-variable's
    /// value unless `--config-variable OS ...` overrides it
    #[arg(long, default_value = "linux")]
    pub os: String,
}

impl CommonArgs {
    /// # Errors
    /// Returns a [`IsolateError::Config`] if `--config-variable` wasn't
    /// given an even number of tokens (clap's `num_args = 2` already
    /// guarantees this per occurrence, so failure here would mean a bug in
    /// argument wiring, not bad user input).
    pub fn config_variables(&self) -> crate::Result<BTreeMap<String, String>> {
        let mut map = pairs_to_map(&self.config_variable, "config-variable")?;
        map.entry("OS".to_string()).or_insert_with(|| self.os.clone());
        Ok(map)
    }

    /// # Errors
    /// See [`Self::config_variables`].
    pub fn extra_variables(&self) -> crate::Result<BTreeMap<String, String>> {
        pairs_to_map(&self.extra_variable, "extra-variable")
    }

    /// # Errors
    /// Returns a [`IsolateError::Config`] if a `NAME`-only token (the
    /// space-separated form) isn't followed by a value token.
    pub fn path_variables(&self) -> crate::Result<BTreeMap<String, String>> {
        parse_path_variables(&self.path_variable)
    }
}

fn pairs_to_map(flat: &[String], flag_name: &str) -> crate::Result<BTreeMap<String, String>> {
    if flat.len() % 2 != 0 {
        return Err(IsolateError::config(format!(
            "--{flag_name} requires NAME VALUE pairs"
        )));
    }
    let mut map = BTreeMap::new();
    for pair in flat.chunks_exact(2) {
        map.insert(pair[0].clone(), pair[1].clone());
    }
    Ok(map)
}

/// Disambiguates the dual `NAME=VALUE` / `NAME VALUE` syntax the same way
/// the original tool's `--path-variable` argument parsing does (a token
/// with an `=` is self-contained; otherwise the following token is its
/// value).
fn parse_path_variables(tokens: &[String]) -> crate::Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if let Some((name, value)) = token.split_once('=') {
            map.insert(name.to_string(), value.to_string());
            i += 1;
        } else {
            let Some(value) = tokens.get(i + 1) else {
                return Err(IsolateError::config(format!(
                    "--path-variable '{token}' needs a value (use NAME=VALUE or NAME VALUE)"
                )));
            };
            map.insert(token.clone(), value.clone());
            i += 2;
        }
    }
    Ok(map)
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct HashtableArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Arguments appended to the manifest's declared command
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct RewriteArgs {
    /// Path to the .isolate source file to normalize
    #[arg(long)]
    pub isolate: PathBuf,

    /// Write the canonical form here instead of overwriting `--isolate` in place
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
