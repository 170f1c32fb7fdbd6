use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy per spec §7.
///
/// `Config` and `Execution` are fatal, reported as a single-line message on
/// stderr with a non-zero exit. `Io` is never caught silently. `StateStale`
/// is not surfaced here: callers that hit a stale sidecar recover locally by
/// discarding it (§4.H, §7) rather than propagating an error.
#[derive(Error, Debug)]
pub enum IsolateError {
    /// Malformed isolate file, unknown variable/axis, duplicate command after
    /// merge, unresolved `<(NAME)`, bad path-variable, escaping input path.
    #[error("configuration error: {0}")]
    Config(String),

    /// A prerequisite vanished between two steps of a compile (e.g. a file
    /// hashed successfully but disappeared before being archived).
    #[error("execution error: {0}")]
    Execution(String),

    #[error("{}", format_io_error(source, path, operation))]
    Io {
        #[source]
        source: std::io::Error,
        path: Option<PathBuf>,
        operation: Option<&'static str>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn format_io_error(
    source: &std::io::Error,
    path: &Option<PathBuf>,
    operation: &Option<&'static str>,
) -> String {
    match (path.as_ref(), *operation) {
        (Some(p), Some(op)) => format!("IO error ({op} '{}'): {source}", p.display()),
        (Some(p), None) => format!("IO error ('{}'): {source}", p.display()),
        (None, Some(op)) => format!("IO error ({op}): {source}"),
        (None, None) => format!("IO error: {source}"),
    }
}

impl From<std::io::Error> for IsolateError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            source: e,
            path: None,
            operation: None,
        }
    }
}

impl IsolateError {
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    #[must_use]
    pub const fn io_with_path(source: std::io::Error, path: PathBuf) -> Self {
        Self::Io {
            source,
            path: Some(path),
            operation: None,
        }
    }

    #[must_use]
    pub const fn io_with_context(
        source: std::io::Error,
        path: PathBuf,
        operation: &'static str,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path),
            operation: Some(operation),
        }
    }

    /// Short identifier for the error class, used to pick an exit code.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "Config",
            Self::Execution(_) => "Execution",
            Self::Io { .. } => "IO",
            Self::Json(_) => "JSON",
        }
    }

    /// Single-line human message, per §7 policy (no type prefix).
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Config(msg) | Self::Execution(msg) => msg.clone(),
            Self::Io {
                source,
                path,
                operation,
            } => match (path, operation) {
                (Some(p), Some(op)) => format!("{op} '{}': {source}", p.display()),
                (Some(p), None) => format!("'{}': {source}", p.display()),
                (None, Some(op)) => format!("{op}: {source}"),
                (None, None) => source.to_string(),
            },
            Self::Json(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IsolateError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
