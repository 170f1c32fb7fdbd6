pub mod cli;
pub mod commands;
pub mod complete_state;
pub mod condition;
pub mod configs;
pub mod error;
pub mod hashing;
pub mod includes;
pub mod manifest;
pub mod output;
pub mod parser;
pub mod pretty_print;
pub mod saved_state;
pub mod state;
pub mod substitution;
pub mod value;
pub mod walker;

pub use error::{IsolateError, Result};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFIG_ERROR: i32 = 1;
pub const EXIT_IO_ERROR: i32 = 2;

/// Maps an [`IsolateError`] to the process exit code it should produce,
/// per spec §6 (config errors and I/O errors get distinct codes).
#[must_use]
pub const fn exit_code_for(err: &IsolateError) -> i32 {
    match err {
        IsolateError::Config(_) | IsolateError::Execution(_) => EXIT_CONFIG_ERROR,
        IsolateError::Io { .. } | IsolateError::Json(_) => EXIT_IO_ERROR,
    }
}
