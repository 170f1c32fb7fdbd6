use tempfile::tempdir;

use super::run_rewrite_impl;
use crate::cli::RewriteArgs;

#[test]
fn run_rewrite_normalizes_legacy_variables_block() {
    let dir = tempdir().unwrap();
    let isolate_path = dir.path().join("sample.isolate");
    std::fs::write(
        &isolate_path,
        b"{\n  'variables': {\n    'files_tracked': ['run.py'],\n  },\n}\n",
    )
    .unwrap();

    let args = RewriteArgs {
        isolate: isolate_path.clone(),
        output: None,
    };

    let code = run_rewrite_impl(&args).unwrap();
    assert_eq!(code, 0);

    let rewritten = std::fs::read_to_string(&isolate_path).unwrap();
    assert!(rewritten.contains("'conditions'"));
    assert!(rewritten.contains("'files_tracked'"));
    assert!(rewritten.contains("run.py"));
}

#[test]
fn run_rewrite_writes_to_explicit_output_path() {
    let dir = tempdir().unwrap();
    let isolate_path = dir.path().join("sample.isolate");
    let out_path = dir.path().join("sample.canonical.isolate");
    std::fs::write(
        &isolate_path,
        b"{\n  'conditions': [\n    ['OS==\"linux\"', {'variables': {'files_tracked': ['a.txt']}}],\n  ],\n}\n",
    )
    .unwrap();

    let args = RewriteArgs {
        isolate: isolate_path.clone(),
        output: Some(out_path.clone()),
    };

    run_rewrite_impl(&args).unwrap();

    assert!(out_path.exists());
    // the source file itself is left untouched when --output is given
    let original = std::fs::read_to_string(&isolate_path).unwrap();
    assert!(original.contains("'conditions'"));
}

#[test]
fn run_rewrite_fails_on_malformed_isolate() {
    let dir = tempdir().unwrap();
    let isolate_path = dir.path().join("broken.isolate");
    std::fs::write(&isolate_path, b"{ not valid").unwrap();

    let args = RewriteArgs {
        isolate: isolate_path,
        output: None,
    };

    assert!(run_rewrite_impl(&args).is_err());
}
