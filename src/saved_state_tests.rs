use std::collections::BTreeMap;

use tempfile::tempdir;

use super::{SavedFileEntry, SavedState, isolated_to_state_path, load_prior_state};
use crate::manifest::ISOLATED_FILE_VERSION;

fn sample_state() -> SavedState {
    let mut files = BTreeMap::new();
    files.insert(
        "foo.py".to_string(),
        SavedFileEntry::hashed("abc123".to_string(), 10, Some(0o644), 1_700_000_000),
    );
    SavedState {
        algo: "sha-1".to_string(),
        child_isolated_files: Vec::new(),
        command: Some(vec!["python".to_string(), "foo.py".to_string()]),
        config_variables: BTreeMap::new(),
        extra_variables: BTreeMap::new(),
        files,
        isolate_file: "foo.isolate".to_string(),
        path_variables: BTreeMap::new(),
        read_only: None,
        relative_cwd: ".".to_string(),
        version: ISOLATED_FILE_VERSION.to_string(),
    }
}

#[test]
fn isolated_to_state_path_appends_state_suffix() {
    let path = std::path::Path::new("/tmp/foo.isolated");
    assert_eq!(
        isolated_to_state_path(path),
        std::path::PathBuf::from("/tmp/foo.isolated.state")
    );
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("foo.isolated.state");
    let state = sample_state();
    state.save(&state_path).unwrap();

    let loaded = load_prior_state(&state_path).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn load_prior_state_is_none_when_missing() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("missing.isolated.state");
    assert!(load_prior_state(&state_path).is_none());
}

#[test]
fn load_prior_state_is_none_on_major_version_mismatch() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("foo.isolated.state");
    let mut state = sample_state();
    state.version = "2.0".to_string();
    let json = state.to_pretty_json().unwrap();
    std::fs::write(&state_path, json).unwrap();

    assert!(load_prior_state(&state_path).is_none());
}

#[test]
fn load_prior_state_is_none_on_malformed_json() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("foo.isolated.state");
    std::fs::write(&state_path, b"not json").unwrap();
    assert!(load_prior_state(&state_path).is_none());
}

#[test]
fn is_fresh_requires_exact_match_and_rejects_invalid_sentinel() {
    let fresh = SavedFileEntry::hashed("abc".to_string(), 10, Some(0o644), 123);
    assert!(fresh.is_fresh(10, Some(0o644), 123));
    assert!(!fresh.is_fresh(11, Some(0o644), 123));
    assert!(!fresh.is_fresh(10, Some(0o600), 123));
    assert!(!fresh.is_fresh(10, Some(0o644), 124));

    let invalid = SavedFileEntry::hashed("invalid".to_string(), 10, Some(0o644), 123);
    assert!(!invalid.is_fresh(10, Some(0o644), 123));
}

#[test]
fn pretty_json_to_manifest_preserves_files() {
    let state = sample_state();
    let manifest = state.to_manifest("linux", None);
    assert_eq!(manifest.os, "linux");
    assert_eq!(manifest.files.len(), 1);
    assert_eq!(manifest.files["foo.py"].h.as_deref(), Some("abc123"));
}
