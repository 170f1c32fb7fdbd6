use std::path::Path;
use tempfile::TempDir;

use super::*;

#[test]
fn ensure_parent_dir_creates_nested_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir
        .path()
        .join("a")
        .join("b")
        .join("c")
        .join("file.json");

    ensure_parent_dir(&nested_path).unwrap();

    assert!(nested_path.parent().unwrap().exists());
}

#[test]
fn ensure_parent_dir_succeeds_when_exists() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("existing_dir").join("file.json");
    fs::create_dir(temp_dir.path().join("existing_dir")).unwrap();

    ensure_parent_dir(&file_path).unwrap();
}

#[test]
fn ensure_parent_dir_handles_root_path() {
    let result = ensure_parent_dir(Path::new("file.json"));
    assert!(result.is_ok());
}

#[test]
fn atomic_write_creates_file_with_content() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");

    atomic_write(&path, b"hello").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"hello");
}

#[test]
fn atomic_write_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");
    fs::write(&path, b"old").unwrap();

    atomic_write(&path, b"new").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"new");
}

#[test]
fn atomic_write_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("out.json");

    atomic_write(&path, b"content").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"content");
}

#[test]
fn atomic_write_leaves_no_temp_file_behind() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");

    atomic_write(&path, b"content").unwrap();

    let entries: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("out.json")]);
}
