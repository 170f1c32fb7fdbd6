use tempfile::tempdir;

use super::run_check_impl;
use crate::cli::{CheckArgs, CommonArgs};
use crate::output::ColorMode;

fn common_args(isolate: std::path::PathBuf, isolated: std::path::PathBuf) -> CommonArgs {
    CommonArgs {
        isolate,
        isolated,
        outdir: None,
        config_variable: Vec::new(),
        path_variable: Vec::new(),
        extra_variable: Vec::new(),
        ignore_broken_items: false,
        os: "linux".to_string(),
    }
}

#[test]
fn run_check_writes_isolated_and_state_files() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("run.py"), b"print('hi')\n").unwrap();
    std::fs::write(
        dir.path().join("sample.isolate"),
        b"{\n  'variables': {\n    'command': ['python', 'run.py'],\n    'files_tracked': ['run.py'],\n  },\n}\n",
    )
    .unwrap();

    let isolate_path = dir.path().join("sample.isolate");
    let isolated_path = dir.path().join("sample.isolated");
    let args = CheckArgs {
        common: common_args(isolate_path, isolated_path.clone()),
    };

    let code = run_check_impl(&args, ColorMode::Never).unwrap();
    assert_eq!(code, 0);
    assert!(isolated_path.exists());
    assert!(isolated_path.with_extension("isolated.state").exists() || dir.path().join("sample.isolated.state").exists());
}

#[test]
fn run_check_fails_on_missing_required_file() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("sample.isolate"),
        b"{\n  'variables': {\n    'files_tracked': ['missing.txt'],\n  },\n}\n",
    )
    .unwrap();

    let isolate_path = dir.path().join("sample.isolate");
    let isolated_path = dir.path().join("sample.isolated");
    let args = CheckArgs {
        common: common_args(isolate_path, isolated_path),
    };

    assert!(run_check_impl(&args, ColorMode::Never).is_err());
}
