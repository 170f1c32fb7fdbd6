use std::path::PathBuf;

use tempfile::tempdir;

use super::{NullUploader, Uploader, run_hashtable_impl};
use crate::cli::{CommonArgs, HashtableArgs};
use crate::output::ColorMode;

fn common_args(isolate: PathBuf, isolated: PathBuf) -> CommonArgs {
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

struct RecordingUploader {
    calls: std::cell::RefCell<Vec<usize>>,
}

impl Uploader for RecordingUploader {
    fn upload(&self, written: &[PathBuf]) -> crate::Result<()> {
        self.calls.borrow_mut().push(written.len());
        Ok(())
    }
}

#[test]
fn null_uploader_fails_with_execution_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("run.py"), b"print('hi')\n").unwrap();
    std::fs::write(
        dir.path().join("sample.isolate"),
        b"{\n  'variables': {\n    'files_tracked': ['run.py'],\n  },\n}\n",
    )
    .unwrap();

    let args = HashtableArgs {
        common: common_args(dir.path().join("sample.isolate"), dir.path().join("sample.isolated")),
    };

    let err = run_hashtable_impl(&args, ColorMode::Never, &NullUploader).unwrap_err();
    assert_eq!(err.error_type(), "Execution");
}

#[test]
fn injected_uploader_receives_written_paths() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("run.py"), b"print('hi')\n").unwrap();
    std::fs::write(
        dir.path().join("sample.isolate"),
        b"{\n  'variables': {\n    'files_tracked': ['run.py'],\n  },\n}\n",
    )
    .unwrap();

    let args = HashtableArgs {
        common: common_args(dir.path().join("sample.isolate"), dir.path().join("sample.isolated")),
    };

    let uploader = RecordingUploader { calls: std::cell::RefCell::new(Vec::new()) };
    let code = run_hashtable_impl(&args, ColorMode::Never, &uploader).unwrap();
    assert_eq!(code, 0);
    assert_eq!(uploader.calls.borrow().len(), 1);
}
