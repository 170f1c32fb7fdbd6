use super::{ColorMode, ErrorOutput};
use crate::error::IsolateError;

#[test]
fn write_error_without_color_has_no_escape_codes() {
    let out = ErrorOutput::new(ColorMode::Never);
    let mut buf = Vec::new();
    out.write_error(&mut buf, &IsolateError::config("bad axis"));
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, "✖ Config: bad axis\n");
}

#[test]
fn write_error_with_color_wraps_error_type_in_ansi() {
    let out = ErrorOutput::new(ColorMode::Always);
    let mut buf = Vec::new();
    out.write_error(&mut buf, &IsolateError::execution("file vanished"));
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("\x1b[31m"));
    assert!(text.contains("Execution"));
    assert!(text.contains("file vanished"));
}

#[test]
fn io_error_message_is_not_duplicated_with_type_prefix() {
    let out = ErrorOutput::new(ColorMode::Never);
    let mut buf = Vec::new();
    let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err = IsolateError::io_with_path(source, std::path::PathBuf::from("/tmp/x"));
    out.write_error(&mut buf, &err);
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("✖ IO: "));
    assert!(text.contains("/tmp/x"));
}
