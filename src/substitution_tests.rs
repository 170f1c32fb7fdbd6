use std::collections::BTreeMap;

use super::*;

fn maps(
    path: &[(&str, &str)],
    extra: &[(&str, &str)],
    config: &[(&str, &str)],
) -> (BTreeMap<String, String>, BTreeMap<String, String>, BTreeMap<String, String>) {
    let to_map = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    };
    (to_map(path), to_map(extra), to_map(config))
}

#[test]
fn substitutes_single_occurrence() {
    let (p, e, c) = maps(&[("DEPTH", "..")], &[], &[]);
    let out = substitute("<(DEPTH)/foo", &p, &e, &c).unwrap();
    assert_eq!(out, "../foo");
}

#[test]
fn path_variable_takes_precedence_over_extra_and_config() {
    let (p, e, c) = maps(&[("NAME", "from_path")], &[("NAME", "from_extra")], &[("NAME", "from_config")]);
    assert_eq!(substitute("<(NAME)", &p, &e, &c).unwrap(), "from_path");
}

#[test]
fn extra_variable_used_when_path_variable_absent() {
    let (p, e, c) = maps(&[], &[("NAME", "from_extra")], &[("NAME", "from_config")]);
    assert_eq!(substitute("<(NAME)", &p, &e, &c).unwrap(), "from_extra");
}

#[test]
fn unknown_variable_is_an_error() {
    let (p, e, c) = maps(&[], &[], &[]);
    assert!(substitute("<(MISSING)", &p, &e, &c).is_err());
}

#[test]
fn text_with_no_markers_passes_through_unchanged() {
    let (p, e, c) = maps(&[], &[], &[]);
    assert_eq!(substitute("plain/path.txt", &p, &e, &c).unwrap(), "plain/path.txt");
}

#[test]
fn multiple_markers_in_one_string_all_substitute() {
    let (p, e, c) = maps(&[("DEPTH", ".."), ("PRODUCT_DIR", "out/Release")], &[], &[]);
    let out = substitute("<(DEPTH)/<(PRODUCT_DIR)/bin", &p, &e, &c).unwrap();
    assert_eq!(out, "../out/Release/bin");
}
