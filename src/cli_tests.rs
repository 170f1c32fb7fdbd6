use super::{parse_path_variables, pairs_to_map};

#[test]
fn pairs_to_map_builds_from_flattened_pairs() {
    let flat = vec!["NAME".to_string(), "value".to_string(), "OS".to_string(), "linux".to_string()];
    let map = pairs_to_map(&flat, "config-variable").unwrap();
    assert_eq!(map.get("NAME").unwrap(), "value");
    assert_eq!(map.get("OS").unwrap(), "linux");
}

#[test]
fn pairs_to_map_rejects_odd_length() {
    let flat = vec!["NAME".to_string()];
    assert!(pairs_to_map(&flat, "extra-variable").is_err());
}

#[test]
fn parse_path_variables_accepts_equals_syntax() {
    let tokens = vec!["DEPTH=.".to_string(), "PRODUCT_DIR=out/Release".to_string()];
    let map = parse_path_variables(&tokens).unwrap();
    assert_eq!(map.get("DEPTH").unwrap(), ".");
    assert_eq!(map.get("PRODUCT_DIR").unwrap(), "out/Release");
}

#[test]
fn parse_path_variables_accepts_space_syntax() {
    let tokens = vec!["DEPTH".to_string(), ".".to_string()];
    let map = parse_path_variables(&tokens).unwrap();
    assert_eq!(map.get("DEPTH").unwrap(), ".");
}

#[test]
fn parse_path_variables_mixes_both_syntaxes_across_occurrences() {
    let tokens = vec![
        "DEPTH".to_string(),
        ".".to_string(),
        "PRODUCT_DIR=out/Release".to_string(),
    ];
    let map = parse_path_variables(&tokens).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("DEPTH").unwrap(), ".");
    assert_eq!(map.get("PRODUCT_DIR").unwrap(), "out/Release");
}

#[test]
fn parse_path_variables_errors_on_dangling_name() {
    let tokens = vec!["DEPTH".to_string()];
    assert!(parse_path_variables(&tokens).is_err());
}
