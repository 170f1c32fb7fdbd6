use std::collections::BTreeSet;

use super::*;
use crate::condition::parse_condition;

fn clause(expr: &str, vars: Variables) -> NormalizedClause {
    NormalizedClause {
        condition: parse_condition(expr).unwrap(),
        variables: vars,
    }
}

fn tracked(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn load_isolate_as_config_merges_default_and_conditional_variables() {
    let ast = NormalizedAst {
        clauses: vec![
            clause(
                "True",
                Variables {
                    files_tracked: tracked(&["a"]),
                    ..Default::default()
                },
            ),
            clause(
                "OS==\"linux\"",
                Variables {
                    files_tracked: tracked(&["linux_only"]),
                    ..Default::default()
                },
            ),
        ],
    };
    let configs = load_isolate_as_config(&ast, None).unwrap();
    let flat = configs.flatten();
    let linux_key = vec![Literal::Str("linux".to_string())];
    assert!(flat[&linux_key].files_tracked.contains("a"));
    assert!(flat[&linux_key].files_tracked.contains("linux_only"));
}

#[test]
fn duplicate_top_level_command_is_an_error() {
    let ast = NormalizedAst {
        clauses: vec![
            clause(
                "True",
                Variables {
                    command: Some(vec!["rm".to_string(), "-rf".to_string(), "/".to_string()]),
                    ..Default::default()
                },
            ),
            clause(
                "OS==\"atari\"",
                Variables {
                    command: Some(vec!["echo".to_string(), "Hello World".to_string()]),
                    ..Default::default()
                },
            ),
        ],
    };
    assert!(load_isolate_as_config(&ast, None).is_err());
}

#[test]
fn union_top_level_command_beats_include_command() {
    let mut a = Configs::empty();
    a.axes = vec!["OS".to_string()];
    a.domain_by_axis.insert("OS".to_string(), BTreeSet::from([Literal::Str("linux".to_string())]));
    a.by_binding.insert(
        vec![Literal::Str("linux".to_string())],
        Variables {
            command: Some(vec!["top".to_string()]),
            ..Default::default()
        },
    );

    let mut b = a.clone();
    b.by_binding.insert(
        vec![Literal::Str("linux".to_string())],
        Variables {
            command: Some(vec!["included".to_string()]),
            ..Default::default()
        },
    );

    let merged = union(&a, Origin::TopLevel, &b, Origin::Include).unwrap();
    let key = vec![Literal::Str("linux".to_string())];
    assert_eq!(
        merged.by_binding[&key].command,
        Some(vec!["top".to_string()])
    );
}

#[test]
fn union_later_include_wins_over_earlier_include() {
    let mut a = Configs::empty();
    a.axes = vec!["OS".to_string()];
    a.domain_by_axis.insert("OS".to_string(), BTreeSet::from([Literal::Str("linux".to_string())]));
    a.by_binding.insert(
        vec![Literal::Str("linux".to_string())],
        Variables {
            command: Some(vec!["earlier".to_string()]),
            ..Default::default()
        },
    );
    let mut b = a.clone();
    b.by_binding.insert(
        vec![Literal::Str("linux".to_string())],
        Variables {
            command: Some(vec!["later".to_string()]),
            ..Default::default()
        },
    );

    let merged = union(&a, Origin::Include, &b, Origin::Include).unwrap();
    let key = vec![Literal::Str("linux".to_string())];
    assert_eq!(
        merged.by_binding[&key].command,
        Some(vec!["later".to_string()])
    );
}

#[test]
fn union_expands_axis_unknown_to_one_side() {
    let mut a = Configs::empty();
    a.axes = vec!["OS".to_string()];
    a.domain_by_axis.insert(
        "OS".to_string(),
        BTreeSet::from([Literal::Str("linux".to_string()), Literal::Str("mac".to_string())]),
    );
    a.by_binding.insert(
        vec![Literal::Str("linux".to_string())],
        Variables { files_tracked: tracked(&["linux_file"]), ..Default::default() },
    );
    a.by_binding.insert(
        vec![Literal::Str("mac".to_string())],
        Variables { files_tracked: tracked(&["mac_file"]), ..Default::default() },
    );

    let mut b = Configs::empty();
    b.axes = vec!["chromeos".to_string()];
    b.domain_by_axis.insert("chromeos".to_string(), BTreeSet::from([Literal::Int(1)]));
    b.by_binding.insert(
        vec![Literal::Int(1)],
        Variables { files_tracked: tracked(&["chromeos_file"]), ..Default::default() },
    );

    let merged = union(&a, Origin::TopLevel, &b, Origin::Include).unwrap();
    assert_eq!(merged.axes, vec!["OS".to_string(), "chromeos".to_string()]);
    let key = vec![Literal::Str("linux".to_string()), Literal::Int(1)];
    let vars = &merged.by_binding[&key];
    assert!(vars.files_tracked.contains("linux_file"));
    assert!(vars.files_tracked.contains("chromeos_file"));
}

#[test]
fn reduce_inputs_subsumes_files_under_tracked_directory() {
    let mut inverted = Inverted::default();
    let cfg_a: BTreeSet<BindingKey> = BTreeSet::from([vec![Literal::Str("linux".to_string())]]);
    inverted.files_tracked.insert("build/".to_string(), cfg_a.clone());
    inverted.files_tracked.insert("build/out.bin".to_string(), cfg_a);

    let reduced = reduce_inputs(&inverted);
    assert!(reduced.files_tracked.contains_key("build/"));
    assert!(!reduced.files_tracked.contains_key("build/out.bin"));
}

#[test]
fn reduce_inputs_tracked_wins_over_untracked_on_overlap() {
    let mut inverted = Inverted::default();
    let linux: BindingKey = vec![Literal::Str("linux".to_string())];
    let mac: BindingKey = vec![Literal::Str("mac".to_string())];
    inverted
        .files_tracked
        .insert("shared.txt".to_string(), BTreeSet::from([linux.clone()]));
    inverted.files_untracked.insert(
        "shared.txt".to_string(),
        BTreeSet::from([linux.clone(), mac.clone()]),
    );

    let reduced = reduce_inputs(&inverted);
    assert_eq!(
        reduced.files_untracked.get("shared.txt"),
        Some(&BTreeSet::from([mac]))
    );
    assert_eq!(
        reduced.files_tracked.get("shared.txt"),
        Some(&BTreeSet::from([linux]))
    );
}

#[test]
fn reduce_inputs_drops_touched_path_already_tracked() {
    let mut inverted = Inverted::default();
    let linux: BindingKey = vec![Literal::Str("linux".to_string())];
    inverted
        .files_tracked
        .insert("a".to_string(), BTreeSet::from([linux.clone()]));
    inverted
        .files_touched
        .insert("a".to_string(), BTreeSet::from([linux]));

    let reduced = reduce_inputs(&inverted);
    assert!(!reduced.files_touched.contains_key("a"));
}

#[test]
fn convert_map_to_conditions_groups_identical_binding_sets() {
    let mut inverted = Inverted::default();
    let linux: BindingKey = vec![Literal::Str("linux".to_string())];
    let mac: BindingKey = vec![Literal::Str("mac".to_string())];
    inverted
        .files_tracked
        .insert("common".to_string(), BTreeSet::from([linux.clone(), mac.clone()]));
    inverted
        .files_tracked
        .insert("linux_only".to_string(), BTreeSet::from([linux]));
    inverted
        .files_tracked
        .insert("mac_only".to_string(), BTreeSet::from([mac]));

    let axes = vec!["OS".to_string()];
    let clauses = convert_map_to_conditions(&inverted, &axes);
    assert_eq!(clauses.len(), 3);
    let all_paths: BTreeSet<&String> = clauses
        .iter()
        .flat_map(|c| c.variables.files_tracked.iter())
        .collect();
    assert_eq!(all_paths.len(), 3);
}
