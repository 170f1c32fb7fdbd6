//! Legacy-format normalization and transitive `include` resolution (§4.E).
//!
//! Two shapes get folded into the canonical "every clause has an explicit
//! condition" form before [`crate::configs::load_isolate_as_config`] ever
//! sees them: a top-level `variables` block, and a `[cond, then, else]`
//! three-element condition clause.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::condition::{parse_condition, Condition, Literal};
use crate::configs::{self, Configs, NormalizedAst, NormalizedClause, Origin, Variables};
use crate::error::{IsolateError, Result};
use crate::parser::{parse_isolate_file, ParsedIsolate};
use crate::value::Value;

/// Fallback OS domain used when synthesizing an `else` arm or an
/// unconditional top-level clause, so that a file mentioning only `linux`
/// still gets a non-empty `else` over `{linux, mac, win}` (§4.E).
const OS_FALLBACK_DOMAIN: [&str; 3] = ["linux", "mac", "win"];

const VALID_VARIABLE_KEYS: [&str; 5] = [
    "command",
    "files_tracked",
    "files_untracked",
    "files_touched",
    "read_only",
];

/// Converts a parsed isolate file's raw `variables`/`conditions` shape
/// into a [`NormalizedAst`] with every clause carrying an explicit
/// [`Condition`] (§4.E items 1 and 2).
pub fn convert_old_to_new_format(parsed: &ParsedIsolate) -> Result<NormalizedAst> {
    let mut conditions = Vec::with_capacity(parsed.conditions.len());
    for clause in &parsed.conditions {
        let condition = parse_condition(&clause.expr_text)?;
        let then = extract_variables_value(&clause.then)?;
        let else_ = clause.else_.as_ref().map(extract_variables_value).transpose()?;
        conditions.push((condition, then, else_));
    }

    let mut domain_across_file: std::collections::BTreeMap<String, BTreeSet<Literal>> =
        std::collections::BTreeMap::new();
    for (condition, _, _) in &conditions {
        for axis in condition.referenced_axes() {
            domain_across_file
                .entry(axis.clone())
                .or_default()
                .extend(condition.domain_of(&axis));
        }
    }
    domain_across_file
        .entry("OS".to_string())
        .or_default()
        .extend(OS_FALLBACK_DOMAIN.iter().map(|s| Literal::Str((*s).to_string())));

    let mut clauses = Vec::new();
    for (condition, then_vars, else_vars) in conditions {
        clauses.push(NormalizedClause {
            condition: condition.clone(),
            variables: then_vars,
        });
        if let Some(else_vars) = else_vars {
            let else_condition = synthesize_else_condition(&condition, &domain_across_file);
            clauses.push(NormalizedClause {
                condition: else_condition,
                variables: else_vars,
            });
        }
    }

    if let Some(top_level) = &parsed.variables {
        let top_vars = dict_to_variables(
            top_level
                .as_dict()
                .ok_or_else(|| IsolateError::config("'variables' must be a dict"))?,
        )?;
        let unconditional = full_domain_condition(&domain_across_file);
        clauses.insert(
            0,
            NormalizedClause {
                condition: unconditional,
                variables: top_vars,
            },
        );
    }

    Ok(NormalizedAst { clauses })
}

fn extract_variables_value(arm: &Value) -> Result<Variables> {
    let dict = arm
        .as_dict()
        .ok_or_else(|| IsolateError::config("condition arm must be a dict"))?;
    let vars_value = dict
        .get("variables")
        .ok_or_else(|| IsolateError::config("condition arm missing 'variables' key"))?;
    dict_to_variables(
        vars_value
            .as_dict()
            .ok_or_else(|| IsolateError::config("'variables' must be a dict"))?,
    )
}

fn dict_to_variables(dict: &IndexMap<String, Value>) -> Result<Variables> {
    for key in dict.keys() {
        if !VALID_VARIABLE_KEYS.contains(&key.as_str()) {
            return Err(IsolateError::config(format!(
                "unknown variable name '{key}' (allowed: {})",
                VALID_VARIABLE_KEYS.join(", ")
            )));
        }
    }

    let command = match dict.get("command") {
        None => None,
        Some(Value::List(items) | Value::Tuple(items)) => Some(
            items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(ToString::to_string)
                        .ok_or_else(|| IsolateError::config("'command' entries must be strings"))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => return Err(IsolateError::config("'command' must be a list")),
    };

    let files_tracked = string_set(dict, "files_tracked")?;
    let files_untracked = string_set(dict, "files_untracked")?;
    let files_touched = string_set(dict, "files_touched")?;

    let read_only = match dict.get("read_only") {
        None => None,
        Some(v) => Some(
            v.as_bool()
                .or_else(|| v.as_int().map(|n| n != 0))
                .ok_or_else(|| IsolateError::config("'read_only' must be a bool or 0/1"))?,
        ),
    };

    Ok(Variables {
        command,
        files_tracked,
        files_untracked,
        files_touched,
        read_only,
    })
}

fn string_set(dict: &IndexMap<String, Value>, key: &str) -> Result<BTreeSet<String>> {
    match dict.get(key) {
        None => Ok(BTreeSet::new()),
        Some(Value::List(items) | Value::Tuple(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| IsolateError::config(format!("'{key}' entries must be strings")))
            })
            .collect(),
        Some(_) => Err(IsolateError::config(format!("'{key}' must be a list"))),
    }
}

/// Builds the `else` clause's condition: a disjunction over every axis
/// value the original condition did NOT match, restricted to the axis (or
/// axes) the original condition referenced.
fn synthesize_else_condition(
    original: &Condition,
    domain_across_file: &std::collections::BTreeMap<String, BTreeSet<Literal>>,
) -> Condition {
    let axes = original.referenced_axes();
    let Some(axis) = axes.iter().next() else {
        return Condition::Not(Box::new(original.clone()));
    };
    if axes.len() > 1 {
        return Condition::Not(Box::new(original.clone()));
    }
    let matched = original.domain_of(axis);
    let full_domain = domain_across_file.get(axis).cloned().unwrap_or_default();
    let remaining: Vec<Literal> = full_domain.difference(&matched).cloned().collect();
    disjunction_over(axis, &remaining)
}

/// Builds the unconditional top-level clause's condition: a disjunction
/// over the full domain of every referenced axis in the file (§4.E item 2).
fn full_domain_condition(
    domain_across_file: &std::collections::BTreeMap<String, BTreeSet<Literal>>,
) -> Condition {
    if domain_across_file.is_empty() {
        return Condition::True;
    }
    let mut per_axis: Vec<Condition> = domain_across_file
        .iter()
        .map(|(axis, values)| disjunction_over(axis, &values.iter().cloned().collect::<Vec<_>>()))
        .collect();
    per_axis
        .drain(..)
        .reduce(|a, b| Condition::Or(Box::new(a), Box::new(b)))
        .unwrap_or(Condition::True)
}

fn disjunction_over(axis: &str, values: &[Literal]) -> Condition {
    values
        .iter()
        .map(|v| Condition::Eq(axis.to_string(), v.clone()))
        .reduce(|a, b| Condition::Or(Box::new(a), Box::new(b)))
        .unwrap_or(Condition::False)
}

/// Loads `isolate_path`, transitively resolving its `include`s depth-first
/// preorder, and returns the fully-unioned [`Configs`] (§4.E last
/// paragraph). Includes are resolved relative to the directory of the
/// including file.
pub fn load_with_includes(isolate_path: &Path) -> Result<Configs> {
    let dir = isolate_path.parent().unwrap_or_else(|| Path::new("."));
    let source = fs::read_to_string(isolate_path)
        .map_err(|e| IsolateError::io_with_path(e, isolate_path.to_path_buf()))?;
    let parsed = parse_isolate_file(&source)?;
    let own_ast = convert_old_to_new_format(&parsed)?;
    let own_configs = configs::load_isolate_as_config(&own_ast, parsed.comment.clone())?;

    let mut included = Configs::empty();
    for include_rel in &parsed.includes {
        let include_path = dir.join(include_rel);
        let child = load_with_includes(&include_path)?;
        included = configs::union(&included, Origin::Include, &child, Origin::Include)?;
    }

    configs::union(&own_configs, Origin::TopLevel, &included, Origin::Include)
}

#[cfg(test)]
#[path = "includes_tests.rs"]
mod tests;
