//! The configuration algebra: per-binding resolved variables, merging two
//! tables (`union`), projecting and inverting them, minimizing file-set
//! conflicts (`reduce_inputs`), and the inverse transform back into a
//! normalized clause list (`convert_map_to_conditions`). This is the
//! algorithmic heart of the compiler (§4.D).

use std::collections::{BTreeMap, BTreeSet};

use crate::condition::{Binding, Condition, Literal};
use crate::error::{IsolateError, Result};

/// Where a [`Variables`] contribution came from, for command-conflict
/// precedence during [`union`] (§4.D.2, §8.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    TopLevel,
    Include,
}

/// The per-configuration payload (§3). File sets are kept sorted so that
/// accumulation order never affects the resulting manifest (§8.6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    pub command: Option<Vec<String>>,
    pub files_tracked: BTreeSet<String>,
    pub files_untracked: BTreeSet<String>,
    pub files_touched: BTreeSet<String>,
    pub read_only: Option<bool>,
}

impl Variables {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command.is_none()
            && self.files_tracked.is_empty()
            && self.files_untracked.is_empty()
            && self.files_touched.is_empty()
            && self.read_only.is_none()
    }
}

/// One normalized `(condition, variables)` clause, after legacy/else
/// resolution (§4.E) has already happened.
#[derive(Debug, Clone)]
pub struct NormalizedClause {
    pub condition: Condition,
    pub variables: Variables,
}

/// A fully normalized isolate file, ready for [`load_isolate_as_config`].
///
/// Top-level `variables` blocks and legacy `else` arms are already folded
/// into `clauses` as explicit (possibly `Condition::True`) entries by
/// [`crate::includes::convert_old_to_new_format`] — there is no separate
/// "unconditional defaults" slot to keep in sync with that.
#[derive(Debug, Clone, Default)]
pub struct NormalizedAst {
    pub clauses: Vec<NormalizedClause>,
}

/// A binding tuple, ordered per [`Configs::axes`].
pub type BindingKey = Vec<Literal>;

/// The resolved, per-configuration table (§3, §9).
#[derive(Debug, Clone, Default)]
pub struct Configs {
    pub axes: Vec<String>,
    pub domain_by_axis: BTreeMap<String, BTreeSet<Literal>>,
    pub by_binding: BTreeMap<BindingKey, Variables>,
    pub file_comment: Option<String>,
}

impl Configs {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    fn binding_for(&self, key: &BindingKey) -> Binding {
        Binding {
            entries: self
                .axes
                .iter()
                .cloned()
                .zip(key.iter().cloned())
                .collect(),
        }
    }

    /// Drops bindings whose [`Variables`] ended up empty (§4.D.3).
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<BindingKey, Variables> {
        self.by_binding
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// §4.D.1 — builds the per-binding table from a normalized single-file AST.
/// All of a file's own clauses are [`Origin::TopLevel`]; callers wire
/// included files in with [`Origin::Include`] via [`union`].
pub fn load_isolate_as_config(ast: &NormalizedAst, comment: Option<String>) -> Result<Configs> {
    let mut axes = BTreeSet::new();
    for clause in &ast.clauses {
        axes.extend(clause.condition.referenced_axes());
    }
    let axes: Vec<String> = axes.into_iter().collect();

    let mut domain_by_axis: BTreeMap<String, BTreeSet<Literal>> = BTreeMap::new();
    for axis in &axes {
        let mut domain = BTreeSet::new();
        for clause in &ast.clauses {
            domain.extend(clause.condition.domain_of(axis));
        }
        domain_by_axis.insert(axis.clone(), domain);
    }

    let mut by_binding = BTreeMap::new();
    for key in cartesian_product(&axes, &domain_by_axis) {
        let binding = Binding {
            entries: axes.iter().cloned().zip(key.iter().cloned()).collect(),
        };
        let mut acc = Variables::default();
        for clause in &ast.clauses {
            if clause.condition.eval(&binding) {
                acc = merge_variables(
                    &acc,
                    Origin::TopLevel,
                    &clause.variables,
                    Origin::TopLevel,
                )?;
            }
        }
        by_binding.insert(key, acc);
    }

    Ok(Configs {
        axes,
        domain_by_axis,
        by_binding,
        file_comment: comment,
    })
}

fn cartesian_product(
    axes: &[String],
    domain_by_axis: &BTreeMap<String, BTreeSet<Literal>>,
) -> Vec<BindingKey> {
    let mut result: Vec<BindingKey> = vec![Vec::new()];
    for axis in axes {
        let values: Vec<Literal> = domain_by_axis
            .get(axis)
            .map(|d| d.iter().cloned().collect())
            .unwrap_or_default();
        let mut next = Vec::with_capacity(result.len() * values.len().max(1));
        for prefix in &result {
            for v in &values {
                let mut tuple = prefix.clone();
                tuple.push(v.clone());
                next.push(tuple);
            }
        }
        result = next;
    }
    result
}

/// §4.D.2 — merges two `Configs`, expanding axis domains where one side
/// doesn't know about an axis the other does, then merging `Variables` per
/// shared binding.
pub fn union(a: &Configs, a_origin: Origin, b: &Configs, b_origin: Origin) -> Result<Configs> {
    let mut axes: BTreeSet<String> = a.axes.iter().cloned().collect();
    axes.extend(b.axes.iter().cloned());
    let axes: Vec<String> = axes.into_iter().collect();

    let mut domain_by_axis = BTreeMap::new();
    for axis in &axes {
        let mut domain = BTreeSet::new();
        if let Some(d) = a.domain_by_axis.get(axis) {
            domain.extend(d.iter().cloned());
        }
        if let Some(d) = b.domain_by_axis.get(axis) {
            domain.extend(d.iter().cloned());
        }
        domain_by_axis.insert(axis.clone(), domain);
    }

    let expanded_a = expand_to_axes(a, &axes, &domain_by_axis);
    let expanded_b = expand_to_axes(b, &axes, &domain_by_axis);

    let mut by_binding: BTreeMap<BindingKey, Variables> = BTreeMap::new();
    let mut keys: BTreeSet<BindingKey> = expanded_a.keys().cloned().collect();
    keys.extend(expanded_b.keys().cloned());

    for key in keys {
        let merged = match (expanded_a.get(&key), expanded_b.get(&key)) {
            (Some(av), Some(bv)) => merge_variables(av, a_origin, bv, b_origin)?,
            (Some(av), None) => av.clone(),
            (None, Some(bv)) => bv.clone(),
            (None, None) => unreachable!("key came from one of the two maps"),
        };
        by_binding.insert(key, merged);
    }

    Ok(Configs {
        axes,
        domain_by_axis,
        by_binding,
        file_comment: a.file_comment.clone().or_else(|| b.file_comment.clone()),
    })
}

/// Re-keys a `Configs`' bindings onto a superset axis list, expanding by
/// Cartesian product over any newly-introduced axis's domain (§4.D.2).
fn expand_to_axes(
    configs: &Configs,
    target_axes: &[String],
    domain_by_axis: &BTreeMap<String, BTreeSet<Literal>>,
) -> BTreeMap<BindingKey, Variables> {
    let new_axes: Vec<&String> = target_axes
        .iter()
        .filter(|a| !configs.axes.contains(a))
        .collect();

    let mut out = BTreeMap::new();
    for (key, vars) in &configs.by_binding {
        let own_binding: BTreeMap<&str, &Literal> = configs
            .axes
            .iter()
            .map(String::as_str)
            .zip(key.iter())
            .collect();

        let expansions = cartesian_product(
            &new_axes.iter().map(|s| (*s).clone()).collect::<Vec<_>>(),
            domain_by_axis,
        );
        for extra in expansions {
            let mut full = Vec::with_capacity(target_axes.len());
            let mut extra_iter = extra.iter();
            for axis in target_axes {
                if let Some(lit) = own_binding.get(axis.as_str()) {
                    full.push((*lit).clone());
                } else {
                    full.push(extra_iter.next().expect("new axis value present").clone());
                }
            }
            out.insert(full, vars.clone());
        }
    }
    out
}

/// Merges two `Variables` blocks per §4.D.2's per-field rules.
pub fn merge_variables(
    a: &Variables,
    a_origin: Origin,
    b: &Variables,
    b_origin: Origin,
) -> Result<Variables> {
    Ok(Variables {
        command: merge_command(a.command.as_ref(), a_origin, b.command.as_ref(), b_origin)?,
        files_tracked: a
            .files_tracked
            .union(&b.files_tracked)
            .cloned()
            .collect(),
        files_untracked: a
            .files_untracked
            .union(&b.files_untracked)
            .cloned()
            .collect(),
        files_touched: a
            .files_touched
            .union(&b.files_touched)
            .cloned()
            .collect(),
        read_only: b.read_only.or(a.read_only),
    })
}

fn merge_command(
    a: Option<&Vec<String>>,
    a_origin: Origin,
    b: Option<&Vec<String>>,
    b_origin: Origin,
) -> Result<Option<Vec<String>>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(x), None) => Ok(Some(x.clone())),
        (None, Some(y)) => Ok(Some(y.clone())),
        (Some(x), Some(y)) if x == y => Ok(Some(x.clone())),
        (Some(x), Some(y)) => match (a_origin, b_origin) {
            (Origin::TopLevel, Origin::TopLevel) => Err(IsolateError::config(format!(
                "duplicate command for configuration: {x:?} vs {y:?}"
            ))),
            (Origin::TopLevel, Origin::Include) => Ok(Some(x.clone())),
            (Origin::Include, Origin::TopLevel) => Ok(Some(y.clone())),
            (Origin::Include, Origin::Include) => Ok(Some(y.clone())),
        },
    }
}

/// §4.D.4 — separate per-variable inverted maps, since each variable's
/// element type differs (whole command tuples vs. individual paths vs. a
/// scalar flag).
#[derive(Debug, Clone, Default)]
pub struct Inverted {
    pub command: BTreeMap<Vec<String>, BTreeSet<BindingKey>>,
    pub files_tracked: BTreeMap<String, BTreeSet<BindingKey>>,
    pub files_untracked: BTreeMap<String, BTreeSet<BindingKey>>,
    pub files_touched: BTreeMap<String, BTreeSet<BindingKey>>,
    pub read_only: BTreeMap<bool, BTreeSet<BindingKey>>,
}

pub fn invert_map(flat: &BTreeMap<BindingKey, Variables>) -> Inverted {
    let mut inverted = Inverted::default();
    for (key, vars) in flat {
        if let Some(cmd) = &vars.command {
            inverted
                .command
                .entry(cmd.clone())
                .or_default()
                .insert(key.clone());
        }
        for path in &vars.files_tracked {
            inverted
                .files_tracked
                .entry(path.clone())
                .or_default()
                .insert(key.clone());
        }
        for path in &vars.files_untracked {
            inverted
                .files_untracked
                .entry(path.clone())
                .or_default()
                .insert(key.clone());
        }
        for path in &vars.files_touched {
            inverted
                .files_touched
                .entry(path.clone())
                .or_default()
                .insert(key.clone());
        }
        if let Some(ro) = vars.read_only {
            inverted.read_only.entry(ro).or_default().insert(key.clone());
        }
    }
    inverted
}

/// §4.D.5 — minimizes file-set conflicts via fixpoint iteration over three
/// rules: directory subsumption, tracked-over-untracked precedence, and
/// touched-is-weakest.
pub fn reduce_inputs(inverted: &Inverted) -> Inverted {
    let mut current = inverted.clone();
    loop {
        let next = reduce_once(&current);
        if next.files_tracked == current.files_tracked
            && next.files_untracked == current.files_untracked
            && next.files_touched == current.files_touched
        {
            return next;
        }
        current = next;
    }
}

fn reduce_once(inverted: &Inverted) -> Inverted {
    let mut out = inverted.clone();
    subsume_directories(&mut out.files_tracked);
    subsume_directories(&mut out.files_untracked);
    subsume_directories(&mut out.files_touched);

    apply_tracked_over_untracked(&mut out.files_tracked, &mut out.files_untracked);
    apply_touched_weakest(&out.files_tracked, &out.files_untracked, &mut out.files_touched);
    out
}

/// Drops a file/subdirectory entry when an ancestor directory entry (one
/// ending in `/`) already covers it for a superset of its configurations.
fn subsume_directories(family: &mut BTreeMap<String, BTreeSet<BindingKey>>) {
    let dirs: Vec<(String, BTreeSet<BindingKey>)> = family
        .iter()
        .filter(|(p, _)| p.ends_with('/'))
        .map(|(p, s)| (p.clone(), s.clone()))
        .collect();
    if dirs.is_empty() {
        return;
    }
    let to_remove: Vec<String> = family
        .iter()
        .filter(|(path, set)| {
            dirs.iter().any(|(dir_path, dir_set)| {
                path.as_str() != dir_path.as_str()
                    && path.starts_with(dir_path.as_str())
                    && set.is_subset(dir_set)
            })
        })
        .map(|(p, _)| p.clone())
        .collect();
    for path in to_remove {
        family.remove(&path);
    }
}

fn apply_tracked_over_untracked(
    tracked: &mut BTreeMap<String, BTreeSet<BindingKey>>,
    untracked: &mut BTreeMap<String, BTreeSet<BindingKey>>,
) {
    let shared_paths: Vec<String> = tracked
        .keys()
        .filter(|p| untracked.contains_key(p.as_str()))
        .cloned()
        .collect();
    for path in shared_paths {
        let tracked_set = tracked.get(&path).cloned().unwrap_or_default();
        if let Some(untracked_set) = untracked.get_mut(&path) {
            let remaining: BTreeSet<BindingKey> =
                untracked_set.difference(&tracked_set).cloned().collect();
            if remaining.is_empty() {
                untracked.remove(&path);
            } else {
                *untracked_set = remaining;
            }
        }
    }
}

fn apply_touched_weakest(
    tracked: &BTreeMap<String, BTreeSet<BindingKey>>,
    untracked: &BTreeMap<String, BTreeSet<BindingKey>>,
    touched: &mut BTreeMap<String, BTreeSet<BindingKey>>,
) {
    let paths: Vec<String> = touched.keys().cloned().collect();
    for path in paths {
        let mut remaining = touched.get(&path).cloned().unwrap_or_default();
        if let Some(s) = tracked.get(&path) {
            remaining = remaining.difference(s).cloned().collect();
        }
        if let Some(s) = untracked.get(&path) {
            remaining = remaining.difference(s).cloned().collect();
        }
        for (dir_path, dir_set) in untracked {
            if dir_path.ends_with('/') && path.starts_with(dir_path.as_str()) {
                remaining = remaining.difference(dir_set).cloned().collect();
            }
        }
        if remaining.is_empty() {
            touched.remove(&path);
        } else {
            touched.insert(path, remaining);
        }
    }
}

/// §4.D.6 — the inverse of loading: groups entries that share an identical
/// binding set into one clause, renders that set as a boolean expression.
/// The original implementation always emits a condition even when a set
/// spans the full domain (never folding back to a bare top-level
/// `variables` block); this mirrors that rather than "fixing" it (§9 Open
/// Question).
#[must_use]
pub fn convert_map_to_conditions(inverted: &Inverted, axes: &[String]) -> Vec<NormalizedClause> {
    let mut by_set: BTreeMap<BTreeSet<BindingKey>, Variables> = BTreeMap::new();

    for (cmd, set) in &inverted.command {
        by_set.entry(set.clone()).or_default().command = Some(cmd.clone());
    }
    for (path, set) in &inverted.files_tracked {
        by_set
            .entry(set.clone())
            .or_default()
            .files_tracked
            .insert(path.clone());
    }
    for (path, set) in &inverted.files_untracked {
        by_set
            .entry(set.clone())
            .or_default()
            .files_untracked
            .insert(path.clone());
    }
    for (path, set) in &inverted.files_touched {
        by_set
            .entry(set.clone())
            .or_default()
            .files_touched
            .insert(path.clone());
    }
    for (ro, set) in &inverted.read_only {
        by_set.entry(set.clone()).or_default().read_only = Some(*ro);
    }

    let mut clauses: Vec<NormalizedClause> = by_set
        .into_iter()
        .map(|(set, variables)| NormalizedClause {
            condition: set_to_condition(axes, &set),
            variables,
        })
        .collect();
    clauses.sort_by(|a, b| a.condition.render().cmp(&b.condition.render()));
    clauses
}

fn set_to_condition(axes: &[String], set: &BTreeSet<BindingKey>) -> Condition {
    let mut disjuncts: Vec<Condition> = set.iter().map(|tuple| binding_conjunction(axes, tuple)).collect();
    disjuncts.sort_by(|a, b| a.render().cmp(&b.render()));
    disjuncts
        .into_iter()
        .reduce(|a, b| Condition::Or(Box::new(a), Box::new(b)))
        .unwrap_or(Condition::False)
}

fn binding_conjunction(axes: &[String], tuple: &[Literal]) -> Condition {
    axes.iter()
        .zip(tuple.iter())
        .map(|(name, lit)| Condition::Eq(name.clone(), lit.clone()))
        .reduce(|a, b| Condition::And(Box::new(a), Box::new(b)))
        .unwrap_or(Condition::True)
}

#[cfg(test)]
#[path = "configs_tests.rs"]
mod tests;
