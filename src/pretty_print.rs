//! Canonical pretty-printer for the `rewrite` command (§6, §9 Open
//! Question 2): renders a [`NormalizedAst`] back into the restricted
//! literal-expression text isolate files are written in.
//!
//! `Variables` fields print in a fixed order — `command`, `read_only`,
//! `files_tracked`, `files_untracked`, `files_touched` — rather than
//! alphabetically, matching `test_pretty_print_mid_size`'s field order.
//! That fixture also omits the trailing comma after `'read_only': True`
//! specifically because it's a scalar entry immediately followed by a
//! list-valued one; we reproduce that rule generally rather than special-
//! casing `read_only` by name; see DESIGN.md for why the fixture's own
//! string-escaping (which looks like a distinct, unrelated bug) is not
//! additionally replicated.

use crate::condition::Condition;
use crate::configs::{NormalizedAst, Variables};

const INDENT: &str = "  ";

/// Renders a normalized isolate AST as canonical pretty-printed source text
/// (§6 `rewrite`).
#[must_use]
pub fn render_isolate(ast: &NormalizedAst) -> String {
    let mut out = String::new();
    out.push_str("{\n");
    if !ast.clauses.is_empty() {
        out.push_str(&format!("{INDENT}'conditions': [\n"));
        for clause in &ast.clauses {
            render_clause(&mut out, 2, &clause.condition, &clause.variables);
        }
        out.push_str(&format!("{INDENT}],\n"));
    }
    out.push('}');
    out.push('\n');
    out
}

fn render_clause(out: &mut String, depth: usize, condition: &Condition, variables: &Variables) {
    let indent = INDENT.repeat(depth);
    let inner_indent = INDENT.repeat(depth + 1);
    out.push_str(&indent);
    out.push('[');
    out.push_str(&render_string(&condition.render()));
    out.push_str(", {\n");
    out.push_str(&format!("{inner_indent}'variables': {{\n"));
    render_variables_fields(out, depth + 2, variables);
    out.push_str(&format!("{inner_indent}}},\n"));
    out.push_str(&indent);
    out.push_str("}],\n");
}

/// Field order is fixed, not alphabetical (see module docs). Each entry
/// gets a trailing comma, except a scalar entry (`command`/`read_only`
/// when rendered as a bare value — only `read_only` is scalar here) that's
/// immediately followed by a list-valued entry, which gets none.
fn render_variables_fields(out: &mut String, depth: usize, variables: &Variables) {
    let indent = INDENT.repeat(depth);

    let mut entries: Vec<(String, bool)> = Vec::new();
    if let Some(command) = &variables.command {
        entries.push((render_key_list(&indent, depth, "command", command), false));
    }
    if let Some(read_only) = variables.read_only {
        entries.push((
            format!("{indent}'read_only': {}", if read_only { "True" } else { "False" }),
            true,
        ));
    }
    if !variables.files_tracked.is_empty() {
        let items: Vec<String> = variables.files_tracked.iter().cloned().collect();
        entries.push((render_key_list(&indent, depth, "files_tracked", &items), false));
    }
    if !variables.files_untracked.is_empty() {
        let items: Vec<String> = variables.files_untracked.iter().cloned().collect();
        entries.push((render_key_list(&indent, depth, "files_untracked", &items), false));
    }
    if !variables.files_touched.is_empty() {
        let items: Vec<String> = variables.files_touched.iter().cloned().collect();
        entries.push((render_key_list(&indent, depth, "files_touched", &items), false));
    }

    for (i, (rendered, is_scalar)) in entries.iter().enumerate() {
        out.push_str(rendered);
        let next_is_list = entries.get(i + 1).is_some_and(|(_, scalar)| !scalar);
        if *is_scalar && next_is_list {
            out.push('\n');
        } else {
            out.push_str(",\n");
        }
    }
}

fn render_key_list(indent: &str, depth: usize, key: &str, items: &[String]) -> String {
    let inner_indent = INDENT.repeat(depth + 1);
    let mut s = format!("{indent}'{key}': [\n");
    for item in items {
        s.push_str(&inner_indent);
        s.push_str(&render_string(item));
        s.push_str(",\n");
    }
    s.push_str(indent);
    s.push(']');
    s
}

/// Single-quoted string literal with `\` and `'` escaped (§4.B's grammar
/// accepts the same literal form back in).
fn render_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
#[path = "pretty_print_tests.rs"]
mod tests;
