//! `<(NAME)` textual substitution (§4.F).
//!
//! Applied after condition evaluation and before manifest assembly. Lookup
//! order is path-variables, then extra-variables, then config-variables;
//! an unknown name is a config error, not a silent no-op.

use std::collections::BTreeMap;

use crate::error::{IsolateError, Result};

/// Replaces every `<(NAME)` occurrence in `text` using the three variable
/// maps, in lookup-precedence order.
pub fn substitute(
    text: &str,
    path_variables: &BTreeMap<String, String>,
    extra_variables: &BTreeMap<String, String>,
    config_variables: &BTreeMap<String, String>,
) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1) == Some(&b'(') {
            let Some(close) = text[i + 2..].find(')') else {
                return Err(IsolateError::config(format!(
                    "unterminated '<(' substitution in: {text}"
                )));
            };
            let name = &text[i + 2..i + 2 + close];
            let value = path_variables
                .get(name)
                .or_else(|| extra_variables.get(name))
                .or_else(|| config_variables.get(name))
                .ok_or_else(|| {
                    IsolateError::config(format!("unresolved substitution variable '{name}'"))
                })?;
            out.push_str(value);
            i += 2 + close + 1;
        } else {
            let ch_len = text[i..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&text[i..i + ch_len]);
            i += ch_len;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "substitution_tests.rs"]
mod tests;
