//! Recursive-descent parser for the restricted literal-expression grammar
//! isolate files are written in, plus the isolate-specific layer that pulls
//! `variables`/`conditions`/`includes` out of the parsed top-level dict.
//!
//! The grammar accepts nested dict/list/tuple/string/int/bool and the bare
//! names `True`/`False`. Nothing else is a valid name — there is no
//! arithmetic, no function call syntax, no variable lookup. This is a
//! security requirement (§4.B, §9), not an oversight: an isolate file is
//! untrusted input and must never reach a general expression evaluator.

use indexmap::IndexMap;

use crate::error::{IsolateError, Result};
use crate::value::Value;

/// One `conditions` list entry: `[expr, {'variables': {...}}]` or the
/// three-element legacy form `[expr, then, else]`.
#[derive(Debug, Clone)]
pub struct ConditionClause {
    pub expr_text: String,
    pub then: Value,
    pub else_: Option<Value>,
}

/// The top-level shape of an isolate file, before any legacy conversion.
#[derive(Debug, Clone, Default)]
pub struct ParsedIsolate {
    pub comment: Option<String>,
    pub variables: Option<Value>,
    pub includes: Vec<String>,
    pub conditions: Vec<ConditionClause>,
}

const TOP_LEVEL_KEYS: [&str; 3] = ["variables", "conditions", "includes"];

pub fn parse_isolate_file(source: &str) -> Result<ParsedIsolate> {
    let comment = leading_comment_block(source);
    let root = parse_value(source)?;
    let Value::Dict(dict) = root else {
        return Err(IsolateError::config(
            "isolate file must be a top-level dict literal",
        ));
    };

    for key in dict.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(IsolateError::config(format!(
                "unknown top-level key '{key}' (allowed: variables, conditions, includes)"
            )));
        }
    }

    let includes = match dict.get("includes") {
        None => Vec::new(),
        Some(Value::List(items) | Value::Tuple(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(ToString::to_string).ok_or_else(|| {
                    IsolateError::config("'includes' entries must be strings")
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(IsolateError::config("'includes' must be a list")),
    };

    let variables = dict.get("variables").cloned();

    let conditions = match dict.get("conditions") {
        None => Vec::new(),
        Some(Value::List(items) | Value::Tuple(items)) => {
            items.iter().map(parse_condition_clause).collect::<Result<Vec<_>>>()?
        }
        Some(_) => return Err(IsolateError::config("'conditions' must be a list")),
    };

    Ok(ParsedIsolate {
        comment,
        variables,
        includes,
        conditions,
    })
}

fn parse_condition_clause(entry: &Value) -> Result<ConditionClause> {
    let Some(items) = entry.as_list() else {
        return Err(IsolateError::config(
            "each 'conditions' entry must be a [expr, then, else?] list/tuple",
        ));
    };
    if items.len() != 2 && items.len() != 3 {
        return Err(IsolateError::config(
            "malformed condition triple: expected [expr, then] or [expr, then, else]",
        ));
    }
    let expr_text = items[0]
        .as_str()
        .ok_or_else(|| IsolateError::config("condition expression must be a string"))?
        .to_string();
    let then = items[1].clone();
    let else_ = if items.len() == 3 {
        Some(items[2].clone())
    } else {
        None
    };
    Ok(ConditionClause {
        expr_text,
        then,
        else_,
    })
}

/// Collects the contiguous run of `#`-prefixed lines (and blank lines
/// between them) at the very start of the file, matching the teacher's
/// "leading comment block" behavior for preserved headers.
fn leading_comment_block(source: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim_end();
        if trimmed.starts_with('#') {
            lines.push(trimmed.to_string());
        } else if trimmed.is_empty() && !lines.is_empty() {
            lines.push(String::new());
        } else {
            break;
        }
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Parses a single [`Value`] literal out of `text`, requiring the whole
/// (non-comment, non-whitespace) input to be consumed.
pub fn parse_value(text: &str) -> Result<Value> {
    let mut lexer = Lexer::new(text);
    let value = lexer.parse_value()?;
    lexer.skip_trivia();
    if lexer.peek().is_some() {
        return Err(IsolateError::config(format!(
            "trailing content after literal at byte offset {}",
            lexer.pos
        )));
    }
    Ok(value)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn error(&self, msg: impl Into<String>) -> IsolateError {
        IsolateError::config(format!("{} (at byte offset {})", msg.into(), self.pos))
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_trivia();
        if self.peek() == Some(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia();
        match self.peek() {
            Some('\'' | '"') => self.parse_string(),
            Some('[') => self.parse_list(),
            Some('(') => self.parse_tuple(),
            Some('{') => self.parse_dict(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_int(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_string(&mut self) -> Result<Value> {
        let quote = self.advance().expect("caller checked a quote is present");
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some(c) if c == quote => out.push(quote),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated escape sequence")),
                },
                Some(c) => out.push(c),
            }
        }
        Ok(Value::Str(out))
    }

    fn parse_int(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        let mut saw_digit = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            saw_digit = true;
            self.advance();
        }
        if !saw_digit {
            return Err(self.error("malformed integer literal"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| self.error("integer literal out of range"))
    }

    fn parse_name(&mut self) -> Result<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        match name.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            other => Err(self.error(format!(
                "unrecognized name '{other}' (only True/False constants are permitted)"
            ))),
        }
    }

    fn parse_list(&mut self) -> Result<Value> {
        self.expect('[')?;
        let items = self.parse_comma_separated(']')?;
        Ok(Value::List(items))
    }

    fn parse_tuple(&mut self) -> Result<Value> {
        self.expect('(')?;
        let items = self.parse_comma_separated(')')?;
        Ok(Value::Tuple(items))
    }

    fn parse_comma_separated(&mut self, close: char) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.advance();
                break;
            }
            items.push(self.parse_value()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(c) if c == close => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error(format!("expected ',' or '{close}'"))),
            }
        }
        Ok(items)
    }

    fn parse_dict(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = IndexMap::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.advance();
                break;
            }
            let key = match self.parse_value()? {
                Value::Str(s) => s,
                _ => return Err(self.error("dict keys must be string literals")),
            };
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
        Ok(Value::Dict(map))
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
