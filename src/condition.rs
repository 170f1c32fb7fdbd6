//! Boolean condition expressions: `OS=="linux" and not chromeos==1`.
//!
//! This is a second, smaller grammar than [`crate::value`]'s literal
//! language — conditions appear as plain strings inside a `conditions`
//! entry, not as dict/list literals, so they get their own tokenizer.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{IsolateError, Result};

/// The right-hand side of an `==` atom. Only string and integer literals
/// appear here (§4.C) — booleans never show up as axis values in practice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Literal {
    Str(String),
    Int(i64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

/// A concrete assignment of one value to every axis a condition might
/// reference. Lookup is linear since bindings are small (a handful of
/// axes at most).
#[derive(Debug, Clone, Default)]
pub struct Binding {
    pub entries: Vec<(String, Literal)>,
}

impl Binding {
    #[must_use]
    pub fn get(&self, axis: &str) -> Option<&Literal> {
        self.entries.iter().find(|(n, _)| n == axis).map(|(_, v)| v)
    }
}

/// A boolean expression over axis equality atoms.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Eq(String, Literal),
    True,
    False,
}

impl Condition {
    /// The set of axis names this expression mentions.
    #[must_use]
    pub fn referenced_axes(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_axes(&mut out);
        out
    }

    fn collect_axes(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_axes(out);
                b.collect_axes(out);
            }
            Self::Not(inner) => inner.collect_axes(out),
            Self::Eq(name, _) => {
                out.insert(name.clone());
            }
            Self::True | Self::False => {}
        }
    }

    /// The set of literal values that appear as the right-hand side of an
    /// `axis==value` atom for the given axis name.
    #[must_use]
    pub fn domain_of(&self, axis: &str) -> BTreeSet<Literal> {
        let mut out = BTreeSet::new();
        self.collect_domain(axis, &mut out);
        out
    }

    fn collect_domain(&self, axis: &str, out: &mut BTreeSet<Literal>) {
        match self {
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_domain(axis, out);
                b.collect_domain(axis, out);
            }
            Self::Not(inner) => inner.collect_domain(axis, out),
            Self::Eq(name, lit) if name == axis => {
                out.insert(lit.clone());
            }
            Self::Eq(..) | Self::True | Self::False => {}
        }
    }

    #[must_use]
    pub fn eval(&self, binding: &Binding) -> bool {
        match self {
            Self::And(a, b) => a.eval(binding) && b.eval(binding),
            Self::Or(a, b) => a.eval(binding) || b.eval(binding),
            Self::Not(inner) => !inner.eval(binding),
            Self::Eq(name, lit) => binding.get(name) == Some(lit),
            Self::True => true,
            Self::False => false,
        }
    }

    /// Canonical textual form, used by `convert_map_to_conditions` (§4.D.6)
    /// to sort and deduplicate generated clauses.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::And(a, b) => format!("({} and {})", a.render(), b.render()),
            Self::Or(a, b) => format!("({} or {})", a.render(), b.render()),
            Self::Not(inner) => format!("not {}", inner.render()),
            Self::Eq(name, lit) => format!("{name}=={lit}"),
            Self::True => "True".to_string(),
            Self::False => "False".to_string(),
        }
    }
}

pub fn parse_condition(text: &str) -> Result<Condition> {
    let tokens = tokenize(text)?;
    let mut parser = CondParser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(IsolateError::config(format!(
            "trailing tokens in condition expression: {text}"
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    EqEq,
    LParen,
    RParen,
    Str(String),
    Int(i64),
    BoolLit(bool),
    And,
    Or,
    Not,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c == '=' && chars.get(i + 1) == Some(&'=') {
            tokens.push(Token::EqEq);
            i += 2;
        } else if c == '\'' || c == '"' {
            let quote = c;
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && chars[j] != quote {
                j += 1;
            }
            if j >= chars.len() {
                return Err(IsolateError::config(format!(
                    "unterminated string in condition: {text}"
                )));
            }
            tokens.push(Token::Str(chars[start..j].iter().collect()));
            i = j + 1;
        } else if c == '-' || c.is_ascii_digit() {
            let start = i;
            if c == '-' {
                i += 1;
            }
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let n = text
                .parse::<i64>()
                .map_err(|_| IsolateError::config(format!("bad integer in condition: {text}")))?;
            tokens.push(Token::Int(n));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "True" => Token::BoolLit(true),
                "False" => Token::BoolLit(false),
                _ => Token::Ident(word),
            });
        } else {
            return Err(IsolateError::config(format!(
                "unexpected character '{c}' in condition: {text}"
            )));
        }
    }
    Ok(tokens)
}

struct CondParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl CondParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<Condition> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Condition::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Condition> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Condition::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Condition> {
        if self.peek() == Some(&Token::Not) {
            self.bump();
            return Ok(Condition::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Condition> {
        match self.bump() {
            Some(Token::BoolLit(true)) => Ok(Condition::True),
            Some(Token::BoolLit(false)) => Ok(Condition::False),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(IsolateError::config("unmatched '(' in condition")),
                }
            }
            Some(Token::Ident(name)) => {
                match self.bump() {
                    Some(Token::EqEq) => {}
                    _ => return Err(IsolateError::config(format!("expected '==' after '{name}'"))),
                }
                match self.bump() {
                    Some(Token::Str(s)) => Ok(Condition::Eq(name, Literal::Str(s))),
                    Some(Token::Int(n)) => Ok(Condition::Eq(name, Literal::Int(n))),
                    _ => Err(IsolateError::config(format!(
                        "expected string or integer literal after '{name}=='"
                    ))),
                }
            }
            other => Err(IsolateError::config(format!(
                "unexpected token in condition: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
