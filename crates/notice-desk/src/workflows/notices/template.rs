//! `{name}` token handling for notice templates.
//!
//! A token is an opening brace, one or more characters other than `}`, and a
//! closing brace. Substitution is a single left-to-right pass: bound values are
//! copied verbatim and never scanned for further tokens, and tokens without a
//! binding are left in place so a partly filled draft stays editable.

use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::Officer;

/// The binding names every rendered notice receives, in palette order.
pub const BINDING_NAMES: [&str; 8] = [
    "officer.name",
    "officer.organization",
    "officer.state",
    "officer.branch",
    "officer.office",
    "officer.badgeNumber",
    "sender.name",
    "notice.date",
];

/// Name to value mapping used to resolve tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Bindings(BTreeMap<String, String>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full notice namespace for `officer`. Absent officer fields bind to "".
    pub fn for_notice(officer: &Officer, sender_name: &str, notice_date: &str) -> Self {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();

        let mut bindings = Self::new();
        bindings.insert("officer.name", officer.name.clone());
        bindings.insert("officer.organization", officer.organization.clone());
        bindings.insert("officer.state", officer.state.code());
        bindings.insert("officer.branch", optional(&officer.branch));
        bindings.insert("officer.office", optional(&officer.office));
        bindings.insert("officer.badgeNumber", optional(&officer.badge_number));
        bindings.insert("sender.name", sender_name);
        bindings.insert("notice.date", notice_date);
        bindings
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Bindings
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}

/// Distinct token names in order of first occurrence. Case-sensitive.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for piece in Pieces::new(text) {
        if let Piece::Token(name) = piece {
            if !names.iter().any(|seen| seen == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Replace every bound `{name}` with its value; unbound tokens are kept as-is.
pub fn substitute(text: &str, bindings: &Bindings) -> String {
    if bindings.is_empty() {
        return text.to_string();
    }

    let mut rendered = String::with_capacity(text.len());
    for piece in Pieces::new(text) {
        match piece {
            Piece::Literal(literal) => rendered.push_str(literal),
            Piece::Token(name) => match bindings.get(name) {
                Some(value) => rendered.push_str(value),
                None => {
                    rendered.push('{');
                    rendered.push_str(name);
                    rendered.push('}');
                }
            },
        }
    }
    rendered
}

#[derive(Debug, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Token(&'a str),
}

struct Pieces<'a> {
    rest: &'a str,
}

impl<'a> Pieces<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let rest = self.rest;
        match rest.find('{') {
            None => {
                self.rest = "";
                Some(Piece::Literal(rest))
            }
            Some(0) => match rest[1..].find('}') {
                Some(len) if len > 0 => {
                    self.rest = &rest[len + 2..];
                    Some(Piece::Token(&rest[1..len + 1]))
                }
                // `{}` or an unterminated brace is plain text.
                _ => {
                    self.rest = &rest[1..];
                    Some(Piece::Literal(&rest[..1]))
                }
            },
            Some(start) => {
                self.rest = &rest[start..];
                Some(Piece::Literal(&rest[..start]))
            }
        }
    }
}
