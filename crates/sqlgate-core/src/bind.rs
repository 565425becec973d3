//! Named-placeholder parameter binding.
//!
//! Turns a templated SQL string plus a mapping of named values into an
//! executable statement by escaping each value for its class and textually
//! substituting `:name` tokens. This is the one place raw input becomes
//! part of a statement, so every text value must pass through the engine's
//! escape before it is spliced in.
//!
//! Substitution is pure text replacement with no SQL lexing: a token inside
//! a string literal is replaced like any other. Token matching is
//! maximal-munch over `[A-Za-z0-9_]`, so a parameter name that is a prefix
//! of another can never clobber the longer name.

use crate::error::Result;
use crate::value::Value;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern is valid"));

/// An insertion-ordered mapping from placeholder name to raw value.
///
/// Consumed once per bind call; not retained by the facade.
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter. A repeated name replaces the earlier value in place,
    /// keeping its original position.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
        self
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Params::new(), |params, (n, v)| params.set(n, v))
    }
}

/// Render one value as a SQL literal.
///
/// `escape` is the engine's escaping routine, applied to text values only;
/// the rendered text is wrapped in single quotes here. NULL becomes the
/// literal `null`, numbers pass through unquoted, booleans become
/// `TRUE`/`FALSE`, bytes become a `X'..'` blob literal.
pub fn render_value(
    value: &Value,
    escape: &mut dyn FnMut(&str) -> Result<String>,
) -> Result<String> {
    Ok(match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Text(s) => format!("'{}'", escape(s)?),
        Value::Bytes(b) => {
            let mut hex = String::with_capacity(b.len() * 2 + 3);
            hex.push_str("X'");
            for byte in b {
                hex.push_str(&format!("{byte:02X}"));
            }
            hex.push('\'');
            hex
        }
    })
}

/// Substitute `:name` tokens in `sql` with already-rendered values.
///
/// Every occurrence of a present name is replaced. Absent names are
/// replaced with the literal `null` when `null_missing`, otherwise left
/// verbatim.
pub fn substitute(sql: &str, rendered: &[(String, String)], null_missing: bool) -> String {
    let lookup: HashMap<&str, &str> = rendered
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect();

    PLACEHOLDER
        .replace_all(sql, |caps: &Captures| {
            match lookup.get(&caps[1]) {
                Some(value) => (*value).to_string(),
                None if null_missing => "null".to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
