//! The command-line argument surface
//!
//! One switch per flattened, typed configuration entry: `--data.batch_size`,
//! `--optimizer.lr`, and so on. The surface is rebuilt from the current
//! configuration on every resolution pass, because each pass can unlock new
//! schema fields and therefore new switches.
//!
//! Parsing is lenient about unknown tokens: they are collected into a
//! residual list instead of failing, since a later pass may recognize them.
//! Type coercion failures on known switches are fatal.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::{FieldType, Value};

#[derive(Debug, Clone)]
struct Switch {
    ty: FieldType,
    default: Option<Value>,
}

/// The set of switches derived from a flat, typed configuration.
#[derive(Debug, Clone)]
pub struct ArgSurface {
    switches: BTreeMap<String, Switch>,
}

impl ArgSurface {
    /// Derives one switch per flat entry. An entry whose value is
    /// [`Value::Missing`] gets no default, making the switch mandatory: it
    /// must receive a value from some layer before resolution can finish.
    pub fn build(flat: &BTreeMap<String, (FieldType, Value)>) -> Self {
        let switches = flat
            .iter()
            .map(|(key, (ty, value))| {
                let default = (!value.is_missing()).then(|| value.clone());
                (key.clone(), Switch { ty: *ty, default })
            })
            .collect();
        Self { switches }
    }

    /// Parses a token list against this surface.
    ///
    /// Returns the resolved values (token values over defaults) together with
    /// the residual tokens that matched no switch. Both `--key value` and
    /// `--key=value` are accepted. Keys without a default that received no
    /// token are simply absent from the result; the caller decides whether
    /// that is fatal.
    pub fn parse_known(
        &self,
        tokens: &[String],
    ) -> Result<(BTreeMap<String, Value>, Vec<String>)> {
        let mut values: BTreeMap<String, Value> = self
            .switches
            .iter()
            .filter_map(|(key, switch)| {
                switch.default.clone().map(|default| (key.clone(), default))
            })
            .collect();

        let mut residual = Vec::new();
        let mut index = 0;
        while index < tokens.len() {
            let token = &tokens[index];
            let Some(rest) = token.strip_prefix("--") else {
                residual.push(token.clone());
                index += 1;
                continue;
            };
            let (name, inline) = match rest.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (rest, None),
            };
            let Some(switch) = self.switches.get(name) else {
                residual.push(token.clone());
                index += 1;
                continue;
            };

            let raw = match inline {
                Some(value) => value,
                None => {
                    index += 1;
                    tokens
                        .get(index)
                        .cloned()
                        .ok_or_else(|| Error::InvalidArgument {
                            key: name.to_string(),
                            reason: "expected a value".to_string(),
                        })?
                }
            };
            values.insert(name.to_string(), coerce(switch.ty, name, &raw)?);
            index += 1;
        }

        Ok((values, residual))
    }
}

/// Coerces a raw token to the declared type of its switch.
pub fn coerce(ty: FieldType, key: &str, raw: &str) -> Result<Value> {
    let invalid = |reason: String| Error::InvalidArgument {
        key: key.to_string(),
        reason,
    };
    match ty {
        FieldType::Bool => parse_bool_token(raw)
            .map(Value::Bool)
            .ok_or_else(|| invalid(format!("expected a boolean token, got '{raw}'"))),
        FieldType::Tuple => parse_tuple_literal(raw)
            .map(Value::Tuple)
            .ok_or_else(|| invalid(format!("'{raw}' is not a tuple literal"))),
        FieldType::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| invalid(format!("'{raw}' is not an integer: {e}"))),
        FieldType::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| invalid(format!("'{raw}' is not a float: {e}"))),
        FieldType::Str => Ok(Value::Str(raw.to_string())),
    }
}

/// Accepts the usual spellings of true/false, case-insensitively.
fn parse_bool_token(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Some(true),
        "no" | "false" | "f" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Parses a tuple literal such as `(1, 2.5, 'x')`.
///
/// `()` is the empty tuple and a single element needs a trailing comma:
/// `(1)` is a parenthesized scalar, not a tuple.
///
/// The grammar is flat: elements are int, float, bool, null or quoted-string
/// literals. Nested tuples and quoted strings containing commas are not
/// supported and fail coercion.
fn parse_tuple_literal(raw: &str) -> Option<Vec<Value>> {
    let inner = raw.trim().strip_prefix('(')?.strip_suffix(')')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    let trailing_comma = inner.ends_with(',');
    let parts: Vec<&str> = inner
        .trim_end_matches(',')
        .split(',')
        .map(str::trim)
        .collect();
    if parts.len() == 1 && !trailing_comma {
        return None;
    }
    parts.into_iter().map(parse_scalar_literal).collect()
}

fn parse_scalar_literal(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Int(int));
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Some(Value::Float(float));
    }
    match raw {
        "True" | "true" => return Some(Value::Bool(true)),
        "False" | "false" => return Some(Value::Bool(false)),
        "None" | "null" => return Some(Value::Null),
        _ => {}
    }
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Some(Value::Str(raw[1..raw.len() - 1].to_string()));
        }
    }
    None
}
