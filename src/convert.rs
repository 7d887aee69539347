//! Representation converters
//!
//! A configuration exists in four interchangeable shapes:
//!
//! - typed: nested [`Value::Instance`]s, the shape the caller consumes
//! - plain: nested [`Value::Map`]s, the shape the file layer works with
//! - typed-argument: every terminal paired with its runtime [`FieldType`],
//!   the shape schema expansion and the argument surface work with
//! - flat: dot-joined keys mapping to terminals, the shape parsing works with
//!
//! All converters are pure and return freshly built structures.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::value::{FieldType, Value, CLASS_SUFFIX};

/// The typed-argument form: terminals annotated with their runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Leaf(FieldType, Value),
    Map(BTreeMap<String, ArgValue>),
}

/// Converts the typed form to the plain form by replacing every schema
/// instance with the mapping of its fields, recursively.
pub fn to_plain(cfg: &Value) -> Value {
    match cfg {
        Value::Instance(instance) => Value::Map(
            instance
                .fields
                .iter()
                .map(|(key, val)| (key.clone(), to_plain(val)))
                .collect(),
        ),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(key, val)| (key.clone(), to_plain(val)))
                .collect(),
        ),
        terminal => terminal.clone(),
    }
}

/// Converts the plain form back to the typed form.
///
/// Every nested mapping must have a `<key>_class` sibling naming the schema
/// to instantiate. The nested value is converted first, then the instance is
/// constructed from the result, so instances are built leaves-first.
pub fn to_typed(
    entries: &BTreeMap<String, Value>,
    registry: &Registry,
) -> Result<BTreeMap<String, Value>> {
    let mut out = BTreeMap::new();
    for (key, val) in entries {
        match val {
            Value::Map(inner) => {
                let fields = to_typed(inner, registry)?;

                let selector = format!("{key}{CLASS_SUFFIX}");
                let name = match entries.get(&selector) {
                    Some(Value::Str(name)) => name,
                    Some(Value::Missing) | None => {
                        return Err(Error::UnresolvedSelector(selector))
                    }
                    Some(other) => return Err(Error::UnknownSchema(format!("{other:?}"))),
                };
                let schema = registry
                    .lookup(name)
                    .ok_or_else(|| Error::UnknownSchema(name.clone()))?;
                out.insert(key.clone(), Value::Instance(schema.instantiate(fields)?));
            }
            _ => {
                out.insert(key.clone(), val.clone());
            }
        }
    }
    Ok(out)
}

/// Pairs every terminal with its runtime type; mappings recurse.
///
/// Type information is lost each time the parser produces plain values, so
/// this runs again at the start of every resolution pass.
pub fn to_args(entries: &BTreeMap<String, Value>) -> BTreeMap<String, ArgValue> {
    let mut out = BTreeMap::new();
    for (key, val) in entries {
        let arg = match val {
            Value::Map(inner) => ArgValue::Map(to_args(inner)),
            Value::Instance(instance) => ArgValue::Map(to_args(&instance.fields)),
            terminal => {
                // runtime_type is Some for every terminal
                let ty = terminal.runtime_type().unwrap_or(FieldType::Str);
                ArgValue::Leaf(ty, terminal.clone())
            }
        };
        out.insert(key.clone(), arg);
    }
    out
}

/// Flattens a nested configuration by joining keys of nested mappings
/// with `.`:
///
/// ```
/// use configurar::{convert::flatten, Value};
///
/// let cfg = Value::map([
///     ("a", Value::map([("b", Value::Int(1)), ("c", Value::Int(2))])),
///     ("d", Value::Int(3)),
/// ]);
/// let flat = flatten(cfg.as_map().unwrap());
/// assert_eq!(flat["a.b"], Value::Int(1));
/// assert_eq!(flat["a.c"], Value::Int(2));
/// assert_eq!(flat["d"], Value::Int(3));
/// ```
pub fn flatten(entries: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for (key, val) in entries {
        match val {
            Value::Map(inner) => {
                for (sub_key, sub_val) in flatten(inner) {
                    out.insert(format!("{key}.{sub_key}"), sub_val);
                }
            }
            _ => {
                out.insert(key.clone(), val.clone());
            }
        }
    }
    out
}

/// Inverse of [`flatten`]: splits dotted keys back into nested mappings, one
/// level per pass.
pub fn unflatten(flat: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    // Resolve one level of nesting by splitting off the first path segment.
    let mut grouped: BTreeMap<String, Value> = BTreeMap::new();
    for (key, val) in flat {
        match key.split_once('.') {
            Some((root, leaf)) => {
                let entry = grouped
                    .entry(root.to_string())
                    .or_insert_with(|| Value::Map(BTreeMap::new()));
                // A terminal under `root` (iterated first, since "a" sorts
                // before "a.b") keeps the slot; the dotted entry is dropped.
                if let Value::Map(inner) = entry {
                    inner.insert(leaf.to_string(), val.clone());
                }
            }
            None => {
                grouped.insert(key.clone(), val.clone());
            }
        }
    }

    // Recurse to resolve deeper levels.
    grouped
        .into_iter()
        .map(|(key, val)| match val {
            Value::Map(inner) => (key, Value::Map(unflatten(&inner))),
            terminal => (key, terminal),
        })
        .collect()
}

/// Flattens the typed-argument form, preserving the type annotations. The
/// result is the input of the argument surface builder.
pub fn flatten_args(entries: &BTreeMap<String, ArgValue>) -> BTreeMap<String, (FieldType, Value)> {
    let mut out = BTreeMap::new();
    for (key, val) in entries {
        match val {
            ArgValue::Map(inner) => {
                for (sub_key, sub_val) in flatten_args(inner) {
                    out.insert(format!("{key}.{sub_key}"), sub_val);
                }
            }
            ArgValue::Leaf(ty, value) => {
                out.insert(key.clone(), (*ty, value.clone()));
            }
        }
    }
    out
}
