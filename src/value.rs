//! The configuration value model
//!
//! A configuration is a tree of [`Value`]s: terminals (scalars, tuples, the
//! null value and the [`Value::Missing`] sentinel) and string-keyed mappings.
//! In its typed form, a subtree is a [`Value::Instance`] carrying the name of
//! the schema it was constructed from.
//!
//! `Missing` marks a field that has not been determined by any layer yet. It
//! is deliberately distinct from `Null`: a user can set a field to null on
//! purpose, while a missing field still has to be supplied by the config file
//! or the command line before resolution can finish.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Deserializer, Serialize};

/// Reserved suffix of selector fields.
///
/// A field named `<stem>_class` holds the name of the schema chosen for the
/// sibling field `<stem>`. Keys must not contain `.`, which is reserved as the
/// path separator of the flat form.
pub const CLASS_SUFFIX: &str = "_class";

/// Returns the stem of a selector key, or `None` if the key is not a selector.
pub fn selector_stem(key: &str) -> Option<&str> {
    key.strip_suffix(CLASS_SUFFIX)
}

/// Declared type of a terminal configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    Tuple,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::Tuple => "tuple",
        };
        f.write_str(name)
    }
}

/// A configuration value: a terminal, a nested mapping, or a typed schema
/// instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The "not yet determined" sentinel. Never a legal final field value.
    Missing,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Instance(Instance),
}

/// An instance of a named schema: the typed form of a nested mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Name of the schema this instance was constructed from.
    pub schema: String,
    /// Field values, including nested instances.
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    /// Runtime type of a terminal value, used to derive the command-line
    /// argument surface. `Missing` and `Null` are typed as `str` so that an
    /// unset or null field still produces a parseable switch. Mappings and
    /// instances have no terminal type.
    pub fn runtime_type(&self) -> Option<FieldType> {
        match self {
            Value::Bool(_) => Some(FieldType::Bool),
            Value::Int(_) => Some(FieldType::Int),
            Value::Float(_) => Some(FieldType::Float),
            Value::Str(_) => Some(FieldType::Str),
            Value::Tuple(_) => Some(FieldType::Tuple),
            Value::Missing | Value::Null => Some(FieldType::Str),
            Value::Map(_) | Value::Instance(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Convenience constructor for a mapping value.
    pub fn map<I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Missing never survives a successful resolution; if it is
            // serialized anyway (e.g. dumping a template config), it becomes
            // null, the closest representable value.
            Value::Missing | Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Tuple(items) => serializer.collect_seq(items.iter()),
            Value::Map(entries) => serializer.collect_map(entries.iter()),
            Value::Instance(instance) => serializer.collect_map(instance.fields.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a configuration value")
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Int(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Value, E> {
                i64::try_from(v)
                    .map(Value::Int)
                    .map_err(|_| E::custom(format!("integer {v} does not fit in i64")))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::Float(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::Str(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Value, E> {
                Ok(Value::Str(v))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Tuple(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
