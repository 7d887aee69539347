//! Schema descriptors and the schema registry
//!
//! A [`SchemaDescriptor`] is an ordered list of named, typed fields with
//! optional defaults, mirroring a plain struct definition. Descriptors are
//! registered under their name in a [`Registry`] populated by the caller at
//! startup; resolution looks schemas up by the names it encounters in
//! `_class` selector fields and never enumerates the table.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::{FieldType, Instance, Value, CLASS_SUFFIX};

/// One field of a schema: name, declared type and default value.
///
/// A [`Value::Missing`] default marks a required field: it has to be supplied
/// by the config file or the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: FieldType,
    pub default: Value,
}

/// An ordered set of field descriptors registered under a schema name.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field with a default value.
    pub fn field(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty,
            default: default.into(),
        });
        self
    }

    /// Add a required field (no default).
    pub fn required(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty,
            default: Value::Missing,
        });
        self
    }

    /// Add a selector field `<stem>_class` with no default. The schema it
    /// names at resolution time controls the nested contents of `<stem>`.
    pub fn selector(self, stem: &str) -> Self {
        self.required(format!("{stem}{CLASS_SUFFIX}"), FieldType::Str)
    }

    /// Add a selector field `<stem>_class` preselecting a schema by name.
    pub fn selector_with_default(self, stem: &str, schema: &str) -> Self {
        self.field(format!("{stem}{CLASS_SUFFIX}"), FieldType::Str, schema)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Whether `name` is the stem of one of this schema's selector fields.
    /// Such a field holds the nested configuration the selector unlocked and
    /// is legal on an instance even though it is not declared on its own.
    pub fn has_selector_stem(&self, name: &str) -> bool {
        self.has_field(&format!("{name}{CLASS_SUFFIX}"))
    }

    /// Construct an instance of this schema from resolved field values.
    ///
    /// Values already present win over declared defaults; absent fields fall
    /// back to their default. Fails with [`Error::UnknownField`] for a value
    /// that matches neither a declared field nor a selector stem, and with
    /// [`Error::Config`] for an absent required field.
    pub fn instantiate(&self, values: BTreeMap<String, Value>) -> Result<Instance> {
        let mut fields = BTreeMap::new();
        for (name, value) in values {
            if !self.has_field(&name) && !self.has_selector_stem(&name) {
                return Err(Error::UnknownField {
                    schema: self.name.clone(),
                    field: name,
                });
            }
            fields.insert(name, value);
        }

        for descriptor in &self.fields {
            if !fields.contains_key(&descriptor.name) {
                if descriptor.default.is_missing() {
                    return Err(Error::Config(format!(
                        "Field '{}' of schema '{}' has no value and no default",
                        descriptor.name, self.name
                    )));
                }
                fields.insert(descriptor.name.clone(), descriptor.default.clone());
            }
        }

        Ok(Instance {
            schema: self.name.clone(),
            fields,
        })
    }
}

/// Explicit registration table mapping schema names to descriptors.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: HashMap<String, SchemaDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own name. Re-registering a name
    /// replaces the previous descriptor.
    pub fn register(&mut self, schema: SchemaDescriptor) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn lookup(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.schemas.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adam() -> SchemaDescriptor {
        SchemaDescriptor::new("AdamConfig")
            .field("lr", FieldType::Float, 0.001)
            .field("beta1", FieldType::Float, 0.9)
            .required("steps", FieldType::Int)
    }

    #[test]
    fn lookup_resolves_registered_names_only() {
        let mut registry = Registry::new();
        registry.register(adam());

        assert!(registry.lookup("AdamConfig").is_some());
        assert!(registry.lookup("SgdConfig").is_none());
    }

    #[test]
    fn instantiate_fills_defaults_and_keeps_overrides() {
        let schema = adam();
        let instance = schema
            .instantiate(BTreeMap::from([
                ("lr".to_string(), Value::Float(0.01)),
                ("steps".to_string(), Value::Int(100)),
            ]))
            .unwrap();

        assert_eq!(instance.schema, "AdamConfig");
        assert_eq!(instance.fields["lr"], Value::Float(0.01));
        assert_eq!(instance.fields["beta1"], Value::Float(0.9));
        assert_eq!(instance.fields["steps"], Value::Int(100));
    }

    #[test]
    fn instantiate_rejects_unknown_fields() {
        let err = adam()
            .instantiate(BTreeMap::from([
                ("steps".to_string(), Value::Int(1)),
                ("momentum".to_string(), Value::Float(0.8)),
            ]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn instantiate_requires_fields_without_defaults() {
        let err = adam().instantiate(BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn selector_stem_is_a_legal_instance_field() {
        let schema = SchemaDescriptor::new("TrainConfig")
            .selector_with_default("backbone", "ResNetConfig");

        let instance = schema
            .instantiate(BTreeMap::from([
                (
                    "backbone_class".to_string(),
                    Value::from("ResNetConfig"),
                ),
                ("backbone".to_string(), Value::map([])),
            ]))
            .unwrap();
        assert!(instance.fields.contains_key("backbone"));
    }
}
