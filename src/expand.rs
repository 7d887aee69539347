//! Schema expansion
//!
//! Selector fields (`<stem>_class`) name the schema whose fields belong under
//! the sibling `<stem>` key. Expansion looks each resolved selector up in the
//! registry and injects the schema's fields, with their declared defaults,
//! as a nested mapping under the stem. Values already present under the stem
//! win over the declared defaults. Injected fields can contain further
//! selectors, so expansion recurses until no selector is left to resolve.

use std::collections::BTreeMap;

use crate::convert::ArgValue;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::value::{selector_stem, Value};

/// Expands every resolved selector in a typed-argument configuration.
///
/// A selector whose value is still [`Value::Missing`] is kept as-is and its
/// stem is left untouched; no schema has been chosen yet and a later parsing
/// pass may still supply one. Idempotent once no selector introduces fields
/// that were not present before.
pub fn expand_defaults(
    entries: &BTreeMap<String, ArgValue>,
    registry: &Registry,
) -> Result<BTreeMap<String, ArgValue>> {
    let mut out = BTreeMap::new();
    for (key, val) in entries {
        match val {
            ArgValue::Map(inner) => {
                out.insert(key.clone(), ArgValue::Map(expand_defaults(inner, registry)?));
            }
            ArgValue::Leaf(_, selected) if selector_stem(key).is_some() => {
                // The selector field itself stays in the configuration.
                out.insert(key.clone(), val.clone());
                if selected.is_missing() {
                    continue;
                }

                let name = match selected {
                    Value::Str(name) => name,
                    other => return Err(Error::UnknownSchema(format!("{other:?}"))),
                };
                let schema = registry
                    .lookup(name)
                    .ok_or_else(|| Error::UnknownSchema(name.clone()))?;

                let stem = selector_stem(key).unwrap_or(key);
                let mut params: BTreeMap<String, ArgValue> = schema
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), ArgValue::Leaf(f.ty, f.default.clone())))
                    .collect();

                // Whatever is already in the configuration has priority over
                // the declared defaults.
                if let Some(existing) = entries.get(stem) {
                    let ArgValue::Map(existing) = existing else {
                        return Err(Error::InvalidOverride {
                            key: stem.to_string(),
                        });
                    };
                    for (field, value) in existing {
                        params.insert(field.clone(), value.clone());
                    }
                }

                // Transitively resolve selectors among the injected fields.
                out.insert(
                    stem.to_string(),
                    ArgValue::Map(expand_defaults(&params, registry)?),
                );
            }
            _ => {
                out.insert(key.clone(), val.clone());
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::to_args;
    use crate::registry::SchemaDescriptor;
    use crate::value::FieldType;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(
            SchemaDescriptor::new("ImageDataConfig")
                .field("batch_size", FieldType::Int, 32)
                .field("shuffle", FieldType::Bool, true),
        );
        registry.register(
            SchemaDescriptor::new("TrainerConfig")
                .field("epochs", FieldType::Int, 10)
                .selector_with_default("data", "ImageDataConfig"),
        );
        registry
    }

    fn args_of(cfg: Value) -> BTreeMap<String, ArgValue> {
        to_args(cfg.as_map().unwrap())
    }

    fn leaf(ty: FieldType, value: impl Into<Value>) -> ArgValue {
        ArgValue::Leaf(ty, value.into())
    }

    #[test]
    fn injects_schema_fields_under_the_stem() {
        let args = args_of(Value::map([("data_class", Value::from("ImageDataConfig"))]));
        let expanded = expand_defaults(&args, &registry()).unwrap();

        let ArgValue::Map(data) = &expanded["data"] else {
            panic!("stem should be a mapping");
        };
        assert_eq!(data["batch_size"], leaf(FieldType::Int, 32));
        assert_eq!(data["shuffle"], leaf(FieldType::Bool, true));
        // The selector itself is preserved.
        assert_eq!(
            expanded["data_class"],
            leaf(FieldType::Str, "ImageDataConfig")
        );
    }

    #[test]
    fn missing_selector_leaves_the_stem_untouched() {
        let args = args_of(Value::map([("data_class", Value::Missing)]));
        let expanded = expand_defaults(&args, &registry()).unwrap();
        assert!(!expanded.contains_key("data"));
        assert_eq!(expanded["data_class"], leaf(FieldType::Str, Value::Missing));
    }

    #[test]
    fn existing_values_win_over_defaults() {
        let args = args_of(Value::map([
            ("data_class", Value::from("ImageDataConfig")),
            ("data", Value::map([("batch_size", Value::Int(128))])),
        ]));
        let expanded = expand_defaults(&args, &registry()).unwrap();

        let ArgValue::Map(data) = &expanded["data"] else {
            panic!("stem should be a mapping");
        };
        assert_eq!(data["batch_size"], leaf(FieldType::Int, 128));
        assert_eq!(data["shuffle"], leaf(FieldType::Bool, true));
    }

    #[test]
    fn resolves_nested_selectors_transitively() {
        let args = args_of(Value::map([("trainer_class", Value::from("TrainerConfig"))]));
        let expanded = expand_defaults(&args, &registry()).unwrap();

        let ArgValue::Map(trainer) = &expanded["trainer"] else {
            panic!("trainer should be a mapping");
        };
        let ArgValue::Map(data) = &trainer["data"] else {
            panic!("trainer.data should be injected transitively");
        };
        assert_eq!(data["batch_size"], leaf(FieldType::Int, 32));
    }

    #[test]
    fn expansion_is_idempotent() {
        let args = args_of(Value::map([("trainer_class", Value::from("TrainerConfig"))]));
        let registry = registry();
        let once = expand_defaults(&args, &registry).unwrap();
        let twice = expand_defaults(&once, &registry).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_schema_name_fails() {
        let args = args_of(Value::map([("data_class", Value::from("NoSuchConfig"))]));
        let err = expand_defaults(&args, &registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownSchema(name) if name == "NoSuchConfig"));
    }

    #[test]
    fn non_mapping_stem_fails() {
        let args = args_of(Value::map([
            ("data_class", Value::from("ImageDataConfig")),
            ("data", Value::Int(3)),
        ]));
        let err = expand_defaults(&args, &registry()).unwrap_err();
        assert!(matches!(err, Error::InvalidOverride { key } if key == "data"));
    }
}
