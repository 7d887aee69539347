//! Property tests for the representation converters
//!
//! Covers the nested/flat bijection, expansion idempotence and token
//! coercion over generated inputs.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::convert::{flatten, to_args, unflatten};
use crate::expand::expand_defaults;
use crate::registry::{Registry, SchemaDescriptor};
use crate::surface::coerce;
use crate::value::{FieldType, Value};

fn arb_key() -> impl Strategy<Value = String> {
    // No dots: '.' is the reserved path separator of the flat form.
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").unwrap()
}

fn arb_terminal() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1e9f64..1e9f64).prop_map(Value::Float),
        prop::string::string_regex("[a-z][a-z0-9 ]{0,11}")
            .unwrap()
            .prop_map(Value::Str),
        Just(Value::Null),
        prop::collection::vec(any::<i64>().prop_map(Value::Int), 0..4).prop_map(Value::Tuple),
    ]
}

fn arb_entries() -> impl Strategy<Value = BTreeMap<String, Value>> {
    let node = arb_terminal().prop_recursive(3, 32, 4, |inner| {
        prop::collection::btree_map(arb_key(), inner, 1..4).prop_map(Value::Map)
    });
    prop::collection::btree_map(arb_key(), node, 1..5)
}

proptest! {
    #[test]
    fn flatten_round_trips(entries in arb_entries()) {
        prop_assert_eq!(unflatten(&flatten(&entries)), entries);
    }

    #[test]
    fn yaml_round_trips(entries in arb_entries()) {
        let cfg = Value::Map(entries);
        let text = serde_yaml::to_string(&cfg).unwrap();
        let loaded: Value = serde_yaml::from_str(&text).unwrap();
        prop_assert_eq!(loaded, cfg);
    }

    #[test]
    fn expansion_is_idempotent(leaf_default in arb_terminal(), node_default in arb_terminal()) {
        let mut registry = Registry::new();
        registry.register(SchemaDescriptor::new("Leaf").field(
            "w",
            leaf_default.runtime_type().unwrap_or(FieldType::Str),
            leaf_default,
        ));
        registry.register(
            SchemaDescriptor::new("Node")
                .field(
                    "v",
                    node_default.runtime_type().unwrap_or(FieldType::Str),
                    node_default,
                )
                .selector_with_default("leaf", "Leaf"),
        );

        let cfg = Value::map([("node_class", Value::from("Node"))]);
        let args = to_args(cfg.as_map().unwrap());
        let once = expand_defaults(&args, &registry).unwrap();
        let twice = expand_defaults(&once, &registry).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn truthy_tokens_coerce_in_any_case(
        token in prop_oneof!["yes", "true", "t", "y", "1"],
        uppercase in any::<bool>(),
    ) {
        let token = if uppercase { token.to_uppercase() } else { token };
        prop_assert_eq!(coerce(FieldType::Bool, "k", &token).unwrap(), Value::Bool(true));
    }

    #[test]
    fn falsy_tokens_coerce_in_any_case(
        token in prop_oneof!["no", "false", "f", "n", "0"],
        uppercase in any::<bool>(),
    ) {
        let token = if uppercase { token.to_uppercase() } else { token };
        prop_assert_eq!(coerce(FieldType::Bool, "k", &token).unwrap(), Value::Bool(false));
    }

    #[test]
    fn integer_tuple_literals_round_trip(items in prop::collection::vec(any::<i64>(), 2..5)) {
        let literal = format!(
            "({})",
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        );
        let expected = Value::Tuple(items.into_iter().map(Value::Int).collect());
        prop_assert_eq!(coerce(FieldType::Tuple, "k", &literal).unwrap(), expected);
    }

    #[test]
    fn int_coercion_never_panics(raw in "\\PC*") {
        let _ = coerce(FieldType::Int, "k", &raw);
        let _ = coerce(FieldType::Float, "k", &raw);
        let _ = coerce(FieldType::Bool, "k", &raw);
        let _ = coerce(FieldType::Tuple, "k", &raw);
    }
}
