//! # Configurar: layered training-run configuration
//!
//! Configurar resolves a training configuration from three layers with fixed
//! precedence: defaults declared by schema descriptors, overrides from a YAML
//! file, and overrides from command-line arguments.
//!
//! Configurations are self-describing: a field named `<stem>_class` holds the
//! name of the schema whose fields live under the sibling `<stem>` key, so
//! sub-configurations are selected at runtime. Because such a selector can
//! itself arrive via the command line, the set of valid switches is not known
//! up front; [`resolve`] iterates schema expansion and argument parsing until
//! no unrecognized tokens remain, then returns the fully typed result.
//!
//! ## Architecture
//!
//! - **value**: the tagged-union configuration value and the missing sentinel
//! - **registry**: schema descriptors and the name registration table
//! - **convert**: pure conversions between the typed, plain, typed-argument
//!   and flat representations
//! - **expand**: injection of schema defaults under selector stems
//! - **surface**: the derived command-line argument surface
//! - **file**: YAML load/save and the override-file layer
//! - **resolve**: the fixed-point resolution loop
//!
//! ## Example
//!
//! ```
//! use configurar::{resolve, FieldType, Registry, SchemaDescriptor, Value};
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     SchemaDescriptor::new("CosineScheduleConfig")
//!         .field("warmup_steps", FieldType::Int, 0)
//!         .field("cycles", FieldType::Float, 0.5),
//! );
//!
//! let cfg = Value::map([
//!     ("schedule_class", Value::Missing),
//!     ("epochs", Value::from(90)),
//! ]);
//!
//! // The schedule schema is chosen on the command line; its fields become
//! // valid switches once the selector is known.
//! let tokens = [
//!     "--schedule_class",
//!     "CosineScheduleConfig",
//!     "--schedule.warmup_steps",
//!     "500",
//! ]
//! .map(String::from);
//!
//! let resolved = resolve(&cfg, &tokens, &registry)?;
//! let Value::Instance(schedule) = &resolved.as_map().unwrap()["schedule"] else {
//!     unreachable!()
//! };
//! assert_eq!(schedule.fields["warmup_steps"], Value::Int(500));
//! # Ok::<(), configurar::Error>(())
//! ```

pub mod convert;
pub mod error;
pub mod expand;
pub mod file;
pub mod registry;
pub mod resolve;
pub mod surface;
pub mod value;

#[cfg(test)]
mod property_tests;

pub use convert::{flatten, to_plain, to_typed, unflatten, ArgValue};
pub use error::{Error, Result};
pub use expand::expand_defaults;
pub use file::{apply_config_file, load_config, save_config, CFG_FILE_KEY};
pub use registry::{FieldDescriptor, Registry, SchemaDescriptor};
pub use resolve::{resolve, resolve_cli};
pub use surface::ArgSurface;
pub use value::{selector_stem, FieldType, Instance, Value, CLASS_SUFFIX};
