//! The resolution loop
//!
//! Command-line switches cannot be enumerated up front: a `_class` selector
//! may itself arrive via the command line, and only once it is known do the
//! fields of the schema it names exist. Resolution therefore iterates:
//! expand schemas, rebuild the argument surface, parse, and repeat while
//! parsing still leaves unrecognized tokens. Each pass must consume strictly
//! more of the token list than the previous one; a pass that makes no
//! progress means the caller supplied an unknown argument or failed to
//! supply a selector, and resolution aborts instead of looping forever.

use crate::convert::{flatten_args, to_args, to_plain, to_typed, unflatten};
use crate::error::{Error, Result};
use crate::expand::expand_defaults;
use crate::file::{apply_config_file, CFG_FILE_KEY};
use crate::registry::Registry;
use crate::surface::ArgSurface;
use crate::value::{Value, CLASS_SUFFIX};

/// Resolves a configuration against a token list.
///
/// Layering, lowest priority first: defaults declared by the schemas, then
/// the optional YAML override file, then the command line. The input may be
/// in typed or plain form; the result is fully typed.
///
/// The override file is applied once, before the loop, and only if the root
/// mapping declares the reserved `cfg_file` key. Note that a declared
/// `cfg_file` behaves like any other field afterwards: if its value is still
/// missing and no `--cfg_file` token is given, resolution fails with
/// [`Error::UnresolvedArgument`].
///
/// # Example
///
/// ```
/// use configurar::{resolve, FieldType, Registry, SchemaDescriptor, Value};
///
/// let mut registry = Registry::new();
/// registry.register(
///     SchemaDescriptor::new("AdamConfig")
///         .field("lr", FieldType::Float, 1e-3)
///         .field("beta1", FieldType::Float, 0.9),
/// );
///
/// let cfg = Value::map([
///     ("optimizer_class", Value::from("AdamConfig")),
///     ("epochs", Value::from(10)),
/// ]);
/// let tokens = ["--optimizer.lr", "0.01"].map(String::from);
///
/// let resolved = resolve(&cfg, &tokens, &registry)?;
/// let root = resolved.as_map().unwrap();
/// let Value::Instance(optimizer) = &root["optimizer"] else { unreachable!() };
/// assert_eq!(optimizer.fields["lr"], Value::Float(0.01));
/// assert_eq!(optimizer.fields["beta1"], Value::Float(0.9));
/// # Ok::<(), configurar::Error>(())
/// ```
pub fn resolve(cfg: &Value, tokens: &[String], registry: &Registry) -> Result<Value> {
    let Value::Map(mut entries) = to_plain(cfg) else {
        return Err(Error::Config(
            "The configuration root must be a mapping".to_string(),
        ));
    };

    if entries.contains_key(CFG_FILE_KEY) {
        entries = apply_config_file(&entries, tokens)?;
    }

    let mut nb_unparsed = tokens.len();
    let mut unparsed: Option<Vec<String>> = None;
    let mut continue_parsing = true;
    while continue_parsing {
        // Decided at the top so that one extra pass runs after the final
        // successful parse: that parse may have supplied a selector whose
        // schema fields still have to be injected.
        continue_parsing = unparsed.as_ref().map_or(true, |u| !u.is_empty());

        // Earlier parses erased type information, so re-annotate before
        // expanding whatever selectors are known by now.
        let args = expand_defaults(&to_args(&entries), registry)?;
        let flat = flatten_args(&args);

        let surface = ArgSurface::build(&flat);
        let (parsed, residual) = surface.parse_known(tokens)?;

        // The surface was built to cover every key, so each one must have
        // received a value, by default or by token.
        if let Some(key) = flat
            .keys()
            .find(|k| !parsed.contains_key(*k) && k.ends_with(CLASS_SUFFIX))
        {
            return Err(Error::UnresolvedSelector(key.clone()));
        }
        if let Some(key) = flat.keys().find(|k| !parsed.contains_key(*k)) {
            return Err(Error::UnresolvedArgument(key.clone()));
        }

        // The residual must shrink strictly while there is anything left in
        // it; otherwise no further pass can ever consume it.
        if continue_parsing && !residual.is_empty() && residual.len() >= nb_unparsed {
            return Err(Error::StalledResolution(residual));
        }
        nb_unparsed = residual.len();
        unparsed = Some(residual);

        entries = unflatten(&parsed);
    }

    Ok(Value::Map(to_typed(&entries, registry)?))
}

/// [`resolve`] over the process's own command-line arguments.
pub fn resolve_cli(cfg: &Value, registry: &Registry) -> Result<Value> {
    let tokens: Vec<String> = std::env::args().skip(1).collect();
    resolve(cfg, &tokens, registry)
}
