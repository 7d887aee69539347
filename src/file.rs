//! YAML configuration files
//!
//! Loading, saving, and the file override layer. A config file is a nested
//! YAML mapping; its entries override the configuration's defaults but rank
//! below command-line switches, which are parsed afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::convert::{flatten, to_plain, unflatten};
use crate::error::{Error, Result};
use crate::surface::ArgSurface;
use crate::value::{FieldType, Value};

/// Reserved key selecting the override file. Its value is resolved once,
/// ahead of the main loop, via a dedicated `--cfg_file <path>` switch.
pub const CFG_FILE_KEY: &str = "cfg_file";

/// Reads a YAML file into a configuration value.
///
/// No schema is enforced: keys that match no known field are merged in as-is
/// and surface later as unknown switches during resolution.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Value> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Converts a configuration to its plain form and saves it as YAML.
pub fn save_config<P: AsRef<Path>>(cfg: &Value, path: P) -> Result<()> {
    let text = serde_yaml::to_string(&to_plain(cfg))?;
    fs::write(path.as_ref(), text)?;
    Ok(())
}

/// Applies the override file named by the `cfg_file` key, if any.
///
/// The token list is scanned leniently for just the `--cfg_file` switch,
/// with the configuration's own `cfg_file` value as the default; unknown
/// switches are ignored here because the full surface does not exist yet.
/// If the resolved path is still [`Value::Missing`], there is no file to
/// apply and the configuration is returned unchanged. Otherwise the file is
/// loaded, both configurations are flattened, and the file's entries are
/// merged over the configuration's.
pub fn apply_config_file(
    entries: &BTreeMap<String, Value>,
    tokens: &[String],
) -> Result<BTreeMap<String, Value>> {
    let default = entries
        .get(CFG_FILE_KEY)
        .cloned()
        .ok_or_else(|| Error::Config(format!("Expected a '{CFG_FILE_KEY}' key")))?;

    let flat_one = BTreeMap::from([(CFG_FILE_KEY.to_string(), (FieldType::Str, default))]);
    let surface = ArgSurface::build(&flat_one);
    let (parsed, _) = surface.parse_known(tokens)?;

    let path = match parsed.get(CFG_FILE_KEY) {
        // Neither the config nor the command line named a file.
        None => return Ok(entries.clone()),
        Some(Value::Str(path)) => path.clone(),
        Some(other) => {
            return Err(Error::Config(format!(
                "'{CFG_FILE_KEY}' must be a path, got {other:?}"
            )))
        }
    };

    let loaded = load_config(&path)?;
    let Value::Map(loaded) = loaded else {
        return Err(Error::Config(format!(
            "Config file {path} must contain a mapping at the top level"
        )));
    };

    // Merging is easiest on the flattened forms.
    let mut flat = flatten(entries);
    flat.extend(flatten(&loaded));
    Ok(unflatten(&flat))
}
