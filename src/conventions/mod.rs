//! Naming, attribute and unit conventions of the intercomparison
//!
//! [`Conventions`] bundles the three lookup tables the pipeline consults:
//!
//! - [`NameTable`]: raw source spellings to canonical names
//! - [`AttributeCatalog`]: canonical attribute sets
//! - [`TargetUnitTable`]: required output units per canonical variable
//!
//! The tables are built once, either from the compiled-in defaults or from the
//! defaults plus a JSON overlay, and are only ever borrowed immutably afterwards.
//!
//! An overlay file may contain any of three objects:
//!
//! ```json
//! {
//!   "names": { "t2m": "tas" },
//!   "attributes": { "tas": { "long_name": "Near-Surface Air Temperature",
//!                            "standard_name": "air_temperature" } },
//!   "units": { "tas": "degC" }
//! }
//! ```

pub mod catalog;
pub mod names;
pub mod tables;

pub use catalog::AttributeCatalog;
pub use names::NameTable;

use crate::dataset::{AttrValue, Attributes};
use crate::errors::{NpcpError, Result};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::path::Path;

/// Immutable mapping from canonical variable name to output unit string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetUnitTable {
    units: HashMap<String, String>,
}

impl TargetUnitTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            units: pairs
                .into_iter()
                .map(|(var, units)| (var.to_string(), units.to_string()))
                .collect(),
        }
    }

    /// Required output units for `canonical`, or `UnknownTargetUnit`
    pub fn target_units(&self, canonical: &str) -> Result<&str> {
        self.units
            .get(canonical)
            .map(String::as_str)
            .ok_or_else(|| NpcpError::UnknownTargetUnit {
                var: canonical.to_string(),
            })
    }
}

/// The full set of lookup tables used by one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Conventions {
    pub names: NameTable,
    pub catalog: AttributeCatalog,
    pub target_units: TargetUnitTable,
}

impl Conventions {
    /// The compiled-in NPCP tables
    pub fn builtin() -> Self {
        Self {
            names: NameTable::from_pairs(tables::NAME_TABLE.iter().copied()),
            catalog: AttributeCatalog::from_static(tables::ATTRIBUTE_SETS),
            target_units: TargetUnitTable::from_pairs(tables::TARGET_UNITS.iter().copied()),
        }
    }

    /// Built-in tables with a JSON overlay file merged on top
    pub fn from_overlay_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_overlay_str(&content, &path.display().to_string())
    }

    /// Built-in tables with a JSON overlay merged on top; `origin` labels errors
    pub fn from_overlay_str(content: &str, origin: &str) -> Result<Self> {
        let overlay: JsonValue = serde_json::from_str(content)?;
        let root = overlay
            .as_object()
            .ok_or_else(|| config_error(origin, "top level must be an object"))?;

        let mut conventions = Self::builtin();
        for key in root.keys() {
            if !matches!(key.as_str(), "names" | "attributes" | "units") {
                return Err(config_error(origin, &format!("unknown section '{key}'")));
            }
        }

        if let Some(names) = root.get("names") {
            conventions.names.extend(string_map(names, origin, "names")?);
        }
        if let Some(units) = root.get("units") {
            conventions.target_units.units.extend(string_map(units, origin, "units")?);
        }
        if let Some(attributes) = root.get("attributes") {
            let sets = section(attributes, origin, "attributes")?;
            let mut parsed = HashMap::new();
            for (name, set) in sets {
                let set = section(set, origin, &format!("attributes.{name}"))?;
                let mut attrs = Attributes::new();
                for (key, value) in set {
                    attrs.insert(key.clone(), attr_value(value, origin, name, key)?);
                }
                parsed.insert(name.clone(), attrs);
            }
            conventions.catalog.extend(parsed);
        }

        Ok(conventions)
    }
}

impl Default for Conventions {
    fn default() -> Self {
        Self::builtin()
    }
}

fn config_error(origin: &str, message: &str) -> NpcpError {
    NpcpError::ConfigError {
        path: origin.to_string(),
        message: message.to_string(),
    }
}

fn section<'a>(
    value: &'a JsonValue,
    origin: &str,
    name: &str,
) -> Result<&'a Map<String, JsonValue>> {
    value
        .as_object()
        .ok_or_else(|| config_error(origin, &format!("'{name}' must be an object")))
}

fn string_map(value: &JsonValue, origin: &str, name: &str) -> Result<HashMap<String, String>> {
    section(value, origin, name)?
        .iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), s.to_string()))
                .ok_or_else(|| config_error(origin, &format!("'{name}.{k}' must be a string")))
        })
        .collect()
}

fn attr_value(value: &JsonValue, origin: &str, set: &str, key: &str) -> Result<AttrValue> {
    match value {
        JsonValue::String(s) => Ok(AttrValue::Text(s.clone())),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttrValue::Int(i)),
            None => n
                .as_f64()
                .map(AttrValue::Float)
                .ok_or_else(|| config_error(origin, &format!("'{set}.{key}' is out of range"))),
        },
        _ => Err(config_error(
            origin,
            &format!("'attributes.{set}.{key}' must be a string or number"),
        )),
    }
}
