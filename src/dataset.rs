//! In-memory labeled-array model shared by every pipeline stage
//!
//! A [`Dataset`] maps variable names to [`Field`]s and carries dataset-level
//! attributes. It is created by a loader, owned by a single pipeline run and
//! consumed by a writer.

use crate::errors::{NpcpError, Result};
use ndarray::ArrayD;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the attribute holding a variable's physical units
pub const UNITS_ATTR: &str = "units";

/// Name of the dataset-level provenance attribute
pub const HISTORY_ATTR: &str = "history";

/// A single attribute value, mirroring the NetCDF attribute types we round-trip
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Texts(Vec<String>),
    Float(f64),
    Floats(Vec<f64>),
    Int(i64),
    Ints(Vec<i64>),
}

impl AttrValue {
    /// Borrow the value as text, if it is a single string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret a scalar numeric value as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Floats(vs) if vs.len() == 1 => Some(vs[0]),
            Self::Ints(vs) if vs.len() == 1 => Some(vs[0] as f64),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Texts(ss) => write!(f, "{ss:?}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Floats(vs) => write!(f, "{vs:?}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Ints(vs) => write!(f, "{vs:?}"),
        }
    }
}

/// Ordered attribute map of a variable or dataset
pub type Attributes = BTreeMap<String, AttrValue>;

/// A named n-dimensional array with dimension names and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub dims: Vec<String>,
    pub values: ArrayD<f64>,
    pub attrs: Attributes,
}

impl Field {
    /// Create a field, checking that the dimension names match the array rank
    pub fn new(name: impl Into<String>, dims: Vec<String>, values: ArrayD<f64>) -> Result<Self> {
        let name = name.into();
        if dims.len() != values.ndim() {
            return Err(NpcpError::ShapeMismatch(format!(
                "variable '{}' has {} dimension names for an array of rank {}",
                name,
                dims.len(),
                values.ndim()
            )));
        }
        Ok(Self {
            name,
            dims,
            values,
            attrs: Attributes::new(),
        })
    }

    /// Builder-style attribute setter
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// The `units` attribute, if present and textual
    pub fn units(&self) -> Option<&str> {
        self.attrs.get(UNITS_ATTR).and_then(AttrValue::as_text)
    }

    /// The non-empty `units` attribute, or `MissingUnits`
    pub fn require_units(&self) -> Result<&str> {
        match self.units() {
            Some(u) if !u.trim().is_empty() => Ok(u),
            _ => Err(NpcpError::MissingUnits {
                var: self.name.clone(),
            }),
        }
    }

    pub fn set_units(&mut self, units: &str) {
        self.attrs
            .insert(UNITS_ATTR.to_string(), AttrValue::Text(units.to_string()));
    }

    /// Position of a named dimension in this field
    pub fn axis_of(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| NpcpError::DimensionNotFound {
                var: self.name.clone(),
                dim: dim.to_string(),
            })
    }

    /// A coordinate variable is one-dimensional over a dimension of its own name
    pub fn is_coordinate(&self) -> bool {
        self.dims.len() == 1 && self.dims[0] == self.name
    }
}

/// A mapping from variable name to [`Field`] plus dataset-level attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: BTreeMap<String, Field>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field under its own name, replacing any previous entry
    pub fn insert(&mut self, field: Field) {
        self.variables.insert(field.name.clone(), field);
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.variables.get_mut(name)
    }

    /// Look up a variable, failing with `VariableNotFound`
    pub fn variable(&self, name: &str) -> Result<&Field> {
        self.get(name).ok_or_else(|| NpcpError::VariableNotFound {
            var: name.to_string(),
        })
    }

    /// Mutable lookup, failing with `VariableNotFound`
    pub fn variable_mut(&mut self, name: &str) -> Result<&mut Field> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| NpcpError::VariableNotFound {
                var: name.to_string(),
            })
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.variables.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.variables.values()
    }

    /// Rename a variable and every dimension of the same name across the dataset.
    ///
    /// A name that exists only as a dimension (no coordinate variable) is still
    /// renamed in every field that uses it.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let is_dim = self.fields().any(|f| f.dims.iter().any(|d| d == from));
        if !self.contains(from) && !is_dim {
            return Err(NpcpError::VariableNotFound {
                var: from.to_string(),
            });
        }
        let clobbers_variable = self.contains(from) && self.contains(to);
        let clobbers_dim = is_dim && self.fields().any(|f| f.dims.iter().any(|d| d == to));
        if clobbers_variable || clobbers_dim {
            return Err(NpcpError::NameConflict {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if let Some(mut field) = self.variables.remove(from) {
            field.name = to.to_string();
            self.variables.insert(to.to_string(), field);
        }
        for field in self.variables.values_mut() {
            for dim in field.dims.iter_mut().filter(|d| d.as_str() == from) {
                *dim = to.to_string();
            }
        }
        Ok(())
    }

    /// Dimension lengths implied by the fields, checked for consistency
    pub fn dimension_sizes(&self) -> Result<BTreeMap<String, usize>> {
        let mut sizes = BTreeMap::new();
        for field in self.fields() {
            for (dim, &len) in field.dims.iter().zip(field.values.shape()) {
                match sizes.insert(dim.clone(), len) {
                    Some(previous) if previous != len => {
                        return Err(NpcpError::ShapeMismatch(format!(
                            "dimension '{}' has length {} in '{}' but {} elsewhere",
                            dim, len, field.name, previous
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(sizes)
    }

    /// The dataset-level `history` string, if any
    pub fn history(&self) -> Option<&str> {
        self.attrs.get(HISTORY_ATTR).and_then(AttrValue::as_text)
    }
}
