//! Canonical attribute sets keyed by canonical name

use crate::dataset::{AttrValue, Attributes};
use crate::errors::{NpcpError, Result};
use std::collections::HashMap;

/// Immutable table of CMOR-style attribute sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeCatalog {
    sets: HashMap<String, Attributes>,
}

impl AttributeCatalog {
    pub fn from_static(table: &[(&str, &[(&str, &str)])]) -> Self {
        let sets = table
            .iter()
            .map(|(name, attrs)| {
                let set = attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), AttrValue::Text(v.to_string())))
                    .collect();
                (name.to_string(), set)
            })
            .collect();
        Self { sets }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// A fresh copy of the attribute set for `name`.
    ///
    /// Absence means the catalog does not cover this variable or dimension and is
    /// reported as `MissingAttributeSet`.
    pub fn attribute_set(&self, name: &str) -> Result<Attributes> {
        self.sets
            .get(name)
            .cloned()
            .ok_or_else(|| NpcpError::MissingAttributeSet {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub(crate) fn extend(&mut self, other: HashMap<String, Attributes>) {
        self.sets.extend(other);
    }
}
