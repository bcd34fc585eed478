//! Source-name to canonical-name resolution

use std::collections::HashMap;

/// Immutable mapping from raw source spellings to canonical names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameTable {
    entries: HashMap<String, String>,
}

impl NameTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Resolve a raw name. Names not in the table are already canonical.
    pub fn resolve<'a>(&'a self, raw: &'a str) -> &'a str {
        self.entries.get(raw).map_or(raw, String::as_str)
    }

    /// Number of raw spellings in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn extend(&mut self, other: HashMap<String, String>) {
        self.entries.extend(other);
    }
}
