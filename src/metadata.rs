//! Canonical renaming and CMOR-style attribute assignment
//!
//! The normalizer renames the target variable and its spatial dimensions to their
//! canonical names, replaces their attribute maps with the catalog's sets, keeps
//! the variable's live physical units, and drops the bounds-generation marker from
//! the grid bounds variables. Running it on an already-normalized dataset is a
//! no-op.

use crate::conventions::Conventions;
use crate::dataset::Dataset;
use crate::errors::{NpcpError, Result};
use tracing::debug;

/// Name of the time dimension, which is never renamed or re-attributed
pub const TIME_DIM: &str = "time";

/// Attribute the bounds generator leaves on generated bounds variables
pub const BOUNDS_MARKER_ATTR: &str = "xcdat_bounds";

/// Bounds variables that must carry no generator marker
pub const LAT_BOUNDS: &str = "lat_bnds";
pub const LON_BOUNDS: &str = "lon_bnds";
pub const TIME_BOUNDS: &str = "time_bnds";

/// Applies the naming and attribute conventions to one variable of a dataset
pub struct MetadataNormalizer<'a> {
    conventions: &'a Conventions,
}

impl<'a> MetadataNormalizer<'a> {
    pub fn new(conventions: &'a Conventions) -> Self {
        Self { conventions }
    }

    /// Normalize `raw_var` and its non-time dimensions, returning the canonical
    /// variable name.
    ///
    /// `raw_var` may already be canonical, or may be a raw name whose canonical
    /// form is present from an earlier pass.
    pub fn normalize(&self, dataset: &mut Dataset, raw_var: &str) -> Result<String> {
        let names = &self.conventions.names;
        let var = if dataset.contains(raw_var) {
            raw_var
        } else {
            let canonical = names.resolve(raw_var);
            if !dataset.contains(canonical) {
                return Err(NpcpError::VariableNotFound {
                    var: raw_var.to_string(),
                });
            }
            canonical
        };

        let field = dataset.variable(var)?;
        let units = field.require_units()?.to_string();
        let mut targets: Vec<String> = field
            .dims
            .iter()
            .filter(|d| d.as_str() != TIME_DIM)
            .cloned()
            .collect();
        targets.push(var.to_string());

        let mut canonical_var = var.to_string();
        for raw in &targets {
            let canonical = names.resolve(raw).to_string();
            if *raw != canonical {
                debug!("Renaming '{}' to '{}'", raw, canonical);
                dataset.rename(raw, &canonical)?;
            }
            let attrs = self.conventions.catalog.attribute_set(&canonical)?;
            dataset.variable_mut(&canonical)?.attrs = attrs;
            canonical_var = canonical;
        }

        dataset.variable_mut(&canonical_var)?.set_units(&units);

        for bounds in [LAT_BOUNDS, LON_BOUNDS] {
            dataset.variable_mut(bounds)?.attrs.remove(BOUNDS_MARKER_ATTR);
        }
        if let Some(time_bounds) = dataset.get_mut(TIME_BOUNDS) {
            time_bounds.attrs.remove(BOUNDS_MARKER_ATTR);
        }

        Ok(canonical_var)
    }
}
