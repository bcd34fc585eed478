//! Unit conversion of field values and unit labels
//!
//! Conversion proceeds in four steps:
//!
//! 1. known malformed spellings are rewritten through a fixed synonym table
//! 2. the [`strategy::Dimensional`] strategy attempts a generic conversion
//! 3. fixed-ratio fallbacks handle the non-dimensional pairs of the
//!    intercomparison (mass flux to daily depth, daily energy to power)
//! 4. a Celsius target is always labelled `degC`
//!
//! The fallbacks multiply without checking that the source data are physically
//! consistent with the assumed accumulation period.

pub mod parse;
pub mod strategy;

pub use parse::{parse_unit, Transform, Unit};
pub use strategy::{Attempt, ConversionStrategy};

use crate::dataset::Field;
use crate::errors::{NpcpError, Result};
use tracing::debug;

/// Label written for every Celsius-scale target
pub const CELSIUS_LABEL: &str = "degC";

/// Nonstandard spellings and their canonical unit strings
pub const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("degrees_Celsius", "degC"),
    ("deg_k", "degK"),
    ("kg/m2/s", "kg m-2 s-1"),
    ("mm", "mm d-1"),
];

/// Rewrite a known malformed spelling to its canonical form
pub fn normalize_spelling(units: &str) -> &str {
    UNIT_SYNONYMS
        .iter()
        .find(|(raw, _)| *raw == units)
        .map_or(units, |(_, canonical)| *canonical)
}

/// Converts field values between unit strings through an ordered strategy list
pub struct UnitConverter {
    strategies: Vec<Box<dyn ConversionStrategy>>,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(strategy::default_strategies())
    }
}

impl UnitConverter {
    pub fn new(strategies: Vec<Box<dyn ConversionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Find the transform from `source` to `target` without touching any data.
    ///
    /// Returns the transform and the unit label to write.
    pub fn plan(&self, source: &str, target: &str) -> Result<(Transform, String)> {
        let source_norm = normalize_spelling(source);
        let target_norm = normalize_spelling(target);
        if source_norm != source {
            debug!("Rewrote unit spelling '{}' as '{}'", source, source_norm);
        }

        let mut first_failure = None;
        for strategy in &self.strategies {
            match strategy.attempt(source_norm, target_norm) {
                Attempt::Converted(transform) => {
                    debug!(
                        "Converting '{}' to '{}' via {} (x{} {:+})",
                        source_norm,
                        target,
                        strategy.name(),
                        transform.scale,
                        transform.offset
                    );
                    return Ok((transform, output_label(target, target_norm)));
                }
                Attempt::NotApplicable(reason) => {
                    debug!("Strategy '{}' not applicable: {}", strategy.name(), reason);
                    first_failure.get_or_insert(reason);
                }
            }
        }

        Err(NpcpError::UnsupportedUnitConversion {
            source_units: source.to_string(),
            target_units: target.to_string(),
            reason: first_failure
                .unwrap_or_else(|| "no conversion strategies configured".to_string()),
        })
    }

    /// Convert a field's values from `source` to `target` units in place.
    ///
    /// Only the `units` attribute changes among the field's attributes. On error
    /// the field is left untouched.
    pub fn convert(&self, field: &mut Field, source: &str, target: &str) -> Result<()> {
        let (transform, label) = self.plan(source, target)?;
        if !transform.is_identity() {
            let Transform { scale, offset } = transform;
            field.values.mapv_inplace(|v| v * scale + offset);
        }
        field.set_units(&label);
        Ok(())
    }

    /// Convert a field from its own `units` attribute to `target`
    pub fn convert_field(&self, field: &mut Field, target: &str) -> Result<()> {
        let source = field.require_units()?.to_string();
        self.convert(field, &source, target)
    }
}

fn output_label(target: &str, target_norm: &str) -> String {
    match parse_unit(target_norm) {
        Ok(unit) if unit.is_celsius() => CELSIUS_LABEL.to_string(),
        _ => target.to_string(),
    }
}
