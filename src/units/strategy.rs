//! Ordered unit-conversion strategies
//!
//! Each strategy either produces a [`Transform`] or reports why it does not
//! apply. The converter evaluates them in order and the first success wins.

use super::parse::{
    is_daily_energy_per_area, is_depth_per_day, is_mass_flux, is_power_per_area, parse_unit,
    Transform,
};

/// Seconds in a day
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Outcome of a single strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Converted(Transform),
    NotApplicable(String),
}

/// One way of turning source-unit values into target-unit values
pub trait ConversionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, source: &str, target: &str) -> Attempt;
}

/// Dimensional analysis with scale and temperature-offset rules
#[derive(Debug, Default, Clone, Copy)]
pub struct Dimensional;

impl ConversionStrategy for Dimensional {
    fn name(&self) -> &'static str {
        "dimensional"
    }

    fn attempt(&self, source: &str, target: &str) -> Attempt {
        let parsed = parse_unit(source).and_then(|s| Ok((s, parse_unit(target)?)));
        match parsed {
            Ok((s, t)) => match s.transform_to(&t) {
                Ok(transform) => Attempt::Converted(transform),
                Err(reason) => Attempt::NotApplicable(reason),
            },
            Err(e) => Attempt::NotApplicable(e.to_string()),
        }
    }
}

/// `kg m-2 s-1` to `mm d-1`, assuming water at 1000 kg m-3
#[derive(Debug, Default, Clone, Copy)]
pub struct MassFluxToDailyDepth;

impl ConversionStrategy for MassFluxToDailyDepth {
    fn name(&self) -> &'static str {
        "mass flux to daily depth"
    }

    fn attempt(&self, source: &str, target: &str) -> Attempt {
        match (parse_unit(source), parse_unit(target)) {
            (Ok(s), Ok(t)) if is_mass_flux(&s) && is_depth_per_day(&t) => {
                Attempt::Converted(Transform::scaling(SECONDS_PER_DAY))
            }
            _ => Attempt::NotApplicable(format!(
                "'{source}' to '{target}' is not mass flux to depth per day"
            )),
        }
    }
}

/// Daily accumulated `MJ m-2` to mean `W m-2`
#[derive(Debug, Default, Clone, Copy)]
pub struct DailyEnergyToPower;

impl ConversionStrategy for DailyEnergyToPower {
    fn name(&self) -> &'static str {
        "daily energy to power"
    }

    fn attempt(&self, source: &str, target: &str) -> Attempt {
        match (parse_unit(source), parse_unit(target)) {
            (Ok(s), Ok(t)) if is_daily_energy_per_area(&s) && is_power_per_area(&t) => {
                Attempt::Converted(Transform::scaling(1e6 / SECONDS_PER_DAY))
            }
            _ => Attempt::NotApplicable(format!(
                "'{source}' to '{target}' is not daily energy to power per area"
            )),
        }
    }
}

/// The generic mechanism followed by the fixed-ratio fallbacks
pub fn default_strategies() -> Vec<Box<dyn ConversionStrategy>> {
    vec![
        Box::new(Dimensional),
        Box::new(MassFluxToDailyDepth),
        Box::new(DailyEnergyToPower),
    ]
}
