//! Dimensional parsing of UDUNITS-style unit strings
//!
//! Only the vocabulary the intercomparison variables use is understood: SI base
//! and derived units with decimal prefixes, a few time spellings and the three
//! temperature scales. A parsed [`Unit`] is an affine map into SI base units:
//! `si = value * scale + offset`.

use crate::errors::{NpcpError, Result};
use std::fmt;

/// Exponents over (length, mass, time, temperature)
pub type Dimensions = [i32; 4];

const DIMENSIONLESS: Dimensions = [0, 0, 0, 0];
const LENGTH: Dimensions = [1, 0, 0, 0];
const MASS: Dimensions = [0, 1, 0, 0];
const TIME: Dimensions = [0, 0, 1, 0];
const TEMPERATURE: Dimensions = [0, 0, 0, 1];
const POWER: Dimensions = [2, 1, -3, 0];
const ENERGY: Dimensions = [2, 1, -2, 0];
const FORCE: Dimensions = [1, 1, -2, 0];
const PRESSURE: Dimensions = [-1, 1, -2, 0];

const CELSIUS_OFFSET: f64 = 273.15;
const FAHRENHEIT_SCALE: f64 = 5.0 / 9.0;
const FAHRENHEIT_OFFSET: f64 = CELSIUS_OFFSET - 32.0 * FAHRENHEIT_SCALE;

struct Symbol {
    name: &'static str,
    scale: f64,
    offset: f64,
    dims: Dimensions,
    prefixable: bool,
}

const fn sym(name: &'static str, scale: f64, dims: Dimensions, prefixable: bool) -> Symbol {
    Symbol {
        name,
        scale,
        offset: 0.0,
        dims,
        prefixable,
    }
}

const fn temp(name: &'static str, scale: f64, offset: f64) -> Symbol {
    Symbol {
        name,
        scale,
        offset,
        dims: TEMPERATURE,
        prefixable: false,
    }
}

const SYMBOLS: &[Symbol] = &[
    sym("m", 1.0, LENGTH, true),
    sym("meter", 1.0, LENGTH, false),
    sym("metre", 1.0, LENGTH, false),
    sym("g", 1e-3, MASS, true),
    sym("s", 1.0, TIME, true),
    sym("sec", 1.0, TIME, false),
    sym("second", 1.0, TIME, false),
    sym("min", 60.0, TIME, false),
    sym("minute", 60.0, TIME, false),
    sym("h", 3600.0, TIME, false),
    sym("hr", 3600.0, TIME, false),
    sym("hour", 3600.0, TIME, false),
    sym("d", 86400.0, TIME, false),
    sym("day", 86400.0, TIME, false),
    sym("W", 1.0, POWER, true),
    sym("J", 1.0, ENERGY, true),
    sym("N", 1.0, FORCE, true),
    sym("Pa", 1.0, PRESSURE, true),
    temp("K", 1.0, 0.0),
    temp("degK", 1.0, 0.0),
    temp("kelvin", 1.0, 0.0),
    temp("degC", 1.0, CELSIUS_OFFSET),
    temp("celsius", 1.0, CELSIUS_OFFSET),
    temp("degree_Celsius", 1.0, CELSIUS_OFFSET),
    temp("degree_C", 1.0, CELSIUS_OFFSET),
    temp("degrees_C", 1.0, CELSIUS_OFFSET),
    temp("deg_C", 1.0, CELSIUS_OFFSET),
    temp("°C", 1.0, CELSIUS_OFFSET),
    temp("degF", FAHRENHEIT_SCALE, FAHRENHEIT_OFFSET),
    temp("fahrenheit", FAHRENHEIT_SCALE, FAHRENHEIT_OFFSET),
];

const PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
];

/// A unit as an affine map into SI base units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub scale: f64,
    pub offset: f64,
    pub dims: Dimensions,
}

/// Linear-plus-offset value transform: `value * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub offset: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        offset: 0.0,
    };

    pub const fn scaling(scale: f64) -> Self {
        Self { scale, offset: 0.0 }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Unit {
    /// Affine transform taking values in `self` to values in `target`
    pub fn transform_to(&self, target: &Unit) -> std::result::Result<Transform, String> {
        if self.dims != target.dims {
            return Err(format!(
                "incompatible dimensions {} and {}",
                DimsDisplay(self.dims),
                DimsDisplay(target.dims)
            ));
        }
        Ok(Transform {
            scale: self.scale / target.scale,
            offset: (self.offset - target.offset) / target.scale,
        })
    }

    /// Whether this is exactly the Celsius temperature scale
    pub fn is_celsius(&self) -> bool {
        self.dims == TEMPERATURE
            && approx_eq(self.scale, 1.0)
            && approx_eq(self.offset, CELSIUS_OFFSET)
    }

    /// Whether this unit has the given dimensions and SI scale
    pub fn is(&self, dims: Dimensions, scale: f64) -> bool {
        self.dims == dims && approx_eq(self.scale, scale)
    }
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

struct DimsDisplay(Dimensions);

impl fmt::Display for DimsDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 4] = ["length", "mass", "time", "temperature"];
        let terms: Vec<String> = NAMES
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e != 0)
            .map(|(n, e)| if e == 1 { n.to_string() } else { format!("{n}^{e}") })
            .collect();
        if terms.is_empty() {
            write!(f, "[dimensionless]")
        } else {
            write!(f, "[{}]", terms.join(" "))
        }
    }
}

/// Parse a unit string such as `kg m-2 s-1`, `kg/m2/s`, `MJ m^-2` or `degC`
pub fn parse_unit(units: &str) -> Result<Unit> {
    let fail = |message: String| NpcpError::UnitParse {
        units: units.to_string(),
        message,
    };

    if units.trim().is_empty() {
        return Err(fail("empty unit string".to_string()));
    }

    let mut scale = 1.0;
    let mut dims = DIMENSIONLESS;
    let mut terms = Vec::new();

    let normalized = units.replace("**", "^");
    for (i, part) in normalized.split('/').enumerate() {
        let sign = if i == 0 { 1 } else { -1 };
        let tokens = split_tokens(part);
        if tokens.is_empty() {
            return Err(fail("missing term around '/'".to_string()));
        }
        for token in tokens {
            if let Ok(factor) = token.parse::<f64>() {
                scale *= factor.powi(sign);
                continue;
            }
            let (symbol, exponent) = parse_term(token).map_err(fail)?;
            let overflow = || fail(format!("exponent out of range in '{token}'"));
            let exponent = exponent.checked_mul(sign).ok_or_else(overflow)?;
            scale *= symbol.scale.powi(exponent);
            for (d, s) in dims.iter_mut().zip(symbol.dims) {
                *d = s
                    .checked_mul(exponent)
                    .and_then(|e| d.checked_add(e))
                    .ok_or_else(overflow)?;
            }
            terms.push((symbol.offset, exponent));
        }
    }

    // An offset scale only applies to a lone temperature term; in products it
    // denotes an interval.
    let offset = match terms.as_slice() {
        [(offset, 1)] => *offset,
        _ => 0.0,
    };

    Ok(Unit { scale, offset, dims })
}

fn split_tokens(part: &str) -> Vec<&str> {
    part.split(|c: char| c.is_whitespace() || c == '*' || c == '·')
        .filter(|t| !t.is_empty())
        .flat_map(|t| {
            if t.parse::<f64>().is_ok() {
                vec![t]
            } else {
                t.split('.').filter(|s| !s.is_empty()).collect()
            }
        })
        .collect()
}

struct Resolved {
    scale: f64,
    offset: f64,
    dims: Dimensions,
}

fn parse_term(token: &str) -> std::result::Result<(Resolved, i32), String> {
    let split = token
        .char_indices()
        .find(|(_, c)| !(c.is_alphabetic() || *c == '_' || *c == '°'))
        .map_or(token.len(), |(i, _)| i);
    let (name, rest) = token.split_at(split);
    if name.is_empty() {
        return Err(format!("expected a unit symbol in '{token}'"));
    }

    let exponent = rest.trim_start_matches('^');
    let exponent = if exponent.is_empty() {
        1
    } else {
        exponent
            .parse::<i32>()
            .map_err(|_| format!("invalid exponent in '{token}'"))?
    };

    lookup_symbol(name)
        .map(|s| (s, exponent))
        .ok_or_else(|| format!("unknown unit symbol '{name}'"))
}

fn lookup_symbol(name: &str) -> Option<Resolved> {
    if let Some(s) = SYMBOLS.iter().find(|s| s.name == name) {
        return Some(Resolved {
            scale: s.scale,
            offset: s.offset,
            dims: s.dims,
        });
    }
    PREFIXES.iter().find_map(|(prefix, factor)| {
        let base = name.strip_prefix(prefix)?;
        SYMBOLS
            .iter()
            .find(|s| s.prefixable && s.name == base)
            .map(|s| Resolved {
                scale: s.scale * factor,
                offset: 0.0,
                dims: s.dims,
            })
    })
}

/// Mass per area per time, exactly `kg m-2 s-1`
pub(crate) fn is_mass_flux(unit: &Unit) -> bool {
    unit.is([-2, 1, -1, 0], 1.0)
}

/// Depth per day in millimetres, `mm d-1`
pub(crate) fn is_depth_per_day(unit: &Unit) -> bool {
    unit.is([1, 0, -1, 0], 1e-3 / 86400.0)
}

/// Daily energy per area in megajoules, `MJ m-2`
pub(crate) fn is_daily_energy_per_area(unit: &Unit) -> bool {
    unit.is([0, 1, -2, 0], 1e6)
}

/// Power per area, `W m-2`
pub(crate) fn is_power_per_area(unit: &Unit) -> bool {
    unit.is([0, 1, -3, 0], 1.0)
}
