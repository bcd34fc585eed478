//! Target grid of the intercomparison
//!
//! The NPCP grid is the 0.2 degree (20i) AWRA grid over Australia: latitudes
//! -44.0 to -10.0 and longitudes 112.0 to 154.0, both inclusive.

use crate::dataset::{AttrValue, Attributes, Dataset, Field};
use crate::errors::{NpcpError, Result};
use crate::metadata::{BOUNDS_MARKER_ATTR, LAT_BOUNDS, LON_BOUNDS};
use ndarray::{Array1, Array2};

/// Name of the two-element bounds dimension
pub const BOUNDS_DIM: &str = "bnds";

/// Dataset-level extent attribute names
pub const LAT_MIN_ATTR: &str = "geospatial_lat_min";
pub const LAT_MAX_ATTR: &str = "geospatial_lat_max";
pub const LON_MIN_ATTR: &str = "geospatial_lon_min";
pub const LON_MAX_ATTR: &str = "geospatial_lon_max";

/// Static description of a regular lat/lon grid as half-open ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub lat_start: f64,
    pub lat_stop: f64,
    pub lon_start: f64,
    pub lon_stop: f64,
    pub resolution: f64,
}

/// The NPCP 0.2 degree grid
pub const NPCP_GRID: GridSpec = GridSpec {
    lat_start: -44.0,
    lat_stop: -9.99,
    lon_start: 112.0,
    lon_stop: 154.01,
    resolution: 0.2,
};

impl GridSpec {
    /// Latitude centres, rounded to one decimal place
    pub fn latitudes(&self) -> Vec<f64> {
        arange_rounded(self.lat_start, self.lat_stop, self.resolution)
    }

    /// Longitude centres, rounded to one decimal place
    pub fn longitudes(&self) -> Vec<f64> {
        arange_rounded(self.lon_start, self.lon_stop, self.resolution)
    }

    /// Generate the grid with cell bounds
    pub fn build(&self) -> Result<Grid> {
        Grid::from_coordinates(self.latitudes(), self.longitudes())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        NPCP_GRID
    }
}

fn arange_rounded(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| round1(start + i as f64 * step)).collect()
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Latitude/longitude cell centres plus `[lower, upper]` bounds per cell
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub lat_bounds: Vec<[f64; 2]>,
    pub lon_bounds: Vec<[f64; 2]>,
}

impl Grid {
    /// Build a grid from strictly monotonic coordinate sequences.
    ///
    /// Bounds sit at midpoints between neighbouring centres and extend half a
    /// cell beyond the ends; latitude bounds are clipped to [-90, 90].
    pub fn from_coordinates(lat: Vec<f64>, lon: Vec<f64>) -> Result<Self> {
        let lat_bounds = midpoint_bounds(&lat, "lat")?
            .into_iter()
            .map(|[a, b]| [a.clamp(-90.0, 90.0), b.clamp(-90.0, 90.0)])
            .collect();
        let lon_bounds = midpoint_bounds(&lon, "lon")?;
        Ok(Self {
            lat,
            lon,
            lat_bounds,
            lon_bounds,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// (lat_min, lat_max, lon_min, lon_max) from the first and last centres
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let first = |v: &[f64]| v.first().copied().unwrap_or(f64::NAN);
        let last = |v: &[f64]| v.last().copied().unwrap_or(f64::NAN);
        (first(&self.lat), last(&self.lat), first(&self.lon), last(&self.lon))
    }

    /// Extent attributes formatted to one decimal place
    pub fn extent_attributes(&self) -> Attributes {
        let (lat_min, lat_max, lon_min, lon_max) = self.extent();
        [
            (LAT_MIN_ATTR, lat_min),
            (LAT_MAX_ATTR, lat_max),
            (LON_MIN_ATTR, lon_min),
            (LON_MAX_ATTR, lon_max),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), AttrValue::Text(format!("{v:.1}"))))
        .collect()
    }

    /// Insert `lat`, `lon` and their generated bounds variables into `dataset`
    pub fn add_coordinates(&self, dataset: &mut Dataset) -> Result<()> {
        let coords = [
            ("lat", &self.lat, LAT_BOUNDS, &self.lat_bounds, "Y", "degrees_north"),
            ("lon", &self.lon, LON_BOUNDS, &self.lon_bounds, "X", "degrees_east"),
        ];
        for (name, centres, bounds_name, bounds, axis, units) in coords {
            let standard_name = if name == "lat" { "latitude" } else { "longitude" };
            let centre_values = Array1::from(centres.clone()).into_dyn();
            dataset.insert(
                Field::new(name, vec![name.to_string()], centre_values)?
                    .with_attr("axis", axis)
                    .with_attr("units", units)
                    .with_attr("standard_name", standard_name)
                    .with_attr("bounds", bounds_name),
            );

            let flat: Vec<f64> = bounds.iter().flat_map(|b| b.iter().copied()).collect();
            let bounds_values = Array2::from_shape_vec((bounds.len(), 2), flat)?.into_dyn();
            dataset.insert(
                Field::new(
                    bounds_name,
                    vec![name.to_string(), BOUNDS_DIM.to_string()],
                    bounds_values,
                )?
                .with_attr(BOUNDS_MARKER_ATTR, "True"),
            );
        }
        Ok(())
    }
}

/// Cell edges at midpoints between neighbouring centres
pub fn midpoint_bounds(centres: &[f64], name: &str) -> Result<Vec<[f64; 2]>> {
    match centres.len() {
        0 => Err(NpcpError::GridError(format!("'{name}' has no coordinates"))),
        1 => Err(NpcpError::GridError(format!(
            "'{name}' has a single coordinate, cell size is undefined"
        ))),
        n => {
            let ascending = centres[1] > centres[0];
            if centres
                .windows(2)
                .any(|w| (w[1] > w[0]) != ascending || w[1] == w[0])
            {
                return Err(NpcpError::GridError(format!(
                    "'{name}' coordinates are not strictly monotonic"
                )));
            }
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
            edges.extend(centres.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
            Ok(edges.windows(2).map(|w| [w[0], w[1]]).collect())
        }
    }
}
