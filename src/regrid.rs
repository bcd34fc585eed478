//! Conservative remapping onto a rectilinear latitude/longitude grid
//!
//! Weights are exact spherical overlap areas between source and target cells.
//! On a rectilinear grid they factor into a latitude part (difference of
//! `sin(lat)` over the overlapping band) and a longitude part (overlapping
//! degrees, with 360 degree wrapping), so each horizontal slice is remapped as
//! `W_lat · x · W_lonᵀ`. Missing (NaN) source cells are excluded and each target
//! cell is normalised by the valid area it overlaps; cells overlapping no valid
//! source data are NaN. Slices are processed in parallel with rayon.

use crate::dataset::{AttrValue, Dataset, Field};
use crate::errors::{NpcpError, Result};
use crate::grid::{midpoint_bounds, Grid};
use ndarray::{Array2, ArrayD, Axis, IxDyn};
use ndarray::parallel::prelude::*;
use tracing::{debug, info};

/// Interpolation method requested from a [`Regridder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegridMethod {
    /// First-order conservative (area-weighted) remapping
    Conservative,
}

impl RegridMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
        }
    }
}

/// Horizontal regridding collaborator.
///
/// Returns a new dataset holding `var` resampled onto `grid`, the grid
/// coordinates and their bounds, and the variable's non-spatial coordinates.
pub trait Regridder {
    fn regrid(
        &self,
        dataset: &Dataset,
        var: &str,
        grid: &Grid,
        method: RegridMethod,
    ) -> Result<Dataset>;
}

/// Area-weighted regridder for rectilinear source grids
#[derive(Debug, Default, Clone, Copy)]
pub struct ConservativeRegridder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Horizontal {
    Lat,
    Lon,
}

impl Horizontal {
    fn label(self) -> &'static str {
        match self {
            Self::Lat => "latitude",
            Self::Lon => "longitude",
        }
    }

    fn matches(self, dim: &str, coord: Option<&Field>) -> bool {
        let (names, standard_name, axis, units): (&[&str], _, _, &[&str]) = match self {
            Self::Lat => (
                &["lat", "latitude", "nav_lat"],
                "latitude",
                "Y",
                &["degrees_north", "degree_north", "degree_N", "degrees_N", "degreeN"],
            ),
            Self::Lon => (
                &["lon", "longitude", "nav_lon"],
                "longitude",
                "X",
                &["degrees_east", "degree_east", "degree_E", "degrees_E", "degreeE"],
            ),
        };
        if names.contains(&dim) {
            return true;
        }
        let Some(coord) = coord else {
            return false;
        };
        let text = |key: &str| coord.attrs.get(key).and_then(AttrValue::as_text);
        text("standard_name") == Some(standard_name)
            || text("axis") == Some(axis)
            || text("units").is_some_and(|u| units.contains(&u))
    }
}

impl Regridder for ConservativeRegridder {
    fn regrid(
        &self,
        dataset: &Dataset,
        var: &str,
        grid: &Grid,
        method: RegridMethod,
    ) -> Result<Dataset> {
        let RegridMethod::Conservative = method;
        let field = dataset.variable(var)?;
        let lat_dim = find_dim(dataset, field, Horizontal::Lat)?;
        let lon_dim = find_dim(dataset, field, Horizontal::Lon)?;

        let src_lat_bounds = source_bounds(dataset, field, &lat_dim)?;
        let src_lon_bounds = source_bounds(dataset, field, &lon_dim)?;
        let w_lat = latitude_weights(&grid.lat_bounds, &src_lat_bounds);
        let w_lon = longitude_weights(&grid.lon_bounds, &src_lon_bounds);

        let lat_axis = field.axis_of(&lat_dim)?;
        let lon_axis = field.axis_of(&lon_dim)?;
        let other_axes: Vec<usize> = (0..field.dims.len())
            .filter(|&a| a != lat_axis && a != lon_axis)
            .collect();
        let other_dims: Vec<String> = other_axes.iter().map(|&a| field.dims[a].clone()).collect();
        let other_shape: Vec<usize> = other_axes.iter().map(|&a| field.values.shape()[a]).collect();

        let mut perm = other_axes.clone();
        perm.extend([lat_axis, lon_axis]);
        let n_slices: usize = other_shape.iter().product();
        let (ny_src, nx_src) = (src_lat_bounds.len(), src_lon_bounds.len());
        let stacked = field
            .values
            .view()
            .permuted_axes(perm.as_slice())
            .as_standard_layout()
            .into_owned()
            .into_shape((n_slices, ny_src, nx_src))?;

        info!(
            "Regridding '{}' ({} slices of {}x{}) onto {}x{} grid using {} remapping",
            var,
            n_slices,
            ny_src,
            nx_src,
            grid.lat.len(),
            grid.lon.len(),
            method.as_str()
        );

        let w_lon_t = w_lon.t();
        let slices: Vec<Array2<f64>> = stacked
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|slice| {
                let filled = slice.mapv(|v| if v.is_nan() { 0.0 } else { v });
                let valid = slice.mapv(|v| if v.is_nan() { 0.0 } else { 1.0 });
                let numerator = w_lat.dot(&filled).dot(&w_lon_t);
                let area = w_lat.dot(&valid).dot(&w_lon_t);
                let mut out = numerator;
                out.zip_mut_with(&area, |n, &a| *n = if a > 0.0 { *n / a } else { f64::NAN });
                out
            })
            .collect();

        let (ny, nx) = grid.shape();
        let mut out_shape = other_shape;
        out_shape.extend([ny, nx]);
        let mut flat = Vec::with_capacity(n_slices * ny * nx);
        for slice in &slices {
            flat.extend(slice.iter().copied());
        }
        let values = ArrayD::from_shape_vec(IxDyn(&out_shape), flat)?;

        let mut out_dims = other_dims.clone();
        out_dims.extend(["lat".to_string(), "lon".to_string()]);
        let mut regridded = Field::new(var, out_dims, values)?;
        regridded.attrs = field.attrs.clone();

        let mut output = Dataset::new();
        output.attrs = dataset.attrs.clone();
        output.insert(regridded);
        grid.add_coordinates(&mut output)?;
        for dim in &other_dims {
            carry_coordinate(dataset, &mut output, dim);
        }
        debug!("Regridded dataset holds {:?}", output.variable_names().collect::<Vec<_>>());
        Ok(output)
    }
}

fn find_dim(dataset: &Dataset, field: &Field, axis: Horizontal) -> Result<String> {
    field
        .dims
        .iter()
        .find(|d| axis.matches(d, dataset.get(d)))
        .cloned()
        .ok_or_else(|| NpcpError::DimensionNotFound {
            var: field.name.clone(),
            dim: axis.label().to_string(),
        })
}

/// Cell bounds of a source coordinate: its `bounds` variable when present,
/// otherwise midpoints between centres
fn source_bounds(dataset: &Dataset, field: &Field, dim: &str) -> Result<Vec<[f64; 2]>> {
    let len = field.values.shape()[field.axis_of(dim)?];
    let Some(coord) = dataset.get(dim) else {
        return Err(NpcpError::GridError(format!(
            "dimension '{dim}' of '{}' has no coordinate variable",
            field.name
        )));
    };
    if coord.values.len() != len {
        return Err(NpcpError::GridError(format!(
            "coordinate '{dim}' has {} values for a dimension of length {len}",
            coord.values.len()
        )));
    }

    let declared = coord
        .attrs
        .get("bounds")
        .and_then(AttrValue::as_text)
        .and_then(|name| dataset.get(name))
        .filter(|b| b.values.shape() == [len, 2]);
    if let Some(bounds) = declared {
        let flat: Vec<f64> = bounds.values.iter().copied().collect();
        return Ok(flat.chunks(2).map(|c| [c[0], c[1]]).collect());
    }
    let centres: Vec<f64> = coord.values.iter().copied().collect();
    midpoint_bounds(&centres, dim)
}

fn overlap(a: [f64; 2], b: [f64; 2]) -> Option<(f64, f64)> {
    let lo = a[0].min(a[1]).max(b[0].min(b[1]));
    let hi = a[0].max(a[1]).min(b[0].max(b[1]));
    (hi > lo).then_some((lo, hi))
}

fn latitude_weights(target: &[[f64; 2]], source: &[[f64; 2]]) -> Array2<f64> {
    Array2::from_shape_fn((target.len(), source.len()), |(i, j)| {
        overlap(target[i], source[j])
            .map_or(0.0, |(lo, hi)| hi.to_radians().sin() - lo.to_radians().sin())
    })
}

fn longitude_weights(target: &[[f64; 2]], source: &[[f64; 2]]) -> Array2<f64> {
    Array2::from_shape_fn((target.len(), source.len()), |(i, j)| {
        [-360.0, 0.0, 360.0]
            .iter()
            .filter_map(|shift| overlap(target[i], [source[j][0] + shift, source[j][1] + shift]))
            .map(|(lo, hi)| (hi - lo).to_radians())
            .sum::<f64>()
    })
}

/// Copy a non-spatial coordinate and its bounds variable into `output`
fn carry_coordinate(input: &Dataset, output: &mut Dataset, dim: &str) {
    let Some(coord) = input.get(dim) else {
        return;
    };
    if let Some(bounds) = coord
        .attrs
        .get("bounds")
        .and_then(AttrValue::as_text)
        .and_then(|name| input.get(name))
    {
        output.insert(bounds.clone());
    }
    output.insert(coord.clone());
}
