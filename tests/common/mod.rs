//! Shared fixtures for the integration tests

#![allow(dead_code)]

use ndarray::{Array1, ArrayD, IxDyn};
use npcp_prep::dataset::{Dataset, Field};

pub const N_TIME: usize = 2;
pub const N_LAT: usize = 37;
pub const N_LON: usize = 45;

/// 1 degree source latitudes covering the NPCP domain with a margin
pub fn source_latitudes() -> Vec<f64> {
    (0..N_LAT).map(|i| -45.0 + i as f64).collect()
}

pub fn source_longitudes() -> Vec<f64> {
    (0..N_LON).map(|i| 111.0 + i as f64).collect()
}

/// A daily dataset holding one constant-valued variable on a 1 degree grid
/// with `latitude`/`longitude`/`time` dimensions
pub fn source_dataset(var: &str, units: &str, value: f64) -> Dataset {
    let mut dataset = Dataset::new();

    let time = Array1::from(vec![0.0, 1.0]).into_dyn();
    dataset.insert(
        Field::new("time", vec!["time".into()], time)
            .unwrap()
            .with_attr("units", "days since 2000-01-01")
            .with_attr("calendar", "standard")
            .with_attr("axis", "T"),
    );

    let lat = Array1::from(source_latitudes()).into_dyn();
    dataset.insert(
        Field::new("latitude", vec!["latitude".into()], lat)
            .unwrap()
            .with_attr("units", "degrees_north")
            .with_attr("long_name", "latitude (source)"),
    );

    let lon = Array1::from(source_longitudes()).into_dyn();
    dataset.insert(
        Field::new("longitude", vec!["longitude".into()], lon)
            .unwrap()
            .with_attr("units", "degrees_east"),
    );

    let values = ArrayD::from_elem(IxDyn(&[N_TIME, N_LAT, N_LON]), value);
    dataset.insert(
        Field::new(
            var,
            vec!["time".into(), "latitude".into(), "longitude".into()],
            values,
        )
        .unwrap()
        .with_attr("units", units)
        .with_attr("long_name", "source long name")
        .with_attr("comment", "dropped by normalization"),
    );

    dataset
}

pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}
