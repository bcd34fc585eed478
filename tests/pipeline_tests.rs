//! Regridding, metadata normalization and end-to-end pipeline behaviour,
//! run against the in-memory store

mod common;

use common::{assert_close, source_dataset, N_LAT, N_LON, N_TIME};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use npcp_prep::dataset::{AttrValue, Dataset};
use npcp_prep::prelude::*;
use npcp_prep::units::strategy::Dimensional;
use std::path::Path;

fn text<'a>(dataset: &'a Dataset, var: &str, key: &str) -> Option<&'a str> {
    dataset.get(var)?.attrs.get(key).and_then(AttrValue::as_text)
}

fn global<'a>(dataset: &'a Dataset, key: &str) -> Option<&'a str> {
    dataset.attrs.get(key).and_then(AttrValue::as_text)
}

fn run(store: &MemoryStore, conventions: &Conventions, var: &str) -> Result<Dataset> {
    let pipeline = Pipeline::new(conventions, ConservativeRegridder, NPCP_GRID.build()?);
    let invocation = Invocation::new("in.nc", var, "out.nc");
    pipeline.run(store, store, &invocation)
}

#[test]
fn test_regrid_preserves_constant_field() -> Result<()> {
    let input = source_dataset("tmax", "K", 300.0);
    let grid = NPCP_GRID.build()?;

    let output = ConservativeRegridder.regrid(&input, "tmax", &grid, RegridMethod::Conservative)?;
    let field = output.variable("tmax")?;

    assert_eq!(field.dims, vec!["time", "lat", "lon"]);
    assert_eq!(field.values.shape(), &[N_TIME, 171, 211]);
    assert!(field.values.iter().all(|v| (v - 300.0).abs() < 1e-9));
    assert_eq!(field.units(), Some("K"));

    assert!(output.contains("time"));
    assert!(output.contains("lat_bnds"));
    assert!(output.contains("lon_bnds"));
    assert!(!output.contains("latitude"));
    assert_eq!(output.variable("lat")?.values.len(), 171);
    assert_eq!(text(&output, "lat_bnds", "xcdat_bounds"), Some("True"));
    Ok(())
}

#[test]
fn test_regrid_skips_missing_values() -> Result<()> {
    let mut input = source_dataset("precip", "kg m-2 s-1", 2.0);
    {
        let field = input.variable_mut("precip")?;
        // Southern half of the source grid is missing at the first time step
        for i in 0..N_LAT / 2 {
            for j in 0..N_LON {
                field.values[[0, i, j]] = f64::NAN;
            }
        }
        // Whole second time step is missing
        for i in 0..N_LAT {
            for j in 0..N_LON {
                field.values[[1, i, j]] = f64::NAN;
            }
        }
    }
    let grid = NPCP_GRID.build()?;
    let output = ConservativeRegridder.regrid(&input, "precip", &grid, RegridMethod::Conservative)?;
    let values = &output.variable("precip")?.values;

    // Cells touching valid data keep the valid mean; others are missing
    assert_close(values[[0, 170, 100]], 2.0);
    assert!(values[[0, 0, 100]].is_nan());
    assert!(values.index_axis(ndarray::Axis(0), 1).iter().all(|v| v.is_nan()));
    Ok(())
}

#[test]
fn test_regrid_averages_by_area() -> Result<()> {
    let mut input = source_dataset("wind", "m s-1", 0.0);
    {
        let field = input.variable_mut("wind")?;
        // Alternate longitude columns between 0 and 4
        for t in 0..N_TIME {
            for i in 0..N_LAT {
                for j in (0..N_LON).step_by(2) {
                    field.values[[t, i, j]] = 4.0;
                }
            }
        }
    }
    // Coarse 2 degree target cells
    let grid = Grid::from_coordinates(vec![-30.0, -29.0], vec![112.0, 114.0])?;
    let output = ConservativeRegridder.regrid(&input, "wind", &grid, RegridMethod::Conservative)?;
    let values = &output.variable("wind")?.values;
    assert_eq!(values.shape(), &[N_TIME, 2, 2]);
    // lon cell [111, 113] covers half of 111 (4), all of 112 (0), half of 113 (4)
    assert_close(values[[0, 0, 0]], 2.0);
    Ok(())
}

#[test]
fn test_regrid_requires_horizontal_dimensions() {
    let mut dataset = Dataset::new();
    dataset.insert(
        Field::new("v", vec!["x".into(), "y".into()], ArrayD::zeros(IxDyn(&[2, 2])))
            .unwrap()
            .with_attr("units", "K"),
    );
    let grid = NPCP_GRID.build().unwrap();
    let err = ConservativeRegridder
        .regrid(&dataset, "v", &grid, RegridMethod::Conservative)
        .unwrap_err();
    assert!(matches!(err, NpcpError::DimensionNotFound { .. }));

    let err = ConservativeRegridder
        .regrid(&dataset, "missing", &grid, RegridMethod::Conservative)
        .unwrap_err();
    assert!(matches!(err, NpcpError::VariableNotFound { .. }));
}

#[test]
fn test_normalize_is_idempotent() -> Result<()> {
    let conventions = Conventions::builtin();
    let grid = NPCP_GRID.build()?;
    let input = source_dataset("tmax", "degC", 25.0);
    let mut dataset =
        ConservativeRegridder.regrid(&input, "tmax", &grid, RegridMethod::Conservative)?;

    let normalizer = MetadataNormalizer::new(&conventions);
    let name = normalizer.normalize(&mut dataset, "tmax")?;
    assert_eq!(name, "tasmax");
    let once = dataset.clone();

    let again = normalizer.normalize(&mut dataset, "tmax")?;
    assert_eq!(again, "tasmax");
    assert_eq!(dataset, once);

    normalizer.normalize(&mut dataset, "tasmax")?;
    assert_eq!(dataset, once);
    Ok(())
}

/// A dataset on a 2x3 grid whose spatial dimensions still use source spellings
fn unregridded_dataset() -> Result<Dataset> {
    let mut dataset = Dataset::new();
    dataset.insert(
        Field::new("time", vec!["time".into()], Array1::from(vec![0.0]).into_dyn())?
            .with_attr("units", "days since 2000-01-01"),
    );
    dataset.insert(
        Field::new(
            "latitude",
            vec!["latitude".into()],
            Array1::from(vec![-30.0, -29.8]).into_dyn(),
        )?
        .with_attr("units", "degrees_north")
        .with_attr("bounds", "lat_bnds"),
    );
    dataset.insert(
        Field::new(
            "longitude",
            vec!["longitude".into()],
            Array1::from(vec![140.0, 140.2, 140.4]).into_dyn(),
        )?
        .with_attr("units", "degrees_east")
        .with_attr("bounds", "lon_bnds"),
    );
    let lat_bnds = Array2::from_shape_vec((2, 2), vec![-30.1, -29.9, -29.9, -29.7])?;
    dataset.insert(
        Field::new("lat_bnds", vec!["latitude".into(), "bnds".into()], lat_bnds.into_dyn())?
            .with_attr("xcdat_bounds", "True"),
    );
    let lon_bnds =
        Array2::from_shape_vec((3, 2), vec![139.9, 140.1, 140.1, 140.3, 140.3, 140.5])?;
    dataset.insert(
        Field::new("lon_bnds", vec!["longitude".into(), "bnds".into()], lon_bnds.into_dyn())?
            .with_attr("xcdat_bounds", "True"),
    );
    dataset.insert(
        Field::new(
            "tmax",
            vec!["time".into(), "latitude".into(), "longitude".into()],
            ArrayD::from_elem(IxDyn(&[1, 2, 3]), 31.5),
        )?
        .with_attr("units", "degC")
        .with_attr("source", "station blend"),
    );
    Ok(dataset)
}

#[test]
fn test_normalize_renames_spatial_dimensions() -> Result<()> {
    let conventions = Conventions::builtin();
    let normalizer = MetadataNormalizer::new(&conventions);
    let mut dataset = unregridded_dataset()?;

    let name = normalizer.normalize(&mut dataset, "tmax")?;
    assert_eq!(name, "tasmax");

    let field = dataset.variable("tasmax")?;
    assert_eq!(field.dims, vec!["time", "lat", "lon"]);
    assert_eq!(field.units(), Some("degC"));
    assert!(field.attrs.get("source").is_none());
    assert!(!dataset.contains("latitude"));
    assert!(!dataset.contains("longitude"));

    assert_eq!(dataset.variable("lat")?.attrs, conventions.catalog.attribute_set("lat")?);
    assert_eq!(dataset.variable("lon")?.attrs, conventions.catalog.attribute_set("lon")?);
    assert_eq!(dataset.variable("lat_bnds")?.dims, vec!["lat", "bnds"]);
    assert_eq!(dataset.variable("lon_bnds")?.dims, vec!["lon", "bnds"]);
    assert!(dataset.variable("lat_bnds")?.attrs.get("xcdat_bounds").is_none());
    assert!(dataset.variable("lon_bnds")?.attrs.get("xcdat_bounds").is_none());
    assert_eq!(dataset.variable("time")?.dims, vec!["time"]);

    let once = dataset.clone();
    assert_eq!(normalizer.normalize(&mut dataset, "tmax")?, "tasmax");
    assert_eq!(dataset, once);
    Ok(())
}

#[test]
fn test_normalize_requires_grid_bounds() -> Result<()> {
    let conventions = Conventions::builtin();
    let mut dataset = unregridded_dataset()?;
    dataset.remove("lon_bnds");

    let err = MetadataNormalizer::new(&conventions)
        .normalize(&mut dataset, "tmax")
        .unwrap_err();
    assert!(matches!(err, NpcpError::VariableNotFound { ref var } if var == "lon_bnds"));
    Ok(())
}

#[test]
fn test_normalize_replaces_attributes() -> Result<()> {
    let conventions = Conventions::builtin();
    let grid = NPCP_GRID.build()?;
    let input = source_dataset("tmin", "degC", 10.0);
    let mut dataset =
        ConservativeRegridder.regrid(&input, "tmin", &grid, RegridMethod::Conservative)?;
    MetadataNormalizer::new(&conventions).normalize(&mut dataset, "tmin")?;

    assert!(!dataset.contains("tmin"));
    let field = dataset.variable("tasmin")?;
    assert_eq!(field.units(), Some("degC"));
    assert_eq!(text(&dataset, "tasmin", "standard_name"), Some("air_temperature"));
    assert!(field.attrs.get("comment").is_none());

    assert_eq!(text(&dataset, "lat", "axis"), Some("Y"));
    assert_eq!(text(&dataset, "lon", "units"), Some("degrees_east"));
    assert!(dataset.variable("lat_bnds")?.attrs.get("xcdat_bounds").is_none());
    assert!(dataset.variable("lon_bnds")?.attrs.get("xcdat_bounds").is_none());
    assert_eq!(text(&dataset, "time", "calendar"), Some("standard"));
    Ok(())
}

#[test]
fn test_tmax_kelvin_to_tasmax() -> Result<()> {
    let store = MemoryStore::new().with_dataset("in.nc", source_dataset("tmax", "K", 300.0));
    let conventions = Conventions::builtin();
    run(&store, &conventions, "tmax")?;

    let output = store.get(Path::new("out.nc")).expect("output written");
    assert!(!output.contains("tmax"));
    let field = output.variable("tasmax")?;
    assert_eq!(field.units(), Some("degC"));
    assert_eq!(field.values.shape(), &[N_TIME, 171, 211]);
    assert!(field.values.iter().all(|v| (v - 26.85).abs() < 1e-9));
    assert_eq!(
        text(&output, "tasmax", "long_name"),
        Some("Daily Maximum Near-Surface Air Temperature")
    );

    assert_eq!(global(&output, "geospatial_lat_min"), Some("-44.0"));
    assert_eq!(global(&output, "geospatial_lat_max"), Some("-10.0"));
    assert_eq!(global(&output, "geospatial_lon_min"), Some("112.0"));
    assert_eq!(global(&output, "geospatial_lon_max"), Some("154.0"));
    Ok(())
}

#[test]
fn test_precip_flux_to_daily_depth() -> Result<()> {
    let input = source_dataset("precip", "kg m-2 s-1", 1e-5);
    let store = MemoryStore::new().with_dataset("in.nc", input);
    let output = run(&store, &Conventions::builtin(), "precip")?;

    let field = output.variable("pr")?;
    assert_eq!(field.units(), Some("mm d-1"));
    assert!(field.values.iter().all(|v| (v - 0.864).abs() < 1e-9));
    Ok(())
}

#[test]
fn test_solar_exposure_to_rsds() -> Result<()> {
    let input = source_dataset("solar_exposure_day", "MJ m-2", 8.64);
    let store = MemoryStore::new().with_dataset("in.nc", input);
    let output = run(&store, &Conventions::builtin(), "solar_exposure_day")?;

    let field = output.variable("rsds")?;
    assert_eq!(field.units(), Some("W m-2"));
    assert!(field.values.iter().all(|v| (v - 100.0).abs() < 1e-9));
    Ok(())
}

#[test]
fn test_unknown_variable_writes_nothing() {
    let store = MemoryStore::new().with_dataset("in.nc", source_dataset("foo", "K", 1.0));
    let err = run(&store, &Conventions::builtin(), "foo").unwrap_err();

    assert!(matches!(err, NpcpError::MissingAttributeSet { ref name } if name == "foo"));
    assert_eq!(err.kind(), ErrorKind::MissingAttributeSet);
    assert!(!store.contains(Path::new("out.nc")));
}

#[test]
fn test_unsupported_units_write_nothing() {
    let store = MemoryStore::new().with_dataset("in.nc", source_dataset("tmax", "m s-1", 1.0));
    let err = run(&store, &Conventions::builtin(), "tmax").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedUnitConversion);
    assert!(err.to_string().contains("m s-1"));
    assert!(!store.contains(Path::new("out.nc")));
}

#[test]
fn test_overlay_variable_without_target_units() -> Result<()> {
    let conventions = Conventions::from_overlay_str(
        r#"{ "attributes": { "foo": { "long_name": "Foo" } } }"#,
        "overlay.json",
    )?;
    let store = MemoryStore::new().with_dataset("in.nc", source_dataset("foo", "K", 1.0));
    let err = run(&store, &conventions, "foo").unwrap_err();

    assert!(matches!(err, NpcpError::UnknownTargetUnit { ref var } if var == "foo"));
    assert!(!store.contains(Path::new("out.nc")));
    Ok(())
}

#[test]
fn test_history_nests_input_history() -> Result<()> {
    let mut input = source_dataset("tmax", "degC", 20.0);
    input
        .attrs
        .insert("history".into(), AttrValue::from("created by source pipeline v1"));
    let store = MemoryStore::new().with_dataset("in.nc", input);
    let output = run(&store, &Conventions::builtin(), "tmax")?;

    let history = output.history().expect("history set");
    assert!(history.contains(": npcp-prep in.nc tmax out.nc"));
    assert!(history.ends_with("\n\nHistory of in.nc:\ncreated by source pipeline v1"));
    Ok(())
}

#[test]
fn test_history_without_input_history() -> Result<()> {
    let store = MemoryStore::new().with_dataset("in.nc", source_dataset("tmax", "degC", 20.0));
    let conventions = Conventions::builtin();
    let pipeline = Pipeline::new(&conventions, ConservativeRegridder, NPCP_GRID.build()?);
    let invocation = Invocation::new("in.nc", "tmax", "out.nc")
        .with_command("npcp-prep --threads 2 in.nc tmax out.nc");
    let output = pipeline.run(&store, &store, &invocation)?;

    let history = output.history().expect("history set");
    assert!(history.ends_with(": npcp-prep --threads 2 in.nc tmax out.nc"));
    assert!(!history.contains("History of"));
    Ok(())
}

#[test]
fn test_pipeline_uses_supplied_converter() -> Result<()> {
    let conventions = Conventions::builtin();
    let pipeline = Pipeline::new(&conventions, ConservativeRegridder, NPCP_GRID.build()?)
        .with_converter(UnitConverter::new(vec![Box::new(Dimensional)]));
    assert_eq!(pipeline.grid().shape(), (171, 211));

    let input = source_dataset("precip", "kg m-2 s-1", 1e-5);
    let store = MemoryStore::new().with_dataset("in.nc", input);
    let err = pipeline
        .run(&store, &store, &Invocation::new("in.nc", "precip", "out.nc"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedUnitConversion);
    assert!(!store.contains(Path::new("out.nc")));
    Ok(())
}

#[test]
fn test_missing_input_is_io_error() -> Result<()> {
    let store = MemoryStore::new();
    let err = run(&store, &Conventions::builtin(), "tmax").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    Ok(())
}
