//! NetCDF loading and writing
//!
//! Loading decodes CF packing (`_FillValue`, `missing_value`, `scale_factor`,
//! `add_offset`) into `f64` values with NaN for missing data. Writing goes to a
//! temporary sibling file that is renamed over the destination only once the
//! whole dataset has been written.

use crate::data_source::{DatasetReader, DatasetWriter};
use crate::dataset::{AttrValue, Attributes, Dataset, Field};
use crate::errors::Result;
use ndarray::{ArrayD, IxDyn};
use netcdf::AttributeValue;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FILL_VALUE_ATTR: &str = "_FillValue";
const PACKING_ATTRS: [&str; 4] = [FILL_VALUE_ATTR, "missing_value", "scale_factor", "add_offset"];

/// Reads and writes datasets as NetCDF files
#[derive(Debug, Default, Clone, Copy)]
pub struct NetCDFStore;

impl DatasetReader for NetCDFStore {
    fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        let file = netcdf::open(path)?;
        let mut dataset = Dataset::new();

        for attr in file.attributes() {
            match from_netcdf(attr.value()?) {
                Some(value) => {
                    dataset.attrs.insert(attr.name().to_string(), value);
                }
                None => warn!("Skipped unsupported global attribute type for '{}'", attr.name()),
            }
        }

        for var in file.variables() {
            let name = var.name().to_string();
            let data_type = format!("{:?}", var.vartype()).to_lowercase();
            if ["char", "string", "compound", "opaque", "vlen", "enum"]
                .iter()
                .any(|t| data_type.contains(t))
            {
                warn!("Skipped non-numeric variable '{}' ({})", name, data_type);
                continue;
            }

            let dims: Vec<String> = var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect();
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

            let mut attrs = Attributes::new();
            for attr in var.attributes() {
                match from_netcdf(attr.value()?) {
                    Some(value) => {
                        attrs.insert(attr.name().to_string(), value);
                    }
                    None => warn!(
                        "Skipped unsupported attribute type for '{}:{}'",
                        name,
                        attr.name()
                    ),
                }
            }

            let raw = var.get_values::<f64, _>(..)?;
            let mut values = ArrayD::from_shape_vec(IxDyn(&shape), raw)?;
            decode_cf_packing(&mut values, &mut attrs);

            let mut field = Field::new(name, dims, values)?;
            field.attrs = attrs;
            dataset.insert(field);
        }

        debug!(
            "Loaded {} with variables {:?}",
            path.display(),
            dataset.variable_names().collect::<Vec<_>>()
        );
        Ok(dataset)
    }
}

impl DatasetWriter for NetCDFStore {
    fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let staging = staging_path(path);
        if staging.exists() {
            fs::remove_file(&staging)?;
        }

        match write_netcdf(dataset, &staging) {
            Ok(()) => {
                fs::rename(&staging, path)?;
                Ok(())
            }
            Err(e) => {
                if staging.exists() {
                    if let Err(cleanup) = fs::remove_file(&staging) {
                        warn!("Could not remove {}: {}", staging.display(), cleanup);
                    }
                }
                Err(e)
            }
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.nc".to_string());
    path.with_file_name(format!(".{}.{}.partial", file_name, std::process::id()))
}

fn write_netcdf(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut file = netcdf::create(path)?;

    for (dim, len) in dataset.dimension_sizes()? {
        file.add_dimension(&dim, len)?;
    }

    for (name, value) in &dataset.attrs {
        match value {
            AttrValue::Text(v) => file.add_attribute(name, v.as_str())?,
            AttrValue::Texts(v) => file.add_attribute(name, v.clone())?,
            AttrValue::Float(v) => file.add_attribute(name, *v)?,
            AttrValue::Floats(v) => file.add_attribute(name, v.clone())?,
            AttrValue::Int(v) => file.add_attribute(name, *v)?,
            AttrValue::Ints(v) => file.add_attribute(name, v.clone())?,
        };
    }

    let bounds_names: BTreeSet<&str> = dataset
        .fields()
        .filter_map(|f| f.attrs.get("bounds").and_then(AttrValue::as_text))
        .collect();

    for field in dataset.fields() {
        let dim_refs: Vec<&str> = field.dims.iter().map(String::as_str).collect();
        let mut var = file.add_variable::<f64>(&field.name, &dim_refs)?;

        let is_data = !field.is_coordinate() && !bounds_names.contains(field.name.as_str());
        if is_data && !field.attrs.contains_key(FILL_VALUE_ATTR) {
            var.put_attribute(FILL_VALUE_ATTR, f64::NAN)?;
        }

        for (name, value) in &field.attrs {
            match value {
                AttrValue::Text(v) => var.put_attribute(name, v.as_str())?,
                AttrValue::Texts(v) => var.put_attribute(name, v.clone())?,
                AttrValue::Float(v) => var.put_attribute(name, *v)?,
                AttrValue::Floats(v) => var.put_attribute(name, v.clone())?,
                AttrValue::Int(v) => var.put_attribute(name, *v)?,
                AttrValue::Ints(v) => var.put_attribute(name, v.clone())?,
            };
        }

        var.put(field.values.view(), ..)?;
    }

    Ok(())
}

/// Mask fill/missing values to NaN and unpack scaled data, consuming the
/// packing attributes
fn decode_cf_packing(values: &mut ArrayD<f64>, attrs: &mut Attributes) {
    let [fill, missing, scale, offset] =
        PACKING_ATTRS.map(|key| attrs.remove(key).and_then(|v| v.as_f64()));
    let scale = scale.unwrap_or(1.0);
    let offset = offset.unwrap_or(0.0);
    let is_missing = |v: f64| Some(v) == fill || Some(v) == missing;

    values.mapv_inplace(|v| {
        if is_missing(v) {
            f64::NAN
        } else {
            v * scale + offset
        }
    });
}

fn from_netcdf(value: AttributeValue) -> Option<AttrValue> {
    Some(match value {
        AttributeValue::Str(s) => AttrValue::Text(s),
        AttributeValue::Strs(ss) => AttrValue::Texts(ss),
        AttributeValue::Double(v) => AttrValue::Float(v),
        AttributeValue::Doubles(vs) => AttrValue::Floats(vs),
        AttributeValue::Float(v) => AttrValue::Float(f64::from(v)),
        AttributeValue::Floats(vs) => AttrValue::Floats(vs.into_iter().map(f64::from).collect()),
        AttributeValue::Schar(v) => AttrValue::Int(i64::from(v)),
        AttributeValue::Schars(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        AttributeValue::Uchar(v) => AttrValue::Int(i64::from(v)),
        AttributeValue::Uchars(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        AttributeValue::Short(v) => AttrValue::Int(i64::from(v)),
        AttributeValue::Shorts(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        AttributeValue::Ushort(v) => AttrValue::Int(i64::from(v)),
        AttributeValue::Ushorts(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        AttributeValue::Int(v) => AttrValue::Int(i64::from(v)),
        AttributeValue::Ints(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        AttributeValue::Uint(v) => AttrValue::Int(i64::from(v)),
        AttributeValue::Uints(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        AttributeValue::Longlong(v) => AttrValue::Int(v),
        AttributeValue::Longlongs(vs) => AttrValue::Ints(vs),
        AttributeValue::Ulonglong(v) => AttrValue::Int(i64::try_from(v).ok()?),
        AttributeValue::Ulonglongs(vs) => AttrValue::Ints(
            vs.into_iter()
                .map(i64::try_from)
                .collect::<std::result::Result<_, _>>()
                .ok()?,
        ),
        #[allow(unreachable_patterns)]
        _ => return None,
    })
}
