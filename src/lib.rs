//! npcp_prep: climate-variable pre-processing for the NPCP intercomparison
//!
//! Takes one variable from a gridded NetCDF file and produces a file that
//! conforms to the NPCP conventions:
//!
//! 1. conservative regridding onto the fixed 0.2° Australian grid
//! 2. renaming to the canonical short name
//! 3. conversion to the canonical units
//! 4. replacement of variable and coordinate attributes with canonical sets
//! 5. stamping of the spatial extent and a provenance `history` attribute
//!
//! ## Module Organization
//!
//! - [`dataset`]: in-memory fields, attributes and datasets
//! - [`conventions`]: name table, attribute catalog and target units
//! - [`units`]: unit parsing and the fallback conversion strategies
//! - [`grid`]: the NPCP target grid and cell bounds
//! - [`regrid`]: area-weighted conservative regridding
//! - [`metadata`]: canonical renaming and attribute replacement
//! - [`provenance`]: construction of the `history` attribute
//! - [`pipeline`]: the stage sequence tying everything together
//! - [`data_source`] / [`netcdf_io`]: loading and writing datasets
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//! ```rust,no_run
//! use npcp_prep::prelude::*;
//!
//! let conventions = Conventions::builtin();
//! let grid = NPCP_GRID.build().unwrap();
//! let pipeline = Pipeline::new(&conventions, ConservativeRegridder, grid);
//!
//! let invocation = Invocation::new("tmax_raw.nc", "tmax", "tasmax_npcp.nc");
//! pipeline.run(&NetCDFStore, &NetCDFStore, &invocation).unwrap();
//! ```

pub mod cli;
pub mod conventions;
pub mod data_source;
pub mod dataset;
pub mod errors;
pub mod grid;
pub mod logging;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod pipeline;
pub mod provenance;
pub mod regrid;
pub mod units;

pub use errors::{ErrorKind, NpcpError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::conventions::Conventions;
    pub use crate::data_source::{DatasetReader, DatasetWriter, MemoryStore};
    pub use crate::dataset::{AttrValue, Attributes, Dataset, Field};
    pub use crate::errors::{ErrorKind, NpcpError, Result};
    pub use crate::grid::{Grid, GridSpec, NPCP_GRID};
    pub use crate::metadata::MetadataNormalizer;
    pub use crate::netcdf_io::NetCDFStore;
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{Invocation, Pipeline, Stage};
    pub use crate::provenance::ProvenanceLog;
    pub use crate::regrid::{ConservativeRegridder, RegridMethod, Regridder};
    pub use crate::units::UnitConverter;
}
