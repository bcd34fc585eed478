//! End-to-end processing of one (input file, variable, output file) invocation
//!
//! The pipeline is a linear sequence of stages:
//!
//! `Loaded -> Regridded -> Converted -> MetadataFixed -> Stamped -> Written`
//!
//! No stage is retried or re-entered and any error aborts the run before the
//! writer is called, so a failed run never produces an output file.

use crate::conventions::Conventions;
use crate::data_source::{DatasetReader, DatasetWriter};
use crate::dataset::{AttrValue, Dataset, HISTORY_ATTR};
use crate::errors::{NpcpError, Result};
use crate::grid::Grid;
use crate::metadata::MetadataNormalizer;
use crate::provenance::ProvenanceLog;
use crate::regrid::{RegridMethod, Regridder};
use crate::units::UnitConverter;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loaded,
    Regridded,
    Converted,
    MetadataFixed,
    Stamped,
    Written,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Regridded => "regridded",
            Self::Converted => "renamed & unit-converted",
            Self::MetadataFixed => "metadata fixed",
            Self::Stamped => "stamped",
            Self::Written => "written",
        };
        f.write_str(name)
    }
}

/// The three required inputs of a run plus the command line recorded in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub infile: PathBuf,
    pub var: String,
    pub outfile: PathBuf,
    pub command: String,
}

impl Invocation {
    pub fn new(
        infile: impl Into<PathBuf>,
        var: impl Into<String>,
        outfile: impl Into<PathBuf>,
    ) -> Self {
        let (infile, var, outfile) = (infile.into(), var.into(), outfile.into());
        let command = format!(
            "npcp-prep {} {} {}",
            infile.display(),
            var,
            outfile.display()
        );
        Self {
            infile,
            var,
            outfile,
            command,
        }
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

/// Sequences regridding, unit conversion, metadata normalization and stamping
pub struct Pipeline<'a, R> {
    conventions: &'a Conventions,
    converter: UnitConverter,
    regridder: R,
    grid: Grid,
}

impl<'a, R: Regridder> Pipeline<'a, R> {
    pub fn new(conventions: &'a Conventions, regridder: R, grid: Grid) -> Self {
        Self {
            conventions,
            converter: UnitConverter::default(),
            regridder,
            grid,
        }
    }

    #[must_use]
    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Load, process and write one invocation, returning the written dataset
    pub fn run(
        &self,
        reader: &impl DatasetReader,
        writer: &impl DatasetWriter,
        invocation: &Invocation,
    ) -> Result<Dataset> {
        let input = reader.read_dataset(&invocation.infile)?;
        stage(Stage::Loaded, &invocation.infile.display().to_string());

        let output = self.process(&input, invocation)?;

        writer.write_dataset(&output, &invocation.outfile)?;
        stage(Stage::Written, &invocation.outfile.display().to_string());
        Ok(output)
    }

    /// Run every stage between loading and writing
    pub fn process(&self, input: &Dataset, invocation: &Invocation) -> Result<Dataset> {
        let var = invocation.var.as_str();

        let mut output = self
            .regridder
            .regrid(input, var, &self.grid, RegridMethod::Conservative)?;
        stage(Stage::Regridded, var);

        let canonical = self.conventions.names.resolve(var);
        if !self.conventions.catalog.contains(canonical) {
            return Err(NpcpError::MissingAttributeSet {
                name: canonical.to_string(),
            });
        }
        let target_units = self.conventions.target_units.target_units(canonical)?;
        self.converter
            .convert_field(output.variable_mut(var)?, target_units)?;
        stage(Stage::Converted, canonical);

        let canonical = MetadataNormalizer::new(self.conventions).normalize(&mut output, var)?;
        stage(Stage::MetadataFixed, &canonical);

        output.attrs.extend(self.grid.extent_attributes());
        stage(Stage::Stamped, &canonical);

        let mut log = ProvenanceLog::new(invocation.command.as_str());
        if let Some(history) = input.history() {
            log = log.with_infile_log(invocation.infile.to_string_lossy(), history);
        }
        output
            .attrs
            .insert(HISTORY_ATTR.to_string(), AttrValue::Text(log.to_string()));

        Ok(output)
    }
}

fn stage(stage: Stage, subject: &str) {
    info!("Stage {}: {}", stage, subject);
}
