//! Defines command-line interface options using `clap` for npcp-prep.

use clap::Parser;
use std::path::PathBuf;

/// Pre-process one climate variable onto the NPCP grid
#[derive(Parser, Debug)]
#[command(
    name = "npcp-prep",
    version,
    about = "Regrid, rename, unit-convert and relabel one variable for the NPCP intercomparison"
)]
pub struct Args {
    /// Input NetCDF file
    pub infile: PathBuf,

    /// Variable to process, as named in the input file
    pub var: String,

    /// Output NetCDF file
    pub outfile: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for regridding. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// JSON file extending the built-in name, attribute and unit tables
    #[arg(long)]
    pub conventions: Option<PathBuf>,
}
