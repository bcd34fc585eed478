//! Entry point for npcp-prep.
//! Handles CLI parsing, logging and thread setup, then runs the pre-processing pipeline.

use clap::Parser;
use npcp_prep::cli::Args;
use npcp_prep::conventions::Conventions;
use npcp_prep::grid::NPCP_GRID;
use npcp_prep::logging::init_tracing;
use npcp_prep::netcdf_io::NetCDFStore;
use npcp_prep::parallel::ParallelConfig;
use npcp_prep::pipeline::{Invocation, Pipeline};
use npcp_prep::regrid::ConservativeRegridder;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!(
                "Error processing '{}' from {}: {e}",
                args.var,
                args.infile.display()
            );
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    ParallelConfig::new(args.threads).setup_global_pool()?;

    let conventions = match &args.conventions {
        Some(path) => Conventions::from_overlay_file(path)?,
        None => Conventions::builtin(),
    };

    let command = std::env::args().collect::<Vec<_>>().join(" ");
    let invocation =
        Invocation::new(&args.infile, &args.var, &args.outfile).with_command(command);

    let pipeline = Pipeline::new(&conventions, ConservativeRegridder, NPCP_GRID.build()?);
    let store = NetCDFStore;
    pipeline.run(&store, &store, &invocation)?;

    println!(
        "✅ Saved {} from {} to {}",
        conventions.names.resolve(&args.var),
        args.infile.display(),
        args.outfile.display()
    );
    Ok(())
}
