//!
//! # Mask Markup to Simulation Geometry CLI
//!
//! Builds a mask file's top cell and writes the dielectric prisms
//! of its layers, per a material stack, for the MEEP transmission simulator.
//!

use clap::Parser;
use std::error::Error;

use pic21converters::{init_logging, pic2sim, Pic2SimOptions};

/// Simulation Geometry Exporter
/// Converts the top cell of a JSON, YAML, or TOML mask file into dielectric prisms.
#[derive(Parser)]
pub struct ProgramOptions {
    /// Input Mask File
    #[arg(short = 'i', long)]
    pub inp: String,
    /// Material Stack File
    #[arg(short = 's', long)]
    pub stack: String,
    /// Output File
    #[arg(short = 'o', long)]
    pub out: String,
    /// Output Format. One of ("json", "yaml", "toml"). Defaults to the output file's extension.
    #[arg(short = 'f', long, default_value = "")]
    pub fmt: String,
    /// Verbose Output Mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<ProgramOptions> for Pic2SimOptions {
    fn from(opts: ProgramOptions) -> Self {
        Self {
            inp: opts.inp,
            stack: opts.stack,
            out: opts.out,
            fmt: opts.fmt,
            verbose: opts.verbose,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let options: Pic2SimOptions = ProgramOptions::parse().into();
    init_logging(options.verbose);
    pic2sim(&options)?;
    Ok(())
}
