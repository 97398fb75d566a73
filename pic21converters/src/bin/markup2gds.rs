//!
//! # Mask Markup to GDSII CLI
//!
//! Builds the components of a JSON, YAML, or TOML mask file into a top cell,
//! optionally combines their layers into masks, and writes GDSII.
//!

use clap::Parser;
use std::error::Error;

use pic21converters::{init_logging, markup2gds, Markup2GdsOptions};

// The doc-comment on `ProgramOptions` is displayed by the `clap`-generated help

/// Mask Markup to GDSII Converter
/// Builds the components listed in a JSON, YAML, or TOML mask file and writes them to GDSII.
#[derive(Parser)]
pub struct ProgramOptions {
    /// Input Mask File
    #[arg(short = 'i', long)]
    pub inp: String,
    /// Input Format. One of ("json", "yaml", "toml"). Defaults to the input file's extension.
    #[arg(short = 'f', long, default_value = "")]
    pub fmt: String,
    /// GDS Output File
    #[arg(short = 'o', long)]
    pub gds: String,
    /// Build masks for the templates listed in the input
    #[arg(long)]
    pub mask: bool,
    /// Verbose Output Mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<ProgramOptions> for Markup2GdsOptions {
    fn from(opts: ProgramOptions) -> Self {
        Self {
            inp: opts.inp,
            fmt: opts.fmt,
            gds: opts.gds,
            mask: opts.mask,
            verbose: opts.verbose,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let options: Markup2GdsOptions = ProgramOptions::parse().into();
    init_logging(options.verbose);
    markup2gds(&options)?;
    Ok(())
}
