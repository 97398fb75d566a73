//!
//! # Pic21 Converters
//!
//! Command-line programs and their library cores:
//!
//! * `markup2gds` builds a [markup::MaskFile] and writes it to GDSII.
//! * `pic2sim` exports a [markup::MaskFile]'s top cell as dielectric prisms for simulation.
//!

pub mod logging;
pub use logging::init_logging;

pub mod markup;
pub use markup::*;
