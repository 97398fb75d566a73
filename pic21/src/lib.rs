//!
//! # Pic21 Photonic Mask Generation
//!
//! Parametric cells ("PCells") for photonic integrated circuits:
//! waveguides routed through waypoints with bends, tapers, grating couplers,
//! MMIs, ring and disk resonators, spirals, Bragg reflectors, directional couplers,
//! Mach-Zehnder interferometers, and electrical routing, pads and vias.
//!
//! Components are drawn into a [Library] of hierarchical [Cell]s,
//! chained together through their named [Port]s,
//! combined into photoresist masks by [mask::build_mask],
//! and written to GDSII via [Library::save_gds].
//! The [sim] module exports dielectric geometry and drives external electromagnetic solvers.
//!

// Internal modules & re-exports
pub use pic21utils as utils;

pub mod bbox;
pub use bbox::*;

pub mod component;
pub use component::*;

pub mod components;

pub mod data;
pub use data::*;

pub mod dir;
pub use dir::*;

pub mod error;
pub use error::*;

pub mod gds;
pub use gds::GdsConverter;

pub mod geom;
pub use geom::*;

pub mod mask;

pub mod path;
pub use path::PathBuilder;

pub mod port;
pub use port::*;

pub mod sim;

pub mod template;
pub use template::*;

pub mod toolkit;

#[cfg(test)]
mod tests;
