//!
//! # Simulation Bridge
//!
//! Exports mask geometry as dielectric structures for the MEEP and MPB electromagnetic solvers,
//! launches them, and collects their transmission spectra.
//! Geometry files are written in any [SerializationFormat](crate::utils::SerializationFormat).
//!

pub mod export;
pub use export::*;

pub mod run;
pub use run::*;

pub mod stack;
pub use stack::*;
