//!
//! # Pic21 Internal Utilities Crate
//!
//! Shared plumbing for the `pic21` photonic-layout crates:
//! shared cell pointers, markup serialization, error helpers,
//! dependency ordering, and string-valued enumerations.
//!

pub mod ptr;
pub use ptr::*;

pub mod ser;
pub use ser::*;

pub mod error;
pub use error::*;

pub mod context;
pub use context::*;

pub mod dep_order;
pub use dep_order::*;

pub mod enumstr;
pub use enumstr::*;
