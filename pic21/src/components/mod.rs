//!
//! # Component Library
//!
//! The parametric cells. Each is a plain serde struct implementing [Component](crate::Component),
//! drawn in its local frame: input at the origin facing WEST, body extending EAST.
//! Routed components ([Waveguide], [MetalRoute], [BBend]) are the exception,
//! drawing their traces in the coordinates of their parent.
//!

// Local imports
use crate::data::{LayerSpec, Layout};
use crate::geom::Point;
use crate::path::PathBuilder;
use crate::template::{WaveguideTemplate, WgType};

pub mod alignment;
pub use alignment::*;
pub mod bend;
pub use bend::*;
pub mod cavity;
pub use cavity::*;
pub mod coupler;
pub use coupler::*;
pub mod dbr;
pub use dbr::*;
pub mod electrical;
pub use electrical::*;
pub mod grating;
pub use grating::*;
pub mod mmi;
pub use mmi::*;
pub mod mzi;
pub use mzi::*;
pub mod resonator;
pub use resonator::*;
pub mod spiral;
pub use spiral::*;
pub mod stripslot;
pub use stripslot::*;
pub mod taper;
pub use taper::*;
pub mod waveguide;
pub use waveguide::*;
pub mod ysplitter;
pub use ysplitter::*;

/// # Stacked Path
///
/// One [PathBuilder] per entry of a waveguide stack, all following the same centerline.
/// The core entry is split into two rails for slot waveguides.
#[derive(Debug, Clone)]
pub(crate) struct StackPath {
    paths: Vec<(LayerSpec, PathBuilder)>,
}
impl StackPath {
    /// Core and cladding paths of `wgt`, from `origin` heading along `direction` (radians)
    pub(crate) fn new(wgt: &WaveguideTemplate, origin: Point, direction: f64) -> Self {
        let core = match wgt.wg_type {
            WgType::Slot => PathBuilder::new(wgt.rail(), origin, direction).rails(2, wgt.rail_dist()),
            _ => PathBuilder::new(wgt.wg_width, origin, direction),
        };
        let mut me = Self::cladding(wgt, origin, direction);
        me.paths.insert(0, (wgt.wg_layer, core));
        me
    }
    /// Cladding paths only, for every stack entry beyond the core
    pub(crate) fn cladding(wgt: &WaveguideTemplate, origin: Point, direction: f64) -> Self {
        let paths = wgt
            .stack()
            .iter()
            .skip(1)
            .map(|(w, layer)| (*layer, PathBuilder::new(*w, origin, direction)))
            .collect();
        Self { paths }
    }
    pub(crate) fn segment(&mut self, length: f64) -> &mut Self {
        for (_, p) in self.paths.iter_mut() {
            p.segment(length, None);
        }
        self
    }
    pub(crate) fn turn(&mut self, radius: f64, angle: f64, num_points: usize) -> &mut Self {
        for (_, p) in self.paths.iter_mut() {
            p.turn(radius, angle, None, num_points);
        }
        self
    }
    pub(crate) fn arc(
        &mut self,
        radius: f64,
        initial_angle: f64,
        final_angle: f64,
        num_points: usize,
    ) -> &mut Self {
        for (_, p) in self.paths.iter_mut() {
            p.arc(radius, initial_angle, final_angle, None, num_points);
        }
        self
    }
    pub(crate) fn parametric(&mut self, f: impl Fn(f64) -> Point, evaluations: usize) -> &mut Self {
        for (_, p) in self.paths.iter_mut() {
            p.parametric(&f, None, evaluations);
        }
        self
    }
    /// Centerline length of the first path
    pub(crate) fn length(&self) -> f64 {
        self.paths.first().map(|(_, p)| p.length()).unwrap_or_default()
    }
    /// Add all polygons to `layout`
    pub(crate) fn draw(self, layout: &mut Layout) {
        for (layer, p) in self.paths {
            layout.add_polygons(layer, p.into_polygons());
        }
    }
}
