//!
//! # Linear Taper
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::component::{Built, Component};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

/// # Taper
///
/// Linearly tapers the waveguide core from `wg_width` to `end_width` over `length`.
/// Each cladding entry tapers alongside, reaching `end_clad_width` on either side of the core,
/// then continues for `extra_clad_length`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Taper {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub end_width: f64,
    /// Defaults to the template's `clad_width`
    pub end_clad_width: Option<f64>,
    /// Defaults to twice the `end_clad_width`
    pub extra_clad_length: Option<f64>,
}
impl Taper {
    pub fn new(wgt: WaveguideTemplate, length: f64, end_width: f64) -> Self {
        Self {
            wgt,
            length,
            end_width,
            ..Default::default()
        }
    }
}
impl Component for Taper {
    fn kind(&self) -> &'static str {
        "taper"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        if !(self.length > 0.) || !(self.end_width > 0.) {
            return PicError::invalid(format!(
                "Taper requires positive length and end_width, got {} and {}",
                self.length, self.end_width
            ));
        }
        let end_clad = self.end_clad_width.unwrap_or(wgt.clad_width);
        let extra = self.extra_clad_length.unwrap_or(2. * end_clad);

        let mut layout = Layout::default();
        let mut core = PathBuilder::new(wgt.wg_width, Point::origin(), 0.);
        core.segment(self.length, Some(self.end_width));
        layout.add_polygons(wgt.wg_layer, core.into_polygons());

        for (w, layer) in wgt.stack().iter().skip(1) {
            let final_width = w + 2. * (end_clad - wgt.clad_width) + (self.end_width - wgt.wg_width);
            let mut clad = PathBuilder::new(*w, Point::origin(), 0.);
            clad.segment(self.length, Some(final_width)).segment(extra, None);
            layout.add_polygons(*layer, clad.into_polygons());
        }
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((self.length, 0.), Direction::EAST));
        Ok(Built { layout, ports })
    }
}
