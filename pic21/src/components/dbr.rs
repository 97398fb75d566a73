//!
//! # Distributed Bragg Reflector
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::component::{Built, Component};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Rect};
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

/// # DBR
///
/// The core tapers to `w_phc` over `taper_length`, runs for `length`, and tapers back.
/// Rectangular blocks of `period * dc`, spanning the full `wg_width`, are centered on the reflector.
///
/// With `fins`, the reflector is drawn in `dbr_wgt`, and side-wall fins of `fin_size`
/// are added at either end on the `wgt` core layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Dbr {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub period: f64,
    /// Duty cycle
    pub dc: f64,
    /// Core width between the blocks
    pub w_phc: f64,
    pub taper_length: f64,
    pub fins: bool,
    /// Fin (x, y) size
    pub fin_size: (f64, f64),
    pub dbr_wgt: Option<WaveguideTemplate>,
}
impl Default for Dbr {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            period: 0.,
            dc: 0.5,
            w_phc: 0.,
            taper_length: 20.,
            fins: false,
            fin_size: (0.2, 0.05),
            dbr_wgt: None,
        }
    }
}
impl Dbr {
    pub fn new(wgt: WaveguideTemplate, length: f64, period: f64, dc: f64, w_phc: f64) -> Self {
        Self {
            wgt,
            length,
            period,
            dc,
            w_phc,
            ..Default::default()
        }
    }
    /// Total length, including both tapers
    pub fn total_length(&self) -> f64 {
        self.length + 2. * self.taper_length
    }
}
impl Component for Dbr {
    fn kind(&self) -> &'static str {
        "dbr"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let side = self.wgt.resolve()?;
        let wgt = match (self.fins, &self.dbr_wgt) {
            (false, _) => side.clone(),
            (true, Some(dbr_wgt)) => dbr_wgt.resolve()?,
            (true, None) => return PicError::invalid("DBR fins require a dbr_wgt"),
        };
        if self.w_phc > wgt.wg_width {
            return PicError::invalid(format!(
                "w_phc ({}) must not exceed the waveguide width ({})",
                self.w_phc, wgt.wg_width
            ));
        }
        if !(self.period > 0.) || !(0. ..=1.).contains(&self.dc) || self.length < 0. {
            return PicError::invalid(format!(
                "DBR requires a positive period and dc within [0, 1], got {} and {}",
                self.period, self.dc
            ));
        }
        let total = self.total_length();
        let mut layout = Layout::default();

        let mut core = PathBuilder::new(wgt.wg_width, Point::origin(), 0.);
        core.segment(self.taper_length, Some(self.w_phc))
            .segment(self.length, None)
            .segment(self.taper_length, Some(wgt.wg_width));
        layout.add_polygons(wgt.wg_layer, core.into_polygons());
        for (w, layer) in wgt.stack().iter().skip(1) {
            let mut clad = PathBuilder::new(*w, Point::origin(), 0.);
            clad.segment(total, None);
            layout.add_polygons(*layer, clad.into_polygons());
        }

        let num_blocks = (total / self.period).floor() as usize;
        let block = self.period * self.dc;
        let start =
            self.taper_length + self.length / 2. - (num_blocks as f64 - 1.) * self.period / 2. - block / 2.;
        let half = wgt.wg_width / 2.;
        for i in 0..num_blocks {
            let x = start + i as f64 * self.period;
            layout.add(
                wgt.wg_layer,
                Rect::new(Point::new(x, -half), Point::new(x + block, half)),
            );
        }

        if self.fins {
            let (fx, fy) = self.fin_size;
            let num_fins = (wgt.wg_width / (2. * fy)).floor() as usize;
            let y0 = -(num_fins as f64) * fy + fy / 2.;
            for i in 0..num_fins {
                let y = y0 + 2. * fy * i as f64;
                layout.add(side.wg_layer, Rect::new(Point::new(0., y), Point::new(fx, y + fy)));
                layout.add(
                    side.wg_layer,
                    Rect::new(Point::new(total - fx, y), Point::new(total, y + fy)),
                );
            }
        }
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((total, 0.), Direction::EAST));
        Ok(Built { layout, ports })
    }
}
