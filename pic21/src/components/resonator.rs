//!
//! # Disk and Ring Resonators
//!
//! Each couples to a bus waveguide running from the origin EAST.
//! A non-zero `wrap_angle` bends the bus partway around the resonator,
//! keeping the coupling gap constant along the wrapped section.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI, TAU};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use super::StackPath;
use crate::component::{Built, Component};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::path::round;
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

/// # Disk Resonator
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Disk {
    pub wgt: WaveguideTemplate,
    pub radius: f64,
    /// Edge-to-edge distance between the bus and the disk
    pub coupling_gap: f64,
    /// Angle (radians) over which the bus wraps around the disk, within `[0, pi]`
    pub wrap_angle: f64,
    /// +1 places the disk above the bus, -1 below
    pub parity: i8,
}
impl Default for Disk {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            radius: 0.,
            coupling_gap: 0.,
            wrap_angle: 0.,
            parity: 1,
        }
    }
}
impl Disk {
    pub fn new(wgt: WaveguideTemplate, radius: f64, coupling_gap: f64) -> Self {
        Self {
            wgt,
            radius,
            coupling_gap,
            ..Default::default()
        }
    }
}
impl Component for Disk {
    fn kind(&self) -> &'static str {
        "disk"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let coupled = Coupled {
            radius: self.radius,
            coupling_gap: self.coupling_gap,
            wrap_angle: self.wrap_angle,
            parity: self.parity,
        };
        coupled.build(&self.wgt, None)
    }
}

/// # Ring Resonator
///
/// As [Disk], with the resonator reduced to an annulus of the template's `wg_width`.
/// Its outer edge lies at `radius`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Ring {
    pub wgt: WaveguideTemplate,
    pub radius: f64,
    pub coupling_gap: f64,
    pub wrap_angle: f64,
    pub parity: i8,
}
impl Default for Ring {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            radius: 0.,
            coupling_gap: 0.,
            wrap_angle: 0.,
            parity: 1,
        }
    }
}
impl Ring {
    pub fn new(wgt: WaveguideTemplate, radius: f64, coupling_gap: f64) -> Self {
        Self {
            wgt,
            radius,
            coupling_gap,
            ..Default::default()
        }
    }
}
impl Component for Ring {
    fn kind(&self) -> &'static str {
        "ring"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let coupled = Coupled {
            radius: self.radius,
            coupling_gap: self.coupling_gap,
            wrap_angle: self.wrap_angle,
            parity: self.parity,
        };
        let inner = self.radius - self.wgt.resolve()?.wg_width;
        if !(inner > 0.) {
            return PicError::invalid(format!(
                "Ring radius ({}) must exceed the waveguide width",
                self.radius
            ));
        }
        coupled.build(&self.wgt, Some(inner))
    }
}

/// Bus-coupled resonator geometry shared by [Disk] and [Ring]
struct Coupled {
    radius: f64,
    coupling_gap: f64,
    wrap_angle: f64,
    parity: i8,
}
impl Coupled {
    /// Draw the bus and a resonator whose core has `inner_radius`, if any
    fn build(&self, wgt: &WaveguideTemplate, inner_radius: Option<f64>) -> PicResult<Built> {
        let wgt = wgt.resolve()?;
        if self.parity != 1 && self.parity != -1 {
            return PicError::invalid(format!("parity must be +1 or -1, got {}", self.parity));
        }
        if !(0. ..=PI).contains(&self.wrap_angle) {
            return PicError::invalid(format!(
                "wrap_angle must lie within [0, pi], got {}",
                self.wrap_angle
            ));
        }
        if !(self.radius > 0.) || self.coupling_gap < 0. {
            return PicError::invalid(format!(
                "Resonators require a positive radius and non-negative coupling_gap, got {} and {}",
                self.radius, self.coupling_gap
            ));
        }
        let (r, p) = (self.radius, self.parity as f64);
        let rp = r + wgt.wg_width / 2. + self.coupling_gap;
        let mut bus = StackPath::new(&wgt, Point::origin(), 0.);

        let (bus_length, center) = if self.wrap_angle == 0. {
            bus.segment(2. * r);
            (2. * r, Point::new(r, p * rp))
        } else {
            let theta = self.wrap_angle / 2.;
            let (dx, dy) = (rp * theta.sin(), rp * (1. - theta.cos()));
            let bus_length = (2. * r).max(4. * dx);
            let straight = (bus_length - 4. * dx) / 2.;
            let xcenter = match 4. * dx < bus_length {
                true => r,
                false => 2. * dx,
            };
            let n1 = 2 * wgt.num_points_arc(theta, rp);
            let n2 = 2 * wgt.num_points_arc(2. * theta, rp);
            let a = p * FRAC_PI_2;
            bus.segment(straight)
                .arc(rp, a, a - p * theta, n1)
                .arc(rp, -a - p * theta, -a + p * theta, n2)
                .arc(rp, a + p * theta, a, n1)
                .segment(straight);
            (bus_length, Point::new(xcenter, p * (rp - 2. * dy)))
        };

        let mut layout = Layout::default();
        bus.draw(&mut layout);
        let npts = wgt.num_points_arc(TAU, r);
        layout.add(
            wgt.wg_layer,
            round(center, r, inner_radius.unwrap_or(0.), 0., TAU, npts),
        );
        for (w, layer) in wgt.stack().iter().skip(1) {
            let clad_r = r + (w - wgt.wg_width) / 2.;
            let npts = wgt.num_points_arc(TAU, clad_r);
            layout.add(*layer, round(center, clad_r, 0., 0., TAU, npts));
        }
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((bus_length, 0.), Direction::EAST));
        Ok(Built { layout, ports })
    }
}
