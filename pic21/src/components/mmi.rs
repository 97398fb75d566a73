//!
//! # Multi-Mode Interference Couplers
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::component::{Built, Component};
use crate::data::{LayerSpec, Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Polygon};
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

/// Draw an S-shaped arm: a turn by `angle`, then back by `-angle`, each of `radius`.
/// The width changes from `start_width` to `first_width` over the first turn,
/// and to `second_width` over the second.
#[allow(clippy::too_many_arguments)]
fn s_arm(
    layout: &mut Layout,
    layer: LayerSpec,
    wgt: &WaveguideTemplate,
    origin: Point,
    angle: f64,
    start_width: f64,
    first_width: Option<f64>,
    second_width: Option<f64>,
) {
    let r = wgt.bend_radius;
    let npts = wgt.num_points_arc(angle, r);
    let mut path = PathBuilder::new(start_width, origin, 0.);
    path.turn(r, angle, first_width, npts)
        .turn(r, -angle, second_width, npts);
    layout.add_polygons(layer, path.into_polygons());
}

/// Shared geometry checks
fn validate(angle: f64, taper_width: f64, wg_sep: f64, width: f64, length: f64) -> PicResult<()> {
    if !(0. ..=FRAC_PI_2).contains(&angle) {
        return PicError::invalid(format!(
            "MMI angle must lie within [0, pi/2], got {}",
            angle
        ));
    }
    if !(length > 0.) || !(width > 0.) {
        return PicError::invalid(format!(
            "MMI length and width must be positive, got {} and {}",
            length, width
        ));
    }
    if wg_sep < taper_width || wg_sep > width - taper_width {
        return PicError::invalid(format!(
            "MMI wg_sep ({}) must lie within [taper_width, width - taper_width] = [{}, {}]",
            wg_sep,
            taper_width,
            width - taper_width
        ));
    }
    Ok(())
}

/// # 1x2 MMI
///
/// Input taper, rectangular multi-mode region of `length` by `width`,
/// and two S-bent output arms separated by `wg_sep` where they leave the multi-mode region.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Mmi1x2 {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub width: f64,
    /// Angle (radians) of the output arms' S-bends
    pub angle: f64,
    /// Defaults to the template's `wg_width`
    pub taper_width: Option<f64>,
    pub taper_length: f64,
    /// Defaults to a third of the `width`
    pub wg_sep: Option<f64>,
}
impl Default for Mmi1x2 {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            width: 0.,
            angle: PI / 6.,
            taper_width: None,
            taper_length: 20.,
            wg_sep: None,
        }
    }
}
impl Mmi1x2 {
    pub fn new(wgt: WaveguideTemplate, length: f64, width: f64) -> Self {
        Self {
            wgt,
            length,
            width,
            ..Default::default()
        }
    }
    pub fn taper_width(&self) -> f64 {
        self.taper_width.unwrap_or(self.wgt.wg_width)
    }
    pub fn wg_sep(&self) -> f64 {
        self.wg_sep.unwrap_or(self.width / 3.)
    }
    /// Extent along the propagation axis, from input to outputs
    pub fn total_length(&self) -> f64 {
        self.length + 2. * self.wgt.bend_radius * self.angle.sin() + self.taper_length
    }
}
impl Component for Mmi1x2 {
    fn kind(&self) -> &'static str {
        "mmi1x2"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let (tw, sep, tl) = (self.taper_width(), self.wg_sep(), self.taper_length);
        validate(self.angle, tw, sep, self.width, self.length)?;
        let dy = 2. * wgt.bend_radius * (1. - self.angle.cos());
        let mut layout = Layout::default();

        let mut core = PathBuilder::new(wgt.wg_width, Point::origin(), 0.);
        core.segment(tl, Some(tw));
        layout.add_polygons(wgt.wg_layer, core.into_polygons());
        let mut body = PathBuilder::new(self.width, Point::new(tl, 0.), 0.);
        body.segment(self.length, None);
        layout.add_polygons(wgt.wg_layer, body.into_polygons());

        let x1 = tl + self.length;
        for side in [1., -1.] {
            let origin = Point::new(x1, side * sep / 2.);
            s_arm(&mut layout, wgt.wg_layer, &wgt, origin, side * self.angle, tw, Some(wgt.wg_width), None);
        }
        for (w, layer) in wgt.stack().iter().skip(1) {
            let c = (w - wgt.wg_width) / 2.;
            let half = |y: f64| y + c;
            let lower = vec![
                Point::new(0., -half(wgt.wg_width / 2.)),
                Point::new(tl, -half(self.width / 2.)),
                Point::new(x1, -half(self.width / 2.)),
                Point::new(x1 + tl, -half(sep / 2. + wgt.wg_width / 2.)),
            ];
            let mut points = lower.clone();
            points.extend(lower.iter().rev().map(|p| Point::new(p.x, -p.y)));
            layout.add(*layer, Polygon::new(points));
            for side in [1., -1.] {
                let origin = Point::new(x1, side * sep / 2.);
                s_arm(&mut layout, *layer, &wgt, origin, side * self.angle, tw + 2. * c, Some(*w), None);
            }
        }
        let (x, y) = (self.total_length(), sep / 2. + dy);
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output_top", Port::new((x, y), Direction::EAST))
            .with("output_bot", Port::new((x, -y), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

/// # 2x2 MMI
///
/// Two S-bent inputs, a rectangular multi-mode region, and two S-bent outputs.
/// The top input sits at the origin; the bottom input below it by `wg_sep` plus both arms' offsets.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Mmi2x2 {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub width: f64,
    pub angle: f64,
    pub taper_width: Option<f64>,
    pub wg_sep: Option<f64>,
}
impl Default for Mmi2x2 {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            width: 0.,
            angle: PI / 6.,
            taper_width: None,
            wg_sep: None,
        }
    }
}
impl Mmi2x2 {
    pub fn new(wgt: WaveguideTemplate, length: f64, width: f64) -> Self {
        Self {
            wgt,
            length,
            width,
            ..Default::default()
        }
    }
    pub fn taper_width(&self) -> f64 {
        self.taper_width.unwrap_or(self.wgt.wg_width)
    }
    pub fn wg_sep(&self) -> f64 {
        self.wg_sep.unwrap_or(self.width / 3.)
    }
    /// S-bend extents, along and across the propagation axis
    fn arm_offsets(&self) -> (f64, f64) {
        let r = self.wgt.bend_radius;
        (2. * r * self.angle.sin(), 2. * r * (1. - self.angle.cos()))
    }
    /// Extent along the propagation axis, from inputs to outputs
    pub fn total_length(&self) -> f64 {
        2. * self.arm_offsets().0 + self.length
    }
    /// Distance between the two inputs, and between the two outputs
    pub fn port_separation(&self) -> f64 {
        self.wg_sep() + 2. * self.arm_offsets().1
    }
}
impl Component for Mmi2x2 {
    fn kind(&self) -> &'static str {
        "mmi2x2"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let (tw, sep, a) = (self.taper_width(), self.wg_sep(), self.angle);
        validate(a, tw, sep, self.width, self.length)?;
        let (dx, dy) = self.arm_offsets();
        let bot = -self.port_separation();
        let mut layout = Layout::default();

        let mut body = PathBuilder::new(self.width, Point::new(dx, -sep / 2. - dy), 0.);
        body.segment(self.length, None);
        layout.add_polygons(wgt.wg_layer, body.into_polygons());
        for (y, side) in [(0., -1.), (bot, 1.)] {
            s_arm(&mut layout, wgt.wg_layer, &wgt, Point::new(0., y), side * a, wgt.wg_width, None, Some(tw));
            let origin = Point::new(dx + self.length, y + side * dy);
            s_arm(&mut layout, wgt.wg_layer, &wgt, origin, -side * a, tw, Some(wgt.wg_width), None);
        }
        for (w, layer) in wgt.stack().iter().skip(1) {
            let c = (w - wgt.wg_width) / 2.;
            let start_width = 2. * c + 2. * tw + sep;
            let mut clad = PathBuilder::new(start_width, Point::new(dx - c, -sep / 2. - dy), 0.);
            clad.segment(c, Some(self.width + 2. * c))
                .segment(self.length, None)
                .segment(c, Some(start_width));
            layout.add_polygons(*layer, clad.into_polygons());
            for (y, side) in [(0., -1.), (bot, 1.)] {
                s_arm(&mut layout, *layer, &wgt, Point::new(0., y), side * a, *w, None, Some(tw + 2. * c));
                let origin = Point::new(dx + self.length, y + side * dy);
                s_arm(&mut layout, *layer, &wgt, origin, -side * a, tw + 2. * c, Some(*w), None);
            }
        }
        let x = self.total_length();
        let ports = Portlist::new()
            .with("input_top", Port::new(Point::origin(), Direction::WEST))
            .with("input_bot", Port::new((0., bot), Direction::WEST))
            .with("output_top", Port::new((x, 0.), Direction::EAST))
            .with("output_bot", Port::new((x, bot), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mmi1x2_ports() -> PicResult<()> {
        let mmi = Mmi1x2::new(WaveguideTemplate::default(), 50., 10.);
        let built = mmi.build(&mut Library::default())?;
        let top = built.ports.get("output_top")?;
        let r = 50.;
        let a = PI / 6.;
        assert_abs_diff_eq!(top.port.x, 50. + 2. * r * a.sin() + 20., epsilon = 1e-9);
        assert_abs_diff_eq!(top.port.y, 10. / 6. + 2. * r * (1. - a.cos()), epsilon = 1e-9);
        assert_eq!(built.ports.get("output_bot")?.port.y, -top.port.y);
        // Ports agree with where the arms end
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p1.x, top.port.x, epsilon = 1e-6);

        let bad = Mmi1x2 {
            wg_sep: Some(9.),
            ..mmi.clone()
        };
        assert!(matches!(
            bad.build(&mut Library::default()),
            Err(PicError::Validation(_))
        ));
        let steep = Mmi1x2 { angle: 2., ..mmi };
        assert!(steep.build(&mut Library::default()).is_err());
        Ok(())
    }
    #[test]
    fn mmi2x2_ports() -> PicResult<()> {
        let mmi = Mmi2x2::new(WaveguideTemplate::default(), 60., 12.);
        let built = mmi.build(&mut Library::default())?;
        let (dx, dy) = mmi.arm_offsets();
        let ob = built.ports.get("output_bot")?;
        assert_abs_diff_eq!(ob.port.x, 2. * dx + 60., epsilon = 1e-12);
        assert_abs_diff_eq!(ob.port.y, -4. - 2. * dy, epsilon = 1e-12);
        assert_eq!(built.ports.get("input_bot")?.direction, Direction::WEST);
        assert_eq!(built.ports.len(), 4);
        // Arms meet the inputs and outputs exactly
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p0.x, 0., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.x, 2. * dx + 60., epsilon = 1e-6);
        Ok(())
    }
}
