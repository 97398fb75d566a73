//!
//! # Directional Couplers
//!
//! Evanescent couplers between two parallel waveguides: the routed [DirectionalCoupler],
//! the arc-bent [FullCoupler], [BroadbandDirectionalCoupler] and [AdiabaticCoupler],
//! and the grating-assisted [ContraDirectionalCoupler] and [SwgContraDirectionalCoupler].
//!
//! All share one port convention. Parity +1 places the waveguide starting at the origin on top;
//! -1 places it below its partner. Ports `input_top`, `input_bot`, `output_top` and `output_bot`
//! always name the upper and lower waveguides.
//!

// Std-Lib
use std::f64::consts::PI;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use super::Waveguide;
use crate::component::{Built, Component, Placement};
use crate::data::{LayerSpec, Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Polygon, Rect};
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

/// Extra straight length around each angled section, leaving room for its bends
const PADDING: f64 = 0.01;

/// # Directional Coupler
///
/// Two waveguides which angle toward each other by `angle`, run parallel for `length`
/// separated by `gap`, and angle back apart.
/// Parity +1 places the second waveguide below the first; -1 above.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DirectionalCoupler {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub gap: f64,
    pub angle: f64,
    pub parity: i8,
}
impl Default for DirectionalCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            gap: 0.,
            angle: PI / 6.,
            parity: 1,
        }
    }
}
impl DirectionalCoupler {
    pub fn new(wgt: WaveguideTemplate, length: f64, gap: f64) -> Self {
        Self {
            wgt,
            length,
            gap,
            ..Default::default()
        }
    }
    /// Straight length before each bend, and the (x, y) extent of each angled section
    fn extents(&self) -> (f64, f64, f64) {
        let dlx = (self.wgt.bend_radius * (self.angle / 2.).tan()).abs();
        let ax = 2. * (dlx + PADDING) * self.angle.cos();
        let ay = 2. * (dlx + PADDING) * self.angle.sin();
        (dlx, ax, ay)
    }
    /// Distance from inputs to outputs
    pub fn total_length(&self) -> f64 {
        let (dlx, ax, _) = self.extents();
        4. * dlx + 2. * PADDING + 2. * ax + self.length
    }
    /// Center-to-center distance between the two input (and the two output) ports
    pub fn port_separation(&self) -> f64 {
        let (_, _, ay) = self.extents();
        2. * ay + self.gap + self.wgt.wg_width
    }
    /// Traces of the waveguide starting at the origin, and of its partner
    fn traces(&self, wgt: &WaveguideTemplate) -> (Vec<Point>, Vec<Point>) {
        let p = self.parity as f64;
        let (dlx, ax, ay) = self.extents();
        let ay = ay * p;
        let xs = [
            0.,
            dlx + PADDING,
            dlx + PADDING + ax,
            3. * dlx + PADDING + ax + self.length,
            3. * dlx + PADDING + 2. * ax + self.length,
            4. * dlx + 2. * PADDING + 2. * ax + self.length,
        ];
        let dys = [0., 0., -ay, -ay, 0., 0.];
        let y_partner = -(2. * ay.abs() + self.gap + wgt.wg_width) * p;
        let first = xs.iter().zip(dys).map(|(x, dy)| Point::new(*x, dy)).collect();
        let partner = xs
            .iter()
            .zip(dys)
            .map(|(x, dy)| Point::new(*x, y_partner - dy))
            .collect();
        (first, partner)
    }
}
impl Component for DirectionalCoupler {
    fn kind(&self) -> &'static str {
        "directional_coupler"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        if !(self.angle > 0. && self.angle <= PI / 2.) || self.gap < 0. || self.length < 0. {
            return PicError::invalid(format!(
                "DirectionalCoupler requires angle within (0, pi/2], non-negative gap and length; got {}, {}, {}",
                self.angle, self.gap, self.length
            ));
        }
        check_parity(self.parity)?;
        let (first, partner) = self.traces(&wgt);
        let mut layout = Layout::default();
        let first = lib.place(&mut layout, &Waveguide::new(first, wgt.clone()), Placement::default())?;
        let partner = lib.place(&mut layout, &Waveguide::new(partner, wgt), Placement::default())?;

        let (top, bot) = match self.parity {
            1 => (first, partner),
            _ => (partner, first),
        };
        let ports = Portlist::new()
            .with("input_top", top.get("input")?.clone())
            .with("input_bot", bot.get("input")?.clone())
            .with("output_top", top.get("output")?.clone())
            .with("output_bot", bot.get("output")?.clone());
        Ok(Built { layout, ports })
    }
}

/// Broadband directional couplers are drawn exactly as [DirectionalCoupler]s
pub type BBDirectionalCoupler = DirectionalCoupler;

fn check_parity(parity: i8) -> PicResult<()> {
    if parity != 1 && parity != -1 {
        return PicError::invalid(format!("parity must be +1 or -1, got {}", parity));
    }
    Ok(())
}

fn check_angle(angle: f64) -> PicResult<()> {
    if !(angle > 0. && angle <= PI / 2.) {
        return PicError::invalid(format!("Coupler angle must lie within (0, pi/2], got {}", angle));
    }
    Ok(())
}

/// (x, y) extent of an S-bend made of two opposing turns by `angle` on `radius`
fn s_bend_extent(radius: f64, angle: f64) -> (f64, f64) {
    (2. * radius * angle.sin(), 2. * radius * (1. - angle.cos()))
}

/// Ports of a four-port coupler `length` long.
/// `top` and `bot` are the (input, output) heights of the upper and lower waveguides.
fn four_ports(length: f64, top: (f64, f64), bot: (f64, f64)) -> Portlist {
    Portlist::new()
        .with("input_top", Port::new((0., top.0), Direction::WEST))
        .with("input_bot", Port::new((0., bot.0), Direction::WEST))
        .with("output_top", Port::new((length, top.1), Direction::EAST))
        .with("output_bot", Port::new((length, bot.1), Direction::EAST))
}

/// Draw one arm of an arc-bent coupler: an S-bend toward its partner, a straight of `length`,
/// and an S-bend back out. `side` is the sign of the first turn.
/// `widths` are the final widths of each of these five pieces, where they change.
#[allow(clippy::too_many_arguments)]
fn arc_arm(
    layout: &mut Layout,
    layer: LayerSpec,
    wgt: &WaveguideTemplate,
    origin: Point,
    side: f64,
    angle: f64,
    length: f64,
    start_width: f64,
    widths: [Option<f64>; 5],
) {
    let r = wgt.bend_radius;
    let npts = wgt.num_points_arc(angle, r);
    let mut path = PathBuilder::new(start_width, origin, 0.);
    path.turn(r, side * angle, widths[0], npts)
        .turn(r, -side * angle, widths[1], npts)
        .segment(length, widths[2])
        .turn(r, -side * angle, widths[3], npts)
        .turn(r, side * angle, widths[4], npts);
    layout.add_polygons(layer, path.into_polygons());
}

/// Draw an [arc_arm] on every layer of the template's stack.
/// Cladding widths follow the core's, grown by each entry's extra width.
fn arc_arm_stack(
    layout: &mut Layout,
    wgt: &WaveguideTemplate,
    origin: Point,
    side: f64,
    angle: f64,
    length: f64,
    widths: [Option<f64>; 5],
) {
    for (w, layer) in wgt.stack() {
        let grow = w - wgt.wg_width;
        let widths = widths.map(|o| o.map(|x| x + grow));
        arc_arm(layout, layer, wgt, origin, side, angle, length, w, widths);
    }
}

/// Side-wall fins of `fin_size`, at both ends of each waveguide centered at heights `ys`
fn draw_fins(
    layout: &mut Layout,
    layer: LayerSpec,
    fin_size: (f64, f64),
    wg_width: f64,
    length: f64,
    ys: [f64; 2],
) {
    let (fx, fy) = fin_size;
    let num_fins = (wg_width / (2. * fy)).floor() as usize;
    let y0 = -(num_fins as f64) * fy + fy / 2.;
    for yc in ys {
        for i in 0..num_fins {
            let y = yc + y0 + 2. * fy * i as f64;
            layout.add(layer, Rect::new(Point::new(0., y), Point::new(fx, y + fy)));
            layout.add(layer, Rect::new(Point::new(length - fx, y), Point::new(length, y + fy)));
        }
    }
}

/// # Full Coupler
///
/// Two arc-bent waveguides of unequal widths, `wg_width + dw` and `wg_width - dw`,
/// which swap widths along the coupling length for complete power transfer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct FullCoupler {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub gap: f64,
    /// Width change of each waveguide
    pub dw: f64,
    pub angle: f64,
    pub parity: i8,
}
impl Default for FullCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            gap: 0.,
            dw: 0.,
            angle: PI / 6.,
            parity: 1,
        }
    }
}
impl FullCoupler {
    pub fn new(wgt: WaveguideTemplate, length: f64, gap: f64, dw: f64) -> Self {
        Self {
            wgt,
            length,
            gap,
            dw,
            ..Default::default()
        }
    }
    /// Distance from inputs to outputs
    pub fn total_length(&self) -> f64 {
        2. * s_bend_extent(self.wgt.bend_radius, self.angle).0 + self.length
    }
}
impl Component for FullCoupler {
    fn kind(&self) -> &'static str {
        "full_coupler"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let w = wgt.wg_width;
        let top = [Some(w + self.dw), None, Some(w - self.dw), None, Some(w)];
        let bot = [Some(w - self.dw), None, Some(w + self.dw), None, Some(w)];
        tapered_coupler(&wgt, self.length, self.gap, self.dw, self.angle, self.parity, top, bot)
    }
}

/// # Broadband Directional Coupler
///
/// Arc-bent waveguides which widen and narrow by `dw` where they meet,
/// then taper back to `wg_width` along the coupling length.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BroadbandDirectionalCoupler {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub gap: f64,
    pub dw: f64,
    pub angle: f64,
    pub parity: i8,
}
impl Default for BroadbandDirectionalCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            gap: 0.,
            dw: 0.,
            angle: PI / 6.,
            parity: 1,
        }
    }
}
impl BroadbandDirectionalCoupler {
    pub fn new(wgt: WaveguideTemplate, length: f64, gap: f64, dw: f64) -> Self {
        Self {
            wgt,
            length,
            gap,
            dw,
            ..Default::default()
        }
    }
}
impl Component for BroadbandDirectionalCoupler {
    fn kind(&self) -> &'static str {
        "broadband_directional_coupler"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let w = wgt.wg_width;
        let top = [Some(w + self.dw), None, Some(w), None, Some(w)];
        let bot = [Some(w - self.dw), None, Some(w), None, Some(w)];
        tapered_coupler(&wgt, self.length, self.gap, self.dw, self.angle, self.parity, top, bot)
    }
}

/// Shared by [FullCoupler] and [BroadbandDirectionalCoupler], whose arms differ only in their width profiles.
/// `first` and `partner` are the per-piece widths of the arm starting at the origin and of its partner.
#[allow(clippy::too_many_arguments)]
fn tapered_coupler(
    wgt: &WaveguideTemplate,
    length: f64,
    gap: f64,
    dw: f64,
    angle: f64,
    parity: i8,
    first: [Option<f64>; 5],
    partner: [Option<f64>; 5],
) -> PicResult<Built> {
    check_parity(parity)?;
    check_angle(angle)?;
    if gap < 0. || length < 0. || dw.abs() >= wgt.wg_width {
        return PicError::invalid(format!(
            "Coupler requires non-negative gap and length, and |dw| below wg_width; got {}, {}, {}",
            gap, length, dw
        ));
    }
    let p = parity as f64;
    let (ax, ay) = s_bend_extent(wgt.bend_radius, angle);
    let sep = p * (2. * ay + gap + wgt.wg_width);
    let mut layout = Layout::default();
    arc_arm_stack(&mut layout, wgt, Point::origin(), -p, angle, length, first);
    arc_arm_stack(&mut layout, wgt, Point::new(0., -sep), p, angle, length, partner);

    let distx = 2. * ax + length;
    let ports = match parity {
        1 => four_ports(distx, (0., 0.), (-sep, -sep)),
        _ => four_ports(distx, (-sep, -sep), (0., 0.)),
    };
    Ok(Built { layout, ports })
}

/// # Adiabatic Coupler
///
/// Arc-bent waveguides of widths `wg_width + dw` and `wg_width - dw`,
/// which approach from `fargap` to `gap` over `length1`, then taper back to `wg_width` over `length2`.
/// The outputs are `gap` rather than `fargap` apart.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AdiabaticCoupler {
    pub wgt: WaveguideTemplate,
    pub length1: f64,
    pub length2: f64,
    pub gap: f64,
    pub fargap: f64,
    pub dw: f64,
    pub angle: f64,
    pub parity: i8,
}
impl Default for AdiabaticCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length1: 0.,
            length2: 0.,
            gap: 0.,
            fargap: 0.,
            dw: 0.,
            angle: PI / 6.,
            parity: 1,
        }
    }
}
impl AdiabaticCoupler {
    pub fn new(
        wgt: WaveguideTemplate,
        length1: f64,
        length2: f64,
        gap: f64,
        fargap: f64,
        dw: f64,
    ) -> Self {
        Self {
            wgt,
            length1,
            length2,
            gap,
            fargap,
            dw,
            ..Default::default()
        }
    }
    /// Draw one core arm. `shift` is the arm's offset toward its partner over `length1`.
    fn core_arm(
        &self,
        layout: &mut Layout,
        wgt: &WaveguideTemplate,
        origin: Point,
        side: f64,
        width: f64,
        shift: f64,
    ) {
        let (r, w) = (wgt.bend_radius, wgt.wg_width);
        let npts = wgt.num_points_arc(self.angle, r);
        let mut bend_in = PathBuilder::new(w, origin, 0.);
        bend_in
            .turn(r, side * self.angle, Some(width), npts)
            .turn(r, -side * self.angle, None, npts);
        let a = bend_in.end();
        layout.add_polygons(wgt.wg_layer, bend_in.into_polygons());

        let b = Point::new(a.x + self.length1, a.y + shift);
        let h = width / 2.;
        let approach = vec![
            Point::new(a.x, a.y - h),
            Point::new(b.x, b.y - h),
            Point::new(b.x, b.y + h),
            Point::new(a.x, a.y + h),
        ];
        layout.add(wgt.wg_layer, Polygon::new(approach));

        let mut bend_out = PathBuilder::new(width, b, 0.);
        bend_out
            .segment(self.length2, Some(w))
            .turn(r, -side * self.angle, None, npts)
            .turn(r, side * self.angle, None, npts);
        layout.add_polygons(wgt.wg_layer, bend_out.into_polygons());
    }
}
impl Component for AdiabaticCoupler {
    fn kind(&self) -> &'static str {
        "adiabatic_coupler"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_parity(self.parity)?;
        check_angle(self.angle)?;
        let w = wgt.wg_width;
        if self.gap < 0. || self.fargap < self.gap || self.dw.abs() >= w {
            return PicError::invalid(format!(
                "AdiabaticCoupler requires 0 <= gap <= fargap and |dw| below wg_width; got {}, {}, {}",
                self.gap, self.fargap, self.dw
            ));
        }
        if self.length1 < 0. || self.length2 < 0. {
            return PicError::invalid("AdiabaticCoupler lengths must be non-negative");
        }
        let p = self.parity as f64;
        let (ax, ay) = s_bend_extent(wgt.bend_radius, self.angle);
        let sep = p * (2. * ay + self.fargap + w);
        let dy = p * (self.fargap - self.gap) / 2.;
        let coupled = self.length1 + self.length2;

        let mut layout = Layout::default();
        self.core_arm(&mut layout, &wgt, Point::origin(), -p, w + self.dw, -dy);
        self.core_arm(&mut layout, &wgt, Point::new(0., -sep), p, w - self.dw, dy);
        let a = self.angle;
        for (cw, layer) in wgt.stack().into_iter().skip(1) {
            arc_arm(&mut layout, layer, &wgt, Point::origin(), -p, a, coupled, cw, [None; 5]);
            arc_arm(&mut layout, layer, &wgt, Point::new(0., -sep), p, a, coupled, cw, [None; 5]);
        }

        let distx = 2. * ax + coupled;
        let (straight, cross) = ((0., -dy), (-sep, -sep + dy));
        let ports = match self.parity {
            1 => four_ports(distx, straight, cross),
            _ => four_ports(distx, cross, straight),
        };
        Ok(Built { layout, ports })
    }
}

/// # Contra-Directional Coupler
///
/// Two arc-bent waveguides of coupling-region widths `width_top` and `width_bot`,
/// with rectangular grating teeth of `period * dc` protruding into the gap from each:
/// `dw_top` from the upper waveguide and `dw_bot` from the lower.
///
/// With `fins`, the coupler is drawn in `contradc_wgt`, and side-wall fins of `fin_size`
/// are added at either end on the `wgt` core layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ContraDirectionalCoupler {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub gap: f64,
    pub period: f64,
    /// Duty cycle
    pub dc: f64,
    pub angle: f64,
    /// Defaults to the template's `wg_width`
    pub width_top: Option<f64>,
    /// Defaults to the template's `wg_width`
    pub width_bot: Option<f64>,
    /// Defaults to half the `gap`
    pub dw_top: Option<f64>,
    /// Defaults to half the `gap`
    pub dw_bot: Option<f64>,
    /// Place the lower waveguide's input at the origin
    pub input_bot: bool,
    pub fins: bool,
    pub fin_size: (f64, f64),
    pub contradc_wgt: Option<WaveguideTemplate>,
}
impl Default for ContraDirectionalCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            gap: 0.,
            period: 0.,
            dc: 0.5,
            angle: PI / 6.,
            width_top: None,
            width_bot: None,
            dw_top: None,
            dw_bot: None,
            input_bot: false,
            fins: false,
            fin_size: (0.2, 0.05),
            contradc_wgt: None,
        }
    }
}
impl ContraDirectionalCoupler {
    pub fn new(wgt: WaveguideTemplate, length: f64, gap: f64, period: f64, dc: f64) -> Self {
        Self {
            wgt,
            length,
            gap,
            period,
            dc,
            ..Default::default()
        }
    }
}
impl Component for ContraDirectionalCoupler {
    fn kind(&self) -> &'static str {
        "contra_directional_coupler"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let side = self.wgt.resolve()?;
        let wgt = finned_template(&side, self.fins, &self.contradc_wgt)?;
        check_angle(self.angle)?;
        check_grating(self.period, self.dc)?;
        if self.gap < 0. || self.length < 0. {
            return PicError::invalid("ContraDirectionalCoupler gap and length must be non-negative");
        }
        let w = wgt.wg_width;
        let (wt, wb) = (self.width_top.unwrap_or(w), self.width_bot.unwrap_or(w));
        let (ax, ay) = s_bend_extent(wgt.bend_radius, self.angle);
        let distx = 2. * ax + self.length;
        let sep = 2. * ay + self.gap + (wt + wb) / 2.;
        let y_top = if self.input_bot { sep } else { 0. };
        let y_bot = y_top - sep;

        let mut layout = Layout::default();
        for (cw, layer) in wgt.stack() {
            let grow = cw - w;
            let top = [None, Some(wt + grow), None, Some(cw), None];
            let bot = [None, Some(wb + grow), None, Some(cw), None];
            let (a, l) = (self.angle, self.length);
            arc_arm(&mut layout, layer, &wgt, Point::new(0., y_top), -1., a, l, cw, top);
            arc_arm(&mut layout, layer, &wgt, Point::new(0., y_bot), 1., a, l, cw, bot);
        }

        // Teeth, centered along the coupling length, on either side of the gap's midline
        let num_blocks = (self.length / self.period).floor() as usize;
        let block = self.period * self.dc;
        let start = distx / 2. - (num_blocks as f64 - 1.) * self.period / 2. - block / 2.;
        let mid = y_top - ay - wt / 2. - self.gap / 2.;
        let dw_top = self.dw_top.unwrap_or(self.gap / 2.);
        let dw_bot = self.dw_bot.unwrap_or(self.gap / 2.);
        let (lower, upper) = (mid - self.gap / 2., mid + self.gap / 2.);
        for i in 0..num_blocks {
            let x = start + i as f64 * self.period;
            let (p0, p1) = (Point::new(x, lower), Point::new(x + block, lower + dw_bot));
            layout.add(wgt.wg_layer, Rect::new(p0, p1));
            let (p0, p1) = (Point::new(x, upper - dw_top), Point::new(x + block, upper));
            layout.add(wgt.wg_layer, Rect::new(p0, p1));
        }
        if self.fins {
            draw_fins(&mut layout, side.wg_layer, self.fin_size, w, distx, [y_top, y_bot]);
        }
        let ports = four_ports(distx, (y_top, y_top), (y_bot, y_bot));
        Ok(Built { layout, ports })
    }
}

/// # Sub-Wavelength-Grating Contra-Directional Coupler
///
/// An arc-bent upper waveguide beside a straight lower one, whose core tapers to `w_phc_bot`
/// (or, at zero, breaks into isolated blocks) along the coupling region,
/// overlaid with teeth of `period * dc` spanning the lower waveguide's `width_bot`.
///
/// With `apodization_top`, the upper waveguide approaches along a Gaussian profile,
/// from `apodization_far_dist` at either end of the coupling region to `gap` at its center.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SwgContraDirectionalCoupler {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub gap: f64,
    pub period: f64,
    pub dc: f64,
    pub taper_length: f64,
    /// Width of the lower waveguide's core between the teeth
    pub w_phc_bot: f64,
    pub top_angle: f64,
    pub width_top: Option<f64>,
    pub width_bot: Option<f64>,
    /// Grating length beyond each end of the coupling region, before the tapers
    pub extra_swg_length: f64,
    pub input_bot: bool,
    pub apodization_top: bool,
    pub apodization_far_dist: f64,
    /// Gaussian curvature, in inverse square microns. Defaults to `(10 / length)^2`.
    pub apodization_curv: Option<f64>,
    pub fins: bool,
    pub fin_size: (f64, f64),
    pub contradc_wgt: Option<WaveguideTemplate>,
}
impl Default for SwgContraDirectionalCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            length: 0.,
            gap: 0.,
            period: 0.,
            dc: 0.5,
            taper_length: 0.,
            w_phc_bot: 0.,
            top_angle: PI / 6.,
            width_top: None,
            width_bot: None,
            extra_swg_length: 0.,
            input_bot: false,
            apodization_top: false,
            apodization_far_dist: 1.,
            apodization_curv: None,
            fins: false,
            fin_size: (0.2, 0.05),
            contradc_wgt: None,
        }
    }
}
/// Samples along an apodized coupling region
const APODIZATION_EVALUATIONS: usize = 600;

impl SwgContraDirectionalCoupler {
    pub fn new(
        wgt: WaveguideTemplate,
        length: f64,
        gap: f64,
        period: f64,
        dc: f64,
        taper_length: f64,
        w_phc_bot: f64,
    ) -> Self {
        Self {
            wgt,
            length,
            gap,
            period,
            dc,
            taper_length,
            w_phc_bot,
            ..Default::default()
        }
    }
    /// Gap at either end of the coupling region
    fn far_gap(&self) -> f64 {
        match self.apodization_top {
            true => self.apodization_far_dist,
            false => self.gap,
        }
    }
}
impl Component for SwgContraDirectionalCoupler {
    fn kind(&self) -> &'static str {
        "swg_contra_directional_coupler"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let side = self.wgt.resolve()?;
        let wgt = finned_template(&side, self.fins, &self.contradc_wgt)?;
        check_angle(self.top_angle)?;
        check_grating(self.period, self.dc)?;
        let (r, w, l) = (wgt.bend_radius, wgt.wg_width, self.length);
        let (ax, ay) = s_bend_extent(r, self.top_angle);
        let (tl, extra) = (self.taper_length, self.extra_swg_length);
        if self.gap < 0. || l < 0. || tl < 0. || extra < 0. || 2. * tl > l {
            return PicError::invalid(format!(
                "SwgContraDirectionalCoupler requires non-negative dimensions and 2 * taper_length <= length; got taper {} and length {}",
                tl, l
            ));
        }
        if tl + extra > ax {
            return PicError::invalid(format!(
                "taper_length + extra_swg_length ({}) exceeds the upper waveguide's bend length ({}); increase bend_radius or top_angle",
                tl + extra,
                ax
            ));
        }
        let far = self.far_gap();
        if far < self.gap {
            return PicError::invalid("apodization_far_dist must not be below the gap");
        }
        let (wt, wb) = (self.width_top.unwrap_or(w), self.width_bot.unwrap_or(w));
        let distx = 2. * ax + l;
        let sep = ay + far + (wt + wb) / 2.;
        let y_top = if self.input_bot { sep } else { 0. };
        let y_bot = y_top - sep;
        let npts = wgt.num_points_arc(self.top_angle, r);
        let a = self.top_angle;
        let mut layout = Layout::default();

        // Upper waveguide
        let mut top = PathBuilder::new(w, Point::new(0., y_top), 0.);
        top.turn(r, -a, Some(wt), npts).turn(r, a, None, npts);
        if self.apodization_top {
            let curv = self.apodization_curv.unwrap_or((10. / l).powi(2));
            if !(curv > 0.) || !(l > 0.) {
                return PicError::invalid("Apodization requires a positive length and curvature");
            }
            let mag = far - self.gap;
            let gauss = move |t: f64| (-curv * (l * t - l / 2.).powi(2)).exp();
            let edge = gauss(0.);
            // Zero offset at either end, `mag` at the center
            let f = move |t: f64| Point::new(l * t, -mag * (gauss(t) - edge) / (1. - edge));
            top.parametric(f, None, APODIZATION_EVALUATIONS);
        } else {
            top.segment(l, None);
        }
        top.turn(r, a, None, npts).turn(r, -a, Some(w), npts);
        layout.add_polygons(wgt.wg_layer, top.into_polygons());
        for (cw, layer) in wgt.stack().into_iter().skip(1) {
            let grow = cw - w;
            let widths = [None, Some(wt + grow), None, Some(cw), None];
            arc_arm(&mut layout, layer, &wgt, Point::new(0., y_top), -1., a, l, cw, widths);
        }

        // Lower waveguide
        let approach = ax - tl - extra;
        if self.w_phc_bot > 1e-6 {
            let mut bot = PathBuilder::new(w, Point::new(0., y_bot), 0.);
            bot.segment(approach, Some(wb))
                .segment(tl, Some(self.w_phc_bot))
                .segment(l + 2. * extra, None)
                .segment(tl, Some(wb))
                .segment(approach, Some(w));
            layout.add_polygons(wgt.wg_layer, bot.into_polygons());
        } else {
            // Disconnected: each end tapers to a point
            for (x, dir) in [(0., 0.), (distx, PI)] {
                let mut bot = PathBuilder::new(w, Point::new(x, y_bot), dir);
                bot.segment(approach, Some(wb)).segment(tl, Some(0.));
                layout.add_polygons(wgt.wg_layer, bot.into_polygons());
            }
        }
        for (cw, layer) in wgt.stack().into_iter().skip(1) {
            let grow = cw - w;
            let mut clad = PathBuilder::new(cw, Point::new(0., y_bot), 0.);
            clad.segment(ax, Some(wb + grow)).segment(l, None).segment(ax, Some(cw));
            layout.add_polygons(layer, clad.into_polygons());
        }

        // Teeth across the lower waveguide, centered along the grating
        if (self.w_phc_bot - wb).abs() > 1e-6 {
            let num_blocks = ((l + 2. * (tl + extra)) / self.period).floor() as usize;
            let block = self.period * self.dc;
            let start = distx / 2. - (num_blocks as f64 - 1.) * self.period / 2. - block / 2.;
            let y1 = y_bot + wb / 2.;
            for i in 0..num_blocks {
                let x = start + i as f64 * self.period;
                let (p0, p1) = (Point::new(x, y1 - wb), Point::new(x + block, y1));
                layout.add(wgt.wg_layer, Rect::new(p0, p1));
            }
        }
        if self.fins {
            draw_fins(&mut layout, side.wg_layer, self.fin_size, w, distx, [y_top, y_bot]);
        }
        let ports = four_ports(distx, (y_top, y_top), (y_bot, y_bot));
        Ok(Built { layout, ports })
    }
}

/// Template of a grating coupler's body: `wgt` itself, or with `fins`, the separate `body`
fn finned_template(
    wgt: &WaveguideTemplate,
    fins: bool,
    body: &Option<WaveguideTemplate>,
) -> PicResult<WaveguideTemplate> {
    match (fins, body) {
        (false, _) => Ok(wgt.clone()),
        (true, Some(body)) => body.resolve(),
        (true, None) => PicError::invalid("Coupler fins require a contradc_wgt"),
    }
}

fn check_grating(period: f64, dc: f64) -> PicResult<()> {
    if !(period > 0.) || !(0. ..=1.).contains(&dc) {
        return PicError::invalid(format!(
            "Grating requires a positive period and dc within [0, 1], got {} and {}",
            period, dc
        ));
    }
    Ok(())
}
