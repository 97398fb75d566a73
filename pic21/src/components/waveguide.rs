//!
//! # Routed Waveguides
//!
//! A [Waveguide] follows a list of waypoints, replacing each corner with a circular
//! (or Euler) bend of the template's bend radius.
//!

// Std-Lib
use std::f64::consts::FRAC_PI_2;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// Local imports
use super::{EBend, StackPath};
use crate::component::{Built, Component, Placement};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Polygon};
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::{WaveguideTemplate, WgType};
use crate::toolkit::{get_exact_angle, normalize_angle, TOL};

/// # Waveguide
///
/// Routed through `trace`, in the coordinates of the cell it is placed in.
/// Every pair of adjacent segments must leave room for the bend between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Waveguide {
    pub trace: Vec<Point>,
    pub wgt: WaveguideTemplate,
}
impl Waveguide {
    /// Create a new [Waveguide] along `trace`
    pub fn new(trace: impl IntoIterator<Item = impl Into<Point>>, wgt: WaveguideTemplate) -> Self {
        Self {
            trace: trace.into_iter().map(|p| p.into()).collect(),
            wgt,
        }
    }
    /// The trace rounded to the micro-micron, and checked for redundant waypoints
    pub fn checked_trace(&self) -> PicResult<Vec<Point>> {
        let trace: Vec<Point> = self.trace.iter().map(|p| p.round_to(6)).collect();
        if trace.len() < 2 {
            return PicError::invalid(format!(
                "Waveguide traces require at least two points, got {}",
                trace.len()
            ));
        }
        check_waypoints(&trace)?;
        Ok(trace)
    }
    /// Centerline length, including bends
    pub fn length(&self) -> PicResult<f64> {
        let (_, length) = self.route(&mut Library::default())?;
        Ok(length)
    }
    /// Draw the waveguide, returning its layout and centerline length
    fn route(&self, lib: &mut Library) -> PicResult<(Layout, f64)> {
        let wgt = self.wgt.resolve()?;
        let trace = self.checked_trace()?;
        let mut layout = Layout::default();
        let length = match (wgt.euler_bend, wgt.wg_type) {
            (true, WgType::Strip) | (true, WgType::Slot) => {
                route_euler(&trace, &wgt, lib, &mut layout)?
            }
            _ => {
                let pieces = centerline(&trace, wgt.bend_radius)?;
                match wgt.wg_type {
                    WgType::Swg => draw_swg(&pieces, &trace, &wgt, &mut layout),
                    _ => {
                        let mut paths = StackPath::new(&wgt, trace[0], get_exact_angle(&trace[0], &trace[1]));
                        for piece in pieces.iter() {
                            piece.extend(&mut paths, &wgt);
                        }
                        paths.draw(&mut layout);
                    }
                }
                pieces.iter().map(|p| p.length()).sum()
            }
        };
        info!("Waveguide length: {}", length);
        Ok((layout, length))
    }
}
impl Component for Waveguide {
    fn kind(&self) -> &'static str {
        "waveguide"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let (layout, _) = self.route(lib)?;
        let trace = self.checked_trace()?;
        let n = trace.len();
        let ports = Portlist::new()
            .with(
                "input",
                Port::new(
                    trace[0],
                    Direction::from_angle(get_exact_angle(&trace[1], &trace[0])),
                ),
            )
            .with(
                "output",
                Port::new(
                    trace[n - 1],
                    Direction::from_angle(get_exact_angle(&trace[n - 2], &trace[n - 1])),
                ),
            );
        Ok(Built { layout, ports })
    }
}

/// Reject zero-length segments, and consecutive segments along the same axis,
/// each of which would leave a waypoint with no bend.
pub(crate) fn check_waypoints(trace: &[Point]) -> PicResult<()> {
    let (mut prev_dx, mut prev_dy) = (1., 1.);
    for w in trace.windows(2) {
        let dx = (w[1].x - w[0].x).abs() + 1e-10;
        let dy = (w[1].y - w[0].y).abs() + 1e-10;
        if (prev_dx <= TOL && dx <= TOL) || (prev_dy <= TOL && dy <= TOL) {
            return PicError::invalid(format!(
                "Unnecessary waypoint at {:?}. All waypoints must specify a valid bend.",
                w[0]
            ));
        }
        prev_dx = dx;
        prev_dy = dy;
    }
    Ok(())
}

/// Length taken off each segment adjacent to a corner turning by `turn` with `radius`
fn corner_dl(radius: f64, turn: f64) -> f64 {
    (radius * (turn / 2.).tan()).abs()
}

/// Check that segment `p0` to `p1` fits the bends at either of its ends
fn check_fit(p0: &Point, p1: &Point, dl: f64, prev_dl: f64, radius: f64) -> PicResult<()> {
    if dl + prev_dl > p0.dist(p1) + TOL {
        return PicError::geometry(format!(
            "Waypoints {:?} and {:?} are too close to accommodate the bend radius {} (they require {})",
            p0,
            p1,
            radius,
            dl + prev_dl
        ));
    }
    Ok(())
}

/// # Centerline Piece
/// Straight segment or circular arc of a routed centerline
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Piece {
    Straight {
        start: Point,
        direction: f64,
        length: f64,
    },
    Arc {
        center: Point,
        radius: f64,
        initial_angle: f64,
        sweep: f64,
    },
}
impl Piece {
    pub(crate) fn length(&self) -> f64 {
        match self {
            Piece::Straight { length, .. } => *length,
            Piece::Arc { radius, sweep, .. } => (radius * sweep).abs(),
        }
    }
    /// Location and heading at arc-length `s` along the piece
    fn at(&self, s: f64) -> (Point, f64) {
        match *self {
            Piece::Straight {
                start, direction, ..
            } => (start.translate(s, direction), direction),
            Piece::Arc {
                center,
                radius,
                initial_angle,
                sweep,
            } => {
                let a = initial_angle + sweep.signum() * s / radius;
                (center.translate(radius, a), a + sweep.signum() * FRAC_PI_2)
            }
        }
    }
    /// Continue `paths` along this piece
    fn extend(&self, paths: &mut StackPath, wgt: &WaveguideTemplate) {
        match *self {
            Piece::Straight { length, .. } => {
                debug!("Waveguide segment: {}", length);
                paths.segment(length);
            }
            Piece::Arc { radius, sweep, .. } => {
                debug!("Waveguide bend: {}", self.length());
                paths.turn(radius, sweep, wgt.num_points_arc(sweep, radius));
            }
        }
    }
    /// Core polygon covering arc-lengths `from` to `to` along the piece
    fn span(&self, from: f64, to: f64, width: f64, wgt: &WaveguideTemplate) -> Vec<Polygon> {
        let (start, heading) = self.at(from);
        let mut path = PathBuilder::new(width, start, heading);
        match *self {
            Piece::Straight { .. } => {
                path.segment(to - from, None);
            }
            Piece::Arc { radius, sweep, .. } => {
                let turn = sweep.signum() * (to - from) / radius;
                path.turn(radius, turn, None, wgt.num_points_arc(turn, radius));
            }
        }
        path.into_polygons()
    }
}

/// Convert `trace` to alternating straight and circular centerline pieces
pub(crate) fn centerline(trace: &[Point], radius: f64) -> PicResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut prev_dl = 0.;
    let mut start = trace[0];
    for i in 1..trace.len() - 1 {
        let start_angle = get_exact_angle(&trace[i - 1], &trace[i]);
        let next_angle = get_exact_angle(&trace[i], &trace[i + 1]);
        let turn = normalize_angle(next_angle - start_angle);
        let dl = corner_dl(radius, turn);
        check_fit(&trace[i - 1], &trace[i], dl, prev_dl, radius)?;

        let length = trace[i - 1].dist(&trace[i]) - dl - prev_dl;
        pieces.push(Piece::Straight {
            start,
            direction: start_angle,
            length,
        });
        let corner = start.translate(length, start_angle);
        if turn.abs() > 1e-9 {
            let side = turn.signum();
            pieces.push(Piece::Arc {
                center: corner.translate(radius, start_angle + side * FRAC_PI_2),
                radius,
                initial_angle: start_angle - side * FRAC_PI_2,
                sweep: turn,
            });
        }
        start = trace[i].translate(dl, next_angle);
        prev_dl = dl;
    }
    let n = trace.len();
    let last = trace[n - 2].dist(&trace[n - 1]) - prev_dl;
    if last < -TOL {
        return PicError::geometry(format!(
            "Waypoints {:?} and {:?} are too close to accommodate the bend radius {}",
            trace[n - 2],
            trace[n - 1],
            radius
        ));
    }
    pieces.push(Piece::Straight {
        start,
        direction: get_exact_angle(&trace[n - 2], &trace[n - 1]),
        length: last,
    });
    Ok(pieces)
}

/// Route `trace` with Euler-bend sub-cells at each corner, returning the centerline length
fn route_euler(
    trace: &[Point],
    wgt: &WaveguideTemplate,
    lib: &mut Library,
    layout: &mut Layout,
) -> PicResult<f64> {
    let mut paths = StackPath::new(wgt, trace[0], get_exact_angle(&trace[0], &trace[1]));
    let mut length = 0.;
    let mut prev_dl = 0.;
    for i in 1..trace.len() - 1 {
        let start_angle = get_exact_angle(&trace[i - 1], &trace[i]);
        let next_angle = get_exact_angle(&trace[i], &trace[i + 1]);
        let turn = normalize_angle(next_angle - start_angle);
        if turn.abs() <= 1e-9 {
            continue;
        }
        let bend = EBend::new(wgt.clone(), turn);
        let dl = bend.dist_to_vertex()?;
        check_fit(&trace[i - 1], &trace[i], dl, prev_dl, wgt.bend_radius)?;

        let seg = trace[i - 1].dist(&trace[i]) - dl - prev_dl;
        debug!("Waveguide segment: {}", seg);
        paths.segment(seg);
        length += paths.length();

        let bend_start = trace[i].translate(-dl, start_angle);
        let ports = lib.place(
            layout,
            &bend,
            Placement::new(bend_start, Direction::from_angle(start_angle)),
        )?;
        let bend_length = bend.bend_length()?;
        debug!("Waveguide bend: {}", bend_length);
        length += bend_length;
        // Continue from the bend's output
        let next = StackPath::new(wgt, ports.get("output")?.port, next_angle);
        std::mem::replace(&mut paths, next).draw(layout);
        prev_dl = dl;
    }
    let n = trace.len();
    let last = trace[n - 2].dist(&trace[n - 1]) - prev_dl;
    check_fit(&trace[n - 2], &trace[n - 1], 0., prev_dl, wgt.bend_radius)?;
    paths.segment(last);
    length += paths.length();
    paths.draw(layout);
    Ok(length)
}

/// Draw a sub-wavelength grating along `pieces`: a tooth of `period * duty_cycle` starting every `period`,
/// in phase across segments and bends, plus continuous cladding.
fn draw_swg(pieces: &[Piece], trace: &[Point], wgt: &WaveguideTemplate, layout: &mut Layout) {
    let tooth = wgt.period * wgt.duty_cycle;
    let total: f64 = pieces.iter().map(|p| p.length()).sum();
    let mut k = 0;
    loop {
        let (t0, t1) = (k as f64 * wgt.period, (k as f64 * wgt.period + tooth).min(total));
        if t0 >= total - TOL {
            break;
        }
        // Split each tooth among the pieces it overlaps
        let mut offset = 0.;
        for piece in pieces.iter() {
            let len = piece.length();
            let (a, b) = ((t0 - offset).max(0.), (t1 - offset).min(len));
            if b - a > TOL {
                layout.add_polygons(wgt.wg_layer, piece.span(a, b, wgt.wg_width, wgt));
            }
            offset += len;
        }
        k += 1;
    }
    let mut clad = StackPath::cladding(wgt, trace[0], get_exact_angle(&trace[0], &trace[1]));
    for piece in pieces.iter() {
        piece.extend(&mut clad, wgt);
    }
    clad.draw(layout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LayerSpec;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn l_trace() -> Vec<(f64, f64)> {
        vec![(0., 0.), (200., 0.), (200., 200.)]
    }
    #[test]
    fn l_shaped() -> PicResult<()> {
        let wg = Waveguide::new(l_trace(), WaveguideTemplate::default());
        let expected = 2. * 150. + PI / 2. * 50.;
        assert_abs_diff_eq!(wg.length()?, expected, epsilon = 1e-9);

        let built = wg.build(&mut Library::default())?;
        // Segment, bend and segment, on the core and cladding
        assert_eq!(built.layout.elems.len(), 6);
        let input = built.ports.get("input")?;
        assert_eq!(input.port, Point::new(0., 0.));
        assert_eq!(input.direction, Direction::WEST);
        let output = built.ports.get("output")?;
        assert_eq!(output.port, Point::new(200., 200.));
        assert_eq!(output.direction, Direction::NORTH);
        Ok(())
    }
    #[test]
    fn too_close() {
        let wg = Waveguide::new(
            vec![(0., 0.), (40., 0.), (40., 200.)],
            WaveguideTemplate::default(),
        );
        assert!(matches!(wg.length(), Err(PicError::Geometry(_))));
    }
    #[test]
    fn unnecessary_waypoint() {
        let wg = Waveguide::new(
            vec![(0., 0.), (100., 0.), (200., 0.)],
            WaveguideTemplate::default(),
        );
        assert!(matches!(wg.checked_trace(), Err(PicError::Validation(_))));
        let single = Waveguide::new(vec![(0., 0.)], WaveguideTemplate::default());
        assert!(single.checked_trace().is_err());
    }
    #[test]
    fn slot_rails() -> PicResult<()> {
        let wgt = WaveguideTemplate {
            wg_type: WgType::Slot,
            wg_width: 0.7,
            slot: 0.1,
            ..Default::default()
        };
        let built = Waveguide::new(vec![(0., 0.), (50., 0.)], wgt).build(&mut Library::default())?;
        let core: Vec<_> = built
            .layout
            .elems
            .iter()
            .filter(|e| e.layer == LayerSpec::new(1, 0))
            .collect();
        assert_eq!(core.len(), 2);
        Ok(())
    }
    #[test]
    fn swg_teeth() -> PicResult<()> {
        let wgt = WaveguideTemplate {
            wg_type: WgType::Swg,
            period: 1.0,
            duty_cycle: 0.5,
            ..Default::default()
        };
        let built = Waveguide::new(vec![(0., 0.), (10., 0.)], wgt).build(&mut Library::default())?;
        let teeth = built
            .layout
            .elems
            .iter()
            .filter(|e| e.layer == LayerSpec::new(1, 0))
            .count();
        assert_eq!(teeth, 10);

        let wgt = WaveguideTemplate {
            wg_type: WgType::Swg,
            period: 1.0,
            bend_radius: 10.,
            ..Default::default()
        };
        let wg = Waveguide::new(vec![(0., 0.), (20., 0.), (20., 20.)], wgt);
        let built = wg.build(&mut Library::default())?;
        // Teeth straddling the bend's ends are split in two
        let teeth = built
            .layout
            .elems
            .iter()
            .filter(|e| e.layer == LayerSpec::new(1, 0))
            .count();
        let nominal = (wg.length()? / 1.0).ceil() as usize;
        assert!(teeth >= nominal && teeth <= nominal + 2);
        Ok(())
    }
    #[test]
    fn euler_routing() -> PicResult<()> {
        let wgt = WaveguideTemplate {
            bend_radius: 10.,
            euler_bend: true,
            ..Default::default()
        };
        let eff = wgt.effective_bend_radius();
        let wg = Waveguide::new(l_trace(), wgt.clone());
        let expected = 2. * (200. - eff) + wgt.bend_length_90();
        assert_abs_diff_eq!(wg.length()?, expected, epsilon = 1e-6);

        let mut lib = Library::new("lib");
        let built = wg.build(&mut lib)?;
        assert_eq!(built.layout.insts.len(), 1);
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p1.y, 200., epsilon = 1e-6);
        // The sub-cell's output meets the final segment
        let inst = &built.layout.insts[0];
        let out = inst.cell.read()?.ports.get("output")?.port.transform(&inst.transform());
        assert_abs_diff_eq!(out.x, 200., epsilon = 1e-6);
        assert_abs_diff_eq!(out.y, eff, epsilon = 1e-6);
        Ok(())
    }
}
