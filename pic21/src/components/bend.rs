//!
//! # Bends
//!
//! Sine-shaped [SBend]s, clothoid-based [EBend]s and [EulerSBend]s, and Bezier [BBend]s.
//!
//! An Euler ("clothoid") curve's curvature grows linearly with arc-length.
//! A symmetric Euler bend joins two such curves, back to back, and reaches its minimum radius
//! at the bend's midpoint. Bends sharper than 90 degrees insert a circular arc of that minimum
//! radius between the two halves.
//!

// Std-Lib
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, PI};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Local imports
use super::StackPath;
use crate::component::{Built, Component};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::{WaveguideTemplate, WgType};
use crate::toolkit::{self, fresnel, normalize_angle};

/// # Euler Curve
///
/// Symmetric Euler bend turning counter-clockwise by `angle` (radians, in `(0, pi)`),
/// starting at the origin heading East.
/// Mirror images (clockwise turns) are produced by [EulerCurve::point]'s `sign`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EulerCurve {
    /// Turn magnitude, radians
    angle: f64,
    /// Fresnel parameter at the end of each clothoid half
    t_end: f64,
    /// Scale factor from the unit clothoid
    scale: f64,
    /// Radius of the central arc, if any
    radius: f64,
    /// Turn of the central arc, radians
    circle_angle: f64,
    /// Sign of the turn: +1 counter-clockwise, -1 clockwise
    sign: f64,
    /// End-point, for a counter-clockwise turn
    end: Point,
}
impl EulerCurve {
    /// Euler bend turning by `turnby` (radians, signed), whose minimum radius of curvature is `min_radius`
    pub(crate) fn new(turnby: f64, min_radius: f64) -> PicResult<Self> {
        let angle = turnby.abs();
        if !(angle > 1e-9 && angle < PI - 1e-9) {
            return PicError::invalid(format!(
                "Euler bends require a turn within (-pi, pi), excluding zero; got {}",
                turnby
            ));
        }
        if angle <= FRAC_PI_2 {
            let t_end = (angle / PI).sqrt();
            return Ok(Self::from_scale(turnby, min_radius * PI * t_end));
        }
        // Two 45-degree clothoids around a circular arc
        let t_end = FRAC_1_SQRT_2;
        let scale = min_radius * PI * t_end;
        let circle_angle = angle - FRAC_PI_2;
        let (s, c) = fresnel(t_end);
        let center = Point::new(
            c * scale - min_radius * FRAC_PI_4.cos(),
            s * scale + min_radius * FRAC_PI_4.cos(),
        );
        let d = center.x + center.y / ((PI - angle) / 2.).tan();
        Ok(Self {
            angle,
            t_end,
            scale,
            radius: min_radius,
            circle_angle,
            sign: turnby.signum(),
            end: Point::new(d + d * angle.cos(), d * angle.sin()),
        })
    }
    /// Euler bend of at most 90 degrees, by `turnby` (radians, signed), with clothoid `scale` factor
    pub(crate) fn from_scale(turnby: f64, scale: f64) -> Self {
        let angle = turnby.abs();
        let t_end = (angle / PI).sqrt();
        let (s, c) = fresnel(t_end);
        let (sin, cos) = angle.sin_cos();
        let end = Point::new(c + c * cos + s * sin, s + c * sin - s * cos) * scale;
        Self {
            angle,
            t_end,
            scale,
            radius: scale / (PI * t_end),
            circle_angle: 0.,
            sign: turnby.signum(),
            end,
        }
    }
    /// Minimum radius of curvature
    pub(crate) fn min_radius(&self) -> f64 {
        self.radius
    }
    /// Arc length
    pub(crate) fn length(&self) -> f64 {
        2. * self.t_end * self.scale + self.radius * self.circle_angle
    }
    /// End-point
    pub(crate) fn end(&self) -> Point {
        Point::new(self.end.x, self.sign * self.end.y)
    }
    /// Distance from the start to the intersection of the incoming and outgoing tangent lines
    pub(crate) fn dist_to_vertex(&self) -> f64 {
        self.end.x - self.end.y / self.angle.tan()
    }
    /// Point at fraction `t` of the curve's arc length
    pub(crate) fn point(&self, t: f64) -> Point {
        let arc = t.clamp(0., 1.) * self.length();
        let half = self.t_end * self.scale;
        let p = if arc <= half {
            let (s, c) = fresnel(arc / self.scale);
            Point::new(c, s) * self.scale
        } else if arc < half + self.radius * self.circle_angle {
            let (s, c) = fresnel(self.t_end);
            let start = Point::new(c, s) * self.scale;
            let center = start.translate(self.radius, FRAC_PI_4 + FRAC_PI_2);
            let a = -FRAC_PI_4 + (arc - half) / self.radius;
            center.translate(self.radius, a)
        } else {
            // Second half, traced backwards from the end
            let (s, c) = fresnel((self.length() - arc) / self.scale);
            let (sin, cos) = self.angle.sin_cos();
            self.end - Point::new(c * cos + s * sin, c * sin - s * cos) * self.scale
        };
        Point::new(p.x, self.sign * p.y)
    }
}

/// # Euler Bend
///
/// Turns by `turnby` radians, positive for counter-clockwise,
/// with a minimum radius of curvature equal to the template's `bend_radius`.
/// Strip waveguides may taper from `start_width` to `end_width` along the bend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EBend {
    pub wgt: WaveguideTemplate,
    pub turnby: f64,
    pub start_width: Option<f64>,
    pub end_width: Option<f64>,
}
impl EBend {
    /// Create a new [EBend] of uniform width
    pub fn new(wgt: WaveguideTemplate, turnby: f64) -> Self {
        Self {
            wgt,
            turnby,
            ..Default::default()
        }
    }
    fn curve(&self) -> PicResult<EulerCurve> {
        EulerCurve::new(normalize_angle(self.turnby), self.wgt.bend_radius)
    }
    /// Arc length along the bend's centerline
    pub fn bend_length(&self) -> PicResult<f64> {
        Ok(self.curve()?.length())
    }
    /// Distance from the input port to the intersection of the input and output axes
    pub fn dist_to_vertex(&self) -> PicResult<f64> {
        Ok(self.curve()?.dist_to_vertex())
    }
}
impl Component for EBend {
    fn kind(&self) -> &'static str {
        "ebend"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let turnby = normalize_angle(self.turnby);
        let curve = EulerCurve::new(turnby, wgt.bend_radius)?;
        let evaluations = wgt.num_points_bend(turnby);
        let f = |t: f64| curve.point(t);

        let mut layout = Layout::default();
        let tapered = self.start_width.is_some() || self.end_width.is_some();
        if tapered && wgt.wg_type == WgType::Strip {
            let w0 = self.start_width.unwrap_or(wgt.wg_width);
            let mut core = PathBuilder::new(w0, Point::origin(), 0.);
            core.parametric(f, self.end_width, evaluations);
            layout.add_polygons(wgt.wg_layer, core.into_polygons());
            let mut clad = StackPath::cladding(&wgt, Point::origin(), 0.);
            clad.parametric(f, evaluations);
            clad.draw(&mut layout);
        } else {
            let mut paths = StackPath::new(&wgt, Point::origin(), 0.);
            paths.parametric(f, evaluations);
            paths.draw(&mut layout);
        }
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new(curve.end(), Direction::from_angle(turnby)));
        Ok(Built { layout, ports })
    }
}

/// # Euler S-Bend
///
/// Offsets a waveguide by `height` over `length`, via two opposing Euler bends.
/// Its minimum radius of curvature is set by the geometry, and is reported by [EulerSBend::min_radius].
/// Strip waveguides may taper from `start_width` to `end_width` along the bend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EulerSBend {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    pub height: f64,
    pub start_width: Option<f64>,
    pub end_width: Option<f64>,
}
impl EulerSBend {
    pub fn new(wgt: WaveguideTemplate, length: f64, height: f64) -> Self {
        Self {
            wgt,
            length,
            height,
            ..Default::default()
        }
    }
    fn validate(&self) -> PicResult<()> {
        if !(self.length > 0.) || self.length < self.height.abs() {
            return PicError::invalid(format!(
                "EulerSBend requires length > 0 and length >= |height|; got length {}, height {}",
                self.length, self.height
            ));
        }
        Ok(())
    }
    /// Each half's Euler bend, ending at the S-bend's midpoint.
    /// `None` for a zero-height (straight) S-bend.
    fn half(&self) -> PicResult<Option<EulerCurve>> {
        self.validate()?;
        if self.height.abs() < toolkit::TOL {
            return Ok(None);
        }
        // Bisect for the turn whose end-point has the S-bend's aspect ratio
        let target = self.height.abs() / self.length;
        let ratio = |angle: f64| {
            let end = EulerCurve::from_scale(angle, 1.).end;
            end.y / end.x
        };
        let (mut lo, mut hi) = (0., FRAC_PI_2);
        for _ in 0..100 {
            let mid = (lo + hi) / 2.;
            match ratio(mid) < target {
                true => lo = mid,
                false => hi = mid,
            }
        }
        let angle = (lo + hi) / 2.;
        let unit = EulerCurve::from_scale(angle, 1.);
        let scale = self.length / 2. / unit.end.x;
        Ok(Some(EulerCurve::from_scale(
            self.height.signum() * angle,
            scale,
        )))
    }
    /// Arc length along the centerline
    pub fn bend_length(&self) -> PicResult<f64> {
        Ok(match self.half()? {
            Some(c) => 2. * c.length(),
            None => self.length,
        })
    }
    /// Minimum radius of curvature, infinite for straight S-bends
    pub fn min_radius(&self) -> PicResult<f64> {
        Ok(match self.half()? {
            Some(c) => c.min_radius(),
            None => f64::INFINITY,
        })
    }
}
impl Component for EulerSBend {
    fn kind(&self) -> &'static str {
        "euler_sbend"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let widths = self.start_width.is_some() || self.end_width.is_some();
        let tapered = widths && wgt.wg_type == WgType::Strip;
        let w0 = self.start_width.unwrap_or(wgt.wg_width);
        let mut core = PathBuilder::new(w0, Point::origin(), 0.);
        let mut paths = match tapered {
            true => StackPath::cladding(&wgt, Point::origin(), 0.),
            false => StackPath::new(&wgt, Point::origin(), 0.),
        };
        match self.half()? {
            None => {
                paths.segment(self.length);
                core.segment(self.length, self.end_width);
            }
            Some(half) => {
                if half.min_radius() < wgt.bend_radius {
                    warn!(
                        "EulerSBend minimum radius {} is below the template bend radius {}",
                        half.min_radius(),
                        wgt.bend_radius
                    );
                }
                let mid = half.end();
                // Point-symmetric about the midpoint
                let f = |t: f64| match t < 0.5 {
                    true => half.point(2. * t),
                    false => mid * 2. - half.point(2. - 2. * t),
                };
                let evaluations = 2 * wgt.num_points_bend(half.angle);
                paths.parametric(f, evaluations);
                core.parametric(f, self.end_width, evaluations);
            }
        }
        let mut layout = Layout::default();
        if tapered {
            layout.add_polygons(wgt.wg_layer, core.into_polygons());
        }
        paths.draw(&mut layout);
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with(
                "output",
                Port::new((self.length, self.height), Direction::EAST),
            );
        Ok(Built { layout, ports })
    }
}

/// # Sine S-Bend
///
/// Follows `y = height/2 (1 - cos(pi x / length))`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SBend {
    pub wgt: WaveguideTemplate,
    pub height: f64,
    pub length: f64,
}
impl SBend {
    pub fn new(wgt: WaveguideTemplate, height: f64, length: f64) -> Self {
        Self {
            wgt,
            height,
            length,
        }
    }
}
impl Component for SBend {
    fn kind(&self) -> &'static str {
        "sbend"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        if !(self.length > 0.) {
            return PicError::invalid(format!("SBend length must be positive, got {}", self.length));
        }
        let (h, l) = (self.height, self.length);
        let f = |t: f64| Point::new(l * t, h / 2. * (PI * t - FRAC_PI_2).sin() + h / 2.);
        let mut paths = StackPath::new(&wgt, Point::origin(), 0.);
        paths.parametric(f, wgt.num_points_bend(PI));
        let mut layout = Layout::default();
        paths.draw(&mut layout);
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((l, h), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

/// Samples along a [BBend]
const BEZIER_EVALUATIONS: usize = 200;

/// # Bezier Bend
///
/// Follows the Bezier curve with control points `poles`, given in the coordinates of its parent.
/// Its ports face away from the first and last legs of the control polygon.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BBend {
    pub poles: Vec<Point>,
    pub wgt: WaveguideTemplate,
}
impl BBend {
    pub fn new(poles: impl IntoIterator<Item = impl Into<Point>>, wgt: WaveguideTemplate) -> Self {
        Self {
            poles: poles.into_iter().map(Into::into).collect(),
            wgt,
        }
    }
    /// Point at parameter `t` within `[0, 1]`, by de Casteljau's algorithm
    pub fn point(&self, t: f64) -> Point {
        let mut pts = self.poles.clone();
        for level in 1..pts.len() {
            for i in 0..pts.len() - level {
                pts[i] = pts[i] * (1. - t) + pts[i + 1] * t;
            }
        }
        pts.first().copied().unwrap_or_default()
    }
}
impl Component for BBend {
    fn kind(&self) -> &'static str {
        "bbend"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let n = self.poles.len();
        if n < 2 {
            return PicError::invalid(format!("BBend requires at least two poles, got {}", n));
        }
        let (first, second) = (self.poles[0], self.poles[1]);
        let (penult, last) = (self.poles[n - 2], self.poles[n - 1]);
        if first.dist(&second) < toolkit::TOL || penult.dist(&last) < toolkit::TOL {
            return PicError::invalid("BBend end poles must differ from their neighbors");
        }
        let heading = |from: Point, to: Point| (to.y - from.y).atan2(to.x - from.x);
        let mut paths = StackPath::new(&wgt, first, heading(first, second));
        paths.parametric(|t| self.point(t) - first, BEZIER_EVALUATIONS);
        let mut layout = Layout::default();
        paths.draw(&mut layout);
        let ports = Portlist::new()
            .with("input", Port::new(first, Direction::from_angle(heading(second, first))))
            .with("output", Port::new(last, Direction::from_angle(heading(penult, last))));
        Ok(Built { layout, ports })
    }
}
