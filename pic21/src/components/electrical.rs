//!
//! # Electrical Components
//!
//! Metal routes, bond pads, and vias, each drawn from a [MetalTemplate].
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Local imports
use crate::component::{Built, Component};
use crate::data::{LayerSpec, Layout, Library};
use crate::dir::{Cardinal, Direction};
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Polygon, Rect};
use crate::path::PathBuilder;
use crate::port::{Port, Portlist};
use crate::template::MetalTemplate;
use crate::toolkit::{get_angle, get_direction, get_turn, num_points_arc, TOL};

/// Maximum deviation of rounded metal corners from a true arc
const METAL_ARC_TOLERANCE: f64 = 0.1;

/// # Metal Route
///
/// Manhattan metal trace through `trace`, in the coordinates of the cell it is placed in.
/// Corners are square for a zero `bend_radius`, and rounded otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MetalRoute {
    pub trace: Vec<Point>,
    pub mt: MetalTemplate,
}
impl MetalRoute {
    pub fn new(trace: impl IntoIterator<Item = impl Into<Point>>, mt: MetalTemplate) -> Self {
        Self {
            trace: trace.into_iter().map(|p| p.into()).collect(),
            mt,
        }
    }
    /// The trace, rounded to the micro-micron and checked against the bend radius
    pub fn checked_trace(&self) -> PicResult<Vec<Point>> {
        self.mt.validate()?;
        let trace: Vec<Point> = self.trace.iter().map(|p| p.round_to(6)).collect();
        if trace.len() < 2 {
            return PicError::invalid(format!(
                "MetalRoute traces require at least two points, got {}",
                trace.len()
            ));
        }
        let br = self.mt.bend_radius;
        let last = trace.len() - 2;
        let (mut prev_dx, mut prev_dy) = (1., 1.);
        for (i, w) in trace.windows(2).enumerate() {
            let dx = (w[1].x - w[0].x).abs() + 1e-10;
            let dy = (w[1].y - w[0].y).abs() + 1e-10;
            let end = i == 0 || i == last;
            if br != 0. && !end && dx < 2. * br && dy < 2. * br {
                return PicError::geometry(format!(
                    "Waypoints {:?} and {:?} must be more than two bend radii apart",
                    w[0], w[1]
                ));
            }
            if br != 0. && end && dx < br && dy < br {
                return PicError::geometry(format!(
                    "End waypoints {:?} and {:?} must be more than one bend radius apart",
                    w[0], w[1]
                ));
            }
            if dx >= TOL && dy >= TOL {
                return PicError::invalid(format!(
                    "MetalRoute waypoints {:?} and {:?} do not specify a 90 degree turn",
                    w[0], w[1]
                ));
            }
            if (prev_dx <= TOL && dx <= TOL) || (prev_dy <= TOL && dy <= TOL) {
                return PicError::invalid(format!(
                    "Unnecessary waypoint at {:?}. All waypoints must specify a 90 degree turn.",
                    w[0]
                ));
            }
            prev_dx = dx;
            prev_dy = dy;
        }
        Ok(trace)
    }
}
impl Component for MetalRoute {
    fn kind(&self) -> &'static str {
        "metal_route"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let trace = self.checked_trace()?;
        let mt = &self.mt;
        let mut layout = Layout::default();
        let widths = [
            (mt.width, mt.metal_layer),
            (mt.width + 2. * mt.clad_width, mt.clad_layer),
        ];
        for (width, layer) in widths {
            let polygons = match mt.bend_radius == 0. {
                true => sharp_path(&trace, width, layer, &mut layout)?,
                false => rounded_path(&trace, width, mt.bend_radius)?,
            };
            layout.add_polygons(layer, polygons);
        }
        let n = trace.len();
        for (point, dir) in [
            (trace[0], get_angle(&trace[0], &trace[1])?),
            (trace[n - 1], get_angle(&trace[n - 2], &trace[n - 1])?),
        ] {
            layout.add(mt.clad_layer, end_pad(point, dir, mt));
        }
        debug!("Metal route of {} waypoints", n);

        let ports = Portlist::new()
            .with(
                "input",
                Port::new(trace[0], get_direction(&trace[1], &trace[0])),
            )
            .with(
                "output",
                Port::new(trace[n - 1], get_direction(&trace[n - 2], &trace[n - 1])),
            );
        Ok(Built { layout, ports })
    }
}

/// Path of `width` with square corners, adding each corner's filling square to `layout` on `layer`
fn sharp_path(
    trace: &[Point],
    width: f64,
    layer: LayerSpec,
    layout: &mut Layout,
) -> PicResult<Vec<Polygon>> {
    let mut path = PathBuilder::new(width, trace[0], get_angle(&trace[0], &trace[1])?.angle());
    for (i, w) in trace.windows(2).enumerate() {
        if i > 0 {
            layout.add(layer, Rect::centered(w[0], width, width));
        }
        path.segment_to(get_angle(&w[0], &w[1])?.angle(), w[0].dist(&w[1]), None);
    }
    Ok(path.into_polygons())
}

/// Path of `width` turning with `radius` at each corner
fn rounded_path(trace: &[Point], width: f64, radius: f64) -> PicResult<Vec<Polygon>> {
    let n = trace.len();
    let first = trace[0].dist(&trace[1]);
    let mut path = PathBuilder::new(width, trace[0], get_angle(&trace[0], &trace[1])?.angle());
    if n == 2 && first <= radius {
        path.segment(first, None);
        return Ok(path.into_polygons());
    }
    path.segment(first - radius, None);
    let mut prior = get_direction(&trace[0], &trace[1]);
    for w in trace[1..].windows(2) {
        let dir = get_direction(&w[0], &w[1]);
        let turn = get_turn(prior, dir)?;
        path.turn(
            radius,
            turn,
            None,
            num_points_arc(turn, radius, METAL_ARC_TOLERANCE),
        );
        let dist = w[0].dist(&w[1]);
        if dist - 2. * radius > 0. {
            path.segment(dist - 2. * radius, None);
        }
        prior = dir;
    }
    let last = trace[n - 2].dist(&trace[n - 1]);
    match last < 2. * radius {
        true => path.segment(last - radius, None),
        false => path.segment(radius, None),
    };
    Ok(path.into_polygons())
}

/// Cladding pad surrounding the route's end at `point`, where it runs along `dir`
fn end_pad(point: Point, dir: Cardinal, mt: &MetalTemplate) -> Rect {
    let (along, across) = (2. * mt.clad_width, mt.width + 2. * mt.clad_width);
    match dir {
        Cardinal::East | Cardinal::West => Rect::centered(point, along, across),
        Cardinal::North | Cardinal::South => Rect::centered(point, across, along),
    }
}

/// # Bond Pad
///
/// Rectangular metal pad extending EAST from its `output` port.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Bondpad {
    pub mt: MetalTemplate,
    pub length: f64,
    pub width: f64,
}
impl Default for Bondpad {
    fn default() -> Self {
        Self {
            mt: MetalTemplate::default(),
            length: 150.,
            width: 100.,
        }
    }
}
impl Bondpad {
    pub fn new(mt: MetalTemplate) -> Self {
        Self {
            mt,
            ..Default::default()
        }
    }
}
impl Component for Bondpad {
    fn kind(&self) -> &'static str {
        "bondpad"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        self.mt.validate()?;
        if !(self.length > 0.) || !(self.width > 0.) {
            return PicError::invalid(format!(
                "Bondpad requires positive length and width, got {} and {}",
                self.length, self.width
            ));
        }
        let (l, w, c) = (self.length, self.width / 2., self.mt.clad_width);
        let mut layout = Layout::default();
        layout.add(
            self.mt.metal_layer,
            Rect::new(Point::new(0., -w), Point::new(l, w)),
        );
        layout.add(
            self.mt.clad_layer,
            Rect::new(Point::new(-c, -w - c), Point::new(l + c, w + c)),
        );
        let ports = Portlist::new().with("output", Port::new(Point::origin(), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

/// # Via
///
/// Square via of `size` between two metal layers, with a contact pad on each.
/// Pads overhang the via by their bias, or as far as needed to match a given template's width.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Via {
    pub mt_bot: Option<MetalTemplate>,
    pub mt_top: Option<MetalTemplate>,
    pub via_layer: LayerSpec,
    /// Bottom pad layer, unless set by `mt_bot`
    pub bot_layer: LayerSpec,
    /// Top pad layer, unless set by `mt_top`
    pub top_layer: LayerSpec,
    pub size: f64,
    pub top_bias: f64,
    pub bot_bias: f64,
}
impl Default for Via {
    fn default() -> Self {
        Self {
            mt_bot: None,
            mt_top: None,
            via_layer: LayerSpec::new(12, 0),
            bot_layer: LayerSpec::new(11, 0),
            top_layer: LayerSpec::new(13, 0),
            size: 5.,
            top_bias: 1.,
            bot_bias: 1.,
        }
    }
}
impl Via {
    /// Layer and edge length of a contact pad
    fn pad(&self, mt: &Option<MetalTemplate>, layer: LayerSpec, bias: f64) -> (LayerSpec, f64) {
        let (layer, bias) = match mt {
            None => (layer, bias),
            Some(mt) => (mt.metal_layer, bias.max((mt.width - self.size) / 2.)),
        };
        (layer, self.size + 2. * bias)
    }
}
impl Component for Via {
    fn kind(&self) -> &'static str {
        "via"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        if !(self.size > 0.) {
            return PicError::invalid(format!("Via size must be positive, got {}", self.size));
        }
        let mut layout = Layout::default();
        for (layer, edge) in [
            self.pad(&self.mt_bot, self.bot_layer, self.bot_bias),
            self.pad(&self.mt_top, self.top_layer, self.top_bias),
            (self.via_layer, self.size),
        ] {
            layout.add(layer, Rect::centered(Point::origin(), edge, edge));
        }
        let ports = Portlist::new().with("center", Port::new(Point::origin(), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundBoxTrait;
    use crate::geom::ShapeTrait;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sharp_route() -> PicResult<()> {
        let route = MetalRoute::new(
            vec![(0., 0.), (0., 250.), (100., 250.), (100., 500.), (400., 500.)],
            MetalTemplate::default(),
        );
        let built = route.build(&mut Library::default())?;
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p0.x, -30., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p0.y, -20., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.x, 420., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.y, 530., epsilon = 1e-9);
        // Three corners, each with metal and clad squares
        let squares = built
            .layout
            .elems
            .iter()
            .filter(|e| matches!(e.inner, crate::geom::Shape::Rect(_)))
            .count();
        assert_eq!(squares, 3 * 2 + 2);

        let input = built.ports.get("input")?;
        assert_eq!(input.direction, Direction::SOUTH);
        let output = built.ports.get("output")?;
        assert_eq!(output.port, Point::new(400., 500.));
        assert_eq!(output.direction, Direction::EAST);
        Ok(())
    }
    #[test]
    fn rounded_route() -> PicResult<()> {
        let mt = MetalTemplate {
            bend_radius: 10.,
            ..Default::default()
        };
        let route = MetalRoute::new(vec![(0., 0.), (100., 0.), (100., 100.)], mt.clone());
        let built = route.build(&mut Library::default())?;
        let metal = built
            .layout
            .elems
            .iter()
            .filter(|e| e.layer == mt.metal_layer)
            .map(|e| e.inner.bbox())
            .fold(crate::bbox::BoundBox::empty(), |a, b| a.union(&b));
        assert_abs_diff_eq!(metal.p1.x, 110., epsilon = 1e-6);
        assert_abs_diff_eq!(metal.p1.y, 100., epsilon = 1e-6);
        assert_abs_diff_eq!(metal.p0.x, 0., epsilon = 1e-6);
        Ok(())
    }
    #[test]
    fn route_errors() {
        let mt = MetalTemplate {
            bend_radius: 10.,
            ..Default::default()
        };
        let diagonal = MetalRoute::new(vec![(0., 0.), (100., 100.)], mt.clone());
        assert!(matches!(diagonal.checked_trace(), Err(PicError::Validation(_))));
        let crowded = MetalRoute::new(
            vec![(0., 0.), (100., 0.), (100., 15.), (200., 15.)],
            mt.clone(),
        );
        assert!(matches!(crowded.checked_trace(), Err(PicError::Geometry(_))));
        let short_end = MetalRoute::new(vec![(0., 0.), (5., 0.), (5., 100.)], mt);
        assert!(short_end.checked_trace().is_err());
    }
    #[test]
    fn bondpad_and_via() -> PicResult<()> {
        let pad = Bondpad::new(MetalTemplate::default()).build(&mut Library::default())?;
        assert_abs_diff_eq!(pad.layout.elems[0].inner.area(), 15000., epsilon = 1e-9);
        assert_eq!(pad.ports.get("output")?.direction, Direction::EAST);

        let via = Via {
            mt_bot: Some(MetalTemplate::default()),
            ..Default::default()
        };
        let built = via.build(&mut Library::default())?;
        // Bottom pad widened to the 20-wide template
        assert_abs_diff_eq!(built.layout.elems[0].inner.area(), 400., epsilon = 1e-9);
        assert_eq!(built.layout.elems[0].layer, LayerSpec::new(11, 0));
        assert_abs_diff_eq!(built.layout.elems[1].inner.area(), 49., epsilon = 1e-9);
        assert_abs_diff_eq!(built.layout.elems[2].inner.area(), 25., epsilon = 1e-9);
        assert!(built.ports.get("center").is_ok());
        Ok(())
    }
}
