//!
//! # Path Construction
//!
//! [PathBuilder] sweeps a (possibly tapering) width along a centerline of straight segments,
//! circular turns and arcs, and parametric curves, emitting one [Polygon] per primitive per rail.
//! Multi-rail paths (e.g. the two rails of a slot waveguide) run in parallel, offset by `distance`.
//!
//! Also home to the circular-sector and rectangle polygon helpers.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, TAU};

// Local imports
use crate::gds::MAX_BOUNDARY_VERTICES;
use crate::geom::Point;
use crate::geom::Polygon;

/// Maximum number of centerline samples per emitted polygon.
/// Each sample contributes two vertices.
const MAX_SAMPLES: usize = MAX_BOUNDARY_VERTICES / 2;
/// Parametric-curve derivative step
const DT: f64 = 1e-6;

/// # Path Builder
#[derive(Debug, Clone)]
pub struct PathBuilder {
    /// Current end of the centerline
    end: Point,
    /// Current direction, radians
    direction: f64,
    /// Current width of each rail
    width: f64,
    /// Number of parallel rails
    number_of_paths: usize,
    /// Center-to-center distance between adjacent rails
    distance: f64,
    /// Accumulated centerline length
    length: f64,
    /// Emitted polygons
    polygons: Vec<Polygon>,
}
impl PathBuilder {
    /// Create a new single-rail [PathBuilder] of `width`, starting at `origin` and heading along `direction` (radians).
    pub fn new(width: f64, origin: Point, direction: f64) -> Self {
        Self {
            end: origin,
            direction,
            width,
            number_of_paths: 1,
            distance: 0.,
            length: 0.,
            polygons: Vec::new(),
        }
    }
    /// Set the number of parallel rails, and their center-to-center `distance`
    pub fn rails(mut self, number_of_paths: usize, distance: f64) -> Self {
        self.number_of_paths = number_of_paths.max(1);
        self.distance = distance;
        self
    }
    /// Current end-point
    pub fn end(&self) -> Point {
        self.end
    }
    /// Current direction, radians
    pub fn direction(&self) -> f64 {
        self.direction
    }
    /// Current width
    pub fn width(&self) -> f64 {
        self.width
    }
    /// Accumulated centerline length
    pub fn length(&self) -> f64 {
        self.length
    }
    /// Polygons emitted so far
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }
    /// Consume the builder, returning its polygons
    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }
    /// Add a straight segment of `length` along the current direction,
    /// optionally tapering linearly to `final_width`.
    pub fn segment(&mut self, length: f64, final_width: Option<f64>) -> &mut Self {
        let start = self.end;
        let stop = start.translate(length, self.direction);
        if length.abs() > 1e-9 {
            let angles = [self.direction, self.direction];
            self.sweep(&[start, stop], &angles, final_width);
            self.length += length.abs();
        }
        self.end = stop;
        if let Some(w) = final_width {
            self.width = w;
        }
        self
    }
    /// Re-aim along `direction` (radians), then add a straight segment of `length`
    pub fn segment_to(&mut self, direction: f64, length: f64, final_width: Option<f64>) -> &mut Self {
        self.direction = direction;
        self.segment(length, final_width)
    }
    /// Add a circular turn of `radius` by `angle` radians.
    /// Positive angles turn left (counter-clockwise).
    pub fn turn(
        &mut self,
        radius: f64,
        angle: f64,
        final_width: Option<f64>,
        num_points: usize,
    ) -> &mut Self {
        if angle == 0. {
            return self;
        }
        let side = angle.signum();
        // Arc angles are measured from the turn's center
        let initial_angle = self.direction - side * FRAC_PI_2;
        self.arc(radius, initial_angle, initial_angle + angle, final_width, num_points)
    }
    /// Add a circular arc of `radius`, swept from `initial_angle` to `final_angle`,
    /// each measured from the arc's center, which is placed so that the arc starts at the current end.
    pub fn arc(
        &mut self,
        radius: f64,
        initial_angle: f64,
        final_angle: f64,
        final_width: Option<f64>,
        num_points: usize,
    ) -> &mut Self {
        let sweep = final_angle - initial_angle;
        if sweep == 0. {
            return self;
        }
        let side = sweep.signum();
        let center = self.end.translate(-radius, initial_angle);
        let n = num_points.max(2);
        let mut centers = Vec::with_capacity(n);
        let mut angles = Vec::with_capacity(n);
        for k in 0..n {
            let a = initial_angle + sweep * k as f64 / (n - 1) as f64;
            centers.push(center.translate(radius, a));
            angles.push(a + side * FRAC_PI_2);
        }
        self.sweep(&centers, &angles, final_width);
        self.end = center.translate(radius, final_angle);
        self.direction = final_angle + side * FRAC_PI_2;
        self.length += (radius * sweep).abs();
        if let Some(w) = final_width {
            self.width = w;
        }
        self
    }
    /// Add a parametric curve. `f(t)` for `t` in `[0, 1]` returns the centerline offset
    /// relative to the current end, and should satisfy `f(0) == (0, 0)`.
    pub fn parametric(
        &mut self,
        f: impl Fn(f64) -> Point,
        final_width: Option<f64>,
        evaluations: usize,
    ) -> &mut Self {
        let n = evaluations.max(2);
        let origin = self.end;
        let tangent = |t: f64| {
            let (t0, t1) = ((t - DT).max(0.), (t + DT).min(1.));
            let d = f(t1) - f(t0);
            d.y.atan2(d.x)
        };
        let mut centers = Vec::with_capacity(n);
        let mut angles = Vec::with_capacity(n);
        for k in 0..n {
            let t = k as f64 / (n - 1) as f64;
            centers.push(origin + f(t));
            angles.push(tangent(t));
        }
        self.length += centers.windows(2).map(|w| w[0].dist(&w[1])).sum::<f64>();
        self.sweep(&centers, &angles, final_width);
        self.end = centers[n - 1];
        self.direction = angles[n - 1];
        if let Some(w) = final_width {
            self.width = w;
        }
        self
    }
    /// Sweep the rails along centerline samples `centers`, with tangent `angles`.
    /// Width tapers linearly in arc-length from the current width to `final_width`.
    fn sweep(&mut self, centers: &[Point], angles: &[f64], final_width: Option<f64>) {
        let (w0, w1) = (self.width, final_width.unwrap_or(self.width));
        let mut cumulative = Vec::with_capacity(centers.len());
        let mut acc = 0.;
        cumulative.push(0.);
        for w in centers.windows(2) {
            acc += w[0].dist(&w[1]);
            cumulative.push(acc);
        }
        let widths: Vec<f64> = cumulative
            .iter()
            .map(|s| match acc > 0. {
                true => w0 + (w1 - w0) * s / acc,
                false => w1,
            })
            .collect();

        // Split long curves into overlapping chunks
        let mut start = 0;
        while start + 1 < centers.len() {
            let stop = (start + MAX_SAMPLES).min(centers.len());
            for rail in 0..self.number_of_paths {
                let offset = (rail as f64 - (self.number_of_paths - 1) as f64 / 2.) * self.distance;
                let mut left = Vec::with_capacity(stop - start);
                let mut right = Vec::with_capacity(stop - start);
                for k in start..stop {
                    let normal = angles[k] + FRAC_PI_2;
                    left.push(centers[k].translate(offset + widths[k] / 2., normal));
                    right.push(centers[k].translate(offset - widths[k] / 2., normal));
                }
                right.reverse();
                left.extend(right);
                self.polygons.push(Polygon::new(left));
            }
            start = stop - 1;
        }
    }
}

/// Rectangle polygon with opposite corners `p0` and `p1`
pub fn rect(p0: Point, p1: Point) -> Polygon {
    Polygon::new(vec![
        p0,
        Point::new(p1.x, p0.y),
        p1,
        Point::new(p0.x, p1.y),
    ])
}

/// Circular polygon: a disk, sector, ring, or annular sector.
///
/// Angles are in radians. A non-zero `inner_radius` produces a ring;
/// full rings are drawn as a single polygon with a zero-width cut at `initial_angle`.
pub fn round(
    center: Point,
    radius: f64,
    inner_radius: f64,
    initial_angle: f64,
    final_angle: f64,
    num_points: usize,
) -> Polygon {
    let sweep = final_angle - initial_angle;
    let full = sweep.abs() >= TAU - 1e-12;
    let n = num_points.max(3);
    let at = |r: f64, k: usize| center.translate(r, initial_angle + sweep * k as f64 / (n - 1) as f64);

    if inner_radius <= 0. {
        if full {
            // Closing point is implied
            let points = (0..n - 1).map(|k| at(radius, k)).collect::<Vec<_>>();
            return Polygon::new(points);
        }
        let mut points: Vec<Point> = (0..n).map(|k| at(radius, k)).collect();
        points.push(center);
        return Polygon::new(points);
    }
    let mut points: Vec<Point> = (0..n).map(|k| at(radius, k)).collect();
    points.extend((0..n).rev().map(|k| at(inner_radius, k)));
    Polygon::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundBoxTrait;
    use crate::geom::ShapeTrait;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn straight_segment() {
        let mut p = PathBuilder::new(2., Point::origin(), 0.);
        p.segment(10., None);
        assert_eq!(p.polygons().len(), 1);
        let bbox = p.polygons()[0].points.bbox();
        assert_abs_diff_eq!(bbox.p0.y, -1., epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.p1.x, 10., epsilon = 1e-12);
        assert_abs_diff_eq!(p.polygons()[0].area(), 20., epsilon = 1e-9);
        assert_abs_diff_eq!(p.end().x, 10.);
    }
    #[test]
    fn tapered_segment() {
        let mut p = PathBuilder::new(2., Point::origin(), 0.);
        p.segment(10., Some(4.));
        assert_abs_diff_eq!(p.polygons()[0].area(), 30., epsilon = 1e-9);
        assert_eq!(p.width(), 4.);
    }
    #[test]
    fn left_turn() {
        let mut p = PathBuilder::new(1., Point::origin(), 0.);
        p.turn(10., PI / 2., None, 100);
        assert_abs_diff_eq!(p.end().x, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(p.end().y, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(p.direction(), PI / 2., epsilon = 1e-12);
        assert_abs_diff_eq!(p.length(), 10. * PI / 2., epsilon = 1e-9);
        // Quarter annulus between radii 9.5 and 10.5
        let expected = PI / 4. * (10.5f64.powi(2) - 9.5f64.powi(2));
        assert_abs_diff_eq!(p.polygons()[0].area(), expected, epsilon = 1e-2);
    }
    #[test]
    fn right_turn_then_segment() {
        let mut p = PathBuilder::new(1., Point::origin(), 0.);
        p.turn(5., -PI / 2., None, 50).segment(3., None);
        assert_abs_diff_eq!(p.end().x, 5., epsilon = 1e-9);
        assert_abs_diff_eq!(p.end().y, -8., epsilon = 1e-9);
    }
    #[test]
    fn two_rails() {
        let mut p = PathBuilder::new(0.4, Point::origin(), 0.).rails(2, 0.6);
        p.segment(5., None);
        assert_eq!(p.polygons().len(), 2);
        let b0 = p.polygons()[0].points.bbox();
        let b1 = p.polygons()[1].points.bbox();
        assert_abs_diff_eq!(b0.center().y, -0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(b1.center().y, 0.3, epsilon = 1e-12);
    }
    #[test]
    fn long_turn_is_split() {
        let n = 20_000;
        let mut p = PathBuilder::new(1., Point::origin(), 0.).rails(2, 2.);
        p.turn(1000., PI / 2., None, n);
        // Consecutive pieces share one sample
        let pieces = (n - 1 + MAX_SAMPLES - 2) / (MAX_SAMPLES - 1);
        assert!(pieces > 1);
        assert_eq!(p.polygons().len(), 2 * pieces);
        assert!(p
            .polygons()
            .iter()
            .all(|poly| poly.points.len() <= MAX_BOUNDARY_VERTICES));
        // Both rails together cover two quarter annuli of width one
        let area: f64 = p.polygons().iter().map(|poly| poly.area()).sum();
        assert_abs_diff_eq!(area, 2. * 1000. * PI / 2., epsilon = 1e-2);
        assert_abs_diff_eq!(p.end().x, 1000., epsilon = 1e-9);
    }
    #[test]
    fn parametric_sine() {
        let mut p = PathBuilder::new(1., Point::new(1., 1.), 0.);
        p.parametric(
            |t| Point::new(10. * t, 2. * (1. - (PI * t).cos())),
            None,
            50,
        );
        assert_abs_diff_eq!(p.end().x, 11., epsilon = 1e-9);
        assert_abs_diff_eq!(p.end().y, 5., epsilon = 1e-9);
        assert_abs_diff_eq!(p.direction(), 0., epsilon = 1e-4);
    }
    #[test]
    fn round_shapes() {
        let disk = round(Point::origin(), 1., 0., 0., TAU, 2000);
        assert_abs_diff_eq!(disk.area(), PI, epsilon = 1e-3);
        let ring = round(Point::origin(), 2., 1., 0., TAU, 2000);
        assert_abs_diff_eq!(ring.area(), 3. * PI, epsilon = 1e-2);
        let sector = round(Point::origin(), 1., 0., 0., PI / 2., 500);
        assert_abs_diff_eq!(sector.area(), PI / 4., epsilon = 1e-3);
        assert!(sector.contains(&Point::new(0.1, 0.1)));
        assert!(!sector.contains(&Point::new(-0.1, 0.1)));
    }
}
