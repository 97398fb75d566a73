//!
//! # Planar Geometry
//!
//! [Point]s, the [Shape]s drawn on mask layers, and the affine [Transform]s
//! which carry them from a component's local frame into its parents.
//! All coordinates are floating-point microns.
//!

// Std-Lib
use std::ops::{Add, Mul, Neg, Sub};

// Crates.io
use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::{BoundBox, BoundBoxTrait};

/// # Point
///
/// Location in the plane of the mask, in microns.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
impl Point {
    /// Point at (x, y)
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// The origin, (0,0)
    pub const fn origin() -> Self {
        Self { x: 0., y: 0. }
    }
    /// Offset by the coordinates of `p`
    pub fn shift(&self, p: &Point) -> Point {
        Point::new(self.x + p.x, self.y + p.y)
    }
    /// Create a new point moved by distance `length` along `angle` (radians)
    pub fn translate(&self, length: f64, angle: f64) -> Point {
        Point::new(self.x + length * angle.cos(), self.y + length * angle.sin())
    }
    /// Create a new point rotated counter-clockwise by `angle` radians about the origin
    pub fn rotate(&self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
    /// Create a new point rotated counter-clockwise by `angle` radians about `center`
    pub fn rotate_about(&self, center: &Point, angle: f64) -> Point {
        (*self - *center).rotate(angle) + *center
    }
    /// Euclidean distance to `other`
    pub fn dist(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
    /// Round both coordinates to `decimals` decimal places
    pub fn round_to(&self, decimals: i32) -> Point {
        let scale = 10f64.powi(decimals);
        Point::new(
            (self.x * scale).round() / scale,
            (self.y * scale).round() / scale,
        )
    }
    /// Create a new [Point], transformed from our original location by `transform`
    pub fn transform(&self, trans: &Transform) -> Point {
        let [x, y] = matvec(&trans.a, &[self.x, self.y]);
        Point::new(x + trans.b[0], y + trans.b[1])
    }
}
impl From<(f64, f64)> for Point {
    fn from(t: (f64, f64)) -> Self {
        Self::new(t.0, t.1)
    }
}
impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}
impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// # Polygon
///
/// Vertices of a closed boundary. The edge from the last vertex back to the first is implied,
/// so the first point is never repeated at the end.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}
impl Polygon {
    /// Create a new [Polygon] from anything convertible to a [Vec] of [Point]s
    pub fn new(points: impl Into<Vec<Point>>) -> Self {
        Self {
            points: points.into(),
        }
    }
    /// Signed area, via the shoelace formula. Positive for counter-clockwise vertex order.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let mut acc = 0.0;
        for k in 0..n {
            let (p, q) = (&self.points[k], &self.points[(k + 1) % n]);
            acc += p.x * q.y - q.x * p.y;
        }
        acc / 2.0
    }
    /// Boolean indication of a polygon too small to be drawn: fewer than three points, or no area.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3 || self.signed_area().abs() < 1e-12
    }
}
/// # Rectangle
/// Axis-aligned, between corners `p0` and `p1`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub p0: Point,
    pub p1: Point,
}
impl Rect {
    /// Create a new [Rect] from two opposite corners
    pub fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
    /// Create a [Rect] of size `(w, h)` centered on `center`
    pub fn centered(center: Point, w: f64, h: f64) -> Self {
        Self {
            p0: Point::new(center.x - w / 2., center.y - h / 2.),
            p1: Point::new(center.x + w / 2., center.y + h / 2.),
        }
    }
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2., (self.p0.y + self.p1.y) / 2.)
    }
}

/// # Shape
/// Anything drawn on a mask layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}
impl Default for Shape {
    fn default() -> Self {
        Self::Rect(Rect::default())
    }
}

/// Operations shared by all [Shape]s, dispatched to each variant by [enum_dispatch]
#[enum_dispatch]
pub trait ShapeTrait {
    /// First vertex
    fn point0(&self) -> &Point;
    /// Move every vertex by `pt`
    fn shift(&mut self, pt: &Point);
    /// Whether `pt` lies inside. Points on the boundary count as inside.
    fn contains(&self, pt: &Point) -> bool;
    /// Vertices as a [Polygon]
    fn to_poly(&self) -> Polygon;
    /// Enclosed area
    fn area(&self) -> f64;
}

impl ShapeTrait for Rect {
    fn point0(&self) -> &Point {
        &self.p0
    }
    fn shift(&mut self, pt: &Point) {
        self.p0 = self.p0.shift(pt);
        self.p1 = self.p1.shift(pt);
    }
    fn contains(&self, pt: &Point) -> bool {
        BoundBox::from_points(self.p0, self.p1).contains(pt)
    }
    fn to_poly(&self) -> Polygon {
        let (p0, p1) = (self.p0, self.p1);
        Polygon::new(vec![p0, Point::new(p1.x, p0.y), p1, Point::new(p0.x, p1.y)])
    }
    fn area(&self) -> f64 {
        ((self.p1.x - self.p0.x) * (self.p1.y - self.p0.y)).abs()
    }
}
impl ShapeTrait for Polygon {
    fn point0(&self) -> &Point {
        &self.points[0]
    }
    fn shift(&mut self, pt: &Point) {
        self.points.iter_mut().for_each(|p| *p = p.shift(pt));
    }
    fn contains(&self, pt: &Point) -> bool {
        if !self.points.bbox().contains(pt) {
            return false;
        }
        // Winding number about `pt`, from edges crossing the ray heading +x from it
        let eps = 1e-9;
        let n = self.points.len();
        let mut winding = 0isize;
        for (k, a) in self.points.iter().enumerate() {
            let b = &self.points[(k + 1) % n];
            let (ylo, yhi) = (a.y.min(b.y), a.y.max(b.y));
            if ylo > pt.y + eps || yhi < pt.y - eps {
                continue;
            }
            if yhi - ylo <= eps {
                // Horizontal edge at our height: on the boundary if it spans `pt`
                if a.x.min(b.x) <= pt.x + eps && a.x.max(b.x) >= pt.x - eps {
                    return true;
                }
                continue;
            }
            let x = a.x + (b.x - a.x) * (pt.y - a.y) / (b.y - a.y);
            if (x - pt.x).abs() <= eps {
                return true;
            }
            // Half-open in y, so shared vertices count once
            if x > pt.x && ylo <= pt.y && pt.y < yhi {
                winding += if b.y > a.y { 1 } else { -1 };
            }
        }
        winding != 0
    }
    fn to_poly(&self) -> Polygon {
        self.clone()
    }
    fn area(&self) -> f64 {
        self.signed_area().abs()
    }
}

/// # Affine Transform
///
/// Maps `p` to `a * p + b`: a rotation (and possibly reflection) matrix `a`,
/// stored row-major, followed by translation `b`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: [[f64; 2]; 2],
    pub b: [f64; 2],
}
impl Transform {
    /// Leaves everything in place
    pub fn identity() -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [0., 0.],
        }
    }
    /// Move by (x, y)
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [x, y],
        }
    }
    /// Counter-clockwise rotation by `angle` degrees
    pub fn rotate(angle: f64) -> Self {
        Self::rotate_rad(angle.to_radians())
    }
    /// Counter-clockwise rotation by `angle` radians
    pub fn rotate_rad(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: [[cos, -sin], [sin, cos]],
            b: [0., 0.],
        }
    }
    /// Mirror across the x-axis
    pub fn reflect_vert() -> Self {
        Self {
            a: [[1., 0.], [0., -1.]],
            b: [0., 0.],
        }
    }
    /// Create a transform from instance fields: location, reflection, and rotation (degrees).
    /// Reflection is applied first, then rotation, then translation.
    pub fn from_instance(loc: &Point, reflect_vert: bool, angle: Option<f64>) -> Self {
        let (sin, cos) = angle.unwrap_or(0.).to_radians().sin_cos();
        let r = if reflect_vert { -1. } else { 1. };
        Self {
            a: [[cos, -sin * r], [sin, cos * r]],
            b: [loc.x, loc.y],
        }
    }
    /// Apply `child` and then `parent`, e.g. an instance's transform
    /// followed by that of the cell it is placed in. Order matters:
    /// mirroring then moving by (1,1) lands (1,1) at (2,-2), the reverse at (2,0).
    pub fn cascade(parent: &Transform, child: &Transform) -> Transform {
        let [bx, by] = matvec(&parent.a, &child.b);
        Self {
            a: matmul(&parent.a, &child.a),
            b: [bx + parent.b[0], by + parent.b[1]],
        }
    }
    /// Rotation angle in radians, as applied to the x-axis unit vector
    pub fn angle(&self) -> f64 {
        self.a[1][0].atan2(self.a[0][0])
    }
    /// Whether the transform mirrors
    pub fn reflects(&self) -> bool {
        self.a[0][0] * self.a[1][1] - self.a[0][1] * self.a[1][0] < 0.
    }
    /// Whether axis-aligned rectangles stay axis-aligned,
    /// i.e. the rotation is a multiple of 90 degrees
    pub fn is_manhattan(&self) -> bool {
        let tol = 1e-9;
        (self.a[0][1].abs() < tol && self.a[1][0].abs() < tol)
            || (self.a[0][0].abs() < tol && self.a[1][1].abs() < tol)
    }
}
/// 2x2 matrix product `a * b`
fn matmul(a: &[[f64; 2]; 2], b: &[[f64; 2]; 2]) -> [[f64; 2]; 2] {
    let [c0x, c0y] = matvec(a, &[b[0][0], b[1][0]]);
    let [c1x, c1y] = matvec(a, &[b[0][1], b[1][1]]);
    [[c0x, c1x], [c0y, c1y]]
}
/// 2x2 matrix times column vector `v`
fn matvec(a: &[[f64; 2]; 2], v: &[f64; 2]) -> [f64; 2] {
    let row = |r: &[f64; 2]| r[0] * v[0] + r[1] * v[1];
    [row(&a[0]), row(&a[1])]
}
/// Shapes which can be moved by a [Transform]
pub trait TransformTrait {
    /// Copy of `self`, with every vertex transformed by `trans`
    fn transform(&self, trans: &Transform) -> Self;
}
impl TransformTrait for Shape {
    /// Rectangles remain [Rect]s under Manhattan transforms, and become [Polygon]s otherwise.
    fn transform(&self, trans: &Transform) -> Self {
        match self {
            Shape::Rect(r) if trans.is_manhattan() => Shape::Rect(r.transform(trans)),
            Shape::Rect(r) => Shape::Polygon(r.to_poly().transform(trans)),
            Shape::Polygon(p) => Shape::Polygon(p.transform(trans)),
        }
    }
}
impl TransformTrait for Rect {
    /// Transform both corners, and re-order them lower-left then upper-right.
    /// Only meaningful for [Transform::is_manhattan] transforms.
    fn transform(&self, trans: &Transform) -> Self {
        let (p0, p1) = (self.p0.transform(trans), self.p1.transform(trans));
        Rect {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
}
impl TransformTrait for Polygon {
    fn transform(&self, trans: &Transform) -> Self {
        let points = self.points.iter().map(|p| p.transform(trans)).collect();
        Polygon { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_close(a: &Point, b: &Point) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
    }
    #[test]
    fn identity() {
        let rect = Shape::Rect(Rect::new(Point::new(0., 0.), Point::new(1., 1.)));
        assert_eq!(rect.transform(&Transform::identity()), rect);
    }
    #[test]
    fn rotation() {
        let p = Point::new(2., 0.);
        let trans = Transform::rotate(90.);
        assert_close(&p.transform(&trans), &Point::new(0., 2.));
        let back = p.transform(&Transform::cascade(&trans, &Transform::rotate(-90.)));
        assert_close(&back, &p);

        // Manhattan rotations keep rectangles as rectangles
        let r = Shape::Rect(Rect::new(Point::new(0., 0.), Point::new(2., 1.)));
        match r.transform(&trans) {
            Shape::Rect(r) => {
                assert_close(&r.p0, &Point::new(-1., 0.));
                assert_close(&r.p1, &Point::new(0., 2.));
            }
            _ => panic!("Expected a Rect"),
        }
        // Others do not
        assert!(matches!(r.transform(&Transform::rotate(30.)), Shape::Polygon(_)));
    }
    #[test]
    fn cascade_order() {
        let mirror = Transform::reflect_vert();
        let shift = Transform::translate(1., 1.);
        let p = Point::new(1., 1.);
        assert_close(&p.transform(&Transform::cascade(&mirror, &shift)), &Point::new(2., -2.));
        let shifted_first = Transform::cascade(&shift, &mirror);
        assert_close(&p.transform(&shifted_first), &Point::new(2., 0.));
        assert!(shifted_first.reflects());
    }
    #[test]
    fn instance_transform() {
        let trans = Transform::from_instance(&Point::new(10., 5.), false, Some(180.));
        assert_close(&Point::new(1., 2.).transform(&trans), &Point::new(9., 3.));
        assert_abs_diff_eq!(trans.angle().abs(), std::f64::consts::PI, epsilon = 1e-12);
    }
    #[test]
    fn polygon_containment() {
        let triangle = Polygon::new(vec![
            Point::new(0., 0.),
            Point::new(2., 0.),
            Point::new(0., 2.),
        ]);
        assert!(triangle.contains(&Point::new(0., 0.)));
        assert!(triangle.contains(&Point::new(1., 0.)));
        assert!(triangle.contains(&Point::new(1., 1.)));
        assert!(triangle.contains(&Point::new(0.5, 0.5)));
        assert!(!triangle.contains(&Point::new(2., 2.)));
        assert!(!triangle.contains(&Point::new(1.5, 1.)));

        // U-shape inside a 10x10 square
        let u = Polygon::new(vec![
            Point::new(0., 0.),
            Point::new(0., 10.),
            Point::new(2., 10.),
            Point::new(2., 2.),
            Point::new(8., 2.),
            Point::new(8., 10.),
            Point::new(10., 10.),
            Point::new(10., 0.),
        ]);
        assert!(u.points.iter().all(|p| u.contains(p)));
        assert!(u.contains(&Point::new(1., 9.)));
        assert!(u.contains(&Point::new(9., 1.)));
        assert!(!u.contains(&Point::new(3., 3.)));
        assert!(!u.contains(&Point::new(7., 9.)));
        assert_abs_diff_eq!(u.area(), 100. - 48., epsilon = 1e-9);
    }
}
