//!
//! # Bounding Boxes
//!
//! Axis-aligned extents of shapes and cells, used to size simulation regions,
//! to align markers, and to check where components land after placement.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::geom::{Point, Polygon, Rect, Shape};

/// # Bounding Box
///
/// `p0` holds the minimum x and y coordinates, `p1` the maximum.
/// Boxes with `p0` beyond `p1` in either axis are empty.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Zero-area box at `pt`
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Box spanned by corners `a` and `b`, in any order
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            p0: Point::new(a.x.min(b.x), a.y.min(b.y)),
            p1: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }
    /// The empty box, identity of [BoundBoxTrait::union]
    pub fn empty() -> Self {
        Self {
            p0: Point::new(f64::INFINITY, f64::INFINITY),
            p1: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.p1.x < self.p0.x || self.p1.y < self.p0.y
    }
    /// Whether `pt` lies within the box, edges included
    pub fn contains(&self, pt: &Point) -> bool {
        (self.p0.x..=self.p1.x).contains(&pt.x) && (self.p0.y..=self.p1.y).contains(&pt.y)
    }
    /// Grow by `delta` on every side
    pub fn expand(&mut self, delta: f64) {
        self.p0 = Point::new(self.p0.x - delta, self.p0.y - delta);
        self.p1 = Point::new(self.p1.x + delta, self.p1.y + delta);
    }
    /// (width, height)
    pub fn size(&self) -> (f64, f64) {
        (self.p1.x - self.p0.x, self.p1.y - self.p0.y)
    }
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2., (self.p0.y + self.p1.y) / 2.)
    }
    /// Counter-clockwise rectangle [Polygon]
    pub fn to_poly(&self) -> Polygon {
        let (p0, p1) = (self.p0, self.p1);
        Polygon::new(vec![p0, Point::new(p1.x, p0.y), p1, Point::new(p0.x, p1.y)])
    }
}

/// Types with an axis-aligned extent
pub trait BoundBoxTrait {
    /// Our extent, clipped to `bbox`. Empty if the two do not overlap.
    fn intersection(&self, bbox: &BoundBox) -> BoundBox;
    /// Smallest box covering both our extent and `bbox`
    fn union(&self, bbox: &BoundBox) -> BoundBox;
    fn bbox(&self) -> BoundBox;
}
impl BoundBoxTrait for BoundBox {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        let clipped = BoundBox {
            p0: Point::new(self.p0.x.max(bbox.p0.x), self.p0.y.max(bbox.p0.y)),
            p1: Point::new(self.p1.x.min(bbox.p1.x), self.p1.y.min(bbox.p1.y)),
        };
        match clipped.is_empty() {
            true => BoundBox::empty(),
            false => clipped,
        }
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox {
            p0: Point::new(self.p0.x.min(bbox.p0.x), self.p0.y.min(bbox.p0.y)),
            p1: Point::new(self.p1.x.max(bbox.p1.x), self.p1.y.max(bbox.p1.y)),
        }
    }
    fn bbox(&self) -> BoundBox {
        *self
    }
}
impl BoundBoxTrait for Point {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox::from_point(*self).intersection(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox::from_point(*self).union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        BoundBox::from_point(*self)
    }
}
/// Extent of a point-set, e.g. a polygon's vertices
impl BoundBoxTrait for Vec<Point> {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().intersection(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        self.iter()
            .fold(BoundBox::empty(), |acc, pt| pt.union(&acc))
    }
}
impl BoundBoxTrait for Shape {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().intersection(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        match self {
            Shape::Rect(Rect { p0, p1 }) => BoundBox::from_points(*p0, *p1),
            Shape::Polygon(p) => p.points.bbox(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_intersection() {
        let a = BoundBox::from_points(Point::new(0., 0.), Point::new(2., 2.));
        let b = BoundBox::from_points(Point::new(3., 1.), Point::new(1., 5.));
        assert_eq!(b.p0, Point::new(1., 1.));
        let u = a.union(&b);
        assert_eq!(u.p1, Point::new(3., 5.));
        let i = a.intersection(&b);
        assert_eq!(i.size(), (1., 1.));
        assert!(a
            .intersection(&BoundBox::from_point(Point::new(9., 9.)))
            .is_empty());
        assert!(BoundBox::empty().is_empty());
        assert_eq!(BoundBox::empty().union(&a), a);
    }
    #[test]
    fn grow_and_contain() {
        let mut bbox = vec![Point::new(1., 1.), Point::new(-1., 3.)].bbox();
        assert_eq!(bbox.center(), Point::new(0., 2.));
        assert!(bbox.contains(&Point::new(1., 3.)));
        bbox.expand(1.);
        assert_eq!(bbox.size(), (4., 4.));
        assert!(bbox.contains(&Point::new(-2., 0.)));
    }
}
