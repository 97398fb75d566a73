//!
//! # Component Trait and Placement
//!
//! Every PCell implements [Component]: a serializable parameter struct which can draw itself
//! into a [Layout] and report its [Portlist]. Components are drawn in their own local frame,
//! with the input at the origin facing WEST and the body extending EAST.
//! [Placement] then rotates and moves the resulting cell into its parent.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::PicResult;
use crate::geom::{Point, Transform};
use crate::port::{Port, Portlist};

/// # Component Build Result
#[derive(Debug, Clone, Default)]
pub struct Built {
    /// Geometry, in the component's local frame
    pub layout: Layout,
    /// Ports, in the component's local frame
    pub ports: Portlist,
}

///
/// # Component Trait
///
/// Implemented by each parametric cell.
///
pub trait Component: Serialize {
    /// Cell base name, e.g. `"waveguide"`
    fn kind(&self) -> &'static str;
    /// Draw the component, adding any sub-cells to `lib`
    fn build(&self, lib: &mut Library) -> PicResult<Built>;
    /// Key identifying identical components, which share a single cell
    fn fingerprint(&self) -> PicResult<String> {
        Ok(format!("{}:{}", self.kind(), serde_json::to_string(self)?))
    }
}

/// # Component Placement
///
/// Where a component's local origin lands in its parent, and which way its local EAST points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Placement {
    pub port: Point,
    pub direction: Direction,
}
impl Placement {
    /// Create a new [Placement]
    pub fn new(port: impl Into<Point>, direction: impl Into<Direction>) -> Self {
        Self {
            port: port.into(),
            direction: direction.into(),
        }
    }
    /// Rotation in degrees, or `None` for unrotated placements
    pub fn angle(&self) -> Option<f64> {
        let angle = self.direction.angle();
        match angle == 0. {
            true => None,
            false => Some(angle.to_degrees()),
        }
    }
    /// Local-to-parent [Transform]: rotation about the origin, then translation to `port`
    pub fn transform(&self) -> Transform {
        Transform::from_instance(&self.port, false, self.angle())
    }
}
/// Place a component such that its input connects to `port`, continuing in its direction
impl From<&Port> for Placement {
    fn from(p: &Port) -> Self {
        Self {
            port: p.port,
            direction: p.direction,
        }
    }
}
impl From<Port> for Placement {
    fn from(p: Port) -> Self {
        Self::from(&p)
    }
}
impl From<(Point, Direction)> for Placement {
    fn from(t: (Point, Direction)) -> Self {
        Self::new(t.0, t.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn placement_transform() {
        let p = Placement::new((5., 5.), Direction::NORTH);
        assert_abs_diff_eq!(p.angle().unwrap_or_default(), 90., epsilon = 1e-12);
        let q = Point::new(1., 0.).transform(&p.transform());
        assert_abs_diff_eq!(q.x, 5., epsilon = 1e-12);
        assert_abs_diff_eq!(q.y, 6., epsilon = 1e-12);
        assert_eq!(Placement::default().angle(), None);
    }
}
