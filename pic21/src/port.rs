//!
//! # Ports and Portlists
//!
//! Each component exposes named [Port]s: a location and the direction a connecting
//! waveguide (or metal trace) leaves in. Ports follow their component through placement transforms.
//!

// Crates.io
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Transform};

/// # Port
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Port {
    /// Location
    pub port: Point,
    /// Outward-facing direction
    pub direction: Direction,
}
impl Port {
    /// Create a new [Port]
    pub fn new(port: impl Into<Point>, direction: impl Into<Direction>) -> Self {
        Self {
            port: port.into(),
            direction: direction.into(),
        }
    }
    /// Apply [Transform] `trans`. Directions rotate (and reflect) with the transform's matrix.
    pub fn transform(&self, trans: &Transform) -> Self {
        let (sin, cos) = self.direction.angle().sin_cos();
        let vx = trans.a[0][0] * cos + trans.a[0][1] * sin;
        let vy = trans.a[1][0] * cos + trans.a[1][1] * sin;
        Self {
            port: self.port.transform(trans),
            direction: Direction::from_angle(vy.atan2(vx)),
        }
    }
}

/// # Portlist
///
/// Insertion-ordered map of port names to [Port]s.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Portlist(pub IndexMap<String, Port>);

impl Portlist {
    /// Create a new, empty [Portlist]
    pub fn new() -> Self {
        Self::default()
    }
    /// Add or replace port `name`. Consumes and returns `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, port: Port) -> Self {
        self.insert(name, port);
        self
    }
    /// Add or replace port `name`
    pub fn insert(&mut self, name: impl Into<String>, port: Port) {
        self.0.insert(name.into(), port);
    }
    /// Get port `name`, failing with the list of available names if absent
    pub fn get(&self, name: &str) -> PicResult<&Port> {
        match self.0.get(name) {
            Some(p) => Ok(p),
            None => Err(PicError::Validation(format!(
                "No port named `{}`. Available ports: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ))),
        }
    }
    /// Iterate over port names, in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }
    /// Iterate over (name, port) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Port)> {
        self.0.iter()
    }
    /// Number of ports
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// Boolean indication of an empty portlist
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Apply [Transform] `trans` to every port, returning a new [Portlist]
    pub fn transform(&self, trans: &Transform) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, p)| (k.clone(), p.transform(trans)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn port_transform() {
        let p = Port::new((1., 0.), Direction::EAST);
        let t = Transform::from_instance(&Point::new(10., 0.), false, Some(90.));
        let q = p.transform(&t);
        assert_abs_diff_eq!(q.port.x, 10., epsilon = 1e-12);
        assert_abs_diff_eq!(q.port.y, 1., epsilon = 1e-12);
        assert_eq!(q.direction, Direction::NORTH);

        let r = Port::new((0., 1.), Direction::NORTH).transform(&Transform::reflect_vert());
        assert_eq!(r.direction, Direction::SOUTH);
    }
    #[test]
    fn portlist_lookup() {
        let ports = Portlist::new()
            .with("input", Port::new((0., 0.), Direction::WEST))
            .with("output", Port::new((5., 0.), Direction::EAST));
        assert_eq!(ports.names().collect::<Vec<_>>(), vec!["input", "output"]);
        assert!(ports.get("output").is_ok());
        let err = ports.get("output_top").unwrap_err();
        assert!(err.to_string().contains("input, output"));
    }
}
