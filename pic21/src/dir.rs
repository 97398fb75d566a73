//!
//! # Port Directions
//!
//! Component ports face either one of the four [Cardinal] directions,
//! or an arbitrary angle, measured in radians counter-clockwise from East.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI, TAU};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{PicError, PicResult};
use crate::toolkit::TOL;
use crate::utils::{enumstr, EnumStr};

enumstr!(
    /// # Cardinal Directions
    #[derive(JsonSchema)]
    Cardinal {
        North: "NORTH",
        West: "WEST",
        South: "SOUTH",
        East: "EAST",
    }
);
impl Cardinal {
    /// Angle in radians: East zero, North pi/2, West pi, South 3pi/2
    pub fn angle(&self) -> f64 {
        match self {
            Self::East => 0.,
            Self::North => FRAC_PI_2,
            Self::West => PI,
            Self::South => 1.5 * PI,
        }
    }
    /// The opposite direction
    pub fn flip(&self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
    /// Get the [Cardinal] for `angle`, if it is a multiple of pi/2
    pub fn from_angle(angle: f64) -> Option<Self> {
        let quarters = angle / FRAC_PI_2;
        let nearest = quarters.round();
        if (quarters - nearest).abs() * FRAC_PI_2 > TOL {
            return None;
        }
        match (nearest as i64).rem_euclid(4) {
            0 => Some(Self::East),
            1 => Some(Self::North),
            2 => Some(Self::West),
            _ => Some(Self::South),
        }
    }
}

/// # Port Direction
///
/// Either a [Cardinal] direction, or an angle in radians.
/// Serialized as a string (`"NORTH"`) or a number respectively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum Direction {
    Cardinal(Cardinal),
    Angle(f64),
}
impl Direction {
    pub const NORTH: Direction = Direction::Cardinal(Cardinal::North);
    pub const WEST: Direction = Direction::Cardinal(Cardinal::West);
    pub const SOUTH: Direction = Direction::Cardinal(Cardinal::South);
    pub const EAST: Direction = Direction::Cardinal(Cardinal::East);

    /// Create from an angle in radians, snapping to a [Cardinal] where within tolerance.
    pub fn from_angle(angle: f64) -> Self {
        match Cardinal::from_angle(angle) {
            Some(c) => Self::Cardinal(c),
            None => Self::Angle(angle.rem_euclid(TAU)),
        }
    }
    /// Angle in radians, counter-clockwise from East
    pub fn angle(&self) -> f64 {
        match self {
            Self::Cardinal(c) => c.angle(),
            Self::Angle(a) => *a,
        }
    }
    /// The opposite direction
    pub fn flip(&self) -> Self {
        match self {
            Self::Cardinal(c) => Self::Cardinal(c.flip()),
            Self::Angle(a) => Self::Angle((a + PI).rem_euclid(TAU)),
        }
    }
    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(&self, angle: f64) -> Self {
        Self::from_angle(self.angle() + angle)
    }
    /// Convert to a [Cardinal], failing if not axis-aligned
    pub fn cardinal(&self) -> PicResult<Cardinal> {
        match self {
            Self::Cardinal(c) => Ok(*c),
            Self::Angle(a) => match Cardinal::from_angle(*a) {
                Some(c) => Ok(c),
                None => Err(PicError::Validation(format!(
                    "Direction {} rad is not a multiple of pi/2",
                    a
                ))),
            },
        }
    }
}
impl Default for Direction {
    fn default() -> Self {
        Self::EAST
    }
}
impl From<Cardinal> for Direction {
    fn from(c: Cardinal) -> Self {
        Self::Cardinal(c)
    }
}
impl From<f64> for Direction {
    fn from(a: f64) -> Self {
        Self::from_angle(a)
    }
}
impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Cardinal(c) => write!(f, "{}", c.to_str()),
            Self::Angle(a) => write!(f, "{}", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cardinal_angles() {
        assert_eq!(Cardinal::from_angle(0.), Some(Cardinal::East));
        assert_eq!(Cardinal::from_angle(-FRAC_PI_2), Some(Cardinal::South));
        assert_eq!(Cardinal::from_angle(5. * PI), Some(Cardinal::West));
        assert_eq!(Cardinal::from_angle(0.3), None);
        assert_eq!(Cardinal::North.flip(), Cardinal::South);
    }
    #[test]
    fn direction_rotate_and_flip() {
        assert_eq!(Direction::EAST.rotate(FRAC_PI_2), Direction::NORTH);
        assert_eq!(Direction::WEST.rotate(PI), Direction::EAST);
        let d = Direction::EAST.rotate(0.25);
        assert_abs_diff_eq!(d.angle(), 0.25);
        assert_abs_diff_eq!(d.flip().angle(), 0.25 + PI);
        assert!(d.cardinal().is_err());
        assert_eq!(Direction::Angle(PI).cardinal().unwrap(), Cardinal::West);
    }
    #[test]
    fn direction_serde() {
        let d: Direction = serde_json::from_str("\"NORTH\"").unwrap();
        assert_eq!(d, Direction::NORTH);
        let d: Direction = serde_json::from_str("1.5").unwrap();
        assert_eq!(d, Direction::Angle(1.5));
        assert_eq!(serde_json::to_string(&Direction::WEST).unwrap(), "\"WEST\"");
    }
}
