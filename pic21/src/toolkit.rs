//!
//! # Routing Toolkit
//!
//! Helper functions shared by the component generators:
//! directions between waypoints, angle normalization, trace lengths,
//! and the number of points needed to draw a curve within the grid resolution.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI, TAU};

// Local imports
use crate::dir::{Cardinal, Direction};
use crate::error::{PicError, PicResult};
use crate::geom::Point;

/// Geometric comparison tolerance, in microns
pub const TOL: f64 = 1e-6;

/// Get the [Cardinal] direction pointing from `p1` towards `p2`.
/// Fails if the two are not horizontally or vertically aligned.
pub fn get_angle(p1: &Point, p2: &Point) -> PicResult<Cardinal> {
    let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
    if dx.abs() <= TOL && dy > 0. {
        Ok(Cardinal::North)
    } else if dy.abs() <= TOL && dx < 0. {
        Ok(Cardinal::West)
    } else if dx.abs() <= TOL && dy < 0. {
        Ok(Cardinal::South)
    } else if dy.abs() <= TOL && dx > 0. {
        Ok(Cardinal::East)
    } else {
        Err(PicError::Geometry(format!(
            "Points {:?} and {:?} must be separated by an integer multiple of 90 degrees",
            p1, p2
        )))
    }
}
/// Angle (radians) of the vector from `p1` to `p2`
pub fn get_exact_angle(p1: &Point, p2: &Point) -> f64 {
    (p2.y - p1.y).atan2(p2.x - p1.x)
}
/// Get the [Cardinal] direction pointing from `p1` towards `p2`,
/// defaulting to East for anything not North, West, or South.
pub fn get_direction(p1: &Point, p2: &Point) -> Cardinal {
    get_angle(p1, p2).unwrap_or(Cardinal::East)
}
/// Get the turn (+pi/2 counter-clockwise, -pi/2 clockwise) from `dir1` to `dir2`.
/// Fails for U-turns and non-turns.
pub fn get_turn(dir1: Cardinal, dir2: Cardinal) -> PicResult<f64> {
    use Cardinal::*;
    match (dir1, dir2) {
        (North, West) | (West, South) | (South, East) | (East, North) => Ok(FRAC_PI_2),
        (North, East) | (East, South) | (South, West) | (West, North) => Ok(-FRAC_PI_2),
        _ => Err(PicError::Geometry(format!(
            "No quarter-turn from {} to {}",
            dir1, dir2
        ))),
    }
}
/// The opposite of `dir`
pub fn flip_direction(dir: Direction) -> Direction {
    dir.flip()
}
/// Translate `pt` by `length` in direction `dir`
pub fn translate_point(pt: &Point, length: f64, dir: Direction) -> Point {
    match dir {
        Direction::Cardinal(Cardinal::North) => Point::new(pt.x, pt.y + length),
        Direction::Cardinal(Cardinal::South) => Point::new(pt.x, pt.y - length),
        Direction::Cardinal(Cardinal::West) => Point::new(pt.x - length, pt.y),
        Direction::Cardinal(Cardinal::East) => Point::new(pt.x + length, pt.y),
        Direction::Angle(a) => pt.translate(length, a),
    }
}
/// Normalize `angle` to the range (-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let angle = angle.rem_euclid(TAU);
    if angle > PI {
        angle - TAU
    } else {
        angle
    }
}
/// Distance between two points
pub fn dist(p1: &Point, p2: &Point) -> f64 {
    p1.dist(p2)
}
/// Length of a Manhattan waveguide trace, routed with 90-degree bends of `bend_radius`.
/// Each segment's length is reduced by `2R - pi R / 2`.
pub fn get_trace_length(trace: &[Point], bend_radius: f64) -> f64 {
    if trace.len() < 2 {
        return 0.;
    }
    let dbr = 2. * bend_radius - FRAC_PI_2 * bend_radius;
    let total: f64 = trace.windows(2).map(|w| w[0].dist(&w[1])).sum();
    total - dbr * (trace.len() - 1) as f64
}
/// Angular step for which an arc of `radius` deviates from its chord by no more than half of `grid`
fn angular_step(radius: f64, grid: f64) -> f64 {
    let c = 1. - 0.5 * grid / radius;
    (2. * c * c - 1.).clamp(-1., 1.).acos()
}
/// Number of points for an arc of `angle` radians on `radius`
pub fn num_points_arc(angle: f64, radius: f64, grid: f64) -> usize {
    let step = angular_step(radius, grid);
    if !(step > 0.) {
        return 2;
    }
    ((angle / step).abs().ceil() as usize).max(2)
}
/// Number of points for a waveguide bend of `angle` radians on `radius`.
/// Double the arc count, as each bend polygon has two edges.
pub fn num_points_bend(angle: f64, radius: f64, grid: f64) -> usize {
    let step = angular_step(radius, grid);
    if !(step > 0.) {
        return 4;
    }
    (2 * (angle / step).abs().ceil() as usize).max(4)
}

/// Fresnel integrals `(S(t), C(t))`, with `S = int sin(pi u^2 / 2)` and `C = int cos(pi u^2 / 2)` from zero to `t`.
pub fn fresnel(t: f64) -> (f64, f64) {
    let x = t.abs();
    let sign = t.signum();
    if x > 3.5 {
        // Leading asymptotic terms
        let arg = FRAC_PI_2 * x * x;
        let f = 1. / (PI * x);
        let g = 1. / (PI * PI * x * x * x);
        let (sin, cos) = arg.sin_cos();
        let c = 0.5 + f * sin - g * cos;
        let s = 0.5 - f * cos - g * sin;
        return (sign * s, sign * c);
    }
    // Power series, alternating over terms of `(pi/2)^k x^(2k+1) / k!`
    let a = FRAC_PI_2 * x * x;
    let (mut s, mut c) = (0., 0.);
    let mut term = x; // a^k x / k!
    for k in 0..200 {
        let contrib = term / (2 * k + 1) as f64;
        match k % 4 {
            0 => c += contrib,
            1 => s += contrib,
            2 => c -= contrib,
            _ => s -= contrib,
        }
        term *= a / (k + 1) as f64;
        if term.abs() < 1e-18 {
            break;
        }
    }
    (sign * s, sign * c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn angles_and_directions() -> PicResult<()> {
        let o = Point::origin();
        assert_eq!(get_angle(&o, &Point::new(0., 100.))?, Cardinal::North);
        assert!(get_angle(&o, &Point::new(1., 1.)).is_err());
        assert_eq!(get_direction(&o, &Point::new(-100., 0.)), Cardinal::West);
        assert_eq!(get_direction(&o, &Point::new(3., 4.)), Cardinal::East);
        assert_abs_diff_eq!(get_exact_angle(&o, &Point::new(100., 100.)), PI / 4.);
        assert_eq!(get_turn(Cardinal::East, Cardinal::North)?, FRAC_PI_2);
        assert_eq!(get_turn(Cardinal::West, Cardinal::North)?, -FRAC_PI_2);
        assert!(get_turn(Cardinal::West, Cardinal::East).is_err());
        Ok(())
    }
    #[test]
    fn normalize() {
        assert_abs_diff_eq!(normalize_angle(3. * PI / 2.), -PI / 2., epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(0.5), 0.5, epsilon = 1e-12);
    }
    #[test]
    fn translate() {
        let p = translate_point(&Point::new(1., 1.), 2., Direction::SOUTH);
        assert_eq!(p, Point::new(1., -1.));
        let p = translate_point(&Point::origin(), 2., Direction::Angle(PI / 2.));
        assert_abs_diff_eq!(p.y, 2.);
    }
    #[test]
    fn trace_length() {
        let trace = vec![
            Point::new(0., 0.),
            Point::new(100., 0.),
            Point::new(100., 100.),
        ];
        let expected = 200. - 2. * (2. * 10. - FRAC_PI_2 * 10.);
        assert_abs_diff_eq!(get_trace_length(&trace, 10.), expected, epsilon = 1e-9);
    }
    #[test]
    fn fresnel_values() {
        // Reference values of (S, C)
        let (s, c) = fresnel(0.5);
        assert_abs_diff_eq!(s, 0.0647324328599, epsilon = 1e-9);
        assert_abs_diff_eq!(c, 0.4923442258714, epsilon = 1e-9);
        let (s, c) = fresnel(1.0);
        assert_abs_diff_eq!(s, 0.438259147390355, epsilon = 1e-12);
        assert_abs_diff_eq!(c, 0.779893400376823, epsilon = 1e-12);
        let (s, c) = fresnel(-1.0);
        assert_abs_diff_eq!(s, -0.438259147390355, epsilon = 1e-12);
        assert_abs_diff_eq!(c, -0.779893400376823, epsilon = 1e-12);
        let (s, c) = fresnel(10.);
        assert_abs_diff_eq!(s, 0.468169978684, epsilon = 1e-4);
        assert_abs_diff_eq!(c, 0.499898694205, epsilon = 1e-4);
    }
    #[test]
    fn point_counts() {
        assert!(num_points_bend(FRAC_PI_2, 50., 0.001) > num_points_arc(FRAC_PI_2, 50., 0.001));
        assert_eq!(num_points_arc(0., 50., 0.001), 2);
    }
}
