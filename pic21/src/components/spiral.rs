//!
//! # Spiral
//!
//! A rectangular double spiral of fixed footprint `width`,
//! whose number of turns and height are solved for to produce a requested waveguide length.
//!

// Std-Lib
use std::f64::consts::FRAC_PI_2;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// Local imports
use super::Waveguide;
use crate::component::{Built, Component, Placement};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

/// # Spiral
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Spiral {
    pub wgt: WaveguideTemplate,
    /// Distance between input and output ports
    pub width: f64,
    /// Target waveguide length
    pub length: f64,
    /// Center-to-center distance between adjacent waveguides. Defaults to three times the `clad_width`.
    pub spacing: Option<f64>,
    /// +1 spirals below the ports, -1 above
    pub parity: i8,
}
impl Default for Spiral {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            width: 0.,
            length: 0.,
            spacing: None,
            parity: 1,
        }
    }
}
impl Spiral {
    pub fn new(wgt: WaveguideTemplate, width: f64, length: f64) -> Self {
        Self {
            wgt,
            width,
            length,
            ..Default::default()
        }
    }
    /// Waypoints of the spiral's [Waveguide], in its local frame
    pub fn waypoints(&self) -> PicResult<Vec<Point>> {
        let dims = Dims::new(self)?;
        let n = dims.turns(self.length)?;
        let h = dims.height(self.length, n);
        if (self.length - dims.length(h, n)).abs() > 1e-6 {
            return PicError::geometry(format!(
                "Spiral of {} turns and height {} does not meet its length {}",
                n, h, self.length
            ));
        }
        debug!("Spiral with {} turns, height {}", n, h);
        let points = dims.waypoints(h, n, self.parity as f64);

        // Verify against the waypoints themselves
        let polyline: f64 = points.windows(2).map(|w| w[0].dist(&w[1])).sum();
        let routed = polyline - (points.len() - 2) as f64 * dims.corner_dl;
        if (routed - self.length).abs() > 1e-6 {
            return PicError::geometry(format!(
                "Spiral waypoints produce length {}, expected {}",
                routed, self.length
            ));
        }
        Ok(points)
    }
}
impl Component for Spiral {
    fn kind(&self) -> &'static str {
        "spiral"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let trace = self.waypoints()?;
        let mut layout = Layout::default();
        let wg = Waveguide::new(trace, wgt);
        lib.place(&mut layout, &wg, Placement::default())?;
        info!("Spiral length: {}", self.length);
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((self.width, 0.), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

/// Spiral dimensions, and the closed-form length of a spiral of given height and turns
struct Dims {
    width: f64,
    spacing: f64,
    bend_radius: f64,
    /// Length removed from the polyline at each corner
    corner_dl: f64,
}
impl Dims {
    fn new(spiral: &Spiral) -> PicResult<Self> {
        let wgt = spiral.wgt.resolve()?;
        if spiral.parity != 1 && spiral.parity != -1 {
            return PicError::invalid(format!("parity must be +1 or -1, got {}", spiral.parity));
        }
        let spacing = spiral.spacing.unwrap_or(3. * wgt.clad_width);
        if !(spacing > 0.) {
            return PicError::invalid(format!("Spiral spacing must be positive, got {}", spacing));
        }
        let (bend_radius, corner_dl) = match wgt.euler_bend {
            true => {
                let eff = wgt.effective_bend_radius();
                (eff, 2. * eff - wgt.bend_length_90())
            }
            false => {
                let r = wgt.bend_radius;
                (r, 2. * r - FRAC_PI_2 * r)
            }
        };
        if spiral.width < spacing + 5. * bend_radius {
            return PicError::invalid(format!(
                "Spiral width ({}) must be at least spacing + 5 bend radii ({})",
                spiral.width,
                spacing + 5. * bend_radius
            ));
        }
        Ok(Self {
            width: spiral.width,
            spacing,
            bend_radius,
            corner_dl,
        })
    }
    /// Half the inner width, where the inward and outward spirals meet
    fn wcent(&self) -> f64 {
        (self.width - self.spacing - self.bend_radius) / 2.
    }
    fn max_turns(&self) -> usize {
        ((self.width - self.spacing - 5. * self.bend_radius) / (2. * self.spacing)) as usize
    }
    fn min_height(&self, n: usize) -> f64 {
        2. * self.bend_radius + 2. * self.spacing + 2. * n as f64 * self.spacing
    }
    /// Routed length of a spiral of height `h` and `n` turns
    fn length(&self, h: f64, n: usize) -> f64 {
        let (w, s, br) = (self.width, self.spacing, self.bend_radius);
        let wcent = self.wcent();
        let fixed = 2. * wcent + (h - s) + wcent + br + h + (w - br) + (h - s) + wcent;
        let turns: f64 = (1..=n)
            .map(|i| {
                let i = i as f64;
                2. * (2. * (wcent - i * s) + (h - s - 2. * i * s))
            })
            .sum();
        let middle = (h - 2. * s) - 2. * n as f64 * s;
        let corners = (8 + 4 * n) as f64;
        fixed + turns + middle - corners * self.corner_dl
    }
    /// Largest number of turns whose minimum-height spiral fits within `goal`
    fn turns(&self, goal: f64) -> PicResult<usize> {
        let nmax = self.max_turns();
        let mut n = 0;
        let mut min_length = self.length(self.min_height(0), 0);
        while min_length < goal && n < nmax {
            n += 1;
            min_length = self.length(self.min_height(n), n);
        }
        if n == 0 {
            if min_length > goal {
                return PicError::geometry(format!(
                    "The minimum spiral length ({}) exceeds the requested length ({}). Decrease the spiral width.",
                    min_length, goal
                ));
            }
            return Ok(0);
        }
        Ok(n - 1)
    }
    /// Height of an `n`-turn spiral of length `goal`
    fn height(&self, goal: f64, n: usize) -> f64 {
        let hmin = self.min_height(n);
        let segments = (4 + 2 * n) as f64;
        hmin + (goal - self.length(hmin, n)) / segments
    }
    fn waypoints(&self, h: f64, n: usize, p: f64) -> Vec<Point> {
        let (w, s, br) = (self.width, self.spacing, self.bend_radius);
        let wcent = self.wcent();
        let mut points = vec![
            Point::new(0., 0.),
            Point::new(2. * wcent, 0.),
            Point::new(2. * wcent, -p * (h - s)),
        ];

        // Inward
        let (x_left, x_right) = (s, 2. * wcent - 2. * s);
        let (y_top, y_bot) = (-p * 2. * s, -p * (h - s));
        for i in 1..=n {
            let last = i == n;
            if i % 2 == 1 {
                let k = 2. * s * ((i - 1) / 2) as f64;
                points.push(Point::new(x_left + k, y_bot + p * k));
                points.push(Point::new(x_left + k, y_top - p * k));
                if last {
                    points.push(Point::new(wcent, y_top - p * k));
                }
            } else {
                let k = 2. * s * ((i - 2) / 2) as f64;
                points.push(Point::new(x_right - k, y_top - p * k));
                points.push(Point::new(x_right - k, y_bot + p * (k + 2. * s)));
                if last {
                    points.push(Point::new(wcent, y_bot + p * (k + 2. * s)));
                }
            }
        }
        if n == 0 {
            points.push(Point::new(wcent, y_bot));
        }

        // Outward, generated from the outside in
        let mut outward = Vec::new();
        let (x_left, x_right) = (2. * s, 2. * wcent - s);
        let (y_top, y_bot) = (-p * s, -p * (h - 2. * s));
        for i in 1..=n {
            let last = i == n;
            if i % 2 == 1 {
                let k = 2. * s * ((i - 1) / 2) as f64;
                outward.push(Point::new(x_right - k, y_top - p * k));
                outward.push(Point::new(x_right - k, y_bot + p * k));
                if last {
                    outward.push(Point::new(wcent, y_bot + p * k));
                }
            } else {
                let k = 2. * s * ((i - 2) / 2) as f64;
                outward.push(Point::new(x_left + k, y_bot + p * k));
                outward.push(Point::new(x_left + k, y_top - p * (k + 2. * s)));
                if last {
                    outward.push(Point::new(wcent, y_top - p * (k + 2. * s)));
                }
            }
        }
        if n == 0 {
            outward.push(Point::new(wcent, y_top));
        }
        points.extend(outward.into_iter().rev());

        points.extend([
            Point::new(0., -p * s),
            Point::new(0., -p * h),
            Point::new(w - br, -p * h),
            Point::new(w - br, 0.),
            Point::new(w, 0.),
        ]);
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn wgt() -> WaveguideTemplate {
        WaveguideTemplate {
            wg_width: 1.,
            ..Default::default()
        }
    }
    #[test]
    fn spiral_length() -> PicResult<()> {
        let spiral = Spiral {
            spacing: Some(20.),
            ..Spiral::new(wgt(), 500., 5000.)
        };
        let trace = spiral.waypoints()?;
        // Three turns
        assert_eq!(trace.len(), 22);
        let wg = Waveguide::new(trace, wgt());
        assert_abs_diff_eq!(wg.length()?, 5000., epsilon = 1e-4);

        let mut lib = Library::new("spirals");
        let built = spiral.build(&mut lib)?;
        assert_eq!(built.layout.insts.len(), 1);
        assert_eq!(built.ports.get("output")?.port, Point::new(500., 0.));
        // Parity +1 spirals below the ports
        let bbox = built.layout.bbox()?;
        assert!(bbox.p1.y < 12.);
        assert!(bbox.p0.y < -200.);
        Ok(())
    }
    #[test]
    fn no_turns() -> PicResult<()> {
        let spiral = Spiral {
            spacing: Some(20.),
            parity: -1,
            ..Spiral::new(wgt(), 500., 2000.)
        };
        let trace = spiral.waypoints()?;
        assert_eq!(trace.len(), 10);
        assert!(trace.iter().all(|p| p.y >= 0.));
        assert_abs_diff_eq!(Waveguide::new(trace, wgt()).length()?, 2000., epsilon = 1e-4);
        Ok(())
    }
    #[test]
    fn spiral_errors() {
        // Too narrow for its bends
        let narrow = Spiral::new(wgt(), 200., 5000.);
        assert!(matches!(narrow.waypoints(), Err(PicError::Validation(_))));
        // Too short for its width
        let short = Spiral {
            spacing: Some(20.),
            ..Spiral::new(wgt(), 500., 500.)
        };
        assert!(matches!(short.waypoints(), Err(PicError::Geometry(_))));
    }
}
