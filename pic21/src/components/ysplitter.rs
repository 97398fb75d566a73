//!
//! # Spline Y-Splitters
//!
//! A 1x2 splitter whose multi-mode region follows a smooth width profile,
//! interpolated by a clamped cubic spline through evenly spaced width samples.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use super::{EulerSBend, Taper};
use crate::component::{Built, Component, Placement};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::gds::MAX_BOUNDARY_VERTICES;
use crate::geom::{Point, Polygon};
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;
use crate::toolkit::TOL;

/// # Clamped Cubic Spline
///
/// Interpolates `values` at evenly spaced knots across `[0, length]`,
/// with zero slope at both ends.
#[derive(Debug, Clone)]
pub(crate) struct ClampedSpline {
    step: f64,
    values: Vec<f64>,
    /// Second derivatives at each knot
    curvatures: Vec<f64>,
}
impl ClampedSpline {
    pub(crate) fn new(length: f64, values: &[f64]) -> PicResult<Self> {
        let n = values.len();
        if n < 2 || !(length > 0.) {
            return PicError::invalid(format!(
                "Spline requires at least two values over a positive length, got {} over {}",
                n, length
            ));
        }
        let h = length / (n - 1) as f64;
        // Tridiagonal system for the knot curvatures, solved by forward sweep and back-substitution
        let mut diag = vec![4.; n];
        let mut rhs = vec![0.; n];
        diag[0] = 2.;
        diag[n - 1] = 2.;
        rhs[0] = 6. / (h * h) * (values[1] - values[0]);
        rhs[n - 1] = -6. / (h * h) * (values[n - 1] - values[n - 2]);
        for i in 1..n - 1 {
            rhs[i] = 6. / (h * h) * (values[i + 1] - 2. * values[i] + values[i - 1]);
        }
        for i in 1..n {
            let m = 1. / diag[i - 1];
            diag[i] -= m;
            rhs[i] -= m * rhs[i - 1];
        }
        let mut curvatures = vec![0.; n];
        curvatures[n - 1] = rhs[n - 1] / diag[n - 1];
        for i in (0..n - 1).rev() {
            curvatures[i] = (rhs[i] - curvatures[i + 1]) / diag[i];
        }
        Ok(Self {
            step: h,
            values: values.to_vec(),
            curvatures,
        })
    }
    /// Evaluate at `x`, clamped to the spline's domain
    pub(crate) fn eval(&self, x: f64) -> f64 {
        let h = self.step;
        let last = self.values.len() - 2;
        let i = ((x / h).floor().max(0.) as usize).min(last);
        let (a, b) = ((i + 1) as f64 * h - x, x - i as f64 * h);
        let (m0, m1) = (self.curvatures[i], self.curvatures[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        m0 * a.powi(3) / (6. * h)
            + m1 * b.powi(3) / (6. * h)
            + (y0 / h - m0 * h / 6.) * a
            + (y1 / h - m1 * h / 6.) * b
    }
}

/// # Spline Y-Splitter
///
/// An optional input [Taper] from the template's width to `taper_width`,
/// a splitter region of `length` following the `widths` profile,
/// and optional Euler S-bend outputs which spread the arms from `wg_sep` to `output_wg_sep`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SplineYSplitter {
    pub wgt: WaveguideTemplate,
    pub length: f64,
    /// Full widths of the splitter region, evenly spaced along its length
    pub widths: Vec<f64>,
    /// Center-to-center separation of the arms where they leave the splitter region.
    /// Defaults to the last width less the `output_width`.
    pub wg_sep: Option<f64>,
    pub taper_width: Option<f64>,
    pub taper_length: Option<f64>,
    pub output_length: Option<f64>,
    pub output_wg_sep: Option<f64>,
    /// Starting width of the output arms. Defaults to the template's `wg_width`.
    pub output_width: Option<f64>,
}
impl SplineYSplitter {
    pub fn new(wgt: WaveguideTemplate, length: f64, widths: Vec<f64>) -> Self {
        Self {
            wgt,
            length,
            widths,
            ..Default::default()
        }
    }
    pub fn output_width(&self) -> f64 {
        self.output_width.unwrap_or(self.wgt.wg_width)
    }
    pub fn wg_sep(&self) -> f64 {
        let last = self.widths.last().copied().unwrap_or(0.);
        self.wg_sep.unwrap_or(last - self.output_width())
    }
    /// Input taper, if both its width and length are set
    fn input_taper(&self) -> PicResult<Option<(f64, f64)>> {
        match (self.taper_width, self.taper_length) {
            (Some(w), Some(l)) => Ok(Some((w, l))),
            (None, None) => Ok(None),
            _ => PicError::invalid("SplineYSplitter taper_width and taper_length must be set together"),
        }
    }
    /// Output S-bends' length and final separation, if both are set
    fn outputs(&self) -> PicResult<Option<(f64, f64)>> {
        match (self.output_length, self.output_wg_sep) {
            (Some(l), Some(s)) => Ok(Some((l, s))),
            (None, None) => Ok(None),
            _ => PicError::invalid("SplineYSplitter output_length and output_wg_sep must be set together"),
        }
    }
    /// Extent along the propagation axis, from input to outputs
    pub fn total_length(&self) -> f64 {
        self.taper_length.unwrap_or(0.) + self.length + self.output_length.unwrap_or(0.)
    }
    fn validate(&self) -> PicResult<()> {
        let (sep, ow) = (self.wg_sep(), self.output_width());
        let last = self.widths.last().copied().unwrap_or(0.);
        if sep > last - ow + TOL {
            return PicError::invalid(format!(
                "SplineYSplitter wg_sep ({}) exceeds the last width less the output width ({})",
                sep,
                last - ow
            ));
        }
        if sep < ow {
            return PicError::invalid(format!(
                "SplineYSplitter wg_sep ({}) is narrower than the output width ({}), merging its arms",
                sep, ow
            ));
        }
        if let Some((length, out_sep)) = self.outputs()? {
            if length < (out_sep - sep) / 2. {
                return PicError::invalid(format!(
                    "SplineYSplitter output_length ({}) must be at least half the change in separation ({})",
                    length,
                    out_sep - sep
                ));
            }
        }
        Ok(())
    }
}
impl Component for SplineYSplitter {
    fn kind(&self) -> &'static str {
        "spline_y_splitter"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        self.validate()?;
        let spline = ClampedSpline::new(self.length, &self.widths)?;
        let mut layout = Layout::default();

        let mut x0 = 0.;
        if let Some((width, length)) = self.input_taper()? {
            let taper = Taper::new(wgt.clone(), length, width);
            lib.place(&mut layout, &taper, Placement::default())?;
            x0 = length;
        }

        let samples = ((self.length / (2.5 * wgt.grid)) as usize).clamp(2, MAX_BOUNDARY_VERTICES / 2);
        let xs: Vec<f64> = (0..samples)
            .map(|k| self.length * k as f64 / (samples - 1) as f64)
            .collect();
        let mut points: Vec<Point> = xs
            .iter()
            .map(|x| Point::new(x0 + x, spline.eval(*x) / 2.))
            .collect();
        points.extend(xs.iter().rev().map(|x| Point::new(x0 + x, -spline.eval(*x) / 2.)));
        layout.add(wgt.wg_layer, Polygon::new(points));

        let (first, last) = (spline.eval(0.), spline.eval(self.length));
        let x1 = x0 + self.length;
        for (w, layer) in wgt.stack().iter().skip(1) {
            let c = (w - wgt.wg_width) / 2.;
            let clad = Polygon::new(vec![
                Point::new(x0, first / 2. + c),
                Point::new(x1, last / 2. + c),
                Point::new(x1, -last / 2. - c),
                Point::new(x0, -first / 2. - c),
            ]);
            layout.add(*layer, clad);
        }

        let sep = self.wg_sep();
        let mut out_sep = sep;
        if let Some((length, final_sep)) = self.outputs()? {
            let dy = (final_sep - sep) / 2.;
            for side in [1., -1.] {
                let bend = EulerSBend {
                    start_width: Some(self.output_width()),
                    end_width: Some(wgt.wg_width),
                    ..EulerSBend::new(wgt.clone(), length, side * dy)
                };
                lib.place(&mut layout, &bend, Placement::new((x1, side * sep / 2.), Direction::EAST))?;
            }
            out_sep = final_sep;
        }

        let x = self.total_length();
        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output_top", Port::new((x, out_sep / 2.), Direction::EAST))
            .with("output_bot", Port::new((x, -out_sep / 2.), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Shape, ShapeTrait};
    use approx::assert_abs_diff_eq;

    fn widths() -> Vec<f64> {
        vec![0.5, 0.5, 0.6, 0.7, 0.9, 1.26, 1.4, 1.4, 1.4, 1.4, 1.31, 1.2, 1.2]
    }
    fn wgt() -> WaveguideTemplate {
        WaveguideTemplate {
            wg_width: 0.5,
            clad_width: 3.,
            ..Default::default()
        }
    }

    #[test]
    fn clamped_spline() -> PicResult<()> {
        // Two values interpolate as a smooth step
        let step = ClampedSpline::new(2., &[0.5, 1.5])?;
        assert_abs_diff_eq!(step.eval(1.), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(step.eval(0.5), 0.65625, epsilon = 1e-12);
        assert_abs_diff_eq!(step.eval(2.), 1.5, epsilon = 1e-12);

        // Passes through every knot, and holds constant data flat
        let spline = ClampedSpline::new(2., &widths())?;
        for (k, w) in widths().iter().enumerate() {
            assert_abs_diff_eq!(spline.eval(k as f64 / 6.), *w, epsilon = 1e-9);
        }
        let flat = ClampedSpline::new(1., &[1., 1., 1., 1.])?;
        assert_abs_diff_eq!(flat.eval(0.37), 1., epsilon = 1e-12);

        assert!(ClampedSpline::new(1., &[1.]).is_err());
        Ok(())
    }
    #[test]
    fn splitter_with_outputs() -> PicResult<()> {
        let ys = SplineYSplitter {
            output_length: Some(10.),
            output_wg_sep: Some(5.),
            ..SplineYSplitter::new(wgt(), 2., widths())
        };
        assert_abs_diff_eq!(ys.wg_sep(), 0.7, epsilon = 1e-12);
        let mut lib = Library::default();
        let built = ys.build(&mut lib)?;
        let top = built.ports.get("output_top")?;
        assert_abs_diff_eq!(top.port.x, 12., epsilon = 1e-12);
        assert_abs_diff_eq!(top.port.y, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(built.ports.get("output_bot")?.port.y, -2.5, epsilon = 1e-12);
        // Two S-bends
        assert_eq!(built.layout.insts.len(), 2);

        let core = built
            .layout
            .elems
            .iter()
            .find_map(|e| match &e.inner {
                Shape::Polygon(p) if e.layer == wgt().wg_layer => Some(p.clone()),
                _ => None,
            })
            .ok_or(PicError::msg("No splitter region"))?;
        assert!(core.contains(&Point::new(1., 0.6)));
        assert!(!core.contains(&Point::new(0.1, 0.3)));
        Ok(())
    }
    #[test]
    fn splitter_with_taper() -> PicResult<()> {
        let ys = SplineYSplitter {
            taper_width: Some(0.5),
            taper_length: Some(4.),
            ..SplineYSplitter::new(wgt(), 2., widths())
        };
        let built = ys.build(&mut Library::default())?;
        let top = built.ports.get("output_top")?;
        assert_abs_diff_eq!(top.port.x, 6., epsilon = 1e-12);
        assert_abs_diff_eq!(top.port.y, 0.35, epsilon = 1e-12);
        assert_eq!(built.ports.get("input")?.direction, Direction::WEST);
        assert_eq!(built.layout.insts.len(), 1);

        let half = SplineYSplitter {
            taper_width: None,
            ..ys.clone()
        };
        assert!(half.build(&mut Library::default()).is_err());
        let wide = SplineYSplitter {
            wg_sep: Some(1.),
            ..ys.clone()
        };
        assert!(wide.build(&mut Library::default()).is_err());
        let short = SplineYSplitter {
            output_length: Some(1.),
            output_wg_sep: Some(5.),
            ..ys
        };
        assert!(short.build(&mut Library::default()).is_err());
        Ok(())
    }
}
