//!
//! # Zero-Length Cavity
//!
//! A photonic-crystal nanobeam beside a bus waveguide. The nanobeam is perforated by a mirror of
//! identical holes, graded at either end toward smaller holes, which confine light between them.
//!

// Std-Lib
use std::f64::consts::TAU;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use super::StackPath;
use crate::component::{Built, Component};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::mask::{boolean, BooleanOp};
use crate::path::{round, PathBuilder};
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;
use crate::utils::enumstr;

enumstr!(
    /// # Mirror Taper Profiles
    /// Fill-factor tapers grow the hole area linearly at constant period.
    /// Ratio tapers keep the radius-to-period ratio constant.
    #[derive(JsonSchema)]
    CavityTaper {
        FillFactor: "FF",
        Ratio: "ratio",
    }
);
impl Default for CavityTaper {
    fn default() -> Self {
        Self::FillFactor
    }
}

/// # Zero-Length Cavity
///
/// A bus waveguide along the x-axis, and a parallel nanobeam `gap` away.
/// The nanobeam carries `num_holes` mirror holes of `radius` at `period`, flanked on each side by
/// `num_taper_holes` holes graded from `radius_taper` up to `radius`,
/// then `wgt_beam_length` of plain nanobeam.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ZeroLengthCavity {
    pub wgt: WaveguideTemplate,
    pub num_holes: usize,
    pub period: f64,
    pub radius: f64,
    /// Radius of the outermost taper holes. Defaults to half the `radius`.
    pub radius_taper: Option<f64>,
    pub gap: f64,
    pub wgt_beam_length: f64,
    pub num_taper_holes: usize,
    pub taper_type: CavityTaper,
}
impl Default for ZeroLengthCavity {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            num_holes: 0,
            period: 0.,
            radius: 0.,
            radius_taper: None,
            gap: 0.,
            wgt_beam_length: 0.,
            num_taper_holes: 4,
            taper_type: CavityTaper::default(),
        }
    }
}
impl ZeroLengthCavity {
    pub fn new(
        wgt: WaveguideTemplate,
        num_holes: usize,
        period: f64,
        radius: f64,
        gap: f64,
        wgt_beam_length: f64,
    ) -> Self {
        Self {
            wgt,
            num_holes,
            period,
            radius,
            gap,
            wgt_beam_length,
            ..Default::default()
        }
    }
    pub fn radius_taper(&self) -> f64 {
        self.radius_taper.unwrap_or(self.radius / 2.)
    }
    /// Length of each graded section
    pub fn taper_length(&self) -> f64 {
        let n = self.num_taper_holes as f64;
        match self.taper_type {
            CavityTaper::FillFactor => n * self.period,
            CavityTaper::Ratio => {
                let (r, rt) = (self.radius, self.radius_taper());
                self.period / r * (r * n + (n + 1.) * (rt - r) / 2.)
            }
        }
    }
    /// Distance from input to output
    pub fn total_length(&self) -> f64 {
        self.num_holes as f64 * self.period + 2. * self.taper_length() + 2. * self.wgt_beam_length
    }
    /// Center x-coordinate and radius of every hole
    fn holes(&self) -> Vec<(f64, f64)> {
        let (p, r, rt) = (self.period, self.radius, self.radius_taper());
        let (beam, total) = (self.wgt_beam_length, self.total_length());
        let mut holes = Vec::with_capacity(self.num_holes + 2 * self.num_taper_holes);
        let start = beam + self.taper_length() + p / 2.;
        holes.extend((0..self.num_holes).map(|i| (start + i as f64 * p, r)));

        let nt = self.num_taper_holes;
        // Fraction of the way from the outermost taper hole to the mirror
        let frac = |i: usize| match nt > 1 {
            true => i as f64 / (nt - 1) as f64,
            false => 0.,
        };
        for i in 0..nt {
            let (radius, x) = match self.taper_type {
                CavityTaper::FillFactor => {
                    let radius = (rt * rt + frac(i) * (r * r - rt * rt)).sqrt();
                    (radius, p / 2. + i as f64 * p)
                }
                CavityTaper::Ratio => {
                    let radius = rt + frac(i) * (r - rt);
                    (radius, i as f64 * radius * p / r)
                }
            };
            holes.push((beam + x, radius));
            holes.push((total - beam - x, radius));
        }
        holes
    }
}
impl Component for ZeroLengthCavity {
    fn kind(&self) -> &'static str {
        "zero_length_cavity"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        let rt = self.radius_taper();
        if !(self.period > 0.) || !(self.radius > 0.) || !(rt > 0.) {
            return PicError::invalid(format!(
                "ZeroLengthCavity requires positive period and radii, got {}, {} and {}",
                self.period, self.radius, rt
            ));
        }
        if self.gap < 0. || self.wgt_beam_length < 0. {
            return PicError::invalid("ZeroLengthCavity gap and wgt_beam_length must be non-negative");
        }
        let total = self.total_length();
        let beam_y = self.gap + 2. * wgt.wg_width;
        let mut layout = Layout::default();

        let mut bus = StackPath::new(&wgt, Point::origin(), 0.);
        bus.segment(total);
        bus.draw(&mut layout);

        let mut beam = PathBuilder::new(wgt.wg_width, Point::new(0., beam_y), 0.);
        beam.segment(total, None);
        let holes: Vec<_> = self
            .holes()
            .into_iter()
            .map(|(x, r)| round(Point::new(x, beam_y), r, 0., 0., TAU, wgt.num_points_arc(TAU, r)))
            .collect();
        let perforated = boolean(beam.polygons(), &holes, BooleanOp::Xor);
        layout.add_polygons(wgt.wg_layer, perforated);
        let mut clad = StackPath::cladding(&wgt, Point::new(0., beam_y), 0.);
        clad.segment(total);
        clad.draw(&mut layout);

        let ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((total, 0.), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LayerSpec;
    use crate::geom::ShapeTrait;
    use approx::assert_abs_diff_eq;

    fn wgt() -> WaveguideTemplate {
        WaveguideTemplate {
            wg_width: 0.5,
            clad_width: 3.,
            ..Default::default()
        }
    }
    fn covered(layout: &Layout, pt: Point) -> bool {
        layout
            .elems
            .iter()
            .filter(|e| e.layer == LayerSpec::new(1, 0))
            .any(|e| e.inner.contains(&pt))
    }

    #[test]
    fn fill_factor_mirror() -> PicResult<()> {
        let zlc = ZeroLengthCavity::new(wgt(), 10, 0.3, 0.09, 0.2, 5.);
        assert_abs_diff_eq!(zlc.taper_length(), 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(zlc.total_length(), 15.4, epsilon = 1e-9);
        let built = zlc.build(&mut Library::default())?;
        let output = built.ports.get("output")?;
        assert_abs_diff_eq!(output.port.x, 15.4, epsilon = 1e-9);
        assert_eq!(output.direction, Direction::EAST);

        // Bus, and the nanobeam between holes
        let y = 1.2 + 0.01;
        assert!(covered(&built.layout, Point::new(7., 0.)));
        assert!(covered(&built.layout, Point::new(6.5, y)));
        // First mirror hole
        assert!(!covered(&built.layout, Point::new(6.35 + 0.08, y)));
        // Outermost taper hole, of half the mirror's radius
        assert!(!covered(&built.layout, Point::new(5.15 + 0.03, y)));
        assert!(covered(&built.layout, Point::new(5.15 + 0.06, y)));
        // And its mirror image at the far end
        assert!(!covered(&built.layout, Point::new(15.4 - 5.15 - 0.03, y)));
        // Plain nanobeam beyond the taper
        assert!(covered(&built.layout, Point::new(2., y)));
        Ok(())
    }
    #[test]
    fn ratio_mirror() -> PicResult<()> {
        let zlc = ZeroLengthCavity {
            taper_type: CavityTaper::Ratio,
            ..ZeroLengthCavity::new(wgt(), 10, 0.3, 0.09, 0.2, 5.)
        };
        assert_abs_diff_eq!(zlc.taper_length(), 0.825, epsilon = 1e-9);
        assert_abs_diff_eq!(zlc.total_length(), 14.65, epsilon = 1e-9);
        let holes = zlc.holes();
        assert_eq!(holes.len(), 18);
        // The outermost taper holes sit at the ends of the plain nanobeam
        assert!(holes.iter().any(|(x, r)| (*x - 5.).abs() < 1e-9 && (*r - 0.045).abs() < 1e-9));
        assert!(holes.iter().any(|(x, _)| (*x - 9.65).abs() < 1e-9));

        let broken = ZeroLengthCavity { period: 0., ..zlc };
        assert!(broken.build(&mut Library::default()).is_err());
        Ok(())
    }
}
