//!
//! # Grating Couplers
//!
//! Out-of-plane couplers, each with a single `output` port at the origin facing WEST,
//! from which the grating extends EAST.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::component::{Built, Component};
use crate::data::{LayerSpec, Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Polygon, Rect, Transform, TransformTrait};
use crate::path::{round, PathBuilder};
use crate::port::{Port, Portlist};
use crate::template::WaveguideTemplate;

fn output_port() -> Portlist {
    Portlist::new().with("output", Port::new(Point::origin(), Direction::WEST))
}

fn check_dutycycle(dutycycle: f64, period: f64) -> PicResult<()> {
    if !(0. ..=1.).contains(&dutycycle) || !(period > 0.) {
        return PicError::invalid(format!(
            "Grating dutycycle must lie within [0, 1] and period must be positive; got {} and {}",
            dutycycle, period
        ));
    }
    Ok(())
}

/// # Focusing Sector Grating Coupler
///
/// A circular-sector taper of opening angle `theta` (radians),
/// followed by concentric annular teeth.
/// Uniform teeth of `period` and `dutycycle` fill out to `length`,
/// unless `teeth_list` specifies each tooth's `(gap, width)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct GratingCoupler {
    pub wgt: WaveguideTemplate,
    pub theta: f64,
    pub length: f64,
    pub taper_length: f64,
    pub period: f64,
    pub dutycycle: f64,
    /// Add a sector of partial-etch ridge on `ridge_layer`
    pub ridge: bool,
    pub ridge_layer: LayerSpec,
    pub teeth_list: Option<Vec<(f64, f64)>>,
}
impl Default for GratingCoupler {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            theta: PI / 4.,
            length: 30.,
            taper_length: 10.,
            period: 1.,
            dutycycle: 0.7,
            ridge: false,
            ridge_layer: LayerSpec::new(3, 0),
            teeth_list: None,
        }
    }
}
impl GratingCoupler {
    /// Radial extent of the grating, including the taper
    pub fn grating_length(&self) -> f64 {
        match &self.teeth_list {
            Some(teeth) => self.taper_length + teeth.iter().map(|(g, w)| g + w).sum::<f64>(),
            None => self.length,
        }
    }
    /// Inner and outer radius of each tooth
    fn teeth(&self) -> Vec<(f64, f64)> {
        match &self.teeth_list {
            Some(teeth) => {
                let mut pos = self.taper_length;
                teeth
                    .iter()
                    .map(|(gap, width)| {
                        let inner = pos + gap;
                        pos = inner + width;
                        (inner, pos)
                    })
                    .collect()
            }
            None => {
                let num = ((self.length - self.taper_length) / self.period).floor().max(0.) as usize;
                let gap = self.period * (1. - self.dutycycle);
                (0..num)
                    .map(|i| {
                        let i = i as f64;
                        (
                            self.taper_length + i * self.period + gap,
                            self.taper_length + (i + 1.) * self.period,
                        )
                    })
                    .collect()
            }
        }
    }
}
impl Component for GratingCoupler {
    fn kind(&self) -> &'static str {
        "grating_coupler"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_dutycycle(self.dutycycle, self.period)?;
        if !(self.theta > 0. && self.theta < PI) || !(self.taper_length > 0.) {
            return PicError::invalid(format!(
                "GratingCoupler requires theta within (0, pi) and a positive taper_length; got {} and {}",
                self.theta, self.taper_length
            ));
        }
        let half = self.theta / 2.;
        let length = self.grating_length();
        let mut layout = Layout::default();

        let npts = wgt.num_points_arc(self.theta, self.taper_length) + 1;
        layout.add(
            wgt.wg_layer,
            round(Point::origin(), self.taper_length, 0., -half, half, npts),
        );
        if self.ridge {
            layout.add(
                self.ridge_layer,
                round(Point::origin(), length, 0., -half, half, npts),
            );
        }
        // Stub to the full waveguide width
        let stub = wgt.wg_width / 2. / half.tan() + 0.1;
        layout.add(
            wgt.wg_layer,
            Rect::new(
                Point::new(0., -wgt.wg_width / 2.),
                Point::new(stub, wgt.wg_width / 2.),
            ),
        );
        for (inner, outer) in self.teeth() {
            let npts = 2 * wgt.num_points_arc(self.theta, outer);
            layout.add(
                wgt.wg_layer,
                round(Point::origin(), outer, inner, -half, half, npts),
            );
        }
        for (w, layer) in wgt.stack().iter().skip(1) {
            let c = (w - wgt.wg_width) / 2.;
            let mut clad = PathBuilder::new(*w, Point::origin(), 0.);
            clad.segment(length, Some(2. * half.sin() * length + 2. * c))
                .segment(c, None);
            layout.add_polygons(*layer, clad.into_polygons());
        }
        Ok(Built {
            layout,
            ports: output_port(),
        })
    }
}

/// # Straight Grating Coupler
///
/// A linear taper out to `width`, followed by rectangular teeth.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct GratingCouplerStraight {
    pub wgt: WaveguideTemplate,
    pub width: f64,
    pub length: f64,
    pub taper_length: f64,
    pub period: f64,
    pub dutycycle: f64,
}
impl Default for GratingCouplerStraight {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            width: 20.,
            length: 50.,
            taper_length: 20.,
            period: 1.,
            dutycycle: 0.5,
        }
    }
}
impl Component for GratingCouplerStraight {
    fn kind(&self) -> &'static str {
        "grating_coupler_straight"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_dutycycle(self.dutycycle, self.period)?;
        let mut layout = Layout::default();

        let mut taper = PathBuilder::new(wgt.wg_width, Point::origin(), 0.);
        taper.segment(self.taper_length, Some(self.width));
        layout.add_polygons(wgt.wg_layer, taper.into_polygons());

        let num_teeth = (self.length / self.period).floor().max(0.) as usize;
        let gap = self.period * (1. - self.dutycycle);
        for k in 0..num_teeth {
            let x0 = self.taper_length + gap + k as f64 * self.period;
            layout.add(
                wgt.wg_layer,
                Rect::new(
                    Point::new(x0, -self.width / 2.),
                    Point::new(x0 + self.period * self.dutycycle, self.width / 2.),
                ),
            );
        }
        for (w, layer) in wgt.stack().iter().skip(1) {
            let mut clad = PathBuilder::new(*w, Point::origin(), 0.);
            clad.segment(self.taper_length, Some(self.width + w - wgt.wg_width))
                .segment(self.length, None);
            layout.add_polygons(*layer, clad.into_polygons());
        }
        Ok(Built {
            layout,
            ports: output_port(),
        })
    }
}

/// # Focusing Elliptical Grating Coupler
///
/// Teeth follow confocal ellipses, phase-matched for light of `wavelength`
/// leaving at `asin(sin_theta)` from vertical, and focusing onto the waveguide at the origin.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct GratingCouplerFocusing {
    pub wgt: WaveguideTemplate,
    pub focus_distance: f64,
    pub width: f64,
    pub length: f64,
    pub period: f64,
    pub dutycycle: f64,
    pub wavelength: f64,
    pub sin_theta: f64,
    /// Samples along each tooth
    pub evaluations: usize,
}
impl Default for GratingCouplerFocusing {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            focus_distance: 20.,
            width: 20.,
            length: 50.,
            period: 1.,
            dutycycle: 0.5,
            wavelength: 1.55,
            sin_theta: (8f64).to_radians().sin(),
            evaluations: 99,
        }
    }
}
impl Component for GratingCouplerFocusing {
    fn kind(&self) -> &'static str {
        "grating_coupler_focusing"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_dutycycle(self.dutycycle, self.period)?;
        if self.focus_distance < self.width / 2. - self.period {
            return PicError::invalid(format!(
                "focus_distance ({}) is below the minimum of width/2 - period ({})",
                self.focus_distance,
                self.width / 2. - self.period
            ));
        }
        let num_teeth = (self.length / self.period).floor().max(0.) as usize;
        let neff = self.wavelength / self.period + self.sin_theta;
        let qmin = (self.focus_distance / self.period + 0.5) as usize;
        let c3 = neff * neff - self.sin_theta * self.sin_theta;
        let w = self.width / 2.;

        // Drawn heading +y, then rotated to extend East
        let mut polygons: Vec<Polygon> = Vec::new();
        for q in qmin..qmin + num_teeth {
            let c1 = q as f64 * self.wavelength * self.sin_theta;
            let c2 = (q as f64 * self.wavelength).powi(2);
            let f = |t: f64| {
                let x = self.width * t - w;
                Point::new(x, (c1 + neff * (c2 - c3 * x * x).max(0.).sqrt()) / c3)
            };
            let mut tooth = PathBuilder::new(self.period * self.dutycycle, Point::origin(), 0.);
            tooth.parametric(f, None, self.evaluations);
            polygons.extend(tooth.into_polygons());
        }
        // Widen the first tooth into a fan reaching back to the waveguide
        if let Some(first) = polygons.first_mut() {
            let outer = first.points.len() / 2;
            first.points.truncate(outer);
            first.points.push(Point::new(wgt.wg_width / 2., 0.));
            first.points.push(Point::new(-wgt.wg_width / 2., 0.));
        }
        let mut clads = Vec::new();
        for (cw, layer) in wgt.stack().iter().skip(1) {
            let c = cw - wgt.wg_width;
            let mut clad = PathBuilder::new(*cw, Point::origin(), FRAC_PI_2);
            clad.segment(self.focus_distance, Some(self.width + c))
                .segment(self.length, None);
            clads.push((*layer, clad.into_polygons()));
        }

        let rotate = Transform::rotate_rad(-FRAC_PI_2);
        let mut layout = Layout::default();
        layout.add_polygons(
            wgt.wg_layer,
            polygons.iter().map(|p| p.transform(&rotate)),
        );
        for (layer, polys) in clads {
            layout.add_polygons(layer, polys.iter().map(|p| p.transform(&rotate)));
        }
        Ok(Built {
            layout,
            ports: output_port(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundBoxTrait;
    use approx::assert_abs_diff_eq;

    fn count(layout: &Layout, layer: LayerSpec) -> usize {
        layout.elems.iter().filter(|e| e.layer == layer).count()
    }
    #[test]
    fn sector_grating() -> PicResult<()> {
        let gc = GratingCoupler::default();
        let built = gc.build(&mut Library::default())?;
        // Taper, stub and twenty teeth
        assert_eq!(count(&built.layout, LayerSpec::new(1, 0)), 22);
        assert_eq!(count(&built.layout, LayerSpec::new(2, 0)), 2);
        assert_eq!(built.ports.get("output")?.direction, Direction::WEST);

        let custom = GratingCoupler {
            teeth_list: Some(vec![(0.5, 0.5), (0.4, 0.6), (0.3, 0.7)]),
            ridge: true,
            ..Default::default()
        };
        assert_abs_diff_eq!(custom.grating_length(), 13., epsilon = 1e-12);
        let (inner, outer) = custom.teeth()[1];
        assert_abs_diff_eq!(inner, 11.4, epsilon = 1e-12);
        assert_abs_diff_eq!(outer, 12.0, epsilon = 1e-12);
        let built = custom.build(&mut Library::default())?;
        assert_eq!(count(&built.layout, LayerSpec::new(3, 0)), 1);

        let bad = GratingCoupler {
            dutycycle: 1.5,
            ..Default::default()
        };
        assert!(bad.build(&mut Library::default()).is_err());
        Ok(())
    }
    #[test]
    fn straight_grating() -> PicResult<()> {
        let gc = GratingCouplerStraight::default();
        let built = gc.build(&mut Library::default())?;
        assert_eq!(count(&built.layout, LayerSpec::new(1, 0)), 51);
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p1.x, 70., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.y, 20., epsilon = 1e-9);
        Ok(())
    }
    #[test]
    fn focusing_grating() -> PicResult<()> {
        let gc = GratingCouplerFocusing::default();
        let built = gc.build(&mut Library::default())?;
        assert_eq!(count(&built.layout, LayerSpec::new(1, 0)), 50);
        // Rotated to extend East of the port
        let bbox = built.layout.bbox()?;
        assert!(bbox.p0.x > -1e-9);
        assert_abs_diff_eq!(bbox.p1.x, 70., epsilon = 1e-6);
        let fan = &built.layout.elems[0].inner.bbox();
        assert_abs_diff_eq!(fan.p0.x, 0., epsilon = 1e-9);

        let bad = GratingCouplerFocusing {
            focus_distance: 1.,
            ..Default::default()
        };
        assert!(matches!(
            bad.build(&mut Library::default()),
            Err(PicError::Validation(_))
        ));
        Ok(())
    }
}
