//!
//! # Alignment Marks
//!

// Std-Lib
use std::f64::consts::TAU;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::component::{Built, Component};
use crate::data::{LayerSpec, Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Rect};
use crate::path::round;
use crate::port::{Port, Portlist};
use crate::toolkit::num_points_arc;

/// Grid resolution of target rings
const TARGET_GRID: f64 = 0.01;

/// # Alignment Cross
///
/// Four arms of `cross_width` reaching `cross_length` from the center,
/// which is marked by a smaller cross of `small_cross_width`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AlignmentCross {
    pub cross_length: f64,
    pub cross_width: f64,
    /// Defaults to a quarter of `cross_width`
    pub small_cross_width: Option<f64>,
    pub layer: LayerSpec,
}
impl Default for AlignmentCross {
    fn default() -> Self {
        Self {
            cross_length: 0.,
            cross_width: 0.,
            small_cross_width: None,
            layer: LayerSpec::new(1, 0),
        }
    }
}
impl AlignmentCross {
    pub fn new(cross_length: f64, cross_width: f64) -> Self {
        Self {
            cross_length,
            cross_width,
            ..Default::default()
        }
    }
}
impl Component for AlignmentCross {
    fn kind(&self) -> &'static str {
        "alignment_cross"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        let (l, w) = (self.cross_length, self.cross_width / 2.);
        if !(w > 0.) || l <= w {
            return PicError::invalid(format!(
                "AlignmentCross requires 0 < cross_width / 2 < cross_length, got {} and {}",
                self.cross_width, self.cross_length
            ));
        }
        let s = self.small_cross_width.unwrap_or(self.cross_width / 4.) / 2.;
        let mut layout = Layout::default();
        let rects = [
            ((-l, -w), (-w, w)),
            ((w, -w), (l, w)),
            ((-w, -l), (w, -w)),
            ((-w, w), (w, l)),
            ((-w, -s), (w, s)),
            ((-s, -w), (s, w)),
        ];
        for (p0, p1) in rects {
            layout.add(self.layer, Rect::new(p0.into(), p1.into()));
        }
        let ports = Portlist::new().with("center", Port::new(Point::origin(), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

/// # Alignment Target
///
/// `num_rings` concentric rings of `ring_width`, evenly spaced out to half the `diameter`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AlignmentTarget {
    pub diameter: f64,
    pub ring_width: f64,
    pub num_rings: usize,
    pub layer: LayerSpec,
}
impl Default for AlignmentTarget {
    fn default() -> Self {
        Self {
            diameter: 0.,
            ring_width: 0.,
            num_rings: 10,
            layer: LayerSpec::new(1, 0),
        }
    }
}
impl AlignmentTarget {
    pub fn new(diameter: f64, ring_width: f64) -> Self {
        Self {
            diameter,
            ring_width,
            ..Default::default()
        }
    }
}
impl Component for AlignmentTarget {
    fn kind(&self) -> &'static str {
        "alignment_target"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        if !(self.diameter > 0.) || !(self.ring_width > 0.) || self.num_rings == 0 {
            return PicError::invalid(format!(
                "AlignmentTarget requires positive diameter, ring_width and num_rings, got {}, {}, {}",
                self.diameter, self.ring_width, self.num_rings
            ));
        }
        let spacing = self.diameter / (4. * self.num_rings as f64);
        let mut layout = Layout::default();
        for i in 0..self.num_rings {
            let outer = 2. * (i + 1) as f64 * spacing;
            let npts = num_points_arc(TAU, outer, TARGET_GRID);
            layout.add(
                self.layer,
                round(Point::origin(), outer, outer - self.ring_width, 0., TAU, npts),
            );
        }
        let ports = Portlist::new().with("center", Port::new(Point::origin(), Direction::EAST));
        Ok(Built { layout, ports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::ShapeTrait;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cross() -> PicResult<()> {
        let built = AlignmentCross::new(500., 1.).build(&mut Library::default())?;
        assert_eq!(built.layout.elems.len(), 6);
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p0.x, -500.);
        assert_abs_diff_eq!(bbox.p1.y, 500.);
        // Small cross bar
        assert_abs_diff_eq!(built.layout.elems[4].inner.area(), 0.25, epsilon = 1e-12);
        Ok(())
    }
    #[test]
    fn target() -> PicResult<()> {
        let built = AlignmentTarget::new(200., 3.).build(&mut Library::default())?;
        assert_eq!(built.layout.elems.len(), 10);
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p1.x, 100., epsilon = 1e-6);
        assert_eq!(built.ports.get("center")?.port, Point::origin());
        Ok(())
    }
}
