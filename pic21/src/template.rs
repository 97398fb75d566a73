//!
//! # Waveguide and Metal Templates
//!
//! Templates carry the cross-section and fabrication settings shared by many components:
//! widths, layers, bend radius, resist tone and fabrication type.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::data::LayerSpec;
use crate::error::{PicError, PicResult};
use crate::toolkit;
use crate::utils::{enumstr, SerdeFile};

enumstr!(
    /// # Waveguide Cross-Section Types
    #[derive(JsonSchema)]
    WgType {
        Strip: "strip",
        Slot: "slot",
        Swg: "swg",
    }
);
enumstr!(
    /// # Photoresist Tone
    #[derive(JsonSchema)]
    Resist {
        Positive: "+",
        Negative: "-",
    }
);
impl Resist {
    /// The opposite tone
    pub fn flip(&self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}
enumstr!(
    /// # Fabrication Type
    /// Anything other than etching, i.e. lift-off, inverts the effective resist tone.
    #[derive(JsonSchema)]
    Fab {
        Etch: "ETCH",
        Liftoff: "LIFTOFF",
    }
);

/// Fresnel-integral parameter at which the Euler curve's radius of curvature is minimal,
/// for a unit scale factor
const EULER_MIN_RADIUS: f64 = 0.45015815807855303;
/// Radius of the circular 90-degree bend with the same end-points as a unit-scale Euler bend
const EULER_EFFECTIVE_RADIUS: f64 = 0.8418389017566366;

/// # Waveguide Template
///
/// Optical waveguide cross-section and fabrication settings.
///
/// The `waveguide_stack`, if provided, overrides `wg_width`, `clad_width`, `wg_layer` and `clad_layer`.
/// Each of its entries is a `(width, layer)` pair, drawn as a path along every waveguide.
/// The first is the waveguide core, the second its cladding.
///
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct WaveguideTemplate {
    pub wg_type: WgType,
    pub bend_radius: f64,
    pub waveguide_stack: Option<Vec<(f64, LayerSpec)>>,
    pub wg_width: f64,
    /// Cladding width, on each side of the waveguide
    pub clad_width: f64,
    /// Mask grid resolution, sets the number of points per curve
    pub grid: f64,
    pub resist: Resist,
    pub fab: Fab,
    /// Slot width, for slot waveguides
    pub slot: f64,
    /// Grating period, for sub-wavelength gratings
    pub period: f64,
    /// Grating duty cycle, for sub-wavelength gratings
    pub duty_cycle: f64,
    pub wg_layer: LayerSpec,
    pub clad_layer: LayerSpec,
    /// Route with Euler bends, whose minimum radius is `bend_radius`
    pub euler_bend: bool,
}
impl Default for WaveguideTemplate {
    fn default() -> Self {
        Self {
            wg_type: WgType::Strip,
            bend_radius: 50.0,
            waveguide_stack: None,
            wg_width: 2.0,
            clad_width: 10.0,
            grid: 0.001,
            resist: Resist::Positive,
            fab: Fab::Etch,
            slot: 0.1,
            period: 0.1,
            duty_cycle: 0.5,
            wg_layer: LayerSpec::new(1, 0),
            clad_layer: LayerSpec::new(2, 0),
            euler_bend: false,
        }
    }
}
impl WaveguideTemplate {
    /// Validate, and produce a copy whose scalar fields agree with its (explicit) waveguide stack.
    pub fn resolve(&self) -> PicResult<Self> {
        let mut wgt = self.clone();
        match &self.waveguide_stack {
            Some(stack) => {
                if stack.len() < 2 {
                    return PicError::invalid(format!(
                        "waveguide_stack must have at least two entries, got {}",
                        stack.len()
                    ));
                }
                wgt.wg_width = stack[0].0;
                wgt.wg_layer = stack[0].1;
                wgt.clad_width = (stack[1].0 - stack[0].0) / 2.0;
                wgt.clad_layer = stack[1].1;
            }
            None => wgt.waveguide_stack = Some(self.stack()),
        }
        if wgt.wg_width <= 0.0 {
            return PicError::invalid(format!("wg_width must be positive, got {}", wgt.wg_width));
        }
        if wgt.grid <= 0.0 {
            return PicError::invalid(format!("grid must be positive, got {}", wgt.grid));
        }
        if wgt.bend_radius <= 0.0 {
            return PicError::invalid(format!(
                "bend_radius must be positive, got {}",
                wgt.bend_radius
            ));
        }
        if wgt.stack().iter().any(|(w, _)| *w < 0.0) {
            return PicError::invalid("waveguide_stack widths must be non-negative");
        }
        match wgt.wg_type {
            WgType::Slot if wgt.slot <= 0.0 || wgt.slot >= wgt.wg_width => {
                return PicError::invalid(format!(
                    "slot ({}) must lie within (0, wg_width = {})",
                    wgt.slot, wgt.wg_width
                ));
            }
            WgType::Swg if wgt.period <= 0.0 || !(0.0..=1.0).contains(&wgt.duty_cycle) => {
                return PicError::invalid(format!(
                    "SWG period ({}) must be positive and duty_cycle ({}) within [0, 1]",
                    wgt.period, wgt.duty_cycle
                ));
            }
            _ => (),
        }
        Ok(wgt)
    }
    /// The waveguide stack: explicit if provided, else core and cladding from the scalar fields
    pub fn stack(&self) -> Vec<(f64, LayerSpec)> {
        match &self.waveguide_stack {
            Some(s) => s.clone(),
            None => vec![
                (self.wg_width, self.wg_layer),
                (2.0 * self.clad_width + self.wg_width, self.clad_layer),
            ],
        }
    }
    /// Resist tone, inverted for non-etch fabrication
    pub fn effective_resist(&self) -> Resist {
        match self.fab {
            Fab::Etch => self.resist,
            Fab::Liftoff => self.resist.flip(),
        }
    }
    /// Width of each slot-waveguide rail
    pub fn rail(&self) -> f64 {
        (self.wg_width - self.slot) / 2.0
    }
    /// Center-to-center distance between slot-waveguide rails
    pub fn rail_dist(&self) -> f64 {
        self.wg_width - self.rail()
    }
    /// Euler-curve scale factor, such that its minimum radius equals `bend_radius`
    pub fn euler_scale(&self) -> f64 {
        self.bend_radius / EULER_MIN_RADIUS
    }
    /// Arc length of a 90-degree Euler bend
    pub fn bend_length_90(&self) -> f64 {
        2.0 * std::f64::consts::FRAC_1_SQRT_2 * self.euler_scale()
    }
    /// Radius of the circular bend sharing a 90-degree Euler bend's end-points
    pub fn effective_bend_radius(&self) -> f64 {
        EULER_EFFECTIVE_RADIUS * self.euler_scale()
    }
    /// Number of points for a bend of `angle` radians at `bend_radius`, counting both path sides
    pub fn num_points_bend(&self, angle: f64) -> usize {
        toolkit::num_points_bend(angle, self.bend_radius, self.grid)
    }
    /// Number of points for an arc of `angle` radians at `radius`
    pub fn num_points_arc(&self, angle: f64, radius: f64) -> usize {
        toolkit::num_points_arc(angle, radius, self.grid)
    }
}

impl SerdeFile for WaveguideTemplate {}

/// # Metal Template
///
/// Electrical routing settings: trace width, cladding, bend radius and layers.
/// A zero `bend_radius` produces sharp corners.
///
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MetalTemplate {
    pub bend_radius: f64,
    pub width: f64,
    pub clad_width: f64,
    pub resist: Resist,
    pub fab: Fab,
    pub metal_layer: LayerSpec,
    pub clad_layer: LayerSpec,
}
impl Default for MetalTemplate {
    fn default() -> Self {
        Self {
            bend_radius: 0.0,
            width: 20.0,
            clad_width: 20.0,
            resist: Resist::Positive,
            fab: Fab::Etch,
            metal_layer: LayerSpec::new(11, 0),
            clad_layer: LayerSpec::new(12, 0),
        }
    }
}
impl MetalTemplate {
    /// Resist tone, inverted for non-etch fabrication
    pub fn effective_resist(&self) -> Resist {
        match self.fab {
            Fab::Etch => self.resist,
            Fab::Liftoff => self.resist.flip(),
        }
    }
    /// Check for positive widths and a non-negative bend radius
    pub fn validate(&self) -> PicResult<()> {
        if self.width <= 0.0 || self.clad_width < 0.0 || self.bend_radius < 0.0 {
            return PicError::invalid(format!(
                "MetalTemplate requires width > 0, clad_width >= 0, bend_radius >= 0; got {}, {}, {}",
                self.width, self.clad_width, self.bend_radius
            ));
        }
        Ok(())
    }
}
impl SerdeFile for MetalTemplate {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SerializationFormat;
    use approx::assert_abs_diff_eq;

    #[test]
    fn defaults_and_derived() -> PicResult<()> {
        let wgt = WaveguideTemplate::default().resolve()?;
        assert_eq!(
            wgt.stack(),
            vec![(2.0, LayerSpec::new(1, 0)), (22.0, LayerSpec::new(2, 0))]
        );
        let slot = WaveguideTemplate {
            wg_type: WgType::Slot,
            wg_width: 0.7,
            slot: 0.1,
            ..Default::default()
        };
        assert_abs_diff_eq!(slot.rail(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(slot.rail_dist(), 0.4, epsilon = 1e-12);

        let euler = WaveguideTemplate {
            bend_radius: 10.0,
            euler_bend: true,
            ..Default::default()
        };
        assert_abs_diff_eq!(euler.euler_scale(), 22.2144, epsilon = 1e-4);
        assert!(euler.effective_bend_radius() > euler.bend_radius);
        Ok(())
    }
    #[test]
    fn resist_and_fab() {
        let wgt = WaveguideTemplate {
            fab: Fab::Liftoff,
            ..Default::default()
        };
        assert_eq!(wgt.effective_resist(), Resist::Negative);
        assert_eq!(MetalTemplate::default().effective_resist(), Resist::Positive);
    }
    #[test]
    fn explicit_stack() -> PicResult<()> {
        let wgt = WaveguideTemplate {
            waveguide_stack: Some(vec![
                (0.5, LayerSpec::new(1, 0)),
                (6.5, LayerSpec::new(2, 0)),
                (8.0, LayerSpec::new(4, 0)),
            ]),
            ..Default::default()
        }
        .resolve()?;
        assert_eq!(wgt.wg_width, 0.5);
        assert_eq!(wgt.clad_width, 3.0);
        assert_eq!(wgt.stack().len(), 3);

        let short = WaveguideTemplate {
            waveguide_stack: Some(vec![(0.5, LayerSpec::new(1, 0))]),
            ..Default::default()
        };
        assert!(matches!(short.resolve(), Err(PicError::Validation(_))));
        Ok(())
    }
    #[test]
    fn from_markup() -> PicResult<()> {
        let yaml = r#"
            wg_type: slot
            bend_radius: 25
            resist: "-"
            fab: LIFTOFF
            wg_layer: [3, 1]
        "#;
        let wgt: WaveguideTemplate = SerializationFormat::Yaml.from_str(yaml)?;
        assert_eq!(wgt.wg_type, WgType::Slot);
        assert_eq!(wgt.effective_resist(), Resist::Positive);
        assert_eq!(wgt.wg_layer, LayerSpec::new(3, 1));
        assert_eq!(wgt.clad_width, 10.0);
        Ok(())
    }
}
