//!
//! # Material Stacks
//!
//! Map mask layers to vertical stacks of dielectric slabs.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::data::LayerSpec;
use crate::error::{PicError, PicResult};
use crate::utils::SerdeFile;

/// Tolerance between the sum of a stack's thicknesses and the total vertical size
const THICKNESS_TOL: f64 = 1e-6;
/// Height of the first sample in [MaterialStack::interpolate_points], just above the bottom
const SAMPLE_START: f64 = 1e-8;

/// # Vertical Stack
///
/// `(permittivity, thickness)` slabs, listed from bottom to top.
pub type VStack = Vec<(f64, f64)>;

/// The [VStack] drawn wherever a [LayerSpec] appears in the mask
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LayerStack {
    pub layer: LayerSpec,
    pub stack: VStack,
}

/// # Material Stack
///
/// Every [VStack] spans the same total vertical size `vsize`.
/// The stack of [LayerSpec::BACKGROUND] fills everywhere not otherwise covered.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MaterialStack {
    #[serde(default = "default_name")]
    pub name: String,
    pub vsize: f64,
    pub layers: Vec<LayerStack>,
}
fn default_name() -> String {
    "mstack".into()
}
impl MaterialStack {
    /// Create a new [MaterialStack] with `default_stack` as its background
    pub fn new(vsize: f64, default_stack: VStack) -> PicResult<Self> {
        let mut me = Self {
            name: default_name(),
            vsize,
            layers: Vec::new(),
        };
        me.add_vstack(LayerSpec::BACKGROUND, default_stack)?;
        Ok(me)
    }
    /// Add (or replace) the stack drawn for `layer`.
    /// Fails if its thicknesses do not sum to `vsize`.
    pub fn add_vstack(&mut self, layer: impl Into<LayerSpec>, stack: VStack) -> PicResult<()> {
        let layer = layer.into();
        self.check(layer, &stack)?;
        match self.layers.iter_mut().find(|l| l.layer == layer) {
            Some(existing) => existing.stack = stack,
            None => self.layers.push(LayerStack { layer, stack }),
        }
        Ok(())
    }
    fn check(&self, layer: LayerSpec, stack: &VStack) -> PicResult<()> {
        let total: f64 = stack.iter().map(|(_, t)| t).sum();
        if (total - self.vsize).abs() >= THICKNESS_TOL {
            return PicError::invalid(format!(
                "Stack thicknesses for layer {} ({}) do not add up to vsize ({})",
                layer, total, self.vsize
            ));
        }
        if stack.iter().any(|(_, t)| *t < 0.) {
            return PicError::invalid(format!("Negative thickness in the stack for layer {}", layer));
        }
        Ok(())
    }
    /// Check every stack, e.g. after loading from markup
    pub fn validate(&self) -> PicResult<()> {
        if self.get(LayerSpec::BACKGROUND).is_none() {
            return PicError::invalid(format!(
                "MaterialStack `{}` has no background stack on {}",
                self.name,
                LayerSpec::BACKGROUND
            ));
        }
        for l in self.layers.iter() {
            self.check(l.layer, &l.stack)?;
        }
        Ok(())
    }
    /// Get the stack of `layer`, if defined
    pub fn get(&self, layer: impl Into<LayerSpec>) -> Option<&VStack> {
        let layer = layer.into();
        self.layers.iter().find(|l| l.layer == layer).map(|l| &l.stack)
    }
    fn get_or_fail(&self, layer: LayerSpec) -> PicResult<&VStack> {
        match self.get(layer) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => PicError::invalid(format!("No material stack for layer {}", layer)),
        }
    }
    /// Permittivity at `height`, measured from the stack's vertical center.
    /// Heights above the top return the uppermost slab.
    pub fn get_eps(&self, layer: impl Into<LayerSpec>, height: f64) -> PicResult<f64> {
        let stack = self.get_or_fail(layer.into())?;
        let mut vmax = -self.vsize / 2.;
        for (eps, t) in stack.iter() {
            vmax += t;
            if height <= vmax {
                return Ok(*eps);
            }
        }
        Ok(stack[stack.len() - 1].0)
    }
    /// Permittivity at `num_points` evenly spaced heights, from just above the bottom through `vsize`
    pub fn interpolate_points(&self, layer: impl Into<LayerSpec>, num_points: usize) -> PicResult<Vec<f64>> {
        let stack = self.get_or_fail(layer.into())?;
        let step = match num_points {
            0 | 1 => 0.,
            n => (self.vsize - SAMPLE_START) / (n - 1) as f64,
        };
        let mut points = Vec::with_capacity(num_points);
        for k in 0..num_points {
            let z = SAMPLE_START + step * k as f64;
            let mut top = 0.;
            let mut eps = stack[stack.len() - 1].0;
            for (e, t) in stack.iter() {
                top += t;
                if z <= top {
                    eps = *e;
                    break;
                }
            }
            points.push(eps);
        }
        Ok(points)
    }
    /// Vertical centers of each slab of `stack`, relative to the stack's center
    pub(crate) fn centers(stack: &VStack) -> Vec<f64> {
        let total: f64 = stack.iter().map(|(_, t)| t).sum();
        let mut bottom = -total / 2.;
        stack
            .iter()
            .map(|(_, t)| {
                let c = bottom + t / 2.;
                bottom += t;
                c
            })
            .collect()
    }
}
impl SerdeFile for MaterialStack {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SerializationFormat;
    use approx::assert_abs_diff_eq;

    fn soi() -> PicResult<MaterialStack> {
        let mut mstack = MaterialStack::new(1.5, vec![(2.1, 0.5), (2.1, 0.5), (2.1, 0.5)])?;
        mstack.add_vstack((1, 0), vec![(2.1, 0.5), (12.1, 0.22), (2.1, 0.78)])?;
        Ok(mstack)
    }

    #[test]
    fn thickness_check() -> PicResult<()> {
        let mut mstack = soi()?;
        assert!(mstack.add_vstack((2, 0), vec![(1.0, 1.0)]).is_err());
        assert!(MaterialStack::new(1.0, vec![(1.0, 0.5)]).is_err());
        // Replaces the existing entry
        mstack.add_vstack((1, 0), vec![(4.0, 1.5)])?;
        assert_eq!(mstack.layers.len(), 2);
        assert_eq!(mstack.get((1, 0)), Some(&vec![(4.0, 1.5)]));
        Ok(())
    }
    #[test]
    fn eps_lookup() -> PicResult<()> {
        let mstack = soi()?;
        assert_abs_diff_eq!(mstack.get_eps((1, 0), -0.5)?, 2.1);
        assert_abs_diff_eq!(mstack.get_eps((1, 0), -0.2)?, 12.1);
        assert_abs_diff_eq!(mstack.get_eps((1, 0), 0.5)?, 2.1);
        assert_abs_diff_eq!(mstack.get_eps((1, 0), 10.)?, 2.1);
        assert!(mstack.get_eps((7, 0), 0.).is_err());
        Ok(())
    }
    #[test]
    fn interpolation() -> PicResult<()> {
        let mstack = soi()?;
        let pts = mstack.interpolate_points((1, 0), 16)?;
        assert_eq!(pts.len(), 16);
        // Samples every 0.1: five below the core, three within it
        assert_eq!(pts.iter().filter(|e| **e > 10.).count(), 3);
        assert_abs_diff_eq!(pts[0], 2.1);
        assert_abs_diff_eq!(pts[15], 2.1);
        Ok(())
    }
    #[test]
    fn centers() {
        let centers = MaterialStack::centers(&vec![(1., 1.), (1., 2.)]);
        assert_abs_diff_eq!(centers[0], -1.);
        assert_abs_diff_eq!(centers[1], 0.5);
    }
    #[test]
    fn load_markup() -> PicResult<()> {
        let mstack: MaterialStack = SerializationFormat::Yaml.from_str(
            "
            vsize: 2.0
            layers:
              - layer: [-1, -1]
                stack: [[1.0, 1.0], [2.0, 1.0]]
              - layer: [1, 0]
                stack: [[1.0, 2.0]]
            ",
        )?;
        mstack.validate()?;
        assert_eq!(mstack.name, "mstack");
        assert_abs_diff_eq!(mstack.get_eps(LayerSpec::BACKGROUND, 0.5)?, 2.0);
        Ok(())
    }
}
