//!
//! # Dielectric Geometry Export
//!
//! Converts cells and waveguide cross-sections into the prism and block geometries
//! read by the electromagnetic solvers. The top-down view of a device is their X-Z plane;
//! Y is the vertical direction of the [MaterialStack].
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// Local imports
use super::stack::{MaterialStack, VStack};
use crate::data::{Cell, LayerSpec};
use crate::error::{PicError, PicResult};
use crate::geom::Polygon;
use crate::mask::{boolean, merge, BooleanOp};
use crate::template::{WaveguideTemplate, WgType};
use crate::utils::{ErrorContext, ErrorHelper, Ptr, SerdeFile};

/// Boolean operation between two layers, `(a, b, op)`, with the result replacing layer `a`
pub type LayerOperation = (LayerSpec, LayerSpec, BooleanOp);

/// Default layer operations for a waveguide template:
/// background XOR cladding becomes the background, and cladding XOR core becomes the cladding.
pub fn default_operations(wgt: &WaveguideTemplate) -> Vec<LayerOperation> {
    vec![
        (LayerSpec::BACKGROUND, wgt.clad_layer, BooleanOp::Xor),
        (wgt.clad_layer, wgt.wg_layer, BooleanOp::Xor),
    ]
}

/// # Prism Geometry
///
/// One row per (stack slab, polygon, vertex).
/// Each polygon of each layer is extruded into one prism per slab of its layer's [VStack].
/// X and Z coordinates are relative to the center of the cell's bounding box.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PrismGeometry {
    #[serde(rename = "LL")]
    pub layer: Vec<i16>,
    #[serde(rename = "DD")]
    pub datatype: Vec<i16>,
    /// Polygon index, within its layer
    #[serde(rename = "NN")]
    pub polygon: Vec<usize>,
    /// Vertex index, within its polygon
    #[serde(rename = "VV")]
    pub vertex: Vec<usize>,
    #[serde(rename = "XX")]
    pub x: Vec<f64>,
    #[serde(rename = "ZZ")]
    pub z: Vec<f64>,
    pub height: Vec<f64>,
    pub eps: Vec<f64>,
    pub ycenter: Vec<f64>,
    /// Simulation-region size `(sx, sy, sz)`
    pub size: (f64, f64, f64),
    /// Bounding-box center `(x, y, z)`, in the cell's coordinates
    pub center: (f64, f64, f64),
}
impl PrismGeometry {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.x.len()
    }
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
impl SerdeFile for PrismGeometry {}

/// # Cross Section
///
/// Rectangular blocks, centered at `(CX, CY)`, forming a waveguide's cross-section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CrossSection {
    #[serde(rename = "CX")]
    pub cx: Vec<f64>,
    #[serde(rename = "CY")]
    pub cy: Vec<f64>,
    #[serde(rename = "width_list")]
    pub width: Vec<f64>,
    #[serde(rename = "height_list")]
    pub height: Vec<f64>,
    #[serde(rename = "eps_list")]
    pub eps: Vec<f64>,
}
impl CrossSection {
    /// Add a column of blocks of `width`, one per slab of `stack`, at each x-center in `cxs`
    fn add_column(&mut self, cxs: &[f64], width: f64, stack: &VStack) {
        let centers = MaterialStack::centers(stack);
        for ((eps, t), cy) in stack.iter().zip(centers) {
            for cx in cxs {
                self.cx.push(*cx);
                self.cy.push(cy);
                self.width.push(width);
                self.height.push(*t);
                self.eps.push(*eps);
            }
        }
    }
    /// Number of blocks
    pub fn len(&self) -> usize {
        self.cx.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cx.is_empty()
    }
}
impl SerdeFile for CrossSection {}

/// Export `cell` as a [PrismGeometry], applying `operations` in order.
pub fn export_component(
    cell: &Ptr<Cell>,
    mstack: &MaterialStack,
    operations: &[LayerOperation],
) -> PicResult<PrismGeometry> {
    PrismExporter::new(mstack).export(cell, operations)
}

/// Internal walker for [export_component]
struct PrismExporter<'a> {
    mstack: &'a MaterialStack,
    ctx_stack: Vec<ErrorContext>,
}
impl<'a> PrismExporter<'a> {
    fn new(mstack: &'a MaterialStack) -> Self {
        Self {
            mstack,
            ctx_stack: vec![ErrorContext::Simulation],
        }
    }
    fn export(&mut self, cell: &Ptr<Cell>, operations: &[LayerOperation]) -> PicResult<PrismGeometry> {
        let cell = cell.read()?;
        self.ctx_stack.push(ErrorContext::Cell(cell.name.clone()));
        let bbox = cell.layout.bbox()?;
        if bbox.is_empty() {
            return self.fail("Cannot export an empty cell");
        }
        let (sx, sz) = bbox.size();
        let center = bbox.center();

        // Merge each layer, plus the background covering the full bounding box
        let mut layers: BTreeMap<LayerSpec, Vec<Polygon>> = cell
            .layout
            .polygons_by_spec()?
            .into_iter()
            .map(|(spec, polys)| (spec, merge(&polys)))
            .collect();
        layers.insert(LayerSpec::BACKGROUND, vec![bbox.to_poly()]);

        for (a, b, op) in operations.iter() {
            let result = {
                let empty = Vec::new();
                let pa = layers.get(a).unwrap_or(&empty);
                let pb = layers.get(b).unwrap_or(&empty);
                boolean(pa, pb, *op)
            };
            debug!("{} {} {}: {} polygons", a, op, b, result.len());
            match result.is_empty() {
                true => layers.remove(a),
                false => layers.insert(*a, result),
            };
        }

        let mut geom = PrismGeometry {
            size: (sx, self.mstack.vsize, sz),
            center: (center.x, 0., center.y),
            ..Default::default()
        };
        for (spec, polys) in layers.iter() {
            let stack = match self.mstack.get(*spec) {
                Some(stack) => stack,
                None => continue,
            };
            self.ctx_stack.push(ErrorContext::Layer(spec.layer, spec.datatype));
            let centers = MaterialStack::centers(stack);
            for ((eps, t), ycenter) in stack.iter().zip(centers) {
                for (nn, poly) in polys.iter().enumerate() {
                    for (vv, p) in poly.points.iter().enumerate() {
                        geom.layer.push(spec.layer);
                        geom.datatype.push(spec.datatype);
                        geom.polygon.push(nn);
                        geom.vertex.push(vv);
                        geom.x.push(p.x - center.x);
                        geom.z.push(p.y - center.y);
                        geom.height.push(*t);
                        geom.eps.push(*eps);
                        geom.ycenter.push(ycenter);
                    }
                }
            }
            self.ctx_stack.pop();
        }
        info!(
            "Exported cell `{}` for simulation: {} layers, {} vertex rows",
            cell.name,
            layers.len(),
            geom.len()
        );
        self.ctx_stack.pop();
        Ok(geom)
    }
}
impl ErrorHelper for PrismExporter<'_> {
    type Error = PicError;
    fn err(&self, msg: impl Into<String>) -> PicError {
        PicError::Export {
            message: msg.into(),
            stack: self.ctx_stack.clone(),
        }
    }
}

/// Export the cross-section of waveguides drawn with `wgt`, in a simulation region `sx` wide.
///
/// Strip and slot waveguides are supported.
/// Layers of `wgt` absent from `mstack` contribute no blocks.
/// Background blocks fill any width of `sx` beyond the cladding.
pub fn export_waveguide_cross_section(
    wgt: &WaveguideTemplate,
    mstack: &MaterialStack,
    sx: f64,
) -> PicResult<CrossSection> {
    let wgt = wgt.resolve()?;
    let mut xs = CrossSection::default();
    let clad_cx = (wgt.wg_width + wgt.clad_width) / 2.;
    match wgt.wg_type {
        WgType::Strip => {
            if let Some(stack) = mstack.get(wgt.wg_layer) {
                xs.add_column(&[0.], wgt.wg_width, stack);
            }
            if let Some(stack) = mstack.get(wgt.clad_layer) {
                xs.add_column(&[clad_cx, -clad_cx], wgt.clad_width, stack);
            }
        }
        WgType::Slot => {
            if let Some(stack) = mstack.get(wgt.wg_layer) {
                let rail = wgt.rail();
                let cx = (wgt.slot + rail) / 2.;
                xs.add_column(&[cx, -cx], rail, stack);
            }
            if let Some(stack) = mstack.get(wgt.clad_layer) {
                xs.add_column(&[clad_cx, -clad_cx], wgt.clad_width, stack);
                // The slot itself is filled with cladding
                xs.add_column(&[0.], wgt.slot, stack);
            }
        }
        WgType::Swg => {
            return PicError::invalid("Cross-section export supports strip and slot waveguides only");
        }
    }
    let drawn = wgt.wg_width + 2. * wgt.clad_width;
    if drawn < sx {
        let stack = match mstack.get(LayerSpec::BACKGROUND) {
            Some(stack) => stack,
            None => return PicError::invalid("MaterialStack has no background stack"),
        };
        xs.add_column(&[sx / 2., -sx / 2.], sx - drawn, stack);
    }
    Ok(xs)
}
