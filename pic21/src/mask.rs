//!
//! # Mask Assembly
//!
//! Polygon boolean operations, and the combination of core and cladding layers
//! into the single layer exposed by the mask writer.
//!

// Crates.io
use geo::{BooleanOps, BoundingRect, LineString, MultiPolygon};
use schemars::JsonSchema;
use tracing::{info, warn};

// Local imports
use crate::data::{Cell, LayerSpec};
use crate::error::PicResult;
use crate::gds::MAX_BOUNDARY_VERTICES;
use crate::geom::{Point, Polygon};
use crate::template::{MetalTemplate, Resist, WaveguideTemplate};
use crate::utils::{enumstr, Ptr};

enumstr!(
    /// # Polygon Boolean Operations
    #[derive(JsonSchema)]
    BooleanOp {
        Or: "or",
        And: "and",
        Xor: "xor",
        Not: "not",
    }
);

/// Apply boolean `op` between polygon-sets `a` and `b`.
///
/// Each set is merged first, so overlapping polygons within a set are treated as their union.
/// Results with holes are split into hole-free polygons, and any with more than
/// [MAX_BOUNDARY_VERTICES] vertices fractured further, so each fits in a GDSII boundary.
pub fn boolean(a: &[Polygon], b: &[Polygon], op: BooleanOp) -> Vec<Polygon> {
    let (a, b) = (to_multi(a), to_multi(b));
    let result = match op {
        BooleanOp::Or => a.union(&b),
        BooleanOp::And => a.intersection(&b),
        BooleanOp::Xor => a.xor(&b),
        BooleanOp::Not => a.difference(&b),
    };
    from_multi(result)
}

/// Union of all `polygons`, as hole-free polygons within the GDSII vertex limit
pub fn merge(polygons: &[Polygon]) -> Vec<Polygon> {
    from_multi(to_multi(polygons))
}

/// Convert to a merged [MultiPolygon]
fn to_multi(polygons: &[Polygon]) -> MultiPolygon<f64> {
    polygons
        .iter()
        .filter(|p| !p.is_degenerate())
        .map(|p| {
            let ring: Vec<(f64, f64)> = p.points.iter().map(|pt| (pt.x, pt.y)).collect();
            MultiPolygon::new(vec![geo::Polygon::new(LineString::from(ring), vec![])])
        })
        .fold(MultiPolygon::new(vec![]), |acc, p| acc.union(&p))
}

/// Convert back from [MultiPolygon], splitting out any holes
fn from_multi(multi: MultiPolygon<f64>) -> Vec<Polygon> {
    let mut polygons = Vec::new();
    for poly in multi {
        split_holes(poly, &mut polygons);
    }
    polygons
}

/// Cut `poly` vertically through its first hole, recursively, until no holes remain.
fn split_holes(poly: geo::Polygon<f64>, out: &mut Vec<Polygon>) {
    let (bounds, hole) = match (poly.bounding_rect(), poly.interiors().first()) {
        (Some(bounds), Some(hole)) => match hole.bounding_rect() {
            Some(hole) => (bounds, hole),
            None => return,
        },
        _ => return fracture(poly, MAX_BOUNDARY_VERTICES, out),
    };
    let xcut = (hole.min().x + hole.max().x) / 2.;
    for half in halves(&bounds, xcut, true) {
        for piece in poly.intersection(&half) {
            split_holes(piece, out);
        }
    }
}

/// Cut hole-free `poly` through its median vertex, across the longer side of its bounds,
/// until no piece has more than `max_points` vertices.
fn fracture(poly: geo::Polygon<f64>, max_points: usize, out: &mut Vec<Polygon>) {
    let n = num_vertices(&poly);
    let bounds = match poly.bounding_rect() {
        Some(bounds) if n > max_points => bounds,
        _ => return push_exterior(&poly, out),
    };
    let (lo, hi) = (bounds.min(), bounds.max());
    let vertical = hi.x - lo.x >= hi.y - lo.y;
    let (lo, hi) = match vertical {
        true => (lo.x, hi.x),
        false => (lo.y, hi.y),
    };
    let mut coords: Vec<f64> = poly.exterior().0[..n]
        .iter()
        .map(|c| if vertical { c.x } else { c.y })
        .collect();
    coords.sort_by(|a, b| a.total_cmp(b));
    let cut = match coords[n / 2] {
        c if c > lo && c < hi => c,
        _ => (lo + hi) / 2.,
    };
    let pieces: Vec<geo::Polygon<f64>> = halves(&bounds, cut, vertical)
        .iter()
        .flat_map(|half| poly.intersection(half))
        .collect();
    if pieces.iter().any(|p| num_vertices(p) >= n) {
        warn!("Unable to fracture polygon with {} vertices", n);
        return push_exterior(&poly, out);
    }
    for piece in pieces {
        fracture(piece, max_points, out);
    }
}

/// The two halves of (slightly grown) `bounds` on either side of `cut`
fn halves(bounds: &geo::Rect<f64>, cut: f64, vertical: bool) -> [geo::Polygon<f64>; 2] {
    let (lo, hi) = (bounds.min(), bounds.max());
    let (lo, hi) = ((lo.x - 1., lo.y - 1.), (hi.x + 1., hi.y + 1.));
    let halves = match vertical {
        true => [
            geo::Rect::new(lo, (cut, hi.1)),
            geo::Rect::new((cut, lo.1), hi),
        ],
        false => [
            geo::Rect::new(lo, (hi.0, cut)),
            geo::Rect::new((lo.0, cut), hi),
        ],
    };
    halves.map(|h| h.to_polygon())
}

/// Vertex count of the exterior, less its closing point
fn num_vertices(poly: &geo::Polygon<f64>) -> usize {
    poly.exterior().0.len().saturating_sub(1)
}

/// Convert the exterior of `poly` to a [Polygon], dropping the closing point our polygons leave implied
fn push_exterior(poly: &geo::Polygon<f64>, out: &mut Vec<Polygon>) {
    let n = num_vertices(poly);
    let polygon = Polygon::new(
        poly.exterior().0[..n]
            .iter()
            .map(|c| Point::new(c.x, c.y))
            .collect::<Vec<_>>(),
    );
    if !polygon.is_degenerate() {
        out.push(polygon);
    }
}

/// Combine the `core` and `clad` layers of `cell` for `resist`,
/// onto `final_layer`. Returns the number of polygons written.
fn combine(
    cell: &Ptr<Cell>,
    core: LayerSpec,
    clad: LayerSpec,
    resist: Resist,
    final_layer: LayerSpec,
) -> PicResult<usize> {
    let polygons = cell.read()?.layout.polygons_by_spec()?;
    let (core_polys, clad_polys) = match (polygons.get(&core), polygons.get(&clad)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            warn!(
                "No objects on layers {:?} and {:?} of cell `{}`, nothing written to {:?}",
                core,
                clad,
                cell.read()?.name,
                final_layer
            );
            return Ok(0);
        }
    };
    let op = match resist {
        Resist::Positive => BooleanOp::Xor,
        Resist::Negative => BooleanOp::And,
    };
    let result = boolean(core_polys, clad_polys, op);
    let count = result.len();
    let mut cell = cell.write()?;
    info!(
        "Mask `{}`: {} polygons from {:?} {} {:?} on {:?}",
        cell.name, count, core, op, clad, final_layer
    );
    cell.layout.add_polygons(final_layer, result);
    Ok(count)
}

/// Build the waveguide mask of `cell`.
///
/// Core and cladding layers are XOR'ed for positive (effective) resist, AND'ed for negative,
/// and the result added to `cell` on `final_layer`, by default the layer after the cladding.
pub fn build_mask(
    cell: &Ptr<Cell>,
    wgt: &WaveguideTemplate,
    final_layer: Option<LayerSpec>,
) -> PicResult<usize> {
    let wgt = wgt.resolve()?;
    let final_layer = final_layer.unwrap_or(LayerSpec::new(wgt.clad_layer.layer + 1, 0));
    combine(cell, wgt.wg_layer, wgt.clad_layer, wgt.effective_resist(), final_layer)
}

/// Build the metal mask of `cell`, in the manner of [build_mask]
pub fn build_metal_mask(cell: &Ptr<Cell>, mt: &MetalTemplate, final_layer: Option<LayerSpec>) -> PicResult<usize> {
    mt.validate()?;
    let final_layer = final_layer.unwrap_or(LayerSpec::new(mt.clad_layer.layer + 1, 0));
    combine(cell, mt.metal_layer, mt.clad_layer, mt.effective_resist(), final_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Waveguide;
    use crate::data::Library;
    use crate::geom::{Rect, ShapeTrait};
    use crate::template::Fab;
    use approx::assert_abs_diff_eq;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Rect::new(Point::new(x0, y0), Point::new(x1, y1)).to_poly()
    }
    fn total_area(polygons: &[Polygon]) -> f64 {
        polygons.iter().map(|p| p.area()).sum()
    }

    #[test]
    fn booleans() {
        let a = [square(0., 0., 2., 2.)];
        let b = [square(1., 1., 3., 3.)];
        assert_abs_diff_eq!(total_area(&boolean(&a, &b, BooleanOp::Or)), 7., epsilon = 1e-6);
        assert_abs_diff_eq!(total_area(&boolean(&a, &b, BooleanOp::And)), 1., epsilon = 1e-6);
        assert_abs_diff_eq!(total_area(&boolean(&a, &b, BooleanOp::Xor)), 6., epsilon = 1e-6);
        assert_abs_diff_eq!(total_area(&boolean(&a, &b, BooleanOp::Not)), 3., epsilon = 1e-6);
        assert!(boolean(&a, &[], BooleanOp::And).is_empty());
    }
    #[test]
    fn holes_are_split() {
        let frame = boolean(
            &[square(0., 0., 10., 10.)],
            &[square(4., 4., 6., 6.)],
            BooleanOp::Not,
        );
        assert!(frame.len() >= 2);
        assert_abs_diff_eq!(total_area(&frame), 96., epsilon = 1e-6);
    }
    #[test]
    fn merge_overlaps() {
        let merged = merge(&[square(0., 0., 2., 1.), square(1., 0., 3., 1.)]);
        assert_eq!(merged.len(), 1);
        assert_abs_diff_eq!(merged[0].area(), 3., epsilon = 1e-6);
    }
    #[test]
    fn large_polygons_are_fractured() {
        let n = 3 * MAX_BOUNDARY_VERTICES;
        let points: Vec<Point> = (0..n)
            .map(|k| {
                let t = std::f64::consts::TAU * k as f64 / n as f64;
                Point::new(1000. * t.cos(), 1000. * t.sin())
            })
            .collect();
        let circle = Polygon::new(points);
        let pieces = merge(&[circle.clone()]);
        assert!(pieces.len() >= 3);
        assert!(pieces.iter().all(|p| p.points.len() <= MAX_BOUNDARY_VERTICES));
        assert_abs_diff_eq!(total_area(&pieces), circle.area(), epsilon = 1e-3);
    }
    #[test]
    fn serpentine_mask_fits_gds() -> PicResult<()> {
        // Twenty rows joined by thirty-eight bends
        let mut trace = Vec::new();
        for row in 0..20 {
            let y = 200. * row as f64;
            let (x0, x1) = match row % 2 {
                0 => (0., 1000.),
                _ => (1000., 0.),
            };
            trace.push(Point::new(x0, y));
            trace.push(Point::new(x1, y));
        }
        let wgt = WaveguideTemplate::default();
        let mut lib = Library::new("serpentine");
        let mut top = crate::data::Layout::new("top");
        lib.place(&mut top, &Waveguide::new(trace, wgt.clone()), crate::component::Placement::default())?;
        let top = lib.add_cell(top);

        let written = build_mask(&top, &wgt, None)?;
        let polys = top.read()?.layout.polygons_by_spec()?;
        let mask = &polys[&LayerSpec::new(3, 0)];
        assert_eq!(mask.len(), written);
        assert!(mask.iter().all(|p| p.points.len() <= MAX_BOUNDARY_VERTICES));
        lib.to_gds()?;
        Ok(())
    }
    #[test]
    fn waveguide_masks() -> PicResult<()> {
        let mut lib = Library::new("masks");
        let trace = vec![Point::new(0., 0.), Point::new(100., 0.)];
        let wg = Waveguide::new(trace.clone(), WaveguideTemplate::default());
        let cell = lib.build(&wg)?;
        let written = build_mask(&cell, &WaveguideTemplate::default(), None)?;
        // Cladding either side of the core
        assert_eq!(written, 2);
        let polys = cell.read()?.layout.polygons_by_spec()?;
        assert_abs_diff_eq!(total_area(&polys[&LayerSpec::new(3, 0)]), 2000., epsilon = 1e-3);

        // Lift-off inverts the tone: the core itself is written
        let liftoff = WaveguideTemplate {
            fab: Fab::Liftoff,
            ..Default::default()
        };
        let cell = lib.build(&Waveguide::new(trace, liftoff.clone()))?;
        build_mask(&cell, &liftoff, Some(LayerSpec::new(9, 0)))?;
        let polys = cell.read()?.layout.polygons_by_spec()?;
        assert_abs_diff_eq!(total_area(&polys[&LayerSpec::new(9, 0)]), 200., epsilon = 1e-3);
        Ok(())
    }
    #[test]
    fn missing_layers() -> PicResult<()> {
        let mut lib = Library::new("masks");
        let cell = lib.add_cell(crate::data::Cell::new("empty"));
        assert_eq!(build_metal_mask(&cell, &MetalTemplate::default(), None)?, 0);
        assert!(cell.read()?.layout.elems.is_empty());
        Ok(())
    }
}
