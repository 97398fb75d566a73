//!
//! # GDSII Export Module
//!

// Std-Lib
use std::path::Path;

// Crates.io
use tracing::{debug, info};

// Local imports
use crate::data::{Cell, Element, Instance, Library};
use crate::error::{PicError, PicResult};
use crate::geom::{Point, ShapeTrait};
use crate::utils::{ErrorContext, ErrorHelper, Ptr};

/// Maximum vertices per GDSII boundary, excluding the closing repetition of its origin
pub const MAX_BOUNDARY_VERTICES: usize = 8190;

/// # Gds21 Converter
///
/// Converts a [Library] to a GDSII library ([gds21::GdsLibrary]).
/// Cells are written in dependency order, each following all the cells it instantiates.
#[derive(Debug)]
pub struct GdsConverter<'lib> {
    lib: &'lib Library,
    /// Database units per user unit
    scale: f64,
    ctx_stack: Vec<ErrorContext>,
}
impl<'lib> GdsConverter<'lib> {
    pub fn convert(lib: &'lib Library) -> PicResult<gds21::GdsLibrary> {
        let mut me = Self {
            lib,
            scale: lib.units.scale(),
            ctx_stack: vec![ErrorContext::Library(lib.name.clone())],
        };
        me.convert_all()
    }
    fn convert_all(&mut self) -> PicResult<gds21::GdsLibrary> {
        let mut gdslib = gds21::GdsLibrary::new(&self.lib.name);
        // GDSII units are (database unit in user units, database unit in meters)
        let units = &self.lib.units;
        gdslib.units = gds21::GdsUnits::new(units.database / units.user, units.database);
        for cell in self.lib.dep_order()?.iter() {
            gdslib.structs.push(self.convert_cell(cell)?);
        }
        Ok(gdslib)
    }
    /// Convert a [Cell] to a [gds21::GdsStruct] cell-definition
    fn convert_cell(&mut self, cell: &Ptr<Cell>) -> PicResult<gds21::GdsStruct> {
        let cell = cell.read()?;
        self.ctx_stack.push(ErrorContext::Cell(cell.name.clone()));
        let layout = &cell.layout;
        let mut elems = Vec::with_capacity(layout.elems.len() + layout.insts.len());
        for inst in layout.insts.iter() {
            elems.push(self.convert_instance(inst)?.into());
        }
        for elem in layout.elems.iter() {
            if let Some(boundary) = self.convert_element(elem)? {
                elems.push(boundary.into());
            }
        }
        let mut strukt = gds21::GdsStruct::new(&cell.name);
        strukt.elems = elems;
        self.ctx_stack.pop();
        Ok(strukt)
    }
    /// Convert an [Instance] to a GDS instance, AKA [gds21::GdsStructRef]
    fn convert_instance(&mut self, inst: &Instance) -> PicResult<gds21::GdsStructRef> {
        self.ctx_stack.push(ErrorContext::Instance(inst.inst_name.clone()));
        let angle = inst.angle.filter(|a| *a != 0.);
        let strans = match (inst.reflect_vert, angle) {
            (false, None) => None,
            (reflected, angle) => Some(gds21::GdsStrans {
                reflected,
                angle,
                ..Default::default()
            }),
        };
        let sref = gds21::GdsStructRef {
            name: inst.cell.read()?.name.clone(),
            xy: self.convert_point(&inst.loc)?,
            strans,
            ..Default::default()
        };
        self.ctx_stack.pop();
        Ok(sref)
    }
    /// Convert an [Element] into a [gds21::GdsBoundary].
    ///
    /// GDS shapes include an explicit repetition of their origin for closure.
    /// Shapes which collapse to fewer than three distinct points on the database grid are dropped.
    fn convert_element(&mut self, elem: &Element) -> PicResult<Option<gds21::GdsBoundary>> {
        self.ctx_stack
            .push(ErrorContext::Layer(elem.layer.layer, elem.layer.datatype));
        let poly = elem.inner.to_poly();
        let mut xy: Vec<gds21::GdsPoint> = Vec::with_capacity(poly.points.len() + 1);
        for p in poly.points.iter() {
            let pt = self.convert_point(p)?;
            if xy.last() != Some(&pt) {
                xy.push(pt);
            }
        }
        while xy.len() > 1 && xy.first() == xy.last() {
            xy.pop();
        }
        if xy.len() > MAX_BOUNDARY_VERTICES {
            return self.fail(format!(
                "Polygon with {} vertices exceeds the GDSII limit of {}",
                xy.len(),
                MAX_BOUNDARY_VERTICES
            ));
        }
        self.ctx_stack.pop();
        if xy.len() < 3 {
            debug!("Dropping degenerate polygon on {}", elem.layer);
            return Ok(None);
        }
        xy.push(xy[0].clone());
        Ok(Some(gds21::GdsBoundary {
            layer: elem.layer.layer,
            datatype: elem.layer.datatype,
            xy,
            ..Default::default()
        }))
    }
    /// Convert a [Point] in user units to a [gds21::GdsPoint] in database units
    fn convert_point(&self, p: &Point) -> PicResult<gds21::GdsPoint> {
        let x = self.convert_coord(p.x)?;
        let y = self.convert_coord(p.y)?;
        Ok(gds21::GdsPoint::new(x, y))
    }
    fn convert_coord(&self, val: f64) -> PicResult<i32> {
        let db = (val * self.scale).round();
        if !db.is_finite() || db < i32::MIN as f64 || db > i32::MAX as f64 {
            return self.fail(format!("Coordinate {} out of GDSII range", val));
        }
        Ok(db as i32)
    }
}
impl ErrorHelper for GdsConverter<'_> {
    type Error = PicError;
    fn err(&self, msg: impl Into<String>) -> PicError {
        PicError::Export {
            message: msg.into(),
            stack: self.ctx_stack.clone(),
        }
    }
}

impl Library {
    /// Convert to a [gds21::GdsLibrary]
    pub fn to_gds(&self) -> PicResult<gds21::GdsLibrary> {
        GdsConverter::convert(self)
    }
    /// Write to GDSII file `path`
    pub fn save_gds(&self, path: impl AsRef<Path>) -> PicResult<()> {
        let gdslib = self.to_gds()?;
        gdslib.save(&path)?;
        info!(
            "Wrote {} cells of library `{}` to {}",
            gdslib.structs.len(),
            self.name,
            path.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Placement;
    use crate::components::{Taper, Waveguide};
    use crate::data::{LayerSpec, Layout};
    use crate::dir::Direction;
    use crate::geom::{Polygon, Rect};
    use crate::template::WaveguideTemplate;
    use approx::assert_abs_diff_eq;

    fn boundary(elem: &gds21::GdsElement) -> Option<&gds21::GdsBoundary> {
        match elem {
            gds21::GdsElement::GdsBoundary(b) => Some(b),
            _ => None,
        }
    }

    #[test]
    fn dependency_order() -> PicResult<()> {
        let mut lib = Library::new("order");
        let mut top = Layout::new("top");
        let taper = Taper::new(WaveguideTemplate::default(), 10., 4.);
        lib.place(&mut top, &taper, Placement::new((5., 0.), Direction::NORTH))?;
        lib.add_cell(top);

        let gdslib = lib.to_gds()?;
        assert_eq!(gdslib.units, gds21::GdsUnits::new(1e-3, 1e-9));
        let names: Vec<_> = gdslib.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["taper_1", "top"]);

        let sref = match &gdslib.structs[1].elems[0] {
            gds21::GdsElement::GdsStructRef(s) => s,
            other => panic!("Expected a struct reference, got {:?}", other),
        };
        assert_eq!(sref.name, "taper_1");
        assert_eq!(sref.xy, gds21::GdsPoint::new(5000, 0));
        let strans = sref.strans.as_ref().ok_or(PicError::msg("No strans"))?;
        assert_abs_diff_eq!(strans.angle.unwrap_or(0.), 90., epsilon = 1e-9);
        assert!(!strans.reflected);
        Ok(())
    }
    #[test]
    fn boundaries() -> PicResult<()> {
        let mut lib = Library::new("shapes");
        let mut layout = Layout::new("rects");
        layout.add(
            LayerSpec::new(4, 2),
            Rect::new(Point::new(0., 0.), Point::new(1.5, 0.25)),
        );
        // Collapses on the nanometer grid
        layout.add(
            LayerSpec::new(4, 2),
            Rect::new(Point::new(0., 0.), Point::new(1e-4, 1e-4)),
        );
        lib.add_cell(layout);
        let gdslib = lib.to_gds()?;
        let elems = &gdslib.structs[0].elems;
        assert_eq!(elems.len(), 1);
        let b = boundary(&elems[0]).ok_or(PicError::msg("Not a boundary"))?;
        assert_eq!((b.layer, b.datatype), (4, 2));
        assert_eq!(
            b.xy,
            gds21::GdsPoint::vec(&[(0, 0), (1500, 0), (1500, 250), (0, 250), (0, 0)])
        );
        Ok(())
    }
    #[test]
    fn vertex_limit() -> PicResult<()> {
        let mut lib = Library::new("big");
        let mut layout = Layout::new("circle");
        let n = MAX_BOUNDARY_VERTICES + 10;
        let points: Vec<Point> = (0..n)
            .map(|k| {
                let t = std::f64::consts::TAU * k as f64 / n as f64;
                Point::new(1000. * t.cos(), 1000. * t.sin())
            })
            .collect();
        layout.add(LayerSpec::new(1, 0), Polygon::new(points));
        lib.add_cell(layout);
        match lib.to_gds() {
            Err(PicError::Export { stack, .. }) => {
                assert!(stack.contains(&ErrorContext::Cell("circle".into())));
            }
            other => panic!("Expected an export error, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }
    #[test]
    fn save_and_reopen() -> PicResult<()> {
        let mut lib = Library::new("saved");
        let trace = vec![Point::new(0., 0.), Point::new(200., 0.), Point::new(200., 200.)];
        let wg = Waveguide::new(trace, WaveguideTemplate::default());
        let mut top = Layout::new("top");
        lib.place(&mut top, &wg, Placement::default())?;
        lib.add_cell(top);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("saved.gds");
        lib.save_gds(&path)?;
        let read = gds21::GdsLibrary::load(&path)?;
        assert_eq!(read.name, "saved");
        // Bends are drawn inline, so only the waveguide and top-level cells
        assert_eq!(read.structs.len(), 2);
        assert_eq!(read.structs[0].name, "waveguide_1");
        assert_eq!(read.structs[1].name, "top");
        assert!(read.structs[0].elems.iter().all(|e| boundary(e).is_some()));
        Ok(())
    }
}
