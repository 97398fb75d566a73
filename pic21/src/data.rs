//!
//! # Layout Data Model
//!
//! Defines the hierarchical layout structures: [Library], [Cell], [Layout],
//! their geometric [Element]s and [Instance]s of other cells,
//! and the [Library]'s component-cell build cache.
//!

// Std-Lib
use std::collections::{BTreeMap, HashMap};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Local Imports
use crate::{
    bbox::{BoundBox, BoundBoxTrait},
    component::{Component, Placement},
    error::{PicError, PicResult},
    geom::{Point, Polygon, Shape, ShapeTrait, Transform, TransformTrait},
    port::Portlist,
    utils::{DepOrder, DepOrderer, Ptr, PtrList},
};

/// # Layer Specification
/// GDSII-style (layer, datatype) number pair. Serialized as a two-entry tuple.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "(i16, i16)", into = "(i16, i16)")]
pub struct LayerSpec {
    pub layer: i16,
    pub datatype: i16,
}
impl LayerSpec {
    /// Pseudo-layer holding a cell's bounding box in simulation exports
    pub const BACKGROUND: LayerSpec = LayerSpec::new(-1, -1);

    pub const fn new(layer: i16, datatype: i16) -> Self {
        Self { layer, datatype }
    }
}
impl From<(i16, i16)> for LayerSpec {
    fn from(t: (i16, i16)) -> Self {
        Self::new(t.0, t.1)
    }
}
impl From<LayerSpec> for (i16, i16) {
    fn from(s: LayerSpec) -> Self {
        (s.layer, s.datatype)
    }
}
impl std::fmt::Display for LayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.layer, self.datatype)
    }
}
impl JsonSchema for LayerSpec {
    fn schema_name() -> String {
        "LayerSpec".into()
    }
    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <(i16, i16)>::json_schema(gen)
    }
}

/// # Distance Units
/// User-unit and database-unit sizes, in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Units {
    pub user: f64,
    pub database: f64,
}
impl Default for Units {
    /// Microns, with nanometer resolution
    fn default() -> Self {
        Self {
            user: 1e-6,
            database: 1e-9,
        }
    }
}
impl Units {
    /// Database units per user unit
    pub fn scale(&self) -> f64 {
        self.user / self.database
    }
}

/// A [Shape] drawn on a [LayerSpec]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub layer: LayerSpec,
    pub inner: Shape,
}

/// # Instance
///
/// Placement of a shared [Cell] inside another. The cell is mirrored across
/// the x-axis if `reflect_vert`, then rotated counter-clockwise by `angle` degrees,
/// then moved so its origin lands on `loc`.
#[derive(Debug, Clone)]
pub struct Instance {
    pub inst_name: String,
    pub cell: Ptr<Cell>,
    pub loc: Point,
    pub reflect_vert: bool,
    pub angle: Option<f64>,
}
impl Instance {
    /// The [Transform] from the instanced cell's coordinates to its parent's
    pub fn transform(&self) -> Transform {
        Transform::from_instance(&self.loc, self.reflect_vert, self.angle)
    }
}

/// # Layout
///
/// The geometric content of a [Cell]:
/// primitive [Element]s and [Instance]s of other [Cell]s.
///
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub name: String,
    pub insts: Vec<Instance>,
    pub elems: Vec<Element>,
}
impl Layout {
    /// Create a new and empty [Layout] named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Add a [Shape] on `layer`
    pub fn add(&mut self, layer: LayerSpec, shape: impl Into<Shape>) {
        self.elems.push(Element {
            layer,
            inner: shape.into(),
        });
    }
    /// Add each of `polygons` on `layer`
    pub fn add_polygons(&mut self, layer: LayerSpec, polygons: impl IntoIterator<Item = Polygon>) {
        for p in polygons {
            self.add(layer, p);
        }
    }
    /// Extent of everything drawn, through all levels of instances
    pub fn bbox(&self) -> PicResult<BoundBox> {
        let elems = self.flatten()?;
        Ok(elems.iter().fold(BoundBox::empty(), |acc, e| e.inner.union(&acc)))
    }
    /// All elements of the hierarchy, moved into our coordinates
    pub fn flatten(&self) -> PicResult<Vec<Element>> {
        let mut elems = Vec::new();
        collect_elems(self, &Transform::identity(), &mut elems)?;
        Ok(elems)
    }
    /// Flatten, and collect all polygons per [LayerSpec]
    pub fn polygons_by_spec(&self) -> PicResult<BTreeMap<LayerSpec, Vec<Polygon>>> {
        let mut map: BTreeMap<LayerSpec, Vec<Polygon>> = BTreeMap::new();
        for elem in self.flatten()? {
            map.entry(elem.layer).or_default().push(elem.inner.to_poly());
        }
        Ok(map)
    }
}
/// Push the elements of `layout` and its instances, transformed by `trans`, onto `elems`
fn collect_elems(layout: &Layout, trans: &Transform, elems: &mut Vec<Element>) -> PicResult<()> {
    elems.extend(layout.elems.iter().map(|e| Element {
        layer: e.layer,
        inner: e.inner.transform(trans),
    }));
    for inst in layout.insts.iter() {
        let nested = Transform::cascade(trans, &inst.transform());
        collect_elems(&inst.cell.read()?.layout, &nested, elems)?;
    }
    Ok(())
}

/// # Cell
///
/// A named [Layout], plus the [Portlist] of its component.
///
#[derive(Debug, Default, Clone)]
pub struct Cell {
    pub name: String,
    pub layout: Layout,
    /// Ports, in the cell's own coordinates
    pub ports: Portlist,
}
impl Cell {
    /// Empty cell named `name`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            layout: Layout::new(name.clone()),
            name,
            ..Default::default()
        }
    }
}
impl From<Layout> for Cell {
    fn from(layout: Layout) -> Self {
        Self {
            name: layout.name.clone(),
            layout,
            ..Default::default()
        }
    }
}

/// # Cell Library
///
/// Owns all [Cell] definitions, hands out unique cell names,
/// and caches built component cells by their parameter fingerprint,
/// so that identical components share a single cell.
///
#[derive(Debug, Clone, Default)]
pub struct Library {
    /// Library Name
    pub name: String,
    /// Distance Units
    pub units: Units,
    /// Cell Definitions
    pub cells: PtrList<Cell>,
    /// Per-base-name counters for [Library::unique_name]
    names: HashMap<String, usize>,
    /// Built component cells, keyed by fingerprint
    cache: HashMap<String, Ptr<Cell>>,
}
impl Library {
    /// Create a new and empty Library
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Get a new cell name from `base`: `base_1`, `base_2`, and so on.
    pub fn unique_name(&mut self, base: &str) -> String {
        let count = self.names.entry(base.to_string()).or_insert(0);
        *count += 1;
        format!("{}_{}", base, count)
    }
    /// Add a [Cell], returning a pointer to it
    pub fn add_cell(&mut self, cell: impl Into<Cell>) -> Ptr<Cell> {
        self.cells.add(cell)
    }
    /// Get a pointer to the cell named `name`, if present
    pub fn cell(&self, name: &str) -> PicResult<Option<Ptr<Cell>>> {
        for ptr in self.cells.iter() {
            if ptr.read()?.name == name {
                return Ok(Some(ptr.clone()));
            }
        }
        Ok(None)
    }
    /// Build `comp` into a new [Cell], or return the cached cell of an identical component.
    pub fn build<C: Component + ?Sized>(&mut self, comp: &C) -> PicResult<Ptr<Cell>> {
        let fingerprint = comp.fingerprint()?;
        if let Some(cell) = self.cache.get(&fingerprint) {
            return Ok(cell.clone());
        }
        let built = comp.build(self)?;
        let name = self.unique_name(comp.kind());
        let mut layout = built.layout;
        layout.name = name.clone();
        debug!(
            "Built cell {}: {} elements, {} instances",
            name,
            layout.elems.len(),
            layout.insts.len()
        );
        let ptr = self.cells.add(Cell {
            name,
            layout,
            ports: built.ports,
        });
        self.cache.insert(fingerprint, ptr.clone());
        Ok(ptr)
    }
    /// Build `comp`, instantiate it in `parent` at `placement`,
    /// and return its [Portlist] in `parent`'s coordinates.
    pub fn place<C: Component + ?Sized>(
        &mut self,
        parent: &mut Layout,
        comp: &C,
        placement: impl Into<Placement>,
    ) -> PicResult<Portlist> {
        let placement = placement.into();
        let cell = self.build(comp)?;
        let ports = cell.read()?.ports.transform(&placement.transform());
        let inst_name = format!("{}_{}", cell.read()?.name, parent.insts.len());
        parent.insts.push(Instance {
            inst_name,
            cell,
            loc: placement.port,
            reflect_vert: false,
            angle: placement.angle(),
        });
        Ok(ports)
    }
    /// Instantiate an existing `cell` in `parent`, unrotated, at `loc`
    pub fn add_ref(&self, parent: &mut Layout, cell: &Ptr<Cell>, loc: Point) -> PicResult<()> {
        let inst_name = format!("{}_{}", cell.read()?.name, parent.insts.len());
        parent.insts.push(Instance {
            inst_name,
            cell: cell.clone(),
            loc,
            reflect_vert: false,
            angle: None,
        });
        Ok(())
    }
    /// All cells, ordered such that each follows every cell it instantiates
    pub fn dep_order(&self) -> PicResult<Vec<Ptr<Cell>>> {
        CellOrder::order(&self.cells)
    }
}

/// Cell dependency-ordering, following [Instance]s
struct CellOrder;
impl DepOrder for CellOrder {
    type Item = Ptr<Cell>;
    type Error = PicError;

    fn process(item: &Ptr<Cell>, orderer: &mut DepOrderer<Self>) -> PicResult<()> {
        let cell = item.read()?;
        for inst in cell.layout.insts.iter() {
            orderer.push(&inst.cell)?;
        }
        Ok(())
    }
    fn fail() -> PicResult<()> {
        PicError::fail("Cyclic cell hierarchy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unique_names() {
        let mut lib = Library::new("lib");
        assert_eq!(lib.unique_name("waveguide"), "waveguide_1");
        assert_eq!(lib.unique_name("waveguide"), "waveguide_2");
        assert_eq!(lib.unique_name("taper"), "taper_1");
        // Independent per library
        assert_eq!(Library::new("other").unique_name("waveguide"), "waveguide_1");
    }
    #[test]
    fn layerspec_serde() -> PicResult<()> {
        let spec = LayerSpec::new(2, 1);
        assert_eq!(serde_json::to_string(&spec)?, "[2,1]");
        let back: LayerSpec = serde_json::from_str("[2,1]")?;
        assert_eq!(back, spec);
        Ok(())
    }
    #[test]
    fn flatten_and_order() -> PicResult<()> {
        let mut lib = Library::new("lib");
        let mut leaf = Cell::new("leaf");
        leaf.layout.add(
            LayerSpec::new(1, 0),
            Rect::new(Point::new(0., 0.), Point::new(2., 1.)),
        );
        let leaf = lib.add_cell(leaf);
        let top = lib.add_cell(Cell::new("top"));
        {
            let mut t = top.write()?;
            lib.add_ref(&mut t.layout, &leaf, Point::new(10., 0.))?;
            t.layout.insts.push(Instance {
                inst_name: "rotated".into(),
                cell: leaf.clone(),
                loc: Point::new(0., 0.),
                reflect_vert: false,
                angle: Some(90.),
            });
        }
        let bbox = top.read()?.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p0.x, -1., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.x, 12., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.y, 2., epsilon = 1e-9);

        let polys = top.read()?.layout.polygons_by_spec()?;
        assert_eq!(polys[&LayerSpec::new(1, 0)].len(), 2);

        // Reversed insertion order still yields the leaf first
        let order = CellOrder::order(&[top.clone(), leaf.clone()])?;
        assert_eq!(order, vec![leaf.clone(), top.clone()]);
        assert_eq!(lib.dep_order()?, vec![leaf, top]);
        Ok(())
    }
}
