//!
//! # Mask Markup
//!
//! The [MaskFile] format: a top cell described as a list of components,
//! each placed explicitly or chained onto a named port of an earlier one.
//! Loads from any [SerializationFormat]; YAML anchors and aliases share templates between entries.
//!
//! ```yaml
//! name: demo
//! mask:
//!   waveguides:
//!     - &wgt
//!       wg_width: 0.5
//! components:
//!   - kind: Waveguide
//!     name: feed
//!     wgt: *wgt
//!     trace: [{x: 0, y: 0}, {x: 100, y: 0}]
//!   - kind: Ring
//!     wgt: *wgt
//!     radius: 20
//!     coupling_gap: 0.2
//!     connect: {component: feed, port: output}
//! ```
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// Local imports
use pic21::components::*;
use pic21::mask::{build_mask, build_metal_mask};
use pic21::sim::{default_operations, export_component, LayerOperation, MaterialStack};
use pic21::{
    Cell, Component, Layout, Library, MetalTemplate, PicError, PicResult, Placement, Portlist,
    Units, WaveguideTemplate,
};
use pic21utils::{Ptr, SerdeFile, SerializationFormat};

/// Generate [ComponentSpec], with one variant per component type,
/// plus one per alternate name for an existing type
macro_rules! component_specs {
    ($($kind:ident),* $(,)? ; aliases { $($alias:ident => $target:ident),* $(,)? }) => {
        /// # Component Specification
        ///
        /// Any one of the component library's types, tagged by `kind`.
        #[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
        #[serde(tag = "kind")]
        pub enum ComponentSpec {
            $($kind($kind),)*
            $($alias($target),)*
        }
        impl ComponentSpec {
            /// Cell base name of the inner component
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$kind(c) => c.kind(),)*
                    $(Self::$alias(c) => c.kind(),)*
                }
            }
            /// Build the component into `lib`, and instantiate it in `parent` at `placement`
            pub fn place(
                &self,
                lib: &mut Library,
                parent: &mut Layout,
                placement: Placement,
            ) -> PicResult<Portlist> {
                match self {
                    $(Self::$kind(c) => lib.place(parent, c, placement),)*
                    $(Self::$alias(c) => lib.place(parent, c, placement),)*
                }
            }
        }
        $(
            impl From<$kind> for ComponentSpec {
                fn from(c: $kind) -> Self {
                    Self::$kind(c)
                }
            }
        )*
    };
}
component_specs!(
    Waveguide,
    EBend,
    SBend,
    EulerSBend,
    BBend,
    Taper,
    GratingCoupler,
    GratingCouplerStraight,
    GratingCouplerFocusing,
    Mmi1x2,
    Mmi2x2,
    SplineYSplitter,
    Disk,
    Ring,
    Spiral,
    Dbr,
    ZeroLengthCavity,
    DirectionalCoupler,
    FullCoupler,
    BroadbandDirectionalCoupler,
    AdiabaticCoupler,
    ContraDirectionalCoupler,
    SwgContraDirectionalCoupler,
    StripSlotConverter,
    StripSlotMmiConverter,
    StripSlotYConverter,
    MachZehnder,
    MachZehnderSwitch1x2,
    MachZehnderSwitchDC1x2,
    MachZehnderSwitchDC2x2,
    MetalRoute,
    Bondpad,
    Via,
    AlignmentCross,
    AlignmentTarget;
    aliases {
        BBDirectionalCoupler => DirectionalCoupler,
        StripSlotCoupler => StripSlotConverter,
        StripSlotMmiCoupler => StripSlotMmiConverter,
        StripSlotYCoupler => StripSlotYConverter,
    }
);

/// Reference to port `port` of the entry labeled `component`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PortRef {
    pub component: String,
    pub port: String,
}

/// # Component Entry
///
/// A [ComponentSpec] plus where it goes. Entries with neither a `placement`
/// nor a `connect` land at the origin, facing EAST.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ComponentEntry {
    /// Label, for later entries to `connect` to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub component: ComponentSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<PortRef>,
}
impl ComponentEntry {
    /// Create a new entry at `placement`
    pub fn new(component: impl Into<ComponentSpec>, placement: Placement) -> Self {
        Self {
            name: None,
            component: component.into(),
            placement: Some(placement),
            connect: None,
        }
    }
    /// Resolve our placement, looking up `connect` targets among the `placed` entries
    fn resolve(&self, placed: &HashMap<String, Portlist>) -> PicResult<Placement> {
        match (&self.placement, &self.connect) {
            (Some(_), Some(_)) => PicError::invalid(format!(
                "Component `{}` has both a placement and a connection",
                self.label()
            )),
            (Some(p), None) => Ok(*p),
            (None, Some(r)) => match placed.get(&r.component) {
                Some(ports) => Ok(ports.get(&r.port)?.into()),
                None => PicError::invalid(format!(
                    "Component `{}` connects to `{}`, which is not an earlier named entry",
                    self.label(),
                    r.component
                )),
            },
            (None, None) => Ok(Placement::default()),
        }
    }
    fn label(&self) -> &str {
        match &self.name {
            Some(n) => n,
            None => self.component.kind(),
        }
    }
}

/// Templates whose layers are combined into masks
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MaskSettings {
    pub waveguides: Vec<WaveguideTemplate>,
    pub metals: Vec<MetalTemplate>,
}
impl MaskSettings {
    pub fn is_empty(&self) -> bool {
        self.waveguides.is_empty() && self.metals.is_empty()
    }
}

/// # Mask File
///
/// Library metadata, mask-build settings, and the components of a single top cell.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MaskFile {
    /// Library Name
    pub name: String,
    /// Top Cell Name
    #[serde(default = "default_top")]
    pub top: String,
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub mask: MaskSettings,
    /// Layer operations for simulation export.
    /// Defaults to those of the first waveguide template in `mask`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_operations: Option<Vec<LayerOperation>>,
    pub components: Vec<ComponentEntry>,
}
fn default_top() -> String {
    "top".into()
}
impl SerdeFile for MaskFile {}
impl MaskFile {
    /// Build every entry into a new [Library], returning it and the top cell
    pub fn build(&self) -> PicResult<(Library, Ptr<Cell>)> {
        let mut lib = Library::new(&self.name);
        lib.units = self.units;
        let mut top = Layout::new(&self.top);
        let mut placed: HashMap<String, Portlist> = HashMap::new();
        for entry in self.components.iter() {
            let placement = entry.resolve(&placed)?;
            let ports = entry.component.place(&mut lib, &mut top, placement)?;
            debug!(
                "Placed {} at ({}, {})",
                entry.label(),
                placement.port.x,
                placement.port.y
            );
            if let Some(name) = &entry.name {
                if placed.insert(name.clone(), ports).is_some() {
                    return PicError::invalid(format!("Duplicate component name `{}`", name));
                }
            }
        }
        let top = lib.add_cell(top);
        info!(
            "Built library `{}`: {} components, {} cells",
            lib.name,
            self.components.len(),
            lib.cells.len()
        );
        Ok((lib, top))
    }
    /// Run the mask build of every template in `mask` on `top`.
    /// Returns the total number of polygons written.
    pub fn build_masks(&self, top: &Ptr<Cell>) -> PicResult<usize> {
        if self.mask.is_empty() {
            return PicError::invalid(format!(
                "Mask file `{}` lists no templates to build masks for",
                self.name
            ));
        }
        let mut written = 0;
        for wgt in self.mask.waveguides.iter() {
            written += build_mask(top, wgt, None)?;
        }
        for mt in self.mask.metals.iter() {
            written += build_metal_mask(top, mt, None)?;
        }
        Ok(written)
    }
    /// Layer operations for simulation export
    pub fn operations(&self) -> Vec<LayerOperation> {
        if let Some(ops) = &self.boolean_operations {
            return ops.clone();
        }
        match self.mask.waveguides.first() {
            Some(wgt) => default_operations(wgt),
            None => default_operations(&WaveguideTemplate::default()),
        }
    }
}

/// Markup-file format from `fmt`, or from the extension of `fname` if `fmt` is empty
pub fn parse_format(fmt: &str, fname: &str) -> PicResult<SerializationFormat> {
    let fmt = match fmt {
        "" => SerializationFormat::from_extension(fname)?,
        s => s.parse()?,
    };
    Ok(fmt)
}

/// # Markup to GDSII Options
///
/// The `markup2gds` program's arguments, without the `clap` annotations.
#[derive(Debug, Clone, Default)]
pub struct Markup2GdsOptions {
    /// Input [MaskFile]
    pub inp: String,
    /// Input Format. One of ("json", "yaml", "toml"), or empty to use the file extension.
    pub fmt: String,
    /// GDS Output File
    pub gds: String,
    /// Build masks for the templates listed in the input
    pub mask: bool,
    /// Verbose Output Mode
    pub verbose: bool,
}

/// Load a [MaskFile], build it, and write it to GDSII
pub fn markup2gds(options: &Markup2GdsOptions) -> PicResult<()> {
    let fmt = parse_format(&options.fmt, &options.inp)?;
    let maskfile: MaskFile = fmt.open(&options.inp)?;
    let (lib, top) = maskfile.build()?;
    if options.mask {
        let written = maskfile.build_masks(&top)?;
        info!("Mask build wrote {} polygons", written);
    }
    lib.save_gds(&options.gds)?;
    Ok(())
}

/// # Simulation Export Options
#[derive(Debug, Clone, Default)]
pub struct Pic2SimOptions {
    /// Input [MaskFile]
    pub inp: String,
    /// [MaterialStack] File
    pub stack: String,
    /// Output File
    pub out: String,
    /// Output Format. One of ("json", "yaml", "toml"), or empty to use the file extension.
    pub fmt: String,
    /// Verbose Output Mode
    pub verbose: bool,
}

/// Load a [MaskFile] and a [MaterialStack], and write the top cell's dielectric prisms
pub fn pic2sim(options: &Pic2SimOptions) -> PicResult<()> {
    let maskfile: MaskFile = parse_format("", &options.inp)?.open(&options.inp)?;
    let mstack: MaterialStack = parse_format("", &options.stack)?.open(&options.stack)?;
    mstack.validate()?;

    let (_lib, top) = maskfile.build()?;
    let geom = export_component(&top, &mstack, &maskfile.operations())?;
    let fmt = parse_format(&options.fmt, &options.out)?;
    geom.save(fmt, &options.out)?;
    info!("Wrote {} prisms to {}", geom.len(), options.out);
    Ok(())
}
