//!
//! # pic21 integration tests
//!

use super::*;
use crate::components::{Mmi1x2, Ring, Taper, Waveguide};
use crate::mask::build_mask;
use crate::sim::{default_operations, export_component, MaterialStack};
use crate::utils::{Ptr, SerdeFile, SerializationFormat};
use approx::assert_abs_diff_eq;
use std::f64::consts::PI;

/// Waveguide into a 1x2 MMI, with a taper on its upper output
fn chain(lib: &mut Library, wgt: &WaveguideTemplate) -> PicResult<Ptr<Cell>> {
    let mut top = Layout::new("top");
    let wg = Waveguide::new(vec![(0., 0.), (200., 0.)], wgt.clone());
    let wg_ports = lib.place(&mut top, &wg, Placement::default())?;
    let mmi = Mmi1x2::new(wgt.clone(), 50., 10.);
    let mmi_ports = lib.place(&mut top, &mmi, wg_ports.get("output")?)?;
    let taper = Taper::new(wgt.clone(), 20., 0.5);
    lib.place(&mut top, &taper, mmi_ports.get("output_top")?)?;
    Ok(lib.add_cell(top))
}
#[test]
fn port_chaining() -> PicResult<()> {
    let mut lib = Library::new("chain");
    let wgt = WaveguideTemplate::default();
    let top = chain(&mut lib, &wgt)?;
    let top = top.read()?;
    assert_eq!(top.layout.insts.len(), 3);

    // The MMI's upper output, in the top cell's coordinates
    let dy = 2. * 50. * (1. - (PI / 6.).cos());
    let out_top = Point::new(200. + 50. + 50. + 20., 10. / 6. + dy);
    let taper = &top.layout.insts[2];
    assert_abs_diff_eq!(taper.loc.x, out_top.x, epsilon = 1e-9);
    assert_abs_diff_eq!(taper.loc.y, out_top.y, epsilon = 1e-9);
    assert_eq!(taper.angle, None);

    // The taper's cladding runs on past its end by twice the cladding width
    let bbox = top.layout.bbox()?;
    assert_abs_diff_eq!(bbox.p0.x, 0., epsilon = 1e-9);
    let extra_clad = 2. * wgt.clad_width;
    assert_abs_diff_eq!(bbox.p1.x, out_top.x + 20. + extra_clad, epsilon = 1e-9);
    Ok(())
}
#[test]
fn shared_cells() -> PicResult<()> {
    let mut lib = Library::new("shared");
    let mut top = Layout::new("top");
    let ring = Ring::new(WaveguideTemplate::default(), 30., 0.5);
    lib.place(&mut top, &ring, Placement::default())?;
    lib.place(&mut top, &ring, Placement::new((0., 200.), Direction::WEST))?;
    let bigger = Ring::new(WaveguideTemplate::default(), 40., 0.5);
    lib.place(&mut top, &bigger, Placement::new((0., 400.), Direction::EAST))?;
    assert_eq!(lib.cells.len(), 2);
    let names: Vec<String> = top
        .insts
        .iter()
        .map(|i| Ok(i.cell.read()?.name.clone()))
        .collect::<PicResult<_>>()?;
    assert_eq!(names, vec!["ring_1", "ring_1", "ring_2"]);
    Ok(())
}
#[test]
fn mask_to_gds() -> PicResult<()> {
    let mut lib = Library::new("masked");
    let wgt = WaveguideTemplate::default();
    let top = chain(&mut lib, &wgt)?;
    let written = build_mask(&top, &wgt, None)?;
    assert!(written > 0);
    assert!(top
        .read()?
        .layout
        .elems
        .iter()
        .all(|e| e.layer == LayerSpec::new(3, 0)));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("masked.gds");
    lib.save_gds(&path)?;
    let gds = gds21::GdsLibrary::load(&path)?;
    assert_eq!(gds.structs.len(), lib.cells.len());
    let last = gds.structs.last().ok_or(PicError::msg("No structs"))?;
    assert_eq!(last.name, "top");
    // Three instances, plus the mask polygons
    assert!(last.elems.len() > 3);
    Ok(())
}
#[test]
fn template_markup() -> PicResult<()> {
    let wgt: WaveguideTemplate = SerializationFormat::Yaml.from_str(
        "
        wg_width: 0.5
        clad_width: 3.0
        resist: '-'
        fab: LIFTOFF
        ",
    )?;
    assert_abs_diff_eq!(wgt.bend_radius, 50.);
    assert_eq!(wgt.wg_layer, LayerSpec::new(1, 0));
    assert_eq!(wgt.effective_resist(), Resist::Positive);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("wgt.toml");
    wgt.save(SerializationFormat::Toml, &path)?;
    assert_eq!(WaveguideTemplate::open(&path, SerializationFormat::Toml)?, wgt);
    Ok(())
}
#[test]
fn ring_prisms() -> PicResult<()> {
    let mut lib = Library::new("sim");
    let wgt = WaveguideTemplate {
        wg_width: 0.5,
        clad_width: 3.,
        bend_radius: 5.,
        ..Default::default()
    };
    let ring = lib.build(&Ring::new(wgt.clone(), 5., 0.2))?;
    let mut mstack = MaterialStack::new(1.5, vec![(2.1, 1.5)])?;
    mstack.add_vstack(wgt.wg_layer, vec![(2.1, 0.5), (12.1, 0.22), (2.1, 0.78)])?;
    mstack.add_vstack(wgt.clad_layer, vec![(2.1, 1.5)])?;

    let geom = export_component(&ring, &mstack, &default_operations(&wgt))?;
    assert!(!geom.is_empty());
    assert_eq!(geom.x.len(), geom.ycenter.len());
    // Every row lies within the centered simulation region
    let (sx, _, sz) = geom.size;
    assert!(geom.x.iter().all(|x| x.abs() <= sx / 2. + 1e-6));
    assert!(geom.z.iter().all(|z| z.abs() <= sz / 2. + 1e-6));
    assert!(geom.eps.contains(&12.1));
    Ok(())
}
