//!
//! # Mach-Zehnder Interferometers
//!
//! A splitter and combiner facing each other, joined by two routed arms
//! which loop away from the axis. Either arm can be lengthened, and each can carry a heater.
//! Splitters and combiners are MMIs or [DirectionalCoupler]s.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use super::{DirectionalCoupler, MetalRoute, Mmi1x2, Mmi2x2, Waveguide};
use crate::component::{Built, Component, Placement};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::port::{Port, Portlist};
use crate::template::{MetalTemplate, WaveguideTemplate};

/// # Mach-Zehnder Interferometer
///
/// Two [Mmi1x2]s. Defaults to a balanced interferometer without heaters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MachZehnder {
    pub wgt: WaveguideTemplate,
    pub mmi_length: f64,
    pub mmi_width: f64,
    pub angle: f64,
    pub mmi_taper_width: Option<f64>,
    pub mmi_taper_length: f64,
    pub mmi_wg_sep: Option<f64>,
    /// Extra length of the top arm
    pub arm1: f64,
    /// Extra length of the bottom arm
    pub arm2: f64,
    pub heater: bool,
    /// Heated length along each arm, excluding its bends
    pub heater_length: f64,
    /// Heater template, required with `heater`
    pub mt: Option<MetalTemplate>,
}
impl Default for MachZehnder {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            mmi_length: 0.,
            mmi_width: 0.,
            angle: PI / 6.,
            mmi_taper_width: None,
            mmi_taper_length: 20.,
            mmi_wg_sep: None,
            arm1: 0.,
            arm2: 0.,
            heater: false,
            heater_length: 400.,
            mt: None,
        }
    }
}
impl MachZehnder {
    pub fn new(wgt: WaveguideTemplate, mmi_length: f64, mmi_width: f64) -> Self {
        Self {
            wgt,
            mmi_length,
            mmi_width,
            ..Default::default()
        }
    }
    fn mmi(&self) -> Mmi1x2 {
        Mmi1x2 {
            wgt: self.wgt.clone(),
            length: self.mmi_length,
            width: self.mmi_width,
            angle: self.angle,
            taper_width: self.mmi_taper_width,
            taper_length: self.mmi_taper_length,
            wg_sep: self.mmi_wg_sep,
        }
    }
    /// Distance from input to output
    pub fn total_length(&self) -> f64 {
        2. * self.mmi().total_length() + 4. * self.wgt.bend_radius
    }
    fn arms(&self) -> PicResult<Arms<'_>> {
        Arms::new(self.arm1, self.arm2, self.heater, self.heater_length, &self.mt)
    }
}
impl Component for MachZehnder {
    fn kind(&self) -> &'static str {
        "mach_zehnder"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_angle(self.angle)?;
        let arms = self.arms()?;
        let mmi = self.mmi();
        let total = self.total_length();
        let mut layout = Layout::default();

        let splitter = lib.place(&mut layout, &mmi, Placement::default())?;
        let combiner = lib.place(&mut layout, &mmi, Placement::new((total, 0.), Direction::WEST))?;
        let mut ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output", Port::new((total, 0.), Direction::EAST));
        arms.draw(
            lib,
            &mut layout,
            &wgt,
            (splitter.get("output_top")?.port, splitter.get("output_bot")?.port),
            (combiner.get("output_bot")?.port.y, combiner.get("output_top")?.port.y),
            &mut ports,
        )?;
        Ok(Built { layout, ports })
    }
}

/// # Mach-Zehnder 1x2 Switch
///
/// An [Mmi1x2] splitter and [Mmi2x2] combiner, routing the input to either output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MachZehnderSwitch1x2 {
    pub wgt: WaveguideTemplate,
    pub mmi1x2_length: f64,
    pub mmi1x2_width: f64,
    pub mmi2x2_length: f64,
    pub mmi2x2_width: f64,
    pub angle: f64,
    pub mmi1x2_taper_width: Option<f64>,
    pub mmi1x2_taper_length: f64,
    pub mmi1x2_wg_sep: Option<f64>,
    pub mmi2x2_taper_width: Option<f64>,
    pub mmi2x2_wg_sep: Option<f64>,
    pub arm1: f64,
    pub arm2: f64,
    pub heater: bool,
    pub heater_length: f64,
    pub mt: Option<MetalTemplate>,
}
impl Default for MachZehnderSwitch1x2 {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            mmi1x2_length: 0.,
            mmi1x2_width: 0.,
            mmi2x2_length: 0.,
            mmi2x2_width: 0.,
            angle: PI / 6.,
            mmi1x2_taper_width: None,
            mmi1x2_taper_length: 20.,
            mmi1x2_wg_sep: None,
            mmi2x2_taper_width: None,
            mmi2x2_wg_sep: None,
            arm1: 0.,
            arm2: 0.,
            heater: false,
            heater_length: 400.,
            mt: None,
        }
    }
}
impl MachZehnderSwitch1x2 {
    pub fn new(
        wgt: WaveguideTemplate,
        mmi1x2_length: f64,
        mmi1x2_width: f64,
        mmi2x2_length: f64,
        mmi2x2_width: f64,
    ) -> Self {
        Self {
            wgt,
            mmi1x2_length,
            mmi1x2_width,
            mmi2x2_length,
            mmi2x2_width,
            ..Default::default()
        }
    }
    fn splitter(&self) -> Mmi1x2 {
        Mmi1x2 {
            wgt: self.wgt.clone(),
            length: self.mmi1x2_length,
            width: self.mmi1x2_width,
            angle: self.angle,
            taper_width: self.mmi1x2_taper_width,
            taper_length: self.mmi1x2_taper_length,
            wg_sep: self.mmi1x2_wg_sep,
        }
    }
    fn combiner(&self) -> Mmi2x2 {
        Mmi2x2 {
            wgt: self.wgt.clone(),
            length: self.mmi2x2_length,
            width: self.mmi2x2_width,
            angle: self.angle,
            taper_width: self.mmi2x2_taper_width,
            wg_sep: self.mmi2x2_wg_sep,
        }
    }
    /// Distance from input to outputs
    pub fn total_length(&self) -> f64 {
        self.splitter().total_length() + self.combiner().total_length() + 4. * self.wgt.bend_radius
    }
}
impl Component for MachZehnderSwitch1x2 {
    fn kind(&self) -> &'static str {
        "mach_zehnder_switch_1x2"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_angle(self.angle)?;
        let arms = Arms::new(self.arm1, self.arm2, self.heater, self.heater_length, &self.mt)?;
        let (splitter, combiner) = (self.splitter(), self.combiner());
        let total = self.total_length();
        let half_sep = combiner.port_separation() / 2.;
        let mut layout = Layout::default();

        let split = lib.place(&mut layout, &splitter, Placement::default())?;
        let combine = lib.place(
            &mut layout,
            &combiner,
            Placement::new((total, -half_sep), Direction::WEST),
        )?;
        // The rotated combiner's `input_bot` lands on top
        let mut ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output_top", *combine.get("input_bot")?)
            .with("output_bot", *combine.get("input_top")?);
        arms.draw(
            lib,
            &mut layout,
            &wgt,
            (split.get("output_top")?.port, split.get("output_bot")?.port),
            (combine.get("output_bot")?.port.y, combine.get("output_top")?.port.y),
            &mut ports,
        )?;
        Ok(Built { layout, ports })
    }
}

/// # Mach-Zehnder 1x2 Switch, Directional-Coupler Combiner
///
/// An [Mmi1x2] splitter and [DirectionalCoupler] combiner.
/// The outputs sit symmetrically about the input's axis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MachZehnderSwitchDC1x2 {
    pub wgt: WaveguideTemplate,
    pub mmi1x2_length: f64,
    pub mmi1x2_width: f64,
    pub dc_length: f64,
    pub dc_gap: f64,
    pub angle: f64,
    pub mmi1x2_taper_width: Option<f64>,
    pub mmi1x2_taper_length: f64,
    pub mmi1x2_wg_sep: Option<f64>,
    pub arm1: f64,
    pub arm2: f64,
    pub heater: bool,
    pub heater_length: f64,
    pub mt: Option<MetalTemplate>,
}
impl Default for MachZehnderSwitchDC1x2 {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            mmi1x2_length: 0.,
            mmi1x2_width: 0.,
            dc_length: 0.,
            dc_gap: 0.,
            angle: PI / 6.,
            mmi1x2_taper_width: None,
            mmi1x2_taper_length: 20.,
            mmi1x2_wg_sep: None,
            arm1: 0.,
            arm2: 0.,
            heater: false,
            heater_length: 400.,
            mt: None,
        }
    }
}
impl MachZehnderSwitchDC1x2 {
    pub fn new(wgt: WaveguideTemplate, mmi1x2_length: f64, mmi1x2_width: f64, dc_length: f64, dc_gap: f64) -> Self {
        Self {
            wgt,
            mmi1x2_length,
            mmi1x2_width,
            dc_length,
            dc_gap,
            ..Default::default()
        }
    }
    fn splitter(&self) -> Mmi1x2 {
        Mmi1x2 {
            wgt: self.wgt.clone(),
            length: self.mmi1x2_length,
            width: self.mmi1x2_width,
            angle: self.angle,
            taper_width: self.mmi1x2_taper_width,
            taper_length: self.mmi1x2_taper_length,
            wg_sep: self.mmi1x2_wg_sep,
        }
    }
    fn combiner(&self) -> DirectionalCoupler {
        DirectionalCoupler {
            angle: self.angle,
            ..DirectionalCoupler::new(self.wgt.clone(), self.dc_length, self.dc_gap)
        }
    }
    /// Distance from input to outputs
    pub fn total_length(&self) -> f64 {
        self.splitter().total_length() + self.combiner().total_length() + 4. * self.wgt.bend_radius
    }
}
impl Component for MachZehnderSwitchDC1x2 {
    fn kind(&self) -> &'static str {
        "mach_zehnder_switch_dc_1x2"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_angle(self.angle)?;
        let arms = Arms::new(self.arm1, self.arm2, self.heater, self.heater_length, &self.mt)?;
        let (splitter, combiner) = (self.splitter(), self.combiner());
        let total = self.total_length();
        let half_sep = combiner.port_separation() / 2.;
        let mut layout = Layout::default();

        let split = lib.place(&mut layout, &splitter, Placement::default())?;
        let combine = lib.place(
            &mut layout,
            &combiner,
            Placement::new((total, -half_sep), Direction::WEST),
        )?;
        let mut ports = Portlist::new()
            .with("input", Port::new(Point::origin(), Direction::WEST))
            .with("output_top", *combine.get("input_bot")?)
            .with("output_bot", *combine.get("input_top")?);
        arms.draw(
            lib,
            &mut layout,
            &wgt,
            (split.get("output_top")?.port, split.get("output_bot")?.port),
            (combine.get("output_bot")?.port.y, combine.get("output_top")?.port.y),
            &mut ports,
        )?;
        Ok(Built { layout, ports })
    }
}

/// # Mach-Zehnder 2x2 Switch
///
/// Two [DirectionalCoupler]s. The top input and top output share the x-axis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MachZehnderSwitchDC2x2 {
    pub wgt: WaveguideTemplate,
    pub dc1_length: f64,
    pub dc1_gap: f64,
    pub dc2_length: f64,
    pub dc2_gap: f64,
    pub angle: f64,
    pub arm1: f64,
    pub arm2: f64,
    pub heater: bool,
    pub heater_length: f64,
    pub mt: Option<MetalTemplate>,
}
impl Default for MachZehnderSwitchDC2x2 {
    fn default() -> Self {
        Self {
            wgt: WaveguideTemplate::default(),
            dc1_length: 0.,
            dc1_gap: 0.,
            dc2_length: 0.,
            dc2_gap: 0.,
            angle: PI / 6.,
            arm1: 0.,
            arm2: 0.,
            heater: false,
            heater_length: 400.,
            mt: None,
        }
    }
}
impl MachZehnderSwitchDC2x2 {
    pub fn new(wgt: WaveguideTemplate, dc1_length: f64, dc1_gap: f64, dc2_length: f64, dc2_gap: f64) -> Self {
        Self {
            wgt,
            dc1_length,
            dc1_gap,
            dc2_length,
            dc2_gap,
            ..Default::default()
        }
    }
    fn coupler(&self, length: f64, gap: f64) -> DirectionalCoupler {
        DirectionalCoupler {
            angle: self.angle,
            ..DirectionalCoupler::new(self.wgt.clone(), length, gap)
        }
    }
    fn splitter(&self) -> DirectionalCoupler {
        self.coupler(self.dc1_length, self.dc1_gap)
    }
    fn combiner(&self) -> DirectionalCoupler {
        self.coupler(self.dc2_length, self.dc2_gap)
    }
    /// Distance from inputs to outputs
    pub fn total_length(&self) -> f64 {
        self.splitter().total_length() + self.combiner().total_length() + 4. * self.wgt.bend_radius
    }
}
impl Component for MachZehnderSwitchDC2x2 {
    fn kind(&self) -> &'static str {
        "mach_zehnder_switch_dc_2x2"
    }
    fn build(&self, lib: &mut Library) -> PicResult<Built> {
        let wgt = self.wgt.resolve()?;
        check_angle(self.angle)?;
        let arms = Arms::new(self.arm1, self.arm2, self.heater, self.heater_length, &self.mt)?;
        let (splitter, combiner) = (self.splitter(), self.combiner());
        let total = self.total_length();
        let mut layout = Layout::default();

        let split = lib.place(&mut layout, &splitter, Placement::default())?;
        let combine = lib.place(
            &mut layout,
            &combiner,
            Placement::new((total, -combiner.port_separation()), Direction::WEST),
        )?;
        let mut ports = Portlist::new()
            .with("input_top", *split.get("input_top")?)
            .with("input_bot", *split.get("input_bot")?)
            .with("output_top", *combine.get("input_bot")?)
            .with("output_bot", *combine.get("input_top")?);
        arms.draw(
            lib,
            &mut layout,
            &wgt,
            (split.get("output_top")?.port, split.get("output_bot")?.port),
            (combine.get("output_bot")?.port.y, combine.get("output_top")?.port.y),
            &mut ports,
        )?;
        Ok(Built { layout, ports })
    }
}

fn check_angle(angle: f64) -> PicResult<()> {
    if !(0. ..=FRAC_PI_2).contains(&angle) {
        return PicError::invalid(format!(
            "Improper angle ({}), must lie within [0, pi/2]",
            angle
        ));
    }
    Ok(())
}

/// Interferometer arms, and their optional heaters
struct Arms<'a> {
    arm1: f64,
    arm2: f64,
    /// Heated length, zero without heaters
    heater_length: f64,
    heater: Option<&'a MetalTemplate>,
}
impl<'a> Arms<'a> {
    fn new(
        arm1: f64,
        arm2: f64,
        heater: bool,
        heater_length: f64,
        mt: &'a Option<MetalTemplate>,
    ) -> PicResult<Self> {
        if arm1 < 0. || arm2 < 0. {
            return PicError::invalid(format!(
                "Arm lengths must be non-negative, got {} and {}",
                arm1, arm2
            ));
        }
        let (heater_length, heater) = match (heater, mt) {
            (false, _) => (0., None),
            (true, Some(mt)) => (heater_length, Some(mt)),
            (true, None) => return PicError::invalid("Heaters require a metal template `mt`"),
        };
        Ok(Self {
            arm1,
            arm2,
            heater_length,
            heater,
        })
    }
    /// Route both arms from the splitter outputs `starts` to the combiner at heights `ends`,
    /// adding heaters and their ports if enabled.
    fn draw(
        &self,
        lib: &mut Library,
        layout: &mut Layout,
        wgt: &WaveguideTemplate,
        starts: (Point, Point),
        ends: (f64, f64),
        ports: &mut Portlist,
    ) -> PicResult<()> {
        let r = wgt.bend_radius;
        let ((top, bot), (top_end, bot_end)) = (starts, ends);
        for (start, end, extra, side) in [(top, top_end, self.arm1, 1.), (bot, bot_end, self.arm2, -1.)] {
            let peak = start.y + side * (2. * r + extra / 2. + self.heater_length / 2.);
            let trace = vec![
                start,
                Point::new(start.x + r, start.y),
                Point::new(start.x + r, peak),
                Point::new(start.x + 3. * r, peak),
                Point::new(start.x + 3. * r, end),
                Point::new(start.x + 4. * r, end),
            ];
            lib.place(layout, &Waveguide::new(trace, wgt.clone()), Placement::default())?;
        }
        let mt = match self.heater {
            Some(mt) => mt,
            None => return Ok(()),
        };
        let x = top.x;
        for (start, extra, side, name) in [(top, self.arm1, 1., "heater_top"), (bot, self.arm2, -1., "heater_bot")] {
            let base = start.y + side * (extra / 2. + r);
            let peak = start.y + side * (2. * r + extra / 2. + self.heater_length / 2.);
            let trace = vec![
                Point::new(x + r, base),
                Point::new(x + r, peak),
                Point::new(x + 3. * r, peak),
                Point::new(x + 3. * r, base),
            ];
            lib.place(layout, &MetalRoute::new(trace, mt.clone()), Placement::default())?;
            let y = base + side * mt.width / 2.;
            ports.insert(format!("{}_in", name), Port::new((x + r, y), Direction::WEST));
            ports.insert(format!("{}_out", name), Port::new((x + 3. * r, y), Direction::EAST));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn balanced_mzi() -> PicResult<()> {
        let mzi = MachZehnder::new(WaveguideTemplate::default(), 50., 10.);
        let mut lib = Library::new("mzi");
        let built = mzi.build(&mut lib)?;
        // Both MMIs share a single cell
        assert_eq!(built.layout.insts.len(), 4);
        assert_eq!(lib.cells.len(), 3);
        let total = 2. * (50. + 100. * (PI / 6.).sin() + 20.) + 200.;
        let output = built.ports.get("output")?;
        assert_abs_diff_eq!(output.port.x, total, epsilon = 1e-9);
        assert_eq!(output.direction, Direction::EAST);
        assert!(built.ports.get("heater_top_in").is_err());
        // Symmetric arms
        let bbox = built.layout.bbox()?;
        assert_abs_diff_eq!(bbox.p1.y, -bbox.p0.y, epsilon = 1e-6);
        Ok(())
    }
    #[test]
    fn heated_mzi() -> PicResult<()> {
        let mzi = MachZehnder {
            heater: true,
            arm1: 20.,
            ..MachZehnder::new(WaveguideTemplate::default(), 50., 10.)
        };
        assert!(mzi.build(&mut Library::default()).is_err());

        let mzi = MachZehnder {
            mt: Some(MetalTemplate::default()),
            ..mzi
        };
        let mut lib = Library::default();
        let built = mzi.build(&mut lib)?;
        assert_eq!(built.layout.insts.len(), 6);
        let top_in = built.ports.get("heater_top_in")?;
        let top_out = built.ports.get("heater_top_out")?;
        assert_eq!(top_in.direction, Direction::WEST);
        assert_eq!(top_out.direction, Direction::EAST);
        assert_abs_diff_eq!(top_out.port.x - top_in.port.x, 100., epsilon = 1e-9);
        let y0 = mzi.mmi().wg_sep() / 2. + 100. * (1. - (PI / 6.).cos());
        assert_abs_diff_eq!(top_in.port.y, y0 + 10. + 50. + 10., epsilon = 1e-9);
        let bot_in = built.ports.get("heater_bot_in")?;
        assert_abs_diff_eq!(bot_in.port.y, -y0 - 50. - 10., epsilon = 1e-9);
        Ok(())
    }
    #[test]
    fn switch() -> PicResult<()> {
        let sw = MachZehnderSwitch1x2::new(WaveguideTemplate::default(), 50., 10., 100., 9.);
        let built = sw.build(&mut Library::default())?;
        let top = built.ports.get("output_top")?;
        let bot = built.ports.get("output_bot")?;
        let dy = 100. * (1. - (PI / 6.).cos());
        assert_abs_diff_eq!(top.port.x, sw.total_length(), epsilon = 1e-9);
        assert_abs_diff_eq!(top.port.y, 1.5 + dy, epsilon = 1e-9);
        assert_abs_diff_eq!(bot.port.y, -1.5 - dy, epsilon = 1e-9);
        assert_eq!(top.direction, Direction::EAST);
        assert_eq!(bot.direction, Direction::EAST);
        Ok(())
    }
    #[test]
    fn dc_switch_1x2() -> PicResult<()> {
        let sw = MachZehnderSwitchDC1x2::new(WaveguideTemplate::default(), 50., 10., 30., 0.5);
        let mut lib = Library::default();
        let built = sw.build(&mut lib)?;
        assert_eq!(built.layout.insts.len(), 4);
        let half_sep = sw.combiner().port_separation() / 2.;
        let top = built.ports.get("output_top")?;
        let bot = built.ports.get("output_bot")?;
        assert_abs_diff_eq!(top.port.x, sw.total_length(), epsilon = 1e-9);
        assert_abs_diff_eq!(top.port.y, half_sep, epsilon = 1e-9);
        assert_abs_diff_eq!(bot.port.y, -half_sep, epsilon = 1e-9);
        assert_eq!(bot.direction, Direction::EAST);

        let flat = MachZehnderSwitchDC1x2 { angle: 0., ..sw };
        assert!(flat.build(&mut Library::default()).is_err());
        Ok(())
    }
    #[test]
    fn dc_switch_2x2() -> PicResult<()> {
        let sw = MachZehnderSwitchDC2x2 {
            heater: true,
            mt: Some(MetalTemplate::default()),
            ..MachZehnderSwitchDC2x2::new(WaveguideTemplate::default(), 20., 0.5, 30., 0.4)
        };
        let built = sw.build(&mut Library::default())?;
        assert_eq!(built.layout.insts.len(), 6);
        let total = sw.total_length();
        let input_bot = built.ports.get("input_bot")?;
        assert_abs_diff_eq!(input_bot.port.y, -sw.splitter().port_separation(), epsilon = 1e-9);
        assert_eq!(input_bot.direction, Direction::WEST);
        let top = built.ports.get("output_top")?;
        assert_abs_diff_eq!(top.port.x, total, epsilon = 1e-9);
        assert_abs_diff_eq!(top.port.y, 0., epsilon = 1e-9);
        let bot = built.ports.get("output_bot")?;
        assert_abs_diff_eq!(bot.port.y, -sw.combiner().port_separation(), epsilon = 1e-9);
        // Heaters start one bend past the splitter
        let heater = built.ports.get("heater_top_in")?;
        assert_abs_diff_eq!(heater.port.x, sw.splitter().total_length() + 50., epsilon = 1e-9);
        assert_eq!(built.ports.len(), 8);
        Ok(())
    }
}
