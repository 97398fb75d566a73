//!
//! # Strip-to-Slot Mode Converters
//!
//! Each converter is drawn from its strip side, at the origin, to its slot side.
//! A converter whose input is the slot waveguide is rotated by a half-turn about its center,
//! so that its input still sits at the origin and its output on the positive x-axis.
//!
//! The `*Coupler` names are aliases kept for designs written against them.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::component::{Built, Component};
use crate::data::{Layout, Library};
use crate::dir::Direction;
use crate::error::{PicError, PicResult};
use crate::geom::{Point, Polygon};
use crate::port::{Port, Portlist};
use crate::template::{WaveguideTemplate, WgType};

pub type StripSlotCoupler = StripSlotConverter;
pub type StripSlotMmiCoupler = StripSlotMmiConverter;
pub type StripSlotYCoupler = StripSlotYConverter;

/// Polygon over `x0..x1`, whose (lower, upper) edges run linearly from `start` to `end`
fn quad(x0: f64, x1: f64, start: (f64, f64), end: (f64, f64)) -> Polygon {
    Polygon::new(vec![
        Point::new(x0, start.0),
        Point::new(x1, end.0),
        Point::new(x1, end.1),
        Point::new(x0, start.1),
    ])
}
/// Pair of bounds symmetric about the x-axis
fn sym(half: f64) -> (f64, f64) {
    (-half, half)
}

/// Resolved strip and slot sides of a converter
struct Sides {
    strip: WaveguideTemplate,
    slot: WaveguideTemplate,
    /// Source of the drawn layers
    output: WaveguideTemplate,
    strip_input: bool,
}
impl Sides {
    fn new(input: &WaveguideTemplate, output: &WaveguideTemplate, input_strip: Option<bool>) -> PicResult<Self> {
        let (input, output) = (input.resolve()?, output.resolve()?);
        let strip_input = input_strip.unwrap_or(matches!(input.wg_type, WgType::Strip | WgType::Swg));
        let (strip, slot) = match strip_input {
            true => (input, output.clone()),
            false => (output.clone(), input),
        };
        if !(slot.slot > 0.) || !(slot.rail() > 0.) {
            return PicError::invalid(format!(
                "Slot side requires a positive slot and rail width, got {} and {}",
                slot.slot,
                slot.rail()
            ));
        }
        Ok(Self {
            strip,
            slot,
            output,
            strip_input,
        })
    }
    /// Add the `core` polygons and a cladding taper for each cladding layer,
    /// rotated to suit the input side.
    fn draw(&self, length: f64, core: Vec<Polygon>) -> Layout {
        let mut shapes: Vec<_> = core.into_iter().map(|p| (self.output.wg_layer, p)).collect();
        let stacks = self.strip.stack().into_iter().zip(self.slot.stack()).zip(self.output.stack());
        for (((strip_w, _), (slot_w, _)), (_, layer)) in stacks.skip(1) {
            shapes.push((layer, quad(0., length, sym(strip_w / 2.), sym(slot_w / 2.))));
        }
        let mut layout = Layout::default();
        for (layer, poly) in shapes {
            let poly = match self.strip_input {
                true => poly,
                false => Polygon::new(
                    poly.points
                        .iter()
                        .map(|p| Point::new(length - p.x, -p.y))
                        .collect::<Vec<_>>(),
                ),
            };
            layout.add(layer, poly);
        }
        layout
    }
}
fn ports(length: f64) -> Portlist {
    Portlist::new()
        .with("input", Port::new(Point::origin(), Direction::WEST))
        .with("output", Port::new((length, 0.), Direction::EAST))
}
fn check_lengths(name: &str, lengths: &[f64]) -> PicResult<()> {
    if lengths.iter().any(|l| !(*l > 0.)) {
        return PicError::invalid(format!("{} lengths must be positive, got {:?}", name, lengths));
    }
    Ok(())
}

/// # Strip-to-Slot Side Converter
///
/// The first section, `length1` long, brings a narrow rail alongside the strip,
/// closing the gap from `d` down to the slot width while the strip narrows to `end_strip_width`.
/// The second, `length2` long, reshapes both into the slot waveguide's rails.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StripSlotConverter {
    pub wgt_input: WaveguideTemplate,
    pub wgt_output: WaveguideTemplate,
    pub length1: f64,
    pub length2: f64,
    pub start_rail_width: f64,
    pub end_strip_width: f64,
    pub d: f64,
    /// Whether the input is the strip side.
    /// Defaults to whether the input template is a strip or sub-wavelength grating.
    pub input_strip: Option<bool>,
}
impl StripSlotConverter {
    pub fn total_length(&self) -> f64 {
        self.length1 + self.length2
    }
}
impl Component for StripSlotConverter {
    fn kind(&self) -> &'static str {
        "strip_slot_converter"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        check_lengths("StripSlotConverter", &[self.length1, self.length2])?;
        if !(self.start_rail_width > 0.) || !(self.end_strip_width > 0.) || self.d < 0. {
            return PicError::invalid(format!(
                "StripSlotConverter requires positive rail and strip widths and a non-negative gap, got {}, {} and {}",
                self.start_rail_width, self.end_strip_width, self.d
            ));
        }
        let sides = Sides::new(&self.wgt_input, &self.wgt_output, self.input_strip)?;
        let (l1, l) = (self.length1, self.total_length());
        let half = sides.strip.wg_width / 2.;
        let (w_slot, s, rail) = (sides.slot.wg_width, sides.slot.slot, sides.slot.rail());
        let (rw, esw, d) = (self.start_rail_width, self.end_strip_width, self.d);

        // Strip, and the rail alongside it, where the first section ends
        let strip_end = (-half, -half + esw);
        let side_end = (-half + esw + s, -half + esw + s + rw);
        let core = vec![
            quad(0., l1, sym(half), strip_end),
            quad(0., l1, (half + d, half + d + rw), side_end),
            quad(l1, l, strip_end, (-w_slot / 2., -w_slot / 2. + rail)),
            quad(l1, l, side_end, (w_slot / 2. - rail, w_slot / 2.)),
        ];
        let layout = sides.draw(l, core);
        Ok(Built {
            layout,
            ports: ports(l),
        })
    }
}

/// # Strip-to-Slot MMI Converter
///
/// The strip feeds a multi-mode section `w_mmi` wide and `l_mmi` long,
/// which splits into two rails tapering into the slot waveguide over the rest of `length`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StripSlotMmiConverter {
    pub wgt_input: WaveguideTemplate,
    pub wgt_output: WaveguideTemplate,
    pub w_mmi: f64,
    pub l_mmi: f64,
    pub length: f64,
    pub input_strip: Option<bool>,
}
impl Component for StripSlotMmiConverter {
    fn kind(&self) -> &'static str {
        "strip_slot_mmi_converter"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        check_lengths("StripSlotMmiConverter", &[self.l_mmi, self.length - self.l_mmi])?;
        let sides = Sides::new(&self.wgt_input, &self.wgt_output, self.input_strip)?;
        let (s, w_slot) = (sides.slot.slot, sides.slot.wg_width);
        if self.w_mmi <= s {
            return PicError::invalid(format!(
                "StripSlotMmiConverter w_mmi ({}) must exceed the slot width ({})",
                self.w_mmi, s
            ));
        }
        let (lm, l) = (self.l_mmi, self.length);
        let mut core = vec![quad(0., lm, sym(self.w_mmi / 2.), sym(self.w_mmi / 2.))];
        for side in [1., -1.] {
            let rail = |outer: f64| match side > 0. {
                true => (s / 2., outer),
                false => (-outer, -s / 2.),
            };
            core.push(quad(lm, l, rail(self.w_mmi / 2.), rail(w_slot / 2.)));
        }
        let layout = sides.draw(l, core);
        Ok(Built { layout, ports: ports(l) })
    }
}

/// # Strip-to-Slot Y Converter
///
/// The strip tapers down to `end_strip_width` while the slot's two rails
/// open away from it, `d` clear of the strip at its start, tapering down to `end_slot_width`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StripSlotYConverter {
    pub wgt_input: WaveguideTemplate,
    pub wgt_output: WaveguideTemplate,
    pub length: f64,
    pub d: f64,
    pub end_strip_width: f64,
    pub end_slot_width: f64,
    pub input_strip: Option<bool>,
}
impl Component for StripSlotYConverter {
    fn kind(&self) -> &'static str {
        "strip_slot_y_converter"
    }
    fn build(&self, _lib: &mut Library) -> PicResult<Built> {
        check_lengths("StripSlotYConverter", &[self.length])?;
        if self.d < 0. || self.end_strip_width < 0. || self.end_slot_width < 0. {
            return PicError::invalid("StripSlotYConverter gap and end widths must be non-negative");
        }
        let sides = Sides::new(&self.wgt_input, &self.wgt_output, self.input_strip)?;
        let l = self.length;
        let half = sides.strip.wg_width / 2.;
        let (rail, center) = (sides.slot.rail(), sides.slot.rail_dist() / 2.);
        let esl = self.end_slot_width;

        let mut core = vec![quad(0., l, sym(half), sym(self.end_strip_width / 2.))];
        let upper = (half + self.d, half + self.d + esl);
        let slot_end = (center - rail / 2., center + rail / 2.);
        core.push(quad(0., l, upper, slot_end));
        core.push(quad(0., l, (-upper.1, -upper.0), (-slot_end.1, -slot_end.0)));
        let layout = sides.draw(l, core);
        Ok(Built { layout, ports: ports(l) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::ShapeTrait;
    use approx::assert_abs_diff_eq;

    fn strip() -> WaveguideTemplate {
        WaveguideTemplate {
            wg_width: 0.5,
            clad_width: 3.,
            ..Default::default()
        }
    }
    fn slot() -> WaveguideTemplate {
        WaveguideTemplate {
            wg_type: WgType::Slot,
            slot: 0.1,
            ..strip()
        }
    }
    fn core_at(layout: &Layout, x: f64, y: f64) -> bool {
        let pt = Point::new(x, y);
        layout
            .elems
            .iter()
            .filter(|e| e.layer == strip().wg_layer)
            .any(|e| e.inner.contains(&pt))
    }

    #[test]
    fn side_converter() -> PicResult<()> {
        let conv = StripSlotConverter {
            wgt_input: strip(),
            wgt_output: slot(),
            length1: 10.,
            length2: 5.,
            start_rail_width: 0.1,
            end_strip_width: 0.3,
            d: 0.3,
            input_strip: None,
        };
        let built = conv.build(&mut Library::default())?;
        assert_abs_diff_eq!(built.ports.get("output")?.port.x, 15., epsilon = 1e-12);
        let layout = &built.layout;
        // Strip, the side rail, and the gap between them
        assert!(core_at(layout, 5., 0.));
        assert!(core_at(layout, 5., 0.4));
        assert!(!core_at(layout, 5., 0.25));
        // Slot rails either side of the slot
        assert!(core_at(layout, 14.99, 0.15));
        assert!(core_at(layout, 14.99, -0.15));
        assert!(!core_at(layout, 14.99, 0.));
        // Four core pieces, one cladding
        assert_eq!(layout.elems.len(), 5);

        // Slot input: the same converter, turned about its center
        let back = StripSlotCoupler {
            wgt_input: slot(),
            wgt_output: strip(),
            ..conv
        };
        let built = back.build(&mut Library::default())?;
        let layout = &built.layout;
        assert!(core_at(layout, 0.01, 0.15));
        assert!(!core_at(layout, 0.01, 0.));
        assert!(core_at(layout, 10., -0.4));
        assert!(core_at(layout, 14.99, 0.));
        Ok(())
    }
    #[test]
    fn mmi_converter() -> PicResult<()> {
        let conv = StripSlotMmiConverter {
            wgt_input: strip(),
            wgt_output: slot(),
            w_mmi: 1.2,
            l_mmi: 1.,
            length: 6.,
            input_strip: None,
        };
        let built = conv.build(&mut Library::default())?;
        let layout = &built.layout;
        assert!(core_at(layout, 0.5, 0.55));
        assert!(!core_at(layout, 3., 0.));
        assert!(core_at(layout, 5.99, 0.2));
        assert!(!core_at(layout, 5.99, 0.3));

        let forced = StripSlotMmiConverter {
            input_strip: Some(false),
            ..conv.clone()
        };
        let built = forced.build(&mut Library::default())?;
        assert!(core_at(&built.layout, 5.5, -0.55));
        assert!(core_at(&built.layout, 0.01, -0.2));

        let narrow = StripSlotMmiConverter { w_mmi: 0.05, ..conv };
        assert!(narrow.build(&mut Library::default()).is_err());
        Ok(())
    }
    #[test]
    fn y_converter() -> PicResult<()> {
        let conv = StripSlotYConverter {
            wgt_input: strip(),
            wgt_output: slot(),
            length: 8.,
            d: 0.2,
            end_strip_width: 0.,
            end_slot_width: 0.1,
            input_strip: None,
        };
        let built = conv.build(&mut Library::default())?;
        let layout = &built.layout;
        // Strip core, then the rails opening beside it
        assert!(core_at(layout, 0.01, 0.));
        assert!(core_at(layout, 0.01, 0.5));
        assert!(core_at(layout, 0.01, -0.5));
        assert!(!core_at(layout, 0.01, 0.35));
        assert!(core_at(layout, 7.99, 0.15));
        assert_eq!(built.ports.len(), 2);

        let flat = WaveguideTemplate { slot: 0., ..slot() };
        let bad = StripSlotYConverter {
            wgt_output: flat,
            ..conv
        };
        assert!(bad.build(&mut Library::default()).is_err());
        Ok(())
    }
}
