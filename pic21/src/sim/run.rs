//!
//! # Solver Invocation
//!
//! Command builders for the MPB mode solver (`mcm.py`) and the MEEP transmission
//! simulator (`mcts.py`), and the parsing of their flux output into spectra.
//!

// Std-Lib
use std::f64::consts::PI;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

// Local imports
use super::export::{
    default_operations, export_component, export_waveguide_cross_section, LayerOperation,
};
use super::stack::MaterialStack;
use crate::component::Placement;
use crate::components::Waveguide;
use crate::data::{Cell, Layout, Library};
use crate::dir::{Cardinal, Direction};
use crate::error::{PicError, PicResult};
use crate::geom::Point;
use crate::port::Port;
use crate::template::WaveguideTemplate;
use crate::utils::{enumstr, Ptr, SerdeFile, SerializationFormat};

/// Tolerance on angular port directions
const DIRECTION_TOL: f64 = 1e-6;
/// Line prefix of the flux rows printed by the transmission simulator
const FLUX_PREFIX: &str = "flux1:";

enumstr!(
    /// # Mode Polarization
    /// MPB parities ODD-X, EVEN-X, or none
    #[derive(JsonSchema)]
    Polarization {
        Te: "TE",
        Tm: "TM",
        NoParity: "None",
    }
);

/// Python-style rendering of a boolean argument
fn py_bool(b: bool) -> String {
    match b {
        true => "True".into(),
        false => "False".into(),
    }
}
/// Fixed three-decimal rendering of a float argument
fn f3(x: f64) -> String {
    format!("{:.3}", x)
}

/// Run `cmd`, sending its standard output to file `out`
fn run_to_file(mut cmd: Command, out: &Path, what: &str) -> PicResult<()> {
    if let Some(dir) = out.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(out)?;
    cmd.stdout(Stdio::from(file));
    info!("Running {} (output in {})", what, out.display());
    let start = Instant::now();
    let status = cmd.status()?;
    info!("{} finished in {:.1}s", what, start.elapsed().as_secs_f64());
    if !status.success() {
        return PicError::fail(format!("{} exited with {}", what, status));
    }
    Ok(())
}

/// # Mode Solve
///
/// Eigenmode computation for a waveguide cross-section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ModeSolve {
    /// Pixels per micron
    pub res: u32,
    /// Wavelength, in microns
    pub wavelength: f64,
    pub sx: f64,
    pub sy: f64,
    /// Mode to plot, counting from one
    pub plot_mode_number: usize,
    pub polarization: Polarization,
    pub output_directory: PathBuf,
    /// Base name of the output files
    pub name: String,
    pub save_mode_data: bool,
    pub suppress_window: bool,
    pub python: String,
    pub script: PathBuf,
}
impl Default for ModeSolve {
    fn default() -> Self {
        Self {
            res: 10,
            wavelength: 1.55,
            sx: 0.,
            sy: 0.,
            plot_mode_number: 1,
            polarization: Polarization::Te,
            output_directory: "mpb-sim".into(),
            name: "mcm".into(),
            save_mode_data: true,
            suppress_window: false,
            python: "python".into(),
            script: "mcm.py".into(),
        }
    }
}
impl ModeSolve {
    pub fn new(res: u32, wavelength: f64, sx: f64, sy: f64) -> Self {
        Self {
            res,
            wavelength,
            sx,
            sy,
            ..Default::default()
        }
    }
    /// Path of the exported cross-section
    pub fn epsilon_file(&self) -> PathBuf {
        self.output_directory.join("epsilon.json")
    }
    /// Path of the captured solver output
    pub fn output_file(&self) -> PathBuf {
        self.output_directory
            .join(format!("{}-res{}.out", self.name, self.res))
    }
    /// Solver arguments, following the script name
    pub fn args(&self) -> Vec<String> {
        vec![
            "-res".into(),
            self.res.to_string(),
            "-wavelength".into(),
            f3(self.wavelength),
            "-sx".into(),
            f3(self.sx),
            "-sy".into(),
            f3(self.sy),
            "-plot_mode_number".into(),
            self.plot_mode_number.to_string(),
            "-polarization".into(),
            self.polarization.to_string(),
            "-epsilon_file".into(),
            self.epsilon_file().display().to_string(),
            "-output_directory".into(),
            self.output_directory.display().to_string(),
            "-save_mode_data".into(),
            py_bool(self.save_mode_data),
            "-suppress_window".into(),
            py_bool(self.suppress_window),
        ]
    }
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg(&self.script).args(self.args());
        cmd
    }
    /// Export the cross-section of `wgt`, and run the solver.
    /// Returns the path of its captured output.
    pub fn run(&self, wgt: &WaveguideTemplate, mstack: &MaterialStack) -> PicResult<PathBuf> {
        if self.plot_mode_number == 0 {
            return PicError::invalid("plot_mode_number counts from one");
        }
        std::fs::create_dir_all(&self.output_directory)?;
        let xs = export_waveguide_cross_section(wgt, mstack, self.sx)?;
        xs.save(SerializationFormat::Json, self.epsilon_file())?;
        let out = self.output_file();
        run_to_file(self.command(), &out, "MPB mode solve")?;
        Ok(out)
    }
}

/// # Transmission Simulation
///
/// Flux through each of `ports`, for a mode launched into the first of them.
/// All ports must face EAST or WEST.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TransmissionSim {
    pub ports: Vec<Port>,
    /// Vertical center of the flux planes
    pub port_vcenter: f64,
    pub port_height: f64,
    pub port_width: f64,
    pub res: u32,
    /// Center wavelength, in microns
    pub wl_center: f64,
    /// Wavelength span, setting the pulse width
    pub wl_span: f64,
    /// Layer operations, by default those of [default_operations]
    pub boolean_operations: Option<Vec<LayerOperation>>,
    /// Run the straight-waveguide normalization first
    pub norm: bool,
    pub input_pol: Polarization,
    pub nfreq: usize,
    pub dpml: f64,
    /// Write field snapshots
    pub fields: bool,
    /// Distance between the reflection monitor and the source
    pub source_offset: f64,
    /// Skip the component simulation, reusing earlier output
    pub skip_sim: bool,
    pub output_directory: PathBuf,
    /// Base name of the output files
    pub name: String,
    /// Number of MPI processes, if run in parallel
    pub parallel: Option<usize>,
    pub python: String,
    pub script: PathBuf,
}
impl Default for TransmissionSim {
    fn default() -> Self {
        Self {
            ports: Vec::new(),
            port_vcenter: 0.,
            port_height: 0.,
            port_width: 0.,
            res: 10,
            wl_center: 1.55,
            wl_span: 0.3,
            boolean_operations: None,
            norm: false,
            input_pol: Polarization::Te,
            nfreq: 100,
            dpml: 0.5,
            fields: false,
            source_offset: 0.1,
            skip_sim: false,
            output_directory: "meep-sim".into(),
            name: "mcts".into(),
            parallel: None,
            python: "python".into(),
            script: "mcts.py".into(),
        }
    }
}

/// Geometry-dependent arguments of one simulator run
struct Run<'a> {
    eps_file: &'a Path,
    ports: &'a [Port],
    input_direction: i8,
    fields: bool,
    size: (f64, f64, f64),
    center: (f64, f64, f64),
}

impl TransmissionSim {
    pub fn new(ports: Vec<Port>, res: u32, wl_center: f64, wl_span: f64) -> Self {
        Self {
            ports,
            res,
            wl_center,
            wl_span,
            ..Default::default()
        }
    }
    /// Sign of the flux entering through each port: -1 for EAST-facing, +1 for WEST-facing
    pub fn input_directions(&self) -> PicResult<Vec<i8>> {
        if self.ports.is_empty() {
            return PicError::invalid("TransmissionSim requires at least one port");
        }
        self.ports.iter().map(|p| input_direction(&p.direction)).collect()
    }
    /// Path of the captured component-simulation output
    pub fn output_file(&self) -> PathBuf {
        self.output_directory
            .join(format!("{}-res{}.out", self.name, self.res))
    }
    /// Path of the captured normalization output
    pub fn norm_output_file(&self) -> PathBuf {
        self.output_directory
            .join(format!("{}-norm-res{}.out", self.name, self.res))
    }
    fn args(&self, run: &Run) -> Vec<String> {
        let coords: Vec<String> = run
            .ports
            .iter()
            .flat_map(|p| [p.port.x.to_string(), p.port.y.to_string()])
            .collect();
        vec![
            "-fields".into(),
            py_bool(run.fields),
            "-input_pol".into(),
            self.input_pol.to_string(),
            "-output_directory".into(),
            self.output_directory.display().to_string(),
            "-eps_input_file".into(),
            run.eps_file.display().to_string(),
            "-res".into(),
            self.res.to_string(),
            "-nfreq".into(),
            self.nfreq.to_string(),
            "-input_direction".into(),
            run.input_direction.to_string(),
            "-dpml".into(),
            f3(self.dpml),
            "-wl_center".into(),
            f3(self.wl_center),
            "-wl_span".into(),
            f3(self.wl_span),
            "-port_vcenter".into(),
            f3(self.port_vcenter),
            "-port_height".into(),
            f3(self.port_height),
            "-port_width".into(),
            f3(self.port_width),
            "-source_offset".into(),
            f3(self.source_offset),
            "-center_x".into(),
            f3(run.center.0),
            "-center_y".into(),
            f3(run.center.1),
            "-center_z".into(),
            f3(run.center.2),
            "-sx".into(),
            f3(run.size.0),
            "-sy".into(),
            f3(run.size.1),
            "-sz".into(),
            f3(run.size.2),
            "-port_coords".into(),
            coords.join(" "),
        ]
    }
    fn command(&self, run: &Run) -> Command {
        let mut cmd = match self.parallel {
            Some(n) => {
                let mut cmd = Command::new("mpirun");
                cmd.arg("-np").arg(n.to_string()).arg(&self.python);
                cmd
            }
            None => Command::new(&self.python),
        };
        cmd.arg(&self.script).args(self.args(run));
        cmd
    }
    /// Export `cell` and simulate it, preceded by the normalization run if `norm` is set.
    /// Without `norm`, the output of an earlier normalization run is reused.
    pub fn run(
        &self,
        lib: &mut Library,
        cell: &Ptr<Cell>,
        mstack: &MaterialStack,
        wgt: &WaveguideTemplate,
    ) -> PicResult<TransmissionSpectra> {
        let directions = self.input_directions()?;
        let operations = match &self.boolean_operations {
            Some(ops) => ops.clone(),
            None => default_operations(&wgt.resolve()?),
        };
        std::fs::create_dir_all(&self.output_directory)?;

        if self.norm {
            let (norm_cell, norm_ports) = normalization_cell(lib, wgt)?;
            let geom = export_component(&norm_cell, mstack, &operations)?;
            let eps_file = self.output_directory.join("epsilon-norm.json");
            geom.save(SerializationFormat::Json, &eps_file)?;
            let run = Run {
                eps_file: &eps_file,
                ports: &norm_ports,
                input_direction: directions[0],
                fields: false,
                size: geom.size,
                center: geom.center,
            };
            run_to_file(self.command(&run), &self.norm_output_file(), "MEEP normalization")?;
        }

        let geom = export_component(cell, mstack, &operations)?;
        let eps_file = self.output_directory.join("epsilon-component.json");
        geom.save(SerializationFormat::Json, &eps_file)?;
        if !self.skip_sim {
            let run = Run {
                eps_file: &eps_file,
                ports: &self.ports,
                input_direction: directions[0],
                fields: self.fields,
                size: geom.size,
                center: geom.center,
            };
            run_to_file(self.command(&run), &self.output_file(), "MEEP simulation")?;
        }

        let norm = parse_flux(&std::fs::read_to_string(self.norm_output_file())?)?;
        let comp = parse_flux(&std::fs::read_to_string(self.output_file())?)?;
        let spectra = TransmissionSpectra::from_flux(&norm, &comp, &directions)?;
        spectra.save(
            SerializationFormat::Json,
            self.output_directory
                .join(format!("{}-res{}.json", self.name, self.res)),
        )?;
        Ok(spectra)
    }
}

/// Flux sign for a port facing `dir`
fn input_direction(dir: &Direction) -> PicResult<i8> {
    match dir {
        Direction::Cardinal(Cardinal::East) => Ok(-1),
        Direction::Cardinal(Cardinal::West) => Ok(1),
        Direction::Angle(a) if a.abs() < DIRECTION_TOL => Ok(-1),
        Direction::Angle(a) if (a - PI).abs() < DIRECTION_TOL => Ok(1),
        _ => PicError::invalid(format!(
            "Transmission ports must face EAST or WEST (0 or pi), got {:?}",
            dir
        )),
    }
}

/// Three one-micron straight waveguides, end to end.
/// Returns the cell and the ports of the middle waveguide.
pub fn normalization_cell(lib: &mut Library, wgt: &WaveguideTemplate) -> PicResult<(Ptr<Cell>, Vec<Port>)> {
    let name = lib.unique_name("norm_straightwg");
    let mut layout = Layout::new(name);
    let mut middle = Vec::new();
    for k in 0..3 {
        let x = k as f64;
        let wg = Waveguide::new(vec![Point::new(x, 0.), Point::new(x + 1., 0.)], wgt.clone());
        let ports = lib.place(&mut layout, &wg, Placement::default())?;
        if k == 1 {
            middle = vec![*ports.get("input")?, *ports.get("output")?];
        }
    }
    Ok((lib.add_cell(layout), middle))
}

/// Parse the `flux1:` rows of simulator output.
/// Each row is the frequency followed by the flux through each plane.
pub fn parse_flux(text: &str) -> PicResult<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if !line.starts_with(FLUX_PREFIX) {
            continue;
        }
        let row = line
            .split(',')
            .skip(1)
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PicError::msg(format!("Invalid flux row `{}`: {}", line, e)))?;
        rows.push(row);
    }
    Ok(rows)
}

/// # Transmission Spectra
///
/// Per-port transmission against wavelength, normalized to a straight waveguide.
/// Port zero holds the reflection back into the input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TransmissionSpectra {
    /// Wavelengths, in microns
    pub wavelength: Vec<f64>,
    /// One spectrum per port
    pub ports: Vec<Vec<f64>>,
}
impl TransmissionSpectra {
    /// Combine the normalization run `norm` and component run `comp`.
    ///
    /// Normalization rows hold frequency, reflected flux (negated) and transmitted flux.
    /// Component rows hold frequency and the flux through each port's plane.
    pub fn from_flux(norm: &[Vec<f64>], comp: &[Vec<f64>], input_directions: &[i8]) -> PicResult<Self> {
        let nports = input_directions.len();
        if nports == 0 {
            return PicError::invalid("No ports to compute spectra for");
        }
        if norm.len() != comp.len() {
            return PicError::invalid(format!(
                "Normalization and component runs have {} and {} frequencies",
                norm.len(),
                comp.len()
            ));
        }
        let mut spectra = Self {
            wavelength: Vec::with_capacity(norm.len()),
            ports: vec![Vec::with_capacity(norm.len()); nports],
        };
        for (n, c) in norm.iter().zip(comp.iter()) {
            if n.len() < 3 || c.len() < nports + 1 {
                return PicError::invalid(format!(
                    "Flux rows too short for {} ports: {:?}, {:?}",
                    nports, n, c
                ));
            }
            let (freq, refl0, trans0) = (n[0], -n[1], n[2]);
            spectra.wavelength.push(1. / freq);
            for (i, dir) in input_directions.iter().enumerate() {
                let flux = -(*dir as f64) * c[i + 1];
                let t = match i {
                    0 => (flux - refl0) / trans0,
                    _ => flux / trans0,
                };
                spectra.ports[i].push(t);
            }
        }
        Ok(spectra)
    }
}
impl SerdeFile for TransmissionSpectra {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn directions() -> PicResult<()> {
        let sim = TransmissionSim::new(
            vec![
                Port::new((0., 0.), Direction::WEST),
                Port::new((10., 0.), Direction::EAST),
                Port::new((10., 5.), Direction::Angle(PI)),
            ],
            20,
            1.55,
            0.3,
        );
        assert_eq!(sim.input_directions()?, vec![1, -1, 1]);
        let bad = TransmissionSim {
            ports: vec![Port::new((0., 0.), Direction::NORTH)],
            ..Default::default()
        };
        assert!(bad.input_directions().is_err());
        Ok(())
    }
    #[test]
    fn commands() {
        let mode = ModeSolve::new(20, 1.55, 3., 2.);
        let args = mode.args();
        assert_eq!(&args[..4], &["-res", "20", "-wavelength", "1.550"]);
        assert!(args.contains(&"True".to_string()));
        assert_eq!(mode.output_file(), PathBuf::from("mpb-sim/mcm-res20.out"));

        let sim = TransmissionSim {
            parallel: Some(4),
            ..TransmissionSim::new(vec![Port::new((0., 0.), Direction::WEST)], 20, 1.55, 0.3)
        };
        let run = Run {
            eps_file: Path::new("eps.json"),
            ports: &sim.ports,
            input_direction: 1,
            fields: false,
            size: (3., 1.5, 22.),
            center: (1.5, 0., 0.),
        };
        let cmd = sim.command(&run);
        assert_eq!(cmd.get_program(), "mpirun");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(&args[..4], &["-np", "4", "python", "mcts.py"]);
        let coords = args.iter().position(|a| a == "-port_coords").map(|i| args[i + 1].clone());
        assert_eq!(coords, Some("0 0".to_string()));
        assert_eq!(sim.norm_output_file(), PathBuf::from("meep-sim/mcts-norm-res20.out"));
    }
    #[test]
    fn spectra() -> PicResult<()> {
        let norm = parse_flux(
            "
            meep: some banner
            flux1:, 0.5, -0.1, 0.8
            flux1:, 0.625, -0.2, 0.5
            ",
        )?;
        let comp = parse_flux("flux1:, 0.5, -0.3, -0.4\nflux1:, 0.625, -0.2, -0.25\n")?;
        assert_eq!(norm.len(), 2);
        let spectra = TransmissionSpectra::from_flux(&norm, &comp, &[1, -1])?;
        assert_abs_diff_eq!(spectra.wavelength[0], 2.);
        assert_abs_diff_eq!(spectra.wavelength[1], 1.6);
        // Port zero: (0.3 - 0.1) / 0.8
        assert_abs_diff_eq!(spectra.ports[0][0], 0.25, epsilon = 1e-12);
        // Port one: -0.4 / 0.8
        assert_abs_diff_eq!(spectra.ports[1][0], -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(spectra.ports[1][1], -0.5, epsilon = 1e-12);

        assert!(TransmissionSpectra::from_flux(&norm, &comp[..1], &[1, -1]).is_err());
        assert!(parse_flux("flux1:, 0.5, nan-ish").is_err());
        Ok(())
    }
    #[test]
    fn normalization() -> PicResult<()> {
        let mut lib = Library::new("norm");
        let (cell, ports) = normalization_cell(&mut lib, &WaveguideTemplate::default())?;
        assert_eq!(ports[0].port, Point::new(1., 0.));
        assert_eq!(ports[1].port, Point::new(2., 0.));
        assert_eq!(ports[1].direction, Direction::EAST);
        assert_eq!(cell.read()?.layout.insts.len(), 3);
        Ok(())
    }
}
