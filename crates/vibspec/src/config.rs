//! Configuration settings for a spectroscopy job

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    AnharmonicType, Constants, SpectroError,
    specs::{SpectroscopyType, Specifications},
    utils::read_file,
};

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// The response tensor file holding the Hessian and any other property
    /// derivatives. Relative paths are resolved against the directory of the
    /// job file.
    tensor_file: PathBuf,

    /// The molecule file, either a Dalton-style `.mol` file or an XYZ file.
    /// Relative paths are resolved like `tensor_file`.
    molecule_file: PathBuf,

    /// The intensities to compute. Any subset of "IR", "Raman", and
    /// "Hyper-Raman"; empty by default.
    #[serde(default)]
    spectroscopy: Vec<SpectroscopyType>,

    /// Unit selections such as "Vib modes: 1/cm" or "IR: NIMAC, km/mol". The
    /// vibrational mode unit is required, as is a unit for each requested
    /// spectroscopy.
    specifications: Vec<String>,

    /// "Harmonic" or the name of an anharmonic treatment, like "Anharmonic:
    /// VPT2". Defaults to "Harmonic".
    anharmonic: Option<String>,

    /// Whether to project translations and rotations out of the Hessian.
    /// Defaults to true.
    #[serde(alias = "outproj")]
    project_rot_transl: Option<bool>,

    /// Optional `[min, max]` range in the vibrational mode unit. Modes with
    /// harmonic frequencies outside of it are dropped.
    frequency_limits: Option<[f64; 2]>,

    /// Temperature in K for the Boltzmann population factor of Raman-type
    /// intensities. 0 disables the factor. Defaults to 298.
    temperature: Option<f64>,

    /// Override of the maximum energy difference in cm⁻¹ of a Fermi
    /// resonance.
    fermi_threshold: Option<f64>,

    /// Override of the minimum Martin parameter in cm⁻¹ of a Fermi resonance.
    martin_threshold: Option<f64>,
}

/// Construct a full `Config` using [Config::load] on a TOML file or use
/// [Config::new] and the builder methods
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    pub tensor_file: PathBuf,

    pub molecule_file: PathBuf,

    /// requested intensities, sorted and without duplicates
    pub spectroscopy: Vec<SpectroscopyType>,

    pub specifications: Specifications,

    /// `None` for a purely harmonic calculation
    pub anharmonic: Option<AnharmonicType>,

    pub project_rot_transl: bool,

    /// frequency window in the vibrational mode unit
    pub frequency_limits: Option<(f64, f64)>,

    /// temperature in K
    pub temperature: f64,

    /// Fermi threshold in cm⁻¹, if not the default
    pub fermi_threshold: Option<f64>,

    /// Martin threshold in cm⁻¹, if not the default
    pub martin_threshold: Option<f64>,
}

impl TryFrom<RawConfig> for Config {
    type Error = SpectroError;

    fn try_from(rc: RawConfig) -> Result<Self, Self::Error> {
        let anharmonic = match rc.anharmonic.as_deref().map(str::trim) {
            None | Some("Harmonic") => None,
            Some(s) => Some(s.parse()?),
        };
        let frequency_limits = rc.frequency_limits.map(|[a, b]| (a, b));
        let mut spectroscopy = rc.spectroscopy;
        spectroscopy.sort();
        spectroscopy.dedup();
        let ret = Self {
            tensor_file: rc.tensor_file,
            molecule_file: rc.molecule_file,
            spectroscopy,
            specifications: Specifications::parse(&rc.specifications)?,
            anharmonic,
            project_rot_transl: rc.project_rot_transl.unwrap_or(true),
            frequency_limits,
            temperature: rc.temperature.unwrap_or(298.0),
            fermi_threshold: rc.fermi_threshold,
            martin_threshold: rc.martin_threshold,
        };
        ret.validate()?;
        Ok(ret)
    }
}

impl Config {
    /// Construct a harmonic [Config] without intensities, with projection of
    /// rotations and translations, no frequency limits, and a temperature of
    /// 298 K
    pub fn new(
        tensor_file: impl Into<PathBuf>,
        molecule_file: impl Into<PathBuf>,
        specifications: Specifications,
    ) -> Self {
        Self {
            tensor_file: tensor_file.into(),
            molecule_file: molecule_file.into(),
            spectroscopy: Vec::new(),
            specifications,
            anharmonic: None,
            project_rot_transl: true,
            frequency_limits: None,
            temperature: 298.0,
            fermi_threshold: None,
            martin_threshold: None,
        }
    }

    pub fn spectroscopy(mut self, mut s: Vec<SpectroscopyType>) -> Self {
        s.sort();
        s.dedup();
        self.spectroscopy = s;
        self
    }

    pub fn anharmonic(mut self, a: Option<AnharmonicType>) -> Self {
        self.anharmonic = a;
        self
    }

    pub fn project_rot_transl(mut self, b: bool) -> Self {
        self.project_rot_transl = b;
        self
    }

    pub fn frequency_limits(mut self, l: Option<(f64, f64)>) -> Self {
        self.frequency_limits = l;
        self
    }

    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    pub fn fermi_threshold(mut self, t: Option<f64>) -> Self {
        self.fermi_threshold = t;
        self
    }

    pub fn martin_threshold(mut self, t: Option<f64>) -> Self {
        self.martin_threshold = t;
        self
    }

    pub fn wants(&self, s: SpectroscopyType) -> bool {
        self.spectroscopy.contains(&s)
    }

    /// load a [Config] from the TOML file at `path`, resolving relative input
    /// paths against the directory containing it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpectroError> {
        let path = path.as_ref();
        let contents = read_file(path)?;
        let mut ret: Self = toml::from_str(&contents).map_err(|e| {
            SpectroError::Configuration(format!(
                "failed to deserialize {}: {}",
                path.display(),
                e.message()
            ))
        })?;
        if let Some(dir) = path.parent() {
            for file in [&mut ret.tensor_file, &mut ret.molecule_file] {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }
        Ok(ret)
    }

    /// check that the settings in `self` are consistent
    pub fn validate(&self) -> Result<(), SpectroError> {
        for s in &self.spectroscopy {
            match s {
                SpectroscopyType::Ir => {
                    self.specifications.require_ir()?;
                }
                SpectroscopyType::Raman => {
                    self.specifications.require_raman()?;
                }
                SpectroscopyType::HyperRaman => {
                    self.specifications.require_hyper_raman()?;
                }
            }
        }
        if let Some((lo, hi)) = self.frequency_limits {
            if !(lo <= hi) {
                return Err(SpectroError::Configuration(format!(
                    "invalid frequency limits [{lo}, {hi}]"
                )));
            }
        }
        if !(self.temperature >= 0.0) {
            return Err(SpectroError::Configuration(format!(
                "negative temperature {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// the default [Constants] with the resonance thresholds of `self`
    pub fn constants(&self) -> Constants {
        let mut ret = Constants::default();
        if let Some(t) = self.fermi_threshold {
            ret.fermi_threshold = t;
        }
        if let Some(t) = self.martin_threshold {
            ret.martin_threshold = t;
        }
        ret
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Config {
            tensor_file,
            molecule_file,
            spectroscopy,
            specifications,
            anharmonic,
            project_rot_transl,
            frequency_limits,
            temperature,
            fermi_threshold,
            martin_threshold,
        } = self;
        let spectroscopy: Vec<_> =
            spectroscopy.iter().map(|s| s.to_string()).collect();
        writeln!(f, "Configuration Options:")?;
        writeln!(f, "tensor_file = {}", tensor_file.display())?;
        writeln!(f, "molecule_file = {}", molecule_file.display())?;
        writeln!(f, "spectroscopy = [{}]", spectroscopy.join(", "))?;
        writeln!(f, "specifications = {specifications}")?;
        match anharmonic {
            Some(a) => writeln!(f, "anharmonic = {a}")?,
            None => writeln!(f, "anharmonic = Harmonic")?,
        }
        writeln!(f, "project_rot_transl = {project_rot_transl}")?;
        match frequency_limits {
            Some((lo, hi)) => writeln!(f, "frequency_limits = [{lo}, {hi}]")?,
            None => writeln!(f, "frequency_limits = keep all")?,
        }
        writeln!(f, "temperature = {temperature}")?;
        if let Some(t) = fermi_threshold {
            writeln!(f, "fermi_threshold = {t}")?;
        }
        if let Some(t) = martin_threshold {
            writeln!(f, "martin_threshold = {t}")?;
        }
        Ok(())
    }
}
