//! The spectroscopy and unit selections of a calculation

use std::{f64::consts::PI, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Constants, SpectroError};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum SpectroscopyType {
    Ir,
    Raman,
    HyperRaman,
}

impl Display for SpectroscopyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            SpectroscopyType::Ir => "IR",
            SpectroscopyType::Raman => "Raman",
            SpectroscopyType::HyperRaman => "Hyper-Raman",
        })
    }
}

impl FromStr for SpectroscopyType {
    type Err = SpectroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IR" => Ok(Self::Ir),
            "Raman" => Ok(Self::Raman),
            "Hyper-Raman" => Ok(Self::HyperRaman),
            s => Err(SpectroError::Configuration(format!(
                "unrecognized spectroscopy type `{s}`"
            ))),
        }
    }
}

impl TryFrom<String> for SpectroscopyType {
    type Error = SpectroError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpectroscopyType> for String {
    fn from(value: SpectroscopyType) -> Self {
        value.to_string()
    }
}

/// unit of vibrational energies, frequencies, and wavenumbers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VibUnit {
    RecpM,
    RecpCm,
    Hertz,
    AngularHertz,
    Hartree,
}

impl VibUnit {
    /// the factor converting an energy in J to this unit
    pub fn from_joule(&self, c: &Constants) -> f64 {
        match self {
            VibUnit::RecpM => 1.0 / (c.planck * c.speed_of_light),
            VibUnit::RecpCm => 0.01 / (c.planck * c.speed_of_light),
            VibUnit::Hertz => 1.0 / c.planck,
            VibUnit::AngularHertz => 2.0 * PI / c.planck,
            VibUnit::Hartree => 1.0 / c.hartree_to_joule,
        }
    }

    /// convert `value` in this unit to Hartree
    pub fn to_hartree(&self, value: f64, c: &Constants) -> f64 {
        value / (self.from_joule(c) * c.hartree_to_joule)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            VibUnit::RecpM => "1/m",
            VibUnit::RecpCm => "1/cm",
            VibUnit::Hertz => "1/s",
            VibUnit::AngularHertz => "ang. 1/s",
            VibUnit::Hartree => "Eh",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrUnit {
    /// summed squared dipole gradient in atomic units
    SsdgAu,
    /// summed squared dipole gradient in C²/kg
    SsdgSi,
    /// summed squared dipole gradient in (D/Å)²/amu
    SsdgDebye,
    /// molar decadic attenuation coefficient in m²/(s mol)
    MdacSi,
    /// molar decadic attenuation coefficient in L/(cm s mol)
    MdacLitre,
    /// Naperian integrated molar absorption coefficient in m/mol
    NimacSi,
    /// Naperian integrated molar absorption coefficient in km/mol
    NimacKm,
}

impl IrUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            IrUnit::SsdgAu => "SSDG, a.u.",
            IrUnit::SsdgSi => "SSDG, C**2/kg",
            IrUnit::SsdgDebye => "SSDG, D2A2/amu",
            IrUnit::MdacSi => "MDAC, m**2/(s*mol)",
            IrUnit::MdacLitre => "MDAC, L/(cm*s*mol)",
            IrUnit::NimacSi => "NIMAC, m/mol",
            IrUnit::NimacKm => "NIMAC, km/mol",
        }
    }
}

/// weighting of the isotropic and anisotropic polarizability invariants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RamanCombination {
    /// 45a² + 4γ²
    FortyFivePlusFour,
    /// 45a² + 7γ²
    FortyFivePlusSeven,
}

impl RamanCombination {
    pub fn anisotropic_weight(&self) -> f64 {
        match self {
            RamanCombination::FortyFivePlusFour => 4.0,
            RamanCombination::FortyFivePlusSeven => 7.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RamanScale {
    /// combined polarizability gradient in atomic units
    CpgAu,
    /// pseudo-combined polarizability gradient in Å⁴/amu
    Pcpg,
    /// scattering cross section in SI units
    ScsSi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamanUnit {
    pub combination: RamanCombination,
    pub scale: RamanScale,
}

impl RamanUnit {
    pub fn symbol(&self) -> String {
        let rule = match self.combination {
            RamanCombination::FortyFivePlusFour => "45+4",
            RamanCombination::FortyFivePlusSeven => "45+7",
        };
        match self.scale {
            RamanScale::CpgAu => format!("CPG {rule}, a.u."),
            RamanScale::Pcpg => format!("PCPG {rule}, Å^4/amu"),
            RamanScale::ScsSi => format!("SCS {rule}, SI units"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HyperRamanUnit {
    SiComplete,
    Relative,
}

impl HyperRamanUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            HyperRamanUnit::SiComplete => "SI complete",
            HyperRamanUnit::Relative => "Relative",
        }
    }
}

/// One recognized specification token
#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Vib(VibUnit),
    Ir(IrUnit),
    Raman(RamanUnit),
    HyperRaman(HyperRamanUnit),
}

impl FromStr for Token {
    type Err = SpectroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use RamanCombination::*;
        use RamanScale::*;
        let s = s.trim();
        let err = || {
            SpectroError::Configuration(format!(
                "unrecognized specification `{s}`"
            ))
        };
        let (category, value) = s.split_once(':').ok_or_else(err)?;
        let value = value.trim();
        let tok = match category.trim() {
            "Vib modes" => Token::Vib(match value {
                "1/m" => VibUnit::RecpM,
                "1/cm" => VibUnit::RecpCm,
                "1/s" => VibUnit::Hertz,
                "ang. 1/s" => VibUnit::AngularHertz,
                "Eh" => VibUnit::Hartree,
                _ => return Err(err()),
            }),
            "IR" => Token::Ir(match value {
                "SSDG, a.u." => IrUnit::SsdgAu,
                "SSDG, C**2/kg" => IrUnit::SsdgSi,
                "SSDG, D2A2/amu" => IrUnit::SsdgDebye,
                "MDAC, m**2/(s*mol)" => IrUnit::MdacSi,
                "MDAC, L/(cm*s*mol)" => IrUnit::MdacLitre,
                "NIMAC, m/mol" => IrUnit::NimacSi,
                "NIMAC, km/mol" => IrUnit::NimacKm,
                _ => return Err(err()),
            }),
            "Raman" => {
                let (combination, scale) = match value {
                    "CPG 45+4, a.u." => (FortyFivePlusFour, CpgAu),
                    "CPG 45+7, a.u." => (FortyFivePlusSeven, CpgAu),
                    "PCPG 45+4, Å^4/amu" => (FortyFivePlusFour, Pcpg),
                    "PCPG 45+7, Å^4/amu" => (FortyFivePlusSeven, Pcpg),
                    "SCS 45+4, SI units" => (FortyFivePlusFour, ScsSi),
                    "SCS 45+7, SI units" => (FortyFivePlusSeven, ScsSi),
                    _ => return Err(err()),
                };
                Token::Raman(RamanUnit { combination, scale })
            }
            "Hyper-Raman" => Token::HyperRaman(match value {
                "SI complete" => HyperRamanUnit::SiComplete,
                "Relative" => HyperRamanUnit::Relative,
                _ => return Err(err()),
            }),
            _ => return Err(err()),
        };
        Ok(tok)
    }
}

/// The validated set of unit selections. At most one selection is allowed
/// per category, and the vibrational-mode unit is mandatory
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Specifications {
    pub vib: VibUnit,
    pub ir: Option<IrUnit>,
    pub raman: Option<RamanUnit>,
    pub hyper_raman: Option<HyperRamanUnit>,
}

impl Specifications {
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, SpectroError> {
        fn set<T>(
            slot: &mut Option<T>,
            val: T,
            category: &str,
        ) -> Result<(), SpectroError> {
            if slot.replace(val).is_some() {
                return Err(SpectroError::Configuration(format!(
                    "more than one {category} specification"
                )));
            }
            Ok(())
        }
        let mut vib = None;
        let mut ir = None;
        let mut raman = None;
        let mut hyper_raman = None;
        for tok in tokens {
            match tok.as_ref().parse()? {
                Token::Vib(v) => set(&mut vib, v, "vibrational mode")?,
                Token::Ir(v) => set(&mut ir, v, "IR")?,
                Token::Raman(v) => set(&mut raman, v, "Raman")?,
                Token::HyperRaman(v) => set(&mut hyper_raman, v, "Hyper-Raman")?,
            }
        }
        let vib = vib.ok_or_else(|| {
            SpectroError::Configuration(
                "no unit specified for vibrational modes".to_owned(),
            )
        })?;
        Ok(Self {
            vib,
            ir,
            raman,
            hyper_raman,
        })
    }

    pub fn require_ir(&self) -> Result<IrUnit, SpectroError> {
        self.ir.ok_or_else(|| missing("IR"))
    }

    pub fn require_raman(&self) -> Result<RamanUnit, SpectroError> {
        self.raman.ok_or_else(|| missing("Raman"))
    }

    pub fn require_hyper_raman(&self) -> Result<HyperRamanUnit, SpectroError> {
        self.hyper_raman.ok_or_else(|| missing("Hyper-Raman"))
    }

    pub fn tokens(&self) -> Vec<String> {
        let mut ret = vec![format!("Vib modes: {}", self.vib.symbol())];
        if let Some(ir) = self.ir {
            ret.push(format!("IR: {}", ir.symbol()));
        }
        if let Some(raman) = self.raman {
            ret.push(format!("Raman: {}", raman.symbol()));
        }
        if let Some(hr) = self.hyper_raman {
            ret.push(format!("Hyper-Raman: {}", hr.symbol()));
        }
        ret
    }
}

fn missing(category: &str) -> SpectroError {
    SpectroError::Configuration(format!(
        "{category} intensities requested without a {category} unit \
         specification"
    ))
}

impl TryFrom<Vec<String>> for Specifications {
    type Error = SpectroError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Specifications> for Vec<String> {
    fn from(value: Specifications) -> Self {
        value.tokens()
    }
}

impl Display for Specifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens().join("; "))
    }
}
