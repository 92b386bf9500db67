//! Minimal molecular geometry input: Cartesian coordinates, nuclear charges,
//! and isotopic masses

use std::{fmt::Display, path::Path, sync::LazyLock};

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{SpectroError, utils::read_file};

/// Å per Bohr
pub const ANGBOHR: f64 = 0.52917721067;

static ATOMTYPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)atomtypes\s*=\s*(\d+)").unwrap());
static CHARGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)charge\s*=\s*([0-9]+(?:\.[0-9]*)?)").unwrap()
});
static ATOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)atoms\s*=\s*(\d+)").unwrap());

pub const NUMBER_TO_SYMBOL: [&str; 37] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg",
    "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn",
    "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr",
];

/// mass in amu of the most abundant isotope of each element
const MASSES: [f64; 37] = [
    0.0,
    1.00782503207,
    4.00260325415,
    7.016004548,
    9.012182201,
    11.009305406,
    12.0,
    14.00307400478,
    15.99491461956,
    18.998403224,
    19.99244017542,
    22.98976966,
    23.985041699,
    26.981538627,
    27.97692653246,
    30.973761629,
    31.972070999,
    34.968852682,
    39.96238312251,
    38.963706679,
    39.962590983,
    44.955911909,
    47.947946281,
    50.943959507,
    51.940507472,
    54.938045141,
    55.934937475,
    58.933195048,
    57.935342907,
    62.929597474,
    63.929142222,
    68.925573587,
    73.921177767,
    74.921596478,
    79.916521271,
    78.918337087,
    83.911506687,
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// nuclear charge
    pub charge: f64,

    /// isotopic mass in amu
    pub mass: f64,

    /// Cartesian coordinates in Bohr
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Atom {
    /// build an atom with the most abundant isotope mass for `atomic_number`.
    /// coordinates are in Bohr
    pub fn new(atomic_number: usize, x: f64, y: f64, z: f64) -> Option<Self> {
        Some(Self {
            charge: atomic_number as f64,
            mass: *MASSES.get(atomic_number).filter(|&&m| m > 0.0)?,
            x,
            y,
            z,
        })
    }

    pub fn atomic_number(&self) -> usize {
        self.charge.round() as usize
    }

    pub fn label(&self) -> &str {
        NUMBER_TO_SYMBOL
            .get(self.atomic_number())
            .copied()
            .unwrap_or("X")
    }

    pub fn coord(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:2} {:15.10} {:15.10} {:15.10}",
            self.label(),
            self.x,
            self.y,
            self.z
        )
    }
}

/// strip trailing digits from labels like `O1` and look the rest up as an
/// element symbol
fn symbol_to_number(label: &str) -> Option<usize> {
    let sym = label.trim_end_matches(|c: char| c.is_ascii_digit());
    NUMBER_TO_SYMBOL
        .iter()
        .skip(1)
        .position(|s| s.eq_ignore_ascii_case(sym))
        .map(|p| p + 1)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
}

impl Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for atom in &self.atoms {
            writeln!(f, "{atom}")?;
        }
        Ok(())
    }
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    /// load a molecule from `path`, treating files ending in `.xyz` as XYZ
    /// files and anything else as a Dalton-style `.mol` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpectroError> {
        let path = path.as_ref();
        let contents = read_file(path)?;
        let name = path.display().to_string();
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xyz")) {
            Self::from_xyz(&contents, &name)
        } else {
            Self::from_mol(&contents, &name)
        }
    }

    /// parse the contents of a Dalton `.mol` file. Coordinates are in Bohr
    /// unless the `Atomtypes` line contains the `Angstrom` keyword.
    pub fn from_mol(contents: &str, path: &str) -> Result<Self, SpectroError> {
        let mut lines = contents.lines().enumerate();
        let mut header = None;
        for (i, line) in lines.by_ref() {
            if ATOMTYPES.is_match(line) {
                header = Some((i, line));
                break;
            }
        }
        let Some((i, header)) = header else {
            return Err(SpectroError::format(
                path,
                0,
                "no Atomtypes line in molecule file",
            ));
        };
        let atomtypes: usize = ATOMTYPES.captures(header).map_or(0, |c| {
            c[1].parse().unwrap_or_default()
        });
        let scale = if header.to_lowercase().contains("angstrom") {
            1.0 / ANGBOHR
        } else {
            1.0
        };
        let mut atoms = Vec::new();
        let mut last = i + 1;
        for _ in 0..atomtypes {
            let Some((i, line)) = lines.next() else {
                return Err(SpectroError::format(
                    path,
                    last,
                    format!("expected {atomtypes} atom types"),
                ));
            };
            let (Some(charge), Some(count)) =
                (CHARGE.captures(line), ATOMS.captures(line))
            else {
                return Err(SpectroError::format(
                    path,
                    i + 1,
                    format!("expected `Charge= Atoms=`, got `{}`", line.trim()),
                ));
            };
            let charge: f64 = charge[1].parse().map_err(|_| {
                SpectroError::format(path, i + 1, "invalid charge")
            })?;
            let count: usize = count[1].parse().map_err(|_| {
                SpectroError::format(path, i + 1, "invalid atom count")
            })?;
            for _ in 0..count {
                let Some((i, line)) = lines.next() else {
                    return Err(SpectroError::format(
                        path,
                        last,
                        "unexpected end of molecule file",
                    ));
                };
                last = i + 1;
                let fields: Vec<_> = line.split_whitespace().collect();
                let [_, x, y, z] = fields[..] else {
                    return Err(SpectroError::format(
                        path,
                        i + 1,
                        format!("expected `label x y z`, got `{}`", line.trim()),
                    ));
                };
                let [x, y, z] = parse_coords([x, y, z], path, i + 1)?;
                let z_num = charge.round() as usize;
                let mut atom =
                    Atom::new(z_num, x * scale, y * scale, z * scale)
                        .ok_or_else(|| {
                            SpectroError::format(
                                path,
                                i + 1,
                                format!("no isotope mass for charge {charge}"),
                            )
                        })?;
                atom.charge = charge;
                atoms.push(atom);
            }
        }
        Ok(Self { atoms })
    }

    /// parse an XYZ file with coordinates in Ångstrom. The count and comment
    /// lines are optional
    pub fn from_xyz(contents: &str, path: &str) -> Result<Self, SpectroError> {
        let mut lines: Vec<_> = contents.lines().enumerate().collect();
        if lines
            .first()
            .is_some_and(|(_, l)| l.trim().parse::<usize>().is_ok())
        {
            lines.drain(..lines.len().min(2));
        }
        let mut atoms = Vec::new();
        for (i, line) in lines {
            let fields: Vec<_> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let [label, x, y, z] = fields[..] else {
                return Err(SpectroError::format(
                    path,
                    i + 1,
                    format!("expected `symbol x y z`, got `{}`", line.trim()),
                ));
            };
            let [x, y, z] = parse_coords([x, y, z], path, i + 1)?;
            let atom = symbol_to_number(label)
                .and_then(|n| Atom::new(n, x / ANGBOHR, y / ANGBOHR, z / ANGBOHR))
                .ok_or_else(|| {
                    SpectroError::format(
                        path,
                        i + 1,
                        format!("unknown atomic symbol {label}"),
                    )
                })?;
            atoms.push(atom);
        }
        Ok(Self { atoms })
    }

    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.mass).collect()
    }

    #[cfg(test)]
    pub(crate) fn charges(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.charge).collect()
    }

    /// center of mass in Bohr
    pub fn com(&self) -> Vector3<f64> {
        let mut sum = 0.0;
        let mut com = Vector3::zeros();
        for atom in &self.atoms {
            sum += atom.mass;
            com += atom.mass * atom.coord();
        }
        if sum > 0.0 { com / sum } else { com }
    }

    /// moment of inertia tensor about the center of mass in amu Bohr²
    pub fn moi(&self) -> Matrix3<f64> {
        let com = self.com();
        let mut ret = Matrix3::zeros();
        for atom in &self.atoms {
            let r = atom.coord() - com;
            let (x, y, z) = (r[0], r[1], r[2]);
            let w = atom.mass;
            ret[(0, 0)] += w * (y * y + z * z);
            ret[(1, 1)] += w * (x * x + z * z);
            ret[(2, 2)] += w * (x * x + y * y);
            ret[(1, 0)] -= w * x * y;
            ret[(2, 0)] -= w * x * z;
            ret[(2, 1)] -= w * y * z;
        }
        ret.fill_upper_triangle_with_lower_triangle();
        ret
    }

    /// a molecule is linear when its smallest principal moment of inertia
    /// vanishes. single atoms are not linear
    pub fn is_linear(&self) -> bool {
        if self.atoms.len() < 2 {
            return false;
        }
        if self.atoms.len() == 2 {
            return true;
        }
        let moms = SymmetricEigen::new(self.moi()).eigenvalues;
        moms.iter().cloned().fold(f64::INFINITY, f64::min) < 1e-6
    }
}

fn parse_coords(
    fields: [&str; 3],
    path: &str,
    line: usize,
) -> Result<[f64; 3], SpectroError> {
    let mut ret = [0.0; 3];
    for (r, f) in ret.iter_mut().zip(fields) {
        *r = f.parse().map_err(|_| {
            SpectroError::format(path, line, format!("invalid coordinate {f}"))
        })?;
    }
    Ok(ret)
}
