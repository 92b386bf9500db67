//! Harmonic vibrational analysis of a Cartesian Hessian

use std::ops::RangeInclusive;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    Constants, Dmat, Dvec, Molecule, PhysicalWarning, SpectroError, Tensor,
    transform::{extract_subblock, transform},
    utils::symm_eigen_decomp,
};

/// harmonic energies below this magnitude in Hartree are reported as zero
const ZERO_ENERGY: f64 = 1e-7;

/// rigid-body vectors whose norm drops below this during orthogonalization
/// are linearly dependent on the others
const RIGID_TOL: f64 = 1e-6;

/// The result of a harmonic analysis: the map from Cartesian displacements to
/// normal modes and the harmonic energies of the retained modes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalModeBasis {
    /// signed harmonic energies in Hartree of the modes in
    /// `mode_min..=mode_max`, in descending order. negative values are
    /// imaginary frequencies
    pub energies: Vec<f64>,

    /// `num_coordinates` × (number of vibrations) matrix whose columns are the
    /// mass-weighted normal modes divided by √m
    pub matrix: Dmat,

    /// total number of Cartesian coordinates, 3N
    pub num_coordinates: usize,

    pub mode_min: usize,
    pub mode_max: usize,
}

impl NormalModeBasis {
    /// number of retained modes
    pub fn nmodes(&self) -> usize {
        self.mode_max + 1 - self.mode_min
    }

    pub fn modes(&self) -> RangeInclusive<usize> {
        self.mode_min..=self.mode_max
    }

    /// transform the leading `geometric_rank` axes of `tensor` from Cartesian
    /// to normal coordinates and drop the modes cut by the frequency limits
    pub fn to_normal(
        &self,
        tensor: &Tensor,
        geometric_rank: usize,
    ) -> Result<Tensor, SpectroError> {
        let full = transform(tensor, geometric_rank, &self.matrix)?;
        if self.nmodes() == self.matrix.ncols() {
            return Ok(full);
        }
        Ok(extract_subblock(&full, geometric_rank, self.modes()))
    }
}

/// orthonormal translation and rotation vectors of `mol` in mass-weighted
/// coordinates. `masses` are in electron masses
fn rigid_vectors(mol: &Molecule, masses: &[f64]) -> Vec<Dvec> {
    let n = 3 * mol.natoms();
    let com = mol.com();
    let mut raw = Vec::with_capacity(6);
    for ax in 0..3 {
        let mut v = Dvec::zeros(n);
        for (a, m) in masses.iter().enumerate() {
            v[3 * a + ax] = m.sqrt();
        }
        raw.push(v);
    }
    for ax in 0..3 {
        let mut v = Dvec::zeros(n);
        for (a, (atom, m)) in mol.atoms.iter().zip(masses).enumerate() {
            let r = atom.coord() - com;
            let e = nalgebra::Vector3::ith(ax, 1.0);
            let c = e.cross(&r) * m.sqrt();
            for k in 0..3 {
                v[3 * a + k] = c[k];
            }
        }
        raw.push(v);
    }

    // keep the residual norms so a linear molecule can drop its weakest
    // rotation even when it does not vanish exactly
    let mut kept: Vec<(f64, Dvec)> = Vec::new();
    for mut v in raw {
        for (_, u) in &kept {
            let d = u.dot(&v);
            v.axpy(-d, u, 1.0);
        }
        let norm = v.norm();
        if norm > RIGID_TOL {
            kept.push((norm, v / norm));
        }
    }
    let expected = match mol.natoms() {
        0 => 0,
        1 => 3,
        _ if mol.is_linear() => 5,
        _ => 6,
    };
    if kept.len() > expected {
        let (weakest, _) = kept
            .iter()
            .enumerate()
            .skip(3)
            .fold((3, f64::INFINITY), |(bi, bn), (i, (n, _))| {
                if *n < bn { (i, *n) } else { (bi, bn) }
            });
        kept.remove(weakest);
    }
    kept.into_iter().map(|(_, v)| v).collect()
}

/// Run a harmonic analysis of the Cartesian `hessian` (in atomic units) of
/// `mol`. When `project` is set, translations and rotations are projected out
/// of the mass-weighted Hessian before diagonalization. Either way, the
/// eigenvectors that overlap most with the rigid-body motions are discarded.
/// `limits`, in Hartree, restricts the retained modes to a contiguous range
/// whose absolute energies fall inside it.
pub fn analyze(
    mol: &Molecule,
    hessian: &Dmat,
    project: bool,
    limits: Option<(f64, f64)>,
    constants: &Constants,
) -> Result<(NormalModeBasis, Vec<PhysicalWarning>), SpectroError> {
    let n = 3 * mol.natoms();
    if hessian.shape() != (n, n) {
        return Err(SpectroError::DimensionMismatch(format!(
            "{}x{} Hessian for a molecule with {} atoms",
            hessian.nrows(),
            hessian.ncols(),
            mol.natoms()
        )));
    }
    let masses: Vec<f64> = mol
        .masses()
        .iter()
        .map(|m| m * constants.amu_to_electron_mass)
        .collect();

    let mut mw = hessian.clone();
    for i in 0..n {
        for j in 0..n {
            mw[(i, j)] /= (masses[i / 3] * masses[j / 3]).sqrt();
        }
    }

    let rigid = rigid_vectors(mol, &masses);
    debug!("{} rigid-body vectors, linear = {}", rigid.len(), mol.is_linear());
    if project {
        let mut p = Dmat::identity(n, n);
        for v in &rigid {
            p -= v * v.transpose();
        }
        mw = &p * mw * &p;
    }

    let (vals, vecs) = symm_eigen_decomp(mw, true);

    // discard the eigenvectors with the largest rigid-body character
    let mut overlaps: Vec<(usize, f64)> = (0..n)
        .map(|k| {
            let col = vecs.column(k);
            (k, rigid.iter().map(|v| v.dot(&col).powi(2)).sum())
        })
        .collect();
    overlaps.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut rigid_cols: Vec<_> =
        overlaps.iter().take(rigid.len()).map(|(k, _)| *k).collect();
    rigid_cols.sort();
    let vib: Vec<_> = (0..n).filter(|k| !rigid_cols.contains(k)).collect();

    let mut warnings = Vec::new();
    let mut energies = Vec::with_capacity(vib.len());
    let mut matrix = Dmat::zeros(n, vib.len());
    for (mode, &k) in vib.iter().enumerate() {
        let e = vals[k].signum() * vals[k].abs().sqrt();
        if e.abs() < ZERO_ENERGY {
            warnings.push(PhysicalWarning::ZeroFrequency { mode });
        } else if e < 0.0 {
            warnings.push(PhysicalWarning::ImaginaryFrequency { mode, energy: e });
        }
        energies.push(e);
        for i in 0..n {
            matrix[(i, mode)] = vecs[(i, k)] / masses[i / 3].sqrt();
        }
    }

    let (mode_min, mode_max) = match limits {
        Some((lo, hi)) => {
            let inside = |e: &f64| (lo..=hi).contains(&e.abs());
            match (
                energies.iter().position(inside),
                energies.iter().rposition(inside),
            ) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(SpectroError::Configuration(format!(
                        "no harmonic mode inside the frequency limits \
                         [{lo:e}, {hi:e}] Eh"
                    )));
                }
            }
        }
        None => (0, energies.len().saturating_sub(1)),
    };
    if energies.is_empty() {
        return Err(SpectroError::DimensionMismatch(
            "no vibrational modes left after removing rigid-body motion"
                .to_owned(),
        ));
    }
    if mode_min != 0 {
        warnings.push(PhysicalWarning::ModeCutoff { mode_min });
    }
    for w in &warnings {
        warn!("{w}");
    }
    energies.truncate(mode_max + 1);
    energies.drain(..mode_min);

    Ok((
        NormalModeBasis {
            energies,
            matrix,
            num_coordinates: n,
            mode_min,
            mode_max,
        },
        warnings,
    ))
}
