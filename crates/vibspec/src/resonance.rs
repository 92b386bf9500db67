//! Detection of near-singular perturbative denominators

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Constants;

/// Fermi resonance between fundamental `i` and the combination band `j + k`,
/// or the overtone `2j` when `overtone` is set (in which case `j == k`).
/// `j` and `k` play the same role and are stored sorted
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct FermiResonance {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub overtone: bool,
}

impl FermiResonance {
    pub fn new(i: usize, j: usize, k: usize, overtone: bool) -> Self {
        Self {
            i,
            j: j.min(k),
            k: j.max(k),
            overtone,
        }
    }
}

impl Display for FermiResonance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.overtone { "2" } else { "1" };
        write!(f, "{:5}{:5}{:5} type {kind}", self.i, self.j, self.k)
    }
}

/// add `res` to `list` unless an equivalent record is already present
pub fn add_fermi_resonance(list: &mut Vec<FermiResonance>, res: FermiResonance) {
    let res = FermiResonance::new(res.i, res.j, res.k, res.overtone);
    if !list.contains(&res) {
        list.push(res);
    }
}

/// 1-1 (Darling-Dennison) resonance between fundamentals `i` and `j`, with
/// `i < j`
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct OneOneResonance {
    pub i: usize,
    pub j: usize,
}

impl OneOneResonance {
    pub fn new(i: usize, j: usize) -> Self {
        Self {
            i: i.min(j),
            j: i.max(j),
        }
    }
}

impl Display for OneOneResonance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:5}{:5}", self.i, self.j)
    }
}

/// Kind of force constant behind a 1-1 coupling. Products of two cubic force
/// constants carry squared energy units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coupling {
    Quartic,
    Cubic,
}

/// The resonance predicates consulted by the perturbative routines. Energies
/// and couplings are in J
pub trait ResonanceTest {
    fn is_fermi_resonance(&self, delta: f64, coupling: f64, same_role: bool)
    -> bool;

    fn is_11_resonance(&self, delta: f64, coupling: f64, kind: Coupling)
    -> bool;
}

/// Threshold-based [ResonanceTest] built from a set of [Constants]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResonanceChecker {
    /// J per cm⁻¹
    wavenumber: f64,
    fermi: f64,
    martin: f64,
    dd_delta: f64,
    dd_coupling: f64,
    dd_ratio: f64,
}

impl ResonanceChecker {
    pub fn new(constants: &Constants) -> Self {
        Self {
            wavenumber: constants.wavenumber_to_joule(),
            fermi: constants.fermi_threshold_joule(),
            martin: constants.martin_threshold_joule(),
            dd_delta: constants.dd_delta_threshold,
            dd_coupling: constants.dd_coupling_threshold,
            dd_ratio: constants.dd_ratio_threshold,
        }
    }

    /// convert `e` in J to cm⁻¹
    pub fn to_wavenumber(&self, e: f64) -> f64 {
        e / self.wavenumber
    }
}

impl ResonanceTest for ResonanceChecker {
    /// a Fermi resonance needs a small energy difference and a Martin
    /// parameter `coupling⁴/(k δ³)` above the Martin threshold, with `k`
    /// = 256 when the two lower modes coincide and 64 otherwise
    fn is_fermi_resonance(
        &self,
        delta: f64,
        coupling: f64,
        same_role: bool,
    ) -> bool {
        if delta.abs() > self.fermi {
            return false;
        }
        let k = if same_role { 256.0 } else { 64.0 };
        (coupling.powi(4) / (k * delta.powi(3))).abs() > self.martin
    }

    fn is_11_resonance(&self, delta: f64, coupling: f64, kind: Coupling) -> bool {
        let delta = self.to_wavenumber(delta);
        let coupling = match kind {
            Coupling::Quartic => self.to_wavenumber(coupling),
            Coupling::Cubic => coupling / self.wavenumber.powi(2),
        };
        if delta.abs() > self.dd_delta {
            return false;
        }
        coupling.abs() >= self.dd_coupling
            || (coupling / delta.powi(2)).abs() >= self.dd_ratio
    }
}
