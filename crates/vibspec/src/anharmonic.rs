//! Second-order vibrational perturbation theory for vibrational energies

use std::{fmt::Display, str::FromStr};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    AnharmonicProperty, Dmat, SpectroError, Tensor3, Tensor4,
    resonance::{
        FermiResonance, ResonanceChecker, ResonanceTest, add_fermi_resonance,
    },
    utils::{combination_position, symm_eigen_decomp},
};

/// The flavor of perturbation theory applied to frequencies and intensities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnharmonicType {
    Vpt2,
    Dvpt2,
    FreqDvpt2IntVpt2,
    Dvpt2With11,
    FreqGvpt2IntDvpt2,
    FreqGvpt2IntDvpt2With11,
    FreqGvpt2IntDvpt2With11Forced,
}

/// Which resonance treatments are active for one [AnharmonicType]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flags {
    /// drop and record Fermi-resonant terms of the X matrix
    pub resonance_checks: bool,

    /// deperturb the recorded Fermi resonances variationally
    pub variational_correction: bool,

    /// drop Fermi-resonant terms of the transition moments
    pub moment_fermi_checks: bool,

    /// drop 1-1 resonant terms of the fundamental transition moments
    pub dd_check: bool,

    /// also drop every 1-1 term of a mode pair found to be in resonance
    pub forced_dd_removal: bool,
}

impl AnharmonicType {
    pub const ALL: [Self; 7] = [
        Self::Vpt2,
        Self::Dvpt2,
        Self::FreqDvpt2IntVpt2,
        Self::Dvpt2With11,
        Self::FreqGvpt2IntDvpt2,
        Self::FreqGvpt2IntDvpt2With11,
        Self::FreqGvpt2IntDvpt2With11Forced,
    ];

    pub fn flags(&self) -> Flags {
        use AnharmonicType::*;
        let (rc, vc, mf, dd, forced) = match self {
            Vpt2 => (false, false, false, false, false),
            Dvpt2 => (true, false, true, false, false),
            FreqDvpt2IntVpt2 => (true, false, false, false, false),
            Dvpt2With11 => (true, false, true, true, false),
            FreqGvpt2IntDvpt2 => (true, true, true, false, false),
            FreqGvpt2IntDvpt2With11 => (true, true, true, true, false),
            FreqGvpt2IntDvpt2With11Forced => (true, true, true, true, true),
        };
        Flags {
            resonance_checks: rc,
            variational_correction: vc,
            moment_fermi_checks: mf,
            dd_check: dd,
            forced_dd_removal: forced,
        }
    }

    fn name(&self) -> &'static str {
        use AnharmonicType::*;
        match self {
            Vpt2 => "VPT2",
            Dvpt2 => "DVPT2",
            FreqDvpt2IntVpt2 => "Freq DVPT2, Int VPT2",
            Dvpt2With11 => "DVPT2, w/ 1-1 checks",
            FreqGvpt2IntDvpt2 => "Freq GVPT2, Int DVPT2",
            FreqGvpt2IntDvpt2With11 => "Freq GVPT2, Int DVPT2, w/ 1-1 checks",
            FreqGvpt2IntDvpt2With11Forced => {
                "Freq GVPT2, Int DVPT2, w/ 1-1 checks and forced removal"
            }
        }
    }
}

impl Display for AnharmonicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Anharmonic: {}", self.name())
    }
}

impl FromStr for AnharmonicType {
    type Err = SpectroError;

    /// accepts the names as printed, with the `Anharmonic: ` prefix. a bare
    /// `Anharmonic` selects GVPT2 frequencies with 1-1 checked DVPT2
    /// intensities
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "Anharmonic" {
            return Ok(Self::FreqGvpt2IntDvpt2With11);
        }
        s.strip_prefix("Anharmonic:")
            .map(str::trim)
            .and_then(|name| Self::ALL.into_iter().find(|t| t.name() == name))
            .ok_or_else(|| {
                SpectroError::Configuration(format!(
                    "unrecognized anharmonic type `{s}`"
                ))
            })
    }
}

impl TryFrom<String> for AnharmonicType {
    type Error = SpectroError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnharmonicType> for String {
    fn from(value: AnharmonicType) -> Self {
        value.to_string()
    }
}

/// Compute the anharmonicity constants X from the harmonic `energies` and the
/// cubic and quartic force fields, all in J and reduced normal coordinates.
/// With `checks` set, each Fermi-resonant denominator is dropped and recorded
/// in the returned list, which is sorted. `checker` is never consulted
/// otherwise
pub fn get_x<C: ResonanceTest>(
    energies: &[f64],
    cubic: &Tensor3,
    quartic: &Tensor4,
    checker: &C,
    checks: bool,
) -> (Dmat, Vec<FermiResonance>) {
    let n = energies.len();
    let mut x = Dmat::zeros(n, n);
    let mut fermi = Vec::new();
    // the inverse of `delta`, unless a resonance check on `delta` fires
    let mut denom = |delta: f64, coupling: f64, same: bool, rec: [usize; 3]| {
        if checks && checker.is_fermi_resonance(delta, coupling, same) {
            add_fermi_resonance(
                &mut fermi,
                FermiResonance::new(rec[0], rec[1], rec[2], same),
            );
            0.0
        } else {
            1.0 / delta
        }
    };

    for i in 0..n {
        let vi = energies[i];
        let mut rhs = 0.0;
        for k in 0..n {
            let vk = energies[k];
            let kiik = cubic[[i, i, k]];
            // vanishing couplings contribute nothing, even across an exact
            // degeneracy
            if kiik == 0.0 {
                continue;
            }
            let tmp1 = 4.0 / vk;
            let tmp2 = 1.0 / (2.0 * vi + vk);
            let tmp3 = denom(2.0 * vi - vk, kiik, true, [k, i, i]);
            rhs += kiik.powi(2) / 32.0 * (tmp1 + tmp2 - tmp3);
        }
        x[(i, i)] = quartic[[i, i, i, i]] / 16.0 - rhs;

        for j in 0..i {
            let vj = energies[j];
            let mut a = 0.0;
            for k in 0..n {
                let c = cubic[[i, i, k]] * cubic[[j, j, k]];
                if c != 0.0 {
                    a += c / (4.0 * energies[k]);
                }
            }
            let mut b = 0.0;
            for k in 0..n {
                let vk = energies[k];
                let kijk = cubic[[i, j, k]];
                if kijk == 0.0 {
                    continue;
                }
                let tmp1 = 1.0 / (vi + vj + vk);
                let tmp2 = denom(-vi + vj + vk, kijk, k == j, [i, j, k]);
                let tmp3 = denom(vi - vj + vk, kijk, k == i, [j, k, i]);
                let tmp4 = denom(vi + vj - vk, kijk, false, [k, i, j]);
                b += kijk.powi(2) / 8.0 * (tmp1 + tmp2 + tmp3 - tmp4);
            }
            x[(i, j)] = quartic[[i, i, j, j]] / 4.0 - a - b;
            x[(j, i)] = x[(i, j)];
        }
    }
    fermi.sort();
    (x, fermi)
}

/// assemble fundamentals, overtones, and combination bands from the harmonic
/// `energies` and the anharmonicity constants `x`
pub fn assemble(energies: &[f64], x: &Dmat) -> AnharmonicProperty<f64> {
    let n = energies.len();
    let mut fund = vec![0.0; n];
    for i in 0..n {
        let mut fscr = 0.0;
        for j in 0..n {
            if j != i {
                fscr += 0.5 * x[(i, j)];
            }
        }
        fund[i] = energies[i] + 2.0 * x[(i, i)] + fscr;
    }
    let mut over = vec![0.0; n];
    let mut combo = vec![vec![0.0; n]; n];
    for i in 0..n {
        over[i] = 2.0 * fund[i] + 2.0 * x[(i, i)];
        for j in 0..n {
            if i != j {
                combo[i][j] = fund[i] + fund[j] + x[(i, j)];
            }
        }
    }
    AnharmonicProperty::new(energies.to_vec(), fund, over, combo)
}

/// Anharmonic vibrational energies in J from the harmonic `energies` and the
/// reduced cubic and quartic force fields in J. Returns the energies and the
/// Fermi resonances that were removed from the perturbative treatment
pub fn vibrational_energies(
    energies: &[f64],
    cubic: &Tensor3,
    quartic: &Tensor4,
    typ: AnharmonicType,
    checker: &ResonanceChecker,
) -> (AnharmonicProperty<f64>, Vec<FermiResonance>) {
    let flags = typ.flags();
    let (x, fermi) =
        get_x(energies, cubic, quartic, checker, flags.resonance_checks);
    for f in &fermi {
        info!(
            "Fermi resonance {f}: coupling {:.4} cm-1",
            checker.to_wavenumber(cubic[[f.i, f.j, f.k]])
        );
    }
    let mut ret = assemble(energies, &x);
    if flags.variational_correction {
        let (fund, over, combo) = adjust_for_fermi_resonance(
            &ret.fundamental,
            &ret.overtones,
            &ret.combotones,
            cubic,
            &fermi,
        );
        ret.fundamental = fund;
        ret.overtones = over;
        ret.combotones = combo;
    }
    (ret, fermi)
}

/// Deperturb the Fermi resonances in `fermi` by diagonalizing the effective
/// Hamiltonian over all fundamentals, overtones, and combination bands. Each
/// zero-order state takes the eigenvalue of the not-yet-assigned eigenvector
/// it contributes to most
pub fn adjust_for_fermi_resonance(
    fund: &[f64],
    over: &[f64],
    combo: &[Vec<f64>],
    cubic: &Tensor3,
    fermi: &[FermiResonance],
) -> (Vec<f64>, Vec<f64>, Vec<Vec<f64>>) {
    let n = fund.len();
    let size = 2 * n + n * n.saturating_sub(1) / 2;
    let mut v = Dmat::zeros(size, size);
    for i in 0..n {
        v[(i, i)] = fund[i];
        v[(n + i, n + i)] = over[i];
        for j in 0..i {
            let p = combination_position(i, j, n);
            v[(p, p)] = combo[i][j];
        }
    }
    for &FermiResonance { i, j, k, overtone } in fermi {
        let (col, val) = if overtone || j == k {
            (n + j, cubic[[j, k, i]] / 4.0)
        } else {
            (
                combination_position(k, j, n),
                cubic[[j, k, i]] / f64::sqrt(8.0),
            )
        };
        v[(i, col)] = val;
        v[(col, i)] = val;
    }

    let (vals, mut vecs) = symm_eigen_decomp(v.clone(), false);
    let mut adjusted = vec![0.0; size];
    for (i, adj) in adjusted.iter_mut().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..size {
            let c = vecs[(i, j)].abs();
            if c > best.map_or(0.0, |b| b.1) {
                best = Some((j, c));
            }
        }
        match best {
            Some((j, _)) => {
                *adj = vals[j];
                vecs.column_mut(j).fill(0.0);
            }
            None => *adj = v[(i, i)],
        }
    }

    let mut combo = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..i {
            let p = combination_position(i, j, n);
            combo[i][j] = adjusted[p];
            combo[j][i] = adjusted[p];
        }
    }
    (adjusted[..n].to_vec(), adjusted[n..2 * n].to_vec(), combo)
}
