use std::{f64::consts::PI, sync::LazyLock};

use crate::{
    AnharmonicProperty, Constants, Tensor,
    intensity::per_transition,
    specs::HyperRamanUnit,
};

/// the 15 ways of splitting six tensor indices into pairs
static PAIRINGS: LazyLock<Vec<[(usize, usize); 3]>> = LazyLock::new(|| {
    let mut ret = Vec::with_capacity(15);
    for b in 1..6 {
        let rest: Vec<_> = (1..6).filter(|&x| x != b).collect();
        let (c, others) = (rest[0], &rest[1..]);
        for (n, &d) in others.iter().enumerate() {
            let tail: Vec<_> =
                others.iter().enumerate().filter(|(m, _)| *m != n).collect();
            ret.push([(0, b), (c, d), (*tail[0].1, *tail[1].1)]);
        }
    }
    ret
});

/// number of cycles in the union of two pairings of six indices
fn cycles(p: &[(usize, usize); 3], q: &[(usize, usize); 3]) -> usize {
    let mut parent = [0, 1, 2, 3, 4, 5];
    fn find(parent: &mut [usize; 6], mut x: usize) -> usize {
        while parent[x] != x {
            x = parent[x];
        }
        x
    }
    let mut count = 6;
    for &(a, b) in p.iter().chain(q) {
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
            count -= 1;
        }
    }
    count
}

/// weight matrix of the sixth-rank isotropic rotational average in the basis
/// of index pairings
static WEIGHTS: LazyLock<Vec<Vec<f64>>> = LazyLock::new(|| {
    PAIRINGS
        .iter()
        .map(|p| {
            PAIRINGS
                .iter()
                .map(|q| match cycles(p, q) {
                    3 => 16.0 / 210.0,
                    2 => -5.0 / 210.0,
                    _ => 2.0 / 210.0,
                })
                .collect()
        })
        .collect()
});

/// Laboratory axes of the two hyperpolarizabilities in ⟨β_ABC β_DEF⟩
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarization {
    /// ⟨β²_ZZZ⟩
    Vv,
    /// ⟨β²_ZXX⟩
    Hv,
}

impl Polarization {
    fn lab_axes(&self) -> [usize; 6] {
        const X: usize = 0;
        const Z: usize = 2;
        match self {
            Polarization::Vv => [Z; 6],
            Polarization::Hv => [Z, X, X, Z, X, X],
        }
    }
}

/// Orientational average of the squared hyperpolarizability `b` (3×3×3) for
/// the lab polarization `pol`
pub fn rotational_average(b: &Tensor, pol: Polarization) -> f64 {
    let lab = pol.lab_axes();
    // contraction of β β with each pairing on the molecular side
    let mol: Vec<f64> = PAIRINGS
        .iter()
        .map(|q| {
            let mut sum = 0.0;
            for r0 in 0..3 {
                for r1 in 0..3 {
                    for r2 in 0..3 {
                        let mut idx = [0; 6];
                        for (&(x, y), r) in q.iter().zip([r0, r1, r2]) {
                            idx[x] = r;
                            idx[y] = r;
                        }
                        sum += b[[idx[0], idx[1], idx[2]]]
                            * b[[idx[3], idx[4], idx[5]]];
                    }
                }
            }
            sum
        })
        .collect();
    let mut ret = 0.0;
    for (p, row) in PAIRINGS.iter().zip(WEIGHTS.iter()) {
        if p.iter().all(|&(x, y)| lab[x] == lab[y]) {
            ret += row.iter().zip(&mol).map(|(w, g)| w * g).sum::<f64>();
        }
    }
    ret
}

/// Hyper-Raman intensity in SI units of a transition at `recp_m` (m⁻¹) with
/// SI transition hyperpolarizability `m` for light incident at `incident`
/// (m⁻¹)
pub fn hyper_raman_intensity(
    m: &Tensor,
    recp_m: f64,
    incident: f64,
    temperature: f64,
    pol: Polarization,
    c: &Constants,
) -> f64 {
    if recp_m == 0.0 {
        return 0.0;
    }
    PI * PI * (2.0 * incident - recp_m).powi(4) * rotational_average(m, pol)
        / (2.0 * c.vacuum_permittivity.powi(3) * c.speed_of_light)
        / c.exp_denominator(recp_m, temperature)
}

/// VV and HV Hyper-Raman intensities in `unit` from the SI transition
/// hyperpolarizabilities and the wavenumbers in m⁻¹ of every transition. In
/// relative units both are scaled so that the strongest harmonic VV band is 1
pub fn hyper_raman_intensities(
    moments: &AnharmonicProperty<Tensor>,
    recp_m: &AnharmonicProperty<f64>,
    incident: f64,
    temperature: f64,
    unit: HyperRamanUnit,
    constants: &Constants,
) -> (AnharmonicProperty<f64>, AnharmonicProperty<f64>) {
    let run = |pol| {
        per_transition(moments, recp_m, |m, w| {
            hyper_raman_intensity(m, w, incident, temperature, pol, constants)
        })
    };
    let vv = run(Polarization::Vv);
    let hv = run(Polarization::Hv);
    match unit {
        HyperRamanUnit::SiComplete => (vv, hv),
        HyperRamanUnit::Relative => {
            let max = vv.harmonic.iter().cloned().fold(0.0, f64::max);
            if max > 0.0 {
                (vv.scaled(1.0 / max), hv.scaled(1.0 / max))
            } else {
                (vv, hv)
            }
        }
    }
}
