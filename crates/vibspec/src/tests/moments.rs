use std::f64::consts::SQRT_2;

use approx::assert_relative_eq;
use ndarray::{ArrayD, Dimension, IxDyn};
use test_case::test_case;

use crate::{
    AnharmonicType, Constants, SpectroError, Tensor, Tensor3, Tensor4,
    moments::{
        dd_resonances, fundamental_moments, harmonic_moment,
        overtone_moments, transition_moments,
    },
    resonance::{OneOneResonance, ResonanceChecker},
    tests::cm,
};

fn grad(n: usize) -> Tensor {
    ArrayD::from_shape_fn(IxDyn(&[n, 3]), |idx| {
        ((idx[0] * 3 + idx[1] + 1) as f64).sin() * 1e-20
    })
}

#[test]
fn null_force_field() {
    let n = 3;
    let energies = [cm(3000.0), cm(1600.0), cm(1000.0)];
    let g = grad(n);
    let mut h = ArrayD::zeros(IxDyn(&[n, n, 3]));
    h[[0, 1, 2]] = 4e-21;
    h[[1, 0, 2]] = 4e-21;
    h[[2, 2, 0]] = -2e-21;
    let pc = ArrayD::zeros(IxDyn(&[n, n, n, 3]));
    let checker = ResonanceChecker::new(&Constants::default());
    for typ in AnharmonicType::ALL {
        let (got, dd) = transition_moments(
            &g,
            &h,
            &pc,
            &Tensor3::zeros((n, n, n)),
            &Tensor4::zeros((n, n, n, n)),
            Vec::new(),
            &energies,
            typ,
            &checker,
        )
        .unwrap();
        assert!(dd.is_empty());
        for i in 0..n {
            let want = g.index_axis(ndarray::Axis(0), i).to_owned() / SQRT_2;
            assert_eq!(got.fundamental[i], want, "{typ}");
        }
        assert_relative_eq!(
            got.overtones[2][[0]],
            -2e-21 / (2.0 * SQRT_2),
            max_relative = 1e-14
        );
        assert_eq!(got.overtones[0][[2]], 0.0);
        assert_relative_eq!(
            got.combotones[0][1][[2]],
            2e-21,
            max_relative = 1e-14
        );
        assert_eq!(got.combotones[0][1], got.combotones[1][0]);
    }
}

#[test]
fn harmonic_moments() {
    let g = grad(2);
    let qi2 = [4.0, 0.25];
    let got = harmonic_moment(&g, &qi2);
    assert_eq!(got.len(), 2);
    assert_eq!(got[0][[1]], 2.0 * g[[0, 1]]);
    assert_eq!(got[1][[2]], 0.5 * g[[1, 2]]);
}

#[test]
fn one_one_detection() {
    let energies = [cm(1540.0), cm(1500.0)];
    let cubic = Tensor3::zeros((2, 2, 2));
    let mut quartic = Tensor4::zeros((2, 2, 2, 2));
    quartic[[0, 1, 1, 1]] = cm(25.0);
    quartic[[1, 0, 1, 1]] = cm(25.0);
    let checker = ResonanceChecker::new(&Constants::default());
    let got = dd_resonances(&energies, &cubic, &quartic, &checker);
    assert_eq!(got, vec![OneOneResonance::new(0, 1)]);

    // far apart modes are never in 1-1 resonance
    let energies = [cm(3000.0), cm(1500.0)];
    assert!(dd_resonances(&energies, &cubic, &quartic, &checker).is_empty());
}

#[test]
fn one_one_removal() {
    let n = 2;
    let energies = [cm(1540.0), cm(1500.0)];
    let g = grad(n);
    let h = ArrayD::zeros(IxDyn(&[n, n, 3]));
    let pc = ArrayD::zeros(IxDyn(&[n, n, n, 3]));
    let cubic = Tensor3::zeros((n, n, n));
    let mut quartic = Tensor4::zeros((n, n, n, n));
    for idx in [[0, 1, 1, 1], [1, 0, 1, 1], [1, 1, 0, 1], [1, 1, 1, 0]] {
        quartic[idx] = cm(25.0);
    }
    let checker = ResonanceChecker::new(&Constants::default());
    let run = |typ| {
        fundamental_moments(
            &g, &h, &pc, &cubic, &quartic, &energies, typ, &checker,
        )
        .unwrap()
    };
    let (vpt2, none) = run(AnharmonicType::Dvpt2);
    assert!(none.is_empty());
    let (dvpt2, dd) = run(AnharmonicType::Dvpt2With11);
    assert_eq!(dd, vec![OneOneResonance::new(0, 1)]);
    // dropping the resonant denominator changes the coupled term
    assert_ne!(vpt2[0], dvpt2[0]);
    for x in dvpt2.iter().flatten() {
        assert!(x.is_finite());
    }
}

#[test]
fn mismatched_shapes() {
    let energies = [cm(3000.0), cm(1600.0)];
    let checker = ResonanceChecker::new(&Constants::default());
    let got = fundamental_moments(
        &grad(3),
        &ArrayD::zeros(IxDyn(&[2, 2, 3])),
        &ArrayD::zeros(IxDyn(&[2, 2, 2, 3])),
        &Tensor3::zeros((2, 2, 2)),
        &Tensor4::zeros((2, 2, 2, 2)),
        &energies,
        AnharmonicType::Vpt2,
        &checker,
    );
    assert!(matches!(got, Err(SpectroError::DimensionMismatch(_))));
}

/// Two modes with 2ω₁ − ω₀ = 100 cm⁻¹ and a φ₀₁₁ large enough to put them in
/// Fermi resonance
fn fermi_force_field() -> ([f64; 2], Tensor3, Tensor4) {
    let energies = [cm(3000.0), cm(1550.0)];
    let cubic = Tensor3::from_shape_fn((2, 2, 2), |(i, j, k)| {
        cm([-250.0, 40.0, 150.0, -90.0][i + j + k])
    });
    let quartic = Tensor4::from_shape_fn((2, 2, 2, 2), |(i, j, k, l)| {
        cm([30.0, 5.0, -12.0, 4.0, 20.0][i + j + k + l])
    });
    (energies, cubic, quartic)
}

/// symmetric property derivatives of geometric rank `rank` whose trailing
/// components have `shape`, depending only on the mode index sum and the
/// flattened component index
fn derivative(
    rank: usize,
    shape: &[usize],
    f: impl Fn(f64, f64) -> f64,
) -> Tensor {
    let mut full = vec![2; rank];
    full.extend_from_slice(shape);
    ArrayD::from_shape_fn(IxDyn(&full), |idx| {
        let modes: usize = idx.slice()[..rank].iter().sum();
        let a = idx.slice()[rank..]
            .iter()
            .zip(shape)
            .fold(0, |acc, (&x, &n)| acc * n + x);
        f(modes as f64, a as f64)
    })
}

fn fermi_moments(
    shape: &[usize],
    typ: AnharmonicType,
) -> (Vec<Tensor>, Vec<Tensor>, Vec<Vec<Tensor>>) {
    let (energies, cubic, quartic) = fermi_force_field();
    let g = derivative(1, shape, |m, a| 0.3 * (m + 1.0) - 0.2 * a);
    let h = derivative(2, shape, |m, a| 0.1 * (m + 1.0) + 0.05 * a);
    let pc = derivative(3, shape, |m, a| 0.02 * (m + 1.0) - 0.01 * a);
    let checker = ResonanceChecker::new(&Constants::default());
    let (fund, dd) = fundamental_moments(
        &g, &h, &pc, &cubic, &quartic, &energies, typ, &checker,
    )
    .unwrap();
    assert!(dd.is_empty());
    let (over, combo) =
        overtone_moments(&g, &h, &cubic, &energies, typ, &checker).unwrap();
    (fund, over, combo)
}

fn check(got: &Tensor, want: &[f64]) {
    for (g, w) in got.iter().zip(want) {
        assert_relative_eq!(*g, *w, max_relative = 1e-12);
    }
}

// the Fermi checks drop the resonant 2ω₁ − ω₀ denominators from the
// fundamental of mode 0 and the overtone of mode 1 only
#[test_case(
    AnharmonicType::Vpt2,
    [0.17504917140817836, 0.03309949954257435, -0.10885017232302951],
    [0.1802056583762142, 0.14708830667035136, 0.11397095496448853]
; "vpt2")]
#[test_case(
    AnharmonicType::Dvpt2,
    [0.22745484640349473, 0.08311787802361292, -0.06121909035626876],
    [0.10065614549272758, 0.12057180237585582, 0.14048745925898407]
; "dvpt2")]
fn dipole_moments(typ: AnharmonicType, fund0: [f64; 3], over1: [f64; 3]) {
    let (fund, over, combo) = fermi_moments(&[3], typ);
    check(&fund[0], &fund0);
    check(
        &fund[1],
        &[0.447171439408728, 0.30273453696207364, 0.15829763451541917],
    );
    check(
        &over[0],
        &[0.03280052404212641, 0.05231189132917174, 0.07182325861621706],
    );
    check(&over[1], &over1);
    let want = [0.10534960828742633, 0.12805369456575413, 0.15075778084408195];
    check(&combo[0][1], &want);
    check(&combo[1][0], &want);
    assert_eq!(combo[0][0], Tensor::zeros(IxDyn(&[3])));
}

#[test_case(AnharmonicType::Vpt2, -0.9605482035166532, -0.08473315527068839
; "vpt2")]
#[test_case(AnharmonicType::Dvpt2, -0.9272409006355592, 0.2599814005577536
; "dvpt2")]
fn polarizability_moments(typ: AnharmonicType, fund0: f64, over1: f64) {
    let (fund, over, combo) = fermi_moments(&[3, 3], typ);
    assert_eq!(fund[0].shape(), &[3, 3]);
    assert_relative_eq!(fund[0][[2, 2]], fund0, max_relative = 1e-12);
    assert_relative_eq!(
        fund[1][[2, 2]],
        -0.708323780164507,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        over[0][[2, 2]],
        0.188891462338489,
        max_relative = 1e-12
    );
    assert_relative_eq!(over[1][[2, 2]], over1, max_relative = 1e-12);
    assert_relative_eq!(
        combo[0][1][[2, 2]],
        0.28698229851404883,
        max_relative = 1e-12
    );
    // the leading component matches the dipole case
    let (dipole, ..) = fermi_moments(&[3], typ);
    assert_relative_eq!(
        fund[0][[0, 0]],
        dipole[0][[0]],
        max_relative = 1e-14
    );
}
