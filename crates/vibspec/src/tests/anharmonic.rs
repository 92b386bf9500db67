use approx::assert_relative_eq;
use test_case::test_case;

use crate::{
    AnharmonicType, Constants, Tensor3, Tensor4,
    anharmonic::{adjust_for_fermi_resonance, get_x, vibrational_energies},
    resonance::{Coupling, FermiResonance, ResonanceChecker, ResonanceTest},
    tests::cm,
    utils::symm_eigen_decomp,
};

/// fails the test if it is ever consulted
struct Panicking;

impl ResonanceTest for Panicking {
    fn is_fermi_resonance(&self, _: f64, _: f64, _: bool) -> bool {
        panic!("resonance checker consulted");
    }

    fn is_11_resonance(&self, _: f64, _: f64, _: Coupling) -> bool {
        panic!("resonance checker consulted");
    }
}

/// a fully symmetric cubic force field in J
fn cubic(n: usize, scale: f64) -> Tensor3 {
    Tensor3::from_shape_fn((n, n, n), |(i, j, k)| {
        let s = i + j + k;
        cm(scale * ((s * s + i * j * k + 1) as f64).sin())
    })
}

fn quartic(n: usize, scale: f64) -> Tensor4 {
    Tensor4::from_shape_fn((n, n, n, n), |(i, j, k, l)| {
        let s = i + j + k + l;
        cm(scale * ((s * s + i * j * k * l + 2) as f64).cos())
    })
}

#[test]
fn null_force_field() {
    let energies = [cm(2000.0), cm(1000.0)];
    let checker = ResonanceChecker::new(&Constants::default());
    let (got, fermi) = vibrational_energies(
        &energies,
        &Tensor3::zeros((2, 2, 2)),
        &Tensor4::zeros((2, 2, 2, 2)),
        AnharmonicType::Vpt2,
        &checker,
    );
    assert!(fermi.is_empty());
    assert_eq!(got.fundamental, got.harmonic);
    for i in 0..2 {
        assert_eq!(got.overtones[i], 2.0 * got.fundamental[i]);
    }
    assert_eq!(got.combotones[0][1], energies[0] + energies[1]);
    assert_eq!(got.combotones[0][0], 0.0);
}

#[test]
fn vpt2_never_checks() {
    let energies = [cm(3000.0), cm(1510.0), cm(1490.0)];
    let (x, fermi) = get_x(
        &energies,
        &cubic(3, 50.0),
        &quartic(3, 5.0),
        &Panicking,
        false,
    );
    assert!(fermi.is_empty());
    assert!(x.iter().all(|v| v.is_finite()));
}

#[test]
fn single_mode() {
    // x = φ4/16 - 5φ3²/(48ω) for a lone oscillator
    let w = cm(4000.0);
    let (f3, f4) = (cm(-600.0), cm(150.0));
    let (x, _) = get_x(
        &[w],
        &Tensor3::from_elem((1, 1, 1), f3),
        &Tensor4::from_elem((1, 1, 1, 1), f4),
        &Panicking,
        false,
    );
    assert_relative_eq!(
        x[(0, 0)],
        f4 / 16.0 - 5.0 * f3 * f3 / (48.0 * w),
        max_relative = 1e-12
    );
}

#[test_case(AnharmonicType::Vpt2)]
#[test_case(AnharmonicType::Dvpt2)]
#[test_case(AnharmonicType::FreqGvpt2IntDvpt2)]
#[test_case(AnharmonicType::FreqGvpt2IntDvpt2With11Forced)]
fn combotones_symmetric(typ: AnharmonicType) {
    let energies = [cm(3100.0), cm(1600.0), cm(1540.0), cm(800.0)];
    let checker = ResonanceChecker::new(&Constants::default());
    let (got, _) = vibrational_energies(
        &energies,
        &cubic(4, 40.0),
        &quartic(4, 4.0),
        typ,
        &checker,
    );
    for i in 0..4 {
        assert_eq!(got.combotones[i][i], 0.0);
        for j in 0..4 {
            assert_eq!(got.combotones[i][j], got.combotones[j][i]);
        }
    }
}

#[test]
fn resonance_removal() {
    // 2ω₁ is within 20 cm⁻¹ of ω₀
    let energies = [cm(3000.0), cm(1510.0)];
    let mut phi3 = Tensor3::zeros((2, 2, 2));
    for [i, j, k] in [[0, 1, 1], [1, 0, 1], [1, 1, 0]] {
        phi3[[i, j, k]] = cm(200.0);
    }
    let phi4 = Tensor4::zeros((2, 2, 2, 2));
    let checker = ResonanceChecker::new(&Constants::default());
    let (_, none) = vibrational_energies(
        &energies,
        &phi3,
        &phi4,
        AnharmonicType::Vpt2,
        &checker,
    );
    assert!(none.is_empty());
    let (dvpt2, fermi) = vibrational_energies(
        &energies,
        &phi3,
        &phi4,
        AnharmonicType::Dvpt2,
        &checker,
    );
    assert_eq!(fermi, vec![FermiResonance::new(0, 1, 1, true)]);
    let (gvpt2, fermi2) = vibrational_energies(
        &energies,
        &phi3,
        &phi4,
        AnharmonicType::FreqGvpt2IntDvpt2,
        &checker,
    );
    assert_eq!(fermi, fermi2);
    // the variational step mixes the resonant pair and leaves their sum alone
    assert_relative_eq!(
        gvpt2.fundamental[0] + gvpt2.overtones[1],
        dvpt2.fundamental[0] + dvpt2.overtones[1],
        max_relative = 1e-10
    );
    assert!((gvpt2.fundamental[0] - dvpt2.fundamental[0]).abs() > cm(1.0));
    assert_relative_eq!(
        gvpt2.fundamental[1],
        dvpt2.fundamental[1],
        max_relative = 1e-12
    );
}

#[test]
fn greedy_assignment() {
    let fund = [cm(3000.0), cm(1500.0)];
    let over = [cm(5990.0), cm(2990.0)];
    let combo = vec![vec![0.0, cm(4490.0)], vec![cm(4490.0), 0.0]];
    let mut phi3 = Tensor3::zeros((2, 2, 2));
    phi3[[1, 1, 0]] = cm(80.0);
    let fermi = [FermiResonance::new(0, 1, 1, true)];
    let (f, o, c) =
        adjust_for_fermi_resonance(&fund, &over, &combo, &phi3, &fermi);

    // the 2x2 block of ν₀ and 2ν₁
    let mut block = crate::Dmat::zeros(2, 2);
    block[(0, 0)] = fund[0];
    block[(1, 1)] = over[1];
    block[(0, 1)] = cm(20.0);
    block[(1, 0)] = cm(20.0);
    let (vals, _) = symm_eigen_decomp(block, true);
    // ν₀ lies above 2ν₁ and keeps the upper state
    assert_relative_eq!(f[0], vals[0], max_relative = 1e-12);
    assert_relative_eq!(o[1], vals[1], max_relative = 1e-12);
    assert_relative_eq!(f[1], fund[1], max_relative = 1e-12);
    assert_relative_eq!(o[0], over[0], max_relative = 1e-12);
    assert_relative_eq!(c[0][1], combo[0][1], max_relative = 1e-12);
    assert_eq!(c[0][1], c[1][0]);
}

#[test]
fn parse_types() {
    for typ in AnharmonicType::ALL {
        assert_eq!(typ.to_string().parse::<AnharmonicType>().unwrap(), typ);
    }
    assert_eq!(
        "Anharmonic".parse::<AnharmonicType>().unwrap(),
        AnharmonicType::FreqGvpt2IntDvpt2With11
    );
    assert_eq!(
        "Anharmonic:DVPT2".parse::<AnharmonicType>().unwrap(),
        AnharmonicType::Dvpt2
    );
    // the prefix is part of the name
    assert!("DVPT2".parse::<AnharmonicType>().is_err());
    assert!("Anharmonic: VPT3".parse::<AnharmonicType>().is_err());
}

#[test]
fn flags() {
    let f = AnharmonicType::Vpt2.flags();
    assert!(!f.resonance_checks && !f.variational_correction && !f.dd_check);
    let f = AnharmonicType::FreqDvpt2IntVpt2.flags();
    assert!(f.resonance_checks && !f.moment_fermi_checks);
    let f = AnharmonicType::FreqGvpt2IntDvpt2With11Forced.flags();
    assert!(f.variational_correction && f.dd_check && f.forced_dd_removal);
}
