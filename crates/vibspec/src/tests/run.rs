use std::io::Write;

use approx::assert_relative_eq;

use crate::{
    AnharmonicType, Config, Constants, Output, SpectroError,
    property::Channel,
    run,
    specs::{Specifications, SpectroscopyType},
    tests::{hf, hf_reduced_mass, testfile},
};

fn load(name: &str) -> (Config, Constants) {
    let config = Config::load(testfile(name)).unwrap();
    let constants = config.constants();
    (config, constants)
}

fn harmonic_wavenumber(c: &Constants) -> f64 {
    (hf::K / hf_reduced_mass(c)).sqrt()
}

#[test]
fn harmonic() {
    let (config, c) = load("harmonic.toml");
    let got = run(&config, &c).unwrap();
    let mu = hf_reduced_mass(&c);

    assert_eq!(got.frequencies.nmodes(), 1);
    assert_relative_eq!(
        got.frequencies.harmonic[0],
        harmonic_wavenumber(&c),
        max_relative = 1e-10
    );
    assert_eq!(got.frequencies.fundamental, vec![0.0]);
    assert!(got.warnings.is_empty());
    assert!(got.fermi_resonances.is_empty());

    let Channel::Requested(ir) = &got.ir else {
        panic!("IR not requested");
    };
    assert_relative_eq!(
        ir.harmonic[0],
        hf::Q * hf::Q / mu,
        max_relative = 1e-8
    );

    // the repeated 0.0656 Eh configuration is skipped
    let raman = got.raman.as_requested().unwrap();
    assert_eq!(raman.len(), 2);
    assert_relative_eq!(raman[0].incident, 0.0656, max_relative = 1e-12);
    assert_relative_eq!(raman[1].incident, 0.0856, max_relative = 1e-12);
    let iso = (2.0 * hf::A_PERP + hf::A_PAR) / 3.0;
    let aniso = hf::A_PAR - hf::A_PERP;
    let want = (45.0 * iso * iso + 7.0 * aniso * aniso) / mu;
    for r in raman {
        assert_relative_eq!(
            r.intensities.harmonic[0],
            want,
            max_relative = 1e-8
        );
    }

    // only β_zzz changes along the bond
    let hr = got.hyper_raman.as_requested().unwrap();
    assert_eq!(hr.len(), 1);
    assert_relative_eq!(hr[0].incident, 0.0656, max_relative = 1e-12);
    assert_relative_eq!(hr[0].vv.harmonic[0], 1.0, max_relative = 1e-12);
    assert_relative_eq!(hr[0].hv.harmonic[0], 0.2, max_relative = 1e-10);
}

#[test]
fn harmonic_display() {
    let (config, c) = load("harmonic.toml");
    let got = run(&config, &c).unwrap();
    insta::assert_snapshot!(got.to_string(), @r"
    Harmonic

    Vibrational frequencies (Eh)
     Mode       Harmonic
        1         0.0190

    IR intensities (SSDG, a.u.)
     Mode       Harmonic
        1    9.635419e-5

    Raman intensities (CPG 45+7, a.u.), incident frequency 0.0656 Eh
     Mode       Harmonic
        1         0.0290

    Raman intensities (CPG 45+7, a.u.), incident frequency 0.0856 Eh
     Mode       Harmonic
        1         0.0290

    Hyper-Raman VV intensities (Relative), incident frequency 0.0656 Eh
     Mode       Harmonic
        1         1.0000

    Hyper-Raman HV intensities (Relative), incident frequency 0.0656 Eh
     Mode       Harmonic
        1         0.2000
    ");
    assert_eq!(
        got.resonance_report(),
        "No Fermi resonances\nNo 1-1 resonances\n"
    );
}

#[test]
fn anharmonic() {
    let (config, c) = load("anharmonic.toml");
    let got = run(&config, &c).unwrap();
    assert_eq!(got.anharmonic, Some(AnharmonicType::Vpt2));

    // x = φ₄/16 − 5φ₃²/(48ω) in reduced coordinates
    let mu = hf_reduced_mass(&c);
    let w = harmonic_wavenumber(&c);
    let phi3 = hf::F3 / (mu * w).powf(1.5);
    let phi4 = hf::F4 / (mu * w).powi(2);
    let x = phi4 / 16.0 - 5.0 * phi3 * phi3 / (48.0 * w);
    let f = &got.frequencies;
    assert_relative_eq!(f.harmonic[0], w, max_relative = 1e-10);
    assert_relative_eq!(f.fundamental[0], w + 2.0 * x, max_relative = 1e-8);
    assert_relative_eq!(
        f.overtones[0],
        2.0 * w + 6.0 * x,
        max_relative = 1e-8
    );
    assert!(f.fundamental[0] < f.harmonic[0]);

    let ir = got.ir.as_requested().unwrap();
    assert_relative_eq!(
        ir.harmonic[0],
        hf::Q * hf::Q / mu,
        max_relative = 1e-8
    );
    // electrical anharmonicity is absent, so the fundamental differs from
    // the harmonic band only through the force field
    assert!(ir.fundamental[0].is_finite() && ir.fundamental[0] > 0.0);
    assert!(ir.overtones[0].is_finite());
    assert_ne!(ir.fundamental[0], ir.harmonic[0]);

    let raman = got.raman.as_requested().unwrap();
    assert_eq!(raman.len(), 2);
    assert!(!got.hyper_raman.is_requested());
}

#[test]
fn json_output() {
    let (config, c) = load("anharmonic.toml");
    let got = run(&config, &c).unwrap();
    let json = serde_json::to_string(&got).unwrap();
    let back: Output = serde_json::from_str(&json).unwrap();
    assert_eq!(back.specifications, got.specifications);
    assert_eq!(back.anharmonic, got.anharmonic);
    assert_eq!(back.fermi_resonances, got.fermi_resonances);
    assert_relative_eq!(
        back.frequencies.overtones[0],
        got.frequencies.overtones[0],
        max_relative = 1e-14
    );
    let raman = back.raman.as_requested().unwrap();
    assert_eq!(raman.len(), 2);
}

#[test]
fn anharmonic_hyper_raman() {
    // the file has no hyperpolarizability Hessian or cubic derivatives
    let (config, c) = load("harmonic.toml");
    let config = config.anharmonic(Some(AnharmonicType::Dvpt2));
    let err = run(&config, &c).unwrap_err();
    assert!(matches!(err, SpectroError::MissingProperty(_)), "{err}");
}

/// a copy of hf.tensor with only the molecular Hessian
fn hessian_only() -> tempfile::NamedTempFile {
    let full = std::fs::read_to_string(testfile("hf.tensor")).unwrap();
    let mut blocks = full.split("NEW_PROPERTY\n");
    let header = blocks.next().unwrap().replace("10", "1");
    let hessian = blocks.next().unwrap();
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{header}NEW_PROPERTY\n{hessian}").unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn missing_property() {
    let tensor = hessian_only();
    let specs =
        Specifications::parse(&["Vib modes: 1/cm", "IR: NIMAC, km/mol"])
            .unwrap();
    let config = Config::new(tensor.path(), testfile("hf.xyz"), specs);
    let c = Constants::default();

    // the Hessian alone is enough for harmonic frequencies
    let got = run(&config, &c).unwrap();
    assert!(!got.ir.is_requested());
    let want =
        harmonic_wavenumber(&c) * c.hartree_to_joule / c.wavenumber_to_joule();
    assert_relative_eq!(
        got.frequencies.harmonic[0],
        want,
        max_relative = 1e-10
    );

    let ir = config.clone().spectroscopy(vec![SpectroscopyType::Ir]);
    let err = run(&ir, &c).unwrap_err();
    assert!(matches!(err, SpectroError::MissingProperty(_)), "{err}");

    let anh = config.anharmonic(Some(AnharmonicType::Vpt2));
    let err = run(&anh, &c).unwrap_err();
    assert!(matches!(err, SpectroError::MissingProperty(_)), "{err}");
}

/// a copy of hf.tensor with `from` replaced by `to`
fn edited_tensor(from: &str, to: &str) -> tempfile::NamedTempFile {
    let full = std::fs::read_to_string(testfile("hf.tensor")).unwrap();
    assert!(full.contains(from));
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(full.replacen(from, to, 1).as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn non_cartesian_field_axes() {
    let c = Constants::default();
    let raman = edited_tensor(
        "GEO EL EL\nNUM_COMPONENTS\n6 3 3",
        "GEO EL EL\nNUM_COMPONENTS\n6 4 4",
    );
    let specs = Specifications::parse(&[
        "Vib modes: Eh",
        "Raman: CPG 45+7, a.u.",
    ])
    .unwrap();
    let config = Config::new(raman.path(), testfile("hf.xyz"), specs)
        .spectroscopy(vec![SpectroscopyType::Raman]);
    let err = run(&config, &c).unwrap_err();
    assert!(matches!(err, SpectroError::DimensionMismatch(_)), "{err}");

    let ir = edited_tensor(
        "GEO EL\nNUM_COMPONENTS\n6 3",
        "GEO EL\nNUM_COMPONENTS\n6 4",
    );
    let specs =
        Specifications::parse(&["Vib modes: Eh", "IR: SSDG, a.u."]).unwrap();
    let config = Config::new(ir.path(), testfile("hf.xyz"), specs)
        .spectroscopy(vec![SpectroscopyType::Ir]);
    let err = run(&config, &c).unwrap_err();
    assert!(matches!(err, SpectroError::DimensionMismatch(_)), "{err}");
}

#[test]
fn frequency_window() {
    let (config, c) = load("harmonic.toml");
    let config = config.frequency_limits(Some((0.1, 0.2)));
    let err = run(&config, &c).unwrap_err();
    assert!(err.is_configuration(), "{err}");

    let (config, c) = load("harmonic.toml");
    let config = config.frequency_limits(Some((0.01, 0.02)));
    let got = run(&config, &c).unwrap();
    assert_eq!(got.frequencies.nmodes(), 1);
}
