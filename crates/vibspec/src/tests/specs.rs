use approx::assert_relative_eq;
use test_case::test_case;

use crate::{
    Constants,
    specs::{
        HyperRamanUnit, IrUnit, RamanCombination, RamanScale, RamanUnit,
        Specifications, SpectroscopyType, VibUnit,
    },
};

#[test]
fn parse_all_categories() {
    let got = Specifications::parse(&[
        "Vib modes: 1/cm",
        "IR: NIMAC, km/mol",
        " Raman: PCPG 45+7, Å^4/amu ",
        "Hyper-Raman: SI complete",
    ])
    .unwrap();
    assert_eq!(
        got,
        Specifications {
            vib: VibUnit::RecpCm,
            ir: Some(IrUnit::NimacKm),
            raman: Some(RamanUnit {
                combination: RamanCombination::FortyFivePlusSeven,
                scale: RamanScale::Pcpg,
            }),
            hyper_raman: Some(HyperRamanUnit::SiComplete),
        }
    );
    assert_eq!(Specifications::parse(&got.tokens()).unwrap(), got);
}

#[test_case(&["IR: SSDG, a.u."] ; "missing vib unit")]
#[test_case(&["Vib modes: Eh", "Vib modes: 1/m"] ; "duplicate vib unit")]
#[test_case(&["Vib modes: Eh", "IR: SSDG, a.u.", "IR: NIMAC, m/mol"] ; "duplicate ir")]
#[test_case(&["Vib modes: cm-1"] ; "unknown unit")]
#[test_case(&["Vib modes Eh"] ; "no separator")]
#[test_case(&["VCD: a.u."] ; "unknown category")]
fn rejected(tokens: &[&str]) {
    let err = Specifications::parse(tokens).unwrap_err();
    assert!(err.is_configuration(), "{err}");
}

#[test]
fn required_units() {
    let specs =
        Specifications::parse(&["Vib modes: 1/s", "IR: MDAC, L/(cm*s*mol)"])
            .unwrap();
    assert_eq!(specs.require_ir().unwrap(), IrUnit::MdacLitre);
    assert!(specs.require_raman().unwrap_err().is_configuration());
    assert!(specs.require_hyper_raman().unwrap_err().is_configuration());
}

#[test]
fn vib_units() {
    let c = Constants::default();
    // 1 Eh is 219474.63 cm⁻¹
    let eh = c.hartree_to_joule;
    assert_relative_eq!(
        eh * VibUnit::RecpCm.from_joule(&c),
        219474.6313702,
        max_relative = 1e-9
    );
    assert_eq!(eh * VibUnit::Hartree.from_joule(&c), 1.0);
    assert_relative_eq!(
        VibUnit::AngularHertz.from_joule(&c),
        2.0 * std::f64::consts::PI * VibUnit::Hertz.from_joule(&c),
        max_relative = 1e-15
    );
    assert_relative_eq!(
        VibUnit::RecpCm.to_hartree(219474.6313702, &c),
        1.0,
        max_relative = 1e-9
    );
}

#[test]
fn spectroscopy_names() {
    for (s, want) in [
        ("IR", SpectroscopyType::Ir),
        ("Raman", SpectroscopyType::Raman),
        ("Hyper-Raman", SpectroscopyType::HyperRaman),
    ] {
        let got: SpectroscopyType = s.parse().unwrap();
        assert_eq!(got, want);
        assert_eq!(got.to_string(), s);
    }
    assert!("VROA".parse::<SpectroscopyType>().is_err());
}

#[test]
fn serde_tokens() {
    let json = r#"["Vib modes: Eh", "Raman: SCS 45+4, SI units"]"#;
    let specs: Specifications = serde_json::from_str(json).unwrap();
    assert_eq!(
        specs.raman.unwrap(),
        RamanUnit {
            combination: RamanCombination::FortyFivePlusFour,
            scale: RamanScale::ScsSi,
        }
    );
    let json = serde_json::to_string(&specs).unwrap();
    assert_eq!(json, r#"["Vib modes: Eh","Raman: SCS 45+4, SI units"]"#);
    let no_vib = r#"["Raman: SCS 45+4, SI units"]"#;
    assert!(serde_json::from_str::<Specifications>(no_vib).is_err());
}
