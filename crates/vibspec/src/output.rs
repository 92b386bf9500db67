use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};

use crate::{
    AnharmonicProperty, AnharmonicType, PhysicalWarning,
    intensity::{HyperRamanConfiguration, RamanConfiguration},
    property::Channel,
    resonance::{FermiResonance, OneOneResonance},
    specs::{Specifications, VibUnit},
};

/// The results of one calculation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// the units of every quantity below
    pub specifications: Specifications,

    /// `None` for a harmonic calculation, whose anharmonic entries are all
    /// zero
    pub anharmonic: Option<AnharmonicType>,

    pub frequencies: AnharmonicProperty<f64>,

    pub ir: Channel<AnharmonicProperty<f64>>,

    pub raman: Channel<Vec<RamanConfiguration>>,

    pub hyper_raman: Channel<Vec<HyperRamanConfiguration>>,

    pub fermi_resonances: Vec<FermiResonance>,

    pub one_one_resonances: Vec<OneOneResonance>,

    pub warnings: Vec<PhysicalWarning>,
}

/// fixed notation for moderate magnitudes, scientific notation otherwise
fn value(v: f64) -> String {
    let a = v.abs();
    if v == 0.0 || (1e-3..1e7).contains(&a) {
        format!("{v:15.4}")
    } else {
        format!("{v:15.6e}")
    }
}

/// Render `p` as one row per mode followed by the combination bands. Only
/// the harmonic column is printed for harmonic calculations
fn write_property(
    w: &mut impl Write,
    title: &str,
    p: &AnharmonicProperty<f64>,
    anharmonic: bool,
) -> std::fmt::Result {
    writeln!(w, "{title}")?;
    if !anharmonic {
        writeln!(w, "{:>5}{:>15}", "Mode", "Harmonic")?;
        for (i, h) in p.harmonic.iter().enumerate() {
            writeln!(w, "{:5}{}", i + 1, value(*h))?;
        }
        return writeln!(w);
    }
    writeln!(
        w,
        "{:>5}{:>15}{:>15}{:>15}",
        "Mode", "Harmonic", "Fundamental", "Overtone"
    )?;
    for i in 0..p.nmodes() {
        writeln!(
            w,
            "{:5}{}{}{}",
            i + 1,
            value(p.harmonic[i]),
            value(p.fundamental[i]),
            value(p.overtones[i])
        )?;
    }
    let n = p.nmodes();
    if n > 1 {
        writeln!(w, "{:>5}{:>5}{:>15}", "Mode", "Mode", "Combination")?;
        for i in 0..n {
            for j in i + 1..n {
                let c = value(p.combotones[i][j]);
                writeln!(w, "{:5}{:5}{c}", i + 1, j + 1)?;
            }
        }
    }
    writeln!(w)
}

impl Output {
    /// unit of `frequencies` and of the incident frequencies of the
    /// Raman-type channels
    pub fn vib_unit(&self) -> VibUnit {
        self.specifications.vib
    }

    fn is_anharmonic(&self) -> bool {
        self.anharmonic.is_some()
    }

    /// a listing of the Fermi and 1-1 resonances found during the
    /// calculation, with 1-based mode numbers
    pub fn resonance_report(&self) -> String {
        let mut ret = String::new();
        if self.fermi_resonances.is_empty() {
            ret.push_str("No Fermi resonances\n");
        } else {
            ret.push_str("Fermi resonances\n");
            ret.push_str(&format!(
                "{:>5}{:>5}{:>5}{:>8}\n",
                "i", "j", "k", "type"
            ));
            for f in &self.fermi_resonances {
                let kind = if f.overtone { "2" } else { "1" };
                ret.push_str(&format!(
                    "{:5}{:5}{:5}{:>8}\n",
                    f.i + 1,
                    f.j + 1,
                    f.k + 1,
                    kind
                ));
            }
        }
        if self.one_one_resonances.is_empty() {
            ret.push_str("No 1-1 resonances\n");
        } else {
            ret.push_str("1-1 resonances\n");
            for r in &self.one_one_resonances {
                ret.push_str(&format!("{:5}{:5}\n", r.i + 1, r.j + 1));
            }
        }
        ret
    }
}

impl Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let anh = self.is_anharmonic();
        let unit = self.vib_unit().symbol();
        let specs = &self.specifications;
        match &self.anharmonic {
            Some(a) => writeln!(f, "{a}")?,
            None => writeln!(f, "Harmonic")?,
        }
        writeln!(f)?;
        write_property(
            f,
            &format!("Vibrational frequencies ({unit})"),
            &self.frequencies,
            anh,
        )?;

        if let (Some(ir), Some(u)) = (self.ir.as_requested(), specs.ir) {
            write_property(
                f,
                &format!("IR intensities ({})", u.symbol()),
                ir,
                anh,
            )?;
        }
        if let (Some(raman), Some(u)) = (self.raman.as_requested(), specs.raman)
        {
            for c in raman {
                write_property(
                    f,
                    &format!(
                        "Raman intensities ({}), incident frequency {} {unit}",
                        u.symbol(),
                        value(c.incident).trim()
                    ),
                    &c.intensities,
                    anh,
                )?;
            }
        }
        if let (Some(hr), Some(u)) =
            (self.hyper_raman.as_requested(), specs.hyper_raman)
        {
            for c in hr {
                let incident = value(c.incident);
                let incident = incident.trim();
                write_property(
                    f,
                    &format!(
                        "Hyper-Raman VV intensities ({}), incident \
                         frequency {incident} {unit}",
                        u.symbol()
                    ),
                    &c.vv,
                    anh,
                )?;
                write_property(
                    f,
                    &format!(
                        "Hyper-Raman HV intensities ({}), incident \
                         frequency {incident} {unit}",
                        u.symbol()
                    ),
                    &c.hv,
                    anh,
                )?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "Warnings")?;
            for w in &self.warnings {
                writeln!(f, "{w}")?;
            }
        }
        Ok(())
    }
}
