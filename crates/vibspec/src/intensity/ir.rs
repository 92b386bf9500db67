use std::f64::consts::{LN_10, PI};

use crate::{
    AnharmonicProperty, Constants, Tensor, intensity::per_transition,
    specs::IrUnit,
};

/// Convert the SI transition dipole moment `m` of a transition at `recp_m`
/// (m⁻¹) into an intensity in `unit`
pub fn ir_intensity(m: &Tensor, recp_m: f64, unit: IrUnit, c: &Constants) -> f64 {
    let m2: f64 = m.iter().map(|x| x * x).sum();
    // summed squared dipole gradient in C²/kg
    let ssdg = m2 * 8.0 * PI * PI * c.speed_of_light * recp_m / c.planck;
    // Naperian integrated molar absorption coefficient in m/mol
    let nimac = 2.0 * PI * PI * c.avogadro * recp_m * m2
        / (3.0 * c.vacuum_permittivity * c.planck * c.speed_of_light);
    match unit {
        IrUnit::SsdgSi => ssdg,
        IrUnit::SsdgAu => {
            ssdg * c.electron_mass / c.elementary_charge.powi(2)
        }
        IrUnit::SsdgDebye => {
            // (D/Å)²/amu in C²/kg
            let debye_ang = c.debye / 1e-10;
            ssdg / (debye_ang * debye_ang / c.amu_to_kg)
        }
        IrUnit::NimacSi => nimac,
        IrUnit::NimacKm => nimac / 1000.0,
        IrUnit::MdacSi => nimac * c.speed_of_light / LN_10,
        IrUnit::MdacLitre => nimac * c.speed_of_light / LN_10 * 10.0,
    }
}

/// IR intensities in `unit` from the SI transition dipole moments and the
/// wavenumbers in m⁻¹ of every transition
pub fn ir_intensities(
    moments: &AnharmonicProperty<Tensor>,
    recp_m: &AnharmonicProperty<f64>,
    unit: IrUnit,
    constants: &Constants,
) -> AnharmonicProperty<f64> {
    per_transition(moments, recp_m, |m, w| {
        ir_intensity(m, w, unit, constants)
    })
}
