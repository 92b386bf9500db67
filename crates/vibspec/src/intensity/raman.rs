use crate::{
    AnharmonicProperty, Constants, Tensor,
    intensity::per_transition,
    specs::{RamanScale, RamanUnit},
};

/// isotropic invariant (tr α / 3)² of the 3×3 polarizability tensor `a`
pub fn a2(a: &Tensor) -> f64 {
    ((a[[0, 0]] + a[[1, 1]] + a[[2, 2]]) / 3.0).powi(2)
}

/// anisotropic invariant γ² of the 3×3 polarizability tensor `a`
pub fn b2(a: &Tensor) -> f64 {
    0.5 * ((a[[0, 0]] - a[[1, 1]]).powi(2)
        + (a[[1, 1]] - a[[2, 2]]).powi(2)
        + (a[[2, 2]] - a[[0, 0]]).powi(2)
        + 6.0 * (a[[0, 1]].powi(2) + a[[1, 2]].powi(2) + a[[0, 2]].powi(2)))
}

/// Raman intensity in `unit` of a transition at `recp_m` (m⁻¹) with SI
/// transition polarizability `m`, for light incident at `incident` (m⁻¹) and
/// a sample at `temperature`
pub fn raman_intensity(
    m: &Tensor,
    recp_m: f64,
    incident: f64,
    temperature: f64,
    unit: RamanUnit,
    c: &Constants,
) -> f64 {
    if recp_m == 0.0 {
        return 0.0;
    }
    let combined = 45.0 * a2(m) + unit.combination.anisotropic_weight() * b2(m);
    let cpg_au = || {
        combined / c.qi2(recp_m) / c.polarizability_gradient_au().powi(2)
    };
    match unit.scale {
        RamanScale::CpgAu => cpg_au(),
        RamanScale::Pcpg => {
            let a0_ang = c.bohr_to_meter * 1e10;
            cpg_au() * a0_ang.powi(4) * c.amu_to_electron_mass
        }
        RamanScale::ScsSi => {
            combined * (incident - recp_m).powi(4)
                / c.exp_denominator(recp_m, temperature)
        }
    }
}

/// Raman intensities in `unit` from the SI transition polarizabilities and
/// the wavenumbers in m⁻¹ of every transition
pub fn raman_intensities(
    moments: &AnharmonicProperty<Tensor>,
    recp_m: &AnharmonicProperty<f64>,
    incident: f64,
    temperature: f64,
    unit: RamanUnit,
    constants: &Constants,
) -> AnharmonicProperty<f64> {
    per_transition(moments, recp_m, |m, w| {
        raman_intensity(m, w, incident, temperature, unit, constants)
    })
}
