use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Physical constants and resonance thresholds shared by every stage of a
/// calculation. The default values are the CODATA 2014 recommendations, which
/// the reference data in the test suite were generated with.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constants {
    /// Planck constant in J s
    pub planck: f64,

    /// speed of light in m/s
    pub speed_of_light: f64,

    /// J per Hartree
    pub hartree_to_joule: f64,

    /// elementary charge in C
    pub elementary_charge: f64,

    /// m per Bohr
    pub bohr_to_meter: f64,

    /// electron mass in kg
    pub electron_mass: f64,

    /// kg per unified atomic mass unit
    pub amu_to_kg: f64,

    /// electron masses per unified atomic mass unit
    pub amu_to_electron_mass: f64,

    /// Boltzmann constant in J/K
    pub boltzmann: f64,

    /// Avogadro constant in 1/mol
    pub avogadro: f64,

    /// vacuum permittivity in F/m
    pub vacuum_permittivity: f64,

    /// C m per Debye
    pub debye: f64,

    /// maximum |energy difference| in cm⁻¹ for a Fermi resonance
    pub fermi_threshold: f64,

    /// minimum |Martin parameter| in cm⁻¹ for a Fermi resonance
    pub martin_threshold: f64,

    /// maximum |energy difference| in cm⁻¹ for a 1-1 resonance
    pub dd_delta_threshold: f64,

    /// minimum |coupling| in cm⁻¹ for a 1-1 resonance
    pub dd_coupling_threshold: f64,

    /// minimum |coupling / delta²| for a 1-1 resonance
    pub dd_ratio_threshold: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            planck: 6.626070040e-34,
            speed_of_light: 299792458.0,
            hartree_to_joule: 4.359744650e-18,
            elementary_charge: 1.6021766208e-19,
            bohr_to_meter: 0.52917721067e-10,
            electron_mass: 9.10938356e-31,
            amu_to_kg: 1.660539040e-27,
            amu_to_electron_mass: 1822.888486,
            boltzmann: 1.38064852e-23,
            avogadro: 6.022140857e23,
            vacuum_permittivity: 8.854187817e-12,
            debye: 3.33564e-30,
            fermi_threshold: 200.0,
            martin_threshold: 1.0,
            dd_delta_threshold: 100.0,
            dd_coupling_threshold: 10.0,
            dd_ratio_threshold: 1.0,
        }
    }
}

impl Constants {
    /// J per cm⁻¹
    pub fn wavenumber_to_joule(&self) -> f64 {
        self.planck * self.speed_of_light * 100.0
    }

    /// the Fermi threshold converted to J
    pub fn fermi_threshold_joule(&self) -> f64 {
        self.fermi_threshold * self.wavenumber_to_joule()
    }

    /// the Martin threshold converted to J
    pub fn martin_threshold_joule(&self) -> f64 {
        self.martin_threshold * self.wavenumber_to_joule()
    }

    /// Convert an energy in J to a wavenumber in m⁻¹
    pub fn joule_to_recp_m(&self, e: f64) -> f64 {
        e / (self.planck * self.speed_of_light)
    }

    /// the reduced-coordinate prefactor squared, h/(8π²cν̃), for a wavenumber
    /// in m⁻¹
    pub fn qi2(&self, recp_m: f64) -> f64 {
        self.planck / (8.0 * PI * PI * self.speed_of_light * recp_m)
    }

    /// the Boltzmann population factor 1 − exp(−hcν̃/kT). A temperature of
    /// zero disables the factor
    pub fn exp_denominator(&self, recp_m: f64, temperature: f64) -> f64 {
        if temperature == 0.0 {
            return 1.0;
        }
        1.0 - f64::exp(
            -self.planck * self.speed_of_light * recp_m
                / (self.boltzmann * temperature),
        )
    }

    /// atomic unit in SI of a force constant of geometric `rank`,
    /// Eh/(a0^rank me^(rank/2))
    pub fn force_constant_au(&self, rank: i32) -> f64 {
        self.hartree_to_joule
            / (self.bohr_to_meter.powi(rank)
                * self.electron_mass.powf(0.5 * rank as f64))
    }

    /// Atomic unit in SI of the `geometric_rank`-th derivative of a response
    /// property with `n_el` electric field perturbations. The dipole moment
    /// (`n_el = 1`) has the unit e a0, and each further field divides by the
    /// field unit Eh/(e a0)
    pub fn property_derivative_au(&self, n_el: i32, geometric_rank: i32) -> f64 {
        let e = self.elementary_charge;
        let a0 = self.bohr_to_meter;
        let eh = self.hartree_to_joule;
        e.powi(n_el) * a0.powi(n_el - geometric_rank)
            / (eh.powi(n_el - 1)
                * self.electron_mass.powf(0.5 * geometric_rank as f64))
    }

    /// atomic unit of the polarizability gradient, e²a0/(Eh√me), in SI
    pub fn polarizability_gradient_au(&self) -> f64 {
        self.property_derivative_au(2, 1)
    }
}
