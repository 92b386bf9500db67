//! Conversion of transition moments into spectroscopic intensities

use serde::{Deserialize, Serialize};

use crate::{AnharmonicProperty, Tensor};

pub mod hyper_raman;
pub mod ir;
pub mod raman;

pub use hyper_raman::hyper_raman_intensities;
pub use ir::ir_intensities;
pub use raman::raman_intensities;

/// Raman intensities for one incident frequency
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RamanConfiguration {
    /// incident frequency in the vibrational-mode unit
    pub incident: f64,
    pub intensities: AnharmonicProperty<f64>,
}

/// Hyper-Raman intensities for one incident frequency in the parallel (VV)
/// and perpendicular (HV) polarization setups
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyperRamanConfiguration {
    /// incident frequency in the vibrational-mode unit
    pub incident: f64,
    pub vv: AnharmonicProperty<f64>,
    pub hv: AnharmonicProperty<f64>,
}

/// Apply `f` to each transition moment together with the wavenumber of the
/// same transition. Combination-band diagonal entries are zero
pub(crate) fn per_transition(
    moments: &AnharmonicProperty<Tensor>,
    recp_m: &AnharmonicProperty<f64>,
    f: impl Fn(&Tensor, f64) -> f64,
) -> AnharmonicProperty<f64> {
    let zip = |m: &[Tensor], w: &[f64]| -> Vec<f64> {
        m.iter().zip(w).map(|(m, &w)| f(m, w)).collect()
    };
    let n = moments.nmodes();
    let mut combotones = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                combotones[i][j] =
                    f(&moments.combotones[i][j], recp_m.combotones[i][j]);
            }
        }
    }
    AnharmonicProperty {
        harmonic: zip(&moments.harmonic, &recp_m.harmonic),
        fundamental: zip(&moments.fundamental, &recp_m.fundamental),
        overtones: zip(&moments.overtones, &recp_m.overtones),
        combotones,
    }
}
