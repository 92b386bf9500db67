use std::ops::MulAssign;

use serde::{Deserialize, Serialize};

/// Harmonic, fundamental, overtone, and combination-band values of one
/// physical quantity, one entry per normal mode. `combotones` is indexed by
/// mode pair, symmetric, and zero on the diagonal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnharmonicProperty<T> {
    pub harmonic: Vec<T>,
    pub fundamental: Vec<T>,
    pub overtones: Vec<T>,
    pub combotones: Vec<Vec<T>>,
}

impl<T> AnharmonicProperty<T> {
    pub fn new(
        harmonic: Vec<T>,
        fundamental: Vec<T>,
        overtones: Vec<T>,
        combotones: Vec<Vec<T>>,
    ) -> Self {
        Self {
            harmonic,
            fundamental,
            overtones,
            combotones,
        }
    }

    pub fn nmodes(&self) -> usize {
        self.harmonic.len()
    }

    /// apply `f` to every entry, including the combination-band diagonal
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> AnharmonicProperty<U> {
        AnharmonicProperty {
            harmonic: self.harmonic.iter().map(&f).collect(),
            fundamental: self.fundamental.iter().map(&f).collect(),
            overtones: self.overtones.iter().map(&f).collect(),
            combotones: self
                .combotones
                .iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
        }
    }
}

impl<T: Clone> AnharmonicProperty<T> {
    /// a property with only harmonic values. every anharmonic entry is `zero`
    pub fn harmonic_only(harmonic: Vec<T>, zero: T) -> Self {
        let n = harmonic.len();
        Self {
            fundamental: vec![zero.clone(); n],
            overtones: vec![zero.clone(); n],
            combotones: vec![vec![zero; n]; n],
            harmonic,
        }
    }
}

impl<T: MulAssign<f64>> AnharmonicProperty<T> {
    /// multiply every entry by the unit conversion `factor`
    pub fn scaled(mut self, factor: f64) -> Self {
        self.harmonic.iter_mut().for_each(|x| *x *= factor);
        self.fundamental.iter_mut().for_each(|x| *x *= factor);
        self.overtones.iter_mut().for_each(|x| *x *= factor);
        self.combotones
            .iter_mut()
            .flatten()
            .for_each(|x| *x *= factor);
        self
    }
}

/// The result of an optional spectroscopy channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Channel<T> {
    Requested(T),
    NotRequested,
}

impl<T> Channel<T> {
    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Requested(..))
    }

    pub fn as_requested(&self) -> Option<&T> {
        match self {
            Channel::Requested(t) => Some(t),
            Channel::NotRequested => None,
        }
    }
}
