//! Post-processing of quantum-chemical response tensors into harmonic and
//! anharmonic vibrational frequencies and IR, Raman, and Hyper-Raman
//! intensities.

#![allow(clippy::too_many_arguments, clippy::needless_range_loop)]

pub mod anharmonic;
pub mod config;
pub mod consts;
pub mod error;
pub mod harmonic;
pub mod intensity;
pub mod molecule;
pub mod moments;
pub mod output;
pub mod property;
pub mod resonance;
pub mod run;
pub mod specs;
pub mod tensor_file;
pub mod transform;
pub mod utils;

pub use anharmonic::AnharmonicType;
pub use config::Config;
pub use consts::Constants;
pub use error::{PhysicalWarning, SpectroError};
pub use harmonic::NormalModeBasis;
pub use molecule::Molecule;
pub use output::Output;
pub use property::AnharmonicProperty;
pub use run::run;
pub use tensor_file::ResponseProperty;


pub type Dvec = nalgebra::DVector<f64>;
pub type Dmat = nalgebra::DMatrix<f64>;

/// dense tensor of arbitrary rank, as read from a tensor file
pub type Tensor = ndarray::ArrayD<f64>;

pub type Tensor3 = ndarray::Array3<f64>;
pub type Tensor4 = ndarray::Array4<f64>;
