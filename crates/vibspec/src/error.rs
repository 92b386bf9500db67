use std::{error::Error, fmt::Display};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum SpectroError {
    /// failed to read a file: path and the kind of IO error
    Io(String, std::io::ErrorKind),

    /// malformed tensor or molecule file
    Format {
        path: String,
        line: usize,
        msg: String,
    },

    /// tensor file version other than 1
    FormatVersion { path: String, version: String },

    /// unrecognized specification token, anharmonic type, or inconsistent
    /// request
    Configuration(String),

    /// tensor shapes inconsistent with each other or with the molecule
    DimensionMismatch(String),

    /// a response property needed for the request is absent from the tensor
    /// file
    MissingProperty(String),
}

impl SpectroError {
    pub(crate) fn format(
        path: impl Into<String>,
        line: usize,
        msg: impl Into<String>,
    ) -> Self {
        Self::Format {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }

    /// Returns `true` if the error is [`Configuration`].
    ///
    /// [`Configuration`]: SpectroError::Configuration
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(..))
    }
}

impl Display for SpectroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectroError::Io(path, kind) => {
                write!(f, "failed to read {path}: {kind}")
            }
            SpectroError::Format { path, line, msg } => {
                write!(f, "{path}:{line}: {msg}")
            }
            SpectroError::FormatVersion { path, version } => write!(
                f,
                "{path}: unsupported tensor file version {version}, \
                 only version 1 is supported"
            ),
            SpectroError::Configuration(msg) => {
                write!(f, "configuration error: {msg}")
            }
            SpectroError::DimensionMismatch(msg) => {
                write!(f, "dimension mismatch: {msg}")
            }
            SpectroError::MissingProperty(msg) => {
                write!(f, "missing property: {msg}")
            }
        }
    }
}

impl Error for SpectroError {}

/// Conditions that make part of a result physically questionable without
/// invalidating the rest of the calculation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PhysicalWarning {
    /// negative Hessian eigenvalue. `energy` is the signed harmonic energy in
    /// Hartree
    ImaginaryFrequency { mode: usize, energy: f64 },

    /// vanishing harmonic frequency
    ZeroFrequency { mode: usize },

    /// high-frequency modes were cut off by the frequency limits. Anharmonic
    /// corrections on the remaining modes are only approximate
    ModeCutoff { mode_min: usize },
}

impl Display for PhysicalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicalWarning::ImaginaryFrequency { mode, energy } => write!(
                f,
                "mode {mode} has an imaginary harmonic frequency ({energy:.6e} Eh)"
            ),
            PhysicalWarning::ZeroFrequency { mode } => {
                write!(f, "mode {mode} has a zero harmonic frequency")
            }
            PhysicalWarning::ModeCutoff { mode_min } => write!(
                f,
                "the {mode_min} highest-frequency modes were cut off; \
                 anharmonic corrections on a truncated mode set may be \
                 severely affected"
            ),
        }
    }
}
