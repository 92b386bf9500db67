//! The full calculation from a job [Config] to its [Output]

use log::{debug, info};
use ndarray::{Ix3, Ix4, IxDyn};

use crate::{
    AnharmonicProperty, AnharmonicType, Config, Constants, Dmat, Molecule,
    NormalModeBasis, Output, ResponseProperty, SpectroError, Tensor, Tensor3,
    Tensor4,
    anharmonic::vibrational_energies,
    harmonic::analyze,
    intensity::{
        HyperRamanConfiguration, RamanConfiguration, hyper_raman_intensities,
        ir_intensities, raman_intensities,
    },
    moments::{harmonic_moment, transition_moments},
    property::Channel,
    resonance::{OneOneResonance, ResonanceChecker},
    specs::SpectroscopyType,
    tensor_file::{self, EL},
    transform::to_reduced,
};

/// The parsed contents of a tensor file
struct Properties {
    props: Vec<ResponseProperty>,
    tensors: Vec<Tensor>,
}

impl Properties {
    /// positions of every configuration of the property with `n_el` electric
    /// field and `n_geo` geometric perturbations, in file order
    fn find(&self, n_el: usize, n_geo: usize) -> Vec<usize> {
        self.props
            .iter()
            .enumerate()
            .filter(|(_, p)| p.signature() == (n_el, n_geo))
            .map(|(i, _)| i)
            .collect()
    }

    /// like [Properties::find], but at least one configuration must be present
    /// and every electric field axis must be Cartesian
    fn require(
        &self,
        n_el: usize,
        n_geo: usize,
        what: &str,
    ) -> Result<Vec<usize>, SpectroError> {
        let ret = self.find(n_el, n_geo);
        if ret.is_empty() {
            return Err(SpectroError::MissingProperty(format!(
                "no {what} ({n_el} EL, {n_geo} GEO) in the tensor file"
            )));
        }
        for &i in &ret {
            let p = &self.props[i];
            let bad = p
                .operators
                .iter()
                .zip(&p.components)
                .any(|(op, &n)| op.trim().eq_ignore_ascii_case(EL) && n != 3);
            if bad {
                return Err(SpectroError::DimensionMismatch(format!(
                    "{what} with components {:?}, electric field axes need 3",
                    p.components
                )));
            }
        }
        Ok(ret)
    }

    /// the tensor at `idx` with its geometric axes moved to the front
    fn tensor(&self, idx: usize) -> Tensor {
        let perm = self.props[idx].geometric_first();
        self.tensors[idx]
            .view()
            .permuted_axes(IxDyn(&perm))
            .as_standard_layout()
            .into_owned()
    }
}

fn hessian_matrix(t: &Tensor) -> Result<Dmat, SpectroError> {
    match t.shape() {
        &[n, m] if n == m => Ok(Dmat::from_fn(n, n, |i, j| t[[i, j]])),
        s => Err(SpectroError::DimensionMismatch(format!(
            "molecular Hessian of shape {s:?}"
        ))),
    }
}

/// The pieces of a calculation shared by every spectroscopy channel
struct Job<'a> {
    basis: NormalModeBasis,
    constants: &'a Constants,
    checker: ResonanceChecker,

    /// harmonic energies in J
    energies: Vec<f64>,

    /// harmonic wavenumbers in m⁻¹
    recp_m: Vec<f64>,

    qi2: Vec<f64>,

    /// the anharmonic treatment and the reduced force fields in J
    anharmonic: Option<(AnharmonicType, Tensor3, Tensor4)>,
}

impl Job<'_> {
    /// the Cartesian derivative `t` of geometric `rank` in atomic units,
    /// transformed to normal coordinates and converted to SI with `factor`
    fn normal(
        &self,
        t: &Tensor,
        rank: usize,
        factor: f64,
    ) -> Result<Tensor, SpectroError> {
        Ok(self.basis.to_normal(t, rank)? * factor)
    }

    fn reduced(
        &self,
        t: &Tensor,
        rank: usize,
        factor: f64,
    ) -> Result<Tensor, SpectroError> {
        Ok(to_reduced(
            &self.normal(t, rank, factor)?,
            rank,
            &self.recp_m,
            self.constants,
        ))
    }

    /// SI transition moments of a property with `n_el` electric field
    /// perturbations from its Cartesian `grad` and, for anharmonic
    /// calculations, its Cartesian Hessian and cubic derivatives in `higher`
    fn moments(
        &self,
        n_el: i32,
        grad: &Tensor,
        higher: Option<(Tensor, Tensor)>,
    ) -> Result<(AnharmonicProperty<Tensor>, Vec<OneOneResonance>), SpectroError>
    {
        let c = self.constants;
        let g = self.normal(grad, 1, c.property_derivative_au(n_el, 1))?;
        let harmonic = harmonic_moment(&g, &self.qi2);
        let Some((typ, cubic, quartic)) = &self.anharmonic else {
            let zero = Tensor::zeros(IxDyn(&g.shape()[1..]));
            return Ok((
                AnharmonicProperty::harmonic_only(harmonic, zero),
                Vec::new(),
            ));
        };
        let Some((hess, pcubic)) = higher else {
            return Err(SpectroError::MissingProperty(
                "anharmonic transition moments need the property Hessian and \
                 cubic derivatives"
                    .to_owned(),
            ));
        };
        let grad = to_reduced(&g, 1, &self.recp_m, c);
        let hess = self.reduced(&hess, 2, c.property_derivative_au(n_el, 2))?;
        let pcubic =
            self.reduced(&pcubic, 3, c.property_derivative_au(n_el, 3))?;
        transition_moments(
            &grad,
            &hess,
            &pcubic,
            cubic,
            quartic,
            harmonic,
            &self.energies,
            *typ,
            &self.checker,
        )
    }

    /// Transition moments of the Raman-type property with `n_el` electric
    /// field perturbations for each distinct incident frequency. Returns the
    /// incident frequencies in Hartree alongside the moments
    fn configurations(
        &self,
        props: &Properties,
        n_el: usize,
        what: &str,
        dd: &mut Vec<OneOneResonance>,
    ) -> Result<Vec<(f64, AnharmonicProperty<Tensor>)>, SpectroError> {
        let grads = props.require(n_el, 1, what)?;
        let higher = if self.anharmonic.is_some() {
            let hess = props.require(n_el, 2, what)?;
            let cubic = props.require(n_el, 3, what)?;
            if hess.len() != grads.len() || cubic.len() != grads.len() {
                return Err(SpectroError::DimensionMismatch(format!(
                    "{} gradient, {} Hessian, and {} cubic configurations of \
                     the {what}",
                    grads.len(),
                    hess.len(),
                    cubic.len()
                )));
            }
            Some((hess, cubic))
        } else {
            None
        };

        let mut seen: Vec<f64> = Vec::new();
        let mut ret = Vec::new();
        for (k, &g) in grads.iter().enumerate() {
            let incident =
                props.props[g].incident_frequency().ok_or_else(|| {
                    SpectroError::MissingProperty(format!(
                        "no incident frequency for the {what}"
                    ))
                })?;
            if seen.contains(&incident) {
                debug!("skipping repeated incident frequency {incident} Eh");
                continue;
            }
            seen.push(incident);
            let derivs = higher
                .as_ref()
                .map(|(h, c)| (props.tensor(h[k]), props.tensor(c[k])));
            let (m, res) =
                self.moments(n_el as i32, &props.tensor(g), derivs)?;
            dd.extend(res);
            ret.push((incident, m));
        }
        Ok(ret)
    }
}

/// Run the calculation described by `config` with the physical constants and
/// resonance thresholds in `constants`
pub fn run(config: &Config, constants: &Constants) -> Result<Output, SpectroError> {
    config.validate()?;
    let specs = config.specifications;
    let (props, tensors) = tensor_file::parse(&config.tensor_file)?;
    let props = Properties { props, tensors };

    // check for everything up front so that a missing property fails before
    // any numerical work
    let hessian = props.require(0, 2, "molecular Hessian")?;
    let force_fields = match config.anharmonic {
        Some(_) => Some((
            props.require(0, 3, "cubic force field")?[0],
            props.require(0, 4, "quartic force field")?[0],
        )),
        None => None,
    };
    let mut dipole = None;
    for s in &config.spectroscopy {
        let (n_el, what) = match s {
            SpectroscopyType::Ir => (1, "dipole gradient"),
            SpectroscopyType::Raman => (2, "polarizability gradient"),
            SpectroscopyType::HyperRaman => (3, "hyperpolarizability gradient"),
        };
        let grads = props.require(n_el, 1, what)?;
        if config.anharmonic.is_some() {
            props.require(n_el, 2, what)?;
            props.require(n_el, 3, what)?;
        }
        if *s == SpectroscopyType::Ir {
            if grads.len() > 1 {
                return Err(SpectroError::DimensionMismatch(format!(
                    "{} frequency configurations of the dipole gradient",
                    grads.len()
                )));
            }
            dipole = Some(grads[0]);
        }
    }

    let limits = config.frequency_limits.map(|(lo, hi)| {
        (
            specs.vib.to_hartree(lo, constants),
            specs.vib.to_hartree(hi, constants),
        )
    });
    let mol = Molecule::load(&config.molecule_file)?;
    let (basis, warnings) = analyze(
        &mol,
        &hessian_matrix(&props.tensor(hessian[0]))?,
        config.project_rot_transl,
        limits,
        constants,
    )?;
    info!(
        "retained {} of {} vibrational modes",
        basis.nmodes(),
        basis.matrix.ncols()
    );

    let eh = constants.hartree_to_joule;
    let energies: Vec<f64> = basis.energies.iter().map(|e| e * eh).collect();
    let recp_m: Vec<f64> = energies
        .iter()
        .map(|&e| constants.joule_to_recp_m(e))
        .collect();
    let qi2: Vec<f64> = recp_m.iter().map(|&w| constants.qi2(w)).collect();
    let mut job = Job {
        basis,
        constants,
        checker: ResonanceChecker::new(constants),
        energies,
        recp_m,
        qi2,
        anharmonic: None,
    };

    let mut fermi_resonances = Vec::new();
    let vib_energies = match (config.anharmonic, force_fields) {
        (Some(typ), Some((cubic, quartic))) => {
            let cubic = job
                .reduced(
                    &props.tensor(cubic),
                    3,
                    constants.force_constant_au(3),
                )?
                .into_dimensionality::<Ix3>()
                .map_err(|e| SpectroError::DimensionMismatch(e.to_string()))?;
            let quartic = job
                .reduced(
                    &props.tensor(quartic),
                    4,
                    constants.force_constant_au(4),
                )?
                .into_dimensionality::<Ix4>()
                .map_err(|e| SpectroError::DimensionMismatch(e.to_string()))?;
            let (e, fermi) = vibrational_energies(
                &job.energies,
                &cubic,
                &quartic,
                typ,
                &job.checker,
            );
            fermi_resonances = fermi;
            job.anharmonic = Some((typ, cubic, quartic));
            e
        }
        _ => AnharmonicProperty::harmonic_only(job.energies.clone(), 0.0),
    };
    let frequencies = vib_energies
        .clone()
        .scaled(specs.vib.from_joule(constants));
    let transitions =
        vib_energies.scaled(1.0 / (constants.planck * constants.speed_of_light));

    // incident frequencies in Hartree to the output unit and to m⁻¹
    let to_vib = |e: f64| e * eh * specs.vib.from_joule(constants);
    let to_recp_m = |e: f64| constants.joule_to_recp_m(e * eh);

    let mut one_one = Vec::new();
    let ir = match dipole {
        Some(idx) => {
            let unit = specs.require_ir()?;
            let higher = if job.anharmonic.is_some() {
                Some((
                    props.tensor(props.require(1, 2, "dipole Hessian")?[0]),
                    props.tensor(props.require(1, 3, "dipole cubic")?[0]),
                ))
            } else {
                None
            };
            let (m, dd) = job.moments(1, &props.tensor(idx), higher)?;
            one_one.extend(dd);
            Channel::Requested(ir_intensities(&m, &transitions, unit, constants))
        }
        None => Channel::NotRequested,
    };

    let raman = if config.wants(SpectroscopyType::Raman) {
        let unit = specs.require_raman()?;
        let configs = job.configurations(
            &props,
            2,
            "polarizability gradient",
            &mut one_one,
        )?;
        Channel::Requested(
            configs
                .into_iter()
                .map(|(incident, m)| RamanConfiguration {
                    incident: to_vib(incident),
                    intensities: raman_intensities(
                        &m,
                        &transitions,
                        to_recp_m(incident),
                        config.temperature,
                        unit,
                        constants,
                    ),
                })
                .collect(),
        )
    } else {
        Channel::NotRequested
    };

    let hyper_raman = if config.wants(SpectroscopyType::HyperRaman) {
        let unit = specs.require_hyper_raman()?;
        let configs = job.configurations(
            &props,
            3,
            "hyperpolarizability gradient",
            &mut one_one,
        )?;
        Channel::Requested(
            configs
                .into_iter()
                .map(|(incident, m)| {
                    let (vv, hv) = hyper_raman_intensities(
                        &m,
                        &transitions,
                        to_recp_m(incident),
                        config.temperature,
                        unit,
                        constants,
                    );
                    HyperRamanConfiguration {
                        incident: to_vib(incident),
                        vv,
                        hv,
                    }
                })
                .collect(),
        )
    } else {
        Channel::NotRequested
    };

    one_one.sort();
    one_one.dedup();
    Ok(Output {
        specifications: specs,
        anharmonic: config.anharmonic,
        frequencies,
        ir,
        raman,
        hyper_raman,
        fermi_resonances,
        one_one_resonances: one_one,
        warnings,
    })
}
