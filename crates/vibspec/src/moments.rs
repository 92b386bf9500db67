//! Anharmonic transition moments of a property from its derivatives with
//! respect to reduced normal coordinates

use std::f64::consts::SQRT_2;

use log::info;
use ndarray::IxDyn;

use crate::{
    AnharmonicProperty, AnharmonicType, SpectroError, Tensor, Tensor3, Tensor4,
    resonance::{Coupling, OneOneResonance, ResonanceTest},
};

/// Derivatives of one property with respect to `nmodes` normal coordinates,
/// flattened so that every geometric index addresses a contiguous run of
/// `size` property components
struct Flat {
    nmodes: usize,
    size: usize,
    shape: Vec<usize>,
    grad: Vec<f64>,
    hess: Vec<f64>,
    cubic: Vec<f64>,
}

impl Flat {
    fn new(
        grad: &Tensor,
        hess: &Tensor,
        cubic: Option<&Tensor>,
        nmodes: usize,
    ) -> Result<Self, SpectroError> {
        let check = |t: &Tensor, rank: usize, what: &str| {
            let s = t.shape();
            if s.len() < rank || s[..rank].iter().any(|&d| d != nmodes) {
                Err(SpectroError::DimensionMismatch(format!(
                    "property {what} of shape {s:?} for {nmodes} modes"
                )))
            } else {
                Ok(s[rank..].to_vec())
            }
        };
        let shape = check(grad, 1, "gradient")?;
        if check(hess, 2, "Hessian")? != shape {
            return Err(SpectroError::DimensionMismatch(
                "property gradient and Hessian components differ".to_owned(),
            ));
        }
        if let Some(c) = cubic {
            if check(c, 3, "cubic derivative")? != shape {
                return Err(SpectroError::DimensionMismatch(
                    "property gradient and cubic components differ".to_owned(),
                ));
            }
        }
        Ok(Self {
            nmodes,
            size: shape.iter().product(),
            shape,
            grad: grad.iter().cloned().collect(),
            hess: hess.iter().cloned().collect(),
            cubic: cubic.map_or_else(Vec::new, |c| c.iter().cloned().collect()),
        })
    }

    fn p1(&self, i: usize) -> &[f64] {
        let s = self.size;
        &self.grad[i * s..(i + 1) * s]
    }

    fn p2(&self, i: usize, j: usize) -> &[f64] {
        let s = self.size;
        let o = (i * self.nmodes + j) * s;
        &self.hess[o..o + s]
    }

    fn p3(&self, i: usize, j: usize, k: usize) -> &[f64] {
        let s = self.size;
        let o = ((i * self.nmodes + j) * self.nmodes + k) * s;
        &self.cubic[o..o + s]
    }

    fn unflatten(&self, v: Vec<f64>) -> Tensor {
        // the length always matches the component shape
        Tensor::from_shape_vec(IxDyn(&self.shape), v)
            .unwrap_or_else(|_| Tensor::zeros(IxDyn(&self.shape)))
    }
}

/// the contribution `coupling * t` of a perturbative term. a vanishing
/// coupling contributes nothing even when its denominator `t` diverges
fn weight(coupling: f64, t: f64) -> f64 {
    if coupling == 0.0 { 0.0 } else { coupling * t }
}

/// `acc += c * v`
fn axpy(acc: &mut [f64], c: f64, v: &[f64]) {
    for (a, x) in acc.iter_mut().zip(v) {
        *a += c * x;
    }
}

/// The harmonic transition moments `P_i sqrt(qi2_i)` from the SI property
/// gradient `grad` in normal coordinates, whose leading axis runs over modes
pub fn harmonic_moment(grad: &Tensor, qi2: &[f64]) -> Vec<Tensor> {
    grad.outer_iter()
        .zip(qi2)
        .map(|(p, q)| p.to_owned() * q.sqrt())
        .collect()
}

/// Mode pairs in 1-1 resonance through their quartic coupling or either of
/// the two cubic coupling products, checked against the largest coupling of
/// each kind
pub fn dd_resonances<C: ResonanceTest>(
    energies: &[f64],
    cubic: &Tensor3,
    quartic: &Tensor4,
    checker: &C,
) -> Vec<OneOneResonance> {
    let n = energies.len();
    let mut ret = Vec::new();
    for i in 0..n {
        for j in 0..i {
            let mut kijkk: f64 = 0.0;
            let mut prod1: f64 = 0.0;
            let mut prod2: f64 = 0.0;
            for k in 0..n {
                let q = quartic[[i, j, k, k]];
                if q.abs() > kijkk.abs() {
                    kijkk = q;
                }
                for l in 0..n {
                    prod1 = prod1
                        .max((cubic[[i, k, l]] * cubic[[j, k, l]]).abs());
                    prod2 = prod2
                        .max((cubic[[i, j, k]] * cubic[[l, l, k]]).abs());
                }
            }
            let delta = energies[i] - energies[j];
            if checker.is_11_resonance(delta, kijkk, Coupling::Quartic)
                || checker.is_11_resonance(delta, prod1, Coupling::Cubic)
                || checker.is_11_resonance(delta, prod2, Coupling::Cubic)
            {
                info!("1-1 resonance between modes {j} and {i}");
                ret.push(OneOneResonance::new(i, j));
            }
        }
    }
    ret
}

/// Fundamental transition moments from the reduced property derivatives
/// `grad`, `hess`, and `pcubic`, the reduced force fields, and the harmonic
/// `energies`, everything in SI units
pub fn fundamental_moments<C: ResonanceTest>(
    grad: &Tensor,
    hess: &Tensor,
    pcubic: &Tensor,
    cubic: &Tensor3,
    quartic: &Tensor4,
    energies: &[f64],
    typ: AnharmonicType,
    checker: &C,
) -> Result<(Vec<Tensor>, Vec<OneOneResonance>), SpectroError> {
    let n = energies.len();
    let p = Flat::new(grad, hess, Some(pcubic), n)?;
    let flags = typ.flags();
    let dd = if flags.dd_check {
        dd_resonances(energies, cubic, quartic, checker)
    } else {
        Vec::new()
    };

    // whether the 1-1 sensitive term of pair (i, j) with `coupling` is kept
    let dd_ok = |i: usize, j: usize, coupling: f64, kind: Coupling| {
        let delta = energies[i] - energies[j];
        (!flags.dd_check || !checker.is_11_resonance(delta, coupling, kind))
            && !(flags.forced_dd_removal
                && dd.contains(&OneOneResonance::new(i, j)))
    };
    // whether the Fermi sensitive term is kept
    let fermi_ok = |delta: f64, coupling: f64, same: bool| {
        !flags.moment_fermi_checks
            || !checker.is_fermi_resonance(delta, coupling, same)
    };

    let s16 = 1.0 / (16.0 * SQRT_2);
    let s8 = 1.0 / (8.0 * SQRT_2);
    let s4 = 1.0 / (4.0 * SQRT_2);
    let mut ret = Vec::with_capacity(n);
    for i in 0..n {
        let vi = energies[i];
        let mut acc: Vec<f64> = p.p1(i).iter().map(|x| x / SQRT_2).collect();
        for j in 0..n {
            let vj = energies[j];
            let pj = p.p1(j);
            axpy(&mut acc, s4, p.p3(i, j, j));
            for k in 0..n {
                let vk = energies[k];
                let kijk = cubic[[i, j, k]];
                let kjkk = cubic[[j, k, k]];
                let kijkk = quartic[[i, j, k, k]];

                let mut t = 1.0 / (vi + vj);
                if i != j && dd_ok(i, j, kijkk, Coupling::Quartic) {
                    t -= 1.0 / (vi - vj);
                }
                axpy(&mut acc, -s8 * weight(kijkk, t), pj);

                let mut t = 1.0 / (vi + vj + vk);
                if fermi_ok(vj + vk - vi, cubic[[j, k, i]], j == k) {
                    t -= 1.0 / (vi - vj - vk);
                }
                axpy(&mut acc, -s8 * weight(kijk, t), p.p2(j, k));
                axpy(&mut acc, -s4 * weight(kjkk, 1.0 / vj), p.p2(i, j));

                for l in 0..n {
                    let vl = energies[l];
                    let kikl = cubic[[i, k, l]];
                    let kjkl = cubic[[j, k, l]];
                    let kllk = cubic[[l, l, k]];
                    let c1 = kikl * kjkl;
                    let c2 = kijk * kllk;

                    if j != i && k != i && l != i {
                        let mut t = 1.0 / ((vi + vj) * (vj + vk + vl))
                            + 1.0 / ((vi + vk + vl) * (vj + vk + vl))
                            + 1.0 / ((vi + vj) * (vi + vk + vl));
                        let dd1 = dd_ok(i, j, c1, Coupling::Cubic);
                        if dd1 {
                            t -= 1.0 / ((vi - vj) * (vj + vk + vl));
                        }
                        if fermi_ok(vk + vl - vi, kikl, l == k) {
                            t -= 1.0 / ((vi - vk - vl) * (vj + vk + vl));
                            if dd1 {
                                t += 1.0 / ((vi - vj) * (vi - vk - vl));
                            }
                        }
                        axpy(&mut acc, s16 * weight(c1, t), pj);
                    }

                    if j == i && l != i {
                        let pre = if k == i { 2.0 } else { 1.0 };
                        let mut t = 1.0 / (2.0 * vi * (vi + vk + vl));
                        if fermi_ok(vk + vl - vi, kikl, l == k) {
                            t -= 1.0 / (2.0 * vi * (vi - vk - vl));
                            t -= 1.0 / (2.0 * (vi - vk - vl).powi(2));
                        }
                        t += 1.0 / (2.0 * (vi + vk + vl).powi(2));
                        axpy(&mut acc, s16 * pre * weight(c1, t), pj);
                    }

                    if j != i && k != i && l == i {
                        let mut t = 1.0 / (vk * (vi + vj))
                            + 2.0 / ((2.0 * vi + vk) * (vi + vj))
                            + 3.0 / ((vi + vj) * (vi + vj + vk));
                        let dd1 = dd_ok(i, j, c1, Coupling::Cubic);
                        if fermi_ok(vj + vk - vi, kijk, k == j) {
                            t -= 1.0 / (vk * (vi - vj - vk));
                            if dd1 {
                                t += 1.0 / ((vi - vj) * (vi - vj - vk));
                            }
                        }
                        if dd1 {
                            t -= 2.0 / ((vi - vj) * (vi + vj + vk));
                            t -= 3.0 / (vk * (vi - vj));
                        }
                        t += 2.0 / ((2.0 * vi + vk) * (vi + vj + vk));
                        t += 3.0 / (vk * (vi + vj + vk));
                        axpy(&mut acc, s16 * weight(c1, t), pj);
                    }

                    if j == i {
                        let pre = if k == i && l == i {
                            1.0 + 2.0 / 9.0
                        } else {
                            1.0
                        };
                        let t = 1.0 / (vi * vk);
                        axpy(&mut acc, s16 * pre * weight(c2, t), pj);
                    }

                    if j != i && k != i && l != i {
                        let mut t = 1.0 / ((vi + vj) * (vi + vj + vk))
                            + 1.0 / (vk * (vi + vj))
                            + 1.0 / (vk * (vi + vj + vk));
                        let dd2 = dd_ok(i, j, c2, Coupling::Cubic);
                        if dd2 {
                            t -= 1.0 / (vk * (vi - vj));
                        }
                        if fermi_ok(vj + vk - vi, kijk, k == j) {
                            t -= 1.0 / (vk * (vi - vj - vk));
                            if dd2 {
                                t += 1.0 / ((vi - vj) * (vi - vj - vk));
                            }
                        }
                        axpy(&mut acc, s16 * weight(c2, t), pj);
                    }

                    if j != i && k == i {
                        let pre = if l == i { 2.0 } else { 1.0 };
                        let dd2 = dd_ok(i, j, c2, Coupling::Cubic);
                        let mut t = 1.0 / ((2.0 * vi + vj) * (vi + vj))
                            + 1.0 / (vi * (2.0 * vi + vj));
                        if dd2 {
                            t -= 1.0 / (vi * (vi - vj));
                        }
                        t *= pre;
                        if l == i {
                            t += 1.0 / (3.0 * vi * (vi + vj));
                            t += 1.0 / (3.0 * vi * (2.0 * vi + vj));
                            if dd2 {
                                t -= 1.0 / ((vi - vj) * (2.0 * vi + vj));
                            }
                        }
                        t += 1.0 / (vi * (vi + vj));
                        t += 1.0 / (vi * vj);
                        if dd2 {
                            t -= 1.0 / (vj * (vi - vj));
                        }
                        axpy(&mut acc, s16 * weight(c2, t), pj);
                    }
                }
            }
        }
        ret.push(p.unflatten(acc));
    }
    Ok((ret, dd))
}

/// Overtone and combination-band transition moments from the reduced
/// property gradient and Hessian, the reduced cubic force field, and the
/// harmonic `energies`, everything in SI units
pub fn overtone_moments<C: ResonanceTest>(
    grad: &Tensor,
    hess: &Tensor,
    cubic: &Tensor3,
    energies: &[f64],
    typ: AnharmonicType,
    checker: &C,
) -> Result<(Vec<Tensor>, Vec<Vec<Tensor>>), SpectroError> {
    let n = energies.len();
    let p = Flat::new(grad, hess, None, n)?;
    let checks = typ.flags().moment_fermi_checks;
    let mut over = vec![vec![0.0; p.size]; n];
    let mut combo = vec![vec![vec![0.0; p.size]; n]; n];
    for i in 0..n {
        let vi = energies[i];
        axpy(&mut over[i], 1.0 / (2.0 * SQRT_2), p.p2(i, i));
        for j in 0..n {
            let vj = energies[j];
            if j != i {
                axpy(&mut combo[i][j], 0.5, p.p2(i, j));
            }
            for k in 0..n {
                let vk = energies[k];
                let kijk = cubic[[i, j, k]];
                let mut t = -1.0 / (vi + vj + vk);
                if !checks
                    || !checker.is_fermi_resonance(vi + vj - vk, kijk, j == i)
                {
                    t += 1.0 / (vi + vj - vk);
                }
                if j == i {
                    axpy(
                        &mut over[i],
                        weight(kijk, t) / (4.0 * SQRT_2),
                        p.p1(k),
                    );
                } else {
                    axpy(&mut combo[i][j], 0.25 * weight(kijk, t), p.p1(k));
                }
            }
        }
    }
    let over = over.into_iter().map(|v| p.unflatten(v)).collect();
    let combo = combo
        .into_iter()
        .map(|row| row.into_iter().map(|v| p.unflatten(v)).collect())
        .collect();
    Ok((over, combo))
}

/// Anharmonic transition moments of a property, combining the supplied
/// `harmonic` moments with [fundamental_moments] and [overtone_moments]
pub fn transition_moments<C: ResonanceTest>(
    grad: &Tensor,
    hess: &Tensor,
    pcubic: &Tensor,
    cubic: &Tensor3,
    quartic: &Tensor4,
    harmonic: Vec<Tensor>,
    energies: &[f64],
    typ: AnharmonicType,
    checker: &C,
) -> Result<(AnharmonicProperty<Tensor>, Vec<OneOneResonance>), SpectroError>
{
    let (fund, dd) = fundamental_moments(
        grad, hess, pcubic, cubic, quartic, energies, typ, checker,
    )?;
    let (over, combo) =
        overtone_moments(grad, hess, cubic, energies, typ, checker)?;
    Ok((AnharmonicProperty::new(harmonic, fund, over, combo), dd))
}
