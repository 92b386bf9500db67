//! Cartesian to normal-coordinate transformation of geometric derivative
//! tensors

use std::ops::RangeInclusive;

use ndarray::{Axis, Slice};

use crate::{Constants, Dmat, SpectroError, Tensor};

/// Contract each of the leading `geometric_rank` axes of `tensor` with the
/// columns of `basis`, so that an axis of length `basis.nrows()` becomes one
/// of length `basis.ncols()`. Trailing axes are left alone, and a geometric
/// rank of zero returns a copy of `tensor`
pub fn transform(
    tensor: &Tensor,
    geometric_rank: usize,
    basis: &Dmat,
) -> Result<Tensor, SpectroError> {
    if geometric_rank > tensor.ndim() {
        return Err(SpectroError::DimensionMismatch(format!(
            "geometric rank {geometric_rank} exceeds tensor rank {}",
            tensor.ndim()
        )));
    }
    let (rows, cols) = basis.shape();
    let mut ret = tensor.clone();
    for ax in 0..geometric_rank {
        if ret.len_of(Axis(ax)) != rows {
            return Err(SpectroError::DimensionMismatch(format!(
                "axis {ax} of length {} cannot be contracted with a \
                 basis of {rows} Cartesian coordinates",
                ret.len_of(Axis(ax))
            )));
        }
        let mut shape = ret.shape().to_vec();
        shape[ax] = cols;
        let mut out = Tensor::zeros(shape);
        for (c, slice) in ret.axis_iter(Axis(ax)).enumerate() {
            for m in 0..cols {
                let b = basis[(c, m)];
                if b != 0.0 {
                    out.index_axis_mut(Axis(ax), m).scaled_add(b, &slice);
                }
            }
        }
        ret = out;
    }
    Ok(ret)
}

/// keep only the `modes` range of each of the leading `geometric_rank` axes.
/// a range covering whole axes returns the tensor unchanged
pub fn extract_subblock(
    tensor: &Tensor,
    geometric_rank: usize,
    modes: RangeInclusive<usize>,
) -> Tensor {
    let (min, max) = modes.into_inner();
    let mut view = tensor.view();
    for ax in 0..geometric_rank {
        view.slice_axis_inplace(Axis(ax), Slice::from(min..max + 1));
    }
    view.to_owned()
}

/// Transform `tensor`, in SI units, to reduced normal coordinates by scaling
/// each geometric index `i` by `sqrt(h/(4π²cν̃ᵢ))`, where `recp_m` holds the
/// harmonic wavenumbers in m⁻¹
pub fn to_reduced(
    tensor: &Tensor,
    geometric_rank: usize,
    recp_m: &[f64],
    constants: &Constants,
) -> Tensor {
    let pre = reduced_prefactors(recp_m, constants);
    let mut ret = tensor.clone();
    for ax in 0..geometric_rank {
        for (i, mut lane) in ret.axis_iter_mut(Axis(ax)).enumerate() {
            lane *= pre[i];
        }
    }
    ret
}

pub fn reduced_prefactors(recp_m: &[f64], constants: &Constants) -> Vec<f64> {
    use std::f64::consts::PI;
    recp_m
        .iter()
        .map(|w| {
            (constants.planck / (4.0 * PI * PI * constants.speed_of_light * w))
                .sqrt()
        })
        .collect()
}
