use std::{cmp::Ordering, path::Path, str::FromStr};

use nalgebra::SymmetricEigen;

use crate::{Dmat, Dvec, SpectroError};

/// compute the eigen decomposition of the symmetric matrix `mat` and return
/// the eigenvalues and the corresponding eigenvectors (as columns), sorted in
/// descending order by eigenvalue if `reverse` is true and ascending order
/// otherwise
pub fn symm_eigen_decomp(mat: Dmat, reverse: bool) -> (Dvec, Dmat) {
    let SymmetricEigen {
        eigenvectors: vecs,
        eigenvalues: vals,
    } = SymmetricEigen::new(mat);
    let mut pairs: Vec<_> = vals.iter().enumerate().collect();
    if reverse {
        pairs.sort_by(|(_, a), (_, b)| {
            b.partial_cmp(a).unwrap_or(Ordering::Equal)
        });
    } else {
        pairs.sort_by(|(_, a), (_, b)| {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        });
    }
    let (rows, cols) = vecs.shape();
    let mut ret = Dmat::zeros(rows, cols);
    for i in 0..cols {
        ret.set_column(i, &vecs.column(pairs[i].0));
    }
    (
        Dvec::from_iterator(vals.len(), pairs.iter().map(|a| *a.1)),
        ret,
    )
}

/// read the whole of `path` into a String, mapping the IO error into a
/// [SpectroError]
pub(crate) fn read_file(path: impl AsRef<Path>) -> Result<String, SpectroError> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map_err(|e| SpectroError::Io(path.display().to_string(), e.kind()))
}

/// parse every whitespace-separated field of `line` as a `T`. `path` and
/// `lineno` are only used to build the error
pub(crate) fn parse_line<T: FromStr>(
    line: &str,
    path: &str,
    lineno: usize,
) -> Result<Vec<T>, SpectroError> {
    line.split_whitespace()
        .map(|s| {
            s.parse::<T>().map_err(|_| {
                SpectroError::format(
                    path,
                    lineno,
                    format!("failed to parse `{s}` in `{}`", line.trim()),
                )
            })
        })
        .collect()
}

/// index of the combination band (a, b), b < a, in the packed list of
/// combination bands that follows the `2n` fundamentals and overtones
pub(crate) fn combination_position(a: usize, b: usize, n: usize) -> usize {
    2 * n + a * (a.saturating_sub(1)) / 2 + b
}
