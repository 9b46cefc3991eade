//! Matrix-free stand-ins for the basic dense building blocks.

use std::sync::Arc;

use ndarray::{s, Axis};

use crate::error::{LinOpError, Result};
use crate::linop::{KernelRef, LinearOperator};
use crate::types::{RMatrix, RMatrixView, RVector, Shape};
use crate::utilities::matmat;

/// All-zero operator of the given shape.
pub fn zeros(shape: Shape) -> Result<LinearOperator> {
    let (rows, cols) = shape;
    LinearOperator::with_adjoint(
        shape,
        matmat(move |x| Ok(RMatrix::zeros((rows, x.ncols())))),
        matmat(move |x| Ok(RMatrix::zeros((cols, x.ncols())))),
    )
}

/// All-ones operator: every output entry is the sum of its input column.
pub fn ones(shape: Shape) -> Result<LinearOperator> {
    let (rows, cols) = shape;
    LinearOperator::with_adjoint(
        shape,
        matmat(move |x| Ok(broadcast_column_sums(x, rows))),
        matmat(move |x| Ok(broadcast_column_sums(x, cols))),
    )
}

fn broadcast_column_sums(x: RMatrixView<'_>, rows: usize) -> RMatrix {
    let sums = x.sum_axis(Axis(0));
    RMatrix::from_shape_fn((rows, x.ncols()), |(_, j)| sums[j])
}

/// Rectangular identity: truncates the input when `rows < cols` and pads
/// it with zeros when `rows > cols`.
pub fn eye(shape: Shape) -> Result<LinearOperator> {
    let (rows, cols) = shape;
    LinearOperator::with_adjoint(
        shape,
        matmat(move |x| Ok(truncate_or_pad(x, rows))),
        matmat(move |x| Ok(truncate_or_pad(x, cols))),
    )
}

fn truncate_or_pad(x: RMatrixView<'_>, rows: usize) -> RMatrix {
    if rows <= x.nrows() {
        return x.slice(s![..rows, ..]).to_owned();
    }
    let mut out = RMatrix::zeros((rows, x.ncols()));
    out.slice_mut(s![..x.nrows(), ..]).assign(&x);
    out
}

/// Picks the rows listed in `perm` out of an input with `rows` rows.
///
/// `perm` may repeat or reorder rows; the adjoint adds every selected row
/// back into its origin.
///
/// ```
/// use matfree::operators::select;
/// use ndarray::array;
///
/// let s = select(4, vec![0, 1, 3]).unwrap();
/// assert_eq!(s.apply(&array![1.0, 2.0, 3.0, 4.0]).unwrap(), array![1.0, 2.0, 4.0].into_dyn());
/// ```
pub fn select(rows: usize, perm: Vec<usize>) -> Result<LinearOperator> {
    if let Some(&index) = perm.iter().find(|&&i| i >= rows) {
        return Err(LinOpError::IndexOutOfBounds { index, len: rows });
    }
    let perm = Arc::new(perm);
    let perm_t = Arc::clone(&perm);
    LinearOperator::with_adjoint(
        (perm.len(), rows),
        matmat(move |x| Ok(x.select(Axis(0), &perm))),
        matmat(move |x| {
            let mut out = RMatrix::zeros((rows, x.ncols()));
            for (row, &origin) in x.rows().into_iter().zip(perm_t.iter()) {
                let mut target = out.row_mut(origin);
                target += &row;
            }
            Ok(out)
        }),
    )
}

/// Diagonal operator scaling row `i` of its input by `v[i]`.
///
/// Forward and adjoint share a single kernel, so `diag(v).t()` compares
/// equal to `diag(v)`.
pub fn diag(v: RVector) -> Result<LinearOperator> {
    let n = v.len();
    let kernel: KernelRef = Arc::new(matmat(move |x| {
        let mut out = x.to_owned();
        for (mut row, &scale) in out.rows_mut().into_iter().zip(v.iter()) {
            row *= scale;
        }
        Ok(out)
    }));
    LinearOperator::from_kernels((n, n), Arc::clone(&kernel), Some(kernel))
}
