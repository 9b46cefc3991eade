//! Dimension checks shared by operator construction, application and the
//! block combinators.

use ndarray::{Axis, Ix1, Ix2};

use crate::error::{LinOpError, Result};
use crate::types::{RMatrix, RVector, Shape, Tensor};

/// Shape of an array seen as a matrix: rank 1 is a single column.
pub fn matrix_shape(dims: &[usize]) -> Result<Shape> {
    match *dims {
        [rows] => Ok((rows, 1)),
        [rows, cols] => Ok((rows, cols)),
        _ => Err(rank_error(dims)),
    }
}

fn rank_error(dims: &[usize]) -> LinOpError {
    if dims.is_empty() {
        LinOpError::ZeroDimension
    } else {
        LinOpError::HighOrderTensor {
            shape: dims.to_vec(),
        }
    }
}

pub fn check_operator_shape(shape: Shape) -> Result<()> {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return Err(LinOpError::InvalidShape { rows, cols });
    }
    Ok(())
}

pub fn check_same_shape(left: Shape, right: Shape) -> Result<()> {
    if left != right {
        return Err(LinOpError::AllDimensionMismatch { left, right });
    }
    Ok(())
}

/// `right` is the shape of whatever sits to the right of an operator with
/// shape `left`: another operator or an array being applied.
pub fn check_inner(left: Shape, right: &[usize]) -> Result<()> {
    let leading = matrix_shape(right)?.0;
    if left.1 != leading {
        return Err(LinOpError::InnerDimensionMismatch {
            left,
            right: right.to_vec(),
        });
    }
    Ok(())
}

pub fn check_shared_rows(shapes: &[Shape]) -> Result<()> {
    let Some(&(expected, _)) = shapes.first() else {
        return Err(LinOpError::EmptyList);
    };
    match shapes.iter().position(|&(rows, _)| rows != expected) {
        Some(index) => Err(LinOpError::RowMismatch {
            index,
            expected,
            found: shapes[index].0,
        }),
        None => Ok(()),
    }
}

pub fn check_shared_cols(shapes: &[Shape]) -> Result<()> {
    let Some(&(_, expected)) = shapes.first() else {
        return Err(LinOpError::EmptyList);
    };
    match shapes.iter().position(|&(_, cols)| cols != expected) {
        Some(index) => Err(LinOpError::ColumnMismatch {
            index,
            expected,
            found: shapes[index].1,
        }),
        None => Ok(()),
    }
}

/// Upgrades a rank-1 result to an `(n, 1)` column.
pub fn into_column_matrix(t: Tensor) -> Result<RMatrix> {
    match t.ndim() {
        1 => Ok(t.into_dimensionality::<Ix1>()?.insert_axis(Axis(1))),
        2 => Ok(t.into_dimensionality::<Ix2>()?),
        _ => Err(rank_error(t.shape())),
    }
}

/// Flattens a rank-1 result or an `(n, 1)` column into a vector.
pub fn into_vector(t: Tensor) -> Result<RVector> {
    match t.ndim() {
        1 => Ok(t.into_dimensionality::<Ix1>()?),
        2 => {
            let m = t.into_dimensionality::<Ix2>()?;
            if m.ncols() != 1 {
                return Err(LinOpError::DimensionMismatch {
                    operator: m.dim(),
                    expected: (m.nrows(), 1),
                    found: m.dim(),
                });
            }
            Ok(m.column(0).to_owned())
        }
        _ => Err(rank_error(t.shape())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD, IxDyn};

    #[test]
    fn test_matrix_shape_upgrades_vectors() {
        assert_eq!(matrix_shape(&[4]).unwrap(), (4, 1));
        assert_eq!(matrix_shape(&[4, 3]).unwrap(), (4, 3));
    }

    #[test]
    fn test_matrix_shape_rejects_scalars_and_tensors() {
        assert!(matches!(matrix_shape(&[]), Err(LinOpError::ZeroDimension)));
        assert!(matches!(
            matrix_shape(&[4, 1, 1]),
            Err(LinOpError::HighOrderTensor { shape }) if shape == vec![4, 1, 1]
        ));
    }

    #[test]
    fn test_operator_shape_must_be_positive() {
        assert!(check_operator_shape((1, 1)).is_ok());
        assert!(matches!(
            check_operator_shape((0, 1)),
            Err(LinOpError::InvalidShape { rows: 0, cols: 1 })
        ));
        assert!(matches!(
            check_operator_shape((1, 0)),
            Err(LinOpError::InvalidShape { rows: 1, cols: 0 })
        ));
    }

    #[test]
    fn test_check_inner() {
        assert!(check_inner((4, 5), &[5]).is_ok());
        assert!(check_inner((4, 5), &[5, 2]).is_ok());
        assert!(matches!(
            check_inner((4, 5), &[4, 2]),
            Err(LinOpError::InnerDimensionMismatch { left: (4, 5), .. })
        ));
    }

    #[test]
    fn test_shared_rows_reports_first_offender() {
        assert!(check_shared_rows(&[(2, 1), (2, 3)]).is_ok());
        assert!(matches!(
            check_shared_rows(&[(2, 1), (2, 3), (3, 1), (4, 1)]),
            Err(LinOpError::RowMismatch {
                index: 2,
                expected: 2,
                found: 3
            })
        ));
        assert!(matches!(check_shared_rows(&[]), Err(LinOpError::EmptyList)));
    }

    #[test]
    fn test_shared_cols() {
        assert!(check_shared_cols(&[(1, 2), (3, 2)]).is_ok());
        assert!(matches!(
            check_shared_cols(&[(1, 2), (3, 1)]),
            Err(LinOpError::ColumnMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_column_conversions() {
        let v = array![1.0, 2.0, 3.0].into_dyn();
        let m = into_column_matrix(v.clone()).unwrap();
        assert_eq!(m, array![[1.0], [2.0], [3.0]]);
        assert_eq!(into_vector(m.into_dyn()).unwrap(), array![1.0, 2.0, 3.0]);
        assert_eq!(into_vector(v).unwrap(), array![1.0, 2.0, 3.0]);

        let wide = array![[1.0, 2.0]].into_dyn();
        assert!(matches!(
            into_vector(wide),
            Err(LinOpError::DimensionMismatch { .. })
        ));

        let cube: ArrayD<f64> = ArrayD::zeros(IxDyn(&[2, 2, 2]));
        assert!(matches!(
            into_column_matrix(cube),
            Err(LinOpError::HighOrderTensor { .. })
        ));
    }
}
