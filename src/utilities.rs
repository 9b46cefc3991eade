//! Wrappers that let a kernel be written against whichever layout is most
//! natural (a batch of columns, a single column, or an N-D array) while the
//! operator itself accepts both vectors and column batches.

use ndarray::{Array, Axis, Ix1, Ix2};

use crate::configs::MemoryOrder;
use crate::error::{LinOpError, Result};
use crate::types::{RMatrix, RMatrixView, RVector, RVectorView, Tensor, TensorView};

/// Runs `f` on `x` viewed as a 2-D column batch.
///
/// A vector is viewed as an `(n, 1)` column and a single-column result is
/// raveled back, so the output rank always follows the input rank. This
/// holds for `(1, 1)` results too: a length-1 vector in gives a length-1
/// vector out.
pub(crate) fn with_column_layout<F>(x: TensorView<'_>, f: F) -> Result<Tensor>
where
    F: FnOnce(RMatrixView<'_>) -> Result<RMatrix>,
{
    match x.ndim() {
        1 => {
            let column = x.into_dimensionality::<Ix1>()?.insert_axis(Axis(1));
            let res = f(column)?;
            if res.ncols() == 1 {
                Ok(Array::from_iter(res.iter().copied()).into_dyn())
            } else {
                Ok(res.into_dyn())
            }
        }
        2 => Ok(f(x.into_dimensionality::<Ix2>()?)?.into_dyn()),
        0 => Err(LinOpError::ZeroDimension),
        _ => Err(LinOpError::HighOrderTensor {
            shape: x.shape().to_vec(),
        }),
    }
}

/// Turns a kernel on 2-D column batches into one that also takes vectors.
///
/// ```
/// use matfree::{matmat, LinearOperator};
/// use ndarray::array;
///
/// let id = matmat(|x| Ok(x.to_owned()));
/// let op = LinearOperator::new((4, 4), id).unwrap();
/// let y = op.apply(&array![0.0, 1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(y, array![0.0, 1.0, 2.0, 3.0].into_dyn());
/// ```
pub fn matmat<F>(f: F) -> impl Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static
where
    F: Fn(RMatrixView<'_>) -> Result<RMatrix> + Send + Sync + 'static,
{
    move |x: TensorView<'_>| with_column_layout(x, &f)
}

/// Turns a kernel on a single column into one on column batches by applying
/// it column by column.
///
/// An empty batch has no column to learn the output length from and comes
/// back as a `(0, 0)` matrix. [`LinearOperator::apply`] never hands one to
/// the kernel.
///
/// [`LinearOperator::apply`]: crate::linop::LinearOperator::apply
pub fn matvec<F>(f: F) -> impl Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static
where
    F: Fn(RVectorView<'_>) -> Result<RVector> + Send + Sync + 'static,
{
    matmat(move |x: RMatrixView<'_>| {
        if x.ncols() == 0 {
            return Ok(RMatrix::zeros((0, 0)));
        }
        let columns = x
            .columns()
            .into_iter()
            .map(&f)
            .collect::<Result<Vec<RVector>>>()?;
        let views: Vec<RVectorView<'_>> = columns.iter().map(|c| c.view()).collect();
        Ok(ndarray::stack(Axis(1), &views)?)
    })
}

/// Like [`matvec`], but each column is reshaped to `shape` in `order` before
/// `f` sees it, and the N-D result is raveled back in the same order.
///
/// ```
/// use matfree::{matvectorized, LinearOperator, MemoryOrder};
/// use ndarray::{array, s};
///
/// let double_first_column = matvectorized(vec![2, 2], MemoryOrder::RowMajor, |img| {
///     let mut img = img.to_owned();
///     img.slice_mut(s![.., 0]).mapv_inplace(|v| v * 2.0);
///     Ok(img)
/// });
/// let op = LinearOperator::new((4, 4), double_first_column).unwrap();
/// let x = array![[1.0, 1.0, 1.0, 1.0], [2.0, 1.0, 2.0, 1.0]].reversed_axes();
/// let y = op.apply(&x).unwrap();
/// assert_eq!(y, array![[2.0, 4.0], [1.0, 1.0], [2.0, 4.0], [1.0, 1.0]].into_dyn());
/// ```
pub fn matvectorized<F>(
    shape: Vec<usize>,
    order: MemoryOrder,
    f: F,
) -> impl Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static
where
    F: Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static,
{
    matvec(move |column: RVectorView<'_>| {
        let arr = column.to_shape((&shape[..], reshape_order(order)))?;
        let res = f(arr.view())?;
        Ok(ravel(res, order))
    })
}

fn reshape_order(order: MemoryOrder) -> ndarray::Order {
    match order {
        MemoryOrder::ColumnMajor => ndarray::Order::ColumnMajor,
        MemoryOrder::RowMajor | MemoryOrder::Automatic => ndarray::Order::RowMajor,
    }
}

fn ravel(res: Tensor, order: MemoryOrder) -> RVector {
    let column_major = match order {
        MemoryOrder::RowMajor => false,
        MemoryOrder::ColumnMajor => true,
        MemoryOrder::Automatic => !res.is_standard_layout() && res.t().is_standard_layout(),
    };
    if column_major {
        res.t().iter().copied().collect()
    } else {
        res.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linop::LinearOperator;
    use ndarray::{array, s, ArrayD, IxDyn};

    fn double_first_column(img: TensorView<'_>) -> Result<Tensor> {
        let mut img = img.to_owned();
        img.slice_mut(s![.., 0]).mapv_inplace(|v| v * 2.0);
        Ok(img)
    }

    #[test]
    fn test_matmat_vector_round_trip() {
        let kernel = matmat(|x| {
            assert_eq!(x.ncols(), 1);
            Ok(&x * 3.0)
        });
        let y = kernel(array![1.0, 2.0].into_dyn().view()).unwrap();
        assert_eq!(y, array![3.0, 6.0].into_dyn());
    }

    #[test]
    fn test_matmat_keeps_matrix_input() {
        let kernel = matmat(|x| Ok(x.to_owned()));
        let x = array![[1.0], [2.0]].into_dyn();
        let y = kernel(x.view()).unwrap();
        assert_eq!(y.ndim(), 2);
        assert_eq!(y, x);
    }

    #[test]
    fn test_matmat_single_element_stays_vector() {
        let kernel = matmat(|x| Ok(x.to_owned()));
        let y = kernel(array![5.0].into_dyn().view()).unwrap();
        assert_eq!(y.shape(), &[1]);

        let y = kernel(array![[5.0]].into_dyn().view()).unwrap();
        assert_eq!(y.shape(), &[1, 1]);
    }

    #[test]
    fn test_matmat_rejects_scalars() {
        let kernel = matmat(|x| Ok(x.to_owned()));
        let scalar: ArrayD<f64> = ArrayD::zeros(IxDyn(&[]));
        assert!(matches!(
            kernel(scalar.view()),
            Err(LinOpError::ZeroDimension)
        ));
    }

    #[test]
    fn test_matvec_column_by_column() {
        let kernel = matvec(|column| {
            let mut img = column.to_shape(((2, 2), ndarray::Order::RowMajor))?.to_owned();
            img.slice_mut(s![.., 0]).mapv_inplace(|v| v * 2.0);
            Ok(img.iter().copied().collect())
        });
        let x = array![[1.0, 1.0, 1.0, 1.0], [2.0, 1.0, 2.0, 1.0]].reversed_axes();
        let y = kernel(x.into_dyn().view()).unwrap();
        assert_eq!(
            y,
            array![[2.0, 4.0], [1.0, 1.0], [2.0, 4.0], [1.0, 1.0]].into_dyn()
        );
    }

    #[test]
    fn test_matvec_empty_batch() {
        let sum_rows = |column: RVectorView<'_>| -> Result<RVector> {
            Ok(ndarray::arr1(&[column.sum(), column.sum(), column.sum()]))
        };
        let kernel = matvec(sum_rows);
        let empty = RMatrix::zeros((4, 0)).into_dyn();
        assert_eq!(kernel(empty.view()).unwrap().shape(), &[0, 0]);

        let op = LinearOperator::new((3, 4), matvec(sum_rows)).unwrap();
        let y = op.apply(&RMatrix::zeros((4, 0))).unwrap();
        assert_eq!(y.shape(), &[3, 0]);
        let y = op.apply(&RMatrix::ones((4, 2))).unwrap();
        assert_eq!(y, RMatrix::from_elem((3, 2), 4.0).into_dyn());
    }

    #[test]
    fn test_matvectorized_row_major() {
        let op = LinearOperator::new(
            (4, 4),
            matvectorized(vec![2, 2], MemoryOrder::RowMajor, double_first_column),
        )
        .unwrap();
        let x = array![[1.0, 1.0, 1.0, 1.0], [2.0, 1.0, 2.0, 1.0]].reversed_axes();
        let y = op.apply(&x).unwrap();
        assert_eq!(
            y,
            array![[2.0, 4.0], [1.0, 1.0], [2.0, 4.0], [1.0, 1.0]].into_dyn()
        );
    }

    #[test]
    fn test_matvectorized_column_major() {
        let kernel = matvectorized(vec![2, 2], MemoryOrder::ColumnMajor, double_first_column);
        // column-major: the first image column is the first two entries
        let y = kernel(array![1.0, 1.0, 1.0, 1.0].into_dyn().view()).unwrap();
        assert_eq!(y, array![2.0, 2.0, 1.0, 1.0].into_dyn());
    }

    #[test]
    fn test_matvectorized_automatic_follows_result_layout() {
        let kernel = matvectorized(vec![2, 2], MemoryOrder::Automatic, |img| {
            Ok(img.t().to_owned())
        });
        let y = kernel(array![1.0, 2.0, 3.0, 4.0].into_dyn().view()).unwrap();
        assert_eq!(y.len(), 4);

        let row_major = matvectorized(vec![2, 2], MemoryOrder::Automatic, |img| Ok(img.to_owned()));
        let y = row_major(array![1.0, 2.0, 3.0, 4.0].into_dyn().view()).unwrap();
        assert_eq!(y, array![1.0, 2.0, 3.0, 4.0].into_dyn());
    }

    #[test]
    fn test_matvectorized_wrong_column_length() {
        let kernel = matvectorized(vec![2, 2], MemoryOrder::RowMajor, double_first_column);
        assert!(matches!(
            kernel(array![1.0, 2.0, 3.0].into_dyn().view()),
            Err(LinOpError::Shape(_))
        ));
    }
}
