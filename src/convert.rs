//! Conversions between dense matrices, [`LinearOperator`]s and the plain
//! "apply / apply-transpose" interface expected by matrix-free solvers.

use std::sync::Arc;

use log::debug;
use ndarray::{ArrayBase, Data, Dimension, Ix2};
use sprs::TriMat;

use crate::configs::ElementType;
use crate::error::{LinOpError, Result};
use crate::linop::LinearOperator;
use crate::shape::into_column_matrix;
use crate::types::{Float, RMatrix, RMatrixView, RSparse, RVector, RVectorView, Shape};
use crate::utilities::matmat;

/// Lifts a 2-D array into an operator that multiplies by it.
///
/// All the savings of a matrix-free representation are lost: the operator
/// holds the matrix and performs a dense product.
///
/// ```
/// use matfree::to_linear_operator;
/// use ndarray::array;
///
/// let a = to_linear_operator(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
/// assert_eq!(a.apply(&array![1.0, 1.0]).unwrap(), array![3.0, 7.0].into_dyn());
/// ```
pub fn to_linear_operator<S, D>(m: &ArrayBase<S, D>) -> Result<LinearOperator>
where
    S: Data<Elem = Float>,
    D: Dimension,
{
    if m.ndim() != 2 {
        return Err(LinOpError::InvalidRank { ndim: m.ndim() });
    }
    from_matrix(m.view().into_dimensionality::<Ix2>()?.to_owned())
}

pub fn from_matrix(m: RMatrix) -> Result<LinearOperator> {
    let shape = m.dim();
    let m = Arc::new(m);
    let m_t = Arc::clone(&m);
    LinearOperator::with_adjoint(
        shape,
        matmat(move |x| Ok(m.dot(&x))),
        matmat(move |x| Ok(m_t.t().dot(&x))),
    )
}

/// Lifts a sparse matrix. Forward and adjoint multiply by the compressed
/// matrix and its transposed view; nothing is densified.
///
/// ```
/// use matfree::{from_sparse, RSparse};
/// use ndarray::array;
///
/// let m = RSparse::new((2, 2), vec![0, 2, 3], vec![0, 1, 1], vec![1.0, 2.0, 4.0]);
/// let a = from_sparse(m).unwrap();
/// assert_eq!(a.apply(&array![1.0, 1.0]).unwrap(), array![3.0, 4.0].into_dyn());
/// ```
pub fn from_sparse(m: RSparse) -> Result<LinearOperator> {
    let shape = m.shape();
    let m = Arc::new(m);
    let m_t = Arc::clone(&m);
    LinearOperator::with_adjoint(
        shape,
        matmat(move |x| Ok(&*m * &x)),
        matmat(move |x| Ok(&m_t.transpose_view() * &x)),
    )
}

/// Materializes an operator by applying it to the identity.
///
/// Meant for debugging and tests; every column costs one forward
/// application.
pub fn to_matrix(op: &LinearOperator) -> Result<RMatrix> {
    debug!("materializing {:?} operator", op.shape());
    let identity = RMatrix::eye(op.cols());
    into_column_matrix(op.apply(&identity)?)
}

/// Like [`to_matrix`], but with `sparse_identity` the identity is handed in
/// as a sparse matrix through [`LinearOperator::apply_sparse`].
pub fn to_matrix_with(op: &LinearOperator, sparse_identity: bool) -> Result<RMatrix> {
    if sparse_identity {
        op.apply_sparse(RSparse::eye(op.cols()).view())
    } else {
        to_matrix(op)
    }
}

/// Materializes an operator column by column against a sparse identity and
/// keeps only the nonzero entries.
///
/// Only one dense column is alive at a time, so operators whose matrix is
/// mostly zero can be inspected without allocating the full dense matrix.
pub fn to_sparse_matrix(op: &LinearOperator) -> Result<RSparse> {
    debug!("materializing {:?} operator as sparse", op.shape());
    let identity = RSparse::eye_csc(op.cols());
    let mut triplets = TriMat::new(op.shape());
    for (j, column) in identity.outer_iterator().enumerate() {
        let y = op.matvec(column.to_dense().view())?;
        for (i, &v) in y.iter().enumerate() {
            if v != 0.0 {
                triplets.add_triplet(i, j, v);
            }
        }
    }
    Ok(triplets.to_csc())
}

/// An operator seen through the narrow interface of third-party matrix-free
/// solvers: a shape, an element type and separate entry points for the
/// forward and transposed products.
#[derive(Clone, Debug)]
pub struct MatrixFreeOperator {
    op: LinearOperator,
    element_type: ElementType,
}

pub fn to_matrix_free(op: &LinearOperator, element_type: ElementType) -> MatrixFreeOperator {
    MatrixFreeOperator {
        op: op.clone(),
        element_type,
    }
}

impl MatrixFreeOperator {
    pub fn shape(&self) -> Shape {
        self.op.shape()
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn matvec(&self, x: RVectorView<'_>) -> Result<RVector> {
        Ok(self.round(self.op.matvec(x)?))
    }

    pub fn rmatvec(&self, x: RVectorView<'_>) -> Result<RVector> {
        Ok(self.round(self.op.transpose()?.matvec(x)?))
    }

    pub fn matmat(&self, x: RMatrixView<'_>) -> Result<RMatrix> {
        Ok(self.round(self.op.matmat(x)?))
    }

    pub fn rmatmat(&self, x: RMatrixView<'_>) -> Result<RMatrix> {
        Ok(self.round(self.op.transpose()?.matmat(x)?))
    }

    fn round<D: Dimension>(&self, mut y: ndarray::Array<Float, D>) -> ndarray::Array<Float, D> {
        if self.element_type == ElementType::Float32 {
            y.mapv_inplace(|v| v as f32 as Float);
        }
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjoint::adjoint_test;
    use crate::block::block_diag;
    use crate::numeric::array_abs_diff_eq;
    use crate::types::{Tensor, TensorView};
    use ndarray::{array, ArrayD, IxDyn};

    #[test]
    fn test_to_linear_operator() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let op = to_linear_operator(&a).unwrap();
        assert_eq!(op.shape(), (2, 2));
        assert_eq!(op.apply(&array![1.0, 1.0]).unwrap(), array![3.0, 7.0].into_dyn());
        assert_eq!(
            op.t().unwrap().apply(&array![1.0, 1.0]).unwrap(),
            array![4.0, 6.0].into_dyn()
        );
    }

    #[test]
    fn test_to_linear_operator_rejects_wrong_rank() {
        let v = array![1.0, 2.0];
        assert!(matches!(
            to_linear_operator(&v),
            Err(LinOpError::InvalidRank { ndim: 1 })
        ));
        let cube: ArrayD<Float> = ArrayD::zeros(IxDyn(&[2, 2, 2]));
        assert!(matches!(
            to_linear_operator(&cube),
            Err(LinOpError::InvalidRank { ndim: 3 })
        ));
    }

    #[test]
    fn test_to_linear_operator_accepts_dynamic_rank() {
        let m = array![[1.0, 0.0, 2.0]].into_dyn();
        let op = to_linear_operator(&m).unwrap();
        assert_eq!(op.shape(), (1, 3));
    }

    #[test]
    fn test_to_matrix() {
        let identity =
            LinearOperator::new((2, 2), |x: TensorView<'_>| -> Result<Tensor> { Ok(x.to_owned()) })
                .unwrap();
        assert_eq!(to_matrix(&identity).unwrap(), RMatrix::eye(2));

        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(to_matrix(&from_matrix(a.clone()).unwrap()).unwrap(), a);
    }

    fn upper_triangular_sparse() -> RSparse {
        RSparse::new((2, 2), vec![0, 2, 3], vec![0, 1, 1], vec![1.0, 2.0, 4.0])
    }

    #[test]
    fn test_from_sparse() {
        let dense = array![[1.0, 2.0], [0.0, 4.0]];
        let op = from_sparse(upper_triangular_sparse()).unwrap();
        assert_eq!(op.shape(), (2, 2));
        assert_eq!(to_matrix(&op).unwrap(), dense);
        assert_eq!(to_matrix(&op.t().unwrap()).unwrap(), dense.t());
        assert_eq!(
            op.apply(&array![[1.0, 0.0], [1.0, 1.0]]).unwrap(),
            array![[3.0, 2.0], [4.0, 4.0]].into_dyn()
        );
        assert!(adjoint_test(&op, 7).is_ok());
    }

    #[test]
    fn test_from_sparse_rectangular() {
        let mut triplets = TriMat::new((2, 3));
        triplets.add_triplet(0, 2, 5.0);
        triplets.add_triplet(1, 0, -1.0);
        let m: RSparse = triplets.to_csc();
        let op = from_sparse(m).unwrap();
        assert_eq!(op.shape(), (2, 3));
        assert_eq!(
            to_matrix(&op).unwrap(),
            array![[0.0, 0.0, 5.0], [-1.0, 0.0, 0.0]]
        );
        assert!(matches!(
            op.apply(&array![1.0, 2.0]),
            Err(LinOpError::InnerDimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_to_sparse_matrix() {
        let dense = array![[1.0, 2.0], [0.0, 4.0]];
        let sparse = to_sparse_matrix(&from_matrix(dense.clone()).unwrap()).unwrap();
        assert_eq!(sparse.shape(), (2, 2));
        assert_eq!(sparse.nnz(), 3);
        assert_eq!(sparse.to_dense(), dense);

        let round_trip = to_sparse_matrix(&from_sparse(upper_triangular_sparse()).unwrap()).unwrap();
        assert_eq!(round_trip.to_dense(), dense);
        assert_eq!(round_trip.nnz(), 3);
    }

    #[test]
    fn test_to_matrix_with_sparse_identity() {
        let dense = array![[1.0, 2.0, 0.0], [0.0, 4.0, -1.0]];
        let op = from_matrix(dense.clone()).unwrap();
        assert_eq!(to_matrix_with(&op, true).unwrap(), dense);
        assert_eq!(to_matrix_with(&op, false).unwrap(), dense);

        let sparse_op = from_sparse(upper_triangular_sparse()).unwrap();
        assert_eq!(
            to_matrix_with(&sparse_op, true).unwrap(),
            array![[1.0, 2.0], [0.0, 4.0]]
        );
    }

    #[test]
    fn test_to_sparse_matrix_of_block_diag() {
        let a = from_matrix(array![[2.0]]).unwrap();
        let b = from_matrix(array![[0.0, 3.0], [1.0, 0.0]]).unwrap();
        let d = block_diag(&[a, b]).unwrap();
        let sparse = to_sparse_matrix(&d).unwrap();
        assert_eq!(sparse.nnz(), 3);
        assert_eq!(sparse.to_dense(), to_matrix(&d).unwrap());
    }

    #[test]
    fn test_matrix_free_bridge() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let op = from_matrix(a.clone()).unwrap();
        let bridge = to_matrix_free(&op, ElementType::Float64);

        assert_eq!(bridge.shape(), (3, 2));
        assert_eq!(bridge.element_type(), ElementType::Float64);
        let x = array![1.0, -1.0];
        let y = array![1.0, 0.0, 1.0];
        assert!(array_abs_diff_eq(&bridge.matvec(x.view()).unwrap(), &a.dot(&x), 1e-12));
        assert!(array_abs_diff_eq(&bridge.rmatvec(y.view()).unwrap(), &a.t().dot(&y), 1e-12));

        let eye3 = RMatrix::eye(3);
        assert!(array_abs_diff_eq(&bridge.rmatmat(eye3.view()).unwrap(), &a.t(), 1e-12));
        let eye2 = RMatrix::eye(2);
        assert!(array_abs_diff_eq(&bridge.matmat(eye2.view()).unwrap(), &a, 1e-12));
    }

    #[test]
    fn test_matrix_free_bridge_single_precision() {
        let op = from_matrix(array![[1.0 / 3.0]]).unwrap();
        let bridge = to_matrix_free(&op, ElementType::Float32);
        let y = bridge.matvec(array![1.0].view()).unwrap();
        assert_eq!(y[0], (1.0_f32 / 3.0_f32) as f64);
    }

    #[test]
    fn test_matrix_free_bridge_without_adjoint() {
        let op =
            LinearOperator::new((2, 2), |x: TensorView<'_>| -> Result<Tensor> { Ok(x.to_owned()) })
                .unwrap();
        let bridge = to_matrix_free(&op, ElementType::Float64);
        assert!(bridge.matvec(array![1.0, 2.0].view()).is_ok());
        assert!(matches!(
            bridge.rmatvec(array![1.0, 2.0].view()),
            Err(LinOpError::MissingAdjoint)
        ));
    }
}
