use log::debug;
use rand::Rng;

use crate::error::{LinOpError, Result};
use crate::linop::LinearOperator;
use crate::numeric::scalar_rel_eq;
use crate::types::{Float, RVector};

/// Checks that the forward and adjoint kernels of `op` agree, i.e. that
/// `<Aᵀ y, x> = <y, A x>` to `significant` digits for random `x` and `y`.
///
/// ```
/// use matfree::{adjoint_test, LinearOperator, Tensor, TensorView};
///
/// let id = |x: TensorView<'_>| -> matfree::Result<Tensor> { Ok(x.to_owned()) };
/// let twice = |x: TensorView<'_>| -> matfree::Result<Tensor> { Ok(&x * 2.0) };
/// let a = LinearOperator::with_adjoint((4, 4), id, id).unwrap();
/// assert!(adjoint_test(&a, 7).is_ok());
/// let b = LinearOperator::with_adjoint((4, 4), id, twice).unwrap();
/// assert!(adjoint_test(&b, 7).is_err());
/// ```
pub fn adjoint_test(op: &LinearOperator, significant: i32) -> Result<()> {
    adjoint_test_with_rng(op, significant, &mut rand::thread_rng())
}

pub fn adjoint_test_with_rng<R: Rng + ?Sized>(
    op: &LinearOperator,
    significant: i32,
    rng: &mut R,
) -> Result<()> {
    let (rows, cols) = op.shape();
    let x = RVector::from_shape_simple_fn(cols, || rng.gen::<Float>());
    let y = RVector::from_shape_simple_fn(rows, || rng.gen::<Float>());

    let lhs = op.transpose()?.matvec(y.view())?.dot(&x);
    let rhs = y.dot(&op.matvec(x.view())?);
    debug!("adjoint test on {:?}: {} vs {}", op.shape(), lhs, rhs);

    if scalar_rel_eq(lhs, rhs, Float::powi(10.0, -significant)) {
        Ok(())
    } else {
        Err(LinOpError::AdjointMismatch {
            lhs,
            rhs,
            significant,
        })
    }
}
