use crate::types::Float;
use ndarray::{ArrayBase, Data, Dimension, Zip};

/// Elementwise `|a - b| < epsilon`; arrays of different shapes never match.
pub fn array_abs_diff_eq<S1, S2, D>(
    a: &ArrayBase<S1, D>,
    b: &ArrayBase<S2, D>,
    epsilon: Float,
) -> bool
where
    S1: Data<Elem = Float>,
    S2: Data<Elem = Float>,
    D: Dimension,
{
    a.shape() == b.shape() && Zip::from(a).and(b).all(|&x, &y| (x - y).abs() < epsilon)
}

/// Relative comparison in the style of `assert_allclose`: `|a - b| <= rtol * |b|`.
pub fn scalar_rel_eq(a: Float, b: Float, rtol: Float) -> bool {
    (a - b).abs() <= rtol * b.abs()
}
