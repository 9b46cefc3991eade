use crate::types::{Float, Shape};

/// Rejection conditions raised while building or applying operators.
#[derive(Debug, thiserror::Error)]
pub enum LinOpError {
    #[error("shape of a linear operator must be positive, got ({rows}, {cols})")]
    InvalidShape { rows: usize, cols: usize },

    #[error("zero-dimensional array has no leading dimension")]
    ZeroDimension,

    #[error("arrays of order {} are not supported, shape {shape:?}", shape.len())]
    HighOrderTensor { shape: Vec<usize> },

    #[error("inner dimensions must match: {left:?}, {right:?}")]
    InnerDimensionMismatch { left: Shape, right: Vec<usize> },

    #[error("forward of linear operator with shape {operator:?} returned {found:?}, expected {expected:?}")]
    DimensionMismatch {
        operator: Shape,
        expected: Shape,
        found: Shape,
    },

    #[error("all dimensions must match: {left:?}, {right:?}")]
    AllDimensionMismatch { left: Shape, right: Shape },

    #[error("linear operator missing transpose function")]
    MissingAdjoint,

    #[error("cannot assemble a block operator from an empty list")]
    EmptyList,

    #[error("block {index} has {found} rows, expected {expected}")]
    RowMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("block {index} has {found} columns, expected {expected}")]
    ColumnMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("only 2-D arrays can be lifted to a linear operator, got {ndim}-D")]
    InvalidRank { ndim: usize },

    #[error("power of a linear operator must be > 0, got {power}")]
    InvalidPower { power: u32 },

    #[error("unknown memory order '{0}', expected one of C, F, A")]
    InvalidOrder(String),

    #[error("unknown element type '{0}', expected f32 or f64")]
    InvalidElementType(String),

    #[error("index {index} out of bounds for {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("adjoint test failed to {significant} significant digits: <A^T y, x> = {lhs}, <y, A x> = {rhs}")]
    AdjointMismatch {
        lhs: Float,
        rhs: Float,
        significant: i32,
    },

    #[error("maximum number of iterations reached ({iterations})")]
    NotConverged { iterations: usize },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, LinOpError>;
