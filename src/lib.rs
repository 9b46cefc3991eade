//! Matrix-free linear operators over `ndarray`.
//!
//! A [`LinearOperator`] is a shape plus a forward function and an optional
//! adjoint function. Operators add, scale, compose and stack into block
//! operators without ever forming a matrix.

pub mod adjoint;
pub mod bicgstab;
pub mod block;
pub mod configs;
pub mod convert;
pub mod defaults;
pub mod error;
pub mod linop;
pub mod numeric;
pub mod operators;
pub mod shape;
pub mod types;
pub mod utilities;

pub use adjoint::{adjoint_test, adjoint_test_with_rng};
pub use bicgstab::bicgstab;
pub use block::{block_diag, bmat, hstack, vstack};
pub use configs::{Assembly, ElementType, MemoryOrder};
pub use convert::{
    from_matrix, from_sparse, to_linear_operator, to_matrix, to_matrix_free, to_matrix_with,
    to_sparse_matrix, MatrixFreeOperator,
};
pub use error::{LinOpError, Result};
pub use linop::{Kernel, KernelRef, LinearOperator, Operand, Product};
pub use types::{
    Float, RMatrix, RMatrixView, RSparse, RSparseView, RVector, RVectorView, Shape, Tensor,
    TensorView,
};
pub use utilities::{matmat, matvec, matvectorized};
