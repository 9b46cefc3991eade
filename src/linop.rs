//! The [`LinearOperator`] type and its algebra.
//!
//! An operator stores its shape, a forward kernel and an optional adjoint
//! kernel. Nothing is ever materialized: sums, products and scalings build
//! new operators whose kernels hold shared handles to their operands.
//!
//! ```
//! use matfree::{LinearOperator, Tensor, TensorView};
//! use ndarray::array;
//!
//! let double = |x: TensorView<'_>| -> matfree::Result<Tensor> { Ok(&x * 2.0) };
//! let a = LinearOperator::with_adjoint((2, 2), double, double).unwrap();
//! let y = a.apply(&array![1.0, 2.0]).unwrap();
//! assert_eq!(y, array![2.0, 4.0].into_dyn());
//! ```

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use log::{debug, trace};
use ndarray::{ArrayBase, Data, Dimension, IxDyn};

use crate::error::{LinOpError, Result};
use crate::shape::{
    check_inner, check_operator_shape, check_same_shape, into_column_matrix, into_vector,
    matrix_shape,
};
use crate::types::{
    Float, RMatrix, RMatrixView, RSparseView, RVector, RVectorView, Shape, Tensor, TensorView,
};
use crate::utilities::with_column_layout;

/// A forward or adjoint function of an operator.
///
/// Closures `Fn(TensorView) -> Result<Tensor>` implement this directly; the
/// combinators implement it with structs that own their child operators.
pub trait Kernel: Send + Sync {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor>;
}

impl<F> Kernel for F
where
    F: Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync,
{
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        self(x)
    }
}

pub type KernelRef = Arc<dyn Kernel>;

#[derive(Clone)]
pub struct LinearOperator {
    shape: Shape,
    forward: KernelRef,
    adjoint: Option<KernelRef>,
}

impl LinearOperator {
    /// Operator without an adjoint; [`LinearOperator::transpose`] fails on it.
    pub fn new<F>(shape: Shape, forward: F) -> Result<Self>
    where
        F: Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static,
    {
        Self::from_kernels(shape, Arc::new(forward), None)
    }

    pub fn with_adjoint<F, G>(shape: Shape, forward: F, adjoint: G) -> Result<Self>
    where
        F: Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static,
        G: Fn(TensorView<'_>) -> Result<Tensor> + Send + Sync + 'static,
    {
        Self::from_kernels(shape, Arc::new(forward), Some(Arc::new(adjoint)))
    }

    pub fn from_kernels(
        shape: Shape,
        forward: KernelRef,
        adjoint: Option<KernelRef>,
    ) -> Result<Self> {
        check_operator_shape(shape)?;
        Ok(LinearOperator {
            shape,
            forward,
            adjoint,
        })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.0
    }

    pub fn cols(&self) -> usize {
        self.shape.1
    }

    pub fn has_adjoint(&self) -> bool {
        self.adjoint.is_some()
    }

    /// Applies the forward kernel to a vector or a batch of columns.
    ///
    /// The leading dimension of `x` is checked before the kernel runs and the
    /// shape of the result after; a kernel returning anything other than
    /// `(rows, x.ncols())` is reported as [`LinOpError::DimensionMismatch`].
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Tensor>
    where
        S: Data<Elem = Float>,
        D: Dimension,
    {
        let x = x.view().into_dyn();
        let (_, batch) = matrix_shape(x.shape())?;
        check_inner(self.shape, x.shape())?;
        trace!("applying {:?} operator to {:?}", self.shape, x.shape());

        // an empty batch maps to an empty batch without running the kernel
        if batch == 0 {
            return Ok(Tensor::zeros(IxDyn(&[self.rows(), 0])));
        }
        let result = self.forward.call(x)?;

        let found = matrix_shape(result.shape())?;
        let expected = (self.rows(), batch);
        if found != expected {
            return Err(LinOpError::DimensionMismatch {
                operator: self.shape,
                expected,
                found,
            });
        }
        Ok(result)
    }

    pub fn dot<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Tensor>
    where
        S: Data<Elem = Float>,
        D: Dimension,
    {
        self.apply(x)
    }

    pub fn matvec(&self, x: RVectorView<'_>) -> Result<RVector> {
        into_vector(self.apply(&x)?)
    }

    pub fn matmat(&self, x: RMatrixView<'_>) -> Result<RMatrix> {
        into_column_matrix(self.apply(&x)?)
    }

    /// Applies the operator to a sparse batch of columns.
    ///
    /// Kernels work on dense data, so each column is expanded on its own
    /// and the input is never densified as a whole.
    pub fn apply_sparse(&self, x: RSparseView<'_>) -> Result<RMatrix> {
        check_inner(self.shape, &[x.rows(), x.cols()])?;
        let mut out = RMatrix::zeros((self.rows(), x.cols()));
        for (j, column) in x.to_csc().outer_iterator().enumerate() {
            let y = self.matvec(column.to_dense().view())?;
            out.column_mut(j).assign(&y);
        }
        Ok(out)
    }

    pub fn transpose(&self) -> Result<Self> {
        self.adjoint_operator().ok_or(LinOpError::MissingAdjoint)
    }

    pub fn t(&self) -> Result<Self> {
        self.transpose()
    }

    pub(crate) fn adjoint_operator(&self) -> Option<Self> {
        let adjoint = self.adjoint.clone()?;
        Some(LinearOperator {
            shape: (self.shape.1, self.shape.0),
            forward: adjoint,
            adjoint: Some(self.forward.clone()),
        })
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.combine(other, Combination::Add)
    }

    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.combine(other, Combination::Subtract)
    }

    fn combine(&self, other: &Self, op: Combination) -> Result<Self> {
        check_same_shape(self.shape, other.shape)?;
        debug!("{:?} of two {:?} operators", op, self.shape);

        let forward = Arc::new(Combine {
            left: self.clone(),
            right: other.clone(),
            op,
        });
        let adjoint = match (self.adjoint_operator(), other.adjoint_operator()) {
            (Some(left), Some(right)) => Some(Arc::new(Combine { left, right, op }) as KernelRef),
            _ => None,
        };
        Self::from_kernels(self.shape, forward, adjoint)
    }

    /// `x -> A(k x)`. Never needs the adjoint, though the result has one
    /// whenever `self` does.
    pub fn scale(&self, factor: Float) -> Self {
        let forward: KernelRef = Arc::new(Scaled {
            op: self.clone(),
            factor,
        });
        let adjoint = self
            .adjoint_operator()
            .map(|op| Arc::new(Scaled { op, factor }) as KernelRef);
        LinearOperator {
            shape: self.shape,
            forward,
            adjoint,
        }
    }

    pub fn negate(&self) -> Self {
        self.scale(-1.0)
    }

    /// Operator product `A B`, with adjoint `Bᵀ Aᵀ`.
    pub fn compose(&self, other: &Self) -> Result<Self> {
        check_inner(self.shape, &[other.rows(), other.cols()])?;
        debug!("composing {:?} with {:?}", self.shape, other.shape);

        let forward = Arc::new(Chain {
            outer: self.clone(),
            inner: other.clone(),
        });
        let adjoint = match (other.adjoint_operator(), self.adjoint_operator()) {
            (Some(outer), Some(inner)) => Some(Arc::new(Chain { outer, inner }) as KernelRef),
            _ => None,
        };
        Self::from_kernels((self.rows(), other.cols()), forward, adjoint)
    }

    /// `self * rhs` for a scalar, another operator or raw data.
    pub fn mul<'a, T>(&self, rhs: T) -> Result<Product>
    where
        T: Into<Operand<'a>>,
    {
        match rhs.into() {
            Operand::Scalar(factor) => Ok(Product::Operator(self.scale(factor))),
            Operand::Operator(other) => self.compose(other).map(Product::Operator),
            Operand::Data(x) => self.apply(&x).map(Product::Data),
        }
    }

    pub fn pow(&self, power: u32) -> Result<Self> {
        if power == 0 {
            return Err(LinOpError::InvalidPower { power });
        }
        (1..power).try_fold(self.clone(), |acc, _| acc.compose(self))
    }

    fn kernel_addr(kernel: &KernelRef) -> *const () {
        Arc::as_ptr(kernel) as *const ()
    }
}

/// Operators are equal when they share a shape and the very same kernels.
impl PartialEq for LinearOperator {
    fn eq(&self, other: &Self) -> bool {
        let same_adjoint = match (&self.adjoint, &other.adjoint) {
            (Some(a), Some(b)) => Self::kernel_addr(a) == Self::kernel_addr(b),
            (None, None) => true,
            _ => false,
        };
        self.shape == other.shape
            && Self::kernel_addr(&self.forward) == Self::kernel_addr(&other.forward)
            && same_adjoint
    }
}

impl fmt::Debug for LinearOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinearOperator({:?}, forward@{:p}, ",
            self.shape,
            Self::kernel_addr(&self.forward)
        )?;
        match &self.adjoint {
            Some(adjoint) => write!(f, "adjoint@{:p})", Self::kernel_addr(adjoint)),
            None => write!(f, "adjoint: missing)"),
        }
    }
}

impl fmt::Display for LinearOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Right-hand side of [`LinearOperator::mul`].
pub enum Operand<'a> {
    Scalar(Float),
    Operator(&'a LinearOperator),
    Data(TensorView<'a>),
}

impl From<Float> for Operand<'_> {
    fn from(factor: Float) -> Self {
        Operand::Scalar(factor)
    }
}

impl<'a> From<&'a LinearOperator> for Operand<'a> {
    fn from(op: &'a LinearOperator) -> Self {
        Operand::Operator(op)
    }
}

impl<'a, S, D> From<&'a ArrayBase<S, D>> for Operand<'a>
where
    S: Data<Elem = Float>,
    D: Dimension,
{
    fn from(x: &'a ArrayBase<S, D>) -> Self {
        Operand::Data(x.view().into_dyn())
    }
}

#[derive(Debug)]
pub enum Product {
    Operator(LinearOperator),
    Data(Tensor),
}

impl Product {
    pub fn into_operator(self) -> Option<LinearOperator> {
        match self {
            Product::Operator(op) => Some(op),
            Product::Data(_) => None,
        }
    }

    pub fn into_data(self) -> Option<Tensor> {
        match self {
            Product::Data(x) => Some(x),
            Product::Operator(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Combination {
    Add,
    Subtract,
}

struct Combine {
    left: LinearOperator,
    right: LinearOperator,
    op: Combination,
}

impl Kernel for Combine {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        with_column_layout(x, |x| {
            let left = into_column_matrix(self.left.apply(&x)?)?;
            let right = into_column_matrix(self.right.apply(&x)?)?;
            Ok(match self.op {
                Combination::Add => left + right,
                Combination::Subtract => left - right,
            })
        })
    }
}

struct Chain {
    outer: LinearOperator,
    inner: LinearOperator,
}

impl Kernel for Chain {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        let inner = self.inner.apply(&x)?;
        self.outer.apply(&inner)
    }
}

struct Scaled {
    op: LinearOperator,
    factor: Float,
}

impl Kernel for Scaled {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        let scaled = x.mapv(|v| v * self.factor);
        self.op.apply(&scaled)
    }
}

impl Add for &LinearOperator {
    type Output = Result<LinearOperator>;

    fn add(self, rhs: Self) -> Self::Output {
        LinearOperator::add(self, rhs)
    }
}

impl Sub for &LinearOperator {
    type Output = Result<LinearOperator>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(rhs)
    }
}

impl Mul for &LinearOperator {
    type Output = Result<LinearOperator>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl Mul<Float> for &LinearOperator {
    type Output = LinearOperator;

    fn mul(self, rhs: Float) -> Self::Output {
        self.scale(rhs)
    }
}

impl Mul<&LinearOperator> for Float {
    type Output = LinearOperator;

    fn mul(self, rhs: &LinearOperator) -> Self::Output {
        rhs.scale(self)
    }
}

impl Neg for &LinearOperator {
    type Output = LinearOperator;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}
