use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, ArrayViewD};

pub type Float = f64;

pub type RVector = Array1<Float>;
pub type RMatrix = Array2<Float>;
pub type RVectorView<'a> = ArrayView1<'a, Float>;
pub type RMatrixView<'a> = ArrayView2<'a, Float>;

/// Data handed to and returned from operator kernels: a vector (rank 1) or
/// a batch of columns (rank 2).
pub type Tensor = ArrayD<Float>;
pub type TensorView<'a> = ArrayViewD<'a, Float>;

/// Compressed sparse matrix, used by the sparse adapters.
pub type RSparse = sprs::CsMat<Float>;
pub type RSparseView<'a> = sprs::CsMatView<'a, Float>;

pub type Shape = (usize, usize);
