//! Block operators assembled from smaller operators, in the manner of
//! `hstack`, `vstack`, `bmat` and `block_diag` for dense matrices.
//!
//! Each combinator returns a new [`LinearOperator`] whose kernels keep shared
//! handles to the children and route slices of the input to them. The
//! adjoint of a block operator exists when every child has one.

use std::ops::Range;
use std::sync::Arc;

use log::debug;
use ndarray::{Axis, Slice};

use crate::error::{LinOpError, Result};
use crate::linop::{Kernel, KernelRef, LinearOperator};
use crate::shape::{check_shared_cols, check_shared_rows, into_column_matrix};
use crate::types::{RMatrix, RMatrixView, Shape, Tensor, TensorView};
use crate::utilities::with_column_layout;

/// Block operator from a row-major list of rows of operators.
///
/// Each row is stacked horizontally and the rows are then stacked
/// vertically, so mismatched block heights within a row fail with
/// [`LinOpError::RowMismatch`] and mismatched row widths with
/// [`LinOpError::ColumnMismatch`].
pub fn bmat(blocks: &[Vec<LinearOperator>]) -> Result<LinearOperator> {
    if blocks.is_empty() {
        return Err(LinOpError::EmptyList);
    }
    let rows = blocks
        .iter()
        .map(|row| hstack(row))
        .collect::<Result<Vec<_>>>()?;
    vstack(&rows)
}

/// `[A B C]`: children share their row count.
pub fn hstack(blocks: &[LinearOperator]) -> Result<LinearOperator> {
    if let [single] = blocks {
        return Ok(single.clone());
    }
    let shapes = shapes_of(blocks);
    check_shared_rows(&shapes)?;

    let rows = shapes[0].0;
    let cols: usize = shapes.iter().map(|s| s.1).sum();
    debug!("hstack of {} blocks into ({}, {})", blocks.len(), rows, cols);

    let forward = Arc::new(SplitSum::new(blocks.to_vec()));
    let adjoint = transpose_all(blocks).map(|t| Arc::new(Concatenate::new(t)) as KernelRef);
    LinearOperator::from_kernels((rows, cols), forward, adjoint)
}

/// `[A; B; C]`: children share their column count.
pub fn vstack(blocks: &[LinearOperator]) -> Result<LinearOperator> {
    if let [single] = blocks {
        return Ok(single.clone());
    }
    let shapes = shapes_of(blocks);
    check_shared_cols(&shapes)?;

    let rows: usize = shapes.iter().map(|s| s.0).sum();
    let cols = shapes[0].1;
    debug!("vstack of {} blocks into ({}, {})", blocks.len(), rows, cols);

    let forward = Arc::new(Concatenate::new(blocks.to_vec()));
    let adjoint = transpose_all(blocks).map(|t| Arc::new(SplitSum::new(t)) as KernelRef);
    LinearOperator::from_kernels((rows, cols), forward, adjoint)
}

/// Children placed along the diagonal, zeros elsewhere.
pub fn block_diag(blocks: &[LinearOperator]) -> Result<LinearOperator> {
    match blocks {
        [] => return Err(LinOpError::EmptyList),
        [single] => return Ok(single.clone()),
        _ => {}
    }
    let shapes = shapes_of(blocks);
    let rows: usize = shapes.iter().map(|s| s.0).sum();
    let cols: usize = shapes.iter().map(|s| s.1).sum();
    debug!("block_diag of {} blocks into ({}, {})", blocks.len(), rows, cols);

    let forward = Arc::new(SplitConcatenate::new(blocks.to_vec()));
    let adjoint =
        transpose_all(blocks).map(|t| Arc::new(SplitConcatenate::new(t)) as KernelRef);
    LinearOperator::from_kernels((rows, cols), forward, adjoint)
}

fn shapes_of(blocks: &[LinearOperator]) -> Vec<Shape> {
    blocks.iter().map(LinearOperator::shape).collect()
}

fn transpose_all(blocks: &[LinearOperator]) -> Option<Vec<LinearOperator>> {
    blocks.iter().map(LinearOperator::adjoint_operator).collect()
}

/// Cumulative offsets splitting the input rows between children.
struct BlockLayout {
    offsets: Vec<usize>,
}

impl BlockLayout {
    fn new(sizes: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        let mut end = 0;
        for size in sizes {
            end += size;
            offsets.push(end);
        }
        BlockLayout { offsets }
    }

    fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.offsets.windows(2).map(|w| w[0]..w[1])
    }
}

fn slice_rows<'a>(x: &RMatrixView<'a>, range: Range<usize>) -> RMatrixView<'a> {
    let mut part = x.clone();
    part.slice_axis_inplace(Axis(0), Slice::from(range));
    part
}

fn concatenate_rows(parts: &[RMatrix]) -> Result<RMatrix> {
    let views: Vec<RMatrixView<'_>> = parts.iter().map(|p| p.view()).collect();
    Ok(ndarray::concatenate(Axis(0), &views)?)
}

/// Forward of a horizontal stack: each child takes its slice of the input
/// and the outputs are summed.
struct SplitSum {
    blocks: Vec<LinearOperator>,
    layout: BlockLayout,
}

impl SplitSum {
    fn new(blocks: Vec<LinearOperator>) -> Self {
        let layout = BlockLayout::new(blocks.iter().map(LinearOperator::cols));
        SplitSum { blocks, layout }
    }
}

impl Kernel for SplitSum {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        with_column_layout(x, |x| {
            let rows = self.blocks[0].rows();
            let mut total = RMatrix::zeros((rows, x.ncols()));
            for (block, range) in self.blocks.iter().zip(self.layout.ranges()) {
                let part = block.apply(&slice_rows(&x, range))?;
                total += &into_column_matrix(part)?;
            }
            Ok(total)
        })
    }
}

/// Forward of a vertical stack: every child sees the whole input and the
/// outputs are stacked.
struct Concatenate {
    blocks: Vec<LinearOperator>,
}

impl Concatenate {
    fn new(blocks: Vec<LinearOperator>) -> Self {
        Concatenate { blocks }
    }
}

impl Kernel for Concatenate {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        with_column_layout(x, |x| {
            let parts = self
                .blocks
                .iter()
                .map(|block| into_column_matrix(block.apply(&x)?))
                .collect::<Result<Vec<_>>>()?;
            concatenate_rows(&parts)
        })
    }
}

/// Forward of a block diagonal: each child takes its slice of the input and
/// the outputs are stacked.
struct SplitConcatenate {
    blocks: Vec<LinearOperator>,
    layout: BlockLayout,
}

impl SplitConcatenate {
    fn new(blocks: Vec<LinearOperator>) -> Self {
        let layout = BlockLayout::new(blocks.iter().map(LinearOperator::cols));
        SplitConcatenate { blocks, layout }
    }
}

impl Kernel for SplitConcatenate {
    fn call(&self, x: TensorView<'_>) -> Result<Tensor> {
        with_column_layout(x, |x| {
            let parts = self
                .blocks
                .iter()
                .zip(self.layout.ranges())
                .map(|(block, range)| into_column_matrix(block.apply(&slice_rows(&x, range))?))
                .collect::<Result<Vec<_>>>()?;
            concatenate_rows(&parts)
        })
    }
}
