//! Sparse → dense materialization.
//!
//! Dense arrays are column-major: the first axis varies fastest, so the flat offset of 1-based
//! coordinates `(c0, c1, ..)` is `(c0 - 1) + shape[0] * ((c1 - 1) + shape[1] * (..))`.
//!
//! Shapes follow the extended dimension (symbol dimension plus the facet axis, if any):
//! - 0 axes: a single cell, shape `[]`;
//! - 1 axis: `[n, 1]`, so one-dimensional results have the same layout as higher dimensions;
//! - otherwise one entry per axis.

use serde::Serialize;

use crate::error::{ReadError, ReadResult};
use crate::sparse::SparseResult;

/// A dense, column-major N-dimensional array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DenseTensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Clone> DenseTensor<T> {
    fn filled(shape: Vec<usize>, fill: T) -> ReadResult<Self> {
        let len = shape
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| {
                ReadError::unsupported("form", format!("dense shape {shape:?} is too large"))
            })?;
        Ok(Self {
            shape,
            data: vec![fill; len],
        })
    }
}

impl<T> DenseTensor<T> {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Cells in column-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at 1-based `coords`. A one-axis lookup on an `[n, 1]` array addresses the first axis.
    pub fn get(&self, coords: &[u32]) -> Option<&T> {
        self.offset(coords).and_then(|offset| self.data.get(offset))
    }

    fn offset(&self, coords: &[u32]) -> Option<usize> {
        if self.shape.is_empty() {
            return coords.is_empty().then_some(0);
        }
        if coords.len() > self.shape.len() {
            return None;
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (axis, &extent) in self.shape.iter().enumerate() {
            // Missing trailing coordinates address the first (only) slot of padding axes.
            let coord = coords.get(axis).copied().unwrap_or(1) as usize;
            if coord == 0 || coord > extent {
                return None;
            }
            offset += (coord - 1) * stride;
            stride *= extent;
        }
        Some(offset)
    }
}

/// Dense shape for the given per-axis cardinalities.
pub(crate) fn dense_shape(cardinalities: &[usize]) -> Vec<usize> {
    match cardinalities {
        [] => Vec::new(),
        [n] => vec![*n, 1],
        _ => cardinalities.to_vec(),
    }
}

/// Scatter `cell(row)` of every sparse row into a `fill`-initialized array of `shape`.
///
/// Scalars (empty shape) take the first row's value, or `fill` when there are no rows.
pub(crate) fn scatter<T: Clone>(
    sparse: &SparseResult,
    shape: Vec<usize>,
    fill: T,
    mut cell: impl FnMut(usize) -> T,
) -> ReadResult<DenseTensor<T>> {
    let mut dense = DenseTensor::filled(shape, fill)?;
    if dense.shape.is_empty() {
        if sparse.rows() > 0 {
            dense.data[0] = cell(0);
        }
        return Ok(dense);
    }

    for row in 0..sparse.rows() {
        let coords = sparse.coords(row);
        let Some(offset) = dense.offset(coords) else {
            return Err(ReadError::corrupt(
                "*",
                format!(
                    "sparse row {coords:?} lies outside dense shape {:?}",
                    dense.shape
                ),
            ));
        };
        dense.data[offset] = cell(row);
    }
    Ok(dense)
}

/// Numeric dense values. Sets (no value column) are marked with `1.0` where an element exists.
pub(crate) fn values(sparse: &SparseResult, shape: Vec<usize>) -> ReadResult<DenseTensor<f64>> {
    scatter(sparse, shape, 0.0, |row| sparse.value(row).unwrap_or(1.0))
}

/// Per-cell text, empty where no element exists.
pub(crate) fn texts(
    sparse: &SparseResult,
    texts: &[String],
    shape: Vec<usize>,
) -> ReadResult<DenseTensor<String>> {
    scatter(sparse, shape, String::new(), |row| {
        texts.get(row).cloned().unwrap_or_default()
    })
}
