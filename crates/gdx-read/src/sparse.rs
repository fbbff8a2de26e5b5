#![forbid(unsafe_code)]

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Coordinate-list result: one row per emitted tuple.
///
/// Each row holds `index_cols` 1-based output positions followed by an optional value. Sets have
/// no value column.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseResult {
    index_cols: usize,
    has_value: bool,
    rows: usize,
    coords: Vec<u32>,
    values: Vec<f64>,
}

impl SparseResult {
    pub(crate) fn with_capacity(index_cols: usize, has_value: bool, rows: usize) -> Self {
        Self {
            index_cols,
            has_value,
            rows: 0,
            coords: Vec::with_capacity(rows.saturating_mul(index_cols)),
            values: if has_value {
                Vec::with_capacity(rows)
            } else {
                Vec::new()
            },
        }
    }

    pub(crate) fn push(&mut self, coords: &[u32], value: f64) {
        debug_assert_eq!(coords.len(), self.index_cols);
        self.coords.extend_from_slice(coords);
        if self.has_value {
            self.values.push(value);
        }
        self.rows += 1;
    }

    /// Release capacity reserved for rows that were never emitted.
    pub(crate) fn trim(&mut self) {
        self.coords.shrink_to_fit();
        self.values.shrink_to_fit();
    }

    pub(crate) fn coords_mut(&mut self) -> &mut [u32] {
        &mut self.coords
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Number of position columns (symbol dimension, plus one for the facet axis).
    pub fn index_cols(&self) -> usize {
        self.index_cols
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    /// Total columns of the row matrix.
    pub fn cols(&self) -> usize {
        self.index_cols + usize::from(self.has_value)
    }

    pub fn coords(&self, row: usize) -> &[u32] {
        let start = row * self.index_cols;
        &self.coords[start..start + self.index_cols]
    }

    pub fn value(&self, row: usize) -> Option<f64> {
        self.values.get(row).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u32], Option<f64>)> + '_ {
        (0..self.rows()).map(move |row| (self.coords(row), self.value(row)))
    }

    /// Rows as numbers, positions first and the value last.
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        self.iter()
            .map(|(coords, value)| {
                coords
                    .iter()
                    .map(|&c| c as f64)
                    .chain(value)
                    .collect()
            })
            .collect()
    }
}

impl Serialize for SparseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows()))?;
        for row in self.to_matrix() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_positions_and_values_aligned() {
        let mut sparse = SparseResult::with_capacity(2, true, 8);
        sparse.push(&[1, 2], 1.5);
        sparse.push(&[3, 1], -2.0);
        sparse.trim();
        assert_eq!(sparse.rows(), 2);
        assert_eq!(sparse.cols(), 3);
        assert_eq!(sparse.coords(1), &[3, 1]);
        assert_eq!(sparse.value(1), Some(-2.0));
        assert_eq!(
            sparse.to_matrix(),
            vec![vec![1.0, 2.0, 1.5], vec![3.0, 1.0, -2.0]]
        );
    }

    #[test]
    fn sets_have_no_value_column() {
        let mut sparse = SparseResult::with_capacity(1, false, 2);
        sparse.push(&[2], 0.0);
        assert_eq!(sparse.cols(), 1);
        assert_eq!(sparse.value(0), None);
        assert_eq!(sparse.to_matrix(), vec![vec![2.0]]);
    }
}
