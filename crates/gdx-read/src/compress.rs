#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use crate::response::Axis;
use crate::sparse::SparseResult;

/// Output domain name of a compacted dimension.
pub const COMPRESSED_DOMAIN: &str = "_compressed";

/// Shrink each of the first `dim` axes to the labels the sparse rows actually use.
///
/// Used positions keep their relative order, are renumbered `1..=k`, and every row is rewritten
/// to the new numbering. Axes past `dim` (the facet axis) are left alone.
pub(crate) fn compact(sparse: &mut SparseResult, axes: &mut [Axis], dim: usize) {
    let stride = sparse.index_cols();
    if stride == 0 {
        return;
    }

    for (d, axis) in axes.iter_mut().enumerate().take(dim) {
        let used: BTreeSet<u32> = sparse
            .coords_mut()
            .iter()
            .skip(d)
            .step_by(stride)
            .copied()
            .collect();

        // remap[old - 1] = new position
        let mut remap = vec![0u32; axis.labels.len()];
        let mut labels = Vec::with_capacity(used.len());
        for &old in &used {
            let slot = (old as usize).wrapping_sub(1);
            let Some(label) = axis.labels.get(slot) else {
                continue;
            };
            labels.push(label.clone());
            remap[slot] = labels.len() as u32;
        }

        for coord in sparse.coords_mut().iter_mut().skip(d).step_by(stride) {
            if let Some(&new) = remap.get((*coord as usize).wrapping_sub(1)) {
                *coord = new;
            }
        }

        log::debug!(
            "compacted dimension {} from {} to {} labels",
            d + 1,
            axis.labels.len(),
            labels.len()
        );
        axis.labels = labels;
        axis.domain = COMPRESSED_DOMAIN.to_owned();
    }
}
