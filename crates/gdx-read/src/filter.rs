#![forbid(unsafe_code)]

use std::collections::HashMap;

use gdx_model::{Domain, LabelUniverse};

/// Output domain name of a dimension filtered by the caller.
pub const USER_DOMAIN: &str = "_user";
/// Output domain name of a dimension without declared domain.
pub const UNIVERSE_DOMAIN: &str = "*";

/// Maps universe indices of one dimension onto 1-based output positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DimensionFilter {
    /// Output position is the universe index itself.
    Identity { cardinality: usize },
    /// Output position is the position of the label in an ordered allow-list.
    Explicit(ExplicitFilter),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExplicitFilter {
    labels: Vec<String>,
    positions: HashMap<u32, u32>,
}

impl ExplicitFilter {
    /// Build from caller labels. Labels unknown to the universe stay on the axis but never match.
    pub(crate) fn from_labels(labels: &[String], universe: &LabelUniverse) -> Self {
        let mut positions = HashMap::with_capacity(labels.len());
        for (pos, label) in labels.iter().enumerate() {
            if let Some(index) = universe.index_of(label) {
                positions.insert(index, pos as u32 + 1);
            } else {
                log::debug!("filter label '{label}' is not in the universe");
            }
        }
        Self {
            labels: labels.to_vec(),
            positions,
        }
    }

    /// Build from a declared domain (universe indices in domain order).
    pub(crate) fn from_domain(domain: &Domain, universe: &LabelUniverse) -> Option<Self> {
        let mut labels = Vec::with_capacity(domain.labels.len());
        let mut positions = HashMap::with_capacity(domain.labels.len());
        for (pos, &index) in domain.labels.iter().enumerate() {
            labels.push(universe.get(index)?.to_owned());
            positions.insert(index, pos as u32 + 1);
        }
        Some(Self { labels, positions })
    }
}

impl DimensionFilter {
    pub(crate) fn identity(universe: &LabelUniverse) -> Self {
        DimensionFilter::Identity {
            cardinality: universe.len(),
        }
    }

    /// Output position of universe index `index`, or `None` when the filter excludes it.
    pub(crate) fn lookup(&self, index: u32) -> Option<u32> {
        match self {
            DimensionFilter::Identity { cardinality } => {
                (index >= 1 && index as usize <= *cardinality).then_some(index)
            }
            DimensionFilter::Explicit(filter) => filter.positions.get(&index).copied(),
        }
    }

    /// Number of output positions; also the most matches this dimension can contribute.
    pub(crate) fn cardinality(&self) -> usize {
        match self {
            DimensionFilter::Identity { cardinality } => *cardinality,
            DimensionFilter::Explicit(filter) => filter.labels.len(),
        }
    }

    /// Labels along this dimension's output axis, in position order.
    pub(crate) fn axis_labels(&self, universe: &LabelUniverse) -> Vec<String> {
        match self {
            DimensionFilter::Identity { .. } => universe.to_vec(),
            DimensionFilter::Explicit(filter) => filter.labels.clone(),
        }
    }
}

/// One filter per symbol dimension; records match only if every dimension matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FilterSet {
    dims: Vec<DimensionFilter>,
}

impl FilterSet {
    pub(crate) fn new(dims: Vec<DimensionFilter>) -> Self {
        Self { dims }
    }

    /// Write the output position of every key into `out`. Returns `false` as soon as one
    /// dimension rejects its key; `out` is then partially written and must be ignored.
    pub(crate) fn match_keys(&self, keys: &[u32], out: &mut [u32]) -> bool {
        debug_assert_eq!(keys.len(), self.dims.len());
        for ((filter, &key), slot) in self.dims.iter().zip(keys).zip(out.iter_mut()) {
            match filter.lookup(key) {
                Some(pos) => *slot = pos,
                None => return false,
            }
        }
        true
    }

    /// Upper bound on matching records: the product of all filter cardinalities.
    pub(crate) fn max_matches(&self) -> usize {
        self.dims
            .iter()
            .fold(1usize, |acc, f| acc.saturating_mul(f.cardinality()))
    }
}
