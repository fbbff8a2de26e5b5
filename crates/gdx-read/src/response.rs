#![forbid(unsafe_code)]

use gdx_model::{SymbolKind, ValueFacet};
use serde::Serialize;

use crate::dense::DenseTensor;
use crate::request::{FieldSelection, Form};
use crate::sparse::SparseResult;

/// Output domain name of the synthetic facet axis.
pub const FIELD_DOMAIN: &str = "_field";

/// One output axis: its domain name and its labels in position order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub domain: String,
    pub labels: Vec<String>,
}

impl Axis {
    pub fn new(domain: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            labels,
        }
    }

    /// The `l, m, lo, up, s` axis added by `field='all'`.
    pub fn facets() -> Self {
        Self::new(
            FIELD_DOMAIN,
            ValueFacet::ALL
                .iter()
                .map(|facet| facet.token().to_owned())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Sparse(SparseResult),
    Full(DenseTensor<f64>),
}

impl Values {
    pub fn as_sparse(&self) -> Option<&SparseResult> {
        match self {
            Values::Sparse(sparse) => Some(sparse),
            Values::Full(_) => None,
        }
    }

    pub fn as_full(&self) -> Option<&DenseTensor<f64>> {
        match self {
            Values::Full(dense) => Some(dense),
            Values::Sparse(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Texts {
    Sparse(Vec<String>),
    Full(DenseTensor<String>),
}

impl Texts {
    pub fn as_sparse(&self) -> Option<&[String]> {
        match self {
            Texts::Sparse(texts) => Some(texts),
            Texts::Full(_) => None,
        }
    }

    pub fn as_full(&self) -> Option<&DenseTensor<String>> {
        match self {
            Texts::Full(dense) => Some(dense),
            Texts::Sparse(_) => None,
        }
    }
}

/// Result of extracting one symbol.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolReport {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub dim: usize,
    pub val: Values,
    pub form: Form,
    pub uels: Vec<Vec<String>>,
    pub domains: Vec<String>,
    /// Present for variables and equations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldSelection>,
    /// Explanatory text, present when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Set element text, present when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub te: Option<Texts>,
}

/// The universe reported as the pseudo set `*` when no read specifier is given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UniverseReport {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub dim: usize,
    pub val: Option<()>,
    pub form: Option<Form>,
    pub uels: Vec<String>,
}

impl UniverseReport {
    pub(crate) fn new(uels: Vec<String>) -> Self {
        Self {
            name: "*".to_owned(),
            kind: SymbolKind::Set,
            dim: 1,
            val: None,
            form: None,
            uels,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extraction {
    Universe(UniverseReport),
    Symbol(SymbolReport),
}

impl Extraction {
    pub fn as_symbol(&self) -> Option<&SymbolReport> {
        match self {
            Extraction::Symbol(report) => Some(report),
            Extraction::Universe(_) => None,
        }
    }

    pub fn as_universe(&self) -> Option<&UniverseReport> {
        match self {
            Extraction::Universe(report) => Some(report),
            Extraction::Symbol(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
