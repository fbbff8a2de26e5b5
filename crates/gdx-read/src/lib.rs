//! Single-symbol extraction from GDX-style containers.
//!
//! A [`ReadSpec`] names one symbol and describes how to shape it: sparse or dense form, which
//! value facet to return, per-dimension label filters, label compaction, and optional text.
//! [`extract`] reads the symbol through any [`gdx_model::RecordSource`] and returns an
//! [`Extraction`], which serializes to the JSON response layout.
//!
//! ```
//! use gdx_model::{MemoryContainer, MemorySymbol};
//! use gdx_read::{extract, ReadOptions, ReadSpec};
//!
//! let mut container = MemoryContainer::builder()
//!     .labels(["a", "b", "c"])
//!     .symbol(
//!         MemorySymbol::parameter("x", 1)
//!             .level(&["a"], 1.0)
//!             .level(&["b"], 0.0)
//!             .level(&["c"], 3.0),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let spec = ReadSpec::builder("x").build().unwrap();
//! let report = extract(&mut container, Some(&spec), &ReadOptions::default()).unwrap();
//! let sparse = report.as_symbol().unwrap().val.as_sparse().unwrap();
//! assert_eq!(sparse.to_matrix(), vec![vec![1.0, 1.0], vec![3.0, 3.0]]);
//! ```

#![forbid(unsafe_code)]

mod compress;
mod dense;
mod error;
mod extract;
mod filter;
mod request;
mod response;
mod scan;
mod sparse;
mod text;

pub use crate::compress::COMPRESSED_DOMAIN;
pub use crate::dense::DenseTensor;
pub use crate::error::{ErrorKind, ReadError, ReadResult};
pub use crate::extract::{extract, extract_json};
pub use crate::filter::{UNIVERSE_DOMAIN, USER_DOMAIN};
pub use crate::request::{FieldSelection, Form, ReadOptions, ReadSpec, ReadSpecBuilder, MAX_DIM};
pub use crate::response::{
    Axis, Extraction, SymbolReport, Texts, UniverseReport, Values, FIELD_DOMAIN,
};
pub use crate::sparse::SparseResult;
