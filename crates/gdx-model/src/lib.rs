//! Data model for GDX-style categorical data containers.
//!
//! This crate focuses on:
//! - The shared label universe (UELs) every symbol's keys index into.
//! - Symbol metadata (sets, parameters, variables, equations and aliases).
//! - Records with up to five numeric value facets, including the container's special values.
//! - The [`RecordSource`] seam that extraction engines read through, plus [`MemoryContainer`],
//!   an in-memory rewindable source that can be loaded from JSON.

#![forbid(unsafe_code)]

mod error;
mod memory;
mod record;
mod source;
mod special;
mod symbol;
mod universe;

pub use crate::error::SourceError;
pub use crate::memory::{MemoryContainer, MemoryContainerBuilder, MemorySymbol};
pub use crate::record::{Record, ValueFacet, FACET_COUNT};
pub use crate::source::{Domain, RecordSource, SymbolHandle};
pub use crate::special::{is_na, SpecialValue, NA};
pub use crate::symbol::{SymbolEntry, SymbolInfo, SymbolKind};
pub use crate::universe::{LabelUniverse, MAX_LABEL_LEN};
