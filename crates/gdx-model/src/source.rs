#![forbid(unsafe_code)]

use crate::error::SourceError;
use crate::record::Record;
use crate::symbol::{SymbolEntry, SymbolInfo};
use crate::universe::LabelUniverse;

/// An open symbol inside a [`RecordSource`].
///
/// Handles are only meaningful for the source that produced them; `slot` is an
/// implementation-defined identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolHandle {
    info: SymbolInfo,
    slot: usize,
}

impl SymbolHandle {
    pub fn new(info: SymbolInfo, slot: usize) -> Self {
        Self { info, slot }
    }

    pub fn info(&self) -> &SymbolInfo {
        &self.info
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Declared domain of one symbol dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    /// Name of the domain set (e.g. `i`).
    pub name: String,
    /// Universe indices of the domain's elements, in domain order. Unique.
    pub labels: Vec<u32>,
}

/// Read access to a container's universe and symbol records.
///
/// Record streams are forward-only. Algorithms that need a second look at a symbol call
/// [`RecordSource::restart`], which must rewind to the first record and replay records in the
/// same order every time.
pub trait RecordSource {
    /// The container's label universe, 1-indexed.
    fn load_universe(&self) -> Result<LabelUniverse, SourceError>;

    /// Look up a symbol or alias by name (case-insensitive).
    fn find_symbol(&self, name: &str) -> Result<SymbolEntry, SourceError>;

    /// Open a data symbol for reading, positioned at its first record.
    ///
    /// `name` must name a set, parameter, variable or equation; callers resolve aliases first.
    fn open_symbol(&mut self, name: &str) -> Result<SymbolHandle, SourceError>;

    /// Rewind to the first record. Returns the number of records the stream will yield.
    fn restart(&mut self, handle: &SymbolHandle) -> Result<usize, SourceError>;

    /// Read the next record into `out`. Returns `false` at end of stream.
    fn next_record(&mut self, handle: &SymbolHandle, out: &mut Record)
        -> Result<bool, SourceError>;

    fn close_symbol(&mut self, handle: &SymbolHandle) -> Result<(), SourceError>;

    /// Associated text stored at 1-based `index` (set element text).
    fn associated_text(&self, index: u32) -> Result<String, SourceError>;

    /// Declared domain of `dimension` of the symbol, if the container knows one.
    fn domain_labels(
        &self,
        handle: &SymbolHandle,
        dimension: usize,
    ) -> Result<Option<Domain>, SourceError>;
}
