//! Record scanning.
//!
//! With explicit filters the scanner makes two passes over the symbol: a counting pass that
//! stops as soon as the theoretical maximum number of matches is reached, and a materializing
//! pass that stops once that count has been replayed. Without filters the output positions come
//! straight from the domain (or identity) mapping and a single pass suffices.
//!
//! Facet selection/expansion is applied while rows are emitted. Zero-squeezing only applies to
//! the single-pass scan: every filter match is kept.

use gdx_model::{
    LabelUniverse, Record, RecordSource, SymbolHandle, SymbolInfo, SymbolKind, ValueFacet,
    FACET_COUNT,
};

use crate::error::{ReadError, ReadResult};
use crate::filter::FilterSet;
use crate::request::FieldSelection;
use crate::sparse::SparseResult;
use crate::text;

/// An open symbol stream. Closing is unconditional: dropping the scan closes the symbol if
/// [`SymbolScan::close`] was not reached.
pub(crate) struct SymbolScan<'s, S: RecordSource + ?Sized> {
    source: &'s mut S,
    handle: SymbolHandle,
    open: bool,
}

impl<'s, S: RecordSource + ?Sized> SymbolScan<'s, S> {
    pub(crate) fn open(source: &'s mut S, name: &str) -> ReadResult<Self> {
        let handle = source.open_symbol(name)?;
        Ok(Self {
            source,
            handle,
            open: true,
        })
    }

    pub(crate) fn handle(&self) -> &SymbolHandle {
        &self.handle
    }

    pub(crate) fn info(&self) -> &SymbolInfo {
        self.handle.info()
    }

    pub(crate) fn source(&self) -> &S {
        self.source
    }

    pub(crate) fn restart(&mut self) -> ReadResult<usize> {
        Ok(self.source.restart(&self.handle)?)
    }

    pub(crate) fn next(&mut self, out: &mut Record) -> ReadResult<bool> {
        Ok(self.source.next_record(&self.handle, out)?)
    }

    pub(crate) fn close(mut self) -> ReadResult<()> {
        self.open = false;
        self.source.close_symbol(&self.handle)?;
        Ok(())
    }
}

impl<S: RecordSource + ?Sized> Drop for SymbolScan<'_, S> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.source.close_symbol(&self.handle) {
                log::warn!("failed to close '{}': {err}", self.handle.info().name);
            }
        }
    }
}

/// What to emit for each matched record.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EmitPlan {
    pub kind: SymbolKind,
    pub field: FieldSelection,
    pub squeeze: bool,
    pub with_text: bool,
}

impl EmitPlan {
    fn index_cols(&self, dim: usize) -> usize {
        dim + usize::from(self.expands())
    }

    fn expands(&self) -> bool {
        self.kind.has_facets() && self.field.is_all()
    }

    fn has_value(&self) -> bool {
        !self.kind.is_categorical()
    }

    /// Facet emitted as the single value column.
    fn facet(&self) -> ValueFacet {
        match self.field {
            FieldSelection::One(facet) if self.kind.has_facets() => facet,
            _ => ValueFacet::Level,
        }
    }

    /// Zero-squeeze policy: only numeric symbols with a single facet ever lose rows.
    fn retains(&self, record: &Record) -> bool {
        if !self.squeeze || self.kind.is_categorical() || self.expands() {
            return true;
        }
        record.value(self.facet()) != 0.0
    }

    /// Rows one record turns into.
    fn rows_per_record(&self) -> usize {
        if self.expands() {
            FACET_COUNT
        } else {
            1
        }
    }
}

/// Rows and optional per-row text produced by a scan.
#[derive(Debug)]
pub(crate) struct Scanned {
    pub sparse: SparseResult,
    pub texts: Option<Vec<String>>,
    /// Records that matched the filters, before squeezing.
    pub matched: usize,
}

struct Emitter<'p> {
    plan: EmitPlan,
    universe: &'p LabelUniverse,
    sparse: SparseResult,
    texts: Option<Vec<String>>,
    row: Vec<u32>,
}

impl<'p> Emitter<'p> {
    fn new(plan: EmitPlan, universe: &'p LabelUniverse, dim: usize, capacity: usize) -> Self {
        let rows = capacity.saturating_mul(plan.rows_per_record());
        Self {
            plan,
            universe,
            sparse: SparseResult::with_capacity(plan.index_cols(dim), plan.has_value(), rows),
            texts: plan.with_text.then(|| Vec::with_capacity(capacity)),
            row: vec![0; plan.index_cols(dim)],
        }
    }

    /// Emit one matched record whose output positions are in `self.row[..dim]`.
    fn emit<S: RecordSource + ?Sized>(
        &mut self,
        source: &S,
        record: &Record,
        dim: usize,
    ) -> ReadResult<()> {
        if !self.plan.retains(record) {
            log::trace!("squeezed zero record {:?}", record.keys);
            return Ok(());
        }

        if self.plan.expands() {
            for (pos, facet) in ValueFacet::ALL.into_iter().enumerate() {
                self.row[dim] = pos as u32 + 1;
                self.sparse.push(&self.row, record.value(facet));
            }
        } else {
            self.sparse.push(&self.row, record.value(self.plan.facet()));
        }

        if let Some(texts) = self.texts.as_mut() {
            texts.push(text::element_text(source, self.universe, record)?);
        }
        Ok(())
    }

    fn finish(mut self, matched: usize) -> Scanned {
        let reserved = matched.saturating_mul(self.plan.rows_per_record());
        if self.sparse.rows() < reserved {
            log::debug!(
                "trimming sparse result from {reserved} to {} rows",
                self.sparse.rows()
            );
        }
        self.sparse.trim();
        Scanned {
            sparse: self.sparse,
            texts: self.texts,
            matched,
        }
    }
}

fn check_arity(info: &SymbolInfo, record: &Record) -> ReadResult<()> {
    if record.keys.len() != info.dim {
        return Err(ReadError::corrupt(
            &info.name,
            format!("record has {} keys, expected {}", record.keys.len(), info.dim),
        ));
    }
    Ok(())
}

/// Two-pass scan against explicit per-dimension filters. Zero-valued matches are kept.
pub(crate) fn scan_filtered<S: RecordSource + ?Sized>(
    scan: &mut SymbolScan<'_, S>,
    universe: &LabelUniverse,
    filters: &FilterSet,
    plan: EmitPlan,
) -> ReadResult<Scanned> {
    let plan = EmitPlan {
        squeeze: false,
        ..plan
    };
    let dim = scan.info().dim;
    let max = filters.max_matches();
    let mut record = Record::new(Vec::with_capacity(dim), [0.0; FACET_COUNT]);
    let mut positions = vec![0u32; dim];

    // Counting pass.
    let mut count = 0usize;
    if max > 0 {
        scan.restart()?;
        while scan.next(&mut record)? {
            check_arity(scan.info(), &record)?;
            if filters.match_keys(&record.keys, &mut positions) {
                count += 1;
                if count >= max {
                    break;
                }
            }
        }
    }
    log::debug!(
        "'{}': {count} of at most {max} records match the filters",
        scan.info().name
    );

    // Materializing pass.
    let mut emitter = Emitter::new(plan, universe, dim, count);
    let mut matched = 0usize;
    if count > 0 {
        scan.restart()?;
        while matched < count && scan.next(&mut record)? {
            if !filters.match_keys(&record.keys, &mut emitter.row[..dim]) {
                continue;
            }
            matched += 1;
            emitter.emit(scan.source(), &record, dim)?;
        }
    }
    if matched != count {
        return Err(ReadError::corrupt(
            &scan.info().name,
            format!("record stream replayed {matched} matches, expected {count}"),
        ));
    }
    Ok(emitter.finish(matched))
}

/// Single-pass scan where every record must map through `axes`.
///
/// A record key rejected by `axes` means the container is inconsistent (a key outside its
/// declared domain, or outside the universe), so it aborts the scan.
pub(crate) fn scan_unfiltered<S: RecordSource + ?Sized>(
    scan: &mut SymbolScan<'_, S>,
    universe: &LabelUniverse,
    axes: &FilterSet,
    plan: EmitPlan,
) -> ReadResult<Scanned> {
    let dim = scan.info().dim;
    let declared = scan.restart()?;
    let mut record = Record::new(Vec::with_capacity(dim), [0.0; FACET_COUNT]);
    let mut emitter = Emitter::new(plan, universe, dim, declared);

    let mut matched = 0usize;
    while scan.next(&mut record)? {
        check_arity(scan.info(), &record)?;
        if !axes.match_keys(&record.keys, &mut emitter.row[..dim]) {
            return Err(ReadError::corrupt(
                &scan.info().name,
                format!("record key {:?} lies outside its dimension's domain", record.keys),
            ));
        }
        matched += 1;
        emitter.emit(scan.source(), &record, dim)?;
    }
    log::debug!(
        "'{}': read {matched} records, emitted {} rows",
        scan.info().name,
        emitter.sparse.rows()
    );
    Ok(emitter.finish(matched))
}
