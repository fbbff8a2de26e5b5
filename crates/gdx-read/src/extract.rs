//! Extraction driver.
//!
//! One call validates the request against the symbol, opens the symbol, scans it once or twice,
//! closes it, and post-processes the rows (compaction, facet axis, dense scatter). The symbol is
//! closed on every exit path once it has been opened.

use std::collections::HashSet;

use gdx_model::{LabelUniverse, RecordSource, SourceError, SymbolEntry, SymbolInfo, SymbolKind};
use serde_json::Value as JsonValue;

use crate::compress;
use crate::dense;
use crate::error::{ReadError, ReadResult};
use crate::filter::{DimensionFilter, ExplicitFilter, FilterSet, UNIVERSE_DOMAIN, USER_DOMAIN};
use crate::request::{Form, ReadOptions, ReadSpec};
use crate::response::{Axis, Extraction, SymbolReport, Texts, UniverseReport, Values};
use crate::scan::{self, EmitPlan, SymbolScan};

/// Extract the symbol described by `spec`, or report the universe when `spec` is `None`.
pub fn extract<S: RecordSource + ?Sized>(
    source: &mut S,
    spec: Option<&ReadSpec>,
    options: &ReadOptions,
) -> ReadResult<Extraction> {
    let universe = source.load_universe()?;
    let Some(spec) = spec else {
        log::debug!("no read specifier; reporting {} universe labels", universe.len());
        return Ok(Extraction::Universe(UniverseReport::new(universe.to_vec())));
    };

    let info = resolve_symbol(&*source, spec.name())?;
    check_symbol(spec, &info)?;
    log::debug!(
        "extracting {} '{}' (dim {}, {} records, form {})",
        info.kind,
        info.name,
        info.dim,
        info.record_count,
        spec.form().token()
    );

    let plan = EmitPlan {
        kind: info.kind,
        field: spec.field(),
        squeeze: options.squeeze,
        with_text: spec.with_text(),
    };

    let mut scan = SymbolScan::open(source, &info.name)?;
    let (mut scanned, mut axes) = match spec.filters() {
        Some(filters) => {
            let set = FilterSet::new(
                filters
                    .iter()
                    .map(|labels| {
                        DimensionFilter::Explicit(ExplicitFilter::from_labels(labels, &universe))
                    })
                    .collect(),
            );
            let axes = filters
                .iter()
                .map(|labels| Axis::new(USER_DOMAIN, labels.clone()))
                .collect::<Vec<_>>();
            (scan::scan_filtered(&mut scan, &universe, &set, plan)?, axes)
        }
        None => {
            let (set, axes) = derived_axes(&scan, &universe, options)?;
            (scan::scan_unfiltered(&mut scan, &universe, &set, plan)?, axes)
        }
    };
    scan.close()?;
    log::debug!(
        "'{}': {} matched records, {} output rows",
        info.name,
        scanned.matched,
        scanned.sparse.rows()
    );

    if spec.compress() {
        compress::compact(&mut scanned.sparse, &mut axes, info.dim);
    }
    if plan.kind.has_facets() && plan.field.is_all() {
        axes.push(Axis::facets());
    }

    let (val, te) = match spec.form() {
        Form::Sparse => (
            Values::Sparse(scanned.sparse),
            scanned.texts.map(Texts::Sparse),
        ),
        Form::Full => {
            let shape = dense::dense_shape(&axes.iter().map(Axis::len).collect::<Vec<_>>());
            let values = dense::values(&scanned.sparse, shape.clone())?;
            let texts = match &scanned.texts {
                Some(texts) => Some(Texts::Full(dense::texts(&scanned.sparse, texts, shape)?)),
                None => None,
            };
            (Values::Full(values), texts)
        }
    };

    Ok(Extraction::Symbol(SymbolReport {
        name: info.name.clone(),
        kind: info.kind,
        dim: info.dim,
        val,
        form: spec.form(),
        uels: axes.iter().map(|axis| axis.labels.clone()).collect(),
        domains: axes.into_iter().map(|axis| axis.domain).collect(),
        field: info.kind.has_facets().then(|| spec.field()),
        ts: spec.with_explanatory_text().then(|| info.text.clone()),
        te,
    }))
}

/// Validate an untyped request and extract it. A missing or `null` request reports the universe.
pub fn extract_json<S: RecordSource + ?Sized>(
    source: &mut S,
    request: Option<&JsonValue>,
    options: &ReadOptions,
) -> ReadResult<Extraction> {
    let spec = match request {
        None | Some(JsonValue::Null) => None,
        Some(request) => Some(ReadSpec::from_json(request)?),
    };
    extract(source, spec.as_ref(), options)
}

/// Follow aliases to the underlying set.
fn resolve_symbol<S: RecordSource + ?Sized>(source: &S, name: &str) -> ReadResult<SymbolInfo> {
    let mut current = name.to_owned();
    let mut visited = HashSet::new();
    loop {
        match source.find_symbol(&current)? {
            SymbolEntry::Symbol(info) => {
                if !visited.is_empty() && info.kind != SymbolKind::Set {
                    return Err(SourceError::BadAlias {
                        alias: name.to_owned(),
                        reason: format!("'{}' is a {}", info.name, info.kind),
                    }
                    .into());
                }
                return Ok(info);
            }
            SymbolEntry::Alias { name: alias, target } => {
                if !visited.insert(alias.to_ascii_lowercase()) {
                    return Err(SourceError::BadAlias {
                        alias: name.to_owned(),
                        reason: "alias cycle".to_owned(),
                    }
                    .into());
                }
                log::trace!("alias '{alias}' -> '{target}'");
                current = target;
            }
        }
    }
}

/// Checks that depend on the symbol the request resolved to.
fn check_symbol(spec: &ReadSpec, info: &SymbolInfo) -> ReadResult<()> {
    if spec.has_field() && !info.kind.has_facets() {
        return Err(ReadError::unsupported(
            "field",
            format!("'field' not allowed for {} symbol '{}'", info.kind, info.name),
        ));
    }
    if spec.with_text() && info.kind != SymbolKind::Set {
        return Err(ReadError::unsupported(
            "te",
            format!(
                "text elements only exist for sets and symbol '{}' is a {}",
                info.name, info.kind
            ),
        ));
    }
    if let Some(expected) = spec.expected_dim() {
        if expected != info.dim {
            return Err(ReadError::unsupported(
                "dim",
                format!(
                    "symbol '{}' has dimension {} but dim={expected} was requested",
                    info.name, info.dim
                ),
            ));
        }
    }
    if let Some(filters) = spec.filters() {
        if filters.len() != info.dim {
            return Err(ReadError::validation(
                "uels",
                format!(
                    "filter has {} dimensions but symbol '{}' has {}",
                    filters.len(),
                    info.name,
                    info.dim
                ),
            ));
        }
    }
    Ok(())
}

/// Axes for an unfiltered read: the declared domain of each dimension when available, else the
/// whole universe.
fn derived_axes<S: RecordSource + ?Sized>(
    scan: &SymbolScan<'_, S>,
    universe: &LabelUniverse,
    options: &ReadOptions,
) -> ReadResult<(FilterSet, Vec<Axis>)> {
    let dim = scan.info().dim;
    let mut filters = Vec::with_capacity(dim);
    let mut axes = Vec::with_capacity(dim);

    for d in 0..dim {
        let domain = if options.use_domain_info {
            scan.source().domain_labels(scan.handle(), d)?
        } else {
            None
        };

        match domain {
            Some(domain) => {
                let Some(filter) = ExplicitFilter::from_domain(&domain, universe) else {
                    return Err(ReadError::corrupt(
                        &scan.info().name,
                        format!("domain '{}' references labels outside the universe", domain.name),
                    ));
                };
                let filter = DimensionFilter::Explicit(filter);
                axes.push(Axis::new(domain.name, filter.axis_labels(universe)));
                filters.push(filter);
            }
            None => {
                let filter = DimensionFilter::identity(universe);
                axes.push(Axis::new(UNIVERSE_DOMAIN, filter.axis_labels(universe)));
                filters.push(filter);
            }
        }
    }

    Ok((FilterSet::new(filters), axes))
}
