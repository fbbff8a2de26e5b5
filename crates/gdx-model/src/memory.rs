//! In-memory [`RecordSource`].
//!
//! `MemoryContainer` keeps every record resident, so rewinding is free. It is built either
//! programmatically through [`MemoryContainerBuilder`] or from a JSON document:
//!
//! ```json
//! {
//!   "universe": ["a", "b"],
//!   "texts": ["first"],
//!   "symbols": [
//!     {"name": "i", "type": "set", "dim": 1, "records": [{"keys": ["a"], "values": [1]}]},
//!     {"name": "p", "type": "parameter", "domain": ["i"],
//!      "records": [{"keys": ["a"], "values": [2.5]}]},
//!     {"name": "j", "type": "alias", "of": "i"}
//!   ]
//! }
//! ```
//!
//! Values may be numbers or special-value tokens (`UNDF`, `NA`, `+INF`, `-INF`, `EPS`).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::SourceError;
use crate::record::{Record, FACET_COUNT};
use crate::source::{Domain, RecordSource, SymbolHandle};
use crate::special::SpecialValue;
use crate::symbol::{SymbolEntry, SymbolInfo, SymbolKind};
use crate::universe::{LabelUniverse, MAX_LABEL_LEN};

/// A symbol definition with label keys, resolved against the universe on build.
#[derive(Clone, Debug, PartialEq)]
pub struct MemorySymbol {
    name: String,
    kind: SymbolKind,
    dim: usize,
    text: String,
    domain: Vec<String>,
    records: Vec<(Vec<String>, [f64; FACET_COUNT])>,
}

impl MemorySymbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, dim: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            dim,
            text: String::new(),
            domain: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn set(name: impl Into<String>, dim: usize) -> Self {
        Self::new(name, SymbolKind::Set, dim)
    }

    pub fn parameter(name: impl Into<String>, dim: usize) -> Self {
        Self::new(name, SymbolKind::Parameter, dim)
    }

    pub fn variable(name: impl Into<String>, dim: usize) -> Self {
        Self::new(name, SymbolKind::Variable, dim)
    }

    pub fn equation(name: impl Into<String>, dim: usize) -> Self {
        Self::new(name, SymbolKind::Equation, dim)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Declare the domain set of each dimension (`*` for the universe).
    pub fn with_domain<I, S>(mut self, domain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain = domain.into_iter().map(Into::into).collect();
        self
    }

    pub fn record(mut self, keys: &[&str], values: [f64; FACET_COUNT]) -> Self {
        self.records
            .push((keys.iter().map(|k| (*k).to_owned()).collect(), values));
        self
    }

    /// A record with only a level value.
    pub fn level(self, keys: &[&str], level: f64) -> Self {
        let mut values = [0.0; FACET_COUNT];
        values[0] = level;
        self.record(keys, values)
    }

    /// A set element without associated text.
    pub fn element(self, keys: &[&str]) -> Self {
        self.level(keys, 0.0)
    }

    /// A set element whose text is `texts[text_index - 1]`.
    pub fn element_with_text(self, keys: &[&str], text_index: u32) -> Self {
        self.level(keys, text_index as f64)
    }
}

#[derive(Clone, Debug)]
enum Entry {
    Data {
        info: SymbolInfo,
        domain: Vec<String>,
        records: Vec<Record>,
    },
    Alias {
        name: String,
        target: String,
    },
}

impl Entry {
    fn name(&self) -> &str {
        match self {
            Entry::Data { info, .. } => &info.name,
            Entry::Alias { name, .. } => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    slot: usize,
    pos: usize,
}

/// Fully resident container; see the module docs for the JSON format.
#[derive(Clone, Debug)]
pub struct MemoryContainer {
    universe: LabelUniverse,
    texts: Vec<String>,
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    cursor: Option<Cursor>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryContainerBuilder {
    labels: Vec<String>,
    texts: Vec<String>,
    symbols: Vec<MemorySymbol>,
    aliases: Vec<(String, String)>,
}

impl MemoryContainerBuilder {
    /// Pre-register labels so they take the lowest universe indices in this order.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Append an associated text; the first text has index 1.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.texts.push(text.into());
        self
    }

    pub fn symbol(mut self, symbol: MemorySymbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn alias(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push((name.into(), target.into()));
        self
    }

    pub fn build(self) -> Result<MemoryContainer, SourceError> {
        for label in &self.labels {
            check_label(label)?;
        }
        let mut universe = LabelUniverse::from_labels(self.labels.iter().cloned())?;

        let mut entries = Vec::with_capacity(self.symbols.len() + self.aliases.len());
        let mut by_name = HashMap::new();

        for symbol in self.symbols {
            check_label(&symbol.name)?;
            if !symbol.domain.is_empty() && symbol.domain.len() != symbol.dim {
                return Err(SourceError::Invalid(format!(
                    "symbol '{}' declares {} domain entries for dimension {}",
                    symbol.name,
                    symbol.domain.len(),
                    symbol.dim
                )));
            }

            let mut seen = HashSet::with_capacity(symbol.records.len());
            let mut records = Vec::with_capacity(symbol.records.len());
            for (labels, values) in symbol.records {
                if labels.len() != symbol.dim {
                    return Err(SourceError::Invalid(format!(
                        "record of '{}' has {} keys, expected {}",
                        symbol.name,
                        labels.len(),
                        symbol.dim
                    )));
                }
                let mut keys = Vec::with_capacity(labels.len());
                for label in &labels {
                    check_label(label)?;
                    keys.push(universe.intern(label));
                }
                if !seen.insert(keys.clone()) {
                    return Err(SourceError::Invalid(format!(
                        "duplicate record ({}) in '{}'",
                        labels.join("."),
                        symbol.name
                    )));
                }
                let record = Record::new(keys, values);
                if symbol.kind == SymbolKind::Set {
                    if let Some(index) = record.text_index() {
                        if index as usize > self.texts.len() {
                            return Err(SourceError::TextIndex {
                                index,
                                len: self.texts.len(),
                            });
                        }
                    }
                }
                records.push(record);
            }

            let info = SymbolInfo {
                name: symbol.name,
                kind: symbol.kind,
                dim: symbol.dim,
                record_count: records.len(),
                text: symbol.text,
            };
            register(&mut by_name, &info.name, entries.len())?;
            entries.push(Entry::Data {
                info,
                domain: symbol.domain,
                records,
            });
        }

        for (name, target) in self.aliases {
            check_label(&name)?;
            register(&mut by_name, &name, entries.len())?;
            entries.push(Entry::Alias { name, target });
        }

        log::debug!(
            "built memory container: {} labels, {} symbols",
            universe.len(),
            entries.len()
        );

        Ok(MemoryContainer {
            universe,
            texts: self.texts,
            entries,
            by_name,
            cursor: None,
        })
    }
}

fn check_label(label: &str) -> Result<(), SourceError> {
    if label.is_empty() {
        return Err(SourceError::Invalid("empty label".to_owned()));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(SourceError::Invalid(format!(
            "label '{label}' exceeds {MAX_LABEL_LEN} characters"
        )));
    }
    Ok(())
}

fn register(
    by_name: &mut HashMap<String, usize>,
    name: &str,
    slot: usize,
) -> Result<(), SourceError> {
    if by_name.insert(name.to_ascii_lowercase(), slot).is_some() {
        return Err(SourceError::Invalid(format!("duplicate symbol '{name}'")));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContainerJson {
    #[serde(default)]
    universe: Vec<String>,
    #[serde(default)]
    texts: Vec<String>,
    #[serde(default)]
    symbols: Vec<SymbolJson>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SymbolJson {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    dim: Option<usize>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    domain: Vec<String>,
    #[serde(default)]
    of: Option<String>,
    #[serde(default)]
    records: Vec<RecordJson>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordJson {
    keys: Vec<String>,
    #[serde(default)]
    values: Vec<NumberJson>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberJson {
    Number(f64),
    Token(String),
}

impl NumberJson {
    fn to_f64(&self) -> Result<f64, SourceError> {
        match self {
            NumberJson::Number(v) => Ok(*v),
            NumberJson::Token(token) => SpecialValue::from_token(token)
                .map(SpecialValue::to_f64)
                .ok_or_else(|| SourceError::Invalid(format!("unknown special value '{token}'"))),
        }
    }
}

impl MemoryContainer {
    pub fn builder() -> MemoryContainerBuilder {
        MemoryContainerBuilder::default()
    }

    /// Open a JSON container file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SourceError::ContainerNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let parsed: ContainerJson = serde_json::from_str(json)?;

        let mut builder = MemoryContainer::builder().labels(parsed.universe);
        builder.texts = parsed.texts;

        for symbol in parsed.symbols {
            if symbol.kind.eq_ignore_ascii_case("alias") {
                let Some(target) = symbol.of else {
                    return Err(SourceError::Invalid(format!(
                        "alias '{}' is missing 'of'",
                        symbol.name
                    )));
                };
                builder = builder.alias(symbol.name, target);
                continue;
            }

            let kind = SymbolKind::from_name(&symbol.kind).ok_or_else(|| {
                SourceError::Invalid(format!(
                    "symbol '{}' has unknown type '{}'",
                    symbol.name, symbol.kind
                ))
            })?;
            let dim = symbol
                .dim
                .or_else(|| (!symbol.domain.is_empty()).then_some(symbol.domain.len()))
                .or_else(|| symbol.records.first().map(|r| r.keys.len()))
                .unwrap_or(0);

            let mut out = MemorySymbol::new(symbol.name, kind, dim)
                .with_text(symbol.text)
                .with_domain(symbol.domain);
            for record in symbol.records {
                if record.values.len() > FACET_COUNT {
                    return Err(SourceError::Invalid(format!(
                        "record of '{}' has {} values, at most {FACET_COUNT} allowed",
                        out.name,
                        record.values.len()
                    )));
                }
                let mut values = [0.0; FACET_COUNT];
                for (slot, value) in record.values.iter().enumerate() {
                    values[slot] = value.to_f64()?;
                }
                out.records.push((record.keys, values));
            }
            builder = builder.symbol(out);
        }

        builder.build()
    }

    pub fn universe(&self) -> &LabelUniverse {
        &self.universe
    }

    /// Whether a symbol is currently open. Only one symbol can be open at a time.
    pub fn has_open_symbol(&self) -> bool {
        self.cursor.is_some()
    }

    fn slot_of(&self, name: &str) -> Result<usize, SourceError> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| SourceError::SymbolNotFound {
                name: name.to_owned(),
            })
    }

    /// Follow aliases until a data symbol is reached.
    fn resolve_data_slot(&self, name: &str) -> Result<usize, SourceError> {
        let mut slot = self.slot_of(name)?;
        for _ in 0..=self.entries.len() {
            match &self.entries[slot] {
                Entry::Data { .. } => return Ok(slot),
                Entry::Alias { target, .. } => slot = self.slot_of(target)?,
            }
        }
        Err(SourceError::BadAlias {
            alias: name.to_owned(),
            reason: "alias cycle".to_owned(),
        })
    }

    fn records_for(&self, handle: &SymbolHandle) -> Result<&[Record], SourceError> {
        match self.entries.get(handle.slot()) {
            Some(Entry::Data { records, .. }) => Ok(records),
            _ => Err(SourceError::NotOpen {
                name: handle.info().name.clone(),
            }),
        }
    }

    fn cursor_for(&mut self, handle: &SymbolHandle) -> Result<&mut Cursor, SourceError> {
        match self.cursor.as_mut() {
            Some(cursor) if cursor.slot == handle.slot() => Ok(cursor),
            _ => Err(SourceError::NotOpen {
                name: handle.info().name.clone(),
            }),
        }
    }
}

impl RecordSource for MemoryContainer {
    fn load_universe(&self) -> Result<LabelUniverse, SourceError> {
        Ok(self.universe.clone())
    }

    fn find_symbol(&self, name: &str) -> Result<SymbolEntry, SourceError> {
        let slot = self.slot_of(name)?;
        Ok(match &self.entries[slot] {
            Entry::Data { info, .. } => SymbolEntry::Symbol(info.clone()),
            Entry::Alias { name, target } => SymbolEntry::Alias {
                name: name.clone(),
                target: target.clone(),
            },
        })
    }

    fn open_symbol(&mut self, name: &str) -> Result<SymbolHandle, SourceError> {
        let slot = self.slot_of(name)?;
        let Entry::Data { info, .. } = &self.entries[slot] else {
            return Err(SourceError::Invalid(format!(
                "'{}' is an alias and cannot be opened directly",
                self.entries[slot].name()
            )));
        };
        if let Some(open) = &self.cursor {
            return Err(SourceError::Invalid(format!(
                "cannot open '{}' while '{}' is still open",
                info.name,
                self.entries[open.slot].name()
            )));
        }
        self.cursor = Some(Cursor { slot, pos: 0 });
        Ok(SymbolHandle::new(info.clone(), slot))
    }

    fn restart(&mut self, handle: &SymbolHandle) -> Result<usize, SourceError> {
        let len = self.records_for(handle)?.len();
        self.cursor_for(handle)?.pos = 0;
        Ok(len)
    }

    fn next_record(
        &mut self,
        handle: &SymbolHandle,
        out: &mut Record,
    ) -> Result<bool, SourceError> {
        let pos = self.cursor_for(handle)?.pos;
        let records = self.records_for(handle)?;
        let Some(record) = records.get(pos) else {
            return Ok(false);
        };
        out.keys.clear();
        out.keys.extend_from_slice(&record.keys);
        out.values = record.values;
        self.cursor_for(handle)?.pos = pos + 1;
        Ok(true)
    }

    fn close_symbol(&mut self, handle: &SymbolHandle) -> Result<(), SourceError> {
        self.cursor_for(handle)?;
        self.cursor = None;
        Ok(())
    }

    fn associated_text(&self, index: u32) -> Result<String, SourceError> {
        (index as usize)
            .checked_sub(1)
            .and_then(|pos| self.texts.get(pos))
            .cloned()
            .ok_or(SourceError::TextIndex {
                index,
                len: self.texts.len(),
            })
    }

    fn domain_labels(
        &self,
        handle: &SymbolHandle,
        dimension: usize,
    ) -> Result<Option<Domain>, SourceError> {
        let Some(Entry::Data { domain, .. }) = self.entries.get(handle.slot()) else {
            return Err(SourceError::NotOpen {
                name: handle.info().name.clone(),
            });
        };
        let Some(name) = domain.get(dimension) else {
            return Ok(None);
        };
        if name == "*" {
            return Ok(None);
        }

        let slot = match self.resolve_data_slot(name) {
            Ok(slot) => slot,
            Err(err) => {
                log::warn!(
                    "domain '{name}' of '{}' cannot be resolved: {err}",
                    handle.info().name
                );
                return Ok(None);
            }
        };
        let Entry::Data { info, records, .. } = &self.entries[slot] else {
            return Ok(None);
        };
        if info.kind != SymbolKind::Set || info.dim != 1 {
            log::warn!(
                "domain '{name}' of '{}' is not a one-dimensional set",
                handle.info().name
            );
            return Ok(None);
        }

        Ok(Some(Domain {
            name: name.clone(),
            labels: records.iter().map(|r| r.keys[0]).collect(),
        }))
    }
}
