#![forbid(unsafe_code)]

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Set,
    Parameter,
    Variable,
    Equation,
}

impl SymbolKind {
    /// Display name used in responses.
    pub fn name(self) -> &'static str {
        match self {
            SymbolKind::Set => "set",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Variable => "variable",
            SymbolKind::Equation => "equation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "set" => Some(SymbolKind::Set),
            "parameter" => Some(SymbolKind::Parameter),
            "variable" => Some(SymbolKind::Variable),
            "equation" => Some(SymbolKind::Equation),
            _ => None,
        }
    }

    /// Variables and equations carry all five value facets.
    pub fn has_facets(self) -> bool {
        matches!(self, SymbolKind::Variable | SymbolKind::Equation)
    }

    /// Sets carry no numeric value column.
    pub fn is_categorical(self) -> bool {
        self == SymbolKind::Set
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata of a data-carrying symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Canonical name as stored in the container.
    pub name: String,
    pub kind: SymbolKind,
    pub dim: usize,
    /// Number of records the container declares for the symbol.
    pub record_count: usize,
    /// Explanatory text.
    pub text: String,
}

/// What a name lookup finds in a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolEntry {
    Symbol(SymbolInfo),
    /// Another name for a set; `target` may itself be an alias.
    Alias { name: String, target: String },
}

impl SymbolEntry {
    pub fn name(&self) -> &str {
        match self {
            SymbolEntry::Symbol(info) => &info.name,
            SymbolEntry::Alias { name, .. } => name,
        }
    }
}
