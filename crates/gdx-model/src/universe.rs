#![forbid(unsafe_code)]

use indexmap::IndexSet;

use crate::error::SourceError;

/// Longest label (or symbol name) a container can store.
pub const MAX_LABEL_LEN: usize = 63;

/// The ordered registry of every categorical label (UEL) known to a container.
///
/// Indices are 1-based: record keys store `1..=len()` and `0` is never a valid label index.
/// The universe is immutable once a container is open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelUniverse {
    labels: IndexSet<String>,
}

impl LabelUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a universe from labels in index order. Fails on the first duplicate label.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::new();
        for label in labels {
            let label = label.into();
            if out.labels.contains(&label) {
                return Err(SourceError::Invalid(format!(
                    "duplicate universe label '{label}'"
                )));
            }
            out.labels.insert(label);
        }
        Ok(out)
    }

    /// Return the index of `label`, adding it if it is new.
    pub fn intern(&mut self, label: &str) -> u32 {
        if let Some(idx) = self.index_of(label) {
            return idx;
        }
        let (pos, _) = self.labels.insert_full(label.to_owned());
        pos as u32 + 1
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label stored at 1-based `index`.
    pub fn get(&self, index: u32) -> Option<&str> {
        let pos = (index as usize).checked_sub(1)?;
        self.labels.get_index(pos).map(String::as_str)
    }

    /// 1-based index of `label`, if present.
    pub fn index_of(&self, label: &str) -> Option<u32> {
        self.labels.get_index_of(label).map(|pos| pos as u32 + 1)
    }

    pub fn contains_index(&self, index: u32) -> bool {
        index >= 1 && (index as usize) <= self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }
}
